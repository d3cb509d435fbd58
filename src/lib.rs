//! Reader, writer and password cracker for SafeInCloud encrypted databases.
//!
//! ```text
//! password --PBKDF2 10000--> user key --AES-256-CBC--> checksum block
//!     checksum block = data IV | data password | data key
//!     data key == PBKDF2(data password, data salt, 1000)   (password check)
//! data password --AES-256-CBC--> zlib stream --inflate--> payload
//! ```

pub mod config;
pub mod crack;
pub mod crypto;
pub mod database;
mod error;
pub mod format;
mod storage;
pub mod verify;

use std::path::Path;

use zeroize::Zeroizing;

pub use crate::config::CodecConfig;
pub use crate::crack::{CrackReport, Cracker, Dictionary, Found};
pub use crate::database::Database;
pub use crate::error::{DatabaseError, ErrorKind, Result};
pub use crate::format::Header;
pub use crate::storage::Storage;
pub use crate::verify::Verifier;

/// Loads and decrypts the database at `path`.
pub fn load(path: impl AsRef<Path>, password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    Database::new(path.as_ref()).load(password)
}

/// Encrypts `payload` under `password` and writes it to `path`.
pub fn save(path: impl AsRef<Path>, password: &[u8], payload: &[u8]) -> Result<()> {
    Database::new(path.as_ref()).save(password, payload)
}

/// Reads only the header of the database at `path`.
pub fn parse_header(path: impl AsRef<Path>) -> Result<Header> {
    Database::new(path.as_ref()).read_header()
}

/// Tests `candidate` against a header using the standard parameters.
pub fn verify_password(header: &Header, candidate: &[u8]) -> bool {
    verify::verify_password(header, candidate, &CodecConfig::default())
}
