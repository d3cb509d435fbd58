//! Password check against the header alone.
//!
//! Cost per candidate is one PBKDF2 at the user-key iteration count, one
//! small CBC decryption and one PBKDF2 at the checksum iteration count. The
//! payload is never touched, whatever its size.

use tracing::debug;

use crate::config::CodecConfig;
use crate::crypto::{self, derive_key};
use crate::error::{DatabaseError, Result};
use crate::format::{ChecksumBlock, Header};

/// Derives the user key, decrypts the checksum block and re-derives its
/// data key.
///
/// On success the returned block holds the data password and IV that unlock
/// the payload.
///
/// # Errors
///
/// - [`DatabaseError::WrongPasswordOrCorrupt`] if the checksum does not decrypt or parse
/// - [`DatabaseError::WrongPassword`] if the data key does not match
pub(crate) fn open_checksum(
    header: &Header,
    password: &[u8],
    config: &CodecConfig,
) -> Result<ChecksumBlock> {
    let user_key = derive_key(
        password,
        header.user_key_salt(),
        config.user_key_iterations(),
    )?;

    let plaintext = crypto::decrypt(
        user_key.as_slice(),
        header.user_key_iv(),
        header.encrypted_checksum(),
    )?;
    drop(user_key);

    let block = ChecksumBlock::from_bytes(&plaintext)?;
    drop(plaintext);

    let checksum_key = derive_key(
        block.data_password(),
        header.data_salt(),
        config.checksum_iterations(),
    )?;

    // plain comparison, not constant time
    if block.data_key() != checksum_key.as_slice() {
        debug!("checksum key mismatch");
        return Err(DatabaseError::WrongPassword);
    }

    Ok(block)
}

/// A parsed header bound to its codec parameters, ready to test passwords.
#[derive(Debug, Clone)]
pub struct Verifier {
    header: Header,
    config: CodecConfig,
}

impl Verifier {
    pub fn new(header: Header, config: CodecConfig) -> Self {
        Self { header, config }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Like [`Verifier::verify`] but says why a password was rejected.
    pub fn check(&self, candidate: &[u8]) -> Result<()> {
        open_checksum(&self.header, candidate, &self.config).map(drop)
    }

    /// `true` iff `candidate` unlocks the checksum block.
    pub fn verify(&self, candidate: &[u8]) -> bool {
        self.check(candidate).is_ok()
    }
}

/// Tests one password against a header. Every failure counts as "wrong".
pub fn verify_password(header: &Header, candidate: &[u8], config: &CodecConfig) -> bool {
    open_checksum(header, candidate, config).is_ok()
}
