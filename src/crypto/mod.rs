//! Cryptographic primitives for the database codec.
//!
//! Provides key derivation, the block cipher and random generation.

pub mod cipher;
pub mod kdf;
pub mod rng;

pub use cipher::{decrypt, encrypt};
pub use kdf::{derive, derive_key};
pub use rng::{OsRandom, RandomSource};

/// Length of derived keys and of the data password (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of generated salts (64 bytes).
pub const SALT_LEN: usize = 64;
/// Length of a CBC initialization vector (16 bytes, one AES block).
pub const IV_LEN: usize = 16;
/// AES block size.
pub const BLOCK_LEN: usize = 16;
/// PBKDF2 iterations for the key derived from the user's password.
pub const USER_KEY_ITERATIONS: u32 = 10_000;
/// PBKDF2 iterations for the checksum key derived from the data password.
pub const CHECKSUM_ITERATIONS: u32 = 1_000;
