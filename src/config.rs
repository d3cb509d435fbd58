//! Codec parameters.

use crate::crypto::{CHECKSUM_ITERATIONS, USER_KEY_ITERATIONS};
use crate::error::{DatabaseError, Result};
use crate::format::{MAGIC, VERSION_V1};

/// Immutable parameters shared by the codec, the verifier and the cracker.
///
/// The defaults are the values every SafeInCloud database uses; other values
/// only make sense for tests or for experimenting with the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    magic: u16,
    version: u8,
    user_key_iterations: u32,
    checksum_iterations: u32,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION_V1,
            // outer key, paid once per password guess
            user_key_iterations: USER_KEY_ITERATIONS,
            // inner checksum key
            checksum_iterations: CHECKSUM_ITERATIONS,
        }
    }
}

impl CodecConfig {
    pub fn new(
        magic: u16,
        version: u8,
        user_key_iterations: u32,
        checksum_iterations: u32,
    ) -> Result<Self> {
        let config = Self {
            magic,
            version,
            user_key_iterations,
            checksum_iterations,
        };
        config.validate()?;
        Ok(config)
    }

    /// Default magic and version with custom PBKDF2 iteration counts.
    pub fn with_iterations(user_key_iterations: u32, checksum_iterations: u32) -> Result<Self> {
        let default = Self::default();
        Self::new(
            default.magic,
            default.version,
            user_key_iterations,
            checksum_iterations,
        )
    }

    pub fn magic(&self) -> u16 {
        self.magic
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn user_key_iterations(&self) -> u32 {
        self.user_key_iterations
    }

    pub fn checksum_iterations(&self) -> u32 {
        self.checksum_iterations
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_key_iterations < 1 {
            return Err(DatabaseError::InvalidParameter(
                "user key iterations must be >= 1".into(),
            ));
        }
        if self.checksum_iterations < 1 {
            return Err(DatabaseError::InvalidParameter(
                "checksum iterations must be >= 1".into(),
            ));
        }
        Ok(())
    }
}
