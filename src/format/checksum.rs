//! The plaintext of the encrypted checksum field.

use zeroize::{Zeroize, Zeroizing};

use super::field::{FieldReader, FieldWriter};
use crate::error::{DatabaseError, Result};

/// `DATA IV | DATA PASSWORD | DATA KEY`, three arrays.
///
/// `data_password` is the random key the payload is encrypted with, and
/// `data_key` is PBKDF2 of it under the data salt. A block whose `data_key`
/// re-derives correctly proves the user password was right.
pub struct ChecksumBlock {
    data_iv: Vec<u8>,
    data_password: Vec<u8>,
    data_key: Vec<u8>,
}

impl Drop for ChecksumBlock {
    fn drop(&mut self) {
        self.data_iv.zeroize();
        self.data_password.zeroize();
        self.data_key.zeroize();
    }
}

impl std::fmt::Debug for ChecksumBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChecksumBlock")
            .field("data_iv_len", &self.data_iv.len())
            .field("data_password_len", &self.data_password.len())
            .field("data_key_len", &self.data_key.len())
            .finish()
    }
}

impl ChecksumBlock {
    pub fn new(data_iv: Vec<u8>, data_password: Vec<u8>, data_key: Vec<u8>) -> Self {
        Self {
            data_iv,
            data_password,
            data_key,
        }
    }

    pub fn data_iv(&self) -> &[u8] {
        &self.data_iv
    }

    pub fn data_password(&self) -> &[u8] {
        &self.data_password
    }

    pub fn data_key(&self) -> &[u8] {
        &self.data_key
    }

    /// Parses a decrypted checksum block. Trailing bytes are ignored.
    ///
    /// The input is the output of a decryption that may have used the wrong
    /// key, so any structural problem is reported as
    /// [`DatabaseError::WrongPasswordOrCorrupt`].
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = FieldReader::new(data);
        let mut next = || {
            reader
                .read_array()
                .map(<[u8]>::to_vec)
                .map_err(|_| DatabaseError::WrongPasswordOrCorrupt)
        };

        let data_iv = next()?;
        let data_password = next()?;
        let data_key = next()?;
        Ok(Self::new(data_iv, data_password, data_key))
    }

    pub fn to_bytes(&self) -> Result<Zeroizing<Vec<u8>>> {
        let mut writer = FieldWriter::with_capacity(
            3 + self.data_iv.len() + self.data_password.len() + self.data_key.len(),
        );
        writer.write_array(&self.data_iv)?;
        writer.write_array(&self.data_password)?;
        writer.write_array(&self.data_key)?;
        Ok(Zeroizing::new(writer.into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_roundtrip() {
        let block = ChecksumBlock::new(vec![1u8; 16], vec![2u8; 32], vec![3u8; 32]);
        let bytes = block.to_bytes().unwrap();
        assert_eq!(bytes.len(), 3 + 16 + 32 + 32);

        let parsed = ChecksumBlock::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.data_iv(), block.data_iv());
        assert_eq!(parsed.data_password(), block.data_password());
        assert_eq!(parsed.data_key(), block.data_key());
    }

    #[test]
    fn garbage_is_reported_as_wrong_password() {
        let err = ChecksumBlock::from_bytes(&[200, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, DatabaseError::WrongPasswordOrCorrupt));
    }

    #[test]
    fn debug_does_not_print_secrets() {
        let block = ChecksumBlock::new(vec![0xAA; 16], vec![0xBB; 32], vec![0xCC; 32]);
        let printed = format!("{block:?}");
        assert!(!printed.contains("187"));
        assert!(printed.contains("data_password_len: 32"));
    }
}
