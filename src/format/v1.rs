//! File format v1.
//!
//! V1 File Format (all integers little-endian, `array` = length byte + bytes):
//! ```text
//! MAGIC u16 = 0x0505 | VERSION u8 = 1
//! USERKEY SALT array | USERKEY IV array | DATA SALT array | ENCRYPTED CHECKSUM array
//! ENCRYPTED DATA (until EOF)
//! ```

use super::field::{FieldReader, FieldWriter, MAX_ARRAY_LEN};
use super::{MAGIC_LEN, VER_LEN};
use crate::error::Result;

/// Everything in front of the encrypted payload.
///
/// This is all a password check needs, so the cracker holds one of these and
/// shares it between its workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    user_key_salt: Vec<u8>,
    user_key_iv: Vec<u8>,
    data_salt: Vec<u8>,
    encrypted_checksum: Vec<u8>,
}

impl Header {
    /// Upper bound on the encoded size: preamble plus four maximal arrays.
    pub const MAX_LEN: usize = MAGIC_LEN + VER_LEN + 4 * (1 + MAX_ARRAY_LEN);

    pub fn new(
        user_key_salt: Vec<u8>,
        user_key_iv: Vec<u8>,
        data_salt: Vec<u8>,
        encrypted_checksum: Vec<u8>,
    ) -> Self {
        Self {
            user_key_salt,
            user_key_iv,
            data_salt,
            encrypted_checksum,
        }
    }

    pub fn user_key_salt(&self) -> &[u8] {
        &self.user_key_salt
    }

    pub fn user_key_iv(&self) -> &[u8] {
        &self.user_key_iv
    }

    pub fn data_salt(&self) -> &[u8] {
        &self.data_salt
    }

    pub fn encrypted_checksum(&self) -> &[u8] {
        &self.encrypted_checksum
    }

    /// Reads the four header arrays; the preamble must already be consumed.
    pub(crate) fn read_fields(reader: &mut FieldReader<'_>) -> Result<Self> {
        let user_key_salt = reader.read_array()?.to_vec();
        let user_key_iv = reader.read_array()?.to_vec();
        let data_salt = reader.read_array()?.to_vec();
        let encrypted_checksum = reader.read_array()?.to_vec();

        Ok(Self::new(
            user_key_salt,
            user_key_iv,
            data_salt,
            encrypted_checksum,
        ))
    }

    pub(crate) fn write_fields(&self, writer: &mut FieldWriter) -> Result<()> {
        writer.write_array(&self.user_key_salt)?;
        writer.write_array(&self.user_key_iv)?;
        writer.write_array(&self.data_salt)?;
        writer.write_array(&self.encrypted_checksum)?;
        Ok(())
    }
}

/// A parsed database file: header plus encrypted payload.
#[derive(Debug, Clone)]
pub struct DatabaseFile {
    header: Header,
    payload: Vec<u8>,
}

impl DatabaseFile {
    pub fn new(header: Header, payload: Vec<u8>) -> Self {
        Self { header, payload }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The encrypted, compressed payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_header(self) -> Header {
        self.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_len_covers_largest_header() {
        let header = Header::new(vec![0u8; 255], vec![0u8; 255], vec![0u8; 255], vec![0u8; 255]);
        let mut writer = FieldWriter::new();
        writer.write_short(0x0505);
        writer.write_byte(1);
        header.write_fields(&mut writer).unwrap();

        assert_eq!(writer.len(), Header::MAX_LEN);
        assert_eq!(Header::MAX_LEN, 1027);
    }

    #[test]
    fn fields_roundtrip() {
        let header = Header::new(vec![1, 2], vec![3], Vec::new(), vec![4, 5, 6]);
        let mut writer = FieldWriter::new();
        header.write_fields(&mut writer).unwrap();
        let bytes = writer.into_bytes();

        assert_eq!(bytes, [2, 1, 2, 1, 3, 0, 3, 4, 5, 6]);
        let parsed = Header::read_fields(&mut FieldReader::new(&bytes)).unwrap();
        assert_eq!(parsed, header);
    }
}
