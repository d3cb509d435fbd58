//! Primitive field codec.
//!
//! Every field of the file is one of: a byte, a little-endian `u16`, an
//! "array" (one length byte `n` followed by `n` raw bytes) or the raw bytes
//! left until the end of the data.

use crate::error::{DatabaseError, Result};

/// Largest array a single length byte can describe.
pub const MAX_ARRAY_LEN: usize = u8::MAX as usize;

/// Reads fields from a byte slice, advancing a cursor.
#[derive(Debug)]
pub struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(DatabaseError::Truncated {
                needed: len,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_short(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_array(&mut self) -> Result<&'a [u8]> {
        let len = self.read_byte()? as usize;
        self.take(len)
    }

    /// Everything up to the end of the data; may be empty.
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let bytes = &self.data[self.pos..];
        self.pos = self.data.len();
        bytes
    }
}

/// Appends fields to a growable buffer.
#[derive(Debug, Default)]
pub struct FieldWriter {
    buf: Vec<u8>,
}

impl FieldWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_byte(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_short(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes the length byte and the bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::ArrayTooLong`] for more than 255 bytes; nothing
    /// is written in that case.
    pub fn write_array(&mut self, data: &[u8]) -> Result<()> {
        let len = u8::try_from(data.len()).map_err(|_| DatabaseError::ArrayTooLong(data.len()))?;
        self.write_byte(len);
        self.buf.extend_from_slice(data);
        Ok(())
    }

    pub fn write_raw(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_is_little_endian() {
        let mut writer = FieldWriter::new();
        writer.write_short(0x0102);
        assert_eq!(writer.into_bytes(), [0x02, 0x01]);

        let mut reader = FieldReader::new(&[0x05, 0x05, 0x01]);
        assert_eq!(reader.read_short().unwrap(), 0x0505);
        assert_eq!(reader.read_byte().unwrap(), 1);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn fields_read_back_in_order() {
        let mut writer = FieldWriter::new();
        writer.write_byte(7);
        writer.write_array(b"abc").unwrap();
        writer.write_array(b"").unwrap();
        writer.write_raw(b"tail bytes");
        let bytes = writer.into_bytes();

        let mut reader = FieldReader::new(&bytes);
        assert_eq!(reader.read_byte().unwrap(), 7);
        assert_eq!(reader.read_array().unwrap(), b"abc");
        assert_eq!(reader.read_array().unwrap(), b"");
        assert_eq!(reader.position(), 6);
        assert_eq!(reader.read_remaining(), b"tail bytes");
        assert_eq!(reader.read_remaining(), b"");
    }

    #[test]
    fn array_of_255_bytes_is_accepted() {
        let mut writer = FieldWriter::new();
        writer.write_array(&[1u8; 255]).unwrap();
        assert_eq!(writer.len(), 256);

        let bytes = writer.into_bytes();
        assert_eq!(bytes[0], 255);
        assert_eq!(FieldReader::new(&bytes).read_array().unwrap().len(), 255);
    }

    #[test]
    fn array_of_256_bytes_fails() {
        let mut writer = FieldWriter::new();
        match writer.write_array(&[1u8; 256]) {
            Err(DatabaseError::ArrayTooLong(len)) => assert_eq!(len, 256),
            other => panic!("expected ArrayTooLong, got: {other:?}"),
        }
        assert!(writer.is_empty());
    }

    #[test]
    fn reading_past_end_is_truncated() {
        let mut reader = FieldReader::new(&[0x05]);
        match reader.read_short() {
            Err(DatabaseError::Truncated { needed, available }) => {
                assert_eq!(needed, 2);
                assert_eq!(available, 1);
            }
            other => panic!("expected Truncated, got: {other:?}"),
        }
    }

    #[test]
    fn array_shorter_than_its_length_byte_is_truncated() {
        let mut reader = FieldReader::new(&[10, 1, 2, 3]);
        assert!(matches!(
            reader.read_array(),
            Err(DatabaseError::Truncated {
                needed: 10,
                available: 3
            })
        ));
    }
}
