//! File format handling for SafeInCloud databases.
//!
//! Provides the field codec and the parsing and serialization of the file
//! layout. Nothing in here performs cryptography: the checksum block and the
//! payload are carried as opaque ciphertext.

use crate::config::CodecConfig;
use crate::error::{DatabaseError, Result};

pub mod checksum;
pub mod field;
pub mod v1;

pub use checksum::ChecksumBlock;
pub use field::{FieldReader, FieldWriter, MAX_ARRAY_LEN};
pub use v1::{DatabaseFile, Header};

/// Magic number at offset 0, stored little-endian.
pub const MAGIC: u16 = 0x0505;
/// Length of magic field.
pub const MAGIC_LEN: usize = 2;
/// Length of version field.
pub const VER_LEN: usize = 1;
/// The only format version there is.
pub const VERSION_V1: u8 = 1;

/// Reads and checks magic and version.
///
/// # Errors
///
/// Returns [`DatabaseError::Format`] if either differs from `config`, and
/// [`DatabaseError::Truncated`] if the data is too short to hold them.
fn read_preamble(reader: &mut FieldReader<'_>, config: &CodecConfig) -> Result<()> {
    let magic = reader.read_short()?;
    if magic != config.magic() {
        return Err(DatabaseError::Format(format!(
            "bad magic {magic:#06x}, expected {:#06x}",
            config.magic()
        )));
    }

    let version = reader.read_byte()?;
    if version != config.version() {
        return Err(DatabaseError::Format(format!(
            "unsupported version {version}, expected {}",
            config.version()
        )));
    }
    Ok(())
}

fn write_preamble(writer: &mut FieldWriter, config: &CodecConfig) {
    writer.write_short(config.magic());
    writer.write_byte(config.version());
}

/// Parses just the header, ignoring whatever follows it.
///
/// `data` may be a prefix of the file as long as it covers the header.
pub fn parse_header(data: &[u8], config: &CodecConfig) -> Result<Header> {
    let mut reader = FieldReader::new(data);
    read_preamble(&mut reader, config)?;
    Header::read_fields(&mut reader)
}

/// Parses a complete database file.
pub fn parse(data: &[u8], config: &CodecConfig) -> Result<DatabaseFile> {
    let mut reader = FieldReader::new(data);
    read_preamble(&mut reader, config)?;
    let header = Header::read_fields(&mut reader)?;
    let payload = reader.read_remaining().to_vec();
    Ok(DatabaseFile::new(header, payload))
}

/// Serializes a database file in file-format order.
///
/// # Errors
///
/// Returns [`DatabaseError::ArrayTooLong`] if a header field exceeds 255 bytes.
pub fn serialize(file: &DatabaseFile, config: &CodecConfig) -> Result<Vec<u8>> {
    let mut writer = FieldWriter::with_capacity(Header::MAX_LEN + file.payload().len());
    write_preamble(&mut writer, config);
    file.header().write_fields(&mut writer)?;
    writer.write_raw(file.payload());
    Ok(writer.into_bytes())
}
