//! Whole-database load and save.
//!
//! A save always writes a completely fresh file: new salts, new IVs and a new
//! random data password. There is no in-place update.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::config::CodecConfig;
use crate::crypto::{self, OsRandom, RandomSource, derive_key};
use crate::error::{DatabaseError, Result};
use crate::format::{self, ChecksumBlock, DatabaseFile, Header};
use crate::storage::Storage;
use crate::verify::{Verifier, open_checksum};

/// Decrypts and inflates a complete database image.
///
/// # Errors
///
/// - [`DatabaseError::Format`] / [`DatabaseError::Truncated`] for a malformed file,
///   before any key derivation happens
/// - [`DatabaseError::WrongPasswordOrCorrupt`] or [`DatabaseError::WrongPassword`]
///   for a wrong password
/// - [`DatabaseError::CorruptData`] if the decrypted payload does not inflate
pub fn decrypt_database(
    data: &[u8],
    password: &[u8],
    config: &CodecConfig,
) -> Result<Zeroizing<Vec<u8>>> {
    let file = format::parse(data, config)?;
    debug!(
        payload_len = file.payload().len(),
        "parsed database header"
    );

    let block = open_checksum(file.header(), password, config)?;

    let compressed = crypto::decrypt(block.data_password(), block.data_iv(), file.payload())?;
    drop(block);

    inflate(&compressed)
}

/// Compresses and encrypts `payload` into a complete database image.
pub fn encrypt_database(
    payload: &[u8],
    password: &[u8],
    config: &CodecConfig,
    rng: &mut impl RandomSource,
) -> Result<Vec<u8>> {
    config.validate()?;

    let user_key_salt = rng.salt()?;
    let user_key_iv = rng.iv()?;
    let user_key = derive_key(password, &user_key_salt, config.user_key_iterations())?;

    let data_salt = rng.salt()?;
    let data_iv = rng.iv()?;
    let data_password = rng.key()?;
    let data_key = derive_key(&data_password, &data_salt, config.checksum_iterations())?;

    let block = ChecksumBlock::new(data_iv, data_password.to_vec(), data_key.to_vec());
    let encrypted_checksum = crypto::encrypt(
        user_key.as_slice(),
        &user_key_iv,
        &block.to_bytes()?,
    )?;
    drop(user_key);

    let compressed = deflate(payload)?;
    let encrypted_payload = crypto::encrypt(block.data_password(), block.data_iv(), &compressed)?;
    drop(block);

    let header = Header::new(user_key_salt, user_key_iv, data_salt, encrypted_checksum);
    format::serialize(&DatabaseFile::new(header, encrypted_payload), config)
}

fn deflate(payload: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload)?;
    Ok(Zeroizing::new(encoder.finish()?))
}

fn inflate(compressed: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let mut payload = Zeroizing::new(Vec::new());
    ZlibDecoder::new(compressed)
        .read_to_end(&mut payload)
        .map_err(|e| DatabaseError::CorruptData(e.to_string()))?;
    Ok(payload)
}

/// A database file on disk together with the codec parameters it uses.
#[derive(Debug, Clone)]
pub struct Database {
    storage: Storage,
    config: CodecConfig,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_config(path, CodecConfig::default())
    }

    pub fn with_config(path: impl Into<PathBuf>, config: CodecConfig) -> Self {
        Self::with_storage(Storage::new(path), config)
    }

    pub fn with_storage(storage: Storage, config: CodecConfig) -> Self {
        Self { storage, config }
    }

    pub fn path(&self) -> &Path {
        self.storage.path()
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn exists(&self) -> bool {
        self.storage.exists()
    }

    /// Reads and parses only the header; the payload is not read from disk.
    pub fn read_header(&self) -> Result<Header> {
        let prefix = self.storage.load_prefix(Header::MAX_LEN)?;
        format::parse_header(&prefix, &self.config)
    }

    /// A [`Verifier`] for this file's header.
    pub fn verifier(&self) -> Result<Verifier> {
        Ok(Verifier::new(self.read_header()?, self.config))
    }

    /// Checks `password` without decrypting the payload.
    ///
    /// Wrong passwords give `Ok(false)`; `Err` is kept for files that can't be
    /// read or parsed at all.
    pub fn verify_password(&self, password: &[u8]) -> Result<bool> {
        Ok(self.verifier()?.verify(password))
    }

    /// Loads and decrypts the database, returning the plaintext payload.
    pub fn load(&self, password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let data = self.storage.load()?;
        let payload = decrypt_database(&data, password, &self.config)?;
        info!(path = %self.path().display(), bytes = payload.len(), "database loaded");
        Ok(payload)
    }

    /// Encrypts and saves `payload`, replacing the file.
    pub fn save(&self, password: &[u8], payload: &[u8]) -> Result<()> {
        self.save_with_rng(password, payload, &mut OsRandom)
    }

    /// [`Database::save`] drawing salts, IVs and the data password from `rng`.
    pub fn save_with_rng(
        &self,
        password: &[u8],
        payload: &[u8],
        rng: &mut impl RandomSource,
    ) -> Result<()> {
        let data = encrypt_database(payload, password, &self.config, rng)?;
        self.storage.save(&data)?;
        info!(path = %self.path().display(), bytes = data.len(), "database saved");
        Ok(())
    }

    /// Re-encrypts the database under a new password.
    pub fn change_password(&self, old_password: &[u8], new_password: &[u8]) -> Result<()> {
        let payload = self.load(old_password)?;
        self.save(new_password, &payload)
    }
}
