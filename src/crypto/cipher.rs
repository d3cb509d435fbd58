use aes::Aes256;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use zeroize::Zeroizing;

use super::{BLOCK_LEN, IV_LEN, KEY_LEN};
use crate::error::{DatabaseError, Result};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

fn invalid_key_or_iv(key: &[u8], iv: &[u8]) -> DatabaseError {
    DatabaseError::Format(format!(
        "AES-256-CBC needs a {KEY_LEN} byte key and {IV_LEN} byte IV, got {} and {}",
        key.len(),
        iv.len()
    ))
}

/// Encrypt plaintext with AES-256-CBC and PKCS#7 padding
pub fn encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| invalid_key_or_iv(key, iv))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt ciphertext
///
/// A ciphertext that is not a whole number of blocks, or whose padding does
/// not check out, is reported as [`DatabaseError::WrongPasswordOrCorrupt`].
/// Most wrong keys end up here, though not all of them.
pub fn decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = Aes256CbcDec::new_from_slices(key, iv).map_err(|_| invalid_key_or_iv(key, iv))?;

    if ciphertext.len() % BLOCK_LEN != 0 {
        return Err(DatabaseError::WrongPasswordOrCorrupt);
    }

    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| DatabaseError::WrongPasswordOrCorrupt)?;
    Ok(Zeroizing::new(plaintext))
}
