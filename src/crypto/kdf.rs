use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use zeroize::Zeroizing;

use super::KEY_LEN;
use crate::error::{DatabaseError, Result};

/// PBKDF2-HMAC-SHA1 into `out`; the output length is `out.len()`.
pub fn derive(password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]) -> Result<()> {
    if iterations < 1 {
        return Err(DatabaseError::InvalidParameter(
            "PBKDF2 iterations must be >= 1".into(),
        ));
    }
    if out.is_empty() {
        return Err(DatabaseError::InvalidParameter(
            "PBKDF2 output length must be >= 1".into(),
        ));
    }

    pbkdf2_hmac::<Sha1>(password, salt, iterations, out);
    Ok(())
}

/// Derives a 256-bit key.
pub fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    derive(password, salt, iterations, key.as_mut_slice())?;
    Ok(key)
}
