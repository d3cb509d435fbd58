use getrandom::fill;
use zeroize::Zeroizing;

use super::{IV_LEN, KEY_LEN, SALT_LEN};
use crate::error::{DatabaseError, Result};

/// Source of the salts, IVs and data passwords written on every save.
///
/// The codec only asks for bytes through this trait, so tests can plug in a
/// deterministic source.
pub trait RandomSource {
    /// Fill buffer with random bytes
    fn fill(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Generate a 32 byte key
    fn key(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut key = Zeroizing::new(vec![0u8; KEY_LEN]);
        self.fill(&mut key)?;
        Ok(key)
    }

    /// Generate a 64 byte salt
    fn salt(&mut self) -> Result<Vec<u8>> {
        let mut salt = vec![0u8; SALT_LEN];
        self.fill(&mut salt)?;
        Ok(salt)
    }

    /// Generate a 16 byte IV
    fn iv(&mut self) -> Result<Vec<u8>> {
        let mut iv = vec![0u8; IV_LEN];
        self.fill(&mut iv)?;
        Ok(iv)
    }
}

/// Cryptographically secure bytes from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        fill(buf).map_err(|_| DatabaseError::Random)
    }
}

/// Predictable bytes for tests: a running counter.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct CountingRandom {
    next: u8,
}

#[cfg(test)]
impl RandomSource for CountingRandom {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        for b in buf {
            *b = self.next;
            self.next = self.next.wrapping_add(1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_lengths_match_format() {
        let mut rng = OsRandom;
        assert_eq!(rng.key().unwrap().len(), 32);
        assert_eq!(rng.salt().unwrap().len(), 64);
        assert_eq!(rng.iv().unwrap().len(), 16);
    }

    #[test]
    fn os_salts_differ() {
        let mut rng = OsRandom;
        assert_ne!(rng.salt().unwrap(), rng.salt().unwrap());
    }

    #[test]
    fn counting_source_is_deterministic() {
        let mut a = CountingRandom::default();
        let mut b = CountingRandom::default();
        assert_eq!(a.iv().unwrap(), b.iv().unwrap());
        assert_eq!(a.iv().unwrap()[0], 16);
    }
}
