//! Filesystem access for database files.

use getrandom::fill;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{DatabaseError, Result};

/// Reads and writes one database file.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Creates a new Storage instance with the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns `true` if the database file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the entire file into memory.
    pub fn load(&self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.path)?)
    }

    /// Loads at most `max` bytes from the start of the file.
    ///
    /// Used to read the header without pulling in the payload.
    pub fn load_prefix(&self, max: usize) -> Result<Vec<u8>> {
        let file = File::open(&self.path)?;
        let mut buf = Vec::with_capacity(max);
        file.take(max as u64).read_to_end(&mut buf)?;
        debug!(bytes = buf.len(), "read file prefix");
        Ok(buf)
    }

    /// Saves data using an atomic write.
    ///
    /// Data goes to a temporary file in the same directory, which is synced
    /// and then renamed over the target, so a crash leaves either the old or
    /// the new database and never a partial one.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, data: &[u8]) -> Result<()> {
        if let Some(parent) = self.parent_dir() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.random_tmp_path()?;

        // fail if the name is taken
        let mut tmp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;

        if let Err(e) = tmp_file.write_all(data).and_then(|()| tmp_file.sync_all()) {
            drop(tmp_file);
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        drop(tmp_file);

        if let Err(e) = self.atomic_replace(&tmp_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        if let Some(parent) = self.parent_dir() {
            sync_dir(parent)?;
        }

        debug!(path = %self.path.display(), bytes = data.len(), "database written");
        Ok(())
    }

    /// Returns the path to the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// `<name>.tmp.<16 hex digits>` next to the target.
    fn random_tmp_path(&self) -> Result<PathBuf> {
        let mut buf = [0u8; 8];
        fill(&mut buf).map_err(|_| DatabaseError::Random)?;

        let rand_string = buf.iter().map(|b| format!("{:02x}", b)).collect::<String>();

        let file_name = self.path.file_name().ok_or_else(|| {
            DatabaseError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "database path has no file name",
            ))
        })?;

        let tmp_name = format!("{}.tmp.{}", file_name.to_string_lossy(), rand_string);

        Ok(self.path.with_file_name(tmp_name))
    }

    /// Replaces the target with `ReplaceFileW` and write-through.
    #[cfg(target_os = "windows")]
    fn atomic_replace(&self, tmp_path: &Path) -> Result<()> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

        if !self.path.exists() {
            fs::rename(tmp_path, &self.path)?;
            return Ok(());
        }

        fn to_wide(s: &OsStr) -> Vec<u16> {
            s.encode_wide().chain(std::iter::once(0)).collect()
        }

        let target_w = to_wide(self.path.as_os_str());
        let tmp_w = to_wide(tmp_path.as_os_str());

        // SAFETY:
        // - Strings are valid UTF-16 and null-terminated
        // - Pointers remain valid during the call
        // - Windows does not retain the pointers after return
        let result = unsafe {
            ReplaceFileW(
                target_w.as_ptr(),
                tmp_w.as_ptr(),
                std::ptr::null(),
                REPLACEFILE_WRITE_THROUGH,
                std::ptr::null(),
                std::ptr::null(),
            )
        };

        if result == 0 {
            return Err(io::Error::last_os_error().into());
        }

        Ok(())
    }

    /// `rename()` is atomic when both paths are on the same filesystem.
    #[cfg(not(target_os = "windows"))]
    fn atomic_replace(&self, tmp_path: &Path) -> Result<()> {
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(not(target_os = "windows"))]
fn sync_dir(dir: &Path) -> Result<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

// Directories can't be opened for syncing on Windows; ReplaceFileW writes through.
#[cfg(target_os = "windows")]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_returns_written_data() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("db.sic"));
        storage.save(b"hello world").unwrap();

        assert_eq!(storage.load().unwrap(), b"hello world");
    }

    #[test]
    fn load_fails_if_file_does_not_exist() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("missing.sic"));

        assert!(matches!(storage.load(), Err(DatabaseError::Io(_))));
    }

    #[test]
    fn load_prefix_stops_at_limit() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("db.sic"));
        storage.save(&[7u8; 5000]).unwrap();

        assert_eq!(storage.load_prefix(1027).unwrap().len(), 1027);
    }

    #[test]
    fn load_prefix_of_short_file_returns_everything() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("db.sic"));
        storage.save(b"abc").unwrap();

        assert_eq!(storage.load_prefix(1027).unwrap(), b"abc");
    }

    #[test]
    fn exists_tracks_file() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("db.sic"));
        assert!(!storage.exists());

        storage.save(b"data").unwrap();
        assert!(storage.exists());
    }

    #[test]
    fn tmp_names_are_unique_and_siblings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.sic");
        let storage = Storage::new(path.clone());

        let a = storage.random_tmp_path().unwrap();
        let b = storage.random_tmp_path().unwrap();

        assert_ne!(a, b);
        assert_ne!(a, path);
        assert_eq!(a.parent(), path.parent());
    }

    #[test]
    fn save_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.sic");
        let storage = Storage::new(path.clone());

        storage.save(b"first").unwrap();
        storage.save(b"second").unwrap();

        assert_eq!(fs::read(path).unwrap(), b"second");
    }

    #[test]
    fn tmp_file_is_removed_after_success() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("db.sic"));
        storage.save(b"data").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();

        assert_eq!(entries, ["db.sic"]);
    }

    #[test]
    fn parent_directory_is_created() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("db.sic");

        Storage::new(nested.clone()).save(b"data").unwrap();

        assert!(nested.exists());
    }
}
