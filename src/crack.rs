//! Dictionary attack on a database header.
//!
//! Candidates are tested with [`Verifier`] only, so the payload is never
//! decrypted no matter how many passwords are tried. Workers share the
//! immutable header and nothing else.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::config::CodecConfig;
use crate::error::{DatabaseError, Result};
use crate::format::Header;
use crate::verify::Verifier;

/// Lazily reads candidate passwords, one per line.
///
/// Lines are raw bytes with a trailing `\n`, `\r\n` or `\r` removed; an empty
/// line is the empty password. Restart by opening the file again.
#[derive(Debug)]
pub struct Dictionary<R> {
    reader: R,
}

impl Dictionary<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> Dictionary<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> Iterator for Dictionary<R> {
    type Item = io::Result<Zeroizing<Vec<u8>>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Zeroizing::new(Vec::new());
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => None,
            Ok(_) => {
                chomp(&mut line);
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

fn chomp(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\n') {
        line.pop();
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
}

/// The matching candidate.
#[derive(Debug)]
pub struct Found {
    password: Zeroizing<Vec<u8>>,
    position: usize,
}

impl Found {
    pub fn password(&self) -> &[u8] {
        &self.password
    }

    /// 1-based position of the password in the candidate sequence.
    pub fn position(&self) -> usize {
        self.position
    }
}

#[derive(Debug)]
pub struct CrackReport {
    found: Option<Found>,
    attempts: u64,
    cancelled: bool,
}

impl CrackReport {
    pub fn found(&self) -> Option<&Found> {
        self.found.as_ref()
    }

    pub fn into_found(self) -> Option<Found> {
        self.found
    }

    /// Number of candidates actually tested.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// `true` if the scan was stopped through the cancel flag before a match.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Parallel candidate scan over one header.
#[derive(Debug)]
pub struct Cracker {
    verifier: Verifier,
    threads: Option<usize>,
    cancel: Arc<AtomicBool>,
}

impl Cracker {
    pub fn new(header: Header, config: CodecConfig) -> Self {
        Self::from_verifier(Verifier::new(header, config))
    }

    pub fn from_verifier(verifier: Verifier) -> Self {
        Self {
            verifier,
            threads: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Worker count; the global rayon pool is used when unset.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Setting the flag stops the scan from taking further candidates.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    /// Tests candidates until one matches, the sequence ends, or the scan is
    /// cancelled.
    ///
    /// `on_attempt` is called from worker threads with the 1-based position
    /// and the candidate before it is tested. Failures of individual
    /// candidates are never errors; `Err` only comes from building the
    /// thread pool.
    pub fn run<I, F>(&self, candidates: I, on_attempt: F) -> Result<CrackReport>
    where
        I: IntoIterator<Item = Zeroizing<Vec<u8>>>,
        I::IntoIter: Send,
        F: Fn(usize, &[u8]) + Sync,
    {
        let attempts = AtomicU64::new(0);
        let matched = AtomicBool::new(false);
        let candidates = candidates.into_iter();

        let scan = || {
            candidates
                .enumerate()
                .take_while(|_| {
                    !matched.load(Ordering::Relaxed) && !self.cancel.load(Ordering::Relaxed)
                })
                .par_bridge()
                .find_map_any(|(index, candidate)| {
                    let position = index + 1;
                    attempts.fetch_add(1, Ordering::Relaxed);
                    on_attempt(position, &candidate);

                    if self.verifier.verify(&candidate) {
                        matched.store(true, Ordering::Relaxed);
                        Some(Found {
                            password: candidate,
                            position,
                        })
                    } else {
                        None
                    }
                })
        };

        let found = match self.threads {
            Some(threads) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| DatabaseError::InvalidParameter(e.to_string()))?;
                debug!(threads, "cracking on dedicated pool");
                pool.install(scan)
            }
            None => scan(),
        };

        let report = CrackReport {
            cancelled: found.is_none() && self.cancel.load(Ordering::Relaxed),
            found,
            attempts: attempts.into_inner(),
        };
        info!(
            attempts = report.attempts,
            found = report.found.is_some(),
            cancelled = report.cancelled,
            "dictionary scan finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::OsRandom;
    use crate::database::{decrypt_database, encrypt_database};
    use crate::format;
    use std::io::Cursor;
    use std::sync::Mutex;

    fn candidates(words: &[&str]) -> Vec<Zeroizing<Vec<u8>>> {
        words
            .iter()
            .map(|w| Zeroizing::new(w.as_bytes().to_vec()))
            .collect()
    }

    fn database(password: &[u8]) -> Vec<u8> {
        encrypt_database(
            b"hello world",
            password,
            &CodecConfig::default(),
            &mut OsRandom,
        )
        .unwrap()
    }

    fn header(data: &[u8]) -> Header {
        format::parse_header(data, &CodecConfig::default()).unwrap()
    }

    #[test]
    fn dictionary_strips_line_endings() {
        let dict = Dictionary::new(Cursor::new(b"aaa\ncorrect\r\n\nlast".to_vec()));
        let lines: Vec<Vec<u8>> = dict.map(|l| l.unwrap().to_vec()).collect();

        assert_eq!(
            lines,
            vec![b"aaa".to_vec(), b"correct".to_vec(), Vec::new(), b"last".to_vec()]
        );
    }

    #[test]
    fn dictionary_accepts_non_utf8() {
        let mut dict = Dictionary::new(Cursor::new(vec![0xff, 0xfe, b'\n']));
        assert_eq!(dict.next().unwrap().unwrap().as_slice(), &[0xff, 0xfe]);
        assert!(dict.next().is_none());
    }

    #[test]
    fn finds_password_at_its_position() {
        let data = database(b"correct");
        let cracker = Cracker::new(header(&data), CodecConfig::default()).threads(1);

        let tried = Mutex::new(Vec::new());
        let report = cracker
            .run(candidates(&["aaa", "correct", "zzz"]), |position, _| {
                tried.lock().unwrap().push(position)
            })
            .unwrap();

        let found = report.found().unwrap();
        assert_eq!(found.password(), b"correct");
        assert_eq!(found.position(), 2);
        assert!(!report.cancelled());
        assert!(tried.lock().unwrap().starts_with(&[1, 2]));
        assert_eq!(report.attempts(), tried.lock().unwrap().len() as u64);
    }

    #[test]
    fn never_touches_the_payload() {
        let mut data = database(b"correct");
        // wreck the payload: loading fails, cracking must not care
        let len = data.len();
        data.truncate(len - 5);
        assert!(decrypt_database(&data, b"correct", &CodecConfig::default()).is_err());

        let report = Cracker::new(header(&data), CodecConfig::default())
            .run(candidates(&["aaa", "correct", "zzz"]), |_, _| {})
            .unwrap();
        assert_eq!(report.found().unwrap().position(), 2);
    }

    #[test]
    fn exhausted_dictionary_reports_nothing() {
        let data = database(b"correct");
        let report = Cracker::new(header(&data), CodecConfig::default())
            .threads(2)
            .run(candidates(&["a", "b", "c", "d"]), |_, _| {})
            .unwrap();

        assert!(report.found().is_none());
        assert_eq!(report.attempts(), 4);
        assert!(!report.cancelled());
    }

    #[test]
    fn cancelled_scan_stops_early() {
        let data = database(b"correct");
        let flag = Arc::new(AtomicBool::new(true));
        let report = Cracker::new(header(&data), CodecConfig::default())
            .cancel_flag(flag)
            .run(candidates(&["aaa", "correct"]), |_, _| {})
            .unwrap();

        assert!(report.found().is_none());
        assert_eq!(report.attempts(), 0);
        assert!(report.cancelled());
    }

    #[test]
    fn dictionary_file_drives_the_scan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        std::fs::write(&path, "aaa\ncorrect\nzzz\n").unwrap();

        let data = database(b"correct");
        let words = Dictionary::open(&path).unwrap().map_while(|line| line.ok());
        let report = Cracker::new(header(&data), CodecConfig::default())
            .run(words, |_, _| {})
            .unwrap();

        assert_eq!(report.into_found().unwrap().password(), b"correct");
    }
}
