//! Human-readable test-case identifiers: `TC-YYYYMMDD-XXXX`.
//!
//! The random suffix source is injectable so tests can script collisions.
//! Collision checking against stored issues happens in the repository, which
//! keeps drawing candidates from here until one is free.

use chrono::NaiveDate;
use rand::seq::IndexedRandom;

/// Alphabet for the random suffix (uppercase ASCII letters and digits).
pub const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of random characters in the suffix.
pub const SUFFIX_LEN: usize = 4;

/// Source of random identifier suffixes.
pub trait SuffixSource: Send + Sync {
    /// Draw a fresh `SUFFIX_LEN`-character suffix over `SUFFIX_ALPHABET`.
    fn draw(&self) -> String;
}

/// Production source backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl SuffixSource for ThreadRngSource {
    fn draw(&self) -> String {
        let mut rng = rand::rng();
        (0..SUFFIX_LEN)
            .filter_map(|_| SUFFIX_ALPHABET.choose(&mut rng))
            .map(|&b| b as char)
            .collect()
    }
}

/// Builds candidate identifiers from a date and a suffix source.
pub struct TestCaseIdGenerator {
    source: Box<dyn SuffixSource>,
}

impl TestCaseIdGenerator {
    pub fn new(source: Box<dyn SuffixSource>) -> Self {
        Self { source }
    }

    /// One candidate identifier for `date`. Not checked for collisions.
    pub fn candidate(&self, date: NaiveDate) -> String {
        format!("TC-{}-{}", date.format("%Y%m%d"), self.source.draw())
    }
}

impl Default for TestCaseIdGenerator {
    fn default() -> Self {
        Self::new(Box::new(ThreadRngSource))
    }
}

impl std::fmt::Debug for TestCaseIdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCaseIdGenerator").finish_non_exhaustive()
    }
}
