//! The text provider: passages players race against.

use std::sync::Arc;

use rand::Rng;

/// Passages served when no custom corpus is configured.
const BUILTIN_PASSAGES: [&str; 5] = [
    "The quick brown fox jumps over the lazy dog. This pangram contains every letter of the alphabet at least once.",
    "To be or not to be, that is the question. Whether 'tis nobler in the mind to suffer the slings and arrows.",
    "In a hole in the ground there lived a hobbit. Not a nasty, dirty, wet hole filled with the ends of worms.",
    "It was the best of times, it was the worst of times, it was the age of wisdom, it was the age of foolishness.",
    "Call me Ishmael. Some years ago, never mind how long precisely, having little or no money in my purse.",
];

/// A fixed, non-empty set of passages.
///
/// Cheap to clone: the passages live behind an `Arc`, so the registry
/// and every connection handler can hold their own copy.
#[derive(Debug, Clone)]
pub struct Corpus {
    passages: Arc<[String]>,
}

impl Corpus {
    /// Builds a corpus from custom passages.
    ///
    /// Blank passages are skipped. If nothing is left, the built-in
    /// passages are used instead.
    pub fn new<I, S>(passages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let passages: Vec<String> = passages
            .into_iter()
            .map(Into::into)
            .filter(|p| !p.trim().is_empty())
            .collect();
        if passages.is_empty() {
            tracing::warn!("empty corpus, falling back to built-in passages");
            return Self::default();
        }
        Self {
            passages: passages.into(),
        }
    }

    /// Returns a uniformly random passage.
    pub fn pick(&self) -> &str {
        let index = rand::rng().random_range(0..self.passages.len());
        &self.passages[index]
    }

    /// All passages, in the order they were supplied.
    pub fn passages(&self) -> &[String] {
        &self.passages
    }

    /// Number of passages (never zero).
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self {
            passages: BUILTIN_PASSAGES.iter().map(|p| p.to_string()).collect(),
        }
    }
}
