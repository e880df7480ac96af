//! Random filler text used to redact a message before deleting it.

use rand::Rng;
use rand::seq::IndexedRandom;

pub const DEFAULT_MIN_LEN: usize = 5;
pub const DEFAULT_MAX_LEN: usize = 30;
/// Digits, ASCII letters, eight spaces and a little punctuation, so the
/// result reads like words rather than a token.
pub const DEFAULT_CHARSET: &str =
    "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ        .,!";

#[derive(Debug, Clone)]
pub struct FillerSpec {
    pub min_len: usize,
    pub max_len: usize,
    pub charset: Vec<char>,
}

impl Default for FillerSpec {
    fn default() -> Self {
        Self {
            min_len: DEFAULT_MIN_LEN,
            max_len: DEFAULT_MAX_LEN,
            charset: DEFAULT_CHARSET.chars().collect(),
        }
    }
}

impl FillerSpec {
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        random_filler(rng, self.min_len, self.max_len, &self.charset)
    }
}

/// A string of `min_len..=max_len` characters drawn uniformly from `charset`.
/// Swapped bounds are tolerated; an empty charset gives an empty string.
pub fn random_filler<R: Rng + ?Sized>(
    rng: &mut R,
    min_len: usize,
    max_len: usize,
    charset: &[char],
) -> String {
    if charset.is_empty() {
        return String::new();
    }
    let (lo, hi) = if min_len <= max_len {
        (min_len, max_len)
    } else {
        (max_len, min_len)
    };
    let len = rng.random_range(lo..=hi);
    (0..len).filter_map(|_| charset.choose(rng)).collect()
}
