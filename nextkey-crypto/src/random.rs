//! Random strings for card keys.

use rand::Rng;
use serde::{Deserialize, Serialize};

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Shortest random body of a generated card key.
pub const MIN_KEY_LENGTH: usize = 6;
/// Longest random body of a generated card key.
pub const MAX_KEY_LENGTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    Letters,
    #[default]
    Alphanumeric,
}

impl Charset {
    fn bytes(self) -> &'static [u8] {
        match self {
            Self::Letters => LETTERS,
            Self::Alphanumeric => ALPHANUMERIC,
        }
    }
}

/// Returns `length` characters drawn uniformly from `charset` using the OS RNG.
pub fn random_string(length: usize, charset: Charset) -> String {
    let chars = charset.bytes();
    let mut rng = rand::rngs::OsRng;
    (0..length)
        .map(|_| char::from(chars[rng.gen_range(0..chars.len())]))
        .collect()
}

/// Builds `prefix + random + suffix`, with the random body clamped to 6..=32.
pub fn generate_card_key(prefix: &str, suffix: &str, length: usize, charset: Charset) -> String {
    let length = length.clamp(MIN_KEY_LENGTH, MAX_KEY_LENGTH);
    format!("{prefix}{}{suffix}", random_string(length, charset))
}
