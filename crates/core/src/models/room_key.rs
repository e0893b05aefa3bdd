//! Room keys - short invitation codes players share to join a debate

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters a generated room key is drawn from
pub const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Default length of generated room keys
pub const DEFAULT_KEY_LENGTH: usize = 6;

/// Unique, immutable identifier of a room
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomKey(String);

impl RoomKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Generate a random key of `len` characters from [`KEY_ALPHABET`]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Self {
        let key = (0..len)
            .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
            .collect();
        Self(key)
    }

    /// Normalize user input (trim, uppercase). Keys are case-insensitive on entry.
    pub fn parse(input: &str) -> Option<Self> {
        let key = input.trim().to_ascii_uppercase();
        if key.is_empty() || !key.bytes().all(|b| KEY_ALPHABET.contains(&b)) {
            return None;
        }
        Some(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
