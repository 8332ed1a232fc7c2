//! Generation of object keys for write jobs.
//!
//! Every key consists of the fixed [`KEY_MARKER`], a random alphanumeric prefix and the sequence
//! index of the job that writes it:
//!
//! ```text
//! s3tester-Xh3k9QbT0a1LmZ2c-17
//! ```
//!
//! The sequence index makes keys unique within one run even if two random prefixes collide.
//! Across runs, uniqueness is only probabilistic and depends on the prefix length.

use std::fmt;

use rand::Rng;
use rand::distr::Alphanumeric;
use thiserror::Error;

/// Literal marker at the start of every generated key.
pub const KEY_MARKER: &str = "s3tester-";

/// Separator between the random prefix and the sequence index.
const SEPARATOR: char = '-';

/// Errors produced by [`ObjectKey::generate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// The random prefix must contain at least one character.
    #[error("object key prefix length must be at least 1")]
    EmptyPrefix,
}

/// The key under which a single write job stores its object.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    key: String,
    prefix_length: usize,
    sequence_index: u64,
}

impl ObjectKey {
    /// Generates a key with `prefix_length` random characters for the given job.
    ///
    /// The characters are drawn independently and uniformly from `[A-Za-z0-9]` using the
    /// thread-local CSPRNG, which is seeded from the operating system.
    pub fn generate(prefix_length: usize, sequence_index: u64) -> Result<Self, KeyError> {
        if prefix_length == 0 {
            return Err(KeyError::EmptyPrefix);
        }

        let mut rng = rand::rng();
        let mut key = String::with_capacity(KEY_MARKER.len() + prefix_length + 21);
        key.push_str(KEY_MARKER);
        key.extend((0..prefix_length).map(|_| char::from(rng.sample(Alphanumeric))));
        key.push(SEPARATOR);
        key.push_str(&sequence_index.to_string());

        Ok(Self {
            key,
            prefix_length,
            sequence_index,
        })
    }

    /// Returns the full key.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Returns the random portion of the key.
    pub fn prefix(&self) -> &str {
        &self.key[KEY_MARKER.len()..KEY_MARKER.len() + self.prefix_length]
    }

    /// Returns the sequence index of the job this key was generated for.
    pub fn sequence_index(&self) -> u64 {
        self.sequence_index
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn key_layout() {
        let key = ObjectKey::generate(32, 17).unwrap();

        assert!(key.as_str().starts_with(KEY_MARKER));
        assert!(key.as_str().ends_with("-17"));
        assert_eq!(key.prefix().len(), 32);
        assert!(key.prefix().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(key.sequence_index(), 17);
    }

    #[test]
    fn length_is_deterministic() {
        for (prefix_length, index, digits) in [(1, 1, 1), (8, 10, 2), (32, 12345, 5)] {
            let key = ObjectKey::generate(prefix_length, index).unwrap();
            assert_eq!(
                key.as_str().len(),
                KEY_MARKER.len() + prefix_length + 1 + digits
            );
        }
    }

    #[test]
    fn empty_prefix_is_rejected() {
        assert_eq!(ObjectKey::generate(0, 1), Err(KeyError::EmptyPrefix));
    }

    #[test]
    fn index_keeps_keys_apart() {
        // A one-character prefix collides constantly, the index must still separate the keys.
        let keys: HashSet<_> = (1..=500)
            .map(|i| ObjectKey::generate(1, i).unwrap().to_string())
            .collect();
        assert_eq!(keys.len(), 500);
    }

    #[test]
    fn prefix_uses_whole_alphabet() {
        let seen: HashSet<char> = (0..200)
            .flat_map(|_| ObjectKey::generate(64, 1).unwrap().prefix().chars().collect::<Vec<_>>())
            .collect();

        assert!(seen.iter().any(char::is_ascii_lowercase));
        assert!(seen.iter().any(char::is_ascii_uppercase));
        assert!(seen.iter().any(char::is_ascii_digit));
    }
}
