//! Randomized object contents.

use bytes::Bytes;
use rand::RngCore;

/// Size of every object written by the engine.
pub const PAYLOAD_SIZE: usize = 8 * 1024;

/// Random contents of a single object.
///
/// A payload is created for exactly one write and dropped afterwards.
#[derive(Clone, Debug)]
pub struct Payload {
    bytes: Bytes,
}

impl Payload {
    /// Creates a new payload of [`PAYLOAD_SIZE`] random bytes.
    pub fn random() -> Self {
        let mut buf = vec![0; PAYLOAD_SIZE];
        rand::rng().fill_bytes(&mut buf);
        Self { bytes: buf.into() }
    }

    /// Consumes the payload and returns the underlying buffer.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_has_fixed_size() {
        let bytes = Payload::random().into_bytes();
        assert_eq!(bytes.len(), PAYLOAD_SIZE);
        assert_eq!(bytes.len(), 8192);
    }

    #[test]
    fn payloads_are_random() {
        let a = Payload::random().into_bytes();
        let b = Payload::random().into_bytes();
        assert_ne!(a, b);
    }
}
