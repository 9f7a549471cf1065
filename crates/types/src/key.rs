use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a compressed secp256k1/r1 public key.
pub const PUBLIC_KEY_BYTES: usize = 33;

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("public key is not valid hexadecimal")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("public key must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Producer signing key as carried in the block-producer schedule.
///
/// The all-zero key is the "empty" sentinel: registration rejects it and
/// deactivation resets a producer's key to it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey([u8; PUBLIC_KEY_BYTES]);

impl PublicKey {
    pub const EMPTY: PublicKey = PublicKey([0u8; PUBLIC_KEY_BYTES]);

    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_BYTES]) -> Self {
        PublicKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_BYTES] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; PUBLIC_KEY_BYTES]
    }
}

impl Default for PublicKey {
    fn default() -> Self {
        PublicKey::EMPTY
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl From<PublicKey> for String {
    fn from(value: PublicKey) -> Self {
        hex::encode(value.0)
    }
}

impl TryFrom<String> for PublicKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let decoded = hex::decode(value.trim())?;
        let actual = decoded.len();
        let bytes: [u8; PUBLIC_KEY_BYTES] =
            decoded.try_into().map_err(|_| KeyError::InvalidLength {
                expected: PUBLIC_KEY_BYTES,
                actual,
            })?;
        Ok(PublicKey(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_key_is_empty() {
        assert!(PublicKey::default().is_empty());
        assert!(!PublicKey::from_bytes([2u8; PUBLIC_KEY_BYTES]).is_empty());
    }

    #[test]
    fn hex_roundtrip_and_length_check() {
        let key = PublicKey::from_bytes([0xAB; PUBLIC_KEY_BYTES]);
        let text: String = key.into();
        assert_eq!(PublicKey::try_from(text).unwrap(), key);

        let err = PublicKey::try_from("abcd".to_string()).unwrap_err();
        assert!(matches!(err, KeyError::InvalidLength { actual: 2, .. }));
    }
}
