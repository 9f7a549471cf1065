use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors that can occur when parsing an account name string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("name must be at most {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
    #[error("character {0:?} is not allowed in a name")]
    InvalidCharacter(char),
    #[error("the thirteenth character of a name must be one of .12345abcdefghij")]
    InvalidTrailingCharacter,
}

/// Maximum length of an encoded name.
pub const NAME_MAX_LEN: usize = 13;

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Account identity packed into 64 bits, five bits per character.
///
/// The first twelve characters use the full base-32 alphabet
/// `.12345abcdefghijklmnopqrstuvwxyz`; an optional thirteenth character is
/// limited to the first sixteen symbols. `Name(0)` is the empty name and is
/// never a valid principal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(u64);

impl Name {
    /// The empty name.
    pub const EMPTY: Name = Name(0);

    pub const fn from_raw(value: u64) -> Self {
        Name(value)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Encode a name string.
    pub fn new(text: &str) -> Result<Self, NameError> {
        let bytes = text.as_bytes();
        if bytes.len() > NAME_MAX_LEN {
            return Err(NameError::TooLong {
                max: NAME_MAX_LEN,
                actual: bytes.len(),
            });
        }

        let mut value = 0u64;
        for (i, &ch) in bytes.iter().enumerate() {
            let symbol = char_to_symbol(ch).ok_or(NameError::InvalidCharacter(ch as char))?;
            if i < 12 {
                value |= (symbol & 0x1f) << (64 - 5 * (i + 1));
            } else {
                if symbol > 0x0f {
                    return Err(NameError::InvalidTrailingCharacter);
                }
                value |= symbol;
            }
        }

        Ok(Name(value))
    }
}

fn char_to_symbol(ch: u8) -> Option<u64> {
    match ch {
        b'a'..=b'z' => Some((ch - b'a') as u64 + 6),
        b'1'..=b'5' => Some((ch - b'1') as u64 + 1),
        b'.' => Some(0),
        _ => None,
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = [b'.'; NAME_MAX_LEN];
        let mut tmp = self.0;
        for i in 0..NAME_MAX_LEN {
            let mask = if i == 0 { 0x0f } else { 0x1f };
            out[NAME_MAX_LEN - 1 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= if i == 0 { 4 } else { 5 };
        }

        let len = out
            .iter()
            .rposition(|&c| c != b'.')
            .map(|pos| pos + 1)
            .unwrap_or(0);
        // Every byte comes from CHARMAP, which is ASCII.
        f.write_str(std::str::from_utf8(&out[..len]).map_err(|_| fmt::Error)?)
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Name::new(s)
    }
}

impl From<Name> for String {
    fn from(value: Name) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Name {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Name::new(&value)
    }
}

impl TryFrom<&str> for Name {
    type Error = NameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Name::new(value)
    }
}
