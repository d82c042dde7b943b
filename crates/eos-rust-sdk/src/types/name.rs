//! Account, action and permission names.
//!
//! Names are short base-32 strings (up to 13 characters) that the chain
//! packs into a single `u64` on the wire.

use crate::error::{EosError, EosResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The longest name the chain can encode.
pub const MAX_NAME_LENGTH: usize = 13;

/// Symbols a name may contain, in wire order.
pub const NAME_CHARSET: &str = ".12345abcdefghijklmnopqrstuvwxyz";

/// A validated EOS name.
///
/// Ordering is plain lexicographic ordering of the textual form, which is
/// the order scopes and authorizations are canonicalized in.
///
/// # Example
///
/// ```rust
/// use eos_rust_sdk::types::Name;
///
/// let name = Name::new("inita").unwrap();
/// assert_eq!(name.as_str(), "inita");
/// assert!(Name::new("Inita").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(String);

impl Name {
    /// Parses and validates a name.
    ///
    /// # Errors
    ///
    /// Returns [`EosError::InvalidName`] if the name is empty, too long,
    /// ends with `.` or contains characters outside [`NAME_CHARSET`].
    pub fn new(name: impl Into<String>) -> EosResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(EosError::InvalidName("name is empty".into()));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(EosError::InvalidName(format!(
                "'{name}' is longer than {MAX_NAME_LENGTH} characters"
            )));
        }
        for (i, c) in name.bytes().enumerate() {
            let Some(symbol) = char_to_symbol(c) else {
                return Err(EosError::InvalidName(format!(
                    "'{name}' contains invalid character '{}'",
                    c as char
                )));
            };
            // the 13th character only has 4 bits
            if i == MAX_NAME_LENGTH - 1 && symbol > 0x0f {
                return Err(EosError::InvalidName(format!(
                    "'{name}' has an invalid 13th character '{}'",
                    c as char
                )));
            }
        }
        // trailing dots pack to the same u64 as the name without them
        if name.ends_with('.') {
            return Err(EosError::InvalidName(format!("'{name}' ends with '.'")));
        }
        Ok(Self(name))
    }

    /// Wraps a name literal known to be valid.
    pub(crate) fn from_static(name: &'static str) -> Self {
        debug_assert!(Self::new(name).is_ok(), "invalid name literal {name}");
        Self(name.to_string())
    }

    /// Returns the textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Packs the name into its `u64` wire form.
    pub fn to_u64(&self) -> u64 {
        let bytes = self.0.as_bytes();
        let mut value = 0u64;
        for i in 0..MAX_NAME_LENGTH {
            let mut symbol = bytes
                .get(i)
                .and_then(|c| char_to_symbol(*c))
                .unwrap_or(0);
            if i < MAX_NAME_LENGTH - 1 {
                symbol &= 0x1f;
                symbol <<= 64 - 5 * (i as u64 + 1);
            } else {
                symbol &= 0x0f;
            }
            value |= symbol;
        }
        value
    }
}

fn char_to_symbol(c: u8) -> Option<u64> {
    match c {
        b'a'..=b'z' => Some(u64::from(c - b'a') + 6),
        b'1'..=b'5' => Some(u64::from(c - b'1') + 1),
        b'.' => Some(0),
        _ => None,
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Name {
    type Err = EosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Name {
    type Error = EosError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<String> for Name {
    type Error = EosError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Name {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}
