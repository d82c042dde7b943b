//! Recoverable secp256k1 signatures.

use crate::crypto::hash::sha2_256;
use crate::crypto::keys::PublicKey;
use crate::error::{EosError, EosResult};
use k256::ecdsa::{RecoveryId, Signature as K256Signature, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Signature length in bytes: one header byte followed by `r || s`.
pub const SIGNATURE_LENGTH: usize = 65;

// compact header: 27 + 4 (compressed) + recovery id
const HEADER_OFFSET: u8 = 31;

/// A compact recoverable signature.
///
/// Rendered as the hex string of its 65 bytes; that string is what ends up
/// in a transaction's `signatures`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    bytes: [u8; SIGNATURE_LENGTH],
}

impl Signature {
    pub(crate) fn from_parts(signature: &K256Signature, recovery_id: RecoveryId) -> Self {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[0] = HEADER_OFFSET + recovery_id.to_byte();
        bytes[1..].copy_from_slice(&signature.to_bytes());
        Self { bytes }
    }

    /// Creates a signature from its 65 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> EosResult<Self> {
        let bytes: [u8; SIGNATURE_LENGTH] = bytes.try_into().map_err(|_| {
            EosError::InvalidSignature(format!(
                "expected {} bytes, got {}",
                SIGNATURE_LENGTH,
                bytes.len()
            ))
        })?;
        let signature = Self { bytes };
        signature.parts()?;
        Ok(signature)
    }

    /// Parses the hex form.
    pub fn from_hex(hex_str: &str) -> EosResult<Self> {
        let bytes = hex::decode(hex_str.trim())?;
        Self::from_bytes(&bytes)
    }

    /// Returns the raw bytes.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        self.bytes
    }

    /// Returns the hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Whether the node accepts this signature.
    ///
    /// Both `r` and `s` must have the top bit of their first byte clear and
    /// must not start with a zero byte unless the next byte needs it.
    pub fn is_canonical(&self) -> bool {
        let (r, s) = self.bytes[1..].split_at(32);
        [r, s]
            .iter()
            .all(|half| half[0] & 0x80 == 0 && !(half[0] == 0 && half[1] & 0x80 == 0))
    }

    fn parts(&self) -> EosResult<(K256Signature, RecoveryId)> {
        let recovery_id = self
            .bytes[0]
            .checked_sub(HEADER_OFFSET)
            .and_then(RecoveryId::from_byte)
            .ok_or_else(|| {
                EosError::InvalidSignature(format!("bad header byte 0x{:02x}", self.bytes[0]))
            })?;
        let signature = K256Signature::from_slice(&self.bytes[1..])
            .map_err(|e| EosError::InvalidSignature(e.to_string()))?;
        Ok((signature, recovery_id))
    }

    /// Recovers the public key that signed `buf`.
    pub fn recover(&self, buf: &[u8]) -> EosResult<PublicKey> {
        let (signature, recovery_id) = self.parts()?;
        let key = VerifyingKey::recover_from_prehash(&sha2_256(buf), &signature, recovery_id)
            .map_err(|e| EosError::InvalidSignature(e.to_string()))?;
        Ok(PublicKey::from_verifying_key(&key))
    }

    /// Checks that `key` signed `buf`.
    pub fn verify(&self, buf: &[u8], key: &PublicKey) -> EosResult<()> {
        if self.recover(buf)? == *key {
            Ok(())
        } else {
            Err(EosError::InvalidSignature(format!("not signed by {key}")))
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

impl FromStr for Signature {
    type Err = EosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
