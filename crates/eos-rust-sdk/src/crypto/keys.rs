//! secp256k1 keys in their EOS text encodings.

use crate::crypto::hash::{double_sha2_256, ripemd160, sha2_256};
use crate::crypto::signature::Signature;
use crate::error::{EosError, EosResult};
use k256::ecdsa::signature::hazmat::RandomizedPrehashSigner;
use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use zeroize::Zeroize;

/// Private key length in bytes.
pub const PRIVATE_KEY_LENGTH: usize = 32;
/// Compressed public key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 33;
/// Prefix of the textual public key form.
pub const PUBLIC_KEY_PREFIX: &str = "EOS";

const WIF_VERSION: u8 = 0x80;
const CHECKSUM_LENGTH: usize = 4;
const MAX_SIGNING_ATTEMPTS: u32 = 256;

/// A secp256k1 private key.
///
/// Parsed from and rendered to wallet import format (WIF). The key material
/// is never printed by `Debug`.
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
}

impl PrivateKey {
    /// Generates a new random private key.
    pub fn generate() -> Self {
        Self {
            inner: SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    /// Creates a private key from its 32 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> EosResult<Self> {
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(EosError::InvalidKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_LENGTH,
                bytes.len()
            )));
        }
        let inner = SigningKey::from_slice(bytes).map_err(|e| EosError::InvalidKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Parses a WIF string (base58check, version byte `0x80`).
    pub fn from_wif(wif: &str) -> EosResult<Self> {
        let mut raw = bs58::decode(wif.trim())
            .into_vec()
            .map_err(|e| EosError::InvalidKey(format!("not base58: {e}")))?;

        let result = Self::from_wif_bytes(&raw);
        raw.zeroize();
        result
    }

    fn from_wif_bytes(raw: &[u8]) -> EosResult<Self> {
        if raw.len() != 1 + PRIVATE_KEY_LENGTH + CHECKSUM_LENGTH {
            return Err(EosError::InvalidKey(format!(
                "unexpected encoded length {}",
                raw.len()
            )));
        }
        let (payload, checksum) = raw.split_at(1 + PRIVATE_KEY_LENGTH);
        if payload[0] != WIF_VERSION {
            return Err(EosError::InvalidKey(format!(
                "unexpected version byte 0x{:02x}",
                payload[0]
            )));
        }
        if double_sha2_256(payload)[..CHECKSUM_LENGTH] != *checksum {
            return Err(EosError::InvalidKey("checksum mismatch".into()));
        }
        Self::from_bytes(&payload[1..])
    }

    /// Renders the key in WIF.
    pub fn to_wif(&self) -> String {
        let mut payload = Vec::with_capacity(1 + PRIVATE_KEY_LENGTH + CHECKSUM_LENGTH);
        payload.push(WIF_VERSION);
        payload.extend_from_slice(&self.inner.to_bytes());
        let checksum = double_sha2_256(&payload);
        payload.extend_from_slice(&checksum[..CHECKSUM_LENGTH]);
        let wif = bs58::encode(&payload).into_string();
        payload.zeroize();
        wif
    }

    /// Returns the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.inner.verifying_key())
    }

    /// Signs the SHA2-256 digest of `buf`.
    pub fn sign(&self, buf: &[u8]) -> EosResult<Signature> {
        self.sign_digest(&sha2_256(buf))
    }

    /// Signs an already computed 32-byte digest.
    ///
    /// Only canonical signatures are returned. The first attempt is plain
    /// RFC 6979; later attempts mix entropy seeded from the digest and the
    /// attempt number into the nonce, so the result stays deterministic.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> EosResult<Signature> {
        for attempt in 0..MAX_SIGNING_ATTEMPTS {
            let (signature, recovery_id) = self.sign_attempt(digest, attempt)?;
            let signature = Signature::from_parts(&signature, recovery_id);
            if signature.is_canonical() {
                return Ok(signature);
            }
            debug!(attempt, "discarding non-canonical signature");
        }
        Err(EosError::InvalidSignature(format!(
            "no canonical signature after {MAX_SIGNING_ATTEMPTS} attempts"
        )))
    }

    fn sign_attempt(
        &self,
        digest: &[u8; 32],
        attempt: u32,
    ) -> EosResult<(K256Signature, RecoveryId)> {
        if attempt == 0 {
            return self
                .inner
                .sign_prehash_recoverable(digest)
                .map_err(|e| EosError::InvalidSignature(e.to_string()));
        }

        let mut seed = Vec::with_capacity(digest.len() + 4);
        seed.extend_from_slice(digest);
        seed.extend_from_slice(&attempt.to_be_bytes());
        let mut rng = StdRng::from_seed(sha2_256(&seed));

        let signature: K256Signature = self
            .inner
            .sign_prehash_with_rng(&mut rng, digest)
            .map_err(|e| EosError::InvalidSignature(e.to_string()))?;
        let signature = signature.normalize_s().unwrap_or(signature);
        let recovery_id =
            RecoveryId::trial_recovery_from_prehash(self.inner.verifying_key(), digest, &signature)
                .map_err(|e| EosError::InvalidSignature(e.to_string()))?;
        Ok((signature, recovery_id))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey([REDACTED])")
    }
}

impl FromStr for PrivateKey {
    type Err = EosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wif(s)
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.public_key() == other.public_key()
    }
}

impl Eq for PrivateKey {}

/// A compressed secp256k1 public key.
///
/// The textual form is `EOS` followed by the base58 encoding of the
/// compressed point and the first four bytes of its RIPEMD-160 hash.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey {
    bytes: [u8; PUBLIC_KEY_LENGTH],
}

impl PublicKey {
    pub(crate) fn from_verifying_key(key: &VerifyingKey) -> Self {
        let mut bytes = [0u8; PUBLIC_KEY_LENGTH];
        bytes.copy_from_slice(&key.to_sec1_bytes());
        Self { bytes }
    }

    /// Creates a public key from its 33 compressed bytes.
    pub fn from_bytes(bytes: &[u8]) -> EosResult<Self> {
        let key =
            VerifyingKey::from_sec1_bytes(bytes).map_err(|e| EosError::InvalidKey(e.to_string()))?;
        Ok(Self::from_verifying_key(&key))
    }

    /// Returns the compressed point.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.bytes
    }

    /// Returns the `k256` verifying key.
    pub fn verifying_key(&self) -> EosResult<VerifyingKey> {
        VerifyingKey::from_sec1_bytes(&self.bytes).map_err(|e| EosError::InvalidKey(e.to_string()))
    }
}

impl FromStr for PublicKey {
    type Err = EosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let encoded = s.trim().strip_prefix(PUBLIC_KEY_PREFIX).ok_or_else(|| {
            EosError::InvalidKey(format!("public key must start with {PUBLIC_KEY_PREFIX}"))
        })?;
        let raw = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| EosError::InvalidKey(format!("not base58: {e}")))?;
        if raw.len() != PUBLIC_KEY_LENGTH + CHECKSUM_LENGTH {
            return Err(EosError::InvalidKey(format!(
                "unexpected encoded length {}",
                raw.len()
            )));
        }
        let (point, checksum) = raw.split_at(PUBLIC_KEY_LENGTH);
        if ripemd160(point)[..CHECKSUM_LENGTH] != *checksum {
            return Err(EosError::InvalidKey("checksum mismatch".into()));
        }
        Self::from_bytes(point)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = Vec::with_capacity(PUBLIC_KEY_LENGTH + CHECKSUM_LENGTH);
        raw.extend_from_slice(&self.bytes);
        raw.extend_from_slice(&ripemd160(&self.bytes)[..CHECKSUM_LENGTH]);
        write!(f, "{PUBLIC_KEY_PREFIX}{}", bs58::encode(raw).into_string())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
