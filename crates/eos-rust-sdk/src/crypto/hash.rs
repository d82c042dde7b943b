//! Hash functions used by key encodings and signing.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Computes the SHA2-256 hash of the input.
///
/// Transactions are signed over the SHA2-256 digest of their serialized
/// bytes.
///
/// # Example
///
/// ```rust
/// use eos_rust_sdk::crypto::sha2_256;
///
/// let hash = sha2_256(b"hello world");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha2_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes SHA2-256 twice, as used by WIF checksums.
pub fn double_sha2_256(data: &[u8]) -> [u8; 32] {
    sha2_256(&sha2_256(data))
}

/// Computes the RIPEMD-160 hash of the input, as used by public key
/// checksums.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().into()
}
