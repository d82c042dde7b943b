//! Cryptographic primitives for the EOS SDK.
//!
//! Keys are secp256k1. Private keys travel in wallet import format (WIF),
//! public keys in the `EOS...` text form, and signatures as the hex string
//! of a 65-byte recoverable signature over the SHA2-256 digest of the
//! serialized transaction.
//!
//! # Example
//!
//! ```rust
//! use eos_rust_sdk::crypto::PrivateKey;
//!
//! let key = PrivateKey::from_wif("5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3").unwrap();
//! assert_eq!(
//!     key.public_key().to_string(),
//!     "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV"
//! );
//!
//! let signature = key.sign(b"hello world").unwrap();
//! assert!(signature.verify(b"hello world", &key.public_key()).is_ok());
//! ```

mod hash;
mod keys;
mod signature;

pub use hash::{double_sha2_256, ripemd160, sha2_256};
pub use keys::{PrivateKey, PublicKey, PRIVATE_KEY_LENGTH, PUBLIC_KEY_LENGTH, PUBLIC_KEY_PREFIX};
pub use signature::{Signature, SIGNATURE_LENGTH};
