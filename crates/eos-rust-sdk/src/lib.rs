//! # EOS Rust SDK
//!
//! A client library for EOS-style chains: it turns contract calls into
//! signed transactions and broadcasts them through a node's HTTP API.
//!
//! Contract actions are discovered from the contract's ABI, so calls are
//! checked for arity and field names before anything is sent. Several calls
//! can be grouped into one atomic transaction that is committed when the
//! batch closure succeeds and discarded when it fails.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eos_rust_sdk::{CallOptions, Eos, EosConfig, PrivateKey};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let key = PrivateKey::from_wif("5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3")?;
//!     let eos = Eos::new(EosConfig::local())?.with_key_provider(key);
//!
//!     let result = eos
//!         .transfer("inita", "initb", 1, "", CallOptions::new())
//!         .await?;
//!     println!("transaction id: {:?}", result.transaction_id());
//!     Ok(())
//! }
//! ```
//!
//! ## Batches
//!
//! ```rust,no_run
//! use eos_rust_sdk::{CallOptions, Eos, EosConfig, EosError};
//! use serde_json::json;
//!
//! # async fn run(eos: Eos) -> Result<(), EosError> {
//! let result = eos
//!     .transaction("eos", |batch| async move {
//!         let eos = batch.contract("eos")?;
//!         eos.call(
//!             "transfer",
//!             json!({"from": "inita", "to": "initb", "amount": 1, "memo": ""}),
//!             CallOptions::new(),
//!         )?;
//!         eos.call(
//!             "transfer",
//!             json!({"from": "inita", "to": "initc", "amount": 1, "memo": ""}),
//!             CallOptions::new(),
//!         )?;
//!         Ok::<_, EosError>(())
//!     })
//!     .await?;
//! assert_eq!(result.transaction.messages.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`abi`] - ABI documents and the per-contract dispatch table
//! - [`api`] - The chain HTTP API
//! - [`codec`] - Binary encoding of payloads and transactions
//! - [`contract`] - Contract facades
//! - [`crypto`] - Keys, signatures and hashes
//! - [`transaction`] - Transaction building, batching and signing
//! - [`types`] - Names, assets and timestamps

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod abi;
pub mod api;
pub mod codec;
pub mod config;
pub mod contract;
pub mod crypto;
pub mod error;
pub mod retry;
pub mod transaction;
pub mod types;

mod eos;

// Re-export main entry points
pub use config::EosConfig;
pub use contract::{BatchContract, Contract};
pub use eos::Eos;
pub use error::{EosError, EosResult};

// Re-export commonly used types
pub use crypto::{PrivateKey, PublicKey, Signature};
pub use transaction::{Batch, CallOptions, Transaction, TransactionResult};
pub use types::{Asset, Name, TimePointSec};

#[cfg(test)]
mod tests;
