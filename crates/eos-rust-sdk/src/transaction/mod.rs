//! Transaction assembly, batching and signing.
//!
//! A contract call becomes a [`Message`] through the [`MessageBuilder`].
//! Outside a batch the message is wrapped in a transaction of its own and
//! finalized right away; inside a [`Batch`] it is appended to the pending
//! transaction, which is finalized once when the outermost closure returns.
//!
//! Finalizing is the [`SigningResolver`]'s job: it fills the
//! reference-block headers, encodes payloads, collects signatures from a
//! [`SignProvider`] or [`KeyProvider`] and optionally broadcasts.
//!
//! # Example: Custom Transaction
//!
//! ```rust,no_run
//! use eos_rust_sdk::transaction::{Authorization, Message, Transaction};
//! use eos_rust_sdk::{CallOptions, Eos, EosConfig, Name};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let eos = Eos::new(EosConfig::local())?;
//!
//!     let mut tx = Transaction::new();
//!     let data = json!({"from": "inita", "to": "initb", "amount": "13", "memo": "爱"});
//!     tx.push_message(
//!         Message::new(
//!             Name::new("eos")?,
//!             Name::new("transfer")?,
//!             vec!["inita@active".parse::<Authorization>()?],
//!             data.as_object().cloned().unwrap_or_default(),
//!         ),
//!         [Name::new("inita")?, Name::new("initb")?],
//!     );
//!
//!     // encode only: no signing source is configured on this client
//!     let options = CallOptions::new().sign(false).broadcast(false);
//!     let result = eos.push(tx, options).await?;
//!     println!("{:?}", result.transaction.messages[0].data);
//!     Ok(())
//! }
//! ```

mod batch;
mod builder;
mod options;
mod signing;
mod types;

pub use batch::{Batch, BatchStatus, ContractNames, CALLBACK_IN_BATCH};
pub use builder::{ActionArgs, MessageBuilder, PreparedMessage};
pub use options::{CallOptions, Callback, FinalizeOptions};
pub use signing::{
    KeyProvider, PrivateKeys, SignProvider, SignRequest, Signatures, SigningResolver,
};
pub use types::{
    Authorization, Message, MessageData, Transaction, TransactionResult, DEFAULT_PERMISSION,
};
