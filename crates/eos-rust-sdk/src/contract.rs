//! ABI-driven contract facades.
//!
//! A [`Contract`] is obtained from [`Eos::contract`], which fetches the
//! contract's ABI before anything else happens. Each call is checked
//! against the dispatch table built from that ABI.
//!
//! # Example
//!
//! ```rust,no_run
//! use eos_rust_sdk::{CallOptions, Eos, EosConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let eos = Eos::new(EosConfig::local())?;
//!     let token = eos.contract("eos").await?;
//!     for action in token.actions() {
//!         println!("{action}");
//!     }
//!     let result = token
//!         .call(
//!             "okproducer",
//!             json!({"voter": "inita", "producer": "initb", "approve": 1}),
//!             CallOptions::new(),
//!         )
//!         .await?;
//!     println!("{:?}", result.transaction_id());
//!     Ok(())
//! }
//! ```

use crate::abi::{ActionDescriptor, ActionRegistry};
use crate::eos::Eos;
use crate::error::{EosError, EosResult};
use crate::transaction::{ActionArgs, Batch, CallOptions, ContractNames, TransactionResult};
use crate::types::Name;
use std::future::Future;
use std::sync::Arc;

/// A contract account and its actions.
#[derive(Clone, Debug)]
pub struct Contract {
    eos: Eos,
    name: Name,
    registry: Arc<ActionRegistry>,
}

impl Contract {
    pub(crate) fn new(eos: Eos, name: Name, registry: Arc<ActionRegistry>) -> Self {
        Self {
            eos,
            name,
            registry,
        }
    }

    /// The contract account.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Action names, sorted.
    pub fn actions(&self) -> impl Iterator<Item = &Name> {
        self.registry.action_names()
    }

    /// Describes one action.
    pub fn action(&self, action: &str) -> Option<&ActionDescriptor> {
        self.registry.get(action)
    }

    /// The dispatch table.
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Calls `action` as a transaction of its own.
    ///
    /// # Errors
    ///
    /// Returns [`EosError::InvalidUsage`] for an unknown action or arguments
    /// that do not fit it, and any error from finalizing.
    pub async fn call(
        &self,
        action: &str,
        args: impl Into<ActionArgs>,
        options: CallOptions,
    ) -> EosResult<TransactionResult> {
        self.eos
            .invoke(&self.name, &self.registry, action, args.into(), options)
            .await
    }

    /// Opens a batch whose default contract is this one.
    ///
    /// See [`Eos::transaction`].
    pub async fn transaction<F, Fut, E>(&self, f: F) -> Result<TransactionResult, E>
    where
        F: FnOnce(Batch) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: From<EosError>,
    {
        self.transaction_with(CallOptions::new(), f).await
    }

    /// [`transaction`](Self::transaction) with explicit options.
    pub async fn transaction_with<F, Fut, E>(
        &self,
        options: CallOptions,
        f: F,
    ) -> Result<TransactionResult, E>
    where
        F: FnOnce(Batch) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: From<EosError>,
    {
        self.eos
            .run_batch(ContractNames::from(&self.name), options, f)
            .await
    }
}

/// A contract bound to an open batch.
///
/// Calls append to the batch and return immediately.
#[derive(Clone, Debug)]
pub struct BatchContract {
    batch: Batch,
    name: Name,
    registry: Arc<ActionRegistry>,
}

impl BatchContract {
    pub(crate) fn new(batch: Batch, name: Name, registry: Arc<ActionRegistry>) -> Self {
        Self {
            batch,
            name,
            registry,
        }
    }

    /// The contract account.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Action names, sorted.
    pub fn actions(&self) -> impl Iterator<Item = &Name> {
        self.registry.action_names()
    }

    /// The batch this contract appends to.
    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// Appends a call to `action`.
    ///
    /// # Errors
    ///
    /// See [`Batch::call`].
    pub fn call(
        &self,
        action: &str,
        args: impl Into<ActionArgs>,
        options: CallOptions,
    ) -> EosResult<()> {
        self.batch
            .append(&self.name, &self.registry, action, args.into(), &options)
    }
}
