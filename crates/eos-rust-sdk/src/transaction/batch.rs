//! Atomic multi-message transactions.
//!
//! A batch collects the messages issued by a closure into one transaction.
//! When the closure returns `Ok(())` the transaction is finalized; when it
//! returns an error nothing is signed or broadcast and the error is handed
//! back unchanged.
//!
//! # Example
//!
//! ```rust,no_run
//! use eos_rust_sdk::{CallOptions, Eos, EosConfig, EosError};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let eos = Eos::new(EosConfig::local())?;
//!     let result = eos
//!         .transaction("eos", |batch| async move {
//!             let token = batch.default_contract()?;
//!             token.call("transfer", json!(["inita", "initb", 1, ""]), CallOptions::new())?;
//!             token.call("transfer", json!(["inita", "initc", 1, ""]), CallOptions::new())?;
//!             Ok::<_, EosError>(())
//!         })
//!         .await?;
//!     println!("{:?}", result.transaction_id());
//!     Ok(())
//! }
//! ```

use crate::abi::ActionRegistry;
use crate::contract::BatchContract;
use crate::error::{EosError, EosResult};
use crate::transaction::builder::{ActionArgs, MessageBuilder};
use crate::transaction::options::CallOptions;
use crate::transaction::types::Transaction;
use crate::types::Name;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Message of the error raised when a call inside a batch carries a callback.
pub const CALLBACK_IN_BATCH: &str = "Callback during a transaction";

/// Lifecycle of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Accepting messages.
    Open,
    /// Handed to the signing resolver.
    Committing,
    /// Finalized successfully.
    Committed,
    /// Discarded.
    RolledBack,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Committing => "committing",
            Self::Committed => "committed",
            Self::RolledBack => "rolled back",
        })
    }
}

/// Contract accounts to load before a batch opens.
///
/// Built from a single name or a list of names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractNames(Vec<String>);

impl ContractNames {
    /// The names, in the order given.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The only name, when exactly one was given.
    pub(crate) fn single(&self) -> Option<&str> {
        match self.0.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for ContractNames {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for ContractNames {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<&Name> for ContractNames {
    fn from(name: &Name) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<Vec<&str>> for ContractNames {
    fn from(names: Vec<&str>) -> Self {
        Self(names.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for ContractNames {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<&[&str]> for ContractNames {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|name| (*name).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ContractNames {
    fn from(names: [&str; N]) -> Self {
        Self(names.iter().map(|name| (*name).to_string()).collect())
    }
}

struct BatchState {
    status: BatchStatus,
    transaction: Transaction,
    poisoned: Option<String>,
}

impl BatchState {
    fn ensure_open(&self) -> EosResult<()> {
        match self.status {
            BatchStatus::Open => Ok(()),
            status => Err(EosError::invalid_usage(format!(
                "transaction is {status}; no further operations are accepted"
            ))),
        }
    }
}

/// Handle to an open batch.
///
/// Cloning the handle shares the batch. Calls append messages in the order
/// they are issued; nested [`transaction`](Self::transaction) calls reuse the
/// same pending transaction, and only the outermost call commits.
#[derive(Clone)]
pub struct Batch {
    state: Arc<Mutex<BatchState>>,
    contracts: Arc<BTreeMap<Name, Arc<ActionRegistry>>>,
    default_contract: Option<Name>,
}

impl Batch {
    pub(crate) fn open(
        contracts: BTreeMap<Name, Arc<ActionRegistry>>,
        default_contract: Option<Name>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(BatchState {
                status: BatchStatus::Open,
                transaction: Transaction::new(),
                poisoned: None,
            })),
            contracts: Arc::new(contracts),
            default_contract,
        }
    }

    /// A handle on the same pending transaction with `contracts` loaded on
    /// top of this batch's.
    pub(crate) fn join(
        &self,
        contracts: BTreeMap<Name, Arc<ActionRegistry>>,
        default_contract: Option<Name>,
    ) -> EosResult<Self> {
        self.lock().ensure_open()?;
        let mut merged = (*self.contracts).clone();
        merged.extend(contracts);
        Ok(Self {
            state: self.state.clone(),
            contracts: Arc::new(merged),
            default_contract,
        })
    }

    fn lock(&self) -> MutexGuard<'_, BatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current lifecycle state.
    pub fn status(&self) -> BatchStatus {
        self.lock().status
    }

    /// Number of messages appended so far.
    pub fn message_count(&self) -> usize {
        self.lock().transaction.messages.len()
    }

    /// A copy of the pending transaction.
    pub fn pending(&self) -> Transaction {
        self.lock().transaction.clone()
    }

    /// Contracts loaded for this batch.
    pub fn contract_names(&self) -> impl Iterator<Item = &Name> {
        self.contracts.keys()
    }

    /// A loaded contract, bound to this batch.
    ///
    /// # Errors
    ///
    /// Returns [`EosError::InvalidUsage`] if the contract was not loaded
    /// when the batch opened.
    pub fn contract(&self, name: &str) -> EosResult<BatchContract> {
        let name = Name::new(name)?;
        let registry = self.contracts.get(&name).ok_or_else(|| {
            EosError::invalid_usage(format!(
                "contract '{name}' was not loaded for this transaction"
            ))
        })?;
        Ok(BatchContract::new(self.clone(), name, registry.clone()))
    }

    /// The contract the batch was opened for.
    ///
    /// # Errors
    ///
    /// Returns [`EosError::InvalidUsage`] when the batch was opened for
    /// several contracts or none.
    pub fn default_contract(&self) -> EosResult<BatchContract> {
        let name = self.default_contract.as_ref().ok_or_else(|| {
            EosError::invalid_usage("transaction was not opened for a single contract")
        })?;
        self.contract(name.as_str())
    }

    /// Appends a call to `action` on `contract`.
    ///
    /// Per-call `broadcast`, `sign` and `expire_in_seconds` are ignored; the
    /// batch's own options apply when it commits.
    ///
    /// # Errors
    ///
    /// Returns [`EosError::InvalidUsage`] when the batch is no longer open,
    /// the options carry a callback (which also dooms the batch) or the
    /// arguments do not fit the action.
    pub fn call(
        &self,
        contract: &str,
        action: &str,
        args: impl Into<ActionArgs>,
        options: CallOptions,
    ) -> EosResult<()> {
        self.contract(contract)?.call(action, args, options)
    }

    pub(crate) fn append(
        &self,
        contract: &Name,
        registry: &ActionRegistry,
        action: &str,
        args: ActionArgs,
        options: &CallOptions,
    ) -> EosResult<()> {
        {
            let mut state = self.lock();
            state.ensure_open()?;
            if options.has_callback() {
                state
                    .poisoned
                    .get_or_insert_with(|| CALLBACK_IN_BATCH.to_string());
                warn!(contract = %contract, action, "callback passed inside a transaction");
                return Err(EosError::invalid_usage(CALLBACK_IN_BATCH));
            }
        }

        let descriptor = registry.require(contract, action)?;
        let prepared = MessageBuilder::new(contract, descriptor).build(args, options)?;

        let mut state = self.lock();
        state.ensure_open()?;
        state
            .transaction
            .push_message(prepared.message, prepared.scope);
        debug!(
            contract = %contract,
            action,
            messages = state.transaction.messages.len(),
            "message appended"
        );
        Ok(())
    }

    /// Runs a nested async closure against this batch.
    ///
    /// The closure's error is returned as is; the outermost closure decides
    /// whether it rolls the whole batch back.
    pub async fn transaction<F, Fut, E>(&self, f: F) -> Result<(), E>
    where
        F: FnOnce(Batch) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: From<EosError>,
    {
        self.lock().ensure_open()?;
        f(self.clone()).await
    }

    /// Runs a nested closure against this batch.
    pub fn transaction_sync<F, E>(&self, f: F) -> Result<(), E>
    where
        F: FnOnce(&Batch) -> Result<(), E>,
        E: From<EosError>,
    {
        self.lock().ensure_open()?;
        f(self)
    }

    /// Moves to `Committing` and hands out the pending transaction.
    pub(crate) fn begin_commit(&self) -> EosResult<Transaction> {
        let mut state = self.lock();
        state.ensure_open()?;

        let refusal = match &state.poisoned {
            Some(reason) => Some(reason.clone()),
            None if state.transaction.messages.is_empty() => {
                Some("transaction has no messages".to_string())
            }
            None => None,
        };
        if let Some(reason) = refusal {
            state.status = BatchStatus::RolledBack;
            state.transaction = Transaction::new();
            warn!(reason = %reason, "transaction rolled back");
            return Err(EosError::invalid_usage(reason));
        }

        state.status = BatchStatus::Committing;
        Ok(std::mem::take(&mut state.transaction))
    }

    /// Discards the pending transaction.
    pub(crate) fn roll_back(&self) {
        let mut state = self.lock();
        state.status = BatchStatus::RolledBack;
        state.transaction = Transaction::new();
    }

    pub(crate) fn mark_committed(&self) {
        self.lock().status = BatchStatus::Committed;
    }
}

impl fmt::Debug for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Batch")
            .field("status", &state.status)
            .field("messages", &state.transaction.messages.len())
            .field("poisoned", &state.poisoned.is_some())
            .field("contracts", &self.contracts.keys().collect::<Vec<_>>())
            .field("default_contract", &self.default_contract)
            .finish()
    }
}
