//! Main EOS client entry point.
//!
//! The [`Eos`] struct ties the chain API, codec, ABI cache and signing
//! sources together.

use crate::abi::{AbiCache, ActionRegistry};
use crate::api::{Block, BlockRef, ChainApi, ChainInfo, HttpChainApi, RequiredKeys};
use crate::codec::{AbiCodec, Codec};
use crate::config::EosConfig;
use crate::contract::Contract;
use crate::crypto::PublicKey;
use crate::error::{EosError, EosResult};
use crate::transaction::{
    ActionArgs, Batch, CallOptions, Callback, ContractNames, KeyProvider, MessageBuilder,
    SignProvider, SigningResolver, Transaction, TransactionResult,
};
use crate::types::Name;
use futures::future::try_join_all;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The main entry point for the EOS SDK.
///
/// Cloning is cheap; clones share the chain client, the ABI cache and the
/// open-batch slot.
///
/// # Example
///
/// ```rust,no_run
/// use eos_rust_sdk::{CallOptions, Eos, EosConfig, PrivateKey};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let key = PrivateKey::from_wif("5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3")?;
///     let eos = Eos::new(EosConfig::local())?.with_key_provider(key);
///
///     let info = eos.get_info().await?;
///     println!("head block: {}", info.head_block_num);
///
///     let result = eos
///         .transfer("inita", "initb", 1, "", CallOptions::new())
///         .await?;
///     println!("{:?}", result.transaction_id());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Eos {
    config: Arc<EosConfig>,
    chain: Arc<dyn ChainApi>,
    codec: Arc<dyn Codec>,
    abis: Arc<AbiCache>,
    sign_provider: Option<Arc<dyn SignProvider>>,
    key_provider: Option<Arc<dyn KeyProvider>>,
    batch_open: Arc<AtomicBool>,
}

impl Eos {
    /// Creates a client talking HTTP to the configured node.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: EosConfig) -> EosResult<Self> {
        let chain = Arc::new(HttpChainApi::new(&config)?);
        Ok(Self::with_chain_api(config, chain))
    }

    /// Creates a client for a node on `127.0.0.1:8888`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn local() -> EosResult<Self> {
        Self::new(EosConfig::local())
    }

    /// Creates a client over any [`ChainApi`] implementation.
    pub fn with_chain_api(config: EosConfig, chain: Arc<dyn ChainApi>) -> Self {
        Self {
            config: Arc::new(config),
            abis: Arc::new(AbiCache::new(chain.clone())),
            chain,
            codec: Arc::new(AbiCodec),
            sign_provider: None,
            key_provider: None,
            batch_open: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signs through `provider`. Takes precedence over a key provider.
    #[must_use]
    pub fn with_sign_provider(mut self, provider: impl SignProvider + 'static) -> Self {
        self.sign_provider = Some(Arc::new(provider));
        self
    }

    /// Signs locally with the keys `provider` returns.
    #[must_use]
    pub fn with_key_provider(mut self, provider: impl KeyProvider + 'static) -> Self {
        self.key_provider = Some(Arc::new(provider));
        self
    }

    /// Replaces the payload and transaction codec.
    #[must_use]
    pub fn with_codec(mut self, codec: impl Codec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EosConfig {
        &self.config
    }

    /// Returns the chain API client.
    pub fn chain(&self) -> &dyn ChainApi {
        self.chain.as_ref()
    }

    /// Returns the ABI cache.
    pub fn abis(&self) -> &AbiCache {
        &self.abis
    }

    /// A signing resolver wired to this client's collaborators.
    pub fn resolver(&self) -> SigningResolver {
        SigningResolver::new(self.chain.clone(), self.codec.clone(), self.abis.clone())
            .with_sign_provider(self.sign_provider.clone())
            .with_key_provider(self.key_provider.clone())
            .with_chain_id(self.config.chain_id().map(str::to_string))
    }

    // === Chain reads ===

    /// Head block and chain metadata.
    pub async fn get_info(&self) -> EosResult<ChainInfo> {
        self.chain.get_info().await
    }

    /// A block by number or id.
    pub async fn get_block(&self, block: impl Into<BlockRef>) -> EosResult<Block> {
        let block = block.into();
        self.chain.get_block(block).await
    }

    /// The subset of `available_keys` needed to authorize `transaction`.
    pub async fn get_required_keys(
        &self,
        transaction: &Transaction,
        available_keys: &[PublicKey],
    ) -> EosResult<RequiredKeys> {
        self.chain
            .get_required_keys(transaction, available_keys)
            .await
    }

    // === Contracts ===

    /// Loads a contract facade.
    ///
    /// # Errors
    ///
    /// Returns [`EosError::UnknownContract`] when the account has no ABI.
    pub async fn contract(&self, name: &str) -> EosResult<Contract> {
        let name = Name::new(name)?;
        let registry = self.abis.get(&name).await?;
        Ok(Contract::new(self.clone(), name, registry))
    }

    /// Calls `action` on `contract` as a transaction of its own.
    ///
    /// A callback in `options` observes the outcome, success or failure,
    /// before it is returned.
    pub async fn call(
        &self,
        contract: &str,
        action: &str,
        args: impl Into<ActionArgs>,
        mut options: CallOptions,
    ) -> EosResult<TransactionResult> {
        let args = args.into();
        let callback = options.take_callback();
        let result = async {
            let name = Name::new(contract)?;
            let registry = self.abis.get(&name).await?;
            self.invoke_standalone(&name, &registry, action, args, &options)
                .await
        }
        .await;
        notify(callback, result)
    }

    /// Transfers `amount` on the system contract.
    pub async fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: u64,
        memo: &str,
        options: CallOptions,
    ) -> EosResult<TransactionResult> {
        let contract = self.config.system_contract().to_string();
        let args = json!({
            "from": from,
            "to": to,
            "amount": amount,
            "memo": memo,
        });
        self.call(&contract, "transfer", args, options).await
    }

    /// Finalizes a transaction assembled by the caller.
    ///
    /// Scope and authorizations are canonicalized like any other
    /// transaction; unencoded payloads are encoded with their contract's ABI.
    pub async fn push(
        &self,
        transaction: Transaction,
        mut options: CallOptions,
    ) -> EosResult<TransactionResult> {
        let callback = options.take_callback();
        let finalize = options.finalize_options(&self.config);
        let result = self.resolver().finalize(transaction, finalize).await;
        notify(callback, result)
    }

    pub(crate) async fn invoke(
        &self,
        contract: &Name,
        registry: &ActionRegistry,
        action: &str,
        args: ActionArgs,
        mut options: CallOptions,
    ) -> EosResult<TransactionResult> {
        let callback = options.take_callback();
        let result = self
            .invoke_standalone(contract, registry, action, args, &options)
            .await;
        notify(callback, result)
    }

    async fn invoke_standalone(
        &self,
        contract: &Name,
        registry: &ActionRegistry,
        action: &str,
        args: ActionArgs,
        options: &CallOptions,
    ) -> EosResult<TransactionResult> {
        let descriptor = registry.require(contract, action)?;
        let prepared = MessageBuilder::new(contract, descriptor).build(args, options)?;

        let mut transaction = Transaction::new();
        transaction.push_message(prepared.message, prepared.scope);
        debug!(contract = %contract, action, "standalone call");

        self.resolver()
            .finalize(transaction, options.finalize_options(&self.config))
            .await
    }

    // === Batches ===

    /// Runs `f` against a new batch and commits what it issued.
    ///
    /// `contracts` are loaded before the batch opens; a single name also
    /// becomes the batch's [default contract](Batch::default_contract).
    /// When `f` returns an error the batch is discarded and the error is
    /// returned unchanged.
    ///
    /// Called from inside another batch's closure on the same client, `f`
    /// runs against the already open batch: its messages join the pending
    /// transaction, the returned result carries that pending transaction
    /// without a receipt, and only the outermost call commits. An error from
    /// a nested `f` is returned to the enclosing closure, which decides
    /// whether the whole batch rolls back.
    ///
    /// # Errors
    ///
    /// Besides `f`'s own errors: [`EosError::InvalidUsage`] when a batch is
    /// open on this client in another task or the batch ends up empty, and
    /// any error from loading contracts or finalizing.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use eos_rust_sdk::{CallOptions, Eos, EosConfig};
    /// # use serde_json::json;
    /// # async fn run(eos: Eos) -> anyhow::Result<()> {
    /// let outcome: anyhow::Result<_> = eos
    ///     .transaction(["eos"], |batch| async move {
    ///         batch.call("eos", "transfer", json!(["inita", "initb", 1, ""]), CallOptions::new())?;
    ///         anyhow::bail!("rollback")
    ///     })
    ///     .await;
    /// assert!(outcome.is_err());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn transaction<C, F, Fut, E>(&self, contracts: C, f: F) -> Result<TransactionResult, E>
    where
        C: Into<ContractNames>,
        F: FnOnce(Batch) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: From<EosError>,
    {
        self.run_batch(contracts.into(), CallOptions::new(), f).await
    }

    /// [`transaction`](Self::transaction) with explicit `broadcast`, `sign`
    /// and `expire_in_seconds`.
    pub async fn transaction_with<C, F, Fut, E>(
        &self,
        contracts: C,
        options: CallOptions,
        f: F,
    ) -> Result<TransactionResult, E>
    where
        C: Into<ContractNames>,
        F: FnOnce(Batch) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: From<EosError>,
    {
        self.run_batch(contracts.into(), options, f).await
    }

    /// [`transaction`](Self::transaction) with a synchronous closure.
    pub async fn transaction_sync<C, F, E>(&self, contracts: C, f: F) -> Result<TransactionResult, E>
    where
        C: Into<ContractNames>,
        F: FnOnce(&Batch) -> Result<(), E>,
        E: From<EosError>,
    {
        self.run_batch(contracts.into(), CallOptions::new(), |batch| async move {
            f(&batch)
        })
        .await
    }

    pub(crate) async fn run_batch<F, Fut, E>(
        &self,
        contracts: ContractNames,
        options: CallOptions,
        f: F,
    ) -> Result<TransactionResult, E>
    where
        F: FnOnce(Batch) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: From<EosError>,
    {
        if options.has_callback() {
            return Err(EosError::invalid_usage(
                "callbacks are only accepted by standalone calls",
            )
            .into());
        }
        if let Some(outer) = self.open_batch() {
            let (registries, default_contract) = self.load_contracts(&contracts).await?;
            let joined = outer.join(registries, default_contract)?;
            debug!(messages = joined.message_count(), "joining open transaction");
            f(joined.clone()).await?;
            return Ok(TransactionResult {
                transaction: joined.pending(),
                receipt: None,
            });
        }

        let _slot = BatchSlot::claim(&self.batch_open)?;
        let finalize = options.finalize_options(&self.config);
        let (registries, default_contract) = self.load_contracts(&contracts).await?;

        let batch = Batch::open(registries, default_contract);
        let open = OpenBatch {
            owner: self.batch_open.clone(),
            batch: batch.clone(),
        };
        if let Err(err) = OPEN_BATCH.scope(open, f(batch.clone())).await {
            batch.roll_back();
            warn!("transaction rolled back by its closure");
            return Err(err);
        }

        let transaction = batch.begin_commit()?;
        let messages = transaction.messages.len();
        match self.resolver().finalize(transaction, finalize).await {
            Ok(result) => {
                batch.mark_committed();
                info!(
                    messages,
                    transaction_id = result.transaction_id().unwrap_or_default(),
                    "transaction committed"
                );
                Ok(result)
            }
            Err(err) => {
                batch.roll_back();
                warn!(error = %err.sanitized_message(), "transaction failed to finalize");
                Err(err.into())
            }
        }
    }

    /// The batch this client has open on the current task, if any.
    fn open_batch(&self) -> Option<Batch> {
        OPEN_BATCH
            .try_with(|open| {
                Arc::ptr_eq(&open.owner, &self.batch_open).then(|| open.batch.clone())
            })
            .ok()
            .flatten()
    }

    async fn load_contracts(
        &self,
        contracts: &ContractNames,
    ) -> EosResult<(BTreeMap<Name, Arc<ActionRegistry>>, Option<Name>)> {
        let names = contracts
            .iter()
            .map(Name::new)
            .collect::<EosResult<Vec<_>>>()?;
        let loaded = try_join_all(names.iter().map(|name| self.abis.get(name))).await?;
        let default_contract = contracts.single().map(Name::new).transpose()?;
        Ok((names.into_iter().zip(loaded).collect(), default_contract))
    }
}

tokio::task_local! {
    static OPEN_BATCH: OpenBatch;
}

/// The batch whose closure is running on the current task.
struct OpenBatch {
    owner: Arc<AtomicBool>,
    batch: Batch,
}

impl fmt::Debug for Eos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Eos")
            .field("config", &self.config)
            .field("chain", &self.chain)
            .field("codec", &self.codec)
            .field("sign_provider", &self.sign_provider.is_some())
            .field("key_provider", &self.key_provider.is_some())
            .finish_non_exhaustive()
    }
}

fn notify(
    callback: Option<Callback>,
    result: EosResult<TransactionResult>,
) -> EosResult<TransactionResult> {
    if let Some(callback) = callback {
        callback(&result);
    }
    result
}

/// Claim on a client's single open-batch slot, released on drop.
struct BatchSlot(Arc<AtomicBool>);

impl BatchSlot {
    fn claim(flag: &Arc<AtomicBool>) -> EosResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                EosError::invalid_usage("another transaction is already open on this client")
            })?;
        Ok(Self(flag.clone()))
    }
}

impl Drop for BatchSlot {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
