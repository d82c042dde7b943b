use crate::abi::{Abi, ActionRegistry};
use crate::api::ChainApi;
use crate::error::{EosError, EosResult};
use crate::types::Name;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Per-client cache of contract dispatch tables.
///
/// The first lookup of a contract fetches its ABI from the node; later
/// lookups are served from memory. The lock is never held while a request
/// is in flight, so two concurrent misses for the same contract may both
/// fetch, and the last one wins.
pub struct AbiCache {
    api: Arc<dyn ChainApi>,
    entries: RwLock<HashMap<Name, Arc<ActionRegistry>>>,
}

impl AbiCache {
    /// Creates an empty cache backed by `api`.
    pub fn new(api: Arc<dyn ChainApi>) -> Self {
        Self {
            api,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The dispatch table of `contract`, fetching its ABI on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`EosError::UnknownContract`] when the account has no ABI, or
    /// the node error when the lookup fails.
    pub async fn get(&self, contract: &Name) -> EosResult<Arc<ActionRegistry>> {
        if let Some(registry) = self.cached(contract) {
            return Ok(registry);
        }

        debug!(contract = %contract, "fetching abi");
        let abi = self
            .api
            .get_abi(contract)
            .await?
            .ok_or_else(|| EosError::UnknownContract(contract.to_string()))?;
        self.insert(contract.clone(), abi)
    }

    /// The cached dispatch table of `contract`, if any.
    pub fn cached(&self, contract: &Name) -> Option<Arc<ActionRegistry>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(contract)
            .cloned()
    }

    /// Stores an ABI for `contract`, replacing any earlier entry.
    ///
    /// # Errors
    ///
    /// Fails if the ABI's actions cannot be resolved.
    pub fn insert(&self, contract: Name, abi: Abi) -> EosResult<Arc<ActionRegistry>> {
        let registry = Arc::new(ActionRegistry::from_abi(abi)?);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(contract, registry.clone());
        Ok(registry)
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl fmt::Debug for AbiCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let contracts: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .map(Name::to_string)
            .collect();
        f.debug_struct("AbiCache")
            .field("api", &self.api)
            .field("contracts", &contracts)
            .finish()
    }
}
