//! Node API clients.
//!
//! The transaction engine reaches the chain only through the [`ChainApi`]
//! trait. [`HttpChainApi`] implements it over the node's `/v1/chain`
//! HTTP endpoints; tests and alternative transports supply their own
//! implementation through [`Eos::with_chain_api`](crate::Eos::with_chain_api).

mod http;
mod response;

pub use http::HttpChainApi;
pub use response::{Block, ChainInfo, KeyComparison, PushReceipt, RequiredKeys};

use crate::abi::Abi;
use crate::crypto::PublicKey;
use crate::error::EosResult;
use crate::transaction::Transaction;
use crate::types::Name;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// A block number or block id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BlockRef {
    /// Block number.
    Num(u64),
    /// Block id.
    Id(String),
}

impl From<u64> for BlockRef {
    fn from(num: u64) -> Self {
        Self::Num(num)
    }
}

impl From<&str> for BlockRef {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for BlockRef {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(num) => write!(f, "{num}"),
            Self::Id(id) => f.write_str(id),
        }
    }
}

/// The node operations the transaction engine depends on.
#[async_trait]
pub trait ChainApi: Send + Sync + fmt::Debug {
    /// Head block and chain metadata.
    async fn get_info(&self) -> EosResult<ChainInfo>;

    /// A block by number or id.
    async fn get_block(&self, block: BlockRef) -> EosResult<Block>;

    /// The ABI of a contract account, or `None` when the account has none.
    async fn get_abi(&self, account: &Name) -> EosResult<Option<Abi>>;

    /// The subset of `available_keys` needed to authorize `transaction`.
    async fn get_required_keys(
        &self,
        transaction: &Transaction,
        available_keys: &[PublicKey],
    ) -> EosResult<RequiredKeys>;

    /// Submits a signed transaction.
    async fn push_transaction(&self, transaction: &Transaction) -> EosResult<PushReceipt>;
}
