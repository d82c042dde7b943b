//! Node response types.

use crate::crypto::PublicKey;
use crate::types::TimePointSec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Output of `get_info`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    /// Node software version.
    #[serde(default)]
    pub server_version: Option<String>,
    /// Chain id, on nodes that report it.
    #[serde(default)]
    pub chain_id: Option<String>,
    /// Number of the head block.
    pub head_block_num: u64,
    /// Number of the last irreversible block.
    #[serde(default)]
    pub last_irreversible_block_num: u64,
    /// Id of the head block.
    #[serde(default)]
    pub head_block_id: Option<String>,
    /// Time of the head block.
    #[serde(default)]
    pub head_block_time: Option<TimePointSec>,
    /// Producer of the head block.
    #[serde(default)]
    pub head_block_producer: Option<String>,
}

/// Output of `get_block`, reduced to what transactions reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block id.
    #[serde(default)]
    pub id: Option<String>,
    /// Block number.
    pub block_num: u64,
    /// Prefix of the block id used by transaction headers.
    pub ref_block_prefix: u32,
    /// Production time.
    pub timestamp: TimePointSec,
    /// Id of the previous block.
    #[serde(default)]
    pub previous: Option<String>,
    /// Producer account.
    #[serde(default)]
    pub producer: Option<String>,
}

/// Output of `get_required_keys`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredKeys {
    /// Minimal key set the node needs to accept the transaction.
    pub required_keys: Vec<PublicKey>,
}

impl RequiredKeys {
    /// Compares the required set against candidate keys.
    ///
    /// Deciding what a mismatch means is left to the caller.
    pub fn compare(&self, candidates: &[PublicKey]) -> KeyComparison {
        let required: BTreeSet<_> = self.required_keys.iter().copied().collect();
        let candidates: BTreeSet<_> = candidates.iter().copied().collect();
        KeyComparison {
            missing: required.difference(&candidates).copied().collect(),
            extra: candidates.difference(&required).copied().collect(),
        }
    }
}

/// Difference between required keys and candidate keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyComparison {
    /// Required but not among the candidates.
    pub missing: Vec<PublicKey>,
    /// Candidates the node does not need.
    pub extra: Vec<PublicKey>,
}

impl KeyComparison {
    /// Whether the candidates are exactly the required keys.
    pub fn is_exact(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }

    /// Whether the candidates cover every required key.
    pub fn is_satisfied(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Output of `push_transaction`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PushReceipt {
    /// Id the node assigned.
    pub transaction_id: String,
    /// Execution trace, as reported.
    #[serde(default)]
    pub processed: Option<serde_json::Value>,
}
