//! Transaction envelope types.

use crate::api::PushReceipt;
use crate::error::{EosError, EosResult};
use crate::types::{Name, TimePointSec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Permission used when an authorization string names only the account.
pub const DEFAULT_PERMISSION: &str = "active";

/// An `account@permission` pair sanctioning a message.
///
/// Orders by account, then permission.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Authorization {
    /// Account granting the permission.
    pub account: Name,
    /// Permission level on that account.
    pub permission: Name,
}

impl Authorization {
    /// Creates an authorization.
    pub fn new(account: Name, permission: Name) -> Self {
        Self {
            account,
            permission,
        }
    }

    /// `account@active`.
    pub fn active(account: Name) -> Self {
        Self {
            account,
            permission: Name::from_static(DEFAULT_PERMISSION),
        }
    }
}

impl FromStr for Authorization {
    type Err = EosError;

    /// Parses `account` or `account@permission`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (account, permission) = s.split_once('@').unwrap_or((s, DEFAULT_PERMISSION));
        Ok(Self::new(account.parse()?, permission.parse()?))
    }
}

impl fmt::Display for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.account, self.permission)
    }
}

/// A message payload, either still as named fields or already encoded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageData {
    /// Hex of the ABI-encoded bytes.
    Encoded(String),
    /// Field values keyed by ABI field name.
    Fields(Map<String, Value>),
}

impl MessageData {
    /// Whether the payload has been encoded.
    pub fn is_encoded(&self) -> bool {
        matches!(self, Self::Encoded(_))
    }

    /// The field values of an unencoded payload.
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Fields(fields) => Some(fields),
            Self::Encoded(_) => None,
        }
    }

    /// The raw bytes of an encoded payload.
    pub fn encoded_bytes(&self) -> EosResult<Vec<u8>> {
        match self {
            Self::Encoded(hex_str) => Ok(hex::decode(hex_str)?),
            Self::Fields(_) => Err(EosError::serialization("message data is not encoded")),
        }
    }
}

impl From<Map<String, Value>> for MessageData {
    fn from(fields: Map<String, Value>) -> Self {
        Self::Fields(fields)
    }
}

/// One contract action inside a transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Contract account.
    pub code: Name,
    /// Action name.
    #[serde(rename = "type")]
    pub action: Name,
    /// Sanctioning permissions, kept sorted and unique.
    #[serde(default)]
    pub authorization: Vec<Authorization>,
    /// Payload.
    pub data: MessageData,
}

impl Message {
    /// Creates a message; `authorization` is canonicalized.
    pub fn new(
        code: Name,
        action: Name,
        authorization: Vec<Authorization>,
        data: impl Into<MessageData>,
    ) -> Self {
        let mut message = Self {
            code,
            action,
            authorization,
            data: data.into(),
        };
        sort_unique(&mut message.authorization);
        message
    }
}

/// A transaction envelope.
///
/// `scope`, `read_scope` and every message's `authorization` are sorted and
/// deduplicated before the transaction is serialized; `messages` keep the
/// order they were added in. Reference-block headers stay unset until the
/// transaction is finalized.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Low 16 bits of the reference block number.
    #[serde(default)]
    pub ref_block_num: u16,
    /// Prefix of the reference block id.
    #[serde(default)]
    pub ref_block_prefix: u32,
    /// Time after which the transaction is rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<TimePointSec>,
    /// Accounts whose state may be written.
    #[serde(default)]
    pub scope: Vec<Name>,
    /// Accounts whose state may be read.
    #[serde(default)]
    pub read_scope: Vec<Name>,
    /// Actions in issue order.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Hex signatures, in the order they were produced.
    #[serde(default)]
    pub signatures: Vec<String>,
}

impl Transaction {
    /// An empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and merges its scope into the envelope.
    pub fn push_message(&mut self, message: Message, scope: impl IntoIterator<Item = Name>) {
        self.messages.push(message);
        self.scope.extend(scope);
        sort_unique(&mut self.scope);
    }

    /// Whether the reference-block headers are set.
    pub fn has_headers(&self) -> bool {
        self.expiration.is_some()
    }

    /// Sets the reference-block headers.
    pub fn set_headers(&mut self, block_num: u64, ref_block_prefix: u32, expiration: TimePointSec) {
        self.ref_block_num = (block_num & 0xffff) as u16;
        self.ref_block_prefix = ref_block_prefix;
        self.expiration = Some(expiration);
    }

    /// Sorts and deduplicates scopes and authorizations.
    pub fn canonicalize(&mut self) {
        sort_unique(&mut self.scope);
        sort_unique(&mut self.read_scope);
        for message in &mut self.messages {
            sort_unique(&mut message.authorization);
        }
    }

    /// Whether every message payload is encoded.
    pub fn is_encoded(&self) -> bool {
        self.messages.iter().all(|m| m.data.is_encoded())
    }
}

fn sort_unique<T: Ord>(items: &mut Vec<T>) {
    items.sort();
    items.dedup();
}

/// Outcome of finalizing a transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionResult {
    /// The finalized, possibly signed transaction.
    pub transaction: Transaction,
    /// The node's receipt when the transaction was broadcast.
    pub receipt: Option<PushReceipt>,
}

impl TransactionResult {
    /// Id assigned by the node, when broadcast.
    pub fn transaction_id(&self) -> Option<&str> {
        self.receipt.as_ref().map(|r| r.transaction_id.as_str())
    }
}
