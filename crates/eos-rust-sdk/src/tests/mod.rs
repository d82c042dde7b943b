//! In-memory chain for unit tests.

use crate::abi::Abi;
use crate::api::{Block, BlockRef, ChainApi, ChainInfo, PushReceipt, RequiredKeys};
use crate::crypto::{sha2_256, PrivateKey, PublicKey};
use crate::error::{EosError, EosResult};
use crate::transaction::Transaction;
use crate::types::{Name, TimePointSec};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// The well-known development key.
pub(crate) const DEV_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";

/// A chain with a fixed head block and ABIs registered up front.
#[derive(Debug, Default)]
pub(crate) struct MockChain {
    abis: HashMap<String, Abi>,
    push_error: Option<String>,
    chain_id: Option<String>,
    pushed: Mutex<Vec<Transaction>>,
    abi_requests: AtomicUsize,
    info_requests: AtomicUsize,
}

impl MockChain {
    pub(crate) const HEAD_BLOCK_NUM: u64 = 0x0001_0005;
    pub(crate) const REF_BLOCK_PREFIX: u32 = 1_807_534_122;
    pub(crate) const BLOCK_TIME: u32 = 1_505_327_073;

    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_abi(mut self, account: &str, abi: Abi) -> Self {
        self.abis.insert(account.to_string(), abi);
        self
    }

    pub(crate) fn with_push_error(mut self, message: &str) -> Self {
        self.push_error = Some(message.to_string());
        self
    }

    pub(crate) fn with_chain_id(mut self, chain_id: &str) -> Self {
        self.chain_id = Some(chain_id.to_string());
        self
    }

    pub(crate) fn pushed(&self) -> Vec<Transaction> {
        self.pushed.lock().unwrap().clone()
    }

    pub(crate) fn abi_requests(&self) -> usize {
        self.abi_requests.load(Ordering::SeqCst)
    }

    pub(crate) fn info_requests(&self) -> usize {
        self.info_requests.load(Ordering::SeqCst)
    }

    /// Only the development key is ever required.
    fn required(&self) -> Vec<PublicKey> {
        vec![PrivateKey::from_wif(DEV_WIF).unwrap().public_key()]
    }
}

#[async_trait]
impl ChainApi for MockChain {
    async fn get_info(&self) -> EosResult<ChainInfo> {
        self.info_requests.fetch_add(1, Ordering::SeqCst);
        Ok(ChainInfo {
            server_version: Some("mock".to_string()),
            chain_id: self.chain_id.clone(),
            head_block_num: Self::HEAD_BLOCK_NUM,
            last_irreversible_block_num: Self::HEAD_BLOCK_NUM - 1,
            head_block_id: None,
            head_block_time: Some(TimePointSec::from_secs(Self::BLOCK_TIME)),
            head_block_producer: Some("inita".to_string()),
        })
    }

    async fn get_block(&self, block: BlockRef) -> EosResult<Block> {
        match block {
            BlockRef::Num(num) if num == Self::HEAD_BLOCK_NUM => Ok(Block {
                id: None,
                block_num: num,
                ref_block_prefix: Self::REF_BLOCK_PREFIX,
                timestamp: TimePointSec::from_secs(Self::BLOCK_TIME),
                previous: None,
                producer: Some("inita".to_string()),
            }),
            other => Err(EosError::api(500, format!("unknown block {other}"))),
        }
    }

    async fn get_abi(&self, account: &Name) -> EosResult<Option<Abi>> {
        self.abi_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.abis.get(account.as_str()).cloned())
    }

    async fn get_required_keys(
        &self,
        _transaction: &Transaction,
        available_keys: &[PublicKey],
    ) -> EosResult<RequiredKeys> {
        Ok(RequiredKeys {
            required_keys: self
                .required()
                .into_iter()
                .filter(|key| available_keys.contains(key))
                .collect(),
        })
    }

    async fn push_transaction(&self, transaction: &Transaction) -> EosResult<PushReceipt> {
        if let Some(message) = &self.push_error {
            return Err(EosError::api_with_code(500, message.clone(), Some(500)));
        }
        let json = serde_json::to_vec(transaction)?;
        self.pushed.lock().unwrap().push(transaction.clone());
        Ok(PushReceipt {
            transaction_id: hex::encode(sha2_256(&json)),
            processed: None,
        })
    }
}

#[tokio::test]
async fn test_mock_chain_reference_block() {
    let chain = MockChain::new();
    let info = chain.get_info().await.unwrap();
    let block = chain
        .get_block(BlockRef::Num(info.head_block_num))
        .await
        .unwrap();
    assert_eq!(block.ref_block_prefix, MockChain::REF_BLOCK_PREFIX);
    assert!(chain.get_block(BlockRef::Num(1)).await.is_err());
}
