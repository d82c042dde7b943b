//! End-to-end tests against a development node.
//!
//! These tests require a running node with the development key as the
//! producer key, and are only compiled when the `e2e` feature is enabled.
//!
//! ## Running the tests
//!
//! ```bash
//! # node on the default 127.0.0.1:8888
//! cargo test -p eos-rust-sdk --features e2e -- --ignored
//!
//! # or point at another node
//! export EOS_NODE_URL=http://127.0.0.1:8888
//! cargo test -p eos-rust-sdk --features e2e -- --ignored
//! ```

use eos_rust_sdk::{CallOptions, Eos, EosConfig, EosError, PrivateKey};
use serde_json::json;
use std::env;

const DEV_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";

/// Gets the configuration for E2E tests.
fn get_test_config() -> EosConfig {
    match env::var("EOS_NODE_URL") {
        Ok(node_url) => EosConfig::custom(&node_url).expect("invalid EOS_NODE_URL"),
        Err(_) => EosConfig::local(),
    }
}

fn client() -> Eos {
    let key = PrivateKey::from_wif(DEV_WIF).expect("valid development key");
    Eos::new(get_test_config())
        .expect("failed to create client")
        .with_key_provider(key)
}

// =============================================================================
// Chain Tests
// =============================================================================

mod chain_tests {
    use super::*;

    #[tokio::test]
    #[ignore]
    async fn e2e_get_info_and_head_block() {
        let eos = client();
        let info = eos.get_info().await.expect("failed to get info");
        println!("Head block: {}", info.head_block_num);

        let block = eos
            .get_block(info.head_block_num)
            .await
            .expect("failed to get head block");
        assert_eq!(block.block_num, info.head_block_num);
    }

    #[tokio::test]
    #[ignore]
    async fn e2e_unknown_account() {
        let err = client()
            .contract("nobody12345")
            .await
            .expect_err("account should not exist");
        assert!(matches!(err, EosError::UnknownContract(_)));
    }
}

// =============================================================================
// Transaction Tests
// =============================================================================

mod transaction_tests {
    use super::*;

    #[tokio::test]
    #[ignore]
    async fn e2e_transfer() {
        let result = client()
            .transfer("inita", "initb", 1, "", CallOptions::new())
            .await
            .expect("transfer failed");
        println!("Transaction id: {:?}", result.transaction_id());
        assert!(result.transaction_id().is_some());
    }

    #[tokio::test]
    #[ignore]
    async fn e2e_batch_of_two_transfers() {
        let result = client()
            .transaction("eos", |batch| async move {
                let token = batch.default_contract()?;
                token.call("transfer", json!(["inita", "initb", 1, ""]), CallOptions::new())?;
                token.call("transfer", json!(["initb", "inita", 1, ""]), CallOptions::new())?;
                Ok::<_, EosError>(())
            })
            .await
            .expect("batch failed");
        assert_eq!(result.transaction.messages.len(), 2);
        assert!(result.receipt.is_some());
    }

    #[tokio::test]
    #[ignore]
    async fn e2e_unbroadcast_transfer_is_not_applied() {
        let result = client()
            .transfer("inita", "initb", 1, "", CallOptions::new().broadcast(false))
            .await
            .expect("transfer failed");
        assert!(result.receipt.is_none());
        assert_eq!(result.transaction.signatures.len(), 1);
    }
}
