//! Example: Atomic batches and custom signing
//!
//! This example demonstrates how to:
//! 1. Group several calls into one transaction
//! 2. Roll a batch back by returning an error
//! 3. Sign through a custom sign provider
//!
//! Run with: `cargo run --example batch_transaction`

use eos_rust_sdk::transaction::SignRequest;
use eos_rust_sdk::{CallOptions, Eos, EosConfig, EosError, PrivateKey};
use serde_json::json;

const DEV_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A sign provider sees the serialized transaction and may ask the node
    // which keys it needs before signing
    let eos = Eos::new(EosConfig::local())?.with_sign_provider(|request: SignRequest| async move {
        let key = PrivateKey::from_wif(DEV_WIF)?;
        let required = request.required_keys(&[key.public_key()]).await?;
        println!("Node requires {} key(s)", required.required_keys.len());
        request.sign(&key)
    });

    let result = eos
        .transaction("eos", |batch| async move {
            let token = batch.default_contract()?;
            token.call("transfer", json!(["inita", "initb", 1, ""]), CallOptions::new())?;
            token.call("transfer", json!(["initb", "inita", 1, ""]), CallOptions::new())?;
            Ok::<_, EosError>(())
        })
        .await?;
    println!(
        "Committed {} messages as {:?}",
        result.transaction.messages.len(),
        result.transaction_id()
    );

    let outcome: anyhow::Result<_> = eos
        .transaction("eos", |batch| async move {
            batch.call("eos", "transfer", json!(["inita", "initb", 1000, ""]), CallOptions::new())?;
            anyhow::bail!("changed my mind")
        })
        .await;
    println!("Rolled back: {}", outcome.is_err());

    Ok(())
}
