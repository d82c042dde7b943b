//! Example: Basic token transfer
//!
//! This example demonstrates how to:
//! 1. Create an EOS client for a local development node
//! 2. Sign with the development key
//! 3. Transfer tokens between two accounts
//!
//! Run with: `cargo run --example transfer`

use eos_rust_sdk::{CallOptions, Eos, EosConfig, PrivateKey};

const DEV_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let key = PrivateKey::from_wif(DEV_WIF)?;
    println!("Signing as {}", key.public_key());

    let eos = Eos::new(EosConfig::local())?.with_key_provider(key);
    let info = eos.get_info().await?;
    println!("Connected, head block {}", info.head_block_num);

    let result = eos
        .transfer("inita", "initb", 1, "first transfer", CallOptions::new())
        .await?;
    println!("Transaction id: {:?}", result.transaction_id());

    // Same transfer, signed but kept local
    let offline = eos
        .transfer("inita", "initb", 1, "", CallOptions::new().broadcast(false))
        .await?;
    println!("Signatures: {:?}", offline.transaction.signatures);

    Ok(())
}
