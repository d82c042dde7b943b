//! Example: Calling contract actions
//!
//! This example demonstrates how to:
//! 1. Load a contract and list its actions
//! 2. Call an action with named fields
//! 3. Call an action with positional arguments and explicit scope
//!
//! Run with: `cargo run --example call_contract`

use eos_rust_sdk::{CallOptions, Eos, EosConfig, EosError, PrivateKey};
use serde_json::json;

const DEV_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";
const DEV_PUBLIC_KEY: &str = "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let eos = Eos::new(EosConfig::local())?.with_key_provider(PrivateKey::from_wif(DEV_WIF)?);

    let token = eos.contract("eos").await?;
    println!("Actions of {}:", token.name());
    for action in token.actions() {
        println!("  {action}");
    }

    let result = token
        .call(
            "okproducer",
            json!({"voter": "inita", "producer": "initb", "approve": 1}),
            CallOptions::new(),
        )
        .await?;
    println!("okproducer: {:?}", result.transaction_id());

    let result = token
        .call(
            "newaccount",
            json!(["inita", "mycontract", DEV_PUBLIC_KEY, DEV_PUBLIC_KEY, "inita", "1.0000 EOS"]),
            CallOptions::new()
                .authorization("inita@active")
                .scopes(["eos", "inita"]),
        )
        .await?;
    println!("newaccount: {:?}", result.transaction_id());

    // Accounts without a contract are reported before anything is signed
    match eos.contract("nobody").await {
        Err(EosError::UnknownContract(name)) => println!("{name} has no abi"),
        other => println!("unexpected: {other:?}"),
    }

    Ok(())
}
