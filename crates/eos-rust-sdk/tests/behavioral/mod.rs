//! Behavioral tests for the SDK.
//!
//! These tests run the client against a mock node and verify what it
//! sends, without requiring a live network.

use eos_rust_sdk::codec::{AbiCodec, Codec};
use eos_rust_sdk::transaction::{
    Authorization, Message, SignRequest, Transaction, CALLBACK_IN_BATCH,
};
use eos_rust_sdk::{
    CallOptions, Eos, EosConfig, EosError, Name, PrivateKey, PublicKey, Signature,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// The well-known development key pair.
const DEV_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";
const DEV_PUBLIC_KEY: &str = "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV";

const INITA: &str = "000000000093dd74";
const INITB: &str = "000000008093dd74";
const TRANSACTION_ID: &str = "6c1f8e1d0a3ab6b4b1c9ffab3bb6c1e3d1ddc0ac7cd0f2b28ad5fae0a1e5c3c1";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn token_abi() -> Value {
    json!({
        "types": [
            {"new_type_name": "account_name", "type": "name"},
            {"new_type_name": "producer_name", "type": "account_name"}
        ],
        "structs": [
            {"name": "transfer", "base": "", "fields": [
                {"name": "from", "type": "account_name"},
                {"name": "to", "type": "account_name"},
                {"name": "amount", "type": "uint64"},
                {"name": "memo", "type": "string"}
            ]},
            {"name": "okproducer", "base": "", "fields": [
                {"name": "voter", "type": "account_name"},
                {"name": "producer", "type": "producer_name"},
                {"name": "approve", "type": "int8"}
            ]},
            {"name": "newaccount", "base": "", "fields": [
                {"name": "creator", "type": "account_name"},
                {"name": "name", "type": "account_name"},
                {"name": "owner", "type": "public_key"},
                {"name": "active", "type": "public_key"},
                {"name": "recovery", "type": "account_name"},
                {"name": "deposit", "type": "asset"}
            ]}
        ],
        "actions": [
            {"action_name": "transfer", "type": "transfer"},
            {"action_name": "okproducer", "type": "okproducer"},
            {"action_name": "newaccount", "type": "newaccount"}
        ],
        "tables": []
    })
}

/// A node with one head block and the token contract under `eos`.
///
/// `pushes` is how many `push_transaction` calls the test expects.
async fn mock_node(pushes: u64) -> MockServer {
    let accepted = ResponseTemplate::new(202).set_body_json(json!({
        "transaction_id": TRANSACTION_ID,
        "processed": {"status": "executed"}
    }));
    mock_node_answering_push(accepted, pushes).await
}

async fn mock_node_answering_push(push: ResponseTemplate, pushes: u64) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chain/get_info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "server_version": "0f6695cb",
            "head_block_num": 65541,
            "last_irreversible_block_num": 65540,
            "head_block_time": "2017-09-13T18:24:33",
            "head_block_producer": "inita"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chain/get_block"))
        .and(body_partial_json(json!({"block_num_or_id": 65541})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "block_num": 65541,
            "ref_block_prefix": 1807534122,
            "timestamp": "2017-09-13T18:24:33",
            "producer": "inita"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chain/get_code"))
        .and(body_partial_json(json!({"account_name": "eos"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "account_name": "eos",
            "code_hash": "0000000000000000000000000000000000000000000000000000000000000000",
            "abi": token_abi()
        })))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chain/get_code"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "code": 500,
            "message": "Internal Service Error",
            "error": {"name": "unknown_key", "what": "unknown key"}
        })))
        .with_priority(10)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chain/get_required_keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "required_keys": [DEV_PUBLIC_KEY]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chain/push_transaction"))
        .respond_with(push)
        .expect(pushes)
        .mount(&server)
        .await;

    server
}

fn config(server: &MockServer) -> EosConfig {
    EosConfig::custom(&server.uri()).unwrap().without_retry()
}

fn client(server: &MockServer) -> Eos {
    let key = PrivateKey::from_wif(DEV_WIF).unwrap();
    Eos::new(config(server)).unwrap().with_key_provider(key)
}

/// Bodies the node received on `push_transaction`.
async fn pushed(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == "/v1/chain/push_transaction")
        .map(|request| request.body_json::<Value>().unwrap())
        .collect()
}

fn dev_public_key() -> PublicKey {
    DEV_PUBLIC_KEY.parse().unwrap()
}

mod transfer_tests {
    use super::*;

    #[tokio::test]
    async fn test_transfer_is_signed_and_broadcast() {
        init_tracing();
        let server = mock_node(1).await;

        let result = client(&server)
            .transfer("inita", "initb", 1, "", CallOptions::new())
            .await
            .unwrap();

        assert_eq!(result.transaction_id(), Some(TRANSACTION_ID));
        let body = &pushed(&server).await[0];
        assert_eq!(body["ref_block_num"], json!(5));
        assert_eq!(body["ref_block_prefix"], json!(1807534122));
        assert_eq!(body["expiration"], json!("2017-09-13T18:25:33"));
        assert_eq!(body["scope"], json!(["inita", "initb"]));
        assert_eq!(body["messages"][0]["code"], json!("eos"));
        assert_eq!(
            body["messages"][0]["authorization"],
            json!([{"account": "inita", "permission": "active"}])
        );
        assert_eq!(
            body["messages"][0]["data"],
            json!(format!("{INITA}{INITB}010000000000000000"))
        );
    }

    #[tokio::test]
    async fn test_signature_recovers_to_signing_key() {
        let server = mock_node(1).await;

        let result = client(&server)
            .transfer("inita", "initb", 1, "", CallOptions::new())
            .await
            .unwrap();

        let buf = AbiCodec.serialize_transaction(&result.transaction).unwrap();
        assert_eq!(result.transaction.signatures.len(), 1);
        let signature = Signature::from_hex(&result.transaction.signatures[0]).unwrap();
        assert_eq!(signature.recover(&buf).unwrap(), dev_public_key());
    }

    #[tokio::test]
    async fn test_rejected_push_is_a_broadcast_error() {
        let rejected = ResponseTemplate::new(500).set_body_json(json!({
            "code": 500,
            "message": "Internal Service Error",
            "error": {"name": "tx_missing_sigs", "what": "missing required signature"}
        }));
        let server = mock_node_answering_push(rejected, 1).await;

        let err = client(&server)
            .transfer("inita", "initb", 1, "", CallOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EosError::Broadcast(ref message) if message.contains("missing required signature")));
    }
}

mod contract_tests {
    use super::*;

    #[tokio::test]
    async fn test_contract_lists_actions() {
        let server = mock_node(0).await;
        let token = client(&server).contract("eos").await.unwrap();
        let actions: Vec<&str> = token.actions().map(Name::as_str).collect();
        assert_eq!(actions, vec!["newaccount", "okproducer", "transfer"]);
    }

    #[tokio::test]
    async fn test_okproducer_with_named_fields() {
        let server = mock_node(0).await;
        let token = client(&server).contract("eos").await.unwrap();

        let result = token
            .call(
                "okproducer",
                json!({"voter": "inita", "producer": "initb", "approve": 1}),
                CallOptions::new().broadcast(false),
            )
            .await
            .unwrap();

        let message = &result.transaction.messages[0];
        assert_eq!(message.action.as_str(), "okproducer");
        assert_eq!(message.authorization, vec!["inita@active".parse::<Authorization>().unwrap()]);
        assert_eq!(
            message.data.encoded_bytes().unwrap(),
            hex::decode(format!("{INITA}{INITB}01")).unwrap()
        );
        assert!(result.receipt.is_none());
        assert_eq!(result.transaction.signatures.len(), 1);
    }

    #[tokio::test]
    async fn test_newaccount_with_positional_args() {
        let server = mock_node(0).await;
        let token = client(&server).contract("eos").await.unwrap();

        let result = token
            .call(
                "newaccount",
                json!([
                    "inita",
                    "mycontract",
                    DEV_PUBLIC_KEY,
                    DEV_PUBLIC_KEY,
                    "inita",
                    "1.0000 EOS"
                ]),
                CallOptions::new().broadcast(false),
            )
            .await
            .unwrap();

        let message = &result.transaction.messages[0];
        assert_eq!(message.authorization, vec![Authorization::active(Name::new("inita").unwrap())]);
        // two names, two 33-byte keys, a name and an asset
        assert_eq!(message.data.encoded_bytes().unwrap().len(), 8 + 8 + 33 + 33 + 8 + 16);
        let scope: Vec<&str> = result.transaction.scope.iter().map(Name::as_str).collect();
        assert_eq!(scope, vec!["inita", "mycontract"]);
    }

    #[tokio::test]
    async fn test_wrong_arity_is_rejected_before_any_request() {
        let server = mock_node(0).await;
        let token = client(&server).contract("eos").await.unwrap();
        let before = server.received_requests().await.unwrap().len();

        let err = token
            .call("transfer", json!(["inita", "initb"]), CallOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, EosError::InvalidUsage(_)));
        assert_eq!(server.received_requests().await.unwrap().len(), before);
    }

    #[tokio::test]
    async fn test_unknown_contract_reports_unknown_key() {
        let server = mock_node(0).await;
        // retries stay on; a missing account must still be asked for once
        let eos = Eos::new(EosConfig::custom(&server.uri()).unwrap()).unwrap();

        let err = eos.contract("nobody").await.unwrap_err();

        assert!(matches!(err, EosError::UnknownContract(_)));
        assert!(err.to_string().contains("unknown key"));
        let lookups = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|request| request.url.path() == "/v1/chain/get_code")
            .count();
        assert_eq!(lookups, 1);
    }
}

mod custom_transaction_tests {
    use super::*;

    #[tokio::test]
    async fn test_custom_transaction_with_unicode_memo() {
        let server = mock_node(1).await;

        let mut tx = Transaction::new();
        let data = json!({"from": "inita", "to": "initb", "amount": "13", "memo": "爱"});
        tx.push_message(
            Message::new(
                Name::new("eos").unwrap(),
                Name::new("transfer").unwrap(),
                vec!["inita@active".parse().unwrap()],
                data.as_object().unwrap().clone(),
            ),
            [Name::new("initb").unwrap(), Name::new("inita").unwrap()],
        );

        let result = client(&server).push(tx, CallOptions::new()).await.unwrap();

        assert_eq!(result.transaction_id(), Some(TRANSACTION_ID));
        let body = &pushed(&server).await[0];
        assert_eq!(body["scope"], json!(["inita", "initb"]));
        assert_eq!(
            body["messages"][0]["data"],
            json!(format!("{INITA}{INITB}0d0000000000000003e788b1"))
        );
    }

    #[tokio::test]
    async fn test_unsigned_unbroadcast_transaction() {
        let server = mock_node(0).await;

        let result = client(&server)
            .transfer(
                "inita",
                "initb",
                1,
                "",
                CallOptions::new().sign(false).broadcast(false),
            )
            .await
            .unwrap();

        assert!(result.transaction.signatures.is_empty());
        assert!(result.receipt.is_none());
        assert!(result.transaction.is_encoded());
        assert!(pushed(&server).await.is_empty());
    }

    #[tokio::test]
    async fn test_signing_without_keys_is_a_configuration_error() {
        let server = mock_node(0).await;
        let eos = Eos::new(config(&server)).unwrap();

        let err = eos
            .transfer("inita", "initb", 1, "", CallOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, EosError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_sign_provider_is_preferred_and_sees_required_keys() {
        let server = mock_node(1).await;
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let eos = Eos::new(config(&server))
            .unwrap()
            // never consulted while a sign provider is set
            .with_key_provider(PrivateKey::generate())
            .with_sign_provider(move |request: SignRequest| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    let key = PrivateKey::from_wif(DEV_WIF)?;
                    let required = request.required_keys(&[key.public_key()]).await?;
                    assert_eq!(required.required_keys, vec![key.public_key()]);
                    request.sign(&key)
                }
            });

        let result = eos
            .transfer("inita", "initb", 1, "", CallOptions::new())
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let buf = AbiCodec.serialize_transaction(&result.transaction).unwrap();
        let signature = Signature::from_hex(&result.transaction.signatures[0]).unwrap();
        assert!(signature.verify(&buf, &dev_public_key()).is_ok());
    }
}

mod batch_tests {
    use super::*;

    #[tokio::test]
    async fn test_async_transaction_commits_one_push() {
        init_tracing();
        let server = mock_node(1).await;

        let result = client(&server)
            .transaction("eos", |batch| async move {
                let token = batch.default_contract()?;
                token.call("transfer", json!(["inita", "initb", 1, ""]), CallOptions::new())?;
                token.call(
                    "okproducer",
                    json!({"voter": "initb", "producer": "initc", "approve": 1}),
                    CallOptions::new(),
                )?;
                Ok::<_, EosError>(())
            })
            .await
            .unwrap();

        assert_eq!(result.transaction.messages.len(), 2);
        let body = &pushed(&server).await[0];
        assert_eq!(body["scope"], json!(["inita", "initb", "initc"]));
        assert_eq!(body["messages"][1]["authorization"][0]["account"], json!("initb"));
    }

    #[tokio::test]
    async fn test_sync_transaction_commits_one_push() {
        let server = mock_node(1).await;

        let result = client(&server)
            .transaction_sync(["eos"], |batch| {
                batch.call("eos", "transfer", json!(["inita", "initb", 1, ""]), CallOptions::new())?;
                batch.call("eos", "transfer", json!(["initb", "inita", 1, ""]), CallOptions::new())
            })
            .await
            .unwrap();

        assert_eq!(result.transaction.messages.len(), 2);
        assert_eq!(result.transaction_id(), Some(TRANSACTION_ID));
    }

    #[tokio::test]
    async fn test_contract_transaction_uses_contract_as_default() {
        let server = mock_node(1).await;
        let token = client(&server).contract("eos").await.unwrap();

        let result = token
            .transaction(|batch| async move {
                batch
                    .default_contract()?
                    .call("transfer", json!(["inita", "initb", 1, ""]), CallOptions::new())
            })
            .await
            .unwrap();

        assert_eq!(result.transaction.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_callback_inside_transaction_rolls_back() {
        let server = mock_node(0).await;

        let err = client(&server)
            .transaction_sync("eos", |batch| {
                let refused = batch.call(
                    "eos",
                    "transfer",
                    json!(["inita", "initb", 1, ""]),
                    CallOptions::new().callback(|_| {}),
                );
                assert!(refused.is_err());
                // swallowing the refusal does not save the batch
                batch.call("eos", "transfer", json!(["inita", "initb", 2, ""]), CallOptions::new())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, EosError::InvalidUsage(ref message) if message == CALLBACK_IN_BATCH));
        assert!(pushed(&server).await.is_empty());
    }

    #[tokio::test]
    async fn test_error_in_sync_closure_rolls_back() {
        let server = mock_node(0).await;

        let outcome: anyhow::Result<_> = client(&server)
            .transaction_sync("eos", |batch| {
                batch.call("eos", "transfer", json!(["inita", "initb", 1, ""]), CallOptions::new())?;
                anyhow::bail!("rollback")
            })
            .await;

        assert_eq!(outcome.unwrap_err().to_string(), "rollback");
        assert!(pushed(&server).await.is_empty());
    }

    #[tokio::test]
    async fn test_error_in_async_closure_rolls_back() {
        let server = mock_node(0).await;

        let outcome: anyhow::Result<_> = client(&server)
            .transaction("eos", |batch| async move {
                batch.call("eos", "transfer", json!(["inita", "initb", 1, ""]), CallOptions::new())?;
                tokio::task::yield_now().await;
                Err(anyhow::anyhow!("rollback"))
            })
            .await;

        assert_eq!(outcome.unwrap_err().to_string(), "rollback");
        assert!(pushed(&server).await.is_empty());
    }

    #[tokio::test]
    async fn test_sdk_typed_rollback_reason() {
        let server = mock_node(0).await;

        let err = client(&server)
            .transaction_sync("eos", |batch| {
                batch.call("eos", "transfer", json!(["inita", "initb", 1, ""]), CallOptions::new())?;
                Err(EosError::rollback("insufficient funds"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, EosError::Rollback(ref reason) if reason == "insufficient funds"));
        assert!(pushed(&server).await.is_empty());
    }

    #[tokio::test]
    async fn test_nested_failure_rolls_back_outer() {
        let server = mock_node(0).await;

        let outcome: anyhow::Result<_> = client(&server)
            .transaction("eos", |batch| async move {
                batch.call("eos", "transfer", json!(["inita", "initb", 1, ""]), CallOptions::new())?;
                batch
                    .transaction(|inner| async move {
                        inner.call("eos", "transfer", json!(["initb", "inita", 1, ""]), CallOptions::new())?;
                        Err(anyhow::anyhow!("inner rollback"))
                    })
                    .await
            })
            .await;

        assert_eq!(outcome.unwrap_err().to_string(), "inner rollback");
        assert!(pushed(&server).await.is_empty());
    }

    #[tokio::test]
    async fn test_nested_client_transaction_joins_outer() {
        let server = mock_node(1).await;
        let eos = client(&server);
        let inner = eos.clone();

        let result = eos
            .transaction("eos", |batch| async move {
                batch.call("eos", "transfer", json!(["inita", "initb", 1, ""]), CallOptions::new())?;
                inner
                    .transaction_sync("eos", |b| {
                        b.call("eos", "transfer", json!(["inita", "initc", 1, ""]), CallOptions::new())
                    })
                    .await?;
                Ok::<_, EosError>(())
            })
            .await
            .unwrap();

        assert_eq!(result.transaction.messages.len(), 2);
        let pushed = pushed(&server).await;
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0]["messages"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_transaction_options_apply_to_the_commit() {
        let server = mock_node(0).await;

        let result = client(&server)
            .transaction_with(
                "eos",
                CallOptions::new().broadcast(false).expire_in_seconds(300),
                |batch| async move {
                    batch.call("eos", "transfer", json!(["inita", "initb", 1, ""]), CallOptions::new())
                },
            )
            .await
            .unwrap();

        assert!(result.receipt.is_none());
        assert_eq!(
            result.transaction.expiration.map(|time| time.to_string()),
            Some("2017-09-13T18:29:33".to_string())
        );
    }

    #[tokio::test]
    async fn test_empty_transaction_is_refused() {
        let server = mock_node(0).await;

        let err = client(&server)
            .transaction_sync("eos", |_| Ok::<_, EosError>(()))
            .await
            .unwrap_err();

        assert!(matches!(err, EosError::InvalidUsage(_)));
    }
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn name_strategy() -> impl Strategy<Value = String> {
        "[a-z1-5]{1,12}"
    }

    proptest! {
        #[test]
        fn name_order_matches_numeric_order(a in name_strategy(), b in name_strategy()) {
            let left = Name::new(a.as_str()).unwrap();
            let right = Name::new(b.as_str()).unwrap();
            prop_assert_eq!(a.cmp(&b), left.to_u64().cmp(&right.to_u64()));
        }

        #[test]
        fn scope_order_does_not_change_serialization(
            names in prop::collection::vec(name_strategy(), 1..6),
        ) {
            let build = |scope: Vec<Name>| {
                let mut tx = Transaction::new();
                tx.set_headers(65541, 1807534122, "2017-09-13T18:25:33".parse().unwrap());
                tx.push_message(
                    Message::new(
                        Name::new("eos").unwrap(),
                        Name::new("transfer").unwrap(),
                        vec![Authorization::active(Name::new("inita").unwrap())],
                        eos_rust_sdk::transaction::MessageData::Encoded("00".to_string()),
                    ),
                    scope,
                );
                AbiCodec.serialize_transaction(&tx).unwrap()
            };

            let forward: Vec<Name> = names.iter().map(|n| Name::new(n.as_str()).unwrap()).collect();
            let mut backward = forward.clone();
            backward.reverse();
            backward.extend(forward.iter().cloned());
            prop_assert_eq!(build(forward), build(backward));
        }
    }
}
