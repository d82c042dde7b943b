//! `/v1/chain` HTTP client.

use crate::abi::Abi;
use crate::api::response::{Block, ChainInfo, PushReceipt, RequiredKeys};
use crate::api::{BlockRef, ChainApi};
use crate::config::EosConfig;
use crate::crypto::PublicKey;
use crate::error::{EosError, EosResult};
use crate::retry::{RetryConfig, RetryExecutor};
use crate::transaction::Transaction;
use crate::types::Name;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json";
const CHAIN_API_PATH: &str = "v1/chain";
/// What the node reports when asked for an account or ABI it does not have.
const UNKNOWN_KEY: &str = "unknown key";

/// Client for a node's chain API.
///
/// Reads are retried according to the configured [`RetryConfig`];
/// `push_transaction` is sent exactly once.
///
/// # Example
///
/// ```rust,no_run
/// use eos_rust_sdk::api::{ChainApi, HttpChainApi};
/// use eos_rust_sdk::EosConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let api = HttpChainApi::new(&EosConfig::local())?;
///     let info = api.get_info().await?;
///     println!("head block: {}", info.head_block_num);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct HttpChainApi {
    base_url: Url,
    client: Client,
    retry_config: Arc<RetryConfig>,
}

#[derive(Deserialize)]
struct CodeResponse {
    #[serde(default)]
    abi: Option<Abi>,
}

impl HttpChainApi {
    /// Creates a client from the endpoint, timeout, retry and pool settings
    /// of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &EosConfig) -> EosResult<Self> {
        let pool = config.pool_config();
        let mut builder = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(pool.max_idle_per_host.unwrap_or(usize::MAX))
            .pool_idle_timeout(pool.idle_timeout)
            .tcp_nodelay(pool.tcp_nodelay);
        if let Some(keepalive) = pool.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }
        let client = builder.build().map_err(EosError::Http)?;
        Ok(Self::from_client(client, config))
    }

    /// Wraps an existing `reqwest` client.
    pub fn from_client(client: Client, config: &EosConfig) -> Self {
        Self {
            base_url: config.http_endpoint().clone(),
            client,
            retry_config: Arc::new(config.retry_config().clone()),
        }
    }

    /// The node endpoint.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn build_url(&self, endpoint: &str) -> Url {
        let mut url = self.base_url.clone();
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base}/{CHAIN_API_PATH}/{endpoint}"));
        url
    }

    async fn post_retried<T: DeserializeOwned>(&self, endpoint: &str, body: Value) -> EosResult<T> {
        let url = self.build_url(endpoint);
        RetryExecutor::new((*self.retry_config).clone())
            .execute(|| self.post(url.clone(), &body))
            .await
    }

    async fn post_retried_unless<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Value,
        is_final: fn(&EosError) -> bool,
    ) -> EosResult<T> {
        let url = self.build_url(endpoint);
        let executor = RetryExecutor::new((*self.retry_config).clone());
        executor
            .execute_with_predicate(
                || self.post(url.clone(), &body),
                |error| executor.config().is_retryable_error(error) && !is_final(error),
            )
            .await
    }

    async fn post<T: DeserializeOwned>(&self, url: Url, body: &Value) -> EosResult<T> {
        debug!(url = %url, "chain request");
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(ACCEPT, JSON_CONTENT_TYPE)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> EosResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        // {"code": 500, "message": "...", "error": {"name": "...", "what": "..."}}
        let body: Value = response.json().await.unwrap_or_default();
        let what = body
            .get("error")
            .and_then(|e| e.get("what"))
            .and_then(Value::as_str);
        let message = what
            .or_else(|| body.get("message").and_then(Value::as_str))
            .unwrap_or("Unknown error")
            .to_string();
        let code = body.get("code").and_then(Value::as_i64);

        Err(EosError::api_with_code(status.as_u16(), message, code))
    }
}

fn is_unknown_key(err: &EosError) -> bool {
    matches!(err, EosError::Api { message, .. } if message.contains(UNKNOWN_KEY))
}

#[async_trait]
impl ChainApi for HttpChainApi {
    async fn get_info(&self) -> EosResult<ChainInfo> {
        self.post_retried("get_info", json!({})).await
    }

    async fn get_block(&self, block: BlockRef) -> EosResult<Block> {
        self.post_retried("get_block", json!({ "block_num_or_id": block }))
            .await
    }

    async fn get_abi(&self, account: &Name) -> EosResult<Option<Abi>> {
        // a missing account is an answer, not a transient failure
        let result: EosResult<CodeResponse> = self
            .post_retried_unless("get_code", json!({ "account_name": account }), is_unknown_key)
            .await;
        match result {
            Ok(code) => Ok(code.abi),
            Err(err) if is_unknown_key(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn get_required_keys(
        &self,
        transaction: &Transaction,
        available_keys: &[PublicKey],
    ) -> EosResult<RequiredKeys> {
        self.post_retried(
            "get_required_keys",
            json!({
                "transaction": transaction,
                "available_keys": available_keys,
            }),
        )
        .await
    }

    async fn push_transaction(&self, transaction: &Transaction) -> EosResult<PushReceipt> {
        let body = serde_json::to_value(transaction)?;
        self.post(self.build_url("push_transaction"), &body).await
    }
}
