//! Client configuration.
//!
//! [`EosConfig`] carries the node endpoint, the default `sign`/`broadcast`
//! behavior of every call, the expiration window of new transactions and
//! the HTTP client settings (timeout, retry, connection pool).

use crate::retry::RetryConfig;
use std::time::Duration;
use url::Url;

/// Default node endpoint of a local `nodeos`.
pub const LOCAL_HTTP_ENDPOINT: &str = "http://127.0.0.1:8888";

/// Default seconds between the reference block time and expiration.
pub const DEFAULT_EXPIRE_IN_SECONDS: u32 = 60;

/// Account that hosts the native token contract.
pub const DEFAULT_SYSTEM_CONTRACT: &str = "eos";

/// HTTP connection pool settings.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum idle connections per host (`None` = unlimited).
    pub max_idle_per_host: Option<usize>,
    /// How long idle connections are kept.
    pub idle_timeout: Duration,
    /// TCP keepalive interval, if any.
    pub tcp_keepalive: Option<Duration>,
    /// Disable Nagle's algorithm.
    pub tcp_nodelay: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: None,
            idle_timeout: Duration::from_secs(90),
            tcp_keepalive: Some(Duration::from_secs(60)),
            tcp_nodelay: true,
        }
    }
}

impl PoolConfig {
    /// Few short-lived connections, suited to a node on the same machine.
    pub fn low_latency() -> Self {
        Self {
            max_idle_per_host: Some(8),
            idle_timeout: Duration::from_secs(30),
            tcp_keepalive: Some(Duration::from_secs(15)),
            tcp_nodelay: true,
        }
    }

    /// The smallest useful pool.
    pub fn minimal() -> Self {
        Self {
            max_idle_per_host: Some(2),
            idle_timeout: Duration::from_secs(10),
            tcp_keepalive: None,
            tcp_nodelay: true,
        }
    }
}

/// Configuration for the [`Eos`](crate::Eos) client.
///
/// # Example
///
/// ```rust
/// use eos_rust_sdk::EosConfig;
/// use eos_rust_sdk::retry::RetryConfig;
///
/// let config = EosConfig::custom("http://10.0.0.5:8888")
///     .unwrap()
///     .with_broadcast(false)
///     .with_expire_in_seconds(30)
///     .with_retry(RetryConfig::conservative());
///
/// assert!(!config.broadcast());
/// assert!(config.sign());
/// ```
#[derive(Debug, Clone)]
pub struct EosConfig {
    pub(crate) http_endpoint: Url,
    pub(crate) chain_id: Option<String>,
    pub(crate) broadcast: bool,
    pub(crate) sign: bool,
    pub(crate) expire_in_seconds: u32,
    pub(crate) system_contract: String,
    pub(crate) timeout: Duration,
    pub(crate) retry_config: RetryConfig,
    pub(crate) pool_config: PoolConfig,
}

impl Default for EosConfig {
    fn default() -> Self {
        Self::local()
    }
}

impl EosConfig {
    /// Configuration for a node on `127.0.0.1:8888`.
    pub fn local() -> Self {
        Self::with_endpoint(Url::parse(LOCAL_HTTP_ENDPOINT).expect("valid local URL"))
            .with_retry(RetryConfig::aggressive())
            .with_pool(PoolConfig::low_latency())
    }

    /// Configuration for any other node.
    ///
    /// # Errors
    ///
    /// Returns an error if `http_endpoint` is not a valid URL.
    pub fn custom(http_endpoint: &str) -> Result<Self, url::ParseError> {
        Ok(Self::with_endpoint(Url::parse(http_endpoint)?))
    }

    fn with_endpoint(http_endpoint: Url) -> Self {
        Self {
            http_endpoint,
            chain_id: None,
            broadcast: true,
            sign: true,
            expire_in_seconds: DEFAULT_EXPIRE_IN_SECONDS,
            system_contract: DEFAULT_SYSTEM_CONTRACT.to_string(),
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
            pool_config: PoolConfig::default(),
        }
    }

    /// Sets the chain id the client expects to talk to.
    ///
    /// Before a transaction's headers are filled, the id reported by
    /// `get_info` is compared against it and a mismatch fails the call with
    /// [`EosError::Configuration`](crate::EosError::Configuration).
    pub fn with_chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = Some(chain_id.into());
        self
    }

    /// Sets whether calls broadcast by default.
    pub fn with_broadcast(mut self, broadcast: bool) -> Self {
        self.broadcast = broadcast;
        self
    }

    /// Sets whether calls sign by default.
    pub fn with_sign(mut self, sign: bool) -> Self {
        self.sign = sign;
        self
    }

    /// Sets the expiration window of new transactions.
    pub fn with_expire_in_seconds(mut self, seconds: u32) -> Self {
        self.expire_in_seconds = seconds;
        self
    }

    /// Sets the account used by [`Eos::transfer`](crate::Eos::transfer).
    pub fn with_system_contract(mut self, contract: impl Into<String>) -> Self {
        self.system_contract = contract.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry policy for chain reads.
    pub fn with_retry(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Disables retries of chain reads.
    pub fn without_retry(mut self) -> Self {
        self.retry_config = RetryConfig::no_retry();
        self
    }

    /// Sets the HTTP connection pool settings.
    pub fn with_pool(mut self, pool_config: PoolConfig) -> Self {
        self.pool_config = pool_config;
        self
    }

    /// The node endpoint.
    pub fn http_endpoint(&self) -> &Url {
        &self.http_endpoint
    }

    /// The expected chain id, if configured.
    pub fn chain_id(&self) -> Option<&str> {
        self.chain_id.as_deref()
    }

    /// Whether calls broadcast by default.
    pub fn broadcast(&self) -> bool {
        self.broadcast
    }

    /// Whether calls sign by default.
    pub fn sign(&self) -> bool {
        self.sign
    }

    /// Expiration window of new transactions.
    pub fn expire_in_seconds(&self) -> u32 {
        self.expire_in_seconds
    }

    /// Account hosting the native token contract.
    pub fn system_contract(&self) -> &str {
        &self.system_contract
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The retry policy for chain reads.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    /// The HTTP connection pool settings.
    pub fn pool_config(&self) -> &PoolConfig {
        &self.pool_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_config() {
        let config = EosConfig::local();
        assert_eq!(config.http_endpoint().as_str(), "http://127.0.0.1:8888/");
        assert!(config.broadcast());
        assert!(config.sign());
        assert_eq!(config.expire_in_seconds(), 60);
        assert_eq!(config.system_contract(), "eos");
        assert_eq!(config.retry_config().max_retries, 5);
    }

    #[test]
    fn test_custom_config() {
        let config = EosConfig::custom("https://node.example.com").unwrap();
        assert_eq!(config.http_endpoint().host_str(), Some("node.example.com"));
        assert!(config.chain_id().is_none());
        assert!(EosConfig::custom("not a url").is_err());
    }

    #[test]
    fn test_builder_methods() {
        let config = EosConfig::local()
            .with_chain_id("cf057bbfb72640471fd910bcb67639c22df9f92470936cddc1ade0e2f2e7dc4f")
            .with_sign(false)
            .with_broadcast(false)
            .with_expire_in_seconds(5)
            .with_system_contract("eosio.token")
            .with_timeout(Duration::from_secs(3))
            .without_retry();

        assert!(config.chain_id().is_some());
        assert!(!config.sign());
        assert!(!config.broadcast());
        assert_eq!(config.expire_in_seconds(), 5);
        assert_eq!(config.system_contract(), "eosio.token");
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.retry_config().max_retries, 0);
    }

    #[test]
    fn test_pool_presets() {
        assert!(PoolConfig::default().max_idle_per_host.is_none());
        assert_eq!(PoolConfig::low_latency().max_idle_per_host, Some(8));
        assert!(PoolConfig::minimal().tcp_keepalive.is_none());
    }
}
