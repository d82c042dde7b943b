//! Per-call and per-finalize options.

use crate::config::EosConfig;
use crate::error::EosResult;
use crate::transaction::types::{Authorization, TransactionResult};
use crate::types::Name;
use std::fmt;

/// Completion callback observing the result of a standalone call.
pub type Callback = Box<dyn FnOnce(&EosResult<TransactionResult>) + Send + 'static>;

/// Options of a single contract call.
///
/// Unset flags fall back to the client's [`EosConfig`]. Authorization and
/// scope strings are validated when the call is issued.
///
/// # Example
///
/// ```rust
/// use eos_rust_sdk::CallOptions;
///
/// let options = CallOptions::new()
///     .authorizations(["initb@owner", "inita@owner"])
///     .scopes(["joe", "billy"])
///     .broadcast(false);
/// assert!(!options.has_callback());
/// ```
#[derive(Default)]
pub struct CallOptions {
    pub(crate) authorization: Vec<String>,
    pub(crate) scope: Vec<String>,
    pub(crate) broadcast: Option<bool>,
    pub(crate) sign: Option<bool>,
    pub(crate) expire_in_seconds: Option<u32>,
    pub(crate) callback: Option<Callback>,
}

impl CallOptions {
    /// Options with every value defaulted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one `account[@permission]` authorization.
    pub fn authorization(mut self, authorization: impl Into<String>) -> Self {
        self.authorization.push(authorization.into());
        self
    }

    /// Adds several authorizations.
    pub fn authorizations<I, S>(mut self, authorizations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authorization
            .extend(authorizations.into_iter().map(Into::into));
        self
    }

    /// Adds one scope account.
    pub fn scope(mut self, account: impl Into<String>) -> Self {
        self.scope.push(account.into());
        self
    }

    /// Adds several scope accounts.
    pub fn scopes<I, S>(mut self, accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope.extend(accounts.into_iter().map(Into::into));
        self
    }

    /// Overrides whether the result is pushed to the node.
    pub fn broadcast(mut self, broadcast: bool) -> Self {
        self.broadcast = Some(broadcast);
        self
    }

    /// Overrides whether the transaction is signed.
    pub fn sign(mut self, sign: bool) -> Self {
        self.sign = Some(sign);
        self
    }

    /// Overrides the expiration window.
    pub fn expire_in_seconds(mut self, seconds: u32) -> Self {
        self.expire_in_seconds = Some(seconds);
        self
    }

    /// Registers a completion callback.
    ///
    /// Only valid for standalone calls; a call inside a batch that carries a
    /// callback is rejected.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&EosResult<TransactionResult>) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Whether a callback is registered.
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    pub(crate) fn take_callback(&mut self) -> Option<Callback> {
        self.callback.take()
    }

    /// Parsed explicit authorizations (empty if none were given).
    pub(crate) fn parsed_authorization(&self) -> EosResult<Vec<Authorization>> {
        self.authorization.iter().map(|s| s.parse()).collect()
    }

    /// Parsed explicit scope (empty if none was given).
    pub(crate) fn parsed_scope(&self) -> EosResult<Vec<Name>> {
        self.scope.iter().map(|s| s.parse()).collect()
    }

    /// Resolves the finalize flags against the client defaults.
    pub fn finalize_options(&self, config: &EosConfig) -> FinalizeOptions {
        FinalizeOptions {
            sign: self.sign.unwrap_or(config.sign()),
            broadcast: self.broadcast.unwrap_or(config.broadcast()),
            expire_in_seconds: self
                .expire_in_seconds
                .unwrap_or(config.expire_in_seconds()),
        }
    }
}

impl fmt::Debug for CallOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallOptions")
            .field("authorization", &self.authorization)
            .field("scope", &self.scope)
            .field("broadcast", &self.broadcast)
            .field("sign", &self.sign)
            .field("expire_in_seconds", &self.expire_in_seconds)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Flags controlling [`SigningResolver::finalize`](crate::transaction::SigningResolver::finalize).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizeOptions {
    /// Produce signatures.
    pub sign: bool,
    /// Push the signed transaction.
    pub broadcast: bool,
    /// Seconds between the reference block time and expiration.
    pub expire_in_seconds: u32,
}

impl FinalizeOptions {
    /// The client defaults.
    pub fn from_config(config: &EosConfig) -> Self {
        Self {
            sign: config.sign(),
            broadcast: config.broadcast(),
            expire_in_seconds: config.expire_in_seconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_fall_back_to_config() {
        let config = EosConfig::local().with_broadcast(false);
        let defaults = CallOptions::new().finalize_options(&config);
        assert_eq!(defaults, FinalizeOptions::from_config(&config));
        assert!(defaults.sign);
        assert!(!defaults.broadcast);
        assert_eq!(defaults.expire_in_seconds, 60);

        let overridden = CallOptions::new()
            .sign(false)
            .broadcast(true)
            .expire_in_seconds(5)
            .finalize_options(&config);
        assert!(!overridden.sign);
        assert!(overridden.broadcast);
        assert_eq!(overridden.expire_in_seconds, 5);
    }

    #[test]
    fn test_parsing_is_deferred() {
        let options = CallOptions::new().authorization("inita@owner").scope("NOPE");
        assert_eq!(options.parsed_authorization().unwrap().len(), 1);
        assert!(options.parsed_scope().is_err());
    }

    #[test]
    fn test_callback_is_taken_once() {
        let mut options = CallOptions::new().callback(|_| {});
        assert!(options.has_callback());
        assert!(options.take_callback().is_some());
        assert!(!options.has_callback());
        assert!(format!("{options:?}").contains("callback: false"));
    }
}
