//! Turning an assembled transaction into a signed, optionally broadcast one.
//!
//! Signatures come from exactly one source. A [`SignProvider`] receives the
//! serialized bytes and returns signatures; a [`KeyProvider`] returns private
//! keys that sign locally. Both are async traits, implemented for plain
//! async closures so callers rarely need a named type.
//!
//! # Example
//!
//! ```rust,no_run
//! use eos_rust_sdk::transaction::SignRequest;
//! use eos_rust_sdk::{Eos, EosConfig, EosResult};
//!
//! const WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";
//!
//! # fn main() -> EosResult<()> {
//! let eos = Eos::new(EosConfig::local())?.with_sign_provider(
//!     |request: SignRequest| async move { request.sign_wif(WIF) },
//! );
//! # let _ = eos;
//! # Ok(())
//! # }
//! ```

use crate::abi::AbiCache;
use crate::api::{BlockRef, ChainApi, RequiredKeys};
use crate::codec::Codec;
use crate::crypto::{PrivateKey, PublicKey, Signature};
use crate::error::{EosError, EosResult};
use crate::transaction::options::FinalizeOptions;
use crate::transaction::types::{MessageData, Transaction, TransactionResult};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Signatures returned by a [`SignProvider`], in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Signatures(Vec<String>);

impl Signatures {
    /// No signatures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of signatures.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are none.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The signature strings.
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<String> for Signatures {
    fn from(signature: String) -> Self {
        Self(vec![signature])
    }
}

impl From<&str> for Signatures {
    fn from(signature: &str) -> Self {
        Self(vec![signature.to_string()])
    }
}

impl From<Vec<String>> for Signatures {
    fn from(signatures: Vec<String>) -> Self {
        Self(signatures)
    }
}

impl From<Signature> for Signatures {
    fn from(signature: Signature) -> Self {
        Self(vec![signature.to_hex()])
    }
}

impl From<Vec<Signature>> for Signatures {
    fn from(signatures: Vec<Signature>) -> Self {
        Self(signatures.iter().map(Signature::to_hex).collect())
    }
}

/// Private keys returned by a [`KeyProvider`], in signing order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrivateKeys(Vec<PrivateKey>);

impl PrivateKeys {
    /// Parses WIF-encoded keys.
    ///
    /// # Errors
    ///
    /// Fails on the first string that is not a valid WIF key.
    pub fn from_wifs<I, S>(wifs: I) -> EosResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        wifs.into_iter()
            .map(|wif| PrivateKey::from_wif(wif.as_ref()))
            .collect::<EosResult<Vec<_>>>()
            .map(Self)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are none.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The keys, in order.
    pub fn iter(&self) -> impl Iterator<Item = &PrivateKey> {
        self.0.iter()
    }

    /// Public halves of the keys, in order.
    pub fn public_keys(&self) -> Vec<PublicKey> {
        self.0.iter().map(PrivateKey::public_key).collect()
    }
}

impl From<PrivateKey> for PrivateKeys {
    fn from(key: PrivateKey) -> Self {
        Self(vec![key])
    }
}

impl From<Vec<PrivateKey>> for PrivateKeys {
    fn from(keys: Vec<PrivateKey>) -> Self {
        Self(keys)
    }
}

impl FromIterator<PrivateKey> for PrivateKeys {
    fn from_iter<T: IntoIterator<Item = PrivateKey>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// What a [`SignProvider`] is asked to sign.
pub struct SignRequest {
    /// Serialized transaction; signatures are taken over its SHA-256.
    pub buf: Vec<u8>,
    /// The transaction being signed, headers and payloads filled in.
    pub transaction: Transaction,
    chain: Arc<dyn ChainApi>,
}

impl SignRequest {
    pub(crate) fn new(buf: Vec<u8>, transaction: Transaction, chain: Arc<dyn ChainApi>) -> Self {
        Self {
            buf,
            transaction,
            chain,
        }
    }

    /// Signs [`buf`](Self::buf) with `key`.
    pub fn sign(&self, key: &PrivateKey) -> EosResult<Signature> {
        key.sign(&self.buf)
    }

    /// Signs [`buf`](Self::buf) with a WIF-encoded key.
    pub fn sign_wif(&self, wif: &str) -> EosResult<Signature> {
        self.sign(&PrivateKey::from_wif(wif)?)
    }

    /// Asks the node which of `candidates` this transaction needs.
    ///
    /// Compare the answer with [`RequiredKeys::compare`]; what to do about a
    /// mismatch is up to the provider.
    pub async fn required_keys(&self, candidates: &[PublicKey]) -> EosResult<RequiredKeys> {
        self.chain
            .get_required_keys(&self.transaction, candidates)
            .await
    }
}

impl fmt::Debug for SignRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignRequest")
            .field("buf", &hex::encode(&self.buf))
            .field("transaction", &self.transaction)
            .finish_non_exhaustive()
    }
}

/// Produces signatures for serialized transactions.
#[async_trait]
pub trait SignProvider: Send + Sync {
    /// Signs one transaction.
    async fn sign(&self, request: SignRequest) -> EosResult<Signatures>;
}

#[async_trait]
impl<F, Fut, S> SignProvider for F
where
    F: Fn(SignRequest) -> Fut + Send + Sync,
    Fut: Future<Output = EosResult<S>> + Send + 'static,
    S: Into<Signatures> + Send + 'static,
{
    async fn sign(&self, request: SignRequest) -> EosResult<Signatures> {
        Ok(self(request).await?.into())
    }
}

/// Supplies the private keys that sign a transaction.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Keys for `transaction`, in signing order.
    async fn keys(&self, transaction: &Transaction) -> EosResult<PrivateKeys>;
}

#[async_trait]
impl<F, Fut, K> KeyProvider for F
where
    F: Fn(Transaction) -> Fut + Send + Sync,
    Fut: Future<Output = EosResult<K>> + Send + 'static,
    K: Into<PrivateKeys> + Send + 'static,
{
    async fn keys(&self, transaction: &Transaction) -> EosResult<PrivateKeys> {
        Ok(self(transaction.clone()).await?.into())
    }
}

#[async_trait]
impl KeyProvider for PrivateKey {
    async fn keys(&self, _transaction: &Transaction) -> EosResult<PrivateKeys> {
        Ok(self.clone().into())
    }
}

#[async_trait]
impl KeyProvider for PrivateKeys {
    async fn keys(&self, _transaction: &Transaction) -> EosResult<PrivateKeys> {
        Ok(self.clone())
    }
}

/// Fills headers, encodes payloads, signs and broadcasts.
///
/// Stages run strictly in that order. A failure at any stage ends the
/// attempt with nothing broadcast.
#[derive(Clone)]
pub struct SigningResolver {
    chain: Arc<dyn ChainApi>,
    codec: Arc<dyn Codec>,
    abis: Arc<AbiCache>,
    sign_provider: Option<Arc<dyn SignProvider>>,
    key_provider: Option<Arc<dyn KeyProvider>>,
    chain_id: Option<String>,
}

impl SigningResolver {
    /// A resolver with no signing source configured.
    pub fn new(chain: Arc<dyn ChainApi>, codec: Arc<dyn Codec>, abis: Arc<AbiCache>) -> Self {
        Self {
            chain,
            codec,
            abis,
            sign_provider: None,
            key_provider: None,
            chain_id: None,
        }
    }

    /// Sets the signature source. Takes precedence over any key provider.
    pub fn with_sign_provider(mut self, provider: Option<Arc<dyn SignProvider>>) -> Self {
        self.sign_provider = provider;
        self
    }

    /// Sets the key source.
    pub fn with_key_provider(mut self, provider: Option<Arc<dyn KeyProvider>>) -> Self {
        self.key_provider = provider;
        self
    }

    /// Sets the chain id the node must report before headers are filled.
    pub fn with_chain_id(mut self, chain_id: Option<String>) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Finalizes `transaction`.
    ///
    /// # Errors
    ///
    /// - [`EosError::Configuration`] when signing is requested but neither
    ///   provider is set, or the node reports a different chain id
    /// - [`EosError::UnknownContract`] or [`EosError::Serialization`] when a
    ///   payload cannot be encoded
    /// - [`EosError::Broadcast`] when the node rejects the transaction
    /// - whatever the node or a provider returns otherwise
    pub async fn finalize(
        &self,
        mut transaction: Transaction,
        options: FinalizeOptions,
    ) -> EosResult<TransactionResult> {
        transaction.canonicalize();

        if !transaction.has_headers() {
            self.fill_headers(&mut transaction, options.expire_in_seconds)
                .await?;
        }
        self.encode_payloads(&mut transaction).await?;

        if options.sign {
            let buf = self.codec.serialize_transaction(&transaction)?;
            let signatures = self.signatures(&transaction, buf).await?;
            transaction.signatures.extend(signatures);
        }

        let receipt = if options.broadcast {
            let receipt = self
                .chain
                .push_transaction(&transaction)
                .await
                .map_err(EosError::broadcast)?;
            info!(
                transaction_id = %receipt.transaction_id,
                messages = transaction.messages.len(),
                "transaction broadcast"
            );
            Some(receipt)
        } else {
            None
        };

        Ok(TransactionResult {
            transaction,
            receipt,
        })
    }

    async fn fill_headers(
        &self,
        transaction: &mut Transaction,
        expire_in_seconds: u32,
    ) -> EosResult<()> {
        let info = self.chain.get_info().await?;
        if let (Some(expected), Some(actual)) = (&self.chain_id, &info.chain_id) {
            if !expected.eq_ignore_ascii_case(actual) {
                return Err(EosError::configuration(format!(
                    "node reports chain id {actual}, expected {expected}"
                )));
            }
        }
        let block = self
            .chain
            .get_block(BlockRef::Num(info.head_block_num))
            .await?;
        let expiration = block.timestamp.plus_seconds(expire_in_seconds);
        transaction.set_headers(block.block_num, block.ref_block_prefix, expiration);
        debug!(
            block_num = block.block_num,
            ref_block_prefix = block.ref_block_prefix,
            expiration = %expiration,
            "reference block fetched"
        );
        Ok(())
    }

    async fn encode_payloads(&self, transaction: &mut Transaction) -> EosResult<()> {
        for message in &mut transaction.messages {
            let MessageData::Fields(fields) = &message.data else {
                continue;
            };
            let registry = self.abis.get(&message.code).await?;
            let descriptor = registry.require(&message.code, message.action.as_str())?;
            let bytes = self.codec.encode(
                registry.abi(),
                &descriptor.struct_name,
                &Value::Object(fields.clone()),
            )?;
            debug!(
                contract = %message.code,
                action = %message.action,
                len = bytes.len(),
                "payload encoded"
            );
            message.data = MessageData::Encoded(hex::encode(bytes));
        }
        Ok(())
    }

    async fn signatures(&self, transaction: &Transaction, buf: Vec<u8>) -> EosResult<Vec<String>> {
        if let Some(provider) = &self.sign_provider {
            debug!("consulting sign provider");
            let request = SignRequest::new(buf, transaction.clone(), self.chain.clone());
            return Ok(provider.sign(request).await?.into_vec());
        }

        if let Some(provider) = &self.key_provider {
            debug!("consulting key provider");
            let keys = provider.keys(transaction).await?;
            if keys.is_empty() {
                return Err(EosError::configuration("key provider returned no keys"));
            }
            return keys
                .iter()
                .map(|key| key.sign(&buf).map(|signature| signature.to_hex()))
                .collect();
        }

        Err(EosError::configuration(
            "signing requires a sign provider or a key provider",
        ))
    }
}

impl fmt::Debug for SigningResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningResolver")
            .field("chain", &self.chain)
            .field("codec", &self.codec)
            .field("sign_provider", &self.sign_provider.is_some())
            .field("key_provider", &self.key_provider.is_some())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}
