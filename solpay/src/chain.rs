//! Async facade over the Solana RPC client.
//!
//! The payment pipeline talks to the chain through [`ChainRpc`] so tests
//! can substitute a scripted implementation; [`SolanaRpc`] is the real one.

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use solana_transaction_status::UiTransactionEncoding;
use tracing::debug;

use crate::error::{PayError, Result};

/// Flat view of a fetched transaction: the account list and the balance
/// movement recorded by the network, which is all manual verification needs.
#[derive(Debug, Clone, PartialEq)]
pub struct TxSnapshot {
    pub account_keys: Vec<String>,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    pub err: Option<String>,
}

/// Outcome of a signature status query at some commitment level.
pub type SignatureStatus = Option<std::result::Result<(), String>>;

#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Balance of an account in lamports.
    async fn balance(&self, pubkey: &Pubkey) -> Result<u64>;

    /// Most recent blockhash for transaction construction.
    async fn latest_blockhash(&self) -> Result<Hash>;

    /// Broadcast a signed transaction.
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature>;

    /// Status of a signature at the given commitment: `None` until the
    /// network has recorded it at that level, then the on-chain result.
    async fn signature_status(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<SignatureStatus>;

    /// Look up a transaction at finalized commitment. `None` when the
    /// network does not know the signature.
    async fn transaction_snapshot(&self, signature: &Signature) -> Result<Option<TxSnapshot>>;
}

/// [`ChainRpc`] backed by the nonblocking Solana RPC client.
pub struct SolanaRpc {
    client: RpcClient,
}

impl SolanaRpc {
    pub fn new(rpc_url: &str) -> Self {
        Self {
            client: RpcClient::new(rpc_url.to_string()),
        }
    }
}

#[async_trait]
impl ChainRpc for SolanaRpc {
    async fn balance(&self, pubkey: &Pubkey) -> Result<u64> {
        self.client
            .get_balance(pubkey)
            .await
            .map_err(|e| PayError::Solana(format!("get balance: {e}")))
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| PayError::Solana(format!("get blockhash: {e}")))
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        self.client
            .send_transaction(transaction)
            .await
            .map_err(|e| PayError::Solana(format!("send tx: {e}")))
    }

    async fn signature_status(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<SignatureStatus> {
        let status = self
            .client
            .get_signature_status_with_commitment(signature, commitment)
            .await
            .map_err(|e| PayError::Solana(format!("signature status: {e}")))?;
        Ok(status.map(|r| r.map_err(|e| e.to_string())))
    }

    async fn transaction_snapshot(&self, signature: &Signature) -> Result<Option<TxSnapshot>> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Base64),
            commitment: Some(CommitmentConfig::finalized()),
            max_supported_transaction_version: Some(0),
        };

        // The RPC reports an unknown signature as an error; transient node
        // inconsistency looks the same from here, so both map to "not found"
        // and the caller decides whether to re-check later.
        let fetched = match self
            .client
            .get_transaction_with_config(signature, config)
            .await
        {
            Ok(tx) => tx,
            Err(e) => {
                debug!(%signature, error = %e, "transaction lookup failed");
                return Ok(None);
            }
        };

        let meta = fetched
            .transaction
            .meta
            .ok_or_else(|| PayError::Solana("transaction meta missing".into()))?;
        let decoded = fetched
            .transaction
            .transaction
            .decode()
            .ok_or_else(|| PayError::Solana("transaction payload undecodable".into()))?;

        let account_keys = decoded
            .message
            .static_account_keys()
            .iter()
            .map(|k| k.to_string())
            .collect();

        Ok(Some(TxSnapshot {
            account_keys,
            pre_balances: meta.pre_balances,
            post_balances: meta.post_balances,
            err: meta.err.map(|e| e.to_string()),
        }))
    }
}
