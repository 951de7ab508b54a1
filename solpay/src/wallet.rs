//! Wallet adapter: the signing authority for payments.
//!
//! All signing happens behind [`WalletAdapter`]; callers only ever see an
//! opaque address string and a returned signature, never key material.

use std::path::PathBuf;

use async_trait::async_trait;
use solana_sdk::signature::{read_keypair_file, Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use tracing::info;

use crate::chain::ChainRpc;
use crate::error::{PayError, Result};

/// Wallet connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletState {
    Disconnected,
    Connecting,
    Connected,
}

#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Current connection state.
    fn state(&self) -> WalletState;

    /// Connected wallet address, if any.
    fn address(&self) -> Option<String>;

    /// Connect to the wallet. Fails with [`PayError::WalletNotInstalled`]
    /// when no wallet is available at all.
    async fn connect(&mut self) -> Result<String>;

    /// Disconnect and clear local wallet state. Never fails the caller.
    async fn disconnect(&mut self);

    /// Sign the transaction and broadcast it through the given RPC.
    async fn sign_and_send(&self, rpc: &dyn ChainRpc, transaction: Transaction)
        -> Result<Signature>;
}

/// A wallet backed by a keypair file on disk, standing in for a browser
/// extension: presence of the file is the "installed" probe, and the key
/// never leaves this type.
pub struct KeypairWallet {
    keypair_path: PathBuf,
    keypair: Option<Keypair>,
    state: WalletState,
}

impl KeypairWallet {
    pub fn new(keypair_path: PathBuf) -> Self {
        Self {
            keypair_path,
            keypair: None,
            state: WalletState::Disconnected,
        }
    }

    /// Whether a wallet keypair is present at the configured path.
    pub fn is_installed(&self) -> bool {
        self.keypair_path.is_file()
    }
}

#[async_trait]
impl WalletAdapter for KeypairWallet {
    fn state(&self) -> WalletState {
        self.state
    }

    fn address(&self) -> Option<String> {
        self.keypair.as_ref().map(|kp| kp.pubkey().to_string())
    }

    async fn connect(&mut self) -> Result<String> {
        if !self.is_installed() {
            return Err(PayError::WalletNotInstalled(
                self.keypair_path.display().to_string(),
            ));
        }

        self.state = WalletState::Connecting;
        let keypair = read_keypair_file(&self.keypair_path).map_err(|e| {
            self.state = WalletState::Disconnected;
            PayError::Signing(format!("failed to read keypair: {e}"))
        })?;

        let address = keypair.pubkey().to_string();
        info!(wallet = %address, "wallet connected");
        self.keypair = Some(keypair);
        self.state = WalletState::Connected;
        Ok(address)
    }

    async fn disconnect(&mut self) {
        self.keypair = None;
        self.state = WalletState::Disconnected;
    }

    async fn sign_and_send(
        &self,
        rpc: &dyn ChainRpc,
        mut transaction: Transaction,
    ) -> Result<Signature> {
        let keypair = self.keypair.as_ref().ok_or(PayError::WalletNotConnected)?;

        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[keypair], blockhash)
            .map_err(|e| PayError::Signing(format!("sign transaction: {e}")))?;

        rpc.send_transaction(&transaction).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_without_keypair_file_is_not_installed() {
        let mut wallet = KeypairWallet::new(PathBuf::from("/nonexistent/id.json"));
        assert_eq!(wallet.state(), WalletState::Disconnected);

        let err = wallet.connect().await.unwrap_err();
        assert!(matches!(err, PayError::WalletNotInstalled(_)));
        assert_eq!(wallet.state(), WalletState::Disconnected);
        assert!(wallet.address().is_none());
    }

    #[tokio::test]
    async fn test_disconnect_clears_state_unconditionally() {
        let mut wallet = KeypairWallet::new(PathBuf::from("/nonexistent/id.json"));
        // Disconnecting a never-connected wallet is a no-op, not an error.
        wallet.disconnect().await;
        assert_eq!(wallet.state(), WalletState::Disconnected);
        assert!(wallet.address().is_none());
    }
}
