//! Payment pipeline: quote, transfer, confirmation, backend notification.
//!
//! The happy path is linear. The interesting parts are the recovery seams:
//! a finalization that times out gets one re-check against the fetched
//! transaction, and the backend notification retries with linear backoff.
//! When everything on-chain succeeded but the backend never acknowledged,
//! the signature is preserved so the user can run manual verification.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use tracing::{info, warn};

use crate::chain::{ChainRpc, TxSnapshot};
use crate::config::{find_package, Package, SolPayConfig};
use crate::error::{PayError, Result};
use crate::rate::{self, RateSource};
use crate::rest::ApiHttpClient;
use crate::retry::{linear_backoff, retry_with_backoff};
use crate::wallet::WalletAdapter;

/// Delays and timeouts for the payment pipeline. Injected so tests run
/// with everything zeroed.
#[derive(Debug, Clone)]
pub struct PaymentTiming {
    /// Poll interval while waiting for a commitment level.
    pub confirm_poll_interval: Duration,
    /// How long to wait for the "confirmed" commitment.
    pub confirm_timeout: Duration,
    /// How long to wait for finalization before falling back to a re-check.
    pub finalize_timeout: Duration,
    /// Grace period before the re-check, and between failed finalization
    /// and fetching the transaction.
    pub recheck_delay: Duration,
    /// Pause before the first backend notification so the transaction has
    /// propagated to the backend's RPC node.
    pub propagation_delay: Duration,
    /// Base for the linear notification backoff.
    pub notify_backoff_base: Duration,
    /// Notification attempts before giving up.
    pub notify_attempts: u32,
}

impl Default for PaymentTiming {
    fn default() -> Self {
        Self {
            confirm_poll_interval: Duration::from_secs(1),
            confirm_timeout: Duration::from_secs(60),
            finalize_timeout: Duration::from_secs(30),
            recheck_delay: Duration::from_secs(5),
            propagation_delay: Duration::from_secs(2),
            notify_backoff_base: Duration::from_secs(3),
            notify_attempts: 3,
        }
    }
}

impl PaymentTiming {
    /// All delays zeroed, for tests.
    pub fn instant() -> Self {
        Self {
            confirm_poll_interval: Duration::ZERO,
            confirm_timeout: Duration::from_millis(50),
            finalize_timeout: Duration::from_millis(50),
            recheck_delay: Duration::ZERO,
            propagation_delay: Duration::ZERO,
            notify_backoff_base: Duration::ZERO,
            notify_attempts: 3,
        }
    }
}

/// A priced purchase, pinned to the exchange rate at quote time.
#[derive(Debug, Clone)]
pub struct PaymentQuote {
    pub package: &'static Package,
    pub sol_usd_rate: f64,
    pub sol_amount: f64,
    pub lamports: u64,
}

#[derive(Debug)]
pub struct PaymentSuccess {
    pub signature: String,
    pub credits: u64,
    pub sol_amount: f64,
}

/// A failed payment. `signature` is set when the transfer was already
/// broadcast, so the purchase can still be completed manually.
#[derive(Debug)]
pub struct PaymentFailure {
    pub error: PayError,
    pub signature: Option<String>,
}

impl PaymentFailure {
    fn before_send(error: PayError) -> Self {
        Self {
            error,
            signature: None,
        }
    }

    fn after_send(error: PayError, signature: &Signature) -> Self {
        Self {
            error,
            signature: Some(signature.to_string()),
        }
    }
}

pub struct PaymentFlow {
    config: SolPayConfig,
    api: Arc<ApiHttpClient>,
    rpc: Arc<dyn ChainRpc>,
    rate: RateSource,
    timing: PaymentTiming,
}

impl PaymentFlow {
    pub fn new(
        config: SolPayConfig,
        api: Arc<ApiHttpClient>,
        rpc: Arc<dyn ChainRpc>,
        rate: RateSource,
        timing: PaymentTiming,
    ) -> Self {
        Self {
            config,
            api,
            rpc,
            rate,
            timing,
        }
    }

    /// Price a package in SOL at the current exchange rate.
    pub async fn quote(&self, package_id: u32) -> Result<PaymentQuote> {
        let package = find_package(package_id)?;
        let sol_usd_rate = self.rate.sol_usd_rate().await;
        let sol_amount = rate::convert_usd_to_sol(package.price_usd, sol_usd_rate);
        let lamports = rate::sol_to_lamports(sol_amount);
        Ok(PaymentQuote {
            package,
            sol_usd_rate,
            sol_amount,
            lamports,
        })
    }

    /// Run the full payment: transfer, confirm, notify the backend.
    pub async fn pay(
        &self,
        wallet: &dyn WalletAdapter,
        quote: &PaymentQuote,
    ) -> std::result::Result<PaymentSuccess, PaymentFailure> {
        let signature = self
            .transfer(wallet, quote)
            .await
            .map_err(PaymentFailure::before_send)?;

        info!(%signature, "payment transaction sent");

        if let Err(e) = self.confirm(&signature).await {
            return Err(PaymentFailure::after_send(e, &signature));
        }

        let credits = self
            .notify_backend(&signature.to_string(), quote.lamports, quote.package.id)
            .await
            .map_err(|e| PaymentFailure::after_send(e, &signature))?;

        Ok(PaymentSuccess {
            signature: signature.to_string(),
            credits,
            sol_amount: rate::lamports_to_sol(quote.lamports),
        })
    }

    /// Build and broadcast the transfer. Nothing hits the wire until the
    /// balance check passes.
    async fn transfer(
        &self,
        wallet: &dyn WalletAdapter,
        quote: &PaymentQuote,
    ) -> Result<Signature> {
        let payer = wallet
            .address()
            .ok_or(PayError::WalletNotConnected)
            .and_then(|addr| {
                Pubkey::from_str(&addr)
                    .map_err(|e| PayError::Solana(format!("invalid wallet address: {e}")))
            })?;
        let recipient = Pubkey::from_str(&self.config.payment_wallet)
            .map_err(|e| PayError::Solana(format!("invalid payment wallet: {e}")))?;

        let balance = self.rpc.balance(&payer).await?;
        if balance < quote.lamports {
            return Err(PayError::InsufficientBalance {
                required_sol: rate::lamports_to_sol(quote.lamports),
            });
        }

        let blockhash = self.rpc.latest_blockhash().await?;
        let instruction = system_instruction::transfer(&payer, &recipient, quote.lamports);
        let message = Message::new_with_blockhash(&[instruction], Some(&payer), &blockhash);
        let transaction = Transaction::new_unsigned(message);

        wallet.sign_and_send(self.rpc.as_ref(), transaction).await
    }

    /// Wait for "confirmed", then for finalization with a bounded timeout.
    /// When finalization cannot be observed in time, fetch the transaction
    /// once after a grace period and accept it if it landed without error.
    async fn confirm(&self, signature: &Signature) -> Result<()> {
        self.await_commitment(
            signature,
            CommitmentConfig::confirmed(),
            self.timing.confirm_timeout,
        )
        .await?;
        info!(%signature, "transaction confirmed");

        let finalized = self
            .await_commitment(
                signature,
                CommitmentConfig::finalized(),
                self.timing.finalize_timeout,
            )
            .await;

        match finalized {
            Ok(()) => {
                info!(%signature, "transaction finalized");
                Ok(())
            }
            Err(e) => {
                warn!(%signature, error = %e, "finalization not observed, re-checking");
                tokio::time::sleep(self.timing.recheck_delay).await;
                match self.rpc.transaction_snapshot(signature).await? {
                    Some(snapshot) if snapshot.err.is_none() => {
                        info!(%signature, "transaction verified by re-check");
                        Ok(())
                    }
                    Some(snapshot) => Err(PayError::TransactionFailed(
                        snapshot.err.unwrap_or_else(|| "unknown".to_string()),
                    )),
                    None => Err(e),
                }
            }
        }
    }

    /// Poll the signature status until the commitment level is reached,
    /// the transaction errors, or the timeout elapses.
    async fn await_commitment(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
        timeout: Duration,
    ) -> Result<()> {
        let timeout_err = if commitment == CommitmentConfig::finalized() {
            PayError::FinalizationTimeout
        } else {
            PayError::ConfirmationTimeout
        };

        let poll = async {
            loop {
                match self.rpc.signature_status(signature, commitment).await? {
                    Some(Ok(())) => return Ok(()),
                    Some(Err(e)) => return Err(PayError::TransactionFailed(e)),
                    None => tokio::time::sleep(self.timing.confirm_poll_interval).await,
                }
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(timeout_err),
        }
    }

    /// Report the payment to the backend, with retries. The amount is
    /// derived from lamports so both sides agree on whole base units.
    async fn notify_backend(
        &self,
        signature: &str,
        lamports: u64,
        package_id: u32,
    ) -> Result<u64> {
        tokio::time::sleep(self.timing.propagation_delay).await;

        let amount_in_sol = rate::lamports_to_sol(lamports);
        retry_with_backoff(
            self.timing.notify_attempts,
            linear_backoff(self.timing.notify_backoff_base),
            |attempt| {
                let api = Arc::clone(&self.api);
                async move {
                    info!(attempt, signature, "notifying backend of payment");
                    api.notify_payment(signature, amount_in_sol, package_id).await
                }
            },
        )
        .await
    }

    /// Complete a purchase from an already-broadcast transaction signature.
    ///
    /// The transaction must be finalized, involve the payment wallet, and
    /// have moved funds to it. The backend is notified with the package's
    /// expected amount, while the returned `sol_amount` is the observed
    /// balance delta so the user sees what actually moved; a mismatch is
    /// logged and left for the backend to adjudicate.
    pub async fn manual_verify(
        &self,
        signature: &str,
        package_id: u32,
    ) -> std::result::Result<PaymentSuccess, PaymentFailure> {
        let quote = self
            .quote(package_id)
            .await
            .map_err(PaymentFailure::before_send)?;

        let parsed = Signature::from_str(signature.trim()).map_err(|_| {
            PaymentFailure::before_send(PayError::Validation(
                "Invalid transaction signature".to_string(),
            ))
        })?;

        let fail = |error| PaymentFailure::after_send(error, &parsed);

        let snapshot = self
            .rpc
            .transaction_snapshot(&parsed)
            .await
            .map_err(fail)?
            .ok_or_else(|| fail(PayError::TxNotFound(parsed.to_string())))?;

        if let Some(err) = snapshot.err {
            return Err(fail(PayError::TransactionFailed(err)));
        }

        let delta = recipient_delta(&snapshot, &self.config.payment_wallet)
            .map_err(fail)?;
        if delta != quote.lamports {
            warn!(
                signature,
                received = delta,
                expected = quote.lamports,
                "on-chain amount differs from package price"
            );
        }
        info!(signature, lamports = delta, "manual verification passed");

        let credits = self
            .notify_backend(&parsed.to_string(), quote.lamports, package_id)
            .await
            .map_err(fail)?;

        Ok(PaymentSuccess {
            signature: parsed.to_string(),
            credits,
            sol_amount: rate::lamports_to_sol(delta),
        })
    }
}

/// Lamports received by `recipient` in the snapshot. Errors when the
/// recipient is not among the transaction's accounts or its balance did
/// not increase.
pub fn recipient_delta(snapshot: &TxSnapshot, recipient: &str) -> Result<u64> {
    let index = snapshot
        .account_keys
        .iter()
        .position(|k| k == recipient)
        .ok_or(PayError::RecipientNotInTransaction)?;

    let pre = snapshot.pre_balances.get(index).copied().unwrap_or(0);
    let post = snapshot.post_balances.get(index).copied().unwrap_or(0);
    if post <= pre {
        return Err(PayError::NoFundsTransferred);
    }
    Ok(post - pre)
}
