//! Client SDK for the credits purchase flow: backend auth and REST calls,
//! SOL/USD pricing, wallet signing, on-chain payment confirmation, and
//! backend payment notification with manual verification fallback.

pub mod chain;
pub mod config;
pub mod error;
pub mod payment;
pub mod rate;
pub mod rest;
pub mod retry;
pub mod session;
pub mod types;
pub mod validate;
pub mod wallet;

pub use chain::{ChainRpc, SolanaRpc, TxSnapshot};
pub use config::{find_package, Package, SolPayConfig, PACKAGES};
pub use error::{PayError, Result};
pub use payment::{PaymentFailure, PaymentFlow, PaymentQuote, PaymentSuccess, PaymentTiming};
pub use rate::RateSource;
pub use rest::ApiHttpClient;
pub use session::{AuthSession, DashboardLoad};
pub use types::{TransactionRecord, User};
pub use wallet::{KeypairWallet, WalletAdapter, WalletState};
