use crate::error::{PayError, Result};

/// Configuration for the solpay client.
#[derive(Debug, Clone)]
pub struct SolPayConfig {
    /// Base URL for the backend REST API (e.g. `https://api.reply-guy.xyz/api`).
    pub api_url: String,
    /// Recipient wallet for payments (the admin's wallet).
    pub payment_wallet: String,
    /// Solana RPC URL.
    pub rpc_url: String,
    /// Price API endpoint for the live SOL/USD rate.
    pub price_api_url: String,
    /// Estimated SOL/USD rate used when the live lookup fails.
    pub estimated_sol_usd_rate: f64,
}

impl Default for SolPayConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.reply-guy.xyz/api".into(),
            payment_wallet: "3yBZQz58CscgqkRxFCH7YA55tJKhSrtcDYAxegNwvA1x".into(),
            rpc_url: "https://api.mainnet-beta.solana.com".into(),
            price_api_url:
                "https://api.coingecko.com/api/v3/simple/price?ids=solana&vs_currencies=usd"
                    .into(),
            estimated_sol_usd_rate: 100.0,
        }
    }
}

impl SolPayConfig {
    /// Default configuration with environment overrides applied.
    ///
    /// Recognized variables: `CREDITS_API_URL`, `PAYMENT_WALLET`,
    /// `SOLANA_RPC_URL`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("CREDITS_API_URL") {
            config.api_url = url;
        }
        if let Ok(wallet) = std::env::var("PAYMENT_WALLET") {
            config.payment_wallet = wallet;
        }
        if let Ok(url) = std::env::var("SOLANA_RPC_URL") {
            config.rpc_url = url;
        }
        config
    }
}

/// A purchasable bundle of credits with a fixed USD price.
///
/// The catalog is defined client-side and must match the server's
/// expectations; the server remains the pricing authority.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Package {
    pub id: u32,
    pub name: &'static str,
    pub price_usd: f64,
    pub credits: u64,
}

/// Static package catalog.
pub const PACKAGES: [Package; 3] = [
    Package {
        id: 1,
        name: "Starter",
        price_usd: 5.0,
        credits: 10_000,
    },
    Package {
        id: 2,
        name: "Pro",
        price_usd: 20.0,
        credits: 56_000,
    },
    Package {
        id: 3,
        name: "Enterprise",
        price_usd: 50.0,
        credits: 150_000,
    },
];

/// Find a package by its ID.
pub fn find_package(id: u32) -> Result<&'static Package> {
    PACKAGES
        .iter()
        .find(|p| p.id == id)
        .ok_or(PayError::PackageNotFound(id))
}
