//! SOL/USD rate lookup and amount conversion/formatting.

use serde::Deserialize;
use tracing::warn;

use crate::error::Result;

/// Lamports per SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Fetches the live SOL/USD rate, falling back to a configured estimate.
#[derive(Debug, Clone)]
pub struct RateSource {
    client: reqwest::Client,
    url: String,
    fallback: f64,
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    solana: PricePoint,
}

#[derive(Debug, Deserialize)]
struct PricePoint {
    usd: f64,
}

impl RateSource {
    pub fn new(url: &str, fallback: f64) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            fallback,
        }
    }

    /// Get the current SOL/USD rate.
    ///
    /// A rate-lookup failure never blocks a payment flow: the configured
    /// estimate is substituted and a warning is logged.
    pub async fn sol_usd_rate(&self) -> f64 {
        match self.fetch().await {
            Ok(rate) => rate,
            Err(e) => {
                warn!(error = %e, fallback = self.fallback, "failed to fetch SOL/USD rate, using estimated value");
                self.fallback
            }
        }
    }

    async fn fetch(&self) -> Result<f64> {
        let resp = self.client.get(&self.url).send().await?;
        let resp = resp.error_for_status()?;
        let price: PriceResponse = resp.json().await?;
        Ok(price.solana.usd)
    }
}

/// Convert a USD amount to SOL at the given rate.
pub fn convert_usd_to_sol(usd_amount: f64, rate: f64) -> f64 {
    usd_amount / rate
}

/// Convert a fractional SOL amount to whole lamports, rounding to the
/// nearest base unit.
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64).round() as u64
}

/// Convert lamports back to SOL.
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Format a SOL amount with 6 decimal places, e.g. `0.500000 SOL`.
pub fn format_sol(sol: f64) -> String {
    format!("{sol:.6} SOL")
}

/// Format a USD amount with 2 decimal places, e.g. `$20.00`.
pub fn format_usd(usd: f64) -> String {
    format!("${usd:.2}")
}
