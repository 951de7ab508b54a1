use thiserror::Error;

#[derive(Error, Debug)]
pub enum PayError {
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error string reported by the backend in a `{success: false}` envelope.
    #[error("{0}")]
    Api(String),

    /// Form input rejected before any request was made. Carries the exact
    /// message to show the user.
    #[error("{0}")]
    Validation(String),

    #[error("invalid package: {0}")]
    PackageNotFound(u32),

    #[error("wallet not installed: no keypair at {0}")]
    WalletNotInstalled(String),

    #[error("wallet not connected")]
    WalletNotConnected,

    #[error("insufficient balance: at least {required_sol:.6} SOL required")]
    InsufficientBalance { required_sol: f64 },

    #[error("solana error: {0}")]
    Solana(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("transaction confirmed with on-chain error: {0}")]
    TransactionFailed(String),

    #[error("transaction confirmation timeout")]
    ConfirmationTimeout,

    #[error("transaction finalization timeout")]
    FinalizationTimeout,

    #[error("transaction not found on chain: {0}")]
    TxNotFound(String),

    #[error("transaction does not involve the payment wallet")]
    RecipientNotInTransaction,

    #[error("transaction did not transfer funds to the payment wallet")]
    NoFundsTransferred,
}

pub type Result<T> = std::result::Result<T, PayError>;
