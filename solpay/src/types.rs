use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User profile as reported by the backend.
///
/// The backend owns and mutates this; the client holds a read-only cached
/// copy refreshed on login, registration, and dashboard load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub credits: u64,
    #[serde(default)]
    pub posts_created: u64,
    #[serde(default)]
    pub status: Option<String>,
}

/// Minimal non-authoritative user copy persisted locally as a backup.
/// The actual session is the HTTP-only cookie set by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMirror {
    pub id: String,
    pub email: String,
    pub username: String,
}

impl From<&User> for UserMirror {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
        }
    }
}

/// A completed purchase as recorded by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub date: DateTime<Utc>,
    pub package_name: String,
    pub amount_usd: f64,
    pub amount_sol: f64,
    pub credits: u64,
    pub signature: String,
}

// --- Request bodies ---

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// POST /transactions/payment body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentNotification {
    pub signature: String,
    pub amount_in_sol: f64,
    pub package_id: u32,
}

// --- Response envelopes ---
//
// Every backend response carries a `success` flag plus either a payload or
// an `error` string.

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BasicResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub transactions: Option<Vec<TransactionRecord>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub credits: Option<u64>,
}
