use crate::error::{PayError, Result};
use crate::rest::ApiHttpClient;
use crate::types::*;

/// Unwrap an auth envelope into its user payload.
fn auth_user(resp: AuthResponse, fallback_error: &str) -> Result<User> {
    match resp {
        AuthResponse {
            success: true,
            user: Some(user),
            ..
        } => Ok(user),
        AuthResponse { error, .. } => Err(PayError::Api(
            error.unwrap_or_else(|| fallback_error.to_string()),
        )),
    }
}

impl ApiHttpClient {
    // --- Auth ---

    /// GET /auth/verify-token - Check that the session cookie is still valid.
    pub async fn verify_token(&self) -> Result<()> {
        let _: BasicResponse = self.get("/auth/verify-token").await?;
        Ok(())
    }

    /// GET /auth/me - Fetch the current user's profile.
    pub async fn me(&self) -> Result<User> {
        let resp: AuthResponse = self.get("/auth/me").await?;
        auth_user(resp, "Failed to fetch user data")
    }

    /// POST /auth/login - Authenticate; the session cookie is set by the
    /// server on success.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: AuthResponse = self.post_envelope("/auth/login", &body).await?;
        auth_user(resp, "Invalid credentials")
    }

    /// POST /auth/register - Create an account; logs the user in on success.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let body = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: AuthResponse = self.post_envelope("/auth/register", &body).await?;
        auth_user(resp, "Registration failed")
    }

    /// POST /auth/logout - Clear the server-side session cookie.
    pub async fn logout(&self) -> Result<()> {
        let _: BasicResponse = self.post_empty("/auth/logout").await?;
        Ok(())
    }

    // --- Transactions ---

    /// GET /transactions/history - Purchase history for the current user.
    pub async fn transaction_history(&self) -> Result<Vec<TransactionRecord>> {
        let resp: HistoryResponse = self.get("/transactions/history").await?;
        if !resp.success {
            return Err(PayError::Api(
                resp.error
                    .unwrap_or_else(|| "Failed to fetch transaction history".to_string()),
            ));
        }
        Ok(resp.transactions.unwrap_or_default())
    }

    /// POST /transactions/payment - Report a broadcast payment so the
    /// backend can credit the account. Returns the awarded credits.
    pub async fn notify_payment(
        &self,
        signature: &str,
        amount_in_sol: f64,
        package_id: u32,
    ) -> Result<u64> {
        let body = PaymentNotification {
            signature: signature.to_string(),
            amount_in_sol,
            package_id,
        };
        let resp: PaymentResponse = self.post("/transactions/payment", &body).await?;
        if !resp.success {
            return Err(PayError::Api(
                resp.error
                    .unwrap_or_else(|| "Payment notification rejected".to_string()),
            ));
        }
        Ok(resp.credits.unwrap_or_default())
    }
}
