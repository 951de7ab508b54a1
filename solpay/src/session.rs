//! Authenticated session against the backend.
//!
//! The server is the source of truth for who is logged in (via its
//! HTTP-only session cookie); [`AuthSession`] keeps a local copy of the
//! profile plus an optional JSON mirror file for quick display on the
//! next startup.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::rest::ApiHttpClient;
use crate::types::{TransactionRecord, User, UserMirror};
use crate::validate;

/// Result of loading the dashboard. The profile and the purchase history
/// are fetched independently so a history failure never hides the stats.
#[derive(Debug)]
pub struct DashboardLoad {
    pub user: Option<User>,
    pub history: std::result::Result<Vec<TransactionRecord>, String>,
}

impl DashboardLoad {
    /// Whether the profile fetch succeeded.
    pub fn success(&self) -> bool {
        self.user.is_some()
    }
}

pub struct AuthSession {
    api: Arc<ApiHttpClient>,
    current_user: Option<User>,
    mirror_path: Option<PathBuf>,
}

impl AuthSession {
    pub fn new(api: Arc<ApiHttpClient>, mirror_path: Option<PathBuf>) -> Self {
        Self {
            api,
            current_user: None,
            mirror_path,
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn api(&self) -> &Arc<ApiHttpClient> {
        &self.api
    }

    /// Check whether an existing session cookie is still valid and, if so,
    /// load the profile. Returns `true` when a session was restored.
    ///
    /// Any failure along the way means "not logged in": the stale mirror is
    /// cleared and the caller shows the login screen.
    pub async fn initialize(&mut self) -> bool {
        let restored = async {
            self.api.verify_token().await?;
            self.api.me().await
        }
        .await;

        match restored {
            Ok(user) => {
                info!(username = %user.username, "session restored");
                self.write_mirror(&user);
                self.current_user = Some(user);
                true
            }
            Err(e) => {
                debug!(error = %e, "no existing session");
                self.current_user = None;
                self.clear_mirror();
                false
            }
        }
    }

    /// Validate credentials locally, then authenticate against the backend.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<User> {
        validate::validate_login(email, password)?;

        let user = self.api.login(email, password).await?;
        info!(username = %user.username, "logged in");
        self.write_mirror(&user);
        self.current_user = Some(user.clone());
        Ok(user)
    }

    /// Validate the registration form locally, then create the account.
    /// A successful registration also logs the user in.
    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<User> {
        validate::validate_registration(username, email, password, confirm_password)?;

        let user = self.api.register(username, email, password).await?;
        info!(username = %user.username, "account created");
        self.write_mirror(&user);
        self.current_user = Some(user.clone());
        Ok(user)
    }

    /// Log out. Local state is cleared no matter what the server says; a
    /// failed request only means the server-side cookie may outlive us.
    pub async fn logout(&mut self) {
        if let Err(e) = self.api.logout().await {
            warn!(error = %e, "logout request failed");
        }
        self.current_user = None;
        self.clear_mirror();
        info!("logged out");
    }

    /// Fetch the profile and the purchase history for the dashboard.
    pub async fn load_dashboard(&mut self) -> DashboardLoad {
        let user = match self.api.me().await {
            Ok(user) => {
                self.write_mirror(&user);
                self.current_user = Some(user.clone());
                Some(user)
            }
            Err(e) => {
                warn!(error = %e, "failed to load user data");
                None
            }
        };

        let history = self
            .api
            .transaction_history()
            .await
            .map_err(|e| e.to_string());
        if let Err(e) = &history {
            warn!(error = %e, "failed to load transaction history");
        }

        DashboardLoad { user, history }
    }

    /// Refresh the cached profile after a credit balance change.
    pub async fn refresh_user(&mut self) -> Result<User> {
        let user = self.api.me().await?;
        self.write_mirror(&user);
        self.current_user = Some(user.clone());
        Ok(user)
    }

    fn write_mirror(&self, user: &User) {
        let Some(path) = &self.mirror_path else {
            return;
        };
        let mirror = UserMirror::from(user);
        let result = serde_json::to_vec_pretty(&mirror)
            .map_err(std::io::Error::other)
            .and_then(|bytes| std::fs::write(path, bytes));
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "failed to write user mirror");
        }
    }

    fn clear_mirror(&self) {
        let Some(path) = &self.mirror_path else {
            return;
        };
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "failed to clear user mirror");
            }
        }
    }
}
