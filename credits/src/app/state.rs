//! Pure UI state for the purchase app.
//!
//! Everything here is synchronous and side-effect free so the navigation
//! and form rules can be tested without a terminal or a backend.

use std::time::{Duration, Instant};

use solpay::{find_package, TransactionRecord, User};
use tracing::warn;

/// How long a toast stays on screen.
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

/// Top-level screens, mirroring the site's sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Home,
    Pricing,
    Dashboard,
    Login,
    Register,
}

impl Section {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "home" => Some(Self::Home),
            "pricing" => Some(Self::Pricing),
            "dashboard" => Some(Self::Dashboard),
            "login" => Some(Self::Login),
            "register" => Some(Self::Register),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Pricing => "Pricing",
            Self::Dashboard => "Dashboard",
            Self::Login => "Login",
            Self::Register => "Register",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub until: Instant,
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub focus: usize,
}

impl LoginForm {
    pub const FIELDS: usize = 2;

    pub fn field_mut(&mut self) -> &mut String {
        match self.focus {
            0 => &mut self.email,
            _ => &mut self.password,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub focus: usize,
}

impl RegisterForm {
    pub const FIELDS: usize = 4;

    pub fn field_mut(&mut self) -> &mut String {
        match self.focus {
            0 => &mut self.username,
            1 => &mut self.email,
            2 => &mut self.password,
            _ => &mut self.confirm_password,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Display-ready quote for a selected package.
#[derive(Debug, Clone)]
pub struct QuoteView {
    pub package_id: u32,
    pub package_name: String,
    pub price_usd: f64,
    pub credits: u64,
    pub sol_amount: f64,
    pub sol_usd_rate: f64,
}

/// Where the purchase panel currently is.
#[derive(Debug, Clone)]
pub enum PaymentPhase {
    Idle,
    /// Fetching the exchange rate for a selected package.
    Quoting { package_id: u32 },
    /// Quote shown, waiting for the user to confirm or cancel.
    QuoteReady { quote: QuoteView },
    /// Transfer and confirmation in flight.
    Processing { quote: QuoteView, status: String },
    Succeeded {
        signature: String,
        credits: u64,
        sol_amount: f64,
    },
    Failed {
        error: String,
        /// Set when the transfer was broadcast, for manual verification.
        signature: Option<String>,
    },
    /// Typing a signature for manual verification.
    ManualEntry { package_id: u32, input: String },
    Verifying { package_id: u32 },
}

pub struct AppState {
    pub section: Section,
    pub user: Option<User>,
    pub history: Vec<TransactionRecord>,
    pub history_error: Option<String>,
    pub login_form: LoginForm,
    pub register_form: RegisterForm,
    pub payment: PaymentPhase,
    pub wallet_address: Option<String>,
    pub toast: Option<Toast>,
    /// An async task is in flight; input that would start another is ignored.
    pub busy: bool,
    pub should_quit: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            section: Section::Home,
            user: None,
            history: Vec::new(),
            history_error: None,
            login_form: LoginForm::default(),
            register_form: RegisterForm::default(),
            payment: PaymentPhase::Idle,
            wallet_address: None,
            toast: None,
            busy: false,
            should_quit: false,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Navigate to a section by name. Unknown names are ignored; the
    /// dashboard requires a login and redirects otherwise.
    pub fn show_section(&mut self, name: &str) {
        let Some(section) = Section::from_name(name) else {
            warn!(name, "unknown section");
            return;
        };
        self.show(section);
    }

    pub fn show(&mut self, section: Section) {
        if section == Section::Dashboard && !self.is_logged_in() {
            self.toast(ToastKind::Error, "Please log in to view your dashboard");
            self.section = Section::Login;
            return;
        }
        self.section = section;
    }

    /// "Get started" routing: pricing when logged in, registration otherwise.
    pub fn get_started(&mut self) {
        if self.is_logged_in() {
            self.show(Section::Pricing);
        } else {
            self.show(Section::Register);
        }
    }

    pub fn toast(&mut self, kind: ToastKind, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            kind,
            until: Instant::now() + TOAST_DURATION,
        });
    }

    /// Drop the toast once its display window has passed.
    pub fn expire_toast(&mut self) {
        if self.toast.as_ref().is_some_and(|t| Instant::now() >= t.until) {
            self.toast = None;
        }
    }

    /// Start a purchase for the given package. Returns the package id when
    /// a quote should be fetched.
    pub fn select_package(&mut self, package_id: u32) -> Option<u32> {
        if self.busy {
            return None;
        }
        if !self.is_logged_in() {
            self.toast(ToastKind::Error, "Please log in to make a purchase");
            self.section = Section::Login;
            return None;
        }
        if find_package(package_id).is_err() {
            self.toast(ToastKind::Error, "Invalid package selected");
            return None;
        }
        self.payment = PaymentPhase::Quoting { package_id };
        Some(package_id)
    }

    /// Switch the purchase panel to manual signature entry. A signature
    /// preserved from a failed attempt is carried over so the user never
    /// has to re-type it.
    pub fn start_manual_entry(&mut self, package_id: u32) {
        if !self.is_logged_in() {
            self.toast(ToastKind::Error, "Please log in to make a purchase");
            self.section = Section::Login;
            return;
        }
        if find_package(package_id).is_err() {
            self.toast(ToastKind::Error, "Invalid package selected");
            return;
        }
        let input = match &self.payment {
            PaymentPhase::Failed {
                signature: Some(signature),
                ..
            } => signature.clone(),
            _ => String::new(),
        };
        self.payment = PaymentPhase::ManualEntry { package_id, input };
    }

    pub fn apply_login(&mut self, user: User) {
        self.login_form.clear();
        self.register_form.clear();
        self.user = Some(user);
        self.show(Section::Dashboard);
    }

    pub fn apply_logout(&mut self) {
        self.user = None;
        self.history.clear();
        self.history_error = None;
        self.wallet_address = None;
        self.payment = PaymentPhase::Idle;
        self.show(Section::Home);
    }

    pub fn apply_dashboard(
        &mut self,
        user: Option<User>,
        history: Result<Vec<TransactionRecord>, String>,
    ) {
        if let Some(user) = user {
            self.user = Some(user);
        }
        match history {
            Ok(records) => {
                self.history = records;
                self.history_error = None;
            }
            Err(e) => {
                self.history.clear();
                self.history_error = Some(e);
            }
        }
    }

    /// Whether a transfer, quote, or verification is currently in flight.
    /// While true, dismiss/quit keys must not tear the flow down.
    pub fn payment_in_flight(&self) -> bool {
        matches!(
            self.payment,
            PaymentPhase::Quoting { .. }
                | PaymentPhase::Processing { .. }
                | PaymentPhase::Verifying { .. }
        )
    }

    /// Reset the purchase panel after a completed payment.
    pub fn reset_payment(&mut self) {
        self.payment = PaymentPhase::Idle;
        self.wallet_address = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        serde_json::from_value(serde_json::json!({
            "id": "abc",
            "email": "alice@example.com",
            "username": "alice",
            "credits": 100
        }))
        .unwrap()
    }

    #[test]
    fn test_unknown_section_is_ignored() {
        let mut state = AppState::new();
        state.show_section("pricing");
        assert_eq!(state.section, Section::Pricing);
        state.show_section("bogus");
        assert_eq!(state.section, Section::Pricing);
    }

    #[test]
    fn test_dashboard_requires_login() {
        let mut state = AppState::new();
        state.show_section("dashboard");
        assert_eq!(state.section, Section::Login);
        assert!(state.toast.is_some());

        state.user = Some(test_user());
        state.show_section("dashboard");
        assert_eq!(state.section, Section::Dashboard);
    }

    #[test]
    fn test_get_started_routing() {
        let mut state = AppState::new();
        state.get_started();
        assert_eq!(state.section, Section::Register);

        state.user = Some(test_user());
        state.get_started();
        assert_eq!(state.section, Section::Pricing);
    }

    #[test]
    fn test_select_package_requires_login() {
        let mut state = AppState::new();
        assert!(state.select_package(2).is_none());
        assert_eq!(state.section, Section::Login);
    }

    #[test]
    fn test_select_package_rejects_unknown_id() {
        let mut state = AppState::new();
        state.user = Some(test_user());
        assert!(state.select_package(99).is_none());
        assert!(matches!(state.payment, PaymentPhase::Idle));
        assert!(state.toast.is_some());
    }

    #[test]
    fn test_select_package_starts_quote() {
        let mut state = AppState::new();
        state.user = Some(test_user());
        assert_eq!(state.select_package(2), Some(2));
        assert!(matches!(
            state.payment,
            PaymentPhase::Quoting { package_id: 2 }
        ));
    }

    #[test]
    fn test_select_package_ignored_while_busy() {
        let mut state = AppState::new();
        state.user = Some(test_user());
        state.busy = true;
        assert!(state.select_package(2).is_none());
    }

    #[test]
    fn test_login_clears_forms_and_shows_dashboard() {
        let mut state = AppState::new();
        state.login_form.email = "alice@example.com".to_string();
        state.login_form.password = "hunter22".to_string();
        state.apply_login(test_user());
        assert_eq!(state.section, Section::Dashboard);
        assert!(state.login_form.email.is_empty());
        assert!(state.login_form.password.is_empty());
    }

    #[test]
    fn test_logout_resets_everything() {
        let mut state = AppState::new();
        state.apply_login(test_user());
        state.wallet_address = Some("abc".to_string());
        state.apply_logout();
        assert!(!state.is_logged_in());
        assert_eq!(state.section, Section::Home);
        assert!(state.wallet_address.is_none());
    }

    #[test]
    fn test_manual_entry_prefills_preserved_signature() {
        let mut state = AppState::new();
        state.user = Some(test_user());
        state.payment = PaymentPhase::Failed {
            error: "notification failed".to_string(),
            signature: Some("5VERv8NMsig".to_string()),
        };

        state.start_manual_entry(2);
        match &state.payment {
            PaymentPhase::ManualEntry { package_id, input } => {
                assert_eq!(*package_id, 2);
                assert_eq!(input, "5VERv8NMsig");
            }
            other => panic!("expected manual entry, got {other:?}"),
        }
    }

    #[test]
    fn test_manual_entry_starts_empty_without_prior_failure() {
        let mut state = AppState::new();
        state.user = Some(test_user());
        state.start_manual_entry(2);
        match &state.payment {
            PaymentPhase::ManualEntry { input, .. } => assert!(input.is_empty()),
            other => panic!("expected manual entry, got {other:?}"),
        }
    }

    #[test]
    fn test_payment_in_flight_phases() {
        let mut state = AppState::new();
        assert!(!state.payment_in_flight());

        state.payment = PaymentPhase::Quoting { package_id: 2 };
        assert!(state.payment_in_flight());
        state.payment = PaymentPhase::Verifying { package_id: 2 };
        assert!(state.payment_in_flight());
        state.payment = PaymentPhase::Failed {
            error: "boom".to_string(),
            signature: None,
        };
        assert!(!state.payment_in_flight());
    }

    #[test]
    fn test_dashboard_history_failure_keeps_user() {
        let mut state = AppState::new();
        state.apply_dashboard(Some(test_user()), Err("boom".to_string()));
        assert!(state.is_logged_in());
        assert_eq!(state.history_error.as_deref(), Some("boom"));
    }
}
