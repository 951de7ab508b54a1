//! Terminal shell for the purchase app: event loop, async task spawning,
//! and message plumbing between the UI state and the solpay SDK.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use solpay::chain::{ChainRpc, SolanaRpc};
use solpay::payment::{PaymentFlow, PaymentQuote, PaymentSuccess, PaymentTiming};
use solpay::rate::RateSource;
use solpay::rest::ApiHttpClient;
use solpay::session::AuthSession;
use solpay::types::{TransactionRecord, User};
use solpay::wallet::{KeypairWallet, WalletAdapter};
use solpay::SolPayConfig;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::render;
use super::state::{AppState, PaymentPhase, QuoteView, Section, ToastKind};
use crate::cli::AppArgs;
use crate::error::AppError;

/// Target render interval (10 FPS).
const RENDER_INTERVAL: Duration = Duration::from_millis(100);

/// How long the success panel stays up before the purchase view resets.
const SUCCESS_RESET_DELAY: Duration = Duration::from_secs(3);

/// Results of async work, fed back into the UI loop.
enum AppMsg {
    SessionInitialized(Option<User>),
    DashboardLoaded {
        user: Option<User>,
        history: Result<Vec<TransactionRecord>, String>,
    },
    LoginResult(Result<User, String>),
    RegisterResult(Result<User, String>),
    LoggedOut,
    QuoteReady(Result<PaymentQuote, String>),
    WalletConnected(String),
    UserRefreshed(User),
    PaymentFinished(Result<PaymentSuccess, (String, Option<String>)>),
    ResetPayment,
}

/// Run the interactive purchase app until quit or cancellation.
pub async fn run_app(args: &AppArgs, cancel: CancellationToken) -> Result<(), AppError> {
    let mut config = SolPayConfig::from_env();
    if let Some(url) = &args.api_url {
        config.api_url = url.clone();
    }
    if let Some(url) = &args.rpc_url {
        config.rpc_url = url.clone();
    }

    let api = Arc::new(ApiHttpClient::new(&config.api_url)?);
    let rpc: Arc<dyn ChainRpc> = Arc::new(SolanaRpc::new(&config.rpc_url));
    let rate = RateSource::new(&config.price_api_url, config.estimated_sol_usd_rate);
    let flow = Arc::new(PaymentFlow::new(
        config.clone(),
        api.clone(),
        rpc,
        rate,
        PaymentTiming::default(),
    ));
    let session = Arc::new(Mutex::new(AuthSession::new(
        api.clone(),
        args.user_mirror.clone(),
    )));
    let wallet = Arc::new(Mutex::new(KeypairWallet::new(args.keypair_path())));

    info!(api = %config.api_url, rpc = %config.rpc_url, "starting purchase app");

    let (tx, mut rx) = mpsc::unbounded_channel::<AppMsg>();
    let mut state = AppState::new();
    // The in-flight quote, kept outside AppState so the pay task gets the
    // exact lamport amount that was displayed.
    let mut current_quote: Option<PaymentQuote> = None;
    // 'm' was pressed; the next digit picks the package to verify manually.
    let mut manual_pending = false;

    // Restore any existing session before first paint.
    {
        let session = session.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let mut session = session.lock().await;
            session.initialize().await;
            let user = session.current_user().cloned();
            let _ = tx.send(AppMsg::SessionInitialized(user));
        });
    }

    enable_raw_mode().map_err(|_| AppError::Terminal("failed to enable raw mode".into()))?;
    io::stdout()
        .execute(EnterAlternateScreen)
        .map_err(|_| AppError::Terminal("failed to enter alternate screen".into()))?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .map_err(|_| AppError::Terminal("failed to create terminal".into()))?;

    let mut render_interval = tokio::time::interval(RENDER_INTERVAL);

    loop {
        if state.should_quit {
            break;
        }

        tokio::select! {
            Some(msg) = rx.recv() => {
                handle_msg(
                    &mut state,
                    &mut current_quote,
                    msg,
                    &session,
                    &tx,
                );
            }

            _ = render_interval.tick() => {
                while event::poll(Duration::ZERO).unwrap_or(false) {
                    if let Ok(Event::Key(key)) = event::read() {
                        if key.kind == KeyEventKind::Press {
                            handle_key(
                                &mut state,
                                &mut current_quote,
                                &mut manual_pending,
                                key,
                                &session,
                                &wallet,
                                &flow,
                                &tx,
                            );
                        }
                    }
                }

                state.expire_toast();
                if !state.should_quit {
                    let _ = terminal.draw(|frame| render::render(frame, &state));
                }
            }

            _ = cancel.cancelled() => {
                break;
            }
        }
    }

    restore_terminal(&mut terminal);
    Ok(())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) {
    let _ = terminal.show_cursor();
    let _ = disable_raw_mode();
    let _ = io::stdout().execute(LeaveAlternateScreen);
}

// ---------------------------------------------------------------------------
// Message handling
// ---------------------------------------------------------------------------

fn handle_msg(
    state: &mut AppState,
    current_quote: &mut Option<PaymentQuote>,
    msg: AppMsg,
    session: &Arc<Mutex<AuthSession>>,
    tx: &mpsc::UnboundedSender<AppMsg>,
) {
    match msg {
        AppMsg::SessionInitialized(user) => {
            if let Some(user) = user {
                info!(username = %user.username, "session restored");
                state.user = Some(user);
                state.show(Section::Dashboard);
                spawn_dashboard_load(session, tx);
            }
        }

        AppMsg::DashboardLoaded { user, history } => {
            state.apply_dashboard(user, history);
        }

        AppMsg::LoginResult(result) => {
            state.busy = false;
            match result {
                Ok(user) => {
                    state.toast(ToastKind::Success, format!("Welcome back, {}", user.username));
                    state.apply_login(user);
                    spawn_dashboard_load(session, tx);
                }
                Err(e) => state.toast(ToastKind::Error, e),
            }
        }

        AppMsg::RegisterResult(result) => {
            state.busy = false;
            match result {
                Ok(user) => {
                    state.toast(ToastKind::Success, "Account created");
                    state.apply_login(user);
                    spawn_dashboard_load(session, tx);
                }
                Err(e) => state.toast(ToastKind::Error, e),
            }
        }

        AppMsg::LoggedOut => {
            state.busy = false;
            state.apply_logout();
            state.toast(ToastKind::Info, "Logged out");
        }

        AppMsg::QuoteReady(result) => {
            state.busy = false;
            match result {
                Ok(quote) => {
                    let view = QuoteView {
                        package_id: quote.package.id,
                        package_name: quote.package.name.to_string(),
                        price_usd: quote.package.price_usd,
                        credits: quote.package.credits,
                        sol_amount: quote.sol_amount,
                        sol_usd_rate: quote.sol_usd_rate,
                    };
                    *current_quote = Some(quote);
                    state.payment = PaymentPhase::QuoteReady { quote: view };
                }
                Err(e) => {
                    state.payment = PaymentPhase::Idle;
                    state.toast(ToastKind::Error, e);
                }
            }
        }

        AppMsg::WalletConnected(address) => {
            state.wallet_address = Some(address);
        }

        AppMsg::UserRefreshed(user) => {
            state.user = Some(user);
        }

        AppMsg::PaymentFinished(result) => {
            state.busy = false;
            match result {
                Ok(success) => {
                    state.toast(
                        ToastKind::Success,
                        format!("Payment successful! {} credits added", success.credits),
                    );
                    state.payment = PaymentPhase::Succeeded {
                        signature: success.signature,
                        credits: success.credits,
                        sol_amount: success.sol_amount,
                    };
                }
                Err((error, signature)) => {
                    state.toast(ToastKind::Error, error.clone());
                    state.payment = PaymentPhase::Failed { error, signature };
                }
            }
        }

        AppMsg::ResetPayment => {
            // Only reset if the success panel is still up; the user may have
            // started something else meanwhile.
            if matches!(state.payment, PaymentPhase::Succeeded { .. }) {
                state.reset_payment();
                *current_quote = None;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Key handling
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn handle_key(
    state: &mut AppState,
    current_quote: &mut Option<PaymentQuote>,
    manual_pending: &mut bool,
    key: KeyEvent,
    session: &Arc<Mutex<AuthSession>>,
    wallet: &Arc<Mutex<KeypairWallet>>,
    flow: &Arc<PaymentFlow>,
    tx: &mpsc::UnboundedSender<AppMsg>,
) {
    // Manual signature entry captures all input first.
    if let PaymentPhase::ManualEntry { package_id, input } = &mut state.payment {
        match key.code {
            KeyCode::Esc => state.payment = PaymentPhase::Idle,
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Enter => {
                let package_id = *package_id;
                let signature = input.trim().to_string();
                if signature.is_empty() {
                    state.toast(ToastKind::Error, "Please enter a transaction signature");
                    return;
                }
                state.payment = PaymentPhase::Verifying { package_id };
                state.busy = true;
                spawn_verify(flow, session, tx, signature, package_id);
            }
            KeyCode::Char(c) => input.push(c),
            _ => {}
        }
        return;
    }

    // A quote, transfer, or verification is running; swallowing Esc here
    // keeps it from falling through to quit while a broadcast transaction
    // is still confirming.
    if state.payment_in_flight() && key.code == KeyCode::Esc {
        return;
    }

    // Purchase panel shortcuts.
    match &state.payment {
        PaymentPhase::QuoteReady { .. } => match key.code {
            KeyCode::Enter => {
                if let Some(quote) = current_quote.clone() {
                    confirm_payment(state, quote, session, wallet, flow, tx);
                }
                return;
            }
            KeyCode::Esc => {
                state.payment = PaymentPhase::Idle;
                *current_quote = None;
                return;
            }
            _ => {}
        },
        PaymentPhase::Failed { .. } | PaymentPhase::Succeeded { .. } => {
            if key.code == KeyCode::Esc {
                state.reset_payment();
                *current_quote = None;
                spawn_disconnect(wallet);
                return;
            }
        }
        _ => {}
    }

    // Form input.
    if matches!(state.section, Section::Login | Section::Register) {
        if handle_form_key(state, key, session, tx) {
            return;
        }
    }

    // Global navigation.
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => state.should_quit = true,
        KeyCode::Char('h') => state.show_section("home"),
        KeyCode::Char('p') => state.show_section("pricing"),
        KeyCode::Char('d') => {
            state.show_section("dashboard");
            if state.section == Section::Dashboard {
                spawn_dashboard_load(session, tx);
            }
        }
        KeyCode::Char('l') => state.show_section("login"),
        KeyCode::Char('r') => state.show_section("register"),
        KeyCode::Char('g') => state.get_started(),
        KeyCode::Char('o') => {
            if state.is_logged_in() && !state.busy {
                state.busy = true;
                spawn_logout(session, tx);
            }
        }
        KeyCode::Char('m') => {
            if state.section == Section::Pricing {
                *manual_pending = true;
                state.toast(ToastKind::Info, "Pick the package to verify (1-3)");
            }
        }
        KeyCode::Char(c @ '1'..='9') => {
            if state.section == Section::Pricing {
                let package_id = c as u32 - '0' as u32;
                if *manual_pending {
                    *manual_pending = false;
                    state.start_manual_entry(package_id);
                } else if state.select_package(package_id).is_some() {
                    state.busy = true;
                    spawn_quote(flow, tx, package_id);
                }
            }
        }
        _ => {}
    }
}

/// Handle a key while a login/register form is focused. Returns true when
/// the key was consumed.
fn handle_form_key(
    state: &mut AppState,
    key: KeyEvent,
    session: &Arc<Mutex<AuthSession>>,
    tx: &mpsc::UnboundedSender<AppMsg>,
) -> bool {
    let is_login = state.section == Section::Login;
    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            if is_login {
                let form = &mut state.login_form;
                form.focus = (form.focus + 1) % super::state::LoginForm::FIELDS;
            } else {
                let form = &mut state.register_form;
                form.focus = (form.focus + 1) % super::state::RegisterForm::FIELDS;
            }
            true
        }
        KeyCode::BackTab | KeyCode::Up => {
            if is_login {
                let form = &mut state.login_form;
                form.focus = (form.focus + super::state::LoginForm::FIELDS - 1)
                    % super::state::LoginForm::FIELDS;
            } else {
                let form = &mut state.register_form;
                form.focus = (form.focus + super::state::RegisterForm::FIELDS - 1)
                    % super::state::RegisterForm::FIELDS;
            }
            true
        }
        KeyCode::Backspace => {
            if is_login {
                state.login_form.field_mut().pop();
            } else {
                state.register_form.field_mut().pop();
            }
            true
        }
        KeyCode::Char(c) => {
            if is_login {
                state.login_form.field_mut().push(c);
            } else {
                state.register_form.field_mut().push(c);
            }
            true
        }
        KeyCode::Enter => {
            if state.busy {
                return true;
            }
            state.busy = true;
            if is_login {
                let email = state.login_form.email.clone();
                let password = state.login_form.password.clone();
                let session = session.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = session
                        .lock()
                        .await
                        .login(&email, &password)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = tx.send(AppMsg::LoginResult(result));
                });
            } else {
                let form = &state.register_form;
                let (username, email) = (form.username.clone(), form.email.clone());
                let (password, confirm) = (form.password.clone(), form.confirm_password.clone());
                let session = session.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = session
                        .lock()
                        .await
                        .register(&username, &email, &password, &confirm)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = tx.send(AppMsg::RegisterResult(result));
                });
            }
            true
        }
        KeyCode::Esc => {
            state.show(Section::Home);
            true
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Async task spawners
// ---------------------------------------------------------------------------

fn spawn_disconnect(wallet: &Arc<Mutex<KeypairWallet>>) {
    let wallet = wallet.clone();
    tokio::spawn(async move {
        wallet.lock().await.disconnect().await;
    });
}

fn spawn_dashboard_load(session: &Arc<Mutex<AuthSession>>, tx: &mpsc::UnboundedSender<AppMsg>) {
    let session = session.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let load = session.lock().await.load_dashboard().await;
        let _ = tx.send(AppMsg::DashboardLoaded {
            user: load.user,
            history: load.history,
        });
    });
}

fn spawn_logout(session: &Arc<Mutex<AuthSession>>, tx: &mpsc::UnboundedSender<AppMsg>) {
    let session = session.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        session.lock().await.logout().await;
        let _ = tx.send(AppMsg::LoggedOut);
    });
}

fn spawn_quote(flow: &Arc<PaymentFlow>, tx: &mpsc::UnboundedSender<AppMsg>, package_id: u32) {
    let flow = flow.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = flow.quote(package_id).await.map_err(|e| e.to_string());
        let _ = tx.send(AppMsg::QuoteReady(result));
    });
}

fn confirm_payment(
    state: &mut AppState,
    quote: PaymentQuote,
    session: &Arc<Mutex<AuthSession>>,
    wallet: &Arc<Mutex<KeypairWallet>>,
    flow: &Arc<PaymentFlow>,
    tx: &mpsc::UnboundedSender<AppMsg>,
) {
    let view = QuoteView {
        package_id: quote.package.id,
        package_name: quote.package.name.to_string(),
        price_usd: quote.package.price_usd,
        credits: quote.package.credits,
        sol_amount: quote.sol_amount,
        sol_usd_rate: quote.sol_usd_rate,
    };
    state.payment = PaymentPhase::Processing {
        quote: view,
        status: "Connecting wallet and sending transaction...".to_string(),
    };
    state.busy = true;

    let session = session.clone();
    let wallet = wallet.clone();
    let flow = flow.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let mut wallet = wallet.lock().await;
        let address = match wallet.connect().await {
            Ok(address) => address,
            Err(e) => {
                let _ = tx.send(AppMsg::PaymentFinished(Err((e.to_string(), None))));
                return;
            }
        };
        let _ = tx.send(AppMsg::WalletConnected(address));

        match flow.pay(&*wallet, &quote).await {
            Ok(success) => {
                if let Ok(user) = session.lock().await.refresh_user().await {
                    let _ = tx.send(AppMsg::UserRefreshed(user));
                }
                let _ = tx.send(AppMsg::PaymentFinished(Ok(success)));
                tokio::time::sleep(SUCCESS_RESET_DELAY).await;
                wallet.disconnect().await;
                let _ = tx.send(AppMsg::ResetPayment);
            }
            Err(failure) => {
                let _ = tx.send(AppMsg::PaymentFinished(Err((
                    failure.error.to_string(),
                    failure.signature,
                ))));
            }
        }
    });
}

fn spawn_verify(
    flow: &Arc<PaymentFlow>,
    session: &Arc<Mutex<AuthSession>>,
    tx: &mpsc::UnboundedSender<AppMsg>,
    signature: String,
    package_id: u32,
) {
    let flow = flow.clone();
    let session = session.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        match flow.manual_verify(&signature, package_id).await {
            Ok(success) => {
                if let Ok(user) = session.lock().await.refresh_user().await {
                    let _ = tx.send(AppMsg::UserRefreshed(user));
                }
                let _ = tx.send(AppMsg::PaymentFinished(Ok(success)));
                tokio::time::sleep(SUCCESS_RESET_DELAY).await;
                let _ = tx.send(AppMsg::ResetPayment);
            }
            Err(failure) => {
                let _ = tx.send(AppMsg::PaymentFinished(Err((
                    failure.error.to_string(),
                    failure.signature,
                ))));
            }
        }
    });
}
