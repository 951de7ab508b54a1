//! TUI rendering for the purchase app.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, Wrap};
use solpay::rate::{format_sol, format_usd};
use solpay::PACKAGES;

use super::state::{
    AppState, LoginForm, PaymentPhase, RegisterForm, Section, ToastKind,
};

/// Render one full frame.
pub fn render(frame: &mut Frame, state: &AppState) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // nav
            Constraint::Min(8),    // body
            Constraint::Length(3), // footer
        ])
        .split(area);

    render_nav(frame, layout[0], state);

    match state.section {
        Section::Home => render_home(frame, layout[1], state),
        Section::Pricing => render_pricing(frame, layout[1], state),
        Section::Dashboard => render_dashboard(frame, layout[1], state),
        Section::Login => render_login(frame, layout[1], &state.login_form),
        Section::Register => render_register(frame, layout[1], &state.register_form),
    }

    render_footer(frame, layout[2], state);
}

fn render_nav(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut spans = vec![Span::styled(
        " CREDITS ",
        Style::default().fg(Color::Black).bg(Color::Cyan).bold(),
    )];

    let tabs: &[(Section, &str)] = if state.is_logged_in() {
        &[
            (Section::Home, "[h] Home"),
            (Section::Pricing, "[p] Pricing"),
            (Section::Dashboard, "[d] Dashboard"),
        ]
    } else {
        &[
            (Section::Home, "[h] Home"),
            (Section::Pricing, "[p] Pricing"),
            (Section::Login, "[l] Login"),
            (Section::Register, "[r] Register"),
        ]
    };

    for (section, label) in tabs {
        spans.push(Span::raw("  "));
        let style = if *section == state.section {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(*label, style));
    }

    if let Some(user) = &state.user {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{} ({} credits)  [o] Logout", user.username, group_thousands(user.credits)),
            Style::default().fg(Color::Green),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_home(frame: &mut Frame, area: Rect, state: &AppState) {
    let cta = if state.is_logged_in() {
        "Press 'g' to get started and pick a package on the Pricing page."
    } else {
        "Press 'g' to get started by creating an account."
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Buy posting credits with SOL",
            Style::default().bold(),
        )),
        Line::from(""),
        Line::from("  Pay from your Solana wallet; credits land on your"),
        Line::from("  account as soon as the transaction is confirmed."),
        Line::from(""),
        Line::from(format!("  {cta}")),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Home ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_pricing(frame: &mut Frame, area: Rect, state: &AppState) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(6)])
        .split(area);

    let mut lines = vec![Line::from("")];
    for (i, package) in PACKAGES.iter().enumerate() {
        lines.push(Line::from(format!(
            "  [{}] {:<12} {:>8}  {:>10} credits",
            i + 1,
            package.name,
            format_usd(package.price_usd),
            group_thousands(package.credits),
        )));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Pricing ");
    frame.render_widget(Paragraph::new(lines).block(block), layout[0]);

    render_payment_panel(frame, layout[1], state);
}

fn render_payment_panel(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut lines = vec![Line::from("")];

    match &state.payment {
        PaymentPhase::Idle => {
            lines.push(Line::from("  Select a package with 1-3."));
            lines.push(Line::from(
                "  Already paid? Press 'm' then 1-3 to verify a transaction manually.",
            ));
        }
        PaymentPhase::Quoting { package_id } => {
            lines.push(Line::from(format!(
                "  Fetching SOL price for package {package_id}..."
            )));
        }
        PaymentPhase::QuoteReady { quote } => {
            lines.push(Line::from(format!(
                "  {}: {} = {}  (1 SOL = {})",
                quote.package_name,
                format_usd(quote.price_usd),
                format_sol(quote.sol_amount),
                format_usd(quote.sol_usd_rate),
            )));
            lines.push(Line::from(format!(
                "  {} credits on confirmation",
                group_thousands(quote.credits)
            )));
            lines.push(Line::from(""));
            lines.push(Line::from("  [Enter] pay with wallet    [Esc] cancel"));
        }
        PaymentPhase::Processing { quote, status } => {
            if let Some(address) = &state.wallet_address {
                lines.push(Line::from(format!(
                    "  Wallet {}",
                    shorten_address(address)
                )));
            }
            lines.push(Line::from(format!(
                "  Paying {} for {}...",
                format_sol(quote.sol_amount),
                quote.package_name
            )));
            lines.push(Line::from(Span::styled(
                format!("  {status}"),
                Style::default().fg(Color::Yellow),
            )));
        }
        PaymentPhase::Succeeded {
            signature,
            credits,
            sol_amount,
        } => {
            lines.push(Line::from(Span::styled(
                format!(
                    "  Payment complete: {} → {} credits",
                    format_sol(*sol_amount),
                    group_thousands(*credits)
                ),
                Style::default().fg(Color::Green).bold(),
            )));
            lines.push(Line::from(format!(
                "  Signature {}",
                shorten_signature(signature)
            )));
            lines.push(Line::from(Span::styled(
                format!("  {}", explorer_url(signature)),
                Style::default().fg(Color::DarkGray),
            )));
        }
        PaymentPhase::Failed { error, signature } => {
            lines.push(Line::from(Span::styled(
                format!("  Payment failed: {error}"),
                Style::default().fg(Color::Red),
            )));
            if let Some(sig) = signature {
                lines.push(Line::from(format!(
                    "  Transaction {} was sent.",
                    shorten_signature(sig)
                )));
                lines.push(Line::from(Span::styled(
                    format!("  {}", explorer_url(sig)),
                    Style::default().fg(Color::DarkGray),
                )));
                lines.push(Line::from(
                    "  Press 'm' then the package number to verify it manually.",
                ));
            }
            lines.push(Line::from("  [Esc] dismiss"));
        }
        PaymentPhase::ManualEntry { package_id, input } => {
            lines.push(Line::from(format!(
                "  Manual verification for package {package_id}"
            )));
            lines.push(Line::from(format!("  Signature: {input}_")));
            lines.push(Line::from("  [Enter] verify    [Esc] cancel"));
        }
        PaymentPhase::Verifying { package_id } => {
            lines.push(Line::from(format!(
                "  Verifying transaction for package {package_id}..."
            )));
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Purchase ");
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_dashboard(frame: &mut Frame, area: Rect, state: &AppState) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(4)])
        .split(area);

    let mut lines = vec![Line::from("")];
    if let Some(user) = &state.user {
        lines.push(Line::from(format!("  User     {}", user.username)));
        lines.push(Line::from(format!(
            "  Credits  {}",
            group_thousands(user.credits)
        )));
        lines.push(Line::from(format!(
            "  Posts    {}",
            group_thousands(user.posts_created)
        )));
        lines.push(Line::from(format!(
            "  Status   {}",
            user.status.as_deref().unwrap_or("Active")
        )));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Account ");
    frame.render_widget(Paragraph::new(lines).block(block), layout[0]);

    render_history(frame, layout[1], state);
}

fn render_history(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Purchase history ");

    if let Some(error) = &state.history_error {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("  Failed to load history: {error}"),
                Style::default().fg(Color::Red),
            )),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), area);
        return;
    }

    if state.history.is_empty() {
        let lines = vec![Line::from(""), Line::from("  No transactions yet")];
        frame.render_widget(Paragraph::new(lines).block(block), area);
        return;
    }

    let rows: Vec<Row> = state
        .history
        .iter()
        .map(|record| {
            Row::new(vec![
                record.date.format("%Y-%m-%d %H:%M").to_string(),
                record.package_name.clone(),
                format!(
                    "{} ({})",
                    format_usd(record.amount_usd),
                    format_sol(record.amount_sol)
                ),
                group_thousands(record.credits),
                shorten_signature(&record.signature),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(17),
            Constraint::Length(12),
            Constraint::Length(24),
            Constraint::Length(10),
            Constraint::Min(19),
        ],
    )
    .header(
        Row::new(vec!["Date", "Package", "Amount", "Credits", "Signature"])
            .style(Style::default().bold()),
    )
    .block(block);
    frame.render_widget(table, area);
}

fn render_login(frame: &mut Frame, area: Rect, form: &LoginForm) {
    let lines = vec![
        Line::from(""),
        form_field("Email", &form.email, form.focus == 0, false),
        form_field("Password", &form.password, form.focus == 1, true),
        Line::from(""),
        Line::from("  [Tab] next field    [Enter] log in"),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Login ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_register(frame: &mut Frame, area: Rect, form: &RegisterForm) {
    let lines = vec![
        Line::from(""),
        form_field("Username", &form.username, form.focus == 0, false),
        form_field("Email", &form.email, form.focus == 1, false),
        form_field("Password", &form.password, form.focus == 2, true),
        form_field("Confirm", &form.confirm_password, form.focus == 3, true),
        Line::from(""),
        Line::from("  [Tab] next field    [Enter] create account"),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Register ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn form_field(label: &str, value: &str, focused: bool, mask: bool) -> Line<'static> {
    let shown = if mask {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };
    let cursor = if focused { "_" } else { "" };
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Line::from(Span::styled(
        format!("  {label:<10} {shown}{cursor}"),
        style,
    ))
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState) {
    let content = if let Some(toast) = &state.toast {
        let color = match toast.kind {
            ToastKind::Success => Color::Green,
            ToastKind::Error => Color::Red,
            ToastKind::Info => Color::Cyan,
        };
        Line::from(Span::styled(
            format!(" {}", toast.message),
            Style::default().fg(color).bold(),
        ))
    } else {
        Line::from(Span::styled(
            " g: get started | h/p/d/l/r: sections | o: logout | q: quit",
            Style::default().fg(Color::DarkGray),
        ))
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(Paragraph::new(content).block(block), area);
}

/// Explorer page for a transaction, shown so the full signature stays
/// reachable next to its abbreviated form.
pub fn explorer_url(signature: &str) -> String {
    format!("https://explorer.solana.com/tx/{signature}")
}

/// `first8…last8` form for long signatures.
pub fn shorten_signature(signature: &str) -> String {
    shorten(signature, 8, 8)
}

/// `first6…last4` form for wallet addresses.
pub fn shorten_address(address: &str) -> String {
    shorten(address, 6, 4)
}

fn shorten(s: &str, head: usize, tail: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= head + tail {
        return s.to_string();
    }
    let start: String = chars[..head].iter().collect();
    let end: String = chars[chars.len() - tail..].iter().collect();
    format!("{start}...{end}")
}

/// Thousands separator for credit counts, e.g. `56,000`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_signature() {
        let sig = "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW";
        assert_eq!(shorten_signature(sig), "5VERv8NM...diSZkQUW");
    }

    #[test]
    fn test_shorten_short_strings_untouched() {
        assert_eq!(shorten_signature("abc"), "abc");
        assert_eq!(shorten_address("abcdefghij"), "abcdefghij");
    }

    #[test]
    fn test_shorten_address() {
        assert_eq!(
            shorten_address("3yBZQz58CscgqkRxFCH7YA55tJKhSrtcDYAxegNwvA1x"),
            "3yBZQz...vA1x"
        );
    }

    #[test]
    fn test_explorer_url() {
        assert_eq!(
            explorer_url("abc123"),
            "https://explorer.solana.com/tx/abc123"
        );
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(56_000), "56,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }
}
