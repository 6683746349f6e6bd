use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode, PANE_DETAILS, PANE_TXS, PANE_WALLET};
use crate::units::{format_ether, format_units};

const PLACEHOLDER: &str = "_";

// ===============================
// Top-level draw
// ===============================
pub fn draw(f: &mut Frame, app: &mut App) {
    app.tick_spinner();

    let editing = app.input_mode() != InputMode::Normal;
    let show_debug = app.debug_visible() && !app.debug_log().is_empty();

    let mut constraints: Vec<Constraint> = Vec::with_capacity(5);
    constraints.push(Constraint::Length(1)); // header
    if editing {
        constraints.push(Constraint::Length(3)); // input box
    }
    constraints.push(Constraint::Min(0)); // body
    if show_debug {
        constraints.push(Constraint::Length(5));
    }
    constraints.push(Constraint::Length(2)); // footer

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());

    let mut idx = 0usize;
    header(f, chunks[idx], app);
    idx += 1;
    if editing {
        input_bar(f, chunks[idx], app);
        idx += 1;
    }
    body(f, chunks[idx], app);
    idx += 1;
    if show_debug {
        debug_panel(f, chunks[idx], app);
        idx += 1;
    }
    footer(f, chunks[idx], app);
}

// ===============================
// Header / input
// ===============================
fn header(f: &mut Frame, area: Rect, app: &App) {
    let p = app.palette();
    let s = app.state();
    let loading = s.loading();

    let mut spans = vec![
        Span::styled(
            " ethx ",
            Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("│ {} ", app.network()), Style::default().fg(p.text_dim)),
    ];

    match s.chain_head() {
        Some(head) => spans.push(Span::raw(format!("│ head #{head} "))),
        None if loading.head => spans.push(Span::raw(format!("│ head {} ", app.spinner_char()))),
        None => spans.push(Span::styled("│ head unavailable ", Style::default().fg(p.error))),
    }

    if let Some(number) = s.block_number() {
        spans.push(Span::styled(
            format!("│ Block Number: {number} "),
            Style::default().fg(p.text).add_modifier(Modifier::BOLD),
        ));
    }
    if let Some(block) = s.block() {
        spans.push(Span::styled(
            format!("· {} ", shorten(&block.hash, 8)),
            Style::default().fg(p.hash),
        ));
        spans.push(Span::styled(
            format!("· {} ", block_time(block.timestamp)),
            Style::default().fg(p.text_dim),
        ));
    }
    if loading.block {
        spans.push(Span::styled(
            format!("{} loading", app.spinner_char()),
            Style::default().fg(p.accent),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn input_bar(f: &mut Frame, area: Rect, app: &App) {
    let p = app.palette();
    let (title, hint) = match app.input_mode() {
        InputMode::Block => (" Block Number ", "decimal or 0x hex, Enter to load, Esc to cancel"),
        InputMode::Wallet => (" Wallet Address ", "0x… address, Enter to inspect, Esc to cancel"),
        InputMode::Normal => return,
    };
    let text = if app.input().is_empty() {
        Line::from(Span::styled(hint, Style::default().fg(p.text_dim)))
    } else {
        Line::from(Span::styled(app.input(), Style::default().fg(p.accent)))
    };

    let paragraph = Paragraph::new(text).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(p.accent)),
    );
    f.render_widget(paragraph, area);

    if area.width > 2 {
        let width = app.input().chars().count().min(area.width.saturating_sub(3) as usize) as u16;
        f.set_cursor_position((area.x + 1 + width, area.y + 1));
    }
}

// ===============================
// Body
// ===============================
fn body(f: &mut Frame, area: Rect, app: &App) {
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let warning = Paragraph::new(format!(
            "Terminal too small!\n\nMinimum size: {MIN_WIDTH}×{MIN_HEIGHT}\nCurrent size: {}×{}",
            area.width, area.height
        ))
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(app.palette().error)
                .add_modifier(Modifier::BOLD),
        );
        f.render_widget(warning, area);
        return;
    }

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(11), Constraint::Min(0)])
        .split(cols[1]);

    render_txs_pane(f, cols[0], app);
    render_details_pane(f, right[0], app);
    render_wallet_pane(f, right[1], app);
}

fn pane_block<'a>(app: &App, title: &'a str, pane: usize) -> Block<'a> {
    let p = app.palette();
    let focused = app.pane() == pane;
    Block::default()
        .title(if focused { format!(" [ {title} ] ") } else { format!(" {title} ") })
        .borders(Borders::ALL)
        .border_type(if focused { BorderType::Double } else { BorderType::Rounded })
        .border_style(
            Style::default()
                .fg(if focused { p.accent } else { p.border })
                .add_modifier(if focused { Modifier::BOLD } else { Modifier::empty() }),
        )
        .style(if focused {
            Style::default().bg(p.focused_bg)
        } else {
            Style::default()
        })
}

fn render_txs_pane(f: &mut Frame, area: Rect, app: &App) {
    let p = app.palette();
    let s = app.state();
    let pages = s.pagination();

    let title = format!("Transactions ({})", s.transactions().len());
    let block = pane_block(app, &title, PANE_TXS);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    if s.block().is_none() {
        let msg = if s.loading().head || s.loading().block {
            format!("{} Fetching latest block…", app.spinner_char())
        } else {
            "No block loaded. Press b to enter a block number.".to_string()
        };
        f.render_widget(
            Paragraph::new(msg).style(Style::default().fg(p.text_dim)),
            rows[0],
        );
        return;
    }

    let offset = pages.offset();
    let selected = s.selected_tx();
    let items: Vec<ListItem> = s
        .visible()
        .iter()
        .enumerate()
        .map(|(i, hash)| {
            let marker = if Some(hash.as_str()) == selected { "● " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(p.accent)),
                Span::styled(format!("{:>4} ", offset + i), Style::default().fg(p.text_dim)),
                Span::styled(hash.clone(), Style::default().fg(p.hash)),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    if !items.is_empty() {
        state.select(Some(app.sel_row()));
    }
    let list = List::new(items).highlight_style(
        Style::default()
            .bg(p.selection_bg)
            .fg(p.selection_fg)
            .add_modifier(Modifier::BOLD),
    );
    f.render_stateful_widget(list, rows[0], &mut state);

    let current = pages.current_page();
    let total = pages.total_pages();
    let enabled = Style::default().fg(p.accent);
    let disabled = Style::default().fg(p.text_dim);
    let nav = Line::from(vec![
        Span::styled("◀ Previous", if current > 1 { enabled } else { disabled }),
        Span::raw(format!("   page {current} / {total}   ")),
        Span::styled("Next ▶", if current < total { enabled } else { disabled }),
    ]);
    f.render_widget(Paragraph::new(nav).alignment(Alignment::Center), rows[1]);
}

fn render_details_pane(f: &mut Frame, area: Rect, app: &App) {
    let p = app.palette();
    let s = app.state();
    let loading = s.loading();
    let spin = app.spinner_char().to_string();
    let receipt = s.receipt();
    let tx = s.transaction();

    let field = |label: &'static str, value: Option<String>, busy: bool| -> Line<'static> {
        let value = value.unwrap_or_else(|| if busy { spin.clone() } else { PLACEHOLDER.to_string() });
        Line::from(vec![
            Span::styled(format!("{label:<15}"), Style::default().fg(p.text_dim)),
            Span::styled(value, Style::default().fg(p.text)),
        ])
    };

    let status_line = {
        let (text, color) = match receipt {
            Some(r) => (
                r.status_label().to_string(),
                match r.status {
                    Some(1) => p.ok,
                    Some(_) => p.error,
                    None => p.text_dim,
                },
            ),
            None if loading.receipt => (spin.clone(), p.text),
            None => (PLACEHOLDER.to_string(), p.text),
        };
        Line::from(vec![
            Span::styled(format!("{:<15}", "Status:"), Style::default().fg(p.text_dim)),
            Span::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ])
    };

    let symbol = app.network().native_symbol();
    let lines = vec![
        Line::from(Span::styled(
            s.selected_tx().unwrap_or("Select a transaction and press Enter").to_string(),
            Style::default().fg(p.hash),
        )),
        field(
            "To:",
            receipt.map(|r| {
                r.to.clone().or_else(|| {
                    r.contract_address
                        .as_ref()
                        .map(|c| format!("{c} (contract created)"))
                })
                .unwrap_or_else(|| PLACEHOLDER.to_string())
            }),
            loading.receipt,
        ),
        field("From:", receipt.map(|r| r.from.clone()), loading.receipt),
        field(
            "Confirmations:",
            receipt.map(|r| r.confirmations.to_string()),
            loading.receipt,
        ),
        status_line,
        field(
            "Value:",
            tx.map(|t| format!("{} {symbol}", format_ether(t.value))),
            loading.transaction,
        ),
        field(
            "Block:",
            tx.map(|t| t.block_number.map_or("pending".to_string(), |b| b.to_string())),
            loading.transaction,
        ),
        field("Nonce:", tx.map(|t| t.nonce.to_string()), loading.transaction),
        field(
            "Gas price:",
            tx.and_then(|t| t.gas_price)
                .map(|g| format!("{} gwei", format_units(g, 9))),
            loading.transaction,
        ),
    ];

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(pane_block(app, "Transaction Info", PANE_DETAILS));
    f.render_widget(paragraph, area);
}

fn render_wallet_pane(f: &mut Frame, area: Rect, app: &App) {
    let p = app.palette();
    let s = app.state();
    let loading = s.loading();
    let spin = app.spinner_char();

    let mut lines: Vec<Line> = Vec::new();
    match s.wallet() {
        None => {
            lines.push(Line::from(Span::styled(
                "Press w to look up a wallet address",
                Style::default().fg(p.text_dim),
            )));
        }
        Some(address) => {
            lines.push(Line::from(Span::styled(address.to_string(), Style::default().fg(p.hash))));
            lines.push(Line::raw(""));

            let symbol = app.network().native_symbol();
            let balance = match s.balance() {
                Some(wei) => format_ether(wei),
                None if loading.balance => spin.to_string(),
                None => PLACEHOLDER.to_string(),
            };
            lines.push(token_line(app, "Ether", symbol, balance));

            match s.tokens() {
                Some(tokens) if tokens.is_empty() => {
                    lines.push(Line::from(Span::styled(
                        "no ERC-20 tokens",
                        Style::default().fg(p.text_dim),
                    )));
                }
                Some(tokens) => {
                    for token in tokens.values() {
                        lines.push(token_line(
                            app,
                            &token.name,
                            &token.symbol,
                            token.formatted_balance(),
                        ));
                    }
                }
                None if loading.tokens => {
                    lines.push(Line::from(Span::styled(
                        format!("{spin} loading tokens…"),
                        Style::default().fg(p.text_dim),
                    )));
                }
                None => {
                    lines.push(Line::from(Span::styled(
                        "tokens unavailable (see log)",
                        Style::default().fg(p.error),
                    )));
                }
            }
        }
    }

    let count = s.tokens().map_or(0, |t| t.len());
    let title = format!("Wallet ({count} tokens)");
    let paragraph = Paragraph::new(lines)
        .scroll((app.wallet_scroll(), 0))
        .block(pane_block(app, &title, PANE_WALLET));
    f.render_widget(paragraph, area);
}

fn token_line(app: &App, name: &str, symbol: &str, balance: String) -> Line<'static> {
    let p = app.palette();
    Line::from(vec![
        Span::styled(format!("{:<24} ", truncate(name, 24)), Style::default().fg(p.text)),
        Span::styled(format!("{:<8} ", truncate(symbol, 8)), Style::default().fg(p.text_dim)),
        Span::styled(balance, Style::default().fg(p.amount)),
    ])
}

// ===============================
// Footer / debug
// ===============================
fn footer(f: &mut Frame, area: Rect, app: &App) {
    let p = app.palette();
    let key = Style::default().fg(p.accent);
    let mut spans: Vec<Span> = vec![
        Span::styled("Tab", key),
        Span::raw(" switch │ "),
        Span::styled("↑/↓", key),
        Span::raw(" move │ "),
        Span::styled("Enter", key),
        Span::raw(" inspect │ "),
        Span::styled("←/→", key),
        Span::raw(" page │ "),
        Span::styled("b", key),
        Span::raw(" block │ "),
        Span::styled("w", key),
        Span::raw(" wallet │ "),
        Span::styled("Ctrl+D", key),
        Span::raw(" debug │ "),
        Span::styled("q", key),
        Span::raw(" quit"),
    ];

    if app.debug_visible() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled("[DEBUG]", Style::default().fg(p.debug)));
    }
    if let Some((toast, is_error)) = app.toast_message() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            toast.to_string(),
            Style::default()
                .fg(if is_error { p.error } else { p.ok })
                .add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::raw(format!(" │ FPS {}", app.fps())));

    let w = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::TOP).border_type(BorderType::Plain));
    f.render_widget(w, area);
}

fn debug_panel(f: &mut Frame, area: Rect, app: &App) {
    let p = app.palette();
    let visible = area.height.saturating_sub(2) as usize;
    let log = app.debug_log();
    let start = log.len().saturating_sub(visible);
    let lines: Vec<Line> = log[start..]
        .iter()
        .map(|m| Line::from(Span::styled(m.clone(), Style::default().fg(p.debug))))
        .collect();

    let w = Paragraph::new(lines).block(
        Block::default()
            .title(" Debug ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(p.debug)),
    );
    f.render_widget(w, area);
}

// ===============================
// Helpers
// ===============================

/// `0x1234…abcd` style shortening, keeping `keep` characters on each side.
pub fn shorten(s: &str, keep: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= keep * 2 + 1 {
        return s.to_string();
    }
    let head: String = chars[..keep].iter().collect();
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("{head}…{tail}")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn block_time(unix_secs: u64) -> String {
    i64::try_from(unix_secs)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}
