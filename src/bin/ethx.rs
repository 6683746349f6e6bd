// Native binary for ethx - Terminal UI mode

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs::OpenOptions,
    io,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use ethx::{
    api::ChainApi,
    app::{App, InputMode},
    config::{load, Config},
    fetch::{run_fetcher, Fetcher},
    rpc_utils::RpcClient,
    store::Effect,
    types::AppEvent,
    ui,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (safe to ignore if not found)
    let _ = dotenvy::dotenv();

    let cfg = load().context("Failed to load configuration")?;
    init_logging(&cfg)?;
    cfg.log_summary();

    // channels
    let (tx, rx) = unbounded_channel::<AppEvent>();
    let (effects_tx, effects_rx) = unbounded_channel::<Effect>();

    let api: Arc<dyn ChainApi> = Arc::new(RpcClient::from_config(&cfg));
    let fetcher = Fetcher::new(api, tx.clone(), cfg.token_concurrency);
    let fetch_task = tokio::spawn(run_fetcher(fetcher, effects_rx));

    // Ctrl+C outside raw mode (e.g. before the first frame)
    let tx_signal = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx_signal.send(AppEvent::Quit);
        }
    });

    let mut app = App::new(
        cfg.items_per_page,
        cfg.render_fps,
        cfg.network,
        cfg.theme,
        Some(effects_tx),
    );
    app.start();

    // terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // main loop; restore the terminal whatever the outcome
    let result = run_loop(&mut app, &mut terminal, rx).await;

    // cleanup
    fetch_task.abort();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        log::error!("ui loop failed: {e:#}");
    }
    log::info!("ethx exiting");
    result
}

/// The terminal is in raw mode while the UI runs, so logs go to a file.
fn init_logging(cfg: &Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cfg.log_file)
        .with_context(|| format!("Failed to open log file {}", cfg.log_file))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

async fn run_loop(
    app: &mut App,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut rx: UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut last_frame = Instant::now();

    loop {
        // frame budget (coalesced renders)
        let frame_ms = 1000u32.saturating_div(app.fps().max(1)) as u64;
        let budget = Duration::from_millis(frame_ms.max(1));
        let wait = budget.saturating_sub(last_frame.elapsed());

        // input or fetch completions
        if event::poll(wait)? {
            if let Event::Key(k) = event::read()? {
                if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                    handle_key(app, k);
                }
            }
        }
        while let Ok(ev) = rx.try_recv() {
            app.on_event(ev);
        }

        if last_frame.elapsed() >= budget {
            terminal.draw(|f| ui::draw(f, app))?;
            last_frame = Instant::now();
        }
        if app.quit_flag() {
            break;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, k: KeyEvent) {
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (k.code, k.modifiers) {
        app.request_quit();
        return;
    }

    // Block / wallet input boxes
    if app.input_mode() != InputMode::Normal {
        match k.code {
            KeyCode::Char(c) => app.input_add_char(c),
            KeyCode::Backspace => app.input_backspace(),
            KeyCode::Enter => app.commit_input(),
            KeyCode::Esc => app.cancel_input(),
            _ => {}
        }
        return;
    }

    // Normal mode keys
    // Tab/Shift+Tab cycle panes (0=Txs, 1=Details, 2=Wallet); arrows act on the focused pane
    match (k.code, k.modifiers) {
        (KeyCode::Char('q'), _) => app.on_event(AppEvent::Quit),

        (KeyCode::Tab, _) => {
            app.log_debug(format!("KEY: Tab pressed, pane={}", app.pane()));
            app.next_pane();
        }
        (KeyCode::BackTab, _) => {
            app.log_debug(format!("KEY: BackTab pressed, pane={}", app.pane()));
            app.prev_pane();
        }

        (KeyCode::Up, _) => app.up(),
        (KeyCode::Down, _) => app.down(),
        (KeyCode::Left, _) | (KeyCode::PageUp, _) => app.prev_page(),
        (KeyCode::Right, _) | (KeyCode::PageDown, _) => app.next_page(),
        (KeyCode::Home, _) => app.first_page(),
        (KeyCode::End, _) => app.last_page(),
        (KeyCode::Enter, _) => app.select_tx(),

        (KeyCode::Char('b'), _) => app.start_block_input(),
        (KeyCode::Char('w'), _) => app.start_wallet_input(),
        (KeyCode::Char('d'), KeyModifiers::CONTROL) => app.toggle_debug_panel(),
        _ => {}
    }
}
