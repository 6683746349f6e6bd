use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

use crate::config::Network;
use crate::store::{Action, Effect, ExplorerState, Store};
use crate::theme::{Palette, Theme};
use crate::types::AppEvent;
use crate::units::{is_address, parse_block_input};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Block,
    Wallet,
}

pub const PANE_TXS: usize = 0;
pub const PANE_DETAILS: usize = 1;
pub const PANE_WALLET: usize = 2;
const PANE_COUNT: usize = 3;

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

struct Toast {
    message: String,
    is_error: bool,
    at: Instant,
}

pub struct App {
    quit: bool,
    pane: usize, // 0 txs, 1 tx details, 2 wallet
    store: Store,
    sel_row: usize, // row within the visible page
    wallet_scroll: u16,

    input_mode: InputMode,
    input: String,

    fps: u32,
    network: Network,
    palette: Palette,

    // Channel to the fetcher task; None in headless use
    effects_tx: Option<UnboundedSender<Effect>>,

    debug_log: Vec<String>,
    debug_visible: bool,
    toast: Option<Toast>,
    spinner_idx: usize,
}

impl App {
    pub fn new(
        items_per_page: usize,
        fps: u32,
        network: Network,
        theme: Theme,
        effects_tx: Option<UnboundedSender<Effect>>,
    ) -> Self {
        Self {
            quit: false,
            pane: PANE_TXS,
            store: Store::new(items_per_page),
            sel_row: 0,
            wallet_scroll: 0,
            input_mode: InputMode::Normal,
            input: String::new(),
            fps,
            network,
            palette: theme.palette(),
            effects_tx,
            debug_log: Vec::new(),
            debug_visible: false,
            toast: None,
            spinner_idx: 0,
        }
    }

    // ----- getters -----
    pub fn fps(&self) -> u32 {
        self.fps
    }
    pub fn quit_flag(&self) -> bool {
        self.quit
    }
    pub fn pane(&self) -> usize {
        self.pane
    }
    pub fn state(&self) -> &ExplorerState {
        self.store.state()
    }
    pub fn sel_row(&self) -> usize {
        self.sel_row
    }
    pub fn wallet_scroll(&self) -> u16 {
        self.wallet_scroll
    }
    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }
    pub fn input(&self) -> &str {
        &self.input
    }
    pub fn network(&self) -> Network {
        self.network
    }
    pub fn palette(&self) -> &Palette {
        &self.palette
    }
    pub fn debug_log(&self) -> &[String] {
        &self.debug_log
    }
    pub fn debug_visible(&self) -> bool {
        self.debug_visible
    }

    /// Hash under the cursor on the current page.
    pub fn highlighted_tx(&self) -> Option<&str> {
        self.state().visible().get(self.sel_row).map(String::as_str)
    }

    // ----- store plumbing -----
    pub fn start(&mut self) {
        self.dispatch(Action::Start);
    }

    pub fn on_event(&mut self, ev: AppEvent) {
        match ev {
            AppEvent::Fetched(action) => self.dispatch(action),
            AppEvent::Quit => self.quit = true,
        }
    }

    /// Apply an action and hand the resulting fetches to the fetcher.
    pub fn dispatch(&mut self, action: Action) {
        let before = self.page_identity();
        let effects = self.store.dispatch(action);

        if self.page_identity() != before {
            self.sel_row = 0;
        }
        let rows = self.state().visible().len();
        if self.sel_row >= rows {
            self.sel_row = rows.saturating_sub(1);
        }

        for effect in effects {
            self.log_debug(format!("-> {effect:?}"));
            match &self.effects_tx {
                Some(tx) => {
                    if tx.send(effect).is_err() {
                        log::error!("fetcher channel closed");
                    }
                }
                None => log::debug!("no fetcher attached, effect dropped"),
            }
        }
    }

    fn page_identity(&self) -> (usize, Option<String>) {
        let s = self.state();
        (
            s.pagination().current_page(),
            s.block().map(|b| b.hash.clone()),
        )
    }

    // ----- toasts / debug -----
    pub fn show_toast(&mut self, message: String) {
        self.toast = Some(Toast {
            message,
            is_error: false,
            at: Instant::now(),
        });
    }

    pub fn show_error(&mut self, message: String) {
        log::warn!("{message}");
        self.toast = Some(Toast {
            message,
            is_error: true,
            at: Instant::now(),
        });
    }

    /// Current toast if still active (visible for 3 seconds), with its error flag.
    pub fn toast_message(&self) -> Option<(&str, bool)> {
        const TOAST_DURATION: Duration = Duration::from_secs(3);
        self.toast
            .as_ref()
            .filter(|t| t.at.elapsed() < TOAST_DURATION)
            .map(|t| (t.message.as_str(), t.is_error))
    }

    pub fn log_debug(&mut self, msg: String) {
        const MAX_LOG_ENTRIES: usize = 50;
        log::debug!("{msg}");
        self.debug_log.push(msg);
        if self.debug_log.len() > MAX_LOG_ENTRIES {
            self.debug_log.remove(0);
        }
    }

    pub fn toggle_debug_panel(&mut self) {
        self.debug_visible = !self.debug_visible;
    }

    pub fn tick_spinner(&mut self) {
        self.spinner_idx = (self.spinner_idx + 1) % SPINNER.len();
    }

    pub fn spinner_char(&self) -> char {
        SPINNER[self.spinner_idx]
    }

    // ----- focus / navigation -----
    pub fn next_pane(&mut self) {
        self.pane = (self.pane + 1) % PANE_COUNT;
    }

    pub fn prev_pane(&mut self) {
        self.pane = (self.pane + PANE_COUNT - 1) % PANE_COUNT;
    }

    pub fn set_pane(&mut self, pane: usize) {
        if pane < PANE_COUNT {
            self.pane = pane;
        }
    }

    pub fn up(&mut self) {
        match self.pane {
            PANE_TXS => self.sel_row = self.sel_row.saturating_sub(1),
            PANE_WALLET => self.wallet_scroll = self.wallet_scroll.saturating_sub(1),
            _ => {}
        }
    }

    pub fn down(&mut self) {
        match self.pane {
            PANE_TXS => {
                if self.sel_row + 1 < self.state().visible().len() {
                    self.sel_row += 1;
                }
            }
            PANE_WALLET => {
                let rows = self.state().tokens().map_or(0, |t| t.len()) as u16;
                if self.wallet_scroll < rows {
                    self.wallet_scroll += 1;
                }
            }
            _ => {}
        }
    }

    pub fn prev_page(&mut self) {
        self.dispatch(Action::PrevPage);
    }

    pub fn next_page(&mut self) {
        self.dispatch(Action::NextPage);
    }

    pub fn first_page(&mut self) {
        self.dispatch(Action::GoToPage(1));
    }

    pub fn last_page(&mut self) {
        let last = self.state().pagination().total_pages();
        self.dispatch(Action::GoToPage(last));
    }

    /// Inspect the highlighted transaction.
    pub fn select_tx(&mut self) {
        if self.pane != PANE_TXS {
            return;
        }
        if let Some(hash) = self.highlighted_tx().map(str::to_string) {
            self.log_debug(format!("select tx {hash}"));
            self.dispatch(Action::SelectTransaction(hash));
        }
    }

    /// Highlight row `idx` of the current page (clamped).
    pub fn select_tx_row(&mut self, idx: usize) {
        let rows = self.state().visible().len();
        if rows > 0 {
            self.sel_row = idx.min(rows - 1);
        }
    }

    // ----- text input -----
    pub fn start_block_input(&mut self) {
        self.input_mode = InputMode::Block;
        self.input.clear();
    }

    pub fn start_wallet_input(&mut self) {
        self.input_mode = InputMode::Wallet;
        self.input.clear();
    }

    pub fn input_add_char(&mut self, ch: char) {
        if !ch.is_whitespace() {
            self.input.push(ch);
        }
    }

    pub fn input_backspace(&mut self) {
        self.input.pop();
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input.clear();
    }

    /// Enter in an input box. Invalid input keeps the box open and shows why.
    pub fn commit_input(&mut self) {
        let text = self.input.trim().to_string();
        match self.input_mode {
            InputMode::Normal => {}
            InputMode::Block => match parse_block_input(&text) {
                Ok(number) => {
                    self.cancel_input();
                    self.set_pane(PANE_TXS);
                    self.show_toast(format!("Loading block #{number}"));
                    self.dispatch(Action::SetBlockNumber(number));
                }
                Err(e) => self.show_error(format!("{e}")),
            },
            InputMode::Wallet => {
                if is_address(&text) {
                    self.cancel_input();
                    self.set_pane(PANE_WALLET);
                    self.wallet_scroll = 0;
                    self.show_toast("Loading wallet".to_string());
                    self.dispatch(Action::SetWallet(text));
                } else {
                    self.show_error(format!("'{text}' is not a 0x-prefixed 20-byte address"));
                }
            }
        }
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Generation;
    use crate::types::BlockTxs;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn app() -> (App, UnboundedReceiver<Effect>) {
        let (tx, rx) = unbounded_channel();
        let app = App::new(15, 30, Network::EthMainnet, Theme::Default, Some(tx));
        (app, rx)
    }

    fn loaded(app: &mut App, number: u64, generation: u64, n: usize) {
        app.on_event(AppEvent::Fetched(Action::BlockLoaded {
            generation: Generation(generation),
            result: Ok(BlockTxs {
                number,
                hash: format!("0x{number:x}"),
                timestamp: 0,
                transactions: (0..n).map(|i| format!("0xtx{i}")).collect(),
            }),
        }));
    }

    #[test]
    fn start_sends_the_head_fetch() {
        let (mut app, mut rx) = app();
        app.start();
        assert_eq!(rx.try_recv().unwrap(), Effect::FetchChainHead);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn block_input_commits_on_valid_number() {
        let (mut app, mut rx) = app();
        app.start_block_input();
        for c in "17000000".chars() {
            app.input_add_char(c);
        }
        app.commit_input();
        assert_eq!(app.input_mode(), InputMode::Normal);
        assert_eq!(
            rx.try_recv().unwrap(),
            Effect::LoadBlock {
                number: 17_000_000,
                generation: Generation(1)
            }
        );
    }

    #[test]
    fn invalid_inputs_are_reported_not_sent() {
        let (mut app, mut rx) = app();
        app.start_block_input();
        app.input_add_char('x');
        app.commit_input();
        assert_eq!(app.input_mode(), InputMode::Block);
        assert!(matches!(app.toast_message(), Some((_, true))));

        app.start_wallet_input();
        for c in "0x1234".chars() {
            app.input_add_char(c);
        }
        app.commit_input();
        assert_eq!(app.input_mode(), InputMode::Wallet);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn selecting_a_row_inspects_that_hash() {
        let (mut app, mut rx) = app();
        app.dispatch(Action::SetBlockNumber(18_000_000));
        let _ = rx.try_recv();
        loaded(&mut app, 18_000_000, 1, 47);

        for _ in 0..5 {
            app.down();
        }
        app.select_tx();
        assert_eq!(app.state().selected_tx(), Some("0xtx5"));
        assert_eq!(
            rx.try_recv().unwrap(),
            Effect::InspectTransaction {
                hash: "0xtx5".into(),
                generation: Generation(1)
            }
        );
    }

    #[test]
    fn paging_resets_the_cursor() {
        let (mut app, _rx) = app();
        app.dispatch(Action::SetBlockNumber(1));
        loaded(&mut app, 1, 1, 47);
        app.select_tx_row(10);
        app.next_page();
        assert_eq!(app.state().pagination().current_page(), 2);
        assert_eq!(app.sel_row(), 0);

        app.last_page();
        app.select_tx_row(99);
        assert_eq!(app.sel_row(), 1);
        app.next_page();
        assert_eq!(app.state().pagination().current_page(), 4);
        assert_eq!(app.highlighted_tx(), Some("0xtx46"));
    }

    #[test]
    fn pane_cycle_wraps() {
        let (mut app, _rx) = app();
        app.prev_pane();
        assert_eq!(app.pane(), PANE_WALLET);
        app.next_pane();
        assert_eq!(app.pane(), PANE_TXS);
    }
}
