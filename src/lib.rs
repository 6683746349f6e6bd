//! ethx - Ethereum terminal block explorer
//!
//! Browses the transactions of a block page by page, inspects a selected
//! transaction's receipt and shows a wallet's native and ERC-20 balances,
//! all through an Alchemy (or any Ethereum JSON-RPC) endpoint.
//!
//! ## Architecture
//!
//! - [`store`]: pure reducer over [`store::ExplorerState`]; actions in,
//!   effects out. Every request is tagged with a generation so only the
//!   most recently issued one can land.
//! - [`fetch`]: executes effects against a [`api::ChainApi`] on tokio tasks.
//! - [`rpc_utils`]: the JSON-RPC implementation of `ChainApi`.
//! - [`app`] / [`ui`]: terminal state and ratatui drawing (native feature
//!   adds the crossterm backend and the `ethx` binary).
//!
//! ```bash
//! ALCHEMY_API_KEY=... cargo run --release
//! ```

// Data model and conversions
pub mod pagination;
pub mod types;
pub mod units;

// Configuration and theming
pub mod config;
pub mod theme;

// Chain access
pub mod api;
pub mod net;
pub mod rpc_utils;

// State and side effects
pub mod fetch;
pub mod store;

// Terminal UI
pub mod app;
pub mod ui;

pub use app::{App, InputMode};
pub use config::Config;
pub use store::{Action, Effect, Store};
pub use types::AppEvent;
