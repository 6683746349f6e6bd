//! Explorer state and its single update function.
//!
//! Every external event (key commit, fetch completion) is an [`Action`].
//! [`update`] consumes the previous snapshot and returns the next one plus
//! the [`Effect`]s (fetches) the transition asks for. Derived state
//! (pagination and the visible page) is recomputed after every transition.
//!
//! Each fetch key (block, transaction, wallet) has a generation counter.
//! Issuing a fetch bumps it and tags the effect; a completion is applied only
//! while its tag is still current, so a slow superseded response can never
//! overwrite a newer one.

use anyhow::Result;
use primitive_types::U256;
use std::collections::BTreeMap;

use crate::pagination::Pagination;
use crate::types::{BlockTxs, TxDetail, TxReceipt, WalletToken};

/// Fetch tag handed out when a request is issued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(pub u64);

impl Generation {
    fn bump(&mut self) -> Generation {
        self.0 += 1;
        *self
    }
}

#[derive(Debug)]
pub enum Action {
    /// Session start; asks for the chain head once.
    Start,
    SetBlockNumber(u64),
    GoToPage(usize),
    NextPage,
    PrevPage,
    SelectTransaction(String),
    SetWallet(String),

    ChainHeadLoaded(Result<u64>),
    BlockLoaded {
        generation: Generation,
        result: Result<BlockTxs>,
    },
    ReceiptLoaded {
        generation: Generation,
        result: Result<TxReceipt>,
    },
    TransactionLoaded {
        generation: Generation,
        result: Result<TxDetail>,
    },
    BalanceLoaded {
        generation: Generation,
        result: Result<U256>,
    },
    TokensLoaded {
        generation: Generation,
        result: Result<Vec<WalletToken>>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    FetchChainHead,
    LoadBlock {
        number: u64,
        generation: Generation,
    },
    InspectTransaction {
        hash: String,
        generation: Generation,
    },
    InspectWallet {
        address: String,
        generation: Generation,
    },
}

/// In-flight requests, for spinners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Loading {
    pub head: bool,
    pub block: bool,
    pub receipt: bool,
    pub transaction: bool,
    pub balance: bool,
    pub tokens: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Generations {
    block: Generation,
    tx: Generation,
    wallet: Generation,
}

#[derive(Clone, Debug, Default)]
pub struct ExplorerState {
    head_requested: bool,
    chain_head: Option<u64>,

    block_number: Option<u64>,
    block: Option<BlockTxs>,
    transactions: Vec<String>,
    pagination: Pagination,
    visible: Vec<String>,

    selected_tx: Option<String>,
    receipt: Option<TxReceipt>,
    transaction: Option<TxDetail>,

    wallet: Option<String>,
    balance: Option<U256>,
    tokens: Option<BTreeMap<String, WalletToken>>,

    generations: Generations,
    loading: Loading,
}

impl ExplorerState {
    pub fn new(items_per_page: usize) -> Self {
        Self {
            pagination: Pagination::new(items_per_page),
            ..Self::default()
        }
    }

    pub fn chain_head(&self) -> Option<u64> {
        self.chain_head
    }
    pub fn block_number(&self) -> Option<u64> {
        self.block_number
    }
    /// Header of the block whose hashes are listed (may lag `block_number`
    /// while a load is in flight).
    pub fn block(&self) -> Option<&BlockTxs> {
        self.block.as_ref()
    }
    pub fn transactions(&self) -> &[String] {
        &self.transactions
    }
    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }
    pub fn visible(&self) -> &[String] {
        &self.visible
    }
    pub fn selected_tx(&self) -> Option<&str> {
        self.selected_tx.as_deref()
    }
    pub fn receipt(&self) -> Option<&TxReceipt> {
        self.receipt.as_ref()
    }
    pub fn transaction(&self) -> Option<&TxDetail> {
        self.transaction.as_ref()
    }
    pub fn wallet(&self) -> Option<&str> {
        self.wallet.as_deref()
    }
    pub fn balance(&self) -> Option<U256> {
        self.balance
    }
    pub fn tokens(&self) -> Option<&BTreeMap<String, WalletToken>> {
        self.tokens.as_ref()
    }
    pub fn loading(&self) -> Loading {
        self.loading
    }

    fn derive(&mut self) {
        self.pagination.resize(self.transactions.len());
        self.visible = self.pagination.slice(&self.transactions).to_vec();
    }

    fn load_block(&mut self, number: u64) -> Effect {
        self.block_number = Some(number);
        self.loading.block = true;
        Effect::LoadBlock {
            number,
            generation: self.generations.block.bump(),
        }
    }
}

/// Apply one action to `state`, returning the next snapshot and the fetches
/// it triggers.
pub fn update(mut state: ExplorerState, action: Action) -> (ExplorerState, Vec<Effect>) {
    let mut effects = Vec::new();

    match action {
        Action::Start => {
            if !state.head_requested {
                state.head_requested = true;
                state.loading.head = true;
                effects.push(Effect::FetchChainHead);
            }
        }

        Action::SetBlockNumber(number) => {
            effects.push(state.load_block(number));
        }

        Action::GoToPage(page) => {
            if !state.pagination.go_to_page(page) {
                log::debug!(
                    "page {page} out of range 1..={}, ignored",
                    state.pagination.total_pages()
                );
            }
        }
        Action::NextPage => {
            state.pagination.next();
        }
        Action::PrevPage => {
            state.pagination.prev();
        }

        Action::SelectTransaction(hash) => {
            if !hash.is_empty() {
                state.selected_tx = Some(hash.clone());
                state.receipt = None;
                state.transaction = None;
                state.loading.receipt = true;
                state.loading.transaction = true;
                effects.push(Effect::InspectTransaction {
                    hash,
                    generation: state.generations.tx.bump(),
                });
            }
        }

        Action::SetWallet(address) => {
            let address = address.trim().to_string();
            if !address.is_empty() {
                state.wallet = Some(address.clone());
                state.balance = None;
                state.tokens = None;
                state.loading.balance = true;
                state.loading.tokens = true;
                effects.push(Effect::InspectWallet {
                    address,
                    generation: state.generations.wallet.bump(),
                });
            }
        }

        Action::ChainHeadLoaded(result) => {
            state.loading.head = false;
            match result {
                Ok(head) => {
                    log::info!("chain head #{head}");
                    state.chain_head = Some(head);
                    // a block the user already committed wins over the head
                    if state.block_number.is_none() {
                        effects.push(state.load_block(head));
                    }
                }
                Err(e) => log::error!("chain head fetch failed: {e:#}"),
            }
        }

        Action::BlockLoaded { generation, result } => {
            if generation != state.generations.block {
                log::debug!("dropping stale block result {generation:?}");
            } else {
                state.loading.block = false;
                match result {
                    Ok(block) => {
                        log::info!(
                            "block #{} loaded with {} txs",
                            block.number,
                            block.transactions.len()
                        );
                        state.transactions = block.transactions.clone();
                        state.pagination.reset(state.transactions.len());
                        state.block = Some(block);
                    }
                    Err(e) => log::warn!("block fetch failed: {e:#}"),
                }
            }
        }

        Action::ReceiptLoaded { generation, result } => {
            if generation != state.generations.tx {
                log::debug!("dropping stale receipt {generation:?}");
            } else {
                state.loading.receipt = false;
                match result {
                    Ok(receipt) => state.receipt = Some(receipt),
                    Err(e) => log::warn!("receipt fetch failed: {e:#}"),
                }
            }
        }

        Action::TransactionLoaded { generation, result } => {
            if generation != state.generations.tx {
                log::debug!("dropping stale transaction {generation:?}");
            } else {
                state.loading.transaction = false;
                match result {
                    Ok(tx) => state.transaction = Some(tx),
                    Err(e) => log::warn!("transaction fetch failed: {e:#}"),
                }
            }
        }

        Action::BalanceLoaded { generation, result } => {
            if generation != state.generations.wallet {
                log::debug!("dropping stale balance {generation:?}");
            } else {
                state.loading.balance = false;
                match result {
                    Ok(wei) => state.balance = Some(wei),
                    Err(e) => log::warn!("balance fetch failed: {e:#}"),
                }
            }
        }

        Action::TokensLoaded { generation, result } => {
            if generation != state.generations.wallet {
                log::debug!("dropping stale token list {generation:?}");
            } else {
                state.loading.tokens = false;
                match result {
                    Ok(tokens) => {
                        let map = tokens
                            .into_iter()
                            .map(|t| (t.contract_address.to_lowercase(), t))
                            .collect();
                        state.tokens = Some(map);
                    }
                    Err(e) => log::warn!("token fetch failed: {e:#}"),
                }
            }
        }
    }

    state.derive();
    (state, effects)
}

/// Owner of the current snapshot.
#[derive(Debug, Default)]
pub struct Store {
    state: ExplorerState,
}

impl Store {
    pub fn new(items_per_page: usize) -> Self {
        Self {
            state: ExplorerState::new(items_per_page),
        }
    }

    pub fn state(&self) -> &ExplorerState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        let prev = std::mem::take(&mut self.state);
        let (next, effects) = update(prev, action);
        self.state = next;
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn hashes(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("0x{i:064x}")).collect()
    }

    fn block(number: u64, n: usize) -> BlockTxs {
        BlockTxs {
            number,
            hash: format!("0xblock{number}"),
            timestamp: 1_700_000_000,
            transactions: hashes(n),
        }
    }

    fn receipt(hash: &str) -> TxReceipt {
        TxReceipt {
            hash: hash.to_string(),
            from: "0xfrom".into(),
            to: Some("0xto".into()),
            block_number: 1,
            confirmations: 3,
            status: Some(1),
            contract_address: None,
        }
    }

    fn token(contract: &str, balance: u64) -> WalletToken {
        WalletToken {
            contract_address: contract.to_string(),
            name: contract.to_uppercase(),
            symbol: "TKN".into(),
            logo: None,
            decimals: 18,
            balance: U256::from(balance),
        }
    }

    fn load_block(store: &mut Store, number: u64, n: usize) -> Generation {
        let effects = store.dispatch(Action::SetBlockNumber(number));
        let generation = match effects.as_slice() {
            [Effect::LoadBlock { generation, .. }] => *generation,
            other => panic!("unexpected effects {other:?}"),
        };
        store.dispatch(Action::BlockLoaded {
            generation,
            result: Ok(block(number, n)),
        });
        generation
    }

    #[test]
    fn start_requests_the_head_once() {
        let mut store = Store::new(15);
        assert_eq!(store.dispatch(Action::Start), vec![Effect::FetchChainHead]);
        assert!(store.dispatch(Action::Start).is_empty());
        assert!(store.state().loading().head);
    }

    #[test]
    fn chain_head_triggers_the_block_loader() {
        let mut store = Store::new(15);
        store.dispatch(Action::Start);
        let effects = store.dispatch(Action::ChainHeadLoaded(Ok(18_000_000)));
        assert_eq!(
            effects,
            vec![Effect::LoadBlock {
                number: 18_000_000,
                generation: Generation(1)
            }]
        );
        assert_eq!(store.state().block_number(), Some(18_000_000));
        assert_eq!(store.state().chain_head(), Some(18_000_000));
    }

    #[test]
    fn chain_head_failure_leaves_the_sentinel() {
        let mut store = Store::new(15);
        store.dispatch(Action::Start);
        let effects = store.dispatch(Action::ChainHeadLoaded(Err(anyhow!("offline"))));
        assert!(effects.is_empty());
        assert_eq!(store.state().block_number(), None);
        assert!(!store.state().loading().head);
    }

    #[test]
    fn user_block_is_not_overridden_by_a_late_head() {
        let mut store = Store::new(15);
        store.dispatch(Action::Start);
        store.dispatch(Action::SetBlockNumber(100));
        let effects = store.dispatch(Action::ChainHeadLoaded(Ok(200)));
        assert!(effects.is_empty());
        assert_eq!(store.state().block_number(), Some(100));
        assert_eq!(store.state().chain_head(), Some(200));
    }

    #[test]
    fn loaded_block_is_paged() {
        let mut store = Store::new(15);
        load_block(&mut store, 18_000_000, 47);
        let s = store.state();
        assert_eq!(s.transactions().len(), 47);
        assert_eq!(s.pagination().total_pages(), 4);
        assert_eq!(s.visible(), &s.transactions()[0..15]);

        store.dispatch(Action::GoToPage(4));
        let s = store.state();
        assert_eq!(s.visible(), &s.transactions()[45..47]);
    }

    #[test]
    fn out_of_range_page_is_a_no_op() {
        let mut store = Store::new(15);
        load_block(&mut store, 1, 47);
        store.dispatch(Action::GoToPage(2));
        let before = store.state().visible().to_vec();

        store.dispatch(Action::GoToPage(0));
        store.dispatch(Action::GoToPage(5));
        assert_eq!(store.state().pagination().current_page(), 2);
        assert_eq!(store.state().visible(), before.as_slice());
    }

    #[test]
    fn new_block_starts_on_page_one() {
        let mut store = Store::new(15);
        load_block(&mut store, 1, 47);
        store.dispatch(Action::GoToPage(4));
        load_block(&mut store, 2, 20);
        assert_eq!(store.state().pagination().current_page(), 1);
        assert_eq!(store.state().pagination().total_pages(), 2);
    }

    #[test]
    fn failed_block_keeps_the_previous_list() {
        let mut store = Store::new(15);
        load_block(&mut store, 1, 10);
        let effects = store.dispatch(Action::SetBlockNumber(2));
        let generation = match &effects[0] {
            Effect::LoadBlock { generation, .. } => *generation,
            other => panic!("unexpected {other:?}"),
        };
        store.dispatch(Action::BlockLoaded {
            generation,
            result: Err(anyhow!("rpc -32000 header not found")),
        });
        assert_eq!(store.state().transactions().len(), 10);
        assert_eq!(store.state().block_number(), Some(2));
        assert!(!store.state().loading().block);
    }

    #[test]
    fn superseded_block_result_is_dropped() {
        let mut store = Store::new(15);
        let first = match store.dispatch(Action::SetBlockNumber(1)).remove(0) {
            Effect::LoadBlock { generation, .. } => generation,
            other => panic!("unexpected {other:?}"),
        };
        let second = match store.dispatch(Action::SetBlockNumber(2)).remove(0) {
            Effect::LoadBlock { generation, .. } => generation,
            other => panic!("unexpected {other:?}"),
        };
        assert!(second > first);

        store.dispatch(Action::BlockLoaded {
            generation: second,
            result: Ok(block(2, 3)),
        });
        // slower, older response arrives last
        store.dispatch(Action::BlockLoaded {
            generation: first,
            result: Ok(block(1, 30)),
        });
        assert_eq!(store.state().block().map(|b| b.number), Some(2));
        assert_eq!(store.state().transactions().len(), 3);
    }

    #[test]
    fn selection_fills_both_slots_independently() {
        let mut store = Store::new(15);
        let effects = store.dispatch(Action::SelectTransaction("0xaa".into()));
        let generation = match effects.as_slice() {
            [Effect::InspectTransaction { hash, generation }] => {
                assert_eq!(hash, "0xaa");
                *generation
            }
            other => panic!("unexpected {other:?}"),
        };

        store.dispatch(Action::TransactionLoaded {
            generation,
            result: Err(anyhow!("timeout")),
        });
        store.dispatch(Action::ReceiptLoaded {
            generation,
            result: Ok(receipt("0xaa")),
        });
        let s = store.state();
        assert_eq!(s.selected_tx(), Some("0xaa"));
        assert_eq!(s.receipt().map(|r| r.hash.as_str()), Some("0xaa"));
        assert!(s.transaction().is_none());
        assert!(!s.loading().receipt && !s.loading().transaction);
    }

    #[test]
    fn late_result_for_an_earlier_selection_is_ignored() {
        let mut store = Store::new(15);
        store.dispatch(Action::SelectTransaction("0xaa".into()));
        store.dispatch(Action::SelectTransaction("0xbb".into()));

        store.dispatch(Action::ReceiptLoaded {
            generation: Generation(2),
            result: Ok(receipt("0xbb")),
        });
        store.dispatch(Action::ReceiptLoaded {
            generation: Generation(1),
            result: Ok(receipt("0xaa")),
        });
        let s = store.state();
        assert_eq!(s.selected_tx(), Some("0xbb"));
        assert_eq!(s.receipt().map(|r| r.hash.as_str()), Some("0xbb"));
    }

    #[test]
    fn empty_selection_and_wallet_are_ignored() {
        let mut store = Store::new(15);
        assert!(store.dispatch(Action::SelectTransaction(String::new())).is_empty());
        assert!(store.dispatch(Action::SetWallet("   ".into())).is_empty());
        assert!(store.state().wallet().is_none());
    }

    #[test]
    fn wallet_tokens_are_keyed_by_contract() {
        let mut store = Store::new(15);
        let effects = store.dispatch(Action::SetWallet("0xWALLET".into()));
        let generation = match effects.as_slice() {
            [Effect::InspectWallet { generation, .. }] => *generation,
            other => panic!("unexpected {other:?}"),
        };
        store.dispatch(Action::TokensLoaded {
            generation,
            result: Ok(vec![token("0xBB", 2), token("0xaa", 1)]),
        });
        store.dispatch(Action::BalanceLoaded {
            generation,
            result: Ok(U256::from(5u64)),
        });

        let s = store.state();
        let tokens = s.tokens().unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens["0xbb"].balance, U256::from(2u64));
        assert_eq!(tokens["0xaa"].balance, U256::from(1u64));
        assert_eq!(s.balance(), Some(U256::from(5u64)));
    }

    #[test]
    fn new_wallet_clears_previous_results() {
        let mut store = Store::new(15);
        store.dispatch(Action::SetWallet("0x1".into()));
        store.dispatch(Action::BalanceLoaded {
            generation: Generation(1),
            result: Ok(U256::from(7u64)),
        });
        store.dispatch(Action::SetWallet("0x2".into()));
        assert_eq!(store.state().balance(), None);

        // the first wallet's token list arrives after the switch
        store.dispatch(Action::TokensLoaded {
            generation: Generation(1),
            result: Ok(vec![token("0xaa", 1)]),
        });
        assert!(store.state().tokens().is_none());
        assert!(store.state().loading().tokens);
    }
}
