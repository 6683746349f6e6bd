use primitive_types::U256;
use serde::Deserialize;

/// Block header fields plus the ordered transaction hashes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockTxs {
    pub number: u64,
    pub hash: String,
    /// Unix seconds
    pub timestamp: u64,
    pub transactions: Vec<String>,
}

/// Receipt fields shown in the transaction pane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub hash: String,
    pub from: String,
    /// `None` for contract creation
    pub to: Option<String>,
    pub block_number: u64,
    pub confirmations: u64,
    /// 1 success, 0 reverted, `None` for pre-Byzantium receipts
    pub status: Option<u8>,
    pub contract_address: Option<String>,
}

impl TxReceipt {
    pub fn status_label(&self) -> &'static str {
        match self.status {
            Some(1) => "success",
            Some(0) => "reverted",
            _ => "unknown",
        }
    }
}

/// Full transaction object (subset).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxDetail {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    /// wei
    pub value: U256,
    pub nonce: u64,
    /// `None` while pending
    pub block_number: Option<u64>,
    pub gas_price: Option<U256>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenBalance {
    pub contract_address: String,
    /// Smallest token unit; provider errors for a token read as zero
    pub balance: U256,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TokenMetadata {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub logo: Option<String>,
    pub decimals: Option<u8>,
}

/// One row of the wallet token map: metadata merged with the held balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletToken {
    pub contract_address: String,
    pub name: String,
    pub symbol: String,
    pub logo: Option<String>,
    pub decimals: u8,
    pub balance: U256,
}

impl WalletToken {
    pub const DEFAULT_DECIMALS: u8 = 18;

    pub fn from_parts(balance: TokenBalance, meta: TokenMetadata) -> Self {
        Self {
            name: meta
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| balance.contract_address.clone()),
            symbol: meta.symbol.unwrap_or_default(),
            logo: meta.logo,
            decimals: meta.decimals.unwrap_or(Self::DEFAULT_DECIMALS),
            contract_address: balance.contract_address,
            balance: balance.balance,
        }
    }

    pub fn formatted_balance(&self) -> String {
        crate::units::format_units(self.balance, self.decimals)
    }
}

/// Completions flowing back from fetch tasks to the UI loop.
#[derive(Debug)]
pub enum AppEvent {
    Fetched(crate::store::Action),
    Quit,
}
