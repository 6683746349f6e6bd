//! The data-provider seam. Everything the explorer reads goes through
//! [`ChainApi`]; [`crate::rpc_utils::RpcClient`] is the production
//! implementation, tests plug in in-memory ones.

use anyhow::Result;
use async_trait::async_trait;
use primitive_types::U256;

use crate::types::{BlockTxs, TokenBalance, TokenMetadata, TxDetail, TxReceipt};

/// JSON-RPC block tag for "the current head".
pub const LATEST: &str = "latest";

#[async_trait]
pub trait ChainApi: Send + Sync {
    /// Current chain head.
    async fn block_number(&self) -> Result<u64>;

    /// Block header plus ordered transaction hashes.
    async fn block_transactions(&self, number: u64) -> Result<BlockTxs>;

    /// Receipt with a confirmation count relative to the current head.
    async fn transaction_receipt(&self, hash: &str) -> Result<TxReceipt>;

    async fn transaction(&self, hash: &str) -> Result<TxDetail>;

    /// Native balance in wei at `tag` (a block tag such as [`LATEST`] or a hex number).
    async fn balance(&self, address: &str, tag: &str) -> Result<U256>;

    /// ERC-20 balances held by `address`, in provider order.
    async fn token_balances(&self, address: &str) -> Result<Vec<TokenBalance>>;

    async fn token_metadata(&self, contract: &str) -> Result<TokenMetadata>;
}
