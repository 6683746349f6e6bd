use crate::{
    api::ChainApi,
    config::Config,
    net::send_with_backoff,
    types::{BlockTxs, TokenBalance, TokenMetadata, TxDetail, TxReceipt},
    units::{parse_hex_u256, parse_hex_u64, to_hex_quantity},
};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use primitive_types::U256;
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, OnceLock,
};
use std::time::Duration;

static HTTP: OnceLock<reqwest::Client> = OnceLock::new();

fn http_client() -> &'static reqwest::Client {
    HTTP.get_or_init(|| {
        reqwest::Client::builder()
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("falling back to default http client: {e}");
                reqwest::Client::new()
            })
    })
}

/// JSON-RPC 2.0 client for an Alchemy-compatible endpoint.
#[derive(Clone, Debug)]
pub struct RpcClient {
    url: String,
    timeout_ms: u64,
    retries: u8,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, timeout_ms: u64, retries: u8) -> Self {
        Self {
            url: url.into(),
            timeout_ms,
            retries,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.rpc_url.clone(), cfg.rpc_timeout_ms, cfg.rpc_retries)
    }

    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
        log::debug!("rpc -> {method} id={id}");

        let rb = http_client()
            .post(&self.url)
            .json(&body)
            .timeout(Duration::from_millis(self.timeout_ms));
        let res = send_with_backoff(rb, method, self.retries).await?;

        if !res.status().is_success() {
            bail!("http {} for {method}", res.status());
        }
        let v: Value = res
            .json()
            .await
            .map_err(|e| anyhow!("{method}: invalid response body: {}", e.without_url()))?;
        unwrap_rpc_result(v).with_context(|| format!("{method} failed"))
    }
}

/// Extract `result` from a JSON-RPC envelope, turning `error` into `Err`.
pub fn unwrap_rpc_result(mut v: Value) -> Result<Value> {
    if let Some(err) = v.get("error") {
        let code = err.get("code").and_then(|c| c.as_i64()).unwrap_or_default();
        let msg = err
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("rpc error");
        bail!("rpc {code} {msg}");
    }
    match v.get_mut("result") {
        Some(r) => Ok(r.take()),
        None => Err(anyhow!("invalid rpc payload (no result)")),
    }
}

fn str_field<'a>(v: &'a Value, key: &str) -> Result<&'a str> {
    v.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("missing field '{key}'"))
}

fn opt_str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(Value::as_str).map(str::to_string)
}

fn hex_u64_field(v: &Value, key: &str) -> Result<u64> {
    parse_hex_u64(str_field(v, key)?).with_context(|| format!("field '{key}'"))
}

pub fn parse_block(v: &Value) -> Result<BlockTxs> {
    if v.is_null() {
        bail!("block not found");
    }
    let transactions = v
        .get("transactions")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("missing field 'transactions'"))?
        .iter()
        // hashes only, or full objects when the block was requested with details
        .filter_map(|t| t.as_str().or_else(|| t.get("hash").and_then(Value::as_str)))
        .map(str::to_string)
        .collect();

    Ok(BlockTxs {
        number: hex_u64_field(v, "number")?,
        hash: str_field(v, "hash")?.to_string(),
        timestamp: hex_u64_field(v, "timestamp")?,
        transactions,
    })
}

pub fn parse_receipt(v: &Value, head: u64) -> Result<TxReceipt> {
    if v.is_null() {
        bail!("receipt not available (unknown or pending transaction)");
    }
    let block_number = hex_u64_field(v, "blockNumber")?;
    let status = match v.get("status").and_then(Value::as_str) {
        Some(s) => Some(u8::try_from(parse_hex_u64(s)?).context("field 'status'")?),
        None => None,
    };

    Ok(TxReceipt {
        hash: str_field(v, "transactionHash")?.to_string(),
        from: str_field(v, "from")?.to_string(),
        to: opt_str_field(v, "to"),
        block_number,
        confirmations: head.saturating_sub(block_number) + 1,
        status,
        contract_address: opt_str_field(v, "contractAddress"),
    })
}

pub fn parse_transaction(v: &Value) -> Result<TxDetail> {
    if v.is_null() {
        bail!("transaction not found");
    }
    let block_number = match v.get("blockNumber").and_then(Value::as_str) {
        Some(s) => Some(parse_hex_u64(s)?),
        None => None,
    };
    let gas_price = match v.get("gasPrice").and_then(Value::as_str) {
        Some(s) => Some(parse_hex_u256(s)?),
        None => None,
    };

    Ok(TxDetail {
        hash: str_field(v, "hash")?.to_string(),
        from: str_field(v, "from")?.to_string(),
        to: opt_str_field(v, "to"),
        value: parse_hex_u256(str_field(v, "value")?)?,
        nonce: hex_u64_field(v, "nonce")?,
        block_number,
        gas_price,
    })
}

/// Parse one `alchemy_getTokenBalances` page: balances plus the next page key.
pub fn parse_token_balances(v: &Value) -> Result<(Vec<TokenBalance>, Option<String>)> {
    let entries = v
        .get("tokenBalances")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("missing field 'tokenBalances'"))?;

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let contract = str_field(entry, "contractAddress")?.to_lowercase();
        let balance = match entry.get("tokenBalance").and_then(Value::as_str) {
            Some(hex) => parse_hex_u256(hex)?,
            None => {
                log::debug!("token {contract}: no balance reported, reading as zero");
                U256::zero()
            }
        };
        out.push(TokenBalance {
            contract_address: contract,
            balance,
        });
    }
    Ok((out, opt_str_field(v, "pageKey")))
}

#[async_trait]
impl ChainApi for RpcClient {
    async fn block_number(&self) -> Result<u64> {
        let v = self.call("eth_blockNumber", json!([])).await?;
        parse_hex_u64(v.as_str().unwrap_or_default())
    }

    async fn block_transactions(&self, number: u64) -> Result<BlockTxs> {
        let v = self
            .call("eth_getBlockByNumber", json!([to_hex_quantity(number), false]))
            .await?;
        parse_block(&v).with_context(|| format!("block #{number}"))
    }

    async fn transaction_receipt(&self, hash: &str) -> Result<TxReceipt> {
        let (receipt, head) = futures::try_join!(
            self.call("eth_getTransactionReceipt", json!([hash])),
            self.block_number(),
        )?;
        parse_receipt(&receipt, head).with_context(|| format!("receipt {hash}"))
    }

    async fn transaction(&self, hash: &str) -> Result<TxDetail> {
        let v = self.call("eth_getTransactionByHash", json!([hash])).await?;
        parse_transaction(&v).with_context(|| format!("transaction {hash}"))
    }

    async fn balance(&self, address: &str, tag: &str) -> Result<U256> {
        let v = self
            .call("eth_getBalance", json!([address, tag]))
            .await?;
        parse_hex_u256(v.as_str().unwrap_or_default())
    }

    async fn token_balances(&self, address: &str) -> Result<Vec<TokenBalance>> {
        let mut all = Vec::new();
        let mut page_key: Option<String> = None;
        loop {
            let params = match &page_key {
                Some(key) => json!([address, "erc20", {"pageKey": key}]),
                None => json!([address, "erc20"]),
            };
            let v = self.call("alchemy_getTokenBalances", params).await?;
            let (mut page, next) = parse_token_balances(&v)?;
            all.append(&mut page);
            match next {
                Some(key) if !key.is_empty() => page_key = Some(key),
                _ => break,
            }
        }
        Ok(all)
    }

    async fn token_metadata(&self, contract: &str) -> Result<TokenMetadata> {
        let v = self
            .call("alchemy_getTokenMetadata", json!([contract]))
            .await?;
        serde_json::from_value(v).with_context(|| format!("token metadata {contract}"))
    }
}
