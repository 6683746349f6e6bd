//! Runs store effects against a [`ChainApi`] and reports completions as
//! [`AppEvent::Fetched`] actions.
//!
//! Each request runs in its own task so independent lookups (receipt vs
//! transaction, balance vs tokens) complete and report on their own.

use anyhow::{Context, Result};
use futures::{stream, StreamExt, TryStreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::api::{ChainApi, LATEST};
use crate::store::{Action, Effect, Generation};
use crate::types::{AppEvent, WalletToken};

pub const DEFAULT_TOKEN_CONCURRENCY: usize = 4;

pub async fn fetch_chain_head(api: &dyn ChainApi) -> Action {
    Action::ChainHeadLoaded(api.block_number().await.context("eth_blockNumber"))
}

pub async fn fetch_block(api: &dyn ChainApi, number: u64, generation: Generation) -> Action {
    Action::BlockLoaded {
        generation,
        result: api.block_transactions(number).await,
    }
}

pub async fn fetch_receipt(api: &dyn ChainApi, hash: &str, generation: Generation) -> Action {
    Action::ReceiptLoaded {
        generation,
        result: api.transaction_receipt(hash).await,
    }
}

pub async fn fetch_transaction(api: &dyn ChainApi, hash: &str, generation: Generation) -> Action {
    Action::TransactionLoaded {
        generation,
        result: api.transaction(hash).await,
    }
}

pub async fn fetch_balance(api: &dyn ChainApi, address: &str, generation: Generation) -> Action {
    Action::BalanceLoaded {
        generation,
        result: api
            .balance(address, LATEST)
            .await
            .with_context(|| format!("balance of {address}")),
    }
}

pub async fn fetch_wallet_tokens(
    api: &dyn ChainApi,
    address: &str,
    generation: Generation,
    concurrency: usize,
) -> Action {
    Action::TokensLoaded {
        generation,
        result: wallet_tokens(api, address, concurrency).await,
    }
}

/// List the ERC-20 balances of `address` and merge each with its metadata.
///
/// Metadata lookups run at most `concurrency` at a time and complete in any
/// order; callers key the result by contract address. One failed lookup
/// fails the whole list.
pub async fn wallet_tokens(
    api: &dyn ChainApi,
    address: &str,
    concurrency: usize,
) -> Result<Vec<WalletToken>> {
    let balances = api
        .token_balances(address)
        .await
        .with_context(|| format!("token balances of {address}"))?;
    log::info!("{address} holds {} tokens", balances.len());

    stream::iter(balances.into_iter().map(|balance| async move {
        let meta = api
            .token_metadata(&balance.contract_address)
            .await
            .with_context(|| format!("metadata for {}", balance.contract_address))?;
        Ok::<_, anyhow::Error>(WalletToken::from_parts(balance, meta))
    }))
    .buffer_unordered(concurrency.max(1))
    .try_collect()
    .await
}

/// Spawns one task per request and forwards completions to the UI loop.
#[derive(Clone)]
pub struct Fetcher {
    api: Arc<dyn ChainApi>,
    events: UnboundedSender<AppEvent>,
    token_concurrency: usize,
}

impl Fetcher {
    pub fn new(
        api: Arc<dyn ChainApi>,
        events: UnboundedSender<AppEvent>,
        token_concurrency: usize,
    ) -> Self {
        Self {
            api,
            events,
            token_concurrency: token_concurrency.max(1),
        }
    }

    pub fn spawn(&self, effect: Effect) {
        log::debug!("effect {effect:?}");
        match effect {
            Effect::FetchChainHead => {
                self.spawn_request(|api| async move { fetch_chain_head(api.as_ref()).await });
            }
            Effect::LoadBlock { number, generation } => {
                self.spawn_request(move |api| async move {
                    fetch_block(api.as_ref(), number, generation).await
                });
            }
            Effect::InspectTransaction { hash, generation } => {
                let h = hash.clone();
                self.spawn_request(move |api| async move {
                    fetch_receipt(api.as_ref(), &h, generation).await
                });
                self.spawn_request(move |api| async move {
                    fetch_transaction(api.as_ref(), &hash, generation).await
                });
            }
            Effect::InspectWallet {
                address,
                generation,
            } => {
                let a = address.clone();
                self.spawn_request(move |api| async move {
                    fetch_balance(api.as_ref(), &a, generation).await
                });
                let concurrency = self.token_concurrency;
                self.spawn_request(move |api| async move {
                    fetch_wallet_tokens(api.as_ref(), &address, generation, concurrency).await
                });
            }
        }
    }

    fn spawn_request<F, Fut>(&self, request: F)
    where
        F: FnOnce(Arc<dyn ChainApi>) -> Fut,
        Fut: std::future::Future<Output = Action> + Send + 'static,
    {
        let fut = request(self.api.clone());
        let events = self.events.clone();
        tokio::spawn(async move {
            let action = fut.await;
            if events.send(AppEvent::Fetched(action)).is_err() {
                log::debug!("ui loop gone, dropping fetch result");
            }
        });
    }
}

/// Background task that receives effects from the App and fetches them.
pub async fn run_fetcher(fetcher: Fetcher, mut effects: UnboundedReceiver<Effect>) -> Result<()> {
    log::info!("fetcher started");
    while let Some(effect) = effects.recv().await {
        fetcher.spawn(effect);
    }
    log::info!("fetcher shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlockTxs, TokenBalance, TokenMetadata, TxDetail, TxReceipt};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use primitive_types::U256;
    use tokio::sync::mpsc::unbounded_channel;

    /// Answers the transaction lookups; everything else fails.
    struct TxOnly;

    #[async_trait]
    impl ChainApi for TxOnly {
        async fn block_number(&self) -> Result<u64> {
            Err(anyhow!("offline"))
        }
        async fn block_transactions(&self, _number: u64) -> Result<BlockTxs> {
            Err(anyhow!("offline"))
        }
        async fn transaction_receipt(&self, hash: &str) -> Result<TxReceipt> {
            Ok(TxReceipt {
                hash: hash.to_string(),
                from: "0x01".to_string(),
                to: None,
                block_number: 1,
                confirmations: 1,
                status: Some(0),
                contract_address: Some("0x02".to_string()),
            })
        }
        async fn transaction(&self, hash: &str) -> Result<TxDetail> {
            Ok(TxDetail {
                hash: hash.to_string(),
                from: "0x01".to_string(),
                to: None,
                value: U256::zero(),
                nonce: 0,
                block_number: Some(1),
                gas_price: None,
            })
        }
        async fn balance(&self, _address: &str, _tag: &str) -> Result<U256> {
            Err(anyhow!("offline"))
        }
        async fn token_balances(&self, _address: &str) -> Result<Vec<TokenBalance>> {
            Ok(vec![TokenBalance {
                contract_address: "0xaa".to_string(),
                balance: U256::one(),
            }])
        }
        async fn token_metadata(&self, _contract: &str) -> Result<TokenMetadata> {
            Err(anyhow!("rpc -32602 invalid params"))
        }
    }

    #[tokio::test]
    async fn inspect_reports_receipt_and_detail_with_its_generation() {
        let (tx, mut rx) = unbounded_channel();
        let fetcher = Fetcher::new(Arc::new(TxOnly), tx, 2);
        fetcher.spawn(Effect::InspectTransaction {
            hash: "0xabc".to_string(),
            generation: Generation(3),
        });

        let mut receipt = false;
        let mut detail = false;
        for _ in 0..2 {
            match rx.recv().await {
                Some(AppEvent::Fetched(Action::ReceiptLoaded { generation, result })) => {
                    assert_eq!(generation, Generation(3));
                    assert_eq!(result.unwrap().hash, "0xabc");
                    receipt = true;
                }
                Some(AppEvent::Fetched(Action::TransactionLoaded { generation, result })) => {
                    assert_eq!(generation, Generation(3));
                    assert!(result.is_ok());
                    detail = true;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert!(receipt && detail);
    }

    #[tokio::test]
    async fn head_failure_is_reported_not_dropped() {
        let action = fetch_chain_head(&TxOnly).await;
        match action {
            Action::ChainHeadLoaded(Err(e)) => assert!(format!("{e:#}").contains("offline")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn one_failed_metadata_lookup_fails_the_token_list() {
        let err = wallet_tokens(&TxOnly, "0xwallet", 4).await.unwrap_err();
        assert!(format!("{err:#}").contains("metadata for 0xaa"));
    }
}
