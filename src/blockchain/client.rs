// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-only EVM node client.
//!
//! [`LedgerClient`] is the seam between verification logic and the node.
//! Production code uses [`RpcLedgerClient`] (alloy HTTP provider); tests use
//! an in-memory fake.

use std::future::IntoFuture;
use std::time::Duration;

use alloy::{
    eips::BlockNumberOrTag,
    network::{Ethereum, TransactionResponse},
    primitives::B256,
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
};
use async_trait::async_trait;

use super::types::{Block, EventLog, Receipt, Transaction};

/// HTTP provider type (alloy's recommended fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Read access to the ledger.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fetch a transaction by hash.
    async fn get_transaction(&self, hash: B256) -> Result<Transaction, LedgerError>;

    /// Fetch the receipt of a mined transaction.
    async fn get_receipt(&self, hash: B256) -> Result<Receipt, LedgerError>;

    /// Fetch a block header by number.
    async fn get_block(&self, number: u64) -> Result<Block, LedgerError>;

    /// Current chain head.
    async fn latest_block_number(&self) -> Result<u64, LedgerError>;

    /// Whether the node answers at all.
    async fn is_connected(&self) -> bool {
        self.latest_block_number().await.is_ok()
    }
}

/// JSON-RPC ledger client.
pub struct RpcLedgerClient {
    provider: HttpProvider,
    timeout: Duration,
}

impl RpcLedgerClient {
    /// Create a client for the node at `rpc_url`.
    ///
    /// No request is made here; connectivity is checked lazily.
    pub fn new(rpc_url: url::Url, timeout: Duration) -> Self {
        let provider = ProviderBuilder::new().connect_http(rpc_url);
        Self { provider, timeout }
    }

    async fn bounded<F, T, E>(&self, method: &'static str, call: F) -> Result<T, LedgerError>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::debug!(method, error = %e, "Ledger RPC call failed");
                Err(LedgerError::Rpc(format!("{method}: {e}")))
            }
            Err(_) => {
                tracing::debug!(
                    method,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Ledger RPC call timed out"
                );
                Err(LedgerError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn get_transaction(&self, hash: B256) -> Result<Transaction, LedgerError> {
        let tx = self
            .bounded(
                "eth_getTransactionByHash",
                self.provider.get_transaction_by_hash(hash),
            )
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("transaction {hash}")))?;

        Ok(Transaction {
            hash: tx.tx_hash(),
            from: tx.from(),
            block_number: tx.block_number(),
        })
    }

    async fn get_receipt(&self, hash: B256) -> Result<Receipt, LedgerError> {
        let receipt = self
            .bounded(
                "eth_getTransactionReceipt",
                self.provider.get_transaction_receipt(hash),
            )
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("receipt {hash}")))?;

        let logs = receipt
            .inner
            .logs()
            .iter()
            .map(|log| EventLog {
                address: log.address(),
                topics: log.topics().to_vec(),
                data: log.data().data.clone(),
            })
            .collect();

        Ok(Receipt {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            from: receipt.from,
            to: receipt.to,
            gas_used: receipt.gas_used,
            success: receipt.status(),
            logs,
        })
    }

    async fn get_block(&self, number: u64) -> Result<Block, LedgerError> {
        let block = self
            .bounded(
                "eth_getBlockByNumber",
                self.provider.get_block_by_number(BlockNumberOrTag::Number(number)),
            )
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("block {number}")))?;

        Ok(Block {
            number: block.header.number,
            hash: block.header.hash,
            timestamp: block.header.timestamp,
        })
    }

    async fn latest_block_number(&self) -> Result<u64, LedgerError> {
        self.bounded("eth_blockNumber", self.provider.get_block_number())
            .await
    }
}

/// Errors returned by the ledger client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Not found on ledger: {0}")]
    NotFound(String),

    #[error("Ledger call timed out after {0:?}")]
    Timeout(Duration),

    #[error("RPC error: {0}")]
    Rpc(String),
}

impl LedgerError {
    /// Whether the node could not be reached (as opposed to answering "no").
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Rpc(_))
    }
}
