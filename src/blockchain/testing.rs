// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory ledger for tests.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use alloy::{
    primitives::{address, Address, B256, U256},
    sol_types::SolEvent,
};
use async_trait::async_trait;

use super::client::{LedgerClient, LedgerError};
use super::contract::EventCheckedIn;
use super::types::{Block, EventLog, Receipt, Transaction};

/// Deployed contract used across tests.
pub const CONTRACT: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

/// Wallet that sends the check-in transactions.
pub const WALLET: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

/// Some other account.
pub const OTHER_WALLET: Address = address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");

/// Build an `EventCheckedIn` log as the contract would emit it.
pub fn checkin_log(contract: Address, user: Address, event_id: u64) -> EventLog {
    let event = EventCheckedIn {
        user,
        eventId: U256::from(event_id),
        location: "Plaza de Armas".to_string(),
        timestamp: U256::from(1_700_000_000u64),
    };
    let data = event.encode_log_data();
    EventLog {
        address: contract,
        topics: data.topics().to_vec(),
        data: data.data,
    }
}

/// `0x` + 64 hex digits derived from `n`.
pub fn tx_hash(n: u64) -> String {
    format!("0x{n:064x}")
}

#[derive(Default)]
pub struct MockLedger {
    transactions: HashMap<B256, Transaction>,
    receipts: HashMap<B256, Receipt>,
    blocks: HashMap<u64, Block>,
    unavailable: bool,
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl MockLedger {
    pub const BLOCK_TIMESTAMP: u64 = 1_700_000_123;
    pub const HEAD: u64 = 4_242;

    pub fn new() -> Self {
        Self::default()
    }

    /// Register a successful check-in transaction mined in its own block.
    pub fn with_checkin(mut self, hash: &str, sender: Address, event_id: u64) -> Self {
        let hash = parse_hash(hash);
        let number = 100 + self.receipts.len() as u64;

        self.transactions.insert(
            hash,
            Transaction {
                hash,
                from: sender,
                block_number: Some(number),
            },
        );
        self.receipts.insert(
            hash,
            Receipt {
                transaction_hash: hash,
                block_number: Some(number),
                from: sender,
                to: Some(CONTRACT),
                gas_used: 61_234,
                success: true,
                logs: vec![checkin_log(CONTRACT, sender, event_id)],
            },
        );
        self.blocks.insert(
            number,
            Block {
                number,
                hash: B256::from(U256::from(number)),
                timestamp: Self::BLOCK_TIMESTAMP,
            },
        );
        self
    }

    /// Every call fails as if the node were down.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Delay every answer.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn receipt_mut(&mut self, hash: &str) -> &mut Receipt {
        self.receipts
            .get_mut(&parse_hash(hash))
            .expect("receipt registered")
    }

    pub fn clear_blocks(&mut self) {
        self.blocks.clear();
    }

    /// Number of ledger calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<(), LedgerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable {
            return Err(LedgerError::Rpc("connection refused".into()));
        }
        Ok(())
    }
}

fn parse_hash(hash: &str) -> B256 {
    B256::from_str(hash).expect("valid test hash")
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn get_transaction(&self, hash: B256) -> Result<Transaction, LedgerError> {
        self.enter().await?;
        self.transactions
            .get(&hash)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("transaction {hash}")))
    }

    async fn get_receipt(&self, hash: B256) -> Result<Receipt, LedgerError> {
        self.enter().await?;
        self.receipts
            .get(&hash)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("receipt {hash}")))
    }

    async fn get_block(&self, number: u64) -> Result<Block, LedgerError> {
        self.enter().await?;
        self.blocks
            .get(&number)
            .copied()
            .ok_or_else(|| LedgerError::NotFound(format!("block {number}")))
    }

    async fn latest_block_number(&self) -> Result<u64, LedgerError> {
        self.enter().await?;
        Ok(Self::HEAD)
    }
}
