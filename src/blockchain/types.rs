// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger data types.
//!
//! These are trimmed, owned views of the node's RPC objects. Only the fields
//! the verifier reads are kept, which also lets tests build them by hand.

use alloy::{
    primitives::{Address, Bytes, B256, U256},
    sol_types::SolEvent,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::contract::EventCheckedIn;

/// A transaction as returned by `eth_getTransactionByHash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub hash: B256,
    pub from: Address,
    /// `None` while pending.
    pub block_number: Option<u64>,
}

/// A raw log entry from a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// A transaction receipt as returned by `eth_getTransactionReceipt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub from: Address,
    /// `None` for contract creations.
    pub to: Option<Address>,
    pub gas_used: u64,
    pub success: bool,
    pub logs: Vec<EventLog>,
}

impl Receipt {
    /// Decoded `EventCheckedIn` logs emitted by `contract`, in log order.
    ///
    /// Logs from other addresses or with a different topic0 are ignored.
    /// A matching log that fails to decode is skipped with a warning.
    pub fn checkin_events(&self, contract: Address) -> impl Iterator<Item = DecodedCheckIn> + '_ {
        self.logs
            .iter()
            .filter(move |log| log.address == contract)
            .filter(|log| log.topics.first() == Some(&EventCheckedIn::SIGNATURE_HASH))
            .filter_map(move |log| {
                match EventCheckedIn::decode_raw_log(log.topics.iter().copied(), &log.data) {
                    Ok(event) => Some(DecodedCheckIn::from(event)),
                    Err(e) => {
                        tracing::warn!(
                            tx_hash = %self.transaction_hash,
                            error = %e,
                            "Skipping undecodable EventCheckedIn log"
                        );
                        None
                    }
                }
            })
    }
}

/// A block header subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub number: u64,
    pub hash: B256,
    /// Unix seconds.
    pub timestamp: u64,
}

/// A decoded `EventCheckedIn(user, eventId, location, timestamp)` log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCheckIn {
    pub user: Address,
    pub event_id: U256,
    pub location: String,
    pub timestamp: U256,
}

impl DecodedCheckIn {
    /// Whether this log refers to the given event.
    pub fn is_for_event(&self, event_id: u64) -> bool {
        self.event_id == U256::from(event_id)
    }
}

impl From<EventCheckedIn> for DecodedCheckIn {
    fn from(event: EventCheckedIn) -> Self {
        Self {
            user: event.user,
            event_id: event.eventId,
            location: event.location,
            timestamp: event.timestamp,
        }
    }
}

/// Check-in event data confirmed on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CheckInEventData {
    /// Wallet that checked in (EIP-55 checksum form)
    pub user: String,
    /// Event identifier
    pub event_id: u64,
    /// Location string recorded by the contract
    pub location: String,
    /// Contract-reported timestamp (Unix seconds)
    pub timestamp: u64,
}

impl CheckInEventData {
    pub(crate) fn from_decoded(event: &DecodedCheckIn, event_id: u64) -> Self {
        Self {
            user: event.user.to_checksum(None),
            event_id,
            location: event.location.clone(),
            timestamp: event.timestamp.saturating_to::<u64>(),
        }
    }
}

/// Payload of a successful transaction verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VerifiedTransaction {
    /// Transaction hash (lowercase hex)
    pub tx_hash: String,
    /// Sender address (EIP-55 checksum form)
    pub from: String,
    /// Destination contract (EIP-55 checksum form)
    pub to: String,
    pub block_number: u64,
    pub gas_used: u64,
    /// Block timestamp (Unix seconds)
    pub timestamp: u64,
    /// Decoded check-in event when an event id was expected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_data: Option<CheckInEventData>,
}
