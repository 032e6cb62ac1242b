// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! On-chain check-in transaction verification.
//!
//! A transaction is accepted only when, in order:
//!
//! 1. the hash and expected sender are well-formed (checked before any I/O)
//! 2. the node has a receipt for it
//! 3. it executed successfully
//! 4. it was sent to the deployed ProofOfPresence contract
//! 5. it was sent by the expected wallet
//! 6. (optional) the contract emitted `EventCheckedIn` for the expected event
//! 7. its block can be fetched for the timestamp
//!
//! The first failing step decides the error.

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, B256};

use super::client::{LedgerClient, LedgerError};
use super::types::{CheckInEventData, VerifiedTransaction};
use crate::validation::{validate_tx_hash, validate_wallet_address};

/// Result of [`TransactionVerifier::verify`].
pub type VerificationOutcome = Result<VerifiedTransaction, VerifyError>;

/// Verifies check-in transactions against the deployed contract.
#[derive(Clone)]
pub struct TransactionVerifier {
    ledger: Arc<dyn LedgerClient>,
    contract: Address,
}

impl TransactionVerifier {
    pub fn new(ledger: Arc<dyn LedgerClient>, contract: Address) -> Self {
        Self { ledger, contract }
    }

    /// Verify `tx_hash` was a successful call by `expected_sender` to the
    /// contract and, when `expected_event_id` is set, that it emitted a
    /// check-in for that event.
    pub async fn verify(
        &self,
        tx_hash: &str,
        expected_sender: &str,
        expected_event_id: Option<u64>,
    ) -> VerificationOutcome {
        validate_tx_hash(tx_hash).map_err(|_| VerifyError::MalformedHash)?;
        let hash = B256::from_str(tx_hash).map_err(|_| VerifyError::MalformedHash)?;
        validate_wallet_address(expected_sender).map_err(|_| VerifyError::InvalidAddressFormat)?;
        let sender =
            Address::from_str(expected_sender).map_err(|_| VerifyError::InvalidAddressFormat)?;

        let receipt = self.ledger.get_receipt(hash).await.map_err(from_ledger)?;

        if !receipt.success {
            return Err(VerifyError::TransactionReverted);
        }

        if receipt.to != Some(self.contract) {
            return Err(VerifyError::WrongContract);
        }

        let transaction = self.ledger.get_transaction(hash).await.map_err(from_ledger)?;
        if transaction.from != sender {
            return Err(VerifyError::SenderMismatch);
        }

        let event_data = match expected_event_id {
            Some(event_id) => {
                let mut saw_checkin = false;
                let mut matched = None;
                for event in receipt.checkin_events(self.contract) {
                    saw_checkin = true;
                    if event.is_for_event(event_id) {
                        matched = Some(CheckInEventData::from_decoded(&event, event_id));
                        break;
                    }
                }
                match (saw_checkin, matched) {
                    (_, Some(data)) => Some(data),
                    (false, None) => return Err(VerifyError::EventNotEmitted),
                    (true, None) => return Err(VerifyError::EventIdMismatch),
                }
            }
            None => None,
        };

        let block_number = receipt
            .block_number
            .ok_or(VerifyError::TransactionNotFound)?;
        let block = self
            .ledger
            .get_block(block_number)
            .await
            .map_err(from_ledger)?;

        Ok(VerifiedTransaction {
            tx_hash: tx_hash.to_ascii_lowercase(),
            from: transaction.from.to_checksum(None),
            to: self.contract.to_checksum(None),
            block_number,
            gas_used: receipt.gas_used,
            timestamp: block.timestamp,
            event_data,
        })
    }
}

fn from_ledger(err: LedgerError) -> VerifyError {
    match err {
        LedgerError::NotFound(_) => VerifyError::TransactionNotFound,
        other => {
            tracing::warn!(error = %other, "Ledger unavailable during verification");
            VerifyError::LedgerUnavailable
        }
    }
}

/// Why a transaction failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("Invalid transaction hash format")]
    MalformedHash,

    #[error("Invalid wallet address format")]
    InvalidAddressFormat,

    #[error("Transaction not found")]
    TransactionNotFound,

    #[error("Transaction failed on chain")]
    TransactionReverted,

    #[error("Transaction was not sent to the ProofOfPresence contract")]
    WrongContract,

    #[error("Transaction sender does not match wallet")]
    SenderMismatch,

    #[error("No check-in event found in transaction")]
    EventNotEmitted,

    #[error("Check-in event does not match the requested event")]
    EventIdMismatch,

    #[error("Blockchain node unavailable")]
    LedgerUnavailable,
}

impl VerifyError {
    pub fn error_code(&self) -> &'static str {
        match self {
            VerifyError::MalformedHash => "malformed_hash",
            VerifyError::InvalidAddressFormat => "invalid_address_format",
            VerifyError::TransactionNotFound => "transaction_not_found",
            VerifyError::TransactionReverted => "transaction_reverted",
            VerifyError::WrongContract => "wrong_contract",
            VerifyError::SenderMismatch => "sender_mismatch",
            VerifyError::EventNotEmitted => "event_not_emitted",
            VerifyError::EventIdMismatch => "event_id_mismatch",
            VerifyError::LedgerUnavailable => "ledger_unavailable",
        }
    }

    /// Format errors, as opposed to the ledger disagreeing with the claim.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, VerifyError::MalformedHash | VerifyError::InvalidAddressFormat)
    }
}
