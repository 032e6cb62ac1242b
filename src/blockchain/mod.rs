// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM ledger integration (read-only).
//!
//! This module provides functionality for:
//! - Loading the deployed ProofOfPresence contract descriptor
//! - Fetching transactions, receipts and blocks from the node
//! - Decoding `EventCheckedIn` logs
//! - Verifying check-in transactions

pub mod client;
pub mod contract;
pub mod types;
pub mod verifier;

#[cfg(test)]
pub mod testing;

pub use client::{LedgerClient, LedgerError, RpcLedgerClient};
pub use contract::{ContractDescriptor, ContractError};
pub use types::*;
pub use verifier::{TransactionVerifier, VerificationOutcome, VerifyError};
