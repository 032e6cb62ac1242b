// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize`, `Deserialize`, and `ToSchema`
//! for automatic JSON handling and OpenAPI documentation.
//!
//! Request fields are optional at the serde level so that a missing field
//! is reported as "Missing required parameters" (400) rather than a
//! deserialization rejection.
//!
//! ## Model Categories
//!
//! - **Login**: signed-nonce wallet authentication
//! - **Check-ins**: on-chain verified event attendance
//! - **Events**: event catalogue
//! - **Blockchain**: node and contract status

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::attendance::UserCheckin;
use crate::blockchain::VerifiedTransaction;
use crate::storage::EventDescriptor;
use crate::validation::{parse_event_id, validate_event_id, ValidationError};

pub const STATUS_SUCCESS: &str = "success";

// =============================================================================
// Login Models
// =============================================================================

/// Request body for wallet login.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginWalletRequest {
    /// Wallet address claimed by the client.
    #[serde(default)]
    #[schema(example = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8")]
    pub address: Option<String>,
    /// 65-byte personal-sign signature over `nonce`, hex encoded.
    #[serde(default)]
    pub signature: Option<String>,
    /// The challenge string that was signed.
    #[serde(default)]
    pub nonce: Option<String>,
}

/// Authenticated wallet summary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct WalletUser {
    /// EIP-55 checksum address.
    pub wallet_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Whether this login created the wallet's identity.
    pub created: bool,
    pub total_checkins: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginWalletResponse {
    pub status: String,
    pub message: String,
    pub user: WalletUser,
}

// =============================================================================
// Check-in Models
// =============================================================================

/// Event identifier as sent by clients: a JSON number or a numeric string.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum EventIdParam {
    Number(i64),
    Text(String),
}

impl EventIdParam {
    /// Positive event id, or the reason it is not one.
    pub fn to_event_id(&self) -> Result<u64, ValidationError> {
        match self {
            EventIdParam::Number(n) => validate_event_id(*n),
            EventIdParam::Text(s) => parse_event_id(s),
        }
    }
}

/// Request body for an event check-in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct EventCheckinRequest {
    #[serde(default)]
    pub event_id: Option<EventIdParam>,
    #[serde(default)]
    #[schema(example = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8")]
    pub wallet_address: Option<String>,
    /// Hash of the `checkInEvent` transaction sent by the wallet.
    #[serde(default)]
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CheckinUser {
    pub wallet_address: String,
    /// Whether this check-in created the wallet's identity.
    pub new_user: bool,
    pub total_checkins: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventCheckinResponse {
    pub status: String,
    pub message: String,
    pub attendance_id: u64,
    pub event: EventDescriptor,
    /// On-chain facts the check-in was verified against.
    pub blockchain: VerifiedTransaction,
    pub user: CheckinUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCheckinsResponse {
    pub status: String,
    pub wallet_address: String,
    pub total_checkins: usize,
    pub checkins: Vec<UserCheckin>,
}

// =============================================================================
// Event Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventCreatedResponse {
    pub status: String,
    pub message: String,
    pub event: EventDescriptor,
}

// =============================================================================
// Blockchain Models
// =============================================================================

/// Node connectivity and contract information. The node URL is never exposed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct BlockchainInfo {
    pub contract_address: String,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_block: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlockchainInfoResponse {
    pub status: String,
    pub blockchain: BlockchainInfo,
}
