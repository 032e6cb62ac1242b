// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Input format checks shared by login, check-in and event endpoints.
//!
//! Every check here is pure and runs before any ledger or signature work,
//! so malformed requests never cost a node round trip.

/// Length of a `0x`-prefixed wallet address.
pub const ADDRESS_LEN: usize = 42;

/// Length of a `0x`-prefixed transaction hash.
pub const TX_HASH_LEN: usize = 66;

/// Maximum length of a location label.
pub const MAX_LOCATION_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Wallet address is required")]
    MissingAddress,

    #[error("Invalid wallet address format")]
    InvalidAddress,

    #[error("Transaction hash is required")]
    MissingTxHash,

    #[error("Transaction hash must start with 0x")]
    TxHashPrefix,

    #[error("Transaction hash must be 66 characters long")]
    TxHashLength,

    #[error("Transaction hash must be hexadecimal")]
    TxHashNotHex,

    #[error("Event ID must be positive")]
    EventIdNotPositive,

    #[error("Event ID must be a number")]
    EventIdNotNumber,

    #[error("Latitude must be between -90 and 90")]
    LatitudeOutOfRange,

    #[error("Longitude must be between -180 and 180")]
    LongitudeOutOfRange,

    #[error("Location cannot be empty")]
    EmptyLocation,

    #[error("Location must be less than 255 characters")]
    LocationTooLong,

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("Event start time must be before end time")]
    InvalidTimeRange,
}

/// Whether `address` is `0x` followed by exactly 40 hex digits (any case).
pub fn is_wallet_address(address: &str) -> bool {
    address.len() == ADDRESS_LEN
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate an Ethereum-style wallet address.
pub fn validate_wallet_address(address: &str) -> Result<(), ValidationError> {
    if address.is_empty() {
        return Err(ValidationError::MissingAddress);
    }
    if !is_wallet_address(address) {
        return Err(ValidationError::InvalidAddress);
    }
    Ok(())
}

/// Validate a transaction hash: `0x` + 64 hex digits.
pub fn validate_tx_hash(tx_hash: &str) -> Result<(), ValidationError> {
    if tx_hash.is_empty() {
        return Err(ValidationError::MissingTxHash);
    }
    if !tx_hash.starts_with("0x") {
        return Err(ValidationError::TxHashPrefix);
    }
    if tx_hash.len() != TX_HASH_LEN {
        return Err(ValidationError::TxHashLength);
    }
    if !tx_hash[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::TxHashNotHex);
    }
    Ok(())
}

/// Validate an event identifier, which must be a positive integer.
pub fn validate_event_id(event_id: i64) -> Result<u64, ValidationError> {
    if event_id <= 0 {
        return Err(ValidationError::EventIdNotPositive);
    }
    Ok(event_id as u64)
}

/// Parse an event identifier supplied as text (`"12"`).
pub fn parse_event_id(raw: &str) -> Result<u64, ValidationError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::EventIdNotNumber)?;
    validate_event_id(value)
}

/// Validate a latitude/longitude pair.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ValidationError::LatitudeOutOfRange);
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ValidationError::LongitudeOutOfRange);
    }
    Ok(())
}

/// Validate a human-readable location label.
pub fn validate_location(location: &str) -> Result<(), ValidationError> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyLocation);
    }
    if trimmed.chars().count() > MAX_LOCATION_LEN {
        return Err(ValidationError::LocationTooLong);
    }
    Ok(())
}
