// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Presence Server - Proof-of-Presence Verification Service
//!
//! Wallets log in by signing a nonce and check in to events by sending a
//! `checkInEvent` transaction to the ProofOfPresence contract. The server checks
//! those transactions against an EVM node and records each attendance once.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `attendance` - Check-in state machine
//! - `auth` - Signed-nonce wallet login
//! - `blockchain` - Read-only EVM node access and transaction verification
//! - `storage` - Embedded redb database

pub mod api;
pub mod attendance;
pub mod auth;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod validation;
