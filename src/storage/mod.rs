// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state lives in a single redb file under `DATA_DIR`:
//!
//! ```text
//! {DATA_DIR}/
//!   presence.redb   # identities, events, attendance, check-ins
//! ```
//!
//! The database is the only shared mutable state in the server. Uniqueness of
//! attendance per (wallet, event) and per transaction hash is enforced here,
//! independently of the checks done before verification.

pub mod database;
pub mod records;

pub use database::{CommittedAttendance, PresenceDatabase, StoreError, StoreResult};
pub use records::{AttendanceRecord, CheckinRecord, EventDescriptor, NewEvent, WalletIdentity};

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "presence.redb";
