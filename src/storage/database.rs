// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded presence database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `identities`: lowercase address → serialized WalletIdentity
//! - `events`: event id → serialized EventDescriptor
//! - `attendance`: attendance id → serialized AttendanceRecord
//! - `attendance_by_tx`: lowercase tx hash → attendance id (unique)
//! - `attendance_by_pair`: `address|event_id` → attendance id (unique)
//! - `checkins`: checkin id → serialized CheckinRecord
//! - `wallet_checkins`: composite key (address|id_be) → checkin id
//! - `sequences`: name → last assigned id
//!
//! redb allows a single write transaction at a time, so the uniqueness checks
//! in [`PresenceDatabase::record_attendance`] and the inserts that follow are
//! atomic with respect to every other writer.

use std::path::Path;

use alloy::primitives::Address;
use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};

use super::records::{AttendanceRecord, CheckinRecord, EventDescriptor, NewEvent, WalletIdentity};
use crate::validation::ValidationError;

// =============================================================================
// Table Definitions
// =============================================================================

const IDENTITIES: TableDefinition<&str, &[u8]> = TableDefinition::new("identities");

const EVENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("events");

const ATTENDANCE: TableDefinition<u64, &[u8]> = TableDefinition::new("attendance");

/// Unique index: lowercase tx hash → attendance id.
const ATTENDANCE_BY_TX: TableDefinition<&str, u64> = TableDefinition::new("attendance_by_tx");

/// Unique index: `lowercase_address|event_id` → attendance id.
const ATTENDANCE_BY_PAIR: TableDefinition<&str, u64> = TableDefinition::new("attendance_by_pair");

const CHECKINS: TableDefinition<u64, &[u8]> = TableDefinition::new("checkins");

/// Index: `lowercase_address | id_be_bytes` → checkin id.
const WALLET_CHECKINS: TableDefinition<&[u8], u64> = TableDefinition::new("wallet_checkins");

const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

const SEQ_EVENTS: &str = "events";
const SEQ_ATTENDANCE: &str = "attendance";
const SEQ_CHECKINS: &str = "checkins";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    InvalidEvent(#[from] ValidationError),

    #[error("transaction hash already recorded")]
    TransactionAlreadyUsed,

    #[error("wallet already attended this event")]
    AlreadyAttended,
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Key Helpers
// =============================================================================

/// Lowercase `0x` address used as the identity key.
fn wallet_key(address: &Address) -> String {
    alloy::hex::encode_prefixed(address)
}

fn pair_key(wallet: &str, event_id: u64) -> String {
    format!("{wallet}|{event_id}")
}

/// Half-open range covering every `wallet|...` pair key (`}` sorts after `|`).
fn pair_range(wallet: &str) -> (String, String) {
    (format!("{wallet}|"), format!("{wallet}}}"))
}

fn checkin_index_key(wallet: &str, id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(wallet.len() + 1 + 8);
    key.extend_from_slice(wallet.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&id.to_be_bytes());
    key
}

fn checkin_prefix(wallet: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(wallet.len() + 1);
    prefix.extend_from_slice(wallet.as_bytes());
    prefix.push(b'|');
    prefix
}

fn checkin_prefix_end(wallet: &str) -> Vec<u8> {
    let mut end = checkin_prefix(wallet);
    // Past any 8-byte id with this prefix
    end.extend_from_slice(&[0xFF; 9]);
    end
}

fn count_wallet_checkins(
    index: &impl ReadableTable<&'static [u8], u64>,
    wallet: &str,
) -> StoreResult<u64> {
    let prefix = checkin_prefix(wallet);
    let prefix_end = checkin_prefix_end(wallet);
    let mut count = 0;
    for entry in index.range(prefix.as_slice()..prefix_end.as_slice())? {
        entry?;
        count += 1;
    }
    Ok(count)
}

fn next_id(txn: &WriteTransaction, sequence: &str) -> StoreResult<u64> {
    let mut table = txn.open_table(SEQUENCES)?;
    let next = table.get(sequence)?.map(|v| v.value()).unwrap_or(0) + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

// =============================================================================
// PresenceDatabase
// =============================================================================

/// Records written by [`PresenceDatabase::record_attendance`].
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedAttendance {
    pub attendance: AttendanceRecord,
    pub checkin: CheckinRecord,
    /// Wallet check-ins including this one, read inside the same transaction
    pub total_checkins: u64,
}

/// Embedded ACID store for identities, events and attendance.
pub struct PresenceDatabase {
    db: Database,
}

impl PresenceDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(IDENTITIES)?;
            let _ = write_txn.open_table(EVENTS)?;
            let _ = write_txn.open_table(ATTENDANCE)?;
            let _ = write_txn.open_table(ATTENDANCE_BY_TX)?;
            let _ = write_txn.open_table(ATTENDANCE_BY_PAIR)?;
            let _ = write_txn.open_table(CHECKINS)?;
            let _ = write_txn.open_table(WALLET_CHECKINS)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Open a read transaction on every table; used by readiness probes.
    pub fn check(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(IDENTITIES)?;
        let _ = read_txn.open_table(EVENTS)?;
        let _ = read_txn.open_table(ATTENDANCE)?;
        let _ = read_txn.open_table(CHECKINS)?;
        Ok(())
    }

    // =========================================================================
    // Identities
    // =========================================================================

    /// Return the identity for `address`, creating it if unseen.
    ///
    /// The boolean is `true` when this call created the identity.
    pub fn get_or_create_identity(&self, address: Address) -> StoreResult<(WalletIdentity, bool)> {
        let key = wallet_key(&address);
        let write_txn = self.db.begin_write()?;
        let result = {
            let mut table = write_txn.open_table(IDENTITIES)?;
            let existing = table.get(key.as_str())?.map(|v| v.value().to_vec());
            match existing {
                Some(bytes) => (serde_json::from_slice(&bytes)?, false),
                None => {
                    let identity = WalletIdentity {
                        address: address.to_checksum(None),
                        display_name: None,
                        created_at: Utc::now(),
                    };
                    let json = serde_json::to_vec(&identity)?;
                    table.insert(key.as_str(), json.as_slice())?;
                    (identity, true)
                }
            }
        };
        write_txn.commit()?;
        Ok(result)
    }

    pub fn get_identity(&self, address: Address) -> StoreResult<Option<WalletIdentity>> {
        let key = wallet_key(&address);
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(IDENTITIES)?;
        match table.get(key.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Delete an identity with its attendances and check-ins.
    pub fn delete_identity(&self, address: Address) -> StoreResult<bool> {
        let wallet = wallet_key(&address);
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut identities = write_txn.open_table(IDENTITIES)?;
            let mut attendance = write_txn.open_table(ATTENDANCE)?;
            let mut by_tx = write_txn.open_table(ATTENDANCE_BY_TX)?;
            let mut by_pair = write_txn.open_table(ATTENDANCE_BY_PAIR)?;
            let mut checkins = write_txn.open_table(CHECKINS)?;
            let mut wallet_checkins = write_txn.open_table(WALLET_CHECKINS)?;

            let existed = identities.remove(wallet.as_str())?.is_some();

            let (start, end) = pair_range(&wallet);
            let mut pairs = Vec::new();
            for entry in by_pair.range(start.as_str()..end.as_str())? {
                let (key, value) = entry?;
                pairs.push((key.value().to_string(), value.value()));
            }
            for (pair, id) in pairs {
                by_pair.remove(pair.as_str())?;
                let removed = attendance.remove(id)?.map(|v| v.value().to_vec());
                if let Some(bytes) = removed {
                    let record: AttendanceRecord = serde_json::from_slice(&bytes)?;
                    by_tx.remove(record.tx_hash.as_str())?;
                }
            }

            let prefix = checkin_prefix(&wallet);
            let prefix_end = checkin_prefix_end(&wallet);
            let mut indexed = Vec::new();
            for entry in wallet_checkins.range(prefix.as_slice()..prefix_end.as_slice())? {
                let (key, value) = entry?;
                indexed.push((key.value().to_vec(), value.value()));
            }
            for (key, id) in indexed {
                wallet_checkins.remove(key.as_slice())?;
                checkins.remove(id)?;
            }

            existed
        };
        write_txn.commit()?;
        Ok(existed)
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Validate and store a new event, assigning its id.
    pub fn create_event(&self, event: NewEvent) -> StoreResult<EventDescriptor> {
        event.validate()?;

        let write_txn = self.db.begin_write()?;
        let descriptor = {
            let id = next_id(&write_txn, SEQ_EVENTS)?;
            let descriptor = EventDescriptor {
                id,
                name: event.name.trim().to_string(),
                description: event.description,
                location: event.location.trim().to_string(),
                latitude: event.latitude,
                longitude: event.longitude,
                start_time: event.start_time,
                end_time: event.end_time,
                created_at: Utc::now(),
            };
            let json = serde_json::to_vec(&descriptor)?;
            let mut table = write_txn.open_table(EVENTS)?;
            table.insert(id, json.as_slice())?;
            descriptor
        };
        write_txn.commit()?;
        Ok(descriptor)
    }

    pub fn get_event(&self, id: u64) -> StoreResult<Option<EventDescriptor>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All events, latest start time first.
    pub fn list_events(&self) -> StoreResult<Vec<EventDescriptor>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS)?;
        let mut events = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let event: EventDescriptor = serde_json::from_slice(value.value())?;
            events.push(event);
        }
        events.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
        Ok(events)
    }

    /// Delete an event and every attendance recorded for it.
    pub fn delete_event(&self, id: u64) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut events = write_txn.open_table(EVENTS)?;
            let mut attendance = write_txn.open_table(ATTENDANCE)?;
            let mut by_tx = write_txn.open_table(ATTENDANCE_BY_TX)?;
            let mut by_pair = write_txn.open_table(ATTENDANCE_BY_PAIR)?;

            let existed = events.remove(id)?.is_some();

            let mut doomed = Vec::new();
            for entry in attendance.iter()? {
                let (_, value) = entry?;
                let record: AttendanceRecord = serde_json::from_slice(value.value())?;
                if record.event_id == id {
                    doomed.push(record);
                }
            }
            for record in doomed {
                attendance.remove(record.id)?;
                by_tx.remove(record.tx_hash.as_str())?;
                let wallet = record.wallet_address.to_ascii_lowercase();
                by_pair.remove(pair_key(&wallet, record.event_id).as_str())?;
            }

            existed
        };
        write_txn.commit()?;
        Ok(existed)
    }

    // =========================================================================
    // Attendance
    // =========================================================================

    /// Atomically record a verified attendance and its check-in entry.
    ///
    /// Fails with [`StoreError::TransactionAlreadyUsed`] or
    /// [`StoreError::AlreadyAttended`] if another writer got there first; in
    /// that case nothing is written.
    pub fn record_attendance(
        &self,
        address: Address,
        event: &EventDescriptor,
        tx_hash: &str,
    ) -> StoreResult<CommittedAttendance> {
        let wallet = wallet_key(&address);
        let tx_key = tx_hash.to_ascii_lowercase();
        let pair = pair_key(&wallet, event.id);
        let now = Utc::now();

        let write_txn = self.db.begin_write()?;
        let records = {
            let mut by_tx = write_txn.open_table(ATTENDANCE_BY_TX)?;
            if by_tx.get(tx_key.as_str())?.is_some() {
                return Err(StoreError::TransactionAlreadyUsed);
            }
            let mut by_pair = write_txn.open_table(ATTENDANCE_BY_PAIR)?;
            if by_pair.get(pair.as_str())?.is_some() {
                return Err(StoreError::AlreadyAttended);
            }

            let attendance_id = next_id(&write_txn, SEQ_ATTENDANCE)?;
            let checkin_id = next_id(&write_txn, SEQ_CHECKINS)?;

            let attendance = AttendanceRecord {
                id: attendance_id,
                wallet_address: address.to_checksum(None),
                event_id: event.id,
                tx_hash: tx_key.clone(),
                created_at: now,
            };
            let checkin = CheckinRecord {
                id: checkin_id,
                wallet_address: address.to_checksum(None),
                location: event.location.clone(),
                latitude: Some(event.latitude),
                longitude: Some(event.longitude),
                tx_hash: tx_key.clone(),
                created_at: now,
            };

            let mut attendance_table = write_txn.open_table(ATTENDANCE)?;
            attendance_table.insert(attendance_id, serde_json::to_vec(&attendance)?.as_slice())?;
            by_tx.insert(tx_key.as_str(), attendance_id)?;
            by_pair.insert(pair.as_str(), attendance_id)?;

            let mut checkin_table = write_txn.open_table(CHECKINS)?;
            checkin_table.insert(checkin_id, serde_json::to_vec(&checkin)?.as_slice())?;
            let mut wallet_checkins = write_txn.open_table(WALLET_CHECKINS)?;
            wallet_checkins.insert(checkin_index_key(&wallet, checkin_id).as_slice(), checkin_id)?;
            let total_checkins = count_wallet_checkins(&wallet_checkins, &wallet)?;

            CommittedAttendance {
                attendance,
                checkin,
                total_checkins,
            }
        };
        write_txn.commit()?;
        Ok(records)
    }

    /// Look up the attendance that consumed `tx_hash` (case-insensitive).
    pub fn attendance_by_tx(&self, tx_hash: &str) -> StoreResult<Option<AttendanceRecord>> {
        let tx_key = tx_hash.to_ascii_lowercase();
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ATTENDANCE_BY_TX)?;
        let id = match index.get(tx_key.as_str())? {
            Some(v) => v.value(),
            None => return Ok(None),
        };
        let table = read_txn.open_table(ATTENDANCE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Look up the attendance of `address` at `event_id`.
    pub fn attendance_for(
        &self,
        address: Address,
        event_id: u64,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let pair = pair_key(&wallet_key(&address), event_id);
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ATTENDANCE_BY_PAIR)?;
        let id = match index.get(pair.as_str())? {
            Some(v) => v.value(),
            None => return Ok(None),
        };
        let table = read_txn.open_table(ATTENDANCE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Every attendance of `address`, newest first.
    pub fn list_attendance(&self, address: Address) -> StoreResult<Vec<AttendanceRecord>> {
        let wallet = wallet_key(&address);
        let (start, end) = pair_range(&wallet);
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ATTENDANCE_BY_PAIR)?;
        let table = read_txn.open_table(ATTENDANCE)?;

        let mut records = Vec::new();
        for entry in index.range(start.as_str()..end.as_str())? {
            let (_, id) = entry?;
            if let Some(value) = table.get(id.value())? {
                let record: AttendanceRecord = serde_json::from_slice(value.value())?;
                records.push(record);
            }
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    /// Number of check-in entries recorded for `address`.
    pub fn count_checkins(&self, address: Address) -> StoreResult<u64> {
        let wallet = wallet_key(&address);
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(WALLET_CHECKINS)?;
        count_wallet_checkins(&index, &wallet)
    }
}

// =============================================================================
// Tests
// =============================================================================
