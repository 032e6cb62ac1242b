// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Event Attendance
//!
//! Records at most one attendance per (wallet, event), each backed by a
//! distinct verified on-chain check-in transaction.
//!
//! ## Check-in flow
//!
//! ```text
//! validate input ─► event exists ─► get-or-create identity
//!        ─► tx hash unused ─► not yet attended ─► verify on chain
//!        ─► commit (re-checks both unique indexes in one write transaction)
//! ```
//!
//! The pre-verification checks avoid node round trips for obvious replays.
//! They are advisory: concurrent requests can all pass them, and the commit
//! decides which one wins.

pub mod error;

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use error::CheckinError;

use crate::blockchain::{TransactionVerifier, VerifiedTransaction};
use crate::storage::{
    AttendanceRecord, CommittedAttendance, EventDescriptor, PresenceDatabase, StoreError,
    WalletIdentity,
};
use crate::validation::{validate_tx_hash, validate_wallet_address, ValidationError};

/// Everything produced by a successful check-in.
#[derive(Debug, Clone)]
pub struct CheckinReceipt {
    pub attendance: AttendanceRecord,
    pub event: EventDescriptor,
    pub identity: WalletIdentity,
    pub identity_created: bool,
    pub verified: VerifiedTransaction,
    pub total_checkins: u64,
}

/// One verified attendance joined with its event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserCheckin {
    pub attendance_id: u64,
    pub event_id: u64,
    pub event_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub tx_hash: String,
    pub checked_in_at: DateTime<Utc>,
}

/// Attendance state machine.
#[derive(Clone)]
pub struct AttendanceLedger {
    db: Arc<PresenceDatabase>,
    verifier: TransactionVerifier,
}

impl AttendanceLedger {
    pub fn new(db: Arc<PresenceDatabase>, verifier: TransactionVerifier) -> Self {
        Self { db, verifier }
    }

    /// Verify and record a check-in of `wallet` at `event_id` via `tx_hash`.
    pub async fn record_check_in(
        &self,
        event_id: u64,
        wallet: &str,
        tx_hash: &str,
    ) -> Result<CheckinReceipt, CheckinError> {
        validate_wallet_address(wallet)?;
        validate_tx_hash(tx_hash)?;
        if event_id == 0 {
            return Err(ValidationError::EventIdNotPositive.into());
        }
        let address = Address::from_str(wallet).map_err(|_| ValidationError::InvalidAddress)?;
        let tx_hash = tx_hash.to_ascii_lowercase();

        let event = self
            .db
            .get_event(event_id)?
            .ok_or(CheckinError::EventNotFound)?;

        let (identity, identity_created) = self.db.get_or_create_identity(address)?;

        if self.db.attendance_by_tx(&tx_hash)?.is_some() {
            tracing::debug!(tx_hash = %tx_hash, "Rejecting replayed transaction");
            return Err(CheckinError::TransactionAlreadyUsed);
        }
        if self.db.attendance_for(address, event_id)?.is_some() {
            tracing::debug!(wallet = %identity.address, event_id, "Rejecting duplicate attendance");
            return Err(CheckinError::AlreadyAttended);
        }

        let verified = self
            .verifier
            .verify(&tx_hash, wallet, Some(event_id))
            .await
            .map_err(|kind| {
                tracing::warn!(
                    tx_hash = %tx_hash,
                    event_id,
                    wallet = %identity.address,
                    error = %kind,
                    "Check-in verification failed"
                );
                kind
            })?;

        // Runs to completion even if the caller stops polling.
        let db = self.db.clone();
        let commit_event = event.clone();
        let commit_hash = tx_hash.clone();
        let committed = tokio::task::spawn_blocking(move || {
            db.record_attendance(address, &commit_event, &commit_hash)
        })
        .await
        .map_err(|e| CheckinError::TaskFailed(e.to_string()))?;

        let CommittedAttendance {
            attendance,
            total_checkins,
            ..
        } = match committed {
            Ok(records) => records,
            Err(err @ (StoreError::TransactionAlreadyUsed | StoreError::AlreadyAttended)) => {
                tracing::warn!(
                    tx_hash = %tx_hash,
                    event_id,
                    wallet = %identity.address,
                    error = %err,
                    "Lost check-in race"
                );
                return Err(err.into());
            }
            Err(err) => {
                tracing::error!(tx_hash = %tx_hash, error = %err, "Failed to record attendance");
                return Err(err.into());
            }
        };

        tracing::info!(
            tx_hash = %tx_hash,
            event_id,
            wallet = %identity.address,
            attendance_id = attendance.id,
            "Check-in recorded"
        );

        Ok(CheckinReceipt {
            attendance,
            event,
            identity,
            identity_created,
            verified,
            total_checkins,
        })
    }

    /// Verified check-ins of `wallet`, newest first.
    pub fn user_checkins(&self, wallet: &str) -> Result<Vec<UserCheckin>, CheckinError> {
        validate_wallet_address(wallet)?;
        let address = Address::from_str(wallet).map_err(|_| ValidationError::InvalidAddress)?;

        self.db
            .list_attendance(address)?
            .into_iter()
            .map(|record| -> Result<UserCheckin, CheckinError> {
                let event = self.db.get_event(record.event_id)?;
                Ok(UserCheckin {
                    attendance_id: record.id,
                    event_id: record.event_id,
                    event_name: event
                        .as_ref()
                        .map(|e| e.name.clone())
                        .unwrap_or_else(|| format!("Event #{}", record.event_id)),
                    location: event.map(|e| e.location),
                    tx_hash: record.tx_hash,
                    checked_in_at: record.created_at,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::testing::{tx_hash, MockLedger, CONTRACT, OTHER_WALLET, WALLET};
    use crate::blockchain::VerifyError;
    use crate::storage::NewEvent;
    use chrono::Duration;
    use std::time::Duration as StdDuration;

    struct Fixture {
        ledger: Arc<MockLedger>,
        attendance: AttendanceLedger,
        db: Arc<PresenceDatabase>,
        _dir: tempfile::TempDir,
    }

    fn fixture(ledger: MockLedger, events: usize) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(PresenceDatabase::open(&dir.path().join("presence.redb")).unwrap());
        for n in 0..events {
            let start = Utc::now() + Duration::hours(n as i64);
            db.create_event(NewEvent {
                name: format!("Meetup {}", n + 1),
                description: None,
                location: "Cerro Santa Lucia".into(),
                latitude: -33.44,
                longitude: -70.64,
                start_time: start,
                end_time: start + Duration::hours(2),
            })
            .unwrap();
        }
        let ledger = Arc::new(ledger);
        let verifier = TransactionVerifier::new(ledger.clone(), CONTRACT);
        Fixture {
            ledger,
            attendance: AttendanceLedger::new(db.clone(), verifier),
            db,
            _dir: dir,
        }
    }

    fn wallet() -> String {
        WALLET.to_checksum(None)
    }

    #[tokio::test]
    async fn check_in_round_trip() {
        let f = fixture(MockLedger::new().with_checkin(&tx_hash(1), WALLET, 1), 1);

        let receipt = f
            .attendance
            .record_check_in(1, &wallet().to_lowercase(), &tx_hash(1))
            .await
            .unwrap();
        assert!(receipt.identity_created);
        assert_eq!(receipt.identity.address, wallet());
        assert_eq!(receipt.attendance.event_id, 1);
        assert_eq!(receipt.total_checkins, 1);
        assert_eq!(receipt.event.name, "Meetup 1");
        assert_eq!(receipt.verified.event_data.unwrap().event_id, 1);

        let checkins = f.attendance.user_checkins(&wallet()).unwrap();
        assert_eq!(checkins.len(), 1);
        assert_eq!(checkins[0].event_id, 1);
        assert_eq!(checkins[0].event_name, "Meetup 1");
        assert_eq!(checkins[0].location.as_deref(), Some("Cerro Santa Lucia"));
        assert_eq!(checkins[0].tx_hash, tx_hash(1));
    }

    #[tokio::test]
    async fn repeated_check_in_is_rejected_without_ledger_calls() {
        let f = fixture(MockLedger::new().with_checkin(&tx_hash(1), WALLET, 1), 1);
        f.attendance
            .record_check_in(1, &wallet(), &tx_hash(1))
            .await
            .unwrap();
        let calls = f.ledger.calls();

        let again = f.attendance.record_check_in(1, &wallet(), &tx_hash(1)).await;
        assert!(matches!(again, Err(CheckinError::TransactionAlreadyUsed)));
        assert_eq!(f.ledger.calls(), calls);
        assert_eq!(f.db.count_checkins(WALLET).unwrap(), 1);
    }

    #[tokio::test]
    async fn second_transaction_for_same_event_is_duplicate() {
        let ledger = MockLedger::new()
            .with_checkin(&tx_hash(1), WALLET, 1)
            .with_checkin(&tx_hash(2), WALLET, 1);
        let f = fixture(ledger, 1);
        f.attendance
            .record_check_in(1, &wallet(), &tx_hash(1))
            .await
            .unwrap();

        let dup = f.attendance.record_check_in(1, &wallet(), &tx_hash(2)).await;
        assert!(matches!(dup, Err(CheckinError::AlreadyAttended)));
    }

    #[tokio::test]
    async fn receipt_counts_checkins_from_the_commit() {
        let ledger = MockLedger::new()
            .with_checkin(&tx_hash(1), WALLET, 1)
            .with_checkin(&tx_hash(2), WALLET, 2);
        let f = fixture(ledger, 2);

        let first = f
            .attendance
            .record_check_in(1, &wallet(), &tx_hash(1))
            .await
            .unwrap();
        assert_eq!(first.total_checkins, 1);

        let second = f
            .attendance
            .record_check_in(2, &wallet(), &tx_hash(2))
            .await
            .unwrap();
        assert_eq!(second.total_checkins, 2);
        assert!(!second.identity_created);
        assert_eq!(f.db.count_checkins(WALLET).unwrap(), 2);
    }

    #[tokio::test]
    async fn replayed_hash_by_other_wallet_is_rejected() {
        let f = fixture(MockLedger::new().with_checkin(&tx_hash(1), WALLET, 1), 2);
        f.attendance
            .record_check_in(1, &wallet(), &tx_hash(1))
            .await
            .unwrap();

        let replay = f
            .attendance
            .record_check_in(2, &OTHER_WALLET.to_checksum(None), &tx_hash(1))
            .await;
        assert!(matches!(replay, Err(CheckinError::TransactionAlreadyUsed)));
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let f = fixture(MockLedger::new().with_checkin(&tx_hash(1), WALLET, 5), 1);
        let result = f.attendance.record_check_in(5, &wallet(), &tx_hash(1)).await;
        assert!(matches!(result, Err(CheckinError::EventNotFound)));
        assert_eq!(f.ledger.calls(), 0);
    }

    #[tokio::test]
    async fn malformed_input_touches_nothing() {
        let f = fixture(MockLedger::new().with_checkin(&tx_hash(1), WALLET, 1), 1);

        let short = f.attendance.record_check_in(1, &wallet()[..41], &tx_hash(1)).await;
        assert!(matches!(
            short,
            Err(CheckinError::InvalidInput(ValidationError::InvalidAddress))
        ));
        let bad_hash = f.attendance.record_check_in(1, &wallet(), "0x1234").await;
        assert!(matches!(
            bad_hash,
            Err(CheckinError::InvalidInput(ValidationError::TxHashLength))
        ));
        let zero = f.attendance.record_check_in(0, &wallet(), &tx_hash(1)).await;
        assert!(matches!(
            zero,
            Err(CheckinError::InvalidInput(ValidationError::EventIdNotPositive))
        ));

        assert_eq!(f.ledger.calls(), 0);
        assert!(f.db.get_identity(WALLET).unwrap().is_none());
    }

    #[tokio::test]
    async fn verification_failure_records_nothing() {
        // Transaction checked in to event 1, claimed for event 2.
        let f = fixture(MockLedger::new().with_checkin(&tx_hash(1), WALLET, 1), 2);
        let result = f.attendance.record_check_in(2, &wallet(), &tx_hash(1)).await;
        assert!(matches!(
            result,
            Err(CheckinError::Verification(VerifyError::EventIdMismatch))
        ));
        assert!(f.db.attendance_by_tx(&tx_hash(1)).unwrap().is_none());
        assert!(f.attendance.user_checkins(&wallet()).unwrap().is_empty());

        // The hash is still usable for the right event.
        assert!(f
            .attendance
            .record_check_in(1, &wallet(), &tx_hash(1))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn node_outage_is_unavailable() {
        let f = fixture(
            MockLedger::new().with_checkin(&tx_hash(1), WALLET, 1).unavailable(),
            1,
        );
        let result = f.attendance.record_check_in(1, &wallet(), &tx_hash(1)).await;
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            CheckinError::Verification(VerifyError::LedgerUnavailable)
        ));
        assert_eq!(err.status_code(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
        assert!(f.db.attendance_by_tx(&tx_hash(1)).unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_identical_check_ins_record_once() {
        let ledger = MockLedger::new()
            .with_checkin(&tx_hash(1), WALLET, 1)
            .with_latency(StdDuration::from_millis(20));
        let f = fixture(ledger, 1);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let attendance = f.attendance.clone();
            handles.push(tokio::spawn(async move {
                attendance
                    .record_check_in(1, &WALLET.to_checksum(None), &tx_hash(1))
                    .await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(CheckinError::TransactionAlreadyUsed | CheckinError::AlreadyAttended) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(f.db.list_attendance(WALLET).unwrap().len(), 1);
        assert_eq!(f.db.count_checkins(WALLET).unwrap(), 1);
    }

    #[tokio::test]
    async fn user_checkins_newest_first_and_validated() {
        let ledger = MockLedger::new()
            .with_checkin(&tx_hash(1), WALLET, 1)
            .with_checkin(&tx_hash(2), WALLET, 2);
        let f = fixture(ledger, 2);
        f.attendance
            .record_check_in(1, &wallet(), &tx_hash(1))
            .await
            .unwrap();
        f.attendance
            .record_check_in(2, &wallet(), &tx_hash(2))
            .await
            .unwrap();

        let ids: Vec<u64> = f
            .attendance
            .user_checkins(&wallet())
            .unwrap()
            .iter()
            .map(|c| c.event_id)
            .collect();
        assert_eq!(ids, vec![2, 1]);

        assert!(matches!(
            f.attendance.user_checkins("0x123"),
            Err(CheckinError::InvalidInput(ValidationError::InvalidAddress))
        ));
    }
}
