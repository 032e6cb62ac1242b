// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::attendance::AttendanceLedger;
use crate::auth::IdentityGateway;
use crate::blockchain::{ContractDescriptor, LedgerClient, TransactionVerifier};
use crate::storage::PresenceDatabase;

/// Shared handles injected into every request handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<PresenceDatabase>,
    pub ledger: Arc<dyn LedgerClient>,
    pub contract: ContractDescriptor,
    pub identity: IdentityGateway,
    pub attendance: AttendanceLedger,
}

impl AppState {
    pub fn new(
        db: Arc<PresenceDatabase>,
        ledger: Arc<dyn LedgerClient>,
        contract: ContractDescriptor,
    ) -> Self {
        let verifier = TransactionVerifier::new(ledger.clone(), contract.address());
        Self {
            identity: IdentityGateway::new(db.clone()),
            attendance: AttendanceLedger::new(db.clone(), verifier),
            db,
            ledger,
            contract,
        }
    }
}
