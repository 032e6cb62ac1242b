// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deployed ProofOfPresence contract descriptor.
//!
//! The descriptor is loaded once at startup from the deployment artifact
//! (`{"address": "0x...", "abi": [...]}`). Its address is the only
//! destination a check-in transaction may target. The ABI is checked against
//! the compiled-in `EventCheckedIn` definition so a redeployed contract with a
//! different event layout fails fast instead of silently never matching.

use std::path::Path;
use std::str::FromStr;

use alloy::{json_abi::JsonAbi, primitives::Address, sol, sol_types::SolEvent};
use serde::Deserialize;

sol! {
    interface IProofOfPresence {
        event EventCheckedIn(
            address indexed user,
            uint256 indexed eventId,
            string location,
            uint256 timestamp
        );

        function checkInEvent(uint256 eventId, string location) external;
    }
}

pub use IProofOfPresence::EventCheckedIn;

/// Name of the check-in event in the contract ABI.
pub const CHECKIN_EVENT_NAME: &str = "EventCheckedIn";

/// Expected `indexed` flags of the event inputs, in declaration order.
const CHECKIN_EVENT_INDEXING: [bool; 4] = [true, true, false, false];

#[derive(Debug, Deserialize)]
struct DeploymentArtifact {
    address: String,
    abi: JsonAbi,
}

/// Trusted information about the deployed contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractDescriptor {
    address: Address,
}

impl ContractDescriptor {
    /// Descriptor for a known address, skipping ABI validation.
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// Read and validate the deployment artifact at `path`.
    pub fn load(path: &Path) -> Result<Self, ContractError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ContractError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parse and validate a deployment artifact.
    pub fn from_json(raw: &str) -> Result<Self, ContractError> {
        let artifact: DeploymentArtifact = serde_json::from_str(raw)?;
        let address = Address::from_str(artifact.address.trim())
            .map_err(|e| ContractError::InvalidAddress(e.to_string()))?;
        validate_checkin_event(&artifact.abi)?;
        Ok(Self { address })
    }

    /// Contract address.
    pub fn address(&self) -> Address {
        self.address
    }
}

fn validate_checkin_event(abi: &JsonAbi) -> Result<(), ContractError> {
    let events = abi
        .event(CHECKIN_EVENT_NAME)
        .ok_or(ContractError::MissingEvent)?;

    let matching = events
        .iter()
        .find(|event| event.selector() == EventCheckedIn::SIGNATURE_HASH)
        .ok_or_else(|| ContractError::EventSignature {
            found: events.iter().map(|e| e.signature()).collect::<Vec<_>>().join(", "),
        })?;

    let indexing: Vec<bool> = matching.inputs.iter().map(|input| input.indexed).collect();
    if indexing != CHECKIN_EVENT_INDEXING {
        return Err(ContractError::EventIndexing);
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("Failed to read contract artifact {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed contract artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid contract address: {0}")]
    InvalidAddress(String),

    #[error("Contract ABI does not declare EventCheckedIn")]
    MissingEvent,

    #[error("EventCheckedIn has an unexpected signature: {found}")]
    EventSignature { found: String },

    #[error("EventCheckedIn must index exactly user and eventId")]
    EventIndexing,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolCall;

    const ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn artifact(user_indexed: bool, location_type: &str) -> String {
        serde_json::json!({
            "address": ADDRESS,
            "abi": [
                {
                    "type": "event",
                    "name": "EventCheckedIn",
                    "anonymous": false,
                    "inputs": [
                        { "name": "user", "type": "address", "indexed": user_indexed },
                        { "name": "eventId", "type": "uint256", "indexed": true },
                        { "name": "location", "type": location_type, "indexed": false },
                        { "name": "timestamp", "type": "uint256", "indexed": false }
                    ]
                },
                {
                    "type": "function",
                    "name": "checkInEvent",
                    "stateMutability": "nonpayable",
                    "inputs": [
                        { "name": "eventId", "type": "uint256" },
                        { "name": "location", "type": "string" }
                    ],
                    "outputs": []
                }
            ]
        })
        .to_string()
    }

    #[test]
    fn loads_valid_artifact() {
        let descriptor = ContractDescriptor::from_json(&artifact(true, "string")).unwrap();
        assert_eq!(descriptor.address(), Address::from_str(ADDRESS).unwrap());
    }

    #[test]
    fn artifact_declares_check_in_entry_point() {
        let artifact: DeploymentArtifact =
            serde_json::from_str(&artifact(true, "string")).unwrap();
        let functions = artifact.abi.function("checkInEvent").expect("checkInEvent in ABI");
        assert_eq!(
            functions[0].selector().0,
            IProofOfPresence::checkInEventCall::SELECTOR
        );
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ProofOfPresence.json");
        std::fs::write(&path, artifact(true, "string")).unwrap();
        assert!(ContractDescriptor::load(&path).is_ok());

        let missing = ContractDescriptor::load(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(ContractError::Read { .. })));
    }

    #[test]
    fn rejects_wrong_signature() {
        let err = ContractDescriptor::from_json(&artifact(true, "bytes32")).unwrap_err();
        assert!(matches!(err, ContractError::EventSignature { .. }));
    }

    #[test]
    fn rejects_wrong_indexing() {
        let err = ContractDescriptor::from_json(&artifact(false, "string")).unwrap_err();
        assert!(matches!(err, ContractError::EventIndexing));
    }

    #[test]
    fn rejects_missing_event_and_bad_address() {
        let no_event = serde_json::json!({ "address": ADDRESS, "abi": [] }).to_string();
        assert!(matches!(
            ContractDescriptor::from_json(&no_event),
            Err(ContractError::MissingEvent)
        ));

        let bad_address = artifact(true, "string").replace(ADDRESS, "0x1234");
        assert!(matches!(
            ContractDescriptor::from_json(&bad_address),
            Err(ContractError::InvalidAddress(_))
        ));
    }
}
