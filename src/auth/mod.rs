// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet Authentication
//!
//! Login is a signed challenge: the client personal-signs a one-time nonce
//! with the wallet key and submits `(address, signature, nonce)`. The server
//! recovers the signer and accepts the login only if it matches the claimed
//! address. First-time wallets get a [`WalletIdentity`] on the spot.
//!
//! Nonce issuance and expiry are owned by the client flow; the server only
//! checks that the signature covers the submitted nonce.

pub mod error;
pub mod signature;

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::Address;

pub use error::AuthError;
pub use signature::{SignatureError, SignatureVerifier};

use crate::storage::{PresenceDatabase, WalletIdentity};
use crate::validation::is_wallet_address;

/// Outcome of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedWallet {
    pub identity: WalletIdentity,
    /// Whether this login created the identity
    pub created: bool,
    pub total_checkins: u64,
}

/// Turns signed login challenges into wallet identities.
#[derive(Clone)]
pub struct IdentityGateway {
    db: Arc<PresenceDatabase>,
    verifier: SignatureVerifier,
}

impl IdentityGateway {
    pub fn new(db: Arc<PresenceDatabase>) -> Self {
        Self {
            db,
            verifier: SignatureVerifier,
        }
    }

    /// Authenticate a wallet by its signature over `nonce`.
    pub fn authenticate(
        &self,
        address: &str,
        signature: &str,
        nonce: &str,
    ) -> Result<AuthenticatedWallet, AuthError> {
        let address = address.trim();
        if address.is_empty() || signature.trim().is_empty() || nonce.is_empty() {
            return Err(AuthError::MissingParameters);
        }
        if !is_wallet_address(address) {
            return Err(AuthError::InvalidAddressFormat);
        }
        let claimed = Address::from_str(address).map_err(|_| AuthError::InvalidAddressFormat)?;

        let recovered = self
            .verifier
            .recover(nonce, signature)
            .map_err(|e| {
                tracing::debug!(wallet = %claimed, error = %e, "Login signature rejected");
                AuthError::InvalidSignature(e)
            })?;

        if recovered != claimed {
            tracing::warn!(
                wallet = %claimed,
                recovered = %recovered,
                "Login signature made by a different wallet"
            );
            return Err(AuthError::SignatureMismatch);
        }

        let (identity, created) = self.db.get_or_create_identity(claimed)?;
        let total_checkins = self.db.count_checkins(claimed)?;

        tracing::info!(wallet = %identity.address, created, "Wallet authenticated");

        Ok(AuthenticatedWallet {
            identity,
            created,
            total_checkins,
        })
    }
}
