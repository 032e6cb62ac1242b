// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-191 personal-sign signature recovery.

use alloy::primitives::{eip191_hash_message, keccak256, Address};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

/// r (32) ‖ s (32) ‖ v (1)
pub const SIGNATURE_LEN: usize = 65;

/// Recovers the address that personal-signed a message.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureVerifier;

impl SignatureVerifier {
    /// Recover the signer of `message` from a hex `signature` (`0x` optional).
    ///
    /// The message is hashed as
    /// `keccak256("\x19Ethereum Signed Message:\n" + len(message) + message)`.
    /// `v` may be 27/28 or 0/1. High-S signatures are normalised before
    /// recovery.
    pub fn recover(&self, message: &str, signature: &str) -> Result<Address, SignatureError> {
        let raw = signature.trim();
        let bytes = alloy::hex::decode(raw.strip_prefix("0x").unwrap_or(raw))
            .map_err(|_| SignatureError::Encoding)?;
        if bytes.len() != SIGNATURE_LEN {
            return Err(SignatureError::Length(bytes.len()));
        }

        let v = bytes[64];
        let parity = match v {
            0 | 1 => v,
            27 | 28 => v - 27,
            other => return Err(SignatureError::RecoveryId(other)),
        };
        let mut recovery_id =
            RecoveryId::from_byte(parity).ok_or(SignatureError::RecoveryId(v))?;

        let mut sig = Signature::from_slice(&bytes[..64]).map_err(|_| SignatureError::Malformed)?;
        if let Some(normalized) = sig.normalize_s() {
            sig = normalized;
            recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
        }

        let digest = eip191_hash_message(message.as_bytes());
        let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id)
            .map_err(|_| SignatureError::Recovery)?;

        // Uncompressed SEC1 point: 0x04 || x || y
        let point = key.to_encoded_point(false);
        let hash = keccak256(&point.as_bytes()[1..]);
        Ok(Address::from_slice(&hash[12..]))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature is not valid hex")]
    Encoding,

    #[error("signature must be 65 bytes, got {0}")]
    Length(usize),

    #[error("signature r/s values are invalid")]
    Malformed,

    #[error("unsupported recovery id {0}")]
    RecoveryId(u8),

    #[error("public key recovery failed")]
    Recovery,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};
    use std::str::FromStr;

    /// Well-known development key #1; address 0x7099...79C8.
    pub(crate) const DEV_KEY: &str =
        "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    /// Development key #2; address 0x3C44...93BC.
    pub(crate) const OTHER_KEY: &str =
        "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";

    pub(crate) fn sign(key: &str, message: &str) -> String {
        let signer = PrivateKeySigner::from_str(key).unwrap();
        let sig = signer.sign_message_sync(message.as_bytes()).unwrap();
        alloy::hex::encode_prefixed(sig.as_bytes())
    }

    fn address_of(key: &str) -> Address {
        PrivateKeySigner::from_str(key).unwrap().address()
    }

    #[test]
    fn recovers_signer() {
        let message = "Login nonce: 8f1c2a";
        let sig = sign(DEV_KEY, message);
        let recovered = SignatureVerifier.recover(message, &sig).unwrap();
        assert_eq!(recovered, address_of(DEV_KEY));
        assert_eq!(
            recovered.to_checksum(None),
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
        );
    }

    #[test]
    fn accepts_unprefixed_and_zero_based_v() {
        let message = "nonce-42";
        let sig = sign(DEV_KEY, message);
        let mut bytes = alloy::hex::decode(&sig[2..]).unwrap();
        bytes[64] -= 27;

        let recovered = SignatureVerifier
            .recover(message, &alloy::hex::encode(&bytes))
            .unwrap();
        assert_eq!(recovered, address_of(DEV_KEY));
    }

    #[test]
    fn normalizes_high_s() {
        let message = "malleable";
        let sig = sign(DEV_KEY, message);
        let bytes = alloy::hex::decode(&sig[2..]).unwrap();
        let low = Signature::from_slice(&bytes[..64]).unwrap();
        let high = Signature::from_scalars(low.r(), -low.s()).unwrap();

        let mut flipped = high.to_bytes().to_vec();
        flipped.push(if bytes[64] == 27 { 28 } else { 27 });

        let recovered = SignatureVerifier
            .recover(message, &alloy::hex::encode_prefixed(&flipped))
            .unwrap();
        assert_eq!(recovered, address_of(DEV_KEY));
    }

    #[test]
    fn different_message_recovers_different_address() {
        let sig = sign(DEV_KEY, "nonce-a");
        let recovered = SignatureVerifier.recover("nonce-b", &sig).unwrap();
        assert_ne!(recovered, address_of(DEV_KEY));
    }

    #[test]
    fn rejects_malformed_signatures() {
        let v = SignatureVerifier;
        assert_eq!(v.recover("m", "0xzz"), Err(SignatureError::Encoding));
        assert_eq!(
            v.recover("m", &format!("0x{}", "11".repeat(64))),
            Err(SignatureError::Length(64))
        );

        let mut bad_v = alloy::hex::decode(&sign(DEV_KEY, "m")[2..]).unwrap();
        bad_v[64] = 5;
        assert_eq!(
            v.recover("m", &alloy::hex::encode(&bad_v)),
            Err(SignatureError::RecoveryId(5))
        );

        let zeros = format!("0x{}1b", "00".repeat(64));
        assert_eq!(v.recover("m", &zeros), Err(SignatureError::Malformed));
    }
}
