use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::SessionError;

/// Session lifetime: 2 hours.
pub const SESSION_DURATION_MS: u64 = 2 * 60 * 60 * 1000;

/// Minimum PIN length accepted for derivation.
pub const MIN_PIN_LENGTH: usize = 4;

/// PBKDF2-HMAC-SHA256 iteration count.
const KDF_ROUNDS: u32 = 10_000;

/// Fixed KDF salt. Changing this (or `VERSION_SALT`) rotates every derived
/// address, so both are part of the protocol and must never change within a
/// version.
const KDF_SALT: &str = "shitter-session-kdf-v1";

/// Version salt appended to the seed material.
const VERSION_SALT: &str = "shitter-session-v1";

/// A deterministically derived, memory-only Ed25519 session keypair.
///
/// Derived from `(signature, user_address, pin)`; the same triple always
/// yields the same keypair and base58 address, which is how a wallet
/// extension's signature becomes a reusable application identity without a
/// server. The signing key lives only in memory and is never serialized.
pub struct SessionWallet {
    signing_key: SigningKey,
    address: String,
    created_at: u64,
    expires_at: u64,
}

impl SessionWallet {
    /// Derive the session keypair from the user's wallet signature and PIN.
    ///
    /// Seed material is `signature || user_address || pin || VERSION_SALT`,
    /// stretched with PBKDF2-HMAC-SHA256 (10,000 rounds, fixed salt) into the
    /// 32-byte Ed25519 seed. Neither the signature nor the PIN is retained;
    /// intermediate buffers are zeroized.
    pub fn derive(
        signature: &[u8],
        user_address: &str,
        pin: &str,
        now_ms: u64,
    ) -> Result<Self, SessionError> {
        if pin.len() < MIN_PIN_LENGTH {
            return Err(SessionError::InvalidPin(MIN_PIN_LENGTH));
        }
        if signature.is_empty() {
            return Err(SessionError::Derivation("empty signature".to_string()));
        }

        let mut material = Zeroizing::new(Vec::with_capacity(
            signature.len() + user_address.len() + pin.len() + VERSION_SALT.len(),
        ));
        material.extend_from_slice(signature);
        material.extend_from_slice(user_address.as_bytes());
        material.extend_from_slice(pin.as_bytes());
        material.extend_from_slice(VERSION_SALT.as_bytes());

        let mut seed = Zeroizing::new([0u8; 32]);
        pbkdf2_hmac::<Sha256>(&material, KDF_SALT.as_bytes(), KDF_ROUNDS, &mut *seed);

        let signing_key = SigningKey::from_bytes(&seed);
        let address = bs58::encode(signing_key.verifying_key().to_bytes()).into_string();
        debug!(event = "wallet_derived", address = %address, "Derived session wallet");

        Ok(Self {
            signing_key,
            address,
            created_at: now_ms,
            expires_at: now_ms + SESSION_DURATION_MS,
        })
    }

    /// Base58 encoding of the public key.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    /// The single expiry predicate used by every entry point.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }

    /// Whole minutes left before expiry, zero once expired.
    pub fn remaining_minutes(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms) / 60_000
    }

    /// Sign a message with the session key.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for SessionWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose the signing key, even in debug output
        f.debug_struct("SessionWallet")
            .field("address", &self.address)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Verify a session-wallet signature against a base58 address.
pub fn verify_signature(address: &str, message: &[u8], signature: &[u8]) -> bool {
    let Ok(pubkey_bytes) = bs58::decode(address).into_vec() else {
        return false;
    };
    let pubkey_bytes: [u8; 32] = match pubkey_bytes.try_into() {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&pubkey_bytes) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    verifying_key.verify_strict(message, &signature).is_ok()
}
