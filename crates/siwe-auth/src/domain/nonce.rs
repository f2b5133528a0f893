//! # Nonce Records
//!
//! Generation of unguessable nonces and the single-use state machine each
//! record goes through. Atomicity is the store's job: callers must hold the
//! record exclusively while calling [`NonceRecord::consume`].

use super::errors::AuthError;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;

/// Entropy per nonce, in bytes (128 bits).
pub const NONCE_BYTES: usize = 16;

/// Draw a fresh nonce from the OS CSPRNG, hex-encoded.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// One issued nonce and its lifecycle state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NonceRecord {
    pub value: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
}

impl NonceRecord {
    /// A fresh record. `expires_at` saturates at the latest representable
    /// instant instead of overflowing.
    pub fn new(value: String, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            value,
            issued_at,
            expires_at: issued_at
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            consumed: false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Whether the record can be dropped without changing any outcome.
    ///
    /// Consumed records are kept until expiry so replays inside the TTL
    /// report `NonceAlreadyUsed` instead of `NonceNotFound`.
    pub fn is_purgeable(&self, now: DateTime<Utc>) -> bool {
        self.is_expired(now)
    }

    /// Transition `consumed: false -> true`, or explain why not.
    ///
    /// Expiry is checked first: a stale nonce reports `NonceExpired` whether
    /// or not it was ever used.
    pub fn consume(&mut self, now: DateTime<Utc>) -> Result<(), AuthError> {
        if self.is_expired(now) {
            return Err(AuthError::NonceExpired);
        }
        if self.consumed {
            return Err(AuthError::NonceAlreadyUsed);
        }
        self.consumed = true;
        Ok(())
    }
}
