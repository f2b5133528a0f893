//! # Replay Guard
//!
//! Last gate before a sign-in is accepted. Checks the message's own
//! validity window, then burns its nonce.

use crate::domain::entities::AuthenticationClaim;
use crate::domain::errors::AuthError;
use crate::ports::outbound::{NonceStore, TimeSource};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Couples a claim's temporal bounds with single-use nonce consumption.
pub struct ReplayGuard<S: NonceStore> {
    store: Arc<S>,
    time: Arc<dyn TimeSource>,
}

impl<S: NonceStore> Clone for ReplayGuard<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            time: self.time.clone(),
        }
    }
}

impl<S: NonceStore> ReplayGuard<S> {
    pub fn new(store: Arc<S>, time: Arc<dyn TimeSource>) -> Self {
        Self { store, time }
    }

    /// Check `Expiration Time` / `Not Before`, then consume the claim's nonce.
    ///
    /// The window is checked first so an out-of-window message never burns
    /// its nonce.
    ///
    /// # Errors
    /// * `AuthError::MessageExpired` / `AuthError::MessageNotYetValid`
    /// * Any `NonceStore::validate_and_consume` failure
    pub async fn check_and_consume(&self, claim: &AuthenticationClaim) -> Result<(), AuthError> {
        check_validity_window(claim, self.time.now())?;
        self.store.validate_and_consume(&claim.nonce).await
    }
}

/// Whether `now` falls inside the window the signer put in the message.
///
/// `Expiration Time` is exclusive and `Not Before` inclusive.
pub fn check_validity_window(
    claim: &AuthenticationClaim,
    now: DateTime<Utc>,
) -> Result<(), AuthError> {
    if let Some(expiration_time) = claim.expiration_time {
        if now >= expiration_time {
            return Err(AuthError::MessageExpired);
        }
    }

    if let Some(not_before) = claim.not_before {
        if now < not_before {
            return Err(AuthError::MessageNotYetValid);
        }
    }

    Ok(())
}
