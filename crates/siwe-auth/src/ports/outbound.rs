//! # Outbound Ports (Driven Ports / SPI)
//!
//! Traits that define dependencies this crate needs: somewhere to keep
//! nonces, a way to ask the chain about contract accounts, and a clock.

use crate::domain::entities::{Address, Hash};
use crate::domain::errors::AuthError;
use crate::domain::nonce::NonceRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

// =============================================================================
// Nonce Store
// =============================================================================

/// Issues and tracks single-use, time-bounded nonces.
///
/// # Atomicity
///
/// `validate_and_consume` must be linearizable with respect to the
/// consumed flag. Under concurrent calls with the same nonce exactly one
/// caller may observe `Ok(())`; every other caller observes
/// `NonceAlreadyUsed`. Check-then-set must happen as one step, whatever the
/// backing store.
#[async_trait]
pub trait NonceStore: Send + Sync {
    /// Generate, record and return a fresh nonce.
    ///
    /// # Errors
    /// * `AuthError::NonceStoreFull` - capacity reached even after purging
    async fn issue(&self) -> Result<NonceRecord, AuthError>;

    /// Mark `nonce` consumed if it is live and unused.
    ///
    /// # Errors
    /// * `AuthError::NonceNotFound` - never issued, purged, or forged
    /// * `AuthError::NonceExpired` - past its expiry
    /// * `AuthError::NonceAlreadyUsed` - consumed by an earlier call
    async fn validate_and_consume(&self, nonce: &str) -> Result<(), AuthError>;

    /// Drop expired records. Returns how many were removed.
    async fn purge_expired(&self) -> usize;
}

// =============================================================================
// Contract Signature Resolver
// =============================================================================

/// Error from the on-chain resolution capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolverError {
    /// The RPC endpoint could not be reached
    #[error("Resolver unavailable: {0}")]
    Unavailable(String),

    /// The call reached the chain but failed
    #[error("Resolver call failed: {0}")]
    CallFailed(String),
}

/// Verifies signatures for accounts whose authorization logic lives
/// on-chain (EIP-1271 `isValidSignature`).
///
/// Implementations wrap a blockchain RPC client. They return `Ok(false)`
/// when the account is not a contract or rejects the signature, and an
/// error only when the answer could not be obtained.
#[async_trait]
pub trait ContractSignatureResolver: Send + Sync {
    async fn is_valid_signature(
        &self,
        account: &Address,
        message_hash: &Hash,
        signature: &[u8],
    ) -> Result<bool, ResolverError>;
}

// =============================================================================
// Time Source
// =============================================================================

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockTimeSource {
    millis: std::sync::atomic::AtomicI64,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockTimeSource {
    pub fn new(initial: DateTime<Utc>) -> Self {
        Self {
            millis: std::sync::atomic::AtomicI64::new(initial.timestamp_millis()),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.millis
            .fetch_add(by.num_milliseconds(), std::sync::atomic::Ordering::SeqCst);
    }

    pub fn set(&self, time: DateTime<Utc>) {
        self.millis
            .store(time.timestamp_millis(), std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl TimeSource for MockTimeSource {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.millis.load(std::sync::atomic::Ordering::SeqCst);
        DateTime::from_timestamp_millis(millis).unwrap_or_default()
    }
}
