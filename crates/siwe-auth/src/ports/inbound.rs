//! # Inbound Ports (Driving Ports / API)
//!
//! The surface the login flow calls: ask for a nonce, then hand back what
//! the wallet signed.

use crate::domain::entities::{AuthenticationRequest, VerificationResult};
use crate::domain::errors::AuthError;
use crate::domain::nonce::NonceRecord;
use async_trait::async_trait;
use std::time::Duration;

/// Primary wallet sign-in API.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait AuthenticationApi: Send + Sync {
    /// Issue a nonce for a new login attempt.
    ///
    /// The caller embeds `record.value` in the message the wallet signs.
    async fn issue_nonce(&self) -> Result<NonceRecord, AuthError>;

    /// Verify a signed message and consume its nonce.
    ///
    /// Never panics and never returns a bare error: every failure is a
    /// `VerificationResult::Rejected` carrying the reason.
    async fn authenticate(&self, request: &AuthenticationRequest) -> VerificationResult;

    /// Same as [`authenticate`](Self::authenticate) with an explicit
    /// deadline for everything up to and including signature verification.
    async fn authenticate_within(
        &self,
        request: &AuthenticationRequest,
        deadline: Duration,
    ) -> VerificationResult;
}
