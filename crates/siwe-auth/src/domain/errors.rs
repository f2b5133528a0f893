//! # Authentication Errors
//!
//! Every way an authentication attempt can be rejected. The orchestrator
//! folds all of these into a single [`VerificationResult`], so nothing here
//! ever crosses into the calling layer as a panic.
//!
//! [`VerificationResult`]: super::entities::VerificationResult

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Generic text for end users. Specific reasons stay in audit logs.
pub const GENERIC_FAILURE_MESSAGE: &str = "Sign-in failed. Please restart sign-in and try again.";

/// Errors that can occur while authenticating a signed message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// A required input (message, signature, address, nonce) was empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The message does not follow the sign-in template
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// The `Version:` field names a format version we do not understand
    #[error("Unsupported message version: {0}")]
    UnsupportedVersion(String),

    /// The address inside the message differs from the caller-asserted one
    #[error("Address mismatch: message asserts {message}, caller claims {claimed}")]
    AddressMismatch { message: String, claimed: String },

    /// The message was issued for a different domain than this service
    #[error("Domain mismatch: expected {expected}, got {actual}")]
    DomainMismatch { expected: String, actual: String },

    /// The signature does not authorize this message for this address
    #[error("Signature verification failed")]
    SignatureInvalid,

    /// The signature check could not be completed (resolver failure, timeout)
    #[error("Signature could not be verified: {0}")]
    VerificationError(String),

    /// The message carries a different nonce than the one issued for this attempt
    #[error("Nonce mismatch: expected {expected}, got {actual}")]
    NonceMismatch { expected: String, actual: String },

    /// The nonce was never issued, or has been purged
    #[error("Nonce not found")]
    NonceNotFound,

    /// The nonce outlived its time-to-live
    #[error("Nonce expired")]
    NonceExpired,

    /// The nonce was already consumed by an earlier authentication
    #[error("Nonce already used")]
    NonceAlreadyUsed,

    /// The nonce store refused to issue a new nonce
    #[error("Nonce store is full ({capacity} outstanding nonces)")]
    NonceStoreFull { capacity: usize },

    /// The message's `Expiration Time` has passed
    #[error("Message expired")]
    MessageExpired,

    /// The message's `Not Before` time has not been reached yet
    #[error("Message not yet valid")]
    MessageNotYetValid,
}

/// Field-free discriminant of [`AuthError`], for branching and audit records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    MissingField,
    MalformedMessage,
    UnsupportedVersion,
    AddressMismatch,
    DomainMismatch,
    SignatureInvalid,
    VerificationError,
    NonceMismatch,
    NonceNotFound,
    NonceExpired,
    NonceAlreadyUsed,
    NonceStoreFull,
    MessageExpired,
    MessageNotYetValid,
}

impl AuthError {
    /// The kind of this error, without its details.
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::MissingField(_) => RejectionKind::MissingField,
            Self::MalformedMessage(_) => RejectionKind::MalformedMessage,
            Self::UnsupportedVersion(_) => RejectionKind::UnsupportedVersion,
            Self::AddressMismatch { .. } => RejectionKind::AddressMismatch,
            Self::DomainMismatch { .. } => RejectionKind::DomainMismatch,
            Self::SignatureInvalid => RejectionKind::SignatureInvalid,
            Self::VerificationError(_) => RejectionKind::VerificationError,
            Self::NonceMismatch { .. } => RejectionKind::NonceMismatch,
            Self::NonceNotFound => RejectionKind::NonceNotFound,
            Self::NonceExpired => RejectionKind::NonceExpired,
            Self::NonceAlreadyUsed => RejectionKind::NonceAlreadyUsed,
            Self::NonceStoreFull { .. } => RejectionKind::NonceStoreFull,
            Self::MessageExpired => RejectionKind::MessageExpired,
            Self::MessageNotYetValid => RejectionKind::MessageNotYetValid,
        }
    }

    /// Whether the same attempt may be retried.
    ///
    /// Only infrastructure failures qualify. Semantic rejections require a
    /// fresh nonce and a new signature.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::VerificationError(_))
    }

    /// Text safe to show to an end user.
    pub fn user_message(&self) -> &'static str {
        GENERIC_FAILURE_MESSAGE
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage(reason.into())
    }
}

/// Low-level reasons a signature fails cryptographic checks.
///
/// These never leave the crate as a rejection on their own: the signature
/// verifier logs them and reports a negative verdict.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// Not valid hex, or not 64/65 bytes long
    #[error("Invalid signature encoding: {0}")]
    InvalidEncoding(String),

    /// R or S outside [1, n-1], or R not an x-coordinate on the curve
    #[error("Invalid signature format")]
    InvalidFormat,

    /// Signature has high S value (EIP-2 malleability protection)
    #[error("Malleable signature (high S value)")]
    MalleableSignature,

    /// Invalid recovery ID (v must be 0, 1, 27, or 28)
    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// Failed to recover public key from signature
    #[error("Failed to recover public key")]
    RecoveryFailed,
}
