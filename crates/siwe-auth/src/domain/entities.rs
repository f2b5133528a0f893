//! # Domain Entities
//!
//! Core data structures for wallet sign-in.

use super::ecdsa::keccak256;
use super::errors::AuthError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 32-byte Keccak-256 digest.
pub type Hash = [u8; 32];

// =============================================================================
// Address
// =============================================================================

/// Ethereum-style account address (last 20 bytes of keccak256(pubkey)).
///
/// Parsing accepts all-lowercase or all-uppercase hex without a checksum;
/// mixed case must be a valid EIP-55 checksum. Display always renders the
/// checksummed form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// EIP-55 mixed-case checksum encoding, `0x` prefixed.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let digest = keccak256(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (digest[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Address {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| AuthError::malformed("address must start with 0x"))?;

        if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AuthError::malformed("address must be 40 hex digits"));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| AuthError::malformed(format!("address: {e}")))?;
        let address = Self(bytes);

        let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
        let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
        if has_lower && has_upper && address.to_checksum()[2..] != *digits {
            return Err(AuthError::malformed("address has an invalid EIP-55 checksum"));
        }

        Ok(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// ECDSA Types (secp256k1)
// =============================================================================

/// Recoverable ECDSA signature on the secp256k1 curve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EcdsaSignature {
    /// R component (32 bytes)
    pub r: [u8; 32],
    /// S component (32 bytes)
    pub s: [u8; 32],
    /// Recovery ID (0, 1, 27, or 28)
    pub v: u8,
}

// =============================================================================
// Authentication Claim
// =============================================================================

/// Format version of the sign-in message. Only version 1 exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageVersion {
    V1,
}

impl MessageVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "1",
        }
    }
}

impl FromStr for MessageVersion {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(Self::V1),
            other => Err(AuthError::UnsupportedVersion(other.to_string())),
        }
    }
}

/// Structured fields recovered from a signed sign-in message.
///
/// Unknown fields are dropped by the parser; this is the closed set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticationClaim {
    /// Domain requesting the sign-in (RFC 3986 authority)
    pub domain: String,
    /// Account that is signing in
    pub address: Address,
    /// Human-readable assertion the user agrees to
    pub statement: Option<String>,
    /// URI of the resource that is the subject of the sign-in
    pub uri: String,
    pub version: MessageVersion,
    /// EIP-155 chain identifier
    pub chain_id: u64,
    /// Single-use token issued by the server for this attempt
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub not_before: Option<DateTime<Utc>>,
    pub request_id: Option<String>,
    pub resources: Vec<String>,
}

// =============================================================================
// Verification Result
// =============================================================================

/// Identity established by a successful authentication.
///
/// Only the orchestrator constructs this, after every check has passed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerifiedIdentity {
    pub address: Address,
    pub domain: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub request_id: Option<String>,
}

impl VerifiedIdentity {
    pub(crate) fn from_claim(claim: AuthenticationClaim) -> Self {
        Self {
            address: claim.address,
            domain: claim.domain,
            chain_id: claim.chain_id,
            nonce: claim.nonce,
            issued_at: claim.issued_at,
            expiration_time: claim.expiration_time,
            request_id: claim.request_id,
        }
    }
}

/// Outcome of one authentication attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationResult {
    Verified(VerifiedIdentity),
    Rejected(AuthError),
}

impl VerificationResult {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }

    pub fn identity(&self) -> Option<&VerifiedIdentity> {
        match self {
            Self::Verified(identity) => Some(identity),
            Self::Rejected(_) => None,
        }
    }

    pub fn error(&self) -> Option<&AuthError> {
        match self {
            Self::Verified(_) => None,
            Self::Rejected(err) => Some(err),
        }
    }

    pub fn into_result(self) -> Result<VerifiedIdentity, AuthError> {
        self.into()
    }
}

impl From<Result<VerifiedIdentity, AuthError>> for VerificationResult {
    fn from(result: Result<VerifiedIdentity, AuthError>) -> Self {
        match result {
            Ok(identity) => Self::Verified(identity),
            Err(err) => Self::Rejected(err),
        }
    }
}

impl From<VerificationResult> for Result<VerifiedIdentity, AuthError> {
    fn from(result: VerificationResult) -> Self {
        match result {
            VerificationResult::Verified(identity) => Ok(identity),
            VerificationResult::Rejected(err) => Err(err),
        }
    }
}

/// Inputs to one authentication attempt, as supplied by the wallet integration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AuthenticationRequest {
    /// Raw signed message text, byte-for-byte as the wallet signed it
    pub message: String,
    /// Hex-encoded signature (65-byte or 64-byte compact)
    pub signature: String,
    /// Address the wallet claims to control
    pub address: String,
    /// Nonce issued to this client for this attempt
    pub nonce: String,
}
