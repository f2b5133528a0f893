//! # Sign-In with Ethereum Verification
//!
//! Proves that a wallet controls an account address by checking a signed,
//! structured sign-in message, and makes each proof single-use.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): message grammar, secp256k1 recovery, nonce state. No I/O
//! - **Ports Layer** (`ports/`): trait definitions for inbound/outbound interfaces
//! - **Adapters Layer** (`adapters/`): in-memory nonce store
//! - **Service Layer** (`service/`): signature verifier, replay guard, orchestrator
//!
//! ## Flow
//!
//! ```rust,ignore
//! use siwe_auth::{AuthConfig, AuthenticationApi, AuthenticationRequest, AuthenticationService};
//!
//! let service = AuthenticationService::in_memory(AuthConfig::default());
//!
//! // 1. Hand the client a nonce to embed in the message
//! let nonce = service.issue_nonce().await?.value;
//!
//! // 2. Verify what the wallet signed
//! let result = service
//!     .authenticate(&AuthenticationRequest { message, signature, address, nonce })
//!     .await;
//! ```
//!
//! ## Security Notes
//!
//! - **Exact bytes**: signatures are checked over the message as received
//! - **Malleability Prevention (EIP-2)**: signatures with high S values are rejected
//! - **Ordering**: the nonce is consumed only after the signature verifies,
//!   so failed forgeries cannot burn a legitimate nonce
//! - **Single use**: concurrent attempts with one nonce have exactly one winner

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;
pub mod telemetry;

// Re-export public API
pub use adapters::memory_store::InMemoryNonceStore;
pub use config::{AuthConfig, ConfigError};
pub use domain::ecdsa::{address_from_pubkey, hash_personal_message, keccak256};
pub use domain::entities::{
    Address, AuthenticationClaim, AuthenticationRequest, EcdsaSignature, Hash, MessageVersion,
    VerificationResult, VerifiedIdentity,
};
pub use domain::errors::{AuthError, RejectionKind, SignatureError, GENERIC_FAILURE_MESSAGE};
pub use domain::message::{parse_message, parse_message_with_limit, DEFAULT_MAX_MESSAGE_BYTES};
pub use domain::nonce::{generate_nonce, NonceRecord};
pub use ports::inbound::AuthenticationApi;
pub use ports::outbound::{
    ContractSignatureResolver, NonceStore, ResolverError, SystemTimeSource, TimeSource,
};
pub use service::{AuthenticationService, ReplayGuard, SignatureVerifier};
pub use telemetry::{init_tracing, TelemetryConfig, TelemetryError};

#[cfg(any(test, feature = "test-utils"))]
pub use domain::ecdsa::test_helpers;
#[cfg(any(test, feature = "test-utils"))]
pub use ports::outbound::MockTimeSource;
