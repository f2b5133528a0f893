//! # Domain Layer
//!
//! Pure logic with no I/O dependencies: message grammar, secp256k1
//! recovery and the nonce state machine.
//! This is the inner layer of the hexagonal architecture.

pub mod ecdsa;
pub mod entities;
pub mod errors;
pub mod message;
pub mod nonce;
