//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API that the login flow calls
//! - **Outbound (Driven)**: Nonce storage, on-chain resolution, time

pub mod inbound;
pub mod outbound;
