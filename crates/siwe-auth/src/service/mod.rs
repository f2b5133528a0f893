//! # Application Services
//!
//! Wire the domain logic to the ports.

pub mod authenticator;
pub mod replay;
pub mod signature;

pub use authenticator::AuthenticationService;
pub use replay::ReplayGuard;
pub use signature::SignatureVerifier;
