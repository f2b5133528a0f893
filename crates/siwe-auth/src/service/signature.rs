//! # Signature Verifier
//!
//! Answers "did this address authorize these exact bytes?".
//!
//! A `false` verdict means the signature does not match. An `Err` means the
//! question could not be answered, which only happens on the contract
//! account path when the resolver fails or runs out of time.

use crate::domain::ecdsa::{hash_personal_message, verify_personal_signature};
use crate::domain::entities::{Address, EcdsaSignature};
use crate::domain::errors::AuthError;
use crate::ports::outbound::ContractSignatureResolver;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default budget for one resolver call.
pub const DEFAULT_RESOLVER_TIMEOUT: Duration = Duration::from_secs(5);

/// Key-recovery verifier with an optional contract account fallback.
#[derive(Clone)]
pub struct SignatureVerifier {
    resolver: Option<Arc<dyn ContractSignatureResolver>>,
    resolver_timeout: Duration,
}

impl Default for SignatureVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureVerifier {
    /// Verifier for externally owned accounts only.
    pub fn new() -> Self {
        Self {
            resolver: None,
            resolver_timeout: DEFAULT_RESOLVER_TIMEOUT,
        }
    }

    /// Verifier that falls back to `resolver` when key recovery does not
    /// yield the claimed address.
    pub fn with_resolver(
        resolver: Arc<dyn ContractSignatureResolver>,
        resolver_timeout: Duration,
    ) -> Self {
        Self {
            resolver: Some(resolver),
            resolver_timeout,
        }
    }

    pub fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    /// Check `signature` over the exact `message` bytes against `address`.
    ///
    /// # Errors
    /// * `AuthError::VerificationError` - the resolver failed or timed out
    pub async fn verify(
        &self,
        address: &Address,
        message: &[u8],
        signature: &str,
    ) -> Result<bool, AuthError> {
        let digits = signature.strip_prefix("0x").unwrap_or(signature);
        let raw = match hex::decode(digits) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(%address, error = %e, "Signature is not valid hex");
                return Ok(false);
            }
        };

        match EcdsaSignature::from_bytes(&raw)
            .and_then(|sig| verify_personal_signature(message, &sig, address))
        {
            Ok(true) => return Ok(true),
            Ok(false) => debug!(%address, "Recovered signer differs from claimed address"),
            Err(e) => debug!(%address, error = %e, "Signature rejected by key recovery"),
        }

        let Some(resolver) = &self.resolver else {
            return Ok(false);
        };

        let digest = hash_personal_message(message);
        match tokio::time::timeout(
            self.resolver_timeout,
            resolver.is_valid_signature(address, &digest, &raw),
        )
        .await
        {
            Ok(Ok(valid)) => {
                debug!(%address, valid, "Contract account verdict");
                Ok(valid)
            }
            Ok(Err(e)) => {
                warn!(%address, error = %e, "Contract signature resolver failed");
                Err(AuthError::VerificationError(e.to_string()))
            }
            Err(_) => {
                warn!(
                    %address,
                    timeout_ms = self.resolver_timeout.as_millis() as u64,
                    "Contract signature resolver timed out"
                );
                Err(AuthError::VerificationError(format!(
                    "resolver did not answer within {:?}",
                    self.resolver_timeout
                )))
            }
        }
    }
}
