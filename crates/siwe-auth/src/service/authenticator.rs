//! # Authentication Service
//!
//! Application service that implements [`AuthenticationApi`].
//!
//! ## Check Order
//!
//! 1. Required inputs present
//! 2. Message parses (and names the expected domain, if configured)
//! 3. Message address equals the claimed address
//! 4. Signature verifies over the exact message bytes
//! 5. Message nonce equals the nonce issued for this attempt
//! 6. Validity window holds, then the nonce is consumed
//!
//! Steps 2 to 4 run under the attempt deadline. Nothing before step 6 has
//! side effects, so a caller who cannot produce a valid signature can never
//! burn someone else's nonce.

use crate::adapters::memory_store::InMemoryNonceStore;
use crate::config::AuthConfig;
use crate::domain::entities::{
    Address, AuthenticationClaim, AuthenticationRequest, VerificationResult, VerifiedIdentity,
};
use crate::domain::errors::AuthError;
use crate::domain::message::parse_message_with_limit;
use crate::domain::nonce::NonceRecord;
use crate::ports::inbound::AuthenticationApi;
use crate::ports::outbound::{ContractSignatureResolver, NonceStore, SystemTimeSource, TimeSource};
use crate::service::replay::ReplayGuard;
use crate::service::signature::SignatureVerifier;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Wallet sign-in orchestrator.
pub struct AuthenticationService<S: NonceStore> {
    store: Arc<S>,
    verifier: SignatureVerifier,
    guard: ReplayGuard<S>,
    config: AuthConfig,
}

impl AuthenticationService<InMemoryNonceStore> {
    /// Service backed by a process-local nonce store and the system clock.
    pub fn in_memory(config: AuthConfig) -> Self {
        let time: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
        let store = Arc::new(InMemoryNonceStore::with_config(&config, time.clone()));
        Self::new(store, time, config)
    }
}

impl<S: NonceStore> AuthenticationService<S> {
    pub fn new(store: Arc<S>, time: Arc<dyn TimeSource>, config: AuthConfig) -> Self {
        Self {
            guard: ReplayGuard::new(store.clone(), time),
            store,
            verifier: SignatureVerifier::new(),
            config,
        }
    }

    /// Enable contract account sign-in through `resolver`, bounded by
    /// `resolver_timeout_ms`.
    pub fn with_resolver(mut self, resolver: Arc<dyn ContractSignatureResolver>) -> Self {
        self.verifier = SignatureVerifier::with_resolver(resolver, self.config.resolver_timeout());
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    async fn run(
        &self,
        request: &AuthenticationRequest,
        deadline: Duration,
    ) -> Result<VerifiedIdentity, AuthError> {
        require(&request.message, "message")?;
        require(&request.signature, "signature")?;
        require(&request.address, "address")?;
        require(&request.nonce, "nonce")?;

        let claim = tokio::time::timeout(deadline, self.verify_signed_claim(request))
            .await
            .map_err(|_| {
                AuthError::VerificationError(format!("attempt exceeded deadline of {deadline:?}"))
            })??;

        if claim.nonce != request.nonce {
            return Err(AuthError::NonceMismatch {
                expected: request.nonce.clone(),
                actual: claim.nonce,
            });
        }

        self.guard.check_and_consume(&claim).await?;

        Ok(VerifiedIdentity::from_claim(claim))
    }

    async fn verify_signed_claim(
        &self,
        request: &AuthenticationRequest,
    ) -> Result<AuthenticationClaim, AuthError> {
        let claim = parse_message_with_limit(&request.message, self.config.max_message_bytes)?;

        if let Some(expected) = &self.config.expected_domain {
            if claim.domain != *expected {
                return Err(AuthError::DomainMismatch {
                    expected: expected.clone(),
                    actual: claim.domain,
                });
            }
        }

        let address_mismatch = || AuthError::AddressMismatch {
            message: claim.address.to_string(),
            claimed: request.address.clone(),
        };
        let claimed: Address = request
            .address
            .trim()
            .parse()
            .map_err(|_| address_mismatch())?;
        if claimed != claim.address {
            return Err(address_mismatch());
        }

        let valid = self
            .verifier
            .verify(
                &claim.address,
                request.message.as_bytes(),
                request.signature.trim(),
            )
            .await?;
        if !valid {
            return Err(AuthError::SignatureInvalid);
        }

        debug!(address = %claim.address, nonce = %claim.nonce, "Signature verified");
        Ok(claim)
    }
}

#[async_trait]
impl<S: NonceStore> AuthenticationApi for AuthenticationService<S> {
    async fn issue_nonce(&self) -> Result<NonceRecord, AuthError> {
        match self.store.issue().await {
            Ok(record) => Ok(record),
            Err(e) => {
                warn!(error = %e, "Failed to issue nonce");
                Err(e)
            }
        }
    }

    async fn authenticate(&self, request: &AuthenticationRequest) -> VerificationResult {
        self.authenticate_within(request, self.config.attempt_deadline())
            .await
    }

    async fn authenticate_within(
        &self,
        request: &AuthenticationRequest,
        deadline: Duration,
    ) -> VerificationResult {
        let result = self.run(request, deadline).await;

        match &result {
            Ok(identity) => info!(
                address = %identity.address,
                domain = %identity.domain,
                chain_id = identity.chain_id,
                "Authentication succeeded"
            ),
            Err(e) => warn!(
                kind = ?e.kind(),
                reason = %e,
                claimed_address = %request.address,
                "Authentication rejected"
            ),
        }

        result.into()
    }
}

fn require(value: &str, field: &'static str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(())
}
