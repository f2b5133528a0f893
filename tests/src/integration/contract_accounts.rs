//! # Contract Account Sign-In
//!
//! Accounts that authorize through on-chain logic instead of a raw key.
//! [`FakeChain`] stands in for an RPC client calling `isValidSignature`.

use async_trait::async_trait;
use parking_lot::Mutex;
use siwe_auth::{Address, ContractSignatureResolver, Hash, ResolverError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// In-process resolver with a table of accepted signatures per account.
#[derive(Default)]
pub struct FakeChain {
    accepted: Mutex<HashMap<Address, Vec<u8>>>,
    latency: Mutex<Option<Duration>>,
    down: AtomicBool,
    calls: AtomicUsize,
}

impl FakeChain {
    pub fn register(&self, account: Address, signature: Vec<u8>) {
        self.accepted.lock().insert(account, signature);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContractSignatureResolver for FakeChain {
    async fn is_valid_signature(
        &self,
        account: &Address,
        _message_hash: &Hash,
        signature: &[u8],
    ) -> Result<bool, ResolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.down.load(Ordering::SeqCst) {
            return Err(ResolverError::Unavailable("rpc endpoint unreachable".into()));
        }

        Ok(self
            .accepted
            .lock()
            .get(account)
            .is_some_and(|accepted| accepted.as_slice() == signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Harness, Wallet};
    use siwe_auth::{
        AuthConfig, AuthError, AuthenticationApi, AuthenticationRequest, NonceStore,
        RejectionKind,
    };
    use std::sync::Arc;

    const SAFE: Address = Address::new([0x5a; 20]);
    const SAFE_SIGNATURE: [u8; 4] = [0xde, 0xad, 0xbe, 0xef];

    fn setup() -> (Harness, Arc<FakeChain>) {
        let chain = Arc::new(FakeChain::default());
        chain.register(SAFE, SAFE_SIGNATURE.to_vec());
        (
            Harness::with_resolver(AuthConfig::default(), chain.clone()),
            chain,
        )
    }

    /// A contract account's message with an arbitrary signature blob.
    fn contract_request(nonce: &str, signature: &[u8]) -> AuthenticationRequest {
        // Borrow a wallet only for the claim template
        let mut claim = Wallet::random().claim("example.org", nonce);
        claim.address = SAFE;
        AuthenticationRequest {
            message: claim.to_string(),
            signature: format!("0x{}", hex::encode(signature)),
            address: SAFE.to_string(),
            nonce: nonce.to_string(),
        }
    }

    #[tokio::test]
    async fn test_contract_account_signs_in() {
        let (harness, chain) = setup();
        let nonce = harness.service.issue_nonce().await.unwrap();

        let request = contract_request(&nonce.value, &SAFE_SIGNATURE);
        let identity = harness
            .service
            .authenticate(&request)
            .await
            .into_result()
            .unwrap();

        assert_eq!(identity.address, SAFE);
        assert_eq!(chain.calls(), 1);
    }

    #[tokio::test]
    async fn test_contract_rejection_is_signature_invalid() {
        let (harness, _chain) = setup();
        let nonce = harness.service.issue_nonce().await.unwrap();

        let forged = contract_request(&nonce.value, &[0x00, 0x01]);
        assert_eq!(
            harness.service.authenticate(&forged).await.into_result(),
            Err(AuthError::SignatureInvalid)
        );

        let genuine = contract_request(&nonce.value, &SAFE_SIGNATURE);
        assert!(harness.service.authenticate(&genuine).await.is_verified());
    }

    #[tokio::test]
    async fn test_resolver_outage_is_retryable_and_keeps_nonce() {
        let (harness, chain) = setup();
        let nonce = harness.service.issue_nonce().await.unwrap();
        let request = contract_request(&nonce.value, &SAFE_SIGNATURE);

        chain.set_down(true);
        let err = harness
            .service
            .authenticate(&request)
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(err.kind(), RejectionKind::VerificationError);
        assert!(err.is_retryable());

        // Same attempt once the chain is back
        chain.set_down(false);
        assert!(harness.service.authenticate(&request).await.is_verified());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_resolver_times_out_as_error() {
        let (harness, chain) = setup();
        chain.set_latency(Duration::from_secs(60));
        let nonce = harness.service.issue_nonce().await.unwrap();
        let request = contract_request(&nonce.value, &SAFE_SIGNATURE);

        let err = harness
            .service
            .authenticate(&request)
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(err.kind(), RejectionKind::VerificationError);

        assert_eq!(harness.store.validate_and_consume(&nonce.value).await, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_deadline_shorter_than_resolver_timeout() {
        let (harness, chain) = setup();
        chain.set_latency(Duration::from_secs(2));
        let nonce = harness.service.issue_nonce().await.unwrap();
        let request = contract_request(&nonce.value, &SAFE_SIGNATURE);

        let result = harness
            .service
            .authenticate_within(&request, Duration::from_millis(500))
            .await;
        assert_eq!(
            result.error().map(|e| e.kind()),
            Some(RejectionKind::VerificationError)
        );

        // With enough time the same request goes through
        assert!(harness.service.authenticate(&request).await.is_verified());
    }

    #[tokio::test]
    async fn test_key_wallets_never_reach_the_resolver() {
        let (harness, chain) = setup();
        let wallet = Wallet::random();
        let nonce = harness.service.issue_nonce().await.unwrap();

        let request = wallet.sign_in(&wallet.claim("example.org", &nonce.value));
        assert!(harness.service.authenticate(&request).await.is_verified());
        assert_eq!(chain.calls(), 0);
    }
}
