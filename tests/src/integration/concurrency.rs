//! # Concurrent Sign-In
//!
//! Duplicate submissions racing on one nonce, and unrelated sign-ins
//! sharing one store.

#[cfg(test)]
mod tests {
    use crate::fixtures::{Harness, Wallet};
    use futures::future::join_all;
    use siwe_auth::{AuthError, AuthenticationApi};
    use std::sync::Arc;

    const RACERS: usize = 64;

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_same_nonce_exactly_one_winner() {
        for _ in 0..10 {
            let harness = Harness::default();
            let wallet = Wallet::random();
            let nonce = harness.service.issue_nonce().await.unwrap();
            let request = Arc::new(wallet.sign_in(&wallet.claim("example.org", &nonce.value)));

            let handles: Vec<_> = (0..RACERS)
                .map(|_| {
                    let service = harness.service.clone();
                    let request = request.clone();
                    tokio::spawn(async move { service.authenticate(&request).await })
                })
                .collect();

            let mut successes = 0;
            let mut already_used = 0;
            for handle in handles {
                match handle.await.unwrap().into_result() {
                    Ok(_) => successes += 1,
                    Err(AuthError::NonceAlreadyUsed) => already_used += 1,
                    Err(other) => panic!("unexpected rejection: {other}"),
                }
            }

            assert_eq!(successes, 1);
            assert_eq!(already_used, RACERS - 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_independent_sign_ins_all_succeed() {
        let harness = Harness::default();

        let mut requests = Vec::new();
        for _ in 0..RACERS {
            let wallet = Wallet::random();
            let nonce = harness.service.issue_nonce().await.unwrap();
            requests.push(wallet.sign_in(&wallet.claim("example.org", &nonce.value)));
        }

        let results = join_all(requests.iter().map(|request| {
            let service = harness.service.clone();
            async move { service.authenticate(request).await }
        }))
        .await;

        assert!(results.iter().all(|r| r.is_verified()));
        assert_eq!(harness.store.len(), RACERS);
    }
}
