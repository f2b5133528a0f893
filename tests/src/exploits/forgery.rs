//! # Signature Forgery
//!
//! Wrong signers, malleated signatures and junk encodings.

#[cfg(test)]
mod tests {
    use crate::fixtures::{Harness, Wallet};
    use siwe_auth::domain::ecdsa::invert_s;
    use siwe_auth::{AuthError, AuthenticationApi, EcdsaSignature, RejectionKind};

    #[tokio::test]
    async fn test_message_for_a_signed_by_b() {
        let harness = Harness::default();
        let victim = Wallet::random();
        let attacker = Wallet::random();
        let nonce = harness.service.issue_nonce().await.unwrap();

        let mut request = victim.sign_in(&victim.claim("example.org", &nonce.value));
        request.signature = attacker.sign(&request.message);

        assert_eq!(
            harness.service.authenticate(&request).await.into_result(),
            Err(AuthError::SignatureInvalid)
        );
    }

    #[tokio::test]
    async fn test_attacker_claims_victim_address() {
        let harness = Harness::default();
        let victim = Wallet::random();
        let attacker = Wallet::random();
        let nonce = harness.service.issue_nonce().await.unwrap();

        // Attacker signs their own message but asserts the victim's address
        let mut request = attacker.sign_in(&attacker.claim("example.org", &nonce.value));
        request.address = victim.address().to_string();

        assert_eq!(
            harness
                .service
                .authenticate(&request)
                .await
                .error()
                .map(|e| e.kind()),
            Some(RejectionKind::AddressMismatch)
        );
    }

    #[tokio::test]
    async fn test_high_s_twin_rejected() {
        let harness = Harness::default();
        let wallet = Wallet::random();
        let nonce = harness.service.issue_nonce().await.unwrap();
        let request = wallet.sign_in(&wallet.claim("example.org", &nonce.value));

        // (r, n - s, v ^ 1) recovers the same key; EIP-2 forbids it
        let sig = EcdsaSignature::from_hex(&request.signature).unwrap();
        let twin = EcdsaSignature {
            r: sig.r,
            s: invert_s(&sig.s),
            v: if sig.v == 27 { 28 } else { 27 },
        };
        let malleated = siwe_auth::AuthenticationRequest {
            signature: twin.to_hex(),
            ..request.clone()
        };

        assert_eq!(
            harness.service.authenticate(&malleated).await.into_result(),
            Err(AuthError::SignatureInvalid)
        );
        assert!(harness.service.authenticate(&request).await.is_verified());
    }

    #[tokio::test]
    async fn test_compact_signature_accepted() {
        let harness = Harness::default();
        let wallet = Wallet::random();
        let nonce = harness.service.issue_nonce().await.unwrap();
        let mut request = wallet.sign_in(&wallet.claim("example.org", &nonce.value));

        // EIP-2098: fold the y parity into the top bit of s
        let sig = EcdsaSignature::from_hex(&request.signature).unwrap();
        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&sig.r);
        compact[32..].copy_from_slice(&sig.s);
        if sig.v == 28 {
            compact[32] |= 0x80;
        }
        request.signature = hex::encode(compact);

        assert!(harness.service.authenticate(&request).await.is_verified());
    }

    #[tokio::test]
    async fn test_junk_signatures() {
        let harness = Harness::default();
        let wallet = Wallet::random();
        let nonce = harness.service.issue_nonce().await.unwrap();
        let request = wallet.sign_in(&wallet.claim("example.org", &nonce.value));

        let zeros = format!("0x{}", "00".repeat(65));
        let odd = format!("{}0", request.signature);
        let truncated = request.signature[..request.signature.len() - 4].to_string();
        for junk in ["0xnothex", zeros.as_str(), odd.as_str(), truncated.as_str()] {
            let forged = siwe_auth::AuthenticationRequest {
                signature: junk.to_string(),
                ..request.clone()
            };
            assert_eq!(
                harness.service.authenticate(&forged).await.into_result(),
                Err(AuthError::SignatureInvalid),
                "signature {junk:?}"
            );
        }

        assert!(harness.service.authenticate(&request).await.is_verified());
    }
}
