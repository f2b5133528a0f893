//! # Message and Signature Tampering
//!
//! Single-bit mutations anywhere in a signed sign-in must never verify,
//! and a failed attempt must never cost the honest user their nonce.

#[cfg(test)]
mod tests {
    use crate::fixtures::{Harness, Wallet};
    use siwe_auth::{AuthError, AuthenticationApi, AuthenticationRequest, RejectionKind};

    fn flip_bit(bytes: &[u8], bit: usize) -> Vec<u8> {
        let mut out = bytes.to_vec();
        out[bit / 8] ^= 1 << (bit % 8);
        out
    }

    #[tokio::test]
    async fn test_every_signature_bit_flip_rejected() {
        let harness = Harness::default();
        let wallet = Wallet::random();
        let nonce = harness.service.issue_nonce().await.unwrap();
        let request = wallet.sign_in(&wallet.claim("example.org", &nonce.value));

        let raw = hex::decode(request.signature.trim_start_matches("0x")).unwrap();
        for bit in 0..raw.len() * 8 {
            let tampered = AuthenticationRequest {
                signature: hex::encode(flip_bit(&raw, bit)),
                ..request.clone()
            };
            assert_eq!(
                harness.service.authenticate(&tampered).await.into_result(),
                Err(AuthError::SignatureInvalid),
                "bit {bit}"
            );
        }

        // 520 failed attempts later the nonce is still good
        assert!(harness.service.authenticate(&request).await.is_verified());
    }

    #[tokio::test]
    async fn test_every_message_bit_flip_rejected() {
        let harness = Harness::default();
        let wallet = Wallet::random();
        let nonce = harness.service.issue_nonce().await.unwrap();
        let request = wallet.sign_in(&wallet.claim("example.org", &nonce.value));

        let bytes = request.message.as_bytes();
        let mut signature_invalid = 0;
        for bit in 0..bytes.len() * 8 {
            let Ok(message) = String::from_utf8(flip_bit(bytes, bit)) else {
                continue;
            };
            let tampered = AuthenticationRequest {
                message,
                ..request.clone()
            };

            let err = harness
                .service
                .authenticate(&tampered)
                .await
                .into_result()
                .expect_err("tampered message verified");

            // Flips that break the grammar or the address are caught
            // before the signature check; everything else reaches it.
            match err.kind() {
                RejectionKind::SignatureInvalid => signature_invalid += 1,
                RejectionKind::MalformedMessage
                | RejectionKind::UnsupportedVersion
                | RejectionKind::AddressMismatch => {}
                other => panic!("bit {bit}: unexpected rejection {other:?}"),
            }
        }
        assert!(signature_invalid > 0);

        assert!(harness.service.authenticate(&request).await.is_verified());
    }

    #[tokio::test]
    async fn test_statement_edit_is_signature_invalid() {
        let harness = Harness::default();
        let wallet = Wallet::random();
        let nonce = harness.service.issue_nonce().await.unwrap();
        let request = wallet.sign_in(&wallet.claim("example.org", &nonce.value));

        let tampered = AuthenticationRequest {
            message: request.message.replace("vote on", "drain"),
            ..request.clone()
        };
        assert_ne!(tampered.message, request.message);

        assert_eq!(
            harness.service.authenticate(&tampered).await.into_result(),
            Err(AuthError::SignatureInvalid)
        );
    }

    #[tokio::test]
    async fn test_reserialized_message_is_rejected() {
        // CRLF line endings parse to the same claim but are different bytes
        let harness = Harness::default();
        let wallet = Wallet::random();
        let nonce = harness.service.issue_nonce().await.unwrap();
        let request = wallet.sign_in(&wallet.claim("example.org", &nonce.value));

        let tampered = AuthenticationRequest {
            message: request.message.replace('\n', "\r\n"),
            ..request.clone()
        };
        assert_eq!(
            harness.service.authenticate(&tampered).await.into_result(),
            Err(AuthError::SignatureInvalid)
        );
        assert!(harness.service.authenticate(&request).await.is_verified());
    }

    #[tokio::test]
    async fn test_failed_forgeries_do_not_burn_victim_nonce() {
        let harness = Harness::default();
        let victim = Wallet::random();
        let attacker = Wallet::random();
        let nonce = harness.service.issue_nonce().await.unwrap();
        let honest = victim.sign_in(&victim.claim("example.org", &nonce.value));

        for _ in 0..20 {
            let forged = AuthenticationRequest {
                signature: attacker.sign(&honest.message),
                ..honest.clone()
            };
            assert_eq!(
                harness.service.authenticate(&forged).await.into_result(),
                Err(AuthError::SignatureInvalid)
            );
        }

        assert!(harness.service.authenticate(&honest).await.is_verified());
    }
}
