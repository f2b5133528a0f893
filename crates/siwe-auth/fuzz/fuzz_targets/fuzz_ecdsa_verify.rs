//! Fuzz target for personal-sign signature checks.
//!
//! ## Running
//!
//! ```bash
//! cd crates/siwe-auth
//! cargo +nightly fuzz run fuzz_ecdsa_verify
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use siwe_auth::domain::ecdsa::verify_personal_signature;
use siwe_auth::{Address, EcdsaSignature};

#[derive(Debug, arbitrary::Arbitrary)]
struct FuzzInput {
    message: Vec<u8>,
    signature: Vec<u8>,
    address: [u8; 20],
}

fuzz_target!(|input: FuzzInput| {
    let Ok(signature) = EcdsaSignature::from_bytes(&input.signature) else {
        return;
    };
    let address = Address::new(input.address);

    // Must never panic, and must be deterministic
    let first = verify_personal_signature(&input.message, &signature, &address);
    let second = verify_personal_signature(&input.message, &signature, &address);
    assert_eq!(first, second);

    // Re-encoding a decoded signature is lossless
    if input.signature.len() == 65 {
        assert_eq!(signature.to_bytes().as_slice(), input.signature.as_slice());
    }
});
