//! Fuzz target for the sign-in message parser.
//!
//! ```bash
//! cd crates/siwe-auth
//! cargo +nightly fuzz run fuzz_parse_message
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use siwe_auth::{parse_message, AuthenticationClaim};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    // Every input yields a claim or a typed error, never a panic
    if let Ok(claim) = parse_message(raw) {
        // Anything accepted renders to text that parses back to the same claim
        let rendered = claim.to_string();
        let reparsed: AuthenticationClaim = rendered
            .parse()
            .expect("rendered claim must parse");
        assert_eq!(reparsed, claim);
    }
});
