//! # SIWE Auth Benchmarks
//!
//! ```bash
//! cargo bench -p siwe-tests
//! ```

use criterion::{criterion_group, criterion_main};
use siwe_tests::benchmarks::auth::{
    bench_authenticate, bench_nonce_store, bench_parse_message, bench_signature_verify,
};

criterion_group!(
    benches,
    bench_parse_message,
    bench_signature_verify,
    bench_nonce_store,
    bench_authenticate,
);

criterion_main!(benches);
