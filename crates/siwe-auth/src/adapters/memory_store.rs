//! # In-Memory Nonce Store
//!
//! Process-local [`NonceStore`] backed by a `HashMap` behind one mutex.
//!
//! ## Replay Safety
//!
//! Lookup, expiry check and the consumed flip all happen under the same
//! lock, so two racing consumers of one nonce can never both succeed.
//! Expired records are dropped lazily on `issue` once per GC interval, or
//! eagerly through [`NonceStore::purge_expired`].

use crate::config::AuthConfig;
use crate::domain::errors::AuthError;
use crate::domain::nonce::{generate_nonce, NonceRecord};
use crate::ports::outbound::{NonceStore, TimeSource};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

struct StoreState {
    records: HashMap<String, NonceRecord>,
    last_gc: DateTime<Utc>,
}

impl StoreState {
    fn purge(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_purgeable(now));
        self.last_gc = now;
        before - self.records.len()
    }
}

/// Nonce store for single-process deployments.
pub struct InMemoryNonceStore {
    state: Mutex<StoreState>,
    ttl: Duration,
    gc_interval: Duration,
    max_outstanding: Option<usize>,
    time: Arc<dyn TimeSource>,
}

impl InMemoryNonceStore {
    /// Default nonce lifetime.
    pub const DEFAULT_TTL_SECS: i64 = 300;

    /// Default spacing between lazy purges.
    pub const DEFAULT_GC_INTERVAL_SECS: i64 = 30;

    /// Create a store with default TTL and no capacity bound.
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        Self::with_settings(
            Duration::seconds(Self::DEFAULT_TTL_SECS),
            Duration::seconds(Self::DEFAULT_GC_INTERVAL_SECS),
            None,
            time,
        )
    }

    /// Create a store from the nonce settings in `config`.
    pub fn with_config(config: &AuthConfig, time: Arc<dyn TimeSource>) -> Self {
        Self::with_settings(
            config.nonce_ttl(),
            config.gc_interval(),
            config.max_outstanding_nonces,
            time,
        )
    }

    pub fn with_settings(
        ttl: Duration,
        gc_interval: Duration,
        max_outstanding: Option<usize>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        let now = time.now();
        Self {
            state: Mutex::new(StoreState {
                records: HashMap::new(),
                last_gc: now,
            }),
            ttl,
            gc_interval,
            max_outstanding,
            time,
        }
    }

    /// Number of records currently held, consumed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    /// Record a caller-chosen nonce value as freshly issued.
    ///
    /// Lets tests reproduce fixed transcripts; production code uses
    /// [`NonceStore::issue`].
    #[cfg(any(test, feature = "test-utils"))]
    pub fn insert_issued(&self, value: impl Into<String>) -> NonceRecord {
        let now = self.time.now();
        let record = NonceRecord::new(value.into(), now, self.ttl);
        self.state
            .lock()
            .records
            .insert(record.value.clone(), record.clone());
        record
    }

    fn record_new(&self, now: DateTime<Utc>) -> Result<NonceRecord, AuthError> {
        let mut state = self.state.lock();

        if now - state.last_gc >= self.gc_interval {
            let purged = state.purge(now);
            if purged > 0 {
                debug!(purged, "Purged expired nonces");
            }
        }

        if let Some(capacity) = self.max_outstanding {
            if state.records.len() >= capacity {
                state.purge(now);
            }
            if state.records.len() >= capacity {
                return Err(AuthError::NonceStoreFull { capacity });
            }
        }

        // 128-bit values; a collision means the RNG is broken, so draw again.
        let mut value = generate_nonce();
        while state.records.contains_key(&value) {
            value = generate_nonce();
        }

        let record = NonceRecord::new(value, now, self.ttl);
        state.records.insert(record.value.clone(), record.clone());
        Ok(record)
    }
}

#[async_trait]
impl NonceStore for InMemoryNonceStore {
    async fn issue(&self) -> Result<NonceRecord, AuthError> {
        let now = self.time.now();
        let record = self.record_new(now)?;
        debug!(expires_at = %record.expires_at, "Issued nonce");
        Ok(record)
    }

    async fn validate_and_consume(&self, nonce: &str) -> Result<(), AuthError> {
        let now = self.time.now();
        let mut state = self.state.lock();
        let record = state
            .records
            .get_mut(nonce)
            .ok_or(AuthError::NonceNotFound)?;
        record.consume(now)
    }

    async fn purge_expired(&self) -> usize {
        let now = self.time.now();
        self.state.lock().purge(now)
    }
}
