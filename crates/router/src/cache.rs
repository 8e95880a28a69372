//! Instrument cache.
//!
//! One snapshot per segment, replaced wholesale on refresh. Readers clone an
//! `Arc<Snapshot>` out of the lock, so a reader holds either the old or the
//! new list and never a mix. Refreshes are serialized through an async mutex:
//! callers that queue behind an in-flight refresh reuse its result instead of
//! fetching again.

use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use kite_bridge_core::{Broker, Instrument, OptionRight, Segment};

use crate::error::ResolveError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ContractKey {
    root: String,
    expiry: NaiveDate,
    strike: i64,
    right: OptionRight,
}

/// Complete instrument list of one segment as of `fetched_at`.
#[derive(Debug)]
pub struct Snapshot {
    segment: Segment,
    instruments: Vec<Instrument>,
    index: HashMap<ContractKey, usize>,
    fetched_at: Instant,
}

impl Snapshot {
    #[must_use]
    pub fn new(segment: Segment, instruments: Vec<Instrument>, fetched_at: Instant) -> Self {
        let mut index = HashMap::with_capacity(instruments.len());
        for (pos, instrument) in instruments.iter().enumerate() {
            if let Some(right) = instrument.right {
                let key = ContractKey {
                    root: instrument.name.clone(),
                    expiry: instrument.expiry,
                    strike: instrument.strike,
                    right,
                };
                // Broker list order decides if the dump ever repeats a contract.
                index.entry(key).or_insert(pos);
            }
        }

        Self {
            segment,
            instruments,
            index,
            fetched_at,
        }
    }

    #[must_use]
    pub const fn segment(&self) -> Segment {
        self.segment
    }

    #[must_use]
    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    #[must_use]
    pub const fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    #[must_use]
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.fetched_at)
    }

    /// Exact lookup on (root, expiry, strike, right).
    #[must_use]
    pub fn find(
        &self,
        root: &str,
        expiry: NaiveDate,
        strike: i64,
        right: OptionRight,
    ) -> Option<&Instrument> {
        let key = ContractKey {
            root: root.to_string(),
            expiry,
            strike,
            right,
        };
        self.index.get(&key).map(|&pos| &self.instruments[pos])
    }
}

pub struct InstrumentCache {
    broker: Arc<dyn Broker>,
    ttl: Duration,
    snapshots: RwLock<HashMap<Segment, Arc<Snapshot>>>,
    refresh_lock: Mutex<()>,
}

impl InstrumentCache {
    #[must_use]
    pub fn new(broker: Arc<dyn Broker>, ttl: Duration) -> Self {
        Self {
            broker,
            ttl,
            snapshots: RwLock::new(HashMap::new()),
            refresh_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current snapshot, refreshing first when missing or older than the TTL.
    ///
    /// A failed refresh falls back to the stale snapshot when one exists.
    ///
    /// # Errors
    /// `CacheUnavailable` when the fetch fails and nothing was ever cached.
    pub async fn get(&self, segment: Segment) -> Result<Arc<Snapshot>, ResolveError> {
        if let Some(snapshot) = self.peek(segment) {
            if self.is_fresh(&snapshot) {
                return Ok(snapshot);
            }
        }
        self.load(segment, false).await
    }

    /// Refetches regardless of age.
    ///
    /// # Errors
    /// Same as [`InstrumentCache::get`].
    pub async fn refresh(&self, segment: Segment) -> Result<Arc<Snapshot>, ResolveError> {
        self.load(segment, true).await
    }

    /// Snapshot currently held, without refreshing.
    #[must_use]
    pub fn peek(&self, segment: Segment) -> Option<Arc<Snapshot>> {
        self.snapshots.read().get(&segment).cloned()
    }

    fn is_fresh(&self, snapshot: &Snapshot) -> bool {
        snapshot.age() <= self.ttl
    }

    async fn load(&self, segment: Segment, force: bool) -> Result<Arc<Snapshot>, ResolveError> {
        let seen = self.peek(segment);
        let _guard = self.refresh_lock.lock().await;

        let current = self.peek(segment);
        if let Some(snapshot) = &current {
            let refreshed_while_waiting =
                !seen.as_ref().is_some_and(|before| Arc::ptr_eq(before, snapshot));
            if refreshed_while_waiting || (!force && self.is_fresh(snapshot)) {
                return Ok(Arc::clone(snapshot));
            }
        }

        match self.broker.instruments(segment).await {
            Ok(instruments) => {
                let snapshot = Arc::new(Snapshot::new(segment, instruments, Instant::now()));
                self.snapshots.write().insert(segment, Arc::clone(&snapshot));
                info!(
                    segment = %segment,
                    instruments = snapshot.len(),
                    broker = self.broker.name(),
                    "Instrument cache refreshed"
                );
                Ok(snapshot)
            }
            Err(e) => match current {
                Some(stale) => {
                    warn!(
                        segment = %segment,
                        age_secs = stale.age().as_secs(),
                        error = %e,
                        "Instrument refresh failed, serving stale snapshot"
                    );
                    Ok(stale)
                }
                None => Err(ResolveError::CacheUnavailable(e)),
            },
        }
    }
}
