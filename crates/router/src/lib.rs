//! Alert-to-order routing for index options.
//!
//! A signal passes through the [`gate::SignalGate`] (validation and
//! duplicate suppression), then either:
//! - exits: the matching open position is flattened at market, at any time
//! - enters: during the session, the nearest expiry and the at-the-money
//!   strike (with neighbor fallback) are resolved from the
//!   [`cache::InstrumentCache`] and one lot is bought
//!
//! Broker calls are single-attempt. A failed order is reported, never retried.

pub mod cache;
pub mod clock;
pub mod contract;
pub mod error;
pub mod expiry;
pub mod gate;
pub mod outcome;
pub mod positions;
pub mod router;

pub use cache::{InstrumentCache, Snapshot};
pub use clock::MarketClock;
pub use contract::{candidate_strikes, resolve_contract, round_to_step, FALLBACK_OFFSETS};
pub use error::{ResolveError, SignalError};
pub use expiry::nearest_expiry;
pub use gate::{Admission, RootTable, SeenSignals, SignalGate};
pub use outcome::{IgnoreReason, NoopReason, OrderReport, SignalOutcome};
pub use positions::{find_open_position, select_open_position};
pub use router::{CacheStatus, HealthReport, OrderRouter, ResolvedEntry};
