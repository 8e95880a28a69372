//! Nearest-expiry selection.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use kite_bridge_core::Segment;

use crate::cache::Snapshot;
use crate::error::ResolveError;

/// Earliest option expiry of `root` on or after `today`.
///
/// Never falls back to a past expiry: a root whose cycles have all expired
/// (or that has no options at all) is an error.
///
/// # Errors
/// `NoExpiryFound` when no expiry on or after `today` exists.
pub fn nearest_expiry(
    snapshot: &Snapshot,
    root: &str,
    today: NaiveDate,
) -> Result<NaiveDate, ResolveError> {
    let expiries: BTreeSet<NaiveDate> = snapshot
        .instruments()
        .iter()
        .filter(|i| i.segment == Segment::NfoOpt && i.is_option() && i.name == root)
        .map(|i| i.expiry)
        .collect();

    expiries
        .range(today..)
        .next()
        .copied()
        .ok_or_else(|| ResolveError::NoExpiryFound {
            root: root.to_string(),
        })
}
