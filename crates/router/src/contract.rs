//! Strike rounding and contract lookup with neighbor fallback.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info};

use kite_bridge_core::{Instrument, OptionRight};

use crate::cache::Snapshot;
use crate::error::ResolveError;

/// Strike offsets tried in order, in units of the strike step.
pub const FALLBACK_OFFSETS: [i64; 5] = [0, 1, -1, 2, -2];

/// Rounds `price` to the nearest multiple of `step`, ties to the even
/// multiple (21025 with step 50 gives 21000, 21075 gives 21100).
///
/// Returns `None` for a zero step or a result outside `i64`.
#[must_use]
pub fn round_to_step(price: Decimal, step: u32) -> Option<i64> {
    let step_dec = Decimal::from(step);
    let multiples = price
        .checked_div(step_dec)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .to_i64()?;
    multiples.checked_mul(i64::from(step))
}

/// Target strike followed by the fallback strikes, in search order.
#[must_use]
pub fn candidate_strikes(target: i64, step: u32) -> [i64; 5] {
    FALLBACK_OFFSETS.map(|offset| target + offset * i64::from(step))
}

/// Finds the contract at `target`, else the nearest listed neighbor.
///
/// # Errors
/// `ContractNotFound` when none of the five candidate strikes is listed.
/// Callers treat this as final; there is nothing to retry.
pub fn resolve_contract(
    snapshot: &Snapshot,
    root: &str,
    expiry: NaiveDate,
    target: i64,
    step: u32,
    right: OptionRight,
) -> Result<Instrument, ResolveError> {
    for strike in candidate_strikes(target, step) {
        if let Some(instrument) = snapshot.find(root, expiry, strike, right) {
            if strike == target {
                debug!(tradingsymbol = %instrument.tradingsymbol, "Resolved contract at target strike");
            } else {
                info!(
                    root,
                    target,
                    strike,
                    tradingsymbol = %instrument.tradingsymbol,
                    "Target strike not listed, using neighbor"
                );
            }
            return Ok(instrument.clone());
        }
    }

    Err(ResolveError::ContractNotFound {
        root: root.to_string(),
        expiry,
        strike: target,
        right,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kite_bridge_core::Segment;
    use rust_decimal_macros::dec;
    use tokio::time::Instant;

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 27).unwrap()
    }

    fn listed(strikes: &[i64]) -> Snapshot {
        let instruments = strikes
            .iter()
            .map(|&strike| Instrument {
                instrument_token: 1,
                segment: Segment::NfoOpt,
                name: "FINNIFTY".to_string(),
                expiry: expiry(),
                strike,
                right: Some(OptionRight::Ce),
                tradingsymbol: format!("FINNIFTY26O27{strike}CE"),
                lot_size: 65,
            })
            .collect();
        Snapshot::new(Segment::NfoOpt, instruments, Instant::now())
    }

    #[test]
    fn rounds_to_nearest_step() {
        assert_eq!(round_to_step(dec!(21034), 50), Some(21050));
        assert_eq!(round_to_step(dec!(21024.99), 50), Some(21000));
        assert_eq!(round_to_step(dec!(24987.35), 100), Some(25000));
        assert_eq!(round_to_step(dec!(21000), 50), Some(21000));
    }

    #[test]
    fn ties_round_to_even_multiple() {
        assert_eq!(round_to_step(dec!(21025), 50), Some(21000));
        assert_eq!(round_to_step(dec!(21075), 50), Some(21100));
    }

    #[test]
    fn rounding_is_monotonic_and_on_grid() {
        let mut previous = i64::MIN;
        let mut price = dec!(20900);
        while price <= dec!(21200) {
            let strike = round_to_step(price, 50).unwrap();
            assert_eq!(strike % 50, 0, "{price} -> {strike}");
            assert!(strike >= previous, "{price} -> {strike} after {previous}");
            previous = strike;
            price += dec!(0.25);
        }
    }

    #[test]
    fn zero_step_has_no_strike() {
        assert_eq!(round_to_step(dec!(21034), 0), None);
    }

    #[test]
    fn fallback_order_is_fixed() {
        assert_eq!(candidate_strikes(21050, 50), [21050, 21100, 21000, 21150, 20950]);
    }

    #[test]
    fn exact_strike_wins() {
        let snap = listed(&[21000, 21050, 21100]);
        let c = resolve_contract(&snap, "FINNIFTY", expiry(), 21050, 50, OptionRight::Ce).unwrap();
        assert_eq!(c.strike, 21050);
    }

    #[test]
    fn upper_neighbor_is_tried_before_lower() {
        let snap = listed(&[21000, 21100]);
        let c = resolve_contract(&snap, "FINNIFTY", expiry(), 21050, 50, OptionRight::Ce).unwrap();
        assert_eq!(c.tradingsymbol, "FINNIFTY26O2721100CE");

        let snap = listed(&[20950, 21150]);
        let c = resolve_contract(&snap, "FINNIFTY", expiry(), 21050, 50, OptionRight::Ce).unwrap();
        assert_eq!(c.strike, 21150);
    }

    #[test]
    fn lower_neighbor_is_tried_before_two_steps_up() {
        let snap = listed(&[21000, 21150]);
        let c = resolve_contract(&snap, "FINNIFTY", expiry(), 21050, 50, OptionRight::Ce).unwrap();
        assert_eq!(c.strike, 21000);
    }

    #[test]
    fn misses_beyond_two_steps_fail() {
        let snap = listed(&[20900, 21200]);
        let err = resolve_contract(&snap, "FINNIFTY", expiry(), 21050, 50, OptionRight::Ce).unwrap_err();
        assert!(matches!(err, ResolveError::ContractNotFound { strike: 21050, .. }));

        let snap = listed(&[21050]);
        assert!(resolve_contract(&snap, "FINNIFTY", expiry(), 21050, 50, OptionRight::Pe).is_err());
    }
}
