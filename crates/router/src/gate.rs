//! Signal gate: validation and duplicate suppression.
//!
//! Input checks run before anything is remembered, so only well-formed,
//! supported signals ever enter [`SeenSignals`]. The duplicate check and the
//! insert happen under one lock: two concurrent deliveries of the same alert
//! can never both be admitted.

use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use kite_bridge_core::{RootMapping, Side, Signal, SignalKey, SignalPayload};

use crate::contract::round_to_step;
use crate::error::SignalError;

/// Supported alert symbols and the root each one trades.
#[derive(Debug, Clone)]
pub struct RootTable {
    by_symbol: HashMap<String, RootMapping>,
}

impl RootTable {
    #[must_use]
    pub fn new(mappings: &[RootMapping]) -> Self {
        let by_symbol = mappings
            .iter()
            .map(|m| (m.alert_symbol.clone(), m.clone()))
            .collect();
        Self { by_symbol }
    }

    #[must_use]
    pub fn get(&self, alert_symbol: &str) -> Option<&RootMapping> {
        self.by_symbol.get(alert_symbol)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

#[derive(Default)]
struct SeenState {
    at: HashMap<SignalKey, Instant>,
    order: VecDeque<(Instant, SignalKey)>,
}

/// Remembered signal identities.
///
/// Without a horizon entries live forever. With one, entries older than the
/// horizon are evicted oldest-first on every check, so a redelivery after the
/// horizon is admitted again.
pub struct SeenSignals {
    state: Mutex<SeenState>,
    horizon: Option<Duration>,
}

impl SeenSignals {
    #[must_use]
    pub fn new(horizon: Option<Duration>) -> Self {
        Self {
            state: Mutex::new(SeenState::default()),
            horizon,
        }
    }

    /// Records `key` unless already present. Returns `true` when it was new.
    pub fn check_and_record(&self, key: &SignalKey, now: Instant) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if let Some(horizon) = self.horizon {
            while let Some((recorded, _)) = state.order.front() {
                if now.saturating_duration_since(*recorded) <= horizon {
                    break;
                }
                if let Some((_, expired)) = state.order.pop_front() {
                    state.at.remove(&expired);
                }
            }
        }

        if state.at.contains_key(key) {
            return false;
        }
        state.at.insert(key.clone(), now);
        if self.horizon.is_some() {
            state.order.push_back((now, key.clone()));
        }
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().at.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of passing a payload through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Accepted {
        signal: Signal,
        root: RootMapping,
        /// Price rounded onto the root's strike grid; `None` for exits.
        target_strike: Option<i64>,
    },
    Duplicate(SignalKey),
}

pub struct SignalGate {
    roots: RootTable,
    seen: SeenSignals,
    passphrase: Option<String>,
}

impl SignalGate {
    #[must_use]
    pub fn new(roots: RootTable, horizon: Option<Duration>, passphrase: Option<String>) -> Self {
        Self {
            roots,
            seen: SeenSignals::new(horizon),
            passphrase,
        }
    }

    #[must_use]
    pub const fn roots(&self) -> &RootTable {
        &self.roots
    }

    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Validates `payload` and records its identity.
    ///
    /// # Errors
    /// Returns an input error (`Unauthorized`, `UnsupportedSymbol`,
    /// `InvalidSide`, `InvalidPrice`) without recording anything. An entry
    /// price that does not land on the strike grid is an `InvalidPrice`.
    pub fn admit(&self, payload: &SignalPayload, now: Instant) -> Result<Admission, SignalError> {
        let key = payload.key();

        if let Some(expected) = &self.passphrase {
            if payload.passphrase.as_deref() != Some(expected.as_str()) {
                warn!(signal = %key, "Rejected signal: passphrase mismatch");
                return Err(SignalError::Unauthorized);
            }
        }

        let Some(root) = self.roots.get(&payload.symbol) else {
            warn!(signal = %key, "Rejected signal: unsupported symbol");
            return Err(SignalError::UnsupportedSymbol(payload.symbol.clone()));
        };

        let side: Side = payload.side.parse().map_err(|_| {
            warn!(signal = %key, side = %payload.side, "Rejected signal: invalid side");
            SignalError::InvalidSide(payload.side.clone())
        })?;

        let target_strike = if side.is_entry() {
            match payload.price {
                Some(price) if price > Decimal::ZERO => {
                    let Some(strike) = round_to_step(price, root.strike_step) else {
                        warn!(signal = %key, %price, step = root.strike_step, "Rejected signal: price off strike grid");
                        return Err(SignalError::InvalidPrice(price.to_string()));
                    };
                    Some(strike)
                }
                Some(price) => {
                    warn!(signal = %key, %price, "Rejected signal: invalid price");
                    return Err(SignalError::InvalidPrice(price.to_string()));
                }
                None => {
                    warn!(signal = %key, "Rejected signal: missing price");
                    return Err(SignalError::InvalidPrice("missing".to_string()));
                }
            }
        } else {
            None
        };

        if !self.seen.check_and_record(&key, now) {
            info!(signal = %key, "Duplicate signal ignored");
            return Ok(Admission::Duplicate(key));
        }

        debug!(signal = %key, side = %side, root = %root.root, "Signal admitted");
        Ok(Admission::Accepted {
            signal: Signal {
                key,
                side,
                price: payload.price.filter(|_| side.is_entry()),
            },
            root: root.clone(),
            target_strike,
        })
    }
}
