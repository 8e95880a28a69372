//! Results reported back to the transport for a handled signal.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use kite_bridge_core::OptionRight;

/// Terminal state of one signal. Serializes as
/// `{"status": "ok" | "noop" | "ignored", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SignalOutcome {
    Ok(OrderReport),
    Noop { reason: NoopReason },
    Ignored { reason: IgnoreReason },
}

/// An order that was placed. Serializes with `"action": "entry" | "exit"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum OrderReport {
    Entry {
        order_id: String,
        tradingsymbol: String,
        quantity: u32,
        right: OptionRight,
        strike: i64,
        expiry: NaiveDate,
    },
    Exit {
        order_id: String,
        tradingsymbol: String,
        quantity: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoopReason {
    #[serde(rename = "no open position")]
    NoOpenPosition,
    #[serde(rename = "market closed")]
    MarketClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IgnoreReason {
    #[serde(rename = "duplicate")]
    Duplicate,
}

impl fmt::Display for NoopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOpenPosition => write!(f, "no open position"),
            Self::MarketClosed => write!(f, "market closed"),
        }
    }
}

impl SignalOutcome {
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Ok(_) => "ok",
            Self::Noop { .. } => "noop",
            Self::Ignored { .. } => "ignored",
        }
    }

    #[must_use]
    pub const fn report(&self) -> Option<&OrderReport> {
        match self {
            Self::Ok(report) => Some(report),
            _ => None,
        }
    }
}

impl OrderReport {
    #[must_use]
    pub fn order_id(&self) -> &str {
        match self {
            Self::Entry { order_id, .. } | Self::Exit { order_id, .. } => order_id,
        }
    }

    #[must_use]
    pub fn tradingsymbol(&self) -> &str {
        match self {
            Self::Entry { tradingsymbol, .. } | Self::Exit { tradingsymbol, .. } => tradingsymbol,
        }
    }
}
