use chrono::NaiveDate;
use thiserror::Error;

use kite_bridge_core::{BrokerError, OptionRight};

/// Failure to turn a root, side and price into a tradable contract.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Every known expiry for the root is in the past, or the root has no options.
    #[error("no current expiry for {root}")]
    NoExpiryFound { root: String },

    /// Primary strike and all fallback strikes missed.
    #[error("no {root} {expiry} contract near strike {strike} {right:?}")]
    ContractNotFound {
        root: String,
        expiry: NaiveDate,
        strike: i64,
        right: OptionRight,
    },

    /// The instrument list could not be fetched and nothing was cached.
    #[error("instrument cache unavailable: {0}")]
    CacheUnavailable(#[source] BrokerError),
}

/// Everything `handle_signal` can fail with.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("unsupported symbol: {0}")]
    UnsupportedSymbol(String),

    #[error("invalid side: {0}")]
    InvalidSide(String),

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("passphrase mismatch")]
    Unauthorized,

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),
}

impl SignalError {
    /// HTTP status the transport should answer with.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Malformed(_)
            | Self::UnsupportedSymbol(_)
            | Self::InvalidSide(_)
            | Self::InvalidPrice(_) => 400,
            Self::Unauthorized => 401,
            Self::Resolve(_) => 500,
            Self::Broker(_) => 502,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed_payload",
            Self::UnsupportedSymbol(_) => "unsupported_symbol",
            Self::InvalidSide(_) => "invalid_side",
            Self::InvalidPrice(_) => "invalid_price",
            Self::Unauthorized => "unauthorized",
            Self::Resolve(ResolveError::NoExpiryFound { .. }) => "no_expiry_found",
            Self::Resolve(ResolveError::ContractNotFound { .. }) => "contract_not_found",
            Self::Resolve(ResolveError::CacheUnavailable(_)) => "instruments_unavailable",
            Self::Broker(BrokerError::Timeout { .. }) => "broker_timeout",
            Self::Broker(_) => "broker_error",
        }
    }

    /// Input errors are rejected before the signal is remembered.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        self.status_code() < 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_map_to_client_statuses() {
        assert_eq!(SignalError::Malformed("eof".into()).status_code(), 400);
        assert_eq!(SignalError::UnsupportedSymbol("NSE:BANKNIFTY".into()).status_code(), 400);
        assert_eq!(SignalError::Unauthorized.status_code(), 401);
        assert!(SignalError::InvalidSide("BUY".into()).is_input_error());
    }

    #[test]
    fn resolution_and_broker_failures_are_server_errors() {
        let missing = SignalError::from(ResolveError::NoExpiryFound {
            root: "FINNIFTY".into(),
        });
        assert_eq!(missing.status_code(), 500);
        assert_eq!(missing.code(), "no_expiry_found");

        let timeout = SignalError::from(BrokerError::Timeout { operation: "place_order" });
        assert_eq!(timeout.status_code(), 502);
        assert_eq!(timeout.code(), "broker_timeout");
        assert!(!timeout.is_input_error());
    }
}
