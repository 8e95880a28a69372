//! Tradable instrument records as published by the broker's instrument dump.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Broker market segment. Only the derivatives segments are modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    /// Index and stock options.
    #[serde(rename = "NFO-OPT")]
    NfoOpt,
    /// Index and stock futures.
    #[serde(rename = "NFO-FUT")]
    NfoFut,
}

impl Segment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NfoOpt => "NFO-OPT",
            Self::NfoFut => "NFO-FUT",
        }
    }

    /// Exchange the segment trades on (and the instrument dump it lives in).
    #[must_use]
    pub const fn exchange(self) -> &'static str {
        match self {
            Self::NfoOpt | Self::NfoFut => "NFO",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Segment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NFO-OPT" => Ok(Self::NfoOpt),
            "NFO-FUT" => Ok(Self::NfoFut),
            other => Err(format!("unknown segment: {other}")),
        }
    }
}

/// Option right: call (CE) or put (PE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionRight {
    #[serde(rename = "CE")]
    Ce,
    #[serde(rename = "PE")]
    Pe,
}

impl OptionRight {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ce => "CE",
            Self::Pe => "PE",
        }
    }

    /// Parses the broker's `instrument_type` column. `FUT` and equity types
    /// carry no right and yield `None`.
    #[must_use]
    pub fn from_instrument_type(instrument_type: &str) -> Option<Self> {
        match instrument_type.trim() {
            "CE" => Some(Self::Ce),
            "PE" => Some(Self::Pe),
            _ => None,
        }
    }
}

impl fmt::Display for OptionRight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of one tradable contract.
///
/// Uniquely identified by `(segment, name, expiry, strike, right)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub instrument_token: u64,
    pub segment: Segment,
    /// Underlying root, e.g. `NIFTY` or `FINNIFTY`.
    pub name: String,
    pub expiry: NaiveDate,
    pub strike: i64,
    /// `None` for futures.
    pub right: Option<OptionRight>,
    pub tradingsymbol: String,
    pub lot_size: u32,
}

impl Instrument {
    #[must_use]
    pub fn is_option(&self) -> bool {
        self.segment == Segment::NfoOpt && self.right.is_some()
    }

    /// Human-readable contract description (e.g., "FINNIFTY 21050CE 2026-10-27").
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.right {
            Some(right) => format!("{} {}{} {}", self.name, self.strike, right, self.expiry),
            None => format!("{} FUT {}", self.name, self.expiry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(right: Option<OptionRight>, segment: Segment) -> Instrument {
        Instrument {
            instrument_token: 1,
            segment,
            name: "FINNIFTY".to_string(),
            expiry: NaiveDate::from_ymd_opt(2026, 10, 27).unwrap(),
            strike: 21050,
            right,
            tradingsymbol: "FINNIFTY26O2721050CE".to_string(),
            lot_size: 65,
        }
    }

    #[test]
    fn segment_round_trips_through_str() {
        assert_eq!("nfo-opt".parse::<Segment>().unwrap(), Segment::NfoOpt);
        assert_eq!(Segment::NfoFut.to_string(), "NFO-FUT");
        assert_eq!(Segment::NfoOpt.exchange(), "NFO");
        assert!("NSE".parse::<Segment>().is_err());
    }

    #[test]
    fn right_parses_only_option_types() {
        assert_eq!(OptionRight::from_instrument_type("CE"), Some(OptionRight::Ce));
        assert_eq!(OptionRight::from_instrument_type("PE"), Some(OptionRight::Pe));
        assert_eq!(OptionRight::from_instrument_type("FUT"), None);
    }

    #[test]
    fn futures_are_not_options() {
        assert!(option(Some(OptionRight::Ce), Segment::NfoOpt).is_option());
        assert!(!option(None, Segment::NfoFut).is_option());
    }

    #[test]
    fn display_name_includes_strike_and_right() {
        let inst = option(Some(OptionRight::Pe), Segment::NfoOpt);
        assert_eq!(inst.display_name(), "FINNIFTY 21050PE 2026-10-27");
    }
}
