//! Inbound alert payloads and the signal types derived from them.
//!
//! Alert sources are loose about types (ids arrive as numbers or strings,
//! sides in any case, prices as numbers or numeric strings), so the raw
//! payload keeps `side` as text and the typed [`Signal`] is only built once
//! the payload has been validated.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::instrument::OptionRight;

/// Direction carried by an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
    Exit,
}

impl Side {
    /// LONG and SHORT open positions; EXIT flattens them.
    #[must_use]
    pub const fn is_entry(self) -> bool {
        matches!(self, Self::Long | Self::Short)
    }

    /// Option right used to express the direction. Shorts are expressed by
    /// buying puts, never by selling.
    #[must_use]
    pub const fn option_right(self) -> Option<OptionRight> {
        match self {
            Self::Long => Some(OptionRight::Ce),
            Self::Short => Some(OptionRight::Pe),
            Self::Exit => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
            Self::Exit => write!(f, "EXIT"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONG" => Ok(Self::Long),
            "SHORT" => Ok(Self::Short),
            "EXIT" => Ok(Self::Exit),
            other => Err(format!("invalid side: {other}")),
        }
    }
}

/// Deduplication identity: the alert's own id plus the raw alert symbol.
///
/// Two alerts with the same id but different symbols are distinct signals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SignalKey {
    pub id: String,
    pub symbol: String,
}

impl SignalKey {
    #[must_use]
    pub fn new(id: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
        }
    }
}

impl fmt::Display for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.id, self.symbol)
    }
}

/// Alert body exactly as received, before any validation.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalPayload {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub symbol: String,
    pub side: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub passphrase: Option<String>,
}

impl SignalPayload {
    /// Parses a JSON alert body.
    ///
    /// # Errors
    ///
    /// Returns the serde error when the body is not a JSON object with the
    /// required `id`, `symbol` and `side` fields.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    #[must_use]
    pub fn key(&self) -> SignalKey {
        SignalKey::new(self.id.clone(), self.symbol.clone())
    }
}

/// A validated signal: side parsed, price present for entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signal {
    pub key: SignalKey,
    pub side: Side,
    pub price: Option<Decimal>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Unsigned(u64),
    Signed(i64),
}

fn id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Unsigned(n) => n.to_string(),
        RawId::Signed(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn side_parsing_is_case_insensitive() {
        assert_eq!("long".parse::<Side>().unwrap(), Side::Long);
        assert_eq!(" Short ".parse::<Side>().unwrap(), Side::Short);
        assert_eq!("EXIT".parse::<Side>().unwrap(), Side::Exit);
        assert!("BUY".parse::<Side>().is_err());
    }

    #[test]
    fn entry_sides_map_to_option_rights() {
        assert_eq!(Side::Long.option_right(), Some(OptionRight::Ce));
        assert_eq!(Side::Short.option_right(), Some(OptionRight::Pe));
        assert_eq!(Side::Exit.option_right(), None);
        assert!(!Side::Exit.is_entry());
    }

    #[test]
    fn payload_accepts_numeric_id_and_price() {
        let body = br#"{"id": 1, "symbol": "NSE:CNXFINANCE", "side": "LONG", "price": 21034}"#;
        let payload = SignalPayload::from_json(body).unwrap();
        assert_eq!(payload.id, "1");
        assert_eq!(payload.price, Some(dec!(21034)));
        assert!(payload.passphrase.is_none());
    }

    #[test]
    fn payload_accepts_string_price() {
        let body = br#"{"id": "a-7", "symbol": "NSE:NIFTY", "side": "short", "price": "24987.35"}"#;
        let payload = SignalPayload::from_json(body).unwrap();
        assert_eq!(payload.id, "a-7");
        assert_eq!(payload.price, Some(dec!(24987.35)));
    }

    #[test]
    fn payload_without_price_is_allowed_for_exits() {
        let body = br#"{"id": 9, "symbol": "NSE:NIFTY", "side": "EXIT"}"#;
        let payload = SignalPayload::from_json(body).unwrap();
        assert!(payload.price.is_none());
    }

    #[test]
    fn payload_missing_symbol_is_rejected() {
        let body = br#"{"id": 9, "side": "EXIT"}"#;
        assert!(SignalPayload::from_json(body).is_err());
        assert!(SignalPayload::from_json(b"not json").is_err());
    }

    #[test]
    fn key_distinguishes_symbols_with_same_id() {
        let a = SignalKey::new("1", "NSE:NIFTY");
        let b = SignalKey::new("1", "NSE:CNXFINANCE");
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "1|NSE:NIFTY");
    }
}
