use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Buy,
    Sell,
}

impl TransactionType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }

    /// Side that flattens a position of the given signed quantity.
    #[must_use]
    pub const fn closing(quantity: i64) -> Self {
        if quantity > 0 {
            Self::Sell
        } else {
            Self::Buy
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
}

impl OrderType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Market => "MARKET",
        }
    }
}

/// Broker product type. Only intraday (MIS) is traded by the router; NRML is
/// accepted so configuration can point exits at carry-forward positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Product {
    Mis,
    Nrml,
}

impl Product {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mis => "MIS",
            Self::Nrml => "NRML",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Product {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MIS" => Ok(Self::Mis),
            "NRML" => Ok(Self::Nrml),
            other => Err(format!("unsupported product: {other}")),
        }
    }
}

/// A single-leg order handed to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub tradingsymbol: String,
    pub exchange: String,
    pub transaction_type: TransactionType,
    pub quantity: u32,
    pub order_type: OrderType,
    pub product: Product,
}

impl OrderRequest {
    #[must_use]
    pub fn market(
        tradingsymbol: impl Into<String>,
        exchange: impl Into<String>,
        transaction_type: TransactionType,
        quantity: u32,
        product: Product,
    ) -> Self {
        Self {
            tradingsymbol: tradingsymbol.into(),
            exchange: exchange.into(),
            transaction_type,
            quantity,
            order_type: OrderType::Market,
            product,
        }
    }
}

/// Broker acknowledgement of a placed order. Fills are not tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
}
