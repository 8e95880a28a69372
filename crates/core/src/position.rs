use serde::{Deserialize, Serialize};

/// Broker-side net position. Fetched fresh per exit, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub exchange: String,
    /// Product as reported by the broker (`MIS`, `NRML`, `CNC`, ...).
    pub product: String,
    pub tradingsymbol: String,
    /// Signed: positive is long, negative is short, zero is flat.
    pub quantity: i64,
}

impl Position {
    #[must_use]
    pub fn new(
        exchange: impl Into<String>,
        product: impl Into<String>,
        tradingsymbol: impl Into<String>,
        quantity: i64,
    ) -> Self {
        Self {
            exchange: exchange.into(),
            product: product.into(),
            tradingsymbol: tradingsymbol.into(),
            quantity,
        }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.quantity != 0
    }
}
