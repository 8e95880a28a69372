//! Wire formats of the Kite Connect v3 API.

use serde::Deserialize;

use kite_bridge_core::BrokerError;

/// Standard JSON envelope: `{"status": "success", "data": ...}` or
/// `{"status": "error", "message": ..., "error_type": ...}`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_type: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwraps a success envelope or converts an error envelope.
    ///
    /// # Errors
    /// Returns `BrokerError::Api` for error envelopes and `BrokerError::Decode`
    /// for a success envelope without data.
    pub fn into_result(self) -> Result<T, BrokerError> {
        if self.status == "success" {
            return self
                .data
                .ok_or_else(|| BrokerError::Decode("success response without data".to_string()));
        }
        Err(BrokerError::api(
            self.error_type.unwrap_or_else(|| "GeneralException".to_string()),
            self.message.unwrap_or_else(|| "unknown error".to_string()),
        ))
    }
}

/// `data` of `GET /portfolio/positions`.
#[derive(Debug, Deserialize)]
pub struct PositionsData {
    pub net: Vec<RawPosition>,
    #[serde(default)]
    pub day: Vec<RawPosition>,
}

#[derive(Debug, Deserialize)]
pub struct RawPosition {
    pub tradingsymbol: String,
    pub exchange: String,
    pub product: String,
    pub quantity: i64,
}

/// `data` of `POST /orders/regular`.
#[derive(Debug, Deserialize)]
pub struct OrderData {
    pub order_id: String,
}

/// One row of the instrument dump (`GET /instruments/{exchange}`, CSV).
/// Columns not listed here are ignored.
#[derive(Debug, Deserialize)]
pub struct InstrumentRow {
    pub instrument_token: u64,
    pub tradingsymbol: String,
    pub name: String,
    pub expiry: String,
    pub strike: f64,
    pub lot_size: u32,
    pub instrument_type: String,
    pub segment: String,
}
