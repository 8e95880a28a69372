//! Instrument dump: `GET /instruments/{exchange}` returns CSV for the whole
//! exchange; rows are filtered down to the requested segment.

use chrono::NaiveDate;
use std::io::Read;
use tracing::{debug, info};

use kite_bridge_core::{BrokerError, Instrument, OptionRight, Segment};

use crate::client::{map_transport_error, KiteClient};
use crate::types::{Envelope, InstrumentRow};

impl KiteClient {
    /// Fetch every instrument of `segment`.
    ///
    /// # Errors
    /// Returns a `BrokerError` on transport failure, a broker error body or an
    /// unreadable CSV dump.
    pub async fn fetch_instruments(&self, segment: Segment) -> Result<Vec<Instrument>, BrokerError> {
        const OPERATION: &str = "instruments";

        let request = self.get(&format!("/instruments/{}", segment.exchange()));
        let response = self.send(OPERATION, request).await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(OPERATION, &e))?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<Envelope<serde_json::Value>>(&body) {
                Ok(envelope) => envelope
                    .into_result()
                    .err()
                    .unwrap_or_else(|| BrokerError::Http {
                        status: status.as_u16(),
                        message: body.clone(),
                    }),
                Err(_) => BrokerError::Http {
                    status: status.as_u16(),
                    message: body,
                },
            });
        }

        let instruments = parse_instruments_csv(body.as_bytes(), segment)?;
        info!(segment = %segment, count = instruments.len(), "Fetched instrument dump");
        Ok(instruments)
    }
}

/// Parses a Kite instrument dump, keeping only rows of `segment`.
///
/// Rows of other segments, rows without an expiry and rows whose segment
/// string is unknown are skipped; a row that cannot be decoded at all fails
/// the whole dump so a truncated download never becomes a partial snapshot.
///
/// # Errors
/// Returns `BrokerError::Decode` on malformed CSV.
pub fn parse_instruments_csv<R: Read>(
    reader: R,
    segment: Segment,
) -> Result<Vec<Instrument>, BrokerError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut instruments = Vec::new();
    let mut skipped = 0usize;

    for row in csv_reader.deserialize::<InstrumentRow>() {
        let row = row.map_err(|e| BrokerError::Decode(format!("instrument dump: {e}")))?;
        match instrument_from_row(row, segment) {
            Some(instrument) => instruments.push(instrument),
            None => skipped += 1,
        }
    }

    debug!(segment = %segment, kept = instruments.len(), skipped, "Parsed instrument dump");
    Ok(instruments)
}

fn instrument_from_row(row: InstrumentRow, wanted: Segment) -> Option<Instrument> {
    let segment: Segment = row.segment.parse().ok()?;
    if segment != wanted {
        return None;
    }
    let expiry = NaiveDate::parse_from_str(row.expiry.trim(), "%Y-%m-%d").ok()?;

    #[allow(clippy::cast_possible_truncation)]
    let strike = row.strike.round() as i64;

    Some(Instrument {
        instrument_token: row.instrument_token,
        segment,
        name: row.name.trim().to_string(),
        expiry,
        strike,
        right: OptionRight::from_instrument_type(&row.instrument_type),
        tradingsymbol: row.tradingsymbol,
        lot_size: row.lot_size,
    })
}
