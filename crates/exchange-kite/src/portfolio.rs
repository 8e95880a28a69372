//! Net positions from `GET /portfolio/positions`.

use tracing::debug;

use kite_bridge_core::{BrokerError, Position};

use crate::client::KiteClient;
use crate::types::PositionsData;

impl KiteClient {
    /// Fetch net positions. Closed positions (quantity 0) are included as
    /// the broker reports them.
    ///
    /// # Errors
    /// Returns a `BrokerError` on transport failure, an error envelope or an
    /// undecodable positions body.
    pub async fn net_positions(&self) -> Result<Vec<Position>, BrokerError> {
        let request = self.get("/portfolio/positions");
        let data: PositionsData = self.send_json("positions", request).await?;

        let positions: Vec<Position> = data
            .net
            .into_iter()
            .map(|raw| Position::new(raw.exchange, raw.product, raw.tradingsymbol, raw.quantity))
            .collect();

        debug!(count = positions.len(), "Fetched net positions");
        Ok(positions)
    }
}
