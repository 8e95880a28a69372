//! Order placement via `POST /orders/regular`.

use tracing::{info, warn};

use kite_bridge_core::{BrokerError, OrderAck, OrderRequest};

use crate::client::KiteClient;
use crate::types::OrderData;

/// Regular orders are day orders.
const VALIDITY: &str = "DAY";

impl KiteClient {
    /// Place a regular market order. Returns once the broker accepts it;
    /// fills are not awaited.
    ///
    /// # Errors
    /// Returns `BrokerError::Api` when Kite rejects the order, otherwise a
    /// transport or decode error.
    pub async fn place_regular_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerError> {
        info!(
            tradingsymbol = %order.tradingsymbol,
            side = %order.transaction_type,
            quantity = order.quantity,
            product = %order.product,
            "Placing order"
        );

        let quantity = order.quantity.to_string();
        let form = [
            ("tradingsymbol", order.tradingsymbol.as_str()),
            ("exchange", order.exchange.as_str()),
            ("transaction_type", order.transaction_type.as_str()),
            ("order_type", order.order_type.as_str()),
            ("quantity", quantity.as_str()),
            ("product", order.product.as_str()),
            ("validity", VALIDITY),
        ];

        let request = self.post("/orders/regular").form(&form);
        match self.send_json::<OrderData>("place_order", request).await {
            Ok(data) => {
                info!(order_id = %data.order_id, tradingsymbol = %order.tradingsymbol, "Order accepted");
                Ok(OrderAck {
                    order_id: data.order_id,
                })
            }
            Err(e) => {
                warn!(tradingsymbol = %order.tradingsymbol, error = %e, "Order rejected");
                Err(e)
            }
        }
    }
}
