//! Paper broker.
//!
//! Serves a fixed instrument list, keeps positions in memory and simulates an
//! immediate fill for every order without touching Kite. Used by `serve
//! --paper` and as the broker double in router tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use kite_bridge_core::{
    Broker, BrokerError, Instrument, OrderAck, OrderRequest, Position, Segment, TransactionType,
};

#[derive(Default)]
pub struct PaperBroker {
    instruments: RwLock<Vec<Instrument>>,
    positions: RwLock<Vec<Position>>,
    orders: RwLock<Vec<(String, OrderRequest)>>,
    instrument_failure: RwLock<Option<BrokerError>>,
    order_failure: RwLock<Option<BrokerError>>,
    next_order: AtomicU64,
    instrument_fetches: AtomicU64,
}

impl PaperBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_instruments(instruments: Vec<Instrument>) -> Self {
        let broker = Self::default();
        broker.set_instruments(instruments);
        broker
    }

    #[must_use]
    pub fn with_positions(self, positions: Vec<Position>) -> Self {
        self.set_positions(positions);
        self
    }

    pub fn set_instruments(&self, instruments: Vec<Instrument>) {
        *self.instruments.write() = instruments;
    }

    pub fn set_positions(&self, positions: Vec<Position>) {
        *self.positions.write() = positions;
    }

    /// Makes every instrument fetch fail with `error` until cleared with `None`.
    pub fn fail_instruments(&self, error: Option<BrokerError>) {
        *self.instrument_failure.write() = error;
    }

    /// Makes every order placement fail with `error` until cleared with `None`.
    pub fn fail_orders(&self, error: Option<BrokerError>) {
        *self.order_failure.write() = error;
    }

    /// Orders accepted so far, oldest first.
    #[must_use]
    pub fn orders(&self) -> Vec<(String, OrderRequest)> {
        self.orders.read().clone()
    }

    #[must_use]
    pub fn positions_snapshot(&self) -> Vec<Position> {
        self.positions.read().clone()
    }

    /// Number of instrument list requests served (including failed ones).
    #[must_use]
    pub fn instrument_fetches(&self) -> u64 {
        self.instrument_fetches.load(Ordering::SeqCst)
    }

    fn apply_fill(&self, order: &OrderRequest) {
        let delta = match order.transaction_type {
            TransactionType::Buy => i64::from(order.quantity),
            TransactionType::Sell => -i64::from(order.quantity),
        };

        let mut positions = self.positions.write();
        if let Some(position) = positions.iter_mut().find(|p| {
            p.tradingsymbol == order.tradingsymbol
                && p.exchange == order.exchange
                && p.product == order.product.as_str()
        }) {
            position.quantity += delta;
        } else {
            positions.push(Position::new(
                order.exchange.clone(),
                order.product.as_str(),
                order.tradingsymbol.clone(),
                delta,
            ));
        }
    }
}

#[async_trait]
impl Broker for PaperBroker {
    fn name(&self) -> &str {
        "paper"
    }

    async fn instruments(&self, segment: Segment) -> Result<Vec<Instrument>, BrokerError> {
        self.instrument_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.instrument_failure.read().clone() {
            return Err(err);
        }
        Ok(self
            .instruments
            .read()
            .iter()
            .filter(|i| i.segment == segment)
            .cloned()
            .collect())
    }

    async fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        Ok(self.positions_snapshot())
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerError> {
        if let Some(err) = self.order_failure.read().clone() {
            return Err(err);
        }

        let order_id = format!("PAPER-{}", self.next_order.fetch_add(1, Ordering::SeqCst) + 1);
        self.apply_fill(order);
        self.orders.write().push((order_id.clone(), order.clone()));

        info!(
            order_id = %order_id,
            tradingsymbol = %order.tradingsymbol,
            side = %order.transaction_type,
            quantity = order.quantity,
            "Paper fill simulated"
        );

        Ok(OrderAck { order_id })
    }
}
