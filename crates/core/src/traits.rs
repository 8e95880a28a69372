use crate::error::BrokerError;
use crate::instrument::{Instrument, Segment};
use crate::order::{OrderAck, OrderRequest};
use crate::position::Position;
use async_trait::async_trait;

/// The brokerage as seen by the router: an opaque remote service.
///
/// Implementations bound every call with their own timeout and report it as
/// [`BrokerError::Timeout`]. None of them retry.
#[async_trait]
pub trait Broker: Send + Sync {
    fn name(&self) -> &str;

    /// Full current instrument list for one segment.
    async fn instruments(&self, segment: Segment) -> Result<Vec<Instrument>, BrokerError>;

    /// Net positions for the account.
    async fn positions(&self) -> Result<Vec<Position>, BrokerError>;

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerError>;
}
