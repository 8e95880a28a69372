//! Order router: gate, then entry or exit.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, warn};

use kite_bridge_core::{
    AppConfig, Broker, BrokerError, ConfigError, Instrument, OptionRight, OrderRequest, Product,
    RootMapping, Segment, Side, Signal, SignalPayload, TransactionType,
};

use crate::cache::InstrumentCache;
use crate::clock::MarketClock;
use crate::contract::{resolve_contract, round_to_step};
use crate::error::SignalError;
use crate::expiry::nearest_expiry;
use crate::gate::{Admission, RootTable, SignalGate};
use crate::outcome::{IgnoreReason, NoopReason, OrderReport, SignalOutcome};
use crate::positions::find_open_position;

/// A contract chosen for an entry, before any order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEntry {
    pub root: String,
    pub target_strike: i64,
    pub expiry: NaiveDate,
    pub right: OptionRight,
    pub instrument: Instrument,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub segment: Segment,
    pub instruments: usize,
    pub age_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub broker: String,
    pub cache: Option<CacheStatus>,
    pub seen_signals: usize,
}

pub struct OrderRouter {
    broker: Arc<dyn Broker>,
    cache: InstrumentCache,
    gate: SignalGate,
    clock: MarketClock,
    exchange: String,
    product: Product,
    lots_per_entry: u32,
}

impl OrderRouter {
    /// Builds a router sharing `broker` with its instrument cache.
    ///
    /// # Errors
    /// Returns the first configuration problem found.
    pub fn new(broker: Arc<dyn Broker>, config: &AppConfig) -> Result<Self, ConfigError> {
        config.validate(false)?;

        let cache = InstrumentCache::new(Arc::clone(&broker), config.router.instrument_ttl());
        let gate = SignalGate::new(
            RootTable::new(&config.roots),
            config.router.dedup_horizon(),
            config.router.passphrase.clone(),
        );

        Ok(Self {
            broker,
            cache,
            gate,
            clock: MarketClock::from_config(&config.session)?,
            exchange: config.kite.exchange.clone(),
            product: config.kite.product,
            lots_per_entry: config.router.lots_per_entry,
        })
    }

    #[must_use]
    pub const fn cache(&self) -> &InstrumentCache {
        &self.cache
    }

    #[must_use]
    pub const fn clock(&self) -> &MarketClock {
        &self.clock
    }

    #[must_use]
    pub fn root_for(&self, alert_symbol: &str) -> Option<&RootMapping> {
        self.gate.roots().get(alert_symbol)
    }

    /// Handles one raw alert body at the current time.
    ///
    /// # Errors
    /// See [`OrderRouter::handle_signal_at`].
    pub async fn handle_signal(&self, body: &[u8]) -> Result<SignalOutcome, SignalError> {
        self.handle_signal_at(body, Utc::now()).await
    }

    /// Handles one raw alert body as if received at `now`.
    ///
    /// # Errors
    /// Input errors for bad payloads (nothing recorded), `Resolve` when an
    /// entry has no tradable contract, `Broker` when a broker call fails.
    /// Once admitted, a signal stays recorded even if its order fails.
    pub async fn handle_signal_at(
        &self,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<SignalOutcome, SignalError> {
        let payload = SignalPayload::from_json(body).map_err(|e| {
            warn!(error = %e, "Rejected malformed signal");
            SignalError::Malformed(e.to_string())
        })?;

        let (signal, root, target_strike) = match self.gate.admit(&payload, Instant::now())? {
            Admission::Duplicate(_) => {
                return Ok(SignalOutcome::Ignored {
                    reason: IgnoreReason::Duplicate,
                })
            }
            Admission::Accepted {
                signal,
                root,
                target_strike,
            } => (signal, root, target_strike),
        };

        let result = match (signal.side, target_strike) {
            (Side::Exit, _) => self.exit(&signal, &root).await,
            (Side::Long | Side::Short, Some(target_strike)) => {
                if self.clock.is_session_open(now) {
                    self.enter(&signal, &root, target_strike, now).await
                } else {
                    info!(signal = %signal.key, "Market closed, entry skipped");
                    Ok(SignalOutcome::Noop {
                        reason: NoopReason::MarketClosed,
                    })
                }
            }
            (Side::Long | Side::Short, None) => {
                Err(SignalError::InvalidPrice("missing".to_string()))
            }
        };

        if let Err(e) = &result {
            error!(signal = %signal.key, side = %signal.side, error = %e, "Signal failed");
        }
        result
    }

    /// Resolves the contract an entry signal would trade, without ordering.
    ///
    /// # Errors
    /// `InvalidPrice` for a price that has no strike on the grid, `InvalidSide`
    /// for EXIT, otherwise resolution failures.
    pub async fn resolve_entry(
        &self,
        root: &RootMapping,
        side: Side,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<ResolvedEntry, SignalError> {
        let right = side
            .option_right()
            .ok_or_else(|| SignalError::InvalidSide(side.to_string()))?;
        let target_strike = round_to_step(price, root.strike_step)
            .ok_or_else(|| SignalError::InvalidPrice(price.to_string()))?;
        self.resolve_strike(root, right, target_strike, now).await
    }

    async fn resolve_strike(
        &self,
        root: &RootMapping,
        right: OptionRight,
        target_strike: i64,
        now: DateTime<Utc>,
    ) -> Result<ResolvedEntry, SignalError> {
        let snapshot = self.cache.get(Segment::NfoOpt).await?;
        let expiry = nearest_expiry(&snapshot, &root.root, self.clock.today(now))?;
        let instrument = resolve_contract(
            &snapshot,
            &root.root,
            expiry,
            target_strike,
            root.strike_step,
            right,
        )?;
        let quantity = self.lots_per_entry.saturating_mul(instrument.lot_size);

        Ok(ResolvedEntry {
            root: root.root.clone(),
            target_strike,
            expiry,
            right,
            instrument,
            quantity,
        })
    }

    async fn enter(
        &self,
        signal: &Signal,
        root: &RootMapping,
        target_strike: i64,
        now: DateTime<Utc>,
    ) -> Result<SignalOutcome, SignalError> {
        let right = signal
            .side
            .option_right()
            .ok_or_else(|| SignalError::InvalidSide(signal.side.to_string()))?;
        let entry = self.resolve_strike(root, right, target_strike, now).await?;

        let order = OrderRequest::market(
            entry.instrument.tradingsymbol.clone(),
            self.exchange.clone(),
            TransactionType::Buy,
            entry.quantity,
            self.product,
        );
        let ack = self.broker.place_order(&order).await?;

        info!(
            signal = %signal.key,
            order_id = %ack.order_id,
            tradingsymbol = %entry.instrument.tradingsymbol,
            quantity = entry.quantity,
            "Entry order placed"
        );

        Ok(SignalOutcome::Ok(OrderReport::Entry {
            order_id: ack.order_id,
            tradingsymbol: entry.instrument.tradingsymbol,
            quantity: entry.quantity,
            right: entry.right,
            strike: entry.instrument.strike,
            expiry: entry.expiry,
        }))
    }

    async fn exit(&self, signal: &Signal, root: &RootMapping) -> Result<SignalOutcome, SignalError> {
        let Some(position) =
            find_open_position(self.broker.as_ref(), &root.root, &self.exchange, self.product).await?
        else {
            info!(signal = %signal.key, root = %root.root, "No open position to exit");
            return Ok(SignalOutcome::Noop {
                reason: NoopReason::NoOpenPosition,
            });
        };

        let quantity = u32::try_from(position.quantity.unsigned_abs()).map_err(|_| {
            BrokerError::Decode(format!(
                "position quantity {} out of range",
                position.quantity
            ))
        })?;
        let order = OrderRequest::market(
            position.tradingsymbol.clone(),
            position.exchange.clone(),
            TransactionType::closing(position.quantity),
            quantity,
            self.product,
        );
        let ack = self.broker.place_order(&order).await?;

        info!(
            signal = %signal.key,
            order_id = %ack.order_id,
            tradingsymbol = %position.tradingsymbol,
            side = %order.transaction_type,
            quantity,
            "Exit order placed"
        );

        Ok(SignalOutcome::Ok(OrderReport::Exit {
            order_id: ack.order_id,
            tradingsymbol: position.tradingsymbol,
            quantity,
        }))
    }

    #[must_use]
    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok",
            broker: self.broker.name().to_string(),
            cache: self.cache.peek(Segment::NfoOpt).map(|snapshot| CacheStatus {
                segment: snapshot.segment(),
                instruments: snapshot.len(),
                age_secs: snapshot.age().as_secs(),
            }),
            seen_signals: self.gate.seen_count(),
        }
    }
}
