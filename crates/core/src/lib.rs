pub mod config;
pub mod config_loader;
pub mod error;
pub mod instrument;
pub mod order;
pub mod position;
pub mod signal;
pub mod traits;

pub use config::{
    AppConfig, ConfigError, KiteConfig, RootMapping, RouterConfig, ServerConfig, SessionConfig,
};
pub use config_loader::{ConfigLoader, DEFAULT_CONFIG_PATH};
pub use error::BrokerError;
pub use instrument::{Instrument, OptionRight, Segment};
pub use order::{OrderAck, OrderRequest, OrderType, Product, TransactionType};
pub use position::Position;
pub use signal::{Side, Signal, SignalKey, SignalPayload};
pub use traits::Broker;
