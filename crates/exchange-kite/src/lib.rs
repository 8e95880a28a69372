//! Kite Connect brokerage integration.
//!
//! Provides the authenticated REST client (instrument dump, net positions,
//! regular orders) and an in-memory paper broker. Both implement
//! [`kite_bridge_core::Broker`] and are driven by `kite-bridge-router`.

pub mod client;
pub mod execution;
pub mod instruments;
pub mod paper;
pub mod portfolio;
pub mod types;

pub use client::KiteClient;
pub use instruments::parse_instruments_csv;
pub use paper::PaperBroker;
