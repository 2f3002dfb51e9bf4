//! price-watcher - Single-product price tracking daemon
//!
//! Periodically fetches a product page, extracts the price with
//! configurable CSS selectors, appends the observation to a durable
//! history, and sends a Telegram alert with a trend chart when the
//! price drops.

pub mod chart;
pub mod config;
pub mod delta;
pub mod error;
pub mod history;
pub mod models;
pub mod notify;
pub mod page;
pub mod watch;

pub use config::{Config, DbConfig, Settings};
pub use error::{CycleStage, WatchError};
pub use models::{Observation, PriceChange, PriceDelta, WatchTarget};
pub use watch::Watcher;
