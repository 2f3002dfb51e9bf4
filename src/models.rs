//! Data models for observations, watch targets, and price deltas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One recorded (timestamp, name, price) sample for the tracked product.
///
/// Immutable once appended to the history; the store is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// When the sample was taken. Strictly increasing within one
    /// watcher's history.
    pub recorded_at: DateTime<Utc>,
    /// Product name as extracted from the page.
    pub product_name: String,
    /// Normalized price, never negative.
    pub price: f64,
}

impl Observation {
    /// Creates a new observation.
    pub fn new(recorded_at: DateTime<Utc>, product_name: impl Into<String>, price: f64) -> Self {
        Self { recorded_at, product_name: product_name.into(), price }
    }
}

/// What a single process instance watches. Built once from validated
/// configuration and read-only for the process lifetime.
#[derive(Debug, Clone)]
pub struct WatchTarget {
    /// Product page URL.
    pub url: String,
    /// CSS selector for the price element.
    pub price_selector: String,
    /// CSS selector for the name element.
    pub name_selector: String,
    /// Sleep between cycles.
    pub poll_interval: Duration,
}

/// How the newest observation compares to the previous latest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceChange {
    /// No previous observation existed.
    First,
    Unchanged,
    Dropped,
    Risen,
}

/// Comparison between the two most recent observations. Derived fresh
/// each cycle, never stored.
#[derive(Debug, Clone)]
pub struct PriceDelta {
    pub previous: Option<Observation>,
    pub current: Observation,
    pub change: PriceChange,
}

impl PriceDelta {
    /// Percentage saved relative to the previous price. `None` unless
    /// the price actually went down.
    pub fn discount_percent(&self) -> Option<f64> {
        self.previous.as_ref().and_then(|prev| {
            if prev.price > 0.0 && self.current.price < prev.price {
                Some((prev.price - self.current.price) / prev.price * 100.0)
            } else {
                None
            }
        })
    }
}
