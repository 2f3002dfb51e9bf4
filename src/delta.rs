//! Change detection between consecutive observations.

use crate::models::{Observation, PriceChange, PriceDelta};

/// Classifies the newest observation against the previous latest.
///
/// Only `Dropped` triggers a notification by default; rises and
/// unchanged prices are recorded but silent.
pub fn detect(previous: Option<Observation>, current: Observation) -> PriceDelta {
    let change = match &previous {
        None => PriceChange::First,
        Some(prev) if current.price < prev.price => PriceChange::Dropped,
        Some(prev) if current.price > prev.price => PriceChange::Risen,
        Some(_) => PriceChange::Unchanged,
    };

    PriceDelta { previous, current, change }
}
