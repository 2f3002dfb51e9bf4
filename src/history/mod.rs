//! Durable append-only history of price observations.

pub mod sqlx_store;

pub use sqlx_store::SqlxHistoryStore;

use crate::error::WatchError;
use crate::models::Observation;
use async_trait::async_trait;
use std::sync::Arc;

/// Append-only observation log with latest/full-history queries.
///
/// Append is the sole mutation; once it returns, the observation
/// survives a process restart. Single-writer by design: one process
/// per tracked item.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Appends one observation.
    async fn append(&self, observation: &Observation) -> Result<(), WatchError>;

    /// The most recent observation, or `None` when the history is
    /// empty (first run).
    async fn latest(&self) -> Result<Option<Observation>, WatchError>;

    /// Full history in chronological order.
    async fn all(&self) -> Result<Vec<Observation>, WatchError>;
}

#[async_trait]
impl<T: HistoryStore + ?Sized> HistoryStore for Arc<T> {
    async fn append(&self, observation: &Observation) -> Result<(), WatchError> {
        (**self).append(observation).await
    }

    async fn latest(&self) -> Result<Option<Observation>, WatchError> {
        (**self).latest().await
    }

    async fn all(&self) -> Result<Vec<Observation>, WatchError> {
        (**self).all().await
    }
}
