//! Error taxonomy for the watch cycle.

use thiserror::Error;

/// Stage of the watch cycle an error belongs to, attached to cycle
/// failure logs so selector drift can be diagnosed without a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Fetching,
    Extracting,
    Normalizing,
    Persisting,
    Notifying,
}

impl std::fmt::Display for CycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleStage::Fetching => write!(f, "fetching"),
            CycleStage::Extracting => write!(f, "extracting"),
            CycleStage::Normalizing => write!(f, "normalizing"),
            CycleStage::Persisting => write!(f, "persisting"),
            CycleStage::Notifying => write!(f, "notifying"),
        }
    }
}

/// Everything that can go wrong inside a single watch cycle.
///
/// None of these terminate the process. The watch loop classifies them
/// at its boundary, logs them with stage context, and retries on the
/// next interval.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid selector {selector:?}: {reason}")]
    SelectorSyntax { selector: String, reason: String },

    #[error("selector {selector:?} matched no elements")]
    ElementNotFound { selector: String },

    #[error("no price could be parsed from {raw:?}")]
    PriceParse { raw: String },

    #[error("history store failure: {0}")]
    Store(#[source] anyhow::Error),

    #[error("notification delivery failed: {0}")]
    Delivery(#[source] anyhow::Error),
}

impl WatchError {
    /// Maps the error to the cycle stage it occurred in.
    pub fn stage(&self) -> CycleStage {
        match self {
            WatchError::Fetch { .. } => CycleStage::Fetching,
            WatchError::SelectorSyntax { .. } | WatchError::ElementNotFound { .. } => {
                CycleStage::Extracting
            }
            WatchError::PriceParse { .. } => CycleStage::Normalizing,
            WatchError::Store(_) => CycleStage::Persisting,
            WatchError::Delivery(_) => CycleStage::Notifying,
        }
    }
}
