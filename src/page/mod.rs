//! Page acquisition: HTTP fetch, selector extraction, price normalization.

pub mod client;
pub mod extract;
pub mod normalize;

pub use client::{HttpFetcher, PageFetcher};
pub use extract::{extract, Extracted};
pub use normalize::normalize_price;
