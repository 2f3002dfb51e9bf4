//! The watch loop: one strictly sequential
//! fetch -> extract -> normalize -> persist -> detect -> notify cycle per
//! interval, with per-cycle failure isolation so a single bad fetch
//! never kills the long-running process.

use crate::chart;
use crate::delta::detect;
use crate::error::WatchError;
use crate::history::HistoryStore;
use crate::models::{Observation, PriceChange, PriceDelta, WatchTarget};
use crate::notify::Notifier;
use crate::page::{extract, normalize_price, PageFetcher};
use chrono::Utc;
use tracing::{info, warn};

/// Watches a single product, generic over the fetch/store/notify
/// capabilities so every collaborator can be mocked.
pub struct Watcher<F, S, N> {
    target: WatchTarget,
    fetcher: F,
    store: S,
    notifier: N,
    notify_on_first: bool,
}

impl<F: PageFetcher, S: HistoryStore, N: Notifier> Watcher<F, S, N> {
    /// Creates a watcher for `target`.
    pub fn new(
        target: WatchTarget,
        fetcher: F,
        store: S,
        notifier: N,
        notify_on_first: bool,
    ) -> Self {
        Self { target, fetcher, store, notifier, notify_on_first }
    }

    /// Runs cycles forever, sleeping `poll_interval` between them. No
    /// cycle error propagates out of here; the loop only ends with the
    /// process.
    pub async fn run(&self) {
        info!(
            url = %self.target.url,
            interval_secs = self.target.poll_interval.as_secs(),
            "watch loop started"
        );

        loop {
            match self.run_cycle().await {
                Ok(delta) => info!(
                    change = ?delta.change,
                    price = delta.current.price,
                    product = %delta.current.product_name,
                    "cycle complete"
                ),
                Err(e) => warn!(stage = %e.stage(), error = %e, "cycle failed"),
            }

            tokio::time::sleep(self.target.poll_interval).await;
        }
    }

    /// Runs one full cycle and returns the resulting delta.
    ///
    /// Any error before the append leaves history untouched; a store
    /// error aborts the cycle without detection. Notification failures
    /// are logged here and never returned - by then the observation is
    /// already durable.
    pub async fn run_cycle(&self) -> Result<PriceDelta, WatchError> {
        let markup = self.fetcher.fetch(&self.target.url).await?;
        let extracted =
            extract(&markup, &self.target.price_selector, &self.target.name_selector)?;
        let price = normalize_price(&extracted.raw_price)?;

        let previous = self.store.latest().await?;

        // recorded_at is strictly increasing per history; bump past the
        // stored latest if the clock has not advanced.
        let mut recorded_at = Utc::now();
        if let Some(prev) = &previous {
            if recorded_at <= prev.recorded_at {
                recorded_at = prev.recorded_at + chrono::Duration::milliseconds(1);
            }
        }

        let current = Observation::new(recorded_at, extracted.raw_name, price);
        self.store.append(&current).await?;

        let delta = detect(previous, current);
        match delta.change {
            PriceChange::Dropped => {
                info!(
                    previous = delta.previous.as_ref().map(|o| o.price),
                    current = delta.current.price,
                    "price drop detected"
                );
                self.send_alert(drop_message(&self.target, &delta)).await;
            }
            PriceChange::First if self.notify_on_first => {
                self.send_alert(first_message(&self.target, &delta)).await;
            }
            _ => {}
        }

        Ok(delta)
    }

    async fn send_alert(&self, message: String) {
        let chart = match self.store.all().await {
            Ok(history) => match chart::render(&history) {
                Ok(png) => Some(png),
                Err(e) => {
                    warn!(error = %e, "chart rendering failed, sending alert without it");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "could not load history for chart, sending alert without it");
                None
            }
        };

        match self.notifier.notify(&message, chart.as_deref()).await {
            Ok(()) => info!("notification sent"),
            Err(e) => warn!(stage = %e.stage(), error = %e, "notification delivery failed"),
        }
    }
}

fn drop_message(target: &WatchTarget, delta: &PriceDelta) -> String {
    let mut message = format!("\u{1f4c9} Price drop for {}!\n\n", delta.current.product_name);

    if let Some(previous) = &delta.previous {
        message.push_str(&format!("Previous price: {:.2}\n", previous.price));
    }
    message.push_str(&format!("Current price: {:.2}\n", delta.current.price));
    if let Some(discount) = delta.discount_percent() {
        message.push_str(&format!("Discount: {discount:.2}%\n"));
    }
    message.push_str(&format!("\n{}", target.url));

    message
}

fn first_message(target: &WatchTarget, delta: &PriceDelta) -> String {
    format!(
        "Now tracking {} at {:.2}\n\n{}",
        delta.current.product_name, delta.current.price, target.url
    )
}
