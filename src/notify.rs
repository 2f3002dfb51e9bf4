//! Telegram notification delivery.

use crate::error::WatchError;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Trait for dispatching alerts - enables mocking for tests.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a message and, optionally, a chart image. Failure is
    /// reported, never fatal; the observation is already stored by the
    /// time this runs.
    async fn notify(&self, message: &str, chart: Option<&[u8]>) -> Result<(), WatchError>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn notify(&self, message: &str, chart: Option<&[u8]>) -> Result<(), WatchError> {
        (**self).notify(message, chart).await
    }
}

/// Telegram Bot API notifier: `sendMessage`, then `sendPhoto` when a
/// chart is attached.
pub struct TelegramNotifier {
    client: reqwest::Client,
    chat_id: String,
    base_url: String,
}

impl TelegramNotifier {
    /// Creates a notifier for the given bot token and chat.
    pub fn new(token: &str, chat_id: &str) -> Result<Self> {
        Self::with_base_url(format!("https://api.telegram.org/bot{token}"), chat_id)
    }

    /// Creates a notifier with a custom API base URL (for testing).
    pub fn with_base_url(base_url: impl Into<String>, chat_id: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .context("failed to build Telegram HTTP client")?;

        Ok(Self { client, chat_id: chat_id.to_string(), base_url: base_url.into() })
    }

    async fn send_message(&self, text: &str) -> Result<(), WatchError> {
        debug!("POST sendMessage");

        let response = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .form(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .send()
            .await
            .map_err(|e| WatchError::Delivery(e.into()))?;

        check_response("sendMessage", response).await
    }

    async fn send_photo(&self, photo: &[u8]) -> Result<(), WatchError> {
        debug!("POST sendPhoto ({} bytes)", photo.len());

        let part = Part::bytes(photo.to_vec())
            .file_name("price_history.png")
            .mime_str("image/png")
            .map_err(|e| WatchError::Delivery(e.into()))?;

        let form = Form::new().text("chat_id", self.chat_id.clone()).part("photo", part);

        let response = self
            .client
            .post(format!("{}/sendPhoto", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| WatchError::Delivery(e.into()))?;

        check_response("sendPhoto", response).await
    }
}

async fn check_response(endpoint: &str, response: reqwest::Response) -> Result<(), WatchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    // Telegram error bodies carry a human-readable "description".
    let body = response.text().await.unwrap_or_default();
    let description = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("description").and_then(|d| d.as_str()).map(String::from))
        .unwrap_or(body);

    Err(WatchError::Delivery(anyhow!("{endpoint} returned {status}: {description}")))
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str, chart: Option<&[u8]>) -> Result<(), WatchError> {
        self.send_message(message).await?;

        if let Some(chart) = chart {
            self.send_photo(chart).await?;
        }

        Ok(())
    }
}
