//! User-facing status notifications
//!
//! The reporter pushes every status line to the user's chat through a
//! [`Notifier`]. Delivery is best-effort: callers log failures and move on.

use crate::config::NotificationConfig;
use crate::error::{Error, Result};
use crate::types::ChatId;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Sink for short text notifications addressed to a chat
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to `chat_id`
    async fn notify(&self, chat_id: ChatId, text: &str) -> Result<()>;
}

/// Notifier that drops every message
///
/// Used when no bot token is configured.
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn notify(&self, chat_id: ChatId, _text: &str) -> Result<()> {
        tracing::trace!(chat_id, "notifications disabled, dropping message");
        Ok(())
    }
}

/// Notifier backed by the Telegram Bot API `sendMessage` method
pub struct TelegramNotifier {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramNotifier {
    /// Create a notifier for `token`, talking to `api_base_url`
    ///
    /// Every request is bounded by `timeout`.
    pub fn new(token: &str, api_base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_base_url.trim_end_matches('/'), token),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Notification(format!(
                "sendMessage failed ({status}): {error_text}"
            )));
        }

        Ok(())
    }
}

/// Build the notifier described by `config`
///
/// Without a bot token notifications are disabled and a [`NoOpNotifier`] is
/// returned.
pub fn from_config(config: &NotificationConfig) -> Result<Arc<dyn Notifier>> {
    match &config.bot_token {
        Some(token) if !token.is_empty() => Ok(Arc::new(TelegramNotifier::new(
            token,
            &config.api_base_url,
            config.timeout,
        )?)),
        _ => {
            tracing::info!("no bot token configured, status notifications disabled");
            Ok(Arc::new(NoOpNotifier))
        }
    }
}
