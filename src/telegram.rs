//! Telegram transport for the registration bot
//!
//! Long-polls `getUpdates` and hands each message to its own task, which
//! runs it through the registration tracker and sends the reply.

mod types;

use crate::config::ActiveEvent;
use crate::registration::{IncomingMessage, RegistrantStore, RegistrationTracker};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use types::{ApiResponse, SendMessage, Update};

/// Server-side long-poll timeout
const POLL_TIMEOUT_SECS: u64 = 30;
/// Pause after a failed poll before trying again
const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Telegram API error: {0}")]
    Api(String),
}

/// Minimal Bot API client
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{token}", api_url.trim_end_matches('/')),
        })
    }

    /// Fetch updates with id >= `offset`, waiting up to `timeout_secs`
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let response = self
            .client
            .get(format!("{}/getUpdates", self.base_url))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", timeout_secs.to_string()),
                ("allowed_updates", r#"["message"]"#.to_string()),
            ])
            .send()
            .await?;

        unwrap_response(response).await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let response = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .json(&SendMessage {
                chat_id,
                text,
                parse_mode: "Markdown",
            })
            .send()
            .await?;

        unwrap_response::<serde_json::Value>(response).await?;
        Ok(())
    }
}

async fn unwrap_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, TelegramError> {
    let body: ApiResponse<T> = response.json().await?;
    match body {
        ApiResponse {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        ApiResponse { description, .. } => Err(TelegramError::Api(
            description.unwrap_or_else(|| "request failed".to_string()),
        )),
    }
}

/// Shared state for the poller and its per-message tasks
pub struct Bot<S> {
    client: TelegramClient,
    tracker: RegistrationTracker<S>,
    active_event: Arc<ActiveEvent>,
}

impl<S: RegistrantStore + 'static> Bot<S> {
    pub fn new(
        client: TelegramClient,
        tracker: RegistrationTracker<S>,
        active_event: Arc<ActiveEvent>,
    ) -> Self {
        Self {
            client,
            tracker,
            active_event,
        }
    }

    /// Poll until `cancel` fires. Each message is processed on its own task.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        tracing::info!("Telegram poller started");
        let mut offset = 0;

        loop {
            let result = tokio::select! {
                () = cancel.cancelled() => break,
                result = self.client.get_updates(offset, POLL_TIMEOUT_SECS) => result,
            };

            match result {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let Some(message) = update.into_incoming() else {
                            continue;
                        };
                        let bot = self.clone();
                        tokio::spawn(async move { bot.handle_message(message).await });
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to get updates");
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(RETRY_DELAY) => {}
                    }
                }
            }
        }

        tracing::info!("Telegram poller stopped");
    }

    async fn handle_message(&self, message: IncomingMessage) {
        tracing::info!(
            chat_id = message.chat_id,
            account_id = message.account_id,
            text = %message.text,
            "Received message"
        );

        let advance = self.tracker.advance(&message, self.active_event.get()).await;

        if let Err(e) = self
            .client
            .send_message(message.chat_id, &advance.reply.text())
            .await
        {
            tracing::error!(chat_id = message.chat_id, error = %e, "Failed to send message");
        }
    }
}
