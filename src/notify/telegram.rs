//! Telegram bot delivery channel.

use super::{NotificationMessage, NotifyChannel};
use serde_json::json;
use std::time::Duration;

/// Posts messages to a Telegram chat through the bot API.
pub struct TelegramChannel {
    bot_token: String,
    chat_id: String,
    client: reqwest::blocking::Client,
}

impl TelegramChannel {
    /// Build a channel for the given bot token and chat id.
    ///
    /// The HTTP client carries a hard request timeout so a wedged API server
    /// cannot stall the notify consumer indefinitely.
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| format!("failed to build http client: {}", e))?;

        Ok(Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            client,
        })
    }
}

impl NotifyChannel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn deliver(&self, message: &NotificationMessage, origin: &str) -> Result<(), String> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let text = format!("{}\n\n{}\n\n— {}", message.title, message.body, origin);

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": text,
            }))
            .send()
            .map_err(|e| format!("request failed: {}", e))?;

        response
            .error_for_status()
            .map(|_| ())
            .map_err(|e| format!("api rejected message: {}", e))
    }
}
