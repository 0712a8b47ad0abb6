//! Telegram `sendMessage` client.

use perpwatch_core::{DeliveryError, Notifier};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Default Telegram Bot API host.
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Timeout for one sendMessage call.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

/// Sends alert messages to one Telegram chat.
///
/// The bot token is part of the request path, so it never appears in logs;
/// only the chat id is logged.
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self::with_base_url(TELEGRAM_API_URL, token, chat_id)
    }

    /// Mainly for tests pointing at a local stub server.
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(SEND_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.into(),
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }
}

impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DeliveryError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Api {
                status: status.as_u16(),
                body,
            });
        }

        debug!(chat_id = %self.chat_id, chars = text.len(), "Sent Telegram message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = SendMessageRequest {
            chat_id: "123456",
            text: "📈 pump\nМонеты: BTCUSDT",
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["chat_id"], "123456");
        assert_eq!(json["parse_mode"], "HTML");
        assert_eq!(json["disable_web_page_preview"], true);
        assert!(json["text"].as_str().unwrap().contains("BTCUSDT"));
    }

    #[test]
    fn test_send_url_shape() {
        let notifier = TelegramNotifier::with_base_url("http://localhost:9", "TOKEN", "42");
        let url = format!("{}/bot{}/sendMessage", notifier.base_url, notifier.token);
        assert_eq!(url, "http://localhost:9/botTOKEN/sendMessage");
    }
}
