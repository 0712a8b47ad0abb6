//! Telegram Bot API notification channel.

pub mod telegram;

pub use telegram::{TelegramNotifier, TELEGRAM_API_URL};
