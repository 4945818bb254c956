//! Telegram Bot API notifier.

use async_trait::async_trait;
use teloxide::{prelude::*, types::ParseMode};

use super::dispatcher::{Notifier, NotifyError};

#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, recipient: i64, text: &str) -> Result<(), NotifyError> {
        self.bot
            .send_message(ChatId(recipient), text.to_string())
            .parse_mode(ParseMode::Html)
            .await
            .map(|_| ())
            .map_err(|e| NotifyError::Transport(e.to_string()))
    }
}
