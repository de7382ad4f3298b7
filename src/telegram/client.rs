//! Telegram Bot API transport: long polling in, ordered chunked replies out.

use std::sync::Arc;
use std::time::Duration;

use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, User};
use thiserror::Error;
use tracing::{debug, error, info};

use super::RateLimiter;
use crate::commands::{CommandHandler, Keyboard, Reply, Sender};
use crate::config::TelegramConfig;

/// Errors that can occur while talking to the Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Flood control: retry after {0:?}")]
    RetryAfter(Duration),

    #[error("API request failed: {0}")]
    Request(String),
}

impl From<RequestError> for TelegramError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::RetryAfter(secs) => Self::RetryAfter(secs.duration()),
            other => Self::Request(other.to_string()),
        }
    }
}

/// Author of a message in `chat_id`; channel posts without one count as the chat itself.
fn sender_of(chat_id: i64, from: Option<&User>) -> Sender {
    let Some(user) = from else {
        return Sender::new(chat_id);
    };

    Sender {
        chat_id,
        user_id: i64::try_from(user.id.0).unwrap_or(chat_id),
        first_name: Some(user.first_name.clone()),
        username: user.username.clone(),
    }
}

/// A bot account connected through the Bot API.
pub struct TelegramBot {
    bot: Bot,
    limiter: RateLimiter,
}

impl TelegramBot {
    /// Creates a bot client; sends are spaced by `send_interval`.
    #[must_use]
    pub fn new(config: &TelegramConfig, send_interval: Duration) -> Self {
        Self {
            bot: Bot::new(&config.bot_token),
            limiter: RateLimiter::new(send_interval),
        }
    }

    /// Polls for updates and answers every text message until interrupted.
    pub async fn run(self, handler: Arc<CommandHandler>) {
        match self.bot.get_me().await {
            Ok(me) => info!("Connected as @{}", me.user.username.as_deref().unwrap_or("unknown")),
            Err(e) => error!("Failed to fetch bot identity: {}", e),
        }

        let transport = Arc::new(self);
        let bot = transport.bot.clone();

        teloxide::repl(bot, move |_bot: Bot, msg: Message| {
            let transport = Arc::clone(&transport);
            let handler = Arc::clone(&handler);

            async move {
                transport.handle_message(&handler, &msg).await;
                respond(())
            }
        })
        .await;

        info!("Polling stopped");
    }

    async fn handle_message(&self, handler: &CommandHandler, msg: &Message) {
        let Some(text) = msg.text() else {
            debug!("Ignoring non-text message in chat {}", msg.chat.id);
            return;
        };

        let sender = sender_of(msg.chat.id.0, msg.from.as_ref());
        let reply = handler.handle(&sender, text).await;
        self.send_reply(msg.chat.id, reply).await;
    }

    /// Sends reply chunks in order with the keyboard on the last one.
    ///
    /// A chunk that still fails after one retry is logged and the rest of
    /// the reply is dropped.
    async fn send_reply(&self, chat_id: ChatId, reply: Reply) {
        let chunks: Vec<String> = reply.chunks.into_iter().filter(|c| !c.trim().is_empty()).collect();
        let last = chunks.len().saturating_sub(1);

        for (i, text) in chunks.iter().enumerate() {
            let keyboard = if i == last { reply.keyboard.as_ref() } else { None };

            if let Err(e) = self.send_with_retry(chat_id, text, keyboard).await {
                error!("Failed to send reply to chat {}: {}", chat_id, e);
                return;
            }
        }
    }

    async fn send_with_retry(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TelegramError> {
        match self.send_chunk(chat_id, text, keyboard).await {
            Err(TelegramError::RetryAfter(wait)) => {
                self.limiter.handle_retry_after(wait).await;
                self.send_chunk(chat_id, text, keyboard).await
            }
            other => other,
        }
    }

    async fn send_chunk(&self, chat_id: ChatId, text: &str, keyboard: Option<&Keyboard>) -> Result<(), TelegramError> {
        self.limiter.wait_and_acquire().await;

        let request = self.bot.send_message(chat_id, text);
        match keyboard {
            Some(keyboard) => request.reply_markup(to_markup(keyboard)).await?,
            None => request.await?,
        };

        Ok(())
    }
}

/// Converts a reply keyboard into a resizable Telegram keyboard.
#[must_use]
pub fn to_markup(keyboard: &Keyboard) -> KeyboardMarkup {
    let rows = keyboard
        .rows
        .iter()
        .map(|row| row.iter().map(|label| KeyboardButton::new(label.clone())).collect::<Vec<_>>());
    KeyboardMarkup::new(rows).resize_keyboard()
}
