//! Telegram transport module.
//!
//! Receives messages through Bot API long polling, passes their text to
//! the [`CommandHandler`](crate::commands::CommandHandler) and sends the
//! reply chunks back under a rate limit.

mod client;
mod rate_limiter;

pub use client::{TelegramBot, TelegramError, to_markup};
pub use rate_limiter::RateLimiter;
