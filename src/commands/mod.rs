//! Command handling module.
//!
//! Turns inbound chat text into replies. Slash commands are parsed into
//! [`BotCommand`]; menu buttons and bare numbers go through the per-user
//! dialog state in [`SessionStore`].

mod handler;
mod session;
mod types;

pub use handler::{
    BUTTON_BACK, BUTTON_BIORHYTHM, BUTTON_HELP, BUTTON_LAB_TESTS, BUTTON_WATER, CHALLENGE_DAYS, CommandHandler,
    FIXED_BUTTONS, Reply, WATER_GOAL_ML,
};
pub use session::{DialogState, SessionStore};
pub use types::{BotCommand, CommandResult, DEFAULT_WATER_ML, Keyboard, Sender, WaterArgs};
