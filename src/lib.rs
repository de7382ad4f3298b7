//! LifeRhythm Bot Library
//!
//! A Telegram bot with wellness content, water tracking and biorhythms.
//!
//! This crate provides the core functionality for:
//! - Loading and validating topic, lab reference and recipe content
//! - Keeping per-user profiles and daily water totals in memory, JSON or SQLite
//! - Computing biorhythm cycles from a date of birth
//! - Handling commands and menu buttons via chat messages

pub mod biorhythm;
pub mod commands;
pub mod config;
pub mod content;
pub mod state;
pub mod telegram;
