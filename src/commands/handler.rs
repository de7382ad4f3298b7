//! Command handler implementation.

use std::fmt::{Display, Write as _};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, warn};

use super::session::{DialogState, SessionStore};
use super::types::{BotCommand, CommandResult, Keyboard, Sender, WaterArgs};
use crate::biorhythm::{Biorhythm, BiorhythmError};
use crate::config::BotSettings;
use crate::content::{self, ContentStore, Topic};
use crate::state::{
    DATE_FORMAT, ProfileField, ProfilePatch, StateError, UserRecord, UserStateStore, WaterChange, parse_date,
    split_pairs,
};

pub const BUTTON_LAB_TESTS: &str = "📊 Lab tests";
pub const BUTTON_WATER: &str = "💧 Water";
pub const BUTTON_BIORHYTHM: &str = "📈 Biorhythm";
pub const BUTTON_HELP: &str = "ℹ️ Help";
pub const BUTTON_BACK: &str = "Back";

/// Buttons handled by the dispatcher itself; topic labels cannot reuse them.
pub const FIXED_BUTTONS: [&str; 5] = [BUTTON_LAB_TESTS, BUTTON_WATER, BUTTON_BIORHYTHM, BUTTON_HELP, BUTTON_BACK];

/// Daily water goal shown next to totals.
pub const WATER_GOAL_ML: u64 = 2000;

/// Length of the water challenge in days.
pub const CHALLENGE_DAYS: u32 = 7;

const PROFILE_EXAMPLE: &str = "/setprofile sex=male age=30 height=180 weight=80 goal=loss";

/// Reply to one inbound message, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Whether the request succeeded.
    pub success: bool,

    /// Texts to send in order, each within the chunk limit.
    pub chunks: Vec<String>,

    /// Keyboard to attach to the last chunk.
    pub keyboard: Option<Keyboard>,
}

/// Turns inbound text into replies, using the state store, the content
/// store and the biorhythm calculator.
pub struct CommandHandler {
    store: Arc<dyn UserStateStore>,
    content: Arc<ContentStore>,
    sessions: SessionStore,
    settings: BotSettings,
}

impl CommandHandler {
    /// Creates a new command handler.
    #[must_use]
    pub fn new(store: Arc<dyn UserStateStore>, content: Arc<ContentStore>, settings: BotSettings) -> Self {
        Self {
            store,
            content,
            sessions: SessionStore::new(),
            settings,
        }
    }

    /// Handles one message from `sender`, dated today in local time.
    pub async fn handle(&self, sender: &Sender, text: &str) -> Reply {
        let mut rng = StdRng::from_entropy();
        self.handle_on(sender, text, Local::now().date_naive(), &mut rng).await
    }

    /// Handles one message as if it arrived on `today`, sampling with `rng`.
    pub async fn handle_on<R>(&self, sender: &Sender, text: &str, today: NaiveDate, rng: &mut R) -> Reply
    where
        R: Rng + Send + ?Sized,
    {
        debug!("Message from {} in chat {}: {}", sender.user_id, sender.chat_id, truncate(text, 40));

        let result = self.dispatch(sender, text.trim(), today, rng).await;
        info!(
            "Reply to {}: success={}, keyboard={}",
            sender.chat_id,
            result.success,
            result.keyboard.is_some()
        );

        Reply {
            success: result.success,
            chunks: content::chunk(&result.message, self.settings.chunk_limit),
            keyboard: result.keyboard,
        }
    }

    /// Current dialog state of `user_id`.
    pub async fn dialog_state(&self, user_id: i64) -> DialogState {
        self.sessions.get(user_id).await
    }

    /// Main menu: one button per topic, then the fixed sections.
    #[must_use]
    pub fn main_keyboard(&self) -> Keyboard {
        let labels = self
            .content
            .topics
            .values()
            .map(|topic| topic.menu_label.clone())
            .chain([BUTTON_LAB_TESTS, BUTTON_WATER, BUTTON_BIORHYTHM, BUTTON_HELP].map(str::to_owned));
        Keyboard::grid(labels, 2)
    }

    async fn dispatch<R>(&self, sender: &Sender, text: &str, today: NaiveDate, rng: &mut R) -> CommandResult
    where
        R: Rng + Send + ?Sized,
    {
        if text.starts_with('/') {
            return match BotCommand::parse(text) {
                Some(command) => self.try_execute(sender, command, today, rng).await,
                None => self.not_understood(),
            };
        }

        self.handle_menu_input(sender.chat_id, text, rng).await
    }

    /// Runs a parsed command; unknown topic verbs leave the dialog untouched.
    async fn try_execute<R>(&self, sender: &Sender, command: BotCommand, today: NaiveDate, rng: &mut R) -> CommandResult
    where
        R: Rng + Send + ?Sized,
    {
        let user_id = sender.chat_id;

        if let BotCommand::Topic { key, .. } = &command
            && self.content.lookup(key).is_none()
        {
            debug!("Unknown command: /{}", key);
            return self.not_understood();
        }

        debug!("Handling command: {}", command);
        self.sessions.reset(user_id).await;

        let result = match command {
            BotCommand::Start => self.handle_start(sender).await,
            BotCommand::Help => Ok(self.handle_help()),
            BotCommand::Topic { key, count } => Ok(self.handle_topic(&key, count, rng)),
            BotCommand::Topics => Ok(self.handle_topics()),
            BotCommand::Analysis(code) => Ok(self.handle_analysis(code.as_deref())),
            BotCommand::Recipes => Ok(self.handle_recipes()),
            BotCommand::Recipe(key) => Ok(self.handle_recipe(key.as_deref())),
            BotCommand::Water(args) => self.handle_water(user_id, args, today).await,
            BotCommand::Stats => self.handle_stats(user_id, today).await,
            BotCommand::Challenges => self.handle_challenges(user_id, today).await,
            BotCommand::SetDob(date) => self.handle_setdob(user_id, date.as_deref()).await,
            BotCommand::Biorhythm(date) => self.handle_biorhythm(user_id, date.as_deref(), today).await,
            BotCommand::Profile => self.handle_profile(sender).await,
            BotCommand::SetProfile(pairs) => self.handle_setprofile(user_id, &pairs).await,
            BotCommand::AdminStats => self.handle_adminstats(sender.user_id).await,
        };

        result.unwrap_or_else(|e| state_error_reply(user_id, &e))
    }

    /// Handles menu buttons and bare numbers.
    async fn handle_menu_input<R>(&self, user_id: i64, text: &str, rng: &mut R) -> CommandResult
    where
        R: Rng + Send + ?Sized,
    {
        if let Some((key, topic)) = self.content.topic_by_label(text) {
            self.sessions
                .set(user_id, DialogState::AwaitingCount { topic: key.to_owned() })
                .await;
            return CommandResult::success(format!("How many to show? Tap a number or type /{key} N"))
                .with_keyboard(count_keyboard(topic));
        }

        let fixed = match text {
            BUTTON_LAB_TESTS => Some(CommandResult::success(
                "Type /analysis list for the keys or /analysis <key>, e.g. /analysis ferritin",
            )),
            BUTTON_WATER => Some(CommandResult::success(
                "Log water with /water [ml], 250 ml by default. Example: /water 300\nSee /challenges for your weekly progress.",
            )),
            BUTTON_BIORHYTHM => Some(CommandResult::success(
                "Save your date of birth with /setdob YYYY-MM-DD, then use /biorhythm",
            )),
            BUTTON_HELP => Some(self.handle_help()),
            BUTTON_BACK => Some(CommandResult::success("Back to the menu").with_keyboard(self.main_keyboard())),
            _ => None,
        };
        if let Some(result) = fixed {
            self.sessions.reset(user_id).await;
            return result;
        }

        if let Ok(count) = text.parse::<usize>() {
            return match self.sessions.get(user_id).await {
                DialogState::AwaitingCount { topic } => {
                    self.sessions.reset(user_id).await;
                    self.handle_topic(&topic, Some(count), rng)
                        .with_keyboard(self.main_keyboard())
                }
                DialogState::Idle => {
                    CommandResult::error("Pick a section first.").with_keyboard(self.main_keyboard())
                }
            };
        }

        self.not_understood()
    }

    async fn handle_start(&self, sender: &Sender) -> Result<CommandResult, StateError> {
        let record = self.remember_identity(sender).await?;

        let name = record
            .display_name
            .as_deref()
            .or(sender.first_name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty());
        let greeting = match name {
            Some(name) => format!("Hi, {name}! 👋"),
            None => "Hi! 👋".to_owned(),
        };

        let message = format!(
            "{greeting} I'm LifeRhythm, your wellness helper.\n\n{}",
            self.help_text()
        );
        Ok(CommandResult::success(message).with_keyboard(self.main_keyboard()))
    }

    /// Loads the record of the sender's chat, storing Telegram names that are new.
    ///
    /// Group chats share one record, so names are only stored for private chats.
    async fn remember_identity(&self, sender: &Sender) -> Result<UserRecord, StateError> {
        let record = self.store.get_or_create(sender.chat_id).await?;
        if !sender.is_private() {
            return Ok(record);
        }

        let patch = record.identity_patch(sender.first_name.as_deref(), sender.username.as_deref());
        if patch.is_empty() {
            return Ok(record);
        }

        debug!("Storing Telegram names for user {}", sender.chat_id);
        self.store.update_profile(sender.chat_id, &patch).await
    }

    fn handle_help(&self) -> CommandResult {
        CommandResult::success(self.help_text()).with_keyboard(self.main_keyboard())
    }

    fn help_text(&self) -> String {
        let mut lines = vec!["Tap a section button or type a command:".to_owned()];

        for (key, topic) in &self.content.topics {
            lines.push(format!("/{key} [N] - {}", topic.menu_label));
        }
        for (usage, description) in BotCommand::all_commands() {
            lines.push(format!("{usage} - {description}"));
        }

        lines.join("\n")
    }

    fn handle_topic<R>(&self, key: &str, count: Option<usize>, rng: &mut R) -> CommandResult
    where
        R: Rng + ?Sized,
    {
        let Some(topic) = self.content.lookup(key) else {
            return CommandResult::error(format!("Unknown topic '{key}'. See /topics"));
        };

        let sample = content::select_sample(&topic.entries, count.unwrap_or(topic.default_count), rng);
        CommandResult::success(content::render_topic(topic, &sample))
    }

    fn handle_topics(&self) -> CommandResult {
        let mut lines = vec!["Topics:".to_owned()];
        for (key, topic) in &self.content.topics {
            lines.push(format!(
                "/{key} - {} ({} entries)",
                topic.menu_label,
                topic.entries.len()
            ));
        }
        CommandResult::success(lines.join("\n"))
    }

    fn handle_analysis(&self, code: Option<&str>) -> CommandResult {
        let keys = self.content.lab_codes().join(", ");

        match code {
            None => CommandResult::success(format!(
                "Usage: /analysis <key>\nExample: /analysis ferritin\n\nAvailable keys: {keys}"
            )),
            Some(code) if code.eq_ignore_ascii_case("list") => {
                CommandResult::success(format!("Available keys: {keys}"))
            }
            Some(code) => match self.content.lab(code) {
                Ok(lab) => CommandResult::success(content::render_lab(lab)),
                Err(e) => CommandResult::error(format!("{e}. Type /analysis list to see the keys.")),
            },
        }
    }

    fn handle_recipes(&self) -> CommandResult {
        if self.content.recipes.is_empty() {
            return CommandResult::error("No recipes available.");
        }

        let mut message = "🍽 Recipes:\n".to_owned();
        for recipe in &self.content.recipes {
            let _ = writeln!(message, "- {}: {}", recipe.key, recipe.title);
        }
        message.push_str("\nTo open one: /recipe <key>");
        CommandResult::success(message)
    }

    fn handle_recipe(&self, key: Option<&str>) -> CommandResult {
        let Some(key) = key else {
            let example = self.content.recipes.first().map_or("oatmeal", |r| r.key.as_str());
            return CommandResult::error(format!("Give a recipe key, e.g. /recipe {example}"));
        };

        match self.content.recipe(key) {
            Ok(recipe) => CommandResult::success(content::render_recipe(recipe)),
            Err(e) => CommandResult::error(format!("{e}. See /recipes")),
        }
    }

    async fn handle_water(&self, user_id: i64, args: WaterArgs, today: NaiveDate) -> Result<CommandResult, StateError> {
        let change = match args {
            WaterArgs::Status => return self.handle_stats(user_id, today).await,
            WaterArgs::Set(None) => return Ok(CommandResult::error("Usage: /water set <ml>, e.g. /water set 1500")),
            WaterArgs::Add(ml) => WaterChange::Add(ml),
            WaterArgs::Set(Some(ml)) => WaterChange::Set(ml),
            WaterArgs::Reset => WaterChange::Reset,
        };

        let total = self.store.record_water(user_id, change, today).await?;
        info!("Water {} for user {}: {} ml today", change.mode(), user_id, total);

        let message = match change {
            WaterChange::Add(ml) => format!("💧 Logged +{ml} ml. Today: {total} ml (goal ~{WATER_GOAL_ML} ml)."),
            WaterChange::Set(_) => format!("💧 Today's total set to {total} ml."),
            WaterChange::Reset => "💧 Today's total reset to 0 ml.".to_owned(),
        };
        Ok(CommandResult::success(message))
    }

    async fn handle_stats(&self, user_id: i64, today: NaiveDate) -> Result<CommandResult, StateError> {
        let total = self.store.get_water(user_id, today).await?;
        Ok(CommandResult::success(format!(
            "📊 Water today: {total} ml (goal ~{WATER_GOAL_ML} ml)."
        )))
    }

    async fn handle_challenges(&self, user_id: i64, today: NaiveDate) -> Result<CommandResult, StateError> {
        let record = self.store.get_or_create(user_id).await?;
        let total = record.water_on(today);
        let percent = total.saturating_mul(100) / WATER_GOAL_ML;
        let days = record.days_at_goal(WATER_GOAL_ML, today, CHALLENGE_DAYS);

        let mut message = format!(
            "🏆 {CHALLENGE_DAYS}-day water challenge: drink {WATER_GOAL_ML} ml a day.\n\
             Today: {total} / {WATER_GOAL_ML} ml ({percent}%)\n\
             Goal reached on {days} of the last {CHALLENGE_DAYS} days."
        );
        if total >= WATER_GOAL_ML {
            message.push_str("\n✅ Today's goal is done!");
        } else {
            let _ = write!(message, "\n{} ml to go today. Log it with /water", WATER_GOAL_ML - total);
        }

        Ok(CommandResult::success(message))
    }

    async fn handle_setdob(&self, user_id: i64, date: Option<&str>) -> Result<CommandResult, StateError> {
        let Some(date) = date else {
            return Ok(CommandResult::error("Usage: /setdob YYYY-MM-DD"));
        };

        let Ok(dob) = parse_date(date) else {
            return Ok(CommandResult::error("Invalid date format. Example: /setdob 1990-08-20"));
        };

        self.store
            .update_profile(user_id, &ProfilePatch::date_of_birth(dob))
            .await?;
        info!("Stored date of birth for user {}", user_id);

        Ok(CommandResult::success(format!(
            "✅ Date of birth saved: {}",
            dob.format(DATE_FORMAT)
        )))
    }

    async fn handle_biorhythm(
        &self,
        user_id: i64,
        date: Option<&str>,
        today: NaiveDate,
    ) -> Result<CommandResult, StateError> {
        let dob = match date {
            Some(text) => match parse_date(text) {
                Ok(dob) => Some(dob),
                Err(e) => return Ok(CommandResult::error(format!("{e}. Example: /biorhythm 1990-08-20"))),
            },
            None => self.store.get_or_create(user_id).await?.date_of_birth,
        };

        let message = match Biorhythm::for_birth_date(dob, today, self.settings.biorhythm_scale) {
            Ok(rhythm) => format!(
                "📈 Biorhythms for {}:\n{rhythm}\n\nDay {} of life. This is an entertainment metric; trust how you feel.",
                today.format(DATE_FORMAT),
                rhythm.days_lived
            ),
            Err(BiorhythmError::MissingBirthDate) => {
                return Ok(CommandResult::error(
                    "Set your date of birth first: /setdob YYYY-MM-DD",
                ));
            }
        };

        Ok(CommandResult::success(message))
    }

    async fn handle_profile(&self, sender: &Sender) -> Result<CommandResult, StateError> {
        let record = self.remember_identity(sender).await?;

        if !record.has_profile() {
            return Ok(CommandResult::success(format!(
                "Your profile is empty. Set it with {PROFILE_EXAMPLE}"
            )));
        }

        Ok(CommandResult::success(format_profile(&record)))
    }

    async fn handle_setprofile(&self, user_id: i64, text: &str) -> Result<CommandResult, StateError> {
        let pairs = split_pairs(text);
        if pairs.is_empty() {
            return Ok(CommandResult::error(format!("Example: {PROFILE_EXAMPLE}")));
        }

        let report = self.store.update_profile_fields(user_id, &pairs).await?;
        info!(
            "Profile update for user {}: {} applied, {} unknown, {} rejected",
            user_id,
            report.applied.len(),
            report.unrecognized.len(),
            report.rejected.len()
        );

        let mut message = if report.applied.is_empty() {
            "No fields were updated.".to_owned()
        } else {
            format!("✅ Profile updated: {}", join(&report.applied))
        };

        if !report.unrecognized.is_empty() {
            let _ = write!(message, "\nUnknown fields ignored: {}", report.unrecognized.join(", "));
        }
        for err in &report.rejected {
            let _ = write!(message, "\n⚠️ {err}");
        }
        if report.applied.is_empty() && report.rejected.is_empty() {
            let _ = write!(
                message,
                "\nRecognized fields: {}\nExample: {PROFILE_EXAMPLE}",
                join(&ProfileField::ALL)
            );
        }

        Ok(if report.applied.is_empty() {
            CommandResult::error(message)
        } else {
            CommandResult::success(message)
        })
    }

    async fn handle_adminstats(&self, user_id: i64) -> Result<CommandResult, StateError> {
        if !self.settings.is_admin(user_id) {
            warn!("User {} tried to run adminstats", user_id);
            return Ok(CommandResult::error("Access denied."));
        }

        let count = self.store.user_count().await?;
        Ok(CommandResult::success(format!(
            "Users in storage: {count}\nStorage backend: {}",
            self.settings.storage.name()
        )))
    }

    fn not_understood(&self) -> CommandResult {
        CommandResult::error("Sorry, I didn't understand that. Use the menu or /help")
            .with_keyboard(self.main_keyboard())
    }
}

/// Count choices for a topic plus a back button.
fn count_keyboard(topic: &Topic) -> Keyboard {
    Keyboard::grid(topic.count_options.iter().map(ToString::to_string), 4).with_row(BUTTON_BACK)
}

/// Converts a store failure into a reply; validation problems are shown as is.
fn state_error_reply(user_id: i64, err: &StateError) -> CommandResult {
    match err {
        StateError::Validation(e) => CommandResult::error(format!("⚠️ {e}")),
        other => {
            error!("State store failure for user {}: {}", user_id, other);
            CommandResult::error("Something went wrong. Please try again later.")
        }
    }
}

fn format_profile(record: &UserRecord) -> String {
    format!(
        "👤 Profile:\n\
         Name: {}\n\
         Sex: {}\n\
         Age: {}\n\
         Height: {} cm\n\
         Weight: {} kg\n\
         Goal: {}\n\
         Date of birth: {}",
        or_dash(record.display_name.as_ref()),
        or_dash(record.sex.as_ref()),
        or_dash(record.age),
        or_dash(record.height_cm),
        or_dash(record.weight_kg),
        or_dash(record.goal.as_ref()),
        or_dash(record.date_of_birth.map(|d| d.format(DATE_FORMAT))),
    )
}

fn or_dash<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| v.to_string())
}

fn join<T: Display>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Truncates a string to a maximum length, adding "..." if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", chars[..max_len].iter().collect::<String>())
    }
}
