//! Command types and definitions.

use std::fmt;

/// Milliliters logged by `/water` without an amount.
pub const DEFAULT_WATER_ML: i64 = 250;

/// Author of an inbound message and the chat it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    /// Chat to answer in; user state is keyed by it.
    pub chat_id: i64,

    /// Telegram id of the author, used for admin checks.
    pub user_id: i64,

    pub first_name: Option<String>,
    pub username: Option<String>,
}

impl Sender {
    /// A private chat, where chat and author ids coincide.
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self {
            chat_id: id,
            user_id: id,
            first_name: None,
            username: None,
        }
    }

    /// Sets the Telegram names of the author.
    #[must_use]
    pub fn with_names(mut self, first_name: Option<&str>, username: Option<&str>) -> Self {
        self.first_name = first_name.map(str::to_owned);
        self.username = username.map(str::to_owned);
        self
    }

    /// Whether the message came from a one-to-one chat.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.chat_id == self.user_id
    }
}

/// Arguments of the `/water` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterArgs {
    /// Add milliliters to today's total.
    Add(i64),
    /// Overwrite today's total; `None` when the amount is missing or malformed.
    Set(Option<i64>),
    Reset,
    Status,
}

impl WaterArgs {
    fn parse(args: Option<&str>) -> Self {
        let mut parts = args.unwrap_or_default().split_whitespace();
        match parts.next().map(str::to_lowercase).as_deref() {
            None => Self::Add(DEFAULT_WATER_ML),
            Some("set") => Self::Set(parts.next().and_then(|v| v.parse().ok())),
            Some("reset" | "clear") => Self::Reset,
            Some("status" | "today") => Self::Status,
            Some(amount) => Self::Add(amount.parse().unwrap_or(DEFAULT_WATER_ML)),
        }
    }
}

/// Available bot commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Greeting with the main menu.
    Start,

    /// Show help information.
    Help,

    /// Sample entries of a content topic, e.g. `/exercise 5`.
    ///
    /// The key is not checked here; the handler resolves it against the
    /// content store.
    Topic { key: String, count: Option<usize> },

    /// List topic keys.
    Topics,

    /// Lab reference lookup; `None` shows usage.
    Analysis(Option<String>),

    /// List recipes.
    Recipes,

    /// Show one recipe; `None` shows usage.
    Recipe(Option<String>),

    Water(WaterArgs),

    /// Today's water total.
    Stats,

    /// Progress in the 7-day water challenge.
    Challenges,

    /// Store the date of birth; `None` shows usage.
    SetDob(Option<String>),

    /// Biorhythm for the given date of birth, or the stored one.
    Biorhythm(Option<String>),

    Profile,

    /// Partial profile update from `key=value` pairs.
    SetProfile(String),

    /// Number of stored users, admins only.
    AdminStats,
}

impl BotCommand {
    /// Parses a slash command, `/verb[@botname] [args]`.
    ///
    /// Returns `None` if the message is not a slash command.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let after_slash = text.strip_prefix('/')?;

        let (head, args) = match after_slash.split_once(char::is_whitespace) {
            Some((head, args)) => (head, Some(args.trim()).filter(|a| !a.is_empty())),
            None => (after_slash, None),
        };

        // Group chats address commands as /verb@botname.
        let verb = head.split_once('@').map_or(head, |(verb, _)| verb).to_lowercase();
        if verb.is_empty() {
            return None;
        }

        let first_arg = || args.and_then(|a| a.split_whitespace().next()).map(str::to_owned);

        let command = match verb.as_str() {
            "start" => Self::Start,
            "help" | "h" => Self::Help,
            "topics" => Self::Topics,
            "analysis" | "lab" => Self::Analysis(first_arg()),
            "recipes" => Self::Recipes,
            "recipe" => Self::Recipe(first_arg()),
            "water" => Self::Water(WaterArgs::parse(args)),
            "stats" => Self::Stats,
            "challenges" | "challenge" => Self::Challenges,
            "setdob" => Self::SetDob(first_arg()),
            "biorhythm" | "bio" => Self::Biorhythm(first_arg()),
            "profile" => Self::Profile,
            "setprofile" => Self::SetProfile(args.unwrap_or_default().to_owned()),
            "adminstats" => Self::AdminStats,
            _ => Self::Topic {
                key: verb.clone(),
                count: first_arg().and_then(|n| n.parse().ok()),
            },
        };

        Some(command)
    }

    /// Returns the command name as it appears in help.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Topic { key, .. } => key,
            Self::Topics => "topics",
            Self::Analysis(_) => "analysis",
            Self::Recipes => "recipes",
            Self::Recipe(_) => "recipe",
            Self::Water(_) => "water",
            Self::Stats => "stats",
            Self::Challenges => "challenges",
            Self::SetDob(_) => "setdob",
            Self::Biorhythm(_) => "biorhythm",
            Self::Profile => "profile",
            Self::SetProfile(_) => "setprofile",
            Self::AdminStats => "adminstats",
        }
    }

    /// Returns the fixed commands with their usage and descriptions.
    ///
    /// Topic commands are listed separately since they come from content.
    #[must_use]
    pub fn all_commands() -> Vec<(&'static str, &'static str)> {
        vec![
            ("/topics", "List content topics"),
            ("/analysis <key>", "Lab value reference (/analysis list for keys)"),
            ("/recipes", "List recipes"),
            ("/recipe <key>", "Show a recipe"),
            ("/water [ml]", "Log water, 250 ml by default"),
            ("/water set <ml> | reset | status", "Adjust today's water total"),
            ("/stats", "Water logged today"),
            ("/challenges", "7-day water challenge progress"),
            ("/setdob YYYY-MM-DD", "Save your date of birth"),
            ("/biorhythm [YYYY-MM-DD]", "Show today's biorhythms"),
            ("/profile", "Show your profile"),
            ("/setprofile key=value ...", "Update profile fields"),
            ("/help", "Show this help message"),
        ]
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topic { key, count: Some(n) } => write!(f, "{key} {n}"),
            Self::Analysis(Some(arg))
            | Self::Recipe(Some(arg))
            | Self::SetDob(Some(arg))
            | Self::Biorhythm(Some(arg)) => write!(f, "{} {arg}", self.name()),
            Self::Water(args) => write!(f, "water {args:?}"),
            Self::SetProfile(pairs) => write!(f, "setprofile {pairs}"),
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// A reply keyboard: rows of button labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<String>>,
}

impl Keyboard {
    /// Lays `buttons` out `per_row` to a row.
    #[must_use]
    pub fn grid<I, S>(buttons: I, per_row: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let buttons: Vec<String> = buttons.into_iter().map(Into::into).collect();
        Self {
            rows: buttons.chunks(per_row.max(1)).map(<[String]>::to_vec).collect(),
        }
    }

    /// Appends a row with a single button.
    #[must_use]
    pub fn with_row(mut self, button: impl Into<String>) -> Self {
        self.rows.push(vec![button.into()]);
        self
    }
}

/// Result of command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Response message to show the user.
    pub message: String,

    /// Keyboard to show with the reply, if it changes.
    pub keyboard: Option<Keyboard>,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            keyboard: None,
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            keyboard: None,
        }
    }

    /// Attaches a keyboard to the reply.
    #[must_use]
    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_verbs() {
        assert_eq!(BotCommand::parse("/start"), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/help"), Some(BotCommand::Help));
        assert_eq!(BotCommand::parse("/stats"), Some(BotCommand::Stats));
        assert_eq!(BotCommand::parse("/profile"), Some(BotCommand::Profile));
        assert_eq!(BotCommand::parse("/challenges"), Some(BotCommand::Challenges));
    }

    #[test]
    fn test_parse_case_and_bot_suffix() {
        assert_eq!(BotCommand::parse("/STATS"), Some(BotCommand::Stats));
        assert_eq!(BotCommand::parse("/stats@LifeRhythmBot"), Some(BotCommand::Stats));
        assert_eq!(
            BotCommand::parse("/Exercise@LifeRhythmBot 5"),
            Some(BotCommand::Topic {
                key: "exercise".to_owned(),
                count: Some(5)
            })
        );
    }

    #[test]
    fn test_parse_not_a_command() {
        assert_eq!(BotCommand::parse("stats"), None);
        assert_eq!(BotCommand::parse("/"), None);
        assert_eq!(BotCommand::parse("/@bot"), None);
        assert_eq!(BotCommand::parse(""), None);
    }

    #[test]
    fn test_parse_topic_count() {
        assert_eq!(
            BotCommand::parse("/yoga"),
            Some(BotCommand::Topic {
                key: "yoga".to_owned(),
                count: None
            })
        );
        assert_eq!(
            BotCommand::parse("/yoga many"),
            Some(BotCommand::Topic {
                key: "yoga".to_owned(),
                count: None
            })
        );
    }

    #[test]
    fn test_parse_water() {
        assert_eq!(BotCommand::parse("/water"), Some(BotCommand::Water(WaterArgs::Add(250))));
        assert_eq!(BotCommand::parse("/water 300"), Some(BotCommand::Water(WaterArgs::Add(300))));
        assert_eq!(BotCommand::parse("/water lots"), Some(BotCommand::Water(WaterArgs::Add(250))));
        assert_eq!(BotCommand::parse("/water -100"), Some(BotCommand::Water(WaterArgs::Add(-100))));
        assert_eq!(
            BotCommand::parse("/water set 1500"),
            Some(BotCommand::Water(WaterArgs::Set(Some(1500))))
        );
        assert_eq!(BotCommand::parse("/water SET"), Some(BotCommand::Water(WaterArgs::Set(None))));
        assert_eq!(BotCommand::parse("/water reset"), Some(BotCommand::Water(WaterArgs::Reset)));
        assert_eq!(BotCommand::parse("/water status"), Some(BotCommand::Water(WaterArgs::Status)));
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(
            BotCommand::parse("/analysis Ferritin extra"),
            Some(BotCommand::Analysis(Some("Ferritin".to_owned())))
        );
        assert_eq!(BotCommand::parse("/analysis"), Some(BotCommand::Analysis(None)));
        assert_eq!(BotCommand::parse("/setdob   "), Some(BotCommand::SetDob(None)));
        assert_eq!(
            BotCommand::parse("/setprofile  age=30 goal=loss "),
            Some(BotCommand::SetProfile("age=30 goal=loss".to_owned()))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(BotCommand::parse("/recipe oatmeal").unwrap().to_string(), "recipe oatmeal");
        assert_eq!(BotCommand::parse("/yoga 3").unwrap().to_string(), "yoga 3");
        assert_eq!(BotCommand::Stats.to_string(), "stats");
    }

    #[test]
    fn test_keyboard_grid() {
        let kb = Keyboard::grid(["a", "b", "c"], 2).with_row("Back");
        assert_eq!(
            kb.rows,
            vec![
                vec!["a".to_owned(), "b".to_owned()],
                vec!["c".to_owned()],
                vec!["Back".to_owned()],
            ]
        );
    }

    #[test]
    fn test_sender_privacy() {
        assert!(Sender::new(7).is_private());

        let member = Sender {
            chat_id: -100_200,
            ..Sender::new(7).with_names(Some("Ann"), None)
        };
        assert!(!member.is_private());
        assert_eq!(member.first_name.as_deref(), Some("Ann"));
    }
}
