//! Content tables and their validation.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::builtin;

/// Largest count a topic may offer or default to.
pub const MAX_COUNT: usize = 10;

/// Verbs handled by the dispatcher itself; topics cannot use them as keys.
pub const RESERVED_KEYS: &[&str] = &[
    "start",
    "help",
    "h",
    "topics",
    "analysis",
    "lab",
    "recipes",
    "recipe",
    "water",
    "stats",
    "challenges",
    "challenge",
    "setdob",
    "biorhythm",
    "bio",
    "profile",
    "setprofile",
    "adminstats",
];

/// Errors that can occur while loading, validating or querying content.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("No {kind} found for key '{key}'")]
    NotFound { kind: &'static str, key: String },

    #[error("No topics configured")]
    NoTopics,

    #[error("Topic '{key}' has no entries")]
    EmptyTopic { key: String },

    #[error("Topic '{key}' entry {index} has an empty title")]
    EmptyEntry { key: String, index: usize },

    #[error("Topic key '{key}' is invalid (use lowercase letters, digits and '_')")]
    InvalidKey { key: String },

    #[error("Topic key '{key}' collides with a built-in command")]
    ReservedKey { key: String },

    #[error("Topic '{key}' has invalid count {count} (must be between 1 and 10)")]
    InvalidCount { key: String, count: usize },

    #[error("Menu label '{label}' is used by more than one topic")]
    DuplicateLabel { label: String },

    #[error("Menu label '{label}' is a number or a built-in button")]
    ReservedLabel { label: String },

    #[error("Duplicate recipe key: {key}")]
    DuplicateRecipe { key: String },

    #[error("Recipe '{key}' has no ingredients or steps")]
    IncompleteRecipe { key: String },

    #[error("Failed to read content file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse content file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How a topic sample is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Each entry is a titled block of numbered lines.
    #[default]
    Blocks,
    /// Each entry is one numbered line.
    Tips,
}

/// One item of a topic: a title with ordered instruction lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentEntry {
    pub title: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<String>,
}

impl ContentEntry {
    #[must_use]
    pub fn new(title: &str, lines: &[&str]) -> Self {
        Self {
            title: title.to_owned(),
            lines: lines.iter().map(|l| (*l).to_owned()).collect(),
        }
    }

    /// An entry for a `tips` topic.
    #[must_use]
    pub fn tip(text: &str) -> Self {
        Self::new(text, &[])
    }
}

/// A group of entries served by one command and one menu button.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
    /// Text of the main-menu button.
    pub menu_label: String,

    /// First line of every rendered sample.
    pub header: String,

    #[serde(default)]
    pub layout: Layout,

    /// Sample size when the user gives none.
    #[serde(default = "default_count")]
    pub default_count: usize,

    /// Counts offered on the count keyboard.
    #[serde(default = "default_count_options")]
    pub count_options: Vec<usize>,

    pub entries: Vec<ContentEntry>,
}

fn default_count() -> usize {
    3
}

fn default_count_options() -> Vec<usize> {
    vec![3, 5, 7, 10]
}

/// Reference text for one laboratory value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabReference {
    pub name: String,

    #[serde(default)]
    pub norm: String,

    pub about: String,

    #[serde(default)]
    pub advice: String,
}

/// A recipe with optional nutrition values per serving.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    pub key: String,
    pub title: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
}

/// All static content the bot serves. Read-only after loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentStore {
    pub topics: BTreeMap<String, Topic>,

    #[serde(default)]
    pub lab_reference: BTreeMap<String, LabReference>,

    #[serde(default)]
    pub recipes: Vec<Recipe>,
}

impl ContentStore {
    /// Loads content from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let content = std::fs::read_to_string(path)?;
        let mut store: Self = serde_json::from_str(&content)?;
        store.normalize_keys();
        Ok(store)
    }

    /// Saves content to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ContentError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Lab codes are looked up case-insensitively.
    fn normalize_keys(&mut self) {
        self.lab_reference = std::mem::take(&mut self.lab_reference)
            .into_iter()
            .map(|(code, lab)| (code.to_lowercase(), lab))
            .collect();
    }

    /// Validates all tables.
    ///
    /// # Errors
    ///
    /// Returns the first validation error encountered.
    pub fn validate(&self) -> Result<(), ContentError> {
        self.validate_all()
            .into_iter()
            .find_map(|(_, result)| result.err())
            .map_or(Ok(()), Err)
    }

    /// Returns a validation result per topic, followed by one per recipe.
    #[must_use]
    pub fn validate_all(&self) -> Vec<(String, Result<(), ContentError>)> {
        let mut results = Vec::new();

        if self.topics.is_empty() {
            results.push(("topics".to_owned(), Err(ContentError::NoTopics)));
            return results;
        }

        let mut seen_labels = HashSet::new();
        for (key, topic) in &self.topics {
            let label = topic.menu_label.as_str();
            let result = if is_reserved_label(label) {
                Err(ContentError::ReservedLabel {
                    label: label.to_owned(),
                })
            } else if seen_labels.insert(label) {
                validate_topic(key, topic)
            } else {
                Err(ContentError::DuplicateLabel {
                    label: label.to_owned(),
                })
            };
            results.push((format!("topic {key}"), result));
        }

        let mut seen_recipes = HashSet::new();
        for recipe in &self.recipes {
            let result = if !seen_recipes.insert(recipe.key.as_str()) {
                Err(ContentError::DuplicateRecipe {
                    key: recipe.key.clone(),
                })
            } else if recipe.ingredients.is_empty() || recipe.steps.is_empty() {
                Err(ContentError::IncompleteRecipe {
                    key: recipe.key.clone(),
                })
            } else {
                Ok(())
            };
            results.push((format!("recipe {}", recipe.key), result));
        }

        results
    }

    /// Finds a topic by key, ignoring case.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&Topic> {
        self.topics.get(&key.to_lowercase())
    }

    /// Finds the topic whose menu button has exactly this label.
    #[must_use]
    pub fn topic_by_label(&self, label: &str) -> Option<(&str, &Topic)> {
        self.topics
            .iter()
            .find(|(_, topic)| topic.menu_label == label)
            .map(|(key, topic)| (key.as_str(), topic))
    }

    /// Topic keys in sorted order.
    #[must_use]
    pub fn list_keys(&self) -> Vec<&str> {
        self.topics.keys().map(String::as_str).collect()
    }

    /// Lab reference entry for `code`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotFound`] for unknown codes.
    pub fn lab(&self, code: &str) -> Result<&LabReference, ContentError> {
        self.lab_reference
            .get(&code.to_lowercase())
            .ok_or_else(|| ContentError::NotFound {
                kind: "lab reference",
                key: code.to_owned(),
            })
    }

    /// Lab codes in sorted order.
    #[must_use]
    pub fn lab_codes(&self) -> Vec<&str> {
        self.lab_reference.keys().map(String::as_str).collect()
    }

    /// Recipe with exactly this key.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotFound`] for unknown keys.
    pub fn recipe(&self, key: &str) -> Result<&Recipe, ContentError> {
        self.recipes
            .iter()
            .find(|r| r.key == key)
            .ok_or_else(|| ContentError::NotFound {
                kind: "recipe",
                key: key.to_owned(),
            })
    }

    /// Built-in content set used when no content file exists.
    #[must_use]
    pub fn example() -> Self {
        let mut store = Self {
            topics: builtin::topics(),
            lab_reference: builtin::lab_reference(),
            recipes: builtin::recipes(),
        };
        store.normalize_keys();
        store
    }
}

/// Labels the menu would read as a count or a fixed button instead of a topic.
fn is_reserved_label(label: &str) -> bool {
    let label = label.trim();
    crate::commands::FIXED_BUTTONS.contains(&label) || label.parse::<usize>().is_ok()
}

fn validate_topic(key: &str, topic: &Topic) -> Result<(), ContentError> {
    let valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !valid_key {
        return Err(ContentError::InvalidKey { key: key.to_owned() });
    }

    if RESERVED_KEYS.contains(&key) {
        return Err(ContentError::ReservedKey { key: key.to_owned() });
    }

    if topic.entries.is_empty() {
        return Err(ContentError::EmptyTopic { key: key.to_owned() });
    }

    if let Some(index) = topic.entries.iter().position(|e| e.title.trim().is_empty()) {
        return Err(ContentError::EmptyEntry {
            key: key.to_owned(),
            index,
        });
    }

    let counts = std::iter::once(topic.default_count).chain(topic.count_options.iter().copied());
    for count in counts {
        if count == 0 || count > MAX_COUNT {
            return Err(ContentError::InvalidCount {
                key: key.to_owned(),
                count,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(entries: Vec<ContentEntry>) -> Topic {
        Topic {
            menu_label: "Test".to_owned(),
            header: "Header".to_owned(),
            layout: Layout::Blocks,
            default_count: 3,
            count_options: default_count_options(),
            entries,
        }
    }

    fn store_with(key: &str, topic: Topic) -> ContentStore {
        ContentStore {
            topics: BTreeMap::from([(key.to_owned(), topic)]),
            lab_reference: BTreeMap::new(),
            recipes: Vec::new(),
        }
    }

    #[test]
    fn test_example_is_valid() {
        let store = ContentStore::example();
        assert!(store.validate().is_ok());
        assert!(store.lookup("exercise").is_some());
        assert!(store.lookup("EXERCISE").is_some());
        assert!(store.lab("Ferritin").is_ok());
        assert!(!store.recipes.is_empty());
    }

    #[test]
    fn test_validation_no_topics() {
        let store = ContentStore {
            topics: BTreeMap::new(),
            lab_reference: BTreeMap::new(),
            recipes: Vec::new(),
        };
        assert!(matches!(store.validate(), Err(ContentError::NoTopics)));
    }

    #[test]
    fn test_validation_empty_topic() {
        let store = store_with("stretch", topic(vec![]));
        assert!(matches!(store.validate(), Err(ContentError::EmptyTopic { .. })));
    }

    #[test]
    fn test_validation_reserved_key() {
        let store = store_with("water", topic(vec![ContentEntry::tip("Drink")]));
        assert!(matches!(store.validate(), Err(ContentError::ReservedKey { .. })));
    }

    #[test]
    fn test_validation_invalid_key() {
        let store = store_with("Deep Sleep", topic(vec![ContentEntry::tip("Rest")]));
        assert!(matches!(store.validate(), Err(ContentError::InvalidKey { .. })));
    }

    #[test]
    fn test_validation_count_out_of_range() {
        let mut t = topic(vec![ContentEntry::tip("Walk")]);
        t.count_options = vec![5, 20];
        let store = store_with("walks", t);
        assert!(matches!(
            store.validate(),
            Err(ContentError::InvalidCount { count: 20, .. })
        ));
    }

    #[test]
    fn test_validation_reserved_label() {
        for label in ["Back", "ℹ️ Help", "💧 Water", "7", " 10 "] {
            let mut t = topic(vec![ContentEntry::tip("Stretch")]);
            t.menu_label = label.to_owned();
            let store = store_with("stretch", t);
            assert!(
                matches!(store.validate(), Err(ContentError::ReservedLabel { .. })),
                "{label}"
            );
        }

        let mut t = topic(vec![ContentEntry::tip("Stretch")]);
        t.menu_label = "7 minute workout".to_owned();
        assert!(store_with("stretch", t).validate().is_ok());
    }

    #[test]
    fn test_validation_duplicate_recipe() {
        let mut store = ContentStore::example();
        let first = store.recipes[0].clone();
        store.recipes.push(first);
        assert!(matches!(store.validate(), Err(ContentError::DuplicateRecipe { .. })));
    }

    #[test]
    fn test_missing_recipe_and_lab() {
        let store = ContentStore::example();
        assert!(matches!(store.recipe("nope"), Err(ContentError::NotFound { kind: "recipe", .. })));
        assert!(matches!(store.lab("nope"), Err(ContentError::NotFound { .. })));
    }

    #[test]
    fn test_topic_by_label() {
        let store = ContentStore::example();
        let label = store.topics["yoga"].menu_label.clone();
        let (key, _) = store.topic_by_label(&label).unwrap();
        assert_eq!(key, "yoga");
        assert!(store.topic_by_label("no such button").is_none());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.json");

        let store = ContentStore::example();
        store.save_to_file(&path).unwrap();

        let loaded = ContentStore::load_from_file(&path).unwrap();
        assert_eq!(loaded.list_keys(), store.list_keys());
        assert_eq!(loaded.lab_codes(), store.lab_codes());
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let json = r#"{
            "topics": {
                "stretch": {
                    "menu_label": "Stretch",
                    "header": "Stretching",
                    "entries": [{"title": "Neck rolls"}]
                }
            },
            "lab_reference": {"TSH": {"name": "TSH", "about": "Thyroid screening."}}
        }"#;
        let mut store: ContentStore = serde_json::from_str(json).unwrap();
        store.normalize_keys();

        let topic = store.lookup("stretch").unwrap();
        assert_eq!(topic.layout, Layout::Blocks);
        assert_eq!(topic.default_count, 3);
        assert_eq!(topic.count_options, vec![3, 5, 7, 10]);
        assert!(store.lab("tsh").is_ok());
        assert!(store.validate().is_ok());
    }
}
