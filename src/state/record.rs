//! User records and typed profile updates.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Date format accepted for dates typed by users.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A user-supplied value that could not be accepted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("'{value}' is not a valid number for {field}")]
    InvalidNumber { field: ProfileField, value: String },

    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: ProfileField, value: String },

    #[error("'{value}' is not a valid date, expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("{field} cannot be empty")]
    Empty { field: ProfileField },

    #[error("Amount cannot be negative: {amount} ml")]
    NegativeAmount { amount: i64 },

    #[error("Amount is too large: {amount} ml (at most 10000 ml at a time)")]
    AmountTooLarge { amount: i64 },
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        value: value.trim().to_owned(),
    })
}

/// Stored state of one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub user_id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Telegram `@username`, refreshed whenever the user greets the bot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,

    /// Milliliters of water per calendar day.
    #[serde(default)]
    pub water_by_day: BTreeMap<NaiveDate, u64>,
}

impl UserRecord {
    /// A fresh record with every optional field unset.
    #[must_use]
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            display_name: None,
            username: None,
            sex: None,
            age: None,
            height_cm: None,
            weight_kg: None,
            goal: None,
            date_of_birth: None,
            water_by_day: BTreeMap::new(),
        }
    }

    /// Merges every set field of `patch` into this record.
    pub fn apply(&mut self, patch: &ProfilePatch) {
        if let Some(name) = &patch.display_name {
            self.display_name = Some(name.clone());
        }
        if let Some(username) = &patch.username {
            self.username = Some(username.clone());
        }
        if let Some(sex) = &patch.sex {
            self.sex = Some(sex.clone());
        }
        if let Some(age) = patch.age {
            self.age = Some(age);
        }
        if let Some(height) = patch.height_cm {
            self.height_cm = Some(height);
        }
        if let Some(weight) = patch.weight_kg {
            self.weight_kg = Some(weight);
        }
        if let Some(goal) = &patch.goal {
            self.goal = Some(goal.clone());
        }
        if let Some(dob) = patch.date_of_birth {
            self.date_of_birth = Some(dob);
        }
    }

    /// Water total for `day`, 0 if nothing was recorded.
    #[must_use]
    pub fn water_on(&self, day: NaiveDate) -> u64 {
        self.water_by_day.get(&day).copied().unwrap_or(0)
    }

    /// Days in the `window` days ending on `today` whose total reached `goal_ml`.
    #[must_use]
    pub fn days_at_goal(&self, goal_ml: u64, today: NaiveDate, window: u32) -> usize {
        let Some(first) = today.checked_sub_days(Days::new(u64::from(window.saturating_sub(1)))) else {
            return 0;
        };
        self.water_by_day
            .range(first..=today)
            .filter(|(_, total)| **total >= goal_ml)
            .count()
    }

    /// Applies a water change to the bucket for `day` and returns the new total.
    pub fn apply_water(&mut self, change: WaterChange, day: NaiveDate) -> Result<u64, ValidationError> {
        change.validate()?;
        let bucket = self.water_by_day.entry(day).or_insert(0);
        *bucket = change.resolve(*bucket);
        Ok(*bucket)
    }

    /// Patch that records the Telegram identity of this user.
    ///
    /// `first_name` only fills an unset display name; a changed `username`
    /// replaces the stored one.
    #[must_use]
    pub fn identity_patch(&self, first_name: Option<&str>, username: Option<&str>) -> ProfilePatch {
        let display_name = first_name
            .map(str::trim)
            .filter(|name| !name.is_empty() && self.display_name.is_none())
            .map(str::to_owned);
        let username = username
            .map(|u| u.trim().trim_start_matches('@'))
            .filter(|u| !u.is_empty() && self.username.as_deref() != Some(*u))
            .map(str::to_owned);

        ProfilePatch {
            display_name,
            username,
            ..ProfilePatch::default()
        }
    }

    /// Whether any profile field has been set.
    #[must_use]
    pub fn has_profile(&self) -> bool {
        self.display_name.is_some()
            || self.sex.is_some()
            || self.age.is_some()
            || self.height_cm.is_some()
            || self.weight_kg.is_some()
            || self.goal.is_some()
            || self.date_of_birth.is_some()
    }
}

/// Largest amount a single water command may add or set.
pub const MAX_WATER_CHANGE_ML: i64 = 10_000;

/// How a water command changes the day's counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterChange {
    /// Add milliliters to the current total.
    Add(i64),
    /// Overwrite the total.
    Set(i64),
    /// Reset the total to zero.
    Reset,
}

impl WaterChange {
    /// Rejects negative amounts and amounts above [`MAX_WATER_CHANGE_ML`].
    pub fn validate(self) -> Result<(), ValidationError> {
        match self {
            Self::Add(amount) | Self::Set(amount) if amount < 0 => {
                Err(ValidationError::NegativeAmount { amount })
            }
            Self::Add(amount) | Self::Set(amount) if amount > MAX_WATER_CHANGE_ML => {
                Err(ValidationError::AmountTooLarge { amount })
            }
            _ => Ok(()),
        }
    }

    /// New total given the `current` one. Assumes [`WaterChange::validate`] passed.
    #[must_use]
    pub fn resolve(self, current: u64) -> u64 {
        match self {
            Self::Add(amount) => current.saturating_add(amount.unsigned_abs()),
            Self::Set(amount) => amount.unsigned_abs(),
            Self::Reset => 0,
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn mode(self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Set(_) => "set",
            Self::Reset => "reset",
        }
    }
}

/// Profile fields that can be set with `key=value` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    Name,
    Sex,
    Age,
    Height,
    Weight,
    Goal,
    DateOfBirth,
}

impl ProfileField {
    /// All fields, in display order.
    pub const ALL: [Self; 7] = [
        Self::Name,
        Self::Sex,
        Self::Age,
        Self::Height,
        Self::Weight,
        Self::Goal,
        Self::DateOfBirth,
    ];

    /// Resolves a user-typed key (case-insensitive, with aliases).
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "name" | "display_name" => Some(Self::Name),
            "sex" | "gender" => Some(Self::Sex),
            "age" => Some(Self::Age),
            "height" | "height_cm" => Some(Self::Height),
            "weight" | "weight_kg" => Some(Self::Weight),
            "goal" => Some(Self::Goal),
            "dob" | "birth" | "date_of_birth" => Some(Self::DateOfBirth),
            _ => None,
        }
    }

    /// Canonical key shown in help and reports.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Sex => "sex",
            Self::Age => "age",
            Self::Height => "height",
            Self::Weight => "weight",
            Self::Goal => "goal",
            Self::DateOfBirth => "dob",
        }
    }

    /// Coerces `value` and stores it in `patch`.
    pub fn coerce_into(self, value: &str, patch: &mut ProfilePatch) -> Result<(), ValidationError> {
        let value = value.trim();
        match self {
            Self::Name => patch.display_name = Some(self.text(value)?),
            Self::Sex => patch.sex = Some(self.text(value)?),
            Self::Goal => patch.goal = Some(self.text(value)?),
            Self::Age => {
                let age: u32 = value.parse().map_err(|_| self.invalid_number(value))?;
                if age == 0 {
                    return Err(ValidationError::NotPositive {
                        field: self,
                        value: value.to_owned(),
                    });
                }
                patch.age = Some(age);
            }
            Self::Height => patch.height_cm = Some(self.positive_number(value)?),
            Self::Weight => patch.weight_kg = Some(self.positive_number(value)?),
            Self::DateOfBirth => patch.date_of_birth = Some(parse_date(value)?),
        }
        Ok(())
    }

    fn text(self, value: &str) -> Result<String, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::Empty { field: self });
        }
        Ok(value.to_owned())
    }

    /// Integer or decimal, finite and above zero. A decimal comma is accepted.
    fn positive_number(self, value: &str) -> Result<f64, ValidationError> {
        let number: f64 = value
            .replace(',', ".")
            .parse()
            .map_err(|_| self.invalid_number(value))?;
        if !number.is_finite() {
            return Err(self.invalid_number(value));
        }
        if number <= 0.0 {
            return Err(ValidationError::NotPositive {
                field: self,
                value: value.to_owned(),
            });
        }
        Ok(number)
    }

    fn invalid_number(self, value: &str) -> ValidationError {
        ValidationError::InvalidNumber {
            field: self,
            value: value.to_owned(),
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A partial profile update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub sex: Option<String>,
    pub age: Option<u32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub goal: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl ProfilePatch {
    /// A patch that only sets the date of birth.
    #[must_use]
    pub fn date_of_birth(dob: NaiveDate) -> Self {
        Self {
            date_of_birth: Some(dob),
            ..Self::default()
        }
    }

    /// Builds a patch from raw `key=value` pairs.
    ///
    /// Unknown keys and values that fail coercion are collected in the
    /// result; every other pair ends up in the patch.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: &[(K, V)]) -> ParsedProfile
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut parsed = ParsedProfile::default();

        for (key, value) in pairs {
            let Some(field) = ProfileField::from_key(key.as_ref()) else {
                parsed.unrecognized.push(key.as_ref().to_owned());
                continue;
            };

            match field.coerce_into(value.as_ref(), &mut parsed.patch) {
                Ok(()) => {
                    if !parsed.applied.contains(&field) {
                        parsed.applied.push(field);
                    }
                }
                Err(e) => parsed.rejected.push(e),
            }
        }

        parsed
    }

    /// Whether the patch would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Outcome of parsing `key=value` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedProfile {
    pub patch: ProfilePatch,
    pub applied: Vec<ProfileField>,
    pub unrecognized: Vec<String>,
    pub rejected: Vec<ValidationError>,
}

/// Splits `key=value` tokens out of free text; tokens without `=` are skipped.
#[must_use]
pub fn split_pairs(text: &str) -> Vec<(String, String)> {
    text.split_whitespace()
        .filter_map(|part| part.split_once('='))
        .map(|(k, v)| (k.trim().to_owned(), v.trim().to_owned()))
        .collect()
}

/// Profile update result returned to the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdateReport {
    /// The record after the update.
    pub record: UserRecord,
    pub applied: Vec<ProfileField>,
    pub unrecognized: Vec<String>,
    pub rejected: Vec<ValidationError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("1990-08-20"), Ok(NaiveDate::from_ymd_opt(1990, 8, 20).unwrap()));
        assert!(matches!(parse_date("20.08.1990"), Err(ValidationError::InvalidDate { .. })));
        assert!(parse_date("1990-02-30").is_err());
    }

    #[test]
    fn test_from_pairs_mixed() {
        let parsed = ProfilePatch::from_pairs(&[
            ("height", "180"),
            ("weight", "82.5"),
            ("unknownField", "x"),
        ]);
        assert_eq!(parsed.patch.height_cm, Some(180.0));
        assert_eq!(parsed.patch.weight_kg, Some(82.5));
        assert_eq!(parsed.applied, vec![ProfileField::Height, ProfileField::Weight]);
        assert_eq!(parsed.unrecognized, vec!["unknownField".to_owned()]);
        assert!(parsed.rejected.is_empty());
    }

    #[test]
    fn test_bad_field_is_dropped_others_kept() {
        let parsed = ProfilePatch::from_pairs(&[("age", "thirty"), ("goal", "loss"), ("dob", "1990-13-01")]);
        assert_eq!(parsed.patch.goal.as_deref(), Some("loss"));
        assert_eq!(parsed.patch.age, None);
        assert_eq!(parsed.patch.date_of_birth, None);
        assert_eq!(parsed.rejected.len(), 2);
        assert!(matches!(
            parsed.rejected[0],
            ValidationError::InvalidNumber { field: ProfileField::Age, .. }
        ));
    }

    #[test]
    fn test_numbers_must_be_positive() {
        let parsed = ProfilePatch::from_pairs(&[("weight", "-3"), ("height", "inf"), ("age", "0")]);
        assert!(parsed.patch.is_empty());
        assert_eq!(parsed.rejected.len(), 3);
    }

    #[test]
    fn test_aliases_and_case() {
        let parsed = ProfilePatch::from_pairs(&[("HEIGHT_CM", "175,5"), ("Birth", "2001-01-31")]);
        assert_eq!(parsed.patch.height_cm, Some(175.5));
        assert_eq!(parsed.patch.date_of_birth, NaiveDate::from_ymd_opt(2001, 1, 31));
    }

    #[test]
    fn test_apply_merges() {
        let mut record = UserRecord::new(7);
        record.goal = Some("loss".to_owned());
        record.age = Some(30);

        record.apply(&ProfilePatch {
            height_cm: Some(180.0),
            ..ProfilePatch::default()
        });

        assert_eq!(record.goal.as_deref(), Some("loss"));
        assert_eq!(record.age, Some(30));
        assert_eq!(record.height_cm, Some(180.0));
    }

    #[test]
    fn test_split_pairs() {
        assert_eq!(
            split_pairs("sex=male  age=30 junk goal=loss"),
            vec![
                ("sex".to_owned(), "male".to_owned()),
                ("age".to_owned(), "30".to_owned()),
                ("goal".to_owned(), "loss".to_owned()),
            ]
        );
    }

    #[test]
    fn test_water_changes() {
        let mut record = UserRecord::new(1);
        assert_eq!(record.apply_water(WaterChange::Add(250), day(1)), Ok(250));
        assert_eq!(record.apply_water(WaterChange::Add(250), day(1)), Ok(500));
        assert_eq!(record.apply_water(WaterChange::Set(1000), day(1)), Ok(1000));
        assert_eq!(record.apply_water(WaterChange::Reset, day(1)), Ok(0));
        assert_eq!(record.water_on(day(2)), 0);
    }

    #[test]
    fn test_negative_water_rejected() {
        let mut record = UserRecord::new(1);
        record.apply_water(WaterChange::Add(300), day(3)).unwrap();
        assert_eq!(
            record.apply_water(WaterChange::Set(-1), day(3)),
            Err(ValidationError::NegativeAmount { amount: -1 })
        );
        assert_eq!(record.water_on(day(3)), 300);
    }

    #[test]
    fn test_identity_patch_fills_gaps_only() {
        let mut record = UserRecord::new(1);

        let patch = record.identity_patch(Some("Alex"), Some("@alex_k"));
        assert_eq!(patch.display_name.as_deref(), Some("Alex"));
        assert_eq!(patch.username.as_deref(), Some("alex_k"));
        record.apply(&patch);

        assert!(record.identity_patch(Some("Alexander"), Some("alex_k")).is_empty());
        assert!(record.identity_patch(Some("  "), None).is_empty());

        let patch = record.identity_patch(None, Some("alex_new"));
        assert_eq!(patch.display_name, None);
        assert_eq!(patch.username.as_deref(), Some("alex_new"));
    }

    #[test]
    fn test_days_at_goal_counts_window_only() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        let mut record = UserRecord::new(1);
        record.water_by_day.insert(day(1), 2500);
        record.water_by_day.insert(day(4), 2000);
        record.water_by_day.insert(day(5), 1999);
        record.water_by_day.insert(day(10), 3000);
        record.water_by_day.insert(day(11), 3000);

        assert_eq!(record.days_at_goal(2000, day(10), 7), 2);
        assert_eq!(record.days_at_goal(2000, day(3), 7), 1);
        assert_eq!(record.days_at_goal(2000, day(10), 1), 1);
        assert_eq!(UserRecord::new(2).days_at_goal(2000, day(10), 7), 0);
    }

    #[test]
    fn test_oversized_water_rejected() {
        let mut record = UserRecord::new(1);
        assert_eq!(record.apply_water(WaterChange::Add(MAX_WATER_CHANGE_ML), day(4)), Ok(10_000));
        assert_eq!(
            record.apply_water(WaterChange::Add(i64::MAX), day(4)),
            Err(ValidationError::AmountTooLarge { amount: i64::MAX })
        );
        assert_eq!(
            record.apply_water(WaterChange::Set(MAX_WATER_CHANGE_ML + 1), day(4)),
            Err(ValidationError::AmountTooLarge { amount: 10_001 })
        );
        assert_eq!(record.water_on(day(4)), 10_000);
    }

    #[test]
    fn test_record_serde_uses_iso_dates() {
        let mut record = UserRecord::new(42);
        record.date_of_birth = NaiveDate::from_ymd_opt(1990, 8, 20);
        record.apply_water(WaterChange::Add(250), day(4)).unwrap();

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"1990-08-20\""));
        assert!(json.contains("\"2024-05-04\":250"));

        let back: UserRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
