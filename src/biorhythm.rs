//! Biorhythm calculation.
//!
//! Three independent sine cycles counted from the date of birth:
//! physical (23 days), emotional (28 days) and intellectual (33 days).

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Physical cycle length in days.
pub const PHYSICAL_PERIOD: i64 = 23;

/// Emotional cycle length in days.
pub const EMOTIONAL_PERIOD: i64 = 28;

/// Intellectual cycle length in days.
pub const INTELLECTUAL_PERIOD: i64 = 33;

/// Errors reported when a biorhythm cannot be produced for a user.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BiorhythmError {
    #[error("Date of birth is not set")]
    MissingBirthDate,
}

/// How cycle values are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiorhythmScale {
    /// `(sin + 1) / 2 * 100`, in `[0, 100]`.
    #[default]
    Percent,
    /// `sin * 100`, in `[-100, 100]`.
    Signed,
}

impl BiorhythmScale {
    /// Maps a raw sine amplitude in `[-1, 1]` onto this scale.
    #[must_use]
    pub fn apply(self, amplitude: f64) -> f64 {
        match self {
            Self::Percent => (amplitude + 1.0) / 2.0 * 100.0,
            Self::Signed => amplitude * 100.0,
        }
    }

    /// Whole percent with a leading `+` for positive signed values.
    ///
    /// Rounds before picking the sign, so values near zero print as `0%`.
    #[must_use]
    pub fn format(self, value: f64) -> String {
        let rounded = value.round();
        match self {
            Self::Signed if rounded > 0.0 => format!("+{rounded:.0}%"),
            _ if rounded == 0.0 => "0%".to_owned(),
            _ => format!("{rounded:.0}%"),
        }
    }

    /// Inclusive range of values this scale produces.
    #[must_use]
    pub const fn range(self) -> (f64, f64) {
        match self {
            Self::Percent => (0.0, 100.0),
            Self::Signed => (-100.0, 100.0),
        }
    }
}

impl FromStr for BiorhythmScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "percent" | "rescaled" | "0-100" => Ok(Self::Percent),
            "signed" | "amplitude" => Ok(Self::Signed),
            other => Err(format!("unknown biorhythm scale '{other}'")),
        }
    }
}

/// Cycle values for one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biorhythm {
    /// Whole days between the birth date and the target date.
    pub days_lived: i64,
    pub physical: f64,
    pub emotional: f64,
    pub intellectual: f64,
    pub scale: BiorhythmScale,
}

impl Biorhythm {
    /// Calculates the cycles of someone born on `date_of_birth`, as of `on_date`.
    ///
    /// A birth date after `on_date` produces a negative day count; it is
    /// not rejected.
    #[must_use]
    pub fn calculate(date_of_birth: NaiveDate, on_date: NaiveDate, scale: BiorhythmScale) -> Self {
        let days_lived = (on_date - date_of_birth).num_days();
        Self {
            days_lived,
            physical: scale.apply(cycle(days_lived, PHYSICAL_PERIOD)),
            emotional: scale.apply(cycle(days_lived, EMOTIONAL_PERIOD)),
            intellectual: scale.apply(cycle(days_lived, INTELLECTUAL_PERIOD)),
            scale,
        }
    }

    /// Same as [`Biorhythm::calculate`], for a birth date that may be unset.
    pub fn for_birth_date(
        date_of_birth: Option<NaiveDate>,
        on_date: NaiveDate,
        scale: BiorhythmScale,
    ) -> Result<Self, BiorhythmError> {
        let dob = date_of_birth.ok_or(BiorhythmError::MissingBirthDate)?;
        Ok(Self::calculate(dob, on_date, scale))
    }
}

impl fmt::Display for Biorhythm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Physical: {}\nEmotional: {}\nIntellectual: {}",
            self.scale.format(self.physical),
            self.scale.format(self.emotional),
            self.scale.format(self.intellectual),
        )
    }
}

/// Raw amplitude of a cycle with `period` days after `days` days.
#[allow(clippy::cast_precision_loss)]
fn cycle(days: i64, period: i64) -> f64 {
    // Reduce first so large day counts keep full precision.
    let phase = days.rem_euclid(period) as f64 / period as f64;
    (2.0 * PI * phase).sin()
}
