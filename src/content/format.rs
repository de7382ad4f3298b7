//! Sampling and text rendering for content replies.

use std::fmt::Write as _;

use rand::Rng;
use rand::seq::SliceRandom;

use super::store::{ContentEntry, LabReference, Layout, MAX_COUNT, Recipe, Topic};

/// Draws up to `requested` distinct items from `pool`.
///
/// `requested` is clamped to `[1, min(MAX_COUNT, pool.len())]`; an empty
/// pool gives an empty sample.
pub fn select_sample<'a, T, R>(pool: &'a [T], requested: usize, rng: &mut R) -> Vec<&'a T>
where
    R: Rng + ?Sized,
{
    if pool.is_empty() {
        return Vec::new();
    }

    let count = requested.clamp(1, MAX_COUNT.min(pool.len()));
    pool.choose_multiple(rng, count).collect()
}

/// Renders a titled block of numbered lines.
#[must_use]
pub fn format_block(title: &str, lines: &[String]) -> String {
    let mut out = format!("• {title}\n");
    for (i, line) in lines.iter().enumerate() {
        let _ = writeln!(out, "  {}. {line}", i + 1);
    }
    out
}

/// Renders a topic sample under the topic header.
#[must_use]
pub fn render_topic(topic: &Topic, sample: &[&ContentEntry]) -> String {
    let mut out = format!("{}\n\n", topic.header);

    match topic.layout {
        Layout::Blocks => {
            for entry in sample {
                out.push_str(&format_block(&entry.title, &entry.lines));
                out.push('\n');
            }
        }
        Layout::Tips => {
            for (i, entry) in sample.iter().enumerate() {
                let _ = writeln!(out, "{}. {}", i + 1, entry.title);
            }
        }
    }

    out
}

/// Renders one lab reference entry.
#[must_use]
pub fn render_lab(lab: &LabReference) -> String {
    let mut out = format!("🧪 {}\n", lab.name);
    if !lab.norm.is_empty() {
        let _ = writeln!(out, "Reference range: {}", lab.norm);
    }
    let _ = writeln!(out, "{}", lab.about);
    if !lab.advice.is_empty() {
        let _ = writeln!(out, "\nAdvice: {}", lab.advice);
    }
    out.push_str("\nThese are general guidelines, not a substitute for a doctor.");
    out
}

/// Renders a full recipe.
#[must_use]
pub fn render_recipe(recipe: &Recipe) -> String {
    let mut out = format!("🍽 {}\n\nIngredients:\n", recipe.title);
    for item in &recipe.ingredients {
        let _ = writeln!(out, "- {item}");
    }

    out.push_str("\nSteps:\n");
    for (i, step) in recipe.steps.iter().enumerate() {
        let _ = writeln!(out, "{}. {step}", i + 1);
    }

    let dash = || "-".to_owned();
    let _ = write!(
        out,
        "\nCalories: ~{} kcal | P: {} g F: {} g C: {} g",
        recipe.calories.map_or_else(dash, |v| v.to_string()),
        recipe.protein.map_or_else(dash, |v| v.to_string()),
        recipe.fat.map_or_else(dash, |v| v.to_string()),
        recipe.carbs.map_or_else(dash, |v| v.to_string()),
    );
    out
}

/// Splits `text` into pieces of at most `limit` characters.
///
/// Each cut is placed right after the last newline inside the window, or
/// at exactly `limit` characters when the window has none. The pieces
/// concatenate back to `text`.
#[must_use]
pub fn chunk(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut pieces = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let window_end = rest.char_indices().nth(limit).map_or(rest.len(), |(i, _)| i);
        if window_end == rest.len() {
            pieces.push(rest.to_owned());
            break;
        }

        let cut = rest[..window_end].rfind('\n').map_or(window_end, |i| i + 1);
        pieces.push(rest[..cut].to_owned());
        rest = &rest[cut..];
    }

    pieces
}
