//! Static wellness content: topics, lab reference and recipes.
//!
//! Content is loaded once at startup from a JSON file, or taken from the
//! built-in example set, and never changes afterwards.

mod builtin;
mod format;
mod store;

pub use format::{chunk, format_block, render_lab, render_recipe, render_topic, select_sample};
pub use store::{
    ContentEntry, ContentError, ContentStore, LabReference, Layout, MAX_COUNT, RESERVED_KEYS, Recipe, Topic,
};
