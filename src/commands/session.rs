//! Per-user dialog state for the menu flow.

use std::collections::HashMap;

use tokio::sync::Mutex;

/// Where a user is in the menu dialog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DialogState {
    /// Main menu; numbers typed here have no topic to apply to.
    #[default]
    Idle,

    /// A topic button was pressed and the count keyboard is shown.
    AwaitingCount { topic: String },
}

/// Dialog states of all users. Users without an entry are [`DialogState::Idle`].
#[derive(Debug, Default)]
pub struct SessionStore {
    states: Mutex<HashMap<i64, DialogState>>,
}

impl SessionStore {
    /// Creates an empty session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `user_id`.
    pub async fn get(&self, user_id: i64) -> DialogState {
        self.states.lock().await.get(&user_id).cloned().unwrap_or_default()
    }

    /// Sets the state of `user_id`; idle users are dropped from the map.
    pub async fn set(&self, user_id: i64, state: DialogState) {
        let mut states = self.states.lock().await;
        if state == DialogState::Idle {
            states.remove(&user_id);
        } else {
            states.insert(user_id, state);
        }
    }

    /// Returns `user_id` to the main menu.
    pub async fn reset(&self, user_id: i64) {
        self.set(user_id, DialogState::Idle).await;
    }
}
