//! Multi-turn conversation support on top of the history store.
//!
//! Prior turns are replayed to the model in order, behind the feature's
//! system prompt and ahead of the new human message.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};
use tutorbot_core::{ChatMessage, GradeLevel};
use tutorbot_history::{ConversationKey, HistoryStore, Speaker, Turn};

use crate::error::FeatureError;

/// Keeps the most recent `max_turns` turns.
#[derive(Debug, Clone, Copy)]
pub struct HistoryWindow {
    max_turns: usize,
}

impl HistoryWindow {
    #[must_use]
    pub const fn new(max_turns: usize) -> Self {
        Self { max_turns }
    }

    #[must_use]
    pub fn select<'a>(&self, turns: &'a [Turn]) -> &'a [Turn] {
        &turns[turns.len().saturating_sub(self.max_turns)..]
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::new(20)
    }
}

fn to_message(turn: &Turn) -> ChatMessage {
    match turn.speaker {
        Speaker::Human => ChatMessage::user(turn.content.clone()),
        Speaker::Assistant => ChatMessage::assistant(turn.content.clone()),
    }
}

/// The human message of a chat turn.
#[must_use]
pub fn chat_message(grade: GradeLevel, topic: &str, message: &str) -> String {
    format!("Grade Level: {grade}\nTopic: {topic}\nCurrent message: {message}")
}

type KeyLocks = Arc<Mutex<HashMap<ConversationKey, Arc<Mutex<()>>>>>;

/// Loads prior turns for a key and records new ones.
///
/// Clones share one lock table, so an exchange on a key can be held
/// exclusive from the history read until both turns are written.
#[derive(Clone)]
pub struct ConversationManager {
    store: HistoryStore,
    window: HistoryWindow,
    locks: KeyLocks,
}

impl ConversationManager {
    #[must_use]
    pub fn new(store: HistoryStore, history_limit: usize) -> Self {
        Self {
            store,
            window: HistoryWindow::new(history_limit),
            locks: Arc::default(),
        }
    }

    /// Waits for exclusive use of `key`. Other keys are not blocked.
    pub async fn lock(&self, key: &ConversationKey) -> OwnedMutexGuard<()> {
        let slot = {
            let mut locks = self.locks.lock().await;
            // Entries only the table still holds have no waiter or owner.
            locks.retain(|_, slot| Arc::strong_count(slot) > 1);
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        slot.lock_owned().await
    }

    #[must_use]
    pub const fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Prior turns as chat messages. A failed read counts as no history.
    pub async fn context(&self, key: &ConversationKey) -> Vec<ChatMessage> {
        match self.store.read(key).await {
            Ok(turns) => {
                let selected = self.window.select(&turns);
                debug!(
                    "Replaying {} of {} turns for {}",
                    selected.len(),
                    turns.len(),
                    key
                );
                selected.iter().map(to_message).collect()
            }
            Err(e) => {
                warn!("Ignoring unreadable history for {}: {}", key, e);
                Vec::new()
            }
        }
    }

    /// System prompt, replayed history, then the new human message.
    pub async fn build_messages(
        &self,
        key: &ConversationKey,
        system_prompt: &str,
        human: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(system_prompt)];
        messages.extend(self.context(key).await);
        messages.push(ChatMessage::user(human));
        messages
    }

    /// Writes the human turn and its reply as one adjacent pair.
    pub async fn record(
        &self,
        key: &ConversationKey,
        human: &str,
        assistant: &str,
    ) -> Result<(), FeatureError> {
        self.store.append_exchange(key, human, assistant).await?;
        Ok(())
    }
}
