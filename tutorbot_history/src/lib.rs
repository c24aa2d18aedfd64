#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod store;

pub use store::HistoryStore;

use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),
    #[error("Invalid role stored in history: {0}")]
    InvalidRole(String),
    #[error("History storage error: {0}")]
    Storage(#[from] DbErr),
}

pub type Result<T> = std::result::Result<T, HistoryError>;

/// Identifies one conversation: feature category, user and thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub agent: String,
    pub user_id: String,
    pub thread_id: String,
}

impl ConversationKey {
    pub fn new(
        agent: impl Into<String>,
        user_id: impl Into<String>,
        thread_id: impl Into<String>,
    ) -> Self {
        Self {
            agent: agent.into(),
            user_id: user_id.into(),
            thread_id: thread_id.into(),
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.agent, self.user_id, self.thread_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Human,
    Assistant,
}

impl Speaker {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Assistant => "assistant",
        }
    }
}

impl FromStr for Speaker {
    type Err = HistoryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "human" => Ok(Self::Human),
            "assistant" => Ok(Self::Assistant),
            other => Err(HistoryError::InvalidRole(other.to_string())),
        }
    }
}

/// A persisted turn. Never mutated after it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub id: i32,
    pub speaker: Speaker,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
