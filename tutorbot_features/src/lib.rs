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

//! Learning features built on the prompt adapter.
//!
//! Single-shot features fill one template and post-process the reply.
//! Features with a chat mode additionally replay stored turns for a
//! (feature, user, thread) key and record the new exchange.

mod assistant;
mod conversation;
mod document;
mod error;
mod output;

pub use assistant::Assistant;
pub use conversation::{ConversationManager, HistoryWindow, chat_message};
pub use document::{DocumentError, PdfExtractor};
pub use error::FeatureError;
pub use output::{
    AdaptiveContent, ChatReply, ChatRequest, Examples, Explanation, Proofread, Questions, Starters,
    StudyPlan, Summary, TextSource,
};
