use serde::Serialize;
use std::path::PathBuf;

/// Where a feature's input text comes from.
#[derive(Debug, Clone)]
pub enum TextSource {
    Text(String),
    PdfPath(PathBuf),
    PdfBytes(Vec<u8>),
}

impl TextSource {
    #[must_use]
    pub const fn is_document(&self) -> bool {
        matches!(self, Self::PdfPath(_) | Self::PdfBytes(_))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Explanation {
    pub output: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AdaptiveContent {
    pub adaptive_content: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Proofread {
    pub corrected: String,
    pub changes: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Questions {
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Examples {
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Starters {
    pub starters: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StudyPlan {
    pub plan: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Summary {
    pub summary: String,
}

/// Reply of one chat turn.
///
/// `questions` is only filled for the five-question feature, and only when
/// exactly five numbered questions were found in `response`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<String>>,
}

/// Inputs of one chat turn.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub user_id: String,
    pub thread_id: String,
    pub grade: tutorbot_core::GradeLevel,
    pub topic: String,
    pub message: String,
}
