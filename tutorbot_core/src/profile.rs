//! Categorical request parameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct ProfileError {
    pub kind: &'static str,
    pub value: String,
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase().replace(['_', '-'], " ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeLevel {
    Kindergarten,
    Elementary,
    JuniorHigh,
    SeniorHigh,
    College,
}

impl GradeLevel {
    pub const ALL: [Self; 5] = [
        Self::Kindergarten,
        Self::Elementary,
        Self::JuniorHigh,
        Self::SeniorHigh,
        Self::College,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kindergarten => "kindergarten",
            Self::Elementary => "elementary",
            Self::JuniorHigh => "junior high",
            Self::SeniorHigh => "senior high",
            Self::College => "college",
        }
    }
}

impl FromStr for GradeLevel {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "kindergarten" | "kinder" => Ok(Self::Kindergarten),
            "elementary" => Ok(Self::Elementary),
            "junior high" | "middle" => Ok(Self::JuniorHigh),
            "senior high" | "high" => Ok(Self::SeniorHigh),
            "college" => Ok(Self::College),
            _ => Err(ProfileError {
                kind: "grade level",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningSpeed {
    Slow,
    Average,
    Fast,
}

impl LearningSpeed {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Average => "average",
            Self::Fast => "fast",
        }
    }

    /// Learner type label used by the rewriter, e.g. `"slow learner"`.
    #[must_use]
    pub fn learner_type(self) -> String {
        format!("{} learner", self.as_str())
    }
}

impl FromStr for LearningSpeed {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        let word = normalized.strip_suffix(" learner").unwrap_or(&normalized);
        match word {
            "slow" => Ok(Self::Slow),
            "average" => Ok(Self::Average),
            "fast" => Ok(Self::Fast),
            _ => Err(ProfileError {
                kind: "learning speed",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for LearningSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proofreading tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneProfile {
    Academic,
    Casual,
    Concise,
}

impl ToneProfile {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Casual => "casual",
            Self::Concise => "concise",
        }
    }

    #[must_use]
    pub const fn instructions(self) -> &'static str {
        match self {
            Self::Academic => "Use a formal academic tone. Avoid contractions and colloquialisms.",
            Self::Casual => "Use a casual, conversational tone. Contractions are fine.",
            Self::Concise => "Be as brief as possible while keeping meaning intact.",
        }
    }
}

impl FromStr for ToneProfile {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "academic" => Ok(Self::Academic),
            "casual" => Ok(Self::Casual),
            "concise" => Ok(Self::Concise),
            _ => Err(ProfileError {
                kind: "tone profile",
                value: s.to_string(),
            }),
        }
    }
}

/// A learning feature. Its agent name tags history turns in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    Tutor,
    Rewriter,
    Leveler,
    Proofreader,
    FiveQuestion,
    RealWorld,
    SentenceStarters,
    StudyHabits,
    Summarizer,
}

impl Feature {
    pub const ALL: [Self; 9] = [
        Self::Tutor,
        Self::Rewriter,
        Self::Leveler,
        Self::Proofreader,
        Self::FiveQuestion,
        Self::RealWorld,
        Self::SentenceStarters,
        Self::StudyHabits,
        Self::Summarizer,
    ];

    #[must_use]
    pub const fn agent_name(self) -> &'static str {
        match self {
            Self::Tutor => "tutor",
            Self::Rewriter => "rewriter",
            Self::Leveler => "leveler",
            Self::Proofreader => "proofreader",
            Self::FiveQuestion => "five-question",
            Self::RealWorld => "real-world",
            Self::SentenceStarters => "sentence-starters",
            Self::StudyHabits => "study-habits",
            Self::Summarizer => "summarizer",
        }
    }

    /// Whether the feature offers a multi-turn chat mode.
    #[must_use]
    pub const fn supports_chat(self) -> bool {
        matches!(
            self,
            Self::Tutor
                | Self::Proofreader
                | Self::FiveQuestion
                | Self::RealWorld
                | Self::SentenceStarters
                | Self::StudyHabits
        )
    }
}

impl FromStr for Feature {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|f| normalize(f.agent_name()) == wanted)
            .ok_or_else(|| ProfileError {
                kind: "feature",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.agent_name())
    }
}
