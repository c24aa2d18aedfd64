//! Structured extraction from free-text model output.
//!
//! Models are asked for numbered questions, blank-line separated paragraphs
//! or one item per line. These parsers recover the items and the
//! `expect_*` checks turn a short result into a reported error instead of a
//! silently truncated list.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

static ITEM_START: OnceLock<Regex> = OnceLock::new();
static NEXT_ITEM: OnceLock<Regex> = OnceLock::new();
static BLANK_LINE: OnceLock<Regex> = OnceLock::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn item_start() -> &'static Regex {
    ITEM_START.get_or_init(|| {
        Regex::new(r"\b\d\.\s+").expect("Static regex pattern is guaranteed to be valid")
    })
}

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn next_item() -> &'static Regex {
    NEXT_ITEM.get_or_init(|| {
        Regex::new(r"\n\d\.").expect("Static regex pattern is guaranteed to be valid")
    })
}

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn blank_line() -> &'static Regex {
    BLANK_LINE.get_or_init(|| {
        Regex::new(r"\n\s*\n").expect("Static regex pattern is guaranteed to be valid")
    })
}

/// Output did not have the expected shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("Expected {expected} {what}, got {got}")]
    ShortList {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("No {what} generated")]
    Empty { what: &'static str },
}

/// Maximum number of numbered items kept.
pub const MAX_NUMBERED_ITEMS: usize = 5;

/// Items written as `1. text`, `2. text`, ...
///
/// An item starts at a `<digit>. ` marker and runs until the next line that
/// begins with `<digit>.` or the end of the text. Items are trimmed and at
/// most [`MAX_NUMBERED_ITEMS`] are returned.
#[must_use]
pub fn numbered_items(raw: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut rest = raw;

    while items.len() < MAX_NUMBERED_ITEMS {
        let Some(start) = item_start().find(rest) else {
            break;
        };
        let body = &rest[start.end()..];
        match next_item().find(body) {
            Some(next) => {
                items.push(body[..next.start()].trim().to_string());
                rest = &body[next.start()..];
            }
            None => {
                items.push(body.trim().to_string());
                break;
            }
        }
    }

    items
}

/// Paragraphs separated by blank lines, trimmed, empty ones dropped.
#[must_use]
pub fn paragraphs(raw: &str, max: usize) -> Vec<String> {
    blank_line()
        .split(raw)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .take(max)
        .map(str::to_string)
        .collect()
}

/// Non-empty trimmed lines.
#[must_use]
pub fn lines(raw: &str, max: usize) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(max)
        .map(str::to_string)
        .collect()
}

pub fn expect_exactly(
    items: Vec<String>,
    expected: usize,
    what: &'static str,
) -> Result<Vec<String>, ShapeError> {
    if items.len() < expected {
        return Err(ShapeError::ShortList {
            what,
            expected,
            got: items.len(),
        });
    }
    Ok(items)
}

pub fn expect_some(items: Vec<String>, what: &'static str) -> Result<Vec<String>, ShapeError> {
    if items.is_empty() {
        return Err(ShapeError::Empty { what });
    }
    Ok(items)
}

/// Text between `start` and the first `end` marker after it.
///
/// Returns `None` when either marker is missing.
#[must_use]
pub fn section<'a>(raw: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let (_, after) = raw.split_once(start)?;
    let (body, _) = after.split_once(end)?;
    Some(body)
}
