//! Markdown cleanup for model output.

use regex::Regex;
use std::sync::OnceLock;

static BOLD: OnceLock<Regex> = OnceLock::new();
static ITALIC: OnceLock<Regex> = OnceLock::new();
static BULLET: OnceLock<Regex> = OnceLock::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn bold() -> &'static Regex {
    BOLD.get_or_init(|| {
        Regex::new(r"\*\*(.*?)\*\*").expect("Static regex pattern is guaranteed to be valid")
    })
}

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn italic() -> &'static Regex {
    ITALIC.get_or_init(|| {
        Regex::new(r"\*(.*?)\*").expect("Static regex pattern is guaranteed to be valid")
    })
}

// Repeated markers ("- - item", "* - item") are consumed in one match.
#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn bullet() -> &'static Regex {
    BULLET.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:[*\-]\s*)+").expect("Static regex pattern is guaranteed to be valid")
    })
}

/// Strip `**bold**`, `*italic*` and leading bullet markers, then trim.
///
/// Applying this twice gives the same result as applying it once.
#[must_use]
pub fn clean_output(text: &str) -> String {
    let text = bold().replace_all(text, "$1");
    let text = italic().replace_all(&text, "$1");
    let text = bullet().replace_all(&text, "");
    text.trim().to_string()
}
