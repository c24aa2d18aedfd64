//! Prompt templates with `{name}` placeholders.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn placeholder() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{([a-z_]+)\}").expect("Static regex pattern is guaranteed to be valid")
    })
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("missing template variable: {0}")]
    MissingVariable(String),
}

/// A parsed prompt template.
///
/// Parsing happens once; `render` only substitutes. Substituted values are
/// inserted verbatim and never scanned for further placeholders, so user text
/// containing braces passes through untouched.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut variables: Vec<String> = Vec::new();
        for cap in placeholder().captures_iter(&text) {
            let name = &cap[1];
            if !variables.iter().any(|v| v == name) {
                variables.push(name.to_string());
            }
        }
        Self { text, variables }
    }

    /// Variable names in order of first appearance.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn render(&self, vars: &HashMap<&str, &str>) -> Result<String, TemplateError> {
        if let Some(missing) = self
            .variables
            .iter()
            .find(|name| !vars.contains_key(name.as_str()))
        {
            return Err(TemplateError::MissingVariable(missing.clone()));
        }

        let rendered = placeholder().replace_all(&self.text, |cap: &regex::Captures<'_>| {
            vars.get(&cap[1]).copied().unwrap_or_default().to_string()
        });

        Ok(rendered.into_owned())
    }
}
