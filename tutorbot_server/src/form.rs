//! Request bodies: JSON or urlencoded prompts and multipart document forms.

use axum::{
    Form as UrlEncoded, Json,
    extract::{FromRequest, Multipart, Request},
    http::header,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;
use tutorbot_core::GradeLevel;
use tutorbot_features::{ChatRequest, TextSource};

use crate::error::ApiError;

const UPLOAD_FIELDS: [&str; 2] = ["pdf_file", "pdf"];
const PATH_FIELD: &str = "pdf_path";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    #[serde(alias = "single")]
    Manual,
    Chat,
}

impl Mode {
    fn parse(value: Option<&str>) -> Result<Self, ApiError> {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            None | Some("" | "manual" | "single") => Ok(Self::Manual),
            Some("chat") => Ok(Self::Chat),
            Some(other) => Err(ApiError::BadRequest(format!("Unknown mode: {other}"))),
        }
    }
}

/// User and thread ids arrive as numbers or strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(i64),
    Text(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Body of the JSON prompt endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptRequest {
    pub grade_level: String,
    #[serde(alias = "prompt", alias = "goal")]
    pub topic: String,
    #[serde(default)]
    pub mode: Mode,
    pub user_id: Option<Id>,
    #[serde(alias = "message_id")]
    pub thread_id: Option<Id>,
    #[serde(alias = "current_message")]
    pub message: Option<String>,
}

impl PromptRequest {
    pub fn grade(&self) -> Result<GradeLevel, ApiError> {
        Ok(self.grade_level.parse()?)
    }

    pub fn chat_request(&self) -> Result<ChatRequest, ApiError> {
        let user_id = self
            .user_id
            .as_ref()
            .ok_or_else(|| ApiError::missing("user_id"))?;
        let thread_id = self
            .thread_id
            .as_ref()
            .ok_or_else(|| ApiError::missing("thread_id"))?;
        Ok(ChatRequest {
            user_id: user_id.to_string(),
            thread_id: thread_id.to_string(),
            grade: self.grade()?,
            topic: self.topic.clone(),
            message: self.message.clone().unwrap_or_else(|| self.topic.clone()),
        })
    }
}

/// A prompt body sent as JSON or as `application/x-www-form-urlencoded`.
#[derive(Debug, Clone)]
pub struct PromptBody(pub PromptRequest);

fn is_urlencoded(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

impl<S> FromRequest<S> for PromptBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_urlencoded(&req) {
            let UrlEncoded(body) = UrlEncoded::<PromptRequest>::from_request(req, state).await?;
            return Ok(Self(body));
        }
        let Json(body) = Json::<PromptRequest>::from_request(req, state).await?;
        Ok(Self(body))
    }
}

/// A parsed `multipart/form-data` body.
#[derive(Debug, Default)]
pub struct Form {
    fields: HashMap<String, String>,
    upload: Option<Vec<u8>>,
}

impl Form {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if UPLOAD_FIELDS.contains(&name.as_str()) {
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    debug!("Received upload {} of {} bytes", name, bytes.len());
                    form.upload = Some(bytes.to_vec());
                }
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            fields: pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            upload: None,
        }
    }

    /// First non-blank value among `names`.
    #[must_use]
    pub fn text(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|name| self.fields.get(*name))
            .map(String::as_str)
            .find(|v| !v.trim().is_empty())
    }

    pub fn required(&self, names: &[&str]) -> Result<&str, ApiError> {
        self.text(names).ok_or_else(|| ApiError::missing(names[0]))
    }

    pub fn mode(&self) -> Result<Mode, ApiError> {
        Mode::parse(self.text(&["mode"]))
    }

    /// An uploaded file wins over a server-side path, which wins over text.
    pub fn source(&mut self, text_fields: &[&str]) -> TextSource {
        if let Some(bytes) = self.upload.take() {
            return TextSource::PdfBytes(bytes);
        }
        if let Some(path) = self.text(&[PATH_FIELD]) {
            return TextSource::PdfPath(PathBuf::from(path.trim()));
        }
        TextSource::Text(self.text(text_fields).unwrap_or_default().to_string())
    }

    pub fn chat_request(&self, topic_fields: &[&str]) -> Result<ChatRequest, ApiError> {
        let grade = self.required(&["grade_level"])?.parse()?;
        let topic = self.text(topic_fields).unwrap_or_default().to_string();
        let message = self
            .text(&["message", "current_message"])
            .map_or_else(|| topic.clone(), str::to_string);
        Ok(ChatRequest {
            user_id: self.required(&["user_id"])?.trim().to_string(),
            thread_id: self.required(&["thread_id", "message_id"])?.trim().to_string(),
            grade,
            topic,
            message,
        })
    }
}
