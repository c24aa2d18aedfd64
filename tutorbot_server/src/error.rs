use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{FormRejection, JsonRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use tutorbot_core::ProfileError;
use tutorbot_features::{DocumentError, FeatureError};
use tutorbot_history::HistoryError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("Invalid JSON body: {0}")]
    Json(#[from] JsonRejection),

    #[error("Invalid form body: {0}")]
    UrlEncoded(#[from] FormRejection),

    #[error("Invalid multipart request: {0}")]
    MultipartForm(#[from] MultipartRejection),

    #[error("Invalid multipart request: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        Self::Feature(FeatureError::Profile(err))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl ApiError {
    pub fn missing(field: &str) -> Self {
        Self::BadRequest(format!("Missing field: {field}"))
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Json(e) => e.status(),
            Self::UrlEncoded(e) => e.status(),
            Self::MultipartForm(e) => e.status(),
            Self::Multipart(e) => e.status(),
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::History(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Feature(e) => match e {
                FeatureError::MissingInput(_)
                | FeatureError::Profile(_)
                | FeatureError::ChatUnsupported(_) => StatusCode::BAD_REQUEST,
                FeatureError::Document(DocumentError::NotFound(_)) => StatusCode::NOT_FOUND,
                FeatureError::Document(DocumentError::Task(_)) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                FeatureError::Document(_) => StatusCode::BAD_REQUEST,
                FeatureError::Model(_) => StatusCode::BAD_GATEWAY,
                FeatureError::HistoryDisabled => StatusCode::SERVICE_UNAVAILABLE,
                FeatureError::Template(_) | FeatureError::Shape(_) | FeatureError::History(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed with {}: {}", status, self);
        } else {
            warn!("Request rejected with {}: {}", status, self);
        }

        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutorbot_core::ShapeError;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            ApiError::missing("topic").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(FeatureError::Model(anyhow::anyhow!("down"))).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(FeatureError::Document(DocumentError::NotFound(
                "x.pdf".into()
            )))
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(FeatureError::Document(DocumentError::Empty)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(FeatureError::Shape(ShapeError::Empty { what: "examples" })).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::Timeout(5).status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
