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

//! HTTP surface for the learning features.

pub mod error;
mod form;
mod handlers;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;
use tutorbot_features::Assistant;

pub use error::ApiError;

/// Shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
    /// Upper bound on one feature call, model round trip included.
    pub request_timeout: Option<Duration>,
}

impl AppState {
    #[must_use]
    pub fn new(assistant: Assistant) -> Self {
        Self {
            assistant: Arc::new(assistant),
            request_timeout: None,
        }
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/fivequestions", post(handlers::five_questions))
        .route("/realworld", post(handlers::real_world))
        .route("/sentencestarters", post(handlers::sentence_starters))
        .route("/studyhabits", post(handlers::study_habits))
        .route("/tutor", post(handlers::tutor))
        .route("/rewriter", post(handlers::rewriter))
        .route("/adaptive-content", post(handlers::adaptive_content))
        .route("/proofreader", post(handlers::proofreader))
        .route("/summarize", post(handlers::summarize))
        .route(
            "/history/{agent}/{user_id}/{thread_id}",
            get(handlers::read_history).delete(handlers::clear_history),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(
    state: AppState,
    addr: SocketAddr,
    max_upload_bytes: usize,
) -> anyhow::Result<()> {
    let app = router(state, max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;
    Ok(())
}
