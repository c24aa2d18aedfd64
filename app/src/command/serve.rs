use std::time::Duration;
use tracing::info;
use tutorbot_server::AppState;

use super::init_common_components;

#[derive(Debug, Clone, Default)]
pub struct ServeInput {
    /// Overrides `server.host`.
    pub host: Option<String>,
    /// Overrides `server.port`.
    pub port: Option<u16>,
}

/// Runs the HTTP API until interrupted.
#[derive(Debug, Clone, Copy)]
pub struct ServeStrategy;

impl super::CommandStrategy for ServeStrategy {
    type Input = ServeInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let common = init_common_components().await?;
        let server = &common.config.server;

        let host = input.host.unwrap_or_else(|| server.host.clone());
        let port = input.port.unwrap_or(server.port);
        let addr = tokio::net::lookup_host((host.as_str(), port))
            .await?
            .next()
            .ok_or_else(|| anyhow::anyhow!("Cannot resolve {host}:{port}"))?;

        let mut state = AppState::new(common.assistant);
        if let Some(secs) = server.request_timeout_secs {
            info!("Request timeout set to {}s", secs);
            state = state.with_request_timeout(Duration::from_secs(secs));
        }

        tutorbot_server::serve(state, addr, server.max_upload_bytes).await
    }
}
