use tracing::info;
use tutorbot_config::Config;
use tutorbot_history::HistoryStore;

/// Strategy for displaying configuration information.
///
/// Secrets are masked. The database is checked with a real connection.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== tutorbot Configuration ===\n");

        println!("Provider:");
        println!("  Kind: {:?}", config.provider.kind);
        println!(
            "  Base URL: {}",
            config.provider.base_url.as_deref().unwrap_or("(provider default)")
        );
        println!(
            "  API Key: {}",
            config
                .provider
                .masked_api_key()
                .unwrap_or_else(|| "(not set)".to_string())
        );
        println!();

        println!("Database:");
        println!("  URL: {}", mask_database_url(&config.database.url));
        info!("Testing database connection");
        match HistoryStore::connect(&config.database.url).await {
            Ok(_) => println!("  Status: Connected"),
            Err(e) => {
                println!("  Status: Connection failed");
                println!("  Error: {e}");
            }
        }
        println!();

        println!("Agents:");
        println!("  Default Model: {}", config.agents.defaults.model);
        println!("  Temperature: {}", config.agents.defaults.temperature);
        for (agent, model) in &config.agents.models {
            println!("  {agent}: {model}");
        }
        println!();

        println!("History:");
        println!("  Enabled: {}", config.history.enabled);
        println!("  History Limit: {}", config.history.history_limit);
        println!();

        println!("Documents:");
        match config.document.max_pages {
            Some(pages) => println!("  Max Pages: {pages}"),
            None => println!("  Max Pages: all"),
        }
        println!();

        println!("Server:");
        println!("  Address: {}:{}", config.server.host, config.server.port);
        if let Some(secs) = config.server.request_timeout_secs {
            println!("  Request Timeout: {secs}s");
        }
        println!("  Max Upload: {} bytes", config.server.max_upload_bytes);

        Ok(())
    }
}

fn mask_database_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };

    let Some((credentials, after_at)) = rest.split_once('@') else {
        return url.to_string();
    };

    let Some((username, _password)) = credentials.split_once(':') else {
        return url.to_string();
    };

    format!("{scheme}://{username}:***@{after_at}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_hidden() {
        assert_eq!(
            mask_database_url("postgres://tutor:hunter2@db:5432/tutorbot"),
            "postgres://tutor:***@db:5432/tutorbot"
        );
    }

    #[test]
    fn urls_without_credentials_are_unchanged() {
        let url = "sqlite:///home/me/tutorbot/tutorbot.db?mode=rwc";
        assert_eq!(mask_database_url(url), url);
    }
}
