//! Static strategy pattern for CLI commands.
//!
//! Each command is its own strategy type with its own input, dispatched
//! statically from `main`.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};
use tutorbot_config::{Config, ProviderKind};
use tutorbot_core::{Feature, LLMProvider};
use tutorbot_features::{Assistant, ConversationManager, TextSource};
use tutorbot_history::HistoryStore;
use tutorbot_providers::{
    OLLAMA_DEFAULT_BASE_URL, OPENAI_DEFAULT_BASE_URL, OllamaProvider, OpenAiProvider,
};

mod ask;
mod chat;
mod history;
mod info;
mod init;
mod repl;
mod serve;
mod version;

pub use ask::{AskInput, AskStrategy};
pub use chat::{ChatInput, ChatStrategy};
pub use history::{HistoryAction, HistoryInput, HistoryStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use repl::{ReplFeature, ReplStrategy};
pub use serve::{ServeInput, ServeStrategy};
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Components shared by every command that talks to a model.
struct CommonComponents {
    config: Config,
    assistant: Assistant,
}

async fn init_common_components() -> anyhow::Result<CommonComponents> {
    let config = Config::load()?;
    let provider = build_provider(&config);
    info!(
        "Using {:?} provider with default model {}",
        config.provider.kind, config.agents.defaults.model
    );

    let mut assistant = Assistant::new(provider, config.agents.defaults.model.clone())
        .with_max_pages(config.document.max_pages);

    for (agent, model) in &config.agents.models {
        match agent.parse::<Feature>() {
            Ok(feature) => assistant = assistant.with_model(feature, model.clone()),
            Err(e) => warn!("Ignoring model override: {}", e),
        }
    }

    if config.history.enabled {
        let store = open_store(&config).await?;
        assistant = assistant.with_conversations(ConversationManager::new(
            store,
            config.history.history_limit,
        ));
    } else {
        info!("Conversation history disabled");
    }

    Ok(CommonComponents { config, assistant })
}

fn build_provider(config: &Config) -> Arc<dyn LLMProvider> {
    let temperature = config.agents.defaults.temperature;
    let model = config.agents.defaults.model.clone();
    match config.provider.kind {
        ProviderKind::Ollama => {
            let base = config
                .provider
                .base_url
                .clone()
                .unwrap_or_else(|| OLLAMA_DEFAULT_BASE_URL.to_string());
            Arc::new(
                OllamaProvider::new(base)
                    .with_default_model(model)
                    .with_temperature(temperature),
            )
        }
        ProviderKind::OpenAi => {
            let base = config
                .provider
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_DEFAULT_BASE_URL.to_string());
            Arc::new(
                OpenAiProvider::new(base, config.provider.api_key.clone())
                    .with_default_model(model)
                    .with_temperature(temperature),
            )
        }
    }
}

/// Connects the history database, creating tables and agent rows as needed.
async fn open_store(config: &Config) -> anyhow::Result<HistoryStore> {
    let store = HistoryStore::connect(&config.database.url).await?;
    store.ensure_schema().await?;
    for feature in Feature::ALL {
        store.register_agent(feature.agent_name()).await?;
    }
    Ok(store)
}

/// Picks a document over inline text.
fn text_source(text: Option<String>, pdf: Option<PathBuf>) -> TextSource {
    pdf.map_or_else(
        || TextSource::Text(text.unwrap_or_default()),
        TextSource::PdfPath,
    )
}

/// Line-oriented terminal input.
struct Prompter {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompter {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Prints `label` and reads one trimmed line. `None` at end of input.
    async fn ask(&mut self, label: &str) -> anyhow::Result<Option<String>> {
        print!("{label}");
        std::io::stdout().flush()?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }
}

fn is_exit(input: &str) -> bool {
    matches!(input, "exit" | "quit" | "q")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_path_wins_over_text() {
        let source = text_source(Some("hello".into()), Some(PathBuf::from("a.pdf")));
        assert!(matches!(source, TextSource::PdfPath(p) if p == PathBuf::from("a.pdf")));

        let source = text_source(None, None);
        assert!(matches!(source, TextSource::Text(t) if t.is_empty()));
    }

    #[test]
    fn provider_follows_config_kind() {
        let mut config = Config::default();
        assert_eq!(build_provider(&config).get_default_model(), "gemma3");

        config.provider.kind = ProviderKind::OpenAi;
        config.agents.defaults.model = "llama3.1".to_string();
        assert_eq!(build_provider(&config).get_default_model(), "llama3.1");
    }

    #[test]
    fn exit_words() {
        assert!(is_exit("quit"));
        assert!(!is_exit("question"));
    }
}
