use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_DIR_NAME: &str = "tutorbot";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DATABASE_FILE_NAME: &str = "tutorbot.db";

pub const ENV_CONFIG_PATH: &str = "TUTORBOT_CONFIG";
pub const ENV_API_KEY: &str = "TUTORBOT_API_KEY";
pub const ENV_DATABASE_URL: &str = "TUTORBOT_DATABASE_URL";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    OpenAi,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    /// Falls back to the provider's own default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl ProviderConfig {
    /// The api key with everything but the last four characters hidden.
    #[must_use]
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_deref().map(|key| {
            let chars: Vec<char> = key.chars().collect();
            if chars.len() <= 4 {
                "*".repeat(chars.len())
            } else {
                let tail: String = chars[chars.len() - 4..].iter().collect();
                format!("{}{tail}", "*".repeat(chars.len() - 4))
            }
        })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AgentsConfig {
    #[serde(default)]
    pub defaults: AgentDefaults,
    /// Per-feature model overrides keyed by agent name (`"tutor"`, `"five-question"`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub models: BTreeMap<String, String>,
}

impl AgentsConfig {
    #[must_use]
    pub fn model_for(&self, agent: &str) -> &str {
        self.models
            .get(agent)
            .map_or(self.defaults.model.as_str(), String::as_str)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentDefaults {
    #[serde(default = "AgentDefaults::default_model")]
    pub model: String,
    #[serde(default = "AgentDefaults::default_temperature")]
    pub temperature: f32,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            model: Self::default_model(),
            temperature: Self::default_temperature(),
        }
    }
}

impl AgentDefaults {
    fn default_model() -> String {
        "gemma3".to_string()
    }

    const fn default_temperature() -> f32 {
        0.7
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DatabaseConfig {
    /// Empty means a sqlite file next to the config file.
    #[serde(default)]
    pub url: String,
}

impl DatabaseConfig {
    #[must_use]
    pub fn sqlite_url_in(dir: &Path) -> String {
        format!("sqlite://{}?mode=rwc", dir.join(DATABASE_FILE_NAME).display())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "HistoryConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "HistoryConfig::default_history_limit")]
    pub history_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            history_limit: Self::default_history_limit(),
        }
    }
}

impl HistoryConfig {
    const fn default_enabled() -> bool {
        true
    }

    const fn default_history_limit() -> usize {
        20
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DocumentConfig {
    /// `null` reads every page.
    #[serde(default = "DocumentConfig::default_max_pages")]
    pub max_pages: Option<usize>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            max_pages: Self::default_max_pages(),
        }
    }
}

impl DocumentConfig {
    #[allow(clippy::unnecessary_wraps)]
    const fn default_max_pages() -> Option<usize> {
        Some(2)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "ServerConfig::default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_secs: None,
            max_upload_bytes: Self::default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    const fn default_port() -> u16 {
        8000
    }

    const fn default_max_upload_bytes() -> usize {
        5 * 1024 * 1024
    }
}

const CONFIG_TEMPLATE: &str = r#"{
  "provider": {
    "kind": "ollama",
    "base_url": "http://localhost:11434"
  },
  "agents": {
    "defaults": {
      "model": "gemma3",
      "temperature": 0.7
    },
    "models": {}
  },
  "database": {
    "url": ""
  },
  "history": {
    "enabled": true,
    "history_limit": 20
  },
  "document": {
    "max_pages": 2
  },
  "server": {
    "host": "127.0.0.1",
    "port": 8000,
    "max_upload_bytes": 5242880
  }
}"#;

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join(CONFIG_DIR_NAME))
    }

    /// `$TUTORBOT_CONFIG` when set, `~/tutorbot/config.json` otherwise.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        if let Some(path) = std::env::var(ENV_CONFIG_PATH)
            .ok()
            .filter(|p| !p.is_empty())
        {
            return Ok(PathBuf::from(path));
        }
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'tutorbot init' to create config.",
                path.display()
            );
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {e}", path.display()))?;

        if config.database.url.is_empty() {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            config.database.url = DatabaseConfig::sqlite_url_in(dir);
        }
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Applies environment overrides, looked up through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            debug!("Using api key from {}", ENV_API_KEY);
            self.provider.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_DATABASE_URL).filter(|v| !v.is_empty()) {
            debug!("Using database url from {}", ENV_DATABASE_URL);
            self.database.url = url;
        }
    }

    pub fn create_config() -> anyhow::Result<PathBuf> {
        let path = Self::config_path()?;
        Self::create_config_at(&path)?;
        Ok(path)
    }

    pub fn create_config_at(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                path.display()
            );
        }
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, CONFIG_TEMPLATE)?;
        Ok(())
    }
}
