use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;
use tutorbot_core::{ChatMessage, LLMProvider, LLMResponse, Usage};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Remote endpoint speaking the OpenAI `chat/completions` dialect.
pub struct OpenAiProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    default_model: String,
    temperature: Option<f32>,
}

impl OpenAiProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        info!("Creating OpenAiProvider");
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_model: "gpt-4o-mini".to_string(),
            temperature: None,
        }
    }

    #[must_use]
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn request_body(&self, messages: &[ChatMessage], model: &str) -> Value {
        let mut body = json!({
            "model": model,
            "messages": messages,
        });
        if let Some(t) = self.temperature {
            body["temperature"] = json!(t);
        }
        body
    }

    async fn send(&self, request: &Value) -> anyhow::Result<LLMResponse> {
        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        parse_response(&response)
    }
}

fn token_count(value: &Value) -> u32 {
    u32::try_from(value.as_u64().unwrap_or(0)).unwrap_or(0)
}

fn parse_response(response: &Value) -> anyhow::Result<LLMResponse> {
    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing content"))?
        .to_string();

    let usage = response["usage"].as_object().map(|u| Usage {
        prompt_tokens: token_count(&u["prompt_tokens"]),
        completion_tokens: token_count(&u["completion_tokens"]),
        total_tokens: token_count(&u["total_tokens"]),
    });

    Ok(LLMResponse { content, usage })
}

#[async_trait]
impl LLMProvider for OpenAiProvider {
    async fn chat(&self, messages: &[ChatMessage], model: &str) -> anyhow::Result<LLMResponse> {
        let request = self.request_body(messages, model);

        info!("Sending request to chat completions API: model={}", model);
        let response = self.send(&request).await?;
        info!("Received response from chat completions API");

        Ok(response)
    }

    fn get_default_model(&self) -> &str {
        &self.default_model
    }
}
