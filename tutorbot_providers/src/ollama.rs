use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;
use tutorbot_core::{ChatMessage, LLMProvider, LLMResponse, Usage};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// A locally served Ollama instance.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    default_model: String,
    temperature: f32,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        info!("Creating OllamaProvider");
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_model: "gemma3".to_string(),
            temperature: 0.7,
        }
    }

    #[must_use]
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn request_body(&self, messages: &[ChatMessage], model: &str) -> Value {
        json!({
            "model": model,
            "messages": messages,
            "stream": false,
            "options": { "temperature": self.temperature },
        })
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

fn parse_response(response: &Value) -> anyhow::Result<LLMResponse> {
    let content = response["message"]["content"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing message content"))?
        .to_string();

    let prompt = response["prompt_eval_count"].as_u64();
    let completion = response["eval_count"].as_u64();
    let usage = match (prompt, completion) {
        (None, None) => None,
        (p, c) => {
            let prompt_tokens = u32::try_from(p.unwrap_or(0)).unwrap_or(u32::MAX);
            let completion_tokens = u32::try_from(c.unwrap_or(0)).unwrap_or(u32::MAX);
            Some(Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens.saturating_add(completion_tokens),
            })
        }
    };

    Ok(LLMResponse { content, usage })
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    async fn chat(&self, messages: &[ChatMessage], model: &str) -> anyhow::Result<LLMResponse> {
        let request = self.request_body(messages, model);

        info!("Sending request to Ollama: model={}", model);
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        info!("Received response from Ollama");

        parse_response(&response)
    }

    fn get_default_model(&self) -> &str {
        &self.default_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, routing::post};

    #[test]
    fn body_disables_streaming() {
        let provider = OllamaProvider::default().with_temperature(0.2);
        let body = provider.request_body(&[ChatMessage::system("be kind")], "gemma3");
        assert_eq!(body["stream"], json!(false));
        assert_eq!(body["model"], "gemma3");
        assert_eq!(body["messages"][0]["role"], "system");
        let t = body["options"]["temperature"].as_f64().unwrap();
        assert!((t - 0.2).abs() < 1e-6);
    }

    #[test]
    fn parses_message_and_eval_counts() {
        let body = json!({
            "message": {"role": "assistant", "content": "1. Why?"},
            "prompt_eval_count": 40,
            "eval_count": 9,
            "done": true
        });
        let parsed = parse_response(&body).unwrap();
        assert_eq!(parsed.content, "1. Why?");
        let usage = parsed.usage.unwrap();
        assert_eq!(usage.total_tokens, 49);
    }

    #[test]
    fn usage_is_absent_without_counts() {
        let body = json!({"message": {"content": "hi"}});
        assert!(parse_response(&body).unwrap().usage.is_none());
    }

    #[test]
    fn error_payload_is_not_content() {
        let body = json!({"error": "model 'nope' not found"});
        assert!(parse_response(&body).is_err());
    }

    #[tokio::test]
    async fn round_trip_against_local_stub() {
        let app = Router::new().route(
            "/api/chat",
            post(|Json(body): Json<Value>| async move {
                let last = body["messages"]
                    .as_array()
                    .and_then(|m| m.last())
                    .and_then(|m| m["content"].as_str())
                    .unwrap_or_default()
                    .to_uppercase();
                Json(json!({"message": {"role": "assistant", "content": last}, "done": true}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let provider = OllamaProvider::new(format!("http://{addr}/"));
        let reply = provider
            .chat(&[ChatMessage::user("echo me")], "gemma3")
            .await
            .unwrap();
        assert_eq!(reply.content, "ECHO ME");
    }
}
