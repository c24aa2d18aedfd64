//! One-shot prompt/model call-through.

use std::collections::HashMap;
use tracing::debug;

use crate::template::PromptTemplate;
use crate::{ChatMessage, LLMProvider};

/// Renders a template and sends it as a single user message.
///
/// Holds no state between calls and applies no retry or timeout policy;
/// callers that need bounded latency wrap [`PromptAdapter::invoke`] themselves.
pub struct PromptAdapter<'a> {
    provider: &'a dyn LLMProvider,
    model: &'a str,
}

impl<'a> PromptAdapter<'a> {
    #[must_use]
    pub const fn new(provider: &'a dyn LLMProvider, model: &'a str) -> Self {
        Self { provider, model }
    }

    #[must_use]
    pub const fn model(&self) -> &str {
        self.model
    }

    pub async fn invoke(
        &self,
        template: &PromptTemplate,
        vars: &HashMap<&str, &str>,
    ) -> anyhow::Result<String> {
        let prompt = template.render(vars)?;
        debug!(
            "Invoking model {} with prompt of {} chars",
            self.model,
            prompt.len()
        );
        let response = self
            .provider
            .chat(&[ChatMessage::user(prompt)], self.model)
            .await?;
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LLMResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<(Vec<ChatMessage>, String)>>,
    }

    #[async_trait]
    impl LLMProvider for Recorder {
        async fn chat(
            &self,
            messages: &[ChatMessage],
            model: &str,
        ) -> anyhow::Result<LLMResponse> {
            self.seen
                .lock()
                .unwrap()
                .push((messages.to_vec(), model.to_string()));
            Ok(LLMResponse {
                content: "ok".to_string(),
                usage: None,
            })
        }

        fn get_default_model(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test]
    async fn sends_one_rendered_user_message() {
        let provider = Recorder {
            seen: Mutex::new(Vec::new()),
        };
        let adapter = PromptAdapter::new(&provider, "gemma3");
        let template = PromptTemplate::new("Explain {topic}");
        let vars = HashMap::from([("topic", "tides")]);

        let out = adapter.invoke(&template, &vars).await.unwrap();
        assert_eq!(out, "ok");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, vec![ChatMessage::user("Explain tides")]);
        assert_eq!(seen[0].1, "gemma3");
    }

    #[tokio::test]
    async fn missing_variable_never_reaches_the_model() {
        let provider = Recorder {
            seen: Mutex::new(Vec::new()),
        };
        let adapter = PromptAdapter::new(&provider, "gemma3");
        let template = PromptTemplate::new("Explain {topic}");

        let err = adapter.invoke(&template, &HashMap::new()).await.unwrap_err();
        assert!(err.to_string().contains("topic"));
        assert!(provider.seen.lock().unwrap().is_empty());
    }
}
