use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use docreview_core::Oracle;
use serde::Serialize;
use tracing::info;

/// Calls a locally-hosted Ollama model via its native chat API.
///
/// Intended for confidential filings where document content must not leave
/// the local machine.
pub struct OllamaBackend {
    pub base_url: String,
    pub model: String,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct OllamaMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
}

#[async_trait]
impl Oracle for OllamaBackend {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String> {
        let body = OllamaChatRequest {
            model: &self.model,
            messages: vec![OllamaMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        info!(
            model = %self.model,
            base_url = %self.base_url,
            prompt_len = prompt.len(),
            "calling ollama chat API"
        );

        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let resp = crate::send_json("ollama", self.client.post(&url).json(&body), timeout).await?;

        let output = resp["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("ollama response has no message content"))?
            .to_string();

        info!(output_len = output.len(), "ollama response received");
        Ok(output)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
