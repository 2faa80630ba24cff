use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use docreview_core::Oracle;
use serde_json::json;
use tracing::info;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";

/// Anthropic Messages API, single user turn.
pub struct AnthropicBackend {
    api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: ANTHROPIC_API_URL.into(),
            max_tokens: 4096,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Oracle for AnthropicBackend {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String> {
        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{"role": "user", "content": prompt}]
        });

        info!(model = %self.model, prompt_len = prompt.len(), "calling anthropic messages API");

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let request = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body);
        let resp = crate::send_json("anthropic", request, timeout).await?;

        let output = resp["content"][0]["text"]
            .as_str()
            .ok_or_else(|| anyhow!("anthropic response has no text content"))?
            .to_string();

        info!(output_len = output.len(), "anthropic response received");
        Ok(output)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
