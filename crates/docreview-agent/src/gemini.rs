use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use docreview_core::Oracle;
use serde_json::json;
use tracing::info;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini via the `generateContent` REST endpoint.
pub struct GeminiBackend {
    api_key: String,
    pub model: String,
    pub base_url: String,
    client: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_API_URL.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// First candidate's text, or the block reason when the prompt was refused.
fn candidate_text(resp: &serde_json::Value) -> Result<String> {
    if let Some(text) = resp["candidates"][0]["content"]["parts"][0]["text"].as_str() {
        return Ok(text.to_string());
    }
    match resp["promptFeedback"]["blockReason"].as_str() {
        Some(reason) => Err(anyhow!("gemini blocked the prompt: {reason}")),
        None => Err(anyhow!("gemini response has no candidate text")),
    }
}

#[async_trait]
impl Oracle for GeminiBackend {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String> {
        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}]
        });

        info!(model = %self.model, prompt_len = prompt.len(), "calling gemini generateContent");

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let request = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        let resp = crate::send_json("gemini", request, timeout).await?;

        let output = candidate_text(&resp)?;
        info!(output_len = output.len(), "gemini response received");
        Ok(output)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_text_reads_first_part() {
        let resp = json!({"candidates": [{"content": {"parts": [{"text": "{}"}]}}]});
        assert_eq!(candidate_text(&resp).unwrap(), "{}");
    }

    #[test]
    fn candidate_text_reports_block_reason() {
        let resp = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let err = candidate_text(&resp).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}
