use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

/// A text-generation capability consulted by the classification and
/// scanning stages.
///
/// Implementations must honour `timeout` for the whole request; a timeout
/// is reported as an ordinary error.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String>;

    /// Short identifier used in logs (e.g. "gemini", "ollama").
    fn name(&self) -> &str;
}

/// Remove markdown code fences the model may wrap its JSON in.
pub fn strip_fences(text: &str) -> String {
    text.trim()
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Fill `{KEY}` placeholders in a prompt template.
pub fn render_prompt(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}
