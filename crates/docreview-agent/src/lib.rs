pub mod anthropic;
pub mod gemini;
pub mod ollama;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use docreview_core::{config::Config, Oracle};
use tracing::{info, warn};

pub use anthropic::AnthropicBackend;
pub use gemini::GeminiBackend;
pub use ollama::OllamaBackend;

/// Construct the oracle selected by `BACKEND`.
pub fn build_oracle(config: &Config) -> Result<Arc<dyn Oracle>> {
    if config.missing_api_key() {
        warn!(
            backend = %config.backend,
            "{}_API_KEY is not set; oracle requests will be rejected",
            config.backend.to_ascii_uppercase()
        );
    }
    let model = config.model_name();
    let oracle: Arc<dyn Oracle> = match config.backend.as_str() {
        "ollama" => Arc::new(OllamaBackend::new(&config.ollama_url, model)),
        "anthropic" => Arc::new(AnthropicBackend::new(&config.anthropic_api_key, model)),
        "gemini" => Arc::new(GeminiBackend::new(&config.gemini_api_key, model)),
        other => bail!("unknown backend {other:?}"),
    };
    info!(backend = oracle.name(), model, "oracle ready");
    Ok(oracle)
}

/// Send a JSON request and return the decoded JSON body.
///
/// Transport errors, timeouts and non-2xx statuses all come back as `Err`.
pub(crate) async fn send_json(
    backend: &str,
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<serde_json::Value> {
    let response = match request.timeout(timeout).send().await {
        Ok(r) => r,
        Err(e) if e.is_timeout() => {
            warn!(backend, timeout_secs = timeout.as_secs_f64(), "{backend} request timed out");
            bail!("{backend} request timed out after {}s", timeout.as_secs());
        }
        Err(e) => {
            warn!(backend, "{backend} request failed: {e}");
            bail!("{backend} request failed: {e}");
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(backend, status = %status, "{backend} returned non-200: {body}");
        bail!("{backend} error {status}: {body}");
    }

    response
        .json()
        .await
        .map_err(|e| anyhow!("failed to parse {backend} response: {e}"))
}
