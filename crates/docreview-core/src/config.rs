use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::types::{FailurePolicy, PipelineSettings, StagePolicy};

/// Full application configuration, read from the environment with a `.env`
/// fallback. API keys are never logged.
#[derive(Debug, Clone)]
pub struct Config {
    // Oracle
    /// "gemini" (default), "ollama" or "anthropic".
    pub backend: String,
    /// Model name; empty = backend default.
    pub model: String,
    pub gemini_api_key: String,
    pub anthropic_api_key: String,
    pub ollama_url: String,

    // Review
    pub profile: String,
    pub output_dir: String,
    pub excerpt_tokens: usize,
    pub classify_timeout_s: u64,
    pub scan_timeout_s: u64,
    pub classify_on_failure: FailurePolicy,
    pub scan_on_failure: FailurePolicy,

    // Web
    pub web_bind: String,
    pub web_port: u16,
    pub max_upload_mb: u64,
}

fn parse_dotenv(contents: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            let v = v.trim().trim_matches('"');
            map.insert(k.trim().to_string(), v.to_string());
        }
    }
    map
}

fn resolve_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return format!("{home}/{rest}");
        }
    }
    path.to_string()
}

/// Typed lookups over a key → value source.
struct Source<F: Fn(&str) -> Option<String>>(F);

impl<F: Fn(&str) -> Option<String>> Source<F> {
    fn str(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    fn num<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        (self.0)(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
    }

    fn policy(&self, key: &str, default: FailurePolicy) -> Result<FailurePolicy> {
        match (self.0)(key) {
            None => Ok(default),
            Some(v) => match FailurePolicy::parse(&v) {
                Some(p) => Ok(p),
                None => bail!("{key} must be \"degrade\" or \"abort\", got {v:?}"),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let dotenv = std::fs::read_to_string(".env")
            .map(|c| parse_dotenv(&c))
            .unwrap_or_default();
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| dotenv.get(key).cloned()))
    }

    /// Build a config from an arbitrary key lookup (env, `.env`, tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let src = Source(lookup);
        let backend = src.str("BACKEND", "gemini").to_ascii_lowercase();
        if !matches!(backend.as_str(), "gemini" | "ollama" | "anthropic") {
            bail!("unknown BACKEND {backend:?} (expected gemini, ollama or anthropic)");
        }

        Ok(Config {
            model: src.str("MODEL", ""),
            gemini_api_key: src.str("GEMINI_API_KEY", ""),
            anthropic_api_key: src.str("ANTHROPIC_API_KEY", ""),
            ollama_url: src.str("OLLAMA_URL", "http://127.0.0.1:11434"),
            profile: src.str("PROFILE", "adgm"),
            output_dir: resolve_tilde(&src.str("OUTPUT_DIR", ".")),
            excerpt_tokens: src.num("EXCERPT_TOKENS", 500),
            classify_timeout_s: src.num("CLASSIFY_TIMEOUT_S", 60),
            scan_timeout_s: src.num("SCAN_TIMEOUT_S", 180),
            classify_on_failure: src.policy("CLASSIFY_ON_FAILURE", FailurePolicy::Degrade)?,
            scan_on_failure: src.policy("SCAN_ON_FAILURE", FailurePolicy::Abort)?,
            web_bind: src.str("WEB_BIND", "127.0.0.1"),
            web_port: src.num("WEB_PORT", 3141),
            max_upload_mb: src.num("MAX_UPLOAD_MB", 25),
            backend,
        })
    }

    /// Configured model, or the default for the selected backend.
    pub fn model_name(&self) -> &str {
        if !self.model.is_empty() {
            return &self.model;
        }
        match self.backend.as_str() {
            "ollama" => "llama3.1",
            "anthropic" => "claude-sonnet-4-5",
            _ => "gemini-2.5-flash",
        }
    }

    /// True when the selected backend needs an API key that is not set.
    pub fn missing_api_key(&self) -> bool {
        match self.backend.as_str() {
            "gemini" => self.gemini_api_key.is_empty(),
            "anthropic" => self.anthropic_api_key.is_empty(),
            _ => false,
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            output_dir: PathBuf::from(&self.output_dir),
            excerpt_tokens: self.excerpt_tokens,
            classify: StagePolicy {
                timeout: Duration::from_secs(self.classify_timeout_s),
                on_failure: self.classify_on_failure,
            },
            scan: StagePolicy {
                timeout: Duration::from_secs(self.scan_timeout_s),
                on_failure: self.scan_on_failure,
            },
        }
    }
}
