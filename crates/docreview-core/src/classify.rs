use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::ReviewError;
use crate::oracle::{render_prompt, strip_fences, Oracle};
use crate::types::ClassificationResult;

/// First `max_tokens` whitespace-delimited tokens of `text`, single-spaced.
pub fn excerpt(text: &str, max_tokens: usize) -> String {
    text.split_whitespace()
        .take(max_tokens)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse the oracle's classification answer.
pub fn parse_classification(response: &str) -> Result<ClassificationResult, ReviewError> {
    serde_json::from_str(&strip_fences(response))
        .map_err(|e| ReviewError::ClassificationFailure(format!("invalid JSON: {e}")))
}

/// Identifies document type and legal process from a bounded excerpt.
pub struct Classifier {
    oracle: Arc<dyn Oracle>,
    prompt: String,
    max_tokens: usize,
    timeout: Duration,
}

impl Classifier {
    pub fn new(oracle: Arc<dyn Oracle>, prompt: impl Into<String>) -> Self {
        Self {
            oracle,
            prompt: prompt.into(),
            max_tokens: 500,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn classify(
        &self,
        text: &str,
        doc_name: &str,
    ) -> Result<ClassificationResult, ReviewError> {
        let chunk = excerpt(text, self.max_tokens);
        let prompt = render_prompt(&self.prompt, &[("DOC_NAME", doc_name), ("EXCERPT", &chunk)]);

        info!(
            doc = %doc_name,
            oracle = self.oracle.name(),
            excerpt_len = chunk.len(),
            timeout_secs = self.timeout.as_secs(),
            "classifying document"
        );

        let response = self
            .oracle
            .generate(&prompt, self.timeout)
            .await
            .map_err(|e| {
                warn!(doc = %doc_name, "classification request failed: {e:#}");
                ReviewError::ClassificationFailure(format!("{e:#}"))
            })?;

        let result = parse_classification(&response).inspect_err(|e| {
            warn!(doc = %doc_name, "classification response unusable: {e}");
        })?;

        info!(
            doc = %doc_name,
            document_type = %result.document_type,
            process = %result.process,
            "document classified"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_keeps_first_tokens_single_spaced() {
        let text = "one  two\n\nthree\tfour five";
        assert_eq!(excerpt(text, 3), "one two three");
        assert_eq!(excerpt(text, 50), "one two three four five");
        assert_eq!(excerpt("   ", 5), "");
    }

    #[test]
    fn parse_fenced_classification() {
        let raw = "```json\n{\"document_type\": \"Board Resolution\", \"process\": \"Company Incorporation\"}\n```";
        let c = parse_classification(raw).unwrap();
        assert_eq!(c, ClassificationResult::new("Board Resolution", "Company Incorporation"));
    }

    #[test]
    fn parse_missing_keys_default_to_unknown() {
        let c = parse_classification(r#"{"document_type":"Employment Contract"}"#).unwrap();
        assert_eq!(c.process, "Unknown");
    }

    #[test]
    fn parse_null_process_keeps_document_type() {
        let c = parse_classification(r#"{"document_type":"Articles of Association","process":null}"#)
            .unwrap();
        assert_eq!(c.document_type, "Articles of Association");
        assert_eq!(c.process, "Unknown");
    }

    #[test]
    fn parse_garbage_is_classification_failure() {
        let err = parse_classification("I think it is a contract.").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ClassificationFailure);
    }
}
