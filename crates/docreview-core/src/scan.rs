use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ReviewError;
use crate::oracle::{render_prompt, strip_fences, Oracle};
use crate::types::Issue;

#[derive(Deserialize)]
struct ScanResponse {
    #[serde(default)]
    issues_found: Option<Vec<Issue>>,
}

/// Parse the oracle's issue listing. An absent `issues_found` key means no issues.
pub fn parse_issues(response: &str) -> Result<Vec<Issue>, ReviewError> {
    let parsed: ScanResponse = serde_json::from_str(&strip_fences(response))
        .map_err(|e| ReviewError::ScanFailure(format!("invalid JSON: {e}")))?;
    Ok(parsed.issues_found.unwrap_or_default())
}

/// Scans the full document text for compliance red flags.
pub struct IssueScanner {
    oracle: Arc<dyn Oracle>,
    prompt: String,
    timeout: Duration,
}

impl IssueScanner {
    pub fn new(oracle: Arc<dyn Oracle>, prompt: impl Into<String>) -> Self {
        Self {
            oracle,
            prompt: prompt.into(),
            timeout: Duration::from_secs(180),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn find_issues(&self, text: &str, doc_name: &str) -> Result<Vec<Issue>, ReviewError> {
        // DOC_TEXT goes last so document content is never re-substituted.
        let prompt = render_prompt(&self.prompt, &[("DOC_NAME", doc_name), ("DOC_TEXT", text)]);

        info!(
            doc = %doc_name,
            oracle = self.oracle.name(),
            text_len = text.len(),
            timeout_secs = self.timeout.as_secs(),
            "scanning document for issues"
        );

        let response = self
            .oracle
            .generate(&prompt, self.timeout)
            .await
            .map_err(|e| {
                warn!(doc = %doc_name, "issue scan request failed: {e:#}");
                ReviewError::ScanFailure(format!("{e:#}"))
            })?;

        let issues = parse_issues(&response).inspect_err(|e| {
            warn!(doc = %doc_name, "issue scan response unusable: {e}");
        })?;

        let unknown_severity = issues.iter().filter(|i| !i.severity.is_known()).count();
        if unknown_severity > 0 {
            warn!(doc = %doc_name, count = unknown_severity, "issues with non-standard severity kept as-is");
        }
        info!(doc = %doc_name, issues = issues.len(), "issue scan complete");
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    #[test]
    fn parse_issue_list_in_order() {
        let raw = r#"```json
{"issues_found": [
  {"document":"a.docx","section":"Clause 3.1","issue":"Refers to UAE Federal Courts","severity":"High","suggestion":"Replace with ADGM Courts"},
  {"document":"a.docx","section":"General","issue":"Placeholder [insert name]","severity":"low","suggestion":"Fill in"}
]}
```"#;
        let issues = parse_issues(raw).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].section, "Clause 3.1");
        assert_eq!(issues[0].severity, Severity::High);
        assert_eq!(issues[1].severity, Severity::Low);
    }

    #[test]
    fn missing_key_means_no_issues() {
        assert!(parse_issues(r#"{"summary":"clean"}"#).unwrap().is_empty());
        assert!(parse_issues(r#"{"issues_found":null}"#).unwrap().is_empty());
    }

    #[test]
    fn non_object_response_is_scan_failure() {
        let err = parse_issues("No issues, looks fine!").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ScanFailure);
        assert!(err.to_string().starts_with("The AI analysis for finding issues failed."));
    }

    #[test]
    fn null_and_numeric_fields_do_not_fail_the_scan() {
        let raw = r#"{"issues_found":[
  {"document":"a.docx","section":null,"issue":"No governing law clause","severity":"Medium","suggestion":null},
  {"document":"a.docx","section":3.1,"issue":"Refers to UAE courts","severity":"High","suggestion":"Use ADGM Courts","clause_ref":"3.1(a)"}
]}"#;
        let issues = parse_issues(raw).unwrap();
        assert_eq!(issues.len(), 2);
        assert!(issues[0].section.is_empty());
        assert!(issues[0].suggestion.is_empty());
        assert_eq!(issues[1].section, "3.1");
        assert_eq!(issues[1].extra["clause_ref"], "3.1(a)");
    }

    #[test]
    fn wrongly_shaped_issue_list_is_scan_failure() {
        assert!(parse_issues(r#"{"issues_found":"none"}"#).is_err());
    }
}
