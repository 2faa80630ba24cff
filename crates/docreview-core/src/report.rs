use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ReviewError;
use crate::gaps::GapAnalysis;
use crate::types::{AnalysisReport, ClassificationResult, Issue};

pub const ARTIFACT_PREFIX: &str = "Reviewed_";

/// Assemble the structured report. One document is uploaded per run.
pub fn compile_report(
    classification: &ClassificationResult,
    issues: Vec<Issue>,
    gaps: GapAnalysis,
) -> AnalysisReport {
    AnalysisReport {
        process: classification.process.clone(),
        document_identified: classification.document_type.clone(),
        documents_uploaded: 1,
        required_documents: gaps.required_documents,
        missing_documents: gaps.missing_documents,
        issues_found: issues,
    }
}

fn or_na(s: &str) -> &str {
    if s.is_empty() {
        "N/A"
    } else {
        s
    }
}

/// Render the human-readable export: header, JSON summary, numbered issue
/// comments, then the full original text.
pub fn render_artifact(
    title: &str,
    report: &AnalysisReport,
    original_text: &str,
    original_filename: &str,
) -> Result<String, ReviewError> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| ReviewError::CompilationFailure(e.to_string()))?;

    let mut s = String::new();
    s.push_str(title);
    s.push('\n');
    s.push_str("=========================================\n\n");
    let _ = write!(s, "Original File: {original_filename}\n\n");
    s.push_str("--- JSON Summary ---\n");
    s.push_str(&json);
    s.push_str("\n\n--- Detailed Comments ---\n");
    for (i, issue) in report.issues_found.iter().enumerate() {
        let _ = write!(s, "\n{}. Issue in Section: {}\n", i + 1, or_na(&issue.section));
        let _ = writeln!(s, "   - Issue: {}", or_na(&issue.issue));
        let _ = writeln!(s, "   - Severity: {}", or_na(issue.severity.as_str()));
        let _ = writeln!(s, "   - Suggestion: {}", or_na(&issue.suggestion));
    }
    s.push_str("\n\n--- Original Document Text ---\n");
    s.push_str(original_text);
    Ok(s)
}

/// `Reviewed_<stem>.txt` for an uploaded file name (directories are dropped).
pub fn artifact_file_name(original_filename: &str) -> String {
    let base = Path::new(original_filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let renamed = Path::new(&base).with_extension("txt");
    format!("{ARTIFACT_PREFIX}{}", renamed.to_string_lossy())
}

/// Render and write the artifact into `output_dir`, replacing any previous file.
pub async fn write_artifact(
    output_dir: &Path,
    title: &str,
    report: &AnalysisReport,
    original_text: &str,
    original_filename: &str,
) -> Result<PathBuf, ReviewError> {
    let content = render_artifact(title, report, original_text, original_filename)?;
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| ReviewError::CompilationFailure(format!("{}: {e}", output_dir.display())))?;

    let path = output_dir.join(artifact_file_name(original_filename));
    tokio::fs::write(&path, content)
        .await
        .map_err(|e| ReviewError::CompilationFailure(format!("{}: {e}", path.display())))?;

    info!(path = %path.display(), "wrote review artifact");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn sample_report() -> AnalysisReport {
        compile_report(
            &ClassificationResult::new("Articles of Association", "Company Incorporation"),
            vec![Issue {
                document: "x.docx".into(),
                section: "Clause 3.1".into(),
                issue: "Refers to UAE Federal Courts".into(),
                severity: Severity::High,
                suggestion: "Replace with ADGM Courts".into(),
                ..Issue::default()
            }],
            GapAnalysis {
                required_documents: 7,
                missing_documents: vec!["Board Resolution".into()],
            },
        )
    }

    #[test]
    fn compile_copies_classification_and_gaps() {
        let r = sample_report();
        assert_eq!(r.process, "Company Incorporation");
        assert_eq!(r.document_identified, "Articles of Association");
        assert_eq!(r.documents_uploaded, 1);
        assert_eq!(r.required_documents, 7);
        assert_eq!(r.missing_documents, vec!["Board Resolution".to_string()]);
        assert_eq!(r.issues_found.len(), 1);
    }

    #[test]
    fn artifact_names() {
        assert_eq!(artifact_file_name("x.docx"), "Reviewed_x.txt");
        assert_eq!(artifact_file_name("/tmp/up/Board Resolution.PDF"), "Reviewed_Board Resolution.txt");
        assert_eq!(artifact_file_name("v1.2.final.docx"), "Reviewed_v1.2.final.txt");
    }

    #[test]
    fn artifact_layout() {
        let text = render_artifact("Title", &sample_report(), "BODY TEXT", "x.docx").unwrap();
        assert!(text.starts_with("Title\n=========================================\n\nOriginal File: x.docx\n\n--- JSON Summary ---\n{\n  \"process\": \"Company Incorporation\","));
        assert!(text.contains("\n\n--- Detailed Comments ---\n\n1. Issue in Section: Clause 3.1\n   - Issue: Refers to UAE Federal Courts\n   - Severity: High\n   - Suggestion: Replace with ADGM Courts\n"));
        assert!(text.ends_with("\n\n--- Original Document Text ---\nBODY TEXT"));
    }

    #[test]
    fn empty_issue_fields_render_as_na() {
        let mut report = sample_report();
        report.issues_found = vec![Issue {
            issue: "Typo".into(),
            ..Issue::default()
        }];
        let text = render_artifact("T", &report, "", "a.pdf").unwrap();
        assert!(text.contains("1. Issue in Section: N/A\n   - Issue: Typo\n   - Severity: N/A\n   - Suggestion: N/A\n"));
    }
}
