use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// ── Source Document ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Docx,
    Pdf,
    Unsupported,
}

impl DocumentFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "docx" => Self::Docx,
            "pdf" => Self::Pdf,
            _ => Self::Unsupported,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pdf => "pdf",
            Self::Unsupported => "",
        }
    }
}

/// The uploaded document after text extraction. Immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Base name of the uploaded file, e.g. `articles.docx`.
    pub filename: String,
    pub format: DocumentFormat,
    pub raw_text: String,
}

/// Accept any JSON value where the oracle should have sent a string.
///
/// `null` becomes empty, numbers and booleans are stringified, arrays and
/// objects keep their JSON text.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

// ── Classification ───────────────────────────────────────────────────────

fn unknown() -> String {
    "Unknown".into()
}

/// Like [`lenient_string`], but blank answers read as "Unknown".
fn lenient_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let s = lenient_string(deserializer)?;
    Ok(if s.trim().is_empty() { unknown() } else { s })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(default = "unknown", deserialize_with = "lenient_or_unknown")]
    pub document_type: String,
    #[serde(default = "unknown", deserialize_with = "lenient_or_unknown")]
    pub process: String,
}

impl ClassificationResult {
    pub fn new(document_type: impl Into<String>, process: impl Into<String>) -> Self {
        Self {
            document_type: document_type.into(),
            process: process.into(),
        }
    }

    /// Fallback used when classification cannot be obtained.
    pub fn unknown() -> Self {
        Self::new(unknown(), unknown())
    }
}

// ── Issues ───────────────────────────────────────────────────────────────

/// Issue severity as reported by the oracle.
///
/// Known levels are matched case-insensitively; anything else is kept
/// verbatim in `Other` and serialized unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Severity {
    High,
    Medium,
    Low,
    Other(String),
}

impl Severity {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = lenient_string(deserializer)?;
        Ok(if raw.is_empty() { Self::default() } else { Self::parse(&raw) })
    }
}

/// One compliance red flag found in the document.
///
/// Keys beyond the five known fields are kept in `extra` and written back
/// out after them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default, deserialize_with = "lenient_string")]
    pub document: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub section: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub issue: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, deserialize_with = "lenient_string")]
    pub suggestion: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ── Checklists ───────────────────────────────────────────────────────────

/// Ordered list of documents a legal process requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessChecklist {
    pub process: String,
    pub required: Vec<String>,
}

/// All known process checklists. Processes without an entry require nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistRegistry {
    pub checklists: Vec<ProcessChecklist>,
}

impl ChecklistRegistry {
    pub fn new(checklists: Vec<ProcessChecklist>) -> Self {
        Self { checklists }
    }

    pub fn get(&self, process: &str) -> Option<&ProcessChecklist> {
        self.checklists.iter().find(|c| c.process == process)
    }
}

// ── Report ───────────────────────────────────────────────────────────────

/// The structured result of one review run. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub process: String,
    pub document_identified: String,
    pub documents_uploaded: u32,
    pub required_documents: usize,
    pub missing_documents: Vec<String>,
    pub issues_found: Vec<Issue>,
}

// ── Review Profile ───────────────────────────────────────────────────────

/// A jurisdiction-specific review definition: prompts plus checklists.
///
/// Prompts support `{DOC_NAME}`, `{EXCERPT}` (classification) and
/// `{DOC_TEXT}` (scanning) placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewProfile {
    pub name: String,
    pub label: String,
    pub jurisdiction: String,
    /// First line of the rendered artifact.
    pub report_title: String,
    pub classify_prompt: String,
    pub scan_prompt: String,
    pub checklists: ChecklistRegistry,
}

// ── Stage Policy ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and continue with a fallback value.
    Degrade,
    /// Terminate the run with the stage's error as the final status.
    Abort,
}

impl FailurePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "degrade" => Some(Self::Degrade),
            "abort" => Some(Self::Abort),
            _ => None,
        }
    }
}

/// Per-stage oracle budget and failure handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePolicy {
    pub timeout: Duration,
    pub on_failure: FailurePolicy,
}

/// Everything the orchestrator needs besides the oracle and profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub output_dir: PathBuf,
    pub excerpt_tokens: usize,
    pub classify: StagePolicy,
    pub scan: StagePolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            excerpt_tokens: 500,
            classify: StagePolicy {
                timeout: Duration::from_secs(60),
                on_failure: FailurePolicy::Degrade,
            },
            scan: StagePolicy {
                timeout: Duration::from_secs(180),
                on_failure: FailurePolicy::Abort,
            },
        }
    }
}

// ── Run Updates ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extracting,
    Classifying,
    Scanning,
    Compiling,
}

impl Stage {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Extracting => "Step 1/4: Extracting text...",
            Self::Classifying => "Step 2/4: Identifying document type...",
            Self::Scanning => "Step 3/4: Scanning document for issues...",
            Self::Compiling => "Step 4/4: Compiling final report...",
        }
    }
}

pub const COMPLETE_STATUS: &str = "Analysis complete!";

/// Reported when a run is requested without a document.
pub const NO_DOCUMENT_STATUS: &str = "Please upload a document first.";

/// One element of a review run's progress stream.
#[derive(Debug, Clone, PartialEq)]
pub enum RunUpdate {
    Progress(Stage),
    Done {
        report: AnalysisReport,
        artifact_path: PathBuf,
    },
    Failed {
        error: String,
    },
}

impl RunUpdate {
    pub fn kind(&self) -> &str {
        match self {
            Self::Progress(_) => "progress",
            Self::Done { .. } => "done",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn status(&self) -> &str {
        match self {
            Self::Progress(stage) => stage.status(),
            Self::Done { .. } => COMPLETE_STATUS,
            Self::Failed { error } => error,
        }
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Self::Done { report, .. } => Some(report),
            _ => None,
        }
    }

    pub fn artifact_path(&self) -> Option<&Path> {
        match self {
            Self::Done { artifact_path, .. } => Some(artifact_path),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }

    /// JSON form used by the SSE endpoint: `{type, status, report?, artifact?}`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut v = serde_json::json!({
            "type": self.kind(),
            "status": self.status(),
        });
        if let (Some(obj), Self::Done { report, artifact_path }) = (v.as_object_mut(), self) {
            obj.insert(
                "report".into(),
                serde_json::to_value(report).unwrap_or(serde_json::Value::Null),
            );
            obj.insert(
                "artifact".into(),
                serde_json::Value::String(artifact_path.to_string_lossy().into_owned()),
            );
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension_is_case_insensitive() {
        assert_eq!(DocumentFormat::from_path(Path::new("a/B.DOCX")), DocumentFormat::Docx);
        assert_eq!(DocumentFormat::from_path(Path::new("x.Pdf")), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_path(Path::new("notes.txt")), DocumentFormat::Unsupported);
        assert_eq!(DocumentFormat::from_path(Path::new("README")), DocumentFormat::Unsupported);
    }

    #[test]
    fn severity_known_levels_are_coerced() {
        assert_eq!(Severity::parse("high"), Severity::High);
        assert_eq!(Severity::parse(" MEDIUM "), Severity::Medium);
        assert_eq!(Severity::parse("Low"), Severity::Low);
    }

    #[test]
    fn severity_unknown_passes_through() {
        let s = Severity::parse("Critical");
        assert_eq!(s, Severity::Other("Critical".into()));
        assert!(!s.is_known());
        assert_eq!(serde_json::to_string(&s).unwrap(), r#""Critical""#);
    }

    #[test]
    fn issue_tolerates_missing_fields() {
        let issue: Issue = serde_json::from_str(r#"{"issue":"typo","severity":null}"#).unwrap();
        assert_eq!(issue.issue, "typo");
        assert!(issue.section.is_empty());
        assert_eq!(issue.severity, Severity::default());
    }

    #[test]
    fn issue_scalars_are_stringified() {
        let issue: Issue = serde_json::from_str(
            r#"{"section":3.1,"issue":null,"severity":2,"suggestion":true}"#,
        )
        .unwrap();
        assert_eq!(issue.section, "3.1");
        assert!(issue.issue.is_empty());
        assert_eq!(issue.severity, Severity::Other("2".into()));
        assert_eq!(issue.suggestion, "true");
    }

    #[test]
    fn issue_keeps_unknown_keys() {
        let raw = r#"{"section":"Clause 1","severity":"low","reference":"ADGM CR 2020 s.12"}"#;
        let issue: Issue = serde_json::from_str(raw).unwrap();
        assert_eq!(issue.severity, Severity::Low);
        assert_eq!(issue.extra["reference"], "ADGM CR 2020 s.12");

        let out = serde_json::to_value(&issue).unwrap();
        assert_eq!(out["reference"], "ADGM CR 2020 s.12");
        assert_eq!(out["severity"], "Low");
    }

    #[test]
    fn classification_null_field_reads_unknown() {
        let c: ClassificationResult = serde_json::from_str(
            r#"{"document_type":"Articles of Association","process":null}"#,
        )
        .unwrap();
        assert_eq!(c, ClassificationResult::new("Articles of Association", "Unknown"));

        let c: ClassificationResult = serde_json::from_str(r#"{"document_type":"  "}"#).unwrap();
        assert_eq!(c, ClassificationResult::unknown());
    }

    #[test]
    fn report_serializes_in_wire_order() {
        let report = AnalysisReport {
            process: "p".into(),
            document_identified: "d".into(),
            documents_uploaded: 1,
            required_documents: 0,
            missing_documents: vec![],
            issues_found: vec![],
        };
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(
            json,
            r#"{"process":"p","document_identified":"d","documents_uploaded":1,"required_documents":0,"missing_documents":[],"issues_found":[]}"#
        );
    }

    #[test]
    fn only_done_carries_payload() {
        let p = RunUpdate::Progress(Stage::Scanning);
        assert_eq!(p.status(), "Step 3/4: Scanning document for issues...");
        assert!(p.report().is_none() && p.artifact_path().is_none());
        assert!(!p.is_terminal());

        let f = RunUpdate::Failed { error: "boom".into() };
        assert_eq!(f.status(), "boom");
        assert!(f.is_terminal());
        assert!(f.to_json().get("report").is_none());
    }
}
