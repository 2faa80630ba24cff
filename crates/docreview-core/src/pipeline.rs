use std::path::PathBuf;
use std::sync::Arc;

use futures_util::stream::{self, Stream};
use tracing::{error, info, warn};

use crate::{
    classify::Classifier,
    error::ReviewError,
    extract::load_document,
    gaps::analyze_gaps,
    oracle::Oracle,
    report::{compile_report, write_artifact},
    scan::IssueScanner,
    types::{
        ClassificationResult, FailurePolicy, Issue, PipelineSettings, ReviewProfile, RunUpdate,
        SourceDocument, Stage,
    },
};

/// Where a run is between two yielded updates.
enum RunState {
    Idle(PathBuf),
    Extracting(PathBuf),
    Classifying(SourceDocument),
    Scanning(SourceDocument, ClassificationResult),
    Compiling(SourceDocument, ClassificationResult, Vec<Issue>),
    Finished,
}

/// Drives one document through extraction, classification, issue scanning,
/// gap analysis and report compilation.
///
/// Each run is a lazy stream: a stage only executes when the consumer asks
/// for the next update, and every stage is announced before it runs. The
/// final element is either [`RunUpdate::Done`] or [`RunUpdate::Failed`].
#[derive(Clone)]
pub struct Pipeline {
    oracle: Arc<dyn Oracle>,
    profile: Arc<ReviewProfile>,
    settings: Arc<PipelineSettings>,
}

impl Pipeline {
    pub fn new(oracle: Arc<dyn Oracle>, profile: ReviewProfile, settings: PipelineSettings) -> Self {
        Self {
            oracle,
            profile: Arc::new(profile),
            settings: Arc::new(settings),
        }
    }

    pub fn profile(&self) -> &ReviewProfile {
        &self.profile
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Review the document at `path`, yielding progress then a terminal update.
    pub fn analyze(&self, path: impl Into<PathBuf>) -> impl Stream<Item = RunUpdate> + Send + 'static {
        let pipeline = self.clone();
        stream::unfold(RunState::Idle(path.into()), move |state| {
            let pipeline = pipeline.clone();
            async move { pipeline.step(state).await }
        })
    }

    fn classifier(&self) -> Classifier {
        Classifier::new(Arc::clone(&self.oracle), self.profile.classify_prompt.clone())
            .with_max_tokens(self.settings.excerpt_tokens)
            .with_timeout(self.settings.classify.timeout)
    }

    fn scanner(&self) -> IssueScanner {
        IssueScanner::new(Arc::clone(&self.oracle), self.profile.scan_prompt.clone())
            .with_timeout(self.settings.scan.timeout)
    }

    async fn step(&self, state: RunState) -> Option<(RunUpdate, RunState)> {
        match state {
            RunState::Idle(path) => {
                info!(path = %path.display(), profile = %self.profile.name, "review run started");
                Some((RunUpdate::Progress(Stage::Extracting), RunState::Extracting(path)))
            }

            RunState::Extracting(path) => match load_document(&path).await {
                Ok(doc) => Some((RunUpdate::Progress(Stage::Classifying), RunState::Classifying(doc))),
                Err(e) => Some(fail(Stage::Extracting, e)),
            },

            RunState::Classifying(doc) => {
                let classification = match self.classifier().classify(&doc.raw_text, &doc.filename).await {
                    Ok(c) => c,
                    Err(e) => match self.settings.classify.on_failure {
                        FailurePolicy::Degrade => {
                            warn!(doc = %doc.filename, "classification degraded to Unknown: {e}");
                            ClassificationResult::unknown()
                        }
                        FailurePolicy::Abort => return Some(fail(Stage::Classifying, e)),
                    },
                };
                Some((
                    RunUpdate::Progress(Stage::Scanning),
                    RunState::Scanning(doc, classification),
                ))
            }

            RunState::Scanning(doc, classification) => {
                let issues = match self.scanner().find_issues(&doc.raw_text, &doc.filename).await {
                    Ok(issues) => issues,
                    Err(e) => match self.settings.scan.on_failure {
                        FailurePolicy::Degrade => {
                            warn!(doc = %doc.filename, "issue scan degraded to empty list: {e}");
                            Vec::new()
                        }
                        FailurePolicy::Abort => return Some(fail(Stage::Scanning, e)),
                    },
                };
                Some((
                    RunUpdate::Progress(Stage::Compiling),
                    RunState::Compiling(doc, classification, issues),
                ))
            }

            RunState::Compiling(doc, classification, issues) => {
                let gaps = analyze_gaps(&classification, &self.profile.checklists);
                let report = compile_report(&classification, issues, gaps);
                match write_artifact(
                    &self.settings.output_dir,
                    &self.profile.report_title,
                    &report,
                    &doc.raw_text,
                    &doc.filename,
                )
                .await
                {
                    Ok(artifact_path) => {
                        info!(
                            doc = %doc.filename,
                            process = %report.process,
                            missing = report.missing_documents.len(),
                            issues = report.issues_found.len(),
                            "review run complete"
                        );
                        Some((
                            RunUpdate::Done {
                                report,
                                artifact_path,
                            },
                            RunState::Finished,
                        ))
                    }
                    Err(e) => Some(fail(Stage::Compiling, e)),
                }
            }

            RunState::Finished => None,
        }
    }
}

fn fail(stage: Stage, e: ReviewError) -> (RunUpdate, RunState) {
    error!(stage = ?stage, kind = ?e.kind(), "review run failed: {e}");
    (
        RunUpdate::Failed {
            error: e.to_string(),
        },
        RunState::Finished,
    )
}
