//! Result types produced by the conversion pipeline.

use crate::error::PageError;
use serde::Serialize;
use std::path::PathBuf;

/// What happened to one page.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum PageOutcome {
    /// Markdown returned by the model, verbatim.
    Success(String),
    /// The page could not be rendered or transcribed.
    Failed(PageError),
}

/// The transcription of one page, tagged with its 1-indexed page number.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    pub page_num: usize,
    pub outcome: PageOutcome,
}

impl PageResult {
    pub fn success(page_num: usize, markdown: impl Into<String>) -> Self {
        Self {
            page_num,
            outcome: PageOutcome::Success(markdown.into()),
        }
    }

    pub fn failed(error: PageError) -> Self {
        Self {
            page_num: error.page(),
            outcome: PageOutcome::Failed(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, PageOutcome::Success(_))
    }
}

/// Page-level statistics for a PDF or office target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    pub failed_pages: usize,
    pub duration_ms: u64,
}

/// A successfully written target.
#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    /// The target exactly as given on the command line.
    pub target: String,
    /// Absolute path of the written Markdown file.
    pub output_path: PathBuf,
    /// `None` for URL targets, which have no pages.
    pub stats: Option<ConversionStats>,
}

/// One entry of a batch run: the target and either its report or the
/// reason it was skipped.
#[derive(Debug, Serialize)]
pub struct TargetOutcome {
    pub target: String,
    #[serde(flatten)]
    pub result: TargetStatus,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetStatus {
    Written { report: TargetReport },
    Failed { error: String },
}

impl TargetOutcome {
    pub fn report(&self) -> Option<&TargetReport> {
        match &self.result {
            TargetStatus::Written { report } => Some(report),
            TargetStatus::Failed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_takes_page_from_error() {
        let r = PageResult::failed(PageError::TranscriptionFailed {
            page: 5,
            detail: "boom".into(),
        });
        assert_eq!(r.page_num, 5);
        assert!(!r.is_success());
    }

    #[test]
    fn outcome_serialises_as_tagged_variant() {
        let ok = serde_json::to_value(PageResult::success(1, "# Title")).unwrap();
        assert_eq!(ok["outcome"]["status"], "success");
        assert_eq!(ok["outcome"]["value"], "# Title");
    }

    #[test]
    fn failed_target_serialises_error_text() {
        let outcome = TargetOutcome {
            target: "notes.txt".into(),
            result: TargetStatus::Failed {
                error: "Unsupported file format".into(),
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["target"], "notes.txt");
        assert_eq!(json["status"], "failed");
        assert!(outcome.report().is_none());
    }
}
