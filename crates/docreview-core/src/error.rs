use thiserror::Error;

/// Category of a review failure, independent of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnreadableFile,
    EmptyDocument,
    ClassificationFailure,
    ScanFailure,
    CompilationFailure,
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Unsupported file type. Please upload a .docx or .pdf file.")]
    UnsupportedFormat,

    #[error("Error reading .{format} file: {reason}")]
    UnreadableFile { format: &'static str, reason: String },

    #[error("Could not find any text in the document.")]
    EmptyDocument,

    #[error("Error getting metadata: {0}")]
    ClassificationFailure(String),

    #[error("The AI analysis for finding issues failed. Error: {0}")]
    ScanFailure(String),

    #[error("Failed to compile report: {0}")]
    CompilationFailure(String),
}

impl ReviewError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat | Self::UnreadableFile { .. } => ErrorKind::UnreadableFile,
            Self::EmptyDocument => ErrorKind::EmptyDocument,
            Self::ClassificationFailure(_) => ErrorKind::ClassificationFailure,
            Self::ScanFailure(_) => ErrorKind::ScanFailure,
            Self::CompilationFailure(_) => ErrorKind::CompilationFailure,
        }
    }

    pub(crate) fn unreadable(format: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::UnreadableFile {
            format,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_is_an_unreadable_file() {
        let e = ReviewError::UnsupportedFormat;
        assert_eq!(e.kind(), ErrorKind::UnreadableFile);
        assert_eq!(
            e.to_string(),
            "Unsupported file type. Please upload a .docx or .pdf file."
        );
    }

    #[test]
    fn scan_failure_message_wraps_cause() {
        let e = ReviewError::ScanFailure("timed out".into());
        assert_eq!(
            e.to_string(),
            "The AI analysis for finding issues failed. Error: timed out"
        );
    }
}
