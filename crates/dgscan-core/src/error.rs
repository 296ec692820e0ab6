#[derive(Debug, thiserror::Error)]
pub enum DgError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("dangerous goods catalog unavailable ({origin}): {reason}")]
    CatalogUnavailable { origin: String, reason: String },

    #[error("unknown candidate '{0}' for this validation session")]
    UnknownCandidate(String),

    #[error("UN number '{0}' is not in the dangerous goods catalog")]
    UnknownUnNumber(String),

    #[error("invalid segregation table: {0}")]
    SegregationTableInvalid(String),

    #[error("cannot {action} while session is {from}")]
    InvalidTransition { from: String, action: String },

    #[error("document extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DgError {
    /// Wording shown to the operator, as opposed to the diagnostic `Display` text.
    pub fn user_message(&self) -> &'static str {
        match self {
            DgError::MalformedInput(_)
            | DgError::Extraction(_)
            | DgError::PdftotextFailed { .. } => "could not process this document, please re-upload",
            DgError::UnknownCandidate(_) => "this selection is no longer valid, please refresh",
            DgError::CatalogUnavailable { .. } | DgError::SegregationTableInvalid(_) => {
                "dangerous goods reference data is unavailable, validation is disabled"
            }
            DgError::UnknownUnNumber(_) => "the UN number is not in the dangerous goods catalog",
            DgError::InvalidTransition { .. } => "this action is not available at the current step",
            DgError::PdftotextNotFound | DgError::Io(_) | DgError::Json(_) => {
                "an internal error occurred, please try again"
            }
        }
    }

    pub(crate) fn catalog(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        DgError::CatalogUnavailable {
            origin: origin.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            DgError::MalformedInput("x".into()).user_message(),
            "could not process this document, please re-upload"
        );
        assert_eq!(
            DgError::UnknownCandidate("cand_1".into()).user_message(),
            "this selection is no longer valid, please refresh"
        );
    }

    #[test]
    fn test_display_includes_context() {
        let e = DgError::catalog("dg.json", "no entries");
        assert!(e.to_string().contains("dg.json"));
        assert!(e.to_string().contains("no entries"));
    }
}
