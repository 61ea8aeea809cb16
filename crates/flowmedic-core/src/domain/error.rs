//! Error taxonomy for the analysis pipeline.
//!
//! Only corpus failures are fatal: everything reachable from a pipeline run
//! is absorbed into the report so a run never raises past the pipeline
//! boundary under external-service failure.

use flowmedic_kb::{CorpusError, EmbeddingError};

/// Failures of the external generative reasoning service.
///
/// Non-fatal at the call site: within the retry budget the call is retried,
/// past it the stage falls back (template diagnosis, heuristic fact-check).
#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    #[error("reasoning request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("reasoning service returned status {code}")]
    Status { code: u16 },

    #[error("reasoning call timed out after {0} ms")]
    Timeout(u64),

    #[error("malformed reasoning response: {0}")]
    MalformedResponse(String),

    #[error("reasoning service unavailable: {0}")]
    Unavailable(String),
}

impl ReasoningError {
    /// Transient failures are worth a bounded retry; contract violations
    /// (malformed output, missing configuration) are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ReasoningError::Http(_) | ReasoningError::Timeout(_) => true,
            ReasoningError::Status { code } => *code == 429 || *code >= 500,
            ReasoningError::MalformedResponse(_) | ReasoningError::Unavailable(_) => false,
        }
    }
}

/// Errors that can abort pipeline construction. Runtime failures never
/// surface here — they degrade the report instead.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("corpus load error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("semantic index build error: {0}")]
    Index(#[from] EmbeddingError),
}

/// Result type for pipeline construction and corpus operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(ReasoningError::Timeout(30_000).is_transient());
        assert!(ReasoningError::Status { code: 503 }.is_transient());
        assert!(ReasoningError::Status { code: 429 }.is_transient());
        assert!(!ReasoningError::Status { code: 400 }.is_transient());
        assert!(!ReasoningError::MalformedResponse("not json".into()).is_transient());
        assert!(!ReasoningError::Unavailable("no endpoint".into()).is_transient());
    }

    #[test]
    fn pipeline_error_wraps_corpus_failures() {
        let err: PipelineError = CorpusError::Empty.into();
        assert!(err.to_string().contains("corpus"));
    }
}
