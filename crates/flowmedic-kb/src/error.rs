//! Error taxonomy for corpus loading and embedding.

/// Errors raised while loading or validating a knowledge corpus.
///
/// Corpus errors are fatal at process startup: a service must not answer
/// diagnosis requests with a malformed corpus.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("io error reading corpus: {0}")]
    Io(#[from] std::io::Error),

    #[error("corpus parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("corpus contains no entries")]
    Empty,

    #[error("corpus entry has an empty id")]
    EmptyId,

    #[error("duplicate corpus entry id: {0}")]
    DuplicateId(String),

    #[error("entry {id} has no matcher pattern")]
    MissingPattern { id: String },

    #[error("entry {id} has an invalid regex pattern: {source}")]
    InvalidPattern {
        id: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised by embedding providers.
///
/// Embedding errors are never fatal to a pipeline run: the semantic stage
/// degrades to an empty candidate list instead.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),

    #[error("embedding dimension mismatch: index has {expected}, provider produced {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
