//! Knowledge corpora for flowmedic.
//!
//! Two read-only corpora back the diagnosis pipeline:
//! - a small deterministic rule corpus evaluated with regex patterns
//! - a larger semantic corpus searched by embedding similarity
//!
//! Both share the [`KnowledgeEntry`] shape and are loaded once at process
//! start. The semantic index supports atomic rebuild so in-flight lookups
//! never observe a half-built index.

pub mod builtin;
pub mod candidate;
pub mod embedder;
pub mod entry;
pub mod error;
pub mod normalize;
pub mod regex_kb;
pub mod semantic;

pub use candidate::{dedup_and_rank, MatchCandidate, MatchSource};
pub use embedder::{EmbeddingProvider, HashedTfIdfEmbedder};
pub use entry::{Corpus, KnowledgeEntry, Severity};
pub use error::{CorpusError, EmbeddingError};
pub use regex_kb::RegexKnowledgeBase;
pub use semantic::{SemanticIndex, SharedSemanticIndex};
