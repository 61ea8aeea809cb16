//! Flowmedic Core Library
//!
//! The error analysis pipeline: regex rule matching, semantic retrieval,
//! generative synthesis, and independent fact-checking, sequenced by the
//! [`pipeline::Pipeline`] orchestrator into a [`DiagnosticReport`].

pub mod config;
pub mod domain;
pub mod fact_check;
pub mod obs;
pub mod pipeline;
pub mod reasoning;
pub mod render;
pub mod retry;
pub mod synthesis;
pub mod telemetry;

pub use config::PipelineConfig;
pub use domain::{
    ConfidenceLevel, Diagnosis, DiagnosisOrigin, DiagnosticReport, ErrorEvent, FactCheckResult,
    PipelineError, ReasoningError, ReportMeta, Result, StageTimings, VerificationMethod,
};
pub use fact_check::FactChecker;
pub use pipeline::Pipeline;
pub use reasoning::{HttpReasoning, ReasoningService, UnconfiguredReasoning};
pub use retry::RetryPolicy;
pub use synthesis::Synthesizer;
pub use telemetry::init_tracing;

pub use flowmedic_kb::{
    Corpus, CorpusError, EmbeddingError, EmbeddingProvider, HashedTfIdfEmbedder, KnowledgeEntry,
    MatchCandidate, MatchSource, RegexKnowledgeBase, SemanticIndex, Severity, SharedSemanticIndex,
};
