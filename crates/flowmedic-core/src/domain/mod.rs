//! Domain models for the error analysis pipeline.
//!
//! Canonical definitions for the core entities:
//! - `ErrorEvent`: raw failure description at pipeline entry
//! - `Diagnosis`: synthesized structured explanation
//! - `FactCheckResult`: independent verification outcome
//! - `DiagnosticReport`: the only entity exposed across the core boundary

pub mod diagnosis;
pub mod error;
pub mod event;
pub mod report;

pub use diagnosis::{Diagnosis, DiagnosisOrigin};
pub use error::{PipelineError, ReasoningError, Result};
pub use event::ErrorEvent;
pub use report::{
    ConfidenceLevel, DiagnosticReport, FactCheckResult, ReportMeta, StageTimings,
    VerificationMethod,
};
