//! Verification outcome and the final diagnostic report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::diagnosis::Diagnosis;
use super::event::ErrorEvent;

/// Confidence band derived from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: f32) -> Self {
        if score >= 0.8 {
            ConfidenceLevel::High
        } else if score >= 0.6 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// How the fact-check confidence was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    /// Deterministic cross-reference refined by the reasoning service.
    Reasoned,
    /// Deterministic cross-reference only; the reasoning service was
    /// unavailable or returned malformed output.
    HeuristicOnly,
}

/// Outcome of independently fact-checking a diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCheckResult {
    /// Confidence in [0, 1].
    pub confidence: f32,
    pub level: ConfidenceLevel,
    pub accepted: bool,
    /// Claims with no supporting candidate and no literal textual support.
    pub discrepancies: Vec<String>,
    pub method: VerificationMethod,
}

/// Wall-clock duration of each pipeline stage, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimings {
    pub matching_ms: u64,
    pub synthesis_ms: u64,
    pub fact_check_ms: u64,
    pub total_ms: u64,
}

/// Pipeline metadata attached to every report so operators can tell a
/// fully verified diagnosis from a best-effort one without reading logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub regex_matches: usize,
    pub semantic_matches: usize,
    /// True when the semantic stage degraded to an empty candidate list
    /// because the embedding provider failed.
    pub semantic_degraded: bool,
    pub revisions: u32,
    pub degraded: bool,
    /// Stated reason when `degraded` is set.
    pub degraded_reason: Option<String>,
    pub timings: StageTimings,
}

/// Final artifact of a pipeline run. Immutable once assembled.
///
/// Invariant: `fact_check.accepted` is true, or `meta.degraded` is set and
/// `meta.degraded_reason` states why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub event: ErrorEvent,
    pub diagnosis: Diagnosis,
    pub fact_check: FactCheckResult,
    pub meta: ReportMeta,
}

impl DiagnosticReport {
    /// True when the diagnosis passed independent verification.
    pub fn is_verified(&self) -> bool {
        self.fact_check.accepted && !self.meta.degraded
    }
}
