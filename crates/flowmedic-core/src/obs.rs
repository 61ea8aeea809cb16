//! Structured observability hooks for the analysis lifecycle.
//!
//! Each analysis run is wrapped in a report-scoped span via the
//! `ReportSpan` RAII guard, and the pipeline stages emit structured
//! events at `info!` level as they complete.

use tracing::info;

/// RAII guard that enters a report-scoped tracing span for the duration
/// of one analysis run.
pub struct ReportSpan {
    _span: tracing::span::EnteredSpan,
}

impl ReportSpan {
    /// Create and enter a span tagged with the report id.
    pub fn enter(report_id: &str) -> Self {
        let span = tracing::info_span!("flowmedic.analysis", report_id = %report_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: analysis started for an error event.
pub fn emit_analysis_started(workflow: Option<&str>, message_len: usize) {
    info!(
        event = "analysis.started",
        workflow = workflow.unwrap_or("unknown"),
        message_len = message_len,
    );
}

/// Emit event: knowledge-base matching finished.
pub fn emit_kb_matched(regex_matches: usize, semantic_matches: usize, duration_ms: u64) {
    info!(
        event = "kb.matched",
        regex_matches = regex_matches,
        semantic_matches = semantic_matches,
        duration_ms = duration_ms,
    );
}

/// Emit event: diagnosis synthesis finished.
pub fn emit_synthesis_completed(origin: &str, revision: u32, duration_ms: u64) {
    info!(
        event = "synthesis.completed",
        origin = origin,
        revision = revision,
        duration_ms = duration_ms,
    );
}

/// Emit event: analysis finished with its final disposition.
pub fn emit_analysis_finished(accepted: bool, degraded: bool, revisions: u32, total_ms: u64) {
    info!(
        event = "analysis.finished",
        accepted = accepted,
        degraded = degraded,
        revisions = revisions,
        duration_ms = total_ms,
    );
}
