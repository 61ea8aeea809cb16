//! Render diagnostic reports for terminal and file output.

use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::{ConfidenceLevel, DiagnosisOrigin, DiagnosticReport, VerificationMethod};

fn confidence_label(level: ConfidenceLevel) -> &'static str {
    match level {
        ConfidenceLevel::High => "HIGH",
        ConfidenceLevel::Medium => "MEDIUM",
        ConfidenceLevel::Low => "LOW",
    }
}

fn origin_label(origin: DiagnosisOrigin) -> &'static str {
    match origin {
        DiagnosisOrigin::Model => "model analysis",
        DiagnosisOrigin::Template => "knowledge base template",
        DiagnosisOrigin::InsufficientInformation => "insufficient information",
    }
}

/// Render a report as plain text for terminal output.
pub fn render_text(report: &DiagnosticReport) -> String {
    let mut out = String::new();
    let d = &report.diagnosis;
    let fc = &report.fact_check;

    out.push_str("=== Diagnostic Report ===\n");
    out.push_str(&format!("report id:  {}\n", report.meta.report_id));
    if let Some(workflow) = &report.event.workflow {
        out.push_str(&format!("workflow:   {workflow}\n"));
    }
    if let Some(activity) = &report.event.activity {
        out.push_str(&format!("activity:   {activity}\n"));
    }
    out.push_str(&format!(
        "severity:   {} ({})\n",
        d.severity.as_str(),
        d.category
    ));
    out.push_str(&format!(
        "confidence: {:.2} [{}] via {}\n",
        fc.confidence,
        confidence_label(fc.level),
        match fc.method {
            VerificationMethod::Reasoned => "reasoned verification",
            VerificationMethod::HeuristicOnly => "heuristic verification",
        }
    ));
    out.push_str(&format!("source:     {}\n", origin_label(d.origin)));

    if report.meta.degraded {
        out.push_str(&format!(
            "\n!! DEGRADED: {}\n",
            report
                .meta
                .degraded_reason
                .as_deref()
                .unwrap_or("reason not recorded")
        ));
    }

    out.push_str(&format!("\nSummary\n  {}\n", d.summary));
    out.push_str(&format!("\nRoot Cause\n  {}\n", d.root_cause));

    out.push_str("\nRemediation Steps\n");
    for (i, step) in d.steps.iter().enumerate() {
        out.push_str(&format!("  {}. {step}\n", i + 1));
    }

    if !d.preventive_measures.is_empty() {
        out.push_str("\nPrevention\n");
        for measure in &d.preventive_measures {
            out.push_str(&format!("  - {measure}\n"));
        }
    }

    if let Some(fix_time) = &d.estimated_fix_time {
        out.push_str(&format!("\nEstimated fix time: {fix_time}\n"));
    }

    if !fc.discrepancies.is_empty() {
        out.push_str("\nUnverified Claims\n");
        for discrepancy in &fc.discrepancies {
            out.push_str(&format!("  - {discrepancy}\n"));
        }
    }

    if !d.grounding.is_empty() {
        out.push_str(&format!("\nGrounded in: {}\n", d.grounding.join(", ")));
    }

    out.push_str(&format!(
        "\nmatches: {} regex, {} semantic{} | revisions: {} | {} ms\n",
        report.meta.regex_matches,
        report.meta.semantic_matches,
        if report.meta.semantic_degraded {
            " (semantic degraded)"
        } else {
            ""
        },
        report.meta.revisions,
        report.meta.timings.total_ms,
    ));
    out
}

/// Write a report as pretty JSON.
pub fn write_report_json(path: &Path, report: &DiagnosticReport) -> Result<()> {
    let content = serde_json::to_string_pretty(report).context("serialize report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Diagnosis, ErrorEvent, FactCheckResult, ReportMeta, StageTimings,
    };
    use chrono::Utc;
    use flowmedic_kb::Severity;
    use uuid::Uuid;

    fn report(degraded: bool) -> DiagnosticReport {
        DiagnosticReport {
            event: ErrorEvent::new("connection timed out").with_workflow("nightly_sales"),
            diagnosis: Diagnosis {
                summary: "The connection to the source timed out.".to_string(),
                root_cause: "Target server overloaded".to_string(),
                category: "connectivity".to_string(),
                severity: Severity::High,
                steps: vec!["Increase the timeout".to_string()],
                preventive_measures: vec!["Monitor latency".to_string()],
                estimated_fix_time: Some("20 minutes".to_string()),
                grounding: vec!["rule_connection_timeout".to_string()],
                origin: DiagnosisOrigin::Model,
            },
            fact_check: FactCheckResult {
                confidence: 0.85,
                level: ConfidenceLevel::High,
                accepted: !degraded,
                discrepancies: vec![],
                method: VerificationMethod::Reasoned,
            },
            meta: ReportMeta {
                report_id: Uuid::nil(),
                generated_at: Utc::now(),
                regex_matches: 1,
                semantic_matches: 2,
                semantic_degraded: false,
                revisions: 0,
                degraded,
                degraded_reason: degraded.then(|| "reasoning service failed".to_string()),
                timings: StageTimings::default(),
            },
        }
    }

    #[test]
    fn text_render_covers_the_key_sections() {
        let text = render_text(&report(false));
        assert!(text.contains("Diagnostic Report"));
        assert!(text.contains("nightly_sales"));
        assert!(text.contains("Root Cause"));
        assert!(text.contains("1. Increase the timeout"));
        assert!(text.contains("rule_connection_timeout"));
        assert!(!text.contains("DEGRADED"));
    }

    #[test]
    fn degraded_reports_are_flagged_prominently() {
        let text = render_text(&report(true));
        assert!(text.contains("DEGRADED: reasoning service failed"));
    }

    #[test]
    fn json_report_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("report.json");
        let original = report(false);
        write_report_json(&path, &original).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let back: DiagnosticReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(original, back);
    }
}
