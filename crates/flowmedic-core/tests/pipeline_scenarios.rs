//! End-to-end pipeline scenarios over the built-in corpora with a
//! scripted reasoning service.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flowmedic_core::{
    ConfidenceLevel, DiagnosisOrigin, ErrorEvent, Pipeline, PipelineConfig, ReasoningError,
    ReasoningService, RetryPolicy, VerificationMethod,
};

/// Scripted service: synthesis calls consume queued responses (the last
/// one repeats), verification calls always get the same response. The
/// two are told apart by their instruction text.
struct Scripted {
    synthesis: Mutex<VecDeque<String>>,
    last_synthesis: Mutex<Option<String>>,
    verification: String,
    synthesis_calls: AtomicUsize,
    verification_calls: AtomicUsize,
}

impl Scripted {
    fn new(synthesis: Vec<&str>, verification: &str) -> Self {
        Self {
            synthesis: Mutex::new(synthesis.iter().map(|s| s.to_string()).collect()),
            last_synthesis: Mutex::new(None),
            verification: verification.to_string(),
            synthesis_calls: AtomicUsize::new(0),
            verification_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ReasoningService for Scripted {
    async fn generate(&self, instruction: &str, _prompt: &str) -> Result<String, ReasoningError> {
        if instruction.contains("fact-checking") {
            self.verification_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(self.verification.clone());
        }
        self.synthesis_calls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.synthesis.lock().unwrap();
        let mut last = self.last_synthesis.lock().unwrap();
        if let Some(next) = queue.pop_front() {
            *last = Some(next.clone());
            Ok(next)
        } else {
            last.clone()
                .ok_or_else(|| ReasoningError::Unavailable("no scripted response".to_string()))
        }
    }
}

fn config() -> PipelineConfig {
    PipelineConfig {
        retry: RetryPolicy {
            max_attempts: 1,
            timeout_ms: 1_000,
            backoff_base_ms: 1,
        },
        ..PipelineConfig::default()
    }
}

const GROUNDED_STORAGE_DIAGNOSIS: &str = r#"{
  "summary": "The copy step failed because the source blob does not exist at the resolved path.",
  "root_cause": "The upstream system has not delivered the file yet",
  "category": "storage",
  "severity": "high",
  "steps": [
    "Verify the blob or file exists at the resolved path in the storage account",
    "Confirm the upstream delivery completed successfully"
  ],
  "preventive_measures": ["Trigger runs from file-arrival events instead of fixed schedules"],
  "estimated_fix_time": "10-30 minutes"
}"#;

const FABRICATED_DIAGNOSIS: &str = r#"{
  "summary": "A cosmic anomaly disrupted the orchestration fabric.",
  "root_cause": "Interdimensional flux corrupted the scheduler quantum state",
  "category": "hardware",
  "severity": "critical",
  "steps": ["Realign the tachyon emitters on the primary cluster"],
  "preventive_measures": [],
  "estimated_fix_time": "unknown"
}"#;

#[tokio::test]
async fn known_storage_failure_is_diagnosed_and_accepted() {
    let service = Arc::new(Scripted::new(
        vec![GROUNDED_STORAGE_DIAGNOSIS],
        r#"{"confidence": 0.92}"#,
    ));
    let pipeline = Pipeline::new(service.clone(), config()).unwrap();

    let event = ErrorEvent::new(
        "Operation on target CopySalesData failed: ErrorCode=PathNotFound, \
         Message=Cannot find the specified blob in container 'raw-sales'",
    )
    .with_workflow("nightly_sales_ingest")
    .with_activity("CopySalesData")
    .with_error_code("PathNotFound");

    let report = pipeline.analyze(&event).await;

    assert!(report.fact_check.accepted);
    assert!(report.is_verified());
    assert_eq!(report.fact_check.level, ConfidenceLevel::High);
    assert_eq!(report.fact_check.method, VerificationMethod::Reasoned);
    assert!(report.fact_check.discrepancies.is_empty());

    assert_eq!(report.diagnosis.origin, DiagnosisOrigin::Model);
    assert!(report.diagnosis.is_grounded_in("rule_path_not_found"));
    assert!(report.meta.regex_matches >= 1);
    assert_eq!(report.meta.revisions, 0);
    assert!(!report.meta.degraded);
    assert_eq!(service.synthesis_calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.verification_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fabricated_diagnosis_for_unknown_error_is_rejected_and_degraded() {
    // The verification response is maximally agreeable; the deterministic
    // cross-reference must still reject the ungrounded diagnosis.
    let service = Arc::new(Scripted::new(
        vec![FABRICATED_DIAGNOSIS],
        r#"{"confidence": 0.99}"#,
    ));
    let pipeline = Pipeline::new(service.clone(), config()).unwrap();

    let event = ErrorEvent::new("xyzzy plugh: the quux frobnicated unexpectedly");
    let report = pipeline.analyze(&event).await;

    assert_eq!(report.meta.regex_matches, 0);
    assert_eq!(report.meta.semantic_matches, 0);

    assert!(!report.fact_check.accepted);
    assert!(report.fact_check.confidence < 0.6);
    assert!(!report.fact_check.discrepancies.is_empty());

    // Exactly one revision attempt, then degrade instead of looping.
    assert_eq!(report.meta.revisions, 1);
    assert_eq!(service.synthesis_calls.load(Ordering::SeqCst), 2);
    assert!(report.meta.degraded);
    assert!(report
        .meta
        .degraded_reason
        .as_deref()
        .unwrap()
        .contains("rejected by fact-checking"));
    assert!(!report.diagnosis.summary.is_empty());
}

#[tokio::test]
async fn semantic_only_match_supports_an_accepted_diagnosis() {
    let diagnosis = r#"{
      "summary": "A worker ran out of memory while processing the dataset.",
      "root_cause": "The dataset is larger than the allocated worker memory",
      "category": "resource",
      "severity": "critical",
      "steps": [
        "Increase the worker memory or cluster size",
        "Repartition the data to even out the load"
      ],
      "preventive_measures": ["Right-size compute from observed data volumes"],
      "estimated_fix_time": "30-90 minutes"
    }"#;
    let service = Arc::new(Scripted::new(vec![diagnosis], r#"{"confidence": 0.8}"#));
    let pipeline = Pipeline::new(
        service,
        PipelineConfig {
            similarity_floor: 0.2,
            ..config()
        },
    )
    .unwrap();

    let event = ErrorEvent::new(
        "worker ran out of memory: heap space exhausted, gc overhead limit \
         exceeded while processing a large dataset",
    );
    let report = pipeline.analyze(&event).await;

    assert_eq!(report.meta.regex_matches, 0);
    assert!(report.meta.semantic_matches >= 1);
    assert!(report.diagnosis.is_grounded_in("sem_out_of_memory"));
    assert!(report.fact_check.accepted);
    assert!(!report.meta.degraded);
}

#[tokio::test]
async fn overlapping_regex_rules_both_ground_the_final_report() {
    let diagnosis = r#"{
      "summary": "The connection to the host timed out before completing.",
      "root_cause": "The target server is overloaded",
      "category": "connectivity",
      "severity": "high",
      "steps": [
        "Increase the timeout on the connection configuration",
        "Check target server health and performance metrics"
      ],
      "preventive_measures": [],
      "estimated_fix_time": "15-30 minutes"
    }"#;
    let service = Arc::new(Scripted::new(vec![diagnosis], r#"{"confidence": 0.9}"#));
    let pipeline = Pipeline::new(service, config()).unwrap();

    let event = ErrorEvent::new("TCP/IP connection to the host failed: connection timed out");
    let report = pipeline.analyze(&event).await;

    assert!(report.meta.regex_matches >= 2);
    assert!(report.diagnosis.is_grounded_in("rule_connection_timeout"));
    assert!(report.diagnosis.is_grounded_in("rule_connection_refused"));
    assert!(report.fact_check.accepted);
    assert_eq!(report.meta.revisions, 0);
}

#[tokio::test]
async fn rejected_first_draft_is_revised_and_then_accepted() {
    // Verification text is not JSON, so scoring is heuristic-only and
    // fully driven by the deterministic cross-reference.
    let service = Arc::new(Scripted::new(
        vec![FABRICATED_DIAGNOSIS, GROUNDED_STORAGE_DIAGNOSIS],
        "I cannot quantify that.",
    ));
    let pipeline = Pipeline::new(service.clone(), config()).unwrap();

    let event = ErrorEvent::new("ErrorCode=PathNotFound: cannot find the specified blob")
        .with_error_code("PathNotFound");
    let report = pipeline.analyze(&event).await;

    assert_eq!(report.meta.revisions, 1);
    assert_eq!(service.synthesis_calls.load(Ordering::SeqCst), 2);
    assert!(report.fact_check.accepted);
    assert_eq!(report.fact_check.method, VerificationMethod::HeuristicOnly);
    assert!(!report.meta.degraded);
    assert!(report.diagnosis.is_grounded_in("rule_path_not_found"));
}

#[tokio::test]
async fn worse_revision_does_not_replace_a_better_first_draft() {
    // First draft is fully backed by the event text (no KB matches, so it
    // still lands just below the acceptance threshold); the revision is
    // pure fabrication. The shipped report must keep the first draft.
    let first_draft = r#"{
      "summary": "The staging widget valve jammed during the export.",
      "root_cause": "The widget valve jammed in staging",
      "category": "mechanical",
      "severity": "medium",
      "steps": [
        "Inspect the staging widget valve",
        "Restart the quux service"
      ],
      "preventive_measures": [],
      "estimated_fix_time": "unknown"
    }"#;
    let service = Arc::new(Scripted::new(
        vec![first_draft, FABRICATED_DIAGNOSIS],
        "I cannot quantify that.",
    ));
    let pipeline = Pipeline::new(service.clone(), config()).unwrap();

    let event = ErrorEvent::new(
        "nightly export halted: the staging widget valve jammed after the \
         quux service frobnicated",
    );
    let report = pipeline.analyze(&event).await;

    assert_eq!(report.meta.revisions, 1);
    assert_eq!(service.synthesis_calls.load(Ordering::SeqCst), 2);
    assert!(report.meta.degraded);

    // The first draft's verdict (supported claims, no discrepancies)
    // beats the fabricated revision's, so it ships.
    assert!(report.diagnosis.root_cause.contains("widget valve"));
    assert!(report.fact_check.discrepancies.is_empty());
    assert!(report.fact_check.confidence > 0.5);
    assert!(!report.fact_check.accepted);
    assert_eq!(report.fact_check.method, VerificationMethod::HeuristicOnly);
}

#[tokio::test]
async fn reports_serialize_to_snake_case_json() {
    let service = Arc::new(Scripted::new(
        vec![GROUNDED_STORAGE_DIAGNOSIS],
        r#"{"confidence": 0.9}"#,
    ));
    let pipeline = Pipeline::new(service, config()).unwrap();
    let report = pipeline
        .quick_analyze(
            "ErrorCode=PathNotFound: cannot find the specified blob",
            Some("adhoc_ingest"),
        )
        .await;

    assert_eq!(report.event.workflow.as_deref(), Some("adhoc_ingest"));
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"root_cause\""));
    assert!(json.contains("\"report_id\""));
    assert!(json.contains("\"reasoned\""));
}
