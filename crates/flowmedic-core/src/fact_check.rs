//! Fact-checking stage: independently re-examine a synthesized diagnosis
//! against the knowledge sources before it may leave the pipeline.
//!
//! The deterministic cross-reference is authoritative: every claim (root
//! cause and each remediation step) is tested against the grounding
//! candidates and the raw event text, and unsupported claims become
//! discrepancies. The reasoning service may refine the confidence score
//! within a fixed band around the deterministic value, never override it.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use flowmedic_kb::normalize::{normalize, tokenize, truncate};
use flowmedic_kb::{dedup_and_rank, MatchCandidate};

use crate::config::PipelineConfig;
use crate::domain::{
    ConfidenceLevel, Diagnosis, ErrorEvent, FactCheckResult, VerificationMethod,
};
use crate::reasoning::{strip_code_fences, ReasoningService};
use crate::retry::{with_retry, RetryPolicy};

const VERIFY_INSTRUCTION: &str = "\
You are performing fact-checking on a machine-generated failure diagnosis. \
Compare the diagnosis against the original error and the verified knowledge \
base matches, then rate your overall confidence in its accuracy.

Respond with valid JSON only: {\"confidence\": 0.0}";

/// Claims whose confidence the model may shift, at most, in either
/// direction from the deterministic score.
const REFINEMENT_BAND: f32 = 0.2;

/// Minimum fraction of a claim's content tokens that must appear in the
/// evidence for the claim to count as supported.
const SUPPORT_OVERLAP: f32 = 0.3;

#[derive(Debug, Deserialize)]
struct VerificationDraft {
    confidence: f32,
}

pub struct FactChecker {
    service: Arc<dyn ReasoningService>,
    retry: RetryPolicy,
    acceptance_threshold: f32,
    discrepancy_ceiling: usize,
}

impl FactChecker {
    pub fn new(service: Arc<dyn ReasoningService>, config: &PipelineConfig) -> Self {
        Self {
            service,
            retry: config.retry,
            acceptance_threshold: config.acceptance_threshold,
            discrepancy_ceiling: config.discrepancy_ceiling,
        }
    }

    /// Cross-reference the diagnosis against its grounding and assign a
    /// confidence score. Never fails: reasoning trouble degrades to the
    /// deterministic score alone.
    pub async fn verify(
        &self,
        event: &ErrorEvent,
        diagnosis: &Diagnosis,
        candidates: &[MatchCandidate],
    ) -> FactCheckResult {
        let ranked = dedup_and_rank(candidates);
        let (deterministic, discrepancies) = self.cross_reference(event, diagnosis, &ranked);

        let (confidence, method) = match self.refine(event, diagnosis, &ranked).await {
            Some(model_score) => {
                let bounded = model_score.clamp(
                    (deterministic - REFINEMENT_BAND).max(0.0),
                    (deterministic + REFINEMENT_BAND).min(1.0),
                );
                (bounded, VerificationMethod::Reasoned)
            }
            None => (deterministic, VerificationMethod::HeuristicOnly),
        };

        let accepted = confidence >= self.acceptance_threshold
            && discrepancies.len() < self.discrepancy_ceiling;

        info!(
            event = "fact_check.evaluated",
            confidence = confidence,
            accepted = accepted,
            discrepancies = discrepancies.len(),
        );

        FactCheckResult {
            confidence,
            level: ConfidenceLevel::from_score(confidence),
            accepted,
            discrepancies,
            method,
        }
    }

    /// Deterministic verification: support fraction, regex grounding, and
    /// severity agreement.
    fn cross_reference(
        &self,
        event: &ErrorEvent,
        diagnosis: &Diagnosis,
        ranked: &[MatchCandidate],
    ) -> (f32, Vec<String>) {
        let mut evidence_text = normalize(&event.matching_text());
        let mut evidence_tokens: BTreeSet<String> =
            tokenize(&evidence_text).into_iter().collect();
        for cand in ranked {
            let text = cand.entry.evidence_text();
            evidence_tokens.extend(tokenize(&text));
            evidence_text.push(' ');
            evidence_text.push_str(&text);
        }

        let claims = diagnosis.claims();
        let mut supported = 0usize;
        let mut discrepancies = Vec::new();
        for claim in &claims {
            if claim_supported(claim, &evidence_text, &evidence_tokens) {
                supported += 1;
            } else {
                discrepancies.push(format!(
                    "claim not supported by the knowledge base or the error text: \"{}\"",
                    truncate(claim, 120)
                ));
            }
        }

        let fraction = if claims.is_empty() {
            0.0
        } else {
            supported as f32 / claims.len() as f32
        };
        let has_regex = ranked.iter().any(MatchCandidate::is_regex);
        let severity_agrees = ranked
            .first()
            .is_some_and(|best| best.entry.severity == diagnosis.severity);

        let confidence = (0.55 * fraction
            + if has_regex { 0.25 } else { 0.0 }
            + if severity_agrees { 0.20 } else { 0.0 })
        .clamp(0.0, 1.0);

        (confidence, discrepancies)
    }

    /// One bounded reasoning call; `None` when the service is unavailable
    /// or its output is malformed.
    async fn refine(
        &self,
        event: &ErrorEvent,
        diagnosis: &Diagnosis,
        ranked: &[MatchCandidate],
    ) -> Option<f32> {
        let context = json!({
            "original_error": {
                "message": truncate(&event.message, 1_000),
                "error_code": event.error_code,
                "workflow": event.workflow,
            },
            "diagnosis": {
                "summary": diagnosis.summary,
                "root_cause": diagnosis.root_cause,
                "category": diagnosis.category,
                "severity": diagnosis.severity.as_str(),
                "steps": diagnosis.steps,
            },
            "kb_matches": ranked.iter().take(3).map(|c| json!({
                "title": c.entry.title,
                "category": c.entry.category,
                "severity": c.entry.severity.as_str(),
                "score": c.score,
            })).collect::<Vec<_>>(),
        });
        let prompt = format!(
            "Fact-check this failure diagnosis:\n\n{}\n\n\
             Respond with your confidence in JSON format.",
            serde_json::to_string_pretty(&context).unwrap_or_default()
        );

        let text = with_retry(&self.retry, "fact_check", || {
            self.service.generate(VERIFY_INSTRUCTION, &prompt)
        })
        .await
        .map_err(|err| warn!(event = "fact_check.degraded", error = %err))
        .ok()?;

        match serde_json::from_str::<VerificationDraft>(&strip_code_fences(&text)) {
            Ok(draft) if draft.confidence.is_finite() => Some(draft.confidence.clamp(0.0, 1.0)),
            _ => {
                warn!(event = "fact_check.malformed_refinement");
                None
            }
        }
    }
}

/// A claim is supported when it appears literally in the evidence or when
/// enough of its content tokens do.
fn claim_supported(claim: &str, evidence_text: &str, evidence_tokens: &BTreeSet<String>) -> bool {
    let normalized = normalize(claim);
    if evidence_text.contains(&normalized) {
        return true;
    }
    let content: Vec<String> = tokenize(&normalized)
        .into_iter()
        .filter(|t| t.len() >= 4)
        .collect();
    if content.is_empty() {
        // Nothing substantive to verify.
        return true;
    }
    let hits = content
        .iter()
        .filter(|t| evidence_tokens.contains(*t))
        .count();
    hits as f32 / content.len() as f32 >= SUPPORT_OVERLAP
}
