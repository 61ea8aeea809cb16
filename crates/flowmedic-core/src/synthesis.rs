//! Synthesis stage: compose the raw event and knowledge base candidates
//! into one structured diagnosis via the reasoning service.
//!
//! The stage never leaves the pipeline without a diagnosis: a malformed or
//! failed generation falls back to a template built from the best
//! candidate, or to a generic insufficient-information diagnosis when no
//! candidate matched.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use flowmedic_kb::normalize::truncate;
use flowmedic_kb::{dedup_and_rank, MatchCandidate, Severity};

use crate::config::PipelineConfig;
use crate::domain::{Diagnosis, DiagnosisOrigin, ErrorEvent};
use crate::reasoning::{strip_code_fences, ReasoningService};
use crate::retry::{with_retry, RetryPolicy};

const SYNTHESIS_INSTRUCTION: &str = "\
You are a senior workflow reliability engineer. Analyze the failure context \
and produce a diagnosis a colleague could act on at 3 AM. Ground every claim \
in the provided knowledge base matches and the raw error text.

Respond with valid JSON only, using exactly this structure:
{
    \"summary\": \"plain-language explanation of what went wrong\",
    \"root_cause\": \"most likely root cause\",
    \"category\": \"failure category\",
    \"severity\": \"critical|high|medium|low\",
    \"steps\": [\"ordered remediation step\"],
    \"preventive_measures\": [\"how to prevent a recurrence\"],
    \"estimated_fix_time\": \"rough estimate\"
}";

/// Result of one synthesis attempt. `fallback_reason` is set when the
/// diagnosis was produced without usable model output.
#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
    pub diagnosis: Diagnosis,
    pub fallback_reason: Option<String>,
}

/// Expected shape of the model response. Lenient on extras, strict on the
/// fields a diagnosis cannot exist without.
#[derive(Debug, Deserialize)]
struct DiagnosisDraft {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    root_cause: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    steps: Vec<String>,
    #[serde(default)]
    preventive_measures: Vec<String>,
    #[serde(default)]
    estimated_fix_time: Option<String>,
}

pub struct Synthesizer {
    service: Arc<dyn ReasoningService>,
    retry: RetryPolicy,
    max_context_chars: usize,
    max_grounding: usize,
}

impl Synthesizer {
    pub fn new(service: Arc<dyn ReasoningService>, config: &PipelineConfig) -> Self {
        Self {
            service,
            retry: config.retry,
            max_context_chars: config.max_context_chars,
            max_grounding: config.max_grounding,
        }
    }

    /// Synthesize a diagnosis from the event and its match candidates.
    ///
    /// `revision_notes` carries the fact checker's discrepancy list on the
    /// single revision attempt. One outbound reasoning call per attempt;
    /// transient transport failures are absorbed by the retry policy.
    pub async fn synthesize(
        &self,
        event: &ErrorEvent,
        candidates: &[MatchCandidate],
        revision_notes: Option<&[String]>,
    ) -> SynthesisOutcome {
        let mut ranked = dedup_and_rank(candidates);
        ranked.truncate(self.max_grounding);
        let grounding: Vec<String> = ranked.iter().map(|c| c.entry.id.clone()).collect();

        let prompt = self.build_prompt(event, &ranked, revision_notes);
        let generated = with_retry(&self.retry, "synthesis", || {
            self.service.generate(SYNTHESIS_INSTRUCTION, &prompt)
        })
        .await;

        match generated {
            Ok(text) => match parse_draft(&text) {
                Ok(draft) => {
                    info!(event = "synthesis.parsed", grounded = grounding.len());
                    SynthesisOutcome {
                        diagnosis: draft_to_diagnosis(draft, grounding),
                        fallback_reason: None,
                    }
                }
                Err(reason) => {
                    warn!(event = "synthesis.malformed", reason = %reason);
                    SynthesisOutcome {
                        diagnosis: fallback_diagnosis(event, &ranked, grounding),
                        fallback_reason: Some(format!("malformed synthesis response: {reason}")),
                    }
                }
            },
            Err(err) => {
                warn!(event = "synthesis.failed", error = %err);
                SynthesisOutcome {
                    diagnosis: fallback_diagnosis(event, &ranked, grounding),
                    fallback_reason: Some(format!("reasoning service failed: {err}")),
                }
            }
        }
    }

    fn build_prompt(
        &self,
        event: &ErrorEvent,
        ranked: &[MatchCandidate],
        revision_notes: Option<&[String]>,
    ) -> String {
        let kb_matches: Vec<_> = ranked
            .iter()
            .map(|c| {
                json!({
                    "id": c.entry.id,
                    "title": c.entry.title,
                    "category": c.entry.category,
                    "severity": c.entry.severity.as_str(),
                    "source": c.source,
                    "score": c.score,
                    "known_causes": c.entry.causes,
                    "known_solutions": c.entry.solutions,
                })
            })
            .collect();

        let context = json!({
            "error_message": truncate(&event.message, self.max_context_chars),
            "error_code": event.error_code,
            "workflow": event.workflow,
            "activity": event.activity,
            "run_id": event.run_id,
            "knowledge_base_matches": kb_matches,
        });

        let mut prompt = format!(
            "Analyze this workflow failure and provide a diagnostic report.\n\n\
             Error Context:\n{}\n\n\
             Respond with the JSON structure from your instructions.",
            serde_json::to_string_pretty(&context).unwrap_or_default()
        );

        if let Some(notes) = revision_notes {
            prompt.push_str(
                "\n\nA previous diagnosis was rejected by fact-checking. \
                 Revise it and address these gaps:\n",
            );
            for note in notes {
                prompt.push_str("- ");
                prompt.push_str(note);
                prompt.push('\n');
            }
        }
        prompt
    }
}

/// Validate the raw model text into a draft. Markdown fences are stripped
/// first; a draft missing its summary, root cause, or steps is rejected.
fn parse_draft(text: &str) -> Result<DiagnosisDraft, String> {
    let cleaned = strip_code_fences(text);
    if cleaned.is_empty() {
        return Err("empty response".to_string());
    }
    let draft: DiagnosisDraft =
        serde_json::from_str(&cleaned).map_err(|e| format!("invalid JSON: {e}"))?;
    if draft.summary.trim().is_empty() {
        return Err("missing summary".to_string());
    }
    if draft.root_cause.trim().is_empty() {
        return Err("missing root_cause".to_string());
    }
    if draft.steps.iter().all(|s| s.trim().is_empty()) {
        return Err("missing remediation steps".to_string());
    }
    Ok(draft)
}

fn draft_to_diagnosis(draft: DiagnosisDraft, grounding: Vec<String>) -> Diagnosis {
    Diagnosis {
        summary: draft.summary,
        root_cause: draft.root_cause,
        category: if draft.category.trim().is_empty() {
            "unknown".to_string()
        } else {
            draft.category
        },
        severity: Severity::parse_lenient(&draft.severity),
        steps: draft
            .steps
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect(),
        preventive_measures: draft.preventive_measures,
        estimated_fix_time: draft.estimated_fix_time,
        grounding,
        origin: DiagnosisOrigin::Model,
    }
}

/// Template diagnosis derived without model input: the highest-scoring
/// candidate if any, otherwise a generic manual-investigation diagnosis.
fn fallback_diagnosis(
    event: &ErrorEvent,
    ranked: &[MatchCandidate],
    grounding: Vec<String>,
) -> Diagnosis {
    match ranked.first() {
        Some(best) => {
            let entry = &best.entry;
            Diagnosis {
                summary: format!(
                    "The failure matches a known pattern: {}. {}",
                    entry.title, entry.description
                ),
                root_cause: if entry.causes.is_empty() {
                    entry.description.clone()
                } else {
                    entry.causes.join(". ")
                },
                category: entry.category.clone(),
                severity: entry.severity,
                steps: entry.solutions.clone(),
                preventive_measures: entry.prevention.clone(),
                estimated_fix_time: entry.estimated_fix_time.clone(),
                grounding,
                origin: DiagnosisOrigin::Template,
            }
        }
        None => Diagnosis {
            summary: format!(
                "The failure{} did not match any documented pattern and no \
                 model analysis is available.",
                event
                    .workflow
                    .as_deref()
                    .map(|w| format!(" in workflow '{w}'"))
                    .unwrap_or_default()
            ),
            root_cause: "Could not automatically determine the root cause from the \
                         available information."
                .to_string(),
            category: "unknown".to_string(),
            severity: Severity::Medium,
            steps: vec![
                "Open the workflow monitor and locate the failing run".to_string(),
                "Review the full error output of the failing activity".to_string(),
                "Check recent changes to the workflow configuration".to_string(),
            ],
            preventive_measures: vec![
                "Add the resolved failure to the knowledge corpus".to_string()
            ],
            estimated_fix_time: None,
            grounding,
            origin: DiagnosisOrigin::InsufficientInformation,
        },
    }
}
