//! Pipeline orchestrator: matching, synthesis, fact-checking, and the
//! bounded revise-or-degrade loop, assembled into a [`DiagnosticReport`].
//!
//! Failure posture: once construction succeeds, analysis never fails.
//! A broken semantic index degrades to regex-only matching, a broken
//! reasoning service degrades to template synthesis and heuristic
//! verification, and every degradation is stated on the report.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use flowmedic_kb::{
    builtin, dedup_and_rank, Corpus, HashedTfIdfEmbedder, MatchCandidate, RegexKnowledgeBase,
    SemanticIndex, SharedSemanticIndex,
};

use crate::config::PipelineConfig;
use crate::domain::{
    DiagnosticReport, ErrorEvent, FactCheckResult, ReportMeta, Result, StageTimings,
};
use crate::fact_check::FactChecker;
use crate::obs;
use crate::reasoning::ReasoningService;
use crate::synthesis::{SynthesisOutcome, Synthesizer};

pub struct Pipeline {
    regex_kb: Arc<RegexKnowledgeBase>,
    semantic: Arc<SharedSemanticIndex>,
    synthesizer: Synthesizer,
    fact_checker: FactChecker,
    config: PipelineConfig,
}

impl Pipeline {
    /// Pipeline over the built-in corpora and the deterministic embedder.
    pub fn new(service: Arc<dyn ReasoningService>, config: PipelineConfig) -> Result<Self> {
        Self::with_corpora(
            service,
            config,
            &builtin::rule_corpus(),
            &builtin::semantic_corpus(),
        )
    }

    /// Pipeline over caller-supplied corpora. Pattern compilation and
    /// index construction errors are fatal here, never at analysis time.
    pub fn with_corpora(
        service: Arc<dyn ReasoningService>,
        config: PipelineConfig,
        rules: &Corpus,
        semantic: &Corpus,
    ) -> Result<Self> {
        let regex_kb = Arc::new(RegexKnowledgeBase::from_corpus(rules)?);
        let index = SemanticIndex::build(semantic, Arc::new(HashedTfIdfEmbedder::default()))?;
        Ok(Self {
            regex_kb,
            semantic: Arc::new(SharedSemanticIndex::new(index)),
            synthesizer: Synthesizer::new(service.clone(), &config),
            fact_checker: FactChecker::new(service, &config),
            config,
        })
    }

    /// Run the full pipeline on one error event.
    ///
    /// At most two synthesis attempts: the initial one, and one revision
    /// carrying the fact checker's discrepancies. A diagnosis still
    /// rejected after the revision ships as degraded rather than looping.
    pub async fn analyze(&self, event: &ErrorEvent) -> DiagnosticReport {
        let report_id = Uuid::new_v4();
        let _span = obs::ReportSpan::enter(&report_id.to_string());
        obs::emit_analysis_started(event.workflow.as_deref(), event.message.len());
        let total_start = Instant::now();

        let matching_start = Instant::now();
        let (candidates, regex_matches, semantic_matches, semantic_degraded) =
            self.gather_candidates(event).await;
        let matching_ms = elapsed_ms(matching_start);
        obs::emit_kb_matched(regex_matches, semantic_matches, matching_ms);

        let mut revisions = 0u32;
        let mut synthesis_ms = 0u64;
        let mut fact_check_ms = 0u64;

        let synthesis_start = Instant::now();
        let mut outcome = self.synthesizer.synthesize(event, &candidates, None).await;
        synthesis_ms += elapsed_ms(synthesis_start);
        obs::emit_synthesis_completed(origin_str(&outcome), 0, synthesis_ms);

        let fact_check_start = Instant::now();
        let mut verdict = self
            .fact_checker
            .verify(event, &outcome.diagnosis, &candidates)
            .await;
        fact_check_ms += elapsed_ms(fact_check_start);

        if !verdict.accepted {
            revisions = 1;
            let revise_start = Instant::now();
            let revised = self
                .synthesizer
                .synthesize(event, &candidates, Some(&verdict.discrepancies))
                .await;
            synthesis_ms += elapsed_ms(revise_start);
            obs::emit_synthesis_completed(origin_str(&revised), 1, synthesis_ms);

            let recheck_start = Instant::now();
            let rechecked = self
                .fact_checker
                .verify(event, &revised.diagnosis, &candidates)
                .await;
            fact_check_ms += elapsed_ms(recheck_start);

            // Keep the best available diagnosis: a revision that scores
            // worse than the rejected first draft does not replace it.
            if rechecked.accepted || rechecked.confidence >= verdict.confidence {
                outcome = revised;
                verdict = rechecked;
            }
        }

        let degraded_reason = degradation_reason(&outcome, &verdict, revisions);
        let degraded = degraded_reason.is_some();
        let total_ms = elapsed_ms(total_start);
        obs::emit_analysis_finished(verdict.accepted, degraded, revisions, total_ms);

        DiagnosticReport {
            event: event.clone(),
            diagnosis: outcome.diagnosis,
            fact_check: verdict,
            meta: ReportMeta {
                report_id,
                generated_at: Utc::now(),
                regex_matches,
                semantic_matches,
                semantic_degraded,
                revisions,
                degraded,
                degraded_reason,
                timings: StageTimings {
                    matching_ms,
                    synthesis_ms,
                    fact_check_ms,
                    total_ms,
                },
            },
        }
    }

    /// Analyze a bare message, optionally tagged with a workflow name.
    pub async fn quick_analyze(
        &self,
        message: &str,
        workflow: Option<&str>,
    ) -> DiagnosticReport {
        let mut event = ErrorEvent::new(message);
        if let Some(workflow) = workflow {
            event = event.with_workflow(workflow);
        }
        self.analyze(&event).await
    }

    /// Regex and semantic matching combined. Regex runs inline; the
    /// semantic lookup runs on the blocking pool against an immutable
    /// index snapshot, so a concurrent rebuild cannot disturb it.
    async fn gather_candidates(
        &self,
        event: &ErrorEvent,
    ) -> (Vec<MatchCandidate>, usize, usize, bool) {
        let text = event.matching_text();

        let snapshot = self.semantic.current();
        let query = text.clone();
        let top_k = self.config.top_k;
        let floor = self.config.similarity_floor;
        let semantic_task =
            tokio::task::spawn_blocking(move || snapshot.search(&query, top_k, floor));

        let regex_hits = self.regex_kb.match_event(&text);

        let (semantic_hits, semantic_degraded) = match semantic_task.await {
            Ok(Ok(hits)) => (hits, false),
            Ok(Err(err)) => {
                warn!(event = "semantic.degraded", error = %err);
                (Vec::new(), true)
            }
            Err(err) => {
                warn!(event = "semantic.degraded", error = %err);
                (Vec::new(), true)
            }
        };

        let regex_matches = regex_hits.len();
        let semantic_matches = semantic_hits.len();
        let mut candidates = regex_hits;
        candidates.extend(semantic_hits);
        (candidates, regex_matches, semantic_matches, semantic_degraded)
    }

    /// Pure knowledge lookup with no synthesis: every matching entry,
    /// deduplicated and ranked.
    pub fn search_knowledge(&self, query: &str) -> Vec<MatchCandidate> {
        let mut candidates = self.regex_kb.match_event(query);
        match self
            .semantic
            .current()
            .search(query, self.config.top_k, self.config.similarity_floor)
        {
            Ok(hits) => candidates.extend(hits),
            Err(err) => warn!(event = "semantic.degraded", error = %err),
        }
        dedup_and_rank(&candidates)
    }

    /// Swap in a freshly built semantic index. In-flight lookups keep
    /// their snapshot of the old one.
    pub fn rebuild_semantic_index(&self, corpus: &Corpus) -> Result<()> {
        self.semantic.rebuild(corpus)?;
        Ok(())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn origin_str(outcome: &SynthesisOutcome) -> &'static str {
    use crate::domain::DiagnosisOrigin::*;
    match outcome.diagnosis.origin {
        Model => "model",
        Template => "template",
        InsufficientInformation => "insufficient_information",
    }
}

/// A report is degraded when the shipped diagnosis was rejected even
/// after its one revision, or was produced without usable model output.
fn degradation_reason(
    outcome: &SynthesisOutcome,
    verdict: &FactCheckResult,
    revisions: u32,
) -> Option<String> {
    let mut reasons = Vec::new();
    if !verdict.accepted {
        reasons.push(format!(
            "diagnosis rejected by fact-checking after {revisions} revision(s)"
        ));
    }
    if let Some(fallback) = &outcome.fallback_reason {
        reasons.push(fallback.clone());
    }
    if reasons.is_empty() {
        None
    } else {
        Some(reasons.join("; "))
    }
}
