//! Synthesized structured diagnosis.

use serde::{Deserialize, Serialize};

use flowmedic_kb::Severity;

/// How a diagnosis came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisOrigin {
    /// Produced by the generative reasoning service.
    Model,
    /// Built from the best knowledge base candidate after the reasoning
    /// service failed or returned malformed output.
    Template,
    /// Generic diagnosis with no candidates and no model input.
    InsufficientInformation,
}

/// Structured explanation of a failure.
///
/// Produced by synthesis; replaced at most once by a revision during
/// fact-checking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Plain-language explanation of what went wrong.
    pub summary: String,
    pub root_cause: String,
    pub category: String,
    pub severity: Severity,
    /// Ordered remediation steps.
    pub steps: Vec<String>,
    #[serde(default)]
    pub preventive_measures: Vec<String>,
    #[serde(default)]
    pub estimated_fix_time: Option<String>,
    /// Knowledge entry ids cited as evidentiary support.
    #[serde(default)]
    pub grounding: Vec<String>,
    pub origin: DiagnosisOrigin,
}

impl Diagnosis {
    /// Factual claims the fact checker must cross-reference: the root
    /// cause plus every remediation step.
    pub fn claims(&self) -> Vec<&str> {
        let mut claims = vec![self.root_cause.as_str()];
        claims.extend(self.steps.iter().map(String::as_str));
        claims
    }

    pub fn is_grounded_in(&self, entry_id: &str) -> bool {
        self.grounding.iter().any(|id| id == entry_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_cover_root_cause_and_steps() {
        let diagnosis = Diagnosis {
            summary: "The source file is missing.".to_string(),
            root_cause: "Upstream delivery did not complete".to_string(),
            category: "storage".to_string(),
            severity: Severity::High,
            steps: vec![
                "Verify the blob exists".to_string(),
                "Re-run the upstream job".to_string(),
            ],
            preventive_measures: vec![],
            estimated_fix_time: None,
            grounding: vec!["rule_path_not_found".to_string()],
            origin: DiagnosisOrigin::Model,
        };
        assert_eq!(diagnosis.claims().len(), 3);
        assert!(diagnosis.is_grounded_in("rule_path_not_found"));
        assert!(!diagnosis.is_grounded_in("other"));
    }
}
