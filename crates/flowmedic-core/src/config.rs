//! Pipeline configuration.
//!
//! The acceptance threshold and discrepancy ceiling are policy constants
//! with no single correct calibration, so they live here rather than in
//! code. Defaults are validated by the end-to-end scenarios.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Semantic candidates requested per lookup.
    pub top_k: usize,
    /// Minimum cosine similarity for a semantic candidate.
    pub similarity_floor: f32,
    /// Fact-check confidence required to accept a diagnosis.
    pub acceptance_threshold: f32,
    /// A diagnosis with this many discrepancies or more is rejected
    /// regardless of confidence.
    pub discrepancy_ceiling: usize,
    /// Upper bound on prompt context, in characters.
    pub max_context_chars: usize,
    /// Candidates included in the synthesis context and grounding list.
    pub max_grounding: usize,
    /// Retry policy for reasoning calls.
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            similarity_floor: 0.3,
            acceptance_threshold: 0.6,
            discrepancy_ceiling: 3,
            max_context_chars: 4_000,
            max_grounding: 5,
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file. Missing keys keep their
    /// defaults.
    pub fn load_toml(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: PipelineConfig =
            toml::from_str(&raw).with_context(|| format!("parse config {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_policy() {
        let config = PipelineConfig::default();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.acceptance_threshold, 0.6);
        assert_eq!(config.discrepancy_ceiling, 3);
        assert_eq!(config.similarity_floor, 0.3);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn toml_overrides_only_named_keys() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"acceptance_threshold = 0.75\ntop_k = 5\n")
            .unwrap();

        let config = PipelineConfig::load_toml(tmp.path()).unwrap();
        assert_eq!(config.acceptance_threshold, 0.75);
        assert_eq!(config.top_k, 5);
        // Untouched keys keep defaults.
        assert_eq!(config.discrepancy_ceiling, 3);
        assert_eq!(config.retry.timeout_ms, 30_000);
    }

    #[test]
    fn retry_policy_nests_in_toml() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"[retry]\nmax_attempts = 1\ntimeout_ms = 5000\n")
            .unwrap();

        let config = PipelineConfig::load_toml(tmp.path()).unwrap();
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.retry.timeout_ms, 5_000);
        assert_eq!(config.retry.backoff_base_ms, 500);
    }
}
