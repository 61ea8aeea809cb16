//! Match candidates produced by knowledge base lookups.

use serde::{Deserialize, Serialize};

use crate::entry::KnowledgeEntry;

/// Which knowledge base produced a candidate.
///
/// Regex candidates are deterministic ground truth and outrank semantic
/// candidates on equal score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Regex,
    Semantic,
}

impl MatchSource {
    /// Tie-break rank: lower wins.
    fn rank(self) -> u8 {
        match self {
            MatchSource::Regex => 0,
            MatchSource::Semantic => 1,
        }
    }
}

/// Output of a knowledge base lookup: the matched entry, the source tag,
/// and a score. Regex matches carry a fixed score of 1.0; semantic matches
/// carry cosine similarity in [0, 1].
///
/// Candidates are transient — produced per event, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub entry: KnowledgeEntry,
    pub source: MatchSource,
    pub score: f32,
}

impl MatchCandidate {
    pub fn regex(entry: KnowledgeEntry) -> Self {
        Self {
            entry,
            source: MatchSource::Regex,
            score: 1.0,
        }
    }

    pub fn semantic(entry: KnowledgeEntry, similarity: f32) -> Self {
        Self {
            entry,
            source: MatchSource::Semantic,
            score: similarity.clamp(0.0, 1.0),
        }
    }

    pub fn entry_id(&self) -> &str {
        &self.entry.id
    }

    pub fn is_regex(&self) -> bool {
        self.source == MatchSource::Regex
    }
}

/// Deduplicate candidates by entry id and rank them for synthesis context:
/// score descending, regex before semantic on ties, input order otherwise.
///
/// When the same entry was matched by both sources, the regex candidate is
/// kept.
pub fn dedup_and_rank(candidates: &[MatchCandidate]) -> Vec<MatchCandidate> {
    let mut kept: Vec<MatchCandidate> = Vec::new();
    for cand in candidates {
        match kept.iter_mut().find(|k| k.entry.id == cand.entry.id) {
            Some(existing) => {
                let better = cand.score > existing.score
                    || (cand.score == existing.score
                        && cand.source.rank() < existing.source.rank());
                if better {
                    *existing = cand.clone();
                }
            }
            None => kept.push(cand.clone()),
        }
    }
    // Stable sort preserves input order for true ties.
    kept.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.source.rank().cmp(&b.source.rank()))
    });
    kept
}
