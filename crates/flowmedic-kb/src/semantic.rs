//! Embedding-backed similarity index over the semantic corpus.
//!
//! The index embeds every entry document once at build time and answers
//! queries by cosine similarity. Builds are idempotent: the same corpus and
//! provider always produce the same index contents in the same order.
//! Rebuilds go through [`SharedSemanticIndex`], which swaps the index
//! atomically so in-flight lookups never observe a half-built index.

use std::sync::{Arc, RwLock};

use crate::candidate::MatchCandidate;
use crate::embedder::EmbeddingProvider;
use crate::entry::{Corpus, KnowledgeEntry};
use crate::error::EmbeddingError;
use crate::normalize::normalize;

/// Cosine similarity between two vectors. Zero-norm inputs score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

struct IndexedEntry {
    entry: KnowledgeEntry,
    vector: Vec<f32>,
}

/// Immutable semantic index over one corpus snapshot.
pub struct SemanticIndex {
    entries: Vec<IndexedEntry>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl SemanticIndex {
    /// Embed every entry document in corpus order.
    pub fn build(
        corpus: &Corpus,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, EmbeddingError> {
        let dims = embedder.dimensions();
        let mut entries = Vec::with_capacity(corpus.len());
        for entry in corpus.entries() {
            let vector = embedder.embed(&entry.embedding_document())?;
            if vector.len() != dims {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dims,
                    actual: vector.len(),
                });
            }
            entries.push(IndexedEntry {
                entry: entry.clone(),
                vector,
            });
        }
        tracing::info!(
            event = "semantic_index.built",
            entries = entries.len(),
            provider = embedder.name(),
        );
        Ok(Self { entries, embedder })
    }

    /// Top-`k` entries by descending cosine similarity against the
    /// normalised query. Entries below `floor` are discarded rather than
    /// returned with near-zero scores.
    pub fn search(
        &self,
        query: &str,
        k: usize,
        floor: f32,
    ) -> Result<Vec<MatchCandidate>, EmbeddingError> {
        let query_vec = self.embedder.embed(&normalize(query))?;

        let mut scored: Vec<(f32, &KnowledgeEntry)> = self
            .entries
            .iter()
            .map(|ie| (cosine_similarity(&query_vec, &ie.vector), &ie.entry))
            .filter(|(sim, _)| *sim >= floor)
            .collect();

        // Stable sort keeps corpus order for equal similarities.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(sim, entry)| MatchCandidate::semantic(entry.clone(), sim))
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn provider_name(&self) -> &str {
        self.embedder.name()
    }
}

/// Process-wide handle to the semantic index.
///
/// Readers clone the current `Arc` and never block on a rebuild; a rebuild
/// constructs the replacement index fully before swapping the reference.
pub struct SharedSemanticIndex {
    inner: RwLock<Arc<SemanticIndex>>,
}

impl SharedSemanticIndex {
    pub fn new(index: SemanticIndex) -> Self {
        Self {
            inner: RwLock::new(Arc::new(index)),
        }
    }

    /// Snapshot of the current index.
    pub fn current(&self) -> Arc<SemanticIndex> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Rebuild from a corpus and atomically swap the index reference.
    /// The old index stays valid for lookups already holding a snapshot.
    pub fn rebuild(&self, corpus: &Corpus) -> Result<(), EmbeddingError> {
        let embedder = self.current().embedder.clone();
        let fresh = SemanticIndex::build(corpus, embedder)?;
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(fresh);
        tracing::info!(event = "semantic_index.swapped", entries = corpus.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashedTfIdfEmbedder;
    use crate::entry::Severity;

    fn entry(id: &str, title: &str, description: &str) -> KnowledgeEntry {
        KnowledgeEntry {
            id: id.to_string(),
            title: title.to_string(),
            category: "connectivity".to_string(),
            severity: Severity::High,
            pattern: title.to_lowercase(),
            description: description.to_string(),
            causes: vec![],
            solutions: vec![],
            prevention: vec![],
            estimated_fix_time: None,
            documentation: vec![],
        }
    }

    fn corpus() -> Corpus {
        Corpus::from_entries(vec![
            entry(
                "timeout",
                "Connection Timeout",
                "A connection attempt to the data source timed out before completing.",
            ),
            entry(
                "auth",
                "Authentication Failure",
                "Login failed because the credentials were rejected or expired.",
            ),
            entry(
                "disk",
                "Disk Space Exhausted",
                "The worker ran out of disk space while staging files.",
            ),
        ])
        .unwrap()
    }

    fn index() -> SemanticIndex {
        SemanticIndex::build(&corpus(), Arc::new(HashedTfIdfEmbedder::default())).unwrap()
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn search_ranks_the_relevant_entry_first() {
        let idx = index();
        let hits = idx
            .search("connection timed out reaching the source", 3, 0.0)
            .unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].entry_id(), "timeout");
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn search_discards_entries_below_the_floor() {
        let idx = index();
        let hits = idx.search("connection timed out", 3, 0.95).unwrap();
        assert!(hits.iter().all(|c| c.score >= 0.95));
    }

    #[test]
    fn search_is_deterministic_across_calls() {
        let idx = index();
        let a = idx.search("login failed for user", 3, 0.0).unwrap();
        let b = idx.search("login failed for user", 3, 0.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn search_bounds_results_to_k() {
        let idx = index();
        let hits = idx.search("failure", 1, 0.0).unwrap();
        assert!(hits.len() <= 1);
    }

    #[test]
    fn shared_index_swaps_atomically() {
        let shared = SharedSemanticIndex::new(index());
        let before = shared.current();
        assert_eq!(before.len(), 3);

        let smaller = Corpus::from_entries(vec![entry(
            "timeout",
            "Connection Timeout",
            "A connection attempt timed out.",
        )])
        .unwrap();
        shared.rebuild(&smaller).unwrap();

        // Old snapshot still answers; new snapshot reflects the rebuild.
        assert_eq!(before.len(), 3);
        assert_eq!(shared.current().len(), 1);
    }
}
