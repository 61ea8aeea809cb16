//! Canonical knowledge corpus format.
//!
//! A corpus is an ordered list of documented failure patterns. Entries carry
//! a stable identifier, a matcher pattern, a category/severity label, and a
//! solution template (causes, remediation steps, prevention, fix time).
//! The rule corpus and the semantic corpus share this shape.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CorpusError;
use crate::normalize;

/// Severity label carried by knowledge entries and diagnoses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Severity {
    /// Lenient parse used for free-form model output.
    pub fn parse_lenient(s: &str) -> Severity {
        match s.trim().to_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "low" => Severity::Low,
            _ => Severity::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

/// One documented failure pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Stable identifier, unique within a corpus.
    pub id: String,
    pub title: String,
    pub category: String,
    pub severity: Severity,
    /// Matcher: a regex for the rule corpus, raw indicative text for the
    /// semantic corpus.
    pub pattern: String,
    pub description: String,
    #[serde(default)]
    pub causes: Vec<String>,
    #[serde(default)]
    pub solutions: Vec<String>,
    #[serde(default)]
    pub prevention: Vec<String>,
    #[serde(default)]
    pub estimated_fix_time: Option<String>,
    #[serde(default)]
    pub documentation: Vec<String>,
}

impl KnowledgeEntry {
    /// Compose the text destined for embedding: a single document covering
    /// the title, classification, description, causes, solutions, and the
    /// matcher terms.
    pub fn embedding_document(&self) -> String {
        format!(
            "Error: {}. Category: {}. Severity: {}. Description: {} Common causes: {}. Solutions: {}. Error patterns: {}",
            self.title,
            self.category,
            self.severity.as_str(),
            self.description,
            self.causes.join(". "),
            self.solutions.join(". "),
            self.pattern,
        )
    }

    /// Normalised evidence text used by the fact checker when testing
    /// whether a claim is supported by this entry.
    pub fn evidence_text(&self) -> String {
        normalize::normalize(&self.embedding_document())
    }
}

/// Serialized corpus file shape: `{"entries": [...]}`.
#[derive(Debug, Serialize, Deserialize)]
struct CorpusFile {
    entries: Vec<KnowledgeEntry>,
}

/// An ordered, validated, read-only set of knowledge entries.
#[derive(Debug, Clone)]
pub struct Corpus {
    entries: Vec<KnowledgeEntry>,
}

impl Corpus {
    /// Validate and wrap a list of entries. Order is preserved: rule
    /// priority is declaration order.
    pub fn from_entries(entries: Vec<KnowledgeEntry>) -> Result<Self, CorpusError> {
        if entries.is_empty() {
            return Err(CorpusError::Empty);
        }
        let mut seen = BTreeSet::new();
        for entry in &entries {
            if entry.id.trim().is_empty() {
                return Err(CorpusError::EmptyId);
            }
            if !seen.insert(entry.id.clone()) {
                return Err(CorpusError::DuplicateId(entry.id.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// Load a corpus from a JSON file (`{"entries": [...]}`).
    pub fn load_json(path: &Path) -> Result<Self, CorpusError> {
        let raw = std::fs::read_to_string(path)?;
        let file: CorpusFile = serde_json::from_str(&raw)?;
        let corpus = Self::from_entries(file.entries)?;
        tracing::info!(
            event = "corpus.loaded",
            path = %path.display(),
            entries = corpus.len(),
        );
        Ok(corpus)
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn entry(&self, id: &str) -> Option<&KnowledgeEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries_in_category(&self, category: &str) -> Vec<&KnowledgeEntry> {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .collect()
    }

    /// Entry counts per category, deterministically ordered.
    pub fn categories(&self) -> BTreeMap<String, usize> {
        let mut map = BTreeMap::new();
        for entry in &self.entries {
            *map.entry(entry.category.clone()).or_insert(0) += 1;
        }
        map
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
