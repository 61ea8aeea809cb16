//! Deterministic rule corpus evaluated with regex patterns.
//!
//! The first pass of the pipeline: fast, non-blocking, pure. Rules are
//! evaluated in declaration order and every matching rule is returned —
//! downstream stages decide relevance.

use regex::{Regex, RegexBuilder};

use crate::candidate::MatchCandidate;
use crate::entry::{Corpus, KnowledgeEntry};
use crate::error::CorpusError;
use crate::normalize::normalize;

#[derive(Debug)]
struct CompiledRule {
    entry: KnowledgeEntry,
    regex: Regex,
}

/// Ordered set of pattern -> diagnosis rules.
#[derive(Debug)]
pub struct RegexKnowledgeBase {
    rules: Vec<CompiledRule>,
}

impl RegexKnowledgeBase {
    /// Compile every entry pattern. A malformed pattern is fatal: the
    /// corpus must be fixed before the process can serve requests.
    pub fn from_corpus(corpus: &Corpus) -> Result<Self, CorpusError> {
        let mut rules = Vec::with_capacity(corpus.len());
        for entry in corpus.entries() {
            if entry.pattern.trim().is_empty() {
                return Err(CorpusError::MissingPattern {
                    id: entry.id.clone(),
                });
            }
            let regex = RegexBuilder::new(&entry.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| CorpusError::InvalidPattern {
                    id: entry.id.clone(),
                    source,
                })?;
            rules.push(CompiledRule {
                entry: entry.clone(),
                regex,
            });
        }
        Ok(Self { rules })
    }

    /// Match normalised event text against every rule, in declaration
    /// order. Each hit yields a candidate with a fixed score of 1.0.
    pub fn match_event(&self, text: &str) -> Vec<MatchCandidate> {
        let normalized = normalize(text);
        self.rules
            .iter()
            .filter(|rule| rule.regex.is_match(&normalized))
            .map(|rule| MatchCandidate::regex(rule.entry.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
