//! Query construction types.

use serde::{Deserialize, Serialize};

/// All candidate search expressions for one entity (country).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTerms {
    pub entity: String,
    pub expressions: Vec<String>,
}

impl EntityTerms {
    /// Group the expressions into OR-chunks of up to `chunk_size`
    /// individually parenthesized expressions.
    pub fn chunks(&self, chunk_size: usize) -> Vec<SearchChunk> {
        let chunk_size = chunk_size.max(1);
        self.expressions
            .chunks(chunk_size)
            .map(|group| SearchChunk {
                entity: self.entity.clone(),
                term: group
                    .iter()
                    .map(|e| format!("({})", e))
                    .collect::<Vec<_>>()
                    .join(" | "),
            })
            .collect()
    }
}

/// One outbound boolean query for one entity. Consumed once by the
/// fetch scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchChunk {
    pub entity: String,
    pub term: String,
}

/// A user-supplied search phrase, optionally targeted at one entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideTerm {
    pub phrase: String,
    /// Target entity. A phrase naming an unknown entity is skipped.
    pub entity: Option<String>,
    /// Apply this phrase to every known entity.
    pub all_entities: bool,
}

/// Tuning knobs for expression construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Boolean phrase AND-ed onto case-number and product-title terms.
    pub legal_phrase: String,
    /// Hard cap on expressions per entity, applied after dedup.
    pub max_terms_per_entity: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            legal_phrase: crate::builder::DEFAULT_LEGAL_PHRASE.to_string(),
            max_terms_per_entity: 24,
        }
    }
}
