//! Pipeline tuning parameters, diagnostics, and output payloads.

use serde::{Deserialize, Serialize};
use tariffscope_fedreg::{CandidateDocument, SearchFilters};
use tariffscope_normalize::InvestigationTag;
use tariffscope_query::{EntityTerms, OverrideTerm, SearchChunk, DEFAULT_LEGAL_PHRASE};
use tariffscope_scoring::ZeroScorePolicy;
use tracing::warn;

/// Caller-tunable knobs for one pipeline run. Everything has a default,
/// so a bare request works.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    /// Global cap on document-search calls across all entities.
    pub fetch_cap: usize,
    /// Expressions OR-combined into one outbound query.
    pub chunk_size: usize,
    /// Fetches every entity is guaranteed before any entity exceeds it.
    pub per_entity_minimum: usize,
    /// Result-size limit per search call.
    pub per_page: usize,
    /// Hard cap on expressions per entity.
    pub max_terms_per_entity: usize,
    /// Independent budget for detail lookups.
    pub detail_fetch_cap: usize,
    /// Boolean phrase AND-ed onto generated expressions.
    pub legal_phrase: String,
    /// Agency/type facets forwarded to the search API.
    pub filters: SearchFilters,
    pub zero_score_policy: ZeroScorePolicy,
    /// Bonus for candidates that expose a full-text HTML body.
    pub body_html_bonus: f64,
    /// Bonus for candidates whose body contains a company/rate table.
    pub rate_table_bonus: f64,
    pub enable_table_signals: bool,
    pub enable_detail: bool,
    /// Carry the full intermediate trace in the output.
    pub diagnostics: bool,
    /// Caller-supplied scoring rule table; malformed input falls back to
    /// the built-in defaults.
    pub scoring_rules: Option<serde_json::Value>,
    /// Explicit search phrases replacing the tag-derived expressions;
    /// malformed input is discarded.
    pub override_terms: Option<serde_json::Value>,
    /// Apply every override phrase to every entity.
    pub broadcast_overrides: bool,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            fetch_cap: 24,
            chunk_size: 4,
            per_entity_minimum: 2,
            per_page: 20,
            max_terms_per_entity: 24,
            detail_fetch_cap: 8,
            legal_phrase: DEFAULT_LEGAL_PHRASE.to_string(),
            filters: SearchFilters::default(),
            zero_score_policy: ZeroScorePolicy::default(),
            body_html_bonus: 1.0,
            rate_table_bonus: 2.0,
            enable_table_signals: true,
            enable_detail: true,
            diagnostics: false,
            scoring_rules: None,
            override_terms: None,
            broadcast_overrides: false,
        }
    }
}

impl PipelineParams {
    /// Parse the override phrases, discarding malformed input.
    pub fn parsed_overrides(&self) -> Option<Vec<OverrideTerm>> {
        let value = self.override_terms.as_ref()?;
        match serde_json::from_value::<Vec<OverrideTerm>>(value.clone()) {
            Ok(terms) if !terms.is_empty() => Some(terms),
            Ok(_) => None,
            Err(e) => {
                warn!("Malformed override terms, ignoring: {}", e);
                None
            }
        }
    }
}

/// Diagnostic record for one outbound search call. Append-only; read
/// only for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRecord {
    pub entity: String,
    pub term: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub adapter_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One entity's deduplicated raw search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCandidates {
    pub entity: String,
    pub documents: Vec<CandidateDocument>,
}

/// Table-signal probe outcome for one candidate body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSignal {
    pub document_number: String,
    pub body_html_url: String,
    pub has_rate_table: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Scoring detail for one candidate, kept for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub document_number: String,
    pub title: String,
    pub base_score: f64,
    pub matched_rules: Vec<String>,
    pub body_html_bonus: f64,
    pub rate_table_bonus: f64,
    pub total: f64,
}

/// Per-candidate scoring for one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityScoring {
    pub entity: String,
    pub candidates: Vec<ScoredCandidate>,
}

/// The winning document (if any) for one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityResult {
    pub entity: String,
    pub has_case: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<CandidateDocument>,
    pub score: f64,
}

/// A deduplicated link back to a source investigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseLink {
    pub number: String,
    pub url: String,
}

/// Full intermediate trace, carried only in diagnostic mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineTrace {
    pub investigations: Vec<InvestigationTag>,
    pub entity_terms: Vec<EntityTerms>,
    pub chunks: Vec<SearchChunk>,
    pub fetch_log: Vec<FetchRecord>,
    pub raw_results: Vec<EntityCandidates>,
    pub table_signals: Vec<TableSignal>,
    pub scoring: Vec<EntityScoring>,
}

/// One pipeline run's payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseFinderOutput {
    pub entities: Vec<EntityResult>,
    pub source_cases: Vec<CaseLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<PipelineTrace>,
}
