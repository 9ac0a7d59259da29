//! Budgeted, fair fetch scheduling.
//!
//! Strict single-flight round robin: one fetch at a time, one entity per
//! turn, entities visited in discovery order. The fairness phase gives
//! every entity up to `per_entity_minimum` fetches before any entity
//! exceeds that minimum; the round-robin phase then drains remaining
//! chunks until the budget runs out or no entity has more work.

use std::collections::HashSet;

use tariffscope_fedreg::{CandidateDocument, DocumentSearch};
use tariffscope_query::SearchChunk;
use tracing::{debug, warn};

use crate::types::{EntityCandidates, FetchRecord, PipelineParams};

/// What one scheduling run produced.
#[derive(Debug)]
pub struct ScheduleOutcome {
    /// Per-entity raw results, deduplicated by document number.
    pub candidates: Vec<EntityCandidates>,
    /// Append-only diagnostic log, one record per call.
    pub log: Vec<FetchRecord>,
    pub calls_made: usize,
}

struct EntityState {
    next_chunk: usize,
    seen: HashSet<String>,
    documents: Vec<CandidateDocument>,
}

/// Run the scheduler over per-entity chunk lists.
///
/// Total calls never exceed `params.fetch_cap`. Failed calls are logged
/// with no result and never retried.
pub async fn run_schedule<S: DocumentSearch>(
    search: &S,
    entity_chunks: &[(String, Vec<SearchChunk>)],
    params: &PipelineParams,
) -> ScheduleOutcome {
    let mut states: Vec<EntityState> = entity_chunks
        .iter()
        .map(|_| EntityState {
            next_chunk: 0,
            seen: HashSet::new(),
            documents: Vec::new(),
        })
        .collect();
    let mut log: Vec<FetchRecord> = Vec::new();
    let mut budget = params.fetch_cap;

    // Fairness phase: bounded rounds, one fetch per entity per round.
    for _round in 0..params.per_entity_minimum {
        if budget == 0 {
            break;
        }
        let progress = pass(search, entity_chunks, &mut states, &mut log, &mut budget, params).await;
        if !progress {
            break;
        }
    }

    // Round-robin phase: same visitation, no round limit.
    while budget > 0 {
        let progress = pass(search, entity_chunks, &mut states, &mut log, &mut budget, params).await;
        if !progress {
            break;
        }
    }

    let calls_made = log.len();
    debug!(
        "Scheduler made {} calls across {} entities (cap {})",
        calls_made,
        entity_chunks.len(),
        params.fetch_cap
    );

    ScheduleOutcome {
        candidates: entity_chunks
            .iter()
            .zip(states)
            .map(|((entity, _), state)| EntityCandidates {
                entity: entity.clone(),
                documents: state.documents,
            })
            .collect(),
        log,
        calls_made,
    }
}

/// One visitation pass over all entities. Returns whether any fetch was
/// issued.
async fn pass<S: DocumentSearch>(
    search: &S,
    entity_chunks: &[(String, Vec<SearchChunk>)],
    states: &mut [EntityState],
    log: &mut Vec<FetchRecord>,
    budget: &mut usize,
    params: &PipelineParams,
) -> bool {
    let mut progress = false;
    for (i, (entity, chunks)) in entity_chunks.iter().enumerate() {
        if *budget == 0 {
            break;
        }
        let state = &mut states[i];
        let Some(chunk) = chunks.get(state.next_chunk) else {
            continue;
        };
        state.next_chunk += 1;
        *budget -= 1;
        progress = true;

        fetch_one(search, entity, chunk, state, log, params).await;
    }
    progress
}

async fn fetch_one<S: DocumentSearch>(
    search: &S,
    entity: &str,
    chunk: &SearchChunk,
    state: &mut EntityState,
    log: &mut Vec<FetchRecord>,
    params: &PipelineParams,
) {
    match search.search(&chunk.term, params.per_page, &params.filters).await {
        Ok(response) => {
            log.push(FetchRecord {
                entity: entity.to_string(),
                term: chunk.term.clone(),
                url: response.url,
                status: Some(response.status),
                adapter_mode: search.adapter_mode().to_string(),
                cache_header: response.cache_header,
                result_count: Some(response.documents.len()),
                error: None,
            });
            for doc in response.documents {
                if state.seen.insert(doc.document_number.clone()) {
                    state.documents.push(doc);
                }
            }
        }
        Err(e) => {
            warn!("Search failed for {} ({}): {}", entity, chunk.term, e);
            log.push(FetchRecord {
                entity: entity.to_string(),
                term: chunk.term.clone(),
                url: String::new(),
                status: None,
                adapter_mode: search.adapter_mode().to_string(),
                cache_header: None,
                result_count: None,
                error: Some(e.to_string()),
            });
        }
    }
}
