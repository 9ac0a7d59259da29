//! The case-finder pipeline — from raw investigation records to one
//! ranked government notice per country.
//!
//! Data flows strictly normalize → query → schedule → score → enrich
//! (→ table signals) → cache; no stage depends on a later one. All
//! outbound calls are budgeted, time-boxed, and failure-tolerant: a
//! failed fetch costs information, never the request.

pub mod cache;
mod enrich;
mod pipeline;
mod scheduler;
pub mod tables;
pub mod types;

pub use cache::TtlCache;
pub use enrich::DetailEnricher;
pub use pipeline::CaseFinder;
pub use scheduler::{run_schedule, ScheduleOutcome};
pub use types::{
    CaseFinderOutput, CaseLink, EntityCandidates, EntityResult, FetchRecord, PipelineParams,
    PipelineTrace, ScoredCandidate, TableSignal,
};
