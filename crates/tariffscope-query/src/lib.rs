//! Query Builder — turns investigation tags (or user override phrases)
//! into per-entity boolean search expressions, grouped into bounded
//! OR-chunks for the document search collaborator.

mod builder;
pub mod types;

pub use builder::{build_entity_terms, override_entity_terms, DEFAULT_LEGAL_PHRASE};
pub use types::{EntityTerms, OverrideTerm, QueryOptions, SearchChunk};
