//! Collaborator interfaces and clients for the document pipeline.
//!
//! The pipeline talks to four external services: the investigation feed,
//! document search, document detail, and raw HTML fetch. Each is a trait
//! so the scheduler and orchestrator are testable without a network; the
//! concrete implementations target the Federal Register-style JSON API
//! and the tariff investigation feed.

mod client;
pub mod types;

pub use client::{DataWebClient, FederalRegisterClient};
pub use types::{CandidateDocument, DocumentDetailRecord, SearchFilters, SearchResponse};

use std::future::Future;

use tariffscope_core::Result;
use tariffscope_normalize::RawInvestigation;

/// Raw investigation records for one tariff code and year.
pub trait InvestigationFeed: Send + Sync {
    fn fetch_investigations(
        &self,
        hts: &str,
        year: &str,
    ) -> impl Future<Output = Result<Vec<RawInvestigation>>> + Send;
}

/// Boolean-query document search, newest first.
pub trait DocumentSearch: Send + Sync {
    fn search(
        &self,
        term: &str,
        per_page: usize,
        filters: &SearchFilters,
    ) -> impl Future<Output = Result<SearchResponse>> + Send;

    /// Short label recorded in fetch diagnostics.
    fn adapter_mode(&self) -> &'static str {
        "http"
    }
}

/// Full document record lookup by document number.
pub trait DocumentDetail: Send + Sync {
    fn fetch_detail(
        &self,
        document_number: &str,
    ) -> impl Future<Output = Result<DocumentDetailRecord>> + Send;
}

/// Plain GET of a document body URL.
pub trait HtmlFetch: Send + Sync {
    fn fetch_html(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}
