//! Wire types for the notice search and detail APIs.

use serde::{Deserialize, Serialize};

/// A document summary from the search API.
///
/// Deduplicated by `document_number` within each entity's result set.
/// Detail enrichment fills in the fields the search endpoint omits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateDocument {
    pub document_number: String,
    pub title: String,
    pub html_url: Option<String>,
    pub publication_date: Option<String>,
    pub body_html_url: Option<String>,
    pub pdf_url: Option<String>,
    pub public_inspection_pdf_url: Option<String>,
    pub raw_text_url: Option<String>,
    pub toc_subject: Option<String>,
    pub toc_doc: Option<String>,
    pub agencies: Vec<serde_json::Value>,
    pub agency_names: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub excerpts: Option<String>,
}

/// The full document record from the detail API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentDetailRecord {
    pub document_number: String,
    pub title: String,
    pub html_url: Option<String>,
    pub publication_date: Option<String>,
    pub body_html_url: Option<String>,
    pub pdf_url: Option<String>,
    pub public_inspection_pdf_url: Option<String>,
    pub raw_text_url: Option<String>,
    pub toc_subject: Option<String>,
    pub toc_doc: Option<String>,
    pub agencies: Vec<serde_json::Value>,
    pub agency_names: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub excerpts: Option<String>,
}

/// Caller-supplied facet filters forwarded to the search API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    /// Agency slugs, e.g. `international-trade-administration`.
    pub agencies: Vec<String>,
    /// Document types, e.g. `NOTICE`.
    pub doc_types: Vec<String>,
}

/// One search call's outcome: the URL it hit, the HTTP status, and the
/// parsed document summaries.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub url: String,
    pub status: u16,
    /// Upstream cache header (`x-cache` / `cf-cache-status`), when present.
    pub cache_header: Option<String>,
    pub documents: Vec<CandidateDocument>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_document_deserializes_sparse_json() {
        let doc: CandidateDocument = serde_json::from_str(
            r#"{
                "document_number": "2024-12345",
                "title": "Steel Nails From Taiwan: Final Results",
                "publication_date": "2024-05-01",
                "abstract": "Commerce determines..."
            }"#,
        )
        .unwrap();
        assert_eq!(doc.document_number, "2024-12345");
        assert_eq!(doc.abstract_text.as_deref(), Some("Commerce determines..."));
        assert!(doc.body_html_url.is_none());
        assert!(doc.agencies.is_empty());
    }
}
