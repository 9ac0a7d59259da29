//! Detail enrichment — merge full document records onto summaries.

use std::collections::HashMap;

use tariffscope_fedreg::{CandidateDocument, DocumentDetail, DocumentDetailRecord};
use tracing::debug;

/// Fetches full document records and merges them onto summaries.
///
/// Lookups are memoized by document number for the lifetime of one
/// pipeline run and bounded by an independent fetch cap. A failed lookup
/// leaves the summary unchanged.
pub struct DetailEnricher {
    memo: HashMap<String, Option<DocumentDetailRecord>>,
    fetched: usize,
    cap: usize,
}

impl DetailEnricher {
    pub fn new(cap: usize) -> Self {
        Self {
            memo: HashMap::new(),
            fetched: 0,
            cap,
        }
    }

    /// Number of detail calls actually issued.
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    /// Enrich one summary in place.
    pub async fn enrich<D: DocumentDetail>(&mut self, detail: &D, doc: &mut CandidateDocument) {
        if doc.document_number.is_empty() {
            return;
        }

        if let Some(cached) = self.memo.get(&doc.document_number) {
            if let Some(record) = cached {
                merge(doc, record);
            }
            return;
        }

        if self.fetched >= self.cap {
            return;
        }
        self.fetched += 1;

        match detail.fetch_detail(&doc.document_number).await {
            Ok(record) => {
                merge(doc, &record);
                self.memo.insert(doc.document_number.clone(), Some(record));
            }
            Err(e) => {
                debug!("Detail lookup failed for {}: {}", doc.document_number, e);
                self.memo.insert(doc.document_number.clone(), None);
            }
        }
    }
}

/// Overwrite the summary's fields with the detail record's values.
///
/// Agencies and excerpts are taken only when non-empty; fields the
/// detail record has no value for keep the summary's value; every other
/// summary field is preserved untouched.
fn merge(doc: &mut CandidateDocument, detail: &DocumentDetailRecord) {
    if !detail.title.is_empty() {
        doc.title = detail.title.clone();
    }
    if !detail.document_number.is_empty() {
        doc.document_number = detail.document_number.clone();
    }
    merge_field(&mut doc.html_url, &detail.html_url);
    merge_field(&mut doc.publication_date, &detail.publication_date);
    merge_field(&mut doc.body_html_url, &detail.body_html_url);
    merge_field(&mut doc.pdf_url, &detail.pdf_url);
    merge_field(&mut doc.public_inspection_pdf_url, &detail.public_inspection_pdf_url);
    merge_field(&mut doc.raw_text_url, &detail.raw_text_url);
    merge_field(&mut doc.toc_subject, &detail.toc_subject);
    merge_field(&mut doc.toc_doc, &detail.toc_doc);
    merge_field(&mut doc.abstract_text, &detail.abstract_text);

    if !detail.agencies.is_empty() {
        doc.agencies = detail.agencies.clone();
    }
    if !detail.agency_names.is_empty() {
        doc.agency_names = detail.agency_names.clone();
    }
    if detail.excerpts.as_deref().is_some_and(|e| !e.is_empty()) {
        doc.excerpts = detail.excerpts.clone();
    }
}

fn merge_field(target: &mut Option<String>, source: &Option<String>) {
    if source.is_some() {
        *target = source.clone();
    }
}
