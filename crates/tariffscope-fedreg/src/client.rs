//! Concrete reqwest clients for the external services.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tariffscope_core::{Error, Result};
use tariffscope_normalize::RawInvestigation;
use tracing::debug;

use crate::types::{CandidateDocument, DocumentDetailRecord, SearchFilters, SearchResponse};
use crate::{DocumentDetail, DocumentSearch, HtmlFetch, InvestigationFeed};

/// Summary fields requested from the search endpoint.
const SEARCH_FIELDS: &[&str] = &[
    "document_number",
    "title",
    "html_url",
    "publication_date",
    "body_html_url",
    "pdf_url",
    "agencies",
    "agency_names",
    "abstract",
    "excerpts",
];

/// Client for the government notice API (search + detail + HTML bodies).
///
/// Cloning is cheap and shares the underlying connection pool, so one
/// client can serve all three collaborator roles.
#[derive(Clone)]
pub struct FederalRegisterClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl FederalRegisterClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    async fn get(&self, url: String, query: &[(String, String)]) -> Result<reqwest::Response> {
        let request = self
            .http
            .get(&url)
            .query(query)
            .build()
            .map_err(|e| Error::Upstream(format!("bad request for {}: {}", url, e)))?;
        let final_url = request.url().to_string();

        debug!("GET {}", final_url);
        let response = tokio::time::timeout(self.timeout, self.http.execute(request))
            .await
            .map_err(|_| {
                Error::Upstream(format!(
                    "timeout after {}s: {}",
                    self.timeout.as_secs(),
                    final_url
                ))
            })?
            .map_err(|e| Error::Upstream(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "{} returned status {}",
                final_url,
                response.status()
            )));
        }
        Ok(response)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchPayload {
    results: Vec<CandidateDocument>,
}

impl DocumentSearch for FederalRegisterClient {
    fn search(
        &self,
        term: &str,
        per_page: usize,
        filters: &SearchFilters,
    ) -> impl Future<Output = Result<SearchResponse>> + Send {
        async move {
            let mut query: Vec<(String, String)> = vec![
                ("conditions[term]".to_string(), term.to_string()),
                ("order".to_string(), "newest".to_string()),
                ("per_page".to_string(), per_page.to_string()),
            ];
            for field in SEARCH_FIELDS {
                query.push(("fields[]".to_string(), field.to_string()));
            }
            for agency in &filters.agencies {
                query.push(("conditions[agencies][]".to_string(), agency.clone()));
            }
            for doc_type in &filters.doc_types {
                query.push(("conditions[type][]".to_string(), doc_type.clone()));
            }

            let url = format!("{}/documents.json", self.base_url);
            let response = self.get(url, &query).await?;
            let final_url = response.url().to_string();
            let status = response.status().as_u16();
            let cache_header = response
                .headers()
                .get("x-cache")
                .or_else(|| response.headers().get("cf-cache-status"))
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string());

            let payload: SearchPayload = response
                .json()
                .await
                .map_err(|e| Error::Upstream(format!("bad search payload: {}", e)))?;

            Ok(SearchResponse {
                url: final_url,
                status,
                cache_header,
                documents: payload.results,
            })
        }
    }
}

impl DocumentDetail for FederalRegisterClient {
    fn fetch_detail(
        &self,
        document_number: &str,
    ) -> impl Future<Output = Result<DocumentDetailRecord>> + Send {
        async move {
            let url = format!("{}/documents/{}.json", self.base_url, document_number);
            let response = self.get(url, &[]).await?;
            response
                .json()
                .await
                .map_err(|e| Error::Upstream(format!("bad detail payload: {}", e)))
        }
    }
}

impl HtmlFetch for FederalRegisterClient {
    fn fetch_html(&self, url: &str) -> impl Future<Output = Result<String>> + Send {
        async move {
            let response = self.get(url.to_string(), &[]).await?;
            response
                .text()
                .await
                .map_err(|e| Error::Upstream(format!("bad html body: {}", e)))
        }
    }
}

/// Client for the tariff investigation feed.
pub struct DataWebClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl DataWebClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl InvestigationFeed for DataWebClient {
    fn fetch_investigations(
        &self,
        hts: &str,
        year: &str,
    ) -> impl Future<Output = Result<Vec<RawInvestigation>>> + Send {
        async move {
            let url = format!("{}/api/v2/investigations", self.base_url);
            let request = self
                .http
                .get(&url)
                .query(&[("hts", hts), ("year", year)])
                .build()
                .map_err(|e| Error::Upstream(format!("bad request for {}: {}", url, e)))?;

            let response = tokio::time::timeout(self.timeout, self.http.execute(request))
                .await
                .map_err(|_| Error::Upstream(format!("timeout fetching investigations: {}", url)))?
                .map_err(|e| Error::Upstream(format!("request failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(Error::Upstream(format!(
                    "investigation feed returned status {}",
                    response.status()
                )));
            }

            // The feed returns either a bare array or `{ "results": [...] }`.
            let value: serde_json::Value = response
                .json()
                .await
                .map_err(|e| Error::Upstream(format!("bad feed payload: {}", e)))?;
            let records = match value {
                serde_json::Value::Array(_) => serde_json::from_value(value)?,
                other => match other.get("results") {
                    Some(results) => serde_json::from_value(results.clone())?,
                    None => Vec::new(),
                },
            };
            Ok(records)
        }
    }
}
