//! The case-finder orchestrator.

use chrono::NaiveDate;
use tariffscope_core::{Error, Result};
use tariffscope_fedreg::{DocumentDetail, DocumentSearch, HtmlFetch, InvestigationFeed};
use tariffscope_normalize::{normalize, InvestigationTag};
use tariffscope_query::{
    build_entity_terms, override_entity_terms, QueryOptions, SearchChunk,
};
use tariffscope_scoring::{parse_rules, pick_winner, score_title, SelectionEntry};
use tracing::{debug, info};

use crate::cache::TtlCache;
use crate::enrich::DetailEnricher;
use crate::scheduler::run_schedule;
use crate::tables::probe_tables;
use crate::types::{
    CaseFinderOutput, CaseLink, EntityResult, EntityScoring, PipelineParams, PipelineTrace,
    ScoredCandidate, TableSignal,
};

/// Coordinates one research run: feed → normalize → query → schedule →
/// score → select → enrich.
pub struct CaseFinder<F, S, D, H> {
    feed: F,
    search: S,
    detail: D,
    html: H,
}

impl<F, S, D, H> CaseFinder<F, S, D, H>
where
    F: InvestigationFeed,
    S: DocumentSearch,
    D: DocumentDetail,
    H: HtmlFetch,
{
    pub fn new(feed: F, search: S, detail: D, html: H) -> Self {
        Self {
            feed,
            search,
            detail,
            html,
        }
    }

    /// Cache key for one run's primary inputs.
    pub fn cache_key(hts: &str, year: &str) -> String {
        format!("casefinder:{}:{}", hts.trim(), year.trim())
    }

    /// Run through the shared result cache. Returns the payload and
    /// whether it was served from cache. Failed runs are never cached.
    ///
    /// Diagnostic runs bypass the cache in both directions: the key
    /// covers only the primary inputs, so a stored payload carries no
    /// trace, and a trace-laden payload must not be stored for plain
    /// requests to pick up.
    pub async fn run_cached(
        &self,
        cache: &TtlCache<CaseFinderOutput>,
        hts: &str,
        year: &str,
        params: &PipelineParams,
    ) -> Result<(CaseFinderOutput, bool)> {
        if params.diagnostics {
            return Ok((self.run(hts, year, params).await?, false));
        }

        let key = Self::cache_key(hts, year);
        if let Some(hit) = cache.get(&key) {
            debug!("Cache hit for {}", key);
            return Ok((hit, true));
        }

        let output = self.run(hts, year, params).await?;
        cache.set(key, output.clone());
        Ok((output, false))
    }

    /// Run the full pipeline once.
    pub async fn run(
        &self,
        hts: &str,
        year: &str,
        params: &PipelineParams,
    ) -> Result<CaseFinderOutput> {
        if hts.trim().is_empty() || year.trim().is_empty() {
            return Err(Error::InvalidInput(
                "tariff code and year are required".to_string(),
            ));
        }

        let records = self.feed.fetch_investigations(hts, year).await?;
        let tags = normalize(&records);
        if tags.is_empty() {
            info!("No investigations for hts={} year={}", hts, year);
            return Ok(empty_output(params.diagnostics));
        }

        // Per-entity expressions: tag-derived, or the caller's override
        // phrases when present.
        let options = QueryOptions {
            legal_phrase: params.legal_phrase.clone(),
            max_terms_per_entity: params.max_terms_per_entity,
        };
        let entity_terms = match params.parsed_overrides() {
            Some(overrides) => override_entity_terms(
                &discovered_entities(&tags),
                &overrides,
                params.broadcast_overrides,
                &options,
            ),
            None => build_entity_terms(&tags, &options),
        };

        let entity_chunks: Vec<(String, Vec<SearchChunk>)> = entity_terms
            .iter()
            .map(|terms| (terms.entity.clone(), terms.chunks(params.chunk_size)))
            .collect();

        let outcome = run_schedule(&self.search, &entity_chunks, params).await;
        let raw_results = params.diagnostics.then(|| outcome.candidates.clone());

        let rules = parse_rules(params.scoring_rules.as_ref());
        let mut enricher = DetailEnricher::new(params.detail_fetch_cap);
        let mut entities = Vec::with_capacity(outcome.candidates.len());
        let mut all_signals: Vec<TableSignal> = Vec::new();
        let mut scoring_trace: Vec<EntityScoring> = Vec::new();

        for entity_candidates in outcome.candidates {
            let entity = entity_candidates.entity;
            let mut documents = entity_candidates.documents;

            // Diagnostic mode enriches every surfaced candidate (up to
            // the cap) before selection, so bodies discovered only in
            // detail records still contribute table signals.
            if params.diagnostics && params.enable_detail {
                for doc in &mut documents {
                    enricher.enrich(&self.detail, doc).await;
                }
            }

            let signals = if params.enable_table_signals {
                probe_tables(&self.html, &documents).await
            } else {
                Vec::new()
            };

            let scored: Vec<ScoredCandidate> = documents
                .iter()
                .map(|doc| {
                    let base = score_title(&doc.title, &rules);
                    let body_bonus = if doc.body_html_url.is_some() {
                        params.body_html_bonus
                    } else {
                        0.0
                    };
                    let rate_bonus = if signals
                        .iter()
                        .any(|s| s.document_number == doc.document_number && s.has_rate_table)
                    {
                        params.rate_table_bonus
                    } else {
                        0.0
                    };
                    ScoredCandidate {
                        document_number: doc.document_number.clone(),
                        title: doc.title.clone(),
                        base_score: base.score,
                        matched_rules: base.matched,
                        body_html_bonus: body_bonus,
                        rate_table_bonus: rate_bonus,
                        total: base.score + body_bonus + rate_bonus,
                    }
                })
                .collect();

            let entries: Vec<SelectionEntry> = scored
                .iter()
                .zip(&documents)
                .map(|(s, doc)| SelectionEntry {
                    base: s.base_score,
                    total: s.total,
                    date: parse_date(doc.publication_date.as_deref()),
                })
                .collect();

            let result = match pick_winner(&entries, params.zero_score_policy) {
                Some(idx) => {
                    let mut winner = documents[idx].clone();
                    if params.enable_detail && !params.diagnostics {
                        enricher.enrich(&self.detail, &mut winner).await;
                    }
                    EntityResult {
                        entity: entity.clone(),
                        has_case: true,
                        latest: Some(winner),
                        score: scored[idx].total,
                    }
                }
                None => EntityResult {
                    entity: entity.clone(),
                    has_case: false,
                    latest: None,
                    score: 0.0,
                },
            };
            entities.push(result);

            all_signals.extend(signals);
            if params.diagnostics {
                scoring_trace.push(EntityScoring {
                    entity,
                    candidates: scored,
                });
            }
        }

        let trace = params.diagnostics.then(|| PipelineTrace {
            investigations: tags.clone(),
            entity_terms: entity_terms.clone(),
            chunks: entity_chunks.iter().flat_map(|(_, c)| c.clone()).collect(),
            fetch_log: outcome.log,
            raw_results: raw_results.unwrap_or_default(),
            table_signals: all_signals,
            scoring: scoring_trace,
        });

        Ok(CaseFinderOutput {
            entities,
            source_cases: source_case_links(&tags),
            trace,
        })
    }
}

fn empty_output(diagnostics: bool) -> CaseFinderOutput {
    CaseFinderOutput {
        entities: Vec::new(),
        source_cases: Vec::new(),
        trace: diagnostics.then(|| PipelineTrace {
            investigations: Vec::new(),
            entity_terms: Vec::new(),
            chunks: Vec::new(),
            fetch_log: Vec::new(),
            raw_results: Vec::new(),
            table_signals: Vec::new(),
            scoring: Vec::new(),
        }),
    }
}

/// Countries in discovery order across the tag list.
fn discovered_entities(tags: &[InvestigationTag]) -> Vec<String> {
    let mut entities: Vec<String> = Vec::new();
    for tag in tags {
        for country in &tag.countries {
            if !entities.contains(country) {
                entities.push(country.clone());
            }
        }
    }
    entities
}

/// Deduplicated links back to the source investigations.
fn source_case_links(tags: &[InvestigationTag]) -> Vec<CaseLink> {
    let mut links: Vec<CaseLink> = Vec::new();
    for tag in tags {
        if let Some(url) = &tag.url {
            if !links.iter().any(|l| &l.url == url) {
                links.push(CaseLink {
                    number: tag.number.clone(),
                    url: url.clone(),
                });
            }
        }
    }
    links
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value?, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::time::Duration;

    use parking_lot::Mutex;
    use tariffscope_fedreg::{
        CandidateDocument, DocumentDetailRecord, SearchFilters, SearchResponse,
    };
    use tariffscope_normalize::RawInvestigation;

    struct MockFeed {
        records: Vec<RawInvestigation>,
        calls: Mutex<usize>,
    }

    impl MockFeed {
        fn new(records: Vec<RawInvestigation>) -> Self {
            Self {
                records,
                calls: Mutex::new(0),
            }
        }
    }

    impl InvestigationFeed for MockFeed {
        fn fetch_investigations(
            &self,
            _hts: &str,
            _year: &str,
        ) -> impl Future<Output = Result<Vec<RawInvestigation>>> + Send {
            async move {
                *self.calls.lock() += 1;
                Ok(self.records.clone())
            }
        }
    }

    /// Returns the documents whose trigger string appears in the query
    /// term.
    struct MockSearch {
        routes: Vec<(String, Vec<CandidateDocument>)>,
    }

    impl DocumentSearch for MockSearch {
        fn search(
            &self,
            term: &str,
            _per_page: usize,
            _filters: &SearchFilters,
        ) -> impl Future<Output = Result<SearchResponse>> + Send {
            let term = term.to_string();
            async move {
                let documents = self
                    .routes
                    .iter()
                    .filter(|(trigger, _)| term.contains(trigger))
                    .flat_map(|(_, docs)| docs.clone())
                    .collect();
                Ok(SearchResponse {
                    url: format!("mock://search?term={}", term),
                    status: 200,
                    cache_header: None,
                    documents,
                })
            }
        }

        fn adapter_mode(&self) -> &'static str {
            "mock"
        }
    }

    struct MockDetail;

    impl DocumentDetail for MockDetail {
        fn fetch_detail(
            &self,
            document_number: &str,
        ) -> impl Future<Output = Result<DocumentDetailRecord>> + Send {
            let number = document_number.to_string();
            async move {
                Ok(DocumentDetailRecord {
                    document_number: number.clone(),
                    title: format!("Detailed {}", number),
                    pdf_url: Some(format!("mock://pdf/{}", number)),
                    ..Default::default()
                })
            }
        }
    }

    struct MockHtml;

    impl HtmlFetch for MockHtml {
        fn fetch_html(&self, url: &str) -> impl Future<Output = Result<String>> + Send {
            let url = url.to_string();
            async move {
                if url.contains("rates") {
                    Ok("<table><tr><th>Exporter</th><th>Margin</th></tr></table>".to_string())
                } else {
                    Ok("<p>plain notice</p>".to_string())
                }
            }
        }
    }

    fn raw(number: &str, title: &str) -> RawInvestigation {
        RawInvestigation {
            investigation_number: number.to_string(),
            investigation_title: Some(title.to_string()),
            case_id: Some("10".to_string()),
            investigation_id: Some(number.to_string()),
            ..Default::default()
        }
    }

    fn doc(number: &str, title: &str, date: &str) -> CandidateDocument {
        CandidateDocument {
            document_number: number.to_string(),
            title: title.to_string(),
            publication_date: Some(date.to_string()),
            ..Default::default()
        }
    }

    fn finder(
        records: Vec<RawInvestigation>,
        routes: Vec<(String, Vec<CandidateDocument>)>,
    ) -> CaseFinder<MockFeed, MockSearch, MockDetail, MockHtml> {
        CaseFinder::new(MockFeed::new(records), MockSearch { routes }, MockDetail, MockHtml)
    }

    fn base_params() -> PipelineParams {
        PipelineParams {
            enable_table_signals: false,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_missing_inputs_rejected() {
        let finder = finder(vec![], vec![]);
        let err = finder.run("", "2024", &base_params()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_zero_investigations_short_circuits() {
        let finder = finder(vec![], vec![]);
        let output = finder.run("7318.15", "2024", &base_params()).await.unwrap();
        assert!(output.entities.is_empty());
        assert!(output.source_cases.is_empty());
    }

    #[tokio::test]
    async fn test_two_countries_scored_independently() {
        let records = vec![
            raw(
                "731-TA-100",
                "Steel Nails from China (Inv. Nos. 731-TA-100 (Final))",
            ),
            raw(
                "701-TA-200",
                "Steel Rebar from Vietnam (Inv. Nos. 701-TA-200 (Final))",
            ),
        ];
        let routes = vec![
            (
                "731-TA-100".to_string(),
                vec![doc(
                    "D-CN",
                    "Steel Nails From China: Amended Final Results of Administrative Review",
                    "2024-02-01",
                )],
            ),
            (
                "701-TA-200".to_string(),
                vec![doc(
                    "D-VN",
                    "Steel Rebar From Vietnam: Final Determination",
                    "2024-03-01",
                )],
            ),
        ];
        let finder = finder(records, routes);
        let output = finder.run("7318.15", "2024", &base_params()).await.unwrap();

        assert_eq!(output.entities.len(), 2);
        assert_eq!(output.entities[0].entity, "China");
        assert_eq!(output.entities[1].entity, "Vietnam");
        assert!(output.entities[0].has_case);
        assert!(output.entities[1].has_case);
        assert_eq!(output.entities[0].score, 7.0);
        assert_eq!(output.entities[1].score, 5.0);
        // Winners are detail-enriched.
        let latest = output.entities[0].latest.as_ref().unwrap();
        assert_eq!(latest.title, "Detailed D-CN");
        // Source links deduplicated per investigation.
        assert_eq!(output.source_cases.len(), 2);
    }

    #[tokio::test]
    async fn test_rate_table_bonus_can_flip_the_winner() {
        let mut with_body = doc(
            "D-RATES",
            "Steel Nails From China: Preliminary Results",
            "2024-01-01",
        );
        with_body.body_html_url = Some("mock://rates/D-RATES".to_string());
        let plain = doc(
            "D-PLAIN",
            "Steel Nails From China: Final Determination",
            "2024-01-02",
        );

        let records = vec![raw(
            "731-TA-100",
            "Steel Nails from China (Inv. Nos. 731-TA-100 (Final))",
        )];
        let routes = vec![("731-TA-100".to_string(), vec![with_body, plain])];
        let finder = finder(records, routes);

        let params = PipelineParams {
            enable_detail: false,
            ..Default::default()
        };
        let output = finder.run("7318.15", "2024", &params).await.unwrap();

        // Preliminary (3) + body (1) + rate table (2) = 6 beats final
        // determination's 5.
        let entity = &output.entities[0];
        assert_eq!(entity.latest.as_ref().unwrap().document_number, "D-RATES");
        assert_eq!(entity.score, 6.0);
    }

    #[tokio::test]
    async fn test_exclude_policy_drops_bonus_only_candidates() {
        // A notice no scoring rule matches, even with a body and a rate
        // table worth 3 points of bonuses, must not produce a case
        // under the exclude policy.
        let mut unmatched = doc("D-SUN", "Sunshine Act Meetings", "2024-04-01");
        unmatched.body_html_url = Some("mock://rates/D-SUN".to_string());

        let records = vec![raw(
            "731-TA-100",
            "Steel Nails from China (Inv. Nos. 731-TA-100 (Final))",
        )];
        let routes = vec![("731-TA-100".to_string(), vec![unmatched])];
        let finder = finder(records, routes);

        let params = PipelineParams {
            zero_score_policy: tariffscope_scoring::ZeroScorePolicy::Exclude,
            enable_detail: false,
            ..Default::default()
        };
        let output = finder.run("7318.15", "2024", &params).await.unwrap();

        let entity = &output.entities[0];
        assert!(!entity.has_case);
        assert!(entity.latest.is_none());
        assert_eq!(entity.score, 0.0);
    }

    #[tokio::test]
    async fn test_diagnostics_carry_full_trace() {
        let records = vec![raw(
            "731-TA-100",
            "Steel Nails from China (Inv. Nos. 731-TA-100 (Final))",
        )];
        let routes = vec![(
            "731-TA-100".to_string(),
            vec![doc("D-1", "Final Determination of Sales", "2024-01-01")],
        )];
        let finder = finder(records, routes);

        let params = PipelineParams {
            diagnostics: true,
            enable_detail: false,
            enable_table_signals: false,
            ..Default::default()
        };
        let output = finder.run("7318.15", "2024", &params).await.unwrap();

        let trace = output.trace.unwrap();
        assert_eq!(trace.investigations.len(), 1);
        assert!(!trace.entity_terms.is_empty());
        assert!(!trace.chunks.is_empty());
        assert!(!trace.fetch_log.is_empty());
        assert_eq!(trace.raw_results[0].documents.len(), 1);
        assert_eq!(trace.scoring[0].candidates[0].matched_rules, vec!["final-determination"]);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_collaborators_and_is_byte_identical() {
        let records = vec![raw(
            "731-TA-100",
            "Steel Nails from China (Inv. Nos. 731-TA-100 (Final))",
        )];
        let routes = vec![(
            "731-TA-100".to_string(),
            vec![doc("D-1", "Final Determination", "2024-01-01")],
        )];
        let finder = finder(records, routes);
        let cache = TtlCache::new(Duration::from_secs(3600));
        let params = base_params();

        let (first, hit1) = finder
            .run_cached(&cache, "7318.15", "2024", &params)
            .await
            .unwrap();
        let (second, hit2) = finder
            .run_cached(&cache, "7318.15", "2024", &params)
            .await
            .unwrap();

        assert!(!hit1);
        assert!(hit2);
        assert_eq!(*finder.feed.calls.lock(), 1);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_diagnostics_request_bypasses_cache() {
        let records = vec![raw(
            "731-TA-100",
            "Steel Nails from China (Inv. Nos. 731-TA-100 (Final))",
        )];
        let routes = vec![(
            "731-TA-100".to_string(),
            vec![doc("D-1", "Final Determination", "2024-01-01")],
        )];
        let finder = finder(records, routes);
        let cache = TtlCache::new(Duration::from_secs(3600));

        let (_, hit) = finder
            .run_cached(&cache, "7318.15", "2024", &base_params())
            .await
            .unwrap();
        assert!(!hit);

        // The cached traceless payload must not satisfy a diagnostics
        // request, and the traced payload must not be stored.
        let diag = PipelineParams {
            diagnostics: true,
            enable_detail: false,
            ..base_params()
        };
        let (output, hit) = finder
            .run_cached(&cache, "7318.15", "2024", &diag)
            .await
            .unwrap();
        assert!(!hit);
        assert!(output.trace.is_some());
        assert_eq!(*finder.feed.calls.lock(), 2);
        assert_eq!(cache.len(), 1);

        let (plain, hit) = finder
            .run_cached(&cache, "7318.15", "2024", &base_params())
            .await
            .unwrap();
        assert!(hit);
        assert!(plain.trace.is_none());
    }

    #[tokio::test]
    async fn test_override_terms_replace_generated_expressions() {
        let records = vec![raw(
            "731-TA-100",
            "Steel Nails from China (Inv. Nos. 731-TA-100 (Final))",
        )];
        // Only the override phrase routes to a document.
        let routes = vec![(
            "custom phrase".to_string(),
            vec![doc("D-1", "Amended Final Results", "2024-01-01")],
        )];
        let finder = finder(records, routes);

        let params = PipelineParams {
            override_terms: Some(serde_json::json!([
                { "phrase": "custom phrase", "entity": "China" }
            ])),
            ..base_params()
        };
        let output = finder.run("7318.15", "2024", &params).await.unwrap();
        assert!(output.entities[0].has_case);
        assert_eq!(
            output.entities[0].latest.as_ref().unwrap().document_number,
            "D-1"
        );
    }

    #[tokio::test]
    async fn test_malformed_overrides_fall_back_to_generated() {
        let records = vec![raw(
            "731-TA-100",
            "Steel Nails from China (Inv. Nos. 731-TA-100 (Final))",
        )];
        let routes = vec![(
            "731-TA-100".to_string(),
            vec![doc("D-1", "Final Determination", "2024-01-01")],
        )];
        let finder = finder(records, routes);

        let params = PipelineParams {
            override_terms: Some(serde_json::json!("not an array")),
            ..base_params()
        };
        let output = finder.run("7318.15", "2024", &params).await.unwrap();
        assert!(output.entities[0].has_case);
    }
}
