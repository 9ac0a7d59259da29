//! Table-signal extraction from notice HTML bodies.
//!
//! AD/CVD rate notices carry an HTML table listing per-company duty
//! rates. A table qualifies when its header cells hit both the company
//! vocabulary and the rate vocabulary; the first qualifying table
//! short-circuits the scan. Every failure — fetch, parse, anything —
//! degrades to `has_rate_table = false`.

use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use tariffscope_fedreg::{CandidateDocument, HtmlFetch};
use tracing::debug;

use crate::types::TableSignal;

const COMPANY_VOCAB: &[&str] = &["company", "exporter", "manufacturer", "producer", "firm"];
const RATE_VOCAB: &[&str] = &["rate", "margin", "assessment", "deposit", "percent", "subsidy"];

static TABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<table[^>]*>(.*?)</table>").unwrap());
static ROW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").unwrap());
static TH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<th[^>]*>(.*?)</th>").unwrap());
static TD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<td[^>]*>(.*?)</td>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());

/// Whether the HTML contains a company/rate table.
pub fn html_has_rate_table(html: &str) -> bool {
    for table in TABLE_RE.captures_iter(html) {
        let headers = table_headers(&table[1]);
        let has_company = headers
            .iter()
            .any(|h| COMPANY_VOCAB.iter().any(|v| h.contains(v)));
        let has_rate = headers
            .iter()
            .any(|h| RATE_VOCAB.iter().any(|v| h.contains(v)));
        if has_company && has_rate {
            return true;
        }
    }
    false
}

/// Header cell text for one table body: `<th>` cells anywhere, else the
/// first row's `<td>` cells. Lowercased and trimmed.
fn table_headers(table_body: &str) -> Vec<String> {
    let th: Vec<String> = TH_RE
        .captures_iter(table_body)
        .map(|c| cell_text(&c[1]))
        .filter(|s| !s.is_empty())
        .collect();
    if !th.is_empty() {
        return th;
    }

    match ROW_RE.captures(table_body) {
        Some(row) => TD_RE
            .captures_iter(&row[1])
            .map(|c| cell_text(&c[1]))
            .filter(|s| !s.is_empty())
            .collect(),
        None => Vec::new(),
    }
}

fn cell_text(cell: &str) -> String {
    TAG_RE.replace_all(cell, " ").trim().to_lowercase()
}

/// Probe every candidate that exposes a body HTML URL, concurrently.
///
/// A settle-all fan-out: each probe resolves to its own `TableSignal`
/// outcome, successes and failures alike, so one bad body never loses
/// the others.
pub async fn probe_tables<H: HtmlFetch>(
    fetcher: &H,
    candidates: &[CandidateDocument],
) -> Vec<TableSignal> {
    let probes = candidates
        .iter()
        .filter_map(|doc| {
            let url = doc.body_html_url.clone()?;
            let number = doc.document_number.clone();
            Some(async move {
                match fetcher.fetch_html(&url).await {
                    Ok(html) => TableSignal {
                        document_number: number,
                        body_html_url: url,
                        has_rate_table: html_has_rate_table(&html),
                        error: None,
                    },
                    Err(e) => {
                        debug!("Table probe failed for {}: {}", number, e);
                        TableSignal {
                            document_number: number,
                            body_html_url: url,
                            has_rate_table: false,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
        })
        .collect::<Vec<_>>();

    join_all(probes).await
}
