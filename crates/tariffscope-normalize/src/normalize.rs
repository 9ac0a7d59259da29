//! Record normalization — dedup, countries, case types, product titles.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::case_numbers;
use crate::types::{CaseType, InvestigationTag, RawInvestigation};

static COUNTRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfrom\s+(.+?)(?:\s*\(\s*Inv\.\s*Nos?\.|$)").unwrap());
static AND_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\band\b").unwrap());
static FROM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i) from\b").unwrap());

/// Title detectors for case types, in priority order. A title may match
/// more than one detector and every match is kept.
static TYPE_DETECTORS: Lazy<Vec<(Regex, CaseType)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"\b701-TA-\d").unwrap(), CaseType::Cvd),
        (Regex::new(r"\b731-TA-\d").unwrap(), CaseType::Ad),
        (
            Regex::new(r"(?i)\b337-TA-\d|Section\s+337").unwrap(),
            CaseType::Section337,
        ),
        (
            Regex::new(r"(?i)\bTA-201-\d|Section\s+201|safeguard").unwrap(),
            CaseType::Safeguard201,
        ),
    ]
});

/// Normalize a raw investigation list into structured tags.
///
/// Exact repeats (same investigation id, number, and phase) are dropped
/// before any other processing. Output order follows input order, so the
/// operation is idempotent and order-stable.
pub fn normalize(records: &[RawInvestigation]) -> Vec<InvestigationTag> {
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut tags = Vec::new();

    for record in records {
        let key = (
            record.investigation_id.clone().unwrap_or_default(),
            record.investigation_number.clone(),
            record.phase.clone().unwrap_or_default(),
        );
        if !seen.insert(key) {
            continue;
        }
        tags.push(normalize_one(record));
    }

    debug!("Normalized {} records into {} tags", records.len(), tags.len());
    tags
}

fn normalize_one(record: &RawInvestigation) -> InvestigationTag {
    let title = record.investigation_title.clone().unwrap_or_default();
    let url = match (&record.case_id, &record.investigation_id) {
        (Some(case_id), Some(inv_id)) => Some(format!(
            "https://pubapps2.usitc.gov/701731/case/{}/investigation/{}",
            case_id, inv_id
        )),
        _ => None,
    };

    InvestigationTag {
        number: record.investigation_number.clone(),
        phase: record.phase.clone(),
        types: classify(&title, &record.investigation_number),
        product_title: product_title(&title),
        case_numbers: case_numbers::extract_case_numbers(&record.investigation_number, &title),
        countries: extract_countries(&title),
        url,
        title,
    }
}

/// Pull country names out of `... from <countries> (Inv. Nos. ...` or a
/// title-final `from` clause. Split on commas and the word "and".
pub fn extract_countries(title: &str) -> Vec<String> {
    let Some(caps) = COUNTRY_RE.captures(title) else {
        return Vec::new();
    };

    let mut countries = Vec::new();
    for piece in caps[1].split(',') {
        for part in AND_SPLIT_RE.split(piece) {
            let part = part.trim();
            if !part.is_empty() {
                countries.push(part.to_string());
            }
        }
    }
    countries
}

/// Detect trade-remedy case types from the title, falling back to the
/// investigation number's prefix. The result is never empty.
pub fn classify(title: &str, number: &str) -> Vec<CaseType> {
    let mut types: Vec<CaseType> = TYPE_DETECTORS
        .iter()
        .filter(|(re, _)| re.is_match(title))
        .map(|(_, t)| *t)
        .collect();

    if types.is_empty() {
        if let Some(t) = classify_number(number) {
            types.push(t);
        }
    }
    if types.is_empty() {
        types.push(CaseType::Other);
    }
    types
}

fn classify_number(number: &str) -> Option<CaseType> {
    let number = number.trim();
    if number.starts_with("701") {
        Some(CaseType::Cvd)
    } else if number.starts_with("731") {
        Some(CaseType::Ad)
    } else if number.starts_with("A-") {
        Some(CaseType::Ad)
    } else if number.starts_with("C-") {
        Some(CaseType::Cvd)
    } else if number.starts_with("201") || number.starts_with("TA-201") {
        Some(CaseType::Safeguard201)
    } else if number.starts_with("337") {
        Some(CaseType::Section337)
    } else {
        None
    }
}

/// The product portion of a title: everything before the first
/// case-insensitive " from". Falls back to the whole title with any
/// trailing comma stripped.
pub fn product_title(title: &str) -> String {
    let base = match FROM_RE.find(title) {
        Some(m) => &title[..m.start()],
        None => title,
    };
    base.trim().trim_end_matches(',').to_string()
}
