//! Investigation record types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A raw investigation record as returned by the upstream feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawInvestigation {
    pub investigation_number: String,
    pub phase: Option<String>,
    pub case_id: Option<String>,
    pub investigation_id: Option<String>,
    pub investigation_title: Option<String>,
}

/// Trade-remedy case category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseType {
    #[serde(rename = "AD")]
    Ad,
    #[serde(rename = "CVD")]
    Cvd,
    #[serde(rename = "201")]
    Safeguard201,
    #[serde(rename = "337")]
    Section337,
    Other,
}

/// Structured view of one investigation record.
///
/// Created once during normalization and never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigationTag {
    /// Primary case id (the record's own investigation number).
    pub number: String,
    pub phase: Option<String>,
    /// Case categories detected from the title or number. Never empty.
    pub types: Vec<CaseType>,
    pub title: String,
    /// Portion of the title before the first " from" — the product name.
    pub product_title: String,
    /// Every case number the title mentions, plus `number` itself.
    pub case_numbers: BTreeSet<String>,
    /// Countries named in the title, in title order.
    pub countries: Vec<String>,
    /// Case-tracker URL, present only when both ids are available.
    pub url: Option<String>,
}
