//! Scoring rule table.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// How a rule's pattern is tested against a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Case-insensitive substring; every `and_patterns` entry must also
    /// be present.
    Contains,
    /// Case-insensitive regular expression on the raw title.
    Regex,
}

/// One relevance rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRule {
    pub id: String,
    pub pattern: String,
    pub score: f64,
    pub match_type: MatchType,
    #[serde(default)]
    pub and_patterns: Vec<String>,
}

impl ScoreRule {
    fn contains(id: &str, pattern: &str, score: f64) -> Self {
        Self {
            id: id.to_string(),
            pattern: pattern.to_string(),
            score,
            match_type: MatchType::Contains,
            and_patterns: Vec::new(),
        }
    }
}

/// Built-in rule table for AD/CVD notice titles.
pub fn default_rules() -> Vec<ScoreRule> {
    vec![
        ScoreRule::contains("amended-final", "amended final results", 7.0),
        ScoreRule {
            and_patterns: vec!["administrative review".to_string()],
            ..ScoreRule::contains("final-results-review", "final results", 6.0)
        },
        ScoreRule::contains("final-determination", "final determination", 5.0),
        ScoreRule::contains("ad-order", "antidumping duty order", 4.0),
        ScoreRule::contains("cvd-order", "countervailing duty order", 4.0),
        ScoreRule::contains("preliminary-results", "preliminary results", 3.0),
        ScoreRule {
            id: "initiation".to_string(),
            pattern: r"initiation of (antidumping|countervailing)".to_string(),
            score: 2.0,
            match_type: MatchType::Regex,
            and_patterns: Vec::new(),
        },
        ScoreRule::contains(
            "review-opportunity",
            "opportunity to request administrative review",
            1.0,
        ),
    ]
}

/// Deserialize a caller-supplied rule table, falling back to the
/// built-in defaults when the value is missing, malformed, or empty.
pub fn parse_rules(value: Option<&serde_json::Value>) -> Vec<ScoreRule> {
    let Some(value) = value else {
        return default_rules();
    };
    match serde_json::from_value::<Vec<ScoreRule>>(value.clone()) {
        Ok(rules) if !rules.is_empty() => rules,
        Ok(_) => default_rules(),
        Err(e) => {
            warn!("Malformed scoring rules, using defaults: {}", e);
            default_rules()
        }
    }
}
