//! Pure rule evaluation and winner selection.

use chrono::NaiveDate;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::rules::{MatchType, ScoreRule};

/// Result of scoring one title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleScore {
    /// Maximum score over matching rules; 0 when nothing matched.
    pub score: f64,
    /// Ids of every rule that matched, in table order.
    pub matched: Vec<String>,
}

/// What to do with candidates no rule matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroScorePolicy {
    /// Drop zero-scoring candidates from consideration entirely.
    Exclude,
    /// Keep them, ranked behind every positively scored candidate.
    #[default]
    RankLast,
}

/// Score a title against a rule table.
///
/// The base score is the maximum over all matching rules, not a sum;
/// every matching rule id is retained for diagnostics.
pub fn score_title(title: &str, rules: &[ScoreRule]) -> TitleScore {
    let title_lower = title.to_lowercase();
    let mut score: f64 = 0.0;
    let mut matched = Vec::new();

    for rule in rules {
        if rule_matches(rule, title, &title_lower) {
            matched.push(rule.id.clone());
            if rule.score > score {
                score = rule.score;
            }
        }
    }

    TitleScore { score, matched }
}

fn rule_matches(rule: &ScoreRule, title: &str, title_lower: &str) -> bool {
    match rule.match_type {
        MatchType::Contains => {
            title_lower.contains(&rule.pattern.to_lowercase())
                && rule
                    .and_patterns
                    .iter()
                    .all(|p| title_lower.contains(&p.to_lowercase()))
        }
        MatchType::Regex => RegexBuilder::new(&rule.pattern)
            .case_insensitive(true)
            .build()
            .map(|re| re.is_match(title))
            .unwrap_or(false),
    }
}

/// One candidate's selection inputs.
///
/// The zero-score policy keys off `base` (whether any rule matched);
/// ranking among surviving candidates keys off `total` (base plus
/// bonuses).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionEntry {
    /// Rule-table score before bonuses.
    pub base: f64,
    /// Base plus bonus terms.
    pub total: f64,
    pub date: Option<NaiveDate>,
}

/// Select the winning candidate index.
///
/// A candidate no rule matched (`base <= 0`) is dropped under `Exclude`
/// and ranked behind every rule-matched candidate under `RankLast`, no
/// matter what its bonuses total. Among candidates of the same standing
/// the highest total wins; ties go to the later publication date (a
/// missing date loses to any present one). Equal on both keeps the
/// earlier index, so selection is deterministic.
pub fn pick_winner(entries: &[SelectionEntry], policy: ZeroScorePolicy) -> Option<usize> {
    let mut best: Option<(usize, SelectionEntry)> = None;

    for (i, entry) in entries.iter().enumerate() {
        if policy == ZeroScorePolicy::Exclude && entry.base <= 0.0 {
            continue;
        }
        let better = match &best {
            None => true,
            Some((_, held)) => {
                let rank = (entry.base > 0.0, entry.total, entry.date);
                let held_rank = (held.base > 0.0, held.total, held.date);
                rank > held_rank
            }
        };
        if better {
            best = Some((i, *entry));
        }
    }

    best.map(|(i, _)| i)
}
