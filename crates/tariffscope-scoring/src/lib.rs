//! Document Scorer — relevance scoring of notice titles against a
//! declarative rule table, plus per-entity winner selection.
//!
//! Rules are data, not code: evaluation is a pure function over an
//! immutable rule list. The base score is the maximum over matching
//! rules, never a sum.

mod rules;
mod score;

pub use rules::{default_rules, parse_rules, MatchType, ScoreRule};
pub use score::{pick_winner, score_title, SelectionEntry, TitleScore, ZeroScorePolicy};
