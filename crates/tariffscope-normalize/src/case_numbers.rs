//! Case-number block tokenizer and range expander.
//!
//! Titles carry a trailing block like `Inv. Nos. 731-TA-100-102 and 104
//! (Final)`. The block is a comma/"and"-separated list where a prefixed
//! token (`731-TA-...`) establishes the prefix that bare continuations
//! (`104`, `103-105`) inherit. The walk is a small state machine over an
//! enumerated token type so the expansion contract is testable on its own.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Bare ranges wider than this are treated as malformed and skipped.
const MAX_RANGE_SPAN: u64 = 1000;

static BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Inv\.\s*Nos?\.\s*(.+?)\s*\(").unwrap());
static RANGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\s*-\s*(\d+)$").unwrap());
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());
static AND_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\band\b").unwrap());

/// One token of a case-number block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A token containing `-TA-` with no trailing range, kept verbatim.
    /// Carries the prefix it establishes (everything through `-TA-`).
    PrefixedFull { text: String, prefix: String },
    /// A token containing `-TA-` that ends in `start-end`.
    PrefixedRange { prefix: String, start: u64, end: u64 },
    /// A purely numeric token; meaningful only under a carried prefix.
    BareNumber(u64),
    /// A `start-end` token; meaningful only under a carried prefix.
    BareRange(u64, u64),
    /// Anything else. Ignored and does not disturb the carried prefix.
    Noise,
}

/// Split a block into tokens on commas and the literal word "and".
pub fn tokenize(block: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for piece in block.split(',') {
        for part in AND_SPLIT_RE.split(piece) {
            let part = part.trim().trim_end_matches('.');
            if part.is_empty() {
                continue;
            }
            tokens.push(classify(part));
        }
    }
    tokens
}

fn classify(token: &str) -> Token {
    if let Some(idx) = token.find("-TA-") {
        let prefix = token[..idx + "-TA-".len()].to_string();
        let rest = &token[idx + "-TA-".len()..];
        if let Some(caps) = RANGE_RE.captures(rest) {
            let start = caps[1].parse().unwrap_or(0);
            let end = caps[2].parse().unwrap_or(0);
            return Token::PrefixedRange { prefix, start, end };
        }
        return Token::PrefixedFull {
            text: token.to_string(),
            prefix,
        };
    }
    if NUMBER_RE.is_match(token) {
        return Token::BareNumber(token.parse().unwrap_or(0));
    }
    if let Some(caps) = RANGE_RE.captures(token) {
        let start = caps[1].parse().unwrap_or(0);
        let end = caps[2].parse().unwrap_or(0);
        return Token::BareRange(start, end);
    }
    Token::Noise
}

/// Extract every case number a title mentions, seeded with the record's
/// own number.
pub fn extract_case_numbers(own_number: &str, title: &str) -> BTreeSet<String> {
    let mut numbers = BTreeSet::new();
    if !own_number.is_empty() {
        numbers.insert(own_number.to_string());
    }

    let Some(caps) = BLOCK_RE.captures(title) else {
        return numbers;
    };
    let tokens = tokenize(&caps[1]);
    expand(&tokens, &mut numbers);
    numbers
}

/// Walk tokens left to right, carrying the current `-TA-` prefix.
pub fn expand(tokens: &[Token], out: &mut BTreeSet<String>) {
    let mut current_prefix: Option<String> = None;

    for token in tokens {
        match token {
            Token::PrefixedFull { text, prefix } => {
                out.insert(text.clone());
                current_prefix = Some(prefix.clone());
            }
            Token::PrefixedRange { prefix, start, end } => {
                expand_range(prefix, *start, *end, out);
                current_prefix = Some(prefix.clone());
            }
            Token::BareNumber(n) => {
                if let Some(prefix) = &current_prefix {
                    out.insert(format!("{}{}", prefix, n));
                }
            }
            Token::BareRange(start, end) => {
                if let Some(prefix) = current_prefix.clone() {
                    expand_range(&prefix, *start, *end, out);
                }
            }
            Token::Noise => {}
        }
    }
}

fn expand_range(prefix: &str, start: u64, end: u64, out: &mut BTreeSet<String>) {
    if start > end || end - start > MAX_RANGE_SPAN {
        return;
    }
    for i in start..=end {
        out.insert(format!("{}{}", prefix, i));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tokenize_mixed_block() {
        let tokens = tokenize("731-TA-100-102 and 104");
        assert_eq!(
            tokens,
            vec![
                Token::PrefixedRange {
                    prefix: "731-TA-".into(),
                    start: 100,
                    end: 102
                },
                Token::BareNumber(104),
            ]
        );
    }

    #[test]
    fn test_tokenize_noise() {
        let tokens = tokenize("Final, 731-TA-55");
        assert_eq!(tokens[0], Token::Noise);
        assert!(matches!(tokens[1], Token::PrefixedFull { .. }));
    }

    #[test]
    fn test_range_and_continuation_expansion() {
        // The §8 contract: range plus bare continuation under the carried
        // prefix, seeded with the record's own number.
        let numbers = extract_case_numbers(
            "731-TA-99",
            "Certain Steel Nails from Taiwan (Inv. Nos. 731-TA-100-102 and 104 (Final))",
        );
        assert_eq!(
            numbers,
            set(&[
                "731-TA-99",
                "731-TA-100",
                "731-TA-101",
                "731-TA-102",
                "731-TA-104",
            ])
        );
    }

    #[test]
    fn test_comma_separated_continuations() {
        let mut out = BTreeSet::new();
        expand(&tokenize("731-TA-100, 101, and 103-105"), &mut out);
        assert_eq!(
            out,
            set(&[
                "731-TA-100",
                "731-TA-101",
                "731-TA-103",
                "731-TA-104",
                "731-TA-105",
            ])
        );
    }

    #[test]
    fn test_bare_tokens_without_prefix_ignored() {
        let mut out = BTreeSet::new();
        expand(&tokenize("104 and 110-112"), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_mixed_series_switch_prefix() {
        let mut out = BTreeSet::new();
        expand(&tokenize("701-TA-400 and 731-TA-800-801"), &mut out);
        assert_eq!(out, set(&["701-TA-400", "731-TA-800", "731-TA-801"]));
    }

    #[test]
    fn test_no_block_keeps_seed_only() {
        let numbers = extract_case_numbers("A-570-909", "Steel Wire Garment Hangers from China");
        assert_eq!(numbers, set(&["A-570-909"]));
    }

    #[test]
    fn test_inverted_range_skipped() {
        let mut out = BTreeSet::new();
        expand(&tokenize("731-TA-200-100"), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_runaway_range_skipped() {
        let mut out = BTreeSet::new();
        expand(&tokenize("731-TA-1-999999"), &mut out);
        assert!(out.is_empty());
    }
}
