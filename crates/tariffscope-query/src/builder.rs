//! Expression construction from tags and user overrides.

use std::collections::HashSet;

use tariffscope_normalize::InvestigationTag;
use tracing::debug;

use crate::types::{EntityTerms, OverrideTerm, QueryOptions};

/// Default legal phrase favoring review/determination notices.
pub const DEFAULT_LEGAL_PHRASE: &str = "(\"Final Results of Administrative Review\" | \"Amended Final Results\" | \"Final Determination\")";

/// Build per-entity candidate expressions from normalized tags.
///
/// For every entity (discovery order across the tag list): each case
/// number yields both `"<n>" & <n> & <legal>` and a bare `"<n>"`; each
/// product title yields `"<title>" & <legal>`. The list is deduplicated
/// and capped at `max_terms_per_entity`.
pub fn build_entity_terms(tags: &[InvestigationTag], options: &QueryOptions) -> Vec<EntityTerms> {
    let mut entities: Vec<EntityTerms> = Vec::new();

    for tag in tags {
        for country in &tag.countries {
            let idx = match entities.iter().position(|e| &e.entity == country) {
                Some(i) => i,
                None => {
                    entities.push(EntityTerms {
                        entity: country.clone(),
                        expressions: Vec::new(),
                    });
                    entities.len() - 1
                }
            };
            let terms = &mut entities[idx];

            for number in &tag.case_numbers {
                terms.expressions.push(format!(
                    "\"{}\" & {} & {}",
                    number, number, options.legal_phrase
                ));
                terms.expressions.push(format!("\"{}\"", number));
            }
            if !tag.product_title.is_empty() {
                terms
                    .expressions
                    .push(format!("\"{}\" & {}", tag.product_title, options.legal_phrase));
            }
        }
    }

    for terms in &mut entities {
        dedup_and_cap(&mut terms.expressions, options.max_terms_per_entity);
    }
    entities
}

/// Build per-entity expressions from explicit user phrases instead of
/// tag-derived terms.
///
/// A phrase targets only its named entity unless its `all_entities`
/// marker or the global `broadcast` flag is set, in which case it is
/// added to every known entity. A phrase naming an entity that is not in
/// `known_entities` is silently skipped.
pub fn override_entity_terms(
    known_entities: &[String],
    overrides: &[OverrideTerm],
    broadcast: bool,
    options: &QueryOptions,
) -> Vec<EntityTerms> {
    let mut entities: Vec<EntityTerms> = known_entities
        .iter()
        .map(|entity| EntityTerms {
            entity: entity.clone(),
            expressions: Vec::new(),
        })
        .collect();

    for term in overrides {
        if term.phrase.trim().is_empty() {
            continue;
        }
        if broadcast || term.all_entities || term.entity.is_none() {
            for entity in &mut entities {
                entity.expressions.push(term.phrase.clone());
            }
            continue;
        }

        let target = term.entity.as_deref().unwrap_or_default();
        match entities.iter_mut().find(|e| e.entity == target) {
            Some(entity) => entity.expressions.push(term.phrase.clone()),
            None => debug!("Override phrase targets unknown entity {:?}, skipped", target),
        }
    }

    for terms in &mut entities {
        dedup_and_cap(&mut terms.expressions, options.max_terms_per_entity);
    }
    entities
}

fn dedup_and_cap(expressions: &mut Vec<String>, cap: usize) {
    let mut seen: HashSet<String> = HashSet::new();
    expressions.retain(|e| seen.insert(e.clone()));
    expressions.truncate(cap);
}
