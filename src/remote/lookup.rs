use crate::error::{AirulesError, Result};
use crate::remote::{RuleSet, RuleSetType};

const NAME_SUFFIXES: [&str; 3] = [
    "-cursorrules-prompt-file",
    "-cursorrules-prompt",
    "-cursorrules",
];

/// Listing name without the repository's boilerplate suffixes.
pub fn short_name(name: &str) -> &str {
    NAME_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .filter(|stripped| !stripped.is_empty())
        .unwrap_or(name)
}

/// Rule sets of one kind, keeping listing order.
pub fn of_kind(rule_sets: Vec<RuleSet>, kind: RuleSetType) -> Vec<RuleSet> {
    rule_sets
        .into_iter()
        .filter(|rule_set| rule_set.kind == kind)
        .collect()
}

fn matches_exactly(rule_set: &RuleSet, query: &str) -> bool {
    rule_set.name == query || short_name(&rule_set.name) == query
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(RuleSet),
    /// Several rule sets share the queried prefix.
    Ambiguous(Vec<RuleSet>),
}

/// Resolves what a user typed against a listing.
///
/// A number is a 1-based position. Otherwise the full or short name must
/// match exactly, falling back to a prefix of either.
pub fn lookup(rule_sets: Vec<RuleSet>, query: &str) -> Result<Lookup> {
    let query = query.trim();
    let not_found = || AirulesError::RuleSetNotFound {
        name: query.to_string(),
    };

    if let Ok(id) = query.parse::<usize>() {
        return id
            .checked_sub(1)
            .and_then(|index| rule_sets.into_iter().nth(index))
            .map(Lookup::Found)
            .ok_or_else(not_found);
    }

    let exact = rule_sets
        .iter()
        .find(|rule_set| matches_exactly(rule_set, query));
    if let Some(exact) = exact {
        return Ok(Lookup::Found(exact.clone()));
    }

    let mut matches: Vec<RuleSet> = rule_sets
        .into_iter()
        .filter(|rule_set| rule_set.name.starts_with(query))
        .collect();
    match matches.len() {
        0 => Err(not_found()),
        1 => Ok(Lookup::Found(matches.remove(0))),
        _ => Ok(Lookup::Ambiguous(matches)),
    }
}

impl Lookup {
    /// Collapses an ambiguous result into an error listing the candidates.
    pub fn into_unique(self, query: &str) -> Result<RuleSet> {
        match self {
            Lookup::Found(rule_set) => Ok(rule_set),
            Lookup::Ambiguous(matches) => Err(AirulesError::AmbiguousRuleSet {
                name: query.to_string(),
                matches: matches.into_iter().map(|rule_set| rule_set.name).collect(),
            }),
        }
    }
}
