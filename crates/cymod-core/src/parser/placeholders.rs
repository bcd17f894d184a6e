//! Placeholder scanning and file-level resolution.

use crate::primitives::PLACEHOLDER_SIGIL;
use crate::{ParameterSet, QueryParams};
use regex::Regex;
use std::sync::LazyLock;

/// The sigil followed by one or more ASCII alphanumeric characters.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"{}([A-Za-z0-9]+)", regex::escape(&PLACEHOLDER_SIGIL.to_string()));
    Regex::new(&pattern).expect("valid regex")
});

/// Placeholder names in first-seen order, without duplicates.
pub fn placeholder_names(statement: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    let found = PLACEHOLDER_RE
        .captures_iter(statement)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str());
    for name in found {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Replace each placeholder with `lookup(name)` in one pass.
///
/// Placeholders the lookup does not know are left as written.
pub fn substitute_placeholders<F>(statement: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    PLACEHOLDER_RE
        .replace_all(statement, |caps: &regex::Captures<'_>| match lookup(&caps[1]) {
            Some(literal) => literal,
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Build a statement's parameter mapping from file-level parameters.
///
/// Returns `None` if the statement has no placeholders. Placeholders the
/// file does not define get an unresolved slot, to be filled later from
/// global parameters.
pub fn resolve_placeholders(statement: &str, file_params: Option<&ParameterSet>) -> Option<QueryParams> {
    let names = placeholder_names(statement);
    if names.is_empty() {
        return None;
    }

    let mut params = QueryParams::new();
    for name in names {
        let value = file_params.and_then(|p| p.get(name)).cloned();
        params.insert(name, value);
    }
    Some(params)
}
