//! Statement splitting.

use crate::primitives::STATEMENT_TERMINATOR;

/// Split a file body into terminated statements.
///
/// Every non-blank fragment between terminators becomes one statement,
/// trimmed and re-terminated with `;`. A body without any terminator is a
/// single implicit statement.
///
/// Terminators inside string literals are not recognised. Known limitation.
pub fn split_statements(body: &str) -> Vec<String> {
    body.split(STATEMENT_TERMINATOR)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| format!("{}{}", fragment, STATEMENT_TERMINATOR))
        .collect()
}
