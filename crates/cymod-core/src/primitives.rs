//! # Fixed Primitives
//!
//! Hardcoded constants for the cymod translator.
//!
//! These are compiled into the binary and are immutable at runtime:
//! 1. **Lexical primitives**: comment marker and statement terminator.
//! 2. **Discovery primitives**: extensions that mark a query file.
//! 3. **Generation primitives**: default labels and fixed relationship types
//!    of the transition pattern.

/// Marker that starts a comment running to the end of the line.
pub const COMMENT_MARKER: &str = "//";

/// Statement terminator.
pub const STATEMENT_TERMINATOR: char = ';';

/// Sigil that introduces a placeholder inside a statement.
pub const PLACEHOLDER_SIGIL: char = '$';

/// File extensions (without the dot) that mark a query file.
pub const QUERY_FILE_EXTENSIONS: &[&str] = &["cql", "cypher"];

/// Key of the leading parameter block that controls load order.
///
/// It is removed from the exposed file parameters.
pub const PRIORITY_KEY: &str = "priority";

/// Maximum size of a single query file (16 MB).
///
/// Query files are read whole; anything larger is almost certainly not a
/// hand-written model view.
pub const MAX_QUERY_FILE_SIZE: u64 = 16 * 1024 * 1024;

// =============================================================================
// TRANSITION PATTERN
// =============================================================================

/// Default label of start/end state nodes.
pub const DEFAULT_STATE_LABEL: &str = "State";

/// Default label of transition nodes.
pub const DEFAULT_TRANSITION_LABEL: &str = "Transition";

/// Default label of condition nodes.
pub const DEFAULT_CONDITION_LABEL: &str = "Condition";

/// Property holding a state's code.
pub const STATE_CODE_PROPERTY: &str = "code";

/// Relationship from a transition to its start state.
pub const SOURCE_RELATIONSHIP: &str = "SOURCE";

/// Relationship from a transition to its end state.
pub const TARGET_RELATIONSHIP: &str = "TARGET";

/// Relationship from a condition to the transition it causes.
pub const CAUSES_RELATIONSHIP: &str = "CAUSES";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognised_extensions() {
        assert_eq!(QUERY_FILE_EXTENSIONS, &["cql", "cypher"]);
    }

    #[test]
    fn comment_marker_is_two_characters() {
        assert_eq!(COMMENT_MARKER.len(), 2);
    }
}
