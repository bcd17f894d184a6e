//! Comment stripping and line joining.

use crate::primitives::COMMENT_MARKER;

/// Remove comments and collapse line breaks.
///
/// - A line whose content starts with `//` is dropped entirely.
/// - Anything after the first `//` on any other line is dropped.
/// - Remaining lines are joined with a single space.
///
/// Comment markers are not recognised as such inside string literals, so
/// `"http://host"` loses everything from `//` onwards. Known limitation.
pub fn strip_comments(text: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.trim_start().starts_with(COMMENT_MARKER) {
            continue;
        }

        match line.find(COMMENT_MARKER) {
            Some(pos) => kept.push(&line[..pos]),
            None => kept.push(line),
        }
    }

    kept.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_line_comment_contributes_nothing() {
        assert_eq!(strip_comments("// header\nMATCH (n)"), "MATCH (n)");
        assert_eq!(strip_comments("MATCH (n)\n// trailer"), "MATCH (n)");
    }

    #[test]
    fn trailing_comment_keeps_code_prefix() {
        assert_eq!(strip_comments("code // comment"), "code ");
    }

    #[test]
    fn lines_are_joined_with_single_space() {
        assert_eq!(
            strip_comments("MERGE (a)-[:R]->\n(b);"),
            "MERGE (a)-[:R]-> (b);"
        );
    }

    #[test]
    fn crlf_line_endings_are_normalised() {
        assert_eq!(strip_comments("MATCH (n)\r\nRETURN n;\r\n"), "MATCH (n) RETURN n; ");
    }

    #[test]
    fn marker_inside_string_is_still_stripped() {
        assert_eq!(
            strip_comments("MERGE (n {url:\"http://example.org\"});"),
            "MERGE (n {url:\"http:"
        );
    }
}
