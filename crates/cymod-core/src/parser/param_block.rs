//! Leading parameter block extraction.
//!
//! The block is found by brace balancing from the first non-blank
//! character, not by looking for a known clause keyword after it.

use crate::{CymodError, ParameterSet};

/// Split preprocessed text into an optional leading parameter object and
/// the statement body that follows it.
///
/// - Text that does not start with `{` has no block: `(None, text)`.
/// - A balanced `{...}` prefix that decodes to a JSON object of scalars is
///   returned with the remainder after its closing brace.
/// - A `{` prefix that never balances, is not valid JSON, is not an object
///   or holds non-scalar values is a `MalformedParameterBlock`.
///
/// `origin` names the file in error messages.
pub fn extract_parameter_block<'a>(
    text: &'a str,
    origin: &str,
) -> Result<(Option<ParameterSet>, &'a str), CymodError> {
    let trimmed = text.trim_start();
    if !trimmed.starts_with('{') {
        return Ok((None, text));
    }

    let malformed = |reason: String| CymodError::MalformedParameterBlock {
        path: origin.to_string(),
        reason,
    };

    let end = balanced_block_end(trimmed)
        .ok_or_else(|| malformed("unbalanced braces".to_string()))?;
    let (block, remainder) = trimmed.split_at(end);

    let value: serde_json::Value =
        serde_json::from_str(block).map_err(|e| malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(malformed("expected a JSON object".to_string()));
    }
    let parameters = ParameterSet::from_json(&value).map_err(|e| malformed(e.to_string()))?;

    Ok((Some(parameters), remainder))
}

/// Byte offset just past the brace that closes the opening `{`.
///
/// Braces inside JSON string literals are skipped.
fn balanced_block_end(text: &str) -> Option<usize> {
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ParamValue;

    #[test]
    fn no_block_returns_whole_text() {
        let (params, body) = extract_parameter_block("MATCH (n) RETURN n;", "f.cql").unwrap();
        assert!(params.is_none());
        assert_eq!(body, "MATCH (n) RETURN n;");
    }

    #[test]
    fn block_followed_by_statement() {
        let text = r#"  { "name1": "Sue", "priority": 2 }  MERGE (n {name:$name1});"#;
        let (params, body) = extract_parameter_block(text, "f.cql").unwrap();
        let params = params.unwrap();
        assert_eq!(params.get("name1"), Some(&ParamValue::from("Sue")));
        assert_eq!(params.get("priority"), Some(&ParamValue::from(2)));
        assert_eq!(body, "  MERGE (n {name:$name1});");
    }

    #[test]
    fn block_followed_by_any_clause() {
        let text = r#"{"x": 1} UNWIND range(1, $x) AS i RETURN i;"#;
        let (params, body) = extract_parameter_block(text, "f.cql").unwrap();
        assert!(params.is_some());
        assert_eq!(body, " UNWIND range(1, $x) AS i RETURN i;");
    }

    #[test]
    fn braces_inside_json_strings_do_not_close_block() {
        let text = r#"{"pattern": "a}b{"} MATCH (n) RETURN n;"#;
        let (params, body) = extract_parameter_block(text, "f.cql").unwrap();
        assert_eq!(
            params.unwrap().get("pattern"),
            Some(&ParamValue::from("a}b{"))
        );
        assert_eq!(body, " MATCH (n) RETURN n;");
    }

    #[test]
    fn block_only_file_has_empty_body() {
        let (params, body) = extract_parameter_block(r#"{"a": true}"#, "f.cql").unwrap();
        assert!(params.is_some());
        assert_eq!(body, "");
    }

    #[test]
    fn invalid_json_is_malformed() {
        let result = extract_parameter_block(r#"{ name: "Sue" } MATCH (n);"#, "f.cql");
        assert!(matches!(
            result,
            Err(CymodError::MalformedParameterBlock { .. })
        ));
    }

    #[test]
    fn unbalanced_block_is_malformed() {
        let result = extract_parameter_block(r#"{ "a": 1 MATCH (n);"#, "f.cql");
        assert!(matches!(
            result,
            Err(CymodError::MalformedParameterBlock { .. })
        ));
    }

    #[test]
    fn nested_values_are_malformed() {
        let result = extract_parameter_block(r#"{ "a": {"b": 1} } MATCH (n);"#, "f.cql");
        match result {
            Err(CymodError::MalformedParameterBlock { path, .. }) => assert_eq!(path, "f.cql"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
