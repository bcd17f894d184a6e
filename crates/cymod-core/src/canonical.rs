//! # Canonical Rendering Module
//!
//! Deterministic text forms for generated Cypher and for query streams.
//!
//! - Property maps are rendered as `{k1:v1, k2:v2}` with a fixed separator.
//! - Callers pass entries already in the order they must appear.
//! - `StreamDigest` hashes the canonical line of every query so two runs
//!   over the same model produce the same checksum.

use crate::{ParamValue, ParameterSet, Query, QuerySource};
use std::path::Path;

// =============================================================================
// PROPERTY MAPS AND PATTERNS
// =============================================================================

/// Separator between `key:value` pairs.
pub const PROPERTY_SEPARATOR: &str = ", ";

/// Render `key:value` pairs as a property map literal.
pub fn property_map<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a ParamValue)>,
{
    let pairs: Vec<String> = entries
        .into_iter()
        .map(|(key, value)| format!("{}:{}", key, value.literal()))
        .collect();
    format!("{{{}}}", pairs.join(PROPERTY_SEPARATOR))
}

/// Render a node pattern `(var:Label {..})`.
///
/// The property map is omitted when there are no entries.
pub fn node_pattern<'a, I>(variable: &str, label: &str, entries: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a ParamValue)>,
{
    let mut entries = entries.into_iter().peekable();
    if entries.peek().is_none() {
        format!("({}:{})", variable, label)
    } else {
        format!("({}:{} {})", variable, label, property_map(entries))
    }
}

// =============================================================================
// REFRESH STATEMENT
// =============================================================================

/// Reference used as the source of a generated refresh statement.
pub const REFRESH_SOURCE_REF: &str = "<global parameters>";

/// Statement deleting every node that carries all of `params`.
///
/// Returns `None` for an empty set, which would match every node.
pub fn refresh_statement(params: &ParameterSet) -> Option<Query> {
    if params.is_empty() {
        return None;
    }

    let conditions: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("n.{}={}", key, value.literal()))
        .collect();
    let statement = format!(
        "MATCH (n) WHERE {} DETACH DELETE n;",
        conditions.join(" AND ")
    );

    Some(Query::new(
        statement,
        None,
        QuerySource::file(Path::new(REFRESH_SOURCE_REF), 0),
    ))
}

// =============================================================================
// STREAM DIGEST
// =============================================================================

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Canonical single-line form of a query: the statement, then its
/// parameters as `name=literal` pairs sorted by name (`?` if unresolved).
pub fn canonical_line(query: &Query) -> String {
    let Some(params) = &query.params else {
        return query.statement.clone();
    };

    let mut pairs: Vec<(&str, String)> = params
        .iter()
        .map(|(name, value)| (name, value.map_or_else(|| "?".to_string(), ParamValue::literal)))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let rendered: Vec<String> = pairs
        .into_iter()
        .map(|(name, literal)| format!("{}={}", name, literal))
        .collect();
    format!("{} | {}", query.statement, rendered.join(" "))
}

/// Running checksum over a query stream.
///
/// The 64-bit checksum is FNV-1a over the canonical lines, each followed by
/// a newline. With the `crypto-hash` feature a BLAKE3 digest is kept too.
#[derive(Debug, Clone)]
pub struct StreamDigest {
    checksum: u64,
    count: usize,
    #[cfg(feature = "crypto-hash")]
    hasher: blake3::Hasher,
}

impl Default for StreamDigest {
    fn default() -> Self {
        Self {
            checksum: FNV_OFFSET_BASIS,
            count: 0,
            #[cfg(feature = "crypto-hash")]
            hasher: blake3::Hasher::new(),
        }
    }
}

impl StreamDigest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one query to the digest.
    pub fn update(&mut self, query: &Query) {
        let mut line = canonical_line(query);
        line.push('\n');

        for byte in line.as_bytes() {
            self.checksum ^= u64::from(*byte);
            self.checksum = self.checksum.wrapping_mul(FNV_PRIME);
        }
        #[cfg(feature = "crypto-hash")]
        self.hasher.update(line.as_bytes());

        self.count += 1;
    }

    /// 64-bit FNV-1a checksum of everything added so far.
    #[must_use]
    pub const fn checksum(&self) -> u64 {
        self.checksum
    }

    /// Number of queries added.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// BLAKE3 hex digest of everything added so far.
    ///
    /// Requires the `crypto-hash` feature.
    #[cfg(feature = "crypto-hash")]
    #[must_use]
    pub fn crypto_hash(&self) -> String {
        self.hasher.finalize().to_hex().to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================
