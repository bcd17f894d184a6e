//! # Parser Module
//!
//! Turns the raw text of a query file into statements and parameters.
//!
//! The pipeline runs in four fixed steps:
//! 1. `preprocess` strips `//` comments and joins lines with a space
//! 2. `param_block` cuts off an optional leading JSON object
//! 3. `splitter` splits the remainder on `;`
//! 4. `placeholders` builds each statement's parameter mapping
//!
//! This is not a Cypher grammar. Query syntax is never validated.

mod param_block;
mod placeholders;
mod preprocess;
mod splitter;

pub use param_block::extract_parameter_block;
pub use placeholders::{placeholder_names, resolve_placeholders, substitute_placeholders};
pub use preprocess::strip_comments;
pub use splitter::split_statements;
