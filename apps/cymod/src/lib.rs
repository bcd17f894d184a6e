//! # cymod
//!
//! Library target of the cymod binary: the CLI definition, the command
//! implementations and the TOML load plan.

pub mod cli;
pub mod config;
