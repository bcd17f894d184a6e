//! # Load Plan Configuration
//!
//! A TOML file describing an ordered list of load jobs.
//!
//! ```toml
//! journal = "model.redb"
//! refresh = true
//! global_params = { project = "gredos", model_ID = 2 }
//!
//! [[job]]
//! kind = "cypher"
//! dir = "model"
//! suffix = "_w"
//! params = "model/params.yaml"
//!
//! [[job]]
//! kind = "tabular"
//! table = "transitions.csv"
//! start_col = "start"
//! end_col = "end"
//! labels = { State = "LandCover" }
//! ```
//!
//! Parameter entries are either an inline table or a path to a JSON, YAML
//! or TOML parameter file. Relative paths are resolved against the
//! directory of the load plan.

use cymod_core::{CustomLabels, CymodError, GraphLoader, ParameterSet};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Conventional file name of a load plan.
pub const DEFAULT_CONFIG_FILE: &str = "cymod.toml";

/// Maximum size of a load plan file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// PLAN STRUCTURE
// =============================================================================

/// Parameters given inline or by file path.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamSource {
    File(PathBuf),
    Inline(toml::Table),
}

impl ParamSource {
    /// Resolve into a checked parameter set.
    pub fn resolve(&self, base: &Path) -> Result<ParameterSet, CymodError> {
        match self {
            Self::File(path) => ParameterSet::from_path(base.join(path)),
            Self::Inline(table) => ParameterSet::from_toml(table),
        }
    }
}

/// One job of a load plan.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JobConfig {
    Cypher {
        dir: PathBuf,
        #[serde(default)]
        suffix: Option<String>,
        #[serde(default)]
        params: Option<ParamSource>,
    },
    Tabular {
        table: PathBuf,
        start_col: String,
        end_col: String,
        #[serde(default)]
        labels: BTreeMap<String, String>,
        #[serde(default)]
        params: Option<ParamSource>,
    },
}

/// A parsed load plan.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadPlan {
    #[serde(default)]
    pub journal: Option<PathBuf>,
    #[serde(default)]
    pub refresh: bool,
    #[serde(default)]
    pub global_params: Option<ParamSource>,
    #[serde(default, rename = "job")]
    pub jobs: Vec<JobConfig>,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl LoadPlan {
    /// Read a load plan from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CymodError> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|source| CymodError::UnreadableFile {
            path: path.to_path_buf(),
            source,
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(CymodError::SerializationError(format!(
                "Load plan size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|source| CymodError::UnreadableFile {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_toml_str(&text, base)
    }

    /// Parse a load plan whose relative paths are anchored at `base_dir`.
    pub fn from_toml_str(text: &str, base_dir: impl Into<PathBuf>) -> Result<Self, CymodError> {
        let mut plan: Self = toml::from_str(text)
            .map_err(|e| CymodError::SerializationError(format!("Invalid load plan: {}", e)))?;
        plan.base_dir = base_dir.into();
        tracing::debug!("Load plan with {} jobs", plan.jobs.len());
        Ok(plan)
    }

    /// Resolve a path from the plan against its base directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Loader-wide global parameters, if configured.
    pub fn global_params(&self) -> Result<Option<ParameterSet>, CymodError> {
        self.global_params
            .as_ref()
            .map(|source| source.resolve(&self.base_dir))
            .transpose()
    }

    /// Register every job of the plan, in order, on `loader`.
    ///
    /// `read_table` turns a table path into an in-memory table.
    pub fn register_jobs<F>(&self, loader: &mut GraphLoader, mut read_table: F) -> Result<(), CymodError>
    where
        F: FnMut(&Path) -> Result<cymod_core::Table, CymodError>,
    {
        for job in &self.jobs {
            match job {
                JobConfig::Cypher { dir, suffix, params } => {
                    let params = params
                        .as_ref()
                        .map(|source| source.resolve(&self.base_dir))
                        .transpose()?;
                    loader.register_file_source(self.resolve_path(dir), suffix.clone(), params);
                }
                JobConfig::Tabular {
                    table,
                    start_col,
                    end_col,
                    labels,
                    params,
                } => {
                    let table = read_table(&self.resolve_path(table))?;
                    let labels = CustomLabels::from_overrides(labels)?;
                    let params = params
                        .as_ref()
                        .map(|source| source.resolve(&self.base_dir))
                        .transpose()?;
                    loader.register_tabular_source(table, start_col, end_col, Some(labels), params)?;
                }
            }
        }
        Ok(())
    }
}
