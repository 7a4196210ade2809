//! Run configuration.
//!
//! A run is described by one JSON document:
//!
//! ```json
//! {
//!   "sources": ["data/DrugBank/graph.json", "data/HGNC/graph.json"],
//!   "mapping": { "lookup": "data/MONDO/lookup.json",
//!                "reverse_lookup": "data/MONDO/reverse_lookup.json" },
//!   "export": { "output_root": "output", "output_dir": "graph" },
//!   "loader": { "bin_path": "/opt/neo4j/bin", "database": "graph.db" }
//! }
//! ```
//!
//! Missing sections fall back to their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FusionResult, SourceError, ValidationError};
use crate::export::output::resolve_output_dir;

/// Where the cross-vocabulary table is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingConfig {
    pub lookup: PathBuf,
    pub reverse_lookup: PathBuf,
}

/// Bulk export location and optional outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory the export is confined to.
    pub output_root: PathBuf,
    /// Export directory; relative paths are taken against `output_root`.
    pub output_dir: PathBuf,
    /// Also write `graph.json`.
    pub write_snapshot: bool,
    /// Also write `manifest.json`.
    pub write_manifest: bool,
    /// Also write `graph.graphml`.
    pub write_graphml: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("output"),
            output_dir: PathBuf::from("graph"),
            write_snapshot: true,
            write_manifest: true,
            write_graphml: false,
        }
    }
}

impl ExportConfig {
    /// Checks that the export directory stays inside the output root.
    ///
    /// # Errors
    /// `ValidationError::InvalidConfig` for an empty root or an escaping directory.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.output_root.as_os_str().is_empty() {
            return Err(ValidationError::InvalidConfig {
                reason: "export.output_root must not be empty".to_string(),
            });
        }
        if let Err(e) = resolve_output_dir(&self.output_root, &self.output_dir) {
            return Err(ValidationError::InvalidConfig {
                reason: e.to_string(),
            });
        }
        Ok(self)
    }
}

/// Bulk loader invocation parameters, used only by the generated scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directory containing `neo4j-admin`; empty means it is on `PATH`.
    pub bin_path: PathBuf,
    pub database: Option<String>,
}

/// Everything a fusion run needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Source graph documents, in load order.
    pub sources: Vec<PathBuf>,
    pub mapping: Option<MappingConfig>,
    pub export: ExportConfig,
    pub loader: LoaderConfig,
}

impl FusionConfig {
    /// Reads and validates a configuration file.
    ///
    /// # Errors
    /// `SourceError` if the file cannot be read or parsed, `ValidationError`
    /// if it is inconsistent.
    pub fn from_path(path: &Path) -> FusionResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| SourceError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.validate()?)
    }

    /// Checks the configuration for values a run cannot use.
    ///
    /// # Errors
    /// `ValidationError::InvalidConfig` naming the offending field.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.sources.is_empty() {
            return Err(ValidationError::InvalidConfig {
                reason: "at least one source graph is required".to_string(),
            });
        }
        if let Some(database) = &self.loader.database {
            if database.trim().is_empty() || database.chars().any(char::is_whitespace) {
                return Err(ValidationError::InvalidConfig {
                    reason: format!("loader.database '{database}' is not a valid database name"),
                });
            }
        }
        let export = self.export.validate()?;
        Ok(Self { export, ..self })
    }
}
