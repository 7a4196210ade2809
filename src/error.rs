//! Error types for biofusion.
//!
//! All errors are strongly typed using thiserror. Data-quality problems that
//! do not stop a run (kind mismatches on shared ids) are logged instead and
//! never appear here.

use std::path::PathBuf;

use thiserror::Error;

use crate::relationship::{RelationLabel, SequenceId};

/// Validation errors raised while constructing records or reading configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Identifier '{id}' is not of the form <Namespace>:<Value>")]
    MalformedIdentifier {
        id: String,
    },

    #[error("Entity must carry at least one identifier")]
    EmptyIdentifierSet,

    #[error("Unknown entity kind '{label}'")]
    UnknownEntityKind {
        label: String,
    },

    #[error("Unknown relationship label '{label}'")]
    UnknownRelationLabel {
        label: String,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Fatal consistency violations. These abort the run.
#[derive(Debug, Error)]
pub enum ConsistencyError {
    #[error("Relationship #{sequence_id} ({label}) references unknown id '{id}'")]
    UnknownEndpoint {
        sequence_id: SequenceId,
        label: RelationLabel,
        id: String,
    },

    #[error("Output directory {dir} resolves outside output root {root}")]
    OutputOutsideRoot {
        dir: PathBuf,
        root: PathBuf,
    },

    #[error("Output path {path} is a symbolic link; export does not follow links under the output root")]
    SymlinkedOutput {
        path: PathBuf,
    },
}

/// Errors from driving the fusion stages in the wrong order.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Stage '{requested}' cannot run while pipeline is in stage '{actual}'")]
    OutOfOrder {
        requested: &'static str,
        actual: &'static str,
    },
}

/// Errors reading source graph documents or the cross-vocabulary table.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Source parser worker failed: {message}")]
    Worker {
        message: String,
    },
}

/// Errors raised while planning or writing the bulk export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Relationship #{sequence_id} ({label}) is missing required attribute '{key}'")]
    MissingAttribute {
        sequence_id: SequenceId,
        label: RelationLabel,
        key: &'static str,
    },

    #[error("Relationship #{sequence_id} ({label}) attribute '{key}' is not a valid {expected}")]
    AttributeType {
        sequence_id: SequenceId,
        label: RelationLabel,
        key: &'static str,
        expected: &'static str,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error at {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to encode {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write GraphML {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },
}

/// Top-level error type for biofusion.
#[derive(Debug, Error)]
pub enum FusionError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Consistency error: {0}")]
    Consistency(#[from] ConsistencyError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

impl FusionError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a fatal consistency error.
    #[must_use]
    pub const fn is_consistency(&self) -> bool {
        matches!(self, Self::Consistency(_))
    }

    /// Returns true if this is a pipeline ordering error.
    #[must_use]
    pub const fn is_pipeline(&self) -> bool {
        matches!(self, Self::Pipeline(_))
    }

    /// Returns true if this is a source parsing error.
    #[must_use]
    pub const fn is_source(&self) -> bool {
        matches!(self, Self::Source(_))
    }

    /// Returns true if this is an export error.
    #[must_use]
    pub const fn is_export(&self) -> bool {
        matches!(self, Self::Export(_))
    }
}

/// Result type alias for biofusion operations.
pub type FusionResult<T> = Result<T, FusionError>;
