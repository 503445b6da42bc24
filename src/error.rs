//! Error types for the export pipeline

use thiserror::Error;

use crate::model::ContainerShape;
use crate::patch::PatchError;

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Export pipeline errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Field '{field}' expected {expected}, found {found}")]
    Shape {
        field: String,
        expected: ContainerShape,
        found: &'static str,
    },

    #[error("Unknown export type: {0}")]
    UnknownType(String),

    #[error("Callback for field '{field}' failed: {source}")]
    Callback {
        field: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Computed field {export_type}.{field} failed: {source}")]
    Computed {
        export_type: String,
        field: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Source identifier '{key}' missing from document")]
    MissingSourceId { key: String },

    #[error("Document has no patch list")]
    PatchPrecondition,

    #[error("Invalid patch list: {0}")]
    InvalidPatch(#[source] serde_json::Error),

    #[error("Patch {index} cannot be applied: {source}")]
    PatchApply {
        index: usize,
        #[source]
        source: PatchError,
    },

    #[error("Release sequence has no ocid")]
    MissingOcid,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

/// Short name of a JSON value's kind, for error messages
pub(crate) fn kind_of(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
