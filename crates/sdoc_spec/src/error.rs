//! Error types for loading and querying specifications.

use std::path::PathBuf;
use thiserror::Error;

use crate::validator::ValidationResult;

/// Result type alias for spec operations.
pub type SpecResult<T> = Result<T, SpecError>;

/// Errors that can occur while loading or querying a specification.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Specification file not found: {0}")]
    NotFound(PathBuf),

    #[error("Specification rejected with {} error(s):\n{0}", .0.errors.len())]
    Rejected(Box<ValidationResult>),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Metadata field `{field}` not found{}", scope_suffix(.doc))]
    MetadataNotFound { field: String, doc: Option<String> },

    #[error("CDDL definition not found: {0}")]
    DefinitionNotFound(String),

    #[error("CDDL synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors raised while building a composite CDDL definition from headers.
///
/// These are reported to the caller that asked for the definition and never
/// invalidate the rest of the model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("header `{header}` uses format `{format}` which has no CDDL type")]
    UnknownFormat { header: String, format: String },

    #[error("exclusive group member `{member}` of `{header}` is not a header of this set")]
    UnknownExclusive { header: String, member: String },
}

fn scope_suffix(doc: &Option<String>) -> String {
    match doc {
        Some(doc) => format!(" in document `{doc}`"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_not_found_message() {
        let global = SpecError::MetadataNotFound {
            field: "ref".to_string(),
            doc: None,
        };
        assert_eq!(global.to_string(), "Metadata field `ref` not found");

        let scoped = SpecError::MetadataNotFound {
            field: "ref".to_string(),
            doc: Some("Proposal".to_string()),
        };
        assert_eq!(
            scoped.to_string(),
            "Metadata field `ref` not found in document `Proposal`"
        );
    }
}
