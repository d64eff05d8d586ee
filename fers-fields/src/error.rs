//! Error types for field rendering, saving and interaction

use std::fmt;

use thiserror::Error;

/// Result type for field operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Which repeater bound an operation ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Min(usize),
    Max(usize),
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Min(n) => write!(f, "min {n}"),
            Bound::Max(n) => write!(f, "max {n}"),
        }
    }
}

/// Errors that can occur while rendering, saving or interacting with fields
#[derive(Debug, Error)]
pub enum FieldsError {
    /// A repeater id already appears as a segment of its own namespace
    #[error("field id conflict: '{id}' already appears in namespace '{namespace}'")]
    IdentifierConflict { id: String, namespace: String },

    /// Repeater row count would leave the configured bounds
    #[error("repeater '{field}' has {count} rows, outside {bound}")]
    BoundsViolation {
        field: String,
        count: usize,
        bound: Bound,
    },

    /// Required leaf value missing or blank
    #[error("required field '{field}' is missing: {message}")]
    RequiredFieldMissing { field: String, message: String },

    /// Submitted sorter lists do not partition the known universe
    #[error(
        "sorter '{field}' does not match its universe (missing: {missing:?}, unexpected: {unexpected:?}, duplicated: {duplicated:?})"
    )]
    UniverseMismatch {
        field: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
        duplicated: Vec<String>,
    },

    /// Duplicate field id among siblings
    #[error("duplicate field id: {name}")]
    DuplicateFieldName { name: String },

    /// Identifier cannot be used as a namespace segment
    #[error("invalid identifier '{id}': {reason}")]
    InvalidIdentifier { id: String, reason: String },

    /// Field nesting deeper than the configured limit
    #[error("field nesting exceeds depth limit of {limit} at '{path}'")]
    DepthExceeded { limit: usize, path: String },

    /// No handler registered for a field kind
    #[error("no handler registered for field kind '{kind}'")]
    UnknownKind { kind: String },

    /// Interaction event not valid in the current state
    #[error("cannot {action} while {state}")]
    InvalidTransition { state: String, action: String },

    /// Row or item index past the end of its list
    #[error("index {index} out of range for {len} entries")]
    RowOutOfRange { index: usize, len: usize },

    /// Submission name with unbalanced brackets
    #[error("malformed field name: {name}")]
    MalformedName { name: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Configuration could not be extracted
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl From<figment::Error> for FieldsError {
    fn from(error: figment::Error) -> Self {
        FieldsError::Config(Box::new(error))
    }
}

/// An error attributed to one field, identified by its namespace path.
#[derive(Debug)]
pub struct FieldError {
    pub path: String,
    pub error: FieldsError,
}

impl FieldError {
    pub fn new(path: impl Into<String>, error: FieldsError) -> Self {
        Self {
            path: path.into(),
            error,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FieldsError::DuplicateFieldName {
            name: "links".into(),
        };
        assert_eq!(err.to_string(), "duplicate field id: links");
    }

    #[test]
    fn test_bounds_violation_display() {
        let err = FieldsError::BoundsViolation {
            field: "links".into(),
            count: 3,
            bound: Bound::Max(3),
        };
        assert_eq!(err.to_string(), "repeater 'links' has 3 rows, outside max 3");
    }

    #[test]
    fn test_field_error_prefixes_path() {
        let err = FieldError::new(
            "opts[links][0][url]",
            FieldsError::RequiredFieldMissing {
                field: "url".into(),
                message: "cannot be empty".into(),
            },
        );
        assert!(err.to_string().starts_with("opts[links][0][url]: "));
        assert!(err.to_string().contains("cannot be empty"));
    }
}
