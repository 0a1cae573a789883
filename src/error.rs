//! Error types for loading, validating and checking specifications.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading a specification document.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML: {source}")]
    InvalidYaml {
        #[source]
        source: serde_yaml::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors from structural validation and schema checks.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("specification is invalid: {} issue(s)", issues.len())]
    Invalid { issues: Vec<Issue> },

    #[error("unknown object \"{name}\"")]
    UnknownObject { name: String },

    #[error("invalid generated schema: {message}")]
    InvalidSchema { message: String },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Load(e) => e.exit_code(),
            ValidateError::Invalid { .. } => 1,
            ValidateError::UnknownObject { .. } | ValidateError::InvalidSchema { .. } => 2,
        }
    }

    /// Issues carried by an `Invalid` error; empty for other variants.
    pub fn issues(&self) -> &[Issue] {
        match self {
            ValidateError::Invalid { issues } => issues,
            _ => &[],
        }
    }
}

/// Single problem found in a specification, with the path to the offending node.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Issue {
    /// Location, e.g. `resources[0] (User).fields[1] (email)`.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl Issue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("service.yaml"),
        };
        assert_eq!(err.exit_code(), 3);

        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = LoadError::InvalidJson { source };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn validate_error_exit_codes() {
        let err = ValidateError::Invalid {
            issues: vec![Issue::new("resources[0] (User)", "duplicate resource name")],
        };
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.issues().len(), 1);

        let err = ValidateError::UnknownObject {
            name: "Ghost".into(),
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.issues().is_empty());

        let err = ValidateError::from(LoadError::FileNotFound {
            path: PathBuf::from("x.json"),
        });
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn issue_display() {
        let issue = Issue::new("objects[0] (Address).fields[2] (email)", "invalid field type \"Strng\"");
        assert_eq!(
            issue.to_string(),
            "objects[0] (Address).fields[2] (email): invalid field type \"Strng\""
        );
    }
}
