//! Error model shared by validation, decoding and settings operations.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// A single failed check, addressed by a dotted/indexed path such as `levels[1].sortBy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Rejection of a payload that does not match its declared shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<FieldIssue>) -> Self {
        Self { issues }
    }

    /// Builds an error holding exactly one issue.
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![FieldIssue::new(path, message)],
        }
    }

    /// Joined `path: message` list without the leading prefix.
    pub fn message(&self) -> String {
        join_issues(&self.issues)
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Represents the failure conditions of crate operations: rejected payloads, JSON
/// decode/encode problems and settings file I/O.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns the validation issues when this error came from a schema check.
    pub fn issues(&self) -> Option<&[FieldIssue]> {
        match self {
            Error::Validation(err) => Some(&err.issues),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_joins_path_and_message() {
        let err = ValidationError::new(vec![
            FieldIssue::new("levels[0].sortBy", "unknown sort key"),
            FieldIssue::new("showSubtotals", "expected a boolean"),
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed: levels[0].sortBy: unknown sort key; \
             showSubtotals: expected a boolean"
        );
        assert_eq!(
            err.message(),
            "levels[0].sortBy: unknown sort key; showSubtotals: expected a boolean"
        );
    }

    #[test]
    fn crate_error_exposes_issues_only_for_validation() {
        let err: Error = ValidationError::single("id", "must not be empty").into();
        assert_eq!(err.issues().map(|issues| issues.len()), Some(1));
        assert_eq!(err.to_string(), "validation failed: id: must not be empty");

        let io_err: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(io_err.issues().is_none());
    }
}
