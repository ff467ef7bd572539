//! Error types for the reconciliation core.
//!
//! This module provides:
//! - `KickoffError` for unparseable date/time input
//! - `IdentityError` for team resolution failures
//! - `CatalogError` for catalog and match-file persistence failures
//! - `RecordIssue`, the structured report entry every failure is reduced to

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KickoffError {
    #[error("Empty kickoff value")]
    Empty,
    #[error("Unparseable kickoff: {0}")]
    Unparseable(String),
}

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Empty team name")]
    EmptyName,
    #[error("Placeholder fixture slot is not a team: {0}")]
    Placeholder(String),
    #[error("No country code for '{name}' in {competition_id}")]
    UnknownCountry { name: String, competition_id: String },
    #[error("'{name}' not found in catalog for {competition_id}")]
    NotInCatalog { name: String, competition_id: String },
    #[error("Failed to persist new team {team_id}: {source}")]
    Persistence {
        team_id: String,
        #[source]
        source: CatalogError,
    },
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Team id already present in catalog: {0}")]
    DuplicateId(String),
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        CatalogError::Json {
            path: path.into(),
            source,
        }
    }
}

// ============================================================================
// Issue reporting
// ============================================================================

/// Failure taxonomy surfaced to operators. None of these abort a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    ParseFailure,
    ResolutionFailure,
    PersistenceFailure,
    AmbiguityFound,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::ParseFailure => "parse_failure",
            IssueKind::ResolutionFailure => "resolution_failure",
            IssueKind::PersistenceFailure => "persistence_failure",
            IssueKind::AmbiguityFound => "ambiguity_found",
        }
    }
}

impl From<&IdentityError> for IssueKind {
    fn from(err: &IdentityError) -> Self {
        match err {
            IdentityError::Persistence { .. } => IssueKind::PersistenceFailure,
            _ => IssueKind::ResolutionFailure,
        }
    }
}

/// One reported failure, scoped to a single record, field or file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordIssue {
    pub kind: IssueKind,
    /// Index of the record within its batch or file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
}

impl RecordIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            record: None,
            field: None,
            path: None,
            message: message.into(),
        }
    }

    pub fn with_record(mut self, index: usize) -> Self {
        self.record = Some(index);
        self
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into().display().to_string());
        self
    }
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind.as_str())?;
        if let Some(path) = &self.path {
            write!(f, " {}", path)?;
        }
        if let Some(index) = self.record {
            write!(f, " record #{}", index)?;
        }
        if let Some(field) = &self.field {
            write!(f, " ({})", field)?;
        }
        write!(f, ": {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_kind_from_identity_error() {
        let err = IdentityError::UnknownCountry {
            name: "Atlantis".to_string(),
            competition_id: "m6n".to_string(),
        };
        assert_eq!(IssueKind::from(&err), IssueKind::ResolutionFailure);

        let err = IdentityError::Persistence {
            team_id: "premier_3".to_string(),
            source: CatalogError::DuplicateId("premier_3".to_string()),
        };
        assert_eq!(IssueKind::from(&err), IssueKind::PersistenceFailure);
    }

    #[test]
    fn test_issue_display_and_serde() {
        let issue = RecordIssue::new(IssueKind::ParseFailure, "Unparseable kickoff: TBC")
            .with_record(4)
            .with_field("kickoff");
        assert_eq!(
            issue.to_string(),
            "[parse_failure] record #4 (kickoff): Unparseable kickoff: TBC"
        );

        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "parse_failure");
        assert!(json.get("path").is_none());
    }
}
