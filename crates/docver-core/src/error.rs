//! Error types for Docver Core
//!
//! Provides error handling for:
//! - Missing or malformed configuration
//! - Malformed version strings, unknown increment targets and overflowing bumps
//! - Failing remote collaborator calls (including revision conflicts)
//! - Workflow-level failures that abort a run

use crate::types::RichTextId;

/// Main workflow error type
///
/// Every step is fail-fast: the first error aborts the run without
/// partial cleanup.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Required environment value missing or invalid
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Version string or increment target invalid
    #[error("version error: {0}")]
    Version(#[from] VersionError),

    /// Remote call failed
    #[error("collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    /// Table insert succeeded but discovery still finds no table
    #[error("no table found in rich text {rich_text} after insertion")]
    TableNotFound {
        /// Rich-text block that was expected to hold the table
        rich_text: RichTextId,
    },
}

impl WorkflowError {
    /// Check if the failure is an optimistic-concurrency conflict
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Collaborator(CollaboratorError::Conflict(_)))
    }

    /// Step a manual re-run has to restart from
    ///
    /// Conflicts restart from the rich-text fetch so a fresh revision is
    /// used; everything else restarts the whole run.
    #[must_use]
    pub fn restart_point(&self) -> RestartPoint {
        if self.is_conflict() {
            RestartPoint::RichTextFetch
        } else {
            RestartPoint::FullRun
        }
    }
}

/// Where a failed run has to be restarted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPoint {
    /// Re-fetch the rich-text revision, then continue
    RichTextFetch,
    /// Re-run every step
    FullRun,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required key not set (or blank)
    #[error("{0} environment variable is not set")]
    Missing(&'static str),

    /// Key set to an unusable value
    #[error("invalid value for {key}: {message}")]
    Invalid {
        /// Environment key
        key: &'static str,
        /// What was wrong
        message: String,
    },
}

impl ConfigError {
    /// Create invalid-value error
    pub fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

/// Version value errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// String is not `major.minor.patch`
    #[error("version string must be in the format 'major.minor.patch', got '{0}'")]
    Format(String),

    /// Increment target is not major, minor or patch
    #[error("invalid version part '{0}', use 'major', 'minor', or 'patch'")]
    InvalidPart(String),

    /// Increment would exceed the component's range
    #[error("version {0} cannot be incremented further")]
    Overflow(String),
}

/// Remote collaborator errors
///
/// Deliberately opaque: callers only need to tell conflicts apart from
/// everything else.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// Transport failure (connect, timeout, TLS)
    #[error("network error: {0}")]
    Network(String),

    /// Service answered with a non-success status
    #[error("api error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or summary
        message: String,
    },

    /// Stale revision supplied to a mutation
    #[error("revision conflict: {0}")]
    Conflict(String),

    /// Response could not be decoded into the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl CollaboratorError {
    /// Create api error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

/// Result alias for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;
