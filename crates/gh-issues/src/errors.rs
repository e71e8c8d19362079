//! Error taxonomy for command processing.
//!
//! Every failure a command can hit is one of four kinds. The router catches
//! all of them at its boundary and turns them into an
//! [`ErrorRecord`](crate::output::ErrorRecord), so none of them escape as an
//! uncaught process failure.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of an [`IssueError`], used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required option or argument is missing or malformed
    Validation,
    /// No body source yielded content, or a source could not be read
    BodyResolution,
    /// The backend exited non-zero, could not start, or produced garbage
    BackendInvocation,
    /// The backend session is not established
    AuthenticationUnavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::BodyResolution => "body_resolution",
            ErrorKind::BackendInvocation => "backend_invocation",
            ErrorKind::AuthenticationUnavailable => "authentication_unavailable",
        };
        f.write_str(name)
    }
}

/// A failure anywhere in the command pipeline.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("{0}")]
    Validation(String),

    #[error("No body provided. Use --body, --body-file, or --stdin")]
    MissingBody,

    #[error("File not found: {}", .0.display())]
    BodyFileNotFound(PathBuf),

    #[error("Failed to read body from {origin}")]
    BodyUnreadable {
        origin: String,
        #[source]
        source: io::Error,
    },

    #[error("{message}")]
    Backend {
        message: String,
        details: Option<String>,
    },

    #[error("{program} not authenticated. Run: {program} auth login")]
    AuthenticationUnavailable { program: String },
}

impl IssueError {
    pub fn validation(message: impl Into<String>) -> Self {
        IssueError::Validation(message.into())
    }

    /// Backend failure carrying the diagnostic text, if any was produced.
    pub fn backend(message: impl Into<String>, details: Option<String>) -> Self {
        IssueError::Backend {
            message: message.into(),
            details: details.filter(|d| !d.trim().is_empty()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            IssueError::Validation(_) => ErrorKind::Validation,
            IssueError::MissingBody
            | IssueError::BodyFileNotFound(_)
            | IssueError::BodyUnreadable { .. } => ErrorKind::BodyResolution,
            IssueError::Backend { .. } => ErrorKind::BackendInvocation,
            IssueError::AuthenticationUnavailable { .. } => ErrorKind::AuthenticationUnavailable,
        }
    }

    /// Diagnostic text shown alongside the message.
    pub fn details(&self) -> Option<String> {
        match self {
            IssueError::Backend { details, .. } => details.clone(),
            IssueError::BodyUnreadable { source, .. } => Some(source.to_string()),
            _ => None,
        }
    }
}
