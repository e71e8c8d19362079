//! Backend invocation layer.
//!
//! The issue tracker itself lives in an external program. Everything this
//! tool knows about it goes through the [`Backend`] trait: hand over a list
//! of arguments, get back the exit status and the captured output streams.
//! Swapping in [`ScriptedBackend`] lets the router be exercised without
//! spawning anything.

use crate::errors::IssueError;

pub mod process;
pub mod scripted;

pub use process::ProcessBackend;
pub use scripted::ScriptedBackend;

/// Captured result of one backend run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Invocation {
    /// Exit status; `None` when the process was terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Invocation {
    /// A successful run that printed `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given status and diagnostic text.
    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Trimmed stderr, or `None` if the backend said nothing.
    pub fn diagnostic(&self) -> Option<String> {
        let trimmed = self.stderr.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Turn a non-zero exit into a backend error with the given message.
    pub fn into_checked(self, message: impl Into<String>) -> Result<Self, IssueError> {
        if self.success() {
            Ok(self)
        } else {
            Err(IssueError::backend(message, self.diagnostic()))
        }
    }
}

/// An external issue-tracking program.
///
/// One call is one blocking run of the program: no retry, no timeout.
/// `Err` is reserved for runs that could not happen at all (e.g. the
/// program is not installed); a run that happened but failed is an `Ok`
/// invocation with a non-zero status.
pub trait Backend {
    /// Name of the program, used in user-facing messages.
    fn program(&self) -> &str;

    /// Run the program with `args` and wait for it to exit.
    fn invoke(&self, args: &[String]) -> Result<Invocation, IssueError>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn program(&self) -> &str {
        (**self).program()
    }

    fn invoke(&self, args: &[String]) -> Result<Invocation, IssueError> {
        (**self).invoke(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_success_requires_zero_status() {
        assert!(Invocation::ok("").success());
        assert!(!Invocation::failed(1, "boom").success());
        assert!(!Invocation {
            status: None,
            ..Invocation::default()
        }
        .success());
    }

    #[test]
    fn test_into_checked_carries_diagnostic() {
        let err = Invocation::failed(1, "  could not resolve to an Issue  \n")
            .into_checked("Failed to view issue #9")
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to view issue #9");
        assert_eq!(
            err.details().as_deref(),
            Some("could not resolve to an Issue")
        );
    }

    #[test]
    fn test_into_checked_without_stderr_has_no_details() {
        let err = Invocation::failed(4, "").into_checked("Search failed").unwrap_err();
        assert!(err.details().is_none());
    }
}
