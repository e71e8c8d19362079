//! Backend that runs an external program (the `gh` CLI by default).

use super::{Backend, Invocation};
use crate::errors::IssueError;
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs the configured program as a child process and captures its output.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    program: String,
}

impl ProcessBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ProcessBackend {
    fn default() -> Self {
        Self::new("gh")
    }
}

impl Backend for ProcessBackend {
    fn program(&self) -> &str {
        &self.program
    }

    fn invoke(&self, args: &[String]) -> Result<Invocation, IssueError> {
        debug!(program = %self.program, ?args, "invoking backend");

        // The child never sees our stdin; body content is read by the router.
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                IssueError::backend(format!("Failed to run {}", self.program), Some(e.to_string()))
            })?;

        let invocation = Invocation {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        debug!(status = ?invocation.status, "backend exited");
        Ok(invocation)
    }
}
