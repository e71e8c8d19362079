//! Body content resolution.
//!
//! A body can arrive inline, from a file, or on standard input. Exactly one
//! source is used, picked by a fixed precedence:
//!
//! 1. standard input, when requested
//! 2. file content, when a path is given
//! 3. inline text
//!
//! A path that cannot be read is an error, never a silent fallback to the
//! inline text.

use crate::errors::IssueError;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

/// The body sources supplied to one command.
#[derive(Debug, Clone, Default)]
pub struct BodySources {
    pub inline: Option<String>,
    pub file: Option<PathBuf>,
    pub stdin: bool,
}

impl BodySources {
    /// True when no source was supplied at all.
    pub fn is_empty(&self) -> bool {
        self.inline.is_none() && self.file.is_none() && !self.stdin
    }

    /// Resolve to the highest-precedence source, or `None` if none was given.
    ///
    /// `input` is only read when standard input was requested; it is read
    /// to end of stream.
    pub fn resolve<R: Read>(&self, input: &mut R) -> Result<Option<String>, IssueError> {
        if self.stdin {
            let mut body = String::new();
            input
                .read_to_string(&mut body)
                .map_err(|source| IssueError::BodyUnreadable {
                    origin: "stdin".to_string(),
                    source,
                })?;
            return Ok(Some(body));
        }

        if let Some(path) = &self.file {
            return match fs::read_to_string(path) {
                Ok(body) => Ok(Some(body)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    Err(IssueError::BodyFileNotFound(path.clone()))
                }
                Err(source) => Err(IssueError::BodyUnreadable {
                    origin: path.display().to_string(),
                    source,
                }),
            };
        }

        Ok(self.inline.clone())
    }

    /// Resolve and insist on non-empty content.
    pub fn require<R: Read>(&self, input: &mut R) -> Result<String, IssueError> {
        match self.resolve(input)? {
            Some(body) if !body.is_empty() => Ok(body),
            _ => Err(IssueError::MissingBody),
        }
    }
}
