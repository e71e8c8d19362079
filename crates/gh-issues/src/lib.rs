//! GitHub Issues CLI library
//!
//! Wraps the `gh` command-line client behind a small, stable command set
//! with structured output for automated callers. The binary is a thin shell
//! around [`IssueRouter`]; the library is what the tests drive.

pub mod backend;
pub mod body;
pub mod cli;
pub mod config;
pub mod errors;
pub mod normalize;
pub mod output;
pub mod router;
pub mod schema;
pub mod templates;

// Re-export commonly used types
pub use backend::{Backend, Invocation, ProcessBackend, ScriptedBackend};
pub use config::Settings;
pub use errors::{ErrorKind, IssueError};
pub use output::{ErrorRecord, ExitCode, OutputMode, Renderer};
pub use router::IssueRouter;
pub use schema::CommandSchema;
