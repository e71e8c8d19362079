//! Scripted backend for testing.
//!
//! Replays canned invocations keyed by argument prefix and records every
//! call it receives. Clones share the same script and call log, so a test
//! can hand one clone to the router and inspect the other afterwards.

use super::{Backend, Invocation};
use crate::errors::IssueError;
use std::cell::RefCell;
use std::rc::Rc;

/// In-process stand-in for the backend program.
///
/// Responses are matched against the leading arguments of each call; the
/// first matching rule wins. Unmatched calls succeed with empty output.
/// The `auth status` probe succeeds unless [`unauthenticated`] is used.
///
/// [`unauthenticated`]: ScriptedBackend::unauthenticated
///
/// # Examples
///
/// ```
/// use gh_issues::backend::{Backend, Invocation, ScriptedBackend};
///
/// let backend = ScriptedBackend::new()
///     .respond(&["issue", "create"], Invocation::ok("https://github.com/o/r/issues/7\n"));
///
/// let out = backend
///     .invoke(&["issue".into(), "create".into(), "--title".into(), "x".into()])
///     .unwrap();
/// assert!(out.stdout.ends_with("/7\n"));
/// assert_eq!(backend.calls().len(), 1);
/// ```
#[derive(Clone, Default)]
#[allow(dead_code)] // Public API used only in tests, not in binary
pub struct ScriptedBackend {
    rules: Rc<RefCell<Vec<(Vec<String>, Invocation)>>>,
    calls: Rc<RefCell<Vec<Vec<String>>>>,
}

#[allow(dead_code)] // Public API used only in tests, not in binary
impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer calls starting with `prefix` with `invocation`.
    pub fn respond(self, prefix: &[&str], invocation: Invocation) -> Self {
        let prefix = prefix.iter().map(|s| s.to_string()).collect();
        self.rules.borrow_mut().push((prefix, invocation));
        self
    }

    /// Make the `auth status` probe fail.
    pub fn unauthenticated(self) -> Self {
        self.respond(
            &["auth", "status"],
            Invocation::failed(1, "You are not logged into any GitHub hosts."),
        )
    }

    /// Every argument list received so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// Calls other than the authentication probe.
    pub fn operation_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|c| !(c.len() >= 2 && c[0] == "auth" && c[1] == "status"))
            .collect()
    }

    /// Value following `flag` in the `index`-th operation call.
    pub fn flag_value(&self, index: usize, flag: &str) -> Option<String> {
        let calls = self.operation_calls();
        let call = calls.get(index)?;
        call.iter()
            .position(|a| a == flag)
            .and_then(|i| call.get(i + 1))
            .cloned()
    }

    /// All values following `flag` in the `index`-th operation call.
    pub fn flag_values(&self, index: usize, flag: &str) -> Vec<String> {
        let calls = self.operation_calls();
        let Some(call) = calls.get(index) else {
            return Vec::new();
        };
        call.windows(2)
            .filter(|w| w[0] == flag)
            .map(|w| w[1].clone())
            .collect()
    }
}

impl Backend for ScriptedBackend {
    fn program(&self) -> &str {
        "gh"
    }

    fn invoke(&self, args: &[String]) -> Result<Invocation, IssueError> {
        self.calls.borrow_mut().push(args.to_vec());

        let rules = self.rules.borrow();
        let matched = rules
            .iter()
            .find(|(prefix, _)| args.starts_with(prefix))
            .map(|(_, invocation)| invocation.clone());

        Ok(matched.unwrap_or_else(|| Invocation::ok("")))
    }
}
