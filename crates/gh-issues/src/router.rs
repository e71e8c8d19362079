//! Command routing.
//!
//! [`IssueRouter`] takes one parsed command through validation, body
//! resolution and templating, invokes the backend, normalizes what comes
//! back and renders exactly one response. Every failure is caught here,
//! rendered as an [`ErrorRecord`] and mapped to [`ExitCode::Failure`].

use std::io::{self, Read, Write};

use tracing::{debug, info, warn};

use crate::backend::{Backend, Invocation};
use crate::body::BodySources;
use crate::cli::{
    BodyArgs, CloseArgs, Commands, CommentArgs, CreateArgs, EditArgs, ListArgs, ReopenArgs,
    SearchArgs, ViewArgs,
};
use crate::config::Settings;
use crate::errors::IssueError;
use crate::normalize::{self, RawIssue, RawLabel, RawRepository};
use crate::output::{
    ActionRecord, ClosedRecord, CreatedRecord, ErrorRecord, ExitCode, NoticeRecord, Renderer,
};
use crate::schema::CommandSchema;
use crate::templates::{self, split_labels};

const LIST_FIELDS: &str = "number,title,state,labels,author,createdAt,updatedAt,assignees";
const VIEW_FIELDS: &str = "number,title,state,body,labels,author,assignees,createdAt,updatedAt,url";
const SEARCH_FIELDS: &str = "number,title,state,labels,author,createdAt";
const LABEL_FIELDS: &str = "name,description,color";
const REPO_FIELDS: &str = "name,owner,url";

/// Notice shown when `edit` is given nothing to change.
pub const NO_CHANGES: &str = "No changes specified.";

/// Why a command did not complete.
#[derive(Debug)]
enum Failure {
    /// Reported to the caller as an error record.
    Issue(IssueError),
    /// Writing the response itself failed.
    Output(io::Error),
}

impl From<IssueError> for Failure {
    fn from(err: IssueError) -> Self {
        Failure::Issue(err)
    }
}

impl From<io::Error> for Failure {
    fn from(err: io::Error) -> Self {
        Failure::Output(err)
    }
}

type Outcome = Result<(), Failure>;

/// Dispatches commands to the backend.
pub struct IssueRouter<B: Backend> {
    backend: B,
    settings: Settings,
}

impl<B: Backend> IssueRouter<B> {
    pub fn new(backend: B, settings: Settings) -> Self {
        Self { backend, settings }
    }

    /// Run one command to completion and return the process exit code.
    ///
    /// `input` is only read by commands that were asked to take their body
    /// from standard input.
    pub fn execute<W: Write, R: Read>(
        &self,
        command: Commands,
        renderer: &mut Renderer<W>,
        input: &mut R,
    ) -> ExitCode {
        let name = command_name(&command);
        debug!(command = name, mode = ?renderer.mode(), "dispatching");

        let outcome = match command {
            Commands::List(args) => self.list(args, renderer),
            Commands::View(args) => self.view(args, renderer),
            Commands::Create(args) => self.create(args, renderer, input),
            Commands::Close(args) => self.close(args, renderer),
            Commands::Reopen(args) => self.reopen(args, renderer),
            Commands::Comment(args) => self.comment(args, renderer, input),
            Commands::Edit(args) => self.edit(args, renderer, input),
            Commands::Search(args) => self.search(args, renderer),
            Commands::Labels => self.labels(renderer),
            Commands::Status => self.status(renderer),
            Commands::Schema => renderer
                .document(&CommandSchema::generate())
                .map_err(Failure::from),
        };

        match outcome {
            Ok(()) => ExitCode::Success,
            Err(Failure::Issue(err)) => {
                warn!(command = name, kind = %err.kind(), "{}", err);
                if let Err(e) = renderer.error(&ErrorRecord::from(&err)) {
                    report_output_error(&e);
                }
                ExitCode::Failure
            }
            Err(Failure::Output(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
                debug!(command = name, "stdout closed before output was written");
                ExitCode::Success
            }
            Err(Failure::Output(e)) => {
                report_output_error(&e);
                ExitCode::Failure
            }
        }
    }

    // ------------------------------------------------------------------------
    // Backend plumbing
    // ------------------------------------------------------------------------

    fn run(&self, args: Vec<String>) -> Result<Invocation, IssueError> {
        self.backend.invoke(&args)
    }

    /// Invoke and turn a non-zero status into a backend error.
    fn run_checked(&self, args: Vec<String>, failure: String) -> Result<Invocation, IssueError> {
        self.run(args)?.into_checked(failure)
    }

    /// Fail unless the backend reports an authenticated session.
    fn ensure_auth(&self) -> Result<(), IssueError> {
        let probe = self.run(argv(&["auth", "status"]))?;
        if probe.success() {
            Ok(())
        } else {
            debug!(stderr = ?probe.diagnostic(), "authentication probe failed");
            Err(IssueError::AuthenticationUnavailable {
                program: self.backend.program().to_string(),
            })
        }
    }

    fn limit(&self, requested: Option<u32>) -> Result<u32, IssueError> {
        match requested {
            Some(0) => Err(IssueError::validation("Limit must be a positive integer")),
            Some(n) => Ok(n),
            None => Ok(self.settings.default_limit),
        }
    }

    /// Best-effort comment ahead of a state change.
    fn leading_comment(&self, issue_number: u64, comment: Option<&str>) {
        let Some(comment) = comment.filter(|c| !c.is_empty()) else {
            return;
        };

        let args = argv(&["issue", "comment", &issue_number.to_string(), "--body", comment]);
        match self.run(args) {
            Ok(result) if result.success() => debug!(issue_number, "comment posted"),
            Ok(result) => warn!(
                issue_number,
                stderr = ?result.diagnostic(),
                "comment could not be posted"
            ),
            Err(e) => warn!(issue_number, error = %e, "comment could not be posted"),
        }
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    fn list<W: Write>(&self, args: ListArgs, renderer: &mut Renderer<W>) -> Outcome {
        let limit = self.limit(args.limit)?;

        let mut gh = argv(&[
            "issue",
            "list",
            "--state",
            args.state.as_str(),
            "--limit",
            &limit.to_string(),
            "--json",
            LIST_FIELDS,
        ]);
        push_opt(&mut gh, "--label", args.labels.as_deref());
        push_opt(&mut gh, "--assignee", args.assignee.as_deref());

        self.ensure_auth()?;
        let result = self.run_checked(gh, "Failed to list issues".to_string())?;

        let issues: Vec<RawIssue> = normalize::decode_list(&result.stdout)?;
        info!(count = issues.len(), "listed issues");
        let rows: Vec<_> = issues.iter().map(normalize::issue_summary).collect();
        renderer.list(&rows)?;
        Ok(())
    }

    fn view<W: Write>(&self, args: ViewArgs, renderer: &mut Renderer<W>) -> Outcome {
        let number = issue_number(args.issue_number)?;

        let fields = if args.comments {
            format!("{},comments", VIEW_FIELDS)
        } else {
            VIEW_FIELDS.to_string()
        };
        let gh = argv(&["issue", "view", &number.to_string(), "--json", &fields]);

        self.ensure_auth()?;
        let result = self.run_checked(gh, format!("Failed to view issue #{}", number))?;

        let raw: RawIssue = normalize::decode(&result.stdout)?;
        renderer.record(&normalize::issue_detail(&raw, args.comments), None)?;
        Ok(())
    }

    fn create<W: Write, R: Read>(
        &self,
        args: CreateArgs,
        renderer: &mut Renderer<W>,
        input: &mut R,
    ) -> Outcome {
        let title = args
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| IssueError::validation("Title is required"))?;

        let body = body_sources(&args.body).resolve(input)?.unwrap_or_default();
        let expanded = templates::expand(
            args.issue_type,
            title,
            split_labels(args.labels.as_deref()),
            body,
        );
        debug!(title = %expanded.title, labels = ?expanded.labels, "expanded template");

        let mut gh = argv(&[
            "issue",
            "create",
            "--title",
            &expanded.title,
            "--body",
            &expanded.body,
        ]);
        for label in &expanded.labels {
            push_opt(&mut gh, "--label", Some(label.as_str()));
        }
        push_opt(&mut gh, "--assignee", args.assignee.as_deref());

        self.ensure_auth()?;
        let result = self.run_checked(gh, "Failed to create issue".to_string())?;

        let url = result.stdout.trim().to_string();
        let number = normalize::issue_number_from_url(&url);
        match number {
            Some(n) => info!(issue_number = n, "created issue"),
            None => warn!(url = %url, "could not read issue number from backend output"),
        }

        let headline = match number {
            Some(n) => format!("Created #{}", n),
            None => "Created issue".to_string(),
        };
        let record = CreatedRecord {
            success: true,
            issue_number: number,
            url,
        };
        renderer.record(&record, Some(&headline))?;
        Ok(())
    }

    fn close<W: Write>(&self, args: CloseArgs, renderer: &mut Renderer<W>) -> Outcome {
        let number = issue_number(args.issue_number)?;

        self.ensure_auth()?;
        self.leading_comment(number, args.comment.as_deref());

        let gh = argv(&[
            "issue",
            "close",
            &number.to_string(),
            "--reason",
            args.reason.backend_value(),
        ]);
        self.run_checked(gh, format!("Failed to close #{}", number))?;
        info!(issue_number = number, reason = args.reason.as_str(), "closed issue");

        let record = ClosedRecord {
            success: true,
            issue_number: number,
            reason: args.reason.as_str().to_string(),
        };
        renderer.record(&record, Some(&format!("Closed #{}", number)))?;
        Ok(())
    }

    fn reopen<W: Write>(&self, args: ReopenArgs, renderer: &mut Renderer<W>) -> Outcome {
        let number = issue_number(args.issue_number)?;

        self.ensure_auth()?;
        self.leading_comment(number, args.comment.as_deref());

        let gh = argv(&["issue", "reopen", &number.to_string()]);
        self.run_checked(gh, format!("Failed to reopen #{}", number))?;
        info!(issue_number = number, "reopened issue");

        renderer.record(
            &ActionRecord::new(number, "reopened"),
            Some(&format!("Reopened #{}", number)),
        )?;
        Ok(())
    }

    fn comment<W: Write, R: Read>(
        &self,
        args: CommentArgs,
        renderer: &mut Renderer<W>,
        input: &mut R,
    ) -> Outcome {
        let number = issue_number(args.issue_number)?;
        let body = body_sources(&args.body).require(input)?;

        let gh = argv(&["issue", "comment", &number.to_string(), "--body", &body]);

        self.ensure_auth()?;
        self.run_checked(gh, format!("Failed to comment on #{}", number))?;
        info!(issue_number = number, "commented on issue");

        renderer.record(
            &ActionRecord::new(number, "commented"),
            Some(&format!("Commented on #{}", number)),
        )?;
        Ok(())
    }

    fn edit<W: Write, R: Read>(
        &self,
        args: EditArgs,
        renderer: &mut Renderer<W>,
        input: &mut R,
    ) -> Outcome {
        let number = issue_number(args.issue_number)?;
        let body = body_sources(&args.body).resolve(input)?;

        let mut gh = argv(&["issue", "edit", &number.to_string()]);
        let base_len = gh.len();
        push_opt(&mut gh, "--title", args.title.as_deref());
        push_opt(&mut gh, "--body", body.as_deref());
        push_opt(&mut gh, "--add-label", args.add_labels.as_deref());
        push_opt(&mut gh, "--remove-label", args.remove_labels.as_deref());
        push_opt(&mut gh, "--add-assignee", args.add_assignee.as_deref());

        if gh.len() == base_len {
            debug!(issue_number = number, "edit has nothing to change");
            let record = NoticeRecord {
                success: true,
                issue_number: number,
                action: "unchanged".to_string(),
                notice: NO_CHANGES.to_string(),
            };
            renderer.notice(&record, NO_CHANGES)?;
            return Ok(());
        }

        self.ensure_auth()?;
        self.run_checked(gh, format!("Failed to edit #{}", number))?;
        info!(issue_number = number, "edited issue");

        renderer.record(
            &ActionRecord::new(number, "edited"),
            Some(&format!("Edited #{}", number)),
        )?;
        Ok(())
    }

    fn search<W: Write>(&self, args: SearchArgs, renderer: &mut Renderer<W>) -> Outcome {
        if args.query.trim().is_empty() {
            return Err(IssueError::validation("Search query must not be empty").into());
        }
        let limit = self.limit(args.limit)?;

        let gh = argv(&[
            "issue",
            "list",
            "--search",
            &args.query,
            "--state",
            args.state.as_str(),
            "--limit",
            &limit.to_string(),
            "--json",
            SEARCH_FIELDS,
        ]);

        self.ensure_auth()?;
        let result = self.run_checked(gh, "Search failed".to_string())?;

        let issues: Vec<RawIssue> = normalize::decode_list(&result.stdout)?;
        info!(count = issues.len(), query = %args.query, "search finished");
        let rows: Vec<_> = issues.iter().map(normalize::search_hit).collect();
        renderer.list(&rows)?;
        Ok(())
    }

    fn labels<W: Write>(&self, renderer: &mut Renderer<W>) -> Outcome {
        self.ensure_auth()?;
        let gh = argv(&["label", "list", "--json", LABEL_FIELDS]);
        let result = self.run_checked(gh, "Failed to list labels".to_string())?;

        let labels: Vec<RawLabel> = normalize::decode_list(&result.stdout)?;
        let rows: Vec<_> = labels.iter().map(normalize::label_record).collect();
        renderer.list(&rows)?;
        Ok(())
    }

    /// Reports on the session instead of requiring one.
    fn status<W: Write>(&self, renderer: &mut Renderer<W>) -> Outcome {
        let authenticated = self.run(argv(&["auth", "status"]))?.success();
        let repo = self.run(argv(&["repo", "view", "--json", REPO_FIELDS]))?;

        let repository = if repo.success() {
            match normalize::decode::<RawRepository>(&repo.stdout) {
                Ok(r) => Some(r),
                Err(e) => {
                    warn!(error = %e, "unreadable repository details");
                    None
                }
            }
        } else {
            debug!(stderr = ?repo.diagnostic(), "no repository in current directory");
            None
        };

        renderer.record(&normalize::status_record(authenticated, repository.as_ref()), None)?;
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Append `flag value` when the value is present and non-empty.
fn push_opt(args: &mut Vec<String>, flag: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
}

fn issue_number(n: u64) -> Result<u64, IssueError> {
    if n == 0 {
        return Err(IssueError::validation("Issue number must be a positive integer"));
    }
    Ok(n)
}

fn body_sources(args: &BodyArgs) -> BodySources {
    BodySources {
        inline: args.body.clone(),
        file: args.body_file.clone(),
        stdin: args.stdin,
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::List(_) => "list",
        Commands::View(_) => "view",
        Commands::Create(_) => "create",
        Commands::Close(_) => "close",
        Commands::Reopen(_) => "reopen",
        Commands::Comment(_) => "comment",
        Commands::Edit(_) => "edit",
        Commands::Search(_) => "search",
        Commands::Labels => "labels",
        Commands::Status => "status",
        Commands::Schema => "schema",
    }
}

fn report_output_error(err: &io::Error) {
    if err.kind() == io::ErrorKind::BrokenPipe {
        debug!("stdout closed before output was written");
    } else {
        tracing::error!(error = %err, "failed to write output");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ScriptedBackend;
    use crate::cli::{CloseReason, StateFilter};
    use crate::output::OutputMode;
    use crate::templates::IssueType;
    use serde_json::Value;
    use std::io::Cursor;
    use tempfile::TempDir;

    const LIST_PAYLOAD: &str = r#"[
        {"number": 1, "title": "First", "state": "OPEN", "labels": [{"name": "bug"}],
         "author": {"login": "alice"}, "createdAt": "2024-01-02T03:04:05Z",
         "updatedAt": "2024-01-03T00:00:00Z", "assignees": []},
        {"number": 2, "title": "Second", "state": "OPEN", "labels": [],
         "author": {"login": "bob"}, "createdAt": "2024-02-03T00:00:00Z",
         "updatedAt": "2024-02-04T00:00:00Z", "assignees": [{"login": "carol"}]}
    ]"#;

    const VIEW_PAYLOAD: &str = r#"{
        "number": 42, "title": "Login fails", "state": "OPEN", "body": "It breaks",
        "labels": [{"name": "bug"}], "author": {"login": "alice"}, "assignees": [],
        "createdAt": "2024-01-02T03:04:05Z", "updatedAt": "2024-01-02T03:04:05Z",
        "url": "https://github.com/o/r/issues/42",
        "comments": [
            {"author": {"login": "bob"}, "body": "Same here", "createdAt": "2024-01-03T00:00:00Z"},
            {"author": {"login": "carol"}, "body": "Fixed?", "id": "IC_2"}
        ]
    }"#;

    struct Run {
        code: ExitCode,
        out: String,
        backend: ScriptedBackend,
    }

    impl Run {
        fn json(&self) -> Value {
            serde_json::from_str(&self.out).unwrap()
        }
    }

    fn run_with_input(
        backend: ScriptedBackend,
        mode: OutputMode,
        command: Commands,
        stdin: &str,
    ) -> Run {
        let router = IssueRouter::new(backend.clone(), Settings::default());
        let mut renderer = Renderer::new(Vec::new(), mode);
        let mut input = Cursor::new(stdin.as_bytes().to_vec());
        let code = router.execute(command, &mut renderer, &mut input);
        Run {
            code,
            out: String::from_utf8(renderer.into_inner()).unwrap(),
            backend,
        }
    }

    fn run(backend: ScriptedBackend, command: Commands) -> Run {
        run_with_input(backend, OutputMode::Structured, command, "")
    }

    fn view_args(n: u64, comments: bool) -> Commands {
        Commands::View(ViewArgs {
            issue_number: n,
            comments,
        })
    }

    fn create_args(title: &str) -> CreateArgs {
        CreateArgs {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    // ------------------------------------------------------------------------
    // list / search / labels
    // ------------------------------------------------------------------------

    #[test]
    fn test_list_builds_backend_call_and_normalizes() {
        let backend = ScriptedBackend::new()
            .respond(&["issue", "list"], Invocation::ok(LIST_PAYLOAD));
        let result = run(
            backend,
            Commands::List(ListArgs {
                state: StateFilter::All,
                labels: Some("bug,p1".to_string()),
                assignee: Some("alice".to_string()),
                limit: Some(5),
            }),
        );

        assert_eq!(result.code, ExitCode::Success);
        let call = &result.backend.operation_calls()[0];
        assert_eq!(
            call[..8],
            argv(&["issue", "list", "--state", "all", "--limit", "5", "--json", LIST_FIELDS])[..]
        );
        assert_eq!(result.backend.flag_value(0, "--label").as_deref(), Some("bug,p1"));
        assert_eq!(result.backend.flag_value(0, "--assignee").as_deref(), Some("alice"));

        let rows = result.json();
        assert_eq!(rows.as_array().unwrap().len(), 2);
        assert_eq!(rows[0]["state"], "open");
        assert_eq!(rows[0]["labels"], "bug");
        assert_eq!(rows[0]["created"], "2024-01-02");
        assert!(rows[1].get("assignees").is_none());
    }

    #[test]
    fn test_list_uses_default_limit() {
        let result = run(ScriptedBackend::new(), Commands::List(ListArgs::default()));
        assert_eq!(result.backend.flag_value(0, "--limit").as_deref(), Some("30"));
        assert_eq!(result.backend.flag_value(0, "--state").as_deref(), Some("open"));
        assert_eq!(result.json(), serde_json::json!([]));
    }

    #[test]
    fn test_list_empty_human_is_notice() {
        let backend = ScriptedBackend::new().respond(&["issue", "list"], Invocation::ok("[]"));
        let result = run_with_input(
            backend,
            OutputMode::Human,
            Commands::List(ListArgs::default()),
            "",
        );
        assert_eq!(result.code, ExitCode::Success);
        assert_eq!(result.out.trim(), crate::output::NO_RESULTS);
    }

    #[test]
    fn test_zero_limit_is_rejected_without_backend_call() {
        let result = run(
            ScriptedBackend::new(),
            Commands::List(ListArgs {
                limit: Some(0),
                ..Default::default()
            }),
        );
        assert_eq!(result.code, ExitCode::Failure);
        assert!(result.backend.calls().is_empty());
        assert!(result.json()["error"].as_str().unwrap().contains("Limit"));
    }

    #[test]
    fn test_list_backend_failure_reports_diagnostic() {
        let backend = ScriptedBackend::new()
            .respond(&["issue", "list"], Invocation::failed(1, "HTTP 502: Bad Gateway\n"));
        let result = run(backend, Commands::List(ListArgs::default()));

        assert_eq!(result.code, ExitCode::Failure);
        assert_eq!(
            result.json(),
            serde_json::json!({
                "error": "Failed to list issues",
                "details": "HTTP 502: Bad Gateway"
            })
        );
        assert_eq!(result.backend.operation_calls().len(), 1);
    }

    #[test]
    fn test_undecodable_output_is_failure() {
        let backend =
            ScriptedBackend::new().respond(&["issue", "list"], Invocation::ok("not json"));
        let result = run(backend, Commands::List(ListArgs::default()));
        assert_eq!(result.code, ExitCode::Failure);
        assert_eq!(result.json()["error"], "Failed to parse backend output");
    }

    #[test]
    fn test_search_call_and_fields() {
        let backend = ScriptedBackend::new()
            .respond(&["issue", "list"], Invocation::ok(LIST_PAYLOAD));
        let result = run(
            backend,
            Commands::Search(SearchArgs {
                query: "login".to_string(),
                state: StateFilter::Closed,
                limit: Some(10),
            }),
        );

        assert_eq!(result.code, ExitCode::Success);
        assert_eq!(
            result.backend.operation_calls()[0],
            argv(&[
                "issue", "list", "--search", "login", "--state", "closed", "--limit", "10",
                "--json", SEARCH_FIELDS
            ])
        );
        let rows = result.json();
        assert!(rows[0].get("author").is_none());
        assert_eq!(rows[1]["title"], "Second");
    }

    #[test]
    fn test_blank_search_query_is_rejected() {
        let result = run(
            ScriptedBackend::new(),
            Commands::Search(SearchArgs {
                query: "   ".to_string(),
                ..Default::default()
            }),
        );
        assert_eq!(result.code, ExitCode::Failure);
        assert!(result.backend.calls().is_empty());
    }

    #[test]
    fn test_search_failure_message() {
        let backend =
            ScriptedBackend::new().respond(&["issue", "list"], Invocation::failed(1, ""));
        let result = run(
            backend,
            Commands::Search(SearchArgs {
                query: "x".to_string(),
                ..Default::default()
            }),
        );
        assert_eq!(result.json(), serde_json::json!({"error": "Search failed"}));
    }

    #[test]
    fn test_labels_drop_color() {
        let backend = ScriptedBackend::new().respond(
            &["label", "list"],
            Invocation::ok(r#"[{"name": "bug", "description": "Broken", "color": "d73a4a"}]"#),
        );
        let result = run(backend, Commands::Labels);
        assert_eq!(
            result.json(),
            serde_json::json!([{"name": "bug", "description": "Broken"}])
        );
        assert_eq!(
            result.backend.operation_calls()[0],
            argv(&["label", "list", "--json", LABEL_FIELDS])
        );
    }

    // ------------------------------------------------------------------------
    // view
    // ------------------------------------------------------------------------

    #[test]
    fn test_view_with_comments() {
        let backend = ScriptedBackend::new()
            .respond(&["issue", "view"], Invocation::ok(VIEW_PAYLOAD));
        let result = run(backend, view_args(42, true));

        assert_eq!(result.code, ExitCode::Success);
        assert_eq!(
            result.backend.flag_value(0, "--json"),
            Some(format!("{},comments", VIEW_FIELDS))
        );

        let detail = result.json();
        let keys: Vec<&str> = detail.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "number", "title", "state", "url", "author", "labels", "created", "body",
                "comments"
            ]
        );
        let comments = detail["comments"].as_array().unwrap();
        assert_eq!(comments.len(), 2);
        for comment in comments {
            assert_eq!(comment.as_object().unwrap().len(), 2);
        }
    }

    #[test]
    fn test_view_without_comments_omits_them() {
        let backend = ScriptedBackend::new()
            .respond(&["issue", "view"], Invocation::ok(VIEW_PAYLOAD));
        let result = run(backend, view_args(42, false));
        assert_eq!(result.backend.flag_value(0, "--json").as_deref(), Some(VIEW_FIELDS));
        assert!(result.json().get("comments").is_none());
    }

    #[test]
    fn test_view_zero_is_validation_error() {
        let result = run(ScriptedBackend::new(), view_args(0, false));
        assert_eq!(result.code, ExitCode::Failure);
        assert!(result.backend.calls().is_empty());
    }

    #[test]
    fn test_view_failure_names_issue() {
        let backend = ScriptedBackend::new().respond(
            &["issue", "view"],
            Invocation::failed(1, "GraphQL: Could not resolve to an issue"),
        );
        let result = run(backend, view_args(999, false));
        assert_eq!(result.json()["error"], "Failed to view issue #999");
        assert_eq!(result.json()["details"], "GraphQL: Could not resolve to an issue");
    }

    #[test]
    fn test_unauthenticated_blocks_operation() {
        let backend = ScriptedBackend::new().unauthenticated();
        let result = run(backend, view_args(42, false));

        assert_eq!(result.code, ExitCode::Failure);
        assert!(result.backend.operation_calls().is_empty());
        assert_eq!(
            result.json()["error"],
            "gh not authenticated. Run: gh auth login"
        );
    }

    // ------------------------------------------------------------------------
    // create
    // ------------------------------------------------------------------------

    #[test]
    fn test_create_bug_template() {
        let backend = ScriptedBackend::new().respond(
            &["issue", "create"],
            Invocation::ok("https://github.com/o/r/issues/7\n"),
        );
        let mut args = create_args("Login fails");
        args.issue_type = Some(IssueType::Bug);
        let result = run(backend, Commands::Create(args));

        assert_eq!(result.code, ExitCode::Success);
        assert_eq!(
            result.backend.flag_value(0, "--title").as_deref(),
            Some("[Bug] Login fails")
        );
        assert_eq!(result.backend.flag_values(0, "--label"), vec!["bug"]);
        let body = result.backend.flag_value(0, "--body").unwrap();
        assert!(body.contains("Steps to Reproduce"));
        assert_eq!(
            result.json(),
            serde_json::json!({
                "success": true,
                "issue_number": 7,
                "url": "https://github.com/o/r/issues/7"
            })
        );
    }

    #[test]
    fn test_create_without_type_passes_through() {
        let backend = ScriptedBackend::new();
        let mut args = create_args("Plain");
        args.labels = Some("docs, ,docs".to_string());
        args.body.body = Some("Hello".to_string());
        args.assignee = Some("alice".to_string());
        let result = run(backend, Commands::Create(args));

        assert_eq!(result.backend.flag_value(0, "--title").as_deref(), Some("Plain"));
        assert_eq!(result.backend.flag_value(0, "--body").as_deref(), Some("Hello"));
        assert_eq!(result.backend.flag_values(0, "--label"), vec!["docs", "docs"]);
        assert_eq!(result.backend.flag_value(0, "--assignee").as_deref(), Some("alice"));
    }

    #[test]
    fn test_create_unparseable_url_gives_null_number() {
        let backend = ScriptedBackend::new()
            .respond(&["issue", "create"], Invocation::ok("created\n"));
        let result = run(backend, Commands::Create(create_args("x")));
        assert_eq!(result.code, ExitCode::Success);
        assert!(result.json()["issue_number"].is_null());
    }

    #[test]
    fn test_create_requires_title() {
        for title in [None, Some("   ".to_string())] {
            let args = CreateArgs {
                title,
                ..Default::default()
            };
            let result = run(ScriptedBackend::new(), Commands::Create(args));
            assert_eq!(result.code, ExitCode::Failure);
            assert!(result.backend.calls().is_empty());
        }
    }

    #[test]
    fn test_create_missing_body_file_no_backend_call() {
        let temp = TempDir::new().unwrap();
        let mut args = create_args("x");
        args.body.body = Some("inline".to_string());
        args.body.body_file = Some(temp.path().join("missing.md"));
        let result = run(ScriptedBackend::new(), Commands::Create(args));

        assert_eq!(result.code, ExitCode::Failure);
        assert!(result.backend.calls().is_empty());
        assert!(result.json()["error"]
            .as_str()
            .unwrap()
            .starts_with("File not found:"));
    }

    #[test]
    fn test_create_body_from_stdin_wins() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("body.md");
        std::fs::write(&path, "from file").unwrap();

        let mut args = create_args("x");
        args.body = BodyArgs {
            body: Some("inline".to_string()),
            body_file: Some(path),
            stdin: true,
        };
        let result = run_with_input(
            ScriptedBackend::new(),
            OutputMode::Structured,
            Commands::Create(args),
            "from `stdin`",
        );
        assert_eq!(result.backend.flag_value(0, "--body").as_deref(), Some("from `stdin`"));
    }

    #[test]
    fn test_create_human_headline() {
        let backend = ScriptedBackend::new().respond(
            &["issue", "create"],
            Invocation::ok("https://github.com/o/r/issues/12\n"),
        );
        let result = run_with_input(
            backend,
            OutputMode::Human,
            Commands::Create(create_args("x")),
            "",
        );
        assert!(result.out.starts_with("✓ Created #12\n"));
    }

    // ------------------------------------------------------------------------
    // close / reopen / comment
    // ------------------------------------------------------------------------

    #[test]
    fn test_close_comments_first_and_maps_reason() {
        let result = run(
            ScriptedBackend::new(),
            Commands::Close(CloseArgs {
                issue_number: 42,
                comment: Some("Won't do".to_string()),
                reason: CloseReason::NotPlanned,
            }),
        );

        assert_eq!(result.code, ExitCode::Success);
        let calls = result.backend.operation_calls();
        assert_eq!(calls[0], argv(&["issue", "comment", "42", "--body", "Won't do"]));
        assert_eq!(calls[1], argv(&["issue", "close", "42", "--reason", "not planned"]));
        assert_eq!(
            result.json(),
            serde_json::json!({"success": true, "issue_number": 42, "reason": "not_planned"})
        );
    }

    #[test]
    fn test_close_comment_failure_is_not_surfaced() {
        let backend = ScriptedBackend::new()
            .respond(&["issue", "comment"], Invocation::failed(1, "locked"));
        let result = run(
            backend,
            Commands::Close(CloseArgs {
                issue_number: 3,
                comment: Some("bye".to_string()),
                reason: CloseReason::Completed,
            }),
        );
        assert_eq!(result.code, ExitCode::Success);
        assert_eq!(result.json()["reason"], "completed");
    }

    #[test]
    fn test_close_failure() {
        let backend = ScriptedBackend::new()
            .respond(&["issue", "close"], Invocation::failed(1, "already closed"));
        let result = run(
            backend,
            Commands::Close(CloseArgs {
                issue_number: 3,
                ..Default::default()
            }),
        );
        assert_eq!(result.code, ExitCode::Failure);
        assert_eq!(result.json()["error"], "Failed to close #3");
        assert_eq!(result.backend.operation_calls().len(), 1);
    }

    #[test]
    fn test_reopen() {
        let result = run(
            ScriptedBackend::new(),
            Commands::Reopen(ReopenArgs {
                issue_number: 8,
                comment: None,
            }),
        );
        assert_eq!(result.backend.operation_calls(), vec![argv(&["issue", "reopen", "8"])]);
        assert_eq!(
            result.json(),
            serde_json::json!({"success": true, "issue_number": 8, "action": "reopened"})
        );
    }

    #[test]
    fn test_comment_requires_body() {
        let result = run(
            ScriptedBackend::new(),
            Commands::Comment(CommentArgs {
                issue_number: 5,
                body: BodyArgs::default(),
            }),
        );
        assert_eq!(result.code, ExitCode::Failure);
        assert!(result.backend.calls().is_empty());
        assert_eq!(
            result.json()["error"],
            "No body provided. Use --body, --body-file, or --stdin"
        );
    }

    #[test]
    fn test_comment_empty_stdin_is_missing_body() {
        let result = run_with_input(
            ScriptedBackend::new(),
            OutputMode::Structured,
            Commands::Comment(CommentArgs {
                issue_number: 5,
                body: BodyArgs {
                    stdin: true,
                    ..Default::default()
                },
            }),
            "",
        );
        assert_eq!(result.code, ExitCode::Failure);
        assert!(result.backend.calls().is_empty());
    }

    #[test]
    fn test_comment_posts_body() {
        let result = run(
            ScriptedBackend::new(),
            Commands::Comment(CommentArgs {
                issue_number: 5,
                body: BodyArgs {
                    body: Some("Looks good".to_string()),
                    ..Default::default()
                },
            }),
        );
        assert_eq!(
            result.backend.operation_calls(),
            vec![argv(&["issue", "comment", "5", "--body", "Looks good"])]
        );
        assert_eq!(result.json()["action"], "commented");
    }

    // ------------------------------------------------------------------------
    // edit
    // ------------------------------------------------------------------------

    #[test]
    fn test_edit_without_changes_is_notice_and_no_calls() {
        let result = run_with_input(
            ScriptedBackend::new(),
            OutputMode::Human,
            Commands::Edit(EditArgs {
                issue_number: 42,
                ..Default::default()
            }),
            "",
        );
        assert_eq!(result.code, ExitCode::Success);
        assert!(result.backend.calls().is_empty());
        assert_eq!(result.out, format!("{}\n", NO_CHANGES));
    }

    #[test]
    fn test_edit_empty_strings_are_unset() {
        let result = run(
            ScriptedBackend::new(),
            Commands::Edit(EditArgs {
                issue_number: 42,
                title: Some(String::new()),
                add_labels: Some(String::new()),
                ..Default::default()
            }),
        );
        assert_eq!(result.code, ExitCode::Success);
        assert!(result.backend.calls().is_empty());
        assert_eq!(result.json()["action"], "unchanged");
    }

    #[test]
    fn test_edit_builds_all_flags() {
        let result = run(
            ScriptedBackend::new(),
            Commands::Edit(EditArgs {
                issue_number: 42,
                title: Some("New".to_string()),
                body: BodyArgs {
                    body: Some("Text".to_string()),
                    ..Default::default()
                },
                add_labels: Some("a,b".to_string()),
                remove_labels: Some("c".to_string()),
                add_assignee: Some("dave".to_string()),
            }),
        );
        assert_eq!(
            result.backend.operation_calls()[0],
            argv(&[
                "issue", "edit", "42", "--title", "New", "--body", "Text", "--add-label", "a,b",
                "--remove-label", "c", "--add-assignee", "dave"
            ])
        );
        assert_eq!(result.json()["action"], "edited");
    }

    #[test]
    fn test_edit_failure() {
        let backend =
            ScriptedBackend::new().respond(&["issue", "edit"], Invocation::failed(1, "nope"));
        let result = run(
            backend,
            Commands::Edit(EditArgs {
                issue_number: 9,
                title: Some("t".to_string()),
                ..Default::default()
            }),
        );
        assert_eq!(result.code, ExitCode::Failure);
        assert_eq!(result.json()["error"], "Failed to edit #9");
    }

    // ------------------------------------------------------------------------
    // status / schema
    // ------------------------------------------------------------------------

    #[test]
    fn test_status_not_gated_by_auth() {
        let backend = ScriptedBackend::new()
            .unauthenticated()
            .respond(&["repo", "view"], Invocation::failed(1, "not a git repository"));
        let result = run(backend, Commands::Status);

        assert_eq!(result.code, ExitCode::Success);
        assert_eq!(
            result.json(),
            serde_json::json!({"authenticated": false, "repository": null, "url": null})
        );
    }

    #[test]
    fn test_status_with_repository() {
        let backend = ScriptedBackend::new().respond(
            &["repo", "view"],
            Invocation::ok(
                r#"{"name": "r", "owner": {"login": "o"}, "url": "https://github.com/o/r"}"#,
            ),
        );
        let result = run(backend, Commands::Status);
        assert_eq!(result.json()["authenticated"], true);
        assert_eq!(result.json()["repository"], "o/r");
        assert_eq!(
            result.backend.calls()[1],
            argv(&["repo", "view", "--json", REPO_FIELDS])
        );
    }

    #[test]
    fn test_schema_is_json_in_human_mode_without_backend() {
        let result = run_with_input(
            ScriptedBackend::new(),
            OutputMode::Human,
            Commands::Schema,
            "",
        );
        assert_eq!(result.code, ExitCode::Success);
        assert!(result.backend.calls().is_empty());
        assert_eq!(result.json()["name"], "gh-issues");
    }

    // ------------------------------------------------------------------------
    // rendering failures
    // ------------------------------------------------------------------------

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_broken_pipe_keeps_success() {
        let router = IssueRouter::new(ScriptedBackend::new(), Settings::default());
        let mut renderer = Renderer::new(ClosedPipe, OutputMode::Structured);
        let code = router.execute(Commands::Labels, &mut renderer, &mut io::empty());
        assert_eq!(code, ExitCode::Success);
    }

    #[test]
    fn test_broken_pipe_keeps_failure() {
        let router = IssueRouter::new(ScriptedBackend::new(), Settings::default());
        let mut renderer = Renderer::new(ClosedPipe, OutputMode::Structured);
        let code = router.execute(view_args(0, false), &mut renderer, &mut io::empty());
        assert_eq!(code, ExitCode::Failure);
    }
}
