//! Command-line interface definitions using clap.

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::output::OutputMode;
use crate::templates::IssueType;

/// GitHub Issues CLI for automated callers
///
/// Manages issues through the `gh` CLI. Every command accepts
/// `--output structured` for a single machine-readable JSON document.
///
/// Exit Codes:
///   0  - Command succeeded (including 'no changes specified')
///   1  - Validation, body resolution, authentication or backend failure
#[derive(Parser, Debug)]
#[command(name = "gh-issues", version)]
#[command(about = "GitHub Issues CLI for automated callers", long_about = None)]
pub struct Cli {
    /// Output format: human or structured (default: human)
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputMode>,

    /// Log backend invocations to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List issues. Returns: number, title, state, labels, author, created
    List(ListArgs),

    /// View issue details. Returns: number, title, state, url, author, labels, created, body
    View(ViewArgs),

    /// Create a new issue. Use --body-file or --stdin for markdown with backticks
    Create(CreateArgs),

    /// Close an issue
    Close(CloseArgs),

    /// Reopen a closed issue
    Reopen(ReopenArgs),

    /// Add a comment to an issue
    Comment(CommentArgs),

    /// Edit an issue
    Edit(EditArgs),

    /// Search issues by text
    Search(SearchArgs),

    /// List repository labels
    Labels,

    /// Show authentication and repository status
    Status,

    /// Print the command catalog as JSON
    Schema,
}

/// Issue state filter for `list` and `search`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StateFilter {
    #[default]
    Open,
    Closed,
    All,
}

impl StateFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StateFilter::Open => "open",
            StateFilter::Closed => "closed",
            StateFilter::All => "all",
        }
    }
}

/// Why an issue is being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CloseReason {
    #[default]
    Completed,
    #[value(name = "not_planned")]
    NotPlanned,
}

impl CloseReason {
    /// Name reported back to the caller.
    pub fn as_str(self) -> &'static str {
        match self {
            CloseReason::Completed => "completed",
            CloseReason::NotPlanned => "not_planned",
        }
    }

    /// Value the backend expects for `--reason`.
    pub fn backend_value(self) -> &'static str {
        match self {
            CloseReason::Completed => "completed",
            CloseReason::NotPlanned => "not planned",
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Issue state
    #[arg(short, long, value_enum, default_value_t = StateFilter::Open)]
    pub state: StateFilter,

    /// Filter by labels (comma-separated)
    #[arg(short, long)]
    pub labels: Option<String>,

    /// Filter by assignee
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Maximum number of results (default: 30)
    #[arg(short = 'n', long)]
    pub limit: Option<u32>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Issue number
    pub issue_number: u64,

    /// Include comments
    #[arg(short, long)]
    pub comments: bool,
}

/// Body source options shared by commands that accept a body.
#[derive(Args, Debug, Clone, Default)]
pub struct BodyArgs {
    /// Body text (markdown)
    #[arg(short, long)]
    pub body: Option<String>,

    /// Read body from file (preserves backticks)
    #[arg(short = 'f', long)]
    pub body_file: Option<PathBuf>,

    /// Read body from standard input
    #[arg(long)]
    pub stdin: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CreateArgs {
    /// Issue title (required)
    #[arg(short, long)]
    pub title: Option<String>,

    #[command(flatten)]
    pub body: BodyArgs,

    /// Issue type template
    #[arg(long = "type", value_enum)]
    pub issue_type: Option<IssueType>,

    /// Labels (comma-separated)
    #[arg(short, long)]
    pub labels: Option<String>,

    /// Assignee login
    #[arg(short, long)]
    pub assignee: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CloseArgs {
    /// Issue number
    pub issue_number: u64,

    /// Closing comment
    #[arg(short, long)]
    pub comment: Option<String>,

    /// Close reason
    #[arg(short, long, value_enum, default_value_t = CloseReason::Completed)]
    pub reason: CloseReason,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ReopenArgs {
    /// Issue number
    pub issue_number: u64,

    /// Reopening comment
    #[arg(short, long)]
    pub comment: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CommentArgs {
    /// Issue number
    pub issue_number: u64,

    #[command(flatten)]
    pub body: BodyArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EditArgs {
    /// Issue number
    pub issue_number: u64,

    /// New title
    #[arg(short, long)]
    pub title: Option<String>,

    #[command(flatten)]
    pub body: BodyArgs,

    /// Labels to add (comma-separated)
    #[arg(long)]
    pub add_labels: Option<String>,

    /// Labels to remove (comma-separated)
    #[arg(long)]
    pub remove_labels: Option<String>,

    /// Assignee to add
    #[arg(long)]
    pub add_assignee: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Issue state
    #[arg(short, long, value_enum, default_value_t = StateFilter::Open)]
    pub state: StateFilter,

    /// Maximum number of results (default: 30)
    #[arg(short = 'n', long)]
    pub limit: Option<u32>,
}

/// Output mode requested on a raw command line.
///
/// Used to render argument errors in the mode the caller asked for, since
/// clap has not produced a [`Cli`] at that point. `args` includes the program
/// name. Values of other options are skipped using the option definitions of
/// the subcommand, so `-co json` is read as `-c -o json` on `view` while
/// `--title -o` is not mistaken for the output flag.
pub fn requested_output_mode<I, S>(args: I) -> Option<OutputMode>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<String> = args
        .into_iter()
        .skip(1)
        .map(|a| a.as_ref().to_string())
        .collect();

    let mut root = Cli::command();
    root.build();
    let subcommand = args
        .iter()
        .filter(|a| !a.starts_with('-'))
        .find_map(|a| root.find_subcommand(a))
        .cloned();
    let scope = subcommand.as_ref().unwrap_or(&root);

    let mut mode = None;
    let mut tokens = args.iter();

    while let Some(arg) = tokens.next() {
        if arg == "--" {
            break;
        }

        let value = if let Some(long) = arg.strip_prefix("--") {
            match long.split_once('=') {
                Some(("output", v)) => Some(v.to_string()),
                Some(_) => None,
                None if long == "output" => tokens.next().cloned(),
                None => {
                    if takes_value(scope, |a| a.get_long() == Some(long)) {
                        tokens.next();
                    }
                    None
                }
            }
        } else if let Some(cluster) = arg.strip_prefix('-').filter(|c| !c.is_empty()) {
            short_cluster_value(scope, cluster, &mut tokens)
        } else {
            None
        };

        if let Some(parsed) = value.and_then(|v| OutputMode::from_str(&v, true).ok()) {
            mode = Some(parsed);
        }
    }

    mode
}

/// Walk `-abc` style flags; returns the `-o` value if the cluster holds one.
fn short_cluster_value<'a>(
    scope: &clap::Command,
    cluster: &str,
    rest: &mut impl Iterator<Item = &'a String>,
) -> Option<String> {
    for (i, c) in cluster.char_indices() {
        let attached = cluster[i + c.len_utf8()..].trim_start_matches('=');
        if c == 'o' {
            return if attached.is_empty() {
                rest.next().cloned()
            } else {
                Some(attached.to_string())
            };
        }
        if takes_value(scope, |a| a.get_short() == Some(c)) {
            if attached.is_empty() {
                rest.next();
            }
            return None;
        }
    }
    None
}

fn takes_value(scope: &clap::Command, matches: impl Fn(&clap::Arg) -> bool) -> bool {
    scope
        .get_arguments()
        .find(|a| matches(a))
        .is_some_and(|a| a.get_action().takes_values())
}
