//! Command schema export for automated callers.
//!
//! `gh-issues schema` prints this catalog so a caller (typically an LLM
//! driving the tool) can discover every command, its arguments and options,
//! an example invocation, and the shape of what comes back. The catalog is
//! hand-maintained; a test keeps it in step with the clap definitions.

use schemars::schema_for;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::normalize::{IssueDetail, IssueSummary, LabelRecord, SearchHit, StatusRecord};
use crate::output::{
    ActionRecord, ClosedRecord, CreatedRecord, ErrorRecord, ExitCode, NoticeRecord,
};

/// Complete command schema for the gh-issues CLI
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandSchema {
    pub name: String,
    pub description: String,
    pub usage: String,
    /// CLI version
    pub version: String,
    /// Available commands mapped by name
    pub commands: BTreeMap<String, Command>,
    /// JSON Schema of every output record, keyed by type name
    pub types: BTreeMap<String, Value>,
    /// Exit code documentation
    pub exit_codes: Vec<ExitCodeDoc>,
}

/// Command definition
#[derive(Debug, Serialize, Deserialize)]
pub struct Command {
    pub description: String,
    /// Positional arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Argument>,
    /// Named options
    #[serde(default)]
    pub options: Vec<Flag>,
    /// One example invocation
    pub example: String,
    /// Output schema reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputSchema>,
}

/// Positional argument definition
#[derive(Debug, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    /// Argument type (string, number)
    #[serde(rename = "type")]
    pub arg_type: String,
    pub required: bool,
    pub description: String,
}

/// Option definition
#[derive(Debug, Serialize, Deserialize)]
pub struct Flag {
    /// Option name (without --)
    pub name: String,
    /// Short form (without -)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    /// Option type (string, number, boolean, path, enum)
    #[serde(rename = "type")]
    pub flag_type: String,
    /// Accepted values for enum options
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub description: String,
}

/// Output schema
#[derive(Debug, Serialize, Deserialize)]
pub struct OutputSchema {
    /// Success output type reference
    pub success: String,
    /// Error output type reference
    pub error: String,
}

/// Exit code documentation
#[derive(Debug, Serialize, Deserialize)]
pub struct ExitCodeDoc {
    pub code: i32,
    pub description: String,
}

fn arg(name: &str, arg_type: &str, description: &str) -> Argument {
    Argument {
        name: name.to_string(),
        arg_type: arg_type.to_string(),
        required: true,
        description: description.to_string(),
    }
}

fn flag(name: &str, short: Option<char>, flag_type: &str, description: &str) -> Flag {
    Flag {
        name: name.to_string(),
        short: short.map(String::from),
        flag_type: flag_type.to_string(),
        values: Vec::new(),
        default: None,
        description: description.to_string(),
    }
}

fn enum_flag(
    name: &str,
    short: Option<char>,
    values: &[&str],
    default: Option<&str>,
    description: &str,
) -> Flag {
    Flag {
        values: values.iter().map(|v| v.to_string()).collect(),
        default: default.map(str::to_string),
        ..flag(name, short, "enum", description)
    }
}

fn output_flag() -> Flag {
    enum_flag(
        "output",
        Some('o'),
        &["human", "structured"],
        Some("human"),
        "Output format ('json' is accepted for structured)",
    )
}

fn state_flag() -> Flag {
    enum_flag(
        "state",
        Some('s'),
        &["open", "closed", "all"],
        Some("open"),
        "Issue state",
    )
}

fn body_flags() -> Vec<Flag> {
    vec![
        flag("body", Some('b'), "string", "Body text (markdown)"),
        flag("body-file", Some('f'), "path", "Read body from file (preserves backticks)"),
        flag("stdin", None, "boolean", "Read body from standard input"),
    ]
}

fn returns(success: &str) -> Option<OutputSchema> {
    Some(OutputSchema {
        success: success.to_string(),
        error: "ErrorRecord".to_string(),
    })
}

fn issue_number_arg() -> Argument {
    arg("ISSUE_NUMBER", "number", "Issue number")
}

impl CommandSchema {
    /// Generate the complete command schema
    pub fn generate() -> Self {
        let mut commands = BTreeMap::new();

        commands.insert(
            "list".to_string(),
            Command {
                description: "List issues from the repository".to_string(),
                args: vec![],
                options: vec![
                    state_flag(),
                    flag("labels", Some('l'), "string", "Filter by labels (comma-separated)"),
                    flag("assignee", Some('a'), "string", "Filter by assignee"),
                    flag("limit", Some('n'), "number", "Maximum results (default: 30)"),
                    output_flag(),
                ],
                example: "gh-issues list --state open --output structured".to_string(),
                output: returns("IssueSummary[]"),
            },
        );

        commands.insert(
            "view".to_string(),
            Command {
                description: "View issue details".to_string(),
                args: vec![issue_number_arg()],
                options: vec![
                    flag("comments", Some('c'), "boolean", "Include comments"),
                    output_flag(),
                ],
                example: "gh-issues view 42 --comments --output structured".to_string(),
                output: returns("IssueDetail"),
            },
        );

        let mut create_options = vec![flag("title", Some('t'), "string", "Issue title (required)")];
        create_options.extend(body_flags());
        create_options.extend([
            enum_flag(
                "type",
                None,
                &["bug", "feature", "task", "phase", "custom"],
                None,
                "Template: adds a title prefix, default labels and a body skeleton",
            ),
            flag("labels", Some('l'), "string", "Labels (comma-separated)"),
            flag("assignee", Some('a'), "string", "Assignee login"),
            output_flag(),
        ]);
        commands.insert(
            "create".to_string(),
            Command {
                description: "Create a new issue".to_string(),
                args: vec![],
                options: create_options,
                example: "gh-issues create --title 'Fix bug' --body-file body.md -o structured"
                    .to_string(),
                output: returns("CreatedRecord"),
            },
        );

        commands.insert(
            "close".to_string(),
            Command {
                description: "Close an issue, optionally commenting first".to_string(),
                args: vec![issue_number_arg()],
                options: vec![
                    flag("comment", Some('c'), "string", "Closing comment"),
                    enum_flag(
                        "reason",
                        Some('r'),
                        &["completed", "not_planned"],
                        Some("completed"),
                        "Close reason",
                    ),
                    output_flag(),
                ],
                example: "gh-issues close 42 --comment 'Fixed' --output structured".to_string(),
                output: returns("ClosedRecord"),
            },
        );

        commands.insert(
            "reopen".to_string(),
            Command {
                description: "Reopen a closed issue, optionally commenting first".to_string(),
                args: vec![issue_number_arg()],
                options: vec![
                    flag("comment", Some('c'), "string", "Reopening comment"),
                    output_flag(),
                ],
                example: "gh-issues reopen 42 --comment 'Regressed' --output structured"
                    .to_string(),
                output: returns("ActionRecord"),
            },
        );

        let mut comment_options = body_flags();
        comment_options.push(output_flag());
        commands.insert(
            "comment".to_string(),
            Command {
                description: "Add a comment to an issue (stdin > body-file > body)".to_string(),
                args: vec![issue_number_arg()],
                options: comment_options,
                example: "gh-issues comment 42 --body-file comment.md --output structured"
                    .to_string(),
                output: returns("ActionRecord"),
            },
        );

        let mut edit_options = vec![flag("title", Some('t'), "string", "New title")];
        edit_options.extend(body_flags());
        edit_options.extend([
            flag("add-labels", None, "string", "Labels to add (comma-separated)"),
            flag("remove-labels", None, "string", "Labels to remove (comma-separated)"),
            flag("add-assignee", None, "string", "Assignee to add"),
            output_flag(),
        ]);
        commands.insert(
            "edit".to_string(),
            Command {
                description: "Edit an issue; with no changes prints a notice and exits 0"
                    .to_string(),
                args: vec![issue_number_arg()],
                options: edit_options,
                example: "gh-issues edit 42 --body-file body.md --output structured".to_string(),
                output: returns("ActionRecord | NoticeRecord"),
            },
        );

        commands.insert(
            "search".to_string(),
            Command {
                description: "Search issues by text".to_string(),
                args: vec![arg("QUERY", "string", "Search query")],
                options: vec![
                    state_flag(),
                    flag("limit", Some('n'), "number", "Maximum results (default: 30)"),
                    output_flag(),
                ],
                example: "gh-issues search 'multiplayer' --output structured".to_string(),
                output: returns("SearchHit[]"),
            },
        );

        commands.insert(
            "labels".to_string(),
            Command {
                description: "List repository labels".to_string(),
                args: vec![],
                options: vec![output_flag()],
                example: "gh-issues labels --output structured".to_string(),
                output: returns("LabelRecord[]"),
            },
        );

        commands.insert(
            "status".to_string(),
            Command {
                description: "Show authentication and repository status".to_string(),
                args: vec![],
                options: vec![output_flag()],
                example: "gh-issues status --output structured".to_string(),
                output: returns("StatusRecord"),
            },
        );

        commands.insert(
            "schema".to_string(),
            Command {
                description: "Output this command catalog as JSON".to_string(),
                args: vec![],
                options: vec![],
                example: "gh-issues schema".to_string(),
                output: None,
            },
        );

        CommandSchema {
            name: "gh-issues".to_string(),
            description: "GitHub Issues CLI for automated callers. Use --output structured \
                          for machine-readable output."
                .to_string(),
            usage: "gh-issues <command> [options]".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            commands,
            types: Self::generate_types(),
            exit_codes: Self::generate_exit_codes(),
        }
    }

    fn generate_types() -> BTreeMap<String, Value> {
        let schemas = [
            ("IssueSummary", schema_for!(IssueSummary)),
            ("SearchHit", schema_for!(SearchHit)),
            ("IssueDetail", schema_for!(IssueDetail)),
            ("LabelRecord", schema_for!(LabelRecord)),
            ("StatusRecord", schema_for!(StatusRecord)),
            ("CreatedRecord", schema_for!(CreatedRecord)),
            ("ClosedRecord", schema_for!(ClosedRecord)),
            ("ActionRecord", schema_for!(ActionRecord)),
            ("NoticeRecord", schema_for!(NoticeRecord)),
            ("ErrorRecord", schema_for!(ErrorRecord)),
        ];

        schemas
            .into_iter()
            .map(|(name, schema)| {
                let value = serde_json::to_value(schema).unwrap_or(Value::Null);
                (name.to_string(), value)
            })
            .collect()
    }

    fn generate_exit_codes() -> Vec<ExitCodeDoc> {
        ExitCode::all()
            .into_iter()
            .map(|code| ExitCodeDoc {
                code: code.code(),
                description: code.description().to_string(),
            })
            .collect()
    }
}
