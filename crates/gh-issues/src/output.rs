//! Dual-mode output rendering.
//!
//! Every command produces exactly one response: an output record, a list of
//! records, or an [`ErrorRecord`]. The [`Renderer`] prints it either as a
//! human-readable view (tables, `key: value` lines) or as one structured JSON
//! document for automated callers. The mode is picked per invocation and
//! applies to failures exactly as it does to successes.

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::{self, Write};

use crate::errors::IssueError;

/// Notice printed in human mode instead of an empty table.
pub const NO_RESULTS: &str = "No results.";

/// Output mode selected with `--output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Tables and `key: value` lines
    #[default]
    Human,
    /// A single JSON document
    #[value(alias = "json")]
    #[serde(alias = "json")]
    Structured,
}

// ============================================================================
// Exit Codes
// ============================================================================

/// Process exit codes.
///
/// Scripted callers can branch on these alone without parsing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command succeeded, or had nothing to change (0)
    Success = 0,
    /// Validation, body resolution, authentication or backend failure (1)
    Failure = 1,
}

impl ExitCode {
    /// Convert exit code to i32 for `std::process::exit`
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Command succeeded (including 'no changes specified')",
            ExitCode::Failure => {
                "Validation, body resolution, authentication or backend failure"
            }
        }
    }

    pub fn all() -> [ExitCode; 2] {
        [ExitCode::Success, ExitCode::Failure]
    }
}

// ============================================================================
// Response records
// ============================================================================

/// Failure response: `{"error": ..., "details": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ErrorRecord {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorRecord {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<&IssueError> for ErrorRecord {
    fn from(err: &IssueError) -> Self {
        Self {
            error: err.to_string(),
            details: err.details(),
        }
    }
}

/// Result of `create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct CreatedRecord {
    pub success: bool,
    /// `null` when the backend printed an unrecognized URL
    pub issue_number: Option<u64>,
    pub url: String,
}

/// Result of `close`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ClosedRecord {
    pub success: bool,
    pub issue_number: u64,
    pub reason: String,
}

/// Result of `reopen`, `comment` and `edit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ActionRecord {
    pub success: bool,
    pub issue_number: u64,
    pub action: String,
}

impl ActionRecord {
    pub fn new(issue_number: u64, action: impl Into<String>) -> Self {
        Self {
            success: true,
            issue_number,
            action: action.into(),
        }
    }
}

/// Result of a command that had nothing to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct NoticeRecord {
    pub success: bool,
    pub issue_number: u64,
    pub action: String,
    pub notice: String,
}

// ============================================================================
// Renderer
// ============================================================================

/// Writes responses in the selected mode.
pub struct Renderer<W: Write> {
    out: W,
    mode: OutputMode,
    color: bool,
}

impl<W: Write> Renderer<W> {
    /// Create a renderer without color.
    pub fn new(out: W, mode: OutputMode) -> Self {
        Self {
            out,
            mode,
            color: false,
        }
    }

    /// Enable terminal colors in human mode.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Render a single record, preceded in human mode by a success line.
    pub fn record<T: Serialize>(&mut self, record: &T, headline: Option<&str>) -> io::Result<()> {
        let value = to_value(record)?;
        match self.mode {
            OutputMode::Structured => self.json(&value),
            OutputMode::Human => {
                if let Some(headline) = headline {
                    let mark = self.paint("✓", |s| s.green().to_string());
                    writeln!(self.out, "{} {}", mark, headline)?;
                }
                self.human_record(&value)
            }
        }
    }

    /// Render a sequence of records.
    pub fn list<T: Serialize>(&mut self, items: &[T]) -> io::Result<()> {
        let values = items.iter().map(to_value).collect::<io::Result<Vec<_>>>()?;
        match self.mode {
            OutputMode::Structured => self.json(&Value::Array(values)),
            OutputMode::Human => self.human_table(&values),
        }
    }

    /// Render a success-with-notice response.
    ///
    /// Human mode prints only the notice; structured mode prints the record.
    pub fn notice<T: Serialize>(&mut self, record: &T, notice: &str) -> io::Result<()> {
        match self.mode {
            OutputMode::Structured => {
                let value = to_value(record)?;
                self.json(&value)
            }
            OutputMode::Human => {
                let text = self.paint(notice, |s| s.yellow().to_string());
                writeln!(self.out, "{}", text)
            }
        }
    }

    /// Render a failure.
    pub fn error(&mut self, record: &ErrorRecord) -> io::Result<()> {
        match self.mode {
            OutputMode::Structured => {
                let value = to_value(record)?;
                self.json(&value)
            }
            OutputMode::Human => {
                let key = self.paint("error", |s| s.red().bold().to_string());
                writeln!(self.out, "{}: {}", key, record.error)?;
                if let Some(details) = &record.details {
                    let key = self.paint("details", |s| s.bold().to_string());
                    writeln!(self.out, "{}: {}", key, details)?;
                }
                Ok(())
            }
        }
    }

    /// Render a document as JSON regardless of mode.
    pub fn document<T: Serialize>(&mut self, document: &T) -> io::Result<()> {
        let value = to_value(document)?;
        self.json(&value)
    }

    fn json(&mut self, value: &Value) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(self.out, "{}", text)
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> String) -> String {
        if self.color {
            style(text)
        } else {
            text.to_string()
        }
    }

    fn human_table(&mut self, rows: &[Value]) -> io::Result<()> {
        let Some(first) = rows.first() else {
            let text = self.paint(NO_RESULTS, |s| s.yellow().to_string());
            return writeln!(self.out, "{}", text);
        };

        // Columns come from the first row only.
        let keys: Vec<String> = first
            .as_object()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(keys.iter().map(|k| column_title(k)).collect::<Vec<_>>());

        for row in rows {
            let cells: Vec<String> = keys
                .iter()
                .map(|k| row.get(k).map(scalar_text).unwrap_or_default())
                .collect();
            table.add_row(cells);
        }

        writeln!(self.out, "{}", table)
    }

    fn human_record(&mut self, value: &Value) -> io::Result<()> {
        let Some(fields) = value.as_object() else {
            return writeln!(self.out, "{}", scalar_text(value));
        };

        for (key, field) in fields {
            let label = self.paint(key, |s| s.bold().to_string());
            if key == "body" {
                writeln!(self.out, "{}:", label)?;
                writeln!(self.out, "{}", scalar_text(field))?;
            } else if let Some(items) = nested_records(field) {
                writeln!(self.out, "{}:", label)?;
                self.human_nested(items)?;
            } else {
                writeln!(self.out, "{}: {}", label, scalar_text(field))?;
            }
        }
        Ok(())
    }

    /// Nested records (e.g. comments) as an indented block per item.
    fn human_nested(&mut self, items: Vec<&Map<String, Value>>) -> io::Result<()> {
        if items.is_empty() {
            return writeln!(self.out, "  (none)");
        }

        for item in items {
            for (i, (key, field)) in item.iter().enumerate() {
                let bullet = if i == 0 { "  - " } else { "    " };
                let text = scalar_text(field);
                if text.contains('\n') {
                    writeln!(self.out, "{}{}:", bullet, key)?;
                    for line in text.lines() {
                        writeln!(self.out, "      {}", line)?;
                    }
                } else {
                    writeln!(self.out, "{}{}: {}", bullet, key, text)?;
                }
            }
        }
        Ok(())
    }
}

fn to_value<T: Serialize>(record: &T) -> io::Result<Value> {
    serde_json::to_value(record).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Array whose elements are all objects, e.g. comments.
fn nested_records(value: &Value) -> Option<Vec<&Map<String, Value>>> {
    value.as_array()?.iter().map(Value::as_object).collect()
}

/// Plain text of a scalar field.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// `issue_number` -> `Issue Number`
fn column_title(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
