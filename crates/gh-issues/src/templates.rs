//! Issue type templates.
//!
//! A type tag expands into a title prefix, a set of default labels and a
//! markdown body skeleton. Placeholders in the skeleton (`{description}`,
//! `{steps}`, ...) are left for the caller to fill in; they are never
//! substituted here.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Issue type selecting a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Bug,
    Feature,
    Task,
    Phase,
    /// No transformation at all
    Custom,
}

/// Expansion rules for one issue type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub title_prefix: &'static str,
    pub labels: &'static [&'static str],
    pub body_skeleton: Option<&'static str>,
}

const BUG_BODY: &str = "## Priority
{priority}

## Description
{description}

## Steps to Reproduce
{steps}

## Current Behavior
{current_behavior}

## Expected Behavior
{expected_behavior}
";

const FEATURE_BODY: &str = "## Priority
{priority}

## Description
{description}

## Implementation
{implementation}

## Benefits
{benefits}
";

const TASK_BODY: &str = "## Priority
{priority}

## Description
{description}

## Implementation Steps
{implementation}

## Acceptance Criteria
{criteria}
";

impl IssueType {
    /// Template for this type; `None` for [`IssueType::Custom`].
    pub fn template(self) -> Option<Template> {
        match self {
            IssueType::Bug => Some(Template {
                title_prefix: "[Bug]",
                labels: &["bug"],
                body_skeleton: Some(BUG_BODY),
            }),
            IssueType::Feature => Some(Template {
                title_prefix: "[Feature]",
                labels: &["enhancement"],
                body_skeleton: Some(FEATURE_BODY),
            }),
            IssueType::Task => Some(Template {
                title_prefix: "[Task]",
                labels: &["task"],
                body_skeleton: Some(TASK_BODY),
            }),
            IssueType::Phase => Some(Template {
                title_prefix: "",
                labels: &[],
                body_skeleton: None,
            }),
            IssueType::Custom => None,
        }
    }
}

/// Title, labels and body after template expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expanded {
    pub title: String,
    pub labels: Vec<String>,
    pub body: String,
}

/// Apply the template for `issue_type` to caller-supplied values.
///
/// An absent type behaves like [`IssueType::Custom`]: everything passes
/// through untouched. Otherwise the title gets the prefix, labels become the
/// union of the caller's and the template's (caller's first, duplicates
/// dropped), and an empty body is replaced by the skeleton verbatim.
pub fn expand(
    issue_type: Option<IssueType>,
    title: &str,
    labels: Vec<String>,
    body: String,
) -> Expanded {
    let Some(template) = issue_type.and_then(IssueType::template) else {
        return Expanded {
            title: title.to_string(),
            labels,
            body,
        };
    };

    let title = format!("{} {}", template.title_prefix, title)
        .trim()
        .to_string();

    let mut merged: Vec<String> = Vec::new();
    let candidates = labels
        .iter()
        .map(String::as_str)
        .chain(template.labels.iter().copied());
    for label in candidates {
        let label = label.trim();
        if !label.is_empty() && !merged.iter().any(|l| l == label) {
            merged.push(label.to_string());
        }
    }

    let body = match template.body_skeleton {
        Some(skeleton) if body.is_empty() => skeleton.to_string(),
        _ => body,
    };

    Expanded {
        title,
        labels: merged,
        body,
    }
}

/// Split a comma-separated label option into trimmed, non-empty labels.
pub fn split_labels(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bug_prefixes_title_and_adds_label() {
        let out = expand(Some(IssueType::Bug), "Login fails", vec![], String::new());
        assert_eq!(out.title, "[Bug] Login fails");
        assert_eq!(out.labels, vec!["bug"]);
    }

    #[test]
    fn test_feature_uses_enhancement_label() {
        let out = expand(
            Some(IssueType::Feature),
            "Dark mode",
            vec!["ui".to_string()],
            String::new(),
        );
        assert_eq!(out.title, "[Feature] Dark mode");
        assert_eq!(out.labels, vec!["ui", "enhancement"]);
    }

    #[test]
    fn test_duplicate_labels_collapse() {
        let out = expand(
            Some(IssueType::Task),
            "Write docs",
            vec!["task".to_string(), " docs ".to_string(), "docs".to_string()],
            String::new(),
        );
        assert_eq!(out.labels, vec!["task", "docs"]);
    }

    #[test]
    fn test_custom_and_absent_pass_through() {
        let labels = vec![" keep me ".to_string()];
        for issue_type in [None, Some(IssueType::Custom)] {
            let out = expand(issue_type, "  Raw title ", labels.clone(), String::new());
            assert_eq!(out.title, "  Raw title ");
            assert_eq!(out.labels, labels);
            assert_eq!(out.body, "");
        }
    }

    #[test]
    fn test_phase_has_empty_prefix() {
        let out = expand(Some(IssueType::Phase), " Phase 2 ", vec![], String::new());
        assert_eq!(out.title, "Phase 2");
        assert!(out.labels.is_empty());
        assert_eq!(out.body, "");
    }

    #[test]
    fn test_skeleton_used_verbatim_only_when_body_empty() {
        let out = expand(Some(IssueType::Bug), "Crash", vec![], String::new());
        assert!(out.body.contains("## Steps to Reproduce\n{steps}"));

        let out = expand(Some(IssueType::Bug), "Crash", vec![], "Stack trace".to_string());
        assert_eq!(out.body, "Stack trace");
    }

    #[test]
    fn test_split_labels() {
        assert_eq!(split_labels(Some("bug, ui,,")), vec!["bug", "ui"]);
        assert!(split_labels(None).is_empty());
    }

    proptest! {
        #[test]
        fn prop_bug_title_is_prefixed_and_trimmed(title in "[a-zA-Z0-9 ]{0,40}") {
            let out = expand(Some(IssueType::Bug), &title, vec![], String::new());
            prop_assert_eq!(out.title, format!("[Bug] {}", title).trim().to_string());
            prop_assert!(out.labels.contains(&"bug".to_string()));
        }
    }
}
