//! Normalization of backend payloads into stable output records.
//!
//! The backend's JSON shape is its own business. This module picks the
//! fields the tool promises to expose, flattens nested structures
//! (`author.login` becomes `author`, label objects become a comma-joined
//! string) and drops everything else. Output records only change when this
//! module changes.

use crate::errors::IssueError;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ============================================================================
// Raw backend records
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUser {
    #[serde(default)]
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLabel {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    #[serde(default)]
    pub author: Option<RawUser>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Issue as returned by `issue list/view --json ...`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIssue {
    pub number: u64,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub labels: Vec<RawLabel>,
    #[serde(default)]
    pub author: Option<RawUser>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub comments: Vec<RawComment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRepository {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner: Option<RawUser>,
    #[serde(default)]
    pub url: Option<String>,
}

// ============================================================================
// Output records
// ============================================================================

/// Row of `list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct IssueSummary {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub labels: String,
    pub author: String,
    /// Creation date (YYYY-MM-DD)
    pub created: String,
}

/// Row of `search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct SearchHit {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub labels: String,
    /// Creation date (YYYY-MM-DD)
    pub created: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct CommentRecord {
    pub author: String,
    pub body: String,
}

/// Result of `view`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct IssueDetail {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub url: String,
    pub author: String,
    pub labels: String,
    /// Full ISO-8601 creation timestamp
    pub created: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<CommentRecord>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct LabelRecord {
    pub name: String,
    pub description: String,
}

/// Result of `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct StatusRecord {
    pub authenticated: bool,
    pub repository: Option<String>,
    pub url: Option<String>,
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a backend JSON document.
pub fn decode<T: DeserializeOwned>(stdout: &str) -> Result<T, IssueError> {
    serde_json::from_str(stdout).map_err(|e| {
        IssueError::backend("Failed to parse backend output", Some(e.to_string()))
    })
}

/// Decode a backend JSON array, treating empty output as an empty list.
pub fn decode_list<T: DeserializeOwned>(stdout: &str) -> Result<Vec<T>, IssueError> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    decode(stdout)
}

// ============================================================================
// Field helpers
// ============================================================================

fn login(user: &Option<RawUser>) -> String {
    user.as_ref().map(|u| u.login.clone()).unwrap_or_default()
}

fn join_labels(labels: &[RawLabel]) -> String {
    labels
        .iter()
        .map(|l| l.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn normalize_state(state: &str) -> String {
    state.to_lowercase()
}

/// First ten characters of an ISO-8601 timestamp, i.e. the date.
pub fn date_only(timestamp: &str) -> String {
    timestamp.chars().take(10).collect()
}

// ============================================================================
// Conversions
// ============================================================================

pub fn issue_summary(raw: &RawIssue) -> IssueSummary {
    IssueSummary {
        number: raw.number,
        title: raw.title.clone(),
        state: normalize_state(&raw.state),
        labels: join_labels(&raw.labels),
        author: login(&raw.author),
        created: date_only(raw.created_at.as_deref().unwrap_or_default()),
    }
}

pub fn search_hit(raw: &RawIssue) -> SearchHit {
    SearchHit {
        number: raw.number,
        title: raw.title.clone(),
        state: normalize_state(&raw.state),
        labels: join_labels(&raw.labels),
        created: date_only(raw.created_at.as_deref().unwrap_or_default()),
    }
}

/// Full issue; comments are only attached when they were requested.
pub fn issue_detail(raw: &RawIssue, include_comments: bool) -> IssueDetail {
    let comments = include_comments.then(|| {
        raw.comments
            .iter()
            .map(|c| CommentRecord {
                author: login(&c.author),
                body: c.body.clone().unwrap_or_default(),
            })
            .collect()
    });

    IssueDetail {
        number: raw.number,
        title: raw.title.clone(),
        state: normalize_state(&raw.state),
        url: raw.url.clone().unwrap_or_default(),
        author: login(&raw.author),
        labels: join_labels(&raw.labels),
        created: raw.created_at.clone().unwrap_or_default(),
        body: raw.body.clone().unwrap_or_default(),
        comments,
    }
}

pub fn label_record(raw: &RawLabel) -> LabelRecord {
    LabelRecord {
        name: raw.name.clone(),
        description: raw.description.clone().unwrap_or_default(),
    }
}

/// `owner/name` plus URL, or nothing if the repository lookup failed.
pub fn status_record(authenticated: bool, repo: Option<&RawRepository>) -> StatusRecord {
    match repo {
        Some(r) => StatusRecord {
            authenticated,
            repository: Some(format!("{}/{}", login(&r.owner), r.name)),
            url: Some(r.url.clone().unwrap_or_default()),
        },
        None => StatusRecord {
            authenticated,
            repository: None,
            url: None,
        },
    }
}

/// Issue number from the URL printed by `issue create`.
pub fn issue_number_from_url(url: &str) -> Option<u64> {
    url.trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}
