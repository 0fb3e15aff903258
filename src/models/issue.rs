use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{ProjectRef, User};
use crate::validation::{is_valid_url, Issues, Validate};

static ISSUE_KEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*-[1-9][0-9]*$").expect("invalid issue key regex"));

pub fn is_valid_issue_key(key: &str) -> bool {
    ISSUE_KEY_REGEX.is_match(key)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueType {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub subtask: bool,
}

/// Jira's coarse status buckets shared by every workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusCategory {
    New,
    Indeterminate,
    Done,
}

impl StatusCategory {
    /// Maps a Jira `statusCategory.key`; unknown keys count as in progress.
    pub fn from_jira_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "new" | "todo" | "to do" => StatusCategory::New,
            "done" => StatusCategory::Done,
            _ => StatusCategory::Indeterminate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCategory::New => "new",
            StatusCategory::Indeterminate => "indeterminate",
            StatusCategory::Done => "done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueStatus {
    pub id: String,
    pub name: String,
    pub category: StatusCategory,
}

/// Represents a Jira issue flattened into the fields the timesheet views need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub key: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IssueStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter: Option<User>,
    pub project: ProjectRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Issue {
    /// Copy without people and parent links, used when callers skip issue details.
    pub fn without_details(&self) -> Self {
        Self {
            assignee: None,
            reporter: None,
            parent_key: None,
            ..self.clone()
        }
    }
}

impl Validate for IssueType {
    fn check(&self, issues: &mut Issues) {
        issues.require_text("id", &self.id);
        issues.require_text("name", &self.name);
        if let Some(url) = &self.icon_url {
            issues.ensure(is_valid_url(url), "iconUrl", "must be an http(s) URL");
        }
    }
}

impl Validate for IssueStatus {
    fn check(&self, issues: &mut Issues) {
        issues.require_text("id", &self.id);
        issues.require_text("name", &self.name);
    }
}

impl Validate for Issue {
    fn check(&self, issues: &mut Issues) {
        issues.require_text("id", &self.id);
        issues.ensure(is_valid_issue_key(&self.key), "key", "must look like PROJ-123");
        issues.require_text("summary", &self.summary);
        if let Some(issue_type) = &self.issue_type {
            issues.nested("issueType", issue_type);
        }
        if let Some(status) = &self.status {
            issues.nested("status", status);
        }
        if let Some(assignee) = &self.assignee {
            issues.nested("assignee", assignee);
        }
        if let Some(reporter) = &self.reporter {
            issues.nested("reporter", reporter);
        }
        issues.nested("project", &self.project);
        if let Some(parent) = &self.parent_key {
            issues.ensure(is_valid_issue_key(parent), "parentKey", "must look like PROJ-123");
        }
        issues.ensure(
            self.updated >= self.created,
            "updated",
            "must not be earlier than created",
        );
    }
}
