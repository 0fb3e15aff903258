//! Timesheet entry: one logged unit of work.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Issue, ProjectRef, User};
use crate::validation::{Issues, Validate};

pub const SECONDS_PER_HOUR: f64 = 3600.0;
const HOURS_TOLERANCE: f64 = 1e-6;
/// Calendar years accepted for `started`.
pub const STARTED_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

pub fn seconds_to_hours(seconds: u64) -> f64 {
    seconds as f64 / SECONDS_PER_HOUR
}

/// Represents an immutable snapshot of a Jira worklog, including issue, author, logged time
/// and sync identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetEntry {
    pub id: String,
    pub issue: Issue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    pub time_spent_seconds: u64,
    pub time_spent_hours: f64,
    pub started: NaiveDate,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub project: ProjectRef,
    pub worklog_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Inputs for [`TimesheetEntry::new`]; `time_spent_hours` is derived.
#[derive(Debug, Clone)]
pub struct NewTimesheetEntry {
    pub id: String,
    pub issue: Issue,
    pub author: Option<User>,
    pub time_spent_seconds: u64,
    pub started: NaiveDate,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub worklog_id: String,
    pub comment: Option<String>,
}

impl TimesheetEntry {
    /// Builds an entry whose hours and project are derived from seconds and issue.
    pub fn new(input: NewTimesheetEntry) -> Self {
        let project = input.issue.project.clone();
        Self {
            id: input.id,
            issue: input.issue,
            author: input.author,
            time_spent_hours: seconds_to_hours(input.time_spent_seconds),
            time_spent_seconds: input.time_spent_seconds,
            started: input.started,
            created: input.created,
            updated: input.updated,
            project,
            worklog_id: input.worklog_id,
            comment: input.comment,
        }
    }

    pub fn author_id(&self) -> Option<&str> {
        self.author
            .as_ref()
            .map(|author| author.account_id.as_str())
            .filter(|id| !id.trim().is_empty())
    }

    pub fn issue_type_id(&self) -> Option<&str> {
        self.issue.issue_type.as_ref().map(|t| t.id.as_str())
    }

    pub fn status_id(&self) -> Option<&str> {
        self.issue.status.as_ref().map(|s| s.id.as_str())
    }
}

impl Validate for TimesheetEntry {
    fn check(&self, issues: &mut Issues) {
        issues.require_text("id", &self.id);
        issues.nested("issue", &self.issue);
        if let Some(author) = &self.author {
            issues.nested("author", author);
        }
        issues.ensure(self.time_spent_seconds > 0, "timeSpentSeconds", "must be greater than zero");
        let expected = seconds_to_hours(self.time_spent_seconds);
        issues.ensure(
            self.time_spent_hours.is_finite()
                && (self.time_spent_hours - expected).abs() <= HOURS_TOLERANCE,
            "timeSpentHours",
            format!("must equal timeSpentSeconds / 3600 ({expected})"),
        );
        issues.ensure(
            STARTED_YEARS.contains(&self.started.year()),
            "started",
            format!(
                "must fall between years {} and {}",
                STARTED_YEARS.start(),
                STARTED_YEARS.end()
            ),
        );
        issues.ensure(
            self.updated >= self.created,
            "updated",
            "must not be earlier than created",
        );
        issues.nested("project", &self.project);
        issues.require_text("worklogId", &self.worklog_id);
    }
}
