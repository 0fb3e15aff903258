use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use super::raw::{JiraIssue, JiraProject, JiraStatus, JiraUser, JiraWorklog};
use crate::error::ValidationError;
use crate::models::{
    seconds_to_hours, Issue, IssueStatus, IssueType, NewTimesheetEntry, Project, StatusCategory,
    TimesheetEntry, User, STARTED_YEARS,
};
use crate::time_spent::WorkCalendar;
use crate::validation::Issues;

const PREFERRED_AVATAR_SIZE: &str = "48x48";

/// Parses Jira timestamps: RFC 3339 or the `2024-01-15T09:00:00.000+0000` form.
pub fn parse_jira_datetime(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .ok()
        .or_else(|| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z").ok())
}

fn pick_avatar(avatars: &BTreeMap<String, String>) -> Option<String> {
    avatars
        .get(PREFERRED_AVATAR_SIZE)
        .or_else(|| avatars.values().next())
        .cloned()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

impl From<JiraUser> for User {
    fn from(raw: JiraUser) -> Self {
        Self {
            avatar_url: pick_avatar(&raw.avatar_urls),
            account_id: raw.account_id,
            display_name: raw.display_name.trim().to_string(),
            email_address: non_empty(raw.email_address),
            active: raw.active,
            time_zone: non_empty(raw.time_zone),
        }
    }
}

impl From<JiraProject> for Project {
    fn from(raw: JiraProject) -> Self {
        Self {
            avatar_url: pick_avatar(&raw.avatar_urls),
            name: if raw.name.trim().is_empty() {
                raw.key.clone()
            } else {
                raw.name
            },
            id: raw.id,
            key: raw.key,
            project_type_key: non_empty(raw.project_type_key),
            lead: raw.lead.map(User::from),
        }
    }
}

impl From<JiraStatus> for IssueStatus {
    fn from(raw: JiraStatus) -> Self {
        let category = raw
            .status_category
            .as_ref()
            .map(|category| StatusCategory::from_jira_key(&category.key))
            .unwrap_or(StatusCategory::Indeterminate);
        Self {
            id: raw.id,
            name: raw.name,
            category,
        }
    }
}

fn require_datetime(
    issues: &mut Issues,
    field: &str,
    value: &str,
) -> Option<DateTime<FixedOffset>> {
    let parsed = parse_jira_datetime(value);
    if parsed.is_none() {
        issues.push(field, format!("must be a Jira timestamp, got {value:?}"));
    }
    parsed
}

impl TryFrom<JiraIssue> for Issue {
    type Error = ValidationError;

    fn try_from(raw: JiraIssue) -> Result<Self, Self::Error> {
        let mut issues = Issues::new();
        let created = require_datetime(&mut issues, "fields.created", &raw.fields.created);
        let updated = require_datetime(&mut issues, "fields.updated", &raw.fields.updated);
        let (Some(created), Some(updated)) = (created, updated) else {
            return Err(ValidationError::new(issues.into_vec()));
        };

        let fields = raw.fields;
        let project = Project::from(fields.project).to_ref();
        Ok(Self {
            id: raw.id,
            key: raw.key,
            summary: fields.summary.trim().to_string(),
            issue_type: fields.issue_type.map(|issue_type| IssueType {
                id: issue_type.id,
                name: issue_type.name,
                icon_url: non_empty(issue_type.icon_url),
                subtask: issue_type.subtask,
            }),
            status: fields.status.map(IssueStatus::from),
            priority: non_empty(fields.priority.and_then(|priority| priority.name)),
            assignee: fields.assignee.map(User::from),
            reporter: fields.reporter.map(User::from),
            project,
            parent_key: fields.parent.map(|parent| parent.key),
            created: created.with_timezone(&Utc),
            updated: updated.with_timezone(&Utc),
        })
    }
}

/// Flattens a worklog comment into plain text.
///
/// Plain strings are trimmed. Document trees contribute their `text` nodes;
/// block nodes and hard breaks become line breaks.
pub fn comment_text(comment: &Value) -> Option<String> {
    let mut buffer = String::new();
    collect_text(comment, &mut buffer);
    let text = buffer
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (!text.is_empty()).then_some(text)
}

fn collect_text(node: &Value, buffer: &mut String) {
    match node {
        Value::String(text) => buffer.push_str(text),
        Value::Array(items) => items.iter().for_each(|item| collect_text(item, buffer)),
        Value::Object(map) => {
            let kind = map.get("type").and_then(Value::as_str).unwrap_or_default();
            match kind {
                "text" => {
                    if let Some(text) = map.get("text").and_then(Value::as_str) {
                        buffer.push_str(text);
                    }
                }
                "hardBreak" => buffer.push('\n'),
                "mention" | "emoji" => {
                    if let Some(text) = map
                        .get("attrs")
                        .and_then(|attrs| attrs.get("text"))
                        .and_then(Value::as_str)
                    {
                        buffer.push_str(text);
                    }
                }
                _ => {}
            }
            if let Some(content) = map.get("content") {
                if kind != "doc" && !buffer.is_empty() && !buffer.ends_with('\n') {
                    buffer.push('\n');
                }
                collect_text(content, buffer);
            }
        }
        Value::Number(_) | Value::Bool(_) | Value::Null => {}
    }
}

impl TimesheetEntry {
    /// Builds an entry from a worklog and the issue it was logged against.
    ///
    /// The entry id is `{issueKey}-{worklogId}`. Duration comes from
    /// `timeSpentSeconds`, falling back to parsing `timeSpent` with `calendar`.
    /// The started date is taken in the worklog's own offset.
    pub fn from_jira(
        worklog: JiraWorklog,
        issue: &Issue,
        calendar: &WorkCalendar,
    ) -> Result<Self, ValidationError> {
        let mut issues = Issues::new();

        let seconds = match (worklog.time_spent_seconds, worklog.time_spent.as_deref()) {
            (Some(seconds), _) => u64::try_from(seconds).ok(),
            (None, Some(text)) => calendar.parse_seconds(text),
            (None, None) => None,
        };
        let seconds = seconds.filter(|seconds| *seconds > 0);
        if seconds.is_none() {
            issues.push("timeSpentSeconds", "must be a positive duration");
        }
        let started = require_datetime(&mut issues, "started", &worklog.started)
            .filter(|started| {
                let supported = STARTED_YEARS.contains(&started.year());
                issues.ensure(supported, "started", "must fall between years 1 and 9999");
                supported
            });
        let created = require_datetime(&mut issues, "created", &worklog.created);
        let updated = require_datetime(&mut issues, "updated", &worklog.updated);

        if let Some(issue_id) = worklog.issue_id.as_deref() {
            issues.ensure(
                issue_id == issue.id,
                "issueId",
                format!("does not match issue {}", issue.id),
            );
        }

        let (Some(seconds), Some(started), Some(created), Some(updated), true) =
            (seconds, started, created, updated, issues.is_empty())
        else {
            let error = ValidationError::new(issues.into_vec());
            warn!(
                worklog = %worklog.id,
                issue = %issue.key,
                "skipping worklog: {}",
                error.message()
            );
            return Err(error);
        };

        let entry = TimesheetEntry::new(NewTimesheetEntry {
            id: format!("{}-{}", issue.key, worklog.id),
            issue: issue.clone(),
            author: worklog.author.map(User::from),
            time_spent_seconds: seconds,
            started: started.date_naive(),
            created: created.with_timezone(&Utc),
            updated: updated.with_timezone(&Utc),
            worklog_id: worklog.id,
            comment: worklog.comment.as_ref().and_then(comment_text),
        });
        debug!(
            entry = %entry.id,
            hours = seconds_to_hours(seconds),
            "converted worklog"
        );
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jira::JiraWorklogPage;
    use crate::models::ProjectRef;
    use crate::validation::Validate;
    use chrono::NaiveDate;
    use serde_json::json;

    fn raw_issue() -> JiraIssue {
        serde_json::from_value(json!({
            "id": "10001",
            "key": "ABC-1",
            "fields": {
                "summary": "  Write docs ",
                "issuetype": {
                    "id": "1",
                    "name": "Task",
                    "iconUrl": "https://jira.example.com/task.png"
                },
                "status": {"id": "3", "name": "Done", "statusCategory": {"key": "done"}},
                "priority": {"id": "2", "name": "High"},
                "assignee": {
                    "accountId": "u2",
                    "displayName": "Grace",
                    "avatarUrls": {"16x16": "https://a/16.png", "48x48": "https://a/48.png"}
                },
                "project": {"id": 100, "key": "ABC", "name": "Alpha"},
                "created": "2024-01-01T09:00:00.000+0000",
                "updated": "2024-01-02T09:00:00Z"
            }
        }))
        .expect("fixture decodes")
    }

    fn raw_worklog(extra: Value) -> JiraWorklog {
        let mut value = json!({
            "id": "9001",
            "issueId": "10001",
            "author": {"accountId": "u1", "displayName": "Ada"},
            "started": "2024-01-15T23:30:00.000-0500",
            "timeSpentSeconds": 5400,
            "created": "2024-01-16T05:00:00.000+0000",
            "updated": "2024-01-16T05:00:00.000+0000"
        });
        if let (Some(target), Value::Object(extra)) = (value.as_object_mut(), extra) {
            target.extend(extra);
        }
        serde_json::from_value(value).expect("fixture decodes")
    }

    #[test]
    fn parses_both_timestamp_forms() {
        let jira = parse_jira_datetime("2024-01-15T09:00:00.000+0000").expect("jira form");
        let rfc = parse_jira_datetime("2024-01-15T09:00:00Z").expect("rfc3339");
        assert_eq!(jira, rfc);
        assert!(parse_jira_datetime("15/01/2024").is_none());
    }

    #[test]
    fn issue_flattens_fields() {
        let issue = Issue::try_from(raw_issue()).expect("converts");
        assert_eq!(issue.summary, "Write docs");
        assert_eq!(issue.project, ProjectRef::new("100", "ABC", "Alpha"));
        assert_eq!(issue.status.as_ref().map(|s| s.category), Some(StatusCategory::Done));
        assert_eq!(issue.priority.as_deref(), Some("High"));
        let assignee = issue.assignee.as_ref().expect("assignee");
        assert_eq!(assignee.avatar_url.as_deref(), Some("https://a/48.png"));
        assert!(issue.is_valid(), "{:?}", issue.validation_issues());
    }

    #[test]
    fn issue_with_bad_timestamp_is_rejected() {
        let mut raw = raw_issue();
        raw.fields.updated = "yesterday".to_string();
        let err = Issue::try_from(raw).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].path, "fields.updated");
    }

    #[test]
    fn worklog_becomes_entry() {
        let issue = Issue::try_from(raw_issue()).expect("issue");
        let calendar = WorkCalendar::default();
        let entry =
            TimesheetEntry::from_jira(raw_worklog(json!({})), &issue, &calendar).expect("entry");
        assert_eq!(entry.id, "ABC-1-9001");
        assert_eq!(entry.worklog_id, "9001");
        assert_eq!(entry.time_spent_seconds, 5400);
        assert!((entry.time_spent_hours - 1.5).abs() < 1e-9);
        assert_eq!(entry.started, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(entry.project.id, "100");
        assert_eq!(entry.author_id(), Some("u1"));
        assert!(entry.is_valid(), "{:?}", entry.validation_issues());
    }

    #[test]
    fn duration_falls_back_to_time_spent_text() {
        let issue = Issue::try_from(raw_issue()).expect("issue");
        let mut worklog = raw_worklog(json!({"timeSpent": "1d 2h"}));
        worklog.time_spent_seconds = None;
        let entry = TimesheetEntry::from_jira(worklog.clone(), &issue, &WorkCalendar::default())
            .expect("entry");
        assert_eq!(entry.time_spent_seconds, 10 * 3600);

        let short_days = WorkCalendar::new(6, 5);
        let entry = TimesheetEntry::from_jira(worklog, &issue, &short_days).expect("entry");
        assert_eq!(entry.time_spent_seconds, 8 * 3600);
    }

    #[test]
    fn non_positive_or_unparseable_worklogs_fail() {
        let issue = Issue::try_from(raw_issue()).expect("issue");
        let calendar = WorkCalendar::default();

        let zero = raw_worklog(json!({"timeSpentSeconds": 0}));
        let err = TimesheetEntry::from_jira(zero, &issue, &calendar).unwrap_err();
        assert_eq!(err.issues[0].path, "timeSpentSeconds");

        let broken = raw_worklog(json!({
            "timeSpentSeconds": -60,
            "started": "soon",
            "issueId": "1"
        }));
        let err = TimesheetEntry::from_jira(broken, &issue, &calendar).unwrap_err();
        let paths: Vec<&str> = err.issues.iter().map(|issue| issue.path.as_str()).collect();
        assert_eq!(paths, vec!["timeSpentSeconds", "started", "issueId"]);

        let foreign = raw_worklog(json!({"issueId": "777"}));
        let err = TimesheetEntry::from_jira(foreign, &issue, &calendar).unwrap_err();
        assert_eq!(err.issues[0].path, "issueId");

        let ancient = raw_worklog(json!({"started": "0000-06-01T09:00:00.000+0000"}));
        let err = TimesheetEntry::from_jira(ancient, &issue, &calendar).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].path, "started");
    }

    #[test]
    fn document_comments_flatten_to_text() {
        let doc = json!({
            "type": "doc",
            "version": 1,
            "content": [
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "Reviewed "},
                    {"type": "mention", "attrs": {"id": "u2", "text": "@Grace"}},
                    {"type": "text", "text": "  PR"}
                ]},
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "Fixed tests"},
                    {"type": "hardBreak"},
                    {"type": "text", "text": "and docs"}
                ]}
            ]
        });
        assert_eq!(
            comment_text(&doc).as_deref(),
            Some("Reviewed @Grace PR\nFixed tests\nand docs")
        );
        assert_eq!(comment_text(&json!("  plain  ")).as_deref(), Some("plain"));
        assert_eq!(comment_text(&json!({"type": "doc", "content": []})), None);
        assert_eq!(comment_text(&Value::Null), None);
    }

    #[test]
    fn worklog_page_decodes() {
        let page: JiraWorklogPage = serde_json::from_value(json!({
            "startAt": 0,
            "maxResults": 20,
            "total": 1,
            "worklogs": [{
                "id": 1,
                "started": "2024-01-15T09:00:00.000+0000",
                "timeSpent": "30m",
                "created": "2024-01-15T09:00:00.000+0000",
                "updated": "2024-01-15T09:00:00.000+0000"
            }]
        }))
        .expect("page decodes");
        assert_eq!(page.total, 1);
        assert_eq!(page.worklogs[0].time_spent.as_deref(), Some("30m"));
    }
}
