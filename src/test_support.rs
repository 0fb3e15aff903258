//! Fixture builders shared by unit tests.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::models::{
    Issue, IssueStatus, IssueType, NewTimesheetEntry, ProjectRef, StatusCategory, TimesheetEntry,
    User,
};

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
}

pub(crate) fn stamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

pub(crate) struct EntryFixture {
    id: String,
    project: ProjectRef,
    issue_id: String,
    issue_key: String,
    summary: String,
    issue_type: Option<IssueType>,
    status: Option<IssueStatus>,
    author: Option<User>,
    seconds: u64,
    started: NaiveDate,
    comment: Option<String>,
}

/// Entry in project ABC, issue ABC-1, author `u1`, one hour on 2024-01-15.
pub(crate) fn entry(id: &str) -> EntryFixture {
    EntryFixture {
        id: id.to_string(),
        project: ProjectRef::new("100", "ABC", "Alpha"),
        issue_id: "10001".to_string(),
        issue_key: "ABC-1".to_string(),
        summary: "Write docs".to_string(),
        issue_type: None,
        status: None,
        author: Some(User::new("u1", "Ada")),
        seconds: 3600,
        started: date(2024, 1, 15),
        comment: None,
    }
}

impl EntryFixture {
    pub(crate) fn project(mut self, id: &str, key: &str, name: &str) -> Self {
        self.project = ProjectRef::new(id, key, name);
        self
    }

    pub(crate) fn issue(mut self, id: &str, key: &str, summary: &str) -> Self {
        self.issue_id = id.to_string();
        self.issue_key = key.to_string();
        self.summary = summary.to_string();
        self
    }

    pub(crate) fn issue_type(mut self, id: &str, name: &str) -> Self {
        self.issue_type = Some(IssueType {
            id: id.to_string(),
            name: name.to_string(),
            icon_url: None,
            subtask: false,
        });
        self
    }

    pub(crate) fn status(mut self, id: &str, name: &str, category: StatusCategory) -> Self {
        self.status = Some(IssueStatus {
            id: id.to_string(),
            name: name.to_string(),
            category,
        });
        self
    }

    pub(crate) fn author(mut self, account_id: &str, name: &str) -> Self {
        self.author = Some(User::new(account_id, name));
        self
    }

    pub(crate) fn no_author(mut self) -> Self {
        self.author = None;
        self
    }

    pub(crate) fn hours(mut self, hours: f64) -> Self {
        self.seconds = (hours * 3600.0).round() as u64;
        self
    }

    pub(crate) fn started(mut self, year: i32, month: u32, day: u32) -> Self {
        self.started = date(year, month, day);
        self
    }

    pub(crate) fn comment(mut self, text: &str) -> Self {
        self.comment = Some(text.to_string());
        self
    }

    pub(crate) fn build(self) -> TimesheetEntry {
        TimesheetEntry::new(NewTimesheetEntry {
            id: self.id.clone(),
            issue: Issue {
                id: self.issue_id,
                key: self.issue_key,
                summary: self.summary,
                issue_type: self.issue_type,
                status: self.status,
                priority: None,
                assignee: None,
                reporter: None,
                project: self.project,
                parent_key: None,
                created: stamp(),
                updated: stamp(),
            },
            author: self.author,
            time_spent_seconds: self.seconds,
            started: self.started,
            created: stamp(),
            updated: stamp(),
            worklog_id: self.id,
            comment: self.comment,
        })
    }
}
