mod entry;
mod issue;
mod project;
mod user;

pub use entry::{
    seconds_to_hours, NewTimesheetEntry, TimesheetEntry, SECONDS_PER_HOUR, STARTED_YEARS,
};
pub use issue::{is_valid_issue_key, Issue, IssueStatus, IssueType, StatusCategory};
pub use project::{is_valid_project_key, Project, ProjectRef};
pub use user::User;
