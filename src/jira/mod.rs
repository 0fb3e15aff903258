//! Raw Jira REST payloads and their conversion into canonical models.

mod convert;
mod raw;

pub use convert::{comment_text, parse_jira_datetime};
pub use raw::{
    JiraIssue, JiraIssueFields, JiraIssueType, JiraParent, JiraPriority, JiraProject, JiraStatus,
    JiraStatusCategory, JiraUser, JiraWorklog, JiraWorklogPage,
};
