//! Typed data model, validation and grouping engine for Jira timesheet reports.

pub mod api;
pub mod config;
pub mod error;
pub mod filter;
pub mod grouping;
pub mod jira;
pub mod models;
pub mod time_spent;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use api::{
    ApiErrorBody, ApiResponse, ErrorCode, Pagination, TimesheetsRequest, TimesheetsResponse,
};
pub use config::{Settings, SettingsManager};
pub use error::{Error, FieldIssue, Result, ValidationError};
pub use filter::{DateRange, DateRangeType, FilterState, SearchFilter};
pub use grouping::{
    build_group_tree, DateGrouping, DimensionKind, GroupDimension, GroupMetadata, GroupNode,
    GroupTotals, GroupTree, GroupingConfig, GroupingLevel, SortBy, SortOrder,
};
pub use jira::{JiraIssue, JiraProject, JiraUser, JiraWorklog};
pub use models::{
    Issue, IssueStatus, IssueType, Project, ProjectRef, StatusCategory, TimesheetEntry, User,
};
pub use time_spent::{format_hours_as_jira_time, parse_jira_time_spent, WorkCalendar};
pub use validation::{parse, validate, Validate};
