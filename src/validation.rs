//! Schema checks, type guards and input sanitizers.
//!
//! Every payload type implements [`Validate`], which reports *all* failed
//! checks as [`FieldIssue`]s instead of stopping at the first one. Callers at
//! the boundary turn that list into a fatal [`ValidationError`] through
//! [`validate`] or [`parse`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::TimesheetsRequest;
use crate::error::{FieldIssue, ValidationError};
use crate::filter::FilterState;
use crate::grouping::GroupingConfig;
use crate::models::{Issue, Project, TimesheetEntry, User};

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex"));
static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[A-Za-z0-9](?:[A-Za-z0-9.-]*[A-Za-z0-9])?(?::\d{1,5})?(?:[/?#]\S*)?$")
        .expect("invalid url regex")
});
static FILE_NAME_FORBIDDEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).expect("invalid file name regex"));

pub const MAX_SEARCH_TEXT_CHARS: usize = 200;
pub const MAX_FILE_NAME_CHARS: usize = 200;
const FALLBACK_FILE_NAME: &str = "timesheet";

/// Accumulates issues while walking a payload, tracking the current field path.
#[derive(Debug, Default)]
pub struct Issues {
    prefix: String,
    items: Vec<FieldIssue>,
}

impl Issues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed check on `field`, relative to the current path.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        let path = self.path_for(field);
        self.items.push(FieldIssue::new(path, message));
    }

    /// Records a failure when `condition` does not hold.
    pub fn ensure(&mut self, condition: bool, field: &str, message: impl Into<String>) {
        if !condition {
            self.push(field, message);
        }
    }

    /// Checks that a string field carries something besides whitespace.
    pub fn require_text(&mut self, field: &str, value: &str) {
        self.ensure(!value.trim().is_empty(), field, "must not be empty");
    }

    /// Validates a nested value with `field` appended to the current path.
    pub fn nested<T: Validate + ?Sized>(&mut self, field: &str, value: &T) {
        let saved = std::mem::take(&mut self.prefix);
        self.prefix = join_path(&saved, field);
        value.check(self);
        self.prefix = saved;
    }

    /// Validates every element of a slice under `field[index]`.
    pub fn each<T: Validate>(&mut self, field: &str, values: &[T]) {
        for (index, value) in values.iter().enumerate() {
            self.nested(&format!("{field}[{index}]"), value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<FieldIssue> {
        self.items
    }

    fn path_for(&self, field: &str) -> String {
        let path = join_path(&self.prefix, field);
        if path.is_empty() {
            "$".to_string()
        } else {
            path
        }
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else if field.is_empty() {
        prefix.to_string()
    } else if field.starts_with('[') {
        format!("{prefix}{field}")
    } else {
        format!("{prefix}.{field}")
    }
}

/// Structural check implemented by every payload type.
pub trait Validate {
    /// Pushes every failed check into `issues`.
    fn check(&self, issues: &mut Issues);

    /// Returns the failed checks, empty when the value is well-formed.
    fn validation_issues(&self) -> Vec<FieldIssue> {
        let mut issues = Issues::new();
        self.check(&mut issues);
        issues.into_vec()
    }

    fn is_valid(&self) -> bool {
        self.validation_issues().is_empty()
    }
}

/// Passes `value` through when it is well-formed, otherwise fails with every issue found.
pub fn validate<T: Validate>(value: T) -> Result<T, ValidationError> {
    let issues = value.validation_issues();
    if issues.is_empty() {
        Ok(value)
    } else {
        Err(ValidationError::new(issues))
    }
}

/// Decodes a raw JSON payload and validates the result.
pub fn parse<T>(value: &Value) -> Result<T, ValidationError>
where
    T: DeserializeOwned + Validate,
{
    let decoded =
        T::deserialize(value).map_err(|err| ValidationError::single("$", err.to_string()))?;
    validate(decoded)
}

/// Decodes JSON text and validates the result.
pub fn parse_str<T>(text: &str) -> Result<T, ValidationError>
where
    T: DeserializeOwned + Validate,
{
    let value: Value =
        serde_json::from_str(text).map_err(|err| ValidationError::single("$", err.to_string()))?;
    parse(&value)
}

/// Type guard: true when `value` decodes into a well-formed `T`.
pub fn is_valid<T>(value: &Value) -> bool
where
    T: DeserializeOwned + Validate,
{
    parse::<T>(value).is_ok()
}

pub fn is_user(value: &Value) -> bool {
    is_valid::<User>(value)
}

pub fn is_project(value: &Value) -> bool {
    is_valid::<Project>(value)
}

pub fn is_issue(value: &Value) -> bool {
    is_valid::<Issue>(value)
}

pub fn is_timesheet_entry(value: &Value) -> bool {
    is_valid::<TimesheetEntry>(value)
}

pub fn is_filter_state(value: &Value) -> bool {
    is_valid::<FilterState>(value)
}

pub fn is_grouping_config(value: &Value) -> bool {
    is_valid::<GroupingConfig>(value)
}

pub fn is_timesheets_request(value: &Value) -> bool {
    is_valid::<TimesheetsRequest>(value)
}

/// Parses an ISO-8601 calendar date or an RFC 3339 timestamp into a UTC instant.
pub fn parse_date_string(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(NaiveDateTime::new(date, NaiveTime::MIN).and_utc());
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn is_valid_date_string(value: &str) -> bool {
    parse_date_string(value).is_some()
}

/// True when both bounds parse and `start` does not come after `end`.
pub fn is_valid_date_range(start: &str, end: &str) -> bool {
    match (parse_date_string(start), parse_date_string(end)) {
        (Some(start), Some(end)) => start <= end,
        _ => false,
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value.trim())
}

pub fn is_valid_url(value: &str) -> bool {
    URL_REGEX.is_match(value.trim())
}

/// Strips control characters and markup brackets, collapses whitespace and caps the length.
pub fn sanitize_search_text(value: &str) -> String {
    clean_search_text(value).chars().take(MAX_SEARCH_TEXT_CHARS).collect()
}

/// Search normalization without the length cap, applied to text being searched.
pub(crate) fn clean_search_text(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .filter(|ch| !matches!(ch, '<' | '>'))
        .collect();
    collapse_whitespace(&cleaned)
}

/// Produces a name safe to use as a file on common filesystems.
pub fn sanitize_file_name(value: &str) -> String {
    let replaced = FILE_NAME_FORBIDDEN.replace_all(value, "_");
    let joined = collapse_whitespace(&replaced).replace(' ', "_");
    let trimmed = joined.trim_matches(|ch: char| ch == '.' || ch == '_');
    let truncated: String = trimmed.chars().take(MAX_FILE_NAME_CHARS).collect();
    if truncated.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        truncated
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
