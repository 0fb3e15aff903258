//! Filter predicate applied to entries before grouping.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::TimesheetEntry;
use crate::validation::{
    clean_search_text, sanitize_search_text, Issues, Validate, MAX_SEARCH_TEXT_CHARS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateRangeType {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    #[default]
    ThisMonth,
    LastMonth,
    ThisQuarter,
    ThisYear,
    Custom,
}

/// Inclusive date bounds; a missing side is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilter {
    pub text: String,
    pub in_summary: bool,
    pub in_issue_key: bool,
    pub in_comment: bool,
    pub in_author: bool,
    pub case_sensitive: bool,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            text: String::new(),
            in_summary: true,
            in_issue_key: true,
            in_comment: false,
            in_author: false,
            case_sensitive: false,
        }
    }
}

impl SearchFilter {
    fn has_target(&self) -> bool {
        self.in_summary || self.in_issue_key || self.in_comment || self.in_author
    }

    /// True when the sanitized text occurs in any enabled target, each target being
    /// normalized the same way. Empty text matches everything.
    pub fn matches(&self, entry: &TimesheetEntry) -> bool {
        let needle = sanitize_search_text(&self.text);
        if needle.is_empty() {
            return true;
        }
        let needle = if self.case_sensitive {
            needle
        } else {
            needle.to_lowercase()
        };
        let contains = |haystack: &str| {
            let haystack = clean_search_text(haystack);
            if self.case_sensitive {
                haystack.contains(&needle)
            } else {
                haystack.to_lowercase().contains(&needle)
            }
        };

        (self.in_summary && contains(&entry.issue.summary))
            || (self.in_issue_key && contains(&entry.issue.key))
            || (self.in_comment && entry.comment.as_deref().is_some_and(contains))
            || (self.in_author
                && entry.author.as_ref().is_some_and(|author| contains(author.label())))
    }
}

/// Represents the predicate chosen in the UI: date window, id sets, text search and hour bounds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    pub date_range: DateRange,
    pub date_range_type: DateRangeType,
    pub project_ids: Vec<String>,
    pub user_ids: Vec<String>,
    pub issue_type_ids: Vec<String>,
    pub status_ids: Vec<String>,
    pub search: SearchFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hours: Option<f64>,
}

impl FilterState {
    /// Filter covering an explicit inclusive range.
    pub fn custom(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            date_range: DateRange::new(start, end),
            date_range_type: DateRangeType::Custom,
            ..Self::default()
        }
    }

    pub fn with_range_type(range_type: DateRangeType) -> Self {
        Self {
            date_range_type: range_type,
            ..Self::default()
        }
    }

    /// Resolves the shortcut to concrete bounds relative to `today`; weeks start on Monday.
    /// Bounds saturate at the ends of the representable calendar.
    pub fn resolve_date_range(&self, today: NaiveDate) -> DateRange {
        let week_start = shift_days(today, -i64::from(today.weekday().num_days_from_monday()));
        let month_start = first_of_month(today.year(), today.month()).unwrap_or(today);
        match self.date_range_type {
            DateRangeType::Today => DateRange::new(today, today),
            DateRangeType::Yesterday => {
                let yesterday = shift_days(today, -1);
                DateRange::new(yesterday, yesterday)
            }
            DateRangeType::ThisWeek => DateRange::new(week_start, shift_days(week_start, 6)),
            DateRangeType::LastWeek => {
                let start = shift_days(week_start, -7);
                DateRange::new(start, shift_days(start, 6))
            }
            DateRangeType::ThisMonth => DateRange::new(month_start, end_of_month(month_start)),
            DateRangeType::LastMonth => {
                let last_month_end = shift_days(month_start, -1);
                let start = first_of_month(last_month_end.year(), last_month_end.month())
                    .unwrap_or(last_month_end);
                DateRange::new(start, last_month_end)
            }
            DateRangeType::ThisQuarter => {
                let start_month = (today.month0() / 3) * 3 + 1;
                let start = first_of_month(today.year(), start_month).unwrap_or(today);
                let last_month = first_of_month(today.year(), start_month + 2).unwrap_or(start);
                DateRange::new(start, end_of_month(last_month))
            }
            DateRangeType::ThisYear => {
                let start = first_of_month(today.year(), 1).unwrap_or(today);
                let end = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
                DateRange::new(start, end)
            }
            DateRangeType::Custom => self.date_range,
        }
    }

    /// Evaluates the predicate for one entry; `today` anchors relative date shortcuts.
    pub fn matches(&self, entry: &TimesheetEntry, today: NaiveDate) -> bool {
        self.matches_in_range(entry, &self.resolve_date_range(today))
    }

    fn matches_in_range(&self, entry: &TimesheetEntry, range: &DateRange) -> bool {
        range.contains(entry.started)
            && id_allowed(&self.project_ids, Some(entry.project.id.as_str()))
            && id_allowed(&self.user_ids, entry.author_id())
            && id_allowed(&self.issue_type_ids, entry.issue_type_id())
            && id_allowed(&self.status_ids, entry.status_id())
            && self.min_hours.map_or(true, |min| entry.time_spent_hours >= min)
            && self.max_hours.map_or(true, |max| entry.time_spent_hours <= max)
            && self.search.matches(entry)
    }

    /// Keeps matching entries in input order.
    pub fn apply(&self, entries: &[TimesheetEntry], today: NaiveDate) -> Vec<TimesheetEntry> {
        let range = self.resolve_date_range(today);
        entries
            .iter()
            .filter(|entry| self.matches_in_range(entry, &range))
            .cloned()
            .collect()
    }
}

fn id_allowed(allowed: &[String], id: Option<&str>) -> bool {
    allowed.is_empty() || id.is_some_and(|id| allowed.iter().any(|candidate| candidate == id))
}

fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn end_of_month(month_start: NaiveDate) -> NaiveDate {
    let (year, month) = if month_start.month() == 12 {
        (month_start.year() + 1, 1)
    } else {
        (month_start.year(), month_start.month() + 1)
    };
    first_of_month(year, month)
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    let magnitude = Days::new(days.unsigned_abs());
    if days < 0 {
        date.checked_sub_days(magnitude).unwrap_or(NaiveDate::MIN)
    } else {
        date.checked_add_days(magnitude).unwrap_or(NaiveDate::MAX)
    }
}

fn check_ids(issues: &mut Issues, field: &str, ids: &[String]) {
    for (index, id) in ids.iter().enumerate() {
        issues.require_text(&format!("{field}[{index}]"), id);
    }
}

impl Validate for FilterState {
    fn check(&self, issues: &mut Issues) {
        if self.date_range_type == DateRangeType::Custom {
            let required = "is required for a custom range";
            issues.ensure(self.date_range.start.is_some(), "dateRange.start", required);
            issues.ensure(self.date_range.end.is_some(), "dateRange.end", required);
        }
        if let (Some(start), Some(end)) = (self.date_range.start, self.date_range.end) {
            issues.ensure(start <= end, "dateRange", "start must not be after end");
        }
        check_ids(issues, "projectIds", &self.project_ids);
        check_ids(issues, "userIds", &self.user_ids);
        check_ids(issues, "issueTypeIds", &self.issue_type_ids);
        check_ids(issues, "statusIds", &self.status_ids);
        issues.ensure(
            self.search.text.chars().count() <= MAX_SEARCH_TEXT_CHARS,
            "search.text",
            format!("must be at most {MAX_SEARCH_TEXT_CHARS} characters"),
        );
        if !self.search.text.trim().is_empty() {
            issues.ensure(
                self.search.has_target(),
                "search",
                "at least one search target must be enabled",
            );
        }
        for (field, bound) in [("minHours", self.min_hours), ("maxHours", self.max_hours)] {
            if let Some(value) = bound {
                let valid = value.is_finite() && value >= 0.0;
                issues.ensure(valid, field, "must be a non-negative number");
            }
        }
        if let (Some(min), Some(max)) = (self.min_hours, self.max_hours) {
            issues.ensure(min <= max, "maxHours", "must not be less than minHours");
        }
    }
}
