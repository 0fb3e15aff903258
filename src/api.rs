//! Request/response envelopes of the timesheets endpoint.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Settings, MAX_PAGE_SIZE};
use crate::error::{Error, FieldIssue, ValidationError};
use crate::filter::FilterState;
use crate::grouping::{build_group_tree, GroupTree, GroupingConfig};
use crate::models::TimesheetEntry;
use crate::validation::{validate, Issues, Validate};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetsRequest {
    #[serde(default)]
    pub filters: FilterState,
    #[serde(default)]
    pub grouping: GroupingConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_issue_details: Option<bool>,
}

impl Validate for TimesheetsRequest {
    fn check(&self, issues: &mut Issues) {
        issues.nested("filters", &self.filters);
        issues.nested("grouping", &self.grouping);
        if let Some(page) = self.page {
            issues.ensure(page >= 1, "page", "must be at least 1");
        }
        if let Some(limit) = self.limit {
            issues.ensure(
                (1..=MAX_PAGE_SIZE).contains(&limit),
                "limit",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            );
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: usize) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total_pages = u32::try_from(total.div_ceil(limit as usize)).unwrap_or(u32::MAX);
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    /// Index range of this page within the full result set.
    pub fn bounds(&self) -> std::ops::Range<usize> {
        let start = (self.page as usize)
            .saturating_sub(1)
            .saturating_mul(self.limit as usize);
        let start = start.min(self.total);
        start..start.saturating_add(self.limit as usize).min(self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetsResponse {
    pub entries: Vec<TimesheetEntry>,
    pub total_entries: usize,
    pub total_hours: f64,
    pub grouped_data: GroupTree,
    pub pagination: Pagination,
    pub filters: FilterState,
    pub grouping: GroupingConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl TimesheetsResponse {
    /// Answers a request from the synced entries.
    ///
    /// Totals and the grouped tree cover every filtered entry; only `entries`
    /// is paginated.
    pub fn assemble(
        request: &TimesheetsRequest,
        entries: &[TimesheetEntry],
        today: NaiveDate,
        last_synced_at: Option<DateTime<Utc>>,
        settings: &Settings,
    ) -> Result<Self, ValidationError> {
        let request = validate(request.clone())?;
        let max_page_size = settings.max_page_size.max(1);
        if request.limit.is_some_and(|limit| limit > max_page_size) {
            return Err(ValidationError::single(
                "limit",
                format!("must be between 1 and {max_page_size}"),
            ));
        }
        let filtered = request.filters.apply(entries, today);
        let grouped_data = build_group_tree(&filtered, &request.grouping);
        let total_hours = filtered.iter().map(|entry| entry.time_spent_hours).sum();

        let limit = settings.clamp_page_size(request.limit);
        let pagination = Pagination::new(request.page.unwrap_or(1), limit, filtered.len());
        let include_details = request.include_issue_details.unwrap_or(true);
        let page_entries = filtered[pagination.bounds()]
            .iter()
            .map(|entry| {
                if include_details {
                    entry.clone()
                } else {
                    TimesheetEntry {
                        issue: entry.issue.without_details(),
                        ..entry.clone()
                    }
                }
            })
            .collect();

        debug!(
            matched = filtered.len(),
            page = pagination.page,
            limit = pagination.limit,
            "assembled timesheets response"
        );
        Ok(Self {
            entries: page_entries,
            total_entries: filtered.len(),
            total_hours,
            grouped_data,
            pagination,
            filters: request.filters,
            grouping: request.grouping,
            last_synced_at,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    Unauthorized,
    NotFound,
    InternalError,
}

impl ErrorCode {
    /// HTTP status the code is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 400,
            ErrorCode::Unauthorized => 401,
            ErrorCode::NotFound => 404,
            ErrorCode::InternalError => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldIssue>,
}

impl ApiErrorBody {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.code.status_code()
    }
}

impl From<ValidationError> for ApiErrorBody {
    fn from(error: ValidationError) -> Self {
        Self {
            code: ErrorCode::ValidationError,
            message: error.to_string(),
            details: error.issues,
        }
    }
}

impl From<Error> for ApiErrorBody {
    fn from(error: Error) -> Self {
        match error {
            Error::Validation(validation) => validation.into(),
            Error::Json(json) => ApiErrorBody::from(ValidationError::single("$", json.to_string())),
            Error::Io(io) => ApiErrorBody::new(ErrorCode::InternalError, io.to_string()),
        }
    }
}

/// Uniform `{success, data?, error?}` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<ApiErrorBody>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.error.as_ref().map_or(200, ApiErrorBody::status_code)
    }
}

impl<T, E: Into<ApiErrorBody>> From<Result<T, E>> for ApiResponse<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(error) => Self::failure(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::{GroupDimension, GroupingLevel};
    use crate::models::User;
    use crate::test_support::{date, entry};
    use crate::validation::{is_timesheets_request, parse};
    use serde_json::json;

    fn january_entries() -> Vec<TimesheetEntry> {
        (1..=7)
            .map(|day| {
                let mut fixture = entry(&format!("e{day}")).started(2024, 1, day).hours(1.0);
                if day % 2 == 0 {
                    fixture = fixture.project("200", "OPS", "Operations");
                }
                let mut built = fixture.build();
                built.issue.assignee = Some(User::new("u9", "Lin"));
                built
            })
            .collect()
    }

    fn january_request() -> TimesheetsRequest {
        TimesheetsRequest {
            filters: FilterState::custom(date(2024, 1, 1), date(2024, 1, 31)),
            ..TimesheetsRequest::default()
        }
    }

    #[test]
    fn pagination_math() {
        let page = Pagination::new(2, 3, 7);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next && page.has_prev);
        assert_eq!(page.bounds(), 3..6);

        let last = Pagination::new(3, 3, 7);
        assert!(!last.has_next);
        assert_eq!(last.bounds(), 6..7);

        let empty = Pagination::new(1, 50, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next && !empty.has_prev);
        assert_eq!(empty.bounds(), 0..0);

        assert_eq!(Pagination::new(9, 3, 7).bounds(), 7..7);
    }

    #[test]
    fn assemble_pages_entries_but_groups_everything() {
        let mut request = january_request();
        request.page = Some(2);
        request.limit = Some(3);
        let entries = january_entries();
        let response = TimesheetsResponse::assemble(
            &request,
            &entries,
            date(2024, 2, 1),
            None,
            &Settings::default(),
        )
        .expect("valid request");

        let ids: Vec<&str> = response.entries.iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["e4", "e5", "e6"]);
        assert_eq!(response.total_entries, 7);
        assert!((response.total_hours - 7.0).abs() < 1e-9);
        let grand = response.grouped_data.grand_total.expect("grand total");
        assert_eq!(grand.entry_count, 7);
        assert_eq!(response.grouped_data.nodes.len(), 2);
        assert_eq!(response.pagination.total_pages, 3);
        assert!(response.entries[0].issue.assignee.is_some());
    }

    #[test]
    fn assemble_strips_issue_details_on_request() {
        let mut request = january_request();
        request.include_issue_details = Some(false);
        request.grouping =
            GroupingConfig::with_levels(vec![GroupingLevel::new(GroupDimension::User)]);
        let response = TimesheetsResponse::assemble(
            &request,
            &january_entries(),
            date(2024, 2, 1),
            None,
            &Settings::default(),
        )
        .expect("valid request");
        assert_eq!(response.entries.len(), 7);
        assert!(response.entries.iter().all(|entry| entry.issue.assignee.is_none()));
        assert_eq!(response.pagination.limit, 50);
    }

    #[test]
    fn limit_above_configured_maximum_is_rejected() {
        let settings = Settings {
            max_page_size: 100,
            ..Settings::default()
        };
        let mut request = january_request();
        request.limit = Some(400);
        let error = TimesheetsResponse::assemble(
            &request,
            &january_entries(),
            date(2024, 2, 1),
            None,
            &settings,
        )
        .unwrap_err();
        assert_eq!(error.issues.len(), 1);
        assert_eq!(error.issues[0].path, "limit");
        assert_eq!(error.issues[0].message, "must be between 1 and 100");

        request.limit = Some(100);
        let response = TimesheetsResponse::assemble(
            &request,
            &january_entries(),
            date(2024, 2, 1),
            None,
            &settings,
        )
        .expect("limit at the configured maximum");
        assert_eq!(response.pagination.limit, 100);
    }

    #[test]
    fn invalid_request_becomes_validation_failure() {
        let mut request = january_request();
        request.limit = Some(0);
        request.filters.min_hours = Some(-1.0);
        let error = TimesheetsResponse::assemble(
            &request,
            &[],
            date(2024, 2, 1),
            None,
            &Settings::default(),
        )
        .unwrap_err();
        let paths: Vec<&str> = error.issues.iter().map(|issue| issue.path.as_str()).collect();
        assert_eq!(paths, vec!["filters.minHours", "limit"]);

        let response: ApiResponse<TimesheetsResponse> = ApiResponse::failure(error);
        assert!(!response.success);
        assert_eq!(response.status_code(), 400);
        let body = serde_json::to_value(&response).expect("serializes");
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"][1]["path"], "limit");
        assert!(body.get("data").is_none());
    }

    #[test]
    fn request_guard_checks_nested_payloads() {
        assert!(is_timesheets_request(&json!({})));
        assert!(is_timesheets_request(&json!({
            "filters": {"dateRangeType": "lastWeek"},
            "grouping": {"levels": [{"dimension": "date", "dateGroupingType": "day"}]},
            "page": 1,
            "limit": 500
        })));
        assert!(!is_timesheets_request(&json!({"limit": 501})));
        assert!(!is_timesheets_request(&json!({"page": 0})));

        let error =
            parse::<TimesheetsRequest>(&json!({"grouping": {"levels": "project"}})).unwrap_err();
        assert_eq!(error.issues[0].path, "$");
    }

    #[test]
    fn result_converts_into_envelope() {
        let ok: ApiResponse<u32> = Ok::<u32, ValidationError>(3).into();
        assert!(ok.success);
        assert_eq!(ok.status_code(), 200);

        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        let failed: ApiResponse<u32> = Err::<u32, Error>(io).into();
        assert_eq!(failed.status_code(), 500);
        assert_eq!(failed.error.map(|e| e.code), Some(ErrorCode::InternalError));
    }
}
