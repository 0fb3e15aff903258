//! Conversion between Jira duration strings (`1w 2d 3h 30m`) and hours.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TIME_TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(w|d|h|m)").expect("invalid duration regex"));

pub const DEFAULT_WORKDAY_HOURS: u8 = 8;
pub const DEFAULT_WORKDAYS_PER_WEEK: u8 = 5;

/// Length of a Jira "day" and "week" used when reading and writing duration strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkCalendar {
    pub workday_hours: u8,
    pub workdays_per_week: u8,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            workday_hours: DEFAULT_WORKDAY_HOURS,
            workdays_per_week: DEFAULT_WORKDAYS_PER_WEEK,
        }
    }
}

impl WorkCalendar {
    pub fn new(workday_hours: u8, workdays_per_week: u8) -> Self {
        Self {
            workday_hours: workday_hours.clamp(1, 24),
            workdays_per_week: workdays_per_week.clamp(1, 7),
        }
    }

    fn minutes_per_day(&self) -> u64 {
        u64::from(self.workday_hours) * 60
    }

    fn minutes_per_week(&self) -> u64 {
        self.minutes_per_day() * u64::from(self.workdays_per_week)
    }

    /// Parses a Jira duration into hours. A bare number counts as minutes.
    pub fn parse(&self, input: &str) -> Option<f64> {
        let normalized = input.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        if let Ok(minutes) = normalized.parse::<f64>() {
            return (minutes.is_finite() && minutes >= 0.0).then(|| minutes / 60.0);
        }

        let leftover = TIME_TOKEN_REGEX.replace_all(&normalized, "");
        if !leftover.trim().is_empty() {
            return None;
        }

        let workday = f64::from(self.workday_hours);
        let mut hours = 0.0;
        for capture in TIME_TOKEN_REGEX.captures_iter(&normalized) {
            let value = capture[1].parse::<f64>().ok()?;
            hours += match &capture[2] {
                "w" => value * workday * f64::from(self.workdays_per_week),
                "d" => value * workday,
                "h" => value,
                "m" => value / 60.0,
                _ => return None,
            };
        }
        Some(hours)
    }

    /// Parses a Jira duration into whole seconds.
    pub fn parse_seconds(&self, input: &str) -> Option<u64> {
        self.parse(input).map(|hours| (hours * 3600.0).round() as u64)
    }

    /// Renders hours as `Nw Nd Nh Nm`, rounded to the minute, omitting zero parts.
    pub fn format(&self, hours: f64) -> String {
        if !hours.is_finite() || hours <= 0.0 {
            return "0m".to_string();
        }
        let mut remaining = (hours * 60.0).round() as u64;
        if remaining == 0 {
            return "0m".to_string();
        }

        let weeks = remaining / self.minutes_per_week();
        remaining %= self.minutes_per_week();
        let days = remaining / self.minutes_per_day();
        remaining %= self.minutes_per_day();
        let whole_hours = remaining / 60;
        let minutes = remaining % 60;

        [(weeks, 'w'), (days, 'd'), (whole_hours, 'h'), (minutes, 'm')]
            .iter()
            .filter(|(value, _)| *value > 0)
            .map(|(value, unit)| format!("{value}{unit}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Parses a Jira duration string into hours using the 8h day / 5d week convention.
pub fn parse_jira_time_spent(input: &str) -> Option<f64> {
    WorkCalendar::default().parse(input)
}

/// Formats hours as a Jira duration string using the 8h day / 5d week convention.
pub fn format_hours_as_jira_time(hours: f64) -> String {
    WorkCalendar::default().format(hours)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(left: Option<f64>, right: f64) -> bool {
        left.map(|value| (value - right).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn parses_compound_strings() {
        assert!(approx(parse_jira_time_spent("3h 30m"), 3.5));
        assert!(approx(parse_jira_time_spent("1d"), 8.0));
        assert!(approx(parse_jira_time_spent("1w 2d 3h 30m"), 40.0 + 16.0 + 3.5));
        assert!(approx(parse_jira_time_spent("1h30m"), 1.5));
        assert!(approx(parse_jira_time_spent("1.5h"), 1.5));
        assert!(approx(parse_jira_time_spent(" 2H "), 2.0));
        assert!(approx(parse_jira_time_spent("90"), 1.5));
        assert!(approx(parse_jira_time_spent("0m"), 0.0));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_jira_time_spent(""), None);
        assert_eq!(parse_jira_time_spent("soon"), None);
        assert_eq!(parse_jira_time_spent("2 months"), None);
        assert_eq!(parse_jira_time_spent("3h and 5m"), None);
        assert_eq!(parse_jira_time_spent("-1"), None);
    }

    #[test]
    fn formats_with_day_and_week_units() {
        assert_eq!(format_hours_as_jira_time(0.0), "0m");
        assert_eq!(format_hours_as_jira_time(-2.0), "0m");
        assert_eq!(format_hours_as_jira_time(f64::NAN), "0m");
        assert_eq!(format_hours_as_jira_time(0.25), "15m");
        assert_eq!(format_hours_as_jira_time(3.5), "3h 30m");
        assert_eq!(format_hours_as_jira_time(8.0), "1d");
        assert_eq!(format_hours_as_jira_time(42.0), "1w 2h");
    }

    #[test]
    fn custom_workday_changes_day_length() {
        let calendar = WorkCalendar::new(6, 4);
        assert!(approx(calendar.parse("1d"), 6.0));
        assert!(approx(calendar.parse("1w"), 24.0));
        assert_eq!(calendar.format(7.0), "1d 1h");
        assert_eq!(calendar.parse_seconds("1d 30m"), Some(6 * 3600 + 1800));
        assert_eq!(WorkCalendar::new(0, 9), WorkCalendar::new(1, 7));
    }

    #[test]
    fn round_trip_keeps_minute_resolution() {
        let mut hours = 0.0;
        while hours < 120.0 {
            let parsed = parse_jira_time_spent(&format_hours_as_jira_time(hours))
                .expect("formatted output parses");
            assert!((parsed - hours).abs() <= 1.0 / 60.0, "{hours} -> {parsed}");
            hours += 0.137;
        }
    }
}
