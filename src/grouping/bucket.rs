use chrono::{Datelike, Days, NaiveDate};

use super::DateGrouping;

/// Calendar bucket an entry date falls into at a given granularity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateBucket {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub value: String,
    pub label: String,
}

impl DateGrouping {
    /// Truncates `date` to its bucket: the date itself, ISO week (Monday start), month,
    /// quarter or year. Bounds saturate at the ends of the representable calendar.
    pub fn bucket(&self, date: NaiveDate) -> DateBucket {
        match self {
            DateGrouping::Day => DateBucket {
                start: date,
                end: date,
                value: date.format("%Y-%m-%d").to_string(),
                label: date.format("%a, %b %-d, %Y").to_string(),
            },
            DateGrouping::Week => {
                let offset = Days::new(u64::from(date.weekday().num_days_from_monday()));
                let start = date.checked_sub_days(offset).unwrap_or(NaiveDate::MIN);
                let end = start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
                let iso = date.iso_week();
                DateBucket {
                    start,
                    end,
                    value: format!("{}-W{:02}", iso.year(), iso.week()),
                    label: format!(
                        "Week {}, {} ({} - {})",
                        iso.week(),
                        iso.year(),
                        start.format("%b %-d"),
                        end.format("%b %-d")
                    ),
                }
            }
            DateGrouping::Month => {
                let start = month_start(date.year(), date.month(), date);
                DateBucket {
                    start,
                    end: month_end(start, 1),
                    value: start.format("%Y-%m").to_string(),
                    label: start.format("%B %Y").to_string(),
                }
            }
            DateGrouping::Quarter => {
                let quarter = date.month0() / 3 + 1;
                let start = month_start(date.year(), (quarter - 1) * 3 + 1, date);
                DateBucket {
                    start,
                    end: month_end(start, 3),
                    value: format!("{}-Q{}", date.year(), quarter),
                    label: format!("Q{} {}", quarter, date.year()),
                }
            }
            DateGrouping::Year => {
                let start = month_start(date.year(), 1, date);
                DateBucket {
                    start,
                    end: month_end(start, 12),
                    value: date.year().to_string(),
                    label: date.year().to_string(),
                }
            }
        }
    }
}

fn month_start(year: i32, month: u32, fallback: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(fallback)
}

/// Last day of the span of `months` calendar months beginning at `start`.
fn month_end(start: NaiveDate, months: u32) -> NaiveDate {
    let total = start.month0() + months;
    let year = start.year() + (total / 12) as i32;
    let month = total % 12 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}
