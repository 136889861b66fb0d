//! Time-range and list-filter state shared by the transaction, category and
//! dashboard endpoints.
//!
//! The filter state is derived entirely from URL query parameters and can be
//! serialized back to a canonical query string, so a URL fully describes a
//! filtered view. Unknown or malformed parameters fall back to the current
//! month rather than erroring.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::form_utils::{deserialize_lenient_i64, deserialize_optional_string};

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

/// Time-range presets selectable in the filter bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFilter {
    Today,
    Week,
    #[default]
    Month,
    Quarter,
    Year,
    Custom,
    All,
}

impl FromStr for TimeFilter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            "custom" => Ok(Self::Custom),
            "all" => Ok(Self::All),
            _ => Err(()),
        }
    }
}

impl TimeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
            Self::Custom => "custom",
            Self::All => "all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Week => "This Week",
            Self::Month => "This Month",
            Self::Quarter => "This Quarter",
            Self::Year => "This Year",
            Self::Custom => "Custom Range",
            Self::All => "All Time",
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw query parameters as they arrive from the browser. Numeric fields are
/// parsed leniently: garbage degrades to the default instead of rejecting
/// the whole request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub filter: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub category_id: Option<i64>,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub account_id: Option<i64>,
    #[serde(deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub page: Option<i64>,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub per_page: Option<i64>,
}

/// Resolved filter state for a transaction listing or statistics view.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub filter: TimeFilter,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub search: Option<String>,
    pub page: i64,
    pub per_page: i64,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            filter: TimeFilter::default(),
            start_date: None,
            end_date: None,
            category_id: None,
            account_id: None,
            search: None,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl FilterState {
    /// Resolve raw query parameters into a well-formed state.
    ///
    /// A `custom` filter without two parseable, ordered bounds degrades to the
    /// month default instead of erroring, so stale or hand-edited URLs always
    /// render something sensible.
    pub fn from_params(params: &FilterParams) -> Self {
        let filter = params
            .filter
            .as_deref()
            .and_then(|s| s.parse::<TimeFilter>().ok())
            .unwrap_or_default();

        let (filter, start_date, end_date) = if filter == TimeFilter::Custom {
            let start = params
                .start_date
                .as_deref()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
            let end = params
                .end_date
                .as_deref()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
            match (start, end) {
                (Some(s), Some(e)) if s <= e => (TimeFilter::Custom, Some(s), Some(e)),
                _ => (TimeFilter::Month, None, None),
            }
        } else {
            (filter, None, None)
        };

        Self {
            filter,
            start_date,
            end_date,
            category_id: params.category_id,
            account_id: params.account_id,
            search: params.search.clone(),
            page: params.page.unwrap_or(1).max(1),
            per_page: params
                .per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }

    /// Resolve the inclusive datetime range for the selected time filter.
    /// `All` has no bounds and returns `None`.
    pub fn date_range(&self, today: NaiveDate) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let range = match self.filter {
            TimeFilter::Today => (today, today),
            TimeFilter::Week => (week_start(today), week_start(today) + chrono::Duration::days(6)),
            TimeFilter::Month => (month_start(today), month_end(today)),
            TimeFilter::Quarter => (quarter_start(today), quarter_end(today)),
            TimeFilter::Year => (year_start(today), year_end(today)),
            TimeFilter::Custom => match (self.start_date, self.end_date) {
                (Some(start), Some(end)) => (start, end),
                // from_params guarantees bounds; degrade like it does
                _ => (month_start(today), month_end(today)),
            },
            TimeFilter::All => return None,
        };
        Some((start_of_day(range.0), end_of_day(range.1)))
    }

    /// Canonical query string for this state. Contains exactly the keys the
    /// state implies: `start_date`/`end_date` only for custom ranges, and
    /// `page` only past the first page.
    pub fn query_string(&self) -> String {
        let mut parts = vec![format!("filter={}", self.filter.as_str())];

        if self.filter == TimeFilter::Custom {
            if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
                parts.push(format!("start_date={}", start.format("%Y-%m-%d")));
                parts.push(format!("end_date={}", end.format("%Y-%m-%d")));
            }
        }
        if let Some(id) = self.category_id {
            parts.push(format!("category_id={}", id));
        }
        if let Some(id) = self.account_id {
            parts.push(format!("account_id={}", id));
        }
        if let Some(search) = &self.search {
            parts.push(format!("search={}", urlencoding::encode(search)));
        }
        if self.page > 1 {
            parts.push(format!("page={}", self.page));
        }

        parts.join("&")
    }

    /// Switch the time filter. Leaving the custom range drops its bounds.
    pub fn with_filter(&self, filter: TimeFilter) -> Self {
        let mut next = self.clone();
        next.filter = filter;
        if filter != TimeFilter::Custom {
            next.start_date = None;
            next.end_date = None;
        }
        next.page = 1;
        next
    }

    pub fn with_category(&self, category_id: Option<i64>) -> Self {
        let mut next = self.clone();
        next.category_id = category_id;
        next.page = 1;
        next
    }

    pub fn with_account(&self, account_id: Option<i64>) -> Self {
        let mut next = self.clone();
        next.account_id = account_id;
        next.page = 1;
        next
    }

    pub fn with_search(&self, search: Option<String>) -> Self {
        let mut next = self.clone();
        next.search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        next.page = 1;
        next
    }

    /// Apply an explicit custom range. An inverted range is a validation
    /// error and the current state is left untouched.
    pub fn apply_custom_range(&self, start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if start > end {
            return Err(AppError::validation("Start date must be before end date"));
        }
        let mut next = self.clone();
        next.filter = TimeFilter::Custom;
        next.start_date = Some(start);
        next.end_date = Some(end);
        next.page = 1;
        Ok(next)
    }

    /// Clear the category, account and search dimensions while preserving an
    /// explicitly chosen time range.
    pub fn cleared(&self) -> Self {
        Self {
            filter: self.filter,
            start_date: self.start_date,
            end_date: self.end_date,
            ..Self::default()
        }
    }

    /// Human-readable label, e.g. "This Month" or
    /// "Custom Range (2026-01-01 to 2026-01-31)".
    pub fn display_name(&self) -> String {
        match self.filter {
            TimeFilter::Custom => match (self.start_date, self.end_date) {
                (Some(start), Some(end)) => format!(
                    "Custom Range ({} to {})",
                    start.format("%Y-%m-%d"),
                    end.format("%Y-%m-%d")
                ),
                _ => TimeFilter::Custom.label().to_string(),
            },
            other => other.label().to_string(),
        }
    }
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).expect("midnight is always valid")
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_micro_opt(23, 59, 59, 999_999)
        .expect("end of day is always valid")
}

fn week_start(date: NaiveDate) -> NaiveDate {
    let days_from_monday = date.weekday().num_days_from_monday();
    date - chrono::Duration::days(days_from_monday as i64)
}

fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).expect("first of month is always valid")
}

fn month_end(date: NaiveDate) -> NaiveDate {
    let next_month = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    next_month.expect("first of month is always valid") - chrono::Duration::days(1)
}

fn quarter_start(date: NaiveDate) -> NaiveDate {
    let quarter = (date.month() - 1) / 3;
    let start_month = quarter * 3 + 1;
    NaiveDate::from_ymd_opt(date.year(), start_month, 1).expect("quarter start is always valid")
}

fn quarter_end(date: NaiveDate) -> NaiveDate {
    let quarter = (date.month() - 1) / 3;
    let end_month = quarter * 3 + 3;
    let next = if end_month == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), end_month + 1, 1)
    };
    next.expect("first of month is always valid") - chrono::Duration::days(1)
}

fn year_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).expect("January 1st is always valid")
}

fn year_end(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 12, 31).expect("December 31st is always valid")
}
