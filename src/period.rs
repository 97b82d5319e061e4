//! Billing period calculation
//!
//! Pure calendar math deriving the two windows every run needs: the previous
//! full calendar month (the billing period) and the current month (the
//! forecast window). Both are functions of "today" only.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed date interval over which costs are aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// The previous full calendar month relative to `today`.
///
/// Start is the first day of the month before `today`'s month, wrapping
/// December into the previous year; end is the last day of that month.
pub fn last_full_month(today: NaiveDate) -> BillingPeriod {
    let (year, month) = if today.month() > 1 {
        (today.year(), today.month() - 1)
    } else {
        (today.year() - 1, 12)
    };

    let start = first_of_month(year, month);
    let end = first_of_month(today.year(), today.month())
        .pred_opt()
        .expect("first of month always has a predecessor");

    BillingPeriod { start, end }
}

/// The current calendar month, used as the forecast window.
///
/// Start is the first day of `today`'s month; end is the first day of the
/// next month, wrapping December into the next year.
pub fn current_month_to_date(today: NaiveDate) -> BillingPeriod {
    let start = first_of_month(today.year(), today.month());
    let end = if today.month() < 12 {
        first_of_month(today.year(), today.month() + 1)
    } else {
        first_of_month(today.year() + 1, 1)
    };

    BillingPeriod { start, end }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("day 1 exists in every month")
}
