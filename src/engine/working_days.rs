use chrono::{Datelike, NaiveDate, Weekday};

use super::calendar::HolidayCalendar;
use crate::model::leave_request::DayType;

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Days in `[start, end]` that are neither weekends nor holidays. An inverted
/// range counts zero.
pub fn working_days(start: NaiveDate, end: NaiveDate, calendar: &HolidayCalendar) -> u32 {
    if start > end {
        return 0;
    }

    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| !is_weekend(*day) && !calendar.is_holiday(*day))
        .count() as u32
}

/// Days a request consumes. A half day is half of its single date's count,
/// so it still consumes nothing on a weekend or holiday.
pub fn requested_days(
    start: NaiveDate,
    end: NaiveDate,
    day_type: DayType,
    calendar: &HolidayCalendar,
) -> f64 {
    let days = f64::from(working_days(start, end, calendar));
    match day_type {
        DayType::FullDay => days,
        DayType::HalfDay => days * 0.5,
    }
}
