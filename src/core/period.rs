use chrono::{Datelike, Months, NaiveDate};

/// First day of the calendar month before `today`.
pub fn first_of_previous_month(today: NaiveDate) -> NaiveDate {
    let first = today.with_day(1).unwrap_or(today);
    first.checked_sub_months(Months::new(1)).unwrap_or(first)
}

/// First and last day of the calendar month before `today`.
///
/// Monthly exports run early in a month and settle the previous one.
pub fn previous_month(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let from = first_of_previous_month(today);
    let to = today
        .with_day(1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(from);
    (from, to)
}
