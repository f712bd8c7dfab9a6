use chrono::{Datelike, NaiveDate};

/// Fractional months between two calendar dates, rounded to one decimal.
///
/// Whole calendar months are counted first, then the day-of-month difference is
/// expressed as a fraction of the length of the end month. Negative when `end`
/// precedes `start`.
pub fn fractional_months(start: NaiveDate, end: NaiveDate) -> f64 {
    let whole_months =
        (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    let day_offset = end.day() as f64 - start.day() as f64;
    let months = whole_months as f64 + day_offset / days_in_month(end) as f64;

    (months * 10.0).round() / 10.0
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}
