//! Setlist dates arrive as free text. They are read as day-month-year
//! (`05-06-2023` is 5 June 2023), which is how the setlist catalog writes
//! them. No attempt is made to guess a month-first ordering.

use chrono::NaiveDate;

pub const DATE_DELIMITER: char = '-';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    Past,
    Future,
}

/// Parses `DD-MM-YYYY`. Anything other than three numeric parts, or a
/// day that does not exist in that month, is unparseable.
pub fn parse_setlist_date(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.trim().split(DATE_DELIMITER).collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };

    let day = numeric(day)?;
    let month = numeric(month)?;
    let year = i32::try_from(numeric(year)?).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn numeric(token: &str) -> Option<u32> {
    let token = token.trim();
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// "Jun 5, 2023"; empty when there is no date.
pub fn format_short(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

/// A show happening today still counts as past.
pub fn classify(date: NaiveDate, today: NaiveDate) -> Timing {
    if date > today {
        Timing::Future
    } else {
        Timing::Past
    }
}

pub fn is_future(raw: &str, today: NaiveDate) -> bool {
    parse_setlist_date(raw).is_some_and(|d| classify(d, today) == Timing::Future)
}
