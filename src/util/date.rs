use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Calendar-day format used everywhere a date is written to a document
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a calendar day from the start of `s`.
///
/// Accepts `2021-06-06` as well as date-time strings like
/// `2021-06-06T10:00:00`, which are truncated to the day.
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let head = s.get(..10)?;
    let rest = &s[10..];
    if !rest.is_empty() && !rest.starts_with(['T', 't', ' ']) {
        return None;
    }
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

pub fn format_day(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// The last representable instant of `date`'s day
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    date.and_time(last)
}

/// Number of days in the month containing `year`/`month`
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// The Sunday on or before `date`
pub fn start_of_week_sunday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// The Monday on or before `date`
pub fn start_of_week_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Month name for a 1-based month number
pub fn month_name(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_day_variants() {
        assert_eq!(parse_day("2021-06-06"), Some(day(2021, 6, 6)));
        assert_eq!(parse_day(" 2021-06-06 "), Some(day(2021, 6, 6)));
        assert_eq!(parse_day("2021-06-06T10:30:00"), Some(day(2021, 6, 6)));
        assert_eq!(parse_day("2021-06-06 10:30"), Some(day(2021, 6, 6)));
        assert_eq!(parse_day("2021-06-0612"), None);
        assert_eq!(parse_day("tomorrow"), None);
        assert_eq!(parse_day("2021-02-30"), None);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 12), 31);
        assert_eq!(days_in_month(2023, 4), 30);
    }

    #[test]
    fn test_week_starts() {
        // 2021-06-09 is a Wednesday
        assert_eq!(start_of_week_sunday(day(2021, 6, 9)), day(2021, 6, 6));
        assert_eq!(start_of_week_monday(day(2021, 6, 9)), day(2021, 6, 7));
        assert_eq!(start_of_week_sunday(day(2021, 6, 6)), day(2021, 6, 6));
    }

    #[test]
    fn test_month_name_bounds() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }
}
