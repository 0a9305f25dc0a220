use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::model::repeat::{Frequency, LAST_DAY, RepeatError, RepeatRule};
use crate::util::date::{days_in_month, end_of_day, start_of_week_monday};

/// Consecutive periods without a matching day before the walk gives up
const MAX_EMPTY_PERIODS: u32 = 1000;

/// The first day of the series that falls strictly after `after`.
///
/// The series starts on `after`'s calendar day, and each candidate day
/// counts as its midnight.
pub fn next_occurrence(rule: &RepeatRule, after: NaiveDateTime) -> Result<NaiveDate, RepeatError> {
    occurrences(rule, after, 1)?
        .into_iter()
        .next()
        .ok_or(RepeatError::NoOccurrence)
}

/// Next due date for a task completed on `today`: the first occurrence
/// after the end of that day.
pub fn next_due_after(rule: &RepeatRule, today: NaiveDate) -> Result<NaiveDate, RepeatError> {
    next_occurrence(rule, end_of_day(today))
}

/// The first `count` days of the series strictly after `after`
pub fn occurrences(
    rule: &RepeatRule,
    after: NaiveDateTime,
    count: usize,
) -> Result<Vec<NaiveDate>, RepeatError> {
    if rule.interval() == 0 {
        return Err(RepeatError::InvalidExpression(
            "interval must be at least 1".to_string(),
        ));
    }

    let start = after.date();
    let mut found = Vec::with_capacity(count);
    let mut empty_run = 0;
    let mut period: i64 = 0;

    while found.len() < count {
        let mut matched = false;
        for day in period_days(rule, start, period) {
            if day.and_time(NaiveTime::MIN) > after {
                matched = true;
                found.push(day);
                if found.len() == count {
                    break;
                }
            }
        }

        if matched {
            empty_run = 0;
        } else {
            empty_run += 1;
            if empty_run >= MAX_EMPTY_PERIODS {
                break;
            }
        }
        period += 1;
    }

    if found.is_empty() && count > 0 {
        return Err(RepeatError::NoOccurrence);
    }
    Ok(found)
}

/// Candidate days of the `period`-th period of the series, ascending
fn period_days(rule: &RepeatRule, start: NaiveDate, period: i64) -> Vec<NaiveDate> {
    let step = period * i64::from(rule.interval());
    match rule.frequency() {
        Frequency::Daily => Duration::try_days(step)
            .and_then(|d| start.checked_add_signed(d))
            .into_iter()
            .collect(),
        Frequency::Weekly => {
            // Out of calendar range: an empty period, so the walk's bound ends it
            let Some(week) = Duration::try_weeks(step)
                .and_then(|d| start_of_week_monday(start).checked_add_signed(d))
            else {
                return Vec::new();
            };
            let offsets: Vec<u32> = if rule.weekdays().is_empty() {
                vec![start.weekday().num_days_from_monday()]
            } else {
                rule.weekdays()
                    .iter()
                    .map(|d| d.num_days_from_monday())
                    .collect()
            };
            let mut days: Vec<NaiveDate> = offsets
                .into_iter()
                .filter_map(|o| week.checked_add_signed(Duration::days(i64::from(o))))
                .collect();
            days.sort();
            days
        }
        Frequency::Monthly => {
            let index = i64::from(start.year()) * 12 + i64::from(start.month0()) + step;
            let Ok(year) = i32::try_from(index.div_euclid(12)) else {
                return Vec::new();
            };
            let month = index.rem_euclid(12) as u32 + 1;
            days_in(rule, start, year, month)
        }
        Frequency::Yearly => {
            let Ok(year) = i32::try_from(i64::from(start.year()) + step) else {
                return Vec::new();
            };
            // Day selectors without months apply to the whole year
            let months: Vec<u32> = if !rule.months().is_empty() {
                rule.months().to_vec()
            } else if rule.day_of_month().is_some() || !rule.weekdays().is_empty() {
                (1..=12).collect()
            } else {
                vec![start.month()]
            };
            months
                .into_iter()
                .flat_map(|month| days_in(rule, start, year, month))
                .collect()
        }
    }
}

/// Days of `year`/`month` selected by the rule's day selectors
fn days_in(rule: &RepeatRule, start: NaiveDate, year: i32, month: u32) -> Vec<NaiveDate> {
    if !(1..=12).contains(&month) {
        return Vec::new();
    }
    let last = days_in_month(year, month);

    if let Some(day) = rule.day_of_month() {
        let day = if day == LAST_DAY {
            Some(last)
        } else {
            u32::try_from(day).ok().filter(|d| (1..=last).contains(d))
        };
        return day
            .and_then(|d| NaiveDate::from_ymd_opt(year, month, d))
            .into_iter()
            .collect();
    }

    if !rule.weekdays().is_empty() {
        return (1..=last)
            .filter_map(|d| NaiveDate::from_ymd_opt(year, month, d))
            .filter(|date| rule.weekdays().contains(&date.weekday()))
            .collect();
    }

    // Without selectors the start's day-of-month is used; shorter months skip it
    NaiveDate::from_ymd_opt(year, month, start.day())
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rule(text: &str) -> RepeatRule {
        RepeatRule::from_text(text).unwrap()
    }

    #[test]
    fn test_daily_from_end_of_day() {
        assert_eq!(next_due_after(&rule("every day"), day(2021, 6, 6)).unwrap(), day(2021, 6, 7));
        assert_eq!(
            next_due_after(&rule("every 3 days"), day(2021, 6, 6)).unwrap(),
            day(2021, 6, 9)
        );
    }

    #[test]
    fn test_start_of_day_is_not_strictly_after() {
        let midnight = day(2021, 6, 6).and_time(NaiveTime::MIN);
        assert_eq!(next_occurrence(&rule("every day"), midnight).unwrap(), day(2021, 6, 7));
        let just_before = midnight - Duration::seconds(1);
        // Series starts on 2021-06-05, so 06-06 is the next candidate
        assert_eq!(next_occurrence(&rule("every day"), just_before).unwrap(), day(2021, 6, 6));
    }

    #[test]
    fn test_weekly_on_weekdays() {
        // 2021-06-06 is a Sunday
        let r = rule("every week on Monday and Thursday");
        assert_eq!(next_due_after(&r, day(2021, 6, 6)).unwrap(), day(2021, 6, 7));
        assert_eq!(next_due_after(&r, day(2021, 6, 7)).unwrap(), day(2021, 6, 10));
        assert_eq!(next_due_after(&r, day(2021, 6, 10)).unwrap(), day(2021, 6, 14));
    }

    #[test]
    fn test_weekly_without_weekdays_keeps_start_weekday() {
        assert_eq!(next_due_after(&rule("every week"), day(2021, 6, 9)).unwrap(), day(2021, 6, 16));
    }

    #[test]
    fn test_every_other_week() {
        // Wednesday 2021-06-09; weeks start Monday, so Friday the 11th is in
        // the same week as the start
        let r = rule("every 2 weeks on Friday");
        assert_eq!(next_due_after(&r, day(2021, 6, 9)).unwrap(), day(2021, 6, 11));
        assert_eq!(next_due_after(&r, day(2021, 6, 11)).unwrap(), day(2021, 6, 25));
    }

    #[test]
    fn test_weekday_shorthand() {
        // Friday 2021-06-11 -> Monday
        assert_eq!(next_due_after(&rule("every weekday"), day(2021, 6, 11)).unwrap(), day(2021, 6, 14));
    }

    #[test]
    fn test_last_day_of_month_leap_year() {
        let r = RepeatRule::new(Frequency::Monthly).with_last_day_of_month(true);
        assert_eq!(next_due_after(&r, day(2024, 2, 15)).unwrap(), day(2024, 2, 29));
        assert_eq!(next_due_after(&r, day(2023, 2, 15)).unwrap(), day(2023, 2, 28));
        assert_eq!(next_due_after(&r, day(2024, 2, 29)).unwrap(), day(2024, 3, 31));
    }

    #[test]
    fn test_monthly_skips_short_months() {
        let r = rule("every month on the 31st");
        assert_eq!(next_due_after(&r, day(2021, 3, 31)).unwrap(), day(2021, 5, 31));
    }

    #[test]
    fn test_monthly_default_day() {
        assert_eq!(next_due_after(&rule("every month"), day(2021, 1, 15)).unwrap(), day(2021, 2, 15));
        // The 30th does not exist in February
        assert_eq!(next_due_after(&rule("every month"), day(2021, 1, 30)).unwrap(), day(2021, 3, 30));
    }

    #[test]
    fn test_monthly_on_weekday() {
        let r = RepeatRule::new(Frequency::Monthly).with_weekdays(&[Weekday::Sat]);
        assert_eq!(next_due_after(&r, day(2021, 6, 26)).unwrap(), day(2021, 7, 3));
    }

    #[test]
    fn test_yearly_in_months() {
        let r = rule("every year in January and July on the 15th");
        assert_eq!(next_due_after(&r, day(2021, 3, 1)).unwrap(), day(2021, 7, 15));
        assert_eq!(next_due_after(&r, day(2021, 7, 15)).unwrap(), day(2022, 1, 15));
    }

    #[test]
    fn test_yearly_leap_day() {
        let r = rule("every year in February on the 29th");
        assert_eq!(next_due_after(&r, day(2021, 1, 1)).unwrap(), day(2024, 2, 29));
    }

    #[test]
    fn test_yearly_day_without_months_spans_the_year() {
        let r = rule("every year on the 15th");
        assert_eq!(next_due_after(&r, day(2021, 6, 20)).unwrap(), day(2021, 7, 15));
        assert_eq!(next_due_after(&r, day(2021, 12, 15)).unwrap(), day(2022, 1, 15));

        let r = RepeatRule::new(Frequency::Yearly).with_weekdays(&[Weekday::Mon]);
        // Sunday 2021-06-06 -> Monday
        assert_eq!(next_due_after(&r, day(2021, 6, 6)).unwrap(), day(2021, 6, 7));
    }

    #[test]
    fn test_yearly_without_selectors_keeps_start_day() {
        assert_eq!(next_due_after(&rule("every year"), day(2021, 6, 20)).unwrap(), day(2022, 6, 20));
    }

    #[test]
    fn test_huge_interval_does_not_overflow() {
        for text in ["every 20000000 weeks", "every 4000000000 days", "every 4000000000 months"] {
            let r = rule(text);
            assert_eq!(
                next_due_after(&r, day(2021, 6, 6)),
                Err(RepeatError::NoOccurrence),
                "{text}"
            );
        }
        // The first period is still in range: Saturday 2021-06-05 -> Sunday
        let r = rule("every 20000000 weeks on Sunday");
        assert_eq!(next_due_after(&r, day(2021, 6, 5)).unwrap(), day(2021, 6, 6));
    }

    #[test]
    fn test_impossible_rule() {
        let r = RepeatRule::new(Frequency::Yearly)
            .with_months(&[2])
            .with_day_of_month(30);
        assert_eq!(next_due_after(&r, day(2021, 1, 1)), Err(RepeatError::NoOccurrence));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let r = RepeatRule::new(Frequency::Daily).with_interval(0);
        assert!(matches!(
            next_due_after(&r, day(2021, 1, 1)),
            Err(RepeatError::InvalidExpression(_))
        ));
    }

    #[test]
    fn test_occurrences_sequence() {
        let after = end_of_day(day(2021, 6, 6));
        let days = occurrences(&rule("every week on Monday"), after, 3).unwrap();
        assert_eq!(days, vec![day(2021, 6, 7), day(2021, 6, 14), day(2021, 6, 21)]);
    }

    #[test]
    fn test_result_strictly_after_reference() {
        let rules = [
            "every day",
            "every 2 weeks on Tuesday",
            "every month on the last day",
            "every year in March",
        ];
        let start = day(2021, 1, 1);
        for text in rules {
            let r = rule(text);
            for offset in 0..60 {
                let after = end_of_day(start + Duration::days(offset));
                let next = next_occurrence(&r, after).unwrap();
                assert!(next.and_time(NaiveTime::MIN) > after, "{text} at {after}");
            }
        }
    }
}
