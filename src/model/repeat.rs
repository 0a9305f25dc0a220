use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::Serialize;

use crate::util::date::{month_name, weekday_name};

/// Error type for repeat rules
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepeatError {
    #[error("invalid repeat expression: {0:?}")]
    InvalidExpression(String),
    #[error("repeat rule cannot be written as text: {0}")]
    Unrepresentable(String),
    #[error("repeat rule never lands on a calendar day")]
    NoOccurrence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    fn unit(self) -> &'static str {
        match self {
            Frequency::Daily => "day",
            Frequency::Weekly => "week",
            Frequency::Monthly => "month",
            Frequency::Yearly => "year",
        }
    }

    /// Name used in the `FREQ=` part of an RRULE string
    pub fn rrule_name(self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }

    pub fn from_rrule_name(s: &str) -> Option<Frequency> {
        match s {
            "DAILY" => Some(Frequency::Daily),
            "WEEKLY" => Some(Frequency::Weekly),
            "MONTHLY" => Some(Frequency::Monthly),
            "YEARLY" => Some(Frequency::Yearly),
            _ => None,
        }
    }
}

/// Day-of-month sentinel for "the last day of the month"
pub const LAST_DAY: i8 = -1;

const WORKWEEK: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// A normalized recurrence rule.
///
/// Rules are immutable: every `with_*` method returns a new rule. The
/// day-of-month and weekday selectors exclude each other, so setting one
/// clears the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatRule {
    frequency: Frequency,
    interval: u32,
    weekdays: Vec<Weekday>,
    day_of_month: Option<i8>,
    months: Vec<u32>,
}

impl Default for RepeatRule {
    /// `every day`
    fn default() -> Self {
        RepeatRule::new(Frequency::Daily)
    }
}

impl RepeatRule {
    pub fn new(frequency: Frequency) -> Self {
        RepeatRule {
            frequency,
            interval: 1,
            weekdays: Vec::new(),
            day_of_month: None,
            months: Vec::new(),
        }
    }

    /// Parse the natural-language phrase (or RRULE string) stored in a
    /// document's `repeat` field.
    pub fn from_text(text: &str) -> Result<Self, RepeatError> {
        crate::parse::repeat_text::parse_repeat(text)
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Selected weekdays, Monday first
    pub fn weekdays(&self) -> &[Weekday] {
        &self.weekdays
    }

    pub fn day_of_month(&self) -> Option<i8> {
        self.day_of_month
    }

    /// Selected months (1-based, ascending)
    pub fn months(&self) -> &[u32] {
        &self.months
    }

    // -----------------------------------------------------------------------
    // Transformations
    // -----------------------------------------------------------------------

    /// Switch frequency. Every selector is reset because selectors from one
    /// frequency rarely make sense in another.
    pub fn with_frequency(&self, frequency: Frequency) -> Self {
        RepeatRule {
            frequency,
            interval: self.interval,
            weekdays: Vec::new(),
            day_of_month: None,
            months: Vec::new(),
        }
    }

    pub fn with_interval(&self, interval: u32) -> Self {
        RepeatRule {
            interval,
            ..self.clone()
        }
    }

    /// Select weekdays, clearing any day-of-month
    pub fn with_weekdays(&self, days: &[Weekday]) -> Self {
        let mut weekdays = days.to_vec();
        weekdays.sort_by_key(|d| d.num_days_from_monday());
        weekdays.dedup();
        RepeatRule {
            weekdays,
            day_of_month: None,
            ..self.clone()
        }
    }

    /// Add the weekday if absent, remove it if present
    pub fn toggle_weekday(&self, day: Weekday) -> Self {
        let mut days = self.weekdays.clone();
        if let Some(pos) = days.iter().position(|d| *d == day) {
            days.remove(pos);
        } else {
            days.push(day);
        }
        self.with_weekdays(&days)
    }

    /// Select a day of the month (`LAST_DAY` for the last), clearing weekdays
    pub fn with_day_of_month(&self, day: i8) -> Self {
        RepeatRule {
            day_of_month: Some(day),
            weekdays: Vec::new(),
            ..self.clone()
        }
    }

    /// Turn the "last day of the month" selector on or off. Weekdays are
    /// cleared either way.
    pub fn with_last_day_of_month(&self, last: bool) -> Self {
        RepeatRule {
            day_of_month: last.then_some(LAST_DAY),
            weekdays: Vec::new(),
            ..self.clone()
        }
    }

    pub fn with_months(&self, months: &[u32]) -> Self {
        let mut months = months.to_vec();
        months.sort_unstable();
        months.dedup();
        RepeatRule {
            months,
            ..self.clone()
        }
    }

    pub fn toggle_month(&self, month: u32) -> Self {
        let mut months = self.months.clone();
        if let Some(pos) = months.iter().position(|m| *m == month) {
            months.remove(pos);
        } else {
            months.push(month);
        }
        self.with_months(&months)
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Write the rule as its canonical natural-language phrase.
    ///
    /// Fails with `Unrepresentable` for selector combinations the phrase
    /// grammar has no words for.
    pub fn to_text(&self) -> Result<String, RepeatError> {
        self.check_representable()?;

        if self.frequency == Frequency::Weekly && self.interval == 1 && self.weekdays == WORKWEEK
        {
            return Ok("every weekday".to_string());
        }

        let mut out = String::from("every ");
        if self.interval == 1 {
            out.push_str(self.frequency.unit());
        } else {
            out.push_str(&format!("{} {}s", self.interval, self.frequency.unit()));
        }

        if !self.months.is_empty() {
            let names: Vec<&str> = self.months.iter().filter_map(|m| month_name(*m)).collect();
            out.push_str(" in ");
            out.push_str(&join_list(&names));
        }

        match self.day_of_month {
            Some(LAST_DAY) => out.push_str(" on the last day"),
            Some(day) => out.push_str(&format!(" on the {}", ordinal(day))),
            None if !self.weekdays.is_empty() => {
                let names: Vec<&str> = self.weekdays.iter().map(|d| weekday_name(*d)).collect();
                out.push_str(" on ");
                out.push_str(&join_list(&names));
            }
            None => {}
        }

        Ok(out)
    }

    fn check_representable(&self) -> Result<(), RepeatError> {
        let unrepresentable = |why: &str| Err(RepeatError::Unrepresentable(why.to_string()));

        if self.interval == 0 {
            return unrepresentable("interval must be at least 1");
        }
        if let Some(day) = self.day_of_month
            && day != LAST_DAY
            && !(1..=31).contains(&day)
        {
            return unrepresentable("day of month out of range");
        }
        if self.months.iter().any(|m| !(1..=12).contains(m)) {
            return unrepresentable("month out of range");
        }

        let has_weekdays = !self.weekdays.is_empty();
        let has_day = self.day_of_month.is_some();
        let has_months = !self.months.is_empty();
        match self.frequency {
            Frequency::Daily if has_weekdays || has_day || has_months => {
                unrepresentable("daily rules take no day or month selectors")
            }
            Frequency::Weekly if has_day || has_months => {
                unrepresentable("weekly rules only select weekdays")
            }
            Frequency::Monthly if has_months => unrepresentable("monthly rules cannot select months"),
            _ => Ok(()),
        }
    }

    /// Machine form, e.g. `RRULE:FREQ=MONTHLY;INTERVAL=1;BYMONTHDAY=-1`.
    /// Always available, even when [`to_text`](Self::to_text) is not.
    pub fn to_rrule_string(&self) -> String {
        let mut out = format!(
            "RRULE:FREQ={};INTERVAL={}",
            self.frequency.rrule_name(),
            self.interval
        );
        if !self.weekdays.is_empty() {
            let codes: Vec<&str> = self.weekdays.iter().map(|d| weekday_code(*d)).collect();
            out.push_str(&format!(";BYDAY={}", codes.join(",")));
        }
        if let Some(day) = self.day_of_month {
            out.push_str(&format!(";BYMONTHDAY={}", day));
        }
        if !self.months.is_empty() {
            let months: Vec<String> = self.months.iter().map(|m| m.to_string()).collect();
            out.push_str(&format!(";BYMONTH={}", months.join(",")));
        }
        out
    }

    /// Text form when there is one, machine form otherwise
    pub fn describe(&self) -> String {
        self.to_text().unwrap_or_else(|_| self.to_rrule_string())
    }
}

impl FromStr for RepeatRule {
    type Err = RepeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepeatRule::from_text(s)
    }
}

impl fmt::Display for RepeatRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Two-letter RRULE code for a weekday
pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// `1st`, `2nd`, `3rd`, `11th`, `22nd` ...
fn ordinal(n: i8) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// `A`, `A and B`, `A, B and C`
fn join_list(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [one] => one.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
