use chrono::Weekday;

use crate::model::repeat::{Frequency, LAST_DAY, RepeatError, RepeatRule};

/// Parse a repeat phrase such as `every 2 weeks on Monday and Friday` or an
/// RRULE string such as `RRULE:FREQ=MONTHLY;BYMONTHDAY=-1`.
pub fn parse_repeat(text: &str) -> Result<RepeatRule, RepeatError> {
    let trimmed = text.trim();
    let upper = trimmed.to_ascii_uppercase();
    if upper.starts_with("RRULE:") || upper.starts_with("FREQ=") {
        return parse_rrule(trimmed);
    }
    parse_phrase(trimmed)
}

// ---------------------------------------------------------------------------
// Natural-language phrases
// ---------------------------------------------------------------------------

fn parse_phrase(text: &str) -> Result<RepeatRule, RepeatError> {
    let invalid = || RepeatError::InvalidExpression(text.to_string());

    let normalized = text.to_lowercase().replace(',', " ");
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    let mut cursor = Cursor {
        tokens: &tokens,
        pos: 0,
    };

    if cursor.advance() != Some("every") {
        return Err(invalid());
    }

    let mut interval = 1;
    if let Some(tok) = cursor.peek() {
        if tok == "other" {
            interval = 2;
            cursor.pos += 1;
        } else if let Ok(n) = tok.parse::<u32>() {
            if n == 0 {
                return Err(invalid());
            }
            interval = n;
            cursor.pos += 1;
        }
    }

    let unit = cursor.advance().ok_or_else(invalid)?;
    let mut rule = match unit {
        "day" | "days" => RepeatRule::new(Frequency::Daily),
        "week" | "weeks" => RepeatRule::new(Frequency::Weekly),
        "month" | "months" => RepeatRule::new(Frequency::Monthly),
        "year" | "years" => RepeatRule::new(Frequency::Yearly),
        "weekday" | "weekdays" if interval == 1 => RepeatRule::new(Frequency::Weekly)
            .with_weekdays(&[
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ]),
        other => {
            // `every monday and thursday`
            let first = parse_weekday(other).ok_or_else(invalid)?;
            let mut days = vec![first];
            days.extend(cursor.weekday_list());
            RepeatRule::new(Frequency::Weekly).with_weekdays(&days)
        }
    }
    .with_interval(interval);

    while let Some(tok) = cursor.advance() {
        match tok {
            "in" if rule.frequency() == Frequency::Yearly && rule.months().is_empty() => {
                let months = cursor.month_list();
                if months.is_empty() {
                    return Err(invalid());
                }
                rule = rule.with_months(&months);
            }
            "on" if rule.frequency() != Frequency::Daily => {
                if cursor.peek() == Some("the") {
                    cursor.pos += 1;
                    if matches!(rule.frequency(), Frequency::Weekly) {
                        return Err(invalid());
                    }
                    let day = cursor.day_of_month().ok_or_else(invalid)?;
                    rule = rule.with_day_of_month(day);
                } else {
                    let days = cursor.weekday_list();
                    if days.is_empty() {
                        return Err(invalid());
                    }
                    let mut all = rule.weekdays().to_vec();
                    all.extend(days);
                    rule = rule.with_weekdays(&all);
                }
            }
            _ => return Err(invalid()),
        }
    }

    Ok(rule)
}

struct Cursor<'a> {
    tokens: &'a [&'a str],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<&'a str> {
        let tok = self.peek()?;
        self.pos += 1;
        Some(tok)
    }

    /// Consume weekday names, skipping `and` between them
    fn weekday_list(&mut self) -> Vec<Weekday> {
        let mut days = Vec::new();
        while let Some(tok) = self.peek() {
            if tok == "and" {
                self.pos += 1;
                continue;
            }
            match parse_weekday(tok) {
                Some(day) => {
                    days.push(day);
                    self.pos += 1;
                }
                None => break,
            }
        }
        days
    }

    fn month_list(&mut self) -> Vec<u32> {
        let mut months = Vec::new();
        while let Some(tok) = self.peek() {
            if tok == "and" {
                self.pos += 1;
                continue;
            }
            match parse_month(tok) {
                Some(m) => {
                    months.push(m);
                    self.pos += 1;
                }
                None => break,
            }
        }
        months
    }

    /// `15th`, `1st`, `last` with optional `day` / `of the month` filler
    fn day_of_month(&mut self) -> Option<i8> {
        let tok = self.advance()?;
        let day = if tok == "last" {
            LAST_DAY
        } else {
            let digits = tok.trim_end_matches(|c: char| c.is_ascii_alphabetic());
            let suffix = &tok[digits.len()..];
            if !matches!(suffix, "" | "st" | "nd" | "rd" | "th") {
                return None;
            }
            let n: i8 = digits.parse().ok()?;
            if !(1..=31).contains(&n) {
                return None;
            }
            n
        };

        if self.peek() == Some("day") {
            self.pos += 1;
        }
        if self.tokens.get(self.pos..self.pos + 3) == Some(&["of", "the", "month"][..]) {
            self.pos += 3;
        }
        Some(day)
    }
}

fn parse_weekday(tok: &str) -> Option<Weekday> {
    let tok = tok.strip_suffix('s').filter(|t| t.ends_with("day")).unwrap_or(tok);
    match tok {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

fn parse_month(tok: &str) -> Option<u32> {
    crate::util::date::MONTH_NAMES
        .iter()
        .position(|name| {
            let name = name.to_lowercase();
            tok == name || (tok.len() == 3 && name.starts_with(tok))
        })
        .map(|i| i as u32 + 1)
}

// ---------------------------------------------------------------------------
// RRULE strings
// ---------------------------------------------------------------------------

fn parse_rrule(text: &str) -> Result<RepeatRule, RepeatError> {
    let invalid = || RepeatError::InvalidExpression(text.to_string());

    let upper = text.to_ascii_uppercase();
    let body = upper.strip_prefix("RRULE:").unwrap_or(upper.as_str());

    let mut frequency = None;
    let mut interval = 1;
    let mut weekdays = Vec::new();
    let mut day_of_month = None;
    let mut months = Vec::new();

    for part in body.split(';').filter(|p| !p.is_empty()) {
        let (key, value) = part.split_once('=').ok_or_else(invalid)?;
        match key {
            "FREQ" => frequency = Some(Frequency::from_rrule_name(value).ok_or_else(invalid)?),
            "INTERVAL" => {
                interval = value.parse::<u32>().map_err(|_| invalid())?;
                if interval == 0 {
                    return Err(invalid());
                }
            }
            "BYDAY" => {
                for code in value.split(',') {
                    weekdays.push(parse_weekday_code(code).ok_or_else(invalid)?);
                }
            }
            "BYMONTHDAY" => {
                let day: i8 = value.parse().map_err(|_| invalid())?;
                if day != LAST_DAY && !(1..=31).contains(&day) {
                    return Err(invalid());
                }
                day_of_month = Some(day);
            }
            "BYMONTH" => {
                for m in value.split(',') {
                    let m: u32 = m.parse().map_err(|_| invalid())?;
                    if !(1..=12).contains(&m) {
                        return Err(invalid());
                    }
                    months.push(m);
                }
            }
            "WKST" => {}
            _ => return Err(invalid()),
        }
    }

    if !weekdays.is_empty() && day_of_month.is_some() {
        return Err(invalid());
    }

    let mut rule = RepeatRule::new(frequency.ok_or_else(invalid)?).with_interval(interval);
    if !weekdays.is_empty() {
        rule = rule.with_weekdays(&weekdays);
    }
    if let Some(day) = day_of_month {
        rule = rule.with_day_of_month(day);
    }
    if !months.is_empty() {
        rule = rule.with_months(&months);
    }
    Ok(rule)
}

fn parse_weekday_code(code: &str) -> Option<Weekday> {
    match code {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}
