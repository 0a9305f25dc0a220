use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::util::date::format_day;

/// How tasks are ordered inside a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Due,
    Score,
}

/// How tasks are split into groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Due,
    Completed,
}

/// Declarative filter/sort/group options for a task list.
///
/// Built from `key: value` lines by
/// [`build_configuration`](crate::parse::query_parser::build_configuration).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryConfig {
    /// Keep tasks due before the reference day
    pub overdue: bool,
    /// Keep tasks that have a due date
    pub due: bool,
    /// Keep tasks without a due date
    pub no_due: bool,
    /// `Some(true)` keeps only checked tasks, `Some(false)` only unchecked
    pub completed: Option<bool>,
    pub sort: Option<SortKey>,
    pub group: Option<GroupBy>,
    pub select_tags: Vec<String>,
    pub omit_tags: Vec<String>,
    pub select_day: Option<NaiveDate>,
    /// Sunday that starts the selected week
    pub select_week: Option<NaiveDate>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            overdue: true,
            due: true,
            no_due: true,
            completed: None,
            sort: None,
            group: None,
            select_tags: Vec::new(),
            omit_tags: Vec::new(),
            select_day: None,
            select_week: None,
        }
    }
}

impl QueryConfig {
    /// Day that "overdue" is measured against: the selected day, else the
    /// selected week's start, else `today`.
    pub fn overdue_reference(&self, today: NaiveDate) -> NaiveDate {
        self.select_day.or(self.select_week).unwrap_or(today)
    }
}

/// Key of one group in a query result.
///
/// The derived ordering is the display ordering: dates chronologically with
/// `NoDue` after every date, and `Incomplete` before `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    /// Single implicit group when no grouping is configured
    All,
    Due(NaiveDate),
    NoDue,
    Incomplete,
    Complete,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::All => Ok(()),
            GroupKey::Due(date) => write!(f, "{}", format_day(*date)),
            GroupKey::NoDue => write!(f, "No Due Date"),
            GroupKey::Incomplete => write!(f, "Incomplete"),
            GroupKey::Complete => write!(f, "Complete"),
        }
    }
}
