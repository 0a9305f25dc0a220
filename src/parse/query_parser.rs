use tracing::warn;

use crate::model::query::{GroupBy, QueryConfig, SortKey};
use crate::util::date::{parse_day, start_of_week_sunday};

/// Build a [`QueryConfig`] from `key: value` lines.
///
/// Blank lines and unknown keys are ignored. Malformed lines and invalid
/// values are logged and skipped. Selecting a day or a week forces
/// `due: true`, even over a later `due: false`.
pub fn build_configuration<S: AsRef<str>>(lines: &[S]) -> QueryConfig {
    let mut config = QueryConfig::default();
    let mut selected = false;

    for raw in lines {
        let line = raw.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            warn!(line, "query line is not `key: value`, skipping");
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() {
            warn!(line, "query line has no key, skipping");
            continue;
        }

        match key {
            "overdue" => set_bool(&mut config.overdue, line, value),
            "due" => set_bool(&mut config.due, line, value),
            "no-due" => set_bool(&mut config.no_due, line, value),
            "completed" => match parse_bool(value) {
                Some(b) => config.completed = Some(b),
                None => warn!(line, "expected true or false, skipping"),
            },
            "sort" => {
                config.sort = match value {
                    "due" => Some(SortKey::Due),
                    "score" => Some(SortKey::Score),
                    _ => {
                        warn!(line, "unknown sort key, sorting disabled");
                        None
                    }
                }
            }
            "group" => {
                config.group = match value {
                    "due" => Some(GroupBy::Due),
                    "completed" => Some(GroupBy::Completed),
                    _ => {
                        warn!(line, "unknown group key, grouping disabled");
                        None
                    }
                }
            }
            "select-tags" => config.select_tags = parse_tag_list(value),
            "omit-tags" => config.omit_tags = parse_tag_list(value),
            "select-day" => match parse_day(value) {
                Some(day) => {
                    config.select_day = Some(day);
                    selected = true;
                }
                None => warn!(line, "select-day is not a YYYY-MM-DD date, skipping"),
            },
            "select-week" => match parse_day(value) {
                Some(day) => {
                    config.select_week = Some(start_of_week_sunday(day));
                    selected = true;
                }
                None => warn!(line, "select-week is not a YYYY-MM-DD date, skipping"),
            },
            _ => {}
        }
    }

    if selected {
        config.due = true;
    }
    config
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn set_bool(slot: &mut bool, line: &str, value: &str) {
    match parse_bool(value) {
        Some(b) => *slot = b,
        None => warn!(line, "expected true or false, skipping"),
    }
}

/// Parse `work` or `[work, home/garden]` into a tag list, dropping any
/// leading `#`.
pub fn parse_tag_list(value: &str) -> Vec<String> {
    let value = value.trim();
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);
    inner
        .split(',')
        .map(|t| t.trim().trim_matches(['"', '\'']).trim_start_matches('#'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
