use chrono::{Duration, NaiveDate};
use indexmap::IndexMap;

use crate::model::query::{GroupBy, GroupKey, QueryConfig, SortKey};
use crate::model::task::TaskRecord;
use crate::ops::score::compare_by_score;

/// A predicate over task records
pub type Filter = Box<dyn Fn(&TaskRecord) -> bool>;

/// Whether a task tag falls under a filter tag: `work` matches `work` and
/// `work/email`, but not `workshop`.
pub fn tag_matches(filter: &str, tag: &str) -> bool {
    let filter = filter.trim_start_matches('#');
    let tag = tag.trim_start_matches('#');
    tag == filter
        || tag
            .strip_prefix(filter)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn any_tag_matches(filters: &[String], tags: &[String]) -> bool {
    tags.iter()
        .any(|tag| filters.iter().any(|f| tag_matches(f, tag)))
}

/// Build the ordered filter list for a configuration.
///
/// A task is kept only when every filter passes. Tasks hidden until a
/// future day are always dropped first.
pub fn build_filters(config: &QueryConfig, today: NaiveDate) -> Vec<Filter> {
    let mut filters: Vec<Filter> = Vec::new();
    let reference = config.overdue_reference(today);

    filters.push(Box::new(move |task: &TaskRecord| {
        task.hide_until.is_none_or(|day| day <= reference)
    }));

    // Cheap and bulk comparisons first
    match (config.due, config.no_due) {
        (true, true) => {}
        (true, false) => filters.push(Box::new(|task: &TaskRecord| task.due.is_some())),
        (false, true) => filters.push(Box::new(|task: &TaskRecord| task.due.is_none())),
        (false, false) => filters.push(Box::new(|_: &TaskRecord| false)),
    }

    if !config.overdue && config.select_day.is_none() && config.select_week.is_none() {
        filters.push(Box::new(move |task: &TaskRecord| {
            task.due.is_none_or(|due| due >= today)
        }));
    }

    if let Some(day) = config.select_day {
        let overdue = config.overdue;
        filters.push(Box::new(move |task: &TaskRecord| match task.due {
            None => true,
            Some(due) => due == day || (overdue && due < day),
        }));
    }

    if let Some(completed) = config.completed {
        filters.push(Box::new(move |task: &TaskRecord| task.checked == completed));
    }

    // Targeted per-task inspection last
    if !config.select_tags.is_empty() {
        let select = config.select_tags.clone();
        filters.push(Box::new(move |task: &TaskRecord| {
            any_tag_matches(&select, &task.tags)
        }));
    }

    if !config.omit_tags.is_empty() {
        let omit = config.omit_tags.clone();
        filters.push(Box::new(move |task: &TaskRecord| {
            !any_tag_matches(&omit, &task.tags)
        }));
    }

    if let Some(start) = config.select_week {
        let end = start + Duration::days(7);
        let overdue = config.overdue;
        filters.push(Box::new(move |task: &TaskRecord| match task.due {
            None => true,
            Some(due) => due < end && (overdue || due >= start),
        }));
    }

    filters
}

/// Keep the tasks that pass every filter, in input order
pub fn apply_filters(tasks: &[TaskRecord], filters: &[Filter]) -> Vec<TaskRecord> {
    tasks
        .iter()
        .filter(|task| filters.iter().all(|f| f(task)))
        .cloned()
        .collect()
}

fn group_key(task: &TaskRecord, group: Option<GroupBy>) -> GroupKey {
    match group {
        None => GroupKey::All,
        Some(GroupBy::Due) => task.due.map_or(GroupKey::NoDue, GroupKey::Due),
        Some(GroupBy::Completed) if task.checked => GroupKey::Complete,
        Some(GroupBy::Completed) => GroupKey::Incomplete,
    }
}

/// Split tasks into groups. Groups appear in first-seen order; see
/// [`sort_group_keys`] for display order.
pub fn group(tasks: Vec<TaskRecord>, config: &QueryConfig) -> IndexMap<GroupKey, Vec<TaskRecord>> {
    let mut groups: IndexMap<GroupKey, Vec<TaskRecord>> = IndexMap::new();
    for task in tasks {
        groups
            .entry(group_key(&task, config.group))
            .or_default()
            .push(task);
    }
    groups
}

/// Order group keys for display: dates chronologically with "No Due Date"
/// last, and "Incomplete" before "Complete".
pub fn sort_group_keys(keys: &mut [GroupKey]) {
    keys.sort();
}

/// Order tasks inside one group. Without a sort key the input order is kept.
///
/// `sort: due` puts the earliest due date first and undated tasks last.
/// `sort: score` is not a plain descending sort on [`score`](crate::ops::score::score):
/// overdue and due-today tasks score at or below zero, so they form their own
/// leading band ordered most overdue first. The rest follow by descending
/// score, then checked tasks. See [`compare_by_score`].
pub fn sort_tasks_within_group(tasks: &mut [TaskRecord], config: &QueryConfig, today: NaiveDate) {
    match config.sort {
        None => {}
        Some(SortKey::Due) => tasks.sort_by(|a, b| match (a.due, b.due) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }),
        Some(SortKey::Score) => tasks.sort_by(|a, b| compare_by_score(a, b, today)),
    }
}

/// Filter, group and sort in one pass
pub fn run_query(
    tasks: &[TaskRecord],
    config: &QueryConfig,
    today: NaiveDate,
) -> Vec<(GroupKey, Vec<TaskRecord>)> {
    let filters = build_filters(config, today);
    let kept = apply_filters(tasks, &filters);
    let mut groups = group(kept, config);

    let mut keys: Vec<GroupKey> = groups.keys().copied().collect();
    sort_group_keys(&mut keys);

    keys.into_iter()
        .filter_map(|key| {
            let mut tasks = groups.shift_remove(&key)?;
            sort_tasks_within_group(&mut tasks, config, today);
            Some((key, tasks))
        })
        .collect()
}
