use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::query::GroupKey;
use crate::model::task::TaskRecord;
use crate::ops::score::score;
use crate::util::date::format_day;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub file: String,
    pub description: String,
    pub checked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub urgent: bool,
    pub important: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_until: Option<String>,
    pub score: f64,
}

#[derive(Serialize)]
pub struct GroupJson {
    /// Group heading; empty when the query does not group
    pub group: String,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct CreatedJson {
    pub file: String,
}

#[derive(Serialize)]
pub struct CompletionJson {
    pub file: String,
    pub checked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
}

#[derive(Serialize)]
pub struct NextJson {
    pub rule: String,
    pub occurrences: Vec<String>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Path of a task relative to `root`, for display
pub fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

pub fn task_to_json(task: &TaskRecord, root: &Path, today: NaiveDate) -> TaskJson {
    TaskJson {
        file: display_path(&task.path, root),
        description: task.line.clone(),
        checked: task.checked,
        due: task.due.map(format_day),
        repeat: task.frontmatter.repeat().map(str::to_string),
        tags: task.tags.clone(),
        urgent: task.urgent,
        important: task.important,
        hide_until: task.hide_until.map(format_day),
        score: score(task, today),
    }
}

pub fn groups_to_json(
    groups: &[(GroupKey, Vec<TaskRecord>)],
    root: &Path,
    today: NaiveDate,
) -> Vec<GroupJson> {
    groups
        .iter()
        .map(|(key, tasks)| GroupJson {
            group: key.to_string(),
            tasks: tasks.iter().map(|t| task_to_json(t, root, today)).collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// One task as a checklist line with its due date, tags and flags
pub fn format_task_line(task: &TaskRecord) -> String {
    let check = if task.checked { 'x' } else { ' ' };
    let mut line = format!("- [{}] {}", check, task.line);
    if let Some(due) = task.due {
        line.push_str(&format!(" (due {})", format_day(due)));
    }
    for tag in &task.tags {
        line.push_str(&format!(" #{}", tag));
    }
    if task.urgent {
        line.push_str(" [urgent]");
    }
    if task.important {
        line.push_str(" [important]");
    }
    line
}

/// A query result as `## group` sections of task lines. Ungrouped results
/// have no heading.
pub fn format_listing(groups: &[(GroupKey, Vec<TaskRecord>)]) -> Vec<String> {
    let mut lines = Vec::new();
    for (key, tasks) in groups {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        if *key != GroupKey::All {
            lines.push(format!("## {}", key));
        }
        lines.extend(tasks.iter().map(format_task_line));
    }
    if lines.is_empty() {
        lines.push("no tasks".to_string());
    }
    lines
}
