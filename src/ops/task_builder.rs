use std::path::Path;

use chrono::NaiveDate;
use tracing::debug;

use crate::io::document_io::Document;
use crate::model::task::TaskRecord;
use crate::parse::checklist::parse_checklist_line;
use crate::parse::frontmatter::{Frontmatter, FrontmatterError};

/// Outcome of reading a document as a task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskRead {
    Task(TaskRecord),
    /// The document carried a `hide-until` day that has passed. The field
    /// was dropped; this is the full rewritten text to persist before
    /// reading again.
    NeedsRewrite(String),
    /// No checklist item: not a task document
    NoTask,
}

/// Build a task record from a document and the positions of its checklist
/// lines. Only the first checklist item is used.
pub fn build_task(
    path: &Path,
    text: &str,
    checklist_lines: &[usize],
    today: NaiveDate,
) -> Result<TaskRead, FrontmatterError> {
    let mut doc = Document::from_text(text);

    let Some(&line_index) = checklist_lines.first() else {
        return Ok(TaskRead::NoTask);
    };
    let Some(item) = doc.lines.get(line_index).and_then(|l| parse_checklist_line(l)) else {
        return Ok(TaskRead::NoTask);
    };

    let mut frontmatter = Frontmatter::from_lines(&doc.lines)?;

    if frontmatter.hide_until().is_some_and(|day| day < today) {
        frontmatter.remove("hide-until");
        frontmatter.serialize(&mut doc.lines)?;
        return Ok(TaskRead::NeedsRewrite(doc.to_text()));
    }

    let due = frontmatter.due();
    if due.is_none() && frontmatter.contains("due") {
        debug!(path = %path.display(), "ignoring unparseable due date");
    }

    Ok(TaskRead::Task(TaskRecord {
        path: path.to_path_buf(),
        text: text.to_string(),
        line: item.description,
        line_index,
        checked: item.checked,
        due,
        tags: frontmatter.tags(),
        urgent: frontmatter.urgent(),
        important: frontmatter.important(),
        hide_until: frontmatter.hide_until(),
        frontmatter,
    }))
}
