use chrono::NaiveDate;
use tracing::warn;

use crate::io::document_io::Document;
use crate::model::repeat::{RepeatError, RepeatRule};
use crate::ops::recurrence::next_due_after;
use crate::parse::checklist::{find_checklist_items, parse_checklist_line, set_line_checked};
use crate::parse::frontmatter::{Frontmatter, FrontmatterError};
use crate::util::date::format_day;

/// Error type for completing or reopening a task document
#[derive(Debug, thiserror::Error)]
pub enum CompleteError {
    #[error("document has no checklist item")]
    NoTask,
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),
    #[error(transparent)]
    Repeat(#[from] RepeatError),
}

/// What completing a task did to its document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Checkbox ticked
    Checked,
    /// Checkbox was already ticked; nothing changed
    AlreadyChecked,
    /// Repeating task: left unchecked with a new due date
    RolledForward { due: NaiveDate },
}

/// Record `today` in the `completed` history. A legacy single-string value
/// is migrated into a list first.
pub fn set_completed(frontmatter: &mut Frontmatter, today: NaiveDate) {
    let mut history = frontmatter.completed();
    if frontmatter.contains("completed") && history.is_empty() {
        warn!("unexpected value in completed field, replacing it");
    }
    history.push(format_day(today));
    frontmatter.set_completed(history);
}

/// Move `due` to the first occurrence of the repeat rule after the end of
/// `today`. Returns `None` if the frontmatter has no repeat rule.
pub fn set_due_date(
    frontmatter: &mut Frontmatter,
    today: NaiveDate,
) -> Result<Option<NaiveDate>, RepeatError> {
    let Some(text) = frontmatter.repeat() else {
        return Ok(None);
    };
    let rule = RepeatRule::from_text(text)?;
    let due = next_due_after(&rule, today)?;
    frontmatter.set_due(due);
    Ok(Some(due))
}

/// Append a completion and advance `due`, leaving `frontmatter` untouched
/// if the repeat rule is invalid.
fn advance(frontmatter: &mut Frontmatter, today: NaiveDate) -> Result<Option<NaiveDate>, RepeatError> {
    let mut next = frontmatter.clone();
    let Some(due) = set_due_date(&mut next, today)? else {
        return Ok(None);
    };
    set_completed(&mut next, today);
    *frontmatter = next;
    Ok(Some(due))
}

fn first_item(doc: &Document) -> Result<usize, CompleteError> {
    find_checklist_items(&doc.lines)
        .first()
        .copied()
        .ok_or(CompleteError::NoTask)
}

fn set_checked(doc: &mut Document, index: usize, checked: bool) {
    if let Some(line) = set_line_checked(&doc.lines[index], checked) {
        doc.lines[index] = line;
    }
}

/// Complete the task in `doc`.
///
/// A repeating task is rolled forward in memory instead of being checked:
/// it stays unchecked, gains a `completed` entry and a new `due`. Either way
/// the caller persists the document with one write.
pub fn complete_task(doc: &mut Document, today: NaiveDate) -> Result<Completion, CompleteError> {
    let index = first_item(doc)?;
    let mut frontmatter = Frontmatter::from_lines(&doc.lines)?;

    if let Some(due) = advance(&mut frontmatter, today)? {
        set_checked(doc, index, false);
        frontmatter.serialize(&mut doc.lines)?;
        return Ok(Completion::RolledForward { due });
    }

    let already = parse_checklist_line(&doc.lines[index]).is_some_and(|item| item.checked);
    if already {
        return Ok(Completion::AlreadyChecked);
    }
    set_checked(doc, index, true);
    Ok(Completion::Checked)
}

/// Uncheck the task in `doc`. Returns whether anything changed.
pub fn reopen_task(doc: &mut Document) -> Result<bool, CompleteError> {
    let index = first_item(doc)?;
    let checked = parse_checklist_line(&doc.lines[index]).is_some_and(|item| item.checked);
    if checked {
        set_checked(doc, index, false);
    }
    Ok(checked)
}

/// Roll a repeating task forward after its checkbox was ticked outside the
/// tool: uncheck the task's line, record the completion and advance
/// `due`. Returns the new due date, or `None` if there was nothing to do.
pub fn roll_forward_if_checked(
    doc: &mut Document,
    today: NaiveDate,
) -> Result<Option<NaiveDate>, CompleteError> {
    let mut frontmatter = Frontmatter::from_lines(&doc.lines)?;
    if frontmatter.repeat().is_none() {
        return Ok(None);
    }

    // Only the task's own line counts; ticked subtasks leave it open
    let Some(index) = find_checklist_items(&doc.lines).first().copied() else {
        return Ok(None);
    };
    if !parse_checklist_line(&doc.lines[index]).is_some_and(|item| item.checked) {
        return Ok(None);
    }

    let Some(due) = advance(&mut frontmatter, today)? else {
        return Ok(None);
    };
    set_checked(doc, index, false);
    frontmatter.serialize(&mut doc.lines)?;
    Ok(Some(due))
}
