use std::path::PathBuf;

use chrono::NaiveDate;

use crate::parse::frontmatter::Frontmatter;

/// One checklist item together with the frontmatter of the document it
/// lives in. Records are snapshots: a changed document produces a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    /// Document the task was read from
    pub path: PathBuf,
    /// Full raw text of the document
    pub text: String,
    /// Parsed frontmatter of the document
    pub frontmatter: Frontmatter,
    /// Checklist line text with the checkbox marker stripped
    pub line: String,
    /// 0-indexed position of the checklist line in the document
    pub line_index: usize,
    /// Whether the checkbox is ticked (`x` or `X`)
    pub checked: bool,
    pub due: Option<NaiveDate>,
    /// Tags normalized to a list, without a leading `#`
    pub tags: Vec<String>,
    pub urgent: bool,
    pub important: bool,
    /// Task stays out of query results until this day
    pub hide_until: Option<NaiveDate>,
}

impl TaskRecord {
    /// Whether the task carries a repeat rule
    pub fn repeats(&self) -> bool {
        self.frontmatter.repeat().is_some()
    }

    /// Most recent completion recorded in the frontmatter
    pub fn last_completed(&self) -> Option<String> {
        self.frontmatter.completed().pop()
    }

    /// Unchecked and due strictly before `day`
    pub fn is_overdue_on(&self, day: NaiveDate) -> bool {
        !self.checked && self.due.is_some_and(|due| due < day)
    }
}
