use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::model::repeat::{RepeatError, RepeatRule};
use crate::parse::frontmatter::{DELIMITER, Frontmatter, FrontmatterError};

/// Fields for a new task document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub description: String,
    pub due: Option<NaiveDate>,
    pub hide_until: Option<NaiveDate>,
    pub repeat: Option<String>,
    pub tags: Vec<String>,
    pub urgent: bool,
    pub important: bool,
}

/// Error type for creating task documents
#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("task description is empty")]
    EmptyDescription,
    #[error(transparent)]
    Repeat(#[from] RepeatError),
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),
}

impl NewTask {
    pub fn new(description: impl Into<String>) -> Self {
        NewTask {
            description: description.into(),
            ..Default::default()
        }
    }

    /// Check the description and repeat rule. The repeat text is normalized
    /// to its canonical phrase when it has one.
    pub fn validate(mut self) -> Result<Self, CreateError> {
        self.description = self.description.trim().to_string();
        if self.description.is_empty() {
            return Err(CreateError::EmptyDescription);
        }
        if let Some(text) = &self.repeat {
            let rule = RepeatRule::from_text(text)?;
            self.repeat = Some(rule.describe());
        }
        Ok(self)
    }
}

/// Render a new task document: a frontmatter block holding only the fields
/// that are set, then the checklist line.
pub fn format_new_task(task: &NewTask) -> Result<String, CreateError> {
    let mut fm = Frontmatter::default();
    if let Some(due) = task.due {
        fm.set_due(due);
    }
    if let Some(repeat) = &task.repeat {
        fm.set_repeat(repeat);
    }
    if let Some(day) = task.hide_until {
        fm.set("hide-until", crate::util::date::format_day(day));
    }
    if !task.tags.is_empty() {
        let tags: Vec<String> = task
            .tags
            .iter()
            .map(|t| t.trim().trim_start_matches('#').to_string())
            .filter(|t| !t.is_empty())
            .collect();
        fm.set_tags(&tags);
    }
    if task.urgent {
        fm.set("urgent", true);
    }
    if task.important {
        fm.set("important", true);
    }

    let mut out = String::new();
    if !fm.is_empty() {
        out.push_str(DELIMITER);
        out.push('\n');
        out.push_str(&fm.to_yaml()?);
        out.push_str(DELIMITER);
        out.push_str("\n\n");
    }
    out.push_str("- [ ] ");
    out.push_str(task.description.trim());
    out.push('\n');
    Ok(out)
}

/// Lowercase ASCII slug of a description, words joined by `-`
pub fn slugify(description: &str) -> String {
    let mut slug = String::new();
    for word in description
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        if slug.len() + word.len() > 40 {
            break;
        }
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.push_str(&word.to_ascii_lowercase());
    }
    slug
}

/// A free `task-<slug>.md` path in `dir`, adding `-2`, `-3`, … on collision
pub fn new_task_file_name(dir: &Path, description: &str) -> PathBuf {
    let slug = slugify(description);
    let stem = if slug.is_empty() {
        "task".to_string()
    } else {
        format!("task-{slug}")
    };

    let mut path = dir.join(format!("{stem}.md"));
    let mut n = 2;
    while path.exists() {
        path = dir.join(format!("{stem}-{n}.md"));
        n += 1;
    }
    path
}
