use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::io::document_io::{
    Document, DocumentError, atomic_write, read_document, write_document,
};
use crate::model::task::TaskRecord;
use crate::ops::complete::{CompleteError, Completion, complete_task, reopen_task, roll_forward_if_checked};
use crate::ops::task_builder::{TaskRead, build_task};
use crate::parse::checklist::find_checklist_items;

/// A `hide-until` rewrite removes the field, so one rewrite always settles
/// the document. The second is only reached if a write did not stick.
const MAX_REWRITES: usize = 2;

/// What a sync pass did to the documents it visited
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Documents indexed as tasks
    pub tasks: usize,
    /// Expired `hide-until` fields removed
    pub unhidden: usize,
    /// Checked repeating tasks rolled forward
    pub rolled_forward: usize,
    /// Documents skipped because they failed to parse
    pub skipped: usize,
}

/// In-memory index of task records by document path
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: BTreeMap<PathBuf, TaskRecord>,
    report: SyncReport,
}

impl DocumentError {
    fn at(path: &Path, err: CompleteError) -> Self {
        let path = path.to_path_buf();
        match err {
            CompleteError::NoTask => DocumentError::NoTask(path),
            CompleteError::Frontmatter(source) => DocumentError::Frontmatter { path, source },
            CompleteError::Repeat(source) => DocumentError::Repeat { path, source },
        }
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every `*.md` document under `dir`. Documents that fail to
    /// parse are logged and skipped; a missing directory is an empty store.
    pub fn load(dir: &Path, today: NaiveDate) -> Result<Self, DocumentError> {
        let mut store = TaskStore::new();
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "tasks directory does not exist");
            return Ok(store);
        }

        for path in markdown_files(dir)? {
            if let Err(e) = store.handle_modified(&path, today) {
                warn!(path = %path.display(), error = %e, "skipping document");
                store.report.skipped += 1;
            }
        }
        store.report.tasks = store.tasks.len();
        Ok(store)
    }

    /// Re-read a changed document.
    ///
    /// A checked repeating task is rolled forward and an expired
    /// `hide-until` is dropped, each costing one write. The record is then
    /// replaced, or removed if the document no longer holds a task.
    pub fn handle_modified(&mut self, path: &Path, today: NaiveDate) -> Result<(), DocumentError> {
        let mut doc = read_document(path)?;

        match roll_forward_if_checked(&mut doc, today) {
            Ok(Some(due)) => {
                write_document(path, &doc)?;
                info!(path = %path.display(), due = %due, "repeating task rolled forward");
                self.report.rolled_forward += 1;
            }
            Ok(None) => {}
            Err(e) => {
                self.remove(path);
                return Err(DocumentError::at(path, e));
            }
        }

        let mut text = doc.to_text();
        for _ in 0..MAX_REWRITES {
            let items = find_checklist_items(&Document::from_text(&text).lines);
            let read = build_task(path, &text, &items, today).map_err(|source| {
                self.remove(path);
                DocumentError::Frontmatter {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

            match read {
                TaskRead::Task(task) => {
                    debug!(path = %path.display(), "task indexed");
                    self.tasks.insert(path.to_path_buf(), task);
                    return Ok(());
                }
                TaskRead::NoTask => {
                    self.remove(path);
                    return Ok(());
                }
                TaskRead::NeedsRewrite(rewritten) => {
                    atomic_write(path, rewritten.as_bytes()).map_err(|e| {
                        DocumentError::WriteError {
                            path: path.to_path_buf(),
                            source: e,
                        }
                    })?;
                    info!(path = %path.display(), "expired hide-until removed");
                    self.report.unhidden += 1;
                    text = rewritten;
                }
            }
        }

        warn!(path = %path.display(), "document kept asking for a rewrite");
        self.remove(path);
        Ok(())
    }

    pub fn handle_deleted(&mut self, path: &Path) -> Option<TaskRecord> {
        self.remove(path)
    }

    pub fn handle_renamed(
        &mut self,
        old: &Path,
        new: &Path,
        today: NaiveDate,
    ) -> Result<(), DocumentError> {
        self.remove(old);
        self.handle_modified(new, today)
    }

    fn remove(&mut self, path: &Path) -> Option<TaskRecord> {
        let removed = self.tasks.remove(path);
        if removed.is_some() {
            debug!(path = %path.display(), "task removed");
        }
        removed
    }

    pub fn get(&self, path: &Path) -> Option<&TaskRecord> {
        self.tasks.get(path)
    }

    /// All records, sorted by path
    pub fn tasks(&self) -> Vec<TaskRecord> {
        self.tasks.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn report(&self) -> &SyncReport {
        &self.report
    }
}

/// `*.md` files under `dir`, recursively, sorted
fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>, DocumentError> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let entries = fs::read_dir(&current).map_err(|e| DocumentError::ReadError {
            path: current.clone(),
            source: e,
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| DocumentError::ReadError {
                path: current.clone(),
                source: e,
            })?;
            let path = entry.path();
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if hidden {
                continue;
            }
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some("md") {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

// ---------------------------------------------------------------------------
// Single-document updates
// ---------------------------------------------------------------------------

/// Complete the task in the document at `path` and persist it
pub fn complete_file(path: &Path, today: NaiveDate) -> Result<Completion, DocumentError> {
    let mut doc = read_document(path)?;
    let outcome = complete_task(&mut doc, today).map_err(|e| DocumentError::at(path, e))?;
    if outcome != Completion::AlreadyChecked {
        write_document(path, &doc)?;
    }
    Ok(outcome)
}

/// Uncheck the task in the document at `path`. Returns whether it changed.
pub fn reopen_file(path: &Path) -> Result<bool, DocumentError> {
    let mut doc = read_document(path)?;
    let changed = reopen_task(&mut doc).map_err(|e| DocumentError::at(path, e))?;
    if changed {
        write_document(path, &doc)?;
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 6, 6).unwrap()
    }

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_load_indexes_tasks_and_skips_broken() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b.md", "- [ ] second\n");
        write(tmp.path(), "a.md", "---\ndue: 2021-06-07\n---\n- [ ] first\n");
        write(tmp.path(), "notes.md", "no tasks here\n");
        write(tmp.path(), "broken.md", "---\ndue: 2021-06-07\n- [ ] never closed\n");
        write(tmp.path(), "readme.txt", "- [ ] not markdown\n");
        write(tmp.path(), "sub/c.md", "- [x] nested\n");

        let store = TaskStore::load(tmp.path(), today()).unwrap();
        let names: Vec<String> = store.tasks().into_iter().map(|t| t.line).collect();
        assert_eq!(names, vec!["first", "second", "nested"]);
        assert_eq!(store.report().tasks, 3);
        assert_eq!(store.report().skipped, 1);
    }

    #[test]
    fn test_unreachable_repeat_skips_only_that_document() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "- [ ] healthy\n");
        let b = write(
            tmp.path(),
            "b.md",
            "---\nrepeat: every 20000000 weeks\n---\n- [x] done\n",
        );
        let before = fs::read_to_string(&b).unwrap();

        let store = TaskStore::load(tmp.path(), today()).unwrap();
        let names: Vec<String> = store.tasks().into_iter().map(|t| t.line).collect();
        assert_eq!(names, vec!["healthy"]);
        assert_eq!(store.report().skipped, 1);
        assert_eq!(fs::read_to_string(&b).unwrap(), before);
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = TaskStore::load(&tmp.path().join("nope"), today()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_expired_hide_until_rewritten_once() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            "t.md",
            "---\nhide-until: 2021-06-01\n---\n- [ ] visible now\n",
        );
        let mut store = TaskStore::new();
        store.handle_modified(&path, today()).unwrap();

        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(!on_disk.contains("hide-until"));
        assert_eq!(store.report().unhidden, 1);
        assert_eq!(store.get(&path).unwrap().hide_until, None);

        store.handle_modified(&path, today()).unwrap();
        assert_eq!(store.report().unhidden, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), on_disk);
    }

    #[test]
    fn test_checked_repeating_task_rolled_forward() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            "t.md",
            "---\ndue: 2021-06-06\nrepeat: every day\n---\n- [x] Stretch\n",
        );
        let mut store = TaskStore::new();
        store.handle_modified(&path, today()).unwrap();

        let task = store.get(&path).unwrap();
        assert!(!task.checked);
        assert_eq!(task.due, NaiveDate::from_ymd_opt(2021, 6, 7));
        assert_eq!(task.last_completed().as_deref(), Some("2021-06-06"));
        assert_eq!(store.report().rolled_forward, 1);
    }

    #[test]
    fn test_modified_to_no_task_removes_record() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "t.md", "- [ ] task\n");
        let mut store = TaskStore::new();
        store.handle_modified(&path, today()).unwrap();
        assert_eq!(store.len(), 1);

        fs::write(&path, "just notes now\n").unwrap();
        store.handle_modified(&path, today()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_broken_edit_drops_stale_record() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "t.md", "- [ ] task\n");
        let mut store = TaskStore::new();
        store.handle_modified(&path, today()).unwrap();

        fs::write(&path, "---\nfoo: bar\n- [ ] task\n").unwrap();
        assert!(store.handle_modified(&path, today()).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_and_rename() {
        let tmp = TempDir::new().unwrap();
        let old = write(tmp.path(), "old.md", "- [ ] moving\n");
        let mut store = TaskStore::new();
        store.handle_modified(&old, today()).unwrap();

        let new = tmp.path().join("new.md");
        fs::rename(&old, &new).unwrap();
        store.handle_renamed(&old, &new, today()).unwrap();
        assert!(store.get(&old).is_none());
        assert_eq!(store.get(&new).unwrap().line, "moving");

        assert!(store.handle_deleted(&new).is_some());
        assert!(store.handle_deleted(&new).is_none());
    }

    #[test]
    fn test_complete_and_reopen_file() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "t.md", "- [ ] once\n");
        assert_eq!(complete_file(&path, today()).unwrap(), Completion::Checked);
        assert_eq!(fs::read_to_string(&path).unwrap(), "- [x] once\n");
        assert!(reopen_file(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "- [ ] once\n");
    }

    #[test]
    fn test_complete_file_invalid_repeat_untouched() {
        let tmp = TempDir::new().unwrap();
        let text = "---\nrepeat: fortnightly-ish\n---\n- [ ] a\n";
        let path = write(tmp.path(), "t.md", text);
        let err = complete_file(&path, today()).unwrap_err();
        assert!(matches!(err, DocumentError::Repeat { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }
}
