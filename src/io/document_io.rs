use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::repeat::RepeatError;
use crate::parse::frontmatter::FrontmatterError;

/// Error type for reading and writing task documents
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("{path}: {source}")]
    Frontmatter {
        path: PathBuf,
        source: FrontmatterError,
    },
    #[error("{path}: {source}")]
    Repeat { path: PathBuf, source: RepeatError },
    #[error("{0} has no checklist item")]
    NoTask(PathBuf),
}

/// A document split into lines. Line endings are normalized to `\n`; the
/// trailing newline is remembered so a rewrite keeps it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub lines: Vec<String>,
    pub trailing_newline: bool,
}

impl Document {
    pub fn from_text(text: &str) -> Self {
        let trailing_newline = text.ends_with('\n');
        let body = text.strip_suffix('\n').unwrap_or(text);
        let lines = if text.is_empty() {
            Vec::new()
        } else {
            body.split('\n')
                .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
                .collect()
        };
        Document {
            lines,
            trailing_newline,
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = self.lines.join("\n");
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }
}

pub fn read_document(path: &Path) -> Result<Document, DocumentError> {
    let text = fs::read_to_string(path).map_err(|e| DocumentError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Document::from_text(&text))
}

/// Write a document in one atomic replace
pub fn write_document(path: &Path, doc: &Document) -> Result<(), DocumentError> {
    atomic_write(path, doc.to_text().as_bytes()).map_err(|e| DocumentError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_text_tracks_trailing_newline() {
        let doc = Document::from_text("a\nb\n");
        assert_eq!(doc.lines, vec!["a", "b"]);
        assert!(doc.trailing_newline);
        assert_eq!(doc.to_text(), "a\nb\n");

        let doc = Document::from_text("a\nb");
        assert!(!doc.trailing_newline);
        assert_eq!(doc.to_text(), "a\nb");
    }

    #[test]
    fn test_blank_lines_kept() {
        let doc = Document::from_text("---\n---\n\n- [ ] x\n\n");
        assert_eq!(doc.lines, vec!["---", "---", "", "- [ ] x", ""]);
        assert_eq!(doc.to_text(), "---\n---\n\n- [ ] x\n\n");
    }

    #[test]
    fn test_crlf_normalized() {
        let doc = Document::from_text("a\r\nb\r\n");
        assert_eq!(doc.lines, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_text() {
        let doc = Document::from_text("");
        assert!(doc.lines.is_empty());
        assert_eq!(doc.to_text(), "");
    }

    #[test]
    fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("task.md");
        let doc = Document::from_text("- [ ] hello\n");
        write_document(&path, &doc).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "- [ ] hello\n");
        assert_eq!(read_document(&path).unwrap(), doc);

        let doc = Document::from_text("- [x] hello\n");
        write_document(&path, &doc).unwrap();
        assert_eq!(read_document(&path).unwrap(), doc);
    }

    #[test]
    fn test_read_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = read_document(&tmp.path().join("nope.md")).unwrap_err();
        assert!(matches!(err, DocumentError::ReadError { .. }));
    }
}
