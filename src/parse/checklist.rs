use std::sync::LazyLock;

use regex::Regex;

use crate::parse::frontmatter::locate;

static CHECKBOX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*- \[)([ xX])(\])").unwrap());

/// A parsed checklist line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub checked: bool,
    /// Text after the checkbox marker, trimmed
    pub description: String,
}

/// Parse one line as a checklist item. Returns `None` for any other line.
pub fn parse_checklist_line(line: &str) -> Option<ChecklistItem> {
    let caps = CHECKBOX_RE.captures(line)?;
    let marker = caps.get(2)?.as_str();
    let end = caps.get(0)?.end();
    Some(ChecklistItem {
        checked: marker != " ",
        description: line[end..].trim().to_string(),
    })
}

/// 0-indexed positions of every checklist line in a document's body.
///
/// Lines inside the frontmatter block or a fenced code block are skipped.
pub fn find_checklist_items(lines: &[String]) -> Vec<usize> {
    let body_start = locate(lines)
        .ok()
        .flatten()
        .map_or(0, |span| span.end + 1);

    let mut items = Vec::new();
    let mut fence: Option<&str> = None;
    for (i, line) in lines.iter().enumerate().skip(body_start) {
        let trimmed = line.trim_start();
        match fence {
            Some(marker) => {
                if trimmed.starts_with(marker) {
                    fence = None;
                }
            }
            None if trimmed.starts_with("```") => fence = Some("```"),
            None if trimmed.starts_with("~~~") => fence = Some("~~~"),
            None if CHECKBOX_RE.is_match(line) => items.push(i),
            None => {}
        }
    }
    items
}

/// Rewrite the checkbox of a checklist line. Returns `None` if the line is
/// not a checklist item.
pub fn set_line_checked(line: &str, checked: bool) -> Option<String> {
    let caps = CHECKBOX_RE.captures(line)?;
    let marker = caps.get(2)?;
    let new_marker = if checked { "x" } else { " " };
    let mut out = String::with_capacity(line.len());
    out.push_str(&line[..marker.start()]);
    out.push_str(new_marker);
    out.push_str(&line[marker.end()..]);
    Some(out)
}
