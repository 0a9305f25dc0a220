use std::sync::LazyLock;

use regex::Regex;

static LEGACY_TASK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*- \[[ xX>\-]\]").unwrap());
static REPEAT_SCHEDULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:;|📅)\s*([-a-zA-Z0-9 =;:,]+)").unwrap());

/// An old-style inline task, e.g. `- [ ] Water plants 📅 every week`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTask {
    pub description: String,
    pub repeat: Option<String>,
}

/// Parse an inline task line. Returns `None` when the line is not a task.
///
/// Accepts the checkbox markers ` `, `x`, `X`, `>` and `-`. A schedule is
/// introduced by `📅` or `;` and runs to the end of the recognised text.
pub fn parse_legacy_task_line(line: &str) -> Option<LegacyTask> {
    let marker = LEGACY_TASK_RE.find(line)?;
    let rest = &line[marker.end()..];

    match REPEAT_SCHEDULE_RE.captures(rest) {
        Some(caps) => {
            let start = caps.get(0)?.start();
            let repeat = caps.get(1)?.as_str().trim();
            Some(LegacyTask {
                description: rest[..start].trim().to_string(),
                repeat: (!repeat.is_empty()).then(|| repeat.to_string()),
            })
        }
        None => Some(LegacyTask {
            description: rest.trim().to_string(),
            repeat: None,
        }),
    }
}
