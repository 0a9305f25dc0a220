use std::ops::Range;

use chrono::NaiveDate;
use serde_yaml::{Mapping, Value};

use crate::util::date::{format_day, parse_day};

/// Line that opens and closes a frontmatter block
pub const DELIMITER: &str = "---";

/// Error type for frontmatter parsing
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("frontmatter opened on line {} is never closed", .line + 1)]
    Unterminated { line: usize },
    #[error("frontmatter must be a mapping of fields, found {0}")]
    Malformed(&'static str),
    #[error("could not decode frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Find the frontmatter block in a document.
///
/// Returns the line range *between* the delimiters (exclusive end), or
/// `None` when the document has no opening delimiter at all. A block that
/// is opened but never closed is an error.
pub fn locate(lines: &[String]) -> Result<Option<Range<usize>>, FrontmatterError> {
    let Some(open) = lines.iter().position(|l| l == DELIMITER) else {
        return Ok(None);
    };
    let start = open + 1;
    let close = lines[start..]
        .iter()
        .position(|l| l == DELIMITER)
        .ok_or(FrontmatterError::Unterminated { line: open })?;
    Ok(Some(start..start + close))
}

/// Decode the lines in `span` as a YAML mapping.
pub fn parse_block(lines: &[String], span: Range<usize>) -> Result<Mapping, FrontmatterError> {
    let text = lines[span].join("\n");
    if text.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(&text)? {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        Value::Sequence(_) => Err(FrontmatterError::Malformed("a list")),
        Value::Tagged(_) => Err(FrontmatterError::Malformed("a tagged value")),
        Value::String(_) | Value::Number(_) | Value::Bool(_) => {
            Err(FrontmatterError::Malformed("a scalar"))
        }
    }
}

/// The frontmatter of a task document.
///
/// Fields live in an insertion-ordered mapping so unknown keys survive a
/// rewrite untouched. The keys the engine reasons about (`due`, `repeat`,
/// `completed`, `tags`, `urgent`, `important`, `hide-until`) have typed
/// accessors; everything else goes through [`get`](Self::get) /
/// [`set`](Self::set).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    /// Lines between the delimiters, `None` if the document has no block
    span: Option<Range<usize>>,
    fields: Mapping,
}

impl Frontmatter {
    /// Locate and parse the frontmatter of a document
    pub fn from_lines(lines: &[String]) -> Result<Self, FrontmatterError> {
        match locate(lines)? {
            Some(span) => {
                let fields = parse_block(lines, span.clone())?;
                Ok(Frontmatter {
                    span: Some(span),
                    fields,
                })
            }
            None => Ok(Frontmatter::default()),
        }
    }

    pub fn span(&self) -> Option<Range<usize>> {
        self.span.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Field names in document order
    pub fn keys(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter_map(|(k, _)| k.as_str().map(str::to_string))
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set a field. An existing key keeps its position.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(Value::String(key.to_string()), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    // -----------------------------------------------------------------------
    // Typed accessors
    // -----------------------------------------------------------------------

    pub fn due(&self) -> Option<NaiveDate> {
        self.get_str("due").and_then(parse_day)
    }

    pub fn set_due(&mut self, date: NaiveDate) {
        self.set("due", format_day(date));
    }

    /// Raw repeat phrase, if any
    pub fn repeat(&self) -> Option<&str> {
        self.get_str("repeat").map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn set_repeat(&mut self, text: &str) {
        self.set("repeat", text);
    }

    /// Completion history. A legacy single string is read as one entry.
    pub fn completed(&self) -> Vec<String> {
        match self.get("completed") {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Sequence(seq)) => seq
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_completed(&mut self, entries: Vec<String>) {
        let seq = entries.into_iter().map(Value::String).collect::<Vec<_>>();
        self.set("completed", Value::Sequence(seq));
    }

    /// Tags normalized to a list, leading `#` stripped. A bare scalar is a
    /// single tag.
    pub fn tags(&self) -> Vec<String> {
        let raw: Vec<String> = match self.get("tags") {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Sequence(seq)) => seq.iter().filter_map(scalar_to_string).collect(),
            Some(other) => scalar_to_string(other).into_iter().collect(),
            None => Vec::new(),
        };
        raw.into_iter()
            .map(|t| t.trim().trim_start_matches('#').to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn set_tags(&mut self, tags: &[String]) {
        let seq = tags.iter().cloned().map(Value::String).collect::<Vec<_>>();
        self.set("tags", Value::Sequence(seq));
    }

    pub fn urgent(&self) -> bool {
        self.get("urgent").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn important(&self) -> bool {
        self.get("important").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn hide_until(&self) -> Option<NaiveDate> {
        self.get_str("hide-until").and_then(parse_day)
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Encode the fields as YAML, without delimiters. `due` is always
    /// written at calendar-day precision.
    pub fn to_yaml(&self) -> Result<String, FrontmatterError> {
        if self.fields.is_empty() {
            return Ok(String::new());
        }
        let mut fields = self.fields.clone();
        if let Some(due) = self.due() {
            fields.insert(Value::String("due".to_string()), Value::String(format_day(due)));
        }
        Ok(serde_yaml::to_string(&Value::Mapping(fields))?)
    }

    /// Write the fields back into `lines`, replacing exactly the original
    /// block. A document without a block gets one inserted at the top.
    /// The stored span is updated to the new block.
    pub fn serialize(&mut self, lines: &mut Vec<String>) -> Result<(), FrontmatterError> {
        let yaml = self.to_yaml()?;
        let body: Vec<String> = yaml.lines().map(str::to_string).collect();
        let len = body.len();

        let start = match self.span.clone() {
            Some(span) => {
                lines.splice(span.clone(), body);
                span.start
            }
            None => {
                if body.is_empty() {
                    return Ok(());
                }
                let mut block = Vec::with_capacity(len + 2);
                block.push(DELIMITER.to_string());
                block.extend(body);
                block.push(DELIMITER.to_string());
                lines.splice(0..0, block);
                1
            }
        };

        self.span = Some(start..start + len);
        Ok(())
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
