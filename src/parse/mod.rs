pub mod checklist;
pub mod frontmatter;
pub mod legacy;
pub mod query_parser;
pub mod repeat_text;

pub use checklist::{find_checklist_items, parse_checklist_line, set_line_checked};
pub use frontmatter::{Frontmatter, FrontmatterError};
pub use legacy::parse_legacy_task_line;
pub use query_parser::build_configuration;
pub use repeat_text::parse_repeat;
