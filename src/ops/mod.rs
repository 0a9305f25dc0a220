pub mod complete;
pub mod create;
pub mod query;
pub mod recurrence;
pub mod score;
pub mod task_builder;

pub use complete::{complete_task, roll_forward_if_checked, set_completed, set_due_date};
pub use create::{NewTask, format_new_task, new_task_file_name};
pub use query::{build_filters, group, run_query, sort_group_keys, sort_tasks_within_group};
pub use recurrence::{next_occurrence, occurrences};
pub use score::{compare_by_score, score};
pub use task_builder::{TaskRead, build_task};
