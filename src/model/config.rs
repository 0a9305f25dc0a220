use serde::{Deserialize, Serialize};

/// Configuration from `tq.toml` at the workspace root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TqConfig {
    #[serde(default)]
    pub tasks: TasksConfig,
    #[serde(default)]
    pub query: QueryDefaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Directory (relative to the workspace root) holding task documents
    #[serde(default = "default_tasks_dir")]
    pub dir: String,
}

impl Default for TasksConfig {
    fn default() -> Self {
        TasksConfig {
            dir: default_tasks_dir(),
        }
    }
}

fn default_tasks_dir() -> String {
    "tasks".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDefaults {
    /// Query lines used by `tq list` when none are given on the command line
    #[serde(default)]
    pub default: Vec<String>,
}
