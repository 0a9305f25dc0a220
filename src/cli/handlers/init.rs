use std::fs;
use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io::{self, CONFIG_FILE};

const TQ_TOML_TEMPLATE: &str = r##"[tasks]
# Directory holding task documents, relative to this file
dir = "{dir}"

[query]
# Query used by `tq list` when no -q/--query-file is given.
# Keys: overdue, due, no-due, completed, sort, group,
#       select-tags, omit-tags, select-day, select-week
default = ["completed: false", "sort: score"]
"##;

/// Validate a tasks directory name: relative, no parent components.
fn validate_tasks_dir(dir: &str) -> Result<(), String> {
    let path = Path::new(dir);
    if dir.trim().is_empty() {
        return Err("tasks directory cannot be empty".to_string());
    }
    if path.is_absolute() || path.components().any(|c| c.as_os_str() == "..") {
        return Err(format!(
            "invalid tasks directory \"{}\": use a path inside the workspace",
            dir
        ));
    }
    Ok(())
}

fn render_tq_toml(dir: &str) -> String {
    TQ_TOML_TEMPLATE.replace("{dir}", dir)
}

pub fn cmd_init(start: &Path, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = start.join(CONFIG_FILE);
    if config_path.exists() && !args.force {
        return Err(format!("{} already exists (use --force to overwrite)", CONFIG_FILE).into());
    }

    // Warn when an enclosing workspace already exists
    if let Some(parent) = start.parent() {
        let parent_root = config_io::discover_root(parent);
        if parent_root.join(CONFIG_FILE).is_file() {
            eprintln!("Note: enclosing workspace found at {}/", parent_root.display());
        }
    }

    validate_tasks_dir(&args.tasks_dir)?;
    fs::create_dir_all(start.join(&args.tasks_dir))?;
    fs::write(&config_path, render_tq_toml(&args.tasks_dir))?;

    println!("Initialized tq workspace (tasks in {}/)", args.tasks_dir);
    Ok(())
}
