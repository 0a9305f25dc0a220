mod init;
pub use init::cmd_init;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::{self, ConfigError};
use crate::io::document_io::atomic_write;
use crate::io::task_store::{self, TaskStore};
use crate::model::config::TqConfig;
use crate::model::repeat::RepeatRule;
use crate::ops::complete::Completion;
use crate::ops::create::{NewTask, format_new_task, new_task_file_name};
use crate::ops::query::run_query;
use crate::ops::recurrence::occurrences;
use crate::parse::legacy::parse_legacy_task_line;
use crate::parse::query_parser::build_configuration;
use crate::util::date::{end_of_day, format_day, parse_day};

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;

    let start = match cli.dir {
        Some(ref dir) => fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init(args) => cmd_init(&start, args),

        // Read commands
        Commands::List(args) => cmd_list(&start, args, json),
        Commands::Next(args) => cmd_next(args, json),

        // Write commands
        Commands::Add(args) => cmd_add(&start, args, json),
        Commands::Done(args) => cmd_done(&start, args, json),
        Commands::Reopen(args) => cmd_reopen(&start, args, json),
        Commands::Sync(args) => cmd_sync(&start, args, json),
        Commands::Convert(args) => cmd_convert(&start, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Workspace root, its config, and the resolved tasks directory
struct Workspace {
    root: PathBuf,
    config: TqConfig,
    tasks_dir: PathBuf,
}

fn load_workspace(start: &Path) -> Result<Workspace, ConfigError> {
    let root = config_io::discover_root(start);
    let config = config_io::load_config(&root)?;
    let tasks_dir = config_io::tasks_dir(&root, &config);
    Ok(Workspace {
        root,
        config,
        tasks_dir,
    })
}

/// Parse an optional `YYYY-MM-DD` argument
fn parse_day_arg(value: Option<&str>, flag: &str) -> Result<Option<NaiveDate>, String> {
    value
        .map(|v| parse_day(v).ok_or_else(|| format!("invalid {} date '{}': expected YYYY-MM-DD", flag, v)))
        .transpose()
}

/// The `--today` override, or the local calendar day
fn today_arg(value: Option<&str>) -> Result<NaiveDate, String> {
    Ok(parse_day_arg(value, "--today")?.unwrap_or_else(|| Local::now().date_naive()))
}

/// Find a task document: a path as given, or a file name inside the tasks
/// directory (the `.md` extension may be left off).
fn resolve_task_file(ws: &Workspace, start: &Path, file: &str) -> Result<PathBuf, String> {
    let candidates = [
        start.join(file),
        ws.tasks_dir.join(file),
        ws.tasks_dir.join(format!("{}.md", file)),
    ];
    candidates
        .into_iter()
        .find(|p| p.is_file())
        .ok_or_else(|| format!("task not found: {}", file))
}

/// Write a new task document into the tasks directory
fn store_new_task(ws: &Workspace, task: NewTask) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let task = task.validate()?;
    let content = format_new_task(&task)?;
    fs::create_dir_all(&ws.tasks_dir)?;
    let path = new_task_file_name(&ws.tasks_dir, &task.description);
    atomic_write(&path, content.as_bytes())?;
    tracing::info!(path = %path.display(), "task created");
    Ok(path)
}

fn print_created(ws: &Workspace, path: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let file = display_path(path, &ws.root);
    if json {
        println!("{}", serde_json::to_string_pretty(&CreatedJson { file })?);
    } else {
        println!("{}", file);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(start: &Path, args: ListArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ws = load_workspace(start)?;
    let today = today_arg(args.today.as_deref())?;

    let mut lines = args.query;
    if let Some(ref file) = args.query_file {
        let text = fs::read_to_string(file)
            .map_err(|e| format!("could not read query file '{}': {}", file, e))?;
        lines.extend(text.lines().map(str::to_string));
    }
    if lines.is_empty() {
        lines = ws.config.query.default.clone();
    }
    let config = build_configuration(&lines);

    let store = TaskStore::load(&ws.tasks_dir, today)?;
    let groups = run_query(&store.tasks(), &config, today);

    if json {
        let out = groups_to_json(&groups, &ws.root, today);
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for line in format_listing(&groups) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_next(args: NextArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let rule = RepeatRule::from_text(&args.rule)?;
    let after = match parse_day_arg(args.after.as_deref(), "--after")? {
        Some(day) => day,
        None => Local::now().date_naive(),
    };
    let days = occurrences(&rule, end_of_day(after), args.count)?;

    if json {
        let out = NextJson {
            rule: rule.describe(),
            occurrences: days.into_iter().map(format_day).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", rule.describe());
        for day in days {
            println!("  {}  {}", format_day(day), day.format("%a"));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(start: &Path, args: AddArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ws = load_workspace(start)?;
    let task = NewTask {
        description: args.description,
        due: parse_day_arg(args.due.as_deref(), "--due")?,
        hide_until: parse_day_arg(args.hide_until.as_deref(), "--hide-until")?,
        repeat: args.repeat,
        tags: args.tag,
        urgent: args.urgent,
        important: args.important,
    };
    let path = store_new_task(&ws, task)?;
    print_created(&ws, &path, json)
}

fn cmd_convert(start: &Path, args: ConvertArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ws = load_workspace(start)?;
    let legacy = parse_legacy_task_line(&args.line)
        .ok_or_else(|| format!("not a task line: {}", args.line))?;
    let task = NewTask {
        due: parse_day_arg(args.due.as_deref(), "--due")?,
        repeat: legacy.repeat,
        ..NewTask::new(legacy.description)
    };
    let path = store_new_task(&ws, task)?;
    print_created(&ws, &path, json)
}

fn cmd_done(start: &Path, args: FileArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ws = load_workspace(start)?;
    let today = today_arg(args.today.as_deref())?;
    let path = resolve_task_file(&ws, start, &args.file)?;
    let outcome = task_store::complete_file(&path, today)?;
    let file = display_path(&path, &ws.root);

    if json {
        let out = CompletionJson {
            file,
            checked: !matches!(outcome, Completion::RolledForward { .. }),
            due: match outcome {
                Completion::RolledForward { due } => Some(format_day(due)),
                _ => None,
            },
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match outcome {
        Completion::Checked => println!("done: {}", file),
        Completion::AlreadyChecked => println!("already done: {}", file),
        Completion::RolledForward { due } => println!("next due {}: {}", format_day(due), file),
    }
    Ok(())
}

fn cmd_reopen(start: &Path, args: FileArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ws = load_workspace(start)?;
    let path = resolve_task_file(&ws, start, &args.file)?;
    let changed = task_store::reopen_file(&path)?;
    let file = display_path(&path, &ws.root);

    if json {
        let out = CompletionJson {
            file,
            checked: false,
            due: None,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if changed {
        println!("reopened: {}", file);
    } else {
        println!("already open: {}", file);
    }
    Ok(())
}

fn cmd_sync(start: &Path, args: SyncArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ws = load_workspace(start)?;
    let today = today_arg(args.today.as_deref())?;
    let store = TaskStore::load(&ws.tasks_dir, today)?;
    let report = store.report();

    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!(
            "{} tasks ({} unhidden, {} rolled forward, {} skipped)",
            report.tasks, report.unhidden, report.rolled_forward, report.skipped
        );
    }
    Ok(())
}
