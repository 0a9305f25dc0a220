use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tq", about = concat!("tq v", env!("CARGO_PKG_VERSION"), " - tasks in markdown, one per file"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different workspace directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a tq.toml and a tasks directory here
    Init(InitArgs),
    /// List tasks matching a query, grouped and sorted
    List(ListArgs),
    /// Create a new task document
    Add(AddArgs),
    /// Complete a task (repeating tasks roll forward)
    Done(FileArgs),
    /// Uncheck a completed task
    Reopen(FileArgs),
    /// Apply pending rewrites: expired hide-until, checked repeating tasks
    Sync(SyncArgs),
    /// Show the upcoming occurrences of a repeat rule
    Next(NextArgs),
    /// Turn an inline `- [ ] task 📅 rule` line into a task document
    Convert(ConvertArgs),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Directory for task documents
    #[arg(long, default_value = "tasks")]
    pub tasks_dir: String,
    /// Overwrite an existing tq.toml
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Query line, e.g. "completed: false" (repeatable)
    #[arg(short = 'q', long = "query")]
    pub query: Vec<String>,
    /// Read query lines from a file
    #[arg(long)]
    pub query_file: Option<String>,
    /// Evaluate as of this day (YYYY-MM-DD) instead of today
    #[arg(long)]
    pub today: Option<String>,
}

#[derive(Args)]
pub struct SyncArgs {
    /// Act as of this day (YYYY-MM-DD) instead of today
    #[arg(long)]
    pub today: Option<String>,
}

#[derive(Args)]
pub struct NextArgs {
    /// Repeat rule, e.g. "every 2 weeks on Friday"
    pub rule: String,
    /// Start after this day (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub after: Option<String>,
    /// Number of occurrences to show
    #[arg(long, default_value_t = 5)]
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task description
    pub description: String,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    /// Hide the task until this day (YYYY-MM-DD)
    #[arg(long)]
    pub hide_until: Option<String>,
    /// Repeat rule, e.g. "every week on Monday"
    #[arg(long)]
    pub repeat: Option<String>,
    /// Tag (repeatable)
    #[arg(long)]
    pub tag: Vec<String>,
    /// Mark as urgent
    #[arg(long)]
    pub urgent: bool,
    /// Mark as important
    #[arg(long)]
    pub important: bool,
}

#[derive(Args)]
pub struct FileArgs {
    /// Task document (path, or file name inside the tasks directory)
    pub file: String,
    /// Act as of this day (YYYY-MM-DD) instead of today
    #[arg(long)]
    pub today: Option<String>,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// The inline task line
    #[arg(allow_hyphen_values = true)]
    pub line: String,
    /// Due date for the new document (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
}
