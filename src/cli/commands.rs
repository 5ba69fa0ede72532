use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tb", about = concat!("taskboard v", env!("CARGO_PKG_VERSION"), " - kanban columns and gantt layout from status templates"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different board directory
    #[arg(short = 'C', long = "board-dir", global = true)]
    pub board_dir: Option<String>,

    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a board in the current directory
    Init(InitArgs),
    /// List the status template catalog
    Templates,
    /// Switch the active status template
    Template(TemplateArgs),
    /// Show columns and the tasks in them
    Board,
    /// Add a task to the leftmost column
    Add(AddArgs),
    /// Move a task to another column
    Mv(MvArgs),
    /// Reload tasks and quarantine any that no longer fit the template
    Refresh,
    /// Show the gantt layout
    Timeline(TimelineArgs),
    /// Change the timeline zoom: in, out, or a level 1-5
    Zoom(ZoomArgs),
    /// Keep the board fresh, reporting each refresh
    Watch(WatchArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Board name (default: directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Starting status template
    #[arg(long, default_value = "default")]
    pub template: String,
    /// Reinitialize even if .taskboard/ already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct TemplateArgs {
    /// Template id (see `tb templates`)
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,
    /// Member id to assign (repeatable)
    #[arg(long = "assignee")]
    pub assignees: Vec<u64>,
}

#[derive(Args)]
pub struct MvArgs {
    /// Task id
    pub id: String,
    /// Target column (status key)
    pub status: String,
}

#[derive(Args)]
pub struct TimelineArgs {
    /// Zoom level for this view only (default: board.toml)
    #[arg(long)]
    pub zoom: Option<u8>,
    /// Lay out as if today were this date
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

#[derive(Args)]
pub struct ZoomArgs {
    /// `in`, `out`, or a level 1-5
    pub step: String,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Seconds between refreshes (default: board.toml)
    #[arg(long)]
    pub interval: Option<u64>,
}
