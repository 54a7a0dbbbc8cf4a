//! swimlane CLI - work items, boards and the rules that keep them in step.

mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "swimlane")]
#[command(author, version, about = "Work item and board reconciliation CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human")]
    format: output::OutputFormat,

    /// Workspace path (defaults to current directory)
    #[arg(long, short = 'C', global = true)]
    path: Option<std::path::PathBuf>,

    /// Actor recorded on saves (defaults to the workspace setting)
    #[arg(long, global = true)]
    actor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new workspace
    Init {
        /// Also write a sample template with a space of this name
        #[arg(long)]
        sample: Option<String>,
    },

    /// Create a new work item
    New {
        /// Title of the work item
        title: String,

        /// Work item type id
        #[arg(long = "type", short = 't')]
        type_id: Uuid,

        /// Space id
        #[arg(long, short = 'S')]
        space: Uuid,

        /// Initial state
        #[arg(long, short = 's')]
        state: Option<String>,
    },

    /// List work items
    #[command(alias = "ls")]
    List {
        /// Filter by state
        #[arg(long, short = 's')]
        state: Option<String>,

        /// Filter by work item type id
        #[arg(long = "type", short = 't')]
        type_id: Option<Uuid>,

        /// Filter by board column id
        #[arg(long, short = 'c')]
        column: Option<String>,
    },

    /// Show a work item
    #[command(alias = "get")]
    Show {
        /// Work item id
        id: Uuid,
    },

    /// Set field values on a work item
    Set {
        /// Work item id
        id: Uuid,

        /// Field assignments (field=value)
        #[arg(required = true)]
        assignments: Vec<String>,
    },

    /// Put a work item into a board column
    Move {
        /// Work item id
        id: Uuid,

        /// Column id or name
        column: String,
    },

    /// Take a work item out of a board column
    Leave {
        /// Work item id
        id: Uuid,

        /// Column id or name
        column: String,
    },

    /// Run actions on a work item (defaults to the configured actions)
    Run {
        /// Work item id
        id: Uuid,

        /// Actions as KEY or KEY=CONFIG (can be specified multiple times)
        #[arg(long = "action", short = 'a')]
        actions: Vec<String>,
    },

    /// Show event history for a work item
    Events {
        /// Work item id
        id: Uuid,

        /// Show events from the last N days
        #[arg(long)]
        since: Option<u32>,
    },

    /// Show boards and their columns
    Boards,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Determine workspace path
    let workspace_path = match cli.path {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let actor = cli.actor.as_deref();

    match cli.command {
        Commands::Init { sample } => commands::init(&workspace_path, sample.as_deref(), cli.format),
        Commands::New {
            title,
            type_id,
            space,
            state,
        } => commands::new_item(&workspace_path, &title, type_id, space, state, actor, cli.format),
        Commands::List {
            state,
            type_id,
            column,
        } => commands::list(&workspace_path, state, type_id, column, cli.format),
        Commands::Show { id } => commands::show(&workspace_path, id, cli.format),
        Commands::Set { id, assignments } => {
            commands::set(&workspace_path, id, &assignments, actor, cli.format)
        }
        Commands::Move { id, column } => {
            commands::enter_column(&workspace_path, id, &column, actor, cli.format)
        }
        Commands::Leave { id, column } => {
            commands::leave_column(&workspace_path, id, &column, actor, cli.format)
        }
        Commands::Run { id, actions } => commands::run(&workspace_path, id, &actions, actor, cli.format),
        Commands::Events { id, since } => commands::events(&workspace_path, id, since, cli.format),
        Commands::Boards => commands::boards(&workspace_path, cli.format),
    }
}
