mod cmd;
mod output;
mod root;
mod tools;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "schemagen",
    about = "Generate and version structural schemas of a web project (database, API, business logic, components)",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .schemagen.yaml, .schemas/, composer.json or .git/)
    #[arg(long, global = true, env = "SCHEMAGEN_PROJECT")]
    project: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate schemas unless the stored ones are still fresh
    Generate {
        /// Skip detection: laravel, rails, django, express or unknown
        #[arg(long)]
        framework: Option<String>,

        /// Regenerate even if schemas are fresh
        #[arg(long)]
        force: bool,

        /// Change log entry for the history ledger
        #[arg(long, short = 'm')]
        message: Option<String>,
    },

    /// Show stored schema metadata, or one current document
    Info {
        /// database, api, businessLogic or componentArchitecture
        #[arg(long)]
        schema: Option<String>,
    },

    /// Check whether stored schemas are within the freshness window
    Freshness {
        /// Freshness window in minutes (default from .schemagen.yaml)
        #[arg(long, value_name = "N")]
        max_age: Option<i64>,
    },

    /// Decide whether a task's changes call for regeneration
    Check {
        /// Task category, e.g. migration, model, route, feature, bugfix
        #[arg(long)]
        task_type: Option<String>,

        /// Changed files, relative to the project root
        files: Vec<String>,

        /// Regenerate when an update is required
        #[arg(long)]
        apply: bool,
    },

    /// Show the generation history ledger, newest first
    History {
        #[arg(long, default_value = "10", value_name = "N")]
        limit: usize,
    },

    /// Run as an MCP stdio server
    Mcp,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Mcp => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    // stdout belongs to command output and the MCP transport.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.project.as_deref());
    tracing::debug!(root = %root.display(), "resolved project root");

    let result = match cli.command {
        Commands::Generate {
            framework,
            force,
            message,
        } => cmd::generate::run(
            &root,
            framework.as_deref(),
            force,
            message.as_deref(),
            cli.json,
        ),
        Commands::Info { schema } => cmd::info::run(&root, schema.as_deref(), cli.json),
        Commands::Freshness { max_age } => cmd::freshness::run(&root, max_age, cli.json),
        Commands::Check {
            task_type,
            files,
            apply,
        } => cmd::check::run(&root, task_type.as_deref(), &files, apply, cli.json),
        Commands::History { limit } => cmd::history::run(&root, limit, cli.json),
        Commands::Mcp => cmd::mcp::run(&root),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
