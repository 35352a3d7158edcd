//! nodestore CLI - command-line host for a filesystem node store.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "nodestore")]
#[command(about = "Filesystem-backed node tree with UUID and reference indexes", long_about = None)]
#[command(version)]
struct Cli {
    /// Store root directory
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    /// Workspace to operate on (defaults to the configured workspace)
    #[arg(short, long, global = true)]
    workspace: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Workspace lifecycle
    Workspace {
        #[command(subcommand)]
        command: WorkspaceCommands,
    },
    /// Create or replace a node
    Put {
        /// Logical node path
        path: String,
        /// Property as name=value, optionally suffixed with :Type
        #[arg(short, long = "prop")]
        props: Vec<String>,
    },
    /// Print a node as JSON
    Get {
        /// Logical node path
        path: String,
    },
    /// List a node's children
    Ls {
        /// Logical node path
        #[arg(default_value = "/")]
        path: String,
    },
    /// Remove a node
    Rm {
        /// Logical node path
        path: String,
        /// Remove the whole subtree
        #[arg(short, long)]
        recursive: bool,
    },
    /// Look up a node by its jcr:uuid
    Uuid {
        /// The UUID to resolve
        uuid: String,
    },
    /// List nodes referencing a node
    Referrers {
        /// Logical node path
        path: String,
        /// Show weak instead of strong referrers
        #[arg(long)]
        weak: bool,
    },
    /// Rebuild all indexes from node records
    Rebuild,
    /// Check indexes against node records
    Verify,
}

#[derive(Subcommand)]
enum WorkspaceCommands {
    /// Create a workspace with an empty root node
    Init {
        /// Workspace name
        name: String,
    },
    /// List workspaces
    List,
    /// Remove a workspace and all its nodes
    Remove {
        /// Workspace name
        name: String,
    },
}

fn main() -> Result<()> {
    // Respects RUST_LOG environment variable (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = commands::Context::new(cli.root, cli.workspace)?;

    match cli.command {
        Commands::Workspace { command } => match command {
            WorkspaceCommands::Init { name } => commands::workspace::init(&ctx, &name),
            WorkspaceCommands::List => commands::workspace::list(&ctx),
            WorkspaceCommands::Remove { name } => commands::workspace::remove(&ctx, &name),
        },
        Commands::Put { path, props } => commands::node::put(&ctx, &path, &props),
        Commands::Get { path } => commands::node::get(&ctx, &path),
        Commands::Ls { path } => commands::node::ls(&ctx, &path),
        Commands::Rm { path, recursive } => commands::node::rm(&ctx, &path, recursive),
        Commands::Uuid { uuid } => commands::query::uuid(&ctx, &uuid),
        Commands::Referrers { path, weak } => commands::query::referrers(&ctx, &path, weak),
        Commands::Rebuild => commands::maintenance::rebuild(&ctx),
        Commands::Verify => commands::maintenance::verify(&ctx),
    }
}
