//! Agentloom CLI — the main entry point.
//!
//! Commands:
//! - `run`      — Execute a workflow descriptor against a task
//! - `validate` — Check a workflow descriptor without running it
//! - `agent`    — Run one standalone agent for a single task
//! - `doctor`   — Diagnose configuration and back-end health

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "agentloom",
    about = "Agentloom — multi-agent workflow prototyping harness",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow descriptor against a task
    Run {
        /// Path to the workflow descriptor JSON
        descriptor: PathBuf,

        /// The task the workflow should accomplish
        #[arg(short, long)]
        task: String,

        /// Write the JSON audit to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a workflow descriptor without running it
    Validate {
        /// Path to the workflow descriptor JSON
        descriptor: PathBuf,
    },

    /// Run one standalone agent for a single task
    Agent {
        /// The task to accomplish
        #[arg(short, long)]
        task: String,

        /// Role line for the agent's system prompt
        #[arg(short, long, default_value = "a capable generalist assistant")]
        role: String,

        /// Builtin tools to register (repeatable)
        #[arg(long = "tool")]
        tools: Vec<String>,
    },

    /// Diagnose configuration and back-end health
    Doctor {
        /// Write a default config file if none exists
        #[arg(long)]
        write_config: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            descriptor,
            task,
            output,
        } => commands::run::run(&descriptor, &task, output.as_deref()).await?,
        Commands::Validate { descriptor } => commands::validate::run(&descriptor)?,
        Commands::Agent { task, role, tools } => {
            commands::agent::run(&task, &role, &tools).await?
        }
        Commands::Doctor { write_config } => commands::doctor::run(write_config).await?,
    }

    Ok(())
}
