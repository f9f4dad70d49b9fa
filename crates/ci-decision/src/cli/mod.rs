//! CLI definition and command handling

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::{CompletionsCommand, InitCommand, PlanCommand, RunCommand, ValidateCommand};

/// ci-decision - generate and submit the jobs of a CI decision task
#[derive(Debug, Parser)]
#[command(name = "ci-decision")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Configuration file (default: search from the working directory upward)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the in-tree dockerfiles (overrides the configuration)
    #[arg(long, global = true)]
    pub dockerfile_dir: Option<PathBuf>,

    /// Task group the submitted tasks belong to
    #[arg(long, global = true, env = "TASK_ID")]
    pub task_group_id: Option<String>,

    /// Command to run (default: run)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the decision tasks and submit them
    Run(RunCommand),

    /// Show the tasks a run would submit
    Plan(PlanCommand),

    /// Check configuration and every task descriptor
    Validate(ValidateCommand),

    /// Write a default configuration file
    Init(InitCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(&self) -> anyhow::Result<()> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match &self.command {
            None => RunCommand::default().execute(self),
            Some(Commands::Run(cmd)) => cmd.execute(self),
            Some(Commands::Plan(cmd)) => cmd.execute(self),
            Some(Commands::Validate(cmd)) => cmd.execute(self),
            Some(Commands::Init(cmd)) => cmd.execute(self),
            Some(Commands::Completions(cmd)) => cmd.execute(self),
        }
    }
}
