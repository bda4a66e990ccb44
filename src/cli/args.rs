//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    catalog::CatalogCommands, completions::CompletionsArgs, plan::PlanArgs, session::SessionArgs,
};

#[derive(Parser)]
#[command(name = "implant-plan")]
#[command(author, version, about = "Dental implant planning and drilling protocol toolkit")]
#[command(long_about = "Look up implants in a reference catalog, build a validated per-tooth implant plan, and render it as a surgical drilling protocol.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct GlobalOpts {
    /// Implant catalog CSV (default: config, then the Primus implant list in the current directory)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Output format for listings
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse and query the implant catalog
    #[command(subcommand)]
    Catalog(CatalogCommands),

    /// Build a plan from command-line or request-file selections and render the protocol
    Plan(PlanArgs),

    /// Interactive planning session
    Session(SessionArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Auto,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
}
