//! Command-line parsing for the pie signup tool.
//!
//! Argument parsing and command dispatch stay separate from the
//! registration logic.

use clap::{Parser, Subcommand};

pub mod prompt;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pies", version, about = "Pie party signup: one sweet, one savory, and so on")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive signup form.
    Tui,
    /// Register one person and print the assigned pie.
    Register(RegisterArgs),
    /// Show whether an email is already registered.
    Check(CheckArgs),
    /// Show the current sweet/savory tally.
    Counts,
}

#[derive(Debug, Parser, Clone)]
pub struct RegisterArgs {
    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub email: String,

    /// Gate password. Prompted for on stdin when omitted.
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Debug, Parser, Clone)]
pub struct CheckArgs {
    #[arg(long)]
    pub email: String,
}
