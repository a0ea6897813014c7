//! CLI argument parsing for vigil.
//!
//! Uses clap derive macros for declarative argument definitions. This module
//! defines the command structure; the implementations live on
//! `supervisor::Supervisor`.

use clap::{Parser, Subcommand};

/// Vigil: lightweight supervisor for independently named, long-running
/// worker processes.
///
/// Each named execution gets an isolated workspace (config, log, pid,
/// records), a crash-aware status derived from its pid file and the process
/// table, and can run in the foreground or be daemonized into the background.
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for vigil.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the executions with their current status.
    List,

    /// Create a new execution.
    ///
    /// Initializes a fresh workspace, seeds its config from the default
    /// template (or another execution's current config with --clone), and
    /// opens the config for editing.
    New(NewArgs),

    /// Edit an execution's configuration.
    Config(ConfigArgs),

    /// Start an execution, in the foreground or as a background service.
    Start(StartArgs),

    /// Stop a running execution.
    ///
    /// Sends an interrupt to the recorded pid; the worker is expected to
    /// exit on its own once it reaches a safe state.
    Stop(StopArgs),

    /// Remove an execution and its entire workspace.
    Remove(RemoveArgs),

    /// Show the tail of an execution's log and follow it live.
    Logs(LogsArgs),
}

/// Arguments for the `new` command.
#[derive(Parser, Debug)]
pub struct NewArgs {
    /// Name for the new execution. Prompted for when omitted.
    pub name: Option<String>,

    /// Seed the config from this existing execution instead of the default
    /// template.
    #[arg(long)]
    pub clone: Option<String>,
}

/// Arguments for the `config` command.
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Execution to configure. Selected interactively when omitted.
    pub name: Option<String>,

    /// Overwrite the config with the default template first.
    #[arg(long)]
    pub reset: bool,
}

/// Arguments for the `start` command.
#[derive(Parser, Debug)]
pub struct StartArgs {
    /// Execution to start. Selected interactively when omitted.
    pub name: Option<String>,

    /// Daemonize into the background instead of running in the foreground.
    #[arg(long)]
    pub service: bool,
}

/// Arguments for the `stop` command.
#[derive(Parser, Debug)]
pub struct StopArgs {
    /// Execution to stop. Selected interactively when omitted.
    pub name: Option<String>,

    /// Send a kill signal instead of a graceful interrupt.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `remove` command.
#[derive(Parser, Debug)]
pub struct RemoveArgs {
    /// Execution to remove. Selected interactively when omitted.
    pub name: Option<String>,
}

/// Arguments for the `logs` command.
#[derive(Parser, Debug)]
pub struct LogsArgs {
    /// Execution whose log to show. Selected interactively when omitted.
    pub name: Option<String>,

    /// Show a named workspace file instead of log.txt.
    #[arg(long)]
    pub file: Option<String>,

    /// Print the tail once and exit instead of following.
    #[arg(long)]
    pub print: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
