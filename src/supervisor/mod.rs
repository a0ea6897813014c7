//! Supervisor: a named collection of executions under one home directory.
//!
//! The embedding application constructs a [`Supervisor`] with its home, a
//! default config template, and the worker callback, then hands it the parsed
//! CLI command. Every subdirectory of the home is an execution; there is no
//! registry beyond the directory listing itself.

mod logs;
mod select;

#[cfg(test)]
mod tests;

use crate::cli::{Command, ConfigArgs, LogsArgs, NewArgs, RemoveArgs, StartArgs, StopArgs};
use crate::error::{Result, VigilError};
use crate::execution::{ConfigDoc, Execution, ExecutionStatus};
use crate::launcher::{default_launcher, Launcher};
use crate::workspace::Workspace;
use std::io::IsTerminal;
use std::path::PathBuf;

/// The worker callback: runs the application's long-running work for one
/// execution. A returned error is a worker fault, absorbed and logged at the
/// execution boundary rather than propagated.
pub type Runner = Box<dyn Fn(&Execution) -> anyhow::Result<()>>;

/// A named collection of executions plus the pieces needed to run them.
pub struct Supervisor {
    workspace: Workspace,
    default_config: ConfigDoc,
    runner: Runner,
    launcher: Box<dyn Launcher>,
}

impl Supervisor {
    /// Supervisor over `home` (created if missing), with the platform-default
    /// daemonization backend and an empty default config template.
    pub fn new(home: impl Into<PathBuf>, runner: Runner) -> Result<Self> {
        let workspace = Workspace::new(home);
        workspace.ensure_dir()?;
        Ok(Self {
            workspace,
            default_config: ConfigDoc::new(),
            runner,
            launcher: default_launcher(),
        })
    }

    /// Replace the default config template new executions are seeded from.
    pub fn with_default_config(mut self, template: ConfigDoc) -> Self {
        self.default_config = template;
        self
    }

    /// Replace the daemonization backend.
    pub fn with_launcher(mut self, launcher: Box<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn name(&self) -> &str {
        self.workspace.name()
    }

    pub fn home(&self) -> &std::path::Path {
        self.workspace.home()
    }

    /// Handle for the named execution. Purely path arithmetic; the execution
    /// may or may not exist. The name is passed through verbatim: a directory
    /// name is an execution name, dots included, so the extension-stripping
    /// derivation is not applied here.
    pub fn execution(&self, name: &str) -> Execution {
        Execution::with_name(self.workspace.file(name), name)
    }

    /// All executions under the home, sorted by name.
    pub fn executions(&self) -> Result<Vec<Execution>> {
        let entries = std::fs::read_dir(self.workspace.home()).map_err(|e| {
            VigilError::UserError(format!(
                "failed to read '{}': {}",
                self.workspace.home().display(),
                e
            ))
        })?;

        let mut executions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                VigilError::UserError(format!(
                    "failed to read '{}': {}",
                    self.workspace.home().display(),
                    e
                ))
            })?;
            let path = entry.path();
            if path.is_dir() {
                let name = entry.file_name().to_string_lossy().into_owned();
                executions.push(Execution::with_name(path, name));
            }
        }
        executions.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(executions)
    }

    /// Route a parsed CLI command to its operation.
    pub fn dispatch(&self, command: Command) -> Result<()> {
        match command {
            Command::List => self.cmd_list(),
            Command::New(args) => self.cmd_new(args),
            Command::Config(args) => self.cmd_config(args),
            Command::Start(args) => self.cmd_start(args),
            Command::Stop(args) => self.cmd_stop(args),
            Command::Remove(args) => self.cmd_remove(args),
            Command::Logs(args) => self.cmd_logs(args),
        }
    }

    fn cmd_list(&self) -> Result<()> {
        let executions = self.executions()?;
        if executions.is_empty() {
            return Err(self.none_found());
        }

        let highlight = std::io::stdout().is_terminal();
        for execution in &executions {
            let status = execution.status();
            let line = format!("{:<16} {}", status.label(), execution.name());
            if highlight && status == ExecutionStatus::Running {
                // Reverse video makes live workers stand out in the listing.
                println!("\x1b[7m{}\x1b[0m", line);
            } else {
                println!("{}", line);
            }
        }
        Ok(())
    }

    fn cmd_new(&self, args: NewArgs) -> Result<()> {
        let name = match args.name {
            Some(name) => name,
            None => select::prompt_line("Name for the new execution: ")?,
        };
        if name.is_empty() {
            return Err(VigilError::UserError("a name is required".to_string()));
        }

        let execution = self.create(&name, args.clone.as_deref())?;
        println!(
            "Created '{}' at '{}'.",
            execution.name(),
            execution.home().display()
        );

        // Editing the config and starting right away only make sense with a
        // human on the other end.
        if std::io::stdin().is_terminal() {
            select::open_in_editor(&execution.config_path())?;
            if select::confirm(&format!("Start '{}' now?", name))? {
                self.start_service(&execution)?;
            }
        }
        Ok(())
    }

    fn cmd_config(&self, args: ConfigArgs) -> Result<()> {
        let execution = self.select(args.name.as_deref())?;

        if args.reset {
            execution.write_config(&self.default_config)?;
            println!("Config of '{}' reset to the default template.", execution.name());
        }

        println!("Config: {}", execution.config_path().display());
        if std::io::stdin().is_terminal() {
            select::open_in_editor(&execution.config_path())?;
        }
        Ok(())
    }

    fn cmd_start(&self, args: StartArgs) -> Result<()> {
        let execution = self.select(args.name.as_deref())?;
        if args.service {
            self.start_service(&execution)?;
        } else {
            self.execute(&execution)?;
        }
        Ok(())
    }

    fn cmd_stop(&self, args: StopArgs) -> Result<()> {
        let execution = self.select(args.name.as_deref())?;
        self.stop(&execution, args.force)
    }

    fn cmd_remove(&self, args: RemoveArgs) -> Result<()> {
        let execution = self.select(args.name.as_deref())?;
        self.remove(&execution);
        println!("Removed '{}'.", execution.name());
        Ok(())
    }

    fn cmd_logs(&self, args: LogsArgs) -> Result<()> {
        let execution = self.select(args.name.as_deref())?;
        let path = match args.file {
            Some(ref file) => execution.workspace().file(file),
            None => execution.workspace().log_path(),
        };

        for line in logs::tail(&path, logs::TAIL_LINES)? {
            println!("{}", line);
        }
        if args.print {
            return Ok(());
        }
        logs::follow(&path)
    }

    /// Create a fresh execution named `name`, seeding its config from the
    /// execution `clone` when given, from the default template otherwise.
    /// Any name whose status is not `not_found` is taken.
    pub fn create(&self, name: &str, clone: Option<&str>) -> Result<Execution> {
        let execution = self.execution(name);
        if execution.status() != ExecutionStatus::NotFound {
            return Err(VigilError::UserError(format!(
                "the name '{}' has been used",
                name
            )));
        }

        let template = match clone {
            Some(source_name) => {
                let source = self.execution(source_name);
                if source.status() == ExecutionStatus::NotFound {
                    return Err(VigilError::UserError(format!(
                        "clone source '{}' does not exist",
                        source_name
                    )));
                }
                source.read_config()?.unwrap_or_default()
            }
            None => self.default_config.clone(),
        };

        execution.init()?;
        execution.write_config(&template)?;
        Ok(execution)
    }

    /// Daemonize the execution through the configured backend.
    pub fn start_service(&self, execution: &Execution) -> Result<()> {
        let pid = self.launcher.daemonize(execution)?;
        execution
            .logger()
            .info(&format!("Daemonized worker {}", pid));
        println!("Started '{}' in the background (pid {}).", execution.name(), pid);
        Ok(())
    }

    /// Signal the execution's worker if there is one to signal.
    pub fn stop(&self, execution: &Execution, force: bool) -> Result<()> {
        match execution.status() {
            ExecutionStatus::Running | ExecutionStatus::AbnormalProc => {
                execution.stop(force)?;
                println!("Signaled '{}'.", execution.name());
                Ok(())
            }
            status => {
                println!(
                    "'{}' is not running (status: {}).",
                    execution.name(),
                    status.label()
                );
                Ok(())
            }
        }
    }

    /// Delete the execution's workspace. A running worker is warned about but
    /// does not block removal; its files simply disappear underneath it.
    pub fn remove(&self, execution: &Execution) {
        if execution.status() == ExecutionStatus::Running {
            eprintln!(
                "Warning: '{}' is still running; its workspace is removed anyway.",
                execution.name()
            );
        }
        execution.workspace().delete();
    }

    /// Run the worker callback in this process, owning the execution for the
    /// duration.
    ///
    /// Claims the execution with our own pid first; a lost claim (someone
    /// else is already running it) is logged to the execution's log and
    /// absorbed. A fault returned by the callback is likewise logged, not
    /// propagated. The boundary always writes a final `Exit <pid>` line.
    pub fn execute(&self, execution: &Execution) -> Result<()> {
        let logger = execution.logger();
        let pid = std::process::id();

        match execution.set_pid(pid) {
            Ok(()) => {}
            Err(VigilError::AlreadyRunning(_)) => {
                logger.error(&format!(
                    "Process {} aborted: '{}' is already running",
                    pid,
                    execution.name()
                ));
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        match (self.runner)(execution) {
            Ok(()) => logger.info("Execution finished"),
            Err(fault) => logger.error(&format!("Execution fault: {:#}", fault)),
        }
        logger.info(&format!("Exit {}", pid));
        Ok(())
    }

    fn select(&self, name: Option<&str>) -> Result<Execution> {
        let executions = self.executions()?;
        if executions.is_empty() {
            return Err(self.none_found());
        }
        select::select_execution(&executions, name)
    }

    fn none_found(&self) -> VigilError {
        VigilError::UserError(format!(
            "no execution found for '{}' at '{}'",
            self.workspace.name(),
            self.workspace.home().display()
        ))
    }
}
