//! Interactive selection and prompting helpers for the CLI operations.

use crate::error::{Result, VigilError};
use crate::execution::Execution;
use std::io::{IsTerminal, Write};
use std::path::Path;

/// Resolve `name` against the known executions, falling back to a numbered
/// prompt when no usable name was given and a terminal is attached.
pub fn select_execution(executions: &[Execution], name: Option<&str>) -> Result<Execution> {
    if let Some(name) = name {
        match executions.iter().find(|e| e.name() == name) {
            Some(execution) => return Ok(execution.clone()),
            None => eprintln!("The execution '{}' does not exist.", name),
        }
    }

    if !std::io::stdin().is_terminal() {
        return Err(VigilError::UserError(
            "an execution name is required".to_string(),
        ));
    }

    println!("Select an execution:");
    for (index, execution) in executions.iter().enumerate() {
        println!("  {}. {}", index + 1, execution.name());
    }
    let answer = prompt_line(&format!("Choice [1-{}]: ", executions.len()))?;
    let choice: usize = answer
        .parse()
        .map_err(|_| VigilError::UserError(format!("'{}' is not a valid choice", answer)))?;
    executions
        .get(choice.wrapping_sub(1))
        .cloned()
        .ok_or_else(|| VigilError::UserError(format!("'{}' is not a valid choice", answer)))
}

/// Print `prompt` and read one trimmed line from stdin.
pub fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    std::io::stdout()
        .flush()
        .map_err(|e| VigilError::UserError(format!("failed to write prompt: {}", e)))?;

    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .map_err(|e| VigilError::UserError(format!("failed to read input: {}", e)))?;
    Ok(answer.trim().to_string())
}

/// Yes/no question, defaulting to no.
pub fn confirm(question: &str) -> Result<bool> {
    let answer = prompt_line(&format!("{} [y/N] ", question))?;
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

/// Open `path` in the user's editor ($VISUAL, then $EDITOR, then the platform
/// default) and wait for it to close. The editor value is split shell-style,
/// so values like `code --wait` work.
pub fn open_in_editor(path: &Path) -> Result<()> {
    let editor = std::env::var("VISUAL")
        .or_else(|_| std::env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string());

    let parts = shell_words::split(&editor)
        .map_err(|e| VigilError::UserError(format!("invalid editor '{}': {}", editor, e)))?;
    let (program, args) = parts
        .split_first()
        .ok_or_else(|| VigilError::UserError("editor is set but empty".to_string()))?;

    let status = std::process::Command::new(program)
        .args(args)
        .arg(path)
        .status()
        .map_err(|e| VigilError::UserError(format!("failed to launch '{}': {}", editor, e)))?;
    if !status.success() {
        return Err(VigilError::UserError(format!(
            "editor '{}' exited with {}",
            editor, status
        )));
    }
    Ok(())
}

fn default_editor() -> &'static str {
    if cfg!(windows) { "notepad" } else { "vi" }
}
