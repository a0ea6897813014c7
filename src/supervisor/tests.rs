use super::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn noop_runner() -> Runner {
    Box::new(|_| Ok(()))
}

fn counting_runner(calls: Arc<AtomicUsize>) -> Runner {
    Box::new(move |_| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

fn test_supervisor(temp_dir: &TempDir, runner: Runner) -> Supervisor {
    Supervisor::new(temp_dir.path().join("app"), runner).unwrap()
}

fn template() -> ConfigDoc {
    let mut doc = ConfigDoc::new();
    doc.insert("interval.secs".to_string(), json!(30));
    doc
}

#[test]
fn new_creates_the_home_directory() {
    let temp_dir = TempDir::new().unwrap();
    let supervisor = test_supervisor(&temp_dir, noop_runner());

    assert!(supervisor.home().is_dir());
    assert_eq!(supervisor.name(), "app");
}

#[test]
fn executions_are_listed_sorted_by_name() {
    let temp_dir = TempDir::new().unwrap();
    let supervisor = test_supervisor(&temp_dir, noop_runner());
    for name in ["zeta", "alpha", "mid"] {
        supervisor.create(name, None).unwrap();
    }

    let names: Vec<String> = supervisor
        .executions()
        .unwrap()
        .iter()
        .map(|e| e.name().to_string())
        .collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
}

#[test]
fn dotted_names_survive_discovery_and_lookup() {
    let temp_dir = TempDir::new().unwrap();
    let supervisor = test_supervisor(&temp_dir, noop_runner());
    supervisor.create("cu.box", None).unwrap();

    // The directory name is the execution name, dots included.
    let names: Vec<String> = supervisor
        .executions()
        .unwrap()
        .iter()
        .map(|e| e.name().to_string())
        .collect();
    assert_eq!(names, vec!["cu.box"]);

    // Lookup by the full name resolves to the same workspace.
    let execution = supervisor.execution("cu.box");
    assert_eq!(execution.name(), "cu.box");
    assert_eq!(execution.status(), ExecutionStatus::Stopped);

    supervisor.remove(&execution);
    assert_eq!(supervisor.execution("cu.box").status(), ExecutionStatus::NotFound);
}

#[test]
fn stray_files_in_the_home_are_not_executions() {
    let temp_dir = TempDir::new().unwrap();
    let supervisor = test_supervisor(&temp_dir, noop_runner());
    supervisor.create("cu-box", None).unwrap();
    std::fs::write(supervisor.home().join("notes.txt"), "hi").unwrap();

    let executions = supervisor.executions().unwrap();
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].name(), "cu-box");
}

#[test]
fn create_seeds_the_default_template() {
    let temp_dir = TempDir::new().unwrap();
    let supervisor = test_supervisor(&temp_dir, noop_runner()).with_default_config(template());

    let execution = supervisor.create("cu-box", None).unwrap();

    assert_eq!(execution.status(), ExecutionStatus::Stopped);
    let config = execution.read_config().unwrap().unwrap();
    assert_eq!(config.get("interval.secs"), Some(&json!(30)));
}

#[test]
fn create_rejects_a_used_name() {
    let temp_dir = TempDir::new().unwrap();
    let supervisor = test_supervisor(&temp_dir, noop_runner());
    supervisor.create("cu-box", None).unwrap();

    let err = supervisor.create("cu-box", None).unwrap_err();
    assert!(matches!(err, VigilError::UserError(_)));
    assert!(err.to_string().contains("has been used"));
}

#[test]
fn create_clone_copies_the_source_config() {
    let temp_dir = TempDir::new().unwrap();
    let supervisor = test_supervisor(&temp_dir, noop_runner()).with_default_config(template());

    let source = supervisor.create("cu-box", None).unwrap();
    let mut config = source.read_config().unwrap().unwrap();
    config.insert("interval.secs".to_string(), json!(5));
    source.write_config(&config).unwrap();

    let copy = supervisor.create("cu-box-2", Some("cu-box")).unwrap();
    let copied = copy.read_config().unwrap().unwrap();
    assert_eq!(copied.get("interval.secs"), Some(&json!(5)));
}

#[test]
fn create_clone_from_a_missing_source_fails() {
    let temp_dir = TempDir::new().unwrap();
    let supervisor = test_supervisor(&temp_dir, noop_runner());

    let err = supervisor.create("cu-box", Some("ghost")).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
    // Nothing was created for the failed attempt.
    assert_eq!(
        supervisor.execution("cu-box").status(),
        ExecutionStatus::NotFound
    );
}

#[test]
fn execute_claims_the_pid_and_runs_the_callback() {
    let temp_dir = TempDir::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let supervisor = test_supervisor(&temp_dir, counting_runner(calls.clone()));
    let execution = supervisor.create("cu-box", None).unwrap();

    supervisor.execute(&execution).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(execution.pid(), Some(std::process::id()));

    let log = std::fs::read_to_string(execution.workspace().log_path()).unwrap();
    assert!(log.contains("Execution finished"));
    assert!(log.contains(&format!("Exit {}", std::process::id())));
}

#[test]
fn execute_absorbs_a_worker_fault() {
    let temp_dir = TempDir::new().unwrap();
    let supervisor = test_supervisor(
        &temp_dir,
        Box::new(|_| Err(anyhow::anyhow!("socket reset by peer"))),
    );
    let execution = supervisor.create("cu-box", None).unwrap();

    // The fault is logged at the boundary, not propagated.
    supervisor.execute(&execution).unwrap();

    let log = std::fs::read_to_string(execution.workspace().log_path()).unwrap();
    assert!(log.contains("Execution fault: socket reset by peer"));
    assert!(log.contains(&format!("Exit {}", std::process::id())));
    assert!(log.contains("[ERROR]"));
}

#[test]
fn execute_aborts_without_the_callback_when_already_running() {
    let temp_dir = TempDir::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let supervisor = test_supervisor(&temp_dir, counting_runner(calls.clone()));
    let execution = supervisor.create("cu-box", None).unwrap();

    // Our own (live) pid in the pid file makes the execution Running.
    std::fs::write(execution.pid_path(), std::process::id().to_string()).unwrap();
    assert_eq!(execution.status(), ExecutionStatus::Running);

    supervisor.execute(&execution).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let log = std::fs::read_to_string(execution.workspace().log_path()).unwrap();
    assert!(log.contains("already running"));
    assert!(log.contains("[ERROR]"));
}

#[test]
fn stop_is_a_no_op_for_a_stopped_execution() {
    let temp_dir = TempDir::new().unwrap();
    let supervisor = test_supervisor(&temp_dir, noop_runner());
    let execution = supervisor.create("cu-box", None).unwrap();

    supervisor.stop(&execution, false).unwrap();
    supervisor.stop(&execution, true).unwrap();
}

#[test]
fn remove_deletes_the_workspace() {
    let temp_dir = TempDir::new().unwrap();
    let supervisor = test_supervisor(&temp_dir, noop_runner());
    let execution = supervisor.create("cu-box", None).unwrap();
    assert!(execution.home().is_dir());

    supervisor.remove(&execution);

    assert!(!execution.home().is_dir());
    assert_eq!(execution.status(), ExecutionStatus::NotFound);
}

#[test]
fn execution_handle_does_not_touch_the_filesystem() {
    let temp_dir = TempDir::new().unwrap();
    let supervisor = test_supervisor(&temp_dir, noop_runner());

    let execution = supervisor.execution("ghost");
    assert_eq!(execution.status(), ExecutionStatus::NotFound);
    assert!(!execution.home().exists());
}
