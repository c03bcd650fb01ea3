//! Task graph execution
//!
//! This module runs a named task: its dependencies first, depth first, then its
//! commands in order, skipping the whole task when its outputs are up to date.

use crate::config::{TaskDefinition, TaskRegistry};
use crate::error::{Result, TaskrError};
use crate::runner::{
    detect_shell, is_up_to_date, resolve, substitute_list, CommandRunner, RunContext,
};
use std::io::{self, Write};
use std::path::PathBuf;

/// How a task invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Outputs were newer than sources; nothing ran
    UpToDate,
    /// Dependencies and commands all ran successfully
    Completed,
}

/// Runs tasks from a registry
pub struct Runner {
    registry: TaskRegistry,
    shell: Box<dyn CommandRunner>,
    root: Option<PathBuf>,
}

impl Runner {
    /// Create a runner using the shell detected on this host
    pub fn new(registry: TaskRegistry) -> Self {
        Runner {
            registry,
            shell: detect_shell(),
            root: None,
        }
    }

    /// Use a specific command runner
    pub fn with_shell(mut self, shell: Box<dyn CommandRunner>) -> Self {
        self.shell = shell;
        self
    }

    /// Resolve patterns and working directories against `root` instead of
    /// the current directory
    pub fn with_root(mut self, root: PathBuf) -> Self {
        self.root = Some(root);
        self
    }

    /// Create a fresh context for one run
    pub fn context(&self) -> RunContext {
        match &self.root {
            Some(root) => RunContext::new().with_root(root.clone()),
            None => RunContext::new(),
        }
    }

    /// Run each named task in order, sharing one context, and stop at the
    /// first failure.
    pub fn run<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        let mut ctx = self.context();
        for name in names {
            self.run_task(name.as_ref(), &mut ctx)?;
        }
        Ok(())
    }

    /// Run one task and its dependency closure
    pub fn run_task(&self, name: &str, ctx: &mut RunContext) -> Result<TaskStatus> {
        if ctx.is_visited(name) {
            return Err(TaskrError::CyclicDependency(name.to_string()));
        }
        ctx.mark_visited(name);

        let task = self
            .registry
            .get(name)
            .ok_or_else(|| TaskrError::TaskNotFound(name.to_string()))?;

        let vars = resolve(task);

        if self.is_task_up_to_date(task, ctx) {
            log::info!("Task \"{}\" is up to date", name);
            return Ok(TaskStatus::UpToDate);
        }

        for dep in &task.deps {
            let dep_name = ctx.substitute(dep, &vars);
            log::debug!("Task \"{}\" depends on \"{}\"", name, dep_name);
            self.run_task(&dep_name, ctx)?;
        }

        for cmd in &task.cmds {
            // A dependency or the previous command may have captured a value
            let vars = resolve(task);
            let command = ctx.substitute(cmd, &vars);
            let dir = ctx.resolve_dir(&ctx.substitute(task.working_dir().unwrap_or(""), &vars));

            log::info!("[{}] {}", name, command);

            let output = self
                .shell
                .execute(&command, &dir)
                .map_err(|source| TaskrError::TaskRun {
                    task: name.to_string(),
                    source,
                })?;

            print_output(&output)?;

            if let Some(var) = task.capture_variable() {
                ctx.export(var, captured_value(&output))
                    .map_err(|source| TaskrError::TaskRun {
                        task: name.to_string(),
                        source,
                    })?;
            }
        }

        log::debug!("Task \"{}\" completed", name);
        Ok(TaskStatus::Completed)
    }

    fn is_task_up_to_date(&self, task: &TaskDefinition, ctx: &RunContext) -> bool {
        if !task.has_freshness_inputs() {
            return false;
        }
        let vars = resolve(task);
        let sources = substitute_list(&task.sources, |name| ctx.lookup(&vars, name));
        let generates = substitute_list(&task.generates, |name| ctx.lookup(&vars, name));
        is_up_to_date(&sources, &generates, &ctx.root)
    }
}

/// Value stored for a capture variable: the output without trailing line breaks
fn captured_value(output: &str) -> String {
    output.trim_end_matches(['\n', '\r']).to_string()
}

fn print_output(output: &str) -> io::Result<()> {
    write_output(&mut io::stdout().lock(), output)
}

/// Write command output, ending it with a newline. Empty output writes nothing.
fn write_output<W: Write>(out: &mut W, output: &str) -> io::Result<()> {
    if output.is_empty() {
        return Ok(());
    }
    out.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExecutionError, ExecutionResult};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::Path;
    use std::rc::Rc;

    /// Records every command and answers with scripted output
    #[derive(Clone, Default)]
    struct RecordingShell {
        calls: Rc<RefCell<Vec<(String, PathBuf)>>>,
        outputs: HashMap<String, String>,
        fail_on: Option<String>,
    }

    impl RecordingShell {
        fn commands(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(c, _)| c.clone()).collect()
        }
    }

    impl CommandRunner for RecordingShell {
        fn execute(&self, command: &str, dir: &Path) -> ExecutionResult<String> {
            self.calls
                .borrow_mut()
                .push((command.to_string(), dir.to_path_buf()));
            if self.fail_on.as_deref() == Some(command) {
                return Err(ExecutionError::CommandFailed {
                    command: command.to_string(),
                    code: Some(1),
                });
            }
            Ok(self.outputs.get(command).cloned().unwrap_or_default())
        }
    }

    fn task(cmds: &[&str], deps: &[&str]) -> TaskDefinition {
        TaskDefinition {
            cmds: cmds.iter().map(|s| s.to_string()).collect(),
            deps: deps.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn runner(registry: TaskRegistry, shell: &RecordingShell) -> Runner {
        Runner::new(registry)
            .with_shell(Box::new(shell.clone()))
            .with_root(PathBuf::from("/work"))
    }

    #[test]
    fn test_runs_commands_in_order() {
        let mut registry = TaskRegistry::new();
        registry.insert("build", task(&["echo one", "echo two", "echo three"], &[]));
        let shell = RecordingShell::default();

        let status = runner(registry, &shell)
            .run_task("build", &mut RunContext::new())
            .unwrap();

        assert_eq!(status, TaskStatus::Completed);
        assert_eq!(shell.commands(), vec!["echo one", "echo two", "echo three"]);
    }

    #[test]
    fn test_dependencies_run_first_depth_first() {
        let mut registry = TaskRegistry::new();
        registry.insert("app", task(&["link"], &["lib", "assets"]));
        registry.insert("lib", task(&["compile lib"], &["codegen"]));
        registry.insert("codegen", task(&["generate"], &[]));
        registry.insert("assets", task(&["copy assets"], &[]));
        let shell = RecordingShell::default();

        runner(registry, &shell).run(&["app"]).unwrap();

        assert_eq!(
            shell.commands(),
            vec!["generate", "compile lib", "copy assets", "link"]
        );
    }

    #[test]
    fn test_cycle_detected_before_any_command() {
        let mut registry = TaskRegistry::new();
        registry.insert("a", task(&["echo a"], &["b"]));
        registry.insert("b", task(&["echo b"], &["a"]));
        let shell = RecordingShell::default();

        let result = runner(registry, &shell).run(&["a"]);

        assert!(matches!(result, Err(TaskrError::CyclicDependency(name)) if name == "a"));
        assert!(shell.commands().is_empty());
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let mut registry = TaskRegistry::new();
        registry.insert("loop", task(&["echo"], &["loop"]));
        let shell = RecordingShell::default();

        let result = runner(registry, &shell).run(&["loop"]);
        assert!(matches!(result, Err(TaskrError::CyclicDependency(_))));
    }

    #[test]
    fn test_repeated_task_in_one_run_is_reported_as_cycle() {
        let mut registry = TaskRegistry::new();
        registry.insert("fmt", task(&["fmt"], &[]));
        let shell = RecordingShell::default();
        let runner = runner(registry, &shell);

        let result = runner.run(&["fmt", "fmt"]);
        assert!(matches!(result, Err(TaskrError::CyclicDependency(_))));
        assert_eq!(shell.commands(), vec!["fmt"]);

        // A new run starts with a fresh context
        runner.run(&["fmt"]).unwrap();
        assert_eq!(shell.commands(), vec!["fmt", "fmt"]);
    }

    #[test]
    fn test_shared_dependency_reported_as_cycle() {
        let mut registry = TaskRegistry::new();
        registry.insert("app", task(&["link"], &["a", "b"]));
        registry.insert("a", task(&["build a"], &["common"]));
        registry.insert("b", task(&["build b"], &["common"]));
        registry.insert("common", task(&["build common"], &[]));
        let shell = RecordingShell::default();

        let result = runner(registry, &shell).run(&["app"]);

        assert!(matches!(result, Err(TaskrError::CyclicDependency(name)) if name == "common"));
        assert_eq!(shell.commands(), vec!["build common", "build a"]);
    }

    #[test]
    fn test_invalid_capture_name_is_an_error() {
        let mut registry = TaskRegistry::new();
        let mut bad = task(&["echo 1", "echo 2"], &[]);
        bad.set = Some("A=B".to_string());
        registry.insert("bad", bad);
        let shell = RecordingShell::default();

        let result = runner(registry, &shell).run(&["bad"]);

        match result {
            Err(TaskrError::TaskRun { task, source }) => {
                assert_eq!(task, "bad");
                assert!(matches!(source, ExecutionError::InvalidCaptureName(name) if name == "A=B"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(shell.commands(), vec!["echo 1"]);
    }

    #[test]
    fn test_missing_task() {
        let shell = RecordingShell::default();
        let result = runner(TaskRegistry::new(), &shell).run(&["nope"]);
        assert!(matches!(result, Err(TaskrError::TaskNotFound(name)) if name == "nope"));
    }

    #[test]
    fn test_missing_dependency_aborts_task() {
        let mut registry = TaskRegistry::new();
        registry.insert("build", task(&["echo build"], &["ghost"]));
        let shell = RecordingShell::default();

        let result = runner(registry, &shell).run(&["build"]);

        assert!(matches!(result, Err(TaskrError::TaskNotFound(name)) if name == "ghost"));
        assert!(shell.commands().is_empty());
    }

    #[test]
    fn test_failing_command_stops_task_and_run() {
        let mut registry = TaskRegistry::new();
        registry.insert("build", task(&["step1", "boom", "step3"], &[]));
        registry.insert("later", task(&["never"], &[]));
        let shell = RecordingShell {
            fail_on: Some("boom".to_string()),
            ..Default::default()
        };

        let result = runner(registry, &shell).run(&["build", "later"]);

        match result {
            Err(TaskrError::TaskRun { task, source }) => {
                assert_eq!(task, "build");
                assert!(matches!(source, ExecutionError::CommandFailed { .. }));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(shell.commands(), vec!["step1", "boom"]);
    }

    #[test]
    fn test_dependency_failure_propagates_unchanged() {
        let mut registry = TaskRegistry::new();
        registry.insert("deploy", task(&["ship"], &["test"]));
        registry.insert("test", task(&["boom"], &[]));
        let shell = RecordingShell {
            fail_on: Some("boom".to_string()),
            ..Default::default()
        };

        let result = runner(registry, &shell).run(&["deploy"]);

        assert!(matches!(result, Err(TaskrError::TaskRun { task, .. }) if task == "test"));
        assert_eq!(shell.commands(), vec!["boom"]);
    }

    #[test]
    fn test_variables_substituted_in_commands_deps_and_dir() {
        let mut registry = TaskRegistry::new();
        let mut build = task(&["cc -o {{OUT}}"], &["prepare-{{TARGET}}"]);
        build.dir = Some("{{TARGET}}/src".to_string());
        build.variables.insert("OUT".to_string(), "app".to_string());
        build.variables.insert("TARGET".to_string(), "linux".to_string());
        registry.insert("build", build);
        registry.insert("prepare-linux", task(&["prep"], &[]));
        let shell = RecordingShell::default();

        runner(registry, &shell).run(&["build"]).unwrap();

        let calls = shell.calls.borrow();
        assert_eq!(calls[0], ("prep".to_string(), PathBuf::from("/work")));
        assert_eq!(
            calls[1],
            ("cc -o app".to_string(), PathBuf::from("/work/linux/src"))
        );
    }

    #[test]
    fn test_unresolved_placeholder_passes_through() {
        let mut registry = TaskRegistry::new();
        registry.insert("echo", task(&["echo {{TASKR_TASK_TEST_UNSET}}"], &[]));
        let shell = RecordingShell::default();

        runner(registry, &shell).run(&["echo"]).unwrap();
        assert_eq!(shell.commands(), vec!["echo {{TASKR_TASK_TEST_UNSET}}"]);
    }

    #[test]
    fn test_capture_visible_to_later_commands() {
        let mut registry = TaskRegistry::new();
        let mut answer = task(&["echo 42", "echo {{TASKR_TASK_TEST_RESULT}}"], &[]);
        answer.set = Some("TASKR_TASK_TEST_RESULT".to_string());
        registry.insert("answer", answer);
        let mut outputs = HashMap::new();
        outputs.insert("echo 42".to_string(), "42\n".to_string());
        let shell = RecordingShell {
            outputs,
            ..Default::default()
        };

        let runner = runner(registry, &shell);
        let mut ctx = runner.context();
        runner.run_task("answer", &mut ctx).unwrap();

        assert_eq!(shell.commands(), vec!["echo 42", "echo 42"]);
        assert_eq!(ctx.exported("TASKR_TASK_TEST_RESULT"), Some(&"42".to_string()));
        assert_eq!(std::env::var("TASKR_TASK_TEST_RESULT").unwrap(), "42");
        std::env::remove_var("TASKR_TASK_TEST_RESULT");
    }

    #[test]
    fn test_capture_from_dependency_visible_to_parent() {
        let mut registry = TaskRegistry::new();
        let mut version = task(&["git describe"], &[]);
        version.set = Some("TASKR_TASK_TEST_VERSION".to_string());
        registry.insert("version", version);
        registry.insert(
            "package",
            task(&["tar czf app-{{TASKR_TASK_TEST_VERSION}}.tgz"], &["version"]),
        );
        let mut outputs = HashMap::new();
        outputs.insert("git describe".to_string(), "v1.2.3\n".to_string());
        let shell = RecordingShell {
            outputs,
            ..Default::default()
        };

        let runner = runner(registry, &shell);
        let mut ctx = runner.context();
        runner.run_task("package", &mut ctx).unwrap();

        assert_eq!(shell.commands()[1], "tar czf app-v1.2.3.tgz");
        assert_eq!(
            ctx.exported("TASKR_TASK_TEST_VERSION"),
            Some(&"v1.2.3".to_string())
        );
        std::env::remove_var("TASKR_TASK_TEST_VERSION");
    }

    #[test]
    fn test_static_variable_shadows_capture() {
        let mut registry = TaskRegistry::new();
        let mut producer = task(&["produce"], &[]);
        producer.set = Some("TASKR_TASK_TEST_SHADOW".to_string());
        registry.insert("producer", producer);
        let mut consumer = task(&["use {{TASKR_TASK_TEST_SHADOW}}"], &["producer"]);
        consumer
            .variables
            .insert("TASKR_TASK_TEST_SHADOW".to_string(), "static".to_string());
        registry.insert("consumer", consumer);
        let mut outputs = HashMap::new();
        outputs.insert("produce".to_string(), "captured".to_string());
        let shell = RecordingShell {
            outputs,
            ..Default::default()
        };

        runner(registry, &shell).run(&["consumer"]).unwrap();

        assert_eq!(shell.commands()[1], "use static");
        std::env::remove_var("TASKR_TASK_TEST_SHADOW");
    }

    #[test]
    fn test_up_to_date_task_skips_deps_and_commands() {
        use std::fs::{self, File};
        use std::time::{Duration, SystemTime};
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        for (name, offset) in [("in.txt", 0), ("out.txt", 100)] {
            let path = temp_dir.path().join(name);
            fs::write(&path, name).unwrap();
            File::options()
                .write(true)
                .open(&path)
                .unwrap()
                .set_modified(base + Duration::from_secs(offset))
                .unwrap();
        }

        let mut registry = TaskRegistry::new();
        let mut build = task(&["cp in.txt out.txt"], &["never"]);
        build.sources = vec!["in.txt".to_string()];
        build.generates = vec!["out.txt".to_string()];
        registry.insert("build", build);
        let shell = RecordingShell::default();

        let runner = Runner::new(registry)
            .with_shell(Box::new(shell.clone()))
            .with_root(temp_dir.path().to_path_buf());
        let status = runner.run_task("build", &mut runner.context()).unwrap();

        assert_eq!(status, TaskStatus::UpToDate);
        assert!(shell.commands().is_empty());
    }

    #[test]
    fn test_stale_task_runs() {
        let mut registry = TaskRegistry::new();
        let mut build = task(&["make"], &[]);
        build.sources = vec!["missing-*.c".to_string()];
        build.generates = vec!["missing.o".to_string()];
        registry.insert("build", build);
        let shell = RecordingShell::default();

        let status = runner(registry, &shell)
            .run_task("build", &mut RunContext::new())
            .unwrap();

        assert_eq!(status, TaskStatus::Completed);
        assert_eq!(shell.commands(), vec!["make"]);
    }

    #[test]
    fn test_write_output() {
        let mut out = Vec::new();
        write_output(&mut out, "").unwrap();
        assert!(out.is_empty());

        write_output(&mut out, "no newline").unwrap();
        write_output(&mut out, "done\n").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "no newline\ndone\n");
    }

    #[test]
    fn test_captured_value_trims_line_breaks() {
        assert_eq!(captured_value("42\n"), "42");
        assert_eq!(captured_value("a\nb\r\n"), "a\nb");
        assert_eq!(captured_value(""), "");
    }
}
