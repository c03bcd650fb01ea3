//! Command execution
//!
//! This module runs shell command strings. Standard output is captured and
//! returned; standard error and standard input are shared with the runner.

use crate::error::{ExecutionError, ExecutionResult};
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, ExitStatus, Stdio};

/// Something that can run a command string in a directory
pub trait CommandRunner {
    /// Run `command` in `dir` and return its standard output
    fn execute(&self, command: &str, dir: &Path) -> ExecutionResult<String>;
}

/// Runs commands through a POSIX shell (`sh -c`)
#[derive(Debug, Clone)]
pub struct PosixShell {
    program: PathBuf,
}

impl PosixShell {
    pub fn new(program: PathBuf) -> Self {
        PosixShell { program }
    }

    /// Locate `sh` on `PATH`
    pub fn detect() -> Option<Self> {
        find_in_path("sh").map(Self::new)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl CommandRunner for PosixShell {
    fn execute(&self, command: &str, dir: &Path) -> ExecutionResult<String> {
        let mut cmd = StdCommand::new(&self.program);
        cmd.arg("-c").arg(command);
        capture_stdout(cmd, command, dir)
    }
}

/// Runs commands through the platform interpreter (`cmd /C`)
#[derive(Debug, Clone, Default)]
pub struct NativeShell;

impl CommandRunner for NativeShell {
    fn execute(&self, command: &str, dir: &Path) -> ExecutionResult<String> {
        let mut cmd = StdCommand::new("cmd");
        cmd.arg("/C").arg(command);
        capture_stdout(cmd, command, dir)
    }
}

/// Pick the shell strategy for this host: a POSIX shell when one is on
/// `PATH`, the native interpreter otherwise.
pub fn detect_shell() -> Box<dyn CommandRunner> {
    match PosixShell::detect() {
        Some(shell) => {
            log::debug!("Using POSIX shell {}", shell.program().display());
            Box::new(shell)
        }
        None => {
            log::debug!("No POSIX shell found, using cmd");
            Box::new(NativeShell)
        }
    }
}

fn capture_stdout(mut cmd: StdCommand, command: &str, dir: &Path) -> ExecutionResult<String> {
    cmd.current_dir(dir);
    cmd.stdin(Stdio::inherit());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::inherit());

    let output = cmd.output().map_err(|e| ExecutionError::Spawn {
        command: command.to_string(),
        source: e,
    })?;

    check_status(output.status, command)?;

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn check_status(status: ExitStatus, command: &str) -> ExecutionResult<()> {
    if status.success() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Err(ExecutionError::Terminated {
                command: command.to_string(),
                signal,
            });
        }
    }

    Err(ExecutionError::CommandFailed {
        command: command.to_string(),
        code: status.code(),
    })
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let file_name = format!("{}{}", name, env::consts::EXE_SUFFIX);
    env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths)
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file())
    })
}
