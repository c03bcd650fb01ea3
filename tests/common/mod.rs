//! Common test utilities

#![allow(dead_code)]

use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Create a temporary directory holding a task file with the given name
pub fn create_task_file(file_name: &str, content: &str) -> (TempDir, std::path::PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(file_name);
    fs::write(&path, content).unwrap();
    (temp_dir, path)
}

/// Create a temporary directory holding a Taskfile.yml
pub fn create_taskfile_yml(content: &str) -> (TempDir, std::path::PathBuf) {
    create_task_file("Taskfile.yml", content)
}

/// Write a file and pin its modification time to `secs` after a fixed base
pub fn write_with_mtime(dir: &Path, name: &str, secs: u64) {
    let path = dir.join(name);
    fs::write(&path, name).unwrap();
    let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000 + secs);
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
}
