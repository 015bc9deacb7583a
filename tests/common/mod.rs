//! Test environment for isolated flashprep testing.
//!
//! Provides `TestEnv` - a temp project directory plus helpers to run the
//! flashprep CLI inside it with a scrubbed environment.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::SystemTime;

use tempfile::TempDir;

/// Result of running a flashprep CLI command
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    /// Combine stdout and stderr
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Isolated test environment with a temp project directory.
pub struct TestEnv {
    pub project_root: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            project_root: TempDir::new().unwrap(),
        }
    }

    /// Get path relative to project root
    pub fn path(&self, relative: &str) -> PathBuf {
        self.project_root.path().join(relative)
    }

    /// Write a file relative to project root, creating parent directories
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Write a file into the default assets directory
    pub fn write_asset(&self, name: &str, content: &str) -> PathBuf {
        self.write_file(&format!("assets/{}", name), content)
    }

    /// Modification time of a file under the project root
    pub fn mtime(&self, relative: &str) -> SystemTime {
        fs::metadata(self.path(relative)).unwrap().modified().unwrap()
    }

    /// Run flashprep in this environment from the project root
    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_with_env(args, &[])
    }

    /// Run flashprep with extra environment variables set
    pub fn run_with_env(&self, args: &[&str], env_vars: &[(&str, &str)]) -> TestResult {
        let bin = env!("CARGO_BIN_EXE_flashprep");

        let mut cmd = Command::new(bin);
        cmd.current_dir(self.project_root.path())
            .args(args)
            .env_remove("FLASHPREP_PORT")
            .env_remove("FLASHPREP_BAUD")
            .env_remove("FLASHPREP_CHIP");
        for (key, value) in env_vars {
            cmd.env(key, value);
        }

        let output = cmd.output().expect("failed to run flashprep binary");

        TestResult {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a gzip artifact and return the original bytes
pub fn gunzip(path: &std::path::Path) -> Vec<u8> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let gz = fs::read(path).unwrap();
    let mut out = Vec::new();
    GzDecoder::new(gz.as_slice())
        .read_to_end(&mut out)
        .unwrap();
    out
}
