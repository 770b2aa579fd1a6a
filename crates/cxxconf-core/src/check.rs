//! Compile-check execution against the active toolchain.

use crate::toolchain::Toolchain;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Language features a compile check is built with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Compile only (syntax/semantics check, no link).
    Cxx,

    /// Compile and link an executable.
    CxxProgram,
}

impl Feature {
    /// Get the feature name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Feature::Cxx => "cxx",
            Feature::CxxProgram => "cxxprogram",
        }
    }
}

/// Result of a single compile attempt.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// Exit code (0 = success, -1 = no exit code available).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Whether the compiler process exited successfully.
    pub success: bool,
}

impl CheckOutcome {
    /// Whether this check passed (exit code 0).
    pub fn passed(&self) -> bool {
        self.success && self.exit_code == 0
    }
}

/// Compile-check runner: one fragment, one blocking compiler invocation.
pub struct CompileCheck {
    timeout_secs: u64,
}

impl CompileCheck {
    /// Default timeout for a single compiler invocation.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    pub fn new() -> Self {
        Self {
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Create a runner with a custom timeout (0 disables the timeout).
    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    /// Write `fragment` into a scratch directory and run the compiler over it.
    ///
    /// An `Err` means the check machinery itself failed (scratch directory,
    /// spawn, timeout); a clean compiler rejection comes back as an
    /// unsuccessful `CheckOutcome`.
    pub async fn run(
        &self,
        toolchain: &Toolchain,
        fragment: &str,
        features: &[Feature],
    ) -> anyhow::Result<CheckOutcome> {
        let start = Instant::now();

        let scratch = tempfile::tempdir()?;
        let source_path = scratch.path().join("conftest.cpp");
        std::fs::write(&source_path, fragment)?;

        let link = features.contains(&Feature::CxxProgram);
        let out_path = scratch
            .path()
            .join(if link { "conftest" } else { "conftest.o" });

        let mut command = Command::new(&toolchain.compiler);
        command.args(&toolchain.cxxflags);
        if !link {
            command.arg("-c");
        }
        command
            .arg(&source_path)
            .arg("-o")
            .arg(&out_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = command.spawn()?;

        let output = if self.timeout_secs > 0 {
            tokio::time::timeout(
                Duration::from_secs(self.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "Compile check timed out after {} seconds",
                    self.timeout_secs
                )
            })??
        } else {
            child.wait_with_output().await?
        };

        let duration_ms = start.elapsed().as_millis() as u64;

        Ok(CheckOutcome {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms,
            success: output.status.success(),
        })
    }
}

impl Default for CompileCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAGMENT: &str = "int main() { return 0; }\n";

    #[test]
    fn test_feature_names() {
        assert_eq!(Feature::Cxx.name(), "cxx");
        assert_eq!(Feature::CxxProgram.name(), "cxxprogram");
    }

    #[test]
    fn test_check_outcome_passed() {
        let outcome = CheckOutcome {
            exit_code: 0,
            stdout: "".to_string(),
            stderr: "".to_string(),
            duration_ms: 10,
            success: true,
        };
        assert!(outcome.passed());
    }

    #[test]
    fn test_check_outcome_failed() {
        let outcome = CheckOutcome {
            exit_code: 1,
            stdout: "".to_string(),
            stderr: "error".to_string(),
            duration_ms: 10,
            success: false,
        };
        assert!(!outcome.passed());
    }

    #[tokio::test]
    async fn test_run_with_accepting_command() {
        // `true` swallows any arguments and exits 0, standing in for a
        // compiler that accepts the fragment.
        let toolchain = Toolchain::with_compiler("true");
        let outcome = CompileCheck::new()
            .run(&toolchain, FRAGMENT, &[Feature::Cxx])
            .await
            .expect("run failed");
        assert!(outcome.passed());
        assert_eq!(outcome.exit_code, 0);
    }

    #[tokio::test]
    async fn test_run_with_rejecting_command() {
        let toolchain = Toolchain::with_compiler("false");
        let outcome = CompileCheck::new()
            .run(&toolchain, FRAGMENT, &[Feature::Cxx])
            .await
            .expect("run failed");
        assert!(!outcome.passed());
        assert_ne!(outcome.exit_code, 0);
    }

    #[tokio::test]
    async fn test_run_with_missing_compiler_is_err() {
        let toolchain = Toolchain::with_compiler("/nonexistent-binary-that-does-not-exist");
        let result = CompileCheck::new()
            .run(&toolchain, FRAGMENT, &[Feature::Cxx])
            .await;
        assert!(result.is_err(), "spawn failure should surface as Err");
    }
}
