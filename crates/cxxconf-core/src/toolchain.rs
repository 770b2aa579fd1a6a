//! C++ toolchain discovery and identity.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Compiler candidates tried in order when `CXX` is not set.
const COMPILER_CANDIDATES: &[&str] = &["c++", "g++", "clang++"];

/// The active C++ toolchain used for compile checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Toolchain {
    /// Compiler executable (name resolved via PATH, or an absolute path).
    pub compiler: PathBuf,

    /// Baseline flags passed to every compile check.
    pub cxxflags: Vec<String>,
}

impl Toolchain {
    /// Create a toolchain for an explicit compiler.
    pub fn with_compiler(compiler: impl Into<PathBuf>) -> Self {
        Self {
            compiler: compiler.into(),
            cxxflags: Vec::new(),
        }
    }

    /// Add baseline flags applied to every compile check.
    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cxxflags.extend(flags.into_iter().map(Into::into));
        self
    }

    /// Discover the active toolchain.
    ///
    /// `CXX` wins; otherwise the first candidate that answers `--version`.
    /// A host without any compiler still gets a toolchain (the `c++`
    /// fallback); the absence surfaces later as a failed compile check,
    /// never as a discovery error.
    pub fn discover() -> Self {
        if let Ok(cxx) = std::env::var("CXX") {
            let cxx = cxx.trim().to_string();
            if !cxx.is_empty() {
                debug!(compiler = %cxx, "Using compiler from CXX");
                return Self::with_compiler(cxx);
            }
        }

        for candidate in COMPILER_CANDIDATES {
            if query_version(Path::new(candidate)).is_some() {
                debug!(compiler = %candidate, "Discovered compiler");
                return Self::with_compiler(*candidate);
            }
        }

        warn!("No C++ compiler answered --version, falling back to 'c++'");
        Self::with_compiler("c++")
    }

    /// First line of `<compiler> --version`, if the compiler answers.
    pub fn version(&self) -> Option<String> {
        query_version(&self.compiler)
    }

    /// SHA-256 identity digest over compiler path and version banner.
    ///
    /// Stable across configure runs for the same installed compiler, so it
    /// can key cached configuration state.
    pub fn identity_digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.compiler.to_string_lossy().as_bytes());
        hasher.update(b"\0");
        hasher.update(
            self.version()
                .unwrap_or_else(|| "unknown".to_string())
                .as_bytes(),
        );
        hex::encode(hasher.finalize())
    }
}

fn query_version(compiler: &Path) -> Option<String> {
    let output = std::process::Command::new(compiler)
        .arg("--version")
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout.lines().next().map(|line| line.trim().to_string())
}
