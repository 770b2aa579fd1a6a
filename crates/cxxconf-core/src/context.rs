//! Build-configuration context: defines, check log, snapshot.

use crate::check::{CheckOutcome, CompileCheck, Feature};
use crate::error::ConfigureError;
use crate::toolchain::Toolchain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Compiler stderr kept per check record.
const STDERR_KEEP_CHARS: usize = 8192;

/// Value recorded for a configuration define.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DefineValue {
    Int(i64),
    Str(String),
}

impl DefineValue {
    /// Render the value the way it appears in the generated header.
    pub fn render(&self) -> String {
        match self {
            DefineValue::Int(v) => v.to_string(),
            DefineValue::Str(s) => {
                format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
        }
    }
}

/// One entry in the configuration check log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRecord {
    /// Diagnostic message for the check.
    pub message: String,

    /// Language features the check was built with.
    pub features: Vec<Feature>,

    /// Whether the check passed.
    pub success: bool,

    /// Compiler exit code (-1 when the check machinery failed).
    pub exit_code: i32,

    /// Compiler stderr, truncated.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// When the check ran.
    pub timestamp: DateTime<Utc>,
}

/// Serializable state of a finished configure run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigureSnapshot {
    /// When the snapshot was taken.
    pub generated_at: DateTime<Utc>,

    /// Compiler the run probed.
    pub compiler: String,

    /// Toolchain identity digest.
    pub toolchain_digest: String,

    /// Recorded defines, ordered by name.
    pub defines: BTreeMap<String, DefineValue>,

    /// Check log in execution order.
    pub checks: Vec<CheckRecord>,
}

/// Configuration state for one configure run.
///
/// Owned by the driver and passed by mutable reference into probes: probes
/// read the toolchain through `attempt_compile` and write results through
/// `define`, nothing else. The driver serializes the final state into
/// generated build artifacts.
pub struct ConfigureContext {
    toolchain: Toolchain,
    check: CompileCheck,
    defines: BTreeMap<String, DefineValue>,
    checks: Vec<CheckRecord>,
}

impl ConfigureContext {
    pub fn new(toolchain: Toolchain) -> Self {
        Self {
            toolchain,
            check: CompileCheck::new(),
            defines: BTreeMap::new(),
            checks: Vec::new(),
        }
    }

    /// Replace the compile-check runner (custom timeout).
    pub fn with_check(mut self, check: CompileCheck) -> Self {
        self.check = check;
        self
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Attempt to compile `fragment` against the active toolchain.
    ///
    /// Emits one diagnostic line and appends one record to the check log.
    ///
    /// With `mandatory = false` any failure (rejected syntax, missing
    /// compiler or broken check machinery) collapses to `Ok(false)`.
    /// With `mandatory = true` a failed check aborts the configure run.
    pub async fn attempt_compile(
        &mut self,
        message: &str,
        fragment: &str,
        features: &[Feature],
        mandatory: bool,
    ) -> Result<bool, ConfigureError> {
        let outcome = match self.check.run(&self.toolchain, fragment, features).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // Machinery failure is indistinguishable from a negative
                // detection result.
                debug!(check = %message, error = %e, "check machinery failed");
                CheckOutcome {
                    exit_code: -1,
                    stdout: String::new(),
                    stderr: e.to_string(),
                    duration_ms: 0,
                    success: false,
                }
            }
        };

        let passed = outcome.passed();
        let result = if passed { "yes" } else { "no" };
        info!(check = %message, result = result);

        self.checks.push(CheckRecord {
            message: message.to_string(),
            features: features.to_vec(),
            success: passed,
            exit_code: outcome.exit_code,
            stderr: truncate(&outcome.stderr, STDERR_KEEP_CHARS),
            duration_ms: outcome.duration_ms,
            timestamp: Utc::now(),
        });

        if mandatory && !passed {
            return Err(ConfigureError::MandatoryCheckFailed(message.to_string()));
        }

        Ok(passed)
    }

    /// Record a configuration define. Redefining a key overwrites it.
    pub fn define(&mut self, name: &str, value: DefineValue) {
        debug!(define = %name, value = %value.render());
        self.defines.insert(name.to_string(), value);
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.defines.contains_key(name)
    }

    pub fn get_define(&self, name: &str) -> Option<&DefineValue> {
        self.defines.get(name)
    }

    /// Recorded defines, ordered by name.
    pub fn defines(&self) -> &BTreeMap<String, DefineValue> {
        &self.defines
    }

    /// Check log in execution order.
    pub fn checks(&self) -> &[CheckRecord] {
        &self.checks
    }

    /// Snapshot the configuration state for persistence.
    pub fn snapshot(&self) -> ConfigureSnapshot {
        ConfigureSnapshot {
            generated_at: Utc::now(),
            compiler: self.toolchain.compiler.to_string_lossy().to_string(),
            toolchain_digest: self.toolchain.identity_digest(),
            defines: self.defines.clone(),
            checks: self.checks.clone(),
        }
    }
}

/// Truncate a string for storage
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAGMENT: &str = "int main() { return 0; }\n";

    fn context_with(compiler: &str) -> ConfigureContext {
        ConfigureContext::new(Toolchain::with_compiler(compiler))
    }

    #[test]
    fn test_define_and_lookup() {
        let mut ctx = context_with("true");
        assert!(!ctx.is_defined("HAVE_THING"));

        ctx.define("HAVE_THING", DefineValue::Int(1));
        assert!(ctx.is_defined("HAVE_THING"));
        assert_eq!(ctx.get_define("HAVE_THING"), Some(&DefineValue::Int(1)));
    }

    #[test]
    fn test_redefine_overwrites() {
        let mut ctx = context_with("true");
        ctx.define("NAME", DefineValue::Str("a".to_string()));
        ctx.define("NAME", DefineValue::Str("b".to_string()));
        assert_eq!(
            ctx.get_define("NAME"),
            Some(&DefineValue::Str("b".to_string()))
        );
        assert_eq!(ctx.defines().len(), 1);
    }

    #[test]
    fn test_define_value_render() {
        assert_eq!(DefineValue::Int(1).render(), "1");
        assert_eq!(
            DefineValue::Str("a \"b\"".to_string()).render(),
            "\"a \\\"b\\\"\""
        );
    }

    #[tokio::test]
    async fn test_attempt_compile_success() {
        let mut ctx = context_with("true");
        let supported = ctx
            .attempt_compile("Checking for thing", FRAGMENT, &[Feature::Cxx], false)
            .await
            .expect("check failed");
        assert!(supported);
        assert_eq!(ctx.checks().len(), 1);
        assert!(ctx.checks()[0].success);
    }

    #[tokio::test]
    async fn test_attempt_compile_rejection() {
        let mut ctx = context_with("false");
        let supported = ctx
            .attempt_compile("Checking for thing", FRAGMENT, &[Feature::Cxx], false)
            .await
            .expect("check failed");
        assert!(!supported);
        assert!(!ctx.checks()[0].success);
    }

    #[tokio::test]
    async fn test_attempt_compile_missing_compiler_collapses() {
        let mut ctx = context_with("/nonexistent-binary-that-does-not-exist");
        let supported = ctx
            .attempt_compile("Checking for thing", FRAGMENT, &[Feature::Cxx], false)
            .await
            .expect("non-mandatory check must not error");
        assert!(!supported);
        assert_eq!(ctx.checks()[0].exit_code, -1);
    }

    #[tokio::test]
    async fn test_attempt_compile_mandatory_failure_is_error() {
        let mut ctx = context_with("false");
        let result = ctx
            .attempt_compile("Checking for thing", FRAGMENT, &[Feature::Cxx], true)
            .await;
        match result {
            Err(ConfigureError::MandatoryCheckFailed(msg)) => {
                assert_eq!(msg, "Checking for thing");
            }
            other => panic!("expected MandatoryCheckFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_snapshot_carries_defines_and_checks() {
        let mut ctx = context_with("true");
        ctx.attempt_compile("Checking for thing", FRAGMENT, &[Feature::Cxx], false)
            .await
            .unwrap();
        ctx.define("HAVE_THING", DefineValue::Int(1));

        let snapshot = ctx.snapshot();
        assert_eq!(snapshot.compiler, "true");
        assert_eq!(snapshot.defines.get("HAVE_THING"), Some(&DefineValue::Int(1)));
        assert_eq!(snapshot.checks.len(), 1);
        assert!(!snapshot.toolchain_digest.is_empty());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("0123456789", 4), "0123");
    }
}
