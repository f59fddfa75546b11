//! Process runner for the external query engine.
//!
//! One child process per invocation: spawn `<engine> sql`, write the query
//! to its stdin, close the stream, and buffer stdout and stderr to
//! completion. No pooling, no reuse, no timeout.

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Sub-command that puts the engine into SQL execution mode.
const SQL_SUBCOMMAND: &str = "sql";

/// Outcome of one engine invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// The engine ran to termination.
    Completed {
        /// Process exit code; `-1` when terminated by a signal.
        exit_code: i32,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },
    /// The engine binary could not be launched at all.
    SpawnFailed {
        /// The underlying system error message.
        message: String,
    },
}

/// Spawns the query engine and collects its output.
///
/// Holds no mutable state; concurrent executions each own their child
/// process and buffers.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    bin: String,
    api_key: Option<String>,
}

impl QueryEngine {
    /// Create a new engine runner.
    pub fn new(bin: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            bin: bin.into(),
            api_key,
        }
    }

    /// The engine binary name, for error messages.
    pub fn bin(&self) -> &str {
        &self.bin
    }

    /// Run one query through the engine.
    ///
    /// The query text goes to the child's stdin, which is then closed; the
    /// engine is expected to read to end-of-input. Both output streams are
    /// buffered completely before this returns.
    pub async fn execute(&self, query: &str) -> ExecutionOutcome {
        let mut cmd = Command::new(&self.bin);
        cmd.arg(SQL_SUBCOMMAND);
        if let Some(key) = &self.api_key {
            cmd.arg("--cloud").arg("--api-key").arg(key);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(
            engine = %self.bin,
            cloud = self.api_key.is_some(),
            "Spawning query engine"
        );

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ExecutionOutcome::SpawnFailed {
                    message: e.to_string(),
                };
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            // A write error here usually means the engine exited early;
            // its diagnostics are still collected below.
            if let Err(e) = stdin.write_all(query.as_bytes()).await {
                debug!(error = %e, "Failed to write query to engine stdin");
            }
            // Dropping stdin closes the stream and signals end-of-input.
        }

        match child.wait_with_output().await {
            Ok(output) => ExecutionOutcome::Completed {
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Err(e) => ExecutionOutcome::SpawnFailed {
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    /// Write an executable shell script standing in for the engine binary.
    /// Scripts ignore the `sql` argument and work off stdin.
    fn fake_engine(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("engine.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_execute_captures_stdout_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_engine(&dir, "cat");
        let engine = QueryEngine::new(bin.to_string_lossy(), None);

        let outcome = engine.execute("SELECT 1;").await;
        assert_eq!(
            outcome,
            ExecutionOutcome::Completed {
                exit_code: 0,
                stdout: "SELECT 1;".to_string(),
                stderr: String::new(),
            }
        );
    }

    #[tokio::test]
    async fn test_execute_captures_stderr_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_engine(&dir, "cat > /dev/null\necho 'table not found' >&2\nexit 1");
        let engine = QueryEngine::new(bin.to_string_lossy(), None);

        let outcome = engine.execute("SELECT * FROM missing;").await;
        match outcome {
            ExecutionOutcome::Completed {
                exit_code,
                stdout,
                stderr,
            } => {
                assert_eq!(exit_code, 1);
                assert!(stdout.is_empty());
                assert_eq!(stderr, "table not found\n");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_missing_binary_is_spawn_failure() {
        let engine = QueryEngine::new("/nonexistent/spice-binary", None);

        let outcome = engine.execute("SELECT 1;").await;
        assert!(matches!(outcome, ExecutionOutcome::SpawnFailed { .. }));
    }

    #[tokio::test]
    async fn test_cloud_arguments_forwarded_when_key_present() {
        let dir = tempfile::tempdir().unwrap();
        // Echo the argv so the test can assert on the flags; the key value
        // itself must reach the engine untouched.
        let bin = fake_engine(&dir, "cat > /dev/null\necho \"$@\"");
        let engine = QueryEngine::new(bin.to_string_lossy(), Some("sk-test".to_string()));

        let outcome = engine.execute("SELECT 1;").await;
        match outcome {
            ExecutionOutcome::Completed { stdout, .. } => {
                assert_eq!(stdout, "sql --cloud --api-key sk-test\n");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_executions_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_engine(&dir, "cat");
        let engine = QueryEngine::new(bin.to_string_lossy(), None);

        let (a, b) = tokio::join!(engine.execute("first"), engine.execute("second"));
        match (a, b) {
            (
                ExecutionOutcome::Completed { stdout: out_a, .. },
                ExecutionOutcome::Completed { stdout: out_b, .. },
            ) => {
                assert_eq!(out_a, "first");
                assert_eq!(out_b, "second");
            }
            other => panic!("unexpected outcomes: {other:?}"),
        }
    }
}
