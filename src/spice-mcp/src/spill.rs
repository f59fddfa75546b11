//! Result classification and spill policy.
//!
//! Decides, for a completed engine run, whether the caller gets the output
//! inline, a pointer to a spill file, or an error rendering. A failing run
//! is classified before any size check and is never spilled.

use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::SpillPolicy;

/// Marker returned for a successful run that produced no output.
pub const NO_OUTPUT_MARKER: &str = "(no output)";

/// A result persisted to disk. Written once, never cleaned up by the
/// bridge; disk lifecycle belongs to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SpillRecord {
    /// Absolute path of the spill file.
    pub path: PathBuf,
    /// Approximate row count (line heuristic, not an exact count).
    pub approx_rows: usize,
    /// Result size in kibibytes.
    pub size_kb: f64,
}

impl SpillRecord {
    /// Human-readable summary pointing the caller at the spill file.
    pub fn summary(&self) -> String {
        format!(
            "Query result ({:.1} KB, ~{} rows) exceeds the inline limit and was written to:\n{}\n\nRead that file to inspect the full result.",
            self.size_kb,
            self.approx_rows,
            self.path.display()
        )
    }
}

/// How a completed engine run should be presented to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayPlan {
    /// Return the text directly in the tool response.
    Inline(String),
    /// The result was persisted; return a summary pointing at the file.
    Spill(SpillRecord),
    /// The engine failed; return its diagnostics as an error.
    Error(String),
}

/// Classify a completed engine run and apply the spill policy.
///
/// `exit_code != 0` always yields [`DisplayPlan::Error`] built from stderr
/// when non-empty, else stdout. Successful output spills only when strictly
/// larger than the policy threshold; a failed spill write degrades to
/// inline delivery with a warning prefix.
pub async fn classify(
    exit_code: i32,
    stdout: &str,
    stderr: &str,
    policy: &SpillPolicy,
) -> DisplayPlan {
    if exit_code != 0 {
        let diagnostics = if stderr.is_empty() { stdout } else { stderr };
        return DisplayPlan::Error(format!("Error (exit code {exit_code}):\n{diagnostics}"));
    }

    let size_kb = stdout.len() as f64 / 1024.0;
    if size_kb <= policy.threshold_kb {
        if stdout.is_empty() {
            return DisplayPlan::Inline(NO_OUTPUT_MARKER.to_string());
        }
        return DisplayPlan::Inline(stdout.to_string());
    }

    // Millisecond timestamps keep concurrent spills from colliding;
    // sub-millisecond collisions remain an accepted risk.
    let filename = format!(
        "{}-{}.txt",
        policy.file_prefix,
        Utc::now().timestamp_millis()
    );
    let path = policy.dir.join(filename);

    match tokio::fs::write(&path, stdout).await {
        Ok(()) => {
            let approx_rows = approximate_rows(stdout, policy.header_footer_lines);
            debug!(path = %path.display(), size_kb, approx_rows, "Spilled large result");
            DisplayPlan::Spill(SpillRecord {
                path,
                approx_rows,
                size_kb,
            })
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Failed to spill large result, returning inline"
            );
            DisplayPlan::Inline(format!(
                "Warning: result is {size_kb:.1} KB (over the {:.0} KB inline limit) but could not be written to disk: {e}\n\n{stdout}",
                policy.threshold_kb
            ))
        }
    }
}

/// Approximate the number of data rows in a tabular text rendering by
/// subtracting an assumed fixed number of header/footer lines from the
/// non-blank line count. Format-dependent by design.
fn approximate_rows(stdout: &str, header_footer_lines: usize) -> usize {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .count()
        .saturating_sub(header_footer_lines)
}
