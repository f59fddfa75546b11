//! Bridge configuration.
//!
//! All values are resolved once at startup and passed into the components
//! that need them; nothing re-reads the environment per invocation.

use std::path::PathBuf;

/// Default query engine binary, resolved via `PATH`.
pub const DEFAULT_ENGINE_BIN: &str = "spice";

/// Default inline size threshold in kibibytes. Results strictly larger
/// than this are spilled to disk.
pub const DEFAULT_SPILL_THRESHOLD_KB: f64 = 50.0;

/// Default number of header/footer lines the row-count heuristic subtracts
/// from the engine's tabular rendering.
pub const DEFAULT_HEADER_FOOTER_LINES: usize = 4;

/// Default spill filename prefix.
pub const DEFAULT_FILE_PREFIX: &str = "spice-sql";

/// Configuration for the query bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Query engine binary to invoke.
    pub engine_bin: String,
    /// Spice Cloud API key. When present, `--cloud --api-key <value>` is
    /// appended to the engine invocation. Never logged.
    pub api_key: Option<String>,
    /// Spill policy for oversized results.
    pub spill: SpillPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            engine_bin: DEFAULT_ENGINE_BIN.to_string(),
            api_key: None,
            spill: SpillPolicy::default(),
        }
    }
}

/// Policy constants for classifying and spilling large results.
///
/// The threshold and the header/footer heuristic are calibration choices,
/// not physical constraints, so they stay configurable.
#[derive(Debug, Clone)]
pub struct SpillPolicy {
    /// Inline size threshold in kibibytes; strictly larger results spill.
    pub threshold_kb: f64,
    /// Assumed header/footer line count subtracted by the row heuristic.
    pub header_footer_lines: usize,
    /// Directory spill files are written to.
    pub dir: PathBuf,
    /// Spill filename prefix.
    pub file_prefix: String,
}

impl Default for SpillPolicy {
    fn default() -> Self {
        Self {
            threshold_kb: DEFAULT_SPILL_THRESHOLD_KB,
            header_footer_lines: DEFAULT_HEADER_FOOTER_LINES,
            dir: std::env::temp_dir(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }
}
