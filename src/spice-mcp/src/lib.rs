//! Spice MCP - bridge between MCP tool calls and the Spice SQL CLI.
//!
//! The bridge exposes a single tool, `spice_sql`, over an MCP stdio
//! transport. Each invocation spawns one `spice sql` child process, feeds
//! it the query on stdin, buffers its output, and returns the result
//! inline or, for oversized results, as a pointer to a spill file in the
//! temporary directory.

pub mod config;
pub mod engine;
pub mod spill;
pub mod tool;

pub use config::{BridgeConfig, SpillPolicy};
pub use engine::{ExecutionOutcome, QueryEngine};
pub use spill::{DisplayPlan, SpillRecord};
pub use tool::SpiceSqlTool;
