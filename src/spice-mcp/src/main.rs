//! `spice-mcp` binary: MCP stdio server exposing the `spice_sql` tool.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use spice_mcp::config::{
    BridgeConfig, DEFAULT_ENGINE_BIN, DEFAULT_SPILL_THRESHOLD_KB, SpillPolicy,
};
use spice_mcp::tool::SpiceSqlTool;
use spice_mcp_server::McpServerBuilder;

#[derive(Debug, Parser)]
#[command(name = "spice-mcp", version, about = "MCP stdio bridge to the Spice SQL CLI")]
struct Cli {
    /// Query engine binary to invoke (resolved via PATH).
    #[arg(long, default_value = DEFAULT_ENGINE_BIN)]
    engine: String,

    /// Spice Cloud API key; when set, queries run with --cloud.
    #[arg(long, env = "SPICE_CLOUD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Inline size threshold in KB; strictly larger results are spilled.
    #[arg(long, default_value_t = DEFAULT_SPILL_THRESHOLD_KB)]
    spill_threshold_kb: f64,

    /// Directory for spilled results (defaults to the system temp dir).
    #[arg(long)]
    spill_dir: Option<PathBuf>,

    /// Log filter, e.g. "info" or "spice_mcp=debug".
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the protocol; all logging goes to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut spill = SpillPolicy {
        threshold_kb: cli.spill_threshold_kb,
        ..SpillPolicy::default()
    };
    if let Some(dir) = cli.spill_dir {
        spill.dir = dir;
    }

    let config = BridgeConfig {
        engine_bin: cli.engine,
        api_key: cli.api_key,
        spill,
    };

    McpServerBuilder::new("spice-sql-server", env!("CARGO_PKG_VERSION"))
        .with_logging_capability()
        .tool_handler(Arc::new(SpiceSqlTool::new(config)))
        .build()
        .run_stdio()
        .await
}
