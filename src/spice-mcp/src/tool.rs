//! The `spice_sql` tool: argument validation, dispatch to the engine, and
//! response construction.

use anyhow::Result;
use serde_json::Value;
use spice_mcp_server::ToolHandler;
use spice_mcp_types::{CallToolResult, PropertySchema, Tool, ToolInputSchema};
use thiserror::Error;
use tracing::debug;

use crate::config::{BridgeConfig, SpillPolicy};
use crate::engine::{ExecutionOutcome, QueryEngine};
use crate::spill::{self, DisplayPlan};

/// Registered tool identifier.
pub const TOOL_NAME: &str = "spice_sql";

const TOOL_DESCRIPTION: &str = "Execute a Spice SQL query against SpiceAI datasets. Use hybrid RRF \
     (Reciprocal Rank Fusion) search combining vector_search() and \
     text_search() for semantic + keyword matching.";

const QUERY_DESCRIPTION: &str = "The SQL query to execute. Use RRF pattern: SELECT path, content, \
     fused_score FROM rrf(vector_search(dataset, 'semantic query'), \
     text_search(dataset, 'keywords', content), join_key => 'path') \
     ORDER BY fused_score DESC LIMIT 10;";

/// Invalid tool arguments. Surfaced as an error-flagged tool result; the
/// engine is never invoked.
#[derive(Debug, Error)]
pub enum QueryArgError {
    /// `query` is absent or not a string. An empty string is accepted.
    #[error("query parameter is required and must be a string")]
    MissingQuery,
}

/// Tool handler bridging MCP tool calls to the Spice CLI.
pub struct SpiceSqlTool {
    engine: QueryEngine,
    policy: SpillPolicy,
}

impl SpiceSqlTool {
    /// Create the tool from bridge configuration.
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            engine: QueryEngine::new(config.engine_bin, config.api_key),
            policy: config.spill,
        }
    }
}

#[async_trait::async_trait]
impl ToolHandler for SpiceSqlTool {
    fn tool(&self) -> Tool {
        Tool::new(TOOL_NAME, TOOL_DESCRIPTION).with_schema(
            ToolInputSchema::object()
                .property(
                    "query",
                    PropertySchema::string().description(QUERY_DESCRIPTION),
                )
                .required(vec!["query"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        // Type/presence check only; empty queries are forwarded as-is.
        let query = arguments
            .get("query")
            .and_then(Value::as_str)
            .ok_or(QueryArgError::MissingQuery)?;

        debug!(bytes = query.len(), "Executing query");

        match self.engine.execute(query).await {
            ExecutionOutcome::SpawnFailed { message } => Ok(CallToolResult::error(format!(
                "Failed to execute {}: {}",
                self.engine.bin(),
                message
            ))),
            ExecutionOutcome::Completed {
                exit_code,
                stdout,
                stderr,
            } => {
                let plan = spill::classify(exit_code, &stdout, &stderr, &self.policy).await;
                Ok(render(plan))
            }
        }
    }
}

/// Map a display plan to the tool response. Pure, no I/O.
pub fn render(plan: DisplayPlan) -> CallToolResult {
    match plan {
        DisplayPlan::Inline(text) => CallToolResult::text(text),
        DisplayPlan::Spill(record) => CallToolResult::text(record.summary()),
        DisplayPlan::Error(text) => CallToolResult::error(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spill::SpillRecord;
    use serde_json::json;

    #[test]
    fn test_render_is_a_pure_mapping() {
        let inline = render(DisplayPlan::Inline("1\n".to_string()));
        assert!(!inline.is_error());
        assert_eq!(inline.content[0].as_text(), Some("1\n"));

        let error = render(DisplayPlan::Error("Error (exit code 1):\nboom".to_string()));
        assert!(error.is_error());

        let spill = render(DisplayPlan::Spill(SpillRecord {
            path: "/tmp/spice-sql-1.txt".into(),
            approx_rows: 12,
            size_kb: 80.0,
        }));
        assert!(!spill.is_error());
        assert!(
            spill.content[0]
                .as_text()
                .unwrap()
                .contains("/tmp/spice-sql-1.txt")
        );
    }

    #[test]
    fn test_tool_metadata() {
        let tool = SpiceSqlTool::new(BridgeConfig::default()).tool();

        assert_eq!(tool.name, TOOL_NAME);
        assert!(tool.description.unwrap().contains("Spice SQL"));
        assert_eq!(
            tool.input_schema.required.as_deref(),
            Some(&["query".to_string()][..])
        );
        assert_eq!(
            tool.input_schema.properties.get("query").unwrap().schema_type,
            "string"
        );
    }

    #[tokio::test]
    async fn test_missing_query_argument() {
        let tool = SpiceSqlTool::new(BridgeConfig::default());

        let err = tool.execute(json!({})).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "query parameter is required and must be a string"
        );
    }

    #[tokio::test]
    async fn test_non_string_query_argument() {
        let tool = SpiceSqlTool::new(BridgeConfig::default());

        let err = tool.execute(json!({ "query": 42 })).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "query parameter is required and must be a string"
        );
    }

    #[cfg(unix)]
    mod with_fake_engine {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn bridge_config(dir: &tempfile::TempDir, body: &str) -> BridgeConfig {
            let bin = dir.path().join("engine.sh");
            std::fs::write(&bin, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();

            BridgeConfig {
                engine_bin: bin.to_string_lossy().into_owned(),
                api_key: None,
                spill: SpillPolicy {
                    dir: dir.path().to_path_buf(),
                    ..SpillPolicy::default()
                },
            }
        }

        #[tokio::test]
        async fn test_successful_query_returns_stdout_inline() {
            let dir = tempfile::tempdir().unwrap();
            let tool = SpiceSqlTool::new(bridge_config(&dir, "cat > /dev/null\nprintf '1\\n'"));

            let result = tool.execute(json!({ "query": "SELECT 1;" })).await.unwrap();
            assert!(!result.is_error());
            assert_eq!(result.content[0].as_text(), Some("1\n"));
        }

        #[tokio::test]
        async fn test_empty_query_is_accepted() {
            let dir = tempfile::tempdir().unwrap();
            let tool = SpiceSqlTool::new(bridge_config(&dir, "cat"));

            let result = tool.execute(json!({ "query": "" })).await.unwrap();
            assert!(!result.is_error());
            assert_eq!(result.content[0].as_text(), Some("(no output)"));
        }

        #[tokio::test]
        async fn test_failing_query_returns_error_with_exit_code() {
            let dir = tempfile::tempdir().unwrap();
            let tool = SpiceSqlTool::new(bridge_config(
                &dir,
                "cat > /dev/null\necho 'table not found' >&2\nexit 1",
            ));

            let result = tool
                .execute(json!({ "query": "SELECT * FROM missing;" }))
                .await
                .unwrap();
            assert!(result.is_error());

            let text = result.content[0].as_text().unwrap();
            assert!(text.contains("exit code 1"));
            assert!(text.contains("table not found"));
        }

        #[tokio::test]
        async fn test_spawn_failure_is_reported() {
            let dir = tempfile::tempdir().unwrap();
            let mut config = bridge_config(&dir, "cat");
            config.engine_bin = "/nonexistent/spice-binary".to_string();
            let tool = SpiceSqlTool::new(config);

            let result = tool.execute(json!({ "query": "SELECT 1;" })).await.unwrap();
            assert!(result.is_error());
            assert!(
                result.content[0]
                    .as_text()
                    .unwrap()
                    .starts_with("Failed to execute /nonexistent/spice-binary: ")
            );
        }

        #[tokio::test]
        async fn test_large_result_spills_to_file() {
            let dir = tempfile::tempdir().unwrap();
            // 80 KB of output: 8192 ten-byte lines.
            let tool = SpiceSqlTool::new(bridge_config(
                &dir,
                "cat > /dev/null\nseq -f 'row-%05.0f' 8192",
            ));

            let result = tool
                .execute(json!({ "query": "SELECT * FROM big;" }))
                .await
                .unwrap();
            assert!(!result.is_error());

            let text = result.content[0].as_text().unwrap();
            assert!(text.contains("exceeds the inline limit"));

            // The summary names the spill file; its content is the full stdout.
            let spill_path = dir
                .path()
                .read_dir()
                .unwrap()
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .find(|p| p.extension().is_some_and(|ext| ext == "txt"))
                .expect("spill file written");
            assert!(text.contains(&spill_path.display().to_string()));

            let written = std::fs::read_to_string(&spill_path).unwrap();
            assert_eq!(written.len(), 8192 * 10);
            assert!(written.starts_with("row-00001\n"));
        }

        #[tokio::test]
        async fn test_idempotent_responses_for_deterministic_engine() {
            let dir = tempfile::tempdir().unwrap();
            let tool = SpiceSqlTool::new(bridge_config(&dir, "cat > /dev/null\nprintf '1\\n'"));

            let first = tool.execute(json!({ "query": "SELECT 1;" })).await.unwrap();
            let second = tool.execute(json!({ "query": "SELECT 1;" })).await.unwrap();

            assert_eq!(first.is_error(), second.is_error());
            assert_eq!(
                first.content[0].as_text(),
                second.content[0].as_text()
            );
        }
    }
}
