//! write_file tool - write content to a file

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolResult};

/// Write content to a file, replacing what was there
pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Write the full content of a file. Creates parent directories if needed and overwrites existing files."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the project root"
                },
                "content": {
                    "type": "string",
                    "description": "Complete file content to write"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!("WriteFileTool::execute: called");
        let path = match input["path"].as_str() {
            Some(p) => p,
            None => {
                debug!("WriteFileTool::execute: missing path parameter");
                return ToolResult::error("path is required");
            }
        };

        let content = match input["content"].as_str() {
            Some(c) => c,
            None => {
                debug!("WriteFileTool::execute: missing content parameter");
                return ToolResult::error("content is required");
            }
        };

        let full_path = match ctx.validate_path(Path::new(path)) {
            Ok(p) => p,
            Err(e) => {
                debug!(%e, "WriteFileTool::execute: path validation failed");
                return ToolResult::error(e.to_string());
            }
        };

        if let Some(parent) = full_path.parent()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            debug!(%e, "WriteFileTool::execute: failed to create parent directories");
            return ToolResult::error(format!("Failed to create directories: {}", e));
        }

        if let Err(e) = tokio::fs::write(&full_path, content).await {
            debug!(%e, "WriteFileTool::execute: failed to write file");
            return ToolResult::error(format!("Failed to write file: {}", e));
        }

        debug!(bytes = %content.len(), "WriteFileTool::execute: file written successfully");
        ToolResult::success(format!("Wrote {} bytes to {}", content.len(), ctx.display_path(&full_path)))
    }
}
