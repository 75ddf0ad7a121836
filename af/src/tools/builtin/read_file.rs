//! read_file tool - read a file's raw contents

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError, ToolResult};

/// Read a file inside the project root
///
/// A missing file reads as the empty string: the coder treats "absent" and
/// "empty" the same way when it composes a task.
pub async fn read_existing(ctx: &ToolContext, path: &str) -> Result<String, ToolError> {
    debug!(%path, "read_existing: called");
    let full_path = ctx.validate_path(Path::new(path))?;

    match tokio::fs::read_to_string(&full_path).await {
        Ok(content) => {
            debug!(bytes = content.len(), "read_existing: file read");
            Ok(content)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("read_existing: file absent, returning empty content");
            Ok(String::new())
        }
        Err(source) => Err(ToolError::Read {
            path: path.to_string(),
            source,
        }),
    }
}

/// Read a file's contents
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read a file's contents. Returns an empty string if the file does not exist."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the project root"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "ReadFileTool::execute: called");
        let Some(path) = input["path"].as_str() else {
            return ToolResult::error("path is required");
        };

        match read_existing(ctx, path).await {
            Ok(content) => ToolResult::success(content),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}
