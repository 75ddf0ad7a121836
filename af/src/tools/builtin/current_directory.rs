//! get_current_directory tool

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{Tool, ToolContext, ToolResult};

/// Report the project root the other tools resolve paths against
pub struct CurrentDirectoryTool;

#[async_trait]
impl Tool for CurrentDirectoryTool {
    fn name(&self) -> &'static str {
        "get_current_directory"
    }

    fn description(&self) -> &'static str {
        "Return the project root directory. All relative paths are resolved against it."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _input: Value, ctx: &ToolContext) -> ToolResult {
        ToolResult::success(ctx.root.display().to_string())
    }
}
