//! list_files tool - list files and directories

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolResult};

/// List files and directories in a path
pub struct ListFilesTool;

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &'static str {
        "list_files"
    }

    fn description(&self) -> &'static str {
        "List files and directories in a directory of the project. Directories end with '/'."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "Directory relative to the project root (default: .)"
                }
            }
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "ListFilesTool::execute: called");
        let directory = input["directory"].as_str().unwrap_or(".");

        let full_path = match ctx.validate_path(Path::new(directory)) {
            Ok(p) => p,
            Err(e) => {
                debug!(%e, "ListFilesTool::execute: path validation failed");
                return ToolResult::error(e.to_string());
            }
        };

        let mut dir = match tokio::fs::read_dir(&full_path).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && directory == "." => {
                // The project root is created lazily by the first write
                return ToolResult::success("(empty directory)");
            }
            Err(e) => {
                debug!(%e, "ListFilesTool::execute: failed to read directory");
                return ToolResult::error(format!("Failed to read directory: {}", e));
            }
        };

        let mut entries = Vec::new();
        loop {
            let entry = match dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    entries.push(Err(e));
                    break;
                }
            };

            let name = entry.file_name().to_string_lossy().to_string();
            let Ok(metadata) = entry.metadata().await else {
                debug!(%name, "ListFilesTool::execute: failed to get metadata, skipping entry");
                continue;
            };

            let suffix = if metadata.is_dir() { "/" } else { "" };
            entries.push(Ok(format!("{}{}", name, suffix)));
        }

        render_listing(entries)
    }
}

/// Sorted listing, or an error if reading any entry failed
fn render_listing(entries: impl IntoIterator<Item = std::io::Result<String>>) -> ToolResult {
    let mut names = match entries.into_iter().collect::<std::io::Result<Vec<_>>>() {
        Ok(names) => names,
        Err(e) => {
            debug!(%e, "ListFilesTool::execute: failed to read directory entry");
            return ToolResult::error(format!("Failed to read directory entry: {}", e));
        }
    };

    names.sort();
    debug!(entries_count = %names.len(), "ListFilesTool::execute: entries collected");

    if names.is_empty() {
        ToolResult::success("(empty directory)")
    } else {
        ToolResult::success(names.join("\n"))
    }
}
