//! ToolContext - execution context for tools

use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::ToolError;

/// Execution context for tools - scoped to the generated project directory
///
/// All file operations resolve relative paths against `root`, and no path
/// may resolve outside of it.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Project root - all file ops constrained here
    pub root: PathBuf,
}

impl ToolContext {
    /// Create a new tool context
    pub fn new(root: PathBuf) -> Self {
        debug!(?root, "ToolContext::new: called");
        Self {
            root: std::path::absolute(&root).unwrap_or(root),
        }
    }

    /// Join relative paths onto the root and fold away `.` and `..`
    fn normalize_path(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let mut normalized = PathBuf::new();
        for component in joined.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    normalized.pop();
                }
                other => normalized.push(other.as_os_str()),
            }
        }
        normalized
    }

    /// Validate path is within the project root (sandbox enforcement)
    pub fn validate_path(&self, path: &Path) -> Result<PathBuf, ToolError> {
        debug!(?path, "ToolContext::validate_path: called");
        let normalized = self.normalize_path(path);

        // Existing paths are canonicalized to resolve symlinks; new files are
        // checked through their nearest existing ancestor.
        let canonical = canonicalize_existing_prefix(&normalized);
        let root_canonical = canonicalize_existing_prefix(&self.normalize_path(Path::new("")));

        if canonical.starts_with(&root_canonical) {
            Ok(canonical)
        } else {
            debug!("ToolContext::validate_path: sandbox violation detected");
            Err(ToolError::SandboxViolation {
                path: path.to_path_buf(),
                root: self.root.clone(),
            })
        }
    }

    /// Path relative to the root, for messages shown to the model
    pub fn display_path(&self, path: &Path) -> String {
        let root = canonicalize_existing_prefix(&self.root);
        path.strip_prefix(&root)
            .or_else(|_| path.strip_prefix(&self.root))
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Canonicalize the longest existing ancestor and re-append the rest
fn canonicalize_existing_prefix(path: &Path) -> PathBuf {
    let mut existing = path.to_path_buf();
    let mut rest = Vec::new();

    while !existing.exists() {
        match (existing.file_name().map(|n| n.to_os_string()), existing.parent()) {
            (Some(name), Some(parent)) => {
                rest.push(name);
                existing = parent.to_path_buf();
            }
            _ => return path.to_path_buf(),
        }
    }

    let mut canonical = existing.canonicalize().unwrap_or(existing);
    for name in rest.into_iter().rev() {
        canonical.push(name);
    }
    canonical
}
