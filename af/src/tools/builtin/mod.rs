//! Built-in file tools for the coder agent

mod current_directory;
mod list_files;
mod read_file;
mod write_file;

pub use current_directory::CurrentDirectoryTool;
pub use list_files::ListFilesTool;
pub use read_file::{ReadFileTool, read_existing};
pub use write_file::WriteFileTool;
