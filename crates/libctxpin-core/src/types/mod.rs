pub mod context;
pub mod tree;

pub use context::{update_file_content_in_context, ActiveGroupSet, ContextGroup, SavedContextEntry};
pub use tree::{FileNode, FileTree, NodeKind, ScanOptions};
