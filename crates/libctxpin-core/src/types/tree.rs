//! Project file tree
//!
//! An ordered forest of file and directory nodes. The pipeline only reads it
//! through [`FileTree::find`]; the tree is built by the host (from JSON) or by
//! scanning a directory on disk.

use std::path::Path;

use glob::Pattern;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CtxpinError;

/// Default cap on file size when reading contents during a scan
pub const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// A node in the file tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    #[serde(default)]
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileNode>,
}

impl FileNode {
    pub fn file(path: impl Into<String>, content: Option<String>) -> Self {
        let path = path.into();
        Self {
            name: base_name(&path).to_string(),
            path,
            kind: NodeKind::File,
            content,
            children: Vec::new(),
        }
    }

    pub fn directory(path: impl Into<String>, children: Vec<FileNode>) -> Self {
        let path = path.into();
        Self {
            name: base_name(&path).to_string(),
            path,
            kind: NodeKind::Directory,
            content: None,
            children,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Options for building a tree from disk
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Glob patterns matched against each entry's relative path and its name
    pub exclude: Vec<String>,
    /// Files larger than this are listed without content
    pub max_file_bytes: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude: vec![
                ".git".to_string(),
                ".ctxpin".to_string(),
                "target".to_string(),
                "node_modules".to_string(),
            ],
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

/// Ordered forest of file nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileTree {
    pub nodes: Vec<FileNode>,
}

impl FileTree {
    pub fn from_nodes(nodes: Vec<FileNode>) -> Self {
        Self { nodes }
    }

    /// Load a tree from a JSON array of nodes
    pub fn load_json(path: &Path) -> Result<Self, CtxpinError> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Find the node with exactly this path (depth-first, first match wins)
    pub fn find(&self, path: &str) -> Option<&FileNode> {
        let mut stack: Vec<&FileNode> = self.nodes.iter().rev().collect();
        while let Some(node) = stack.pop() {
            if node.path == path {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Number of file nodes in the tree
    pub fn file_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&FileNode> = self.nodes.iter().collect();
        while let Some(node) = stack.pop() {
            if node.is_file() {
                count += 1;
            }
            stack.extend(node.children.iter());
        }
        count
    }

    /// Build a tree from a directory on disk.
    ///
    /// Node paths are relative to `root` and use `/` separators. Symlinks are
    /// skipped. Unreadable subdirectories are logged and left empty.
    pub fn scan(root: &Path, options: &ScanOptions) -> Result<Self, CtxpinError> {
        let patterns = options
            .exclude
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| {
                    CtxpinError::InvalidArgs(format!("Invalid exclude pattern '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let nodes = scan_dir(root, "", &patterns, options.max_file_bytes)?;
        Ok(Self { nodes })
    }
}

fn scan_dir(
    dir: &Path,
    rel_prefix: &str,
    patterns: &[Pattern],
    max_file_bytes: u64,
) -> Result<Vec<FileNode>, CtxpinError> {
    let mut entries = std::fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    let mut nodes = Vec::new();
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let rel = if rel_prefix.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", rel_prefix, name)
        };

        if patterns.iter().any(|p| p.matches(&rel) || p.matches(&name)) {
            debug!(path = %rel, "excluded from scan");
            continue;
        }

        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            debug!(path = %rel, "skipping symlink");
            continue;
        }

        if file_type.is_dir() {
            let children = match scan_dir(&entry.path(), &rel, patterns, max_file_bytes) {
                Ok(children) => children,
                Err(e) => {
                    warn!(path = %rel, error = %e, "failed to read directory");
                    Vec::new()
                }
            };
            nodes.push(FileNode {
                name,
                path: rel,
                kind: NodeKind::Directory,
                content: None,
                children,
            });
        } else if file_type.is_file() {
            let content = read_content(&entry.path(), max_file_bytes);
            nodes.push(FileNode {
                name,
                path: rel,
                kind: NodeKind::File,
                content,
                children: Vec::new(),
            });
        }
    }
    Ok(nodes)
}

fn read_content(path: &Path, max_file_bytes: u64) -> Option<String> {
    let len = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to stat file");
            return None;
        }
    };
    if len > max_file_bytes {
        debug!(path = %path.display(), len, "file too large, content omitted");
        return None;
    }
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8(bytes).ok(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_tree() -> FileTree {
        FileTree::from_nodes(vec![
            FileNode::directory(
                "src",
                vec![
                    FileNode::file("src/main.ts", Some("main".to_string())),
                    FileNode::directory(
                        "src/util",
                        vec![FileNode::file("src/util/str.ts", None)],
                    ),
                ],
            ),
            FileNode::file("README.md", Some("readme".to_string())),
        ])
    }

    #[test]
    fn test_find_nested_and_top_level() {
        let tree = sample_tree();
        assert_eq!(tree.find("README.md").unwrap().content.as_deref(), Some("readme"));
        let nested = tree.find("src/util/str.ts").unwrap();
        assert!(nested.is_file());
        assert_eq!(nested.name, "str.ts");
        assert_eq!(tree.find("src/util").unwrap().kind, NodeKind::Directory);
        assert!(tree.find("src/missing.ts").is_none());
    }

    #[test]
    fn test_file_count() {
        assert_eq!(sample_tree().file_count(), 3);
    }

    #[test]
    fn test_json_shape_uses_type_field() {
        let json = r#"[
            {"path": "lib", "type": "directory", "children": [
                {"path": "lib/a.rs", "type": "file", "content": "fn a() {}"}
            ]}
        ]"#;
        let tree: FileTree = serde_json::from_str(json).unwrap();
        let node = tree.find("lib/a.rs").unwrap();
        assert_eq!(node.kind, NodeKind::File);
        assert_eq!(node.content.as_deref(), Some("fn a() {}"));
    }

    #[test]
    fn test_scan_builds_relative_sorted_tree() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        std::fs::write(dir.path().join("src/b.rs"), "b").unwrap();
        std::fs::write(dir.path().join("src/a.rs"), "a").unwrap();
        std::fs::write(dir.path().join("src/nested/c.rs"), "c").unwrap();

        let tree = FileTree::scan(dir.path(), &ScanOptions::default()).unwrap();
        let src = tree.find("src").unwrap();
        let names: Vec<_> = src.children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["a.rs", "b.rs", "nested"]);
        assert_eq!(tree.find("src/nested/c.rs").unwrap().content.as_deref(), Some("c"));
    }

    #[test]
    fn test_scan_honors_excludes_and_size_cap() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("target/debug")).unwrap();
        std::fs::write(dir.path().join("target/debug/out"), "bin").unwrap();
        std::fs::write(dir.path().join("big.txt"), "0123456789").unwrap();
        std::fs::write(dir.path().join("Cargo.lock"), "lock").unwrap();
        std::fs::write(dir.path().join("binary.dat"), [0xff, 0xfe, 0x00]).unwrap();

        let options = ScanOptions {
            exclude: vec!["target".to_string(), "*.lock".to_string()],
            max_file_bytes: 4,
        };
        let tree = FileTree::scan(dir.path(), &options).unwrap();
        assert!(tree.find("target").is_none());
        assert!(tree.find("Cargo.lock").is_none());
        assert_eq!(tree.find("big.txt").unwrap().content, None);
        assert_eq!(tree.find("binary.dat").unwrap().content, None);
    }

    #[test]
    fn test_scan_rejects_bad_pattern() {
        let dir = tempdir().unwrap();
        let options = ScanOptions {
            exclude: vec!["[".to_string()],
            ..ScanOptions::default()
        };
        let err = FileTree::scan(dir.path(), &options).unwrap_err();
        assert_eq!(err.error_code(), "invalid_args");
    }
}
