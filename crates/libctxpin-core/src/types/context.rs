use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};

/// A file's captured content at the time it was selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedContextEntry {
    pub path: String,
    pub content: String,
}

impl SavedContextEntry {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// A named, reusable subset of project file paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextGroup {
    pub name: String,
    #[serde(default)]
    pub files: Vec<String>,
}

impl ContextGroup {
    pub fn new(name: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            name: name.into(),
            files,
        }
    }
}

/// Names of the groups currently switched on.
///
/// Persisted as a JSON array; duplicates collapse on load.
pub type ActiveGroupSet = BTreeSet<String>;

/// Replace the content of the entry whose path matches.
///
/// Entries with other paths are returned unchanged. A path with no matching
/// entry yields a copy of the input.
pub fn update_file_content_in_context(
    entries: &[SavedContextEntry],
    path: &str,
    new_content: &str,
) -> Vec<SavedContextEntry> {
    entries
        .iter()
        .map(|entry| {
            if entry.path == path {
                SavedContextEntry::new(entry.path.clone(), new_content)
            } else {
                entry.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<SavedContextEntry> {
        vec![
            SavedContextEntry::new("src/a.ts", "alpha"),
            SavedContextEntry::new("src/b.ts", "beta"),
        ]
    }

    #[test]
    fn test_update_content_replaces_matching_entry_only() {
        let updated = update_file_content_in_context(&sample(), "src/b.ts", "BETA");
        assert_eq!(updated[0], SavedContextEntry::new("src/a.ts", "alpha"));
        assert_eq!(updated[1], SavedContextEntry::new("src/b.ts", "BETA"));
    }

    #[test]
    fn test_update_content_non_matching_path_is_identity() {
        let entries = sample();
        let updated = update_file_content_in_context(&entries, "src/missing.ts", "x");
        assert_eq!(updated, entries);
    }

    #[test]
    fn test_update_content_on_empty_list() {
        assert!(update_file_content_in_context(&[], "a", "b").is_empty());
    }

    #[test]
    fn test_entry_json_shape() {
        let json = serde_json::to_value(SavedContextEntry::new("x.ts", "hello")).unwrap();
        assert_eq!(json, serde_json::json!({"path": "x.ts", "content": "hello"}));
    }

    #[test]
    fn test_group_without_files_field_defaults_empty() {
        let group: ContextGroup = serde_json::from_str(r#"{"name":"docs"}"#).unwrap();
        assert_eq!(group.name, "docs");
        assert!(group.files.is_empty());
    }
}
