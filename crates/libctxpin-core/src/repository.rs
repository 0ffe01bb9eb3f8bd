//! Typed access to persisted context state
//!
//! Every persisted entity has one typed getter/setter pair here; callers
//! never see the underlying string keys.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::CtxpinError;
use crate::store::{KvOp, KvStore};
use crate::types::context::{ActiveGroupSet, ContextGroup, SavedContextEntry};

pub const SAVED_CONTEXT_KEY: &str = "savedContext";
pub const CONTEXT_GROUPS_KEY: &str = "contextGroups";
pub const ACTIVE_CONTEXT_GROUPS_KEY: &str = "activeContextGroups";
pub const CONTEXT_GROUP_KEY_PREFIX: &str = "contextGroup_";

/// Key holding the file list of a named group
pub fn group_files_key(name: &str) -> String {
    format!("{}{}", CONTEXT_GROUP_KEY_PREFIX, name)
}

/// Repository over saved context, context groups and the active group set.
///
/// Reads of absent entities return empty collections.
pub trait ContextRepository: Send + Sync {
    fn saved_context(&self) -> Result<Vec<SavedContextEntry>, CtxpinError>;

    /// Overwrite the saved context verbatim (no deduplication)
    fn set_saved_context(&self, entries: &[SavedContextEntry]) -> Result<(), CtxpinError>;

    fn context_groups(&self) -> Result<Vec<ContextGroup>, CtxpinError>;

    /// Overwrite the group list verbatim. Stored file lists are not touched.
    fn set_context_groups(&self, groups: &[ContextGroup]) -> Result<(), CtxpinError>;

    fn active_context_groups(&self) -> Result<ActiveGroupSet, CtxpinError>;

    fn set_active_context_groups(&self, active: &ActiveGroupSet) -> Result<(), CtxpinError>;

    /// Stored file list of a group, `None` if never saved
    fn group_files(&self, name: &str) -> Result<Option<Vec<String>>, CtxpinError>;

    /// Store a group's file list and upsert its entry in the group list,
    /// in one atomic write
    fn save_context_group(&self, name: &str, files: &[String]) -> Result<(), CtxpinError>;

    /// Remove a group's file list and its entry in the group list, in one
    /// atomic write
    fn delete_context_group(&self, name: &str) -> Result<(), CtxpinError>;
}

/// [`ContextRepository`] on top of any [`KvStore`]
#[derive(Debug)]
pub struct KvContextRepository<S> {
    store: S,
}

impl<S: KvStore> KvContextRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CtxpinError> {
        match self.store.get_item(key)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => match serde_json::from_value(value) {
                Ok(decoded) => Ok(Some(decoded)),
                Err(e) => {
                    warn!(key, error = %e, "discarding undecodable value");
                    Ok(None)
                }
            },
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CtxpinError> {
        self.store.set_item(key, &serde_json::to_value(value)?)
    }
}

impl<S: KvStore> ContextRepository for KvContextRepository<S> {
    fn saved_context(&self) -> Result<Vec<SavedContextEntry>, CtxpinError> {
        Ok(self.read(SAVED_CONTEXT_KEY)?.unwrap_or_default())
    }

    fn set_saved_context(&self, entries: &[SavedContextEntry]) -> Result<(), CtxpinError> {
        self.write(SAVED_CONTEXT_KEY, entries)
    }

    fn context_groups(&self) -> Result<Vec<ContextGroup>, CtxpinError> {
        Ok(self.read(CONTEXT_GROUPS_KEY)?.unwrap_or_default())
    }

    fn set_context_groups(&self, groups: &[ContextGroup]) -> Result<(), CtxpinError> {
        self.write(CONTEXT_GROUPS_KEY, groups)
    }

    fn active_context_groups(&self) -> Result<ActiveGroupSet, CtxpinError> {
        let names: Vec<String> = self.read(ACTIVE_CONTEXT_GROUPS_KEY)?.unwrap_or_default();
        Ok(names.into_iter().collect())
    }

    fn set_active_context_groups(&self, active: &ActiveGroupSet) -> Result<(), CtxpinError> {
        let names: Vec<&String> = active.iter().collect();
        self.write(ACTIVE_CONTEXT_GROUPS_KEY, &names)
    }

    fn group_files(&self, name: &str) -> Result<Option<Vec<String>>, CtxpinError> {
        self.read(&group_files_key(name))
    }

    fn save_context_group(&self, name: &str, files: &[String]) -> Result<(), CtxpinError> {
        let mut groups = self.context_groups()?;
        match groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.files = files.to_vec(),
            None => groups.push(ContextGroup::new(name, files.to_vec())),
        }

        self.store.apply(vec![
            KvOp::set(group_files_key(name), serde_json::to_value(files)?),
            KvOp::set(CONTEXT_GROUPS_KEY, serde_json::to_value(&groups)?),
        ])
    }

    fn delete_context_group(&self, name: &str) -> Result<(), CtxpinError> {
        let mut groups = self.context_groups()?;
        groups.retain(|g| g.name != name);

        self.store.apply(vec![
            KvOp::remove(group_files_key(name)),
            KvOp::set(CONTEXT_GROUPS_KEY, serde_json::to_value(&groups)?),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn repo() -> KvContextRepository<MemoryStore> {
        KvContextRepository::new(MemoryStore::new())
    }

    #[test]
    fn test_absent_collections_default_empty() {
        let repo = repo();
        assert!(repo.saved_context().unwrap().is_empty());
        assert!(repo.context_groups().unwrap().is_empty());
        assert!(repo.active_context_groups().unwrap().is_empty());
        assert_eq!(repo.group_files("none").unwrap(), None);
    }

    #[test]
    fn test_saved_context_roundtrip_is_verbatim() {
        let repo = repo();
        // Duplicates are kept: set does not validate
        let entries = vec![
            SavedContextEntry::new("b.ts", "2"),
            SavedContextEntry::new("a.ts", "1"),
            SavedContextEntry::new("b.ts", "2"),
        ];
        repo.set_saved_context(&entries).unwrap();
        assert_eq!(repo.saved_context().unwrap(), entries);
    }

    #[test]
    fn test_active_groups_stored_as_array_loaded_as_set() {
        let repo = repo();
        repo.store()
            .set_item(ACTIVE_CONTEXT_GROUPS_KEY, &json!(["b", "a", "b"]))
            .unwrap();

        let active = repo.active_context_groups().unwrap();
        assert_eq!(active.len(), 2);
        assert!(active.contains("a") && active.contains("b"));

        repo.set_active_context_groups(&active).unwrap();
        assert_eq!(
            repo.store().get_item(ACTIVE_CONTEXT_GROUPS_KEY).unwrap(),
            Some(json!(["a", "b"]))
        );
    }

    #[test]
    fn test_undecodable_value_reads_as_empty() {
        let repo = repo();
        repo.store().set_item(SAVED_CONTEXT_KEY, &json!({"not": "a list"})).unwrap();
        assert!(repo.saved_context().unwrap().is_empty());
    }

    #[test]
    fn test_save_group_writes_list_and_files_together() {
        let repo = repo();
        let files = vec!["src/a.ts".to_string(), "src/b.ts".to_string()];
        repo.save_context_group("frontend", &files).unwrap();

        assert_eq!(repo.group_files("frontend").unwrap(), Some(files.clone()));
        assert_eq!(
            repo.context_groups().unwrap(),
            vec![ContextGroup::new("frontend", files)]
        );
        assert!(repo.store().get_item("contextGroup_frontend").unwrap().is_some());
    }

    #[test]
    fn test_save_group_twice_updates_in_place() {
        let repo = repo();
        repo.save_context_group("a", &["x".to_string()]).unwrap();
        repo.save_context_group("b", &["y".to_string()]).unwrap();
        repo.save_context_group("a", &["z".to_string()]).unwrap();

        let groups = repo.context_groups().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], ContextGroup::new("a", vec!["z".to_string()]));
        assert_eq!(repo.group_files("a").unwrap(), Some(vec!["z".to_string()]));
    }

    #[test]
    fn test_delete_group_removes_both() {
        let repo = repo();
        repo.save_context_group("a", &["x".to_string()]).unwrap();
        repo.save_context_group("b", &["y".to_string()]).unwrap();

        repo.delete_context_group("a").unwrap();

        assert_eq!(repo.group_files("a").unwrap(), None);
        let names: Vec<_> = repo.context_groups().unwrap().into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["b".to_string()]);

        // Deleting an unknown group is a no-op
        repo.delete_context_group("missing").unwrap();
    }
}
