//! Saved-context pipeline
//!
//! Resolves selected paths against the file tree, persists the result as the
//! saved context, and derives the saved context from the union of active
//! context groups.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, error};

use crate::copy::{copy_context, Clipboard, CopyOutcome, Notifier};
use crate::error::CtxpinError;
use crate::repository::ContextRepository;
use crate::types::context::{
    update_file_content_in_context, ActiveGroupSet, ContextGroup, SavedContextEntry,
};
use crate::types::tree::FileTree;

/// Produce one entry per requested path that is a file in `tree`.
///
/// Missing paths and directories are dropped. A file without content
/// resolves to an empty string.
pub fn resolve_entries(tree: &FileTree, paths: &BTreeSet<String>) -> Vec<SavedContextEntry> {
    paths
        .iter()
        .filter_map(|path| match tree.find(path) {
            Some(node) if node.is_file() => Some(SavedContextEntry::new(
                path.clone(),
                node.content.clone().unwrap_or_default(),
            )),
            Some(_) => {
                debug!(path = %path, "not a file, dropped");
                None
            }
            None => {
                debug!(path = %path, "not in file tree, dropped");
                None
            }
        })
        .collect()
}

/// Union of group file lists. The first group naming a path keeps it.
fn merge_group_paths<I>(lookups: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = (String, Option<Vec<String>>)>,
{
    let mut paths = BTreeSet::new();
    for (name, files) in lookups {
        let Some(files) = files else {
            debug!(group = %name, "no stored file list");
            continue;
        };
        for path in files {
            if paths.contains(&path) {
                debug!(group = %name, path = %path, "path already contributed by an earlier group");
                continue;
            }
            paths.insert(path);
        }
    }
    paths
}

/// Operations over the persisted context state
pub struct ContextPipeline<R> {
    repo: Arc<R>,
}

impl<R> Clone for ContextPipeline<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: ContextRepository> ContextPipeline<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo: Arc::new(repo),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn saved_context(&self) -> Result<Vec<SavedContextEntry>, CtxpinError> {
        self.repo.saved_context()
    }

    pub fn set_saved_context(&self, entries: &[SavedContextEntry]) -> Result<(), CtxpinError> {
        self.repo.set_saved_context(entries)
    }

    /// Resolve `paths` against `tree` and replace the saved context.
    ///
    /// Entries are unique and ordered by path. On failure nothing is
    /// persisted and the error is returned.
    pub fn update_saved_context<I, P>(
        &self,
        tree: &FileTree,
        paths: I,
    ) -> Result<Vec<SavedContextEntry>, CtxpinError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let requested: BTreeSet<String> = paths.into_iter().map(|p| p.as_ref().to_string()).collect();
        let entries = resolve_entries(tree, &requested);

        if let Err(e) = self.repo.set_saved_context(&entries) {
            error!(error = %e, "failed to persist saved context");
            return Err(e);
        }

        debug!(
            requested = requested.len(),
            resolved = entries.len(),
            "saved context updated"
        );
        Ok(entries)
    }

    /// Like [`update_saved_context`](Self::update_saved_context) but absorbs
    /// failures: they are logged and an empty list is returned.
    pub fn update_saved_context_lossy<I, P>(&self, tree: &FileTree, paths: I) -> Vec<SavedContextEntry>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        self.update_saved_context(tree, paths).unwrap_or_default()
    }

    /// Replace the content of one saved entry after its file was edited
    pub fn refresh_file_content(
        &self,
        path: &str,
        new_content: &str,
    ) -> Result<Vec<SavedContextEntry>, CtxpinError> {
        let current = self.repo.saved_context()?;
        if !current.iter().any(|e| e.path == path) {
            debug!(path, "not in saved context, nothing to refresh");
            return Ok(current);
        }
        let updated = update_file_content_in_context(&current, path, new_content);
        self.repo.set_saved_context(&updated)?;
        Ok(updated)
    }

    pub fn context_groups(&self) -> Result<Vec<ContextGroup>, CtxpinError> {
        self.repo.context_groups()
    }

    pub fn set_context_groups(&self, groups: &[ContextGroup]) -> Result<(), CtxpinError> {
        self.repo.set_context_groups(groups)
    }

    pub fn active_context_groups(&self) -> Result<ActiveGroupSet, CtxpinError> {
        self.repo.active_context_groups()
    }

    pub fn set_active_context_groups(&self, active: &ActiveGroupSet) -> Result<(), CtxpinError> {
        self.repo.set_active_context_groups(active)
    }

    pub fn save_context_group(&self, name: &str, files: &[String]) -> Result<(), CtxpinError> {
        self.repo.save_context_group(name, files)
    }

    pub fn delete_context_group(&self, name: &str) -> Result<(), CtxpinError> {
        self.repo.delete_context_group(name)
    }

    /// Recompute the saved context from the groups named in `active`.
    ///
    /// Active names without a group in `groups`, and groups without a stored
    /// file list, contribute nothing.
    pub fn update_saved_context_from_groups(
        &self,
        groups: &[ContextGroup],
        active: &ActiveGroupSet,
        tree: &FileTree,
    ) -> Result<Vec<SavedContextEntry>, CtxpinError> {
        let mut lookups = Vec::new();
        for group in groups.iter().filter(|g| active.contains(&g.name)) {
            lookups.push((group.name.clone(), self.repo.group_files(&group.name)?));
        }
        let paths = merge_group_paths(lookups);
        self.update_saved_context(tree, &paths)
    }

    /// Recompute the saved context from the persisted groups and active set
    pub fn apply_active_groups(&self, tree: &FileTree) -> Result<Vec<SavedContextEntry>, CtxpinError> {
        let groups = self.repo.context_groups()?;
        let active = self.repo.active_context_groups()?;
        self.update_saved_context_from_groups(&groups, &active, tree)
    }

    /// Switch a group on and recompute the saved context
    pub fn activate_group(&self, name: &str, tree: &FileTree) -> Result<Vec<SavedContextEntry>, CtxpinError> {
        let groups = self.repo.context_groups()?;
        if !groups.iter().any(|g| g.name == name) {
            return Err(CtxpinError::group_not_found(name));
        }

        let mut active = self.repo.active_context_groups()?;
        active.insert(name.to_string());
        self.repo.set_active_context_groups(&active)?;
        self.update_saved_context_from_groups(&groups, &active, tree)
    }

    /// Switch a group off and recompute the saved context.
    ///
    /// A group that is not active leaves the saved context untouched.
    pub fn deactivate_group(&self, name: &str, tree: &FileTree) -> Result<Vec<SavedContextEntry>, CtxpinError> {
        let groups = self.repo.context_groups()?;
        if !groups.iter().any(|g| g.name == name) {
            return Err(CtxpinError::group_not_found(name));
        }

        let mut active = self.repo.active_context_groups()?;
        if !active.remove(name) {
            debug!(group = name, "group not active, saved context kept");
            return self.repo.saved_context();
        }
        self.repo.set_active_context_groups(&active)?;
        self.update_saved_context_from_groups(&groups, &active, tree)
    }

    /// Copy the persisted saved context to the clipboard
    pub fn copy_saved_context(
        &self,
        clipboard: &dyn Clipboard,
        notifier: &dyn Notifier,
    ) -> Result<CopyOutcome, CtxpinError> {
        let entries = self.repo.saved_context()?;
        Ok(copy_context(&entries, clipboard, notifier))
    }
}

#[cfg(feature = "async")]
impl<R: ContextRepository + 'static> ContextPipeline<R> {
    /// Async variant of
    /// [`update_saved_context_from_groups`](Self::update_saved_context_from_groups).
    ///
    /// Runs one blocking lookup task per active group, waits for all of
    /// them, then resolves and persists.
    pub async fn update_saved_context_from_groups_async(
        &self,
        groups: &[ContextGroup],
        active: &ActiveGroupSet,
        tree: &FileTree,
    ) -> Result<Vec<SavedContextEntry>, CtxpinError> {
        let mut tasks = tokio::task::JoinSet::new();
        for (index, group) in groups.iter().enumerate() {
            if !active.contains(&group.name) {
                continue;
            }
            let repo = Arc::clone(&self.repo);
            let name = group.name.clone();
            tasks.spawn_blocking(move || {
                let files = repo.group_files(&name)?;
                Ok::<_, CtxpinError>((index, name, files))
            });
        }

        let mut lookups = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let lookup = joined
                .map_err(|e| CtxpinError::Internal(format!("group lookup task failed: {}", e)))??;
            lookups.push(lookup);
        }
        // Tasks finish in any order; merge in group order
        lookups.sort_by_key(|(index, _, _)| *index);

        let paths = merge_group_paths(lookups.into_iter().map(|(_, name, files)| (name, files)));
        self.update_saved_context(tree, &paths)
    }
}
