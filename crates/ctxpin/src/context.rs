use std::path::{Path, PathBuf};
use std::time::Duration;

use libctxpin_core::{
    config::{load_config, store_path, DATA_DIR_NAME},
    CommandClipboard, Config, ContextPipeline, CtxpinError, FileTree, KvContextRepository,
    LockedStore, SledStore,
};
use tracing::debug;

use crate::cli::Cli;

/// How long to wait for another ctxpin process to release the store
const STORE_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

pub type Pipeline = ContextPipeline<KvContextRepository<LockedStore>>;

/// Source of the data directory
#[derive(Debug, Clone, Copy)]
pub enum DataDirSource {
    Flag,
    Env,
    Root,
}

impl DataDirSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataDirSource::Flag => "flag",
            DataDirSource::Env => "env",
            DataDirSource::Root => "root",
        }
    }
}

/// Resolved context for a ctxpin command
pub struct CtxpinContext {
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub source: DataDirSource,
    pub config: Config,
    tree_file: Option<PathBuf>,
}

impl CtxpinContext {
    /// Resolve the project root and data directory from CLI options.
    ///
    /// Data dir resolution order:
    /// 1. --data-dir
    /// 2. CTXPIN_HOME
    /// 3. <root>/.ctxpin
    pub fn resolve(cli: &Cli) -> Result<Self, CtxpinError> {
        let cwd = std::env::current_dir()?;
        let root = match &cli.root {
            Some(root) => cwd.join(root),
            None => cwd,
        };

        let (data_dir, source) = if let Some(ref data_dir) = cli.data_dir {
            (data_dir.clone(), DataDirSource::Flag)
        } else if let Ok(home) = std::env::var("CTXPIN_HOME") {
            (PathBuf::from(home), DataDirSource::Env)
        } else {
            (root.join(DATA_DIR_NAME), DataDirSource::Root)
        };

        let config = load_config(&data_dir)?.unwrap_or_default();
        debug!(root = %root.display(), data_dir = %data_dir.display(), source = source.as_str(), "resolved context");

        Ok(Self {
            root,
            data_dir,
            source,
            config,
            tree_file: cli.tree.clone(),
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.data_dir.is_dir()
    }

    /// Get the sled database path
    pub fn store_path(&self) -> PathBuf {
        store_path(&self.data_dir)
    }

    /// Open the store, waiting briefly if another process holds it
    pub fn open_store(&self) -> Result<LockedStore, CtxpinError> {
        if !self.is_initialized() {
            return Err(CtxpinError::NotFound(format!(
                "ctxpin data dir not found at {}",
                self.data_dir.display()
            )));
        }
        SledStore::open_locked_blocking(&self.store_path(), STORE_LOCK_TIMEOUT)
    }

    pub fn open_pipeline(&self) -> Result<Pipeline, CtxpinError> {
        Ok(ContextPipeline::new(KvContextRepository::new(self.open_store()?)))
    }

    /// Load the file tree from --tree, or scan the project root
    pub fn load_tree(&self) -> Result<FileTree, CtxpinError> {
        match &self.tree_file {
            Some(path) => FileTree::load_json(path),
            None => FileTree::scan(&self.root, &self.config.scan_options()),
        }
    }

    /// Clipboard from config, or the platform default
    pub fn clipboard(&self) -> Result<CommandClipboard, CtxpinError> {
        match self.config.clipboard_command() {
            Some(command) => CommandClipboard::from_command(command),
            None => Ok(CommandClipboard::detect()),
        }
    }

    /// Absolute location of a project-relative path
    pub fn resolve_file(&self, path: &str) -> PathBuf {
        self.root.join(Path::new(path))
    }
}

/// Normalize a user-supplied path to the tree's `/`-separated relative form
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut trimmed = unified.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    trimmed.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./src/main.rs"), "src/main.rs");
        assert_eq!(normalize_path("src\\lib\\mod.rs"), "src/lib/mod.rs");
        assert_eq!(normalize_path("././docs/"), "docs");
        assert_eq!(normalize_path("README.md"), "README.md");
    }
}
