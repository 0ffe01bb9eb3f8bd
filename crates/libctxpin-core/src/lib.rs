//! Core library for ctxpin
//!
//! Keeps the set of files pinned as "saved context" for an AI session, and
//! named context groups whose union (over the active groups) becomes the
//! saved context. State lives in a JSON key-value store; sled is the durable
//! backend.

pub mod config;
pub mod copy;
pub mod error;
pub mod pipeline;
pub mod repository;
pub mod store;
pub mod types;

pub use config::{load_config, save_config, Config};
pub use copy::{copy_context, render_context, Clipboard, CommandClipboard, CopyOutcome, Notification, Notifier, NotifyLevel};
pub use error::CtxpinError;
pub use pipeline::ContextPipeline;
pub use repository::{ContextRepository, KvContextRepository};
pub use store::{KvStore, LockedStore, MemoryStore, SledStore};
pub use types::{update_file_content_in_context, ActiveGroupSet, ContextGroup, FileNode, FileTree, NodeKind, SavedContextEntry, ScanOptions};
