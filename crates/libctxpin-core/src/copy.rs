//! Copying saved context to the system clipboard
//!
//! The aggregated text layout is fixed: for each entry
//! `文件路径: {path}\n内容:\n{content}\n`, entries joined by a newline.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Mutex;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::CtxpinError;
use crate::types::context::SavedContextEntry;

/// Render entries into the clipboard text block
pub fn render_context(entries: &[SavedContextEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("文件路径: {}\n内容:\n{}\n", e.path, e.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Destination for copied text
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), CtxpinError>;
}

/// Clipboard backed by an external program reading from stdin
/// (`pbcopy`, `wl-copy`, `xclip`, ...)
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a command line such as `["xclip", "-selection", "clipboard"]`
    pub fn from_command(command: &[String]) -> Result<Self, CtxpinError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| CtxpinError::InvalidArgs("clipboard command is empty".to_string()))?;
        Ok(Self::new(program.clone(), args.to_vec()))
    }

    /// Platform default clipboard program
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("pbcopy", Vec::new())
        } else if cfg!(target_os = "windows") {
            Self::new("clip", Vec::new())
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            Self::new("wl-copy", Vec::new())
        } else {
            Self::new(
                "xclip",
                vec!["-selection".to_string(), "clipboard".to_string()],
            )
        }
    }
}

impl Clipboard for CommandClipboard {
    fn write_text(&self, text: &str) -> Result<(), CtxpinError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CtxpinError::Clipboard(format!("failed to run '{}': {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| CtxpinError::Clipboard(format!("failed to write to '{}': {}", self.program, e)))?;
        }

        // xclip and wl-copy leave a child serving the selection; only the
        // direct child's exit status is awaited
        let status = child.wait()?;
        if !status.success() {
            return Err(CtxpinError::Clipboard(format!(
                "'{}' exited with {}",
                self.program, status
            )));
        }
        Ok(())
    }
}

/// In-memory clipboard
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), CtxpinError> {
        *self
            .contents
            .lock()
            .map_err(|_| CtxpinError::Internal("clipboard lock poisoned".to_string()))? = Some(text.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyLevel {
    Success,
    Warning,
    Error,
}

/// A user-visible message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotifyLevel,
    pub message: String,
}

impl Notification {
    pub fn new(level: NotifyLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Sink for user-visible notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Emits notifications as log events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotifyLevel::Success => info!("{}", notification.message),
            NotifyLevel::Warning => warn!("{}", notification.message),
            NotifyLevel::Error => error!("{}", notification.message),
        }
    }
}

/// Keeps every notification for later display
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification);
    }
}

/// Result of a copy attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CopyOutcome {
    Copied { files: usize, bytes: usize },
    Empty,
    Failed { reason: String },
}

/// Render `entries` and write them to `clipboard`.
///
/// An empty list produces a warning and never touches the clipboard.
/// Clipboard failures are logged and reported through `notifier`; nothing
/// is returned as an error.
pub fn copy_context(
    entries: &[SavedContextEntry],
    clipboard: &dyn Clipboard,
    notifier: &dyn Notifier,
) -> CopyOutcome {
    if entries.is_empty() {
        notifier.notify(Notification::new(
            NotifyLevel::Warning,
            "Nothing to copy: saved context is empty",
        ));
        return CopyOutcome::Empty;
    }

    let text = render_context(entries);
    match clipboard.write_text(&text) {
        Ok(()) => {
            notifier.notify(Notification::new(
                NotifyLevel::Success,
                format!("Copied {} file(s) to the clipboard", entries.len()),
            ));
            CopyOutcome::Copied {
                files: entries.len(),
                bytes: text.len(),
            }
        }
        Err(e) => {
            error!(error = %e, "clipboard write failed");
            notifier.notify(Notification::new(
                NotifyLevel::Error,
                format!("Failed to copy context: {}", e),
            ));
            CopyOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
