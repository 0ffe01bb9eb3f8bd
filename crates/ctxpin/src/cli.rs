use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ctxpin", about = "Pin project files as reusable AI context", version)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress human-readable output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Project root (defaults to the current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Override the data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Read the file tree from a JSON file instead of scanning the root
    #[arg(long, global = true)]
    pub tree: Option<PathBuf>,

    /// Log level when CTXPIN_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize ctxpin in the project root
    Init,

    /// Replace the saved context with the given files
    Select {
        /// Paths relative to the project root
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Show the saved context
    Show {
        /// Include file contents
        #[arg(long)]
        content: bool,
    },

    /// Empty the saved context
    Clear,

    /// Re-read one saved file from disk and update its captured content
    Refresh {
        path: String,
    },

    /// Copy the saved context to the clipboard
    Copy {
        /// Print the rendered text instead of using the clipboard
        #[arg(long)]
        stdout: bool,
    },

    /// Context group management
    Group {
        #[command(subcommand)]
        cmd: GroupCommand,
    },

    /// Show store statistics
    Stats,
}

#[derive(Clone, Subcommand)]
pub enum GroupCommand {
    /// List groups and whether they are active
    List,

    /// Show the stored file list of a group
    Show {
        name: String,
    },

    /// Create or replace a group
    Save {
        name: String,

        /// Paths relative to the project root
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Delete a group
    Delete {
        name: String,
    },

    /// Switch a group on and recompute the saved context
    Activate {
        name: String,
    },

    /// Switch a group off and recompute the saved context
    Deactivate {
        name: String,
    },

    /// Recompute the saved context from the active groups
    Apply,
}
