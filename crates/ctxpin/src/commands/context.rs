use comfy_table::{presets::UTF8_FULL, Table};
use libctxpin_core::{render_context, CtxpinError, SavedContextEntry};
use serde::Serialize;

use crate::cli::Cli;
use crate::context::{normalize_path, CtxpinContext};
use crate::output::output_with;

#[derive(Serialize)]
pub struct EntryJson {
    pub path: String,
    pub bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl EntryJson {
    pub fn from_entry(entry: &SavedContextEntry, with_content: bool) -> Self {
        Self {
            path: entry.path.clone(),
            bytes: entry.content.len(),
            content: with_content.then(|| entry.content.clone()),
        }
    }
}

/// Render saved entries as a path/size table
pub fn entries_table(entries: &[SavedContextEntry]) -> String {
    if entries.is_empty() {
        return "Saved context is empty".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Path", "Bytes"]);
    for entry in entries {
        table.add_row(vec![entry.path.clone(), entry.content.len().to_string()]);
    }
    table.to_string()
}

#[derive(Serialize)]
struct SelectOutput {
    requested: usize,
    selected: usize,
    dropped: Vec<String>,
    files: Vec<EntryJson>,
}

pub fn run_select(cli: &Cli, paths: &[String]) -> Result<(), CtxpinError> {
    let ctx = CtxpinContext::resolve(cli)?;
    let pipeline = ctx.open_pipeline()?;
    let tree = ctx.load_tree()?;

    let requested: Vec<String> = paths.iter().map(|p| normalize_path(p)).collect();
    let entries = pipeline.update_saved_context(&tree, &requested)?;

    let mut dropped: Vec<String> = requested
        .iter()
        .filter(|p| !entries.iter().any(|e| &e.path == *p))
        .cloned()
        .collect();
    dropped.sort();
    dropped.dedup();

    let output = SelectOutput {
        requested: requested.len(),
        selected: entries.len(),
        dropped,
        files: entries.iter().map(|e| EntryJson::from_entry(e, false)).collect(),
    };
    output_with(cli, &output, || {
        let mut msg = format!("Saved {} file(s)", output.selected);
        if !output.dropped.is_empty() {
            msg.push_str(&format!(
                "\nSkipped (not a file in the tree): {}",
                output.dropped.join(", ")
            ));
        }
        msg
    });
    Ok(())
}

#[derive(Serialize)]
struct ShowOutput {
    count: usize,
    total_bytes: usize,
    files: Vec<EntryJson>,
}

pub fn run_show(cli: &Cli, with_content: bool) -> Result<(), CtxpinError> {
    let ctx = CtxpinContext::resolve(cli)?;
    let pipeline = ctx.open_pipeline()?;
    let entries = pipeline.saved_context()?;

    let output = ShowOutput {
        count: entries.len(),
        total_bytes: entries.iter().map(|e| e.content.len()).sum(),
        files: entries.iter().map(|e| EntryJson::from_entry(e, with_content)).collect(),
    };
    output_with(cli, &output, || {
        if with_content && !entries.is_empty() {
            render_context(&entries)
        } else {
            entries_table(&entries)
        }
    });
    Ok(())
}

pub fn run_clear(cli: &Cli) -> Result<(), CtxpinError> {
    let ctx = CtxpinContext::resolve(cli)?;
    let pipeline = ctx.open_pipeline()?;
    let previous = pipeline.saved_context()?.len();
    pipeline.set_saved_context(&[])?;

    output_with(cli, serde_json::json!({ "cleared": previous }), || {
        format!("Cleared {} file(s) from the saved context", previous)
    });
    Ok(())
}

pub fn run_refresh(cli: &Cli, path: &str) -> Result<(), CtxpinError> {
    let ctx = CtxpinContext::resolve(cli)?;
    let pipeline = ctx.open_pipeline()?;
    let path = normalize_path(path);

    if !pipeline.saved_context()?.iter().any(|e| e.path == path) {
        return Err(CtxpinError::NotFound(format!(
            "'{}' is not in the saved context",
            path
        )));
    }

    let content = std::fs::read_to_string(ctx.resolve_file(&path))?;
    let entries = pipeline.refresh_file_content(&path, &content)?;

    let output = serde_json::json!({
        "path": path,
        "bytes": content.len(),
        "count": entries.len(),
    });
    output_with(cli, &output, || {
        format!("Refreshed {} ({} bytes)", path, content.len())
    });
    Ok(())
}
