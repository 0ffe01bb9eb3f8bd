use comfy_table::{presets::UTF8_FULL, Table};
use libctxpin_core::{ContextRepository, CtxpinError, SavedContextEntry};
use serde::Serialize;

use crate::cli::{Cli, GroupCommand};
use crate::commands::context::{entries_table, EntryJson};
use crate::context::{normalize_path, CtxpinContext};
use crate::output::output_with;

pub fn run(cli: &Cli, cmd: GroupCommand) -> Result<(), CtxpinError> {
    match cmd {
        GroupCommand::List => run_list(cli),
        GroupCommand::Show { name } => run_show(cli, &name),
        GroupCommand::Save { name, paths } => run_save(cli, &name, &paths),
        GroupCommand::Delete { name } => run_delete(cli, &name),
        GroupCommand::Activate { name } => run_activate(cli, &name),
        GroupCommand::Deactivate { name } => run_deactivate(cli, &name),
        GroupCommand::Apply => run_apply(cli),
    }
}

#[derive(Serialize)]
struct GroupJson {
    name: String,
    files: usize,
    active: bool,
}

fn run_list(cli: &Cli) -> Result<(), CtxpinError> {
    let ctx = CtxpinContext::resolve(cli)?;
    let pipeline = ctx.open_pipeline()?;
    let active = pipeline.active_context_groups()?;

    let mut groups = Vec::new();
    for group in pipeline.context_groups()? {
        let files = pipeline.repository().group_files(&group.name)?.unwrap_or_default();
        groups.push(GroupJson {
            active: active.contains(&group.name),
            files: files.len(),
            name: group.name,
        });
    }

    let output = serde_json::json!({ "groups": &groups, "count": groups.len() });
    output_with(cli, &output, || {
        if groups.is_empty() {
            return "No context groups".to_string();
        }
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(vec!["Group", "Files", "Active"]);
        for group in &groups {
            table.add_row(vec![
                group.name.clone(),
                group.files.to_string(),
                if group.active { "yes" } else { "no" }.to_string(),
            ]);
        }
        table.to_string()
    });
    Ok(())
}

fn run_show(cli: &Cli, name: &str) -> Result<(), CtxpinError> {
    let ctx = CtxpinContext::resolve(cli)?;
    let pipeline = ctx.open_pipeline()?;

    let files = pipeline
        .repository()
        .group_files(name)?
        .ok_or_else(|| CtxpinError::group_not_found(name))?;
    let active = pipeline.active_context_groups()?.contains(name);

    let output = serde_json::json!({
        "name": name,
        "active": active,
        "files": &files,
    });
    output_with(cli, &output, || {
        let state = if active { "active" } else { "inactive" };
        let mut lines = vec![format!("{} ({}, {} file(s))", name, state, files.len())];
        lines.extend(files.iter().map(|f| format!("  {}", f)));
        lines.join("\n")
    });
    Ok(())
}

fn run_save(cli: &Cli, name: &str, paths: &[String]) -> Result<(), CtxpinError> {
    if name.trim().is_empty() {
        return Err(CtxpinError::InvalidArgs("group name must not be empty".to_string()));
    }

    let ctx = CtxpinContext::resolve(cli)?;
    let pipeline = ctx.open_pipeline()?;

    let mut files: Vec<String> = Vec::new();
    for path in paths.iter().map(|p| normalize_path(p)) {
        if !files.contains(&path) {
            files.push(path);
        }
    }
    pipeline.save_context_group(name, &files)?;

    // An active group feeds the saved context, so recompute it
    let recomputed = if pipeline.active_context_groups()?.contains(name) {
        Some(pipeline.apply_active_groups(&ctx.load_tree()?)?)
    } else {
        None
    };

    let output = serde_json::json!({
        "name": name,
        "files": &files,
        "saved_context_files": recomputed.as_ref().map(|e| e.len()),
    });
    output_with(cli, &output, || {
        format!("Saved group '{}' with {} file(s)", name, files.len())
    });
    Ok(())
}

fn run_delete(cli: &Cli, name: &str) -> Result<(), CtxpinError> {
    let ctx = CtxpinContext::resolve(cli)?;
    let pipeline = ctx.open_pipeline()?;

    if !pipeline.context_groups()?.iter().any(|g| g.name == name) {
        return Err(CtxpinError::group_not_found(name));
    }

    let mut active = pipeline.active_context_groups()?;
    pipeline.delete_context_group(name)?;
    let recomputed = if active.remove(name) {
        pipeline.set_active_context_groups(&active)?;
        Some(pipeline.apply_active_groups(&ctx.load_tree()?)?)
    } else {
        None
    };

    let output = serde_json::json!({
        "name": name,
        "deleted": true,
        "saved_context_files": recomputed.as_ref().map(|e| e.len()),
    });
    output_with(cli, &output, || format!("Deleted group '{}'", name));
    Ok(())
}

#[derive(Serialize)]
struct RecomputeOutput {
    active_groups: Vec<String>,
    count: usize,
    files: Vec<EntryJson>,
}

fn recompute_output(
    cli: &Cli,
    active_groups: Vec<String>,
    entries: &[SavedContextEntry],
    headline: String,
) {
    let output = RecomputeOutput {
        active_groups,
        count: entries.len(),
        files: entries.iter().map(|e| EntryJson::from_entry(e, false)).collect(),
    };
    output_with(cli, &output, || format!("{}\n{}", headline, entries_table(entries)));
}

fn run_activate(cli: &Cli, name: &str) -> Result<(), CtxpinError> {
    let ctx = CtxpinContext::resolve(cli)?;
    let pipeline = ctx.open_pipeline()?;
    let entries = pipeline.activate_group(name, &ctx.load_tree()?)?;
    let active = pipeline.active_context_groups()?.into_iter().collect();

    recompute_output(cli, active, &entries, format!("Activated group '{}'", name));
    Ok(())
}

fn run_deactivate(cli: &Cli, name: &str) -> Result<(), CtxpinError> {
    let ctx = CtxpinContext::resolve(cli)?;
    let pipeline = ctx.open_pipeline()?;
    let entries = pipeline.deactivate_group(name, &ctx.load_tree()?)?;
    let active = pipeline.active_context_groups()?.into_iter().collect();

    recompute_output(cli, active, &entries, format!("Deactivated group '{}'", name));
    Ok(())
}

fn run_apply(cli: &Cli) -> Result<(), CtxpinError> {
    let ctx = CtxpinContext::resolve(cli)?;
    let pipeline = ctx.open_pipeline()?;
    let entries = pipeline.apply_active_groups(&ctx.load_tree()?)?;
    let active: Vec<String> = pipeline.active_context_groups()?.into_iter().collect();

    let headline = format!("Applied {} active group(s)", active.len());
    recompute_output(cli, active, &entries, headline);
    Ok(())
}
