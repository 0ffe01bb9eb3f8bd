use libctxpin_core::CtxpinError;
use serde::Serialize;

use crate::cli::Cli;
use crate::context::CtxpinContext;
use crate::output::output_success;

#[derive(Serialize)]
struct StatsOutput {
    path: String,
    data_dir_source: &'static str,
    size_bytes: u64,
    key_count: usize,
    saved_files: usize,
    groups: usize,
    active_groups: usize,
    tree_files: usize,
}

pub fn run(cli: &Cli) -> Result<(), CtxpinError> {
    let ctx = CtxpinContext::resolve(cli)?;
    let pipeline = ctx.open_pipeline()?;
    let stats = pipeline.repository().store().stats(&ctx.store_path())?;

    output_success(cli, StatsOutput {
        path: stats.path,
        data_dir_source: ctx.source.as_str(),
        size_bytes: stats.size_bytes,
        key_count: stats.key_count,
        saved_files: pipeline.saved_context()?.len(),
        groups: pipeline.context_groups()?.len(),
        active_groups: pipeline.active_context_groups()?.len(),
        tree_files: ctx.load_tree()?.file_count(),
    });
    Ok(())
}
