use libctxpin_core::{
    config::{config_path, save_config, ClipboardConfig, ScanConfig},
    Config, CtxpinError,
};
use serde::Serialize;

use crate::cli::Cli;
use crate::context::CtxpinContext;
use crate::output::output_with;

#[derive(Serialize)]
struct InitOutput {
    data_dir: String,
    config_path: String,
    created: bool,
}

pub fn run(cli: &Cli) -> Result<(), CtxpinError> {
    let ctx = CtxpinContext::resolve(cli)?;
    let path = config_path(&ctx.data_dir);
    let created = !path.exists();

    if created {
        let config = Config {
            clipboard: Some(ClipboardConfig::default()),
            scan: Some(ScanConfig::default()),
        };
        save_config(&ctx.data_dir, &config)?;
    }

    // Create the store up front so later commands only ever open it
    let store = ctx.open_store()?;
    drop(store);

    let output = InitOutput {
        data_dir: ctx.data_dir.display().to_string(),
        config_path: path.display().to_string(),
        created,
    };
    output_with(cli, &output, || {
        if created {
            format!("Initialized ctxpin in {}", output.data_dir)
        } else {
            format!("ctxpin already initialized in {}", output.data_dir)
        }
    });
    Ok(())
}
