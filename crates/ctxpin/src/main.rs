mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use cli::{Cli, Command};
use libctxpin_core::CtxpinError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let cli = Cli::parse();

    init_logging(&cli);

    if let Err(e) = run_command(&cli) {
        output::output_error(&cli, &e);
        std::process::exit(e.exit_code());
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_env("CTXPIN_LOG")
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_command(cli: &Cli) -> Result<(), CtxpinError> {
    match &cli.command {
        Command::Init => commands::init::run(cli),
        Command::Select { paths } => commands::context::run_select(cli, paths),
        Command::Show { content } => commands::context::run_show(cli, *content),
        Command::Clear => commands::context::run_clear(cli),
        Command::Refresh { path } => commands::context::run_refresh(cli, path),
        Command::Copy { stdout } => commands::copy::run(cli, *stdout),
        Command::Group { cmd } => commands::group::run(cli, cmd.clone()),
        Command::Stats => commands::stats::run(cli),
    }
}
