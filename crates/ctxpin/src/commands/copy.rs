use libctxpin_core::{
    copy::{MemoryClipboard, RecordingNotifier}, copy_context, CopyOutcome, CtxpinError, Notification,
    NotifyLevel,
};
use serde::Serialize;

use crate::cli::Cli;
use crate::context::CtxpinContext;
use crate::output::{output_success, print_human};

#[derive(Serialize)]
struct CopyOutput {
    outcome: CopyOutcome,
    notifications: Vec<Notification>,
}

pub fn run(cli: &Cli, to_stdout: bool) -> Result<(), CtxpinError> {
    let ctx = CtxpinContext::resolve(cli)?;
    let pipeline = ctx.open_pipeline()?;
    let entries = pipeline.saved_context()?;
    let notifier = RecordingNotifier::new();

    if to_stdout {
        let buffer = MemoryClipboard::new();
        let outcome = copy_context(&entries, &buffer, &notifier);
        let text = buffer.contents().unwrap_or_default();
        let notifications = notifier.notifications();

        if cli.json {
            output_success(cli, serde_json::json!({
                "files": entries.len(),
                "text": text,
                "outcome": outcome,
                "notifications": notifications,
            }));
        } else {
            // Success notes would mix into the piped text
            report(cli, notifications.iter().filter(|n| n.level != NotifyLevel::Success));
            if !cli.quiet {
                print!("{}", text);
            }
        }
        return Ok(());
    }

    let clipboard = ctx.clipboard()?;
    let outcome = copy_context(&entries, &clipboard, &notifier);

    if let CopyOutcome::Failed { reason } = &outcome {
        return Err(CtxpinError::Clipboard(reason.clone()));
    }

    let notifications = notifier.notifications();
    if cli.json {
        output_success(cli, CopyOutput { outcome, notifications });
    } else {
        report(cli, notifications.iter());
    }
    Ok(())
}

fn report<'a>(cli: &Cli, notifications: impl Iterator<Item = &'a Notification>) {
    for note in notifications {
        match note.level {
            NotifyLevel::Warning if !cli.quiet => eprintln!("warning: {}", note.message),
            NotifyLevel::Warning => {}
            NotifyLevel::Error => eprintln!("error: {}", note.message),
            NotifyLevel::Success => print_human(cli, &note.message),
        }
    }
}
