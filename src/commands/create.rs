//! `firstline create` - create a note and insert its filename-derived title

use crate::cli::{Cli, OutputFormat};
use crate::commands::{markdown_rel, open_vault};
use firstline_core::error::Result;
use firstline_core::host::{NullEditors, ThreadSleeper};
use firstline_core::rename::{CreationEvent, RenameCoordinator, RenameOutcome};

pub fn run(cli: &Cli, name: &str, content: Option<&str>) -> Result<()> {
    let (vault, settings) = open_vault(cli)?;

    let rel = markdown_rel(name);
    let initial = content.unwrap_or("");
    let doc = vault.create(&rel, initial)?;

    let sleeper = ThreadSleeper;
    let quiet = cli.quiet;
    let mut coordinator = RenameCoordinator::new(&settings, &sleeper).with_notifier(move |msg| {
        if !quiet {
            eprintln!("note: {}", msg);
        }
    });

    let metadata = vault.clone();
    let mut storage = vault;

    // The content was written just above, so it is the snapshot; no
    // template wait is needed
    let event = CreationEvent::with_snapshot(doc.clone(), initial);
    let outcome = coordinator.handle_created(&event, &mut NullEditors, &mut storage, &metadata);

    match cli.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({ "path": doc.rel, "outcome": outcome })
            );
        }
        OutputFormat::Human => {
            if !cli.quiet {
                println!("{}: {}", doc.rel, describe(outcome));
            }
        }
    }
    Ok(())
}

fn describe(outcome: RenameOutcome) -> &'static str {
    match outcome {
        RenameOutcome::Inserted => "title inserted",
        RenameOutcome::SkippedNonEmpty => "skipped, already has content",
        RenameOutcome::SkippedExcluded => "skipped, out of scope",
        RenameOutcome::Failed => "failed, see log",
    }
}
