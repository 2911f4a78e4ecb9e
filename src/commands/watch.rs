//! `firstline watch` - process newly created notes until interrupted

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::cli::{Cli, OutputFormat};
use crate::commands::open_vault;
use firstline_core::error::{FirstlineError, Result};
use firstline_core::host::{NullEditors, Sleeper, ThreadSleeper};
use firstline_core::rename::{CreationEvent, RenameCoordinator};

pub fn run(cli: &Cli, interval_ms: u64) -> Result<()> {
    let (vault, settings) = open_vault(cli)?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst)).map_err(|e| {
            FirstlineError::Other(format!("failed to install signal handler: {}", e))
        })?;
    }

    let mut known: HashSet<String> = vault
        .markdown_files()
        .into_iter()
        .map(|d| d.rel)
        .collect();

    let sleeper = ThreadSleeper;
    let quiet = cli.quiet;
    let mut coordinator = RenameCoordinator::new(&settings, &sleeper).with_notifier(move |msg| {
        if !quiet {
            eprintln!("note: {}", msg);
        }
    });
    let metadata = vault.clone();
    let mut storage = vault.clone();

    if !cli.quiet {
        eprintln!(
            "watching {} ({} notes), press ctrl-c to stop",
            vault.root().display(),
            known.len()
        );
    }

    while running.load(Ordering::SeqCst) {
        for doc in vault.markdown_files() {
            if !known.insert(doc.rel.clone()) {
                continue;
            }
            // No snapshot: the template wait gives whatever created the
            // file time to finish writing before we look at it
            let outcome = coordinator.handle_created(
                &CreationEvent::new(doc.clone()),
                &mut NullEditors,
                &mut storage,
                &metadata,
            );
            tracing::info!(doc = doc.key(), outcome = ?outcome, "processed new note");
            if cli.format == OutputFormat::Human && !cli.quiet {
                println!("{}: {:?}", doc.rel, outcome);
            }
        }
        sleeper.sleep(Duration::from_millis(interval_ms));
    }

    Ok(())
}
