//! `firstline sync` - rename existing notes to match their first line

use crate::cli::{Cli, OutputFormat};
use crate::commands::{markdown_rel, open_vault};
use firstline_core::document::{self, DocumentRef};
use firstline_core::error::{FirstlineError, Result};
use firstline_core::host::{StorageAccessor, ThreadSleeper};
use firstline_core::rename::RenameCoordinator;
use firstline_core::scope::ScopeEvaluator;

pub fn run(cli: &Cli, paths: &[String], all: bool, dry_run: bool) -> Result<()> {
    let (vault, settings) = open_vault(cli)?;

    let docs: Vec<DocumentRef> = if all {
        vault.markdown_files()
    } else {
        if paths.is_empty() {
            return Err(FirstlineError::UsageError(
                "specify note paths or --all".to_string(),
            ));
        }
        paths
            .iter()
            .map(|p| vault.doc(markdown_rel(p)))
            .collect::<Result<Vec<_>>>()?
    };

    let sleeper = ThreadSleeper;
    let coordinator = RenameCoordinator::new(&settings, &sleeper);
    let metadata = vault.clone();
    let mut storage = vault;

    let mut reports = Vec::new();
    let mut failures = 0u32;

    for doc in docs {
        let rel = doc.rel.clone();
        if dry_run {
            let target = preview(&coordinator, &settings, &doc, &storage, &metadata)?;
            reports.push(serde_json::json!({ "path": rel, "would_rename_to": target }));
            continue;
        }
        match coordinator.sync_existing(&doc, &mut storage, &metadata) {
            Ok(outcome) => reports.push(serde_json::json!({ "path": rel, "result": outcome })),
            Err(e) => {
                tracing::warn!(doc = %rel, error = %e, "sync failed");
                failures += 1;
                reports.push(serde_json::json!({
                    "path": rel,
                    "result": { "status": "failed", "message": e.to_string() },
                }));
            }
        }
    }

    print_reports(cli, &reports);

    if failures > 0 {
        return Err(FirstlineError::Other(format!(
            "{} note(s) failed to sync",
            failures
        )));
    }
    Ok(())
}

/// What `sync` would rename this note to, without touching anything
fn preview(
    coordinator: &RenameCoordinator,
    settings: &firstline_core::config::Settings,
    doc: &DocumentRef,
    storage: &dyn StorageAccessor,
    metadata: &firstline_core::vault::Vault,
) -> Result<Option<String>> {
    let content = storage.read(doc)?;
    if !ScopeEvaluator::new(&settings.scope).is_in_scope(doc, Some(&content), metadata) {
        return Ok(None);
    }
    let Some((_, first_line)) = document::first_content_line(&content) else {
        return Ok(None);
    };
    Ok(coordinator
        .target_filename(first_line)
        .filter(|target| target != doc.basename()))
}

fn print_reports(cli: &Cli, reports: &[serde_json::Value]) {
    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "notes": reports }));
        }
        OutputFormat::Human => {
            if cli.quiet {
                return;
            }
            for report in reports {
                println!("{}", describe(report));
            }
        }
    }
}

fn describe(report: &serde_json::Value) -> String {
    let path = report["path"].as_str().unwrap_or("?");
    if let Some(target) = report.get("would_rename_to") {
        return match target.as_str() {
            Some(to) => format!("{}: would rename to {}.md", path, to),
            None => format!("{}: up to date", path),
        };
    }
    let result = &report["result"];
    match result["status"].as_str() {
        Some("renamed") => format!(
            "{}: renamed to {}",
            path,
            result["to"].as_str().unwrap_or("?")
        ),
        Some("up-to-date") => format!("{}: up to date", path),
        Some("skipped-excluded") => format!("{}: out of scope", path),
        Some("skipped-no-title") => format!("{}: no usable title", path),
        Some("failed") => format!(
            "{}: failed ({})",
            path,
            result["message"].as_str().unwrap_or("?")
        ),
        _ => format!("{}: ?", path),
    }
}
