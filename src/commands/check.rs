//! `firstline check` - explain the scope decision for a note

use crate::cli::{Cli, OutputFormat};
use crate::commands::{markdown_rel, open_vault};
use firstline_core::error::Result;
use firstline_core::scope::{ScopeDecision, ScopeEvaluator};

pub fn run(cli: &Cli, path: &str) -> Result<()> {
    let (vault, settings) = open_vault(cli)?;
    let doc = vault.doc(markdown_rel(path))?;

    let decision = ScopeEvaluator::new(&settings.scope).evaluate(&doc, None, &vault);

    match cli.format {
        OutputFormat::Json => {
            let reason = match decision {
                ScopeDecision::InScope => None,
                ScopeDecision::Excluded(reason) => Some(reason),
            };
            println!(
                "{}",
                serde_json::json!({
                    "path": doc.rel,
                    "in_scope": decision.is_in_scope(),
                    "reason": reason,
                })
            );
        }
        OutputFormat::Human => match decision {
            ScopeDecision::InScope => println!("{}: in scope", doc.rel),
            ScopeDecision::Excluded(reason) => {
                println!("{}: excluded ({:?})", doc.rel, reason);
            }
        },
    }
    Ok(())
}
