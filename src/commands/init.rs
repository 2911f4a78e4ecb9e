//! `firstline init` - write a default config into the vault

use crate::cli::{Cli, OutputFormat};
use firstline_core::config::Settings;
use firstline_core::error::{FirstlineError, Result};
use firstline_core::vault::Vault;

pub fn run(cli: &Cli, force: bool) -> Result<()> {
    let vault = Vault::open(&cli.vault)?;
    let path = vault.config_path();

    if path.exists() && !force {
        return Err(FirstlineError::ConfigAlreadyExists { path });
    }

    Settings::default().save(&path)?;

    match cli.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({ "created": path.display().to_string() })
            );
        }
        OutputFormat::Human => {
            if !cli.quiet {
                println!("created {}", path.display());
            }
        }
    }
    Ok(())
}
