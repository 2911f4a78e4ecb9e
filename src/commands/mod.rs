//! Command dispatch logic for firstline

pub mod check;
pub mod create;
pub mod init;
pub mod sync;
pub mod title;
pub mod watch;

use crate::cli::{Cli, Commands};
use firstline_core::config::Settings;
use firstline_core::error::Result;
use firstline_core::vault::Vault;

pub fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Init { force } => init::run(cli, *force),

        Commands::Create { name, content } => create::run(cli, name, content.as_deref()),

        Commands::Sync {
            paths,
            all,
            dry_run,
        } => sync::run(cli, paths, *all, *dry_run),

        Commands::Title { command } => title::run(cli, command),

        Commands::Check { path } => check::run(cli, path),

        Commands::Watch { interval_ms } => watch::run(cli, *interval_ms),
    }
}

/// Open the vault and load its settings (defaults when no config exists)
pub fn open_vault(cli: &Cli) -> Result<(Vault, Settings)> {
    let vault = Vault::open(&cli.vault)?;
    let settings = vault.load_settings()?;
    Ok((vault, settings))
}

/// Normalize a user-supplied note name to a vault-relative markdown path
pub fn markdown_rel(name: &str) -> String {
    if name.ends_with(".md") {
        name.to_string()
    } else {
        format!("{}.md", name)
    }
}
