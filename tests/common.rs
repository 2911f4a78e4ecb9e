use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::fs;
use std::path::Path;

pub fn firstline() -> Command {
    cargo_bin_cmd!("firstline")
}

/// Write a note file into the vault, creating parent folders
#[allow(dead_code)]
pub fn write_note(vault: &Path, rel: &str, content: &str) {
    let path = vault.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Read a note back
#[allow(dead_code)]
pub fn read_note(vault: &Path, rel: &str) -> String {
    fs::read_to_string(vault.join(rel)).unwrap()
}

/// Write a config that disables the template wait so tests run instantly
#[allow(dead_code)]
pub fn write_fast_config(vault: &Path, extra: &str) {
    let config = format!("[timing]\ntemplate_wait_ms = 0\n\n{}", extra);
    fs::write(vault.join("firstline.toml"), config).unwrap();
}
