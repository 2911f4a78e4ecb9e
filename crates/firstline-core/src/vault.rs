//! Filesystem vault
//!
//! A vault is a directory of markdown documents with a `firstline.toml` at
//! its root. The vault implements the storage and metadata accessor seams
//! over plain files.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::{Settings, TagMatchLocus, CONFIG_FILE_NAME};
use crate::document::{self, DocumentRef, Properties};
use crate::error::{FirstlineError, Result};
use crate::host::{MetadataAccessor, StorageAccessor};

/// A directory of markdown documents
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    /// Open an existing vault directory
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(FirstlineError::VaultNotFound { path: root });
        }
        Ok(Vault { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the vault's config file
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    /// Load settings, falling back to defaults when no config file exists
    pub fn load_settings(&self) -> Result<Settings> {
        let path = self.config_path();
        if path.is_file() {
            Settings::load(&path)
        } else {
            Ok(Settings::default())
        }
    }

    /// Resolve a path (absolute or vault-relative) to a document reference
    pub fn doc(&self, path: impl AsRef<Path>) -> Result<DocumentRef> {
        let path = path.as_ref();
        let abs = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let rel = document::rel_path(&self.root, &abs).ok_or_else(|| {
            FirstlineError::OutsideVault {
                path: abs.clone(),
            }
        })?;
        if abs.extension().and_then(|e| e.to_str()) != Some("md") {
            return Err(FirstlineError::NotMarkdown { path: abs });
        }
        Ok(DocumentRef::new(abs, rel))
    }

    /// Enumerate all markdown documents, skipping hidden directories
    pub fn markdown_files(&self) -> Vec<DocumentRef> {
        let mut docs = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e
                        .file_name()
                        .to_str()
                        .map(|n| n.starts_with('.'))
                        .unwrap_or(false)
            });
        for entry in walker.flatten() {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            if let Some(rel) = document::rel_path(&self.root, entry.path()) {
                docs.push(DocumentRef::new(entry.path().to_path_buf(), rel));
            }
        }
        docs.sort_by(|a, b| a.rel.cmp(&b.rel));
        docs
    }

    /// Create a new markdown document with the given content
    pub fn create(&self, rel: &str, content: &str) -> Result<DocumentRef> {
        let doc = self.doc(rel)?;
        if let Some(parent) = doc.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&doc.path, content)?;
        Ok(doc)
    }
}

impl StorageAccessor for Vault {
    fn read(&self, doc: &DocumentRef) -> Result<String> {
        if !doc.path.is_file() {
            return Err(FirstlineError::DocumentNotFound {
                path: doc.path.clone(),
            });
        }
        Ok(fs::read_to_string(&doc.path)?)
    }

    fn write(&mut self, doc: &DocumentRef, mutate: &dyn Fn(String) -> String) -> Result<()> {
        let current = self.read(doc)?;
        let next = mutate(current);
        fs::write(&doc.path, next)?;
        Ok(())
    }

    fn rename(&mut self, doc: &DocumentRef, new_basename: &str) -> Result<DocumentRef> {
        let target = doc.with_basename(new_basename);
        if target.path.exists() {
            return Err(FirstlineError::RenameTargetExists {
                path: target.path.clone(),
            });
        }
        fs::rename(&doc.path, &target.path)?;
        Ok(target)
    }
}

impl MetadataAccessor for Vault {
    fn properties(&self, doc: &DocumentRef) -> Properties {
        self.read(doc)
            .map(|content| document::parse_properties(&content))
            .unwrap_or_default()
    }

    fn tags(&self, doc: &DocumentRef, locus: TagMatchLocus) -> Vec<String> {
        self.read(doc)
            .map(|content| document::collect_tags(&content, locus))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_missing_vault() {
        let err = Vault::open("/does/not/exist").unwrap_err();
        assert_eq!(err.exit_code() as i32, 3);
    }

    #[test]
    fn test_markdown_enumeration_skips_hidden() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("notes")).unwrap();
        fs::create_dir_all(dir.path().join(".trash")).unwrap();
        fs::write(dir.path().join("a.md"), "a").unwrap();
        fs::write(dir.path().join("notes/b.md"), "b").unwrap();
        fs::write(dir.path().join("notes/c.txt"), "c").unwrap();
        fs::write(dir.path().join(".trash/d.md"), "d").unwrap();

        let vault = Vault::open(dir.path()).unwrap();
        let rels: Vec<String> = vault.markdown_files().into_iter().map(|d| d.rel).collect();
        assert_eq!(rels, vec!["a.md", "notes/b.md"]);
    }

    #[test]
    fn test_doc_rejects_non_markdown_and_outside_paths() {
        let dir = tempdir().unwrap();
        let vault = Vault::open(dir.path()).unwrap();
        assert!(vault.doc("note.txt").is_err());
        assert!(vault.doc("/somewhere/else/note.md").is_err());
    }

    #[test]
    fn test_write_and_rename() {
        let dir = tempdir().unwrap();
        let mut vault = Vault::open(dir.path()).unwrap();
        let doc = vault.create("a.md", "old").unwrap();

        vault.write(&doc, &|c| c.replace("old", "new")).unwrap();
        assert_eq!(vault.read(&doc).unwrap(), "new");

        let renamed = vault.rename(&doc, "b").unwrap();
        assert_eq!(renamed.rel, "b.md");
        assert_eq!(vault.read(&renamed).unwrap(), "new");
        assert!(vault.read(&doc).is_err());
    }

    #[test]
    fn test_load_settings_defaults_without_config() {
        let dir = tempdir().unwrap();
        let vault = Vault::open(dir.path()).unwrap();
        let settings = vault.load_settings().unwrap();
        assert!(settings.characters.enabled);
    }
}
