//! Host collaborator interfaces
//!
//! The engine talks to its host through these seams: an editor accessor for
//! live, undo-visible writes; a storage accessor for authoritative reads and
//! writes; a metadata accessor for persisted properties and tags; and a
//! sleeper so retry delays can be replaced by a zero-delay clock in tests.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::TagMatchLocus;
use crate::document::{self, DocumentRef, Properties};
use crate::error::Result;

/// A zero-based line/character position inside a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub ch: usize,
}

impl Position {
    pub fn new(line: usize, ch: usize) -> Self {
        Position { line, ch }
    }
}

/// A live editor open on a document
pub trait EditorHandle {
    /// Current buffer contents
    fn get_value(&self) -> String;

    /// Replace the span between `from` and `to` with `text`;
    /// `from == to` inserts
    fn replace_range(&mut self, text: &str, from: Position, to: Position);

    /// Move the cursor
    fn set_cursor(&mut self, pos: Position);
}

/// Looks up a live editor for a document, if one is open
pub trait EditorAccessor {
    fn find_open_editor(&mut self, doc: &DocumentRef) -> Option<&mut dyn EditorHandle>;
}

/// Authoritative document storage
pub trait StorageAccessor {
    fn read(&self, doc: &DocumentRef) -> Result<String>;

    /// Read-modify-write through a mutator over the current content
    fn write(&mut self, doc: &DocumentRef, mutate: &dyn Fn(String) -> String) -> Result<()>;

    /// Rename the document, keeping folder and extension
    fn rename(&mut self, doc: &DocumentRef, new_basename: &str) -> Result<DocumentRef>;
}

/// Persisted document metadata
pub trait MetadataAccessor {
    fn properties(&self, doc: &DocumentRef) -> Properties;
    fn tags(&self, doc: &DocumentRef, locus: TagMatchLocus) -> Vec<String>;
}

/// Metadata accessor for hosts without persisted metadata
pub struct NullMetadata;

impl MetadataAccessor for NullMetadata {
    fn properties(&self, _doc: &DocumentRef) -> Properties {
        Properties::new()
    }

    fn tags(&self, _doc: &DocumentRef, _locus: TagMatchLocus) -> Vec<String> {
        Vec::new()
    }
}

/// Editor accessor for hosts without live editors; every document goes
/// through the storage write path
pub struct NullEditors;

impl EditorAccessor for NullEditors {
    fn find_open_editor(&mut self, _doc: &DocumentRef) -> Option<&mut dyn EditorHandle> {
        None
    }
}

/// Injected delay so tests can run with a zero-delay clock
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Real clock
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Zero-delay clock for tests
pub struct NoopSleeper;

impl Sleeper for NoopSleeper {
    fn sleep(&self, _duration: Duration) {}
}

/// In-memory editor buffer, used by tests and by hosts that surface live
/// buffers without a real editor component
#[derive(Debug, Default)]
pub struct MemoryEditor {
    buffer: String,
    cursor: Position,
    /// When set, the next N writes are dropped, simulating an editor that
    /// has not flushed a concurrent edit yet
    pub drop_writes: u32,
}

impl MemoryEditor {
    pub fn new(content: impl Into<String>) -> Self {
        MemoryEditor {
            buffer: content.into(),
            cursor: Position::default(),
            drop_writes: 0,
        }
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    fn offset_of(&self, pos: Position) -> usize {
        let mut offset = 0;
        for (idx, line) in self.buffer.split('\n').enumerate() {
            if idx == pos.line {
                let ch: usize = line
                    .char_indices()
                    .nth(pos.ch)
                    .map(|(i, _)| i)
                    .unwrap_or(line.len());
                return offset + ch;
            }
            offset += line.len() + 1;
        }
        self.buffer.len()
    }
}

impl EditorHandle for MemoryEditor {
    fn get_value(&self) -> String {
        self.buffer.clone()
    }

    fn replace_range(&mut self, text: &str, from: Position, to: Position) {
        if self.drop_writes > 0 {
            self.drop_writes -= 1;
            return;
        }
        let start = self.offset_of(from);
        let end = self.offset_of(to).max(start);
        self.buffer.replace_range(start..end, text);
    }

    fn set_cursor(&mut self, pos: Position) {
        self.cursor = pos;
    }
}

/// Editor accessor over in-memory buffers keyed by document identity
#[derive(Default)]
pub struct EditorRegistry {
    editors: HashMap<String, MemoryEditor>,
}

impl EditorRegistry {
    pub fn new() -> Self {
        EditorRegistry::default()
    }

    pub fn open(&mut self, doc: &DocumentRef, content: impl Into<String>) -> &mut MemoryEditor {
        self.editors
            .entry(doc.key().to_string())
            .or_insert_with(|| MemoryEditor::new(content))
    }

    pub fn get(&self, doc: &DocumentRef) -> Option<&MemoryEditor> {
        self.editors.get(doc.key())
    }
}

impl EditorAccessor for EditorRegistry {
    fn find_open_editor(&mut self, doc: &DocumentRef) -> Option<&mut dyn EditorHandle> {
        self.editors
            .get_mut(doc.key())
            .map(|e| e as &mut dyn EditorHandle)
    }
}

/// In-memory storage keyed by document identity, used in tests
#[derive(Default)]
pub struct MemoryStorage {
    files: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    pub fn insert(&mut self, doc: &DocumentRef, content: impl Into<String>) {
        self.files.insert(doc.key().to_string(), content.into());
    }

    pub fn get(&self, doc: &DocumentRef) -> Option<&String> {
        self.files.get(doc.key())
    }
}

impl StorageAccessor for MemoryStorage {
    fn read(&self, doc: &DocumentRef) -> Result<String> {
        self.files
            .get(doc.key())
            .cloned()
            .ok_or_else(|| crate::error::FirstlineError::DocumentNotFound {
                path: doc.path.clone(),
            })
    }

    fn write(&mut self, doc: &DocumentRef, mutate: &dyn Fn(String) -> String) -> Result<()> {
        let current = self.read(doc)?;
        self.files.insert(doc.key().to_string(), mutate(current));
        Ok(())
    }

    fn rename(&mut self, doc: &DocumentRef, new_basename: &str) -> Result<DocumentRef> {
        let target = doc.with_basename(new_basename);
        if self.files.contains_key(target.key()) {
            return Err(crate::error::FirstlineError::RenameTargetExists {
                path: target.path.clone(),
            });
        }
        let content = self.read(doc)?;
        self.files.remove(doc.key());
        self.files.insert(target.key().to_string(), content);
        Ok(target)
    }
}

impl MetadataAccessor for MemoryStorage {
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

    #[test]
    fn test_memory_editor_replace_range() {
        let mut editor = MemoryEditor::new("---\n---\n\n");
        editor.replace_range("Hello", Position::new(2, 0), Position::new(2, 0));
        assert_eq!(editor.get_value(), "---\n---\nHello\n");
    }

    #[test]
    fn test_memory_editor_replaces_line_span() {
        let mut editor = MemoryEditor::new("a\nbb\nc");
        editor.replace_range("XX", Position::new(1, 0), Position::new(1, 2));
        assert_eq!(editor.get_value(), "a\nXX\nc");
    }

    #[test]
    fn test_memory_editor_drop_writes() {
        let mut editor = MemoryEditor::new("x");
        editor.drop_writes = 1;
        editor.replace_range("y", Position::new(0, 0), Position::new(0, 1));
        assert_eq!(editor.get_value(), "x");
        editor.replace_range("y", Position::new(0, 0), Position::new(0, 1));
        assert_eq!(editor.get_value(), "y");
    }

    #[test]
    fn test_memory_storage_rename() {
        let mut storage = MemoryStorage::new();
        let doc = DocumentRef::new("/v/a.md", "a.md");
        storage.insert(&doc, "content");

        let renamed = storage.rename(&doc, "b").unwrap();
        assert_eq!(renamed.rel, "b.md");
        assert!(storage.get(&doc).is_none());
        assert_eq!(storage.get(&renamed).unwrap(), "content");
    }

    #[test]
    fn test_memory_storage_rename_collision() {
        let mut storage = MemoryStorage::new();
        let a = DocumentRef::new("/v/a.md", "a.md");
        let b = DocumentRef::new("/v/b.md", "b.md");
        storage.insert(&a, "1");
        storage.insert(&b, "2");
        assert!(storage.rename(&a, "b").is_err());
    }
}
