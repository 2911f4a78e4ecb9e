//! Rename coordination
//!
//! Per creation event: scope check, content inspection past any frontmatter
//! block, title computation from the filename, then a verified write through
//! a live editor when one is open, falling back to the authoritative storage
//! write when verification keeps failing or no editor exists. The forward
//! direction derives a filesystem-safe filename from the first content line
//! of an existing document and renames it.

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;

use crate::alias;
use crate::codec::CharacterCodec;
use crate::config::Settings;
use crate::document::{self, DocumentRef};
use crate::error::Result;
use crate::host::{EditorAccessor, EditorHandle, MetadataAccessor, Position, Sleeper, StorageAccessor};
use crate::sanitize;
use crate::scope::ScopeEvaluator;

/// Outcome of a creation event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenameOutcome {
    /// The title was written into the document
    Inserted,
    /// The document already had content past the frontmatter
    SkippedNonEmpty,
    /// The document is out of scope
    SkippedExcluded,
    /// A storage error was caught and logged; never propagated
    Failed,
}

/// Outcome of syncing an existing document's filename to its first line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "status")]
pub enum SyncOutcome {
    Renamed { from: String, to: String },
    UpToDate,
    SkippedExcluded,
    SkippedNoTitle,
}

/// A document-created event with an optional pre-captured content snapshot
#[derive(Debug, Clone)]
pub struct CreationEvent {
    pub doc: DocumentRef,
    pub snapshot: Option<String>,
}

impl CreationEvent {
    pub fn new(doc: DocumentRef) -> Self {
        CreationEvent {
            doc,
            snapshot: None,
        }
    }

    pub fn with_snapshot(doc: DocumentRef, snapshot: impl Into<String>) -> Self {
        CreationEvent {
            doc,
            snapshot: Some(snapshot.into()),
        }
    }
}

/// Where and how the title goes into the content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertionPlan {
    /// Replace the (blank or placeholder) line at `line` with `text`
    ReplaceLine { line: usize, text: String },
    /// Append `text` as a new line at index `line`, past the last line
    Append { line: usize, text: String },
    /// Non-blank content exists; never overwrite
    SkipNonEmpty,
}

/// Heading marker of a line that is only a marker, e.g. `## `
fn placeholder_marker(line: &str) -> Option<&str> {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| Regex::new(r"^(#{1,6})\s*$").expect("hardcoded pattern"));
    re.captures(line.trim_end())
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

/// Decide where the title goes.
///
/// The first non-blank line past any frontmatter block decides: an empty
/// heading placeholder left by a template becomes the insertion point and
/// keeps its own marker; any other text means the document already has
/// content. With nothing there, the title replaces the first blank line
/// after the block (or is appended when the content ends at the block).
pub fn plan_insertion(content: &str, title: &str, heading_marker: Option<&str>) -> InsertionPlan {
    let lines: Vec<&str> = content.split('\n').collect();
    let start = document::frontmatter_bounds(content)
        .map(|b| b.end_line + 1)
        .unwrap_or(0);

    for (idx, line) in lines.iter().enumerate().skip(start) {
        if line.trim().is_empty() {
            continue;
        }
        return match placeholder_marker(line) {
            Some(marker) => InsertionPlan::ReplaceLine {
                line: idx,
                text: format!("{} {}", marker, title),
            },
            None => InsertionPlan::SkipNonEmpty,
        };
    }

    let text = match heading_marker {
        Some(marker) if !marker.is_empty() => format!("{} {}", marker, title),
        _ => title.to_string(),
    };
    if start < lines.len() {
        InsertionPlan::ReplaceLine { line: start, text }
    } else {
        InsertionPlan::Append { line: start, text }
    }
}

/// Apply a plan to content, returning the new content
pub fn apply_insertion(content: &str, plan: &InsertionPlan) -> String {
    match plan {
        InsertionPlan::SkipNonEmpty => content.to_string(),
        InsertionPlan::ReplaceLine { line, text } => {
            let mut lines: Vec<&str> = content.split('\n').collect();
            if *line < lines.len() {
                lines[*line] = text;
            }
            lines.join("\n")
        }
        InsertionPlan::Append { text, .. } => {
            if content.is_empty() {
                text.clone()
            } else {
                format!("{}\n{}", content, text)
            }
        }
    }
}

/// Orchestrates title insertion for creation events and filename derivation
/// for existing documents
pub struct RenameCoordinator<'a> {
    settings: &'a Settings,
    sleeper: &'a dyn Sleeper,
    /// In-flight editor write attempts, keyed by document identity
    retries: HashMap<String, u32>,
    notifier: Option<Box<dyn Fn(&str) + 'a>>,
}

enum EditorWrite {
    Done(RenameOutcome),
    FallBack,
}

impl<'a> RenameCoordinator<'a> {
    pub fn new(settings: &'a Settings, sleeper: &'a dyn Sleeper) -> Self {
        RenameCoordinator {
            settings,
            sleeper,
            retries: HashMap::new(),
            notifier: None,
        }
    }

    /// Install a suppressible notification callback for merge fallbacks
    pub fn with_notifier(mut self, notifier: impl Fn(&str) + 'a) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    /// Attempts recorded for a document still in flight
    pub fn attempts(&self, doc: &DocumentRef) -> u32 {
        self.retries.get(doc.key()).copied().unwrap_or(0)
    }

    /// Handle a document-created event.
    ///
    /// Never returns an error: storage failures are caught, logged and
    /// reported as [`RenameOutcome::Failed`] so one bad event cannot take
    /// down the event pipeline.
    pub fn handle_created(
        &mut self,
        event: &CreationEvent,
        editors: &mut dyn EditorAccessor,
        storage: &mut dyn StorageAccessor,
        metadata: &dyn MetadataAccessor,
    ) -> RenameOutcome {
        let doc = &event.doc;

        // Give a template plugin time to populate the note, unless the
        // caller already captured the content it wants evaluated
        if event.snapshot.is_none() && self.settings.timing.template_wait_ms > 0 {
            self.sleeper
                .sleep(Duration::from_millis(self.settings.timing.template_wait_ms));
        }

        let scope = ScopeEvaluator::new(&self.settings.scope);
        if !scope.is_in_scope(doc, event.snapshot.as_deref(), metadata) {
            tracing::debug!(doc = doc.key(), "document out of scope");
            self.retries.remove(doc.key());
            return RenameOutcome::SkippedExcluded;
        }

        let codec = CharacterCodec::new(&self.settings.characters);
        let title = codec.decode(doc.basename());

        let outcome = match self.insert_title(doc, &title, editors, storage) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(doc = doc.key(), error = %e, "title insertion failed");
                RenameOutcome::Failed
            }
        };
        self.retries.remove(doc.key());

        if outcome == RenameOutcome::Inserted {
            if let Err(e) = alias::sync(doc, doc.basename(), &title, &self.settings.alias, storage)
            {
                tracing::warn!(doc = doc.key(), error = %e, "alias sync failed");
            }
        }
        outcome
    }

    fn insert_title(
        &mut self,
        doc: &DocumentRef,
        title: &str,
        editors: &mut dyn EditorAccessor,
        storage: &mut dyn StorageAccessor,
    ) -> Result<RenameOutcome> {
        if let Some(editor) = editors.find_open_editor(doc) {
            match self.insert_via_editor(doc, title, editor) {
                EditorWrite::Done(outcome) => return Ok(outcome),
                EditorWrite::FallBack => {
                    tracing::debug!(
                        doc = doc.key(),
                        "editor write not observed, using storage write"
                    );
                    if let Some(notifier) = &self.notifier {
                        notifier(&format!(
                            "{}: concurrent edit detected, title written directly",
                            doc.key()
                        ));
                    }
                }
            }
        }
        self.insert_via_storage(doc, title, storage)
    }

    /// Write through the live editor so the change is instant and lands on
    /// the undo stack. After each attempt the buffer is re-read and the
    /// target line compared; a mismatch means the editor had not flushed a
    /// concurrent edit, so the attempt is repeated against the fresh value.
    fn insert_via_editor(
        &mut self,
        doc: &DocumentRef,
        title: &str,
        editor: &mut dyn EditorHandle,
    ) -> EditorWrite {
        let retry_count = self.settings.timing.retry_count.max(1);
        let delay = Duration::from_millis(self.settings.timing.retry_delay_ms);
        let heading = self.settings.insert.heading_marker.as_deref();

        loop {
            let value = editor.get_value();
            let (line, text) = match plan_insertion(&value, title, heading) {
                InsertionPlan::SkipNonEmpty => {
                    return EditorWrite::Done(RenameOutcome::SkippedNonEmpty)
                }
                InsertionPlan::ReplaceLine { line, text } => (line, text),
                InsertionPlan::Append { line, text } => (line, text),
            };

            write_line(editor, &value, line, &text);

            let after = editor.get_value();
            let applied = after
                .split('\n')
                .nth(line)
                .map(|l| l.trim() == text.trim())
                .unwrap_or(false);
            if applied {
                self.place_cursor(editor, line, &text);
                return EditorWrite::Done(RenameOutcome::Inserted);
            }

            let attempts = self.retries.entry(doc.key().to_string()).or_insert(0);
            *attempts += 1;
            if *attempts >= retry_count {
                return EditorWrite::FallBack;
            }
            self.sleeper.sleep(delay);
        }
    }

    fn insert_via_storage(
        &self,
        doc: &DocumentRef,
        title: &str,
        storage: &mut dyn StorageAccessor,
    ) -> Result<RenameOutcome> {
        let heading = self.settings.insert.heading_marker.as_deref();
        let outcome = Cell::new(RenameOutcome::SkippedNonEmpty);
        storage.write(doc, &|content| match plan_insertion(&content, title, heading) {
            InsertionPlan::SkipNonEmpty => content,
            plan => {
                outcome.set(RenameOutcome::Inserted);
                apply_insertion(&content, &plan)
            }
        })?;
        Ok(outcome.get())
    }

    fn place_cursor(&self, editor: &mut dyn EditorHandle, line: usize, text: &str) {
        if !self.settings.insert.move_cursor_to_first_line {
            return;
        }
        let ch = if self.settings.insert.place_cursor_at_end {
            text.chars().count()
        } else {
            0
        };
        editor.set_cursor(Position::new(line, ch));
    }

    /// Forward direction: derive the filesystem-safe filename for a first
    /// line, or `None` when nothing usable remains
    pub fn target_filename(&self, first_line: &str) -> Option<String> {
        let title = sanitize::sanitize(first_line, &self.settings.strip)?;
        let safe = CharacterCodec::new(&self.settings.characters).encode(&title);
        let safe = safe.trim().to_string();
        if safe.is_empty() {
            None
        } else {
            Some(safe)
        }
    }

    /// Sync an existing document's filename to its first content line
    pub fn sync_existing(
        &self,
        doc: &DocumentRef,
        storage: &mut dyn StorageAccessor,
        metadata: &dyn MetadataAccessor,
    ) -> Result<SyncOutcome> {
        let content = storage.read(doc)?;

        let scope = ScopeEvaluator::new(&self.settings.scope);
        if !scope.is_in_scope(doc, Some(&content), metadata) {
            return Ok(SyncOutcome::SkippedExcluded);
        }

        let Some((_, first_line)) = document::first_content_line(&content) else {
            return Ok(SyncOutcome::SkippedNoTitle);
        };
        let first_line = first_line.to_string();

        let Some(title) = sanitize::sanitize(&first_line, &self.settings.strip) else {
            return Ok(SyncOutcome::SkippedNoTitle);
        };
        let safe = CharacterCodec::new(&self.settings.characters).encode(&title);
        let safe = safe.trim();
        if safe.is_empty() {
            return Ok(SyncOutcome::SkippedNoTitle);
        }

        if safe == doc.basename() {
            alias::sync(doc, safe, &title, &self.settings.alias, storage)?;
            return Ok(SyncOutcome::UpToDate);
        }

        let renamed = storage.rename(doc, safe)?;
        tracing::debug!(from = doc.key(), to = renamed.key(), "renamed to match first line");
        alias::sync(&renamed, safe, &title, &self.settings.alias, storage)?;
        Ok(SyncOutcome::Renamed {
            from: doc.rel.clone(),
            to: renamed.rel,
        })
    }
}

/// Replace the whole line at `line` with `text`, or append past the end
fn write_line(editor: &mut dyn EditorHandle, value: &str, line: usize, text: &str) {
    let lines: Vec<&str> = value.split('\n').collect();
    if line < lines.len() {
        let len = lines[line].chars().count();
        editor.replace_range(text, Position::new(line, 0), Position::new(line, len));
    } else {
        let last = lines.len().saturating_sub(1);
        let len = lines.last().map(|l| l.chars().count()).unwrap_or(0);
        let appended = format!("\n{}", text);
        editor.replace_range(&appended, Position::new(last, len), Position::new(last, len));
    }
}
