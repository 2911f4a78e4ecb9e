//! Scope evaluation: which documents are processed at all
//!
//! Folder, tag and property rules are evaluated independently and exclusion
//! is conjunctive across categories: failing any single category excludes
//! the document, and no category can override another. The disable marker
//! wins over everything.

use crate::config::{FolderRule, PropertyRule, ScopeSettings, ScopeStrategy, TagRule};
use crate::document::{self, DocumentRef, Properties};
use crate::host::MetadataAccessor;

/// Why a document was excluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExclusionReason {
    DisableMarker,
    Folder,
    Tag,
    Property,
}

/// Result of a scope evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeDecision {
    InScope,
    Excluded(ExclusionReason),
}

impl ScopeDecision {
    pub fn is_in_scope(self) -> bool {
        matches!(self, ScopeDecision::InScope)
    }
}

/// Evaluates exclusion rules against a document
pub struct ScopeEvaluator<'a> {
    settings: &'a ScopeSettings,
}

impl<'a> ScopeEvaluator<'a> {
    pub fn new(settings: &'a ScopeSettings) -> Self {
        ScopeEvaluator { settings }
    }

    /// Whether the document should be processed.
    ///
    /// `content` carries a live in-memory snapshot not yet flushed to
    /// storage; when absent, persisted metadata is read through `metadata`.
    pub fn is_in_scope(
        &self,
        doc: &DocumentRef,
        content: Option<&str>,
        metadata: &dyn MetadataAccessor,
    ) -> bool {
        self.evaluate(doc, content, metadata).is_in_scope()
    }

    /// Full decision including the excluding category
    pub fn evaluate(
        &self,
        doc: &DocumentRef,
        content: Option<&str>,
        metadata: &dyn MetadataAccessor,
    ) -> ScopeDecision {
        let props = match content {
            Some(c) => document::parse_properties(c),
            None => metadata.properties(doc),
        };

        if self.disable_marker_set(&props) {
            return ScopeDecision::Excluded(ExclusionReason::DisableMarker);
        }
        if folder_excludes(&self.settings.folders, doc.folder()) {
            return ScopeDecision::Excluded(ExclusionReason::Folder);
        }
        if self.tags_exclude(doc, content, metadata) {
            return ScopeDecision::Excluded(ExclusionReason::Tag);
        }
        if properties_exclude(&self.settings.properties, &props) {
            return ScopeDecision::Excluded(ExclusionReason::Property);
        }
        ScopeDecision::InScope
    }

    fn disable_marker_set(&self, props: &Properties) -> bool {
        let Some(marker) = &self.settings.disable_marker else {
            return false;
        };
        if marker.key.is_empty() {
            return false;
        }
        document::property_ignore_case(props, &marker.key)
            .map(|value| value.matches_ignore_case(&marker.value))
            .unwrap_or(false)
    }

    fn tags_exclude(
        &self,
        doc: &DocumentRef,
        content: Option<&str>,
        metadata: &dyn MetadataAccessor,
    ) -> bool {
        let rule = &self.settings.tags;
        if rule.tags.is_empty() && rule.strategy == ScopeStrategy::OnlyExclude {
            return false;
        }
        let doc_tags = match content {
            Some(c) => document::collect_tags(c, rule.locus),
            None => metadata.tags(doc, rule.locus),
        };
        tags_exclude(rule, &doc_tags)
    }
}

fn folder_excludes(rule: &FolderRule, folder: &str) -> bool {
    let matched = rule
        .folders
        .iter()
        .any(|entry| folder_matches(folder, entry, rule.include_subfolders));
    match rule.strategy {
        ScopeStrategy::OnlyExclude => matched,
        ScopeStrategy::ExcludeAllExcept => !matched,
    }
}

fn folder_matches(folder: &str, entry: &str, include_subfolders: bool) -> bool {
    let entry = entry.trim_matches('/');
    if folder == entry {
        return true;
    }
    if include_subfolders {
        if entry.is_empty() {
            // The vault root is an ancestor of everything
            return true;
        }
        return folder.starts_with(entry) && folder[entry.len()..].starts_with('/');
    }
    false
}

fn tags_exclude(rule: &TagRule, doc_tags: &[String]) -> bool {
    let matched = doc_tags.iter().any(|doc_tag| {
        rule.tags
            .iter()
            .any(|entry| tag_matches(doc_tag, entry, rule.include_child_tags))
    });
    match rule.strategy {
        ScopeStrategy::OnlyExclude => matched,
        // A document with zero tags cannot be on the allow list
        ScopeStrategy::ExcludeAllExcept => !matched,
    }
}

fn tag_matches(doc_tag: &str, entry: &str, include_children: bool) -> bool {
    let entry = entry.trim_start_matches('#').to_lowercase();
    if entry.is_empty() {
        return false;
    }
    if *doc_tag == entry {
        return true;
    }
    include_children && doc_tag.starts_with(&entry) && doc_tag[entry.len()..].starts_with('/')
}

fn properties_exclude(rule: &PropertyRule, props: &Properties) -> bool {
    let matched = rule.entries.iter().any(|entry| {
        document::property_ignore_case(props, &entry.key)
            .map(|value| value.matches(&entry.value))
            .unwrap_or(false)
    });
    match rule.strategy {
        ScopeStrategy::OnlyExclude => matched,
        ScopeStrategy::ExcludeAllExcept => !matched,
    }
}
