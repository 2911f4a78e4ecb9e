//! Document references and markdown/frontmatter inspection
//!
//! A frontmatter block is recognized only when the very first line of
//! content is exactly the delimiter and a matching delimiter line occurs
//! later on its own line; any other placement is ordinary content.
//! Malformed YAML inside the block is treated as "no metadata", never as an
//! error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde_yaml::Value;

use crate::config::TagMatchLocus;

/// Frontmatter delimiter line
pub const FRONTMATTER_DELIMITER: &str = "---";

/// Reference to a document inside a vault
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    /// Absolute (or test-local) path to the file
    pub path: PathBuf,
    /// Vault-relative path, used for folder matching and identity
    pub rel: String,
}

impl DocumentRef {
    pub fn new(path: impl Into<PathBuf>, rel: impl Into<String>) -> Self {
        DocumentRef {
            path: path.into(),
            rel: rel.into(),
        }
    }

    /// Identity key for per-document state
    pub fn key(&self) -> &str {
        &self.rel
    }

    /// File name without the `.md` extension
    pub fn basename(&self) -> &str {
        let name = self.rel.rsplit('/').next().unwrap_or(&self.rel);
        name.strip_suffix(".md").unwrap_or(name)
    }

    /// Vault-relative folder path; empty string for the vault root
    pub fn folder(&self) -> &str {
        match self.rel.rfind('/') {
            Some(idx) => &self.rel[..idx],
            None => "",
        }
    }

    /// Sibling reference with a different basename, same folder
    pub fn with_basename(&self, basename: &str) -> DocumentRef {
        let file = format!("{}.md", basename);
        let rel = if self.folder().is_empty() {
            file.clone()
        } else {
            format!("{}/{}", self.folder(), file)
        };
        let path = self
            .path
            .parent()
            .map(|p| p.join(&file))
            .unwrap_or_else(|| PathBuf::from(&file));
        DocumentRef { path, rel }
    }
}

/// Relative path of `path` under `root`, with forward slashes
pub fn rel_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for comp in rel.components() {
        parts.push(comp.as_os_str().to_str()?.to_string());
    }
    Some(parts.join("/"))
}

/// A frontmatter property value: scalar or list of scalars
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Scalar(String),
    List(Vec<String>),
}

impl PropertyValue {
    /// Whether this value matches `want`; an empty `want` matches anything.
    /// Array values match when any element matches.
    pub fn matches(&self, want: &str) -> bool {
        if want.is_empty() {
            return true;
        }
        match self {
            PropertyValue::Scalar(v) => v == want,
            PropertyValue::List(vs) => vs.iter().any(|v| v == want),
        }
    }

    /// Case-insensitive variant of [`matches`](Self::matches)
    pub fn matches_ignore_case(&self, want: &str) -> bool {
        if want.is_empty() {
            return true;
        }
        let want = want.to_lowercase();
        match self {
            PropertyValue::Scalar(v) => v.to_lowercase() == want,
            PropertyValue::List(vs) => vs.iter().any(|v| v.to_lowercase() == want),
        }
    }
}

/// Document properties keyed by frontmatter key
pub type Properties = BTreeMap<String, PropertyValue>;

/// Byte/line bounds of a leading frontmatter block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontmatterBounds {
    /// Line index of the closing delimiter
    pub end_line: usize,
}

/// Detect a leading frontmatter block.
///
/// Returns `None` unless line 0 is exactly the delimiter and a later line is
/// too.
pub fn frontmatter_bounds(content: &str) -> Option<FrontmatterBounds> {
    let mut lines = content.split('\n');
    if lines.next().map(trim_newline) != Some(FRONTMATTER_DELIMITER) {
        return None;
    }
    for (idx, line) in lines.enumerate() {
        if trim_newline(line) == FRONTMATTER_DELIMITER {
            return Some(FrontmatterBounds { end_line: idx + 1 });
        }
    }
    None
}

fn trim_newline(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

/// Parse frontmatter properties from document content.
///
/// Missing or malformed frontmatter yields an empty map.
pub fn parse_properties(content: &str) -> Properties {
    let Some(bounds) = frontmatter_bounds(content) else {
        return Properties::new();
    };

    let yaml: String = content
        .split('\n')
        .take(bounds.end_line)
        .skip(1)
        .collect::<Vec<_>>()
        .join("\n");

    let value: Value = match serde_yaml::from_str(&yaml) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "malformed frontmatter treated as empty");
            return Properties::new();
        }
    };

    let Value::Mapping(map) = value else {
        return Properties::new();
    };

    let mut props = Properties::new();
    for (k, v) in map {
        let Some(key) = scalar_to_string(&k) else {
            continue;
        };
        match v {
            Value::Sequence(seq) => {
                let items: Vec<String> = seq.iter().filter_map(scalar_to_string).collect();
                props.insert(key, PropertyValue::List(items));
            }
            other => {
                if let Some(s) = scalar_to_string(&other) {
                    props.insert(key, PropertyValue::Scalar(s));
                }
            }
        }
    }
    props
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

/// Case-insensitive property lookup
pub fn property_ignore_case<'a>(props: &'a Properties, key: &str) -> Option<&'a PropertyValue> {
    let key = key.to_lowercase();
    props
        .iter()
        .find(|(k, _)| k.to_lowercase() == key)
        .map(|(_, v)| v)
}

/// First non-blank content line past any frontmatter block.
///
/// Returns the line index (over the whole content) and the line text.
pub fn first_content_line(content: &str) -> Option<(usize, &str)> {
    let start = frontmatter_bounds(content)
        .map(|b| b.end_line + 1)
        .unwrap_or(0);
    content
        .split('\n')
        .enumerate()
        .skip(start)
        .find(|(_, line)| !line.trim().is_empty())
}

/// Collect normalized tags from the configured locus.
///
/// Tags are lowercased with any leading `#` removed.
pub fn collect_tags(content: &str, locus: TagMatchLocus) -> Vec<String> {
    let mut tags = Vec::new();
    if locus != TagMatchLocus::BodyOnly {
        tags.extend(property_tags(&parse_properties(content)));
    }
    if locus != TagMatchLocus::PropertiesOnly {
        tags.extend(body_tags(content));
    }
    tags.sort();
    tags.dedup();
    tags
}

/// Tags declared in the `tags`/`tag` frontmatter properties
pub fn property_tags(props: &Properties) -> Vec<String> {
    let mut tags = Vec::new();
    for key in ["tags", "tag"] {
        match property_ignore_case(props, key) {
            Some(PropertyValue::List(vs)) => {
                tags.extend(vs.iter().map(|v| normalize_tag(v)));
            }
            Some(PropertyValue::Scalar(v)) => {
                // A scalar may hold a comma-separated tag list
                tags.extend(v.split(',').map(normalize_tag));
            }
            None => {}
        }
    }
    tags.retain(|t| !t.is_empty());
    tags
}

/// Tags written inline in the body as `#tag`
pub fn body_tags(content: &str) -> Vec<String> {
    let start = frontmatter_bounds(content)
        .map(|b| b.end_line + 1)
        .unwrap_or(0);
    let body: String = content
        .split('\n')
        .skip(start)
        .collect::<Vec<_>>()
        .join("\n");

    let tag_re = match Regex::new(r"(^|\s)#([A-Za-z0-9_][A-Za-z0-9_/-]*)") {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    tag_re
        .captures_iter(&body)
        .map(|cap| normalize_tag(&cap[2]))
        .collect()
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().trim_start_matches('#').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontmatter_bounds() {
        assert_eq!(
            frontmatter_bounds("---\nkey: v\n---\nbody"),
            Some(FrontmatterBounds { end_line: 2 })
        );
        assert_eq!(
            frontmatter_bounds("---\n---\n"),
            Some(FrontmatterBounds { end_line: 1 })
        );
        // Delimiter must be the very first line
        assert_eq!(frontmatter_bounds("\n---\nkey: v\n---\n"), None);
        assert_eq!(frontmatter_bounds("  ---\nkey: v\n---\n"), None);
        // No closing delimiter means no frontmatter
        assert_eq!(frontmatter_bounds("---\nkey: v\n"), None);
        // Stray delimiter text elsewhere is ordinary content
        assert_eq!(frontmatter_bounds("text\n---\nmore\n---\n"), None);
    }

    #[test]
    fn test_parse_properties() {
        let content = "---\ntitle: Test\ncount: 3\ndraft: true\ntags:\n  - a\n  - b\n---\nbody";
        let props = parse_properties(content);
        assert_eq!(
            props.get("title"),
            Some(&PropertyValue::Scalar("Test".to_string()))
        );
        assert_eq!(
            props.get("count"),
            Some(&PropertyValue::Scalar("3".to_string()))
        );
        assert_eq!(
            props.get("tags"),
            Some(&PropertyValue::List(vec!["a".to_string(), "b".to_string()]))
        );
    }

    #[test]
    fn test_malformed_frontmatter_is_empty() {
        let content = "---\n: [unbalanced\n---\nbody";
        assert!(parse_properties(content).is_empty());
        assert!(parse_properties("no frontmatter at all").is_empty());
    }

    #[test]
    fn test_property_lookup_ignores_key_case() {
        let content = "---\nExclude: Yes\n---\n";
        let props = parse_properties(content);
        let value = property_ignore_case(&props, "exclude").unwrap();
        assert!(value.matches_ignore_case("yes"));
        assert!(!value.matches("yes"));
    }

    #[test]
    fn test_first_content_line() {
        assert_eq!(
            first_content_line("---\nkey: v\n---\n\nHello\n"),
            Some((4, "Hello"))
        );
        assert_eq!(first_content_line("---\nkey: v\n---\n\n\n"), None);
        assert_eq!(first_content_line("Hello\n"), Some((0, "Hello")));
        assert_eq!(first_content_line(""), None);
    }

    #[test]
    fn test_collect_tags_by_locus() {
        let content = "---\ntags:\n  - Alpha\n---\n\nBody with #beta and #Beta/Child\n";
        let both = collect_tags(content, TagMatchLocus::PropertiesAndBody);
        assert_eq!(both, vec!["alpha", "beta", "beta/child"]);

        let props_only = collect_tags(content, TagMatchLocus::PropertiesOnly);
        assert_eq!(props_only, vec!["alpha"]);

        let body_only = collect_tags(content, TagMatchLocus::BodyOnly);
        assert_eq!(body_only, vec!["beta", "beta/child"]);
    }

    #[test]
    fn test_scalar_tag_list() {
        let content = "---\ntags: one, two\n---\n";
        let tags = collect_tags(content, TagMatchLocus::PropertiesOnly);
        assert_eq!(tags, vec!["one", "two"]);
    }

    #[test]
    fn test_document_ref_paths() {
        let doc = DocumentRef::new("/vault/daily/2024-01-01.md", "daily/2024-01-01.md");
        assert_eq!(doc.basename(), "2024-01-01");
        assert_eq!(doc.folder(), "daily");

        let renamed = doc.with_basename("renamed");
        assert_eq!(renamed.rel, "daily/renamed.md");
        assert_eq!(renamed.path, PathBuf::from("/vault/daily/renamed.md"));

        let root_doc = DocumentRef::new("/vault/note.md", "note.md");
        assert_eq!(root_doc.folder(), "");
        assert_eq!(root_doc.with_basename("x").rel, "x.md");
    }
}
