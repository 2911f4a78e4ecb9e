//! Alias mirroring
//!
//! Writes the human-readable title into a configured frontmatter property
//! when derivation lost information (character substitution or truncation).
//! Edits are line-surgical so unrelated properties survive byte-for-byte;
//! re-serializing the whole map would reorder keys.

use crate::config::AliasSettings;
use crate::document::{self, DocumentRef, FRONTMATTER_DELIMITER};
use crate::error::Result;
use crate::host::StorageAccessor;

/// Mirror `first_line` into the configured property.
///
/// Returns whether a write happened. With `only_if_differs` enabled nothing
/// is written when the computed title equals the first line. An empty value
/// under the keep-empty-property-off policy removes an existing property
/// instead of writing an empty one.
pub fn sync(
    doc: &DocumentRef,
    computed_title: &str,
    first_line: &str,
    settings: &AliasSettings,
    storage: &mut dyn StorageAccessor,
) -> Result<bool> {
    if !settings.enabled || settings.property.is_empty() {
        return Ok(false);
    }
    if settings.only_if_differs && computed_title == first_line {
        tracing::trace!(doc = doc.key(), "alias unchanged, nothing lost in derivation");
        return Ok(false);
    }

    let key = settings.property.clone();
    let value = first_line.trim().to_string();

    if value.is_empty() && !settings.keep_empty_property {
        storage.write(doc, &|content| remove_property(&content, &key))?;
        return Ok(true);
    }

    storage.write(doc, &|content| upsert_property(&content, &key, &value))?;
    Ok(true)
}

/// Set `key: value` inside the frontmatter block, creating the block when
/// the document has none. Unrelated lines are left untouched.
pub fn upsert_property(content: &str, key: &str, value: &str) -> String {
    let line = format!("{}: {}", key, yaml_scalar(value));

    let Some(bounds) = document::frontmatter_bounds(content) else {
        return format!(
            "{}\n{}\n{}\n{}",
            FRONTMATTER_DELIMITER, line, FRONTMATTER_DELIMITER, content
        );
    };

    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
    match property_span(&lines, bounds.end_line, key) {
        Some((start, end)) => {
            lines.splice(start..end, [line]);
        }
        None => {
            lines.insert(bounds.end_line, line);
        }
    }
    lines.join("\n")
}

/// Remove `key` (and its list items) from the frontmatter block
pub fn remove_property(content: &str, key: &str) -> String {
    let Some(bounds) = document::frontmatter_bounds(content) else {
        return content.to_string();
    };

    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
    if let Some((start, end)) = property_span(&lines, bounds.end_line, key) {
        lines.drain(start..end);
    }
    lines.join("\n")
}

/// Line span `[start, end)` of a top-level property and its list items
fn property_span(lines: &[String], end_line: usize, key: &str) -> Option<(usize, usize)> {
    let key = key.to_lowercase();
    let start = (1..end_line).find(|&i| {
        let line = &lines[i];
        match line.split_once(':') {
            Some((k, _)) => !k.starts_with(char::is_whitespace) && k.trim().to_lowercase() == key,
            None => false,
        }
    })?;

    let mut end = start + 1;
    while end < end_line {
        let trimmed = lines[end].trim_start();
        let is_item = trimmed.starts_with("- ") || trimmed == "-";
        // List items belong to the property whether indented or not
        if is_item {
            end += 1;
        } else {
            break;
        }
    }
    Some((start, end))
}

fn yaml_scalar(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
