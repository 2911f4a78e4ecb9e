//! First-line sanitization pipeline
//!
//! Turns a raw markdown line into a candidate title by stripping configured
//! markup constructs. Every transform is independently toggleable and makes
//! no assumption about any other transform having run; users may enable any
//! subset. Output is whitespace-normalized and optionally truncated to a
//! budget counted in grapheme clusters, never splitting inside one.

use std::sync::OnceLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::StripOptions;

/// Derive a candidate title from a raw first line.
///
/// Returns `None` when nothing usable remains after stripping and trimming.
pub fn sanitize(raw: &str, opts: &StripOptions) -> Option<String> {
    let line = if opts.enabled {
        strip_markup(raw, opts)
    } else {
        raw.to_string()
    };

    let mut title = line.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Some(budget) = opts.max_length {
        title = truncate_graphemes(&title, budget);
    }

    let title = title.trim().to_string();
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// Truncate to at most `budget` grapheme clusters
pub fn truncate_graphemes(text: &str, budget: usize) -> String {
    text.graphemes(true)
        .take(budget)
        .collect::<String>()
        .trim_end()
        .to_string()
}

struct Regexes {
    heading: Regex,
    bold_star: Regex,
    bold_under: Regex,
    italic_star: Regex,
    italic_under: Regex,
    strikethrough: Regex,
    highlight: Regex,
    wikilink_alias: Regex,
    wikilink: Regex,
    md_link: Regex,
    inline_code: Regex,
    code_fence: Regex,
    blockquote: Regex,
    callout: Regex,
    list_marker: Regex,
    footnote: Regex,
    html_tag: Regex,
    percent_comment: Regex,
    html_comment: Regex,
    table_edge: Regex,
    table_inner: Regex,
    math_block: Regex,
    math_inline: Regex,
    templater: Regex,
    curly_template: Regex,
}

fn regexes() -> &'static Regexes {
    static REGEXES: OnceLock<Regexes> = OnceLock::new();
    REGEXES.get_or_init(|| {
        let re = |pattern: &str| Regex::new(pattern).expect("hardcoded pattern");
        Regexes {
            heading: re(r"^\s*#{1,6}\s+"),
            bold_star: re(r"\*\*([^*]+)\*\*"),
            bold_under: re(r"__([^_]+)__"),
            italic_star: re(r"\*([^*]+)\*"),
            italic_under: re(r"\b_([^_]+)_\b"),
            strikethrough: re(r"~~([^~]+)~~"),
            highlight: re(r"==([^=]+)=="),
            wikilink_alias: re(r"\[\[[^\]|]+\|([^\]]+)\]\]"),
            wikilink: re(r"\[\[([^\]]+)\]\]"),
            md_link: re(r"!?\[([^\]]*)\]\(([^)]+)\)"),
            inline_code: re(r"`([^`]+)`"),
            code_fence: re(r"^\s*(?:`{3,}|~{3,}).*$"),
            blockquote: re(r"^\s*(?:>\s*)+"),
            callout: re(r"^\[![A-Za-z0-9_-]+\][+-]?\s*"),
            list_marker: re(r"^\s*(?:[-*+]|\d{1,9}[.)])\s+(?:\[[^\]\n]\]\s+)?"),
            footnote: re(r"\[\^[^\]]+\]"),
            html_tag: re(r"</?[A-Za-z][^<>]*>"),
            percent_comment: re(r"%%(.*?)%%"),
            html_comment: re(r"<!--(.*?)-->"),
            table_edge: re(r"^\s*\|\s*|\s*\|\s*$"),
            table_inner: re(r"\s*\|\s*"),
            math_block: re(r"\$\$(.*?)\$\$"),
            math_inline: re(r"\$([^$]+)\$"),
            templater: re(r"<%.*?%>"),
            curly_template: re(r"\{\{.*?\}\}"),
        }
    })
}

fn strip_markup(raw: &str, opts: &StripOptions) -> String {
    let r = regexes();
    let mut line = raw.to_string();

    if opts.headings {
        line = r.heading.replace(&line, "").into_owned();
    }
    if opts.bold {
        line = r.bold_star.replace_all(&line, "$1").into_owned();
        line = r.bold_under.replace_all(&line, "$1").into_owned();
    }
    if opts.italics {
        line = r.italic_star.replace_all(&line, "$1").into_owned();
        line = r.italic_under.replace_all(&line, "$1").into_owned();
    }
    if opts.strikethrough {
        line = r.strikethrough.replace_all(&line, "$1").into_owned();
    }
    if opts.highlight {
        line = r.highlight.replace_all(&line, "$1").into_owned();
    }
    if opts.wikilinks {
        line = r.wikilink_alias.replace_all(&line, "$1").into_owned();
        line = r.wikilink.replace_all(&line, "$1").into_owned();
    }
    if opts.markdown_links {
        line = r.md_link.replace_all(&line, "$1").into_owned();
    }
    if opts.inline_code {
        line = r.inline_code.replace_all(&line, "$1").into_owned();
    }
    if opts.code_fences {
        line = r.code_fence.replace(&line, "").into_owned();
    }
    if opts.blockquotes {
        line = r.blockquote.replace(&line, "").into_owned();
        line = r.callout.replace(&line, "").into_owned();
    }
    if opts.list_markers {
        line = r.list_marker.replace(&line, "").into_owned();
    }
    if opts.footnotes {
        line = r.footnote.replace_all(&line, "").into_owned();
    }
    if opts.html_tags {
        line = r.html_tag.replace_all(&line, "").into_owned();
    }
    if opts.comments {
        let replacement = if opts.remove_comment_text { "" } else { "$1" };
        line = r.percent_comment.replace_all(&line, replacement).into_owned();
        line = r.html_comment.replace_all(&line, replacement).into_owned();
    }
    if opts.tables {
        line = r.table_edge.replace_all(&line, "").into_owned();
        line = r.table_inner.replace_all(&line, " ").into_owned();
    }
    if opts.math {
        line = r.math_block.replace_all(&line, "$1").into_owned();
        line = r.math_inline.replace_all(&line, "$1").into_owned();
    }
    if opts.templating {
        line = r.templater.replace_all(&line, "").into_owned();
        line = r.curly_template.replace_all(&line, "").into_owned();
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all() -> StripOptions {
        StripOptions::default()
    }

    fn none() -> StripOptions {
        StripOptions {
            enabled: false,
            ..StripOptions::default()
        }
    }

    fn only<F: FnOnce(&mut StripOptions)>(f: F) -> StripOptions {
        let mut opts = StripOptions {
            headings: false,
            bold: false,
            italics: false,
            strikethrough: false,
            highlight: false,
            wikilinks: false,
            markdown_links: false,
            inline_code: false,
            code_fences: false,
            blockquotes: false,
            list_markers: false,
            footnotes: false,
            html_tags: false,
            comments: false,
            tables: false,
            math: false,
            templating: false,
            ..StripOptions::default()
        };
        f(&mut opts);
        opts
    }

    #[test]
    fn test_heading_stripped() {
        assert_eq!(sanitize("## My Title", &all()), Some("My Title".to_string()));
        assert_eq!(sanitize("#tag is not a heading", &all()), Some("#tag is not a heading".to_string()));
    }

    #[test]
    fn test_toggles_are_independent() {
        let opts = only(|o| o.bold = true);
        assert_eq!(
            sanitize("**A** *B* ~~C~~", &opts),
            Some("A *B* ~~C~~".to_string())
        );
    }

    #[test]
    fn test_emphasis_and_highlight() {
        assert_eq!(
            sanitize("**bold** *italic* ==mark== ~~gone~~", &all()),
            Some("bold italic mark gone".to_string())
        );
        assert_eq!(
            sanitize("an _underscore_ emphasis", &all()),
            Some("an underscore emphasis".to_string())
        );
        // Underscores inside identifiers are not emphasis
        assert_eq!(
            sanitize("snake_case_name", &all()),
            Some("snake_case_name".to_string())
        );
    }

    #[test]
    fn test_links_keep_text_drop_target() {
        assert_eq!(
            sanitize("[[Target|Shown]] and [[Plain]]", &all()),
            Some("Shown and Plain".to_string())
        );
        assert_eq!(
            sanitize("[label](https://example.com) end", &all()),
            Some("label end".to_string())
        );
        assert_eq!(sanitize("![alt](img.png) x", &all()), Some("alt x".to_string()));
    }

    #[test]
    fn test_code() {
        assert_eq!(sanitize("`inline` code", &all()), Some("inline code".to_string()));
        assert_eq!(sanitize("```rust", &all()), None);
    }

    #[test]
    fn test_blockquote_and_callout() {
        assert_eq!(sanitize("> quoted text", &all()), Some("quoted text".to_string()));
        assert_eq!(
            sanitize("> [!note]+ Folded note", &all()),
            Some("Folded note".to_string())
        );
    }

    #[test]
    fn test_list_and_task_markers() {
        assert_eq!(sanitize("- item one", &all()), Some("item one".to_string()));
        assert_eq!(sanitize("3. ordered", &all()), Some("ordered".to_string()));
        assert_eq!(sanitize("- [x] done task", &all()), Some("done task".to_string()));
    }

    #[test]
    fn test_footnote_html_table_math() {
        assert_eq!(sanitize("claim[^1] stands", &all()), Some("claim stands".to_string()));
        assert_eq!(
            sanitize("<b>bold</b> <span class=\"x\">text</span>", &all()),
            Some("bold text".to_string())
        );
        assert_eq!(sanitize("| a | b |", &all()), Some("a b".to_string()));
        assert_eq!(sanitize("$E = mc^2$ holds", &all()), Some("E = mc^2 holds".to_string()));
    }

    #[test]
    fn test_comment_modes() {
        assert_eq!(
            sanitize("keep %%hidden%% markers", &all()),
            Some("keep hidden markers".to_string())
        );
        let mut opts = all();
        opts.remove_comment_text = true;
        assert_eq!(
            sanitize("keep %%hidden%% markers", &opts),
            Some("keep markers".to_string())
        );
        assert_eq!(
            sanitize("a <!--note--> b", &opts),
            Some("a b".to_string())
        );
    }

    #[test]
    fn test_templating_removed() {
        assert_eq!(
            sanitize("<% tp.date.now() %> Journal {{title}}", &all()),
            Some("Journal".to_string())
        );
    }

    #[test]
    fn test_disabled_pipeline_passes_through() {
        assert_eq!(
            sanitize("## raw **line**", &none()),
            Some("## raw **line**".to_string())
        );
    }

    #[test]
    fn test_whitespace_normalized() {
        assert_eq!(sanitize("  a   b  ", &all()), Some("a b".to_string()));
    }

    #[test]
    fn test_empty_reports_no_usable_title() {
        assert_eq!(sanitize("", &all()), None);
        assert_eq!(sanitize("   ", &all()), None);
        assert_eq!(sanitize("## ", &all()), None);
    }

    #[test]
    fn test_truncation_counts_graphemes() {
        let mut opts = all();
        opts.max_length = Some(6);
        assert_eq!(sanitize("abcdefgh", &opts), Some("abcdef".to_string()));

        // A family emoji is many code points but one visual character
        let title = "abcde\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}\u{200D}\u{1F466}tail";
        assert_eq!(
            sanitize(title, &opts),
            Some(format!(
                "abcde{}",
                "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}\u{200D}\u{1F466}"
            ))
        );
    }

    #[test]
    fn test_truncation_never_splits_a_cluster() {
        let mut opts = all();
        opts.max_length = Some(5);
        // Budget ends exactly before the emoji; the whole sequence is excluded
        let title = "abcde\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}\u{200D}\u{1F466}";
        assert_eq!(sanitize(title, &opts), Some("abcde".to_string()));
    }
}
