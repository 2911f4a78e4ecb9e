//! Settings for the firstline engine
//!
//! Settings are stored in `firstline.toml` at the vault root. The whole
//! object is passed by reference into each evaluator call; no component
//! reaches into ambient state.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FirstlineError, Result};

/// Current config format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Name of the per-vault config file
pub const CONFIG_FILE_NAME: &str = "firstline.toml";

/// Top-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Config format version for compatibility checking
    #[serde(default = "default_version")]
    pub version: u32,

    /// Character replacement rules
    #[serde(default)]
    pub characters: CharacterSettings,

    /// Markup stripping toggles
    #[serde(default)]
    pub strip: StripOptions,

    /// Exclusion rules (folders, tags, properties, disable marker)
    #[serde(default)]
    pub scope: ScopeSettings,

    /// Alias mirroring
    #[serde(default)]
    pub alias: AliasSettings,

    /// Title insertion behavior for newly created notes
    #[serde(default)]
    pub insert: InsertSettings,

    /// Retry and wait timing
    #[serde(default)]
    pub timing: TimingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            version: CONFIG_FORMAT_VERSION,
            characters: CharacterSettings::default(),
            strip: StripOptions::default(),
            scope: ScopeSettings::default(),
            alias: AliasSettings::default(),
            insert: InsertSettings::default(),
            timing: TimingSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings: Settings =
            toml::from_str(&content).map_err(|e| FirstlineError::InvalidConfig {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FirstlineError::Other(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// One replacement rule for a single forbidden character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRule {
    /// The forbidden character this rule replaces
    pub original: char,
    /// Replacement text used in filenames (may be empty)
    pub replacement: String,
    /// Whether this rule participates in encode/decode
    #[serde(default)]
    pub enabled: bool,
    /// Insert a space before the replacement on encode; consume one on decode
    #[serde(default)]
    pub trim_left: bool,
    /// Insert a space after the replacement on encode; consume one on decode
    #[serde(default)]
    pub trim_right: bool,
}

/// Character replacement rule set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterSettings {
    /// Master switch; when off no substitution happens at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// One rule per forbidden character
    #[serde(default = "default_rules")]
    pub rules: Vec<CharacterRule>,
}

impl Default for CharacterSettings {
    fn default() -> Self {
        CharacterSettings {
            enabled: true,
            rules: default_rules(),
        }
    }
}

impl CharacterSettings {
    /// Look up the rule for a character, if one exists
    pub fn rule_for(&self, c: char) -> Option<&CharacterRule> {
        self.rules.iter().find(|r| r.original == c)
    }
}

fn default_rules() -> Vec<CharacterRule> {
    let rule = |original: char,
                replacement: &str,
                enabled: bool,
                trim_left: bool,
                trim_right: bool| CharacterRule {
        original,
        replacement: replacement.to_string(),
        enabled,
        trim_left,
        trim_right,
    };

    // One entry per forbidden character, in codec iteration order.
    // Replacements are distinct so decode stays unambiguous out of the box.
    vec![
        rule('/', "-", true, true, true),
        rule('\\', "\u{2216}", true, false, false),
        rule(':', "\u{2236}", true, false, false),
        rule('*', "\u{2217}", true, false, false),
        rule('?', "\u{FF1F}", true, false, false),
        rule('"', "\u{201D}", true, false, false),
        rule('<', "\u{2039}", true, false, false),
        rule('>', "\u{203A}", true, false, false),
        rule('|', "\u{2223}", true, false, false),
        rule('#', "", false, false, false),
        rule('^', "", false, false, false),
        rule('[', "(", false, false, false),
        rule(']', ")", false, false, false),
    ]
}

/// Markup stripping toggles, all orthogonal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripOptions {
    /// Master switch; when off the raw line is used as-is
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub headings: bool,
    #[serde(default = "default_true")]
    pub bold: bool,
    #[serde(default = "default_true")]
    pub italics: bool,
    #[serde(default = "default_true")]
    pub strikethrough: bool,
    #[serde(default = "default_true")]
    pub highlight: bool,
    #[serde(default = "default_true")]
    pub wikilinks: bool,
    #[serde(default = "default_true")]
    pub markdown_links: bool,
    #[serde(default = "default_true")]
    pub inline_code: bool,
    #[serde(default = "default_true")]
    pub code_fences: bool,
    /// Blockquote markers, including callout headers
    #[serde(default = "default_true")]
    pub blockquotes: bool,
    /// List bullets, ordered-list numbers and task checkboxes
    #[serde(default = "default_true")]
    pub list_markers: bool,
    #[serde(default = "default_true")]
    pub footnotes: bool,
    #[serde(default = "default_true")]
    pub html_tags: bool,
    #[serde(default = "default_true")]
    pub comments: bool,
    /// Drop the commented text entirely instead of just the markers
    #[serde(default)]
    pub remove_comment_text: bool,
    #[serde(default = "default_true")]
    pub tables: bool,
    #[serde(default = "default_true")]
    pub math: bool,
    /// Legacy templating syntax (`<% … %>`, `{{ … }}`)
    #[serde(default = "default_true")]
    pub templating: bool,

    /// Maximum title length in visual characters; unset means unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl Default for StripOptions {
    fn default() -> Self {
        StripOptions {
            enabled: true,
            headings: true,
            bold: true,
            italics: true,
            strikethrough: true,
            highlight: true,
            wikilinks: true,
            markdown_links: true,
            inline_code: true,
            code_fences: true,
            blockquotes: true,
            list_markers: true,
            footnotes: true,
            html_tags: true,
            comments: true,
            remove_comment_text: false,
            tables: true,
            math: true,
            templating: true,
            max_length: None,
        }
    }
}

/// Policy determining whether list membership includes or excludes a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeStrategy {
    /// Listed entries are excluded; everything else is processed
    #[default]
    OnlyExclude,
    /// Only listed entries are processed; everything else is excluded
    ExcludeAllExcept,
}

/// Where tags are collected from when matching tag rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagMatchLocus {
    /// Frontmatter properties and body text
    #[default]
    PropertiesAndBody,
    /// Frontmatter properties only
    PropertiesOnly,
    /// Body text only
    BodyOnly,
}

/// Folder exclusion rule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderRule {
    #[serde(default)]
    pub strategy: ScopeStrategy,
    /// Vault-relative folder paths; empty string means the vault root
    #[serde(default)]
    pub folders: Vec<String>,
    /// Whether a listed folder also matches documents in its subfolders
    #[serde(default)]
    pub include_subfolders: bool,
}

/// Tag exclusion rule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagRule {
    #[serde(default)]
    pub strategy: ScopeStrategy,
    /// Tags with or without a leading `#`
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub locus: TagMatchLocus,
    /// Whether a listed tag `a` also matches a document tag `a/b`
    #[serde(default)]
    pub include_child_tags: bool,
}

/// A single property pattern; an empty value matches any value for the key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMatch {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Property exclusion rule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyRule {
    #[serde(default)]
    pub strategy: ScopeStrategy,
    #[serde(default)]
    pub entries: Vec<PropertyMatch>,
}

/// A single property that unconditionally opts a document out of processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisableMarker {
    pub key: String,
    pub value: String,
}

/// Exclusion rule sets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeSettings {
    #[serde(default)]
    pub folders: FolderRule,
    #[serde(default)]
    pub tags: TagRule,
    #[serde(default)]
    pub properties: PropertyRule,
    /// Reserved key/value that always excludes, regardless of other rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_marker: Option<DisableMarker>,
}

/// Alias mirroring settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasSettings {
    /// Master switch for alias mirroring
    #[serde(default)]
    pub enabled: bool,

    /// Frontmatter property the title is mirrored into
    #[serde(default = "default_alias_property")]
    pub property: String,

    /// Only mirror when derivation lost information (title != filename)
    #[serde(default = "default_true")]
    pub only_if_differs: bool,

    /// Keep the property when its value would be empty; when off an empty
    /// value removes an existing property instead
    #[serde(default)]
    pub keep_empty_property: bool,
}

impl Default for AliasSettings {
    fn default() -> Self {
        AliasSettings {
            enabled: false,
            property: default_alias_property(),
            only_if_differs: true,
            keep_empty_property: false,
        }
    }
}

/// Title insertion settings for newly created notes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertSettings {
    /// Heading marker prefixed to the inserted title, e.g. `#`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_marker: Option<String>,

    /// Move the cursor to the inserted line after a successful insertion
    #[serde(default = "default_true")]
    pub move_cursor_to_first_line: bool,

    /// Place the cursor at the end of the inserted line rather than its start
    #[serde(default)]
    pub place_cursor_at_end: bool,
}

impl Default for InsertSettings {
    fn default() -> Self {
        InsertSettings {
            heading_marker: None,
            move_cursor_to_first_line: true,
            place_cursor_at_end: false,
        }
    }
}

/// Retry and wait timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    /// Delay between editor write attempts, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Editor write attempts before falling back to the storage write
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Wait before inspecting a new note's content, giving a template
    /// plugin time to populate it, in milliseconds
    #[serde(default = "default_template_wait_ms")]
    pub template_wait_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        TimingSettings {
            retry_delay_ms: default_retry_delay_ms(),
            retry_count: default_retry_count(),
            template_wait_ms: default_template_wait_ms(),
        }
    }
}

/// Category addressed by [`apply_master_toggle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleCategory {
    Characters,
    Strip,
    Alias,
}

/// Apply a master toggle, returning the full cascaded state.
///
/// Disabling a master switch forces every dependent toggle off so the state
/// persists that way; re-enabling only flips the master back on and leaves
/// dependents as the user last set them.
pub fn apply_master_toggle(
    settings: &Settings,
    category: ToggleCategory,
    enabled: bool,
) -> Settings {
    let mut next = settings.clone();
    match category {
        ToggleCategory::Characters => {
            next.characters.enabled = enabled;
            if !enabled {
                for rule in &mut next.characters.rules {
                    rule.enabled = false;
                }
            }
        }
        ToggleCategory::Strip => {
            next.strip.enabled = enabled;
            if !enabled {
                let max_length = next.strip.max_length;
                next.strip = StripOptions {
                    enabled: false,
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
                    remove_comment_text: false,
                    tables: false,
                    math: false,
                    templating: false,
                    max_length,
                };
            }
        }
        ToggleCategory::Alias => {
            next.alias.enabled = enabled;
            if !enabled {
                next.alias.only_if_differs = true;
                next.alias.keep_empty_property = false;
            }
        }
    }
    next
}

fn default_version() -> u32 {
    CONFIG_FORMAT_VERSION
}

fn default_true() -> bool {
    true
}

fn default_alias_property() -> String {
    "aliases".to_string()
}

fn default_retry_delay_ms() -> u64 {
    50
}

fn default_retry_count() -> u32 {
    5
}

fn default_template_wait_ms() -> u64 {
    250
}
