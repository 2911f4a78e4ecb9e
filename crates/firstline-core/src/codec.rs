//! Bidirectional mapping between forbidden characters and safe replacements
//!
//! `encode` turns a human-readable title into a filename-safe string;
//! `decode` reconstructs the title from a filename. Both iterate the fixed
//! forbidden set in a fixed order, so repeated calls are idempotent. A
//! replacement string shared by more than one enabled rule cannot be
//! reversed and is skipped during decode.

use crate::config::{CharacterRule, CharacterSettings};

/// The fixed set of characters that may not appear in a filename,
/// in codec iteration order.
pub const FORBIDDEN_CHARS: &[char] = &[
    '/', '\\', ':', '*', '?', '"', '<', '>', '|', '#', '^', '[', ']',
];

/// Punctuation that suppresses an inserted trailing space on encode,
/// so `Hello?` does not become `Hello ?`.
const PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}'];

/// Bidirectional title/filename codec over a rule set
pub struct CharacterCodec<'a> {
    settings: &'a CharacterSettings,
}

impl<'a> CharacterCodec<'a> {
    pub fn new(settings: &'a CharacterSettings) -> Self {
        CharacterCodec { settings }
    }

    fn rule_for(&self, c: char) -> Option<&CharacterRule> {
        if !self.settings.enabled {
            return None;
        }
        self.settings.rule_for(c).filter(|r| r.enabled)
    }

    /// Replacement strings used by more than one enabled rule
    fn ambiguous_replacements(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        let mut ambiguous: Vec<&str> = Vec::new();
        for &c in FORBIDDEN_CHARS {
            let Some(rule) = self.rule_for(c) else {
                continue;
            };
            if rule.replacement.is_empty() {
                continue;
            }
            if seen.contains(&rule.replacement.as_str()) {
                if !ambiguous.contains(&rule.replacement.as_str()) {
                    ambiguous.push(&rule.replacement);
                }
            } else {
                seen.push(&rule.replacement);
            }
        }
        ambiguous
    }

    /// Replace each forbidden character with its configured replacement.
    ///
    /// A leading `.` (and any leading whitespace) is always stripped from
    /// position 0; dots elsewhere pass through untouched.
    pub fn encode(&self, title: &str) -> String {
        let chars: Vec<char> = title.chars().collect();
        let mut out = String::with_capacity(title.len());

        for (i, &c) in chars.iter().enumerate() {
            match self.rule_for(c) {
                Some(rule) => {
                    if rule.trim_left {
                        out.push(' ');
                    }
                    out.push_str(&rule.replacement);
                    if rule.trim_right {
                        let next_is_punct = chars
                            .get(i + 1)
                            .map(|n| PUNCTUATION.contains(n))
                            .unwrap_or(false);
                        if !next_is_punct {
                            out.push(' ');
                        }
                    }
                }
                None => out.push(c),
            }
        }

        out.trim_start_matches(|c: char| c == '.' || c.is_whitespace())
            .to_string()
    }

    /// Reconstruct a title from a filename-safe string.
    ///
    /// Each enabled rule whose replacement is unambiguous is reversed,
    /// consuming one inserted space on each trimmed side where present.
    /// Ambiguous replacements are left untouched.
    pub fn decode(&self, name: &str) -> String {
        let ambiguous = self.ambiguous_replacements();
        let mut out = name.to_string();

        for &c in FORBIDDEN_CHARS {
            let Some(rule) = self.rule_for(c) else {
                continue;
            };
            if rule.replacement.is_empty() {
                continue;
            }
            if ambiguous.contains(&rule.replacement.as_str()) {
                tracing::trace!(
                    replacement = %rule.replacement,
                    original = %c,
                    "skipping ambiguous replacement during decode"
                );
                continue;
            }
            out = restore(&out, rule, c);
        }
        out
    }
}

/// Replace every occurrence of `rule.replacement` with `original`,
/// consuming one surrounding space per trimmed side.
fn restore(input: &str, rule: &CharacterRule, original: char) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find(&rule.replacement) {
        let mut before = &rest[..pos];
        let after = &rest[pos + rule.replacement.len()..];

        if rule.trim_left && before.ends_with(' ') {
            before = &before[..before.len() - 1];
        }
        out.push_str(before);
        out.push(original);

        rest = if rule.trim_right && after.starts_with(' ') {
            &after[1..]
        } else {
            after
        };
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CharacterSettings;

    fn rule(
        original: char,
        replacement: &str,
        trim_left: bool,
        trim_right: bool,
    ) -> CharacterRule {
        CharacterRule {
            original,
            replacement: replacement.to_string(),
            enabled: true,
            trim_left,
            trim_right,
        }
    }

    fn settings(rules: Vec<CharacterRule>) -> CharacterSettings {
        CharacterSettings {
            enabled: true,
            rules,
        }
    }

    #[test]
    fn test_encode_basic_replacement() {
        let s = settings(vec![rule(':', "-", false, false)]);
        let codec = CharacterCodec::new(&s);
        assert_eq!(codec.encode("a:b"), "a-b");
    }

    #[test]
    fn test_encode_trim_spacing() {
        let s = settings(vec![rule('/', "-", true, true)]);
        let codec = CharacterCodec::new(&s);
        assert_eq!(codec.encode("A/B"), "A - B");
    }

    #[test]
    fn test_encode_trailing_space_suppressed_before_punctuation() {
        let s = settings(vec![rule('/', "-", false, true)]);
        let codec = CharacterCodec::new(&s);
        assert_eq!(codec.encode("a/, b"), "a-, b");
        assert_eq!(codec.encode("a/ b"), "a-  b");
    }

    #[test]
    fn test_encode_strips_leading_dot() {
        let s = settings(vec![]);
        let codec = CharacterCodec::new(&s);
        assert_eq!(codec.encode(".hidden"), "hidden");
        assert_eq!(codec.encode(". .note"), "note");
        assert_eq!(codec.encode("v1.2"), "v1.2");
    }

    #[test]
    fn test_roundtrip_with_trims() {
        let s = settings(vec![rule('/', "-", true, true), rule(':', "_", false, true)]);
        let codec = CharacterCodec::new(&s);
        let title = "Plan A/B: rollout";
        let encoded = codec.encode(title);
        assert_eq!(codec.decode(&encoded), title);
    }

    #[test]
    fn test_roundtrip_identity_on_safe_titles() {
        let s = CharacterSettings::default();
        let codec = CharacterCodec::new(&s);
        let title = "An ordinary title";
        assert_eq!(codec.encode(title), title);
        assert_eq!(codec.decode(title), title);
    }

    #[test]
    fn test_encode_idempotent() {
        let s = CharacterSettings::default();
        let codec = CharacterCodec::new(&s);
        let once = codec.encode("a/b: c?");
        assert_eq!(codec.encode(&once), once);
    }

    #[test]
    fn test_ambiguous_replacement_skipped_on_decode() {
        let s = settings(vec![rule('/', "-", false, false), rule(':', "-", false, false)]);
        let codec = CharacterCodec::new(&s);
        // Encode still works; decode cannot tell the two rules apart
        assert_eq!(codec.encode("a/b:c"), "a-b-c");
        assert_eq!(codec.decode("a-b-c"), "a-b-c");
    }

    #[test]
    fn test_disabled_rules_are_inert() {
        let mut disabled = rule('/', "-", false, false);
        disabled.enabled = false;
        let s = settings(vec![disabled]);
        let codec = CharacterCodec::new(&s);
        assert_eq!(codec.encode("a/b"), "a/b");
        assert_eq!(codec.decode("a-b"), "a-b");
    }

    #[test]
    fn test_master_switch_disables_all_rules() {
        let mut s = CharacterSettings::default();
        s.enabled = false;
        let codec = CharacterCodec::new(&s);
        assert_eq!(codec.encode("a/b"), "a/b");
    }

    #[test]
    fn test_decode_consumes_one_space_per_side() {
        let s = settings(vec![rule('/', "-", true, true)]);
        let codec = CharacterCodec::new(&s);
        // Double space came from encode inserting next to an existing one
        assert_eq!(codec.decode("A - B"), "A/B");
        assert_eq!(codec.decode("A-B"), "A/B");
    }

    #[test]
    fn test_empty_replacement_removed_on_encode_skipped_on_decode() {
        let s = settings(vec![rule('#', "", false, false)]);
        let codec = CharacterCodec::new(&s);
        assert_eq!(codec.encode("a#b"), "ab");
        assert_eq!(codec.decode("ab"), "ab");
    }

    #[test]
    fn test_default_rules_roundtrip() {
        let s = CharacterSettings::default();
        let codec = CharacterCodec::new(&s);
        let title = "Q: what about a/b?";
        let encoded = codec.encode(title);
        assert!(!encoded.contains(':'));
        assert!(!encoded.contains('/'));
        assert!(!encoded.contains('?'));
        assert_eq!(codec.decode(&encoded), title);
    }
}
