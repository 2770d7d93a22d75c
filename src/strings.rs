//! Localized string tables
//!
//! The game ships its display names in a gettext template where each entry's
//! `msgctxt` is the key referenced by element definitions and `msgid` holds
//! the English text, often wrapped in `<link="...">` style markup.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("entity pattern is valid")
});
static POT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(msgctxt|msgid|msgstr)?\s*"((?:[^"\\]|\\.)*)"\s*$"#).expect("pot pattern is valid"));

/// Remove markup tags, keeping the text between them, and decode character entities.
///
/// Unrecognized entities are left as written.
pub fn strip_markup(text: &str) -> Cow<'_, str> {
    let stripped = MARKUP.replace_all(text, "");
    if !ENTITY.is_match(&stripped) {
        return stripped;
    }
    let decoded = ENTITY.replace_all(&stripped, |cap: &Captures| {
        decode_entity(&cap[1]).map_or_else(|| cap[0].to_string(), String::from)
    });
    Cow::Owned(decoded.into_owned())
}

fn decode_entity(name: &str) -> Option<char> {
    let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = name.strip_prefix('#') {
        dec.parse().ok()?
    } else {
        return match name {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => None,
        };
    };
    char::from_u32(code)
}

/// Key to text mapping, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the raw text for `key`.
    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        let key = key.into();
        let text = text.into();
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = text,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, text));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display text for `key` with markup removed.
    pub fn get(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get_raw(key).map(strip_markup)
    }

    /// Text for `key` exactly as it appears in the source.
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.entries[i].1.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// `(key, stripped text)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Cow<'_, str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), strip_markup(v)))
    }

    /// Read `msgctxt`/`msgid` pairs from a gettext template.
    ///
    /// Each entry ends at its `msgstr`. Entries without a `msgctxt` are
    /// skipped. Continuation lines (a bare quoted string) extend whichever
    /// field preceded them.
    pub fn from_pot(text: &str) -> Self {
        #[derive(Clone, Copy, PartialEq)]
        enum Field {
            Context,
            Id,
            Other,
        }

        let mut table = StringTable::new();
        let mut context: Option<String> = None;
        let mut id: Option<String> = None;
        let mut field = Field::Other;

        let mut flush = |context: &mut Option<String>, id: &mut Option<String>| {
            if let (Some(key), Some(text)) = (context.take(), id.take()) {
                table.insert(key, text);
            }
        };

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some(cap) = POT_LINE.captures(line) else {
                continue;
            };
            let value = unescape(&cap[2]);

            match cap.get(1).map(|m| m.as_str()) {
                Some("msgctxt") => {
                    flush(&mut context, &mut id);
                    context = Some(value);
                    field = Field::Context;
                }
                Some("msgid") => {
                    if id.is_some() {
                        flush(&mut context, &mut id);
                    }
                    id = Some(value);
                    field = Field::Id;
                }
                Some(_) => {
                    flush(&mut context, &mut id);
                    field = Field::Other;
                }
                None => match field {
                    Field::Context => context.get_or_insert_with(String::new).push_str(&value),
                    Field::Id => id.get_or_insert_with(String::new).push_str(&value),
                    Field::Other => {}
                },
            }
        }
        flush(&mut context, &mut id);

        table
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StringTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = StringTable::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len() {
        assert_eq!(StringTable::new().len(), 0);
        assert!(StringTable::new().is_empty());
        assert_eq!(StringTable::from_iter([("foo", "bar")]).len(), 1);
    }

    #[test]
    fn test_keys_keep_insertion_order() {
        let table = StringTable::from_iter([("foo", "bar"), ("baz", "quux")]);
        assert_eq!(table.keys().collect::<Vec<_>>(), ["foo", "baz"]);
    }

    #[test]
    fn test_get_strips_markup() {
        let table = StringTable::from_iter([("foo", "<xml>bar</xml>")]);
        assert_eq!(table.get("foo").as_deref(), Some("bar"));
        assert_eq!(table.get("missing"), None);
    }

    #[test]
    fn test_get_raw() {
        let table = StringTable::from_iter([("foo", "<xml>bar</xml>")]);
        assert_eq!(table.get_raw("foo"), Some("<xml>bar</xml>"));
        assert_eq!(table.get_raw("missing"), None);
    }

    #[test]
    fn test_from_pot() {
        let pot = r#"
# header
msgid ""
msgstr ""

#. STRINGS.ELEMENTS.WATER.NAME
msgctxt "STRINGS.ELEMENTS.WATER.NAME"
msgid "<link=\"WATER\">Water</link>"
msgstr ""

msgctxt "STRINGS.ELEMENTS.WATER.DESC"
msgid "Clean "
"water."
msgstr ""
"#;
        let table = StringTable::from_pot(pot);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("STRINGS.ELEMENTS.WATER.NAME").as_deref(), Some("Water"));
        assert_eq!(
            table.get_raw("STRINGS.ELEMENTS.WATER.NAME"),
            Some(r#"<link="WATER">Water</link>"#)
        );
        assert_eq!(table.get("STRINGS.ELEMENTS.WATER.DESC").as_deref(), Some("Clean water."));
    }

    #[test]
    fn test_from_pot_entry_without_context() {
        let pot = r#"
msgctxt "STRINGS.ELEMENTS.ICE.NAME"
msgid "Ice"
msgstr ""

msgid "Untranslated"
msgstr ""

msgctxt "STRINGS.ELEMENTS.STEAM.NAME"
msgid "Steam"
msgstr ""
"#;
        let table = StringTable::from_pot(pot);
        assert_eq!(table.keys().collect::<Vec<_>>(), ["STRINGS.ELEMENTS.ICE.NAME", "STRINGS.ELEMENTS.STEAM.NAME"]);
        assert_eq!(table.get("STRINGS.ELEMENTS.ICE.NAME").as_deref(), Some("Ice"));
        assert_eq!(table.get("STRINGS.ELEMENTS.STEAM.NAME").as_deref(), Some("Steam"));
    }

    #[test]
    fn test_from_pot_context_only_entry_does_not_leak() {
        let pot = "msgctxt \"A\"\nmsgstr \"\"\n\nmsgid \"Orphan\"\nmsgstr \"\"\n";
        assert!(StringTable::from_pot(pot).is_empty());
    }

    #[test]
    fn test_strip_markup_decodes_entities() {
        assert_eq!(strip_markup("<b>Salt &amp; Pepper</b>"), "Salt & Pepper");
        assert_eq!(strip_markup("&lt;x&gt; &#65;&#x42; &quot;q&apos;"), "<x> AB \"q'");
        assert_eq!(strip_markup("&bogus; &#xZZ;"), "&bogus; &#xZZ;");
        assert!(matches!(strip_markup("plain"), Cow::Borrowed("plain")));
    }
}
