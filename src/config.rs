//! Run context and the primitive type table.
//!
//! The context is built once per run and only ever borrowed. Stages report
//! findings by returning values, never by mutating shared state.
use std::collections::BTreeMap;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ConfigError;

// ------------------------------- Policy ---------------------------------- //

pub const DEFAULT_NAMESPACE: &str = "love";

const PRIMITIVES: &[&str] = &[
    "nil", "any", "boolean", "number", "integer", "string", "table",
    "function", "userdata", "lightuserdata", "thread", "cdata",
];

const ALIASES: &[(&str, &str)] = &[
    ("bool", "boolean"),
    ("int", "integer"),
    ("value", "any"),
    ("mixed", "any"),
    ("Variant", "any"),
];

const MULTI_WORD: &[(&str, &str)] = &[
    ("light userdata", "lightuserdata"),
    ("full userdata", "userdata"),
];

// ------------------------------ Type table -------------------------------- //

/// Auditable classification table shared by the normalizer and validator.
#[derive(Debug, Clone)]
pub struct TypeTable {
    primitives: Vec<String>,
    aliases: BTreeMap<String, String>,
    /// Multi-word name → rendered spelling, in declaration order.
    multi_word: IndexMap<String, String>,
    pub complete_fragments: bool,
}

/// What a word sequence means according to the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    Primitive(String),
    /// Proper word-prefix of multi-word names; `completions` lists the full names.
    Fragment { completions: Vec<String> },
    Unknown,
}

/// On-disk shape of `--type-table`; absent keys keep the built-ins.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeTableFile {
    primitives: Option<Vec<String>>,
    aliases: Option<BTreeMap<String, String>>,
    multi_word: Option<IndexMap<String, String>>,
    complete_fragments: Option<bool>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self {
            primitives: PRIMITIVES.iter().map(|s| s.to_string()).collect(),
            aliases: ALIASES.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            multi_word: MULTI_WORD.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            complete_fragments: true,
        }
    }
}

impl TypeTable {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&source).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_json(source: &str) -> Result<Self, String> {
        let file: TypeTableFile = serde_json::from_str(source).map_err(|e| e.to_string())?;
        let mut table = Self::default();
        if let Some(xs) = file.primitives { table.primitives = xs; }
        if let Some(xs) = file.aliases { table.aliases = xs; }
        if let Some(xs) = file.multi_word {
            table.multi_word = xs.into_iter()
                .map(|(k, v)| (normalize_words(&k), v))
                .collect();
        }
        if let Some(flag) = file.complete_fragments { table.complete_fragments = flag; }
        Ok(table)
    }

    /// Classify a word sequence (already split on whitespace, joined by one space).
    pub fn classify(&self, phrase: &str) -> Classified {
        if let Some(rendered) = self.multi_word.get(phrase) {
            return Classified::Primitive(rendered.clone());
        }
        if self.primitives.iter().any(|p| p == phrase) {
            return Classified::Primitive(phrase.to_string());
        }
        if let Some(target) = self.aliases.get(phrase) {
            return Classified::Primitive(target.clone());
        }
        let completions = self.completions_of(phrase);
        if !completions.is_empty() {
            return Classified::Fragment { completions };
        }
        Classified::Unknown
    }

    /// Rendered spelling of a multi-word name.
    pub fn rendered_multi_word(&self, name: &str) -> Option<&str> {
        self.multi_word.get(name).map(String::as_str)
    }

    /// Every proper word-prefix of every multi-word name, with its possible completions.
    pub fn fragments(&self) -> BTreeMap<String, Vec<String>> {
        let mut out = BTreeMap::<String, Vec<String>>::new();
        for name in self.multi_word.keys() {
            let words: Vec<&str> = name.split(' ').collect();
            for n in 1..words.len() {
                out.entry(words[..n].join(" ")).or_default().push(name.clone());
            }
        }
        out
    }

    fn completions_of(&self, phrase: &str) -> Vec<String> {
        let prefix = format!("{phrase} ");
        self.multi_word.keys()
            .filter(|name| name.starts_with(&prefix))
            .cloned()
            .collect()
    }
}

/// Collapse runs of whitespace into single spaces.
pub fn normalize_words(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ——————————————————————————————— Run context ———————————————————————————————

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub namespace: String,
    pub verbose: bool,
    pub type_table: TypeTable,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            verbose: false,
            type_table: TypeTable::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_builtins() {
        let t = TypeTable::default();
        assert_eq!(t.classify("number"), Classified::Primitive("number".into()));
        assert_eq!(t.classify("bool"), Classified::Primitive("boolean".into()));
        assert_eq!(t.classify("light userdata"), Classified::Primitive("lightuserdata".into()));
        assert_eq!(t.classify("Image"), Classified::Unknown);
    }

    #[test]
    fn fragments_are_proper_word_prefixes() {
        let t = TypeTable::default();
        assert_eq!(
            t.classify("light"),
            Classified::Fragment { completions: vec!["light userdata".into()] }
        );
        let frags = t.fragments();
        assert!(frags.contains_key("light"));
        assert!(frags.contains_key("full"));
        assert!(!frags.contains_key("userdata"));
        assert!(!frags.contains_key("light userdata"));
    }

    #[test]
    fn table_file_overrides_only_given_keys() {
        let t = TypeTable::from_json(
            r#"{"multi_word": {"raw  memory handle": "lightuserdata"}, "complete_fragments": false}"#,
        ).unwrap();
        assert!(!t.complete_fragments);
        assert_eq!(t.classify("number"), Classified::Primitive("number".into()));
        assert_eq!(t.classify("raw memory handle"), Classified::Primitive("lightuserdata".into()));
        let frags = t.fragments();
        assert!(frags.contains_key("raw"));
        assert!(frags.contains_key("raw memory"));
        assert!(!frags.contains_key("light"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(TypeTable::from_json(r#"{"primitve": []}"#).is_err());
    }
}
