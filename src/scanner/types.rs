//! Types for the usage scanner.

use std::collections::{
    HashMap,
    HashSet,
};
use std::path::Path;

use thiserror::Error;

use crate::types::SourcePosition;

/// One recognized tagged-template accessor and its classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallForm {
    /// Accessor name the template is tagged with.
    pub tag: &'static str,
    /// Whether the accessor takes a count and selects plural forms.
    pub plural: bool,
    /// Whether the accessor preserves markup interpolations as nodes.
    pub markup: bool,
}

/// The recognized call forms. One generic visitor consults this table
/// instead of branching per accessor.
pub const CALL_FORMS: [CallForm; 4] = [
    CallForm { tag: "__", plural: false, markup: false },
    CallForm { tag: "__p", plural: true, markup: false },
    CallForm { tag: "__jsx", plural: false, markup: true },
    CallForm { tag: "__jsxp", plural: true, markup: true },
];

/// Looks up the call form for a tag name.
#[must_use]
pub fn call_form_for(tag: &str) -> Option<&'static CallForm> {
    CALL_FORMS.iter().find(|form| form.tag == tag)
}

/// Substrings whose absence proves a file contains no recognized call. The
/// scanner runs over every file on every validation, so files without any of
/// these are skipped without parsing.
const CALL_FORM_MARKERS: [&str; 4] = ["__`", "__p(", "__jsx`", "__jsxp("];

/// Fast-path check consulted before parsing a file.
#[must_use]
pub fn may_contain_calls(text: &str) -> bool {
    CALL_FORM_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Supported script languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptLanguage {
    /// Plain JavaScript (`.js`, `.cjs`, `.mjs`).
    JavaScript,
    /// JavaScript with JSX (`.jsx`).
    Jsx,
    /// TypeScript (`.ts`).
    TypeScript,
    /// TypeScript with JSX (`.tsx`).
    Tsx,
}

impl ScriptLanguage {
    /// Infers the script language from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("tsx") => Some(Self::Tsx),
            Some("ts") => Some(Self::TypeScript),
            Some("jsx") => Some(Self::Jsx),
            Some("js" | "cjs" | "mjs") => Some(Self::JavaScript),
            _ => None,
        }
    }

    /// The tree-sitter grammar for this language.
    #[must_use]
    pub fn tree_sitter_language(&self) -> tree_sitter::Language {
        match self {
            Self::JavaScript | Self::Jsx => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Where a key occurrence was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageLocation {
    /// Logical path of the source file.
    pub file: String,
    /// 1-based position of the tag node.
    pub position: SourcePosition,
}

/// Aggregated metadata for one distinct key observed in the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyUsage {
    /// Every occurrence, in encounter order. The first one is used for
    /// diagnostics.
    pub locations: Vec<UsageLocation>,
    /// True if any occurrence used a plural accessor.
    pub plural: bool,
    /// True if any occurrence used a markup-aware accessor.
    pub markup: bool,
    /// Number of interpolation slots (fixed per key, since the key encodes
    /// its slot positions).
    pub interpolation_count: usize,
    /// True only while *every* interpolation across *all* occurrences is
    /// primitive; a single markup interpolation anywhere flips it.
    pub primitive_only: bool,
}

impl KeyUsage {
    /// The first recorded occurrence, used for diagnostics.
    #[must_use]
    pub fn first_location(&self) -> Option<&UsageLocation> {
        self.locations.first()
    }
}

/// Scan results: the four per-form key sets plus the aggregated usage map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Keys used through the plain string accessor.
    pub plain_keys: HashSet<String>,
    /// Keys used through the plural accessor.
    pub plural_keys: HashSet<String>,
    /// Keys used through the markup-aware plain accessor.
    pub markup_plain_keys: HashSet<String>,
    /// Keys used through the markup-aware plural accessor.
    pub markup_plural_keys: HashSet<String>,
    /// Key → aggregated usage metadata.
    pub usages: HashMap<String, KeyUsage>,
}

impl ScanOutcome {
    /// Records one call-site occurrence.
    pub(crate) fn record(
        &mut self,
        form: &CallForm,
        key: String,
        location: UsageLocation,
        interpolation_count: usize,
        all_primitive: bool,
    ) {
        let set = match (form.plural, form.markup) {
            (false, false) => &mut self.plain_keys,
            (true, false) => &mut self.plural_keys,
            (false, true) => &mut self.markup_plain_keys,
            (true, true) => &mut self.markup_plural_keys,
        };
        set.insert(key.clone());

        let usage = self.usages.entry(key).or_insert_with(|| KeyUsage {
            locations: Vec::new(),
            plural: false,
            markup: false,
            interpolation_count,
            primitive_only: true,
        });
        usage.locations.push(location);
        usage.plural |= form.plural;
        usage.markup |= form.markup;
        // どこか一箇所でもマークアップを埋め込んでいたら偽に倒す
        usage.primitive_only &= all_primitive;
    }

    /// Merges another outcome (typically from one more file) into this one.
    pub fn merge(&mut self, other: Self) {
        self.plain_keys.extend(other.plain_keys);
        self.plural_keys.extend(other.plural_keys);
        self.markup_plain_keys.extend(other.markup_plain_keys);
        self.markup_plural_keys.extend(other.markup_plural_keys);

        for (key, usage) in other.usages {
            match self.usages.entry(key) {
                std::collections::hash_map::Entry::Occupied(mut entry) => {
                    let existing = entry.get_mut();
                    existing.locations.extend(usage.locations);
                    existing.plural |= usage.plural;
                    existing.markup |= usage.markup;
                    existing.primitive_only &= usage.primitive_only;
                }
                std::collections::hash_map::Entry::Vacant(entry) => {
                    entry.insert(usage);
                }
            }
        }
    }

    /// All keys a locale file is required to carry: plain string keys plus
    /// plural keys (plural keys are required even in the default locale).
    #[must_use]
    pub fn required_keys(&self) -> HashSet<String> {
        let mut keys: HashSet<String> = self.plain_keys.union(&self.plural_keys).cloned().collect();
        keys.extend(self.markup_plain_keys.iter().cloned());
        keys.extend(self.markup_plural_keys.iter().cloned());
        keys
    }

    /// True if the key is used through any plural accessor.
    #[must_use]
    pub fn is_plural_key(&self, key: &str) -> bool {
        self.plural_keys.contains(key) || self.markup_plural_keys.contains(key)
    }
}

/// Errors raised while scanning a single source file.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Failed to set the tree-sitter language for the parser.
    #[error("Failed to set language for parser: {0}")]
    LanguageSetup(#[from] tree_sitter::LanguageError),
    /// Tree-sitter could not produce a tree for the file.
    #[error("Failed to parse source code")]
    ParseFailed,
}
