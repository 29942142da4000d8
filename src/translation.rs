//! Translation value model.
//!
//! A locale file is a flat map from translation key to one of three value
//! shapes: a plain string, `null` (explicitly pending translation), or a
//! plural record. The shapes form a closed sum so every consumer matches
//! exhaustively instead of sniffing JSON types at runtime.

use std::collections::HashMap;

use serde::{
    Deserialize,
    Serialize,
};

/// Keys with special meaning inside locale files. None of them is a real
/// translation entry.
pub mod reserved {
    /// Empty-string key fixed at the very end of every serialized file; a
    /// stable trailing anchor that keeps diffs small.
    pub const ANCHOR_KEY: &str = "";

    /// Opens a block of newly-discovered, not-yet-translated keys.
    pub const MISSING_START: &str = "👇 missing start 👇";

    /// Closes the block opened by [`MISSING_START`].
    pub const MISSING_END: &str = "👆 missing end 👆";

    /// Returns true for the anchor and marker keys.
    #[must_use]
    pub fn is_reserved(key: &str) -> bool {
        key == ANCHOR_KEY || is_marker(key)
    }

    /// Returns true for the missing-block marker keys.
    #[must_use]
    pub fn is_marker(key: &str) -> bool {
        key == MISSING_START || key == MISSING_END
    }
}

/// Plural forms for one translation key.
///
/// `+2` is the universal fallback form and is required in every locale file;
/// only the designated default locale may carry it as `null` pending
/// translation. `#` inside the `+2` form is replaced by the count when the
/// form is selected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluralRecord {
    /// Exact-zero form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zero: Option<String>,

    /// Exact-one form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one: Option<String>,

    /// Large-count form, applicable when the count exceeds `many_limit`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub many: Option<String>,

    /// Threshold above which `many` applies. Only meaningful together with
    /// `many`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub many_limit: Option<i64>,

    /// Universal fallback form. Serialized even when `null` so the pending
    /// state stays visible in the file.
    #[serde(rename = "+2")]
    pub two_plus: Option<String>,
}

/// One translation entry in a locale table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranslationValue {
    /// A plural record (JSON object).
    Plural(PluralRecord),
    /// A plain translated string.
    Text(String),
    /// Explicitly pending translation (JSON `null`).
    Pending,
}

impl TranslationValue {
    /// Returns the plain string, if this value is one.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Plural(_) | Self::Pending => None,
        }
    }

    /// Returns the plural record, if this value is one.
    #[must_use]
    pub const fn as_plural(&self) -> Option<&PluralRecord> {
        match self {
            Self::Plural(record) => Some(record),
            Self::Text(_) | Self::Pending => None,
        }
    }
}

/// An in-memory locale table: the runtime resolver's view of one loaded
/// locale. Populated by a locale-loading collaborator and replaced
/// wholesale on locale switch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleTable {
    /// Locale id, e.g. `"en"` or `"ja-JP"`.
    pub locale: String,

    /// Key → value mapping. Reserved keys are filtered out at load.
    entries: HashMap<String, TranslationValue>,
}

impl LocaleTable {
    /// Builds a table from raw entries, dropping reserved keys.
    #[must_use]
    pub fn new(locale: impl Into<String>, entries: HashMap<String, TranslationValue>) -> Self {
        let entries =
            entries.into_iter().filter(|(key, _)| !reserved::is_reserved(key)).collect();
        Self { locale: locale.into(), entries }
    }

    /// Parses a flat locale JSON document into a table.
    ///
    /// # Errors
    /// Returns the underlying serde error when the document is not a flat
    /// object of translation values.
    pub fn from_json_str(locale: impl Into<String>, json: &str) -> Result<Self, serde_json::Error> {
        let entries: HashMap<String, TranslationValue> = serde_json::from_str(json)?;
        Ok(Self::new(locale, entries))
    }

    /// Looks up a translation value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TranslationValue> {
        self.entries.get(key)
    }

    /// Number of real (non-reserved) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
