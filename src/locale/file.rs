//! Ordered locale file parsing and serialization.

use std::collections::HashSet;
use std::path::{
    Path,
    PathBuf,
};

use jsonc_parser::ast::{
    ObjectPropName,
    Value as AstValue,
};
use jsonc_parser::{
    CollectOptions,
    ParseOptions,
    parse_to_ast,
};
use thiserror::Error;

use crate::translation::{
    LocaleTable,
    PluralRecord,
    TranslationValue,
    reserved,
};

/// Plural record members accepted by the schema.
const PLURAL_MEMBERS: [&str; 5] = ["zero", "one", "many", "manyLimit", "+2"];

/// One schema violation inside a locale file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{key}': {message}")]
pub struct SchemaIssue {
    /// The offending translation key (or `"<root>"` for document-level
    /// problems).
    pub key: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl SchemaIssue {
    /// Creates an issue for `key`.
    #[must_use]
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self { key: key.into(), message: message.into() }
    }
}

/// Errors raised while reading or writing a locale file.
#[derive(Error, Debug)]
pub enum LocaleFileError {
    /// The file could not be read or written.
    #[error("Failed to access locale file: {0}")]
    Io(#[from] std::io::Error),

    /// The text is not parseable JSON.
    #[error("Failed to parse locale JSON: {0}")]
    Json(String),

    /// The JSON parsed but does not conform to the locale schema. Terminal
    /// for the file; the fix engine never auto-repairs format errors.
    #[error("Locale file fails schema validation:\n{}", format_schema_issues(.0))]
    Schema(Vec<SchemaIssue>),

    /// A value could not be serialized back to JSON.
    #[error("Failed to serialize locale value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Formats schema issues numbered, one per line.
fn format_schema_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .enumerate()
        .map(|(i, issue)| format!("  {}. {issue}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One parsed locale file with its key order preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleFile {
    /// Path the file was read from.
    pub path: PathBuf,
    /// Locale id (file stem, e.g. `"en"`).
    pub locale: String,
    /// Real entries in file order; reserved keys are excluded.
    pub entries: Vec<(String, TranslationValue)>,
    /// Whether the file contained missing-block marker keys.
    pub has_markers: bool,
}

impl LocaleFile {
    /// The file's real key set.
    #[must_use]
    pub fn key_set(&self) -> HashSet<String> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Looks up an entry by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TranslationValue> {
        self.entries.iter().find(|(entry_key, _)| entry_key == key).map(|(_, value)| value)
    }

    /// True when the file consists solely of marker keys, a legacy state
    /// that must be reported as "has missing translations", never as clean.
    #[must_use]
    pub fn is_marker_only(&self) -> bool {
        self.has_markers && self.entries.is_empty()
    }

    /// Converts to a runtime lookup table.
    #[must_use]
    pub fn to_table(&self) -> LocaleTable {
        LocaleTable::new(self.locale.clone(), self.entries.iter().cloned().collect())
    }
}

/// Parses locale file text into ordered entries, validating the value
/// schema.
///
/// # Errors
/// Returns `Json` for unparseable text and `Schema` (with every violation
/// collected) when a value is not a string, `null`, or a well-formed plural
/// record.
pub fn parse_locale_text(
    path: &Path,
    is_default_locale: bool,
    text: &str,
) -> Result<LocaleFile, LocaleFileError> {
    let parsed = parse_to_ast(text, &CollectOptions::default(), &ParseOptions::default())
        .map_err(|error| LocaleFileError::Json(error.to_string()))?;

    let Some(AstValue::Object(root)) = parsed.value else {
        return Err(LocaleFileError::Schema(vec![SchemaIssue::new(
            "<root>",
            "locale file must be a JSON object",
        )]));
    };

    let locale = path.file_stem().map(|stem| stem.to_string_lossy().to_string());
    let locale = locale.unwrap_or_else(|| "unknown".to_string());

    let mut entries = Vec::new();
    let mut has_markers = false;
    let mut issues = Vec::new();

    for prop in root.properties {
        let key = match &prop.name {
            ObjectPropName::String(lit) => lit.value.to_string(),
            ObjectPropName::Word(word) => word.value.to_string(),
        };

        if reserved::is_marker(&key) {
            has_markers = true;
            continue;
        }
        if key == reserved::ANCHOR_KEY {
            continue;
        }

        match convert_value(&key, &prop.value, is_default_locale) {
            Ok(value) => entries.push((key, value)),
            Err(issue) => issues.push(issue),
        }
    }

    if issues.is_empty() {
        Ok(LocaleFile { path: path.to_path_buf(), locale, entries, has_markers })
    } else {
        Err(LocaleFileError::Schema(issues))
    }
}

/// Converts one JSON value to a [`TranslationValue`], enforcing the schema.
fn convert_value(
    key: &str,
    value: &AstValue<'_>,
    is_default_locale: bool,
) -> Result<TranslationValue, SchemaIssue> {
    match value {
        AstValue::StringLit(lit) => Ok(TranslationValue::Text(lit.value.to_string())),
        AstValue::NullKeyword(_) => Ok(TranslationValue::Pending),
        AstValue::Object(object) => {
            convert_plural(key, object, is_default_locale).map(TranslationValue::Plural)
        }
        AstValue::Array(_) => Err(SchemaIssue::new(key, "arrays are not valid translation values")),
        AstValue::NumberLit(_) | AstValue::BooleanLit(_) => {
            Err(SchemaIssue::new(key, "value must be a string, null, or a plural object"))
        }
    }
}

/// Converts a JSON object to a [`PluralRecord`], enforcing member names,
/// member types, and the `+2` invariant.
fn convert_plural(
    key: &str,
    object: &jsonc_parser::ast::Object<'_>,
    is_default_locale: bool,
) -> Result<PluralRecord, SchemaIssue> {
    let mut record = PluralRecord::default();
    let mut two_plus_present = false;

    for prop in &object.properties {
        let member = match &prop.name {
            ObjectPropName::String(lit) => lit.value.to_string(),
            ObjectPropName::Word(word) => word.value.to_string(),
        };

        if !PLURAL_MEMBERS.contains(&member.as_str()) {
            return Err(SchemaIssue::new(key, format!("unknown plural member '{member}'")));
        }

        match (member.as_str(), &prop.value) {
            ("manyLimit", AstValue::NumberLit(number)) => {
                let Ok(limit) = number.value.parse::<i64>() else {
                    return Err(SchemaIssue::new(key, "'manyLimit' must be an integer"));
                };
                record.many_limit = Some(limit);
            }
            ("manyLimit", _) => {
                return Err(SchemaIssue::new(key, "'manyLimit' must be an integer"));
            }
            ("+2", AstValue::StringLit(lit)) => {
                two_plus_present = true;
                record.two_plus = Some(lit.value.to_string());
            }
            ("+2", AstValue::NullKeyword(_)) => {
                // デフォルトロケールのみ null の +2 を許容する
                if !is_default_locale {
                    return Err(SchemaIssue::new(
                        key,
                        "'+2' may be null only in the default locale",
                    ));
                }
                two_plus_present = true;
            }
            ("zero", AstValue::StringLit(lit)) => record.zero = Some(lit.value.to_string()),
            ("one", AstValue::StringLit(lit)) => record.one = Some(lit.value.to_string()),
            ("many", AstValue::StringLit(lit)) => record.many = Some(lit.value.to_string()),
            ("zero" | "one" | "many", AstValue::NullKeyword(_)) => {}
            (member, _) => {
                return Err(SchemaIssue::new(key, format!("'{member}' must be a string")));
            }
        }
    }

    if two_plus_present {
        Ok(record)
    } else {
        Err(SchemaIssue::new(key, "plural object is missing the required '+2' form"))
    }
}

/// Serializes ordered entries as the canonical locale file text: 2-space
/// indentation, plural members on their own lines, trailing newline.
///
/// The caller supplies the complete entry list, including markers and the
/// trailing anchor; this function imposes no ordering of its own.
///
/// # Errors
/// Returns a serialization error if a value cannot be rendered as JSON.
pub fn render_entries(
    entries: &[(String, TranslationValue)],
) -> Result<String, LocaleFileError> {
    let mut out = String::from("{");
    let mut first = true;

    for (key, value) in entries {
        if !first {
            out.push(',');
        }
        first = false;

        out.push('\n');
        out.push_str("  ");
        out.push_str(&serde_json::to_string(key)?);
        out.push_str(": ");

        let rendered = match value {
            TranslationValue::Pending => "null".to_string(),
            TranslationValue::Text(text) => serde_json::to_string(text)?,
            TranslationValue::Plural(record) => {
                // 2スペースのネストへ揃える
                serde_json::to_string_pretty(record)?.replace('\n', "\n  ")
            }
        };
        out.push_str(&rendered);
    }

    out.push_str("\n}\n");
    Ok(out)
}

/// Reads and parses one locale file.
///
/// # Errors
/// Propagates I/O, JSON, and schema errors.
pub async fn read_locale_file(
    path: &Path,
    is_default_locale: bool,
) -> Result<LocaleFile, LocaleFileError> {
    let text = tokio::fs::read_to_string(path).await?;
    parse_locale_text(path, is_default_locale, &text)
}

/// Writes rendered entries back to a locale file.
///
/// # Errors
/// Propagates serialization and I/O errors.
pub async fn write_locale_file(
    path: &Path,
    entries: &[(String, TranslationValue)],
) -> Result<(), LocaleFileError> {
    let text = render_entries(entries)?;
    tokio::fs::write(path, text).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn parse(text: &str) -> Result<LocaleFile, LocaleFileError> {
        parse_locale_text(Path::new("/locales/fr.json"), false, text)
    }

    #[googletest::test]
    fn test_parse_preserves_entry_order() {
        let file = parse(r#"{"b": "B", "a": "A", "c": null}"#).unwrap();

        assert_that!(
            file.entries,
            elements_are![
                eq(&("b".to_string(), TranslationValue::Text("B".to_string()))),
                eq(&("a".to_string(), TranslationValue::Text("A".to_string()))),
                eq(&("c".to_string(), TranslationValue::Pending)),
            ]
        );
        expect_that!(file.locale, eq("fr"));
    }

    #[googletest::test]
    fn test_parse_plural_record() {
        let file = parse(r##"{"# files": {"one": "1 fichier", "+2": "# fichiers"}}"##).unwrap();

        let record = file.get("# files").and_then(TranslationValue::as_plural).unwrap();
        expect_that!(record.one, some(eq("1 fichier")));
        expect_that!(record.two_plus, some(eq("# fichiers")));
    }

    #[googletest::test]
    fn test_parse_skips_reserved_keys() {
        let text = r#"{"Hello": "Bonjour", "👇 missing start 👇": "", "Bye": null, "👆 missing end 👆": "", "": ""}"#;
        let file = parse(text).unwrap();

        expect_that!(file.entries, len(eq(2)));
        expect_that!(file.has_markers, eq(true));
        expect_that!(file.is_marker_only(), eq(false));
    }

    #[googletest::test]
    fn test_marker_only_file_is_flagged() {
        let file = parse(r#"{"👇 missing start 👇": ""}"#).unwrap();

        assert_that!(file.is_marker_only(), eq(true));
    }

    #[rstest]
    #[case::array_value(r#"{"k": ["a"]}"#, "arrays are not valid")]
    #[case::number_value(r#"{"k": 42}"#, "must be a string, null, or a plural object")]
    #[case::missing_two_plus(r#"{"k": {"one": "1"}}"#, "missing the required '+2' form")]
    #[case::unknown_member(r##"{"k": {"+2": "#", "three": "?"}}"##, "unknown plural member")]
    #[case::bad_many_limit(r##"{"k": {"+2": "#", "manyLimit": "10"}}"##, "'manyLimit' must be an integer")]
    #[case::null_two_plus_non_default(r#"{"k": {"+2": null}}"#, "only in the default locale")]
    fn test_schema_violations(#[case] text: &str, #[case] expected_fragment: &str) {
        let error = parse(text).unwrap_err();

        match error {
            LocaleFileError::Schema(issues) => {
                assert_that!(
                    issues,
                    elements_are![field!(
                        SchemaIssue.message,
                        contains_substring(expected_fragment)
                    )]
                );
            }
            other => panic!("expected schema error, got {other}"),
        }
    }

    #[googletest::test]
    fn test_null_two_plus_allowed_in_default_locale() {
        let file = parse_locale_text(
            Path::new("/locales/en.json"),
            true,
            r##"{"# files": {"+2": null}}"##,
        )
        .unwrap();

        let record = file.get("# files").and_then(TranslationValue::as_plural).unwrap();
        assert_that!(record.two_plus, none());
    }

    #[googletest::test]
    fn test_non_object_root_is_schema_error() {
        let error = parse(r#"["not", "an", "object"]"#).unwrap_err();

        match error {
            LocaleFileError::Schema(issues) => {
                assert_that!(issues, elements_are![field!(SchemaIssue.key, eq("<root>"))]);
            }
            other => panic!("expected schema error, got {other}"),
        }
    }

    #[googletest::test]
    fn test_unparseable_json_is_json_error() {
        let error = parse("{ not json").unwrap_err();

        assert_that!(format!("{error}"), contains_substring("Failed to parse locale JSON"));
    }

    #[googletest::test]
    fn test_render_entries_canonical_layout() {
        let entries = vec![
            ("Hello World".to_string(), TranslationValue::Pending),
            (
                "# files".to_string(),
                TranslationValue::Plural(PluralRecord {
                    one: Some("1 x".to_string()),
                    two_plus: Some("# x".to_string()),
                    ..PluralRecord::default()
                }),
            ),
            (String::new(), TranslationValue::Text(String::new())),
        ];

        let text = render_entries(&entries).unwrap();

        assert_that!(
            text,
            eq(concat!(
                "{\n",
                "  \"Hello World\": null,\n",
                "  \"# files\": {\n",
                "    \"one\": \"1 x\",\n",
                "    \"+2\": \"# x\"\n",
                "  },\n",
                "  \"\": \"\"\n",
                "}\n",
            ))
        );
    }

    #[googletest::test]
    fn test_render_then_parse_round_trips() {
        let entries = vec![
            ("a".to_string(), TranslationValue::Text("A".to_string())),
            ("b".to_string(), TranslationValue::Pending),
        ];

        let text = render_entries(&entries).unwrap();
        let file = parse(&text).unwrap();

        assert_that!(file.entries, eq(&entries));
    }

    #[googletest::test]
    fn test_render_is_deterministic() {
        let entries =
            vec![("Hello".to_string(), TranslationValue::Text("Bonjour".to_string()))];

        assert_that!(render_entries(&entries).unwrap(), eq(&render_entries(&entries).unwrap()));
    }
}
