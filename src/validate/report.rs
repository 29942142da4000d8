//! Validation diagnostics and report rendering.

use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};

use crate::scanner::UsageLocation;

/// Severity assigned to a lint rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Rule disabled; produces nothing.
    Off,
    /// Reported but never fails the run.
    #[default]
    Warning,
    /// Reported and fails the run.
    Error,
}

/// The secondary lint rules, applied over the fully aggregated usage and
/// locale data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LintRule {
    /// A used key whose translation is identical in every locale.
    ConstantTranslation,
    /// A plural record that only ever uses the `+2` form without a count.
    UnnecessaryPlural,
    /// A markup-aware call with no interpolations at all.
    MarkupWithoutInterpolation,
    /// A markup-aware call whose interpolations are all primitive.
    MarkupWithoutRealNodes,
    /// Untranslatable fixed text around a key's single interpolation.
    RedundantAffix,
    /// A key longer than the configured threshold.
    MaxKeyLength,
}

impl LintRule {
    /// Every rule, in reporting order.
    pub const ALL: [Self; 6] = [
        Self::ConstantTranslation,
        Self::UnnecessaryPlural,
        Self::MarkupWithoutInterpolation,
        Self::MarkupWithoutRealNodes,
        Self::RedundantAffix,
        Self::MaxKeyLength,
    ];

    /// Kebab-case rule name used in reports and the CLI severity map.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ConstantTranslation => "constant-translation",
            Self::UnnecessaryPlural => "unnecessary-plural",
            Self::MarkupWithoutInterpolation => "markup-without-interpolation",
            Self::MarkupWithoutRealNodes => "markup-without-real-nodes",
            Self::RedundantAffix => "redundant-affix",
            Self::MaxKeyLength => "max-key-length",
        }
    }

    /// Parses a rule from its kebab-case name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rule| rule.name() == name)
    }

    /// Default severity when the CLI supplies no override.
    #[must_use]
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::ConstantTranslation => Severity::Error,
            Self::UnnecessaryPlural
            | Self::MarkupWithoutInterpolation
            | Self::MarkupWithoutRealNodes
            | Self::RedundantAffix
            | Self::MaxKeyLength => Severity::Warning,
        }
    }
}

/// One lint diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintDiagnostic {
    /// The rule that produced it.
    pub rule: LintRule,
    /// Effective severity (never `Off`).
    pub severity: Severity,
    /// The offending key.
    pub key: String,
    /// Human-readable description.
    pub message: String,
    /// First usage location of the key, when known.
    pub location: Option<UsageLocation>,
}

/// Reconciliation states of one locale file. A file can be in several at
/// once; an empty list means up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleState {
    /// Required keys are absent (or pending where a value is required).
    HasMissing,
    /// Keys no usage accounts for.
    HasExtra,
    /// Plural/plain value shape contradicts the usage.
    HasInvalidPluralShape,
    /// A special (`$`/`~~`) key whose value still equals the key itself.
    HasInvalidSpecial,
    /// Schema validation failed; terminal for the file.
    InvalidFormat,
}

impl LocaleState {
    /// Short label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HasMissing => "missing translations",
            Self::HasExtra => "extra keys",
            Self::HasInvalidPluralShape => "invalid plural shapes",
            Self::HasInvalidSpecial => "untranslated special keys",
            Self::InvalidFormat => "invalid format",
        }
    }
}

/// Reconciliation outcome for one locale file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// The locale file path.
    pub path: PathBuf,
    /// Locale id.
    pub locale: String,
    /// States the file is in; empty when up to date.
    pub states: Vec<LocaleState>,
    /// Keys required but absent or pending.
    pub missing: Vec<String>,
    /// Keys present but unused.
    pub extra: Vec<String>,
    /// Keys whose value shape contradicts their usage.
    pub invalid_plural: Vec<String>,
    /// Special keys whose value equals the key itself.
    pub invalid_special: Vec<String>,
    /// Schema failure description, if the file is unprocessable.
    pub format_error: Option<String>,
    /// Whether fix mode rewrote the file.
    pub fixed: bool,
}

impl FileReport {
    /// True when the file needs no attention.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.states.is_empty()
    }
}

/// Aggregated result of one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationSummary {
    /// Per-locale-file reports, in directory-scan order.
    pub files: Vec<FileReport>,
    /// Lint diagnostics (severity `Off` already filtered out).
    pub lints: Vec<LintDiagnostic>,
    /// Number of source files scanned.
    pub scanned_files: usize,
}

impl ValidationSummary {
    /// True when every file is clean (or fixed) and no error-severity lint
    /// fired.
    #[must_use]
    pub fn passed(&self) -> bool {
        let files_ok = self.files.iter().all(|file| file.is_clean() || file.fixed);
        let lints_ok = self.lints.iter().all(|lint| lint.severity != Severity::Error);
        files_ok && lints_ok
    }

    /// Renders the line-by-line report.
    #[must_use]
    pub fn render(&self, color: bool) -> String {
        let paint = Paint::new(color);
        let mut lines = Vec::new();

        for file in &self.files {
            lines.extend(render_file(file, paint));
        }

        for lint in &self.lints {
            let severity = match lint.severity {
                Severity::Error => paint.error("error"),
                Severity::Warning | Severity::Off => paint.warn("warning"),
            };
            let location = lint
                .location
                .as_ref()
                .map(|location| format!(" ({}:{})", location.file, location.position))
                .unwrap_or_default();
            lines.push(format!("{severity}[{}]: {}{location}", lint.rule.name(), lint.message));
        }

        let verdict = if self.passed() {
            paint.ok(&format!("OK ({} source files scanned)", self.scanned_files))
        } else {
            paint.error(&format!("FAILED ({} source files scanned)", self.scanned_files))
        };
        lines.push(verdict);

        lines.join("\n")
    }
}

/// Report lines for one locale file.
fn render_file(file: &FileReport, paint: Paint) -> Vec<String> {
    let name = file.path.display();
    let mut lines = Vec::new();

    if file.is_clean() {
        lines.push(format!("{name}: {}", paint.ok("up to date")));
        return lines;
    }

    let states: Vec<&str> = file.states.iter().map(|state| state.label()).collect();
    let verb = if file.fixed { paint.ok("fixed") } else { paint.error("error") };
    lines.push(format!("{name}: {verb} ({})", states.join(", ")));

    if let Some(error) = &file.format_error {
        lines.push(format!("  {error}"));
        return lines;
    }

    if !file.missing.is_empty() {
        lines.push(format!("  missing ({}): {}", file.missing.len(), quoted(&file.missing)));
    }
    if !file.extra.is_empty() {
        lines.push(format!("  extra ({}): {}", file.extra.len(), quoted(&file.extra)));
    }
    if !file.invalid_plural.is_empty() {
        lines.push(format!(
            "  invalid plural shape ({}): {}",
            file.invalid_plural.len(),
            quoted(&file.invalid_plural)
        ));
    }
    if !file.invalid_special.is_empty() {
        lines.push(format!(
            "  untranslated special keys ({}): {}",
            file.invalid_special.len(),
            quoted(&file.invalid_special)
        ));
    }

    lines
}

/// Comma-joined quoted key list.
fn quoted(keys: &[String]) -> String {
    keys.iter().map(|key| format!("\"{key}\"")).collect::<Vec<_>>().join(", ")
}

/// Minimal ANSI painter; the pack carries no terminal-color crate, so two
/// escape codes suffice.
#[derive(Debug, Clone, Copy)]
struct Paint {
    /// Whether color output is enabled.
    enabled: bool,
}

impl Paint {
    /// Creates a painter; escapes are emitted only when `enabled`.
    const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Green.
    fn ok(self, text: &str) -> String {
        if self.enabled { format!("\u{1b}[32m{text}\u{1b}[0m") } else { text.to_string() }
    }

    /// Yellow.
    fn warn(self, text: &str) -> String {
        if self.enabled { format!("\u{1b}[33m{text}\u{1b}[0m") } else { text.to_string() }
    }

    /// Red.
    fn error(self, text: &str) -> String {
        if self.enabled { format!("\u{1b}[31m{text}\u{1b}[0m") } else { text.to_string() }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::constant("constant-translation", Some(LintRule::ConstantTranslation))]
    #[case::max_len("max-key-length", Some(LintRule::MaxKeyLength))]
    #[case::unknown("no-such-rule", None)]
    fn test_rule_from_name(#[case] name: &str, #[case] expected: Option<LintRule>) {
        assert_that!(LintRule::from_name(name), eq(expected));
    }

    #[googletest::test]
    fn test_rule_names_round_trip() {
        for rule in LintRule::ALL {
            assert_that!(LintRule::from_name(rule.name()), some(eq(rule)));
        }
    }

    #[googletest::test]
    fn test_default_severities() {
        expect_that!(
            LintRule::ConstantTranslation.default_severity(),
            eq(Severity::Error)
        );
        expect_that!(LintRule::MaxKeyLength.default_severity(), eq(Severity::Warning));
    }

    fn clean_file() -> FileReport {
        FileReport {
            path: PathBuf::from("locales/en.json"),
            locale: "en".to_string(),
            states: vec![],
            missing: vec![],
            extra: vec![],
            invalid_plural: vec![],
            invalid_special: vec![],
            format_error: None,
            fixed: false,
        }
    }

    #[googletest::test]
    fn test_summary_passes_when_clean() {
        let summary =
            ValidationSummary { files: vec![clean_file()], lints: vec![], scanned_files: 3 };

        expect_that!(summary.passed(), eq(true));
        expect_that!(summary.render(false), contains_substring("up to date"));
        expect_that!(summary.render(false), contains_substring("OK"));
    }

    #[googletest::test]
    fn test_summary_fails_on_missing() {
        let file = FileReport {
            states: vec![LocaleState::HasMissing],
            missing: vec!["Hello".to_string()],
            ..clean_file()
        };
        let summary = ValidationSummary { files: vec![file], lints: vec![], scanned_files: 1 };

        expect_that!(summary.passed(), eq(false));
        let report = summary.render(false);
        expect_that!(report, contains_substring("missing (1): \"Hello\""));
        expect_that!(report, contains_substring("FAILED"));
    }

    #[googletest::test]
    fn test_fixed_file_passes() {
        let file = FileReport {
            states: vec![LocaleState::HasMissing],
            missing: vec!["Hello".to_string()],
            fixed: true,
            ..clean_file()
        };
        let summary = ValidationSummary { files: vec![file], lints: vec![], scanned_files: 1 };

        expect_that!(summary.passed(), eq(true));
        expect_that!(summary.render(false), contains_substring("fixed"));
    }

    #[googletest::test]
    fn test_warning_lint_does_not_fail_run() {
        let lint = LintDiagnostic {
            rule: LintRule::MaxKeyLength,
            severity: Severity::Warning,
            key: "k".to_string(),
            message: "too long".to_string(),
            location: None,
        };
        let summary =
            ValidationSummary { files: vec![], lints: vec![lint.clone()], scanned_files: 0 };

        expect_that!(summary.passed(), eq(true));

        let failing = ValidationSummary {
            lints: vec![LintDiagnostic { severity: Severity::Error, ..lint }],
            ..summary
        };
        expect_that!(failing.passed(), eq(false));
    }

    #[googletest::test]
    fn test_color_toggle() {
        let summary = ValidationSummary { files: vec![clean_file()], lints: vec![], scanned_files: 0 };

        expect_that!(summary.render(true), contains_substring("\u{1b}[32m"));
        expect_that!(summary.render(false), not(contains_substring("\u{1b}[")));
    }
}
