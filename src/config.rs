//! Validator configuration.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::validate::{
    LintRule,
    Severity,
};

/// Default threshold for the max-key-length rule.
pub const DEFAULT_MAX_KEY_LENGTH: usize = 80;

/// One invalid configuration field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// Path to the offending field (e.g. "includePatterns[0]").
    pub field_path: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    /// Creates an error for `field_path`.
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// Severity overrides for the secondary lint rules.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RuleSettings {
    /// Rule → severity overrides; unlisted rules keep their defaults.
    overrides: HashMap<LintRule, Severity>,
}

impl RuleSettings {
    /// Builds settings from explicit overrides.
    #[must_use]
    pub fn new(overrides: HashMap<LintRule, Severity>) -> Self {
        Self { overrides }
    }

    /// Overrides one rule's severity.
    pub fn set(&mut self, rule: LintRule, severity: Severity) {
        self.overrides.insert(rule, severity);
    }

    /// Effective severity for a rule.
    #[must_use]
    pub fn severity_for(&self, rule: LintRule) -> Severity {
        self.overrides.get(&rule).copied().unwrap_or_else(|| rule.default_severity())
    }
}

/// Parameters of one validation run, as handed over by the CLI wrapper.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorOptions {
    /// Directory scanned for source files.
    pub source_dir: PathBuf,

    /// Directory holding the flat `<locale>.json` files.
    pub locales_dir: PathBuf,

    /// Locale whose file may keep source-literal text as its translation.
    pub default_locale: Option<String>,

    /// Rewrite locale files instead of only reporting.
    pub fix: bool,

    /// ANSI color in the rendered report.
    pub color: bool,

    /// Glob patterns for source files to scan.
    pub include_patterns: Vec<String>,
    /// Glob patterns for source files to skip.
    pub exclude_patterns: Vec<String>,

    /// Lint rule severities.
    pub rules: RuleSettings,

    /// Threshold for the max-key-length rule.
    pub max_key_length: usize,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("src"),
            locales_dir: PathBuf::from("locales"),
            default_locale: None,
            fix: false,
            color: true,
            include_patterns: vec!["**/*.{js,jsx,ts,tsx}".to_string()],
            exclude_patterns: vec!["node_modules/**".to_string()],
            rules: RuleSettings::default(),
            max_key_length: DEFAULT_MAX_KEY_LENGTH,
        }
    }
}

impl ValidatorOptions {
    /// # Errors
    /// - A glob pattern is invalid
    /// - The max key length is zero
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.include_patterns.is_empty() {
            errors.push(ValidationError::new(
                "includePatterns",
                "At least one pattern is required. Example: [\"**/*.{js,ts,tsx}\"]",
            ));
        }

        for (index, pattern) in self.include_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("includePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        for (index, pattern) in self.exclude_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("excludePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        if self.max_key_length == 0 {
            errors.push(ValidationError::new("maxKeyLength", "The threshold must be at least 1"));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
