//! The validation/fix engine.
//!
//! Aggregates usages across the source tree, reconciles every locale file's
//! key set against them, and either reports the differences or rewrites the
//! files with deterministically-placed missing blocks. Files are processed
//! sequentially in sorted order so diagnostic output is stable across runs.

use std::collections::HashSet;
use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};
use ignore::WalkBuilder;
use thiserror::Error;

use crate::config::{
    ValidationError,
    ValidatorOptions,
};
use crate::locale::{
    LocaleFile,
    LocaleFileError,
    read_locale_file,
    write_locale_file,
};
use crate::scanner::{
    ScanOutcome,
    ScriptLanguage,
    scan_source,
};
use crate::similarity::{
    DEFAULT_MAX_RESULTS,
    SimilarityIndex,
};
use crate::suggest::{
    NoSuggestions,
    SuggestRequest,
    SuggestTranslations,
    static_placeholder,
};
use crate::translation::{
    TranslationValue,
    reserved,
};
use crate::validate::lints::run_lints;
use crate::validate::placement::insertion_position;
use crate::validate::report::{
    FileReport,
    LocaleState,
    ValidationSummary,
};

/// Errors that abort a validation run (per-file problems are reported in
/// the summary instead).
#[derive(Error, Debug)]
pub enum ValidateError {
    /// The options failed validation.
    #[error("Invalid validator options:\n{}", format_option_errors(.0))]
    Options(Vec<ValidationError>),

    /// A directory walk or file write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A glob set could not be built.
    #[error("Failed to build glob patterns: {0}")]
    Patterns(String),

    /// A fixed locale file could not be written back.
    #[error(transparent)]
    Locale(#[from] LocaleFileError),
}

/// Numbered one-per-line option errors.
fn format_option_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, error)| format!("  {}. {error}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reconciliation of one locale file against the discovered usages.
#[derive(Debug, Clone, Default)]
struct Reconciliation {
    /// Keys reported missing (absent, or pending where a value is required).
    missing: Vec<String>,
    /// Keys with no corresponding usage.
    extra: Vec<String>,
    /// Keys whose value shape contradicts their usage.
    invalid_plural: Vec<String>,
    /// Special keys whose value still equals the key.
    invalid_special: Vec<String>,
    /// Keys fix mode must (re-)add: absent keys, shape-invalid keys, and
    /// pending plural keys. Present-but-null plain keys stay in place.
    to_add: Vec<String>,
}

impl Reconciliation {
    /// Derives the state list reported for the file.
    fn states(&self, marker_only: bool) -> Vec<LocaleState> {
        let mut states = Vec::new();
        if !self.missing.is_empty() || marker_only {
            states.push(LocaleState::HasMissing);
        }
        if !self.extra.is_empty() {
            states.push(LocaleState::HasExtra);
        }
        if !self.invalid_plural.is_empty() {
            states.push(LocaleState::HasInvalidPluralShape);
        }
        if !self.invalid_special.is_empty() {
            states.push(LocaleState::HasInvalidSpecial);
        }
        states
    }
}

/// One full validation run over a source tree and a locale directory.
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    /// Parameters handed over by the CLI wrapper.
    options: ValidatorOptions,
}

impl ValidationEngine {
    /// Creates an engine, validating the options first.
    ///
    /// # Errors
    /// Returns `ValidateError::Options` when the options are invalid.
    pub fn new(options: ValidatorOptions) -> Result<Self, ValidateError> {
        options.validate().map_err(ValidateError::Options)?;
        Ok(Self { options })
    }

    /// Runs without an AI-translation collaborator; fix mode uses static
    /// placeholders.
    ///
    /// # Errors
    /// See [`ValidationEngine::run_with`].
    pub async fn run(&self) -> Result<ValidationSummary, ValidateError> {
        self.run_with(None::<&NoSuggestions>).await
    }

    /// Runs the full pipeline: scan, reconcile every locale file, fix if
    /// requested, lint.
    ///
    /// # Errors
    /// Returns an error only for run-level failures (unreadable directories,
    /// unwritable fixed files); per-file schema and reconciliation problems
    /// land in the summary.
    pub async fn run_with<T: SuggestTranslations + Sync>(
        &self,
        translator: Option<&T>,
    ) -> Result<ValidationSummary, ValidateError> {
        let (outcome, scanned_files) = self.scan_sources().await?;
        tracing::debug!(
            keys = outcome.usages.len(),
            files = scanned_files,
            "source scan complete"
        );

        let mut reports = Vec::new();
        let mut parsed_files = Vec::new();

        for path in self.find_locale_files()? {
            let (report, parsed) = self.process_locale_file(&path, &outcome, translator).await?;
            reports.push(report);
            if let Some(parsed) = parsed {
                parsed_files.push(parsed);
            }
        }

        let lints = run_lints(
            &outcome,
            &parsed_files,
            &self.options.rules,
            self.options.max_key_length,
        );

        Ok(ValidationSummary { files: reports, lints, scanned_files })
    }

    /// Scans every matching source file sequentially, in sorted path order.
    async fn scan_sources(&self) -> Result<(ScanOutcome, usize), ValidateError> {
        let files = self.find_source_files()?;

        let mut outcome = ScanOutcome::default();
        let mut scanned = 0_usize;

        for path in files {
            let Some(language) = ScriptLanguage::from_path(&path) else {
                continue;
            };

            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "failed to read source file");
                    continue;
                }
            };

            // 診断にはソースディレクトリからの相対パスを使う
            let display_path = path
                .strip_prefix(&self.options.source_dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .to_string();

            match scan_source(&display_path, &text, language) {
                Ok(file_outcome) => outcome.merge(file_outcome),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "failed to scan source file");
                    continue;
                }
            }
            scanned += 1;
        }

        Ok((outcome, scanned))
    }

    /// Walks the source directory honoring include/exclude patterns.
    fn find_source_files(&self) -> Result<Vec<PathBuf>, ValidateError> {
        let include_set = build_glob_set(&self.options.include_patterns)?;
        let exclude_set = build_glob_set(&self.options.exclude_patterns)?;

        let mut found = Vec::new();
        for result in WalkBuilder::new(&self.options.source_dir)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::debug!(?error, "failed to read directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|file_type| file_type.is_file()) {
                continue;
            }

            let path = entry.path();
            let Ok(relative) = path.strip_prefix(&self.options.source_dir) else {
                continue;
            };
            if !include_set.is_match(relative) || exclude_set.is_match(relative) {
                continue;
            }

            found.push(path.to_path_buf());
        }

        // 診断順序を安定させるためソートする
        found.sort();
        Ok(found)
    }

    /// Lists the flat `<locale>.json` files, sorted by name.
    fn find_locale_files(&self) -> Result<Vec<PathBuf>, ValidateError> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.options.locales_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Validates (and in fix mode rewrites) one locale file.
    async fn process_locale_file<T: SuggestTranslations + Sync>(
        &self,
        path: &Path,
        outcome: &ScanOutcome,
        translator: Option<&T>,
    ) -> Result<(FileReport, Option<LocaleFile>), ValidateError> {
        let locale = path
            .file_stem()
            .map_or_else(|| "unknown".to_string(), |stem| stem.to_string_lossy().to_string());
        let is_default = self.options.default_locale.as_deref() == Some(locale.as_str());

        let file = match read_locale_file(path, is_default).await {
            Ok(file) => file,
            Err(error @ (LocaleFileError::Json(_) | LocaleFileError::Schema(_))) => {
                // フォーマット不正はこのファイルの終端状態。修正もしない。
                return Ok((
                    FileReport {
                        path: path.to_path_buf(),
                        locale,
                        states: vec![LocaleState::InvalidFormat],
                        missing: vec![],
                        extra: vec![],
                        invalid_plural: vec![],
                        invalid_special: vec![],
                        format_error: Some(error.to_string()),
                        fixed: false,
                    },
                    None,
                ));
            }
            Err(error) => return Err(error.into()),
        };

        let reconciliation = reconcile(&file, outcome, is_default);
        let states = reconciliation.states(file.is_marker_only());

        let mut report = FileReport {
            path: path.to_path_buf(),
            locale: locale.clone(),
            states,
            missing: reconciliation.missing.clone(),
            extra: reconciliation.extra.clone(),
            invalid_plural: reconciliation.invalid_plural.clone(),
            invalid_special: reconciliation.invalid_special.clone(),
            format_error: None,
            fixed: false,
        };

        // null のままの平文キーしか残っていないファイルには書くべきものがない
        let actionable = !reconciliation.to_add.is_empty()
            || !reconciliation.extra.is_empty()
            || !reconciliation.invalid_plural.is_empty();
        let fixable = self.options.fix
            && !report.is_clean()
            && actionable
            // 特殊キーの未翻訳と、エントリなしのマーカーだけのファイルは手で直す
            && report.invalid_special.is_empty()
            && !(file.is_marker_only() && reconciliation.to_add.is_empty());

        if fixable {
            self.apply_fix(&file, outcome, &reconciliation, translator).await?;
            report.fixed = true;
        }

        Ok((report, Some(file)))
    }

    /// Rewrites one locale file: drops extras, requeues shape-invalid keys,
    /// splices the missing block at its deterministic position, and appends
    /// the trailing anchor.
    async fn apply_fix<T: SuggestTranslations + Sync>(
        &self,
        file: &LocaleFile,
        outcome: &ScanOutcome,
        reconciliation: &Reconciliation,
        translator: Option<&T>,
    ) -> Result<(), ValidateError> {
        let drop_keys: HashSet<&String> = reconciliation
            .extra
            .iter()
            .chain(reconciliation.invalid_plural.iter())
            .chain(reconciliation.to_add.iter())
            .collect();

        let kept: Vec<(String, TranslationValue)> = file
            .entries
            .iter()
            .filter(|(key, _)| !drop_keys.contains(key))
            .cloned()
            .collect();

        let mut to_add = reconciliation.to_add.clone();
        to_add.sort();

        if to_add.is_empty() {
            // 追加キーなし: 余分なエントリを落として書き直すだけ
            let mut entries = kept;
            push_anchor(&mut entries);
            write_locale_file(&file.path, &entries).await?;
            return Ok(());
        }

        let suggested = match translator {
            Some(translator) => {
                self.suggest_all(&file.locale, &kept, &to_add, outcome, translator).await
            }
            None => None,
        };
        let ai_supplied = suggested.is_some();

        let block: Vec<(String, TranslationValue)> = match suggested {
            Some(values) => to_add.iter().cloned().zip(values).collect(),
            None => to_add
                .iter()
                .map(|key| {
                    (key.clone(), static_placeholder(key, outcome.is_plural_key(key)))
                })
                .collect(),
        };

        let position = insertion_position(&to_add, kept.len());
        let mut entries: Vec<(String, TranslationValue)> = Vec::with_capacity(
            kept.len() + block.len() + 3,
        );
        entries.extend(kept.iter().take(position).cloned());
        if !ai_supplied {
            // AI が値を埋めた場合は人手レビュー用マーカーを挟まない
            entries
                .push((reserved::MISSING_START.to_string(), TranslationValue::Text(String::new())));
        }
        entries.extend(block);
        if !ai_supplied {
            entries
                .push((reserved::MISSING_END.to_string(), TranslationValue::Text(String::new())));
        }
        entries.extend(kept.iter().skip(position).cloned());
        push_anchor(&mut entries);

        write_locale_file(&file.path, &entries).await?;
        Ok(())
    }

    /// Asks the collaborator for every missing value, with similar existing
    /// translations as context. Any failure degrades the whole file to the
    /// static placeholder path.
    async fn suggest_all<T: SuggestTranslations + Sync>(
        &self,
        locale: &str,
        kept: &[(String, TranslationValue)],
        to_add: &[String],
        outcome: &ScanOutcome,
        translator: &T,
    ) -> Option<Vec<TranslationValue>> {
        let index = SimilarityIndex::build(kept.iter().filter_map(|(key, value)| {
            context_text(value).map(|text| (key.clone(), text))
        }));

        let mut values = Vec::with_capacity(to_add.len());
        for key in to_add {
            let context = index.query(key, DEFAULT_MAX_RESULTS);
            let request = SuggestRequest {
                locale,
                key,
                plural: outcome.is_plural_key(key),
                context: &context,
            };

            match translator.suggest(request).await {
                Ok(value) => values.push(value),
                Err(error) => {
                    tracing::warn!(
                        %error,
                        locale,
                        key,
                        "translation backend failed; falling back to static placeholders"
                    );
                    return None;
                }
            }
        }

        Some(values)
    }
}

/// Appends the stable trailing anchor entry.
fn push_anchor(entries: &mut Vec<(String, TranslationValue)>) {
    entries.push((reserved::ANCHOR_KEY.to_string(), TranslationValue::Text(String::new())));
}

/// The text an existing value contributes as similarity context.
fn context_text(value: &TranslationValue) -> Option<String> {
    match value {
        TranslationValue::Text(text) => Some(text.clone()),
        TranslationValue::Plural(record) => {
            record.two_plus.clone().or_else(|| record.one.clone()).or_else(|| record.many.clone())
        }
        TranslationValue::Pending => None,
    }
}

/// Builds one glob set from patterns.
fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ValidateError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|error| ValidateError::Patterns(format!("'{pattern}': {error}")))?;
        builder.add(glob);
    }
    builder.build().map_err(|error| ValidateError::Patterns(error.to_string()))
}

/// Compares one locale file's entries against the discovered usages.
fn reconcile(file: &LocaleFile, outcome: &ScanOutcome, is_default: bool) -> Reconciliation {
    let mut required: Vec<String> = outcome.required_keys().into_iter().collect();
    required.sort();
    let file_keys = file.key_set();

    let mut reconciliation = Reconciliation::default();

    for key in &required {
        let plural_usage = outcome.is_plural_key(key);

        match file.get(key) {
            None => {
                reconciliation.missing.push(key.clone());
                reconciliation.to_add.push(key.clone());
            }
            Some(TranslationValue::Plural(_)) => {
                if !plural_usage {
                    reconciliation.invalid_plural.push(key.clone());
                    reconciliation.to_add.push(key.clone());
                }
            }
            Some(TranslationValue::Text(text)) => {
                if plural_usage {
                    reconciliation.invalid_plural.push(key.clone());
                    reconciliation.to_add.push(key.clone());
                } else if is_special(key) && text == key {
                    reconciliation.invalid_special.push(key.clone());
                }
            }
            Some(TranslationValue::Pending) => {
                if plural_usage {
                    // デフォルトの複数形は存在しないので null は常に要修正
                    reconciliation.missing.push(key.clone());
                    reconciliation.to_add.push(key.clone());
                } else if !is_default {
                    // 非デフォルトロケールの null は未翻訳として数える
                    reconciliation.missing.push(key.clone());
                }
            }
        }
    }

    let required_set: HashSet<&String> = required.iter().collect();
    let mut extra: Vec<String> =
        file_keys.iter().filter(|key| !required_set.contains(key)).cloned().collect();
    extra.sort();
    reconciliation.extra = extra;

    reconciliation
}

/// True for `$` opaque-id keys and `~~variant` keys.
fn is_special(key: &str) -> bool {
    crate::key::is_opaque_id(key) || crate::key::is_variant(key)
}
