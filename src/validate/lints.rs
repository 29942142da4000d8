//! Secondary lint rules.
//!
//! Independent boolean checks over the fully aggregated usage and locale
//! data. Each rule contributes zero or more diagnostics tagged with its name
//! and configured severity; `off` suppresses a rule entirely.

use crate::config::RuleSettings;
use crate::key::is_length_exempt;
use crate::locale::LocaleFile;
use crate::scanner::ScanOutcome;
use crate::translation::{
    PluralRecord,
    TranslationValue,
};
use crate::validate::report::{
    LintDiagnostic,
    LintRule,
    Severity,
};

/// Runs every enabled rule and returns the diagnostics in rule order, keys
/// sorted within each rule.
#[must_use]
pub fn run_lints(
    outcome: &ScanOutcome,
    locales: &[LocaleFile],
    rules: &RuleSettings,
    max_key_length: usize,
) -> Vec<LintDiagnostic> {
    let mut diagnostics = Vec::new();

    for rule in LintRule::ALL {
        let severity = rules.severity_for(rule);
        if severity == Severity::Off {
            continue;
        }

        let findings = match rule {
            LintRule::ConstantTranslation => constant_translation(outcome, locales),
            LintRule::UnnecessaryPlural => unnecessary_plural(outcome, locales),
            LintRule::MarkupWithoutInterpolation => markup_without_interpolation(outcome),
            LintRule::MarkupWithoutRealNodes => markup_without_real_nodes(outcome),
            LintRule::RedundantAffix => redundant_affix(outcome),
            LintRule::MaxKeyLength => max_key_length_rule(outcome, max_key_length),
        };

        diagnostics.extend(findings.into_iter().map(|(key, message)| {
            let location = outcome.usages.get(&key).and_then(|usage| usage.first_location());
            LintDiagnostic { rule, severity, location: location.cloned(), key, message }
        }));
    }

    diagnostics
}

/// Used keys in deterministic order.
fn sorted_used_keys(outcome: &ScanOutcome) -> Vec<&String> {
    let mut keys: Vec<&String> = outcome.usages.keys().collect();
    keys.sort();
    keys
}

/// A used key whose plain translation is byte-identical in two or more
/// locales is probably not being translated at all.
fn constant_translation(
    outcome: &ScanOutcome,
    locales: &[LocaleFile],
) -> Vec<(String, String)> {
    let mut findings = Vec::new();

    for key in sorted_used_keys(outcome) {
        let translations: Vec<&str> = locales
            .iter()
            .filter_map(|locale| locale.get(key).and_then(TranslationValue::as_text))
            .collect();

        if translations.len() >= 2
            && let Some(first) = translations.first()
            && translations.iter().all(|translation| translation == first)
        {
            findings.push((
                key.clone(),
                format!("\"{key}\" has the same translation in every locale"),
            ));
        }
    }

    findings
}

/// True when the record carries nothing but a countless `+2` form.
fn is_degenerate_plural(record: &PluralRecord) -> bool {
    record.zero.is_none()
        && record.one.is_none()
        && record.many.is_none()
        && record.many_limit.is_none()
        && record.two_plus.as_deref().is_some_and(|form| !form.contains('#'))
}

/// A plural key whose record never varies with the count should be a plain
/// string.
fn unnecessary_plural(outcome: &ScanOutcome, locales: &[LocaleFile]) -> Vec<(String, String)> {
    let mut findings = Vec::new();

    for key in sorted_used_keys(outcome) {
        if !outcome.is_plural_key(key) {
            continue;
        }

        let records: Vec<&PluralRecord> = locales
            .iter()
            .filter_map(|locale| locale.get(key).and_then(TranslationValue::as_plural))
            .collect();

        if !records.is_empty() && records.iter().all(|record| is_degenerate_plural(record)) {
            findings.push((
                key.clone(),
                format!("plural forms of \"{key}\" never vary; use the plain accessor"),
            ));
        }
    }

    findings
}

/// A markup-aware call without interpolations preserves nothing; the plain
/// accessor does the same job.
fn markup_without_interpolation(outcome: &ScanOutcome) -> Vec<(String, String)> {
    markup_rule(outcome, |usage| usage.interpolation_count == 0, |key| {
        format!("markup-aware call for \"{key}\" has no interpolations; use the plain accessor")
    })
}

/// A markup-aware call whose interpolations are all primitive preserves
/// nothing either. Mutually exclusive with
/// [`markup_without_interpolation`] on the same key.
fn markup_without_real_nodes(outcome: &ScanOutcome) -> Vec<(String, String)> {
    markup_rule(
        outcome,
        |usage| usage.interpolation_count > 0 && usage.primitive_only,
        |key| {
            format!(
                "markup-aware call for \"{key}\" interpolates no markup nodes; use the plain accessor"
            )
        },
    )
}

/// Shared shape of the two markup rules.
fn markup_rule(
    outcome: &ScanOutcome,
    applies: impl Fn(&crate::scanner::KeyUsage) -> bool,
    message: impl Fn(&str) -> String,
) -> Vec<(String, String)> {
    let mut findings = Vec::new();

    for key in sorted_used_keys(outcome) {
        let markup_use = outcome.markup_plain_keys.contains(key)
            || outcome.markup_plural_keys.contains(key);
        if !markup_use {
            continue;
        }

        if let Some(usage) = outcome.usages.get(key)
            && applies(usage)
        {
            findings.push((key.clone(), message(key)));
        }
    }

    findings
}

/// A single interpolation wrapped only in non-linguistic text (punctuation,
/// whitespace, placeholders) has nothing to translate; the fixed affixes
/// belong outside the call.
fn redundant_affix(outcome: &ScanOutcome) -> Vec<(String, String)> {
    let mut findings = Vec::new();

    for key in sorted_used_keys(outcome) {
        let Some(usage) = outcome.usages.get(key) else {
            continue;
        };
        if usage.interpolation_count != 1 {
            continue;
        }

        let remainder = key.replace("{1}", "");
        if !remainder.chars().any(char::is_alphabetic) {
            findings.push((
                key.clone(),
                format!("\"{key}\" has no translatable text around its interpolation"),
            ));
        }
    }

    findings
}

/// Keys past the configured length are painful to maintain; opaque `$` ids
/// exist for exactly that case and are exempt.
fn max_key_length_rule(outcome: &ScanOutcome, max_key_length: usize) -> Vec<(String, String)> {
    let mut findings = Vec::new();

    for key in sorted_used_keys(outcome) {
        if is_length_exempt(key) {
            continue;
        }

        let length = key.chars().count();
        if length > max_key_length {
            findings.push((
                key.clone(),
                format!(
                    "\"{key}\" is {length} characters long (max {max_key_length}); consider a $id key"
                ),
            ));
        }
    }

    findings
}
