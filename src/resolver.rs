//! Runtime translation resolution.
//!
//! The resolver is the application-facing entry point: given the current
//! locale table and a tagged-template usage (literal segments, interpolation
//! arguments, optional count), it produces a displayable value. Lookup
//! misses and malformed translations degrade to the fallback text derived
//! from the source literal; resolution never fails and never blocks.
//!
//! The table is held behind an atomic pointer so a locale switch is one
//! whole-table swap performed by the locale-loading collaborator; a resolver
//! call can never observe a half-updated table.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::interpolate::{
    Arg,
    Chunk,
    interpolate_chunks,
    interpolate_plain,
};
use crate::key::{
    OPAQUE_ID_PLACEHOLDER,
    derive_fallback,
    derive_key,
    is_opaque_id,
    strip_variant,
};
use crate::plural::{
    select_form,
    substitute_count,
};
use crate::translation::{
    LocaleTable,
    TranslationValue,
};

/// A usage-site problem observed while resolving. Reported alongside the
/// degraded result instead of being thrown, so the host keeps rendering and
/// the signal stays testable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveIssue {
    /// A plain accessor hit a plural record; the call site should use the
    /// plural accessor.
    PluralValueForPlainCall {
        /// Derived key of the offending usage.
        key: String,
    },
    /// A plural accessor hit a plain string translation.
    PlainValueForPluralCall {
        /// Derived key of the offending usage.
        key: String,
    },
    /// A plural record had no applicable form for the count.
    NoApplicableForm {
        /// Derived key of the offending usage.
        key: String,
        /// The count that matched no form.
        count: i64,
    },
}

impl std::fmt::Display for ResolveIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PluralValueForPlainCall { key } => {
                write!(f, "'{key}' holds plural forms; use the plural accessor")
            }
            Self::PlainValueForPluralCall { key } => {
                write!(f, "'{key}' holds a plain string; use the plain accessor")
            }
            Self::NoApplicableForm { key, count } => {
                write!(f, "'{key}' has no plural form applicable to count {count}")
            }
        }
    }
}

/// A resolved plain-text result plus any usage-site issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// The displayable text. Always present, even on a degraded path.
    pub text: String,
    /// The issue observed, if any.
    pub issue: Option<ResolveIssue>,
}

/// A resolved structured result plus any usage-site issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChunks<N> {
    /// The displayable chunk sequence. Always present.
    pub chunks: Vec<Chunk<N>>,
    /// The issue observed, if any.
    pub issue: Option<ResolveIssue>,
}

/// The runtime resolver. One instance per application; the locale-loading
/// collaborator feeds it tables via [`Resolver::set_table`].
#[derive(Debug, Default)]
pub struct Resolver {
    /// Currently loaded locale table, if any.
    table: ArcSwapOption<LocaleTable>,
}

impl Resolver {
    /// Creates a resolver with no table loaded; every lookup degrades to its
    /// fallback until [`Resolver::set_table`] is called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver with a table already loaded. Mostly for tests.
    #[must_use]
    pub fn with_table(table: LocaleTable) -> Self {
        let resolver = Self::new();
        resolver.set_table(Arc::new(table));
        resolver
    }

    /// Atomically replaces the current locale table.
    pub fn set_table(&self, table: Arc<LocaleTable>) {
        self.table.store(Some(table));
    }

    /// Drops the current table; subsequent lookups fall back to source text.
    /// Intended for locale teardown and test isolation.
    pub fn reset(&self) {
        self.table.store(None);
    }

    /// Id of the currently loaded locale, if any.
    #[must_use]
    pub fn current_locale(&self) -> Option<String> {
        self.table.load().as_ref().map(|table| table.locale.clone())
    }

    /// Resolves a plain (non-plural) usage to a display string, logging any
    /// usage-site issue.
    #[must_use]
    pub fn resolve_plain<N: Clone>(&self, segments: &[&str], args: &[Arg<N>]) -> String {
        let resolved = self.resolve_plain_detailed(segments, args);
        log_issue(resolved.issue.as_ref());
        resolved.text
    }

    /// Like [`Resolver::resolve_plain`] but returns the observed issue
    /// instead of logging it.
    #[must_use]
    pub fn resolve_plain_detailed<N: Clone>(
        &self,
        segments: &[&str],
        args: &[Arg<N>],
    ) -> Resolved {
        let key = derive_key(segments);
        let miss = self.miss_text(&key, segments, args, None);

        let (text, issue) = match self.lookup(&key) {
            Some(TranslationValue::Text(translated)) => {
                let interpolated = interpolate_plain(&translated, args);
                if interpolated.is_empty() { (miss, None) } else { (interpolated, None) }
            }
            Some(TranslationValue::Plural(_)) => {
                (miss, Some(ResolveIssue::PluralValueForPlainCall { key }))
            }
            Some(TranslationValue::Pending) | None => (miss, None),
        };

        Resolved { text, issue }
    }

    /// Resolves a counted (plural) usage to a display string, logging any
    /// usage-site issue.
    #[must_use]
    pub fn resolve_plural<N: Clone>(
        &self,
        segments: &[&str],
        args: &[Arg<N>],
        count: i64,
    ) -> String {
        let resolved = self.resolve_plural_detailed(segments, args, count);
        log_issue(resolved.issue.as_ref());
        resolved.text
    }

    /// Like [`Resolver::resolve_plural`] but returns the observed issue
    /// instead of logging it.
    #[must_use]
    pub fn resolve_plural_detailed<N: Clone>(
        &self,
        segments: &[&str],
        args: &[Arg<N>],
        count: i64,
    ) -> Resolved {
        let key = derive_key(segments);
        let miss = self.miss_text(&key, segments, args, Some(count));

        let (text, issue) = match self.lookup(&key) {
            Some(TranslationValue::Plural(record)) => match select_form(count, &record) {
                Some(form) => {
                    let interpolated = interpolate_plain(&form, args);
                    if interpolated.is_empty() { (miss, None) } else { (interpolated, None) }
                }
                None => (miss, Some(ResolveIssue::NoApplicableForm { key, count })),
            },
            Some(TranslationValue::Text(_)) => {
                (miss, Some(ResolveIssue::PlainValueForPluralCall { key }))
            }
            Some(TranslationValue::Pending) | None => (miss, None),
        };

        Resolved { text, issue }
    }

    /// Resolves a markup-aware plain usage to a chunk sequence, logging any
    /// usage-site issue. Markup arguments survive as discrete chunks.
    #[must_use]
    pub fn resolve_jsx<N: Clone>(&self, segments: &[&str], args: &[Arg<N>]) -> Vec<Chunk<N>> {
        let resolved = self.resolve_jsx_detailed(segments, args);
        log_issue(resolved.issue.as_ref());
        resolved.chunks
    }

    /// Like [`Resolver::resolve_jsx`] but returns the observed issue instead
    /// of logging it.
    #[must_use]
    pub fn resolve_jsx_detailed<N: Clone>(
        &self,
        segments: &[&str],
        args: &[Arg<N>],
    ) -> ResolvedChunks<N> {
        let key = derive_key(segments);
        let miss = self.miss_source(&key, segments, args, None);

        let (source, issue) = match self.lookup(&key) {
            Some(TranslationValue::Text(translated)) => (translated, None),
            Some(TranslationValue::Plural(_)) => {
                (miss.clone(), Some(ResolveIssue::PluralValueForPlainCall { key }))
            }
            Some(TranslationValue::Pending) | None => (miss.clone(), None),
        };

        let chunks = non_empty_chunks(&source, &miss, args);
        ResolvedChunks { chunks, issue }
    }

    /// Resolves a markup-aware counted usage to a chunk sequence, logging any
    /// usage-site issue.
    #[must_use]
    pub fn resolve_plural_jsx<N: Clone>(
        &self,
        segments: &[&str],
        args: &[Arg<N>],
        count: i64,
    ) -> Vec<Chunk<N>> {
        let resolved = self.resolve_plural_jsx_detailed(segments, args, count);
        log_issue(resolved.issue.as_ref());
        resolved.chunks
    }

    /// Like [`Resolver::resolve_plural_jsx`] but returns the observed issue
    /// instead of logging it.
    #[must_use]
    pub fn resolve_plural_jsx_detailed<N: Clone>(
        &self,
        segments: &[&str],
        args: &[Arg<N>],
        count: i64,
    ) -> ResolvedChunks<N> {
        let key = derive_key(segments);
        let miss = self.miss_source(&key, segments, args, Some(count));

        let (source, issue) = match self.lookup(&key) {
            Some(TranslationValue::Plural(record)) => match select_form(count, &record) {
                Some(form) => (form, None),
                None => (miss.clone(), Some(ResolveIssue::NoApplicableForm { key, count })),
            },
            Some(TranslationValue::Text(_)) => {
                (miss.clone(), Some(ResolveIssue::PlainValueForPluralCall { key }))
            }
            Some(TranslationValue::Pending) | None => (miss.clone(), None),
        };

        let chunks = non_empty_chunks(&source, &miss, args);
        ResolvedChunks { chunks, issue }
    }

    /// Looks up the key in the current table, cloning the value out so the
    /// table guard is not held across interpolation.
    fn lookup(&self, key: &str) -> Option<TranslationValue> {
        self.table.load().as_ref().and_then(|table| table.get(key).cloned())
    }

    /// The fully-substituted text rendered on a lookup miss.
    fn miss_text<N: Clone>(
        &self,
        key: &str,
        segments: &[&str],
        args: &[Arg<N>],
        count: Option<i64>,
    ) -> String {
        interpolate_plain(&self.miss_source(key, segments, args, count), args)
    }

    /// The source string a lookup miss degrades to, before structured
    /// interpolation: the literal fallback with the variant suffix stripped
    /// (and `#` substituted for plural calls), or the terminal ellipsis for
    /// opaque ids, which must never leak their developer-facing text.
    ///
    /// A `~~variant` key that is absent from the table deliberately does NOT
    /// fall back to the base key's translation; the miss is total and only
    /// the literal source text renders.
    fn miss_source<N: Clone>(
        &self,
        key: &str,
        segments: &[&str],
        args: &[Arg<N>],
        count: Option<i64>,
    ) -> String {
        if is_opaque_id(key) {
            return OPAQUE_ID_PLACEHOLDER.to_string();
        }

        let values: Vec<Option<String>> = args.iter().map(Arg::as_fallback_text).collect();
        let fallback = derive_fallback(segments, &values);
        let display = strip_variant(&fallback);

        count.map_or_else(|| display.to_string(), |count| substitute_count(display, count))
    }
}

/// Structured interpolation with the empty-result fallback rule applied.
fn non_empty_chunks<N: Clone>(source: &str, miss: &str, args: &[Arg<N>]) -> Vec<Chunk<N>> {
    let chunks = interpolate_chunks(source, args);
    if chunks.is_empty() { interpolate_chunks(miss, args) } else { chunks }
}

/// Forwards a usage-site issue to the log. Kept out of the detailed
/// variants so tests can assert on issues without capturing log output.
fn log_issue(issue: Option<&ResolveIssue>) {
    if let Some(issue) = issue {
        tracing::warn!(%issue, "translation usage-site error");
    }
}
