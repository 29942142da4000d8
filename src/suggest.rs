//! Translation synthesis for missing keys.
//!
//! The fix engine fills newly-discovered keys either through an external
//! AI-translation collaborator (given similar existing translations as
//! stylistic context) or, when no collaborator is configured or it fails,
//! through static English placeholders. The network-facing implementation
//! lives outside this crate; only the seam is defined here.

use thiserror::Error;

use crate::key::{
    is_opaque_id,
    is_variant,
};
use crate::similarity::SimilarMatch;
use crate::translation::{
    PluralRecord,
    TranslationValue,
};

/// Errors surfaced by a translation collaborator. Always caught per locale
/// file; a failing backend degrades the whole file to static placeholders
/// and never aborts the run.
#[derive(Error, Debug)]
pub enum SuggestError {
    /// The backend reported an error.
    #[error("translation backend error: {0}")]
    Backend(String),
    /// No backend is configured.
    #[error("no translation backend configured")]
    Unavailable,
}

/// One missing key the collaborator is asked to translate.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestRequest<'a> {
    /// Locale the value is for.
    pub locale: &'a str,
    /// The missing key.
    pub key: &'a str,
    /// Whether a plural record is expected instead of a plain string.
    pub plural: bool,
    /// Similar existing translations, best first, for stylistic context.
    pub context: &'a [SimilarMatch],
}

/// An external AI-translation collaborator.
pub trait SuggestTranslations {
    /// Produces a translation value for one missing key.
    fn suggest(
        &self,
        request: SuggestRequest<'_>,
    ) -> impl Future<Output = Result<TranslationValue, SuggestError>> + Send;
}

/// The always-unavailable collaborator used when no backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSuggestions;

impl SuggestTranslations for NoSuggestions {
    async fn suggest(
        &self,
        _request: SuggestRequest<'_>,
    ) -> Result<TranslationValue, SuggestError> {
        Err(SuggestError::Unavailable)
    }
}

/// Static placeholder written for a missing key when no AI value is
/// available.
///
/// Plural keys get a complete English scaffold record; special (`$` or
/// `~~`) keys get the key itself, which deliberately trips the
/// untranslated-special check until a human replaces it; everything else is
/// written as `null`, pending translation.
#[must_use]
pub fn static_placeholder(key: &str, plural: bool) -> TranslationValue {
    if plural {
        return TranslationValue::Plural(PluralRecord {
            zero: Some("No x".to_string()),
            one: Some("1 x".to_string()),
            many: Some("A lot of x".to_string()),
            many_limit: Some(50),
            two_plus: Some("# x".to_string()),
        });
    }

    if is_opaque_id(key) || is_variant(key) {
        return TranslationValue::Text(key.to_string());
    }

    TranslationValue::Pending
}
