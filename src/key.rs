//! Translation key derivation.
//!
//! A tagged template's literal segments plus its interpolation count map to a
//! stable lookup key: `` __`Hello ${name}!` `` derives `"Hello {1}!"`. The
//! same segments with the actual stringified values substituted produce the
//! human-readable fallback that renders when no translation is available.

use std::fmt::Write as _;

/// Marks a key as an opaque id (`` __`$saveTooltip` ``). Opaque ids stand in
/// for long texts and must never leak to end users as-is.
pub const OPAQUE_ID_PREFIX: char = '$';

/// Separates a base key from a named variant (`"Hello {1}~~formal"`).
pub const VARIANT_SEPARATOR: &str = "~~";

/// Rendered in place of an opaque-id key that has no translation yet.
pub const OPAQUE_ID_PLACEHOLDER: &str = "…";

/// Derives the canonical lookup key from a template's literal segments.
///
/// Interpolation slots are encoded as `{n}` (1-based), so the key depends
/// only on the literal text and the *number* of interpolations, never on the
/// runtime values. A template with zero interpolations derives its sole
/// segment verbatim.
#[must_use]
pub fn derive_key(segments: &[&str]) -> String {
    let mut key = String::new();
    for (index, segment) in segments.iter().enumerate() {
        if index > 0 {
            // 書き込み先が String のため write! は失敗しない
            let _ = write!(key, "{{{index}}}");
        }
        key.push_str(segment);
    }
    key
}

/// Derives the fallback string: the same concatenation as [`derive_key`] but
/// with the stringified interpolation values in place of the `{n}` markers.
///
/// If fewer values than slots are supplied (a markup argument that has no
/// text form), the missing slot keeps its `{n}` marker so a structured
/// interpolation pass can still fill it.
#[must_use]
pub fn derive_fallback(segments: &[&str], values: &[Option<String>]) -> String {
    let mut fallback = String::new();
    for (index, segment) in segments.iter().enumerate() {
        if index > 0 {
            match values.get(index - 1) {
                Some(Some(value)) => fallback.push_str(value),
                // 値が無いスロットはプレースホルダのまま残す
                _ => {
                    let _ = write!(fallback, "{{{index}}}");
                }
            }
        }
        fallback.push_str(segment);
    }
    fallback
}

/// Returns true for `$`-prefixed opaque-id keys.
#[must_use]
pub fn is_opaque_id(key: &str) -> bool {
    key.starts_with(OPAQUE_ID_PREFIX)
}

/// Returns true if the key carries a `~~variant` suffix.
#[must_use]
pub fn is_variant(key: &str) -> bool {
    key.contains(VARIANT_SEPARATOR)
}

/// Splits `"base~~variant"` into `("base", "variant")`, or `None` when the
/// key has no variant suffix. The first separator occurrence wins.
#[must_use]
pub fn variant_parts(key: &str) -> Option<(&str, &str)> {
    key.split_once(VARIANT_SEPARATOR)
}

/// Strips a `~~variant` suffix for display purposes. Text without a
/// separator is returned unchanged.
#[must_use]
pub fn strip_variant(text: &str) -> &str {
    text.split_once(VARIANT_SEPARATOR).map_or(text, |(base, _)| base)
}

/// Returns true for keys that are exempt from translation-quality checks
/// that assume a human-readable key (currently only length checks).
#[must_use]
pub fn is_length_exempt(key: &str) -> bool {
    is_opaque_id(key)
}
