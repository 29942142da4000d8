//! Static usage scanning.
//!
//! Parses source files with tree-sitter and collects every tagged-template
//! call site of the recognized i18n accessors, aggregating per-key metadata
//! (locations, plural/markup classification, primitive-only interpolation)
//! for the validation engine.

/// Tree-sitter extraction of tagged-template call sites
mod extractor;
/// Scanner data types and the recognized call-form table
mod types;

pub use extractor::scan_source;
pub use types::{
    CALL_FORMS,
    CallForm,
    KeyUsage,
    ScanError,
    ScanOutcome,
    ScriptLanguage,
    UsageLocation,
    call_form_for,
    may_contain_calls,
};
