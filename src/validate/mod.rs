//! Locale validation and fixing.
//!
//! Reconciles the keys discovered by the usage scanner against every locale
//! file, reports missing/extra/invalid sets, runs the secondary lint rules,
//! and in fix mode rewrites the files with deterministic placement of newly
//! added keys.

/// The validation/fix engine
mod engine;
/// Secondary lint rules
mod lints;
/// Deterministic missing-block placement
mod placement;
/// Diagnostics, states, and report rendering
mod report;

pub use engine::{
    ValidateError,
    ValidationEngine,
};
pub use lints::run_lints;
pub use placement::insertion_position;
pub use report::{
    FileReport,
    LintDiagnostic,
    LintRule,
    LocaleState,
    Severity,
    ValidationSummary,
};
