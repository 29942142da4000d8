//! Entry point for the locale validation CLI.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tagged_i18n::config::{
    DEFAULT_MAX_KEY_LENGTH,
    RuleSettings,
    ValidatorOptions,
};
use tagged_i18n::validate::{
    LintRule,
    Severity,
    ValidationEngine,
};

/// Validates locale files against tagged-template i18n usage.
#[derive(Parser, Debug)]
#[command(name = "tagged-i18n", version, about)]
struct Cli {
    /// Directory scanned for source files
    #[arg(long, default_value = "src")]
    src: PathBuf,

    /// Directory holding the flat <locale>.json files
    #[arg(long, default_value = "locales")]
    locales: PathBuf,

    /// Locale whose file may keep source-literal text as its translation
    #[arg(long)]
    default_locale: Option<String>,

    /// Rewrite locale files instead of only reporting
    #[arg(long)]
    fix: bool,

    /// Disable ANSI color in the report
    #[arg(long)]
    no_color: bool,

    /// Override a rule severity (repeatable), e.g. --rule max-key-length=off
    #[arg(long = "rule", value_name = "RULE=SEVERITY", value_parser = parse_rule)]
    rules: Vec<(LintRule, Severity)>,

    /// Threshold for the max-key-length rule
    #[arg(long, default_value_t = DEFAULT_MAX_KEY_LENGTH)]
    max_key_length: usize,
}

/// Parses a `rule-name=severity` override.
fn parse_rule(spec: &str) -> Result<(LintRule, Severity), String> {
    let (name, severity) = spec
        .split_once('=')
        .ok_or_else(|| format!("expected RULE=SEVERITY, got '{spec}'"))?;

    let rule = LintRule::from_name(name).ok_or_else(|| format!("unknown rule '{name}'"))?;
    let severity = match severity {
        "off" => Severity::Off,
        "warning" => Severity::Warning,
        "error" => Severity::Error,
        other => return Err(format!("unknown severity '{other}' (off|warning|error)")),
    };

    Ok((rule, severity))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut rules = RuleSettings::default();
    for (rule, severity) in cli.rules {
        rules.set(rule, severity);
    }

    let options = ValidatorOptions {
        source_dir: cli.src,
        locales_dir: cli.locales,
        default_locale: cli.default_locale,
        fix: cli.fix,
        color: !cli.no_color,
        rules,
        max_key_length: cli.max_key_length,
        ..ValidatorOptions::default()
    };
    let color = options.color;

    let engine = match ValidationEngine::new(options) {
        Ok(engine) => engine,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };

    match engine.run().await {
        Ok(summary) => {
            println!("{}", summary.render(color));
            if summary.passed() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
        }
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
