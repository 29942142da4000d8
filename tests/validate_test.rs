//! End-to-end validation scenarios over real directory trees.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]

use std::fs;
use std::path::Path;

use googletest::prelude::*;
use tagged_i18n::config::ValidatorOptions;
use tagged_i18n::suggest::{
    SuggestError,
    SuggestRequest,
    SuggestTranslations,
};
use tagged_i18n::translation::{
    PluralRecord,
    TranslationValue,
};
use tagged_i18n::validate::{
    LintRule,
    LocaleState,
    Severity,
    ValidationEngine,
};
use tempfile::TempDir;

/// テスト用のソースとロケールのディレクトリを用意する
fn project(sources: &[(&str, &str)], locales: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();

    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    for (name, content) in sources {
        fs::write(src.join(name), content).unwrap();
    }

    let locale_dir = dir.path().join("locales");
    fs::create_dir_all(&locale_dir).unwrap();
    for (name, content) in locales {
        fs::write(locale_dir.join(name), content).unwrap();
    }

    dir
}

fn options(root: &Path, fix: bool) -> ValidatorOptions {
    ValidatorOptions {
        source_dir: root.join("src"),
        locales_dir: root.join("locales"),
        fix,
        color: false,
        ..ValidatorOptions::default()
    }
}

async fn run(root: &Path, fix: bool) -> tagged_i18n::validate::ValidationSummary {
    ValidationEngine::new(options(root, fix)).unwrap().run().await.unwrap()
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// 固定値を返す翻訳バックエンドのスタブ
struct StubTranslator;

impl SuggestTranslations for StubTranslator {
    async fn suggest(
        &self,
        request: SuggestRequest<'_>,
    ) -> Result<TranslationValue, SuggestError> {
        if request.plural {
            Ok(TranslationValue::Plural(PluralRecord {
                one: Some(format!("1 {}", request.locale)),
                two_plus: Some(format!("# {}", request.locale)),
                ..PluralRecord::default()
            }))
        } else {
            Ok(TranslationValue::Text(format!("[{}] {}", request.locale, request.key)))
        }
    }
}

/// 常に失敗する翻訳バックエンドのスタブ
struct FailingTranslator;

impl SuggestTranslations for FailingTranslator {
    async fn suggest(
        &self,
        _request: SuggestRequest<'_>,
    ) -> Result<TranslationValue, SuggestError> {
        Err(SuggestError::Backend("boom".to_string()))
    }
}

#[googletest::test]
#[tokio::test]
async fn fix_mode_populates_empty_locale_file() {
    let dir = project(
        &[("app.jsx", "const a = __`Hello World`;\nconst b = __p(1)`# Hello World`;\n")],
        &[("en.json", "{}")],
    );

    let summary = run(dir.path(), true).await;
    assert_that!(summary.passed(), eq(true));

    let json = read_json(&dir.path().join("locales/en.json"));
    let object = json.as_object().unwrap();

    // 平文キーは null、複数形キーは英語の雛形レコード
    expect_that!(object.get("Hello World"), some(eq(&serde_json::Value::Null)));
    let plural = object.get("# Hello World").and_then(|value| value.as_object()).unwrap();
    expect_that!(plural.get("zero").and_then(|v| v.as_str()), some(eq("No x")));
    expect_that!(plural.get("one").and_then(|v| v.as_str()), some(eq("1 x")));
    expect_that!(plural.get("+2").and_then(|v| v.as_str()), some(eq("# x")));
    expect_that!(plural.get("many").and_then(|v| v.as_str()), some(eq("A lot of x")));
    expect_that!(plural.get("manyLimit").and_then(serde_json::Value::as_i64), some(eq(50)));

    // マーカーと末尾アンカー
    expect_that!(object.contains_key("👇 missing start 👇"), eq(true));
    expect_that!(object.contains_key("👆 missing end 👆"), eq(true));
    expect_that!(object.get(""), some(eq(&serde_json::Value::String(String::new()))));

    // アンカーはファイル末尾に固定される（serde_json の Map はソートされるため
    // テキストで確認する）
    let text = fs::read_to_string(dir.path().join("locales/en.json")).unwrap();
    expect_that!(text, ends_with("  \"\": \"\"\n}\n"));
}

#[googletest::test]
#[tokio::test]
async fn constant_translation_reports_exactly_one_diagnostic() {
    let dir = project(
        &[("app.js", "const ok = __`OK`;\n")],
        &[("en.json", r#"{"OK": "OK"}"#), ("fr.json", r#"{"OK": "OK"}"#)],
    );

    let summary = run(dir.path(), false).await;

    let constants: Vec<_> = summary
        .lints
        .iter()
        .filter(|lint| lint.rule == LintRule::ConstantTranslation)
        .collect();
    assert_that!(constants, len(eq(1)));
    expect_that!(constants[0].key, eq("OK"));
    expect_that!(constants[0].severity, eq(Severity::Error));
    expect_that!(summary.passed(), eq(false));
}

#[googletest::test]
#[tokio::test]
async fn markup_rules_fire_mutually_exclusively() {
    // 補間なしのマークアップ呼び出し
    let dir = project(
        &[("a.jsx", "const a = __jsx`Hello World`;\n")],
        &[("en.json", r#"{"Hello World": "Hello World!"}"#)],
    );
    let summary = run(dir.path(), false).await;
    expect_that!(
        summary.lints.iter().any(|l| l.rule == LintRule::MarkupWithoutInterpolation),
        eq(true)
    );
    expect_that!(
        summary.lints.iter().any(|l| l.rule == LintRule::MarkupWithoutRealNodes),
        eq(false)
    );

    // JSX 要素を補間 → どちらも発火しない
    let dir = project(
        &[("a.jsx", "const a = __jsx`Hello ${<b>World</b>}`;\n")],
        &[("en.json", r#"{"Hello {1}": "Hello {1}!"}"#)],
    );
    let summary = run(dir.path(), false).await;
    expect_that!(
        summary.lints.iter().any(|l| l.rule == LintRule::MarkupWithoutInterpolation),
        eq(false)
    );
    expect_that!(
        summary.lints.iter().any(|l| l.rule == LintRule::MarkupWithoutRealNodes),
        eq(false)
    );

    // 文字列リテラルを補間 → markup-without-real-nodes のみ発火
    let dir = project(
        &[("a.jsx", "const a = __jsx`Hello ${'World'}`;\n")],
        &[("en.json", r#"{"Hello {1}": "Hello {1}!"}"#)],
    );
    let summary = run(dir.path(), false).await;
    expect_that!(
        summary.lints.iter().any(|l| l.rule == LintRule::MarkupWithoutInterpolation),
        eq(false)
    );
    expect_that!(
        summary.lints.iter().any(|l| l.rule == LintRule::MarkupWithoutRealNodes),
        eq(true)
    );
}

#[googletest::test]
#[tokio::test]
async fn check_mode_reports_missing_and_extra() {
    let dir = project(
        &[("app.js", "const a = __`Hello`;\n")],
        &[("fr.json", r#"{"Goodbye": "Au revoir"}"#)],
    );

    let summary = run(dir.path(), false).await;

    assert_that!(summary.passed(), eq(false));
    let report = &summary.files[0];
    expect_that!(report.missing, elements_are![eq("Hello")]);
    expect_that!(report.extra, elements_are![eq("Goodbye")]);
    expect_that!(
        report.states,
        unordered_elements_are![eq(&LocaleState::HasMissing), eq(&LocaleState::HasExtra)]
    );
}

#[googletest::test]
#[tokio::test]
async fn fix_mode_is_deterministic_on_identical_inputs() {
    let sources = [(
        "app.jsx",
        "__`One`;\n__`Two`;\n__p(n)`# Three`;\n",
    )];
    let locales = [("fr.json", r#"{"One": "Un", "Stale": "Vieux"}"#)];

    let first = project(&sources, &locales);
    let second = project(&sources, &locales);

    run(first.path(), true).await;
    run(second.path(), true).await;

    let first_bytes = fs::read(first.path().join("locales/fr.json")).unwrap();
    let second_bytes = fs::read(second.path().join("locales/fr.json")).unwrap();

    assert_that!(first_bytes, eq(&second_bytes));
}

#[googletest::test]
#[tokio::test]
async fn fix_mode_drops_extras_and_requeues_invalid_shapes() {
    let dir = project(
        &[("app.js", "__`plain`;\n__p(n)`# counted`;\n")],
        &[(
            "fr.json",
            r##"{"plain": "Simple", "# counted": "wrong shape", "Stale": "Vieux"}"##,
        )],
    );

    let summary = run(dir.path(), true).await;
    assert_that!(summary.files[0].fixed, eq(true));

    let json = read_json(&dir.path().join("locales/fr.json"));
    let object = json.as_object().unwrap();

    // 余分なキーは落ち、形の合わないキーは複数形レコードで再追加される
    expect_that!(object.contains_key("Stale"), eq(false));
    expect_that!(object.get("plain").and_then(|v| v.as_str()), some(eq("Simple")));
    expect_that!(object.get("# counted").map(serde_json::Value::is_object), some(eq(true)));
}

#[googletest::test]
#[tokio::test]
async fn invalid_format_is_terminal_and_not_fixed() {
    let dir = project(
        &[("app.js", "__`Hello`;\n")],
        &[("fr.json", r#"{"Hello": 42}"#)],
    );
    let before = fs::read_to_string(dir.path().join("locales/fr.json")).unwrap();

    let summary = run(dir.path(), true).await;

    let report = &summary.files[0];
    expect_that!(report.states, elements_are![eq(&LocaleState::InvalidFormat)]);
    expect_that!(report.fixed, eq(false));
    expect_that!(summary.passed(), eq(false));

    let after = fs::read_to_string(dir.path().join("locales/fr.json")).unwrap();
    assert_that!(after, eq(&before));
}

#[googletest::test]
#[tokio::test]
async fn untranslated_special_keys_are_never_auto_fixed() {
    let dir = project(
        &[("app.js", "__`$saveTooltip`;\n")],
        &[("fr.json", r#"{"$saveTooltip": "$saveTooltip"}"#)],
    );

    let summary = run(dir.path(), true).await;

    let report = &summary.files[0];
    expect_that!(report.invalid_special, elements_are![eq("$saveTooltip")]);
    expect_that!(report.fixed, eq(false));
    expect_that!(summary.passed(), eq(false));
}

#[googletest::test]
#[tokio::test]
async fn ai_translator_fills_values_without_markers() {
    let dir = project(
        &[("app.js", "__`Hello`;\n__p(n)`# items`;\n")],
        &[("fr.json", "{}")],
    );

    let engine = ValidationEngine::new(options(dir.path(), true)).unwrap();
    let summary = engine.run_with(Some(&StubTranslator)).await.unwrap();
    assert_that!(summary.files[0].fixed, eq(true));

    let json = read_json(&dir.path().join("locales/fr.json"));
    let object = json.as_object().unwrap();

    expect_that!(object.get("Hello").and_then(|v| v.as_str()), some(eq("[fr] Hello")));
    let plural = object.get("# items").and_then(|value| value.as_object()).unwrap();
    expect_that!(plural.get("+2").and_then(|v| v.as_str()), some(eq("# fr")));

    // AI が値を埋めた場合はレビュー用マーカーを挟まない
    expect_that!(object.contains_key("👇 missing start 👇"), eq(false));
    expect_that!(object.contains_key("👆 missing end 👆"), eq(false));
}

#[googletest::test]
#[tokio::test]
async fn failing_translator_degrades_to_static_placeholders() {
    let dir = project(&[("app.js", "__`Hello`;\n")], &[("fr.json", "{}")]);

    let engine = ValidationEngine::new(options(dir.path(), true)).unwrap();
    let summary = engine.run_with(Some(&FailingTranslator)).await.unwrap();
    assert_that!(summary.files[0].fixed, eq(true));

    let json = read_json(&dir.path().join("locales/fr.json"));
    let object = json.as_object().unwrap();

    expect_that!(object.get("Hello"), some(eq(&serde_json::Value::Null)));
    expect_that!(object.contains_key("👇 missing start 👇"), eq(true));
}

#[googletest::test]
#[tokio::test]
async fn marker_only_file_is_a_hard_error() {
    let dir = project(
        &[("app.js", "const nothing = 1;\n")],
        &[("fr.json", r#"{"👇 missing start 👇": ""}"#)],
    );

    let summary = run(dir.path(), false).await;

    let report = &summary.files[0];
    expect_that!(report.states, elements_are![eq(&LocaleState::HasMissing)]);
    expect_that!(summary.passed(), eq(false));
}

#[googletest::test]
#[tokio::test]
async fn default_locale_tolerates_pending_plain_values() {
    let dir = project(
        &[("app.js", "__`Hello`;\n")],
        &[("en.json", r#"{"Hello": null}"#), ("fr.json", r#"{"Hello": null}"#)],
    );

    let engine_options = ValidatorOptions {
        default_locale: Some("en".to_string()),
        ..options(dir.path(), false)
    };
    let summary = ValidationEngine::new(engine_options).unwrap().run().await.unwrap();

    let en = summary.files.iter().find(|file| file.locale == "en").unwrap();
    let fr = summary.files.iter().find(|file| file.locale == "fr").unwrap();

    expect_that!(en.is_clean(), eq(true));
    expect_that!(fr.missing, elements_are![eq("Hello")]);
}

#[googletest::test]
#[tokio::test]
async fn scanned_usage_drives_missing_report() {
    let dir = project(
        &[("app.js", "\nconst a = __`Missing`;\n")],
        &[("fr.json", "{}")],
    );

    let summary = run(dir.path(), false).await;

    expect_that!(summary.files[0].missing, elements_are![eq("Missing")]);
    expect_that!(summary.scanned_files, eq(1));
}
