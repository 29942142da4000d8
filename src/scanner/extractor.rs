//! Extracts tagged-template i18n calls from source code using tree-sitter.

use tree_sitter::{
    Node,
    Parser,
};

use crate::key::derive_key;
use crate::scanner::types::{
    CallForm,
    ScanError,
    ScanOutcome,
    ScriptLanguage,
    UsageLocation,
    call_form_for,
    may_contain_calls,
};

/// Scans one source file for tagged-template i18n calls.
///
/// The file's text is checked for the recognized accessor substrings first;
/// files that cannot contain a call are skipped without parsing.
///
/// # Errors
/// Returns `ScanError` if the tree-sitter language cannot be set or the file
/// fails to parse.
pub fn scan_source(
    path: &str,
    text: &str,
    language: ScriptLanguage,
) -> Result<ScanOutcome, ScanError> {
    let mut outcome = ScanOutcome::default();

    if !may_contain_calls(text) {
        return Ok(outcome);
    }

    let mut parser = Parser::new();
    parser.set_language(&language.tree_sitter_language()).map_err(ScanError::LanguageSetup)?;
    let tree = parser.parse(text, None).ok_or(ScanError::ParseFailed)?;

    walk(tree.root_node(), path, text, &mut outcome);

    Ok(outcome)
}

/// Recursively visits every node, matching tagged templates along the way.
fn walk(node: Node<'_>, path: &str, text: &str, outcome: &mut ScanOutcome) {
    if node.kind() == "call_expression" {
        match_tagged_template(node, path, text, outcome);
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, path, text, outcome);
    }
}

/// Records the call site if `node` is a tagged template of a recognized
/// accessor. All four forms share this one matcher; the call-form table
/// supplies the classification.
fn match_tagged_template(node: Node<'_>, path: &str, text: &str, outcome: &mut ScanOutcome) {
    // タグ付きテンプレートは arguments が template_string の call_expression
    let Some(template) = node.child_by_field_name("arguments") else {
        return;
    };
    if template.kind() != "template_string" {
        return;
    }

    let Some(tag_node) = node.child_by_field_name("function") else {
        return;
    };
    let Some(tag) = tag_name(tag_node, text) else {
        return;
    };
    let Some(form) = call_form_for(&tag) else {
        return;
    };

    let Some((segments, substitutions)) = template_parts(template, text) else {
        return;
    };

    let key = derive_key(&segments);
    let all_primitive = substitutions
        .iter()
        .all(|sub| sub.named_child(0).is_none_or(|expr| is_primitive_expr(expr)));

    record_call(outcome, form, key, path, tag_node, substitutions.len(), all_primitive);
}

/// Pushes one occurrence into the outcome, located at the tag node.
fn record_call(
    outcome: &mut ScanOutcome,
    form: &CallForm,
    key: String,
    path: &str,
    tag_node: Node<'_>,
    interpolation_count: usize,
    all_primitive: bool,
) {
    let location =
        UsageLocation { file: path.to_string(), position: tag_node.start_position().into() };
    outcome.record(form, key, location, interpolation_count, all_primitive);
}

/// Extracts the text content of a node from the source.
fn node_text<'s>(node: Node<'_>, text: &'s str) -> Option<&'s str> {
    text.get(node.byte_range())
}

/// Resolves the accessor name a template is tagged with.
///
/// Handles a bare identifier (`` __`...` ``), a property access off any
/// object (`` i18n.__`...` ``), and, for the counted forms, a call
/// expression whose callee matches either (`` __p(count)`...` ``); the count
/// argument itself is ignored.
fn tag_name(node: Node<'_>, text: &str) -> Option<String> {
    match node.kind() {
        "identifier" => node_text(node, text).map(ToString::to_string),
        "member_expression" => {
            let property = node.child_by_field_name("property")?;
            if property.kind() == "property_identifier" {
                node_text(property, text).map(ToString::to_string)
            } else {
                None
            }
        }
        "call_expression" => {
            let callee = node.child_by_field_name("function")?;
            // ネストした呼び出し (`__p(n)(m)` など) はタグとして扱わない
            if callee.kind() == "call_expression" {
                return None;
            }
            tag_name(callee, text)
        }
        _ => None,
    }
}

/// Splits a `template_string` node into its literal segments and
/// substitution nodes. Segments are sliced from the source between the
/// backticks and the `${...}` spans, so the scanner does not depend on the
/// grammar's fragment node kinds.
fn template_parts<'s, 't>(
    template: Node<'t>,
    text: &'s str,
) -> Option<(Vec<&'s str>, Vec<Node<'t>>)> {
    let substitutions: Vec<Node<'t>> = {
        let mut cursor = template.walk();
        template
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "template_substitution")
            .collect()
    };

    let mut segments = Vec::with_capacity(substitutions.len() + 1);
    // 開きバッククォートの直後から
    let mut segment_start = template.start_byte() + 1;
    let content_end = template.end_byte().checked_sub(1)?;

    for substitution in &substitutions {
        segments.push(text.get(segment_start..substitution.start_byte())?);
        segment_start = substitution.end_byte();
    }
    segments.push(text.get(segment_start..content_end)?);

    Some((segments, substitutions))
}

/// Recursive structural rule for "is this interpolation primitive".
///
/// Literals, identifiers, property accesses and call expressions are
/// primitive; ternaries and binaries are primitive when every operand branch
/// is; parenthesized expressions inherit the inner classification. JSX
/// elements and fragments are never primitive, and neither is anything else.
fn is_primitive_expr(node: Node<'_>) -> bool {
    match node.kind() {
        "string" | "template_string" | "number" | "true" | "false" | "null" | "undefined"
        | "identifier" | "member_expression" | "call_expression" => true,
        "ternary_expression" => {
            let consequence = node.child_by_field_name("consequence");
            let alternative = node.child_by_field_name("alternative");
            matches!((consequence, alternative), (Some(left), Some(right))
                if is_primitive_expr(left) && is_primitive_expr(right))
        }
        "binary_expression" => {
            let left = node.child_by_field_name("left");
            let right = node.child_by_field_name("right");
            matches!((left, right), (Some(left), Some(right))
                if is_primitive_expr(left) && is_primitive_expr(right))
        }
        "parenthesized_expression" => {
            node.named_child(0).is_some_and(|inner| is_primitive_expr(inner))
        }
        _ => false,
    }
}
