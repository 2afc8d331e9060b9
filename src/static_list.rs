//! Static list evaluation for enumerable expansion.
//!
//! Decides at compile time whether an iterable or options expression is a
//! literal array the engine may enumerate. Anything it cannot prove literal
//! returns `None`; the caller falls back to the parameterized form.

use oxc_allocator::Allocator;
use oxc_ast::ast::{Expression, ObjectPropertyKind, PropertyKey};
use oxc_parser::Parser;
use oxc_span::SourceType;

/// Label-bearing fields accepted on option objects, in lookup order.
const LABELISH_FIELDS: &[&str] = &["label", "text", "title", "name"];

/// Literal values of an array of strings / no-substitution template strings.
/// Any non-literal element forces `None`.
pub fn literal_strings(source: &str) -> Option<Vec<String>> {
    eval_array(source, |expr| literal_string(expr))
}

/// Literal labels of an options array: plain strings, or object literals
/// carrying one literal label-ish field.
pub fn literal_labels(source: &str) -> Option<Vec<String>> {
    eval_array(source, |expr| {
        literal_string(expr).or_else(|| object_label(expr))
    })
}

/// Literal value of a source that is one plain string expression.
pub fn literal_single_string(source: &str) -> Option<String> {
    eval_expression(source, |expr| literal_string(expr))
}

/// Literal `name` field of a location-descriptor object expression.
pub fn literal_route_name(source: &str) -> Option<String> {
    eval_expression(source, |expr| {
        let Expression::ObjectExpression(obj) = expr else {
            return None;
        };
        for prop in &obj.properties {
            if let ObjectPropertyKind::ObjectProperty(p) = prop {
                if property_key_name(&p.key).as_deref() == Some("name") {
                    return literal_string(unwrap_parens(&p.value));
                }
            }
        }
        None
    })
}

fn eval_expression(
    source: &str,
    extract: impl Fn(&Expression) -> Option<String>,
) -> Option<String> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return None;
    }
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_typescript(true).with_module(true);
    let expr = Parser::new(&allocator, trimmed, source_type)
        .parse_expression()
        .ok()?;
    extract(unwrap_parens(&expr))
}

fn eval_array(
    source: &str,
    element: impl Fn(&Expression) -> Option<String>,
) -> Option<Vec<String>> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return None;
    }

    let allocator = Allocator::default();
    let source_type = SourceType::default().with_typescript(true).with_module(true);
    let expr = Parser::new(&allocator, trimmed, source_type)
        .parse_expression()
        .ok()?;

    let Expression::ArrayExpression(arr) = unwrap_parens(&expr) else {
        return None;
    };

    let mut values = Vec::with_capacity(arr.elements.len());
    for elem in &arr.elements {
        let value = element(unwrap_parens(elem.as_expression()?))?;
        values.push(value);
    }
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

fn unwrap_parens<'a, 'b>(expr: &'b Expression<'a>) -> &'b Expression<'a> {
    match expr {
        Expression::ParenthesizedExpression(paren) => unwrap_parens(&paren.expression),
        other => other,
    }
}

fn literal_string(expr: &Expression) -> Option<String> {
    match expr {
        Expression::StringLiteral(s) => Some(s.value.to_string()),
        Expression::TemplateLiteral(tpl) if tpl.expressions.is_empty() => {
            tpl.quasis.first().map(|q| {
                q.value
                    .cooked
                    .as_ref()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| q.value.raw.to_string())
            })
        }
        _ => None,
    }
}

fn object_label(expr: &Expression) -> Option<String> {
    let Expression::ObjectExpression(obj) = expr else {
        return None;
    };
    for field in LABELISH_FIELDS {
        for prop in &obj.properties {
            if let ObjectPropertyKind::ObjectProperty(p) = prop {
                if property_key_name(&p.key).as_deref() == Some(field) {
                    return literal_string(unwrap_parens(&p.value));
                }
            }
        }
    }
    None
}

fn property_key_name(key: &PropertyKey) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(id) => Some(id.name.to_string()),
        PropertyKey::StringLiteral(s) => Some(s.value.to_string()),
        _ => None,
    }
}
