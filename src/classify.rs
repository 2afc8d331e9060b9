//! Expression classification for identifier naming.
//!
//! Parses a conservative subset of the host expression language and extracts
//! one stable naming token. Best effort: expression grammar first, statement
//! grammar as fallback; anything unparseable or unstable yields `None`, never
//! an error. Tokens come from source structure only, never from runtime
//! values and never from identifiers this engine generated.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    AssignmentTarget, CallExpression, Expression, Statement,
};
use oxc_ast_visit::Visit;
use oxc_parser::Parser;
use oxc_span::SourceType;

/// Where the winning token came from. Recorded for diagnostics; precedence
/// follows the declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOrigin {
    EmitLiteral,
    AssignmentTarget,
    Callee,
    Arguments,
    Identifier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingSignal {
    pub token: String,
    pub origin: SignalOrigin,
}

impl NamingSignal {
    fn new(token: impl Into<String>, origin: SignalOrigin) -> Self {
        NamingSignal {
            token: token.into(),
            origin,
        }
    }
}

/// Extracts exactly one naming signal from raw directive source text.
pub fn classify(source: &str) -> Option<NamingSignal> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return None;
    }

    let allocator = Allocator::default();
    let source_type = SourceType::default()
        .with_typescript(true)
        .with_module(true)
        .with_jsx(true);

    match Parser::new(&allocator, trimmed, source_type).parse_expression() {
        Ok(expr) => {
            let mut collector = EmitCollector { found: None };
            collector.visit_expression(&expr);
            if let Some(event) = collector.found {
                return Some(NamingSignal::new(event, SignalOrigin::EmitLiteral));
            }
            signal_of_expression(&expr)
        }
        Err(_) => {
            let ret = Parser::new(&allocator, trimmed, source_type).parse();
            if !ret.errors.is_empty() {
                return None;
            }
            let mut collector = EmitCollector { found: None };
            collector.visit_program(&ret.program);
            if let Some(event) = collector.found {
                return Some(NamingSignal::new(event, SignalOrigin::EmitLiteral));
            }
            ret.program
                .body
                .iter()
                .find_map(|stmt| signal_of_statement(stmt))
        }
    }
}

/// Finds the literal string argument of an emit-style call anywhere in the
/// tree, nested blocks included. The first hit wins over any outer call name.
struct EmitCollector {
    found: Option<String>,
}

impl<'a> Visit<'a> for EmitCollector {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if self.found.is_none() && callee_is_emit(&call.callee) {
            if let Some(Expression::StringLiteral(event)) = call
                .arguments
                .first()
                .and_then(|a| a.as_expression())
                .map(unwrap_parens)
            {
                self.found = Some(event.value.to_string());
            }
        }
        oxc_ast_visit::walk::walk_call_expression(self, call);
    }
}

fn callee_is_emit(callee: &Expression) -> bool {
    match unwrap_parens(callee) {
        Expression::Identifier(id) => id.name == "emit" || id.name == "$emit",
        Expression::StaticMemberExpression(member) => {
            member.property.name == "emit" || member.property.name == "$emit"
        }
        _ => false,
    }
}

fn signal_of_statement(stmt: &Statement) -> Option<NamingSignal> {
    match stmt {
        Statement::ExpressionStatement(expr_stmt) => signal_of_expression(&expr_stmt.expression),
        Statement::ReturnStatement(ret) => ret.argument.as_ref().and_then(signal_of_expression),
        Statement::BlockStatement(block) => {
            if block.body.len() == 1 {
                signal_of_statement(&block.body[0])
            } else {
                block.body.iter().find_map(|s| match s {
                    Statement::ReturnStatement(ret) => {
                        ret.argument.as_ref().and_then(signal_of_expression)
                    }
                    _ => None,
                })
            }
        }
        _ => None,
    }
}

fn signal_of_expression(expr: &Expression) -> Option<NamingSignal> {
    match unwrap_parens(expr) {
        Expression::ArrowFunctionExpression(arrow) => {
            let statements = &arrow.body.statements;
            if statements.len() == 1 {
                signal_of_statement(&statements[0])
            } else {
                statements.iter().find_map(|s| match s {
                    Statement::ReturnStatement(ret) => {
                        ret.argument.as_ref().and_then(signal_of_expression)
                    }
                    _ => None,
                })
            }
        }
        Expression::AssignmentExpression(assign) => {
            assignment_target_identity(&assign.left)
                .map(|token| NamingSignal::new(token, SignalOrigin::AssignmentTarget))
        }
        Expression::CallExpression(call) => signal_of_call(call),
        Expression::Identifier(id) => {
            Some(NamingSignal::new(id.name.as_str(), SignalOrigin::Identifier))
        }
        Expression::StaticMemberExpression(member) => Some(NamingSignal::new(
            member.property.name.as_str(),
            SignalOrigin::Identifier,
        )),
        Expression::ComputedMemberExpression(member) => {
            // `a['b']` counts, dynamic subscripts do not.
            if let Expression::StringLiteral(key) = unwrap_parens(&member.expression) {
                Some(NamingSignal::new(
                    key.value.as_str(),
                    SignalOrigin::Identifier,
                ))
            } else {
                None
            }
        }
        Expression::UnaryExpression(unary) => signal_of_expression(&unary.argument),
        Expression::AwaitExpression(awaited) => signal_of_expression(&awaited.argument),
        Expression::SequenceExpression(seq) => {
            seq.expressions.iter().find_map(signal_of_expression)
        }
        _ => None,
    }
}

/// Identity of an assignment target. `x.value = …` resolves to `x`, not
/// `value`, since `.value` is the host's unwrap convention, not a name.
fn assignment_target_identity(target: &AssignmentTarget) -> Option<String> {
    match target {
        AssignmentTarget::AssignmentTargetIdentifier(id) => Some(id.name.to_string()),
        AssignmentTarget::StaticMemberExpression(member) => {
            if member.property.name == "value" {
                member_tail(&member.object)
            } else {
                Some(member.property.name.to_string())
            }
        }
        AssignmentTarget::ComputedMemberExpression(member) => {
            if let Expression::StringLiteral(key) = unwrap_parens(&member.expression) {
                Some(key.value.to_string())
            } else {
                None
            }
        }
        _ => None,
    }
}

fn signal_of_call(call: &CallExpression) -> Option<NamingSignal> {
    let callee = member_tail(&call.callee);
    let suffix = stable_argument_suffix(call);

    match (callee, suffix) {
        (Some(name), Some(suffix)) => Some(NamingSignal::new(
            format!("{}-{}", name, suffix),
            SignalOrigin::Callee,
        )),
        (Some(name), None) => Some(NamingSignal::new(name, SignalOrigin::Callee)),
        (None, Some(suffix)) => Some(NamingSignal::new(suffix, SignalOrigin::Arguments)),
        (None, None) => None,
    }
}

/// Short stable suffix from the call's first 1–2 arguments: literals, dotted
/// enum-like constants, and PascalCase/UPPER_CASE identifiers qualify.
/// Lower-camel identifiers are excluded; their values are too unstable to
/// name generated members after.
fn stable_argument_suffix(call: &CallExpression) -> Option<String> {
    let mut parts = Vec::new();
    for arg in call.arguments.iter().take(2) {
        let Some(expr) = arg.as_expression() else {
            break;
        };
        match stable_token(unwrap_parens(expr)) {
            Some(token) => parts.push(token),
            None => break,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("-"))
    }
}

const MAX_STABLE_TOKEN_LEN: usize = 24;

fn stable_token(expr: &Expression) -> Option<String> {
    let token = match expr {
        Expression::StringLiteral(s) => {
            let value = s.value.trim();
            if value.is_empty() {
                return None;
            }
            value.to_string()
        }
        Expression::NumericLiteral(n) => {
            if n.value.fract() == 0.0 && n.value.is_finite() {
                format!("{}", n.value as i64)
            } else {
                n.value.to_string()
            }
        }
        Expression::BooleanLiteral(b) => b.value.to_string(),
        Expression::Identifier(id) => {
            if starts_uppercase(&id.name) {
                id.name.to_string()
            } else {
                return None;
            }
        }
        Expression::StaticMemberExpression(member) => {
            // Dotted enum-like constant: `Mode.DARK` → DARK.
            if root_is_uppercase_identifier(&member.object) || starts_uppercase(&member.property.name)
            {
                member.property.name.to_string()
            } else {
                return None;
            }
        }
        _ => return None,
    };
    if token.len() > MAX_STABLE_TOKEN_LEN {
        return None;
    }
    Some(token)
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

fn root_is_uppercase_identifier(expr: &Expression) -> bool {
    match unwrap_parens(expr) {
        Expression::Identifier(id) => starts_uppercase(&id.name),
        Expression::StaticMemberExpression(member) => root_is_uppercase_identifier(&member.object),
        _ => false,
    }
}

/// Member-chain tail: `a.b.c` → `c`, `a['b']` → `b` for literal subscripts.
fn member_tail(expr: &Expression) -> Option<String> {
    match unwrap_parens(expr) {
        Expression::Identifier(id) => Some(id.name.to_string()),
        Expression::StaticMemberExpression(member) => Some(member.property.name.to_string()),
        Expression::ComputedMemberExpression(member) => {
            if let Expression::StringLiteral(key) = unwrap_parens(&member.expression) {
                Some(key.value.to_string())
            } else {
                None
            }
        }
        _ => None,
    }
}

fn unwrap_parens<'a, 'b>(expr: &'b Expression<'a>) -> &'b Expression<'a> {
    match expr {
        Expression::ParenthesizedExpression(paren) => unwrap_parens(&paren.expression),
        other => other,
    }
}
