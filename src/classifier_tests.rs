//! Classification cases over raw directive source text.

use crate::classify::{classify, SignalOrigin};

fn token(source: &str) -> Option<String> {
    classify(source).map(|s| s.token)
}

#[test]
fn bare_identifier_and_member_tail() {
    assert_eq!(token("save"), Some("save".to_string()));
    assert_eq!(token("form.submit"), Some("submit".to_string()));
    assert_eq!(token("handlers['refresh']"), Some("refresh".to_string()));
    assert_eq!(token("handlers[current]"), None);
}

#[test]
fn call_callee_identity() {
    let signal = classify("save()").expect("signal");
    assert_eq!(signal.token, "save");
    assert_eq!(signal.origin, SignalOrigin::Callee);

    assert_eq!(token("store.actions.reset()"), Some("reset".to_string()));
    assert_eq!(token("handlers['toggle']()"), Some("toggle".to_string()));
}

#[test]
fn arrow_bodies_recurse() {
    assert_eq!(token("() => save()"), Some("save".to_string()));
    assert_eq!(token("() => { save() }"), Some("save".to_string()));
    assert_eq!(token("() => { return save() }"), Some("save".to_string()));
    assert_eq!(token("(e) => submitForm(e)"), Some("submitForm".to_string()));
}

#[test]
fn emit_literal_wins_over_callee() {
    let signal = classify("emit('close')").expect("signal");
    assert_eq!(signal.token, "close");
    assert_eq!(signal.origin, SignalOrigin::EmitLiteral);

    // Nested inside an arrow block, the emit literal still beats the
    // enclosing call name.
    let nested = classify("() => { wrap(emit('confirm')) }").expect("signal");
    assert_eq!(nested.token, "confirm");
    assert_eq!(nested.origin, SignalOrigin::EmitLiteral);

    assert_eq!(token("$emit('update')"), Some("update".to_string()));
    assert_eq!(token("ctx.emit('pick')"), Some("pick".to_string()));
    // Non-literal event names give no emit signal; the callee tail wins.
    assert_eq!(token("emit(eventName)"), Some("emit".to_string()));
}

#[test]
fn assignment_targets() {
    let signal = classify("open = true").expect("signal");
    assert_eq!(signal.token, "open");
    assert_eq!(signal.origin, SignalOrigin::AssignmentTarget);

    // `.value` is the unwrap convention, not a name.
    assert_eq!(token("drawer.value = true"), Some("drawer".to_string()));
    assert_eq!(token("state.mode = 'dark'"), Some("mode".to_string()));
    assert_eq!(token("flags['beta'] = true"), Some("beta".to_string()));
}

#[test]
fn stable_argument_suffixes() {
    assert_eq!(token("setMode('dark')"), Some("setMode-dark".to_string()));
    assert_eq!(token("setMode(Mode.DARK)"), Some("setMode-DARK".to_string()));
    assert_eq!(token("goto(2)"), Some("goto-2".to_string()));
    assert_eq!(token("toggle(true)"), Some("toggle-true".to_string()));
    assert_eq!(
        token("setRange('a', 'b')"),
        Some("setRange-a-b".to_string())
    );
    // Lower-camel identifier arguments are unstable and excluded.
    assert_eq!(token("select(item)"), Some("select".to_string()));
    assert_eq!(token("select(Item)"), Some("select-Item".to_string()));
}

#[test]
fn statement_fallback() {
    assert_eq!(token("save(); refresh()"), Some("save".to_string()));
    assert_eq!(
        token("emit('done'); cleanup()"),
        Some("done".to_string())
    );
}

#[test]
fn unparseable_and_empty_yield_nothing() {
    assert_eq!(token(""), None);
    assert_eq!(token("   "), None);
    assert_eq!(token("=> ("), None);
    assert_eq!(token("1 + 2"), None);
    assert_eq!(token("'just a string'"), None);
}
