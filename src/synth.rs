//! Identifier synthesis: one deterministic value per qualifying element.
//!
//! Each qualification category has its own format. Values embed at most one
//! substitution placeholder, always bound to the enclosing loop key; every
//! other fragment is fixed at compile time.

use crate::error::{PomError, ERR_ANONYMOUS_SUBMIT};
use crate::ir::{ElementNode, IdentifierValue};
use crate::naming::pascal_case;
use crate::roles::Role;
use crate::static_list;

/// What the synthesizer hands the naming resolver for one element.
#[derive(Debug, Clone)]
pub struct SynthOutput {
    pub value: IdentifierValue,
    /// Correlated prefix shared by option children, when the role wants one.
    pub option_prefix: Option<IdentifierValue>,
    /// Semantic hint feeding the member names.
    pub hint: Option<String>,
    /// Secondary hint tried under the `error` collision policy.
    pub alt_hint: Option<String>,
}

impl SynthOutput {
    fn plain(value: IdentifierValue, hint: Option<String>) -> Self {
        SynthOutput {
            value,
            option_prefix: None,
            hint,
            alt_hint: None,
        }
    }
}

/// Configured wrapper role with a bound value/model attribute:
/// `<unit>-<Token>-<roleSuffix>`, plus the correlated option prefix when the
/// role requires one.
pub fn wrapper_value(unit: &str, model_token: &str, role: &Role, option_prefix: bool) -> SynthOutput {
    let token = pascal_case(model_token);
    let value = IdentifierValue::Literal(format!("{}-{}-{}", unit, token, role.id_suffix()));
    let prefix = if option_prefix {
        Some(IdentifierValue::Literal(format!(
            "{}-{}-option",
            unit, token
        )))
    } else {
        None
    };
    SynthOutput {
        value,
        option_prefix: prefix,
        hint: Some(model_token.to_string()),
        alt_hint: None,
    }
}

/// Navigation element. Priority: repeating-scope key, else a literal
/// target-name (plus static inner text as a tiebreaker hint), else a
/// templated fallback embedding the raw location expression. A missing or
/// empty location descriptor degrades to a literal, never to a template with
/// an empty substitution.
pub fn navigation_value(
    unit: &str,
    el: &ElementNode,
    key: Option<&str>,
    raw_location: &str,
    target_name: Option<&str>,
) -> SynthOutput {
    if let Some(key) = key {
        let value = IdentifierValue::Template(format!("{}-${{{}}}-link", unit, key));
        return SynthOutput {
            value,
            option_prefix: None,
            hint: target_name.map(str::to_string),
            alt_hint: el.static_inner_text(),
        };
    }

    if let Some(name) = target_name {
        let mut token = pascal_case(name);
        // Distinct static link text disambiguates two links to one target.
        if let Some(text) = el.static_inner_text() {
            let text_cased = pascal_case(&text);
            if !text_cased.is_empty() && !text_cased.eq_ignore_ascii_case(&token) {
                token.push('-');
                token.push_str(&text_cased);
            }
        }
        let value = IdentifierValue::Literal(format!("{}-{}-link", unit, token));
        return SynthOutput {
            value,
            option_prefix: None,
            hint: Some(name.to_string()),
            alt_hint: el.static_inner_text(),
        };
    }

    let raw = raw_location.trim();
    if raw.is_empty() {
        let text = el.static_inner_text();
        let value = match text.as_deref().map(pascal_case).filter(|t| !t.is_empty()) {
            Some(token) => IdentifierValue::Literal(format!("{}-{}-link", unit, token)),
            None => IdentifierValue::Literal(format!("{}-link", unit)),
        };
        return SynthOutput::plain(value, text);
    }

    let value = IdentifierValue::Template(format!("{}-${{{}}}-link", unit, raw));
    SynthOutput {
        value,
        option_prefix: None,
        hint: el.static_inner_text(),
        alt_hint: None,
    }
}

/// Literal target name of a location descriptor, when one is statically
/// derivable: a literal string path takes its last segment; an object
/// literal takes its literal `name` field.
pub fn literal_target_name(raw_location: &str, is_bound: bool) -> Option<String> {
    let trimmed = raw_location.trim();
    if trimmed.is_empty() {
        return None;
    }
    if !is_bound {
        return path_tail(trimmed);
    }
    if let Some(name) = static_list::literal_route_name(trimmed) {
        return Some(name);
    }
    static_list::literal_single_string(trimmed).and_then(|path| path_tail(&path))
}

fn path_tail(path: &str) -> Option<String> {
    let cleaned = path.split(['?', '#']).next().unwrap_or(path);
    let tail = cleaned
        .rsplit('/')
        .find(|segment| !segment.is_empty() && !segment.starts_with(':'))
        .unwrap_or("");
    if tail.is_empty() {
        if cleaned.trim_matches('/').is_empty() {
            Some("home".to_string())
        } else {
            None
        }
    } else {
        Some(tail.to_string())
    }
}

/// Generic handler binding: `<unit>_<Token>[-<key>]-<roleSuffix>`.
pub fn handler_value(unit: &str, token: &str, key: Option<&str>, role: &Role) -> SynthOutput {
    let token_cased = pascal_case(token);
    let value = match key {
        Some(key) => IdentifierValue::Template(format!(
            "{}_{}-${{{}}}-{}",
            unit,
            token_cased,
            key,
            role.id_suffix()
        )),
        None => IdentifierValue::Literal(format!(
            "{}_{}-{}",
            unit,
            token_cased,
            role.id_suffix()
        )),
    };
    SynthOutput::plain(value, Some(token.to_string()))
}

/// Activation directive: `<unit>[-<key>]-<Token>-<roleSuffix>`; with no
/// classified token the identifier is role-only.
pub fn activation_value(
    unit: &str,
    token: Option<&str>,
    key: Option<&str>,
    role: &Role,
) -> SynthOutput {
    let mut parts = String::from(unit);
    let mut templated = false;
    if let Some(key) = key {
        parts.push_str(&format!("-${{{}}}", key));
        templated = true;
    }
    if let Some(token) = token {
        let cased = pascal_case(token);
        if !cased.is_empty() {
            parts.push('-');
            parts.push_str(&cased);
        }
    }
    parts.push('-');
    parts.push_str(role.id_suffix());

    let value = if templated {
        IdentifierValue::Template(parts)
    } else {
        IdentifierValue::Literal(parts)
    };
    SynthOutput::plain(value, token.map(str::to_string))
}

/// Submit control: `<unit>-<idOrNameOrText>-<roleSuffix>`. There is no safe
/// fallback name for an anonymous submit, so the absence of any signal is
/// fatal.
pub fn submit_value(
    unit: &str,
    el: &ElementNode,
    role: &Role,
    file: &str,
) -> Result<SynthOutput, PomError> {
    let signal = el
        .attr_value("id")
        .or_else(|| el.attr_value("name"))
        .map(str::to_string)
        .or_else(|| el.static_inner_text());

    let Some(signal) = signal.filter(|s| !s.trim().is_empty()) else {
        return Err(PomError::with_details(
            ERR_ANONYMOUS_SUBMIT,
            &format!(
                "submit control <{}> in unit \"{}\" has no id, name, or static text to derive an identity from",
                el.tag, unit
            ),
            unit,
            file,
            el.location,
            None,
            vec![
                "Give the element an id or name attribute.".to_string(),
                "Or provide static button text.".to_string(),
            ],
        ));
    };

    let cased = pascal_case(&signal);
    let value = IdentifierValue::Literal(format!("{}-{}-{}", unit, cased, role.id_suffix()));
    Ok(SynthOutput::plain(value, Some(signal)))
}
