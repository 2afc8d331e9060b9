//! Template tree IR consumed by the synthesis engine.
//!
//! The host compiler hands us an already-parsed tree per source unit. The
//! engine never re-parses template text; the only mutation it performs is
//! `ElementNode::upsert_attribute` for the automation identifier.

use serde::{Deserialize, Serialize};

/// Host-assigned node identity, stable for the lifetime of one compiled tree.
pub type NodeId = u32;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

/// One attribute or directive: name mapped to its raw source expression text.
///
/// `is_constant` is a host-provided hint: `Some(false)` marks a source the
/// host knows to be non-constant, which vetoes static enumeration even when
/// the text itself would parse as a literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeIR {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub is_constant: Option<bool>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TemplateNode {
    Element(ElementNode),
    Text(TextNode),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub value: String,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub id: NodeId,
    pub tag: String,
    pub attributes: Vec<AttributeIR>,
    pub children: Vec<TemplateNode>,
    #[serde(default)]
    pub self_closing: bool,
    #[serde(default)]
    pub location: SourceLocation,
}

impl ElementNode {
    pub fn attr(&self, name: &str) -> Option<&AttributeIR> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attr(name).map(|a| a.value.as_str())
    }

    /// Looks up `name` in both its static and bound (`:`-prefixed) forms.
    /// The bound form wins when both are present.
    pub fn binding(&self, name: &str) -> Option<&AttributeIR> {
        let bound = format!(":{}", name);
        self.attr(&bound).or_else(|| self.attr(name))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// The single mutation the engine performs on the tree: insert or replace
    /// an attribute. Replacing removes both the static and the bound form of
    /// the name so a keyed identifier never coexists with a stale literal one.
    pub fn upsert_attribute(&mut self, name: &str, value: String) {
        let plain = name.trim_start_matches(':');
        let bound = format!(":{}", plain);
        let location = self
            .attr(plain)
            .or_else(|| self.attr(&bound))
            .map(|a| a.location)
            .unwrap_or(self.location);
        self.attributes
            .retain(|a| a.name != plain && a.name != bound);
        self.attributes.push(AttributeIR {
            name: name.to_string(),
            value,
            is_constant: None,
            location,
        });
    }

    /// Concatenated text of the element's children when every child is a
    /// static text node. Any element child makes the inner text non-static.
    pub fn static_inner_text(&self) -> Option<String> {
        let mut out = String::new();
        for child in &self.children {
            match child {
                TemplateNode::Text(t) => {
                    if !out.is_empty() && !t.value.trim().is_empty() {
                        out.push(' ');
                    }
                    out.push_str(t.value.trim());
                }
                TemplateNode::Element(_) => return None,
            }
        }
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }
}

/// An automation identifier: either a fixed literal or a template string
/// carrying exactly one `${…}` substitution bound to a per-iteration key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum IdentifierValue {
    Literal(String),
    Template(String),
}

impl IdentifierValue {
    pub fn is_templated(&self) -> bool {
        matches!(self, IdentifierValue::Template(_))
    }

    pub fn text(&self) -> &str {
        match self {
            IdentifierValue::Literal(s) | IdentifierValue::Template(s) => s,
        }
    }

    pub fn substitution_count(&self) -> usize {
        count_substitutions(self.text())
    }

    /// The inner expression of the single substitution, when there is exactly
    /// one. `None` for literals and for malformed or multi-hole templates.
    pub fn single_substitution(&self) -> Option<&str> {
        if !self.is_templated() || self.substitution_count() != 1 {
            return None;
        }
        let text = self.text();
        let start = text.find("${")? + 2;
        let end = start + text[start..].find('}')?;
        Some(text[start..end].trim())
    }

    /// Replaces the single substitution with a literal value, collapsing the
    /// template into a literal identifier.
    pub fn substitute(&self, replacement: &str) -> IdentifierValue {
        match self {
            IdentifierValue::Literal(s) => IdentifierValue::Literal(s.clone()),
            IdentifierValue::Template(s) => {
                if let (Some(start), Some(_)) = (s.find("${"), self.single_substitution()) {
                    let end = start + s[start..].find('}').unwrap_or(s.len() - start) + 1;
                    let mut out = String::with_capacity(s.len());
                    out.push_str(&s[..start]);
                    out.push_str(replacement);
                    out.push_str(&s[end.min(s.len())..]);
                    IdentifierValue::Literal(out)
                } else {
                    IdentifierValue::Template(s.clone())
                }
            }
        }
    }
}

pub fn count_substitutions(text: &str) -> usize {
    let mut count = 0;
    let mut rest = text;
    while let Some(idx) = rest.find("${") {
        count += 1;
        rest = &rest[idx + 2..];
    }
    count
}
