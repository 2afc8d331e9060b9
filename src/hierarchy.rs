//! Child→parent index built incrementally during traversal.
//!
//! Every node is registered before its children are visited, so ancestor
//! queries during a pre-order walk always see a complete chain up to the
//! root. The map is rebuilt per compiled unit.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::dialect;
use crate::ir::{ElementNode, NodeId};
use crate::static_list;

/// A parsed repeating-scope directive: `item in items` / `(item, i) of items`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopBinding {
    /// Per-iteration key variable.
    pub key: String,
    /// Raw iterable expression text.
    pub source: String,
    /// Host constancy hint for the iterable, when provided.
    pub is_constant: Option<bool>,
}

/// Splits a loop directive into its key variable and iterable source.
/// Unrecognized shapes yield `None` rather than a guessed key.
pub fn parse_loop_binding(value: &str, is_constant: Option<bool>) -> Option<LoopBinding> {
    let (lhs, rhs) = split_loop_parts(value)?;

    lazy_static! {
        static ref KEY_VAR: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("static pattern");
    }

    let lhs = lhs.trim();
    let key = if let Some(inner) = lhs.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        inner.split(',').next()?.trim()
    } else {
        lhs
    };
    if !KEY_VAR.is_match(key) {
        return None;
    }

    let source = rhs.trim();
    if source.is_empty() {
        return None;
    }

    Some(LoopBinding {
        key: key.to_string(),
        source: source.to_string(),
        is_constant,
    })
}

fn split_loop_parts(value: &str) -> Option<(&str, &str)> {
    for sep in [" in ", " of "] {
        if let Some(idx) = value.find(sep) {
            return Some((&value[..idx], &value[idx + sep.len()..]));
        }
    }
    None
}

#[derive(Debug, Clone)]
struct AncestorRecord {
    parent: Option<NodeId>,
    loop_binding: Option<LoopBinding>,
    scoped_params: bool,
    conditional: Option<String>,
    self_closing: bool,
}

/// The per-unit ancestor index.
#[derive(Debug, Default)]
pub struct HierarchyMap {
    records: HashMap<NodeId, AncestorRecord>,
}

impl HierarchyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }

    /// Records a node at first visit, before its children are walked.
    pub fn register(&mut self, el: &ElementNode, parent: Option<NodeId>) {
        self.records.insert(
            el.id,
            AncestorRecord {
                parent,
                loop_binding: el
                    .attr(dialect::ATTR_LOOP)
                    .and_then(|a| parse_loop_binding(&a.value, a.is_constant)),
                scoped_params: scoped_region_with_params(el),
                conditional: conditional_branch(el),
                self_closing: el.self_closing,
            },
        );
    }

    /// Key variable of the nearest repeating scope. The node's own loop
    /// directive counts only when the node is self-closing; otherwise the
    /// loop repeats the node's children and the search starts at the parent.
    pub fn nearest_repeating_key(&self, id: NodeId) -> Option<String> {
        let record = self.records.get(&id)?;
        if record.self_closing {
            if let Some(binding) = &record.loop_binding {
                return Some(binding.key.clone());
            }
        }
        let mut current = record.parent;
        while let Some(pid) = current {
            let parent = self.records.get(&pid)?;
            if let Some(binding) = &parent.loop_binding {
                return Some(binding.key.clone());
            }
            current = parent.parent;
        }
        None
    }

    /// Whether any ancestor is a scoped region introducing new bindings.
    pub fn inside_scoped_region_with_params(&self, id: NodeId) -> bool {
        let mut current = self.records.get(&id).and_then(|r| r.parent);
        while let Some(pid) = current {
            let Some(parent) = self.records.get(&pid) else {
                return false;
            };
            if parent.scoped_params {
                return true;
            }
            current = parent.parent;
        }
        false
    }

    /// Condition text of the nearest conditional branch enclosing the node,
    /// its own branch directive included. Bare else branches report an empty
    /// condition.
    pub fn nearest_conditional_branch(&self, id: NodeId) -> Option<String> {
        let mut current = Some(id);
        while let Some(nid) = current {
            let record = self.records.get(&nid)?;
            if let Some(cond) = &record.conditional {
                return Some(cond.clone());
            }
            current = record.parent;
        }
        None
    }

    /// Literal string values of the immediately enclosing loop's iterable.
    /// Only the direct parent qualifies as "enclosing" here; a host mark of
    /// non-constant vetoes enumeration even when the text parses as literal.
    pub fn static_literals_of_enclosing_loop(&self, id: NodeId) -> Option<Vec<String>> {
        let record = self.records.get(&id)?;
        let binding = if record.self_closing && record.loop_binding.is_some() {
            record.loop_binding.as_ref()
        } else {
            let parent = self.records.get(&record.parent?)?;
            parent.loop_binding.as_ref()
        }?;

        if binding.is_constant == Some(false) {
            return None;
        }
        static_list::literal_strings(&binding.source)
    }
}

fn scoped_region_with_params(el: &ElementNode) -> bool {
    el.tag == dialect::SCOPED_REGION_TAG
        && el
            .attributes
            .iter()
            .any(|a| dialect::is_scoped_region_attr(&a.name) && !a.value.trim().is_empty())
}

fn conditional_branch(el: &ElementNode) -> Option<String> {
    if let Some(value) = el
        .attr_value(dialect::ATTR_IF)
        .or_else(|| el.attr_value(dialect::ATTR_ELSE_IF))
    {
        return Some(value.trim().to_string());
    }
    if el.has_attr(dialect::ATTR_ELSE) {
        return Some(String::new());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{AttributeIR, SourceLocation};

    fn element(id: NodeId, tag: &str, attrs: &[(&str, &str)], self_closing: bool) -> ElementNode {
        ElementNode {
            id,
            tag: tag.to_string(),
            attributes: attrs
                .iter()
                .map(|(n, v)| AttributeIR {
                    name: n.to_string(),
                    value: v.to_string(),
                    is_constant: None,
                    location: SourceLocation::default(),
                })
                .collect(),
            children: vec![],
            self_closing,
            location: SourceLocation::default(),
        }
    }

    #[test]
    fn loop_binding_shapes() {
        let simple = parse_loop_binding("item in items", None).expect("simple");
        assert_eq!(simple.key, "item");
        assert_eq!(simple.source, "items");

        let tuple = parse_loop_binding("(row, i) in rows.filter(r => r.ok)", None).expect("tuple");
        assert_eq!(tuple.key, "row");
        assert_eq!(tuple.source, "rows.filter(r => r.ok)");

        let of_form = parse_loop_binding("entry of entries", None).expect("of");
        assert_eq!(of_form.key, "entry");

        assert!(parse_loop_binding("items", None).is_none());
        assert!(parse_loop_binding(" in items", None).is_none());
    }

    #[test]
    fn repeating_key_comes_from_parent_chain() {
        let mut map = HierarchyMap::new();
        map.register(&element(1, "div", &[("v-for", "item in items")], false), None);
        map.register(&element(2, "span", &[], false), Some(1));
        map.register(&element(3, "button", &[], false), Some(2));

        assert_eq!(map.nearest_repeating_key(3), Some("item".to_string()));
        // The loop node itself repeats its children, not itself.
        assert_eq!(map.nearest_repeating_key(1), None);
    }

    #[test]
    fn self_closing_loop_uses_own_key() {
        let mut map = HierarchyMap::new();
        map.register(&element(1, "div", &[], false), None);
        map.register(
            &element(2, "AppInput", &[("v-for", "field in fields")], true),
            Some(1),
        );
        assert_eq!(map.nearest_repeating_key(2), Some("field".to_string()));
    }

    #[test]
    fn scoped_region_detection() {
        let mut map = HierarchyMap::new();
        map.register(
            &element(1, "template", &[("v-slot:row", "slotProps")], false),
            None,
        );
        map.register(&element(2, "button", &[], false), Some(1));
        assert!(map.inside_scoped_region_with_params(2));

        let mut bare = HierarchyMap::new();
        bare.register(&element(1, "template", &[("v-slot:row", "")], false), None);
        bare.register(&element(2, "button", &[], false), Some(1));
        assert!(!bare.inside_scoped_region_with_params(2));
    }

    #[test]
    fn conditional_branch_lookup() {
        let mut map = HierarchyMap::new();
        map.register(&element(1, "div", &[("v-if", "mode === 'a'")], false), None);
        map.register(&element(2, "button", &[], false), Some(1));
        assert_eq!(
            map.nearest_conditional_branch(2),
            Some("mode === 'a'".to_string())
        );

        map.register(&element(3, "div", &[("v-else", "")], false), None);
        assert_eq!(map.nearest_conditional_branch(3), Some(String::new()));

        map.register(&element(4, "div", &[], false), None);
        assert_eq!(map.nearest_conditional_branch(4), None);
    }

    #[test]
    fn enclosing_loop_literals() {
        let mut map = HierarchyMap::new();
        map.register(
            &element(1, "div", &[("v-for", "tab in ['Home', 'About']")], false),
            None,
        );
        map.register(&element(2, "button", &[], false), Some(1));
        assert_eq!(
            map.static_literals_of_enclosing_loop(2),
            Some(vec!["Home".to_string(), "About".to_string()])
        );

        // Grandchildren do not qualify: only the immediate parent counts.
        map.register(&element(3, "span", &[], false), Some(2));
        assert_eq!(map.static_literals_of_enclosing_loop(3), None);
    }

    #[test]
    fn non_constant_mark_vetoes_enumeration() {
        let mut map = HierarchyMap::new();
        let mut looped = element(1, "div", &[], false);
        looped.attributes.push(AttributeIR {
            name: dialect::ATTR_LOOP.to_string(),
            value: "tab in ['Home', 'About']".to_string(),
            is_constant: Some(false),
            location: SourceLocation::default(),
        });
        map.register(&looped, None);
        map.register(&element(2, "button", &[], false), Some(1));
        assert_eq!(map.static_literals_of_enclosing_loop(2), None);
    }
}
