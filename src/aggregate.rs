//! Per-unit aggregation of synthesized identifiers and API members.
//!
//! One `UnitAggregate` accumulates everything a renderer needs for one
//! generated unit. State is partitioned by unit name inside `PomContext` and
//! reset whenever that unit is recompiled, so re-runs over an unchanged tree
//! reproduce the aggregate exactly.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ir::IdentifierValue;
use crate::naming::NamePool;
use crate::roles::{InferenceCache, Role};

/// One generated API member: a getter/action pair bound to an identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomSpec {
    pub role: Role,
    /// Semantic base the names were derived from.
    pub base: String,
    pub getter: String,
    pub action: String,
    pub value: IdentifierValue,
    /// Selectors folded in by merge-by-identity. Non-empty lists always hold
    /// the founding identifier as their first element.
    #[serde(default)]
    pub alternates: Vec<IdentifierValue>,
    /// Literal key values when the member was expanded from a literal loop.
    #[serde(default)]
    pub enumerated_keys: Option<Vec<String>>,
    pub params: Vec<String>,
    /// False when enumerable expansion replaced this member with extras.
    pub emit_primary: bool,
}

/// API surface outside the 1:1 element-to-member mapping, one per expanded
/// option or per parameterized fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomExtraMethod {
    pub name: String,
    pub value: IdentifierValue,
    /// Literal key baked into the method for loop-literal expansions.
    #[serde(default)]
    pub fixed_key: Option<String>,
    pub params: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedIdEntry {
    pub value: IdentifierValue,
    #[serde(default)]
    pub nav_target: Option<String>,
    #[serde(default)]
    pub pom: Option<PomSpec>,
}

/// Accumulated state for one generated unit's API.
#[derive(Debug, Default)]
pub struct UnitAggregate {
    pub pool: NamePool,
    entries: Vec<GeneratedIdEntry>,
    extras: Vec<PomExtraMethod>,
    extra_keys: HashSet<String>,
    by_action: HashMap<String, usize>,
}

impl UnitAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears everything for a recompilation of the unit.
    pub fn reset(&mut self) {
        self.pool.reset();
        self.entries.clear();
        self.extras.clear();
        self.extra_keys.clear();
        self.by_action.clear();
    }

    pub fn push_entry(&mut self, entry: GeneratedIdEntry) {
        if let Some(pom) = &entry.pom {
            self.by_action.insert(pom.action.clone(), self.entries.len());
        }
        self.entries.push(entry);
    }

    /// Folds a merged element's identifier into its primary member. The
    /// primary's own identifier seeds the alternate list so the rendered
    /// selector set covers every original element.
    pub fn merge_alternate(&mut self, action: &str, value: IdentifierValue) {
        let Some(&idx) = self.by_action.get(action) else {
            return;
        };
        let Some(pom) = self.entries[idx].pom.as_mut() else {
            return;
        };
        if pom.alternates.is_empty() {
            let own = pom.value.clone();
            pom.alternates.push(own);
        }
        pom.alternates.push(value);
    }

    pub fn has_extra_key(&self, key: &str) -> bool {
        self.extra_keys.contains(key)
    }

    /// Appends an extra method unless its structural key was already seen.
    /// Returns whether the method was actually added.
    pub fn push_extra(&mut self, key: String, extra: PomExtraMethod) -> bool {
        if !self.extra_keys.insert(key) {
            return false;
        }
        self.extras.push(extra);
        true
    }

    pub fn entries(&self) -> &[GeneratedIdEntry] {
        &self.entries
    }

    pub fn extras(&self) -> &[PomExtraMethod] {
        &self.extras
    }

    /// Snapshot handed to the renderer after full traversal of the unit.
    pub fn snapshot(&self, unit: &str) -> UnitSnapshot {
        UnitSnapshot {
            unit: unit.to_string(),
            entries: self.entries.clone(),
            extras: self.extras.clone(),
        }
    }
}

/// Serializable per-unit output consumed by a separate renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSnapshot {
    pub unit: String,
    pub entries: Vec<GeneratedIdEntry>,
    pub extras: Vec<PomExtraMethod>,
}

/// Structural de-duplication key for expanded members. Hashes the member's
/// identity fields rather than its emitted text, so renaming collisions do
/// not defeat the de-dup across recompilations.
pub fn structural_key(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

/// Injected per-run context: cross-unit aggregates partitioned by unit name
/// plus the role-inference cache. Replaces what would otherwise be
/// module-level mutable state.
#[derive(Debug, Default)]
pub struct PomContext {
    aggregates: HashMap<String, UnitAggregate>,
    pub inference: InferenceCache,
}

impl PomContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Created-or-reused atomically per unit name.
    pub fn unit_mut(&mut self, unit: &str) -> &mut UnitAggregate {
        self.aggregates
            .entry(unit.to_string())
            .or_insert_with(UnitAggregate::new)
    }

    pub fn unit(&self, unit: &str) -> Option<&UnitAggregate> {
        self.aggregates.get(unit)
    }

    /// Recompiling a unit starts from a clean aggregate.
    pub fn reset_unit(&mut self, unit: &str) {
        self.unit_mut(unit).reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(action: &str, value: &str) -> PomSpec {
        PomSpec {
            role: Role::Generic("link".to_string()),
            base: "Home".to_string(),
            getter: "HomeLink".to_string(),
            action: action.to_string(),
            value: IdentifierValue::Literal(value.to_string()),
            alternates: vec![],
            enumerated_keys: None,
            params: vec![],
            emit_primary: true,
        }
    }

    #[test]
    fn merge_keeps_both_original_identifiers() {
        let mut agg = UnitAggregate::new();
        agg.push_entry(GeneratedIdEntry {
            value: IdentifierValue::Literal("Nav-Home-link".to_string()),
            nav_target: Some("Home".to_string()),
            pom: Some(spec("goToHome", "Nav-Home-link")),
        });
        agg.merge_alternate(
            "goToHome",
            IdentifierValue::Literal("Footer-Home-link".to_string()),
        );

        let pom = agg.entries()[0].pom.as_ref().expect("pom");
        assert_eq!(
            pom.alternates,
            vec![
                IdentifierValue::Literal("Nav-Home-link".to_string()),
                IdentifierValue::Literal("Footer-Home-link".to_string()),
            ]
        );
    }

    #[test]
    fn extra_dedup_is_structural() {
        let mut agg = UnitAggregate::new();
        let key = structural_key(&["radio", "Foo-mode-radio", "Dark"]);
        let extra = PomExtraMethod {
            name: "clickModeDark".to_string(),
            value: IdentifierValue::Literal("Foo-mode-option-Dark".to_string()),
            fixed_key: None,
            params: vec![],
        };
        assert!(agg.push_extra(key.clone(), extra.clone()));
        assert!(!agg.push_extra(key, extra));
        assert_eq!(agg.extras().len(), 1);
    }

    #[test]
    fn reset_clears_unit_state() {
        let mut ctx = PomContext::new();
        ctx.unit_mut("Foo").push_entry(GeneratedIdEntry {
            value: IdentifierValue::Literal("Foo-Save-button".to_string()),
            nav_target: None,
            pom: None,
        });
        assert_eq!(ctx.unit("Foo").expect("unit").entries().len(), 1);

        ctx.reset_unit("Foo");
        assert!(ctx.unit("Foo").expect("unit").entries().is_empty());
    }
}
