//! Getter/action name resolution and per-unit collision handling.
//!
//! Turns a semantic hint plus role into a unique `{getter, action}` pair,
//! mutating the unit's name pool as it reserves. Merge-by-identity folds a
//! second element with the same merge key, role, and navigation target into
//! the existing member instead of minting a new one.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::NameCollisionBehavior;
use crate::error::{PomError, ERR_NAME_COLLISION};
use crate::ir::SourceLocation;
use crate::roles::Role;

/// Converts an arbitrary source fragment into a PascalCase member fragment.
/// Splits on non-alphanumeric boundaries and on lower→upper transitions;
/// all-caps segments keep only their leading capital.
pub fn pascal_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for segment in split_words(input) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            let rest: String = chars.collect();
            if rest.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
                out.push_str(&rest.to_lowercase());
            } else {
                out.push_str(&rest);
            }
        }
    }
    out
}

fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in input.chars() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MergeRecord {
    merge_key: String,
    role: Role,
    nav_target: Option<String>,
}

/// Per-unit reservation state: reserved member names, the action-signature
/// ledger, and the merge index from action name to founding identity.
#[derive(Debug, Default)]
pub struct NamePool {
    reserved: HashSet<String>,
    ledger: HashMap<String, Vec<String>>,
    merges: HashMap<String, MergeRecord>,
}

impl NamePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.reserved.clear();
        self.ledger.clear();
        self.merges.clear();
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    /// Reserves an auxiliary member name (extra methods) outside the main
    /// resolution path. Returns false when the name is already taken.
    pub fn reserve_extra(&mut self, name: &str, params: &[String]) -> bool {
        if self.reserved.contains(name) {
            return false;
        }
        self.reserved.insert(name.to_string());
        self.record_signature(name, params);
        true
    }

    /// Conflicting rebinds never reach this point; reservation and the
    /// conflict check above gate every caller.
    fn record_signature(&mut self, action: &str, params: &[String]) {
        self.ledger
            .entry(action.to_string())
            .or_insert_with(|| params.to_vec());
    }

    fn signature_conflicts(&self, action: &str, params: &[String]) -> bool {
        self.ledger
            .get(action)
            .is_some_and(|existing| existing.as_slice() != params)
    }
}

/// One name-resolution request for a qualifying element.
#[derive(Debug, Clone)]
pub struct NameRequest {
    pub hint: Option<String>,
    /// Fallback hint tried once under the `error` policy.
    pub alt_hint: Option<String>,
    pub role: Role,
    pub nav_target: Option<String>,
    pub merge_key: Option<String>,
    /// Loop key for keyed entries; getters drop its trailing marker.
    pub key: Option<String>,
    pub params: Vec<String>,
    pub unit: String,
    pub file: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    New { getter: String, action: String },
    /// Folded into an existing member; carries that member's action name.
    Merged { action: String },
}

const MAX_SUFFIX: u32 = 99;

/// Resolves names for one request, reserving them in the pool.
pub fn resolve(
    request: &NameRequest,
    pool: &mut NamePool,
    policy: NameCollisionBehavior,
) -> Result<Resolution, PomError> {
    let base = primary_base(request);
    let verb = request.role.verb(request.nav_target.is_some());

    // Merge-by-identity, non-keyed entries only.
    if request.key.is_none() {
        if let Some(merge_key) = &request.merge_key {
            let action = format!("{}{}", verb, base);
            if let Some(record) = pool.merges.get(&action) {
                let identical = record.merge_key == *merge_key
                    && record.role == request.role
                    && record.nav_target == request.nav_target;
                if identical && !pool.signature_conflicts(&action, &request.params) {
                    return Ok(Resolution::Merged { action });
                }
            }
        }
    }

    let candidates = candidate_bases(&base, request, policy);
    for candidate in &candidates {
        if let Some((getter, action)) = try_reserve(candidate, verb, request, pool) {
            if candidate != &base {
                match policy {
                    NameCollisionBehavior::Warn => tracing::warn!(
                        unit = %request.unit,
                        original = %base,
                        resolved = %candidate,
                        "member name collision resolved by renaming"
                    ),
                    NameCollisionBehavior::Suffix => tracing::debug!(
                        unit = %request.unit,
                        original = %base,
                        resolved = %candidate,
                        "member name collision resolved by suffixing"
                    ),
                    NameCollisionBehavior::Error => {}
                }
            }
            if let Some(merge_key) = &request.merge_key {
                if request.key.is_none() {
                    pool.merges.insert(
                        action.clone(),
                        MergeRecord {
                            merge_key: merge_key.clone(),
                            role: request.role.clone(),
                            nav_target: request.nav_target.clone(),
                        },
                    );
                }
            }
            return Ok(Resolution::New { getter, action });
        }
    }

    let getter = getter_name(&base, request, pool);
    let action = format!("{}{}", verb, base);
    Err(PomError::with_details(
        ERR_NAME_COLLISION,
        &format!(
            "generated members \"{}\" and \"{}\" collide with existing members of unit \"{}\"",
            getter, action, request.unit
        ),
        &request.unit,
        &request.file,
        request.location,
        request.hint.clone(),
        vec![
            "Add a distinguishing authored identifier to one of the elements.".to_string(),
            "Or switch nameCollisionBehavior to \"suffix\" to auto-number the members.".to_string(),
        ],
    ))
}

fn primary_base(request: &NameRequest) -> String {
    let from_hint = request
        .hint
        .as_deref()
        .map(pascal_case)
        .filter(|s| !s.is_empty());
    let base = from_hint.unwrap_or_else(|| pascal_case(request.role.id_suffix()));
    if base.is_empty() {
        "Element".to_string()
    } else {
        base
    }
}

fn candidate_bases(
    base: &str,
    request: &NameRequest,
    policy: NameCollisionBehavior,
) -> Vec<String> {
    match policy {
        NameCollisionBehavior::Error => {
            let mut candidates = vec![base.to_string()];
            if let Some(alt) = request
                .alt_hint
                .as_deref()
                .map(pascal_case)
                .filter(|s| !s.is_empty() && s != base)
            {
                candidates.push(alt);
            }
            // Suffixing with the role applies to the primary hint only;
            // hint-less requests have nothing stable to suffix.
            if request.hint.is_some() {
                let role_suffixed = format!("{}{}", base, request.role.member_suffix());
                if role_suffixed != base {
                    candidates.push(role_suffixed);
                }
            }
            candidates
        }
        NameCollisionBehavior::Warn | NameCollisionBehavior::Suffix => {
            let mut candidates = vec![base.to_string()];
            candidates.extend((2..=MAX_SUFFIX).map(|n| format!("{}{}", base, n)));
            candidates
        }
    }
}

fn try_reserve(
    base: &str,
    verb: &str,
    request: &NameRequest,
    pool: &mut NamePool,
) -> Option<(String, String)> {
    let getter = getter_name(base, request, pool);
    let action = format!("{}{}", verb, base);

    if pool.reserved.contains(&getter)
        || pool.reserved.contains(&action)
        || pool.signature_conflicts(&action, &request.params)
    {
        return None;
    }

    pool.reserved.insert(getter.clone());
    pool.reserved.insert(action.clone());
    pool.record_signature(&action, &request.params);
    Some((getter, action))
}

/// Getter = base + role suffix unless the base is already suffixed (with or
/// without a trailing number). Keyed entries drop a trailing key marker from
/// the getter, kept on the action, unless the stripped form collides.
fn getter_name(base: &str, request: &NameRequest, pool: &NamePool) -> String {
    if let Some(key) = &request.key {
        let marker = pascal_case(key);
        if !marker.is_empty() && base.len() > marker.len() {
            if let Some(stripped) = base.strip_suffix(marker.as_str()) {
                let candidate = ensure_suffixed(stripped, &request.role);
                if !pool.reserved.contains(&candidate) {
                    return candidate;
                }
            }
        }
    }
    ensure_suffixed(base, &request.role)
}

fn ensure_suffixed(base: &str, role: &Role) -> String {
    let suffix = role.member_suffix();
    if already_suffixed(base, &suffix) {
        base.to_string()
    } else {
        format!("{}{}", base, suffix)
    }
}

lazy_static! {
    static ref TRAILING_DIGITS: Regex = Regex::new(r"\d+$").expect("static pattern");
}

fn already_suffixed(base: &str, suffix: &str) -> bool {
    if suffix.is_empty() {
        return true;
    }
    TRAILING_DIGITS.replace(base, "").ends_with(suffix)
}

/// Member names for enumerated extra methods: verb + base + label marker.
pub fn extra_method_name(verb: &str, base: &str, label: &str) -> String {
    let marker = pascal_case(label);
    if base.ends_with(marker.as_str()) && !marker.is_empty() {
        format!("{}{}", verb, base)
    } else {
        format!("{}{}{}", verb, base, marker)
    }
}
