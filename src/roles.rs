//! Interaction roles and the tag-to-role resolver.
//!
//! Resolution precedence: explicit native-wrapper configuration, built-in
//! native primitives, one-shot single-root inference for compound tags, and
//! finally a generic role derived from the raw tag. Inference outcomes are
//! cached (positive and negative) for the process lifetime; the one file read
//! it performs is the only blocking I/O in the engine.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::config::PomConfig;
use crate::dialect;
use crate::ir::ElementNode;
use crate::naming::pascal_case;

/// Fixed interaction category. Tags outside the fixed set resolve to
/// `Generic`, which carries a suffix derived from the raw tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Button,
    Input,
    Select,
    CustomSelect,
    Checkbox,
    Toggle,
    Radio,
    Generic(String),
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "button" => Role::Button,
            "input" => Role::Input,
            "select" => Role::Select,
            "custom-select" => Role::CustomSelect,
            "checkbox" => Role::Checkbox,
            "toggle" => Role::Toggle,
            "radio" => Role::Radio,
            other => Role::Generic(sanitize_tag(other)),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.id_suffix().to_string()
    }
}

impl Role {
    /// Lowercase suffix embedded in synthesized identifiers.
    pub fn id_suffix(&self) -> &str {
        match self {
            Role::Button => "button",
            Role::Input => "input",
            Role::Select => "select",
            Role::CustomSelect => "custom-select",
            Role::Checkbox => "checkbox",
            Role::Toggle => "toggle",
            Role::Radio => "radio",
            Role::Generic(tag) => tag,
        }
    }

    /// PascalCase suffix appended to getter names.
    pub fn member_suffix(&self) -> String {
        match self {
            Role::CustomSelect => "Select".to_string(),
            other => pascal_case(other.id_suffix()),
        }
    }

    /// Action-name verb. Navigation targets take `goTo` regardless of role.
    pub fn verb(&self, navigates: bool) -> &'static str {
        if navigates {
            return "goTo";
        }
        match self {
            Role::Input => "type",
            Role::Select | Role::CustomSelect => "select",
            _ => "click",
        }
    }

    /// Whether the role takes a value/model-like attribute.
    pub fn accepts_value(&self) -> bool {
        matches!(
            self,
            Role::Input
                | Role::Select
                | Role::CustomSelect
                | Role::Checkbox
                | Role::Toggle
                | Role::Radio
        )
    }

    /// Parameter the action takes beyond the loop key, if any.
    pub fn value_param(&self) -> Option<&'static str> {
        match self {
            Role::Input => Some("value"),
            Role::Select | Role::CustomSelect => Some("option"),
            _ => None,
        }
    }
}

fn sanitize_tag(tag: &str) -> String {
    let lowered = tag.trim().to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect();
    let trimmed = cleaned.trim_matches('-');
    if trimmed.is_empty() {
        "element".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Per-tag role configuration, explicit or inferred.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleConfig {
    pub role: Role,
    #[serde(default)]
    pub value_attr: Option<String>,
    /// Option children of this wrapper need a shared correlation prefix.
    #[serde(default)]
    pub option_prefix: bool,
}

/// Process-lifetime cache for single-root inference. Lives in the injected
/// run context, never in module state, so concurrent multi-unit builds stay
/// safe by construction.
#[derive(Debug, Default)]
pub struct InferenceCache {
    outcomes: HashMap<String, Option<RoleConfig>>,
    file_index: Option<HashMap<String, PathBuf>>,
}

impl InferenceCache {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Resolves an element's role. Returns the role together with the wrapper
/// configuration that produced it, when one applies.
pub fn resolve_role(
    el: &ElementNode,
    config: &PomConfig,
    cache: &mut InferenceCache,
) -> (Role, Option<RoleConfig>) {
    let tag = el.tag.as_str();

    if let Some(cfg) = config.native_wrappers.get(tag) {
        return (cfg.role.clone(), Some(cfg.clone()));
    }

    if tag == dialect::NAV_TAG {
        return (Role::Generic("link".to_string()), None);
    }

    if let Some(cfg) = built_in_native(el) {
        let role = cfg.role.clone();
        return (role, Some(cfg));
    }

    if is_compound_tag(tag) {
        if let Some(cfg) = infer_wrapper_role(tag, config, cache) {
            let role = cfg.role.clone();
            return (role, Some(cfg));
        }
    }

    (Role::Generic(sanitize_tag(tag)), None)
}

fn built_in_native(el: &ElementNode) -> Option<RoleConfig> {
    let role = match el.tag.as_str() {
        "button" => Role::Button,
        "textarea" => Role::Input,
        "select" => Role::Select,
        "input" => match el.attr_value("type") {
            Some("checkbox") => Role::Checkbox,
            Some("radio") => Role::Radio,
            _ => Role::Input,
        },
        _ => return None,
    };
    let value_attr = if role.accepts_value() {
        Some(dialect::ATTR_MODEL.to_string())
    } else {
        None
    };
    Some(RoleConfig {
        option_prefix: role == Role::Radio,
        role,
        value_attr,
    })
}

fn is_compound_tag(tag: &str) -> bool {
    tag.chars().next().is_some_and(|c| c.is_ascii_uppercase()) || tag.contains('-')
}

/// One-shot inference: load the tag's own unit definition and check whether
/// its single top-level rendered tag is a known native primitive. Both the
/// positive and the negative outcome are cached permanently.
fn infer_wrapper_role(
    tag: &str,
    config: &PomConfig,
    cache: &mut InferenceCache,
) -> Option<RoleConfig> {
    if let Some(outcome) = cache.outcomes.get(tag) {
        return outcome.clone();
    }

    let outcome = load_unit_root_tag(tag, config, cache).and_then(|root| {
        let role = match root.as_str() {
            "input" | "textarea" => Role::Input,
            "select" => Role::Select,
            _ => return None,
        };
        Some(RoleConfig {
            role,
            value_attr: Some(dialect::ATTR_MODEL.to_string()),
            option_prefix: false,
        })
    });

    if outcome.is_none() {
        tracing::debug!(tag, "single-root inference found no native wrapper");
    }
    cache.outcomes.insert(tag.to_string(), outcome.clone());
    outcome
}

fn load_unit_root_tag(
    tag: &str,
    config: &PomConfig,
    cache: &mut InferenceCache,
) -> Option<String> {
    let index = cache.file_index.get_or_insert_with(|| {
        let mut map = HashMap::new();
        for root in &config.unit_roots {
            for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("vue") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        map.entry(stem.to_string()).or_insert(path.to_path_buf());
                    }
                }
            }
        }
        map
    });

    let unit_name = pascal_case(tag);
    let path = index.get(&unit_name)?;
    let source = fs::read_to_string(path).ok()?;
    let template = template_block(&source)?;
    let roots = top_level_tags(template);
    if roots.len() == 1 {
        Some(roots.into_iter().next().unwrap_or_default())
    } else {
        None
    }
}

fn template_block(source: &str) -> Option<&str> {
    let start = source.find("<template")?;
    let open_end = start + source[start..].find('>')? + 1;
    let end = source.rfind("</template>")?;
    if end <= open_end {
        return None;
    }
    Some(&source[open_end..end])
}

/// Tags that never take a closing counterpart.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Scans rendered markup for element tags at nesting depth zero.
fn top_level_tags(markup: &str) -> Vec<String> {
    let bytes = markup.as_bytes();
    let mut tags = Vec::new();
    let mut depth: i32 = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        if markup[i..].starts_with("<!--") {
            i = markup[i..]
                .find("-->")
                .map(|e| i + e + 3)
                .unwrap_or(bytes.len());
            continue;
        }
        if i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            depth -= 1;
            i = markup[i..]
                .find('>')
                .map(|e| i + e + 1)
                .unwrap_or(bytes.len());
            continue;
        }
        if i + 1 >= bytes.len() || !bytes[i + 1].is_ascii_alphabetic() {
            i += 1;
            continue;
        }

        let name_start = i + 1;
        let mut name_end = name_start;
        while name_end < bytes.len()
            && (bytes[name_end].is_ascii_alphanumeric() || bytes[name_end] == b'-')
        {
            name_end += 1;
        }
        let tag = markup[name_start..name_end].to_lowercase();

        let close = markup[i..]
            .find('>')
            .map(|e| i + e)
            .unwrap_or(bytes.len().saturating_sub(1));
        let self_closing = close > 0 && bytes[close.saturating_sub(1)] == b'/';

        if depth == 0 {
            tags.push(tag.clone());
        }
        if !self_closing && !VOID_TAGS.contains(&tag.as_str()) {
            depth += 1;
        }
        i = close + 1;
    }

    tags
}
