//! The synthesis engine: per-element qualification, policy handling, and
//! aggregation, driven one node at a time by an external traversal.
//!
//! The host integration owns the walk and calls `enter_element` /
//! `leave_element` in pre-order; `walk_template` is the reference driver for
//! hosts that hand over a whole tree. All cross-element state lives in the
//! injected `PomContext`, partitioned by unit name.

use crate::aggregate::{
    structural_key, GeneratedIdEntry, PomContext, PomExtraMethod, PomSpec, UnitSnapshot,
};
use crate::classify;
use crate::config::{ExistingIdBehavior, PomConfig};
use crate::dialect;
use crate::error::{PomError, ERR_EXISTING_ID_POLICY, ERR_UNPRESERVABLE_ID};
use crate::hierarchy::HierarchyMap;
use crate::ir::{ElementNode, IdentifierValue, NodeId, TemplateNode};
use crate::naming::{self, extra_method_name, NameRequest, Resolution};
use crate::roles::{self, Role};
use crate::static_list;
use crate::synth;

/// Pluggable resolution of a location descriptor to a unit name.
pub trait NavigationResolver {
    fn resolve_navigation_target(&self, location: &str) -> Option<String>;
}

/// Resolver for hosts without a route table; literal target names still work.
#[derive(Debug, Default)]
pub struct NullNavigationResolver;

impl NavigationResolver for NullNavigationResolver {
    fn resolve_navigation_target(&self, _location: &str) -> Option<String> {
        None
    }
}

/// Qualification categories, first match wins.
enum Category {
    Wrapper {
        model: String,
        option_prefix: bool,
    },
    Navigation {
        raw: String,
        is_bound: bool,
    },
    Handler {
        source: String,
    },
    Activation {
        source: Option<String>,
    },
    AuthorId,
    Submit,
}

enum ExistingId {
    Literal(String),
    Template(String),
    Dynamic(String),
}

pub struct PomEngine<'a> {
    config: PomConfig,
    resolver: &'a dyn NavigationResolver,
    pub context: PomContext,
    hierarchy: HierarchyMap,
    unit: String,
    file: String,
    skip_unit: bool,
}

impl<'a> PomEngine<'a> {
    pub fn new(config: PomConfig, resolver: &'a dyn NavigationResolver) -> Self {
        PomEngine {
            config,
            resolver,
            context: PomContext::new(),
            hierarchy: HierarchyMap::new(),
            unit: String::new(),
            file: String::new(),
            skip_unit: false,
        }
    }

    /// Starts (or restarts) compilation of one unit. Per-unit state from any
    /// earlier compilation of the same unit is discarded here.
    pub fn begin_unit(&mut self, unit: &str, file: &str) {
        self.unit = unit.to_string();
        self.file = file.to_string();
        self.hierarchy.reset();
        self.skip_unit = self.config.excluded_units.contains(unit);
        if self.skip_unit {
            tracing::debug!(unit, "unit excluded from synthesis");
        } else {
            self.context.reset_unit(unit);
        }
    }

    /// Pre-order entry callback. Registers the node before its children are
    /// walked, then processes it.
    pub fn enter_element(
        &mut self,
        el: &mut ElementNode,
        parent: Option<NodeId>,
    ) -> Result<(), PomError> {
        self.hierarchy.register(el, parent);
        if self.skip_unit {
            return Ok(());
        }
        self.process_element(el)
    }

    /// Exit callback, kept for traversal symmetry; the engine has no
    /// per-subtree teardown.
    pub fn leave_element(&mut self, _id: NodeId) {}

    /// Readable after full traversal of the unit.
    pub fn finish_unit(&self) -> Option<UnitSnapshot> {
        if self.skip_unit {
            return None;
        }
        self.context
            .unit(&self.unit)
            .map(|agg| agg.snapshot(&self.unit))
    }

    /// Reference traversal driver for hosts handing over a whole tree.
    pub fn walk_template(&mut self, root: &mut TemplateNode) -> Result<(), PomError> {
        self.walk_node(root, None)
    }

    fn walk_node(
        &mut self,
        node: &mut TemplateNode,
        parent: Option<NodeId>,
    ) -> Result<(), PomError> {
        if let TemplateNode::Element(el) = node {
            self.enter_element(el, parent)?;
            let id = el.id;
            for child in &mut el.children {
                self.walk_node(child, Some(id))?;
            }
            self.leave_element(id);
        }
        Ok(())
    }

    fn process_element(&mut self, el: &mut ElementNode) -> Result<(), PomError> {
        if el.tag == dialect::SCOPED_REGION_TAG {
            return Ok(());
        }

        let existing = self.existing_identifier(el);
        let (role, role_cfg) = roles::resolve_role(el, &self.config, &mut self.context.inference);
        let option_prefix_role = role_cfg.as_ref().is_some_and(|c| c.option_prefix);

        let value_attr = role_cfg.as_ref().and_then(|c| c.value_attr.clone());
        let Some(category) = qualify(el, value_attr.as_deref(), option_prefix_role, existing.is_some())
        else {
            return Ok(());
        };

        if existing.is_some() && self.config.existing_id_behavior == ExistingIdBehavior::Error {
            return Err(self.authored_id_error(el));
        }

        let key = self.hierarchy.nearest_repeating_key(el.id);
        let scoped = self.hierarchy.inside_scoped_region_with_params(el.id);

        let mut nav_target: Option<String> = None;
        let output = match &category {
            Category::Wrapper {
                model,
                option_prefix,
            } => {
                let token = classify::classify(model)
                    .map(|s| s.token)
                    .or_else(|| el.attr_value("name").map(str::to_string))
                    .unwrap_or_else(|| "value".to_string());
                synth::wrapper_value(&self.unit, &token, &role, *option_prefix)
            }
            Category::Navigation { raw, is_bound } => {
                nav_target = self
                    .resolver
                    .resolve_navigation_target(raw)
                    .or_else(|| synth::literal_target_name(raw, *is_bound));
                synth::navigation_value(&self.unit, el, key.as_deref(), raw, nav_target.as_deref())
            }
            Category::Handler { source } => match classify::classify(source) {
                Some(signal) => {
                    synth::handler_value(&self.unit, &signal.token, key.as_deref(), &role)
                }
                // Classification failure is soft: role-only naming.
                None => synth::activation_value(&self.unit, None, key.as_deref(), &role),
            },
            Category::Activation { source } => {
                let token = source
                    .as_deref()
                    .and_then(classify::classify)
                    .map(|s| s.token);
                let mut out =
                    synth::activation_value(&self.unit, token.as_deref(), key.as_deref(), &role);
                out.alt_hint = el.static_inner_text();
                out
            }
            Category::AuthorId => {
                let hint = match &existing {
                    Some(ExistingId::Literal(value)) => Some(value.clone()),
                    _ => None,
                };
                let mut out =
                    synth::activation_value(&self.unit, None, key.as_deref(), &role);
                out.hint = hint;
                out
            }
            Category::Submit => synth::submit_value(&self.unit, el, &role, &self.file)?,
        };

        let value = self.apply_existing_policy(el, existing, output.value.clone(), key.as_deref())?;

        let mut params = Vec::new();
        if key.is_some() {
            params.push("key".to_string());
        }
        if let Some(value_param) = role.value_param() {
            params.push(value_param.to_string());
        }

        // With no better alternate hint, the enclosing conditional branch's
        // naming token can still tell two same-hint members apart.
        let alt_hint = output.alt_hint.clone().or_else(|| {
            let condition = self.hierarchy.nearest_conditional_branch(el.id)?;
            let signal = classify::classify(&condition)?;
            Some(match &output.hint {
                Some(hint) => format!("{} {}", hint, signal.token),
                None => signal.token,
            })
        });

        let request = NameRequest {
            hint: output.hint.clone(),
            alt_hint,
            role: role.clone(),
            nav_target: nav_target.clone(),
            merge_key: nav_target.clone(),
            key: key.clone(),
            params: params.clone(),
            unit: self.unit.clone(),
            file: self.file.clone(),
            location: el.location,
        };

        let aggregate = self.context.unit_mut(&self.unit);
        let resolution = naming::resolve(&request, &mut aggregate.pool, self.config.name_collision_behavior)?;

        let (getter, action) = match resolution {
            Resolution::Merged { action } => {
                aggregate.merge_alternate(&action, value.clone());
                write_identifier(el, &self.config.identifier_attribute_name, &value);
                return Ok(());
            }
            Resolution::New { getter, action } => (getter, action),
        };

        let verb = role.verb(nav_target.is_some());
        let base = action[verb.len()..].to_string();

        let mut emit_primary = true;
        let mut enumerated_keys = None;

        if let Some(prefix) = &output.option_prefix {
            if let Some(options) = el.binding(dialect::ATTR_OPTIONS) {
                let labels = if options.is_constant == Some(false) {
                    None
                } else {
                    static_list::literal_labels(&options.value)
                };
                emit_primary = false;
                match labels {
                    Some(labels) => {
                        for label in &labels {
                            let extra_name = extra_method_name(verb, &base, label);
                            let extra_value = IdentifierValue::Literal(format!(
                                "{}-{}",
                                prefix.text(),
                                naming::pascal_case(label)
                            ));
                            self.push_extra(
                                &role,
                                extra_name,
                                extra_value,
                                Some(label.clone()),
                                vec![],
                            );
                        }
                        enumerated_keys = Some(labels);
                    }
                    None => {
                        // Parameterized fallback: one method taking the option.
                        let extra_value = IdentifierValue::Template(format!(
                            "{}-${{option}}",
                            prefix.text()
                        ));
                        let aggregate = self.context.unit_mut(&self.unit);
                        aggregate.push_extra(
                            structural_key(&[role.id_suffix(), prefix.text(), "*"]),
                            PomExtraMethod {
                                name: action.clone(),
                                value: extra_value,
                                fixed_key: None,
                                params: vec!["option".to_string()],
                            },
                        );
                    }
                }
            }
        }

        if emit_primary
            && key.is_some()
            && value.is_templated()
            && !scoped
            && nav_target.is_none()
            && !matches!(role, Role::Input | Role::Select | Role::CustomSelect | Role::Radio)
        {
            if let Some(literals) = self.hierarchy.static_literals_of_enclosing_loop(el.id) {
                emit_primary = false;
                for literal in &literals {
                    let extra_name = extra_method_name(verb, &base, literal);
                    let extra_value = value.substitute(literal);
                    let extra_params: Vec<String> = role
                        .value_param()
                        .map(|p| vec![p.to_string()])
                        .unwrap_or_default();
                    self.push_extra(
                        &role,
                        extra_name,
                        extra_value,
                        Some(literal.clone()),
                        extra_params,
                    );
                }
                enumerated_keys = Some(literals);
            }
        }

        let preserved_in_place = matches!(
            (&self.config.existing_id_behavior, el.binding(&self.config.identifier_attribute_name)),
            (ExistingIdBehavior::Preserve, Some(_))
        );
        if !preserved_in_place {
            write_identifier(el, &self.config.identifier_attribute_name, &value);
        }

        let aggregate = self.context.unit_mut(&self.unit);
        aggregate.push_entry(GeneratedIdEntry {
            value: value.clone(),
            nav_target: nav_target.clone(),
            pom: Some(PomSpec {
                role,
                base,
                getter,
                action,
                value,
                alternates: vec![],
                enumerated_keys,
                params,
                emit_primary,
            }),
        });
        Ok(())
    }

    /// Extra-method insertion with structural de-dup and, when the preferred
    /// name is taken by an unrelated member, a bounded numeric-suffix retry.
    fn push_extra(
        &mut self,
        role: &Role,
        name: String,
        value: IdentifierValue,
        fixed_key: Option<String>,
        params: Vec<String>,
    ) {
        let dedup = structural_key(&[
            role.id_suffix(),
            value.text(),
            fixed_key.as_deref().unwrap_or(""),
        ]);
        let aggregate = self.context.unit_mut(&self.unit);
        if aggregate.has_extra_key(&dedup) {
            return;
        }

        let mut resolved = None;
        if aggregate.pool.reserve_extra(&name, &params) {
            resolved = Some(name.clone());
        } else {
            for n in 2..=99u32 {
                let candidate = format!("{}{}", name, n);
                if aggregate.pool.reserve_extra(&candidate, &params) {
                    resolved = Some(candidate);
                    break;
                }
            }
        }
        let Some(final_name) = resolved else {
            tracing::warn!(unit = %self.unit, name, "dropping expanded method, no free name");
            return;
        };
        aggregate.push_extra(
            dedup,
            PomExtraMethod {
                name: final_name,
                value,
                fixed_key,
                params,
            },
        );
    }

    fn existing_identifier(&self, el: &ElementNode) -> Option<ExistingId> {
        let attr_name = &self.config.identifier_attribute_name;
        if let Some(value) = el.attr_value(attr_name) {
            return Some(ExistingId::Literal(value.to_string()));
        }
        let bound = format!(":{}", attr_name);
        let raw = el.attr_value(&bound)?.trim();
        if let Some(inner) = raw.strip_prefix('`').and_then(|s| s.strip_suffix('`')) {
            if crate::ir::count_substitutions(inner) > 0 {
                return Some(ExistingId::Template(inner.to_string()));
            }
            return Some(ExistingId::Literal(inner.to_string()));
        }
        if let Some(literal) = static_list::literal_single_string(raw) {
            return Some(ExistingId::Literal(literal));
        }
        Some(ExistingId::Dynamic(raw.to_string()))
    }

    /// §: preserve keeps a usable authored value in place of the synthesized
    /// one; overwrite discards it. The error policy was handled before any
    /// synthesis work.
    fn apply_existing_policy(
        &self,
        el: &ElementNode,
        existing: Option<ExistingId>,
        synthesized: IdentifierValue,
        key: Option<&str>,
    ) -> Result<IdentifierValue, PomError> {
        let Some(existing) = existing else {
            return Ok(synthesized);
        };
        match self.config.existing_id_behavior {
            ExistingIdBehavior::Overwrite => Ok(synthesized),
            // Raised before synthesis; repeated here so the policy can never
            // fall through silently.
            ExistingIdBehavior::Error => Err(self.authored_id_error(el)),
            ExistingIdBehavior::Preserve => match existing {
                ExistingId::Literal(value) => Ok(IdentifierValue::Literal(value)),
                ExistingId::Template(text) => {
                    let value = IdentifierValue::Template(text.clone());
                    let matches_key = value
                        .single_substitution()
                        .zip(key)
                        .is_some_and(|(sub, key)| sub == key);
                    if matches_key {
                        Ok(value)
                    } else {
                        Err(self.unpreservable(el, &text, key))
                    }
                }
                ExistingId::Dynamic(text) => Err(self.unpreservable(el, &text, key)),
            },
        }
    }

    fn authored_id_error(&self, el: &ElementNode) -> PomError {
        PomError::with_details(
            ERR_EXISTING_ID_POLICY,
            &format!(
                "element <{}> in unit \"{}\" carries an authored \"{}\" identifier",
                el.tag, self.unit, self.config.identifier_attribute_name
            ),
            &self.unit,
            &self.file,
            el.location,
            None,
            vec![
                "Remove the authored identifier and let synthesis assign one.".to_string(),
                "Or set existingIdBehavior to \"preserve\" or \"overwrite\".".to_string(),
            ],
        )
    }

    fn unpreservable(&self, el: &ElementNode, raw: &str, key: Option<&str>) -> PomError {
        let hint = match key {
            Some(key) => format!(
                "Use a template with exactly one ${{{}}} substitution, or a plain literal.",
                key
            ),
            None => "Use a plain literal identifier here; no loop key is in scope.".to_string(),
        };
        PomError::with_details(
            ERR_UNPRESERVABLE_ID,
            &format!(
                "authored identifier expression \"{}\" on <{}> cannot be preserved",
                raw, el.tag
            ),
            &self.unit,
            &self.file,
            el.location,
            Some(raw.to_string()),
            vec![hint, "Or set existingIdBehavior to \"overwrite\".".to_string()],
        )
    }
}

fn qualify(
    el: &ElementNode,
    value_attr: Option<&str>,
    option_prefix: bool,
    has_existing: bool,
) -> Option<Category> {
    if let Some(value_attr) = value_attr {
        if let Some(attr) = el.binding(value_attr) {
            return Some(Category::Wrapper {
                model: attr.value.clone(),
                option_prefix,
            });
        }
    }

    if el.tag == dialect::NAV_TAG {
        let attr = el.binding(dialect::ATTR_NAV_TO);
        return Some(Category::Navigation {
            raw: attr.map(|a| a.value.clone()).unwrap_or_default(),
            is_bound: attr.is_some_and(|a| a.name.starts_with(':')),
        });
    }

    if let Some(attr) = el
        .attributes
        .iter()
        .find(|a| dialect::is_handler_attr(&a.name) && !dialect::is_activation_attr(&a.name))
    {
        return Some(Category::Handler {
            source: attr.value.clone(),
        });
    }

    if let Some(attr) = el
        .attributes
        .iter()
        .find(|a| dialect::is_activation_attr(&a.name))
    {
        let source = Some(attr.value.clone()).filter(|v| !v.trim().is_empty());
        return Some(Category::Activation { source });
    }

    if has_existing {
        return Some(Category::AuthorId);
    }

    if el.attr_value("type") == Some("submit") {
        return Some(Category::Submit);
    }

    None
}

/// The one observable tree mutation: a literal attribute for static
/// identifiers, a single-expression template binding for keyed ones.
fn write_identifier(el: &mut ElementNode, attr_name: &str, value: &IdentifierValue) {
    match value {
        IdentifierValue::Literal(text) => el.upsert_attribute(attr_name, text.clone()),
        IdentifierValue::Template(text) => {
            el.upsert_attribute(&format!(":{}", attr_name), format!("`{}`", text))
        }
    }
}
