//! End-to-end synthesis passes over small template trees.

use std::collections::HashMap;

use crate::aggregate::UnitSnapshot;
use crate::config::{ExistingIdBehavior, NameCollisionBehavior, PomConfig};
use crate::engine::{NavigationResolver, NullNavigationResolver, PomEngine};
use crate::error::{
    ERR_ANONYMOUS_SUBMIT, ERR_EXISTING_ID_POLICY, ERR_NAME_COLLISION, ERR_UNPRESERVABLE_ID,
};
use crate::ir::{
    AttributeIR, ElementNode, IdentifierValue, NodeId, SourceLocation, TemplateNode, TextNode,
};
use crate::roles::{Role, RoleConfig};

fn el(id: NodeId, tag: &str, attrs: &[(&str, &str)], children: Vec<TemplateNode>) -> TemplateNode {
    TemplateNode::Element(ElementNode {
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
        children,
        self_closing: false,
        location: SourceLocation::default(),
    })
}

fn text(value: &str) -> TemplateNode {
    TemplateNode::Text(TextNode {
        value: value.to_string(),
        location: SourceLocation::default(),
    })
}

fn find<'a>(node: &'a TemplateNode, id: NodeId) -> Option<&'a ElementNode> {
    let TemplateNode::Element(element) = node else {
        return None;
    };
    if element.id == id {
        return Some(element);
    }
    element.children.iter().find_map(|child| find(child, id))
}

fn run(tree: &mut TemplateNode, config: PomConfig) -> Result<UnitSnapshot, crate::PomError> {
    crate::synthesize_unit("Foo", "Foo.vue", tree, config, &NullNavigationResolver)
}

#[test]
fn clickable_button_gets_literal_identifier() {
    let mut tree = el(
        1,
        "div",
        &[],
        vec![el(2, "button", &[("@click", "() => save()")], vec![])],
    );
    let snapshot = run(&mut tree, PomConfig::default()).expect("synthesis");

    let pom = snapshot.entries[0].pom.as_ref().expect("pom");
    assert_eq!(pom.getter, "SaveButton");
    assert_eq!(pom.action, "clickSave");
    assert_eq!(
        pom.value,
        IdentifierValue::Literal("Foo-Save-button".to_string())
    );
    assert_eq!(
        find(&tree, 2).expect("button").attr_value("data-testid"),
        Some("Foo-Save-button")
    );
}

#[test]
fn keyed_identifier_is_written_as_template_binding() {
    let mut tree = el(
        1,
        "div",
        &[("v-for", "item in items")],
        vec![el(2, "button", &[("@click", "pick(item)")], vec![])],
    );
    let snapshot = run(&mut tree, PomConfig::default()).expect("synthesis");

    let pom = snapshot.entries[0].pom.as_ref().expect("pom");
    assert_eq!(
        pom.value,
        IdentifierValue::Template("Foo-${item}-Pick-button".to_string())
    );
    assert_eq!(pom.params, vec!["key".to_string()]);
    assert!(pom.emit_primary);

    let button = find(&tree, 2).expect("button");
    assert_eq!(
        button.attr_value(":data-testid"),
        Some("`Foo-${item}-Pick-button`")
    );
    assert!(!button.has_attr("data-testid"));
}

#[test]
fn hintless_collision_suffixes_by_default() {
    let mut tree = el(
        1,
        "div",
        &[],
        vec![
            el(2, "button", &[("@click", "")], vec![]),
            el(3, "button", &[("@click", "")], vec![]),
        ],
    );
    let snapshot = run(&mut tree, PomConfig::default()).expect("synthesis");

    let getters: Vec<&str> = snapshot
        .entries
        .iter()
        .filter_map(|e| e.pom.as_ref())
        .map(|p| p.getter.as_str())
        .collect();
    assert_eq!(getters, vec!["Button", "Button2"]);
}

#[test]
fn hintless_collision_raises_under_error_policy() {
    let mut tree = el(
        1,
        "div",
        &[],
        vec![
            el(2, "button", &[("@click", "")], vec![]),
            el(3, "button", &[("@click", "")], vec![]),
        ],
    );
    let config = PomConfig {
        name_collision_behavior: NameCollisionBehavior::Error,
        ..PomConfig::default()
    };
    let err = run(&mut tree, config).expect_err("collision");
    assert_eq!(err.code, ERR_NAME_COLLISION);
    assert!(err.message.contains("Button"));
    assert!(err.message.contains("clickButton"));
    assert_eq!(err.unit, "Foo");
}

#[test]
fn conditional_branch_disambiguates_under_error_policy() {
    let mut tree = el(
        1,
        "div",
        &[],
        vec![
            el(
                2,
                "div",
                &[("v-if", "editing")],
                vec![el(3, "button", &[("@click", "save()")], vec![])],
            ),
            el(
                4,
                "div",
                &[("v-else-if", "viewing")],
                vec![el(5, "button", &[("@click", "save()")], vec![])],
            ),
        ],
    );
    let config = PomConfig {
        name_collision_behavior: NameCollisionBehavior::Error,
        ..PomConfig::default()
    };
    let snapshot = run(&mut tree, config).expect("synthesis");

    let getters: Vec<&str> = snapshot
        .entries
        .iter()
        .filter_map(|e| e.pom.as_ref())
        .map(|p| p.getter.as_str())
        .collect();
    assert_eq!(getters, vec!["SaveButton", "SaveViewingButton"]);
}

#[test]
fn navigation_links_merge_into_one_member() {
    let mut tree = el(
        1,
        "nav",
        &[],
        vec![
            el(2, "router-link", &[("to", "/home")], vec![text("Home")]),
            el(3, "router-link", &[("to", "/home")], vec![text("Start")]),
        ],
    );
    let snapshot = run(&mut tree, PomConfig::default()).expect("synthesis");

    assert_eq!(snapshot.entries.len(), 1);
    let pom = snapshot.entries[0].pom.as_ref().expect("pom");
    assert_eq!(pom.action, "goToHome");
    assert_eq!(pom.getter, "HomeLink");
    assert_eq!(pom.alternates.len(), 2);
    assert_eq!(
        pom.alternates[0],
        IdentifierValue::Literal("Foo-Home-link".to_string())
    );
    assert_eq!(
        pom.alternates[1],
        IdentifierValue::Literal("Foo-Home-Start-link".to_string())
    );

    // Both elements still carry their own identifier attribute.
    assert!(find(&tree, 2).expect("first").has_attr("data-testid"));
    assert!(find(&tree, 3).expect("second").has_attr("data-testid"));
}

struct RouteTable;

impl NavigationResolver for RouteTable {
    fn resolve_navigation_target(&self, location: &str) -> Option<String> {
        (location.trim() == "settingsRoute").then(|| "Settings".to_string())
    }
}

#[test]
fn navigation_uses_pluggable_resolver() {
    let mut tree = el(
        1,
        "nav",
        &[],
        vec![el(2, "router-link", &[(":to", "settingsRoute")], vec![])],
    );
    let snapshot =
        crate::synthesize_unit("Foo", "Foo.vue", &mut tree, PomConfig::default(), &RouteTable)
            .expect("synthesis");

    let pom = snapshot.entries[0].pom.as_ref().expect("pom");
    assert_eq!(pom.action, "goToSettings");
    assert_eq!(snapshot.entries[0].nav_target.as_deref(), Some("Settings"));
    assert_eq!(
        pom.value,
        IdentifierValue::Literal("Foo-Settings-link".to_string())
    );
}

fn radio_wrapper_config() -> PomConfig {
    let mut wrappers = HashMap::new();
    wrappers.insert(
        "AppRadio".to_string(),
        RoleConfig {
            role: Role::Radio,
            value_attr: Some("v-model".to_string()),
            option_prefix: true,
        },
    );
    PomConfig {
        native_wrappers: wrappers,
        ..PomConfig::default()
    }
}

#[test]
fn literal_radio_options_expand_and_suppress_primary() {
    let mut tree = el(
        1,
        "AppRadio",
        &[("v-model", "mode"), (":options", "['One', 'Two']")],
        vec![],
    );
    let snapshot = run(&mut tree, radio_wrapper_config()).expect("synthesis");

    let pom = snapshot.entries[0].pom.as_ref().expect("pom");
    assert!(!pom.emit_primary);
    assert_eq!(
        pom.enumerated_keys,
        Some(vec!["One".to_string(), "Two".to_string()])
    );

    assert_eq!(snapshot.extras.len(), 2);
    assert_eq!(snapshot.extras[0].name, "clickModeOne");
    assert_eq!(
        snapshot.extras[0].value,
        IdentifierValue::Literal("Foo-Mode-option-One".to_string())
    );
    assert_eq!(snapshot.extras[1].name, "clickModeTwo");
}

#[test]
fn dynamic_radio_options_fall_back_to_one_parameterized_method() {
    let mut tree = el(
        1,
        "AppRadio",
        &[("v-model", "mode"), (":options", "choices")],
        vec![],
    );
    let snapshot = run(&mut tree, radio_wrapper_config()).expect("synthesis");

    let pom = snapshot.entries[0].pom.as_ref().expect("pom");
    assert!(!pom.emit_primary);
    assert_eq!(snapshot.extras.len(), 1);
    assert_eq!(snapshot.extras[0].name, "clickMode");
    assert_eq!(
        snapshot.extras[0].value,
        IdentifierValue::Template("Foo-Mode-option-${option}".to_string())
    );
    assert_eq!(snapshot.extras[0].params, vec!["option".to_string()]);
}

#[test]
fn literal_loop_expands_buttons_into_fixed_methods() {
    let mut tree = el(
        1,
        "div",
        &[("v-for", "tab in ['Home', 'About']")],
        vec![el(2, "button", &[("@click", "open(tab)")], vec![])],
    );
    let snapshot = run(&mut tree, PomConfig::default()).expect("synthesis");

    let pom = snapshot.entries[0].pom.as_ref().expect("pom");
    assert!(!pom.emit_primary);
    assert_eq!(
        pom.enumerated_keys,
        Some(vec!["Home".to_string(), "About".to_string()])
    );

    assert_eq!(snapshot.extras.len(), 2);
    assert_eq!(snapshot.extras[0].name, "clickOpenHome");
    assert_eq!(
        snapshot.extras[0].value,
        IdentifierValue::Literal("Foo-Home-Open-button".to_string())
    );
    assert_eq!(snapshot.extras[0].fixed_key.as_deref(), Some("Home"));
    assert_eq!(snapshot.extras[1].name, "clickOpenAbout");
}

#[test]
fn input_roles_keep_keyed_parameterized_form() {
    let mut tree = el(
        1,
        "div",
        &[("v-for", "field in ['name', 'email']")],
        vec![el(2, "input", &[("v-model", "form[field]")], vec![])],
    );
    let snapshot = run(&mut tree, PomConfig::default()).expect("synthesis");

    let pom = snapshot.entries[0].pom.as_ref().expect("pom");
    assert!(pom.emit_primary);
    assert!(snapshot.extras.is_empty());
    assert_eq!(pom.params, vec!["key".to_string(), "value".to_string()]);
}

#[test]
fn preserve_echoes_literal_identifier() {
    let mut tree = el(
        1,
        "div",
        &[],
        vec![el(
            2,
            "button",
            &[("@click", "save()"), ("data-testid", "custom-save")],
            vec![],
        )],
    );
    let snapshot = run(&mut tree, PomConfig::default()).expect("synthesis");

    assert_eq!(
        snapshot.entries[0].value,
        IdentifierValue::Literal("custom-save".to_string())
    );
    assert_eq!(
        find(&tree, 2).expect("button").attr_value("data-testid"),
        Some("custom-save")
    );
}

#[test]
fn preserve_keeps_correctly_keyed_template() {
    let mut tree = el(
        1,
        "div",
        &[("v-for", "item in items")],
        vec![el(
            2,
            "button",
            &[("@click", "pick(item)"), (":data-testid", "`mine-${item}`")],
            vec![],
        )],
    );
    let snapshot = run(&mut tree, PomConfig::default()).expect("synthesis");
    assert_eq!(
        snapshot.entries[0].value,
        IdentifierValue::Template("mine-${item}".to_string())
    );
    assert_eq!(
        find(&tree, 2).expect("button").attr_value(":data-testid"),
        Some("`mine-${item}`")
    );
}

#[test]
fn preserve_rejects_dynamic_identifier() {
    let mut tree = el(
        1,
        "div",
        &[],
        vec![el(
            2,
            "button",
            &[("@click", "save()"), (":data-testid", "computedId")],
            vec![],
        )],
    );
    let err = run(&mut tree, PomConfig::default()).expect_err("dynamic id");
    assert_eq!(err.code, ERR_UNPRESERVABLE_ID);
    assert!(!err.hints.is_empty());
}

#[test]
fn preserve_rejects_mismatched_key_substitution() {
    let mut tree = el(
        1,
        "div",
        &[("v-for", "item in items")],
        vec![el(
            2,
            "button",
            &[("@click", "pick(item)"), (":data-testid", "`mine-${other}`")],
            vec![],
        )],
    );
    let err = run(&mut tree, PomConfig::default()).expect_err("wrong key");
    assert_eq!(err.code, ERR_UNPRESERVABLE_ID);
}

#[test]
fn error_policy_rejects_any_authored_identifier() {
    let mut tree = el(
        1,
        "div",
        &[],
        vec![el(
            2,
            "button",
            &[("@click", "save()"), ("data-testid", "custom-save")],
            vec![],
        )],
    );
    let config = PomConfig {
        existing_id_behavior: ExistingIdBehavior::Error,
        ..PomConfig::default()
    };
    let err = run(&mut tree, config).expect_err("authored id");
    assert_eq!(err.code, ERR_EXISTING_ID_POLICY);
}

#[test]
fn overwrite_discards_authored_identifier() {
    let mut tree = el(
        1,
        "div",
        &[],
        vec![el(
            2,
            "button",
            &[("@click", "save()"), ("data-testid", "custom-save")],
            vec![],
        )],
    );
    let config = PomConfig {
        existing_id_behavior: ExistingIdBehavior::Overwrite,
        ..PomConfig::default()
    };
    let snapshot = run(&mut tree, config).expect("synthesis");
    assert_eq!(
        snapshot.entries[0].value,
        IdentifierValue::Literal("Foo-Save-button".to_string())
    );
    assert_eq!(
        find(&tree, 2).expect("button").attr_value("data-testid"),
        Some("Foo-Save-button")
    );
}

#[test]
fn anonymous_submit_is_fatal() {
    let mut tree = el(
        1,
        "form",
        &[],
        vec![el(2, "button", &[("type", "submit")], vec![])],
    );
    let err = run(&mut tree, PomConfig::default()).expect_err("anonymous submit");
    assert_eq!(err.code, ERR_ANONYMOUS_SUBMIT);
}

#[test]
fn named_submit_uses_static_text() {
    let mut tree = el(
        1,
        "form",
        &[],
        vec![el(2, "button", &[("type", "submit")], vec![text("Send")])],
    );
    let snapshot = run(&mut tree, PomConfig::default()).expect("synthesis");
    assert_eq!(
        snapshot.entries[0].value,
        IdentifierValue::Literal("Foo-Send-button".to_string())
    );
}

#[test]
fn excluded_units_are_skipped() {
    let mut tree = el(
        1,
        "div",
        &[],
        vec![el(2, "button", &[("@click", "save()")], vec![])],
    );
    let config = PomConfig {
        excluded_units: ["Foo".to_string()].into_iter().collect(),
        ..PomConfig::default()
    };
    let snapshot = run(&mut tree, config).expect("synthesis");
    assert!(snapshot.entries.is_empty());
    assert!(!find(&tree, 2).expect("button").has_attr("data-testid"));
}

#[test]
fn recompilation_is_idempotent() {
    let mut tree = el(
        1,
        "div",
        &[],
        vec![
            el(2, "button", &[("@click", "() => save()")], vec![]),
            el(
                3,
                "div",
                &[("v-for", "tab in ['Home', 'About']")],
                vec![el(4, "button", &[("@click", "open(tab)")], vec![])],
            ),
            el(5, "router-link", &[("to", "/about")], vec![]),
        ],
    );

    let resolver = NullNavigationResolver;
    let mut engine = PomEngine::new(PomConfig::default(), &resolver);
    engine.begin_unit("Foo", "Foo.vue");
    engine.walk_template(&mut tree).expect("first pass");
    let first = serde_json::to_value(engine.finish_unit().expect("snapshot")).expect("json");

    // Second pass over the already-mutated tree: preserved identifiers and
    // reset unit state must reproduce the aggregate exactly.
    engine.begin_unit("Foo", "Foo.vue");
    engine.walk_template(&mut tree).expect("second pass");
    let second = serde_json::to_value(engine.finish_unit().expect("snapshot")).expect("json");

    assert_eq!(first, second);
}

#[test]
fn scoped_region_vetoes_literal_expansion() {
    let mut tree = el(
        1,
        "template",
        &[("v-slot:row", "slotProps")],
        vec![el(
            2,
            "div",
            &[("v-for", "tab in ['Home', 'About']")],
            vec![el(3, "button", &[("@click", "open(tab)")], vec![])],
        )],
    );
    let snapshot = run(&mut tree, PomConfig::default()).expect("synthesis");

    let pom = snapshot.entries[0].pom.as_ref().expect("pom");
    assert!(pom.emit_primary);
    assert!(snapshot.extras.is_empty());
}

#[test]
fn navigation_without_location_stays_literal() {
    let mut tree = el(
        1,
        "nav",
        &[],
        vec![
            el(2, "router-link", &[], vec![text("Back")]),
            el(3, "router-link", &[("to", "")], vec![]),
        ],
    );
    let snapshot = run(&mut tree, PomConfig::default()).expect("synthesis");

    let values: Vec<&IdentifierValue> = snapshot
        .entries
        .iter()
        .filter_map(|e| e.pom.as_ref())
        .map(|p| &p.value)
        .collect();
    assert_eq!(
        values,
        vec![
            &IdentifierValue::Literal("Foo-Back-link".to_string()),
            &IdentifierValue::Literal("Foo-link".to_string()),
        ]
    );

    // Literals land as plain attributes; no template binding with an empty
    // expression may appear.
    let labeled = find(&tree, 2).expect("labeled link");
    assert_eq!(labeled.attr_value("data-testid"), Some("Foo-Back-link"));
    assert!(!labeled.has_attr(":data-testid"));
    let bare = find(&tree, 3).expect("bare link");
    assert_eq!(bare.attr_value("data-testid"), Some("Foo-link"));
    assert!(!bare.has_attr(":data-testid"));
}

#[test]
fn click_modifiers_keep_activation_format() {
    let mut tree = el(
        1,
        "div",
        &[],
        vec![
            el(2, "button", &[("@click.stop", "save()")], vec![]),
            el(3, "button", &[("v-on:click.prevent", "cancel()")], vec![]),
        ],
    );
    let snapshot = run(&mut tree, PomConfig::default()).expect("synthesis");

    let values: Vec<&IdentifierValue> = snapshot
        .entries
        .iter()
        .filter_map(|e| e.pom.as_ref())
        .map(|p| &p.value)
        .collect();
    assert_eq!(
        values,
        vec![
            &IdentifierValue::Literal("Foo-Save-button".to_string()),
            &IdentifierValue::Literal("Foo-Cancel-button".to_string()),
        ]
    );
}
