//! Directive vocabulary of the host template dialect.
//!
//! The engine only ever compares attribute names against these constants, so
//! a host adapter targeting a different dialect remaps them in one place.

/// Repeating-scope directive: `v-for="item in items"`.
pub const ATTR_LOOP: &str = "v-for";

/// Conditional-branch directives.
pub const ATTR_IF: &str = "v-if";
pub const ATTR_ELSE_IF: &str = "v-else-if";
pub const ATTR_ELSE: &str = "v-else";

/// Value/model binding for native and wrapper controls.
pub const ATTR_MODEL: &str = "v-model";

/// Activation (click-equivalent) directive, shorthand and longhand.
pub const ATTR_CLICK_SHORT: &str = "@click";
pub const ATTR_CLICK_LONG: &str = "v-on:click";

/// Prefixes that mark any handler-attribute binding.
pub const HANDLER_PREFIX_SHORT: &str = "@";
pub const HANDLER_PREFIX_LONG: &str = "v-on:";

/// Scoped-region tag and directive (`<template v-slot:row="params">`).
pub const SCOPED_REGION_TAG: &str = "template";
pub const ATTR_SLOT_PREFIX: &str = "v-slot";
pub const ATTR_SLOT_SHORTHAND: &str = "#";

/// Navigation element and its location-descriptor attribute.
pub const NAV_TAG: &str = "router-link";
pub const ATTR_NAV_TO: &str = "to";

/// Options source consumed by radio and custom-select wrappers.
pub const ATTR_OPTIONS: &str = "options";

/// Default automation-identifier attribute; overridable in configuration.
pub const DEFAULT_ID_ATTR: &str = "data-testid";

pub fn is_handler_attr(name: &str) -> bool {
    name.starts_with(HANDLER_PREFIX_SHORT) || name.starts_with(HANDLER_PREFIX_LONG)
}

/// Event modifiers (`@click.stop`, `v-on:click.prevent`) do not change the
/// event the directive binds, so they are ignored here.
pub fn is_activation_attr(name: &str) -> bool {
    let event = name.split('.').next().unwrap_or(name);
    event == ATTR_CLICK_SHORT || event == ATTR_CLICK_LONG
}

pub fn is_scoped_region_attr(name: &str) -> bool {
    name.starts_with(ATTR_SLOT_PREFIX) || name.starts_with(ATTR_SLOT_SHORTHAND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_ignores_event_modifiers() {
        assert!(is_activation_attr("@click"));
        assert!(is_activation_attr("@click.stop"));
        assert!(is_activation_attr("v-on:click.prevent.self"));
        assert!(!is_activation_attr("@clicked"));
        assert!(!is_activation_attr("@submit.prevent"));
    }
}
