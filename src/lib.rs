//! # Page-Object Synthesis Engine
//!
//! Walks a compiled template tree one node at a time, decides which elements
//! need a stable automation identifier, derives that identifier from the
//! element's role and surrounding directive expressions, and synthesizes the
//! typed page-object surface a black-box test suite drives the page with.
//!
//! ## Synthesis Invariants
//!
//! 1. **Determinism**: identifiers derive only from source structure (roles,
//!    directive expressions, loop keys), never from runtime values and never
//!    from identifiers this engine generated earlier.
//!
//! 2. **One placeholder**: a synthesized identifier is a plain literal or a
//!    template with exactly one `${…}` substitution bound to the enclosing
//!    loop key.
//!
//! 3. **Unique members**: within one generated unit, getter names and action
//!    names are each pairwise-disjoint, except entries deliberately merged by
//!    identical merge key + role + navigation target.
//!
//! 4. **One tree mutation**: the engine only ever inserts or replaces the
//!    automation-identifier attribute: a literal attribute for static
//!    identifiers, a template binding for keyed ones.
//!
//! 5. **Idempotence**: recompiling an unchanged unit resets that unit's
//!    state and reproduces the identical aggregate.
//!
//! 6. **Fatal means fatal**: policy violations (POM-ERR-ID-001/002/003,
//!    POM-ERR-NAME-001) carry unit, location, and remediation hints, and are
//!    never downgraded or swallowed.

#[cfg(feature = "napi")]
use napi_derive::napi;

mod aggregate;
mod classify;
mod config;
mod dialect;
mod engine;
mod error;
mod hierarchy;
mod ir;
mod naming;
mod roles;
mod static_list;
mod synth;

#[cfg(test)]
mod classifier_tests;
#[cfg(test)]
mod engine_tests;

pub use aggregate::{
    GeneratedIdEntry, PomContext, PomExtraMethod, PomSpec, UnitAggregate, UnitSnapshot,
};
pub use classify::{classify, NamingSignal, SignalOrigin};
pub use config::{ExistingIdBehavior, NameCollisionBehavior, PomConfig};
pub use engine::{NavigationResolver, NullNavigationResolver, PomEngine};
pub use error::PomError;
pub use ir::{
    AttributeIR, ElementNode, IdentifierValue, NodeId, SourceLocation, TemplateNode, TextNode,
};
pub use roles::{InferenceCache, Role, RoleConfig};

/// Full synthesis pass over one unit's tree: returns the mutated tree plus
/// the per-unit snapshot, or the fatal error. This is the Rust-to-Rust entry
/// point; the NAPI wrapper below is a JSON shim over it.
pub fn synthesize_unit(
    unit: &str,
    file: &str,
    tree: &mut TemplateNode,
    config: PomConfig,
    resolver: &dyn NavigationResolver,
) -> Result<UnitSnapshot, PomError> {
    let mut engine = PomEngine::new(config, resolver);
    engine.begin_unit(unit, file);
    engine.walk_template(tree)?;
    Ok(engine.finish_unit().unwrap_or_else(|| UnitSnapshot {
        unit: unit.to_string(),
        entries: vec![],
        extras: vec![],
    }))
}

#[cfg(feature = "napi")]
#[napi]
pub fn synthesize_unit_native(
    unit: String,
    file: String,
    tree_json: String,
    config_json: String,
) -> String {
    let config: PomConfig = match serde_json::from_str(&config_json) {
        Ok(config) => config,
        Err(err) => return bridge_failure(&format!("invalid config JSON: {}", err)),
    };
    let mut tree: TemplateNode = match serde_json::from_str(&tree_json) {
        Ok(tree) => tree,
        Err(err) => return bridge_failure(&format!("invalid tree JSON: {}", err)),
    };

    let resolver = NullNavigationResolver;
    match synthesize_unit(&unit, &file, &mut tree, config, &resolver) {
        Ok(snapshot) => serde_json::json!({
            "tree": tree,
            "snapshot": snapshot,
            "error": null,
        })
        .to_string(),
        Err(err) => serde_json::json!({
            "tree": null,
            "snapshot": null,
            "error": err,
        })
        .to_string(),
    }
}

#[cfg(feature = "napi")]
fn bridge_failure(message: &str) -> String {
    serde_json::json!({
        "tree": null,
        "snapshot": null,
        "error": {
            "code": "POM-ERR-BRIDGE-001",
            "errorType": "POM_SYNTHESIS_ERROR",
            "message": message,
        },
    })
    .to_string()
}

#[cfg(feature = "napi")]
#[napi]
pub fn synthesis_bridge() -> String {
    "POM Synthesis Native Bridge Connected".to_string()
}
