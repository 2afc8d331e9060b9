//! Engine configuration, deserialized from the host's plugin options.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dialect;
use crate::roles::RoleConfig;

/// What to do when an element already carries an authored identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistingIdBehavior {
    #[default]
    Preserve,
    Overwrite,
    Error,
}

/// How to resolve getter/action name collisions within one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameCollisionBehavior {
    Error,
    Warn,
    #[default]
    Suffix,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomConfig {
    #[serde(default)]
    pub existing_id_behavior: ExistingIdBehavior,
    #[serde(default)]
    pub name_collision_behavior: NameCollisionBehavior,
    #[serde(default = "default_id_attr")]
    pub identifier_attribute_name: String,
    /// Explicit tag → role table for wrapper components.
    #[serde(default)]
    pub native_wrappers: HashMap<String, RoleConfig>,
    /// Units the engine skips entirely.
    #[serde(default)]
    pub excluded_units: HashSet<String>,
    /// Search roots for unit definition files (single-root inference).
    #[serde(default)]
    pub unit_roots: Vec<PathBuf>,
}

fn default_id_attr() -> String {
    dialect::DEFAULT_ID_ATTR.to_string()
}

impl Default for PomConfig {
    fn default() -> Self {
        PomConfig {
            existing_id_behavior: ExistingIdBehavior::default(),
            name_collision_behavior: NameCollisionBehavior::default(),
            identifier_attribute_name: default_id_attr(),
            native_wrappers: HashMap::new(),
            excluded_units: HashSet::new(),
            unit_roots: Vec::new(),
        }
    }
}
