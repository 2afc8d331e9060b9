//! Fatal engine errors.
//!
//! Every fatal error is immediate, never retried, and carries the unit name,
//! the source location, and remediation hints. None are downgraded.

#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};

use crate::ir::SourceLocation;

pub const ERR_EXISTING_ID_POLICY: &str = "POM-ERR-ID-001";
pub const ERR_UNPRESERVABLE_ID: &str = "POM-ERR-ID-002";
pub const ERR_ANONYMOUS_SUBMIT: &str = "POM-ERR-ID-003";
pub const ERR_NAME_COLLISION: &str = "POM-ERR-NAME-001";

fn get_guarantee(code: &str) -> &'static str {
    match code {
        ERR_EXISTING_ID_POLICY => {
            "Under existingIdBehavior \"error\", authored identifiers are never silently kept or replaced."
        }
        ERR_UNPRESERVABLE_ID => {
            "A preserved identifier is a literal, or a template with exactly one substitution bound to the enclosing loop key."
        }
        ERR_ANONYMOUS_SUBMIT => {
            "Submit controls always receive a derivable identity; there is no safe fallback name for them."
        }
        ERR_NAME_COLLISION => {
            "Getter and action names are unique within one generated unit's API."
        }
        _ => "Unknown invariant.",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "napi", napi(object))]
pub struct PomError {
    pub code: String,
    pub error_type: String,
    pub message: String,
    pub guarantee: String,
    pub unit: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub context: Option<String>,
    pub hints: Vec<String>,
}

impl PomError {
    pub fn new(code: &str, message: &str, unit: &str, file: &str, location: SourceLocation) -> Self {
        Self::with_details(code, message, unit, file, location, None, vec![])
    }

    pub fn with_details(
        code: &str,
        message: &str,
        unit: &str,
        file: &str,
        location: SourceLocation,
        context: Option<String>,
        hints: Vec<String>,
    ) -> Self {
        PomError {
            code: code.to_string(),
            error_type: "POM_SYNTHESIS_ERROR".to_string(),
            message: message.to_string(),
            guarantee: get_guarantee(code).to_string(),
            unit: unit.to_string(),
            file: file.to_string(),
            line: location.line,
            column: location.column,
            context,
            hints,
        }
    }
}

impl std::fmt::Display for PomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} (unit {}, {}:{}:{})",
            self.code, self.message, self.unit, self.file, self.line, self.column
        )
    }
}

impl std::error::Error for PomError {}
