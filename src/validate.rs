//! Role payload validation
//!
//! Structural and semantic checks over a candidate `{ name, permissions }`
//! payload. Validation is pure and synchronous; it never consults the role
//! store. Name uniqueness is the authority's job at mutation time.
//!
//! Every violation carries a stable dotted field path (`name`,
//! `permissions.Billing.read`) so callers can attach errors to the matching
//! control without re-deriving the path.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::matrix::PermissionMatrix;
use crate::taxonomy::{Action, Subject};

/// One field-scoped validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError { path: path.into(), message: message.into() }
    }
}

/// An accepted role payload: trimmed non-empty name, structurally complete
/// matrix. Only produced by [`validate_role`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePayload {
    pub name: String,
    pub permissions: PermissionMatrix,
}

/// Validate a candidate payload.
///
/// Rules:
/// - `name` required, non-empty after trimming
/// - `permissions` key set equals the subject taxonomy, no more, no fewer
/// - each grant's key set equals the action taxonomy
/// - every leaf is a boolean
///
/// Unknown subject or action keys are rejected so stale data from an older
/// taxonomy cannot be silently accepted. Unknown top-level fields (`roleId`
/// rides along on update payloads) are ignored.
pub fn validate_role(value: &Value) -> std::result::Result<RolePayload, Vec<FieldError>> {
    let mut errors = Vec::new();

    let obj = match value.as_object() {
        Some(obj) => obj,
        None => {
            return Err(vec![FieldError::new("", "Expected an object with name and permissions")]);
        }
    };

    let name = match obj.get("name").and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        Some(_) | None => {
            errors.push(FieldError::new("name", "Role name is required"));
            String::new()
        }
    };

    let mut matrix = PermissionMatrix::all_false();
    match obj.get("permissions").and_then(Value::as_object) {
        Some(perms) => {
            for (subject_key, grant_value) in perms {
                let subject = match Subject::parse(subject_key) {
                    Some(s) => s,
                    None => {
                        errors.push(FieldError::new(
                            format!("permissions.{}", subject_key),
                            format!("Unknown subject '{}'", subject_key),
                        ));
                        continue;
                    }
                };
                validate_grant(subject, grant_value, &mut matrix, &mut errors);
            }
            for subject in Subject::ALL {
                if !perms.contains_key(subject.as_str()) {
                    errors.push(FieldError::new(
                        format!("permissions.{}", subject),
                        format!("Missing subject '{}'", subject),
                    ));
                }
            }
        }
        None => errors.push(FieldError::new("permissions", "Permissions are required")),
    }

    if errors.is_empty() {
        Ok(RolePayload { name, permissions: matrix })
    } else {
        Err(errors)
    }
}

fn validate_grant(
    subject: Subject,
    grant_value: &Value,
    matrix: &mut PermissionMatrix,
    errors: &mut Vec<FieldError>,
) {
    let grant = match grant_value.as_object() {
        Some(g) => g,
        None => {
            errors.push(FieldError::new(
                format!("permissions.{}", subject),
                "Expected an action-to-boolean mapping",
            ));
            return;
        }
    };

    for (action_key, leaf) in grant {
        let action = match Action::parse(action_key) {
            Some(a) => a,
            None => {
                errors.push(FieldError::new(
                    format!("permissions.{}.{}", subject, action_key),
                    format!("Unknown action '{}'", action_key),
                ));
                continue;
            }
        };
        match leaf.as_bool() {
            Some(v) => matrix.set(subject, action, v),
            None => errors.push(FieldError::new(
                format!("permissions.{}.{}", subject, action),
                "Expected a boolean",
            )),
        }
    }
    for action in Action::ALL {
        if !grant.contains_key(action.as_str()) {
            errors.push(FieldError::new(
                format!("permissions.{}.{}", subject, action),
                format!("Missing action '{}'", action),
            ));
        }
    }
}
