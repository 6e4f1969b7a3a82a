//! Fixed subject/action taxonomy
//!
//! The subject and action sets are closed. Changing either is a schema
//! migration, not a runtime concern: stored roles are validated against these
//! sets on every mutation, so stale keys are rejected instead of silently
//! carried forward.

use serde::{Deserialize, Serialize};

/// Protected resource category a permission applies to.
///
/// Declaration order is display order, and the derived `Ord` keeps matrix
/// serialization in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Subject {
    Billing,
    Company,
    Documents,
    Members,
    Roles,
    Securities,
    Stakeholders,
    Updates,
}

/// Operation type a permission applies to. `Wildcard` is `*`, "all actions".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[serde(rename = "*")]
    Wildcard,
    Create,
    Read,
    Update,
    Delete,
}

impl Subject {
    pub const ALL: [Subject; 8] = [
        Subject::Billing,
        Subject::Company,
        Subject::Documents,
        Subject::Members,
        Subject::Roles,
        Subject::Securities,
        Subject::Stakeholders,
        Subject::Updates,
    ];

    /// Wire name, as it appears in payload keys and field paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Billing => "Billing",
            Subject::Company => "Company",
            Subject::Documents => "Documents",
            Subject::Members => "Members",
            Subject::Roles => "Roles",
            Subject::Securities => "Securities",
            Subject::Stakeholders => "Stakeholders",
            Subject::Updates => "Updates",
        }
    }

    /// Parse a wire name. Returns `None` for anything outside the taxonomy.
    pub fn parse(s: &str) -> Option<Subject> {
        Subject::ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Wildcard,
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
    ];

    /// Wire name, as it appears in payload keys and field paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Wildcard => "*",
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// Parse a wire name. Returns `None` for anything outside the taxonomy.
    pub fn parse(s: &str) -> Option<Action> {
        Action::ALL.iter().copied().find(|v| v.as_str() == s)
    }

    /// Human-readable column label.
    pub fn label(&self) -> &'static str {
        match self {
            Action::Wildcard => "All",
            Action::Create => "Create",
            Action::Read => "Read",
            Action::Update => "Update",
            Action::Delete => "Delete",
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
