//! Permission matrix model
//!
//! A matrix maps every taxonomy subject to a grant, and a grant maps every
//! action to a boolean. The wildcard action masks the discrete actions at
//! read time only: granting `*` never rewrites the stored discrete cells, and
//! revoking `*` reveals them again untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::taxonomy::{Action, Subject};

/// One subject's action grants.
pub type Grant = BTreeMap<Action, bool>;

/// The complete Subject x Action grant table for one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMatrix(BTreeMap<Subject, Grant>);

impl PermissionMatrix {
    /// Build the default matrix: every cell present, every cell `false`.
    pub fn all_false() -> Self {
        let mut subjects = BTreeMap::new();
        for subject in Subject::ALL {
            let mut grant = Grant::new();
            for action in Action::ALL {
                grant.insert(action, false);
            }
            subjects.insert(subject, grant);
        }
        PermissionMatrix(subjects)
    }

    /// Raw stored value of one cell. Absent cells read as `false`.
    pub fn get(&self, subject: Subject, action: Action) -> bool {
        self.0
            .get(&subject)
            .and_then(|g| g.get(&action))
            .copied()
            .unwrap_or(false)
    }

    /// Effective value of one cell: the subject's wildcard masks every
    /// discrete action while set, without touching the stored values.
    pub fn effective(&self, subject: Subject, action: Action) -> bool {
        self.get(subject, Action::Wildcard) || self.get(subject, action)
    }

    /// Write exactly one cell.
    pub fn set(&mut self, subject: Subject, action: Action, value: bool) {
        self.0.entry(subject).or_default().insert(action, value);
    }

    /// True when every Subject x Action cell is addressable.
    pub fn is_complete(&self) -> bool {
        Subject::ALL.iter().all(|s| {
            self.0
                .get(s)
                .map(|g| Action::ALL.iter().all(|a| g.contains_key(a)))
                .unwrap_or(false)
        })
    }

    /// Iterate subjects in taxonomy order with their grants.
    pub fn iter(&self) -> impl Iterator<Item = (&Subject, &Grant)> {
        self.0.iter()
    }
}
