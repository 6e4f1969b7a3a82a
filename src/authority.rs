//! Role mutation protocol boundary
//!
//! The session controller talks to the authority through this trait. Both
//! calls are at-most-once from the caller's point of view: there is no retry
//! inside the protocol, and a failure leaves the caller's draft untouched.

use crate::error::Result;
use crate::store::{self, MutationOutcome};
use crate::validate::RolePayload;

/// The remote authority consumed by a form session.
pub trait RoleAuthority {
    /// Persist a new role. Fails on a name collision.
    fn create_role(&self, payload: &RolePayload) -> Result<MutationOutcome>;

    /// Replace an existing role. Fails when `role_id` does not exist or the
    /// new name collides with another role.
    fn update_role(&self, role_id: &str, payload: &RolePayload) -> Result<MutationOutcome>;
}

/// In-process authority backed by the LMDB store.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreAuthority;

impl RoleAuthority for StoreAuthority {
    fn create_role(&self, payload: &RolePayload) -> Result<MutationOutcome> {
        store::create_role(payload)
    }

    fn update_role(&self, role_id: &str, payload: &RolePayload) -> Result<MutationOutcome> {
        store::update_role(role_id, payload)
    }
}
