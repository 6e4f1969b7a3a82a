//! Rolegrid - role-based access control with a wildcard permission matrix
//!
//! An operator defines named roles, each holding a grant for every
//! (subject, action) pair in a fixed taxonomy. The crate models the grant
//! matrix, validates role payloads, persists them through an LMDB-backed
//! authority, and drives the create/edit/view form session that mutates them.
//!
//! Wildcard semantics: a subject's `*` grant masks its discrete actions at
//! read time. Setting `*` never erases the discrete values, and clearing `*`
//! reveals them again unchanged.

pub mod authority;
pub mod error;
pub mod matrix;
pub mod session;
pub mod store;
pub mod taxonomy;
pub mod validate;

pub use authority::{RoleAuthority, StoreAuthority};
pub use error::{err, Result, RoleError};
pub use matrix::{Grant, PermissionMatrix};
pub use session::{
    FormSession, MutationRequest, Phase, Rejected, RoleDraft, SessionHost, SessionMode,
    SubmitBlocked,
};
pub use store::{
    clear_all, create_role, find_role_by_name, get_role, init, list_roles, test_lock,
    update_role, MutationOutcome, PersistedRole,
};
pub use taxonomy::{Action, Subject};
pub use validate::{validate_role, FieldError, RolePayload};
