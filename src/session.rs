//! Form session controller
//!
//! One session owns one live role draft for its whole lifetime. The mode is
//! fixed at construction: a different mode means a new session. Submission is
//! split into `begin_submit` / `finish_submit` so the remote call can suspend
//! in between; while a call is in flight a second submit is suppressed, and a
//! response that lands after the session closed is discarded without side
//! effects.

use serde::{Deserialize, Serialize};

use crate::authority::RoleAuthority;
use crate::error::{Result, RoleError};
use crate::matrix::PermissionMatrix;
use crate::store::MutationOutcome;
use crate::taxonomy::{Action, Subject};
use crate::validate::{validate_role, FieldError, RolePayload};

/// An in-memory, not-yet-persisted role edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDraft {
    pub name: String,
    pub permissions: PermissionMatrix,
}

impl Default for RoleDraft {
    fn default() -> Self {
        RoleDraft { name: String::new(), permissions: PermissionMatrix::all_false() }
    }
}

/// Session mode, fixed for the lifetime of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    /// Fresh draft, default matrix.
    Create,
    /// Draft initialized from a persisted role, mutable.
    Edit { role_id: String, snapshot: RoleDraft },
    /// Draft initialized from a persisted role, immutable.
    View { snapshot: RoleDraft },
}

/// Submission sub-state within `Create`/`Edit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting,
}

/// Why an edit was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    /// View sessions have no mutation path.
    ReadOnly,
}

/// Why a submit attempt did not dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitBlocked {
    /// View sessions offer no submit control.
    ReadOnly,
    /// A mutation is already in flight; the attempt is suppressed, not queued.
    InFlight,
    /// The session was already closed.
    Closed,
    /// Validation failed; the authority was never consulted.
    Invalid(Vec<FieldError>),
}

/// The mutation to dispatch to the authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRequest {
    Create(RolePayload),
    Update { role_id: String, payload: RolePayload },
}

/// Host boundary: notifications plus the open/close lifecycle of whatever is
/// hosting the session. Each notification fires exactly once per terminal
/// outcome of a submit attempt.
pub trait SessionHost {
    fn notify_success(&mut self, message: &str);
    fn notify_failure(&mut self, message: &str);
    fn close_session(&mut self);
    fn refresh_roles(&mut self);
}

/// One interactive role editing session.
#[derive(Debug)]
pub struct FormSession {
    mode: SessionMode,
    draft: RoleDraft,
    phase: Phase,
    closed: bool,
    field_errors: Vec<FieldError>,
}

impl FormSession {
    pub fn new(mode: SessionMode) -> Self {
        let draft = Self::initial_draft(&mode);
        FormSession { mode, draft, phase: Phase::Idle, closed: false, field_errors: Vec::new() }
    }

    fn initial_draft(mode: &SessionMode) -> RoleDraft {
        match mode {
            SessionMode::Create => RoleDraft::default(),
            SessionMode::Edit { snapshot, .. } | SessionMode::View { snapshot } => snapshot.clone(),
        }
    }

    pub fn mode(&self) -> &SessionMode {
        &self.mode
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self.mode, SessionMode::View { .. })
    }

    /// Whether a submit control exists at all. `View` sessions never offer
    /// one.
    pub fn offers_submit(&self) -> bool {
        !self.is_read_only()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn name(&self) -> &str {
        &self.draft.name
    }

    pub fn permissions(&self) -> &PermissionMatrix {
        &self.draft.permissions
    }

    /// Field errors from the last submit attempt, for inline display.
    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    /// What a checkbox displays: the subject's wildcard masks every discrete
    /// action while set.
    pub fn effective_value(&self, subject: Subject, action: Action) -> bool {
        self.draft.permissions.effective(subject, action)
    }

    pub fn set_name(&mut self, name: &str) -> std::result::Result<(), Rejected> {
        if self.is_read_only() {
            return Err(Rejected::ReadOnly);
        }
        self.draft.name = name.to_string();
        Ok(())
    }

    /// Toggle one cell. Rejected in `View` mode; the matrix model itself has
    /// no notion of mode.
    pub fn set_cell(
        &mut self,
        subject: Subject,
        action: Action,
        value: bool,
    ) -> std::result::Result<(), Rejected> {
        if self.is_read_only() {
            return Err(Rejected::ReadOnly);
        }
        self.draft.permissions.set(subject, action, value);
        Ok(())
    }

    /// Validate the draft and, if it passes, enter `Submitting` and hand back
    /// the mutation to dispatch. Validation failures are retained on the
    /// session and never reach the authority.
    pub fn begin_submit(&mut self) -> std::result::Result<MutationRequest, SubmitBlocked> {
        if self.is_read_only() {
            return Err(SubmitBlocked::ReadOnly);
        }
        if self.closed {
            return Err(SubmitBlocked::Closed);
        }
        if self.phase == Phase::Submitting {
            return Err(SubmitBlocked::InFlight);
        }

        let candidate = serde_json::json!({
            "name": self.draft.name,
            "permissions": self.draft.permissions,
        });
        let payload = match validate_role(&candidate) {
            Ok(payload) => payload,
            Err(errors) => {
                self.field_errors = errors.clone();
                return Err(SubmitBlocked::Invalid(errors));
            }
        };

        let request = match &self.mode {
            SessionMode::Create => MutationRequest::Create(payload),
            SessionMode::Edit { role_id, .. } => {
                MutationRequest::Update { role_id: role_id.clone(), payload }
            }
            SessionMode::View { .. } => return Err(SubmitBlocked::ReadOnly),
        };
        self.field_errors.clear();
        self.phase = Phase::Submitting;
        Ok(request)
    }

    /// Apply the terminal outcome of the dispatched mutation. Called exactly
    /// once per dispatch; a stale call after the session closed is a no-op.
    pub fn finish_submit(&mut self, outcome: Result<MutationOutcome>, host: &mut dyn SessionHost) {
        if self.closed || self.phase != Phase::Submitting {
            // Stale response, e.g. the session closed while the call was in
            // flight. Intentionally dropped.
            return;
        }
        self.phase = Phase::Idle;

        match outcome {
            Ok(outcome) => {
                self.field_errors.clear();
                self.draft = Self::initial_draft(&self.mode);
                self.closed = true;
                host.notify_success(&outcome.message);
                host.close_session();
                host.refresh_roles();
            }
            Err(e @ RoleError::NameTaken(_)) => {
                self.field_errors =
                    vec![FieldError { path: "name".into(), message: e.to_string() }];
                host.notify_failure(&e.to_string());
            }
            Err(e @ RoleError::NotFound(_)) => {
                // The role is gone; resubmitting cannot succeed.
                self.closed = true;
                host.notify_failure(&e.to_string());
                host.close_session();
            }
            Err(e @ RoleError::Storage(_)) => {
                // Draft kept so the user can correct and resubmit.
                host.notify_failure(&e.to_string());
            }
        }
    }

    /// Drive one full submit attempt against an authority.
    pub fn submit(
        &mut self,
        authority: &dyn RoleAuthority,
        host: &mut dyn SessionHost,
    ) -> std::result::Result<(), SubmitBlocked> {
        let request = self.begin_submit()?;
        let outcome = match &request {
            MutationRequest::Create(payload) => authority.create_role(payload),
            MutationRequest::Update { role_id, payload } => {
                authority.update_role(role_id, payload)
            }
        };
        self.finish_submit(outcome, host);
        Ok(())
    }

    /// Close the session. A mutation still in flight is not cancelled; its
    /// response will be discarded when it arrives.
    pub fn close(&mut self) {
        self.closed = true;
    }
}
