//! Form session controller tests
//!
//! These drive the create/edit/view state machine against a scripted
//! authority and a recording host, covering the submit protocol: validation
//! gating, in-flight suppression, stale-response discard, and the per-error
//! recovery contract.

use std::cell::RefCell;

use rolegrid::{
    Action, FormSession, MutationOutcome, MutationRequest, PersistedRole, Phase,
    PermissionMatrix, Rejected, RoleAuthority, RoleDraft, RoleError, SessionHost, SessionMode,
    Subject, SubmitBlocked,
};

// ============================================================================
// Test Doubles
// ============================================================================

/// Records every host effect so tests can assert exactly-once delivery.
#[derive(Default)]
struct RecordingHost {
    successes: Vec<String>,
    failures: Vec<String>,
    closes: usize,
    refreshes: usize,
}

impl SessionHost for RecordingHost {
    fn notify_success(&mut self, message: &str) {
        self.successes.push(message.to_string());
    }
    fn notify_failure(&mut self, message: &str) {
        self.failures.push(message.to_string());
    }
    fn close_session(&mut self) {
        self.closes += 1;
    }
    fn refresh_roles(&mut self) {
        self.refreshes += 1;
    }
}

/// Captures dispatched mutations and replies with a scripted outcome.
struct ScriptedAuthority {
    calls: RefCell<Vec<MutationRequest>>,
    reply: rolegrid::Result<MutationOutcome>,
}

impl ScriptedAuthority {
    fn replying(reply: rolegrid::Result<MutationOutcome>) -> Self {
        ScriptedAuthority { calls: RefCell::new(Vec::new()), reply }
    }

    fn calls(&self) -> Vec<MutationRequest> {
        self.calls.borrow().clone()
    }
}

impl RoleAuthority for ScriptedAuthority {
    fn create_role(
        &self,
        payload: &rolegrid::RolePayload,
    ) -> rolegrid::Result<MutationOutcome> {
        self.calls.borrow_mut().push(MutationRequest::Create(payload.clone()));
        self.reply.clone()
    }

    fn update_role(
        &self,
        role_id: &str,
        payload: &rolegrid::RolePayload,
    ) -> rolegrid::Result<MutationOutcome> {
        self.calls.borrow_mut().push(MutationRequest::Update {
            role_id: role_id.to_string(),
            payload: payload.clone(),
        });
        self.reply.clone()
    }
}

fn persisted(id: &str, name: &str, permissions: PermissionMatrix) -> PersistedRole {
    PersistedRole { id: id.into(), name: name.into(), permissions }
}

fn created_outcome(name: &str, permissions: PermissionMatrix) -> MutationOutcome {
    MutationOutcome {
        role: persisted("1", name, permissions),
        message: "Role created successfully.".into(),
    }
}

fn edit_session(role_id: &str, name: &str, permissions: PermissionMatrix) -> FormSession {
    FormSession::new(SessionMode::Edit {
        role_id: role_id.into(),
        snapshot: RoleDraft { name: name.into(), permissions },
    })
}

// ============================================================================
// Create Flow
// ============================================================================

/// Create a role, toggle one cell, submit: the authority sees the full matrix
/// with exactly that cell set, and success resets the draft and closes.
#[test]
fn create_submits_full_matrix_and_resets() {
    let mut session = FormSession::new(SessionMode::Create);
    let mut host = RecordingHost::default();

    session.set_name("Billing").unwrap();
    session.set_cell(Subject::Billing, Action::Read, true).unwrap();

    let mut expected = PermissionMatrix::all_false();
    expected.set(Subject::Billing, Action::Read, true);
    let authority = ScriptedAuthority::replying(Ok(created_outcome("Billing", expected.clone())));

    session.submit(&authority, &mut host).unwrap();

    match &authority.calls()[..] {
        [MutationRequest::Create(payload)] => {
            assert_eq!(payload.name, "Billing");
            assert_eq!(payload.permissions, expected);
            assert!(payload.permissions.get(Subject::Billing, Action::Read));
            assert!(!payload.permissions.get(Subject::Billing, Action::Wildcard));
        }
        other => panic!("unexpected dispatch: {:?}", other),
    }

    assert_eq!(host.successes, vec!["Role created successfully."]);
    assert!(host.failures.is_empty());
    assert_eq!(host.closes, 1);
    assert_eq!(host.refreshes, 1);
    // Draft reset to its construction default.
    assert_eq!(session.name(), "");
    assert_eq!(*session.permissions(), PermissionMatrix::all_false());
    assert!(session.is_closed());
}

/// Empty name: field error on `name`, and the authority is never invoked.
#[test]
fn create_with_empty_name_never_reaches_authority() {
    let mut session = FormSession::new(SessionMode::Create);
    let mut host = RecordingHost::default();
    let authority = ScriptedAuthority::replying(Ok(created_outcome(
        "unused",
        PermissionMatrix::all_false(),
    )));

    let blocked = session.submit(&authority, &mut host).unwrap_err();
    match blocked {
        SubmitBlocked::Invalid(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].path, "name");
        }
        other => panic!("expected validation failure, got {:?}", other),
    }

    assert!(authority.calls().is_empty());
    assert!(host.successes.is_empty());
    assert!(host.failures.is_empty());
    // Errors are retained on the session for inline display.
    assert_eq!(session.field_errors().len(), 1);
    assert_eq!(session.phase(), Phase::Idle);
}

// ============================================================================
// Edit Flow
// ============================================================================

/// Edit an existing role and set a wildcard: the update carries the role id
/// and the full matrix, and every discrete action reads as granted through
/// the mask even though none were stored.
#[test]
fn edit_submits_update_with_role_id() {
    let snapshot = PermissionMatrix::all_false();
    let mut session = edit_session("7", "Employee", snapshot);
    let mut host = RecordingHost::default();

    session.set_cell(Subject::Members, Action::Wildcard, true).unwrap();

    let mut expected = PermissionMatrix::all_false();
    expected.set(Subject::Members, Action::Wildcard, true);
    let authority = ScriptedAuthority::replying(Ok(MutationOutcome {
        role: persisted("7", "Employee", expected.clone()),
        message: "Role updated successfully.".into(),
    }));

    // Discrete actions display as granted before submit, via the mask alone.
    assert!(session.effective_value(Subject::Members, Action::Read));
    assert!(session.effective_value(Subject::Members, Action::Delete));
    assert!(!session.permissions().get(Subject::Members, Action::Read));

    session.submit(&authority, &mut host).unwrap();

    match &authority.calls()[..] {
        [MutationRequest::Update { role_id, payload }] => {
            assert_eq!(role_id, "7");
            assert_eq!(payload.permissions, expected);
        }
        other => panic!("unexpected dispatch: {:?}", other),
    }
    assert_eq!(host.successes, vec!["Role updated successfully."]);
    assert_eq!(host.closes, 1);
    assert_eq!(host.refreshes, 1);
}

/// Success in edit mode resets the draft to the snapshot, not to all-false.
#[test]
fn edit_success_resets_to_snapshot() {
    let mut snapshot = PermissionMatrix::all_false();
    snapshot.set(Subject::Billing, Action::Read, true);
    let mut session = edit_session("3", "Investor", snapshot.clone());
    let mut host = RecordingHost::default();

    session.set_cell(Subject::Updates, Action::Create, true).unwrap();
    let authority = ScriptedAuthority::replying(Ok(MutationOutcome {
        role: persisted("3", "Investor", snapshot.clone()),
        message: "Role updated successfully.".into(),
    }));
    session.submit(&authority, &mut host).unwrap();

    assert_eq!(session.name(), "Investor");
    assert_eq!(*session.permissions(), snapshot);
}

// ============================================================================
// View Mode
// ============================================================================

/// View sessions reject every toggle and offer no submission path at all.
#[test]
fn view_mode_is_immutable() {
    let mut snapshot = PermissionMatrix::all_false();
    snapshot.set(Subject::Billing, Action::Wildcard, true);
    let mut session = FormSession::new(SessionMode::View {
        snapshot: RoleDraft { name: "Auditor".into(), permissions: snapshot },
    });

    assert!(session.is_read_only());
    assert!(!session.offers_submit());

    assert_eq!(session.set_cell(Subject::Billing, Action::Read, true), Err(Rejected::ReadOnly));
    assert_eq!(session.set_name("Renamed"), Err(Rejected::ReadOnly));
    assert_eq!(session.begin_submit(), Err(SubmitBlocked::ReadOnly));

    // The snapshot still renders, mask included.
    assert_eq!(session.name(), "Auditor");
    assert!(session.effective_value(Subject::Billing, Action::Delete));
}

// ============================================================================
// In-Flight and Stale Responses
// ============================================================================

/// A second submit while one is in flight is suppressed, not queued.
#[test]
fn second_submit_while_in_flight_is_suppressed() {
    let mut session = FormSession::new(SessionMode::Create);
    session.set_name("Billing").unwrap();

    let first = session.begin_submit();
    assert!(first.is_ok());
    assert_eq!(session.phase(), Phase::Submitting);

    assert_eq!(session.begin_submit(), Err(SubmitBlocked::InFlight));
}

/// A response arriving after the session closed is dropped: no notification,
/// no close request, no refresh.
#[test]
fn stale_response_after_close_is_discarded() {
    let mut session = FormSession::new(SessionMode::Create);
    let mut host = RecordingHost::default();
    session.set_name("Billing").unwrap();

    session.begin_submit().unwrap();
    session.close();

    session.finish_submit(
        Ok(created_outcome("Billing", PermissionMatrix::all_false())),
        &mut host,
    );

    assert!(host.successes.is_empty());
    assert!(host.failures.is_empty());
    assert_eq!(host.closes, 0);
    assert_eq!(host.refreshes, 0);
}

/// A completion with no matching dispatch is also a no-op.
#[test]
fn finish_without_begin_is_ignored() {
    let mut session = FormSession::new(SessionMode::Create);
    let mut host = RecordingHost::default();

    session.finish_submit(
        Ok(created_outcome("Billing", PermissionMatrix::all_false())),
        &mut host,
    );

    assert!(host.successes.is_empty());
    assert_eq!(host.closes, 0);
}

// ============================================================================
// Remote Error Contract
// ============================================================================

/// A name collision surfaces inline on `name` and as a failure notice; the
/// draft survives for correction.
#[test]
fn name_collision_maps_to_name_field() {
    let mut session = FormSession::new(SessionMode::Create);
    let mut host = RecordingHost::default();
    session.set_name("Billing").unwrap();
    session.set_cell(Subject::Billing, Action::Read, true).unwrap();

    let authority =
        ScriptedAuthority::replying(Err(RoleError::NameTaken("Billing".into())));
    session.submit(&authority, &mut host).unwrap();

    assert_eq!(session.field_errors().len(), 1);
    assert_eq!(session.field_errors()[0].path, "name");
    assert_eq!(host.failures.len(), 1);
    assert!(host.successes.is_empty());
    assert_eq!(host.closes, 0);
    // Draft preserved.
    assert_eq!(session.name(), "Billing");
    assert!(session.permissions().get(Subject::Billing, Action::Read));
    assert!(!session.is_closed());
    assert_eq!(session.phase(), Phase::Idle);
}

/// Updating a role that no longer exists is fatal: one failure notice and the
/// session closes, since retry cannot succeed.
#[test]
fn not_found_closes_the_session() {
    let mut session = edit_session("9", "Ghost", PermissionMatrix::all_false());
    let mut host = RecordingHost::default();

    let authority = ScriptedAuthority::replying(Err(RoleError::NotFound("9".into())));
    session.submit(&authority, &mut host).unwrap();

    assert_eq!(host.failures.len(), 1);
    assert_eq!(host.closes, 1);
    assert_eq!(host.refreshes, 0);
    assert!(session.is_closed());
    assert_eq!(session.begin_submit(), Err(SubmitBlocked::Closed));
}

/// A transport failure preserves the draft and allows a retry that succeeds.
#[test]
fn transport_error_allows_resubmit() {
    let mut session = FormSession::new(SessionMode::Create);
    let mut host = RecordingHost::default();
    session.set_name("Billing").unwrap();
    session.set_cell(Subject::Billing, Action::Update, true).unwrap();

    let failing = ScriptedAuthority::replying(Err(RoleError::Storage("connection reset".into())));
    session.submit(&failing, &mut host).unwrap();

    assert_eq!(host.failures, vec!["connection reset"]);
    assert_eq!(host.closes, 0);
    assert!(session.permissions().get(Subject::Billing, Action::Update));

    let mut expected = PermissionMatrix::all_false();
    expected.set(Subject::Billing, Action::Update, true);
    let working = ScriptedAuthority::replying(Ok(created_outcome("Billing", expected)));
    session.submit(&working, &mut host).unwrap();

    assert_eq!(host.successes.len(), 1);
    assert_eq!(host.closes, 1);
}
