mod common;

use common::{farmer, png, Backend, Harness};
use serde_json::json;
use shared::capabilities::{DocumentOperation, IdentityError, IdentityOperation, PreviewOperation};
use shared::model::{Identity, LoadState, Submission};
use shared::{Effect, ErrorKind, Event, FieldUpdate};

fn asha() -> Identity {
    let mut identity = farmer("u1", "a@b.com");
    identity.display_name = Some("Asha".into());
    identity
}

fn ready_to_edit() -> Harness {
    let mut h = Harness::opened(Backend::with_user(asha()));
    h.send(Event::EditRequested);
    h
}

#[test]
fn test_second_submit_is_ignored_while_saving() {
    let mut h = ready_to_edit();
    h.send(Event::FieldChanged(FieldUpdate::Location("Pune".into())));

    let first = h.app.update(Event::SubmitRequested, &mut h.model);
    assert!(h.model.is_saving());
    assert!(first.effects.iter().any(|effect| matches!(
        effect,
        Effect::IdentityProvider(request)
            if matches!(request.operation, IdentityOperation::UpdateProfile { .. })
    )));

    let second = h.app.update(Event::SubmitRequested, &mut h.model);
    assert!(second.effects.is_empty());

    let late_edit = h.app.update(
        Event::FieldChanged(FieldUpdate::Location("Nashik".into())),
        &mut h.model,
    );
    assert!(late_edit.effects.is_empty());
    let cancel = h.app.update(Event::EditCancelled, &mut h.model);
    assert!(cancel.effects.is_empty());
    assert!(h.model.mode.is_editing());

    h.run_effects(first.effects);

    assert_eq!(h.backend.identity_updates.len(), 1);
    assert_eq!(h.backend.document_writes.len(), 1);
    assert_eq!(h.backend.document_writes[0]["location"], json!("Pune"));
    assert_eq!(h.model.profile.location, "Pune");
    assert_eq!(h.model.submission, Submission::Succeeded);
}

#[test]
fn test_view_disables_submit_while_saving() {
    let mut h = ready_to_edit();

    let _pending = h.app.update(Event::SubmitRequested, &mut h.model);
    let view = h.view();
    assert!(view.is_editing);
    assert!(!view.can_submit);
}

#[test]
fn test_result_after_sign_out_is_dropped() {
    let mut h = ready_to_edit();

    let submit = h.app.update(Event::SubmitRequested, &mut h.model);
    h.send(Event::SessionChanged(None));
    h.run_effects(submit.effects);

    assert!(h.backend.document_writes.is_empty());
    assert_eq!(h.model.submission, Submission::Idle);
    assert!(h.model.toast.is_none());
}

#[test]
fn test_profile_for_previous_user_is_dropped() {
    let mut backend = Backend::with_user(asha());
    backend.put_document("u1", json!({ "name": "Asha", "location": "Pune" }));
    backend.put_document("u2", json!({ "name": "Ravi", "location": "Nashik" }));
    let mut h = Harness::new(backend);

    let first_load = h.app.update(Event::SessionChanged(Some(asha())), &mut h.model);
    assert!(first_load.effects.iter().any(|effect| matches!(
        effect,
        Effect::DocumentStore(request)
            if matches!(&request.operation, DocumentOperation::Get { key, .. } if key == "u1")
    )));

    h.send(Event::SessionChanged(Some(farmer("u2", "ravi@example.com"))));
    assert_eq!(h.model.profile.name, "Ravi");

    h.run_effects(first_load.effects);
    assert_eq!(h.model.profile.name, "Ravi");
    assert_eq!(h.model.profile.location, "Nashik");
    assert_eq!(h.model.profile.email, "ravi@example.com");
}

#[test]
fn test_late_preview_for_discarded_image_is_revoked() {
    let mut h = ready_to_edit();

    let selected = h.app.update(Event::ImageSelected(png("me.png")), &mut h.model);
    assert!(selected.effects.iter().any(|effect| matches!(
        effect,
        Effect::Preview(request) if matches!(request.operation, PreviewOperation::Create { .. })
    )));

    h.send(Event::EditCancelled);
    h.run_effects(selected.effects);

    assert!(h.backend.live_previews.is_empty());
    assert_eq!(h.backend.revoked_previews, vec!["blob:preview/1"]);
    assert!(h.model.local_preview.is_none());
    assert!(h.view().preview_url.is_none());
}

#[test]
fn test_retry_after_failure_succeeds() {
    let mut h = ready_to_edit();
    h.backend.failures.identity_update = Some(IdentityError::Unavailable {
        reason: "503".into(),
    });

    h.send(Event::FieldChanged(FieldUpdate::FarmSize("7".into())));
    h.send(Event::SubmitRequested);
    assert!(matches!(
        &h.model.submission,
        Submission::Failed(error) if error.kind == ErrorKind::IdentityUpdateFailure
    ));
    assert!(h.backend.identity_updates.is_empty());
    assert!(h.backend.document_writes.is_empty());

    h.backend.failures.identity_update = None;
    h.send(Event::SubmitRequested);
    assert_eq!(h.model.submission, Submission::Succeeded);
    assert_eq!(h.model.profile.farm_details.farm_size, "7");
    assert_eq!(h.backend.identity_updates.len(), 1);
}

fn requests_fetch(effects: &[Effect]) -> bool {
    effects.iter().any(|effect| {
        matches!(
            effect,
            Effect::DocumentStore(request)
                if matches!(request.operation, DocumentOperation::Get { .. })
        )
    })
}

#[test]
fn test_reload_during_edit_cannot_undo_a_save() {
    let mut backend = Backend::with_user(asha());
    backend.put_document("u1", json!({ "name": "Old", "location": "Pune" }));
    let mut h = Harness::opened(backend);
    assert_eq!(h.model.profile.name, "Old");

    h.send(Event::EditRequested);
    h.send(Event::FieldChanged(FieldUpdate::Name("New".into())));
    let reload = h.app.update(Event::ReloadRequested, &mut h.model);
    assert!(!requests_fetch(&reload.effects));
    assert_eq!(h.model.load_state, LoadState::Ready);

    h.send(Event::SubmitRequested);
    h.run_effects(reload.effects);

    assert_eq!(h.model.profile.name, "New");
    assert_eq!(h.backend.document("u1").unwrap()["name"], json!("New"));

    h.send(Event::EditRequested);
    assert_eq!(h.model.mode.draft().unwrap().name, "New");
}

#[test]
fn test_reload_in_flight_blocks_edit() {
    let mut backend = Backend::with_user(asha());
    backend.put_document("u1", json!({ "name": "Asha", "location": "Pune" }));
    let mut h = Harness::opened(backend);

    let reload = h.app.update(Event::ReloadRequested, &mut h.model);
    assert!(requests_fetch(&reload.effects));
    assert!(h.model.is_loading());

    let edit = h.app.update(Event::EditRequested, &mut h.model);
    assert!(edit.effects.is_empty());
    assert!(!h.model.mode.is_editing());

    h.run_effects(reload.effects);
    assert_eq!(h.model.load_state, LoadState::Ready);
    h.send(Event::EditRequested);
    assert!(h.model.mode.is_editing());
}

#[test]
fn test_submit_ignored_while_loading() {
    let mut h = ready_to_edit();
    h.model.load_state = LoadState::Loading {
        user_id: asha().id,
    };

    let submit = h.app.update(Event::SubmitRequested, &mut h.model);
    assert!(submit.effects.is_empty());
    assert_eq!(h.model.submission, Submission::Idle);
    assert!(h.backend.identity_updates.is_empty());
}
