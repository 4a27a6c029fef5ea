use tracing::{debug, info, warn};
use url::Url;

use crate::capabilities::{
    BlobKey, BlobOutput, Capabilities, DocumentError, DocumentOutput, IdentityChanges,
    IdentityError, IdentityOutput, PreviewOutput, TimerOutput,
};
use crate::document::{ProfileDocument, ProfilePatch};
use crate::event::Event;
use crate::model::{
    Identity, LoadState, LocalPreview, Mode, Model, PendingSubmission, ProfileDraft,
    StagedImage, Submission, SubmissionId, ToastKind, UserId, UserProfile,
};
use crate::view::{build_view, ViewModel};
use crate::{
    AppError, AppResult, ErrorKind, PROFILE_SAVED_MESSAGE, TOAST_DURATION, USERS_COLLECTION,
};

#[derive(Default)]
pub struct App;

impl App {
    fn show_toast(model: &mut Model, caps: &Capabilities, message: String, kind: ToastKind) {
        let id = model.show_toast(message, kind);
        caps.timer.notify_after(id, TOAST_DURATION, |TimerOutput::Fired { id }| {
            Event::ToastExpired { toast_id: id }
        });
    }

    fn release_preview(model: &mut Model, caps: &Capabilities) {
        if let Some(LocalPreview { url: Some(url), .. }) = model.local_preview.take() {
            caps.preview.revoke(url);
        }
    }

    fn discard_staged_image(model: &mut Model, caps: &Capabilities) {
        model.staged_image = None;
        Self::release_preview(model, caps);
    }

    /// Drops everything tied to the current page visit. The session is kept.
    fn reset_page(model: &mut Model, caps: &Capabilities) {
        Self::discard_staged_image(model, caps);
        model.mode = Mode::Viewing;
        model.submission = Submission::Idle;
        model.profile = UserProfile::default();
        model.load_state = LoadState::Idle;
        model.load_error = None;
        model.toast = None;
    }

    fn fetch_profile(model: &mut Model, caps: &Capabilities, user_id: UserId) {
        debug!(%user_id, "fetching profile document");
        model.load_state = LoadState::Loading {
            user_id: user_id.clone(),
        };
        let key = user_id.to_string();
        caps.document_store.get(USERS_COLLECTION, key, move |result| {
            Event::ProfileFetched { user_id, result }
        });
    }

    fn change_session(model: &mut Model, caps: &Capabilities, session: Option<Identity>) {
        let same_user = match (&session, &model.session) {
            (Some(next), Some(current)) => next.id == current.id,
            _ => false,
        };
        if same_user && model.load_state != LoadState::ResolvingIdentity {
            debug!("session refreshed for the same user");
            model.session = session;
            return;
        }

        Self::reset_page(model, caps);
        match session {
            Some(identity) => {
                info!(user_id = %identity.id, "session started");
                let user_id = identity.id.clone();
                model.session = Some(identity);
                Self::fetch_profile(model, caps, user_id);
            }
            None => {
                if model.session.take().is_some() {
                    info!("signed out");
                }
            }
        }
    }

    fn profile_loaded(model: &mut Model, profile: UserProfile) {
        model.profile = profile;
        model.load_state = LoadState::Ready;
        model.load_error = None;
    }

    fn identity_lookup_failed(model: &mut Model, caps: &Capabilities, error: AppError) {
        warn!(code = error.code(), error = %error, "identity lookup failed");
        model.load_state = LoadState::Failed;
        let message = error.user_facing_message();
        model.load_error = Some(error);
        Self::show_toast(model, caps, message, ToastKind::Error);
    }

    /// Seeds from the identity alone so the form stays usable.
    fn profile_load_failed(
        model: &mut Model,
        caps: &Capabilities,
        identity: &Identity,
        error: AppError,
    ) {
        warn!(user_id = %identity.id, code = error.code(), error = %error, "profile load failed");
        model.profile = UserProfile::seed(identity, None);
        model.load_state = LoadState::Failed;
        let message = error.user_facing_message();
        model.load_error = Some(error);
        Self::show_toast(model, caps, message, ToastKind::Error);
    }

    fn start_submission(model: &mut Model, caps: &Capabilities, draft: ProfileDraft) {
        let Some(user_id) = model.user_id().cloned() else {
            let error = AppError::new(
                ErrorKind::NotAuthenticated,
                "profile save requested without a signed-in identity",
            );
            warn!(code = error.code(), "profile save rejected");
            let message = error.user_facing_message();
            model.submission = Submission::Failed(error);
            Self::show_toast(model, caps, message, ToastKind::Error);
            return;
        };

        let upload = model
            .staged_image
            .as_ref()
            .map(|image| (image.content_type.clone(), image.bytes.clone()));
        let pending = PendingSubmission::new(user_id.clone(), draft);
        let submission_id = pending.id;

        info!(%submission_id, %user_id, has_image = upload.is_some(), "profile save started");
        model.toast = None;
        model.submission = Submission::Saving(Box::new(pending));

        match upload {
            Some((content_type, bytes)) => caps.blob_store.upload(
                BlobKey::profile_image(&user_id),
                content_type,
                bytes,
                move |result| Event::ImageUploaded {
                    submission_id,
                    result,
                },
            ),
            None => Self::update_identity(model, caps, submission_id),
        }
    }

    fn update_identity(model: &Model, caps: &Capabilities, submission_id: SubmissionId) {
        let Some(pending) = model.pending_submission(submission_id) else {
            return;
        };
        // A missing photo_url leaves the provider's current photo in place.
        let changes = IdentityChanges {
            display_name: Some(pending.draft.name.clone()),
            photo_url: pending.new_photo_url.clone(),
        };
        debug!(%submission_id, photo_changed = changes.photo_url.is_some(), "updating identity");
        caps.identity_provider.update_profile(
            pending.user_id.clone(),
            changes,
            move |result| Event::IdentityUpdated {
                submission_id,
                result,
            },
        );
    }

    fn update_document(model: &mut Model, caps: &Capabilities, submission_id: SubmissionId) {
        let Some((user_id, fields)) = model.pending_submission(submission_id).map(|pending| {
            let patch = ProfilePatch::from_draft(&pending.draft, pending.new_photo_url.as_deref());
            (pending.user_id.clone(), patch.to_json())
        }) else {
            return;
        };

        match fields {
            Ok(fields_json) => {
                debug!(%submission_id, "updating profile document");
                caps.document_store.update(
                    USERS_COLLECTION,
                    user_id.as_str(),
                    fields_json,
                    move |result| Event::DocumentUpdated {
                        submission_id,
                        result,
                    },
                );
            }
            Err(e) => Self::fail_submission(
                model,
                caps,
                AppError::new(
                    ErrorKind::DocumentUpdateFailure,
                    "profile update could not be encoded",
                )
                .with_internal(e.to_string()),
            ),
        }
    }

    /// Earlier steps are not rolled back; the form keeps its values.
    fn fail_submission(model: &mut Model, caps: &Capabilities, error: AppError) {
        warn!(code = error.code(), error = %error, "profile save failed");
        let message = error.user_facing_message();
        model.submission = Submission::Failed(error);
        Self::show_toast(model, caps, message, ToastKind::Error);
    }

    fn complete_submission(model: &mut Model, caps: &Capabilities, submission_id: SubmissionId) {
        let pending = match std::mem::take(&mut model.submission) {
            Submission::Saving(pending) if pending.id == submission_id => pending,
            other => {
                model.submission = other;
                return;
            }
        };

        let new_photo_url = pending.new_photo_url.as_deref();
        model.profile = pending.draft.commit_onto(&model.profile, new_photo_url);
        if let Some(session) = model.session.as_mut() {
            session.display_name = Some(pending.draft.name.clone());
            if let Some(url) = new_photo_url {
                session.photo_url = Some(url.to_string());
            }
        }

        info!(%submission_id, "profile saved");
        model.mode = Mode::Viewing;
        Self::discard_staged_image(model, caps);
        model.submission = Submission::Succeeded;
        Self::show_toast(model, caps, PROFILE_SAVED_MESSAGE.into(), ToastKind::Success);
    }

    fn is_current_submission(model: &Model, submission_id: SubmissionId) -> bool {
        let current = model.pending_submission(submission_id).is_some();
        if !current {
            debug!(%submission_id, "dropping result for a stale submission");
        }
        current
    }
}

/// Only absolute http(s) URLs are written to the stores.
fn validate_photo_url(raw: &str) -> AppResult<String> {
    let parsed = Url::parse(raw).map_err(|e| {
        AppError::new(ErrorKind::UploadFailure, "blob store returned an invalid photo URL")
            .with_internal(e.to_string())
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(raw.to_string()),
        scheme => Err(AppError::new(
            ErrorKind::UploadFailure,
            format!("photo URL has unsupported scheme {scheme}"),
        )),
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(
            event = event.name(),
            user_initiated = event.is_user_initiated(),
            "update"
        );

        match event {
            Event::Opened => {
                model.load_state = LoadState::ResolvingIdentity;
                caps.identity_provider.current(Event::IdentityResolved);
                caps.render.render();
            }

            Event::IdentityResolved(result) => {
                if model.load_state != LoadState::ResolvingIdentity {
                    debug!("dropping identity superseded by a session change");
                    return;
                }
                match result {
                    Ok(IdentityOutput::Current(identity)) => {
                        Self::change_session(model, caps, identity);
                    }
                    Err(IdentityError::NotSignedIn) => Self::change_session(model, caps, None),
                    Ok(IdentityOutput::Updated) => Self::identity_lookup_failed(
                        model,
                        caps,
                        AppError::new(
                            ErrorKind::LoadFailure,
                            "identity provider answered with an update acknowledgement",
                        ),
                    ),
                    Err(e) => Self::identity_lookup_failed(
                        model,
                        caps,
                        AppError::new(ErrorKind::LoadFailure, e.to_string()),
                    ),
                }
                caps.render.render();
            }

            Event::SessionChanged(session) => {
                Self::change_session(model, caps, session);
                caps.render.render();
            }

            Event::ProfileFetched { user_id, result } => {
                let expected = matches!(
                    &model.load_state,
                    LoadState::Loading { user_id: loading } if *loading == user_id
                );
                let Some(identity) = model
                    .session
                    .clone()
                    .filter(|session| expected && session.id == user_id)
                else {
                    debug!(%user_id, "dropping profile for a user no longer loading");
                    return;
                };

                match result {
                    Ok(DocumentOutput::Found { json }) => match ProfileDocument::from_json(&json) {
                        Ok(document) => {
                            debug!(%user_id, "profile document loaded");
                            let profile = UserProfile::seed(&identity, Some(document));
                            Self::profile_loaded(model, profile);
                        }
                        Err(e) => Self::profile_load_failed(
                            model,
                            caps,
                            &identity,
                            AppError::new(
                                ErrorKind::LoadFailure,
                                "stored profile could not be read",
                            )
                            .with_internal(e.to_string()),
                        ),
                    },
                    Ok(DocumentOutput::NotFound) | Err(DocumentError::Missing { .. }) => {
                        debug!(%user_id, "no profile document, seeding from identity");
                        Self::profile_loaded(model, UserProfile::seed(&identity, None));
                    }
                    Ok(DocumentOutput::Updated) => Self::profile_load_failed(
                        model,
                        caps,
                        &identity,
                        AppError::new(
                            ErrorKind::LoadFailure,
                            "document store answered a fetch with an update acknowledgement",
                        ),
                    ),
                    Err(e) => Self::profile_load_failed(
                        model,
                        caps,
                        &identity,
                        AppError::new(ErrorKind::LoadFailure, e.to_string()),
                    ),
                }
                caps.render.render();
            }

            Event::ReloadRequested => {
                // A fetch landing after a save would replace the committed profile.
                if model.is_saving() || model.is_loading() || model.mode.is_editing() {
                    debug!("reload ignored while busy");
                    return;
                }
                let Some(user_id) = model.user_id().cloned() else {
                    debug!("reload ignored without a session");
                    return;
                };
                Self::fetch_profile(model, caps, user_id);
                caps.render.render();
            }

            Event::Closed => {
                Self::reset_page(model, caps);
                caps.render.render();
            }

            Event::EditRequested => {
                if model.mode.is_editing() || model.is_saving() || model.is_loading() {
                    debug!("edit request ignored");
                    return;
                }
                model.mode = Mode::Editing(ProfileDraft::from_profile(&model.profile));
                model.submission = Submission::Idle;
                caps.render.render();
            }

            Event::FieldChanged(update) => {
                if model.is_saving() {
                    debug!(field = update.field_name(), "field edit ignored while saving");
                    return;
                }
                let Some(draft) = model.mode.draft_mut() else {
                    debug!(field = update.field_name(), "field edit ignored outside edit mode");
                    return;
                };
                draft.apply(update);
                caps.render.render();
            }

            Event::ImageSelected(local) => {
                if model.is_saving() || !model.mode.is_editing() {
                    debug!(?local, "image selection ignored");
                    return;
                }

                match StagedImage::from_local(local) {
                    Ok(staged) => {
                        debug!(
                            staged_id = %staged.id,
                            content_type = %staged.content_type,
                            bytes_len = staged.bytes.len(),
                            "image staged"
                        );
                        Self::release_preview(model, caps);
                        let staged_id = staged.id;
                        caps.preview.create(
                            staged_id,
                            staged.content_type.clone(),
                            staged.bytes.clone(),
                            move |result| Event::PreviewCreated { staged_id, result },
                        );
                        model.local_preview = Some(LocalPreview {
                            staged_id,
                            url: None,
                        });
                        model.staged_image = Some(staged);
                    }
                    Err(error) => {
                        warn!(code = error.code(), error = %error, "image rejected");
                        let message = error.user_facing_message();
                        Self::show_toast(model, caps, message, ToastKind::Error);
                    }
                }
                caps.render.render();
            }

            Event::PreviewCreated { staged_id, result } => {
                match result {
                    Ok(PreviewOutput::Created { url }) => match model.local_preview.as_mut() {
                        Some(preview) if preview.staged_id == staged_id => {
                            if let Some(previous) = preview.url.replace(url) {
                                caps.preview.revoke(previous);
                            }
                        }
                        _ => {
                            debug!(%staged_id, "revoking preview of a discarded image");
                            caps.preview.revoke(url);
                            return;
                        }
                    },
                    Err(e) => {
                        warn!(%staged_id, error = %e, "preview unavailable");
                        return;
                    }
                }
                caps.render.render();
            }

            Event::EditCancelled => {
                if model.is_saving() || !model.mode.is_editing() {
                    debug!("cancel ignored");
                    return;
                }
                model.mode = Mode::Viewing;
                model.submission = Submission::Idle;
                Self::discard_staged_image(model, caps);
                caps.render.render();
            }

            Event::SubmitRequested => {
                if model.is_saving() {
                    debug!("submit ignored while a save is in flight");
                    return;
                }
                if model.is_loading() {
                    debug!("submit ignored while the profile is loading");
                    return;
                }
                let Some(draft) = model.mode.draft().cloned() else {
                    debug!("submit ignored outside edit mode");
                    return;
                };
                Self::start_submission(model, caps, draft);
                caps.render.render();
            }

            Event::ImageUploaded {
                submission_id,
                result,
            } => {
                if !Self::is_current_submission(model, submission_id) {
                    return;
                }
                match result {
                    Ok(BlobOutput::Uploaded { handle }) => {
                        debug!(%submission_id, "image uploaded");
                        caps.blob_store.public_url(handle, move |result| {
                            Event::PhotoUrlResolved {
                                submission_id,
                                result,
                            }
                        });
                    }
                    Ok(BlobOutput::Url(_)) => Self::fail_submission(
                        model,
                        caps,
                        AppError::new(
                            ErrorKind::UploadFailure,
                            "blob store answered an upload with a URL",
                        ),
                    ),
                    Err(e) => Self::fail_submission(model, caps, e.into()),
                }
                caps.render.render();
            }

            Event::PhotoUrlResolved {
                submission_id,
                result,
            } => {
                if !Self::is_current_submission(model, submission_id) {
                    return;
                }
                let url = match result {
                    Ok(BlobOutput::Url(raw)) => validate_photo_url(&raw),
                    Ok(BlobOutput::Uploaded { .. }) => Err(AppError::new(
                        ErrorKind::UploadFailure,
                        "blob store answered a URL request with an upload handle",
                    )),
                    Err(e) => Err(e.into()),
                };
                match url {
                    Ok(url) => {
                        if let Some(pending) = model.pending_submission_mut(submission_id) {
                            pending.new_photo_url = Some(url);
                        }
                        Self::update_identity(model, caps, submission_id);
                    }
                    Err(error) => Self::fail_submission(model, caps, error),
                }
                caps.render.render();
            }

            Event::IdentityUpdated {
                submission_id,
                result,
            } => {
                if !Self::is_current_submission(model, submission_id) {
                    return;
                }
                match result {
                    Ok(IdentityOutput::Updated) => {
                        Self::update_document(model, caps, submission_id);
                    }
                    Ok(IdentityOutput::Current(_)) => Self::fail_submission(
                        model,
                        caps,
                        AppError::new(
                            ErrorKind::IdentityUpdateFailure,
                            "identity provider answered an update with a lookup",
                        ),
                    ),
                    Err(e) => Self::fail_submission(model, caps, e.into()),
                }
                caps.render.render();
            }

            Event::DocumentUpdated {
                submission_id,
                result,
            } => {
                if !Self::is_current_submission(model, submission_id) {
                    return;
                }
                match result {
                    Ok(DocumentOutput::Updated) => {
                        Self::complete_submission(model, caps, submission_id);
                    }
                    Ok(other) => Self::fail_submission(
                        model,
                        caps,
                        AppError::new(
                            ErrorKind::DocumentUpdateFailure,
                            format!("unexpected document store response: {other:?}"),
                        ),
                    ),
                    Err(e) => Self::fail_submission(model, caps, e.into()),
                }
                caps.render.render();
            }

            Event::ToastExpired { toast_id } => {
                if model.expire_toast(toast_id) {
                    caps.render.render();
                }
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        build_view(model)
    }
}
