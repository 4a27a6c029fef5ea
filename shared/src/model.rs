use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::event::FieldUpdate;
use crate::farm::{format_crop_list, parse_crop_list, SoilType};
use crate::{AppError, ErrorKind, MAX_PROFILE_IMAGE_BYTES};

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

macro_rules! generated_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub Uuid);

        impl $name {
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

typed_id!(UserId);
generated_id!(SubmissionId);
generated_id!(StagedImageId);

/// The signed-in user as reported by the identity provider.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct FarmDetails {
    pub farm_size: String,
    pub soil_type: Option<SoilType>,
    pub preferred_crops: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    /// Always the identity provider's value; never edited here.
    pub email: String,
    pub phone: String,
    pub location: String,
    pub photo_url: Option<String>,
    pub farm_details: FarmDetails,
}

/// Uncommitted form values. Lives only while editing so that cancelling
/// leaves the committed profile untouched.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileDraft {
    pub name: String,
    pub phone: String,
    pub location: String,
    pub farm_size: String,
    pub soil_type: Option<SoilType>,
    /// Raw comma-separated text as typed.
    pub crops_input: String,
}

impl ProfileDraft {
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            name: profile.name.clone(),
            phone: profile.phone.clone(),
            location: profile.location.clone(),
            farm_size: profile.farm_details.farm_size.clone(),
            soil_type: profile.farm_details.soil_type,
            crops_input: format_crop_list(&profile.farm_details.preferred_crops),
        }
    }

    pub fn apply(&mut self, update: FieldUpdate) {
        match update {
            FieldUpdate::Name(value) => self.name = value,
            FieldUpdate::Phone(value) => self.phone = value,
            FieldUpdate::Location(value) => self.location = value,
            FieldUpdate::FarmSize(value) => self.farm_size = value,
            FieldUpdate::SoilType(value) => self.soil_type = value,
            FieldUpdate::PreferredCrops(value) => self.crops_input = value,
        }
    }

    #[must_use]
    pub fn preferred_crops(&self) -> Vec<String> {
        parse_crop_list(&self.crops_input)
    }

    #[must_use]
    pub fn farm_details(&self) -> FarmDetails {
        FarmDetails {
            farm_size: self.farm_size.clone(),
            soil_type: self.soil_type,
            preferred_crops: self.preferred_crops(),
        }
    }

    /// The profile as it reads once this draft has been saved.
    ///
    /// `email` is carried over from `base`, and the photo only changes when a
    /// new one was uploaded.
    #[must_use]
    pub fn commit_onto(&self, base: &UserProfile, new_photo_url: Option<&str>) -> UserProfile {
        UserProfile {
            name: self.name.clone(),
            email: base.email.clone(),
            phone: self.phone.clone(),
            location: self.location.clone(),
            photo_url: new_photo_url
                .map(String::from)
                .or_else(|| base.photo_url.clone()),
            farm_details: self.farm_details(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Viewing,
    Editing(ProfileDraft),
}

impl Mode {
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        matches!(self, Self::Editing(_))
    }

    #[must_use]
    pub fn draft(&self) -> Option<&ProfileDraft> {
        match self {
            Self::Editing(draft) => Some(draft),
            Self::Viewing => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut ProfileDraft> {
        match self {
            Self::Editing(draft) => Some(draft),
            Self::Viewing => None,
        }
    }
}

/// An image file picked by the user, as handed over by the shell.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LocalImage {
    pub file_name: String,
    #[serde(with = "serde_bytes")]
    pub bytes: Vec<u8>,
}

impl fmt::Debug for LocalImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalImage")
            .field("file_name", &self.file_name)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

/// A checked, not yet uploaded profile image held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct StagedImage {
    pub id: StagedImageId,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl StagedImage {
    /// Accepts the file if it is small enough and its bytes are a supported
    /// image format. The content type comes from the bytes, not the name.
    pub fn from_local(local: LocalImage) -> Result<Self, AppError> {
        if local.bytes.len() > MAX_PROFILE_IMAGE_BYTES {
            return Err(AppError::new(
                ErrorKind::ImageTooLarge,
                format!(
                    "Image size {} bytes exceeds maximum {} bytes",
                    local.bytes.len(),
                    MAX_PROFILE_IMAGE_BYTES
                ),
            ));
        }

        let format = image::guess_format(&local.bytes)
            .map_err(|e| AppError::new(ErrorKind::ImageFormatUnsupported, e.to_string()))?;

        let content_type = accepted_mime_type(format).ok_or_else(|| {
            AppError::new(
                ErrorKind::ImageFormatUnsupported,
                format!("{format:?} images are not accepted"),
            )
        })?;

        Ok(Self {
            id: StagedImageId::generate(),
            file_name: local.file_name,
            content_type: content_type.to_string(),
            bytes: local.bytes,
        })
    }
}

fn accepted_mime_type(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Gif => Some("image/gif"),
        _ => None,
    }
}

// Redact the payload; only its size is useful in traces.
impl fmt::Debug for StagedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedImage")
            .field("id", &self.id)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

/// Shell-side preview handle for the staged image. `url` stays `None` until
/// the shell has created it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalPreview {
    pub staged_id: StagedImageId,
    pub url: Option<String>,
}

/// The save in flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingSubmission {
    pub id: SubmissionId,
    pub user_id: UserId,
    /// Snapshot taken when the save started.
    pub draft: ProfileDraft,
    /// Filled in once the upload has produced a public URL.
    pub new_photo_url: Option<String>,
}

impl PendingSubmission {
    #[must_use]
    pub fn new(user_id: UserId, draft: ProfileDraft) -> Self {
        Self {
            id: SubmissionId::generate(),
            user_id,
            draft,
            new_photo_url: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Submission {
    #[default]
    Idle,
    Saving(Box<PendingSubmission>),
    Succeeded,
    Failed(AppError),
}

impl Submission {
    #[must_use]
    pub const fn is_saving(&self) -> bool {
        matches!(self, Self::Saving(_))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
    /// Nobody signed in, or the page was never opened.
    #[default]
    Idle,
    /// Waiting for the identity provider to say who is signed in.
    ResolvingIdentity,
    Loading {
        user_id: UserId,
    },
    Ready,
    /// The form is still usable; `Model::load_error` says why.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastMessage {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
}

#[derive(Debug, Default)]
pub struct Model {
    pub session: Option<Identity>,
    pub load_state: LoadState,
    pub load_error: Option<AppError>,

    /// Last committed profile: seeded from the stores, replaced on save.
    pub profile: UserProfile,
    pub mode: Mode,

    pub staged_image: Option<StagedImage>,
    pub local_preview: Option<LocalPreview>,

    pub submission: Submission,
    pub toast: Option<ToastMessage>,
    next_toast_id: u64,
}

impl Model {
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.session.as_ref().map(|identity| &identity.id)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.submission.is_saving()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(
            self.load_state,
            LoadState::ResolvingIdentity | LoadState::Loading { .. }
        )
    }

    /// What the avatar shows: the local preview of a staged image when there
    /// is one, otherwise the last persisted photo.
    #[must_use]
    pub fn preview_url(&self) -> Option<&str> {
        self.local_preview
            .as_ref()
            .and_then(|preview| preview.url.as_deref())
            .or(self.profile.photo_url.as_deref())
    }

    /// Replaces any visible toast and returns the new toast's id.
    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) -> u64 {
        self.next_toast_id = self.next_toast_id.wrapping_add(1);
        let id = self.next_toast_id;
        self.toast = Some(ToastMessage {
            id,
            message: message.into(),
            kind,
        });
        id
    }

    /// Clears the toast only if it is still the one with `id`.
    pub fn expire_toast(&mut self, id: u64) -> bool {
        if self.toast.as_ref().is_some_and(|toast| toast.id == id) {
            self.toast = None;
            return true;
        }
        false
    }

    #[must_use]
    pub fn pending_submission(&self, id: SubmissionId) -> Option<&PendingSubmission> {
        match &self.submission {
            Submission::Saving(pending) if pending.id == id => Some(pending),
            _ => None,
        }
    }

    pub fn pending_submission_mut(&mut self, id: SubmissionId) -> Option<&mut PendingSubmission> {
        match &mut self.submission {
            Submission::Saving(pending) if pending.id == id => Some(pending),
            _ => None,
        }
    }
}
