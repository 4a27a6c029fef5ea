use serde::{Deserialize, Serialize};

use crate::capabilities::{BlobResult, DocumentResult, IdentityResult, PreviewResult};
use crate::farm::SoilType;
use crate::model::{Identity, LocalImage, StagedImageId, SubmissionId, UserId};

/// One form field edit. Each variant replaces the whole field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldUpdate {
    Name(String),
    Phone(String),
    Location(String),
    FarmSize(String),
    SoilType(Option<SoilType>),
    /// The raw comma-separated crops text.
    PreferredCrops(String),
}

impl FieldUpdate {
    #[must_use]
    pub const fn field_name(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::Phone(_) => "phone",
            Self::Location(_) => "location",
            Self::FarmSize(_) => "farm_size",
            Self::SoilType(_) => "soil_type",
            Self::PreferredCrops(_) => "preferred_crops",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // --- Sent by the shell ---
    /// The profile page was mounted; ask the identity provider who is signed in.
    Opened,
    /// The signed-in identity changed (`None` after sign-out).
    SessionChanged(Option<Identity>),
    ReloadRequested,
    /// The page went away; release local resources.
    Closed,

    EditRequested,
    FieldChanged(FieldUpdate),
    ImageSelected(LocalImage),
    EditCancelled,
    SubmitRequested,

    // --- Capability responses ---
    #[serde(skip)]
    IdentityResolved(IdentityResult),
    #[serde(skip)]
    ProfileFetched {
        user_id: UserId,
        result: DocumentResult,
    },
    #[serde(skip)]
    PreviewCreated {
        staged_id: StagedImageId,
        result: PreviewResult,
    },
    #[serde(skip)]
    ImageUploaded {
        submission_id: SubmissionId,
        result: BlobResult,
    },
    #[serde(skip)]
    PhotoUrlResolved {
        submission_id: SubmissionId,
        result: BlobResult,
    },
    #[serde(skip)]
    IdentityUpdated {
        submission_id: SubmissionId,
        result: IdentityResult,
    },
    #[serde(skip)]
    DocumentUpdated {
        submission_id: SubmissionId,
        result: DocumentResult,
    },
    #[serde(skip)]
    ToastExpired { toast_id: u64 },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::SessionChanged(_) => "session_changed",
            Self::ReloadRequested => "reload_requested",
            Self::Closed => "closed",
            Self::EditRequested => "edit_requested",
            Self::FieldChanged(_) => "field_changed",
            Self::ImageSelected(_) => "image_selected",
            Self::EditCancelled => "edit_cancelled",
            Self::SubmitRequested => "submit_requested",
            Self::IdentityResolved(_) => "identity_resolved",
            Self::ProfileFetched { .. } => "profile_fetched",
            Self::PreviewCreated { .. } => "preview_created",
            Self::ImageUploaded { .. } => "image_uploaded",
            Self::PhotoUrlResolved { .. } => "photo_url_resolved",
            Self::IdentityUpdated { .. } => "identity_updated",
            Self::DocumentUpdated { .. } => "document_updated",
            Self::ToastExpired { .. } => "toast_expired",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::EditRequested
                | Self::FieldChanged(_)
                | Self::ImageSelected(_)
                | Self::EditCancelled
                | Self::SubmitRequested
                | Self::ReloadRequested
        )
    }
}
