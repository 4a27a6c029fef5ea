use serde::{Deserialize, Serialize};

use crate::farm::{format_crop_list, SoilType, COMMON_CROPS};
use crate::model::{
    LoadState, Mode, Model, ProfileDraft, Submission, ToastKind, ToastMessage, UserProfile,
};
use crate::{MAX_RECOMMENDATION_PREVIEW, NOT_PROVIDED};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    SignedOut,
    Loading,
    Ready,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Idle,
    Saving,
    Succeeded,
    Failed,
}

/// Read-only rendering of the committed profile.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileDetailsView {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub farm_size: String,
    pub soil_type: String,
    pub preferred_crops: String,
}

/// Current values of the edit form inputs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileFormView {
    pub name: String,
    pub phone: String,
    pub location: String,
    pub farm_size: String,
    /// Empty when no soil type is selected.
    pub soil_type: String,
    pub preferred_crops: String,
    pub has_staged_image: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CropRecommendationView {
    pub crop: String,
    pub note: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendationsView {
    pub title: String,
    pub crops: Vec<CropRecommendationView>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastView {
    pub message: String,
    pub kind: ToastKind,
}

impl From<&ToastMessage> for ToastView {
    fn from(t: &ToastMessage) -> Self {
        Self {
            message: t.message.clone(),
            kind: t.kind,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub status: PageStatus,
    pub is_editing: bool,
    pub submission: SubmissionStatus,
    /// Submit is disabled while a save is in flight.
    pub can_submit: bool,
    pub preview_url: Option<String>,
    pub details: ProfileDetailsView,
    pub form: Option<ProfileFormView>,
    pub soil_types: Vec<String>,
    pub common_crops: Vec<String>,
    pub recommendations: Option<RecommendationsView>,
    pub toast: Option<ToastView>,
    pub load_error: Option<String>,
}

fn or_not_provided(value: &str) -> String {
    if value.is_empty() {
        NOT_PROVIDED.to_string()
    } else {
        value.to_string()
    }
}

impl ProfileDetailsView {
    fn from_profile(profile: &UserProfile) -> Self {
        let details = &profile.farm_details;
        Self {
            name: profile.name.clone(),
            email: profile.email.clone(),
            phone: or_not_provided(&profile.phone),
            location: or_not_provided(&profile.location),
            farm_size: or_not_provided(&details.farm_size),
            soil_type: or_not_provided(&SoilType::to_stored(details.soil_type)),
            preferred_crops: or_not_provided(&format_crop_list(&details.preferred_crops)),
        }
    }
}

impl ProfileFormView {
    fn from_draft(draft: &ProfileDraft, has_staged_image: bool) -> Self {
        Self {
            name: draft.name.clone(),
            phone: draft.phone.clone(),
            location: draft.location.clone(),
            farm_size: draft.farm_size.clone(),
            soil_type: SoilType::to_stored(draft.soil_type),
            preferred_crops: draft.crops_input.clone(),
            has_staged_image,
        }
    }
}

impl RecommendationsView {
    /// Placeholder cards for the first few preferred crops, shown once the
    /// profile has both a location and crops.
    fn from_profile(profile: &UserProfile) -> Option<Self> {
        let crops = &profile.farm_details.preferred_crops;
        if profile.location.is_empty() || crops.is_empty() {
            return None;
        }

        Some(Self {
            title: format!("Crop Recommendations for {}", profile.location),
            crops: crops
                .iter()
                .take(MAX_RECOMMENDATION_PREVIEW)
                .map(|crop| CropRecommendationView {
                    crop: crop.clone(),
                    note: "Good season".into(),
                })
                .collect(),
        })
    }
}

#[must_use]
pub fn build_view(model: &Model) -> ViewModel {
    let status = if model.is_loading() {
        PageStatus::Loading
    } else if model.is_authenticated() {
        PageStatus::Ready
    } else {
        PageStatus::SignedOut
    };

    let submission = match model.submission {
        Submission::Idle => SubmissionStatus::Idle,
        Submission::Saving(_) => SubmissionStatus::Saving,
        Submission::Succeeded => SubmissionStatus::Succeeded,
        Submission::Failed(_) => SubmissionStatus::Failed,
    };

    let form = match &model.mode {
        Mode::Editing(draft) => Some(ProfileFormView::from_draft(
            draft,
            model.staged_image.is_some(),
        )),
        Mode::Viewing => None,
    };

    let load_error = match model.load_state {
        LoadState::Failed => model.load_error.as_ref().map(crate::AppError::user_facing_message),
        _ => None,
    };

    ViewModel {
        status,
        is_editing: model.mode.is_editing(),
        submission,
        can_submit: model.mode.is_editing() && !model.is_saving(),
        preview_url: model.preview_url().map(String::from),
        details: ProfileDetailsView::from_profile(&model.profile),
        form,
        soil_types: SoilType::ALL.iter().map(ToString::to_string).collect(),
        common_crops: COMMON_CROPS.iter().map(ToString::to_string).collect(),
        recommendations: RecommendationsView::from_profile(&model.profile),
        toast: model.toast.as_ref().map(ToastView::from),
        load_error,
    }
}
