//! The profile document as stored in the `users` collection, and the
//! field-by-field fallback that turns it into a [`UserProfile`].

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::farm::SoilType;
use crate::model::{FarmDetails, Identity, ProfileDraft, UserProfile};

/// Stored document. Every field is optional: older documents, documents
/// written by other clients, or `null` values all fall back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileDocument {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub farm_details: Option<FarmDetailsDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FarmDetailsDocument {
    pub farm_size: Option<String>,
    pub soil_type: Option<String>,
    pub preferred_crops: Option<Vec<String>>,
}

impl ProfileDocument {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl FarmDetailsDocument {
    fn into_details(self) -> FarmDetails {
        let soil_type = match self.soil_type.as_deref().map(SoilType::from_stored) {
            Some(Ok(soil)) => soil,
            Some(Err(e)) => {
                warn!(error = %e, "ignoring stored soil type");
                None
            }
            None => None,
        };

        FarmDetails {
            farm_size: self.farm_size.unwrap_or_default(),
            soil_type,
            preferred_crops: self.preferred_crops.unwrap_or_default(),
        }
    }
}

impl UserProfile {
    /// Builds the profile for `identity` from its stored document, falling
    /// back to identity values field by field.
    ///
    /// `email` always comes from the identity. With no document, the profile
    /// holds only identity fields and empty farm details.
    #[must_use]
    pub fn seed(identity: &Identity, document: Option<ProfileDocument>) -> Self {
        let document = document.unwrap_or_default();

        let name = non_empty(document.name.as_deref())
            .or(identity.display_name.as_deref())
            .unwrap_or_default()
            .to_string();

        let photo_url = non_empty(document.photo_url.as_deref())
            .or(non_empty(identity.photo_url.as_deref()))
            .map(String::from);

        Self {
            name,
            email: identity.email.clone(),
            phone: document.phone.unwrap_or_default(),
            location: document.location.unwrap_or_default(),
            photo_url,
            farm_details: document
                .farm_details
                .map(FarmDetailsDocument::into_details)
                .unwrap_or_default(),
        }
    }
}

/// Partial update written to the profile document on save.
///
/// `email` is never written. `photoURL` is only present when a new image was
/// uploaded, so an existing photo is never cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub name: String,
    pub phone: String,
    pub location: String,
    pub farm_details: FarmDetailsPatch,
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmDetailsPatch {
    pub farm_size: String,
    pub soil_type: String,
    pub preferred_crops: Vec<String>,
}

impl ProfilePatch {
    #[must_use]
    pub fn from_draft(draft: &ProfileDraft, new_photo_url: Option<&str>) -> Self {
        let details = draft.farm_details();
        Self {
            name: draft.name.clone(),
            phone: draft.phone.clone(),
            location: draft.location.clone(),
            farm_details: FarmDetailsPatch {
                farm_size: details.farm_size,
                soil_type: SoilType::to_stored(details.soil_type),
                preferred_crops: details.preferred_crops,
            },
            photo_url: new_photo_url.map(String::from),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
