use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Identity, UserId};

/// Changes pushed to the identity provider's own profile record.
///
/// Absent fields are left untouched by the provider; in particular a missing
/// `photo_url` never clears the existing photo.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum IdentityOperation {
    CurrentIdentity,
    UpdateProfile {
        user_id: UserId,
        changes: IdentityChanges,
    },
}

impl Operation for IdentityOperation {
    type Output = IdentityResult;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum IdentityOutput {
    /// `None` when nobody is signed in.
    Current(Option<Identity>),
    Updated,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum IdentityError {
    #[error("no user is signed in")]
    NotSignedIn,

    #[error("identity provider unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("identity update rejected: {reason}")]
    Rejected { reason: String },
}

pub type IdentityResult = Result<IdentityOutput, IdentityError>;

pub struct IdentityProvider<Ev> {
    context: CapabilityContext<IdentityOperation, Ev>,
}

impl<Ev> Capability<Ev> for IdentityProvider<Ev> {
    type Operation = IdentityOperation;
    type MappedSelf<MappedEv> = IdentityProvider<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        IdentityProvider::new(self.context.map_event(f))
    }
}

impl<Ev> IdentityProvider<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<IdentityOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn current<F>(&self, make_event: F)
    where
        F: FnOnce(IdentityResult) -> Ev + Send + 'static,
    {
        self.request(IdentityOperation::CurrentIdentity, make_event);
    }

    pub fn update_profile<F>(&self, user_id: UserId, changes: IdentityChanges, make_event: F)
    where
        F: FnOnce(IdentityResult) -> Ev + Send + 'static,
    {
        self.request(IdentityOperation::UpdateProfile { user_id, changes }, make_event);
    }

    fn request<F>(&self, operation: IdentityOperation, make_event: F)
    where
        F: FnOnce(IdentityResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }
}
