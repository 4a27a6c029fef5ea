use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::StagedImageId;

/// Local, revocable preview handles (object URLs on the web).
///
/// Every `Created` url must eventually be handed back with `Revoke`, either
/// when the staged image is replaced or when the page goes away.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PreviewOperation {
    Create {
        staged_id: StagedImageId,
        content_type: String,
        #[serde(with = "serde_bytes")]
        bytes: Vec<u8>,
    },
    Revoke {
        url: String,
    },
}

impl fmt::Debug for PreviewOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create {
                staged_id,
                content_type,
                bytes,
            } => f
                .debug_struct("Create")
                .field("staged_id", staged_id)
                .field("content_type", content_type)
                .field("bytes_len", &bytes.len())
                .finish(),
            Self::Revoke { url } => f.debug_struct("Revoke").field("url", url).finish(),
        }
    }
}

impl Operation for PreviewOperation {
    type Output = PreviewResult;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PreviewOutput {
    Created { url: String },
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum PreviewError {
    #[error("preview could not be created: {reason}")]
    CreateFailed { reason: String },
}

pub type PreviewResult = Result<PreviewOutput, PreviewError>;

pub struct Preview<Ev> {
    context: CapabilityContext<PreviewOperation, Ev>,
}

impl<Ev> Capability<Ev> for Preview<Ev> {
    type Operation = PreviewOperation;
    type MappedSelf<MappedEv> = Preview<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Preview::new(self.context.map_event(f))
    }
}

impl<Ev> Preview<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<PreviewOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn create<F>(
        &self,
        staged_id: StagedImageId,
        content_type: String,
        bytes: Vec<u8>,
        make_event: F,
    ) where
        F: FnOnce(PreviewResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context
                .request_from_shell(PreviewOperation::Create {
                    staged_id,
                    content_type,
                    bytes,
                })
                .await;
            context.update_app(make_event(result));
        });
    }

    /// Fire-and-forget: the shell releases the handle, nothing comes back.
    pub fn revoke(&self, url: String) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(PreviewOperation::Revoke { url }).await;
        });
    }
}
