use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::UserId;
use crate::PROFILE_IMAGE_PREFIX;

/// Storage key for an object in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobKey(String);

impl BlobKey {
    /// One image per user: re-uploading overwrites the previous object.
    #[must_use]
    pub fn profile_image(user_id: &UserId) -> Self {
        Self(format!("{PROFILE_IMAGE_PREFIX}/{user_id}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference returned by the store after an upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobHandle(pub String);

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum BlobOperation {
    Upload {
        key: BlobKey,
        content_type: String,
        #[serde(with = "serde_bytes")]
        bytes: Vec<u8>,
    },
    PublicUrl {
        handle: BlobHandle,
    },
}

// Image bytes are large; print their size only.
impl fmt::Debug for BlobOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload {
                key,
                content_type,
                bytes,
            } => f
                .debug_struct("Upload")
                .field("key", key)
                .field("content_type", content_type)
                .field("bytes_len", &bytes.len())
                .finish(),
            Self::PublicUrl { handle } => {
                f.debug_struct("PublicUrl").field("handle", handle).finish()
            }
        }
    }
}

impl Operation for BlobOperation {
    type Output = BlobResult;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum BlobOutput {
    Uploaded { handle: BlobHandle },
    Url(String),
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum BlobError {
    #[error("upload of {key} was rejected: {reason}")]
    UploadRejected { key: BlobKey, reason: String },

    #[error("quota exceeded")]
    QuotaExceeded,

    #[error("object not found: {handle:?}")]
    NotFound { handle: BlobHandle },

    #[error("blob store unavailable: {reason}")]
    Unavailable { reason: String },
}

pub type BlobResult = Result<BlobOutput, BlobError>;

pub struct BlobStore<Ev> {
    context: CapabilityContext<BlobOperation, Ev>,
}

impl<Ev> Capability<Ev> for BlobStore<Ev> {
    type Operation = BlobOperation;
    type MappedSelf<MappedEv> = BlobStore<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        BlobStore::new(self.context.map_event(f))
    }
}

impl<Ev> BlobStore<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<BlobOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn upload<F>(&self, key: BlobKey, content_type: String, bytes: Vec<u8>, make_event: F)
    where
        F: FnOnce(BlobResult) -> Ev + Send + 'static,
    {
        self.request(
            BlobOperation::Upload {
                key,
                content_type,
                bytes,
            },
            make_event,
        );
    }

    pub fn public_url<F>(&self, handle: BlobHandle, make_event: F)
    where
        F: FnOnce(BlobResult) -> Ev + Send + 'static,
    {
        self.request(BlobOperation::PublicUrl { handle }, make_event);
    }

    fn request<F>(&self, operation: BlobOperation, make_event: F)
    where
        F: FnOnce(BlobResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }
}
