mod blobs;
mod documents;
mod identity;
mod preview;
mod timer;

pub use self::blobs::{
    BlobError, BlobHandle, BlobKey, BlobOperation, BlobOutput, BlobResult, BlobStore,
};
pub use self::documents::{
    DocumentError, DocumentOperation, DocumentOutput, DocumentResult, DocumentStore,
};
pub use self::identity::{
    IdentityChanges, IdentityError, IdentityOperation, IdentityOutput, IdentityProvider,
    IdentityResult,
};
pub use self::preview::{Preview, PreviewError, PreviewOperation, PreviewOutput, PreviewResult};
pub use self::timer::{Timer, TimerOperation, TimerOutput};

pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

/// Everything the shell must provide to run the profile core.
#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub identity_provider: IdentityProvider<Event>,
    pub document_store: DocumentStore<Event>,
    pub blob_store: BlobStore<Event>,
    pub preview: Preview<Event>,
    pub timer: Timer<Event>,
}
