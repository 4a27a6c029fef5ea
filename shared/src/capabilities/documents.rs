use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Operations against the per-user document store.
///
/// Document bodies travel as JSON text so the shell never needs to know the
/// core's document schema. `Update` carries a JSON object whose top-level
/// fields are merged into the stored document; fields it does not mention are
/// left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DocumentOperation {
    Get {
        collection: String,
        key: String,
    },
    Update {
        collection: String,
        key: String,
        fields_json: String,
    },
}

impl Operation for DocumentOperation {
    type Output = DocumentResult;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DocumentOutput {
    Found { json: String },
    NotFound,
    Updated,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DocumentError {
    #[error("permission denied for {collection}/{key}")]
    PermissionDenied { collection: String, key: String },

    #[error("document {collection}/{key} does not exist")]
    Missing { collection: String, key: String },

    #[error("document store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("malformed document: {reason}")]
    Malformed { reason: String },
}

pub type DocumentResult = Result<DocumentOutput, DocumentError>;

pub struct DocumentStore<Ev> {
    context: CapabilityContext<DocumentOperation, Ev>,
}

impl<Ev> Capability<Ev> for DocumentStore<Ev> {
    type Operation = DocumentOperation;
    type MappedSelf<MappedEv> = DocumentStore<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        DocumentStore::new(self.context.map_event(f))
    }
}

impl<Ev> DocumentStore<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<DocumentOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn get<F>(&self, collection: impl Into<String>, key: impl Into<String>, make_event: F)
    where
        F: FnOnce(DocumentResult) -> Ev + Send + 'static,
    {
        let operation = DocumentOperation::Get {
            collection: collection.into(),
            key: key.into(),
        };
        self.request(operation, make_event);
    }

    pub fn update<F>(
        &self,
        collection: impl Into<String>,
        key: impl Into<String>,
        fields_json: String,
        make_event: F,
    ) where
        F: FnOnce(DocumentResult) -> Ev + Send + 'static,
    {
        let operation = DocumentOperation::Update {
            collection: collection.into(),
            key: key.into(),
            fields_json,
        };
        self.request(operation, make_event);
    }

    fn request<F>(&self, operation: DocumentOperation, make_event: F)
    where
        F: FnOnce(DocumentResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }
}
