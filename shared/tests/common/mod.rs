#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};

use crux_core::{testing::AppTester, Request};
use serde_json::{Map, Value};
use shared::capabilities::{
    BlobError, BlobHandle, BlobOperation, BlobOutput, BlobResult, DocumentError,
    DocumentOperation, DocumentOutput, DocumentResult, IdentityChanges, IdentityError,
    IdentityOperation, IdentityOutput, IdentityResult, PreviewOperation, PreviewOutput,
    TimerOperation, TimerOutput,
};
use shared::model::{Identity, LocalImage, UserId};
use shared::{App, Effect, Event, Model, ViewModel};

/// A PNG signature; enough for format sniffing.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

pub fn farmer(id: &str, email: &str) -> Identity {
    Identity {
        id: UserId::new(id),
        email: email.into(),
        display_name: None,
        photo_url: None,
    }
}

pub fn png(file_name: &str) -> LocalImage {
    LocalImage {
        file_name: file_name.into(),
        bytes: PNG_BYTES.to_vec(),
    }
}

#[derive(Default)]
pub struct Failures {
    pub fetch: Option<DocumentError>,
    pub upload: Option<BlobError>,
    pub identity_update: Option<IdentityError>,
    pub document_update: Option<DocumentError>,
}

/// In-memory stand-in for the shell and the three remote services.
#[derive(Default)]
pub struct Backend {
    pub signed_in: Option<Identity>,
    /// Keyed by `collection/key`.
    pub documents: HashMap<String, Map<String, Value>>,
    pub blobs: HashMap<String, Vec<u8>>,
    pub identity_updates: Vec<IdentityChanges>,
    pub document_writes: Vec<Value>,
    pub live_previews: HashSet<String>,
    pub revoked_previews: Vec<String>,
    pub failures: Failures,
    url_counter: u32,
    preview_counter: u32,
}

impl Backend {
    pub fn with_user(identity: Identity) -> Self {
        Self {
            signed_in: Some(identity),
            ..Self::default()
        }
    }

    pub fn put_document(&mut self, user_id: &str, document: Value) {
        let Value::Object(fields) = document else {
            panic!("documents are JSON objects");
        };
        self.documents.insert(format!("users/{user_id}"), fields);
    }

    pub fn document(&self, user_id: &str) -> Option<&Map<String, Value>> {
        self.documents.get(&format!("users/{user_id}"))
    }

    pub fn document_photo(&self, user_id: &str) -> Option<&str> {
        self.document(user_id)
            .and_then(|doc| doc.get("photoURL"))
            .and_then(Value::as_str)
    }

    pub fn identity_photo(&self) -> Option<&str> {
        self.signed_in
            .as_ref()
            .and_then(|identity| identity.photo_url.as_deref())
    }

    fn identity(&mut self, operation: &IdentityOperation) -> IdentityResult {
        match operation {
            IdentityOperation::CurrentIdentity => {
                Ok(IdentityOutput::Current(self.signed_in.clone()))
            }
            IdentityOperation::UpdateProfile { user_id, changes } => {
                if let Some(error) = self.failures.identity_update.clone() {
                    return Err(error);
                }
                self.identity_updates.push(changes.clone());
                let identity = self
                    .signed_in
                    .as_mut()
                    .filter(|identity| &identity.id == user_id)
                    .ok_or(IdentityError::NotSignedIn)?;
                if let Some(name) = &changes.display_name {
                    identity.display_name = Some(name.clone());
                }
                if let Some(url) = &changes.photo_url {
                    identity.photo_url = Some(url.clone());
                }
                Ok(IdentityOutput::Updated)
            }
        }
    }

    fn document_op(&mut self, operation: &DocumentOperation) -> DocumentResult {
        match operation {
            DocumentOperation::Get { collection, key } => {
                if let Some(error) = self.failures.fetch.clone() {
                    return Err(error);
                }
                Ok(match self.documents.get(&format!("{collection}/{key}")) {
                    Some(fields) => DocumentOutput::Found {
                        json: Value::Object(fields.clone()).to_string(),
                    },
                    None => DocumentOutput::NotFound,
                })
            }
            DocumentOperation::Update {
                collection,
                key,
                fields_json,
            } => {
                if let Some(error) = self.failures.document_update.clone() {
                    return Err(error);
                }
                let fields: Map<String, Value> =
                    serde_json::from_str(fields_json).expect("update is a JSON object");
                self.document_writes.push(Value::Object(fields.clone()));
                self.documents
                    .entry(format!("{collection}/{key}"))
                    .or_default()
                    .extend(fields);
                Ok(DocumentOutput::Updated)
            }
        }
    }

    fn blob(&mut self, operation: &BlobOperation) -> BlobResult {
        match operation {
            BlobOperation::Upload { key, bytes, .. } => {
                if let Some(error) = self.failures.upload.clone() {
                    return Err(error);
                }
                self.blobs.insert(key.to_string(), bytes.clone());
                Ok(BlobOutput::Uploaded {
                    handle: BlobHandle(key.to_string()),
                })
            }
            BlobOperation::PublicUrl { handle } => {
                if !self.blobs.contains_key(&handle.0) {
                    return Err(BlobError::NotFound {
                        handle: handle.clone(),
                    });
                }
                self.url_counter += 1;
                Ok(BlobOutput::Url(format!(
                    "https://storage.example.com/{}?token={}",
                    handle.0, self.url_counter
                )))
            }
        }
    }

    fn create_preview(&mut self) -> String {
        self.preview_counter += 1;
        let url = format!("blob:preview/{}", self.preview_counter);
        self.live_previews.insert(url.clone());
        url
    }

    fn revoke_preview(&mut self, url: &str) {
        assert!(self.live_previews.remove(url), "revoked unknown preview {url}");
        self.revoked_previews.push(url.to_string());
    }
}

pub struct Harness {
    pub app: AppTester<App, Effect>,
    pub model: Model,
    pub backend: Backend,
    timers: Vec<Request<TimerOperation>>,
}

impl Harness {
    pub fn new(backend: Backend) -> Self {
        Self {
            app: AppTester::default(),
            model: Model::default(),
            backend,
            timers: Vec::new(),
        }
    }

    /// Opens the page and lets every request settle.
    pub fn opened(backend: Backend) -> Self {
        let mut harness = Self::new(backend);
        harness.send(Event::Opened);
        harness
    }

    pub fn send(&mut self, event: Event) {
        let update = self.app.update(event, &mut self.model);
        self.run_effects(update.effects);
    }

    /// Resolves `effects` against the backend and feeds results back until
    /// the app is idle. Timers are held until [`Harness::fire_timers`].
    pub fn run_effects(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            for event in self.resolve(effect) {
                let update = self.app.update(event, &mut self.model);
                queue.extend(update.effects);
            }
        }
    }

    fn resolve(&mut self, effect: Effect) -> Vec<Event> {
        match effect {
            Effect::Render(_) => vec![],
            Effect::IdentityProvider(mut request) => {
                let output = self.backend.identity(&request.operation);
                self.app
                    .resolve(&mut request, output)
                    .expect("identity request resolves")
                    .events
            }
            Effect::DocumentStore(mut request) => {
                let output = self.backend.document_op(&request.operation);
                self.app
                    .resolve(&mut request, output)
                    .expect("document request resolves")
                    .events
            }
            Effect::BlobStore(mut request) => {
                let output = self.backend.blob(&request.operation);
                self.app
                    .resolve(&mut request, output)
                    .expect("blob request resolves")
                    .events
            }
            Effect::Preview(mut request) => {
                let revoked = match &request.operation {
                    PreviewOperation::Revoke { url } => Some(url.clone()),
                    PreviewOperation::Create { .. } => None,
                };
                if let Some(url) = revoked {
                    self.backend.revoke_preview(&url);
                    return vec![];
                }
                let url = self.backend.create_preview();
                self.app
                    .resolve(&mut request, Ok(PreviewOutput::Created { url }))
                    .expect("preview request resolves")
                    .events
            }
            Effect::Timer(request) => {
                self.timers.push(request);
                vec![]
            }
        }
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn fire_timers(&mut self) {
        for mut request in std::mem::take(&mut self.timers) {
            let TimerOperation::Start { id, .. } = request.operation;
            let update = self
                .app
                .resolve(&mut request, TimerOutput::Fired { id })
                .expect("timer resolves");
            for event in update.events {
                self.send(event);
            }
        }
    }

    pub fn view(&self) -> ViewModel {
        self.app.view(&self.model)
    }
}
