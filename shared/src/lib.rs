// lib.rs - Farm profile core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod document;
pub mod event;
pub mod farm;
pub mod model;
pub mod view;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use crux_core::{render::Render, App as CruxApp};
pub use event::{Event, FieldUpdate};
pub use model::Model;
pub use view::ViewModel;

pub const USERS_COLLECTION: &str = "users";
pub const PROFILE_IMAGE_PREFIX: &str = "profile_images";
pub const TOAST_DURATION: Duration = Duration::from_secs(3);
pub const MAX_PROFILE_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_RECOMMENDATION_PREVIEW: usize = 4;

pub const PROFILE_SAVED_MESSAGE: &str = "Profile updated successfully!";
pub const PROFILE_SAVE_FAILED_MESSAGE: &str = "Failed to update profile. Please try again.";
pub const PROFILE_LOAD_FAILED_MESSAGE: &str = "Failed to load profile data";
pub const NOT_PROVIDED: &str = "Not provided";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotAuthenticated,
    LoadFailure,
    UploadFailure,
    IdentityUpdateFailure,
    DocumentUpdateFailure,
    ImageTooLarge,
    ImageFormatUnsupported,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::LoadFailure => "LOAD_FAILURE",
            Self::UploadFailure => "UPLOAD_FAILURE",
            Self::IdentityUpdateFailure => "IDENTITY_UPDATE_FAILURE",
            Self::DocumentUpdateFailure => "DOCUMENT_UPDATE_FAILURE",
            Self::ImageTooLarge => "IMAGE_TOO_LARGE",
            Self::ImageFormatUnsupported => "IMAGE_FORMAT_UNSUPPORTED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub internal_message: Option<String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// The single message shown in the transient error banner.
    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::NotAuthenticated => {
                "You need to be signed in to update your profile.".into()
            }
            ErrorKind::LoadFailure => PROFILE_LOAD_FAILED_MESSAGE.into(),
            ErrorKind::UploadFailure
            | ErrorKind::IdentityUpdateFailure
            | ErrorKind::DocumentUpdateFailure => PROFILE_SAVE_FAILED_MESSAGE.into(),
            ErrorKind::ImageTooLarge => format!(
                "The image is too large. Please use an image smaller than {} MB.",
                MAX_PROFILE_IMAGE_BYTES / (1024 * 1024)
            ),
            ErrorKind::ImageFormatUnsupported => {
                "This image format is not supported. Please use JPEG, PNG, WebP or GIF.".into()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<capabilities::BlobError> for AppError {
    fn from(e: capabilities::BlobError) -> Self {
        AppError::new(ErrorKind::UploadFailure, e.to_string())
    }
}

impl From<capabilities::IdentityError> for AppError {
    fn from(e: capabilities::IdentityError) -> Self {
        AppError::new(ErrorKind::IdentityUpdateFailure, e.to_string())
    }
}

impl From<capabilities::DocumentError> for AppError {
    fn from(e: capabilities::DocumentError) -> Self {
        AppError::new(ErrorKind::DocumentUpdateFailure, e.to_string())
    }
}
