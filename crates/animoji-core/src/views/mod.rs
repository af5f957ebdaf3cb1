//! Headless controllers for the login, signup and gallery screens.
//!
//! Each view reads the shared `SessionManager`, talks to the API through
//! `ApiClient`, reports outcomes through a `Notifier` and asks the
//! `Navigator` for route changes. A front end renders whatever it likes on
//! top of them.

use std::sync::Arc;

use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::auth::{InvalidTokenError, Navigator, SessionManager};
use crate::validation::ValidationError;

pub mod gallery;
pub mod google;
pub mod login;
pub mod notify;
pub mod signup;

pub use gallery::GalleryView;
pub use google::GoogleLoginView;
pub use login::LoginView;
pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier};
pub use signup::SignupView;

#[derive(Error, Debug)]
pub enum ViewError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Received an invalid token: {0}")]
    InvalidToken(#[from] InvalidTokenError),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Unknown image: {0}")]
    UnknownImage(String),

    #[error("Failed to save image: {0}")]
    Io(#[from] std::io::Error),
}

impl ViewError {
    /// Message shown in the error notice
    pub fn user_message(&self) -> String {
        match self {
            ViewError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Collaborators shared by every view.
#[derive(Clone)]
pub struct ViewContext {
    pub session: Arc<SessionManager>,
    pub api: ApiClient,
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
}

impl ViewContext {
    pub fn new(
        session: Arc<SessionManager>,
        api: ApiClient,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            api,
            navigator,
            notifier,
        }
    }

    /// API client carrying the current session token
    pub fn authorized_api(&self) -> ApiClient {
        self.api.with_token(self.session.token())
    }

    /// Report a failure as an error notice and hand it back
    pub(crate) fn fail(&self, error: impl Into<ViewError>) -> ViewError {
        let error = error.into();
        self.notifier.error(&error.user_message());
        error
    }
}
