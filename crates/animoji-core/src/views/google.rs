use tracing::{error, info};

use crate::auth::{NavigationMode, Route};
use crate::validation::ValidationError;

use super::{ViewContext, ViewError};

/// Google sign-in: exchanges a Google ID token for an API token.
pub struct GoogleLoginView {
    ctx: ViewContext,
}

impl GoogleLoginView {
    pub fn new(ctx: ViewContext) -> Self {
        Self { ctx }
    }

    /// On success the whole client is reloaded on the home route. On failure
    /// there is no redirect.
    pub async fn submit(&self, credential: &str) -> Result<String, ViewError> {
        let credential = credential.trim();
        if credential.is_empty() {
            self.ctx
                .notifier
                .error("Google login failed: No credential received");
            return Err(ValidationError::MissingCredential.into());
        }

        let response = self.ctx.api.google_login(credential).await.map_err(|e| {
            error!(error = %e, "Google login failed");
            self.ctx.fail(e)
        })?;

        let name = self
            .ctx
            .session
            .login(&response.access_token)
            .map_err(|e| self.ctx.fail(e))?;

        self.ctx.notifier.success("Successfully logged in with Google!");
        info!(username = %name, "Google login complete");
        self.ctx.navigator.navigate(Route::Home, NavigationMode::Hard);
        Ok(name)
    }
}
