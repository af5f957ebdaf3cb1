use tracing::{error, info};

use crate::api::ApiError;
use crate::auth::{NavigationMode, Route};
use crate::validation::{validate_signup, validate_username, ValidationError};

use super::{ViewContext, ViewError};

/// Account creation form.
pub struct SignupView {
    ctx: ViewContext,
}

impl SignupView {
    pub fn new(ctx: ViewContext) -> Self {
        Self { ctx }
    }

    /// Reject a username the form would never submit, with an error notice.
    pub fn validate_username(&self, username: &str) -> Result<(), ViewError> {
        validate_username(username).map_err(|e| self.ctx.fail(e))
    }

    /// Ask the API whether a username is free. Taken names produce an error
    /// notice.
    pub async fn check_username(&self, username: &str) -> Result<bool, ViewError> {
        let username = username.trim();
        if username.is_empty() {
            return Ok(false);
        }

        let available = self
            .ctx
            .api
            .check_username(username)
            .await
            .map_err(|e| self.ctx.fail(e))?;

        if !available {
            self.ctx.notifier.error(&ValidationError::UsernameTaken.to_string());
        }
        Ok(available)
    }

    pub async fn submit(
        &self,
        username: &str,
        password: &str,
        confirm: &str,
    ) -> Result<String, ViewError> {
        validate_signup(username, password, confirm).map_err(|e| self.ctx.fail(e))?;

        let response = match self.ctx.api.signup(username.trim(), password).await {
            Ok(response) => response,
            Err(ApiError::Conflict(_)) => {
                return Err(self.ctx.fail(ValidationError::UsernameTaken));
            }
            Err(e) => {
                error!(error = %e, "Signup failed");
                return Err(self.ctx.fail(e));
            }
        };

        let name = self.ctx.session.login(&response.token).map_err(|e| self.ctx.fail(e))?;

        self.ctx.notifier.success("Successfully signed up!");
        info!(username = %name, "Account created");
        self.ctx.navigator.navigate(Route::Home, NavigationMode::Soft);
        Ok(name)
    }

    /// Leave the signup screen once a session exists.
    pub fn redirect_if_authenticated(&self) -> bool {
        if self.ctx.session.is_authenticated() {
            self.ctx.navigator.navigate(Route::Home, NavigationMode::Soft);
            true
        } else {
            false
        }
    }
}
