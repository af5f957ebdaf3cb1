use tracing::{error, info};

use crate::auth::{NavigationMode, Route};
use crate::validation::validate_login;

use super::{ViewContext, ViewError};

/// Username/password login form.
pub struct LoginView {
    ctx: ViewContext,
}

impl LoginView {
    pub fn new(ctx: ViewContext) -> Self {
        Self { ctx }
    }

    /// Submit the form. On failure the user stays on the form with an error
    /// notice.
    pub async fn submit(&self, username: &str, password: &str) -> Result<String, ViewError> {
        validate_login(username, password).map_err(|e| self.ctx.fail(e))?;

        let response = self
            .ctx
            .api
            .login(username.trim(), password)
            .await
            .map_err(|e| {
                error!(error = %e, "Login failed");
                self.ctx.fail(e)
            })?;

        let name = self.ctx.session.login(&response.token).map_err(|e| self.ctx.fail(e))?;

        self.ctx.notifier.success("Successfully logged in!");
        info!(username = %name, "Password login complete");
        self.redirect_if_authenticated();
        Ok(name)
    }

    /// Leave the login screen once a session exists.
    pub fn redirect_if_authenticated(&self) -> bool {
        if self.ctx.session.is_authenticated() {
            self.ctx.navigator.navigate(Route::Home, NavigationMode::Soft);
            true
        } else {
            false
        }
    }
}
