use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{NavigationMode, Route};
use crate::models::Image;
use crate::validation::normalize_prompt;

use super::{ViewContext, ViewError};

/// The main page: prompt box plus image gallery.
pub struct GalleryView {
    ctx: ViewContext,
    images: Vec<Image>,
}

impl GalleryView {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            images: Vec::new(),
        }
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn find(&self, image_id: &str) -> Option<&Image> {
        self.images.iter().find(|i| i.id == image_id)
    }

    /// Enter the page. Anonymous users are sent to the login view and
    /// `Ok(false)` is returned.
    pub async fn open(&mut self) -> Result<bool, ViewError> {
        if !self.ctx.session.is_authenticated() {
            debug!("Gallery opened without a session");
            self.ctx.navigator.navigate(Route::Login, NavigationMode::Soft);
            return Ok(false);
        }
        self.refresh().await?;
        Ok(true)
    }

    /// Reload the gallery from the API
    pub async fn refresh(&mut self) -> Result<&[Image], ViewError> {
        let api = self.api()?;
        self.images = api.list_images().await.map_err(|e| self.api_failure(e))?;
        debug!(count = self.images.len(), "Gallery loaded");
        Ok(&self.images)
    }

    /// Generate an image for an animal name, save it, and reload the gallery.
    pub async fn generate(&mut self, prompt: &str) -> Result<Image, ViewError> {
        let animal = normalize_prompt(prompt).map_err(|e| self.ctx.fail(e))?;
        let api = self.api()?;

        let generated = api.generate_image(&animal).await.map_err(|e| self.api_failure(e))?;
        let saved = api
            .save_image(&generated, prompt.trim())
            .await
            .map_err(|e| self.api_failure(e))?;
        info!(id = %saved.id, prompt = %saved.prompt, "Image generated");

        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Failed to reload gallery after generate");
        }
        Ok(saved)
    }

    /// Like an image. Returns the new like count.
    pub async fn like(&mut self, image_id: &str) -> Result<i64, ViewError> {
        let api = self.api()?;
        let likes = api.like_image(image_id).await.map_err(|e| self.api_failure(e))?;
        if let Some(image) = self.images.iter_mut().find(|i| i.id == image_id) {
            image.likes = likes;
        }
        Ok(likes)
    }

    pub async fn delete(&mut self, image_id: &str) -> Result<(), ViewError> {
        let api = self.api()?;
        api.delete_image(image_id).await.map_err(|e| self.api_failure(e))?;
        info!(id = %image_id, "Image deleted");
        self.refresh().await?;
        Ok(())
    }

    /// Save an image from the gallery into `dir`. Returns the written path.
    pub async fn download(&self, image_id: &str, dir: &Path) -> Result<PathBuf, ViewError> {
        let image = self
            .find(image_id)
            .ok_or_else(|| self.ctx.fail(ViewError::UnknownImage(image_id.to_string())))?;

        let bytes = self
            .ctx
            .api
            .fetch_bytes(&image.url)
            .await
            .map_err(|e| self.ctx.fail(e))?;

        let path = dir.join(image.file_name());
        tokio::fs::write(&path, &bytes).await.map_err(|e| self.ctx.fail(e))?;
        info!(path = %path.display(), bytes = bytes.len(), "Image downloaded");
        Ok(path)
    }

    pub fn logout(&mut self) {
        self.images.clear();
        self.ctx.session.logout();
    }

    fn api(&self) -> Result<ApiClient, ViewError> {
        if !self.ctx.session.is_authenticated() {
            return Err(self.ctx.fail(ViewError::NotAuthenticated));
        }
        Ok(self.ctx.authorized_api())
    }

    /// A rejected token means the session is over; anything else is reported.
    fn api_failure(&self, error: ApiError) -> ViewError {
        if error.is_unauthorized() {
            warn!(error = %error, "Token rejected, ending session");
            self.ctx.notifier.error("Your session has expired. Please log in again.");
            self.ctx.session.logout();
            return ViewError::Api(error);
        }
        self.ctx.fail(error)
    }
}
