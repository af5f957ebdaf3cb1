//! Wiring between configuration, the session manager and the views.

use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, warn};

use animoji_core::auth::{
    FileStore, KeychainStore, NavigationMode, Navigator, Route, SessionManager, TokenStore,
};
use animoji_core::config::{Config, TokenBackend, ENV_PASSWORD, ENV_USERNAME};
use animoji_core::utils::{age_display, format_date, truncate_string};
use animoji_core::validation::AVAILABLE_ANIMALS;
use animoji_core::views::{
    GalleryView, GoogleLoginView, LoginView, Notice, NoticeLevel, Notifier, SignupView,
    ViewContext,
};
use animoji_core::ApiClient;

/// Maximum prompt width in the gallery listing
const PROMPT_COLUMN_WIDTH: usize = 24;

/// Prints notices: successes to stdout, errors to stderr.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => println!("✓ {}", notice.message),
            NoticeLevel::Error => eprintln!("✗ {}", notice.message),
        }
    }
}

/// A terminal has no routes; remember the last request so the command can
/// tell the user where to go next.
#[derive(Default)]
struct ConsoleNavigator {
    last: Mutex<Option<(Route, NavigationMode)>>,
}

impl ConsoleNavigator {
    fn take(&self) -> Option<(Route, NavigationMode)> {
        self.last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

impl Navigator for ConsoleNavigator {
    fn navigate(&self, route: Route, mode: NavigationMode) {
        debug!(%route, ?mode, "Navigation requested");
        *self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some((route, mode));
    }
}

pub struct App {
    config: Config,
    session: Arc<SessionManager>,
    navigator: Arc<ConsoleNavigator>,
    ctx: ViewContext,
}

impl App {
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let store: Box<dyn TokenStore> = match config.token_backend {
            TokenBackend::File => Box::new(FileStore::new(config.cache_dir()?)),
            TokenBackend::Keyring => Box::new(KeychainStore::new()),
        };
        debug!(backend = ?config.token_backend, "Token store configured");

        let navigator = Arc::new(ConsoleNavigator::default());
        let session = Arc::new(SessionManager::new(store, navigator.clone()));
        let state = session.initialize();
        debug!(?state, "Session initialized");

        let api = ApiClient::new(&config.api_base_url()).context("Failed to create API client")?;
        debug!(base_url = api.base_url(), "API client configured");

        let ctx = ViewContext::new(
            session.clone(),
            api,
            navigator.clone(),
            Arc::new(ConsoleNotifier),
        );

        Ok(Self {
            config,
            session,
            navigator,
            ctx,
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn login(&mut self, username: Option<String>) -> Result<()> {
        let login = LoginView::new(self.ctx.clone());
        if login.redirect_if_authenticated() {
            self.print_whoami();
            self.follow_navigation();
            return Ok(());
        }

        let username = match username.or_else(|| std::env::var(ENV_USERNAME).ok()) {
            Some(u) => u,
            None => prompt_with_default("Username", self.config.last_username.as_deref())?,
        };
        let password = match std::env::var(ENV_PASSWORD) {
            Ok(p) => p,
            Err(_) => rpassword::prompt_password("Password: ")?,
        };

        println!("Authenticating...");
        let name = login.submit(&username, &password).await?;
        self.remember_username(&name);
        self.follow_navigation();
        Ok(())
    }

    pub async fn signup(&mut self, username: Option<String>) -> Result<()> {
        let signup = SignupView::new(self.ctx.clone());
        if signup.redirect_if_authenticated() {
            println!("Already logged in. Run `animoji logout` first.");
            return Ok(());
        }

        let username = match username {
            Some(u) => u,
            None => prompt_with_default("Username", None)?,
        };
        signup.validate_username(&username)?;
        if !signup.check_username(&username).await? {
            return Ok(());
        }

        let password = rpassword::prompt_password("Password: ")?;
        let confirm = rpassword::prompt_password("Confirm password: ")?;

        let name = signup.submit(&username, &password, &confirm).await?;
        self.remember_username(&name);
        self.follow_navigation();
        Ok(())
    }

    pub async fn google(&mut self, credential: &str) -> Result<()> {
        let google = GoogleLoginView::new(self.ctx.clone());
        let name = google.submit(credential).await?;
        self.remember_username(&name);
        self.follow_navigation();
        Ok(())
    }

    pub async fn check_username(&self, username: &str) -> Result<()> {
        let signup = SignupView::new(self.ctx.clone());
        signup.validate_username(username)?;
        if signup.check_username(username).await? {
            println!("{} is available", username.trim());
        }
        Ok(())
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.follow_navigation();
    }

    pub fn print_whoami(&self) {
        let snapshot = self.session.snapshot();
        match (snapshot.username(), snapshot.claims()) {
            (Some(name), Some(claims)) => {
                let via = if claims.is_google_user == Some(true) {
                    " (Google)"
                } else {
                    ""
                };
                println!("Logged in as {}{}", name, via);
                if let Some(expires) = claims.expires_at() {
                    println!("Token expires {}", format_date(expires));
                }
            }
            _ => println!("Not logged in"),
        }
    }

    // =========================================================================
    // Gallery
    // =========================================================================

    /// Open the gallery, or point at `login` when there is no session
    async fn gallery(&self) -> Result<Option<GalleryView>> {
        let mut gallery = GalleryView::new(self.ctx.clone());
        if gallery.open().await? {
            Ok(Some(gallery))
        } else {
            self.follow_navigation();
            Ok(None)
        }
    }

    pub async fn list_images(&self) -> Result<()> {
        if let Some(gallery) = self.gallery().await? {
            print_images(&gallery);
        }
        Ok(())
    }

    pub async fn generate(&self, prompt: &str) -> Result<()> {
        let Some(mut gallery) = self.gallery().await? else {
            return Ok(());
        };
        println!("Generating...");
        let image = gallery.generate(prompt).await?;
        println!("✓ {} {}", image.id, image.url);
        Ok(())
    }

    pub async fn like(&self, image_id: &str) -> Result<()> {
        let Some(mut gallery) = self.gallery().await? else {
            return Ok(());
        };
        let likes = gallery.like(image_id).await?;
        let display = gallery
            .find(image_id)
            .map(|image| image.likes_display())
            .unwrap_or_else(|| likes.to_string());
        println!("♥ {} now has {}", image_id, display);
        Ok(())
    }

    pub async fn delete(&self, image_id: &str) -> Result<()> {
        let Some(mut gallery) = self.gallery().await? else {
            return Ok(());
        };
        gallery.delete(image_id).await?;
        println!("Deleted {}", image_id);
        Ok(())
    }

    pub async fn download(&self, image_id: &str, dir: &Path) -> Result<()> {
        let Some(gallery) = self.gallery().await? else {
            return Ok(());
        };
        let path = gallery.download(image_id, dir).await?;
        println!("Saved {}", path.display());
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn remember_username(&mut self, username: &str) {
        self.config.last_username = Some(username.to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    /// Tell the user about the route the last action asked for
    fn follow_navigation(&self) {
        match self.navigator.take() {
            Some((Route::Login, NavigationMode::Hard)) => {
                println!("Logged out. Run `animoji login` to sign in again.");
            }
            Some((Route::Login, NavigationMode::Soft)) => {
                println!("Not logged in. Run `animoji login` or `animoji signup`.");
            }
            Some((Route::Home, _)) => {
                println!("Run `animoji images` to browse the gallery.");
            }
            Some((Route::Signup, _)) => {
                println!("Run `animoji signup` to create an account.");
            }
            None => {}
        }
    }
}

pub fn print_animals() {
    println!("{}", AVAILABLE_ANIMALS.join(", "));
}

fn print_images(gallery: &GalleryView) {
    let images = gallery.images();
    if images.is_empty() {
        println!("No images yet. Try `animoji generate fox`.");
        return;
    }
    let now = Utc::now();
    for image in images {
        println!(
            "{:<36}  {:<width$}  {:>9}  {}",
            image.id,
            truncate_string(&image.prompt, PROMPT_COLUMN_WIDTH),
            image.likes_display(),
            age_display(image.created_at, now),
            width = PROMPT_COLUMN_WIDTH,
        );
    }
}

fn prompt_with_default(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => print!("{} [{}]: ", label, d),
        None => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    match (input.is_empty(), default) {
        (true, Some(d)) => Ok(d.to_string()),
        _ => Ok(input.to_string()),
    }
}
