use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::navigation::{NavigationMode, Navigator, Route};
use super::store::{TokenStore, AUTH_TOKEN_KEY};
use super::token::{Claims, InvalidTokenError, JwtDecoder, TokenDecoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// The current identity. `username` is present exactly when `token` is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    token: Option<String>,
    claims: Option<Claims>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: String, claims: Claims) -> Self {
        Self {
            token: Some(token),
            claims: Some(claims),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.claims.as_ref().map(|c| c.username.as_str())
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn state(&self) -> SessionState {
        if self.is_authenticated() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }
}

/// Single source of truth for who is logged in.
///
/// Share it as `Arc<SessionManager>`. Every change is published through a
/// watch channel before the mutating call returns, so readers never see a
/// stale value after `login` or `logout`.
pub struct SessionManager {
    store: Box<dyn TokenStore>,
    decoder: Box<dyn TokenDecoder>,
    navigator: Arc<dyn Navigator>,
    current: watch::Sender<Session>,
}

impl SessionManager {
    pub fn new(store: impl TokenStore + 'static, navigator: Arc<dyn Navigator>) -> Self {
        let (current, _) = watch::channel(Session::anonymous());
        Self {
            store: Box::new(store),
            decoder: Box::new(JwtDecoder),
            navigator,
            current,
        }
    }

    /// Replace the claim decoder
    pub fn with_decoder(mut self, decoder: impl TokenDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Restore the session from the persisted record.
    ///
    /// A record that cannot be read or decoded is deleted and the session
    /// stays anonymous.
    pub fn initialize(&self) -> SessionState {
        let stored = match self.store.get(AUTH_TOKEN_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable persisted token");
                if let Err(e) = self.store.remove(AUTH_TOKEN_KEY) {
                    warn!(error = %e, "Failed to remove unreadable token");
                }
                None
            }
        };

        let Some(token) = stored else {
            debug!("No persisted token");
            self.publish(Session::anonymous());
            return SessionState::Anonymous;
        };

        match self.decoder.decode(&token) {
            Ok(claims) => {
                debug!(username = %claims.username, "Restored session");
                self.publish(Session::authenticated(token, claims));
                SessionState::Authenticated
            }
            Err(e) => {
                warn!(error = %e, "Discarding corrupt persisted token");
                if let Err(e) = self.store.remove(AUTH_TOKEN_KEY) {
                    warn!(error = %e, "Failed to remove corrupt token");
                }
                self.publish(Session::anonymous());
                SessionState::Anonymous
            }
        }
    }

    /// Accept a token from the Auth API. Returns the decoded username.
    ///
    /// An undecodable token leaves both the session and the persisted record
    /// untouched.
    pub fn login(&self, token: &str) -> Result<String, InvalidTokenError> {
        let claims = self.decoder.decode(token).map_err(|e| {
            warn!(error = %e, "Rejected login token");
            e
        })?;
        let token = token.to_string();
        let username = claims.username.clone();

        if let Err(e) = self.store.set(AUTH_TOKEN_KEY, &token) {
            warn!(error = %e, "Failed to persist token");
        }

        self.publish(Session::authenticated(token, claims));
        info!(username = %username, "Logged in");
        Ok(username)
    }

    /// Forget the session and hard-navigate to the login view.
    pub fn logout(&self) {
        if let Err(e) = self.store.remove(AUTH_TOKEN_KEY) {
            warn!(error = %e, "Failed to remove persisted token");
        }

        let previous = self.current.send_replace(Session::anonymous());
        if let Some(name) = previous.username() {
            info!(username = %name, "Logged out");
        }

        self.navigator.navigate(Route::Login, NavigationMode::Hard);
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.borrow().is_authenticated()
    }

    pub fn state(&self) -> SessionState {
        self.current.borrow().state()
    }

    pub fn token(&self) -> Option<String> {
        self.current.borrow().token().map(str::to_string)
    }

    pub fn username(&self) -> Option<String> {
        self.current.borrow().username().map(str::to_string)
    }

    pub fn snapshot(&self) -> Session {
        self.current.borrow().clone()
    }

    /// Watch the session. The receiver's value is updated synchronously.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.current.subscribe()
    }

    fn publish(&self, session: Session) {
        self.current.send_replace(session);
    }
}
