//! Route changes requested by the session manager and views.

use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Signup,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    /// In-app route change; view state survives.
    Soft,
    /// Discard all client state, then load the route.
    Hard,
}

/// Receives navigation requests. Implemented by whatever hosts the views.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route, mode: NavigationMode);
}

/// Records every navigation request in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<(Route, NavigationMode)>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<(Route, NavigationMode)> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<(Route, NavigationMode)> {
        self.lock().last().copied()
    }

    /// Number of hard navigations to `route`
    pub fn hard_count(&self, route: Route) -> usize {
        self.lock()
            .iter()
            .filter(|(r, mode)| *r == route && *mode == NavigationMode::Hard)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Route, NavigationMode)>> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route, mode: NavigationMode) {
        self.lock().push((route, mode));
    }
}
