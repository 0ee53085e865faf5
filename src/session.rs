//! Session guard.
//!
//! The session is the persisted record of the logged-in user. It is read
//! once when a [`Session`] is opened and written only by login, profile edit
//! and logout. Nothing validates it against the server.

use crate::api::{MarketplaceApi, Registration};
use crate::error::{Error, Result};
use crate::models::{Id, User, UserType};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How identity is established.
///
/// `TrustedEmail` looks the account up by email alone, with no credential.
/// It is a demo/trusted-network mode and not a security boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    TrustedEmail,
}

impl AuthMode {
    pub fn describe(&self) -> &'static str {
        match self {
            AuthMode::TrustedEmail => "email lookup (no password)",
        }
    }
}

/// JSON file holding the session record
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record. Missing, unreadable or malformed all mean
    /// "logged out".
    pub fn load(&self) -> Option<User> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Could not read session {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<User>(&content) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Ignoring malformed session {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Write the record via a temp file and rename
    pub fn save(&self, user: &User) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(user)?;
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, &self.path)?;

        debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Navigable locations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Register,
    Dashboard,
}

impl Route {
    pub fn parse(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" => Some(Route::Root),
            "/login" => Some(Route::Login),
            "/register" => Some(Route::Register),
            "/dashboard" => Some(Route::Dashboard),
            _ => None,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/dashboard",
        }
    }
}

/// What a route resolves to for the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    LandlordDashboard,
    RenterDashboard,
}

/// The session context handed to every view
#[derive(Debug)]
pub struct Session {
    store: SessionStore,
    user: Option<User>,
    mode: AuthMode,
}

impl Session {
    pub fn open(store: SessionStore) -> Self {
        let user = store.load();
        match &user {
            Some(user) => debug!("Session for {} ({})", user.email, user.user_type),
            None => debug!("No active session"),
        }
        Self {
            store,
            user,
            mode: AuthMode::default(),
        }
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.mode
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The logged-in user, or `Error::NotLoggedIn`
    pub fn require(&self) -> Result<&User> {
        self.user.as_ref().ok_or(Error::NotLoggedIn)
    }

    /// Resolve a route. `/` and `/dashboard` fall back to login without a
    /// session; the dashboard is the landlord view for landlords and the
    /// renter view for everyone else.
    pub fn resolve(&self, route: Route) -> Screen {
        match (route, &self.user) {
            (Route::Login, _) => Screen::Login,
            (Route::Register, _) => Screen::Register,
            (Route::Root | Route::Dashboard, None) => Screen::Login,
            (Route::Root | Route::Dashboard, Some(user)) if user.is_landlord() => {
                Screen::LandlordDashboard
            }
            (Route::Root | Route::Dashboard, Some(_)) => Screen::RenterDashboard,
        }
    }

    pub async fn register<A: MarketplaceApi + ?Sized>(
        api: &A,
        name: &str,
        email: &str,
        user_type: UserType,
    ) -> Result<Id> {
        let registration = Registration {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            user_type,
        };
        api.register(&registration).await
    }

    /// Look the account up by email and persist it as the session
    pub async fn login<A: MarketplaceApi + ?Sized>(&mut self, api: &A, email: &str) -> Result<&User> {
        let email = email.trim();
        if email.is_empty() {
            return Err(Error::Validation("Email is required.".into()));
        }

        let user = api.login(email).await?;
        self.store.save(&user)?;
        info!("Logged in as {} ({})", user.name, user.user_type);

        Ok(self.user.insert(user))
    }

    /// Change name and email on the server, then in the stored record.
    /// A blank field keeps its current value. Returns the server's
    /// acknowledgement.
    pub async fn update_profile<A: MarketplaceApi + ?Sized>(
        &mut self,
        api: &A,
        name: &str,
        email: &str,
    ) -> Result<String> {
        let current = self.require()?;
        let (name, email) = (name.trim(), email.trim());
        if name.is_empty() && email.is_empty() {
            return Err(Error::Validation("Fill in a new name or email.".into()));
        }

        let message = api.edit_profile(&current.id, name, email).await?;

        let mut updated = current.clone();
        if !name.is_empty() {
            updated.name = name.to_string();
        }
        if !email.is_empty() {
            updated.email = email.to_string();
        }
        self.store.save(&updated)?;
        self.user = Some(updated);

        Ok(message)
    }

    /// Drop the record. The caller navigates to the returned route with a
    /// full reload.
    pub fn logout(&mut self) -> Result<Route> {
        self.store.clear()?;
        if let Some(user) = self.user.take() {
            info!("Logged out {}", user.email);
        }
        Ok(Route::Login)
    }
}
