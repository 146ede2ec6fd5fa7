//! Session identity and the login/logout flows.
//!
//! Identity is never cached: [`Session::user`] reads the user cookie from the
//! [`CookieStore`] on every call, so it always agrees with whatever the server
//! last set. The only cached state is the user profile resource, which is
//! reloaded on login and cleared on logout or on an authentication failure.

#![allow(missing_docs)]

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smol_str::SmolStr;
use tracing::{debug, info, warn};

use crate::cookie::CookieStore;
use crate::error::NavError;
use crate::navigate::{Navigation, Navigator};
use crate::route::Route;

pub const DEFAULT_USER_COOKIE: &str = "user_id";
pub const DEFAULT_GUEST_USER: &str = "Guest";

/// Login form fields.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub usr: SmolStr,
    pub pwd: SmolStr,
}

impl Credentials {
    #[must_use]
    pub fn new(usr: impl Into<SmolStr>, pwd: impl Into<SmolStr>) -> Self {
        Self {
            usr: usr.into(),
            pwd: pwd.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("usr", &self.usr)
            .field("pwd", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    #[serde(default, alias = "home_page")]
    pub default_route: Option<SmolStr>,
}

/// Current user resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_route: Option<SmolStr>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    #[must_use]
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            full_name: None,
            default_route: None,
            extra: Map::new(),
        }
    }
}

/// Server calls the session drives.
pub trait AuthApi: Send + Sync {
    fn login(&self, credentials: &Credentials) -> Result<LoginResponse, NavError>;
    fn logout(&self) -> Result<(), NavError>;
    fn current_user(&self) -> Result<UserProfile, NavError>;
}

/// Hook run after logout to drop state tied to the previous user.
pub trait Teardown: Send + Sync {
    fn teardown(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(SmolStr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub user_cookie: SmolStr,
    pub guest_user: SmolStr,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            user_cookie: DEFAULT_USER_COOKIE.into(),
            guest_user: DEFAULT_GUEST_USER.into(),
        }
    }
}

pub struct Session {
    cookies: Arc<dyn CookieStore>,
    api: Arc<dyn AuthApi>,
    navigator: Arc<dyn Navigator>,
    options: SessionOptions,
    profile: RwLock<Option<UserProfile>>,
    teardown: Mutex<Vec<Arc<dyn Teardown>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user())
            .field("options", &self.options)
            .finish()
    }
}

impl Session {
    #[must_use]
    pub fn new(
        cookies: Arc<dyn CookieStore>,
        api: Arc<dyn AuthApi>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::with_options(cookies, api, navigator, SessionOptions::default())
    }

    #[must_use]
    pub fn with_options(
        cookies: Arc<dyn CookieStore>,
        api: Arc<dyn AuthApi>,
        navigator: Arc<dyn Navigator>,
        options: SessionOptions,
    ) -> Self {
        Self {
            cookies,
            api,
            navigator,
            options,
            profile: RwLock::new(None),
            teardown: Mutex::new(Vec::new()),
        }
    }

    /// User named by the identity cookie; the guest sentinel and an empty or
    /// absent cookie read as `None`.
    #[must_use]
    pub fn user(&self) -> Option<SmolStr> {
        let value = self.cookies.get(&self.options.user_cookie)?;
        let value = value.trim();
        if value.is_empty() || value == self.options.guest_user {
            return None;
        }
        Some(value.into())
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.user().is_some()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        match self.user() {
            Some(user) => SessionState::Authenticated(user),
            None => SessionState::Anonymous,
        }
    }

    #[must_use]
    pub fn profile(&self) -> Option<UserProfile> {
        self.profile.read().clone()
    }

    /// Register a hook run after every successful logout.
    pub fn on_teardown(&self, hook: Arc<dyn Teardown>) {
        self.teardown.lock().push(hook);
    }

    /// Fetch the current user into the profile resource.
    ///
    /// An authentication failure clears the profile and replaces the current
    /// navigation with the login view before the error is returned.
    pub fn load_profile(&self) -> Result<UserProfile, NavError> {
        match self.api.current_user() {
            Ok(profile) => {
                debug!("loaded profile for {}", profile.name);
                *self.profile.write() = Some(profile.clone());
                Ok(profile)
            }
            Err(err) if err.is_authentication() => {
                warn!("user profile fetch rejected, redirecting to login: {err}");
                *self.profile.write() = None;
                self.navigator.replace(Route::login().into());
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Log in, reload the profile and go to the server's default route.
    ///
    /// The redirect does not depend on the profile reload: a profile that
    /// fails to load for any reason other than authentication is logged and
    /// left empty, and the login still counts as successful. The profile's
    /// own default route is only a fallback.
    pub fn login(&self, credentials: &Credentials) -> Result<(), NavError> {
        let response = self.api.login(credentials)?;
        info!("logged in as {}", credentials.usr);
        let profile = match self.load_profile() {
            Ok(profile) => Some(profile),
            Err(err) if err.is_authentication() => return Err(err),
            Err(err) => {
                warn!("profile reload after login failed: {err}");
                None
            }
        };
        let target = response
            .default_route
            .or_else(|| profile.and_then(|profile| profile.default_route))
            .unwrap_or_else(|| SmolStr::new("/"));
        self.navigator.navigate(Navigation::Path(target));
        Ok(())
    }

    /// Log out, clear the profile, go to the login view and run teardown hooks.
    ///
    /// When the server call fails nothing local changes.
    pub fn logout(&self) -> Result<(), NavError> {
        self.api.logout()?;
        info!("logged out");
        *self.profile.write() = None;
        self.navigator.replace(Route::login().into());
        let hooks = self.teardown.lock().clone();
        for hook in hooks {
            hook.teardown();
        }
        Ok(())
    }
}
