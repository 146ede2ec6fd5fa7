//! Desk wiring: session, permission store and route table together.

#![allow(missing_docs)]

use std::sync::Arc;

use tracing::{info, warn};

use crate::client::DeskClient;
use crate::config::DeskConfig;
use crate::cookie::CookieJar;
use crate::error::NavError;
use crate::navigate::Navigator;
use crate::permissions::{PermissionStore, SnapshotSource};
use crate::route::{ModuleSidebarLink, RouteTable};
use crate::session::{AuthApi, Credentials, Session};
use crate::sidebar::{resolve_sidebar, SidebarEntry};

/// The navigation layer of one desk client.
///
/// Login and boot refresh the permission index; logout resets it through the
/// session's teardown hooks.
#[derive(Debug)]
pub struct Desk {
    session: Arc<Session>,
    permissions: Arc<PermissionStore>,
    routes: RouteTable,
}

impl Desk {
    #[must_use]
    pub fn new(
        session: Arc<Session>,
        permissions: Arc<PermissionStore>,
        routes: RouteTable,
    ) -> Self {
        session.on_teardown(permissions.clone());
        Self {
            session,
            permissions,
            routes,
        }
    }

    /// Build a desk talking to the server in `config`, sharing `cookies`
    /// between the HTTP client and the session.
    #[must_use]
    pub fn connect(
        config: &DeskConfig,
        cookies: Arc<CookieJar>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let client = Arc::new(DeskClient::with_cookies(config, cookies.clone()));
        let api: Arc<dyn AuthApi> = client.clone();
        let source: Arc<dyn SnapshotSource> = client;
        let session = Session::with_options(cookies, api, navigator, config.session.clone());
        Self::new(
            Arc::new(session),
            Arc::new(PermissionStore::new(source)),
            config.routes.clone(),
        )
    }

    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    #[must_use]
    pub fn permissions(&self) -> &Arc<PermissionStore> {
        &self.permissions
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Startup: when the cookie says we are logged in, load the profile and
    /// the permission snapshot. Returns whether the session is authenticated.
    pub fn boot(&self) -> Result<bool, NavError> {
        if !self.session.is_logged_in() {
            info!("boot: anonymous session");
            return Ok(false);
        }
        self.session.load_profile()?;
        self.permissions.refresh()?;
        Ok(true)
    }

    pub fn login(&self, credentials: &Credentials) -> Result<(), NavError> {
        self.session.login(credentials)?;
        if let Err(err) = self.permissions.refresh() {
            warn!("permission refresh after login failed: {err}");
            return Err(err);
        }
        Ok(())
    }

    pub fn logout(&self) -> Result<(), NavError> {
        self.session.logout()
    }

    #[must_use]
    pub fn sidebar(&self, module: &str, links: &[ModuleSidebarLink]) -> Vec<SidebarEntry> {
        resolve_sidebar(links, module, &self.permissions.index())
    }
}
