//! Commands that talk to the desk server.

use std::path::Path;
use std::sync::Arc;

use desk_nav::config::DeskConfig;
use desk_nav::cookie::CookieJar;
use desk_nav::navigate::{History, Navigation};
use desk_nav::{Credentials, Desk, NavError};

use crate::offline::{load_links, print_index, print_sidebar};
use crate::style;

pub const PASSWORD_ENV: &str = "DESK_NAV_PASSWORD";

/// A connected desk plus what it needs to persist between runs.
pub struct Remote {
    pub desk: Desk,
    cookies: Arc<CookieJar>,
    history: Arc<History>,
    cookie_file: std::path::PathBuf,
}

impl Remote {
    pub fn open(config: &DeskConfig, cookie_file: &Path) -> anyhow::Result<Self> {
        let cookies = Arc::new(CookieJar::load(cookie_file)?);
        let history = Arc::new(History::new());
        let desk = Desk::connect(config, cookies.clone(), history.clone());
        Ok(Self {
            desk,
            cookies,
            history,
            cookie_file: cookie_file.to_path_buf(),
        })
    }

    fn close(&self) -> anyhow::Result<()> {
        self.cookies.save(&self.cookie_file)?;
        if let Some(target) = self.history.current() {
            let href = match &target {
                Navigation::Route(route) => self.desk.routes().href(route)?,
                Navigation::Path(path) => path.to_string(),
            };
            println!("{} {}", style::dim("redirect"), style::accent(href));
        }
        Ok(())
    }

    /// Run `f`, then persist cookies and report the last redirect even when `f` failed.
    fn with<T>(&self, f: impl FnOnce(&Desk) -> anyhow::Result<T>) -> anyhow::Result<T> {
        let result = f(&self.desk);
        self.close()?;
        result
    }
}

pub fn run_login(remote: &Remote, user: &str, password: Option<String>) -> anyhow::Result<()> {
    let password = password
        .or_else(|| std::env::var(PASSWORD_ENV).ok())
        .ok_or_else(|| anyhow::anyhow!("--password or {PASSWORD_ENV} required"))?;
    remote.with(|desk| {
        desk.login(&Credentials::new(user, password))?;
        let index = desk.permissions().index();
        println!(
            "{} ({} modules, {} workspaces, {} doctypes, {} reports)",
            style::success(format!("logged in as {user}")),
            index.modules_by_slug.len(),
            index.workspaces_by_slug.len(),
            index.doctypes_by_slug.len(),
            index.reports_by_slug.len()
        );
        Ok(())
    })
}

pub fn run_whoami(remote: &Remote) -> anyhow::Result<()> {
    remote.with(|desk| {
        let session = desk.session();
        let Some(user) = session.user() else {
            println!("{}", style::dim("Guest (not logged in)"));
            return Ok(());
        };
        match session.load_profile() {
            Ok(profile) => {
                let full_name = profile.full_name.as_deref().unwrap_or("-");
                println!("{} ({full_name})", style::success(user.as_str()));
                Ok(())
            }
            Err(NavError::Authentication(message)) => {
                println!("{}", style::error(format!("session expired: {message}")));
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    })
}

pub fn run_refresh(remote: &Remote, json: bool) -> anyhow::Result<()> {
    remote.with(|desk| {
        if !desk.boot()? {
            anyhow::bail!("not logged in (run `desk-nav login`)");
        }
        print_index(&desk.permissions().index(), json)
    })
}

pub fn run_sidebar(remote: &Remote, module: &str, links: &Path) -> anyhow::Result<()> {
    let links = load_links(links)?;
    remote.with(|desk| {
        if !desk.boot()? {
            anyhow::bail!("not logged in (run `desk-nav login`)");
        }
        print_sidebar(desk.routes(), module, &links, &desk.permissions().index())
    })
}

pub fn run_logout(remote: &Remote) -> anyhow::Result<()> {
    remote.with(|desk| {
        desk.logout()?;
        println!("{}", style::success("logged out"));
        Ok(())
    })
}
