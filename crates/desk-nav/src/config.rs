//! `desk-nav.toml` loading.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use smol_str::SmolStr;

use crate::error::NavError;
use crate::route::{RouteName, RouteTable};
use crate::session::{SessionOptions, DEFAULT_GUEST_USER, DEFAULT_USER_COOKIE};

pub const CONFIG_FILES: &[&str] = &["desk-nav.toml", ".desk-nav.toml"];
pub const URL_ENV: &str = "DESK_NAV_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone)]
pub struct DeskConfig {
    pub config_path: Option<PathBuf>,
    pub log_level: SmolStr,
    pub server: ServerConfig,
    pub endpoints: Endpoints,
    pub session: SessionOptions,
    pub routes: RouteTable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub base_url: SmolStr,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub permissions: SmolStr,
    pub user: SmolStr,
    pub login: SmolStr,
    pub logout: SmolStr,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            permissions: "/api/method/desk.get_permissions".into(),
            user: "/api/method/desk.get_user_info".into(),
            login: "/api/method/login".into(),
            logout: "/api/method/logout".into(),
        }
    }
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            log_level: "info".into(),
            server: ServerConfig {
                base_url: DEFAULT_BASE_URL.into(),
                timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            },
            endpoints: Endpoints::default(),
            session: SessionOptions::default(),
            routes: RouteTable::default(),
        }
    }
}

impl DeskConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NavError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            NavError::InvalidConfig(format!("{}: {err}", path.display()).into())
        })?;
        let mut config = Self::from_toml(&text).map_err(|err| match err {
            NavError::InvalidConfig(message) => {
                NavError::InvalidConfig(format!("{}: {message}", path.display()).into())
            }
            other => other,
        })?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Load the first config file found in `root`, or defaults when there is none.
    pub fn discover(root: &Path) -> Result<Self, NavError> {
        match find_config_file(root) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, NavError> {
        let raw: DeskToml =
            toml::from_str(text).map_err(|err| NavError::InvalidConfig(err.to_string().into()))?;
        raw.into_config()
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), NavError> {
        if let Some(url) = lookup(URL_ENV) {
            self.server.base_url = parse_base_url(&url)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.server.base_url)
    }
}

#[must_use]
pub fn find_config_file(root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DeskToml {
    log_level: Option<String>,
    server: ServerToml,
    endpoints: EndpointsToml,
    session: SessionToml,
    routes: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ServerToml {
    base_url: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct EndpointsToml {
    permissions: Option<String>,
    user: Option<String>,
    login: Option<String>,
    logout: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SessionToml {
    user_cookie: Option<String>,
    guest_user: Option<String>,
}

impl DeskToml {
    fn into_config(self) -> Result<DeskConfig, NavError> {
        let mut config = DeskConfig::default();
        if let Some(level) = self.log_level {
            let level = level.trim().to_ascii_lowercase();
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(NavError::InvalidConfig(
                    format!("invalid log_level '{level}'").into(),
                ));
            }
            config.log_level = level.into();
        }
        if let Some(url) = self.server.base_url {
            config.server.base_url = parse_base_url(&url)?;
        }
        if let Some(timeout_ms) = self.server.timeout_ms {
            if timeout_ms == 0 {
                return Err(NavError::InvalidConfig(
                    "server.timeout_ms must be greater than zero".into(),
                ));
            }
            config.server.timeout = Duration::from_millis(timeout_ms);
        }
        let endpoints = &mut config.endpoints;
        for (key, value, slot) in [
            ("permissions", self.endpoints.permissions, &mut endpoints.permissions),
            ("user", self.endpoints.user, &mut endpoints.user),
            ("login", self.endpoints.login, &mut endpoints.login),
            ("logout", self.endpoints.logout, &mut endpoints.logout),
        ] {
            if let Some(value) = value {
                *slot = parse_endpoint(key, &value)?;
            }
        }
        config.session = SessionOptions {
            user_cookie: non_empty("session.user_cookie", self.session.user_cookie)?
                .unwrap_or_else(|| DEFAULT_USER_COOKIE.into()),
            guest_user: non_empty("session.guest_user", self.session.guest_user)?
                .unwrap_or_else(|| DEFAULT_GUEST_USER.into()),
        };
        for (name, template) in &self.routes {
            let name = RouteName::parse(name)
                .map_err(|_| NavError::InvalidConfig(format!("unknown route '{name}'").into()))?;
            config.routes.set(name, template)?;
        }
        Ok(config)
    }
}

fn parse_base_url(text: &str) -> Result<SmolStr, NavError> {
    let text = text.trim();
    if !(text.starts_with("http://") || text.starts_with("https://")) {
        return Err(NavError::InvalidConfig(
            format!("server.base_url must be http(s): '{text}'").into(),
        ));
    }
    Ok(text.trim_end_matches('/').into())
}

fn parse_endpoint(key: &str, text: &str) -> Result<SmolStr, NavError> {
    let text = text.trim();
    if !text.starts_with('/') {
        return Err(NavError::InvalidConfig(
            format!("endpoints.{key} must start with '/': '{text}'").into(),
        ));
    }
    Ok(text.into())
}

fn non_empty(key: &str, value: Option<String>) -> Result<Option<SmolStr>, NavError> {
    match value {
        Some(value) if value.trim().is_empty() => Err(NavError::InvalidConfig(
            format!("{key} must not be empty").into(),
        )),
        Some(value) => Ok(Some(value.trim().into())),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Route;
    use crate::slug::slug;

    #[test]
    fn empty_file_uses_defaults() {
        let config = DeskConfig::from_toml("").unwrap();
        assert_eq!(config.server.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.server.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(config.endpoints, Endpoints::default());
        assert_eq!(config.session, SessionOptions::default());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn parses_all_sections() {
        let config = DeskConfig::from_toml(
            r#"
log_level = "DEBUG"

[server]
base_url = "https://erp.example.com/"
timeout_ms = 2500

[endpoints]
permissions = "/api/method/app.permissions"
login = "/api/method/app.login"

[session]
user_cookie = "uid"
guest_user = "anonymous"

[routes]
list_view = "/app/:doctype"
"#,
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.server.base_url, "https://erp.example.com");
        assert_eq!(config.server.timeout, Duration::from_millis(2500));
        assert_eq!(config.endpoints.permissions, "/api/method/app.permissions");
        assert_eq!(config.endpoints.logout, Endpoints::default().logout);
        assert_eq!(config.session.user_cookie, "uid");
        assert_eq!(config.session.guest_user, "anonymous");
        let list = Route::new(RouteName::ListView).with_param("doctype", slug("ToDo"));
        assert_eq!(config.routes.href(&list).unwrap(), "/app/todo");
        assert_eq!(
            config.url(&config.endpoints.login),
            "https://erp.example.com/api/method/app.login"
        );
    }

    #[test]
    fn rejects_invalid_values() {
        for text in [
            "log_level = \"loud\"",
            "[server]\nbase_url = \"ftp://x\"",
            "[server]\ntimeout_ms = 0",
            "[endpoints]\nuser = \"api/user\"",
            "[session]\nguest_user = \" \"",
            "[routes]\nform = \"/form/:doctype\"",
            "[routes]\nreport = \"report/:id\"",
            "[unknown]\nkey = 1",
        ] {
            let err = DeskConfig::from_toml(text).unwrap_err();
            assert!(matches!(err, NavError::InvalidConfig(_)), "{text}: {err}");
        }
    }

    #[test]
    fn env_overrides_base_url() {
        let mut config = DeskConfig::default();
        config
            .apply_env(|key| (key == URL_ENV).then(|| "http://10.0.0.5:8000/".to_string()))
            .unwrap();
        assert_eq!(config.server.base_url, "http://10.0.0.5:8000");
        assert!(config.apply_env(|_| Some("nope".to_string())).is_err());
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let mut dir = std::env::temp_dir();
        dir.push(format!("desk-nav-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let config = DeskConfig::discover(&dir).unwrap();
        assert!(config.config_path.is_none());
        std::fs::write(dir.join(".desk-nav.toml"), "log_level = \"warn\"\n").unwrap();
        let config = DeskConfig::discover(&dir).unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.config_path, Some(dir.join(".desk-nav.toml")));
        let _ = std::fs::remove_dir_all(dir);
    }
}
