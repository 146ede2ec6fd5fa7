//! Blocking HTTP client for the desk server.
//!
//! Every response's `Set-Cookie` headers go into the shared [`CookieJar`],
//! which is replayed on later requests and read by the session for identity.

#![allow(missing_docs)]

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use smol_str::SmolStr;
use tracing::debug;
use ureq::Agent;

use crate::config::{DeskConfig, Endpoints};
use crate::cookie::CookieJar;
use crate::error::NavError;
use crate::permissions::SnapshotSource;
use crate::session::{AuthApi, Credentials, LoginResponse, UserProfile};
use crate::snapshot::{unwrap_message, PermissionSnapshot};

const AUTHENTICATION_ERROR: &str = "AuthenticationError";

pub struct DeskClient {
    agent: Agent,
    base_url: SmolStr,
    endpoints: Endpoints,
    cookies: Arc<CookieJar>,
}

impl std::fmt::Debug for DeskClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeskClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DeskClient {
    #[must_use]
    pub fn new(config: &DeskConfig) -> Self {
        Self::with_cookies(config, Arc::new(CookieJar::new()))
    }

    #[must_use]
    pub fn with_cookies(config: &DeskConfig, cookies: Arc<CookieJar>) -> Self {
        let agent_config = Agent::config_builder()
            .timeout_global(Some(config.server.timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: Agent::new_with_config(agent_config),
            base_url: config.server.base_url.clone(),
            endpoints: config.endpoints.clone(),
            cookies,
        }
    }

    #[must_use]
    pub fn cookies(&self) -> Arc<CookieJar> {
        Arc::clone(&self.cookies)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    fn get(&self, endpoint: &str) -> Result<String, NavError> {
        let url = self.url(endpoint);
        let mut request = self.agent.get(&url).header("Accept", "application/json");
        if let Some(cookie) = self.cookies.header_value() {
            request = request.header("Cookie", cookie.as_str());
        }
        let response = request.call().map_err(transport)?;
        self.finish("GET", &url, response)
    }

    fn post(&self, endpoint: &str, form: Option<&[(&str, &str)]>) -> Result<String, NavError> {
        let url = self.url(endpoint);
        let mut request = self.agent.post(&url).header("Accept", "application/json");
        if let Some(cookie) = self.cookies.header_value() {
            request = request.header("Cookie", cookie.as_str());
        }
        let response = match form {
            Some(fields) => request.send_form(fields.iter().copied()),
            None => request.send_empty(),
        }
        .map_err(transport)?;
        self.finish("POST", &url, response)
    }

    fn finish(
        &self,
        method: &str,
        url: &str,
        mut response: ureq::http::Response<ureq::Body>,
    ) -> Result<String, NavError> {
        let status = response.status().as_u16();
        for value in response.headers().get_all("set-cookie") {
            if let Ok(text) = value.to_str() {
                self.cookies.store_set_cookie(text);
            }
        }
        let body = response.body_mut().read_to_string().map_err(transport)?;
        debug!("{method} {url} -> {status}");
        classify(status, &body)?;
        Ok(body)
    }
}

fn transport(err: ureq::Error) -> NavError {
    NavError::Transport(err.to_string().into())
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    exc_type: Option<SmolStr>,
    #[serde(default)]
    exception: Option<SmolStr>,
    #[serde(default)]
    message: Option<Value>,
}

impl ErrorBody {
    fn text(&self) -> Option<SmolStr> {
        if let Some(exception) = &self.exception {
            return Some(exception.clone());
        }
        match &self.message {
            Some(Value::String(text)) => Some(text.as_str().into()),
            _ => None,
        }
    }
}

/// Map a status and body to an error. An `AuthenticationError` exception
/// type, or 401/403, is an authentication failure whatever the status says.
fn classify(status: u16, body: &str) -> Result<(), NavError> {
    let error: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let success = (200..300).contains(&status);
    let auth_exc = error.exc_type.as_deref() == Some(AUTHENTICATION_ERROR);
    if auth_exc || status == 401 || status == 403 {
        let message = error
            .text()
            .unwrap_or_else(|| format!("status {status}").into());
        return Err(NavError::Authentication(message));
    }
    if success {
        return Ok(());
    }
    let message = error
        .text()
        .or(error.exc_type)
        .unwrap_or_else(|| body.trim().chars().take(200).collect::<String>().into());
    Err(NavError::Server { status, message })
}

fn decode_json(context: &str, body: &str) -> Result<Value, NavError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|err| NavError::Decode(format!("{context}: {err}").into()))
}

impl SnapshotSource for DeskClient {
    fn fetch_snapshot(&self) -> Result<PermissionSnapshot, NavError> {
        let body = self.get(&self.endpoints.permissions)?;
        PermissionSnapshot::from_json(&body)
    }
}

impl AuthApi for DeskClient {
    fn login(&self, credentials: &Credentials) -> Result<LoginResponse, NavError> {
        let fields = [
            ("usr", credentials.usr.as_str()),
            ("pwd", credentials.pwd.as_str()),
        ];
        let body = self.post(&self.endpoints.login, Some(&fields[..]))?;
        match unwrap_message(decode_json("login", &body)?) {
            Value::Object(map) => serde_json::from_value(Value::Object(map))
                .map_err(|err| NavError::Decode(format!("login: {err}").into())),
            _ => Ok(LoginResponse::default()),
        }
    }

    fn logout(&self) -> Result<(), NavError> {
        self.post(&self.endpoints.logout, None)?;
        Ok(())
    }

    fn current_user(&self) -> Result<UserProfile, NavError> {
        let body = self.get(&self.endpoints.user)?;
        match unwrap_message(decode_json("user", &body)?) {
            Value::String(name) if !name.is_empty() => Ok(UserProfile::named(name)),
            value @ Value::Object(_) => serde_json::from_value(value)
                .map_err(|err| NavError::Decode(format!("user: {err}").into())),
            other => Err(NavError::Decode(
                format!("user: unexpected payload {other}").into(),
            )),
        }
    }
}
