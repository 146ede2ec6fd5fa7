//! Cookie access for session identity.

#![allow(missing_docs)]

use std::fs;
use std::io;
use std::path::Path;

use indexmap::IndexMap;
use parking_lot::Mutex;

/// Read access to the cookies the session identity is derived from.
pub trait CookieStore: Send + Sync {
    /// Decoded value of the cookie `name`, if set.
    fn get(&self, name: &str) -> Option<String>;
}

/// In-memory cookie jar, fed from `Cookie` strings or `Set-Cookie` headers.
///
/// Values are kept exactly as the server sent them and replayed unchanged;
/// only [`CookieStore::get`] percent-decodes.
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: Mutex<IndexMap<String, String>>,
}

impl CookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a jar from a `document.cookie`-style string (`a=1; b=2`).
    #[must_use]
    pub fn from_header(header: &str) -> Self {
        let jar = Self::new();
        jar.cookies.lock().extend(parse_cookie_header(header));
        jar
    }

    pub fn set(&self, name: &str, value: &str) {
        self.cookies.lock().insert(name.to_string(), value.to_string());
    }

    pub fn remove(&self, name: &str) {
        self.cookies.lock().shift_remove(name);
    }

    pub fn clear(&self) {
        self.cookies.lock().clear();
    }

    /// Apply one `Set-Cookie` header. `Max-Age=0` (or negative) removes the cookie.
    pub fn store_set_cookie(&self, header: &str) {
        let mut parts = header.split(';');
        let Some((name, value)) = parts.next().and_then(split_pair) else {
            return;
        };
        let expired = parts.filter_map(split_pair).any(|(key, value)| {
            key.eq_ignore_ascii_case("max-age")
                && value.parse::<i64>().map(|age| age <= 0).unwrap_or(false)
        });
        let mut cookies = self.cookies.lock();
        if expired {
            cookies.shift_remove(name);
        } else {
            cookies.insert(name.to_string(), value.to_string());
        }
    }

    /// Load a jar saved with [`CookieJar::save`]; a missing file gives an empty jar.
    pub fn load(path: &Path) -> io::Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let data = fs::read_to_string(path)?;
        let cookies: IndexMap<String, String> = serde_json::from_str(&data)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        Ok(Self {
            cookies: Mutex::new(cookies),
        })
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&*self.cookies.lock())
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        fs::write(path, data)
    }

    /// `Cookie` request header value, or `None` when the jar is empty.
    #[must_use]
    pub fn header_value(&self) -> Option<String> {
        let cookies = self.cookies.lock();
        if cookies.is_empty() {
            return None;
        }
        let pairs = cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>();
        Some(pairs.join("; "))
    }
}

impl CookieStore for CookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies.lock().get(name).map(|value| decode(value))
    }
}

/// Parse `a=1; b=2` into raw pairs. Later duplicates win.
#[must_use]
pub fn parse_cookie_header(header: &str) -> IndexMap<String, String> {
    header
        .split(';')
        .filter_map(split_pair)
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn split_pair(part: &str) -> Option<(&str, &str)> {
    let (name, value) = part.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim().trim_matches('"')))
}

fn decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| value.to_string())
}
