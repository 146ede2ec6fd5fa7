//! Permission snapshot wire types.

#![allow(missing_docs)]

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smol_str::SmolStr;

use crate::error::NavError;

/// Everything the current user may see, as returned by one server call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSnapshot {
    #[serde(default)]
    pub allow_modules: Vec<SmolStr>,
    #[serde(default)]
    pub allow_workspaces: Vec<Workspace>,
    #[serde(default)]
    pub doctype_map: IndexMap<SmolStr, DocType>,
    #[serde(default)]
    pub all_reports: IndexMap<SmolStr, Report>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub name: SmolStr,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocType {
    pub name: SmolStr,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub title: SmolStr,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Workspace {
    #[must_use]
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            extra: Map::new(),
        }
    }
}

impl DocType {
    #[must_use]
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            extra: Map::new(),
        }
    }
}

impl Report {
    #[must_use]
    pub fn titled(title: impl Into<SmolStr>) -> Self {
        Self {
            title: title.into(),
            extra: Map::new(),
        }
    }
}

impl PermissionSnapshot {
    /// Decode a snapshot body, unwrapping a `{"message": ...}` envelope when present.
    pub fn from_json(text: &str) -> Result<Self, NavError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|err| NavError::Decode(format!("permission snapshot: {err}").into()))?;
        Self::from_value(unwrap_message(value))
    }

    pub fn from_value(value: Value) -> Result<Self, NavError> {
        serde_json::from_value(value)
            .map_err(|err| NavError::Decode(format!("permission snapshot: {err}").into()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, NavError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            NavError::Transport(format!("{}: {err}", path.display()).into())
        })?;
        Self::from_json(&text)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allow_modules.is_empty()
            && self.allow_workspaces.is_empty()
            && self.doctype_map.is_empty()
            && self.all_reports.is_empty()
    }
}

/// Strip the `{"message": ...}` envelope the desk API wraps method results in.
pub(crate) fn unwrap_message(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("message") => {
            map.remove("message").unwrap_or(Value::Null)
        }
        other => other,
    }
}
