//! Slug encoding for display names.
//!
//! A slug is the lower-cased display name with every space replaced by a
//! hyphen. Nothing else is normalized: punctuation, diacritics and repeated
//! spaces pass through, and names that differ only by case collapse to the
//! same slug.

#![allow(missing_docs)]

use std::borrow::Borrow;
use std::fmt;

use serde::Serialize;
use smol_str::SmolStr;

use crate::error::NavError;

/// URL-safe identifier derived from a display name.
///
/// Only [`slug`] and [`try_slug`] construct values, so every key in a slug
/// index is an encoder output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Slug(SmolStr);

impl Slug {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Slug {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Slug {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Slug {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Encode a display name. Total on every `&str`; prefer [`try_slug`] for
/// names taken from untyped server data.
#[must_use]
pub fn slug(name: &str) -> Slug {
    Slug(name.to_lowercase().replace(' ', "-").into())
}

/// Encode a name that may be missing, failing fast on `None` or an empty name.
pub fn try_slug(name: Option<&str>) -> Result<Slug, NavError> {
    match name {
        None => Err(NavError::InvalidArgument("missing name".into())),
        Some("") => Err(NavError::InvalidArgument("empty name".into())),
        Some(name) => Ok(slug(name)),
    }
}
