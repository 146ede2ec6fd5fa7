//! Module sidebar resolution against the permission index.

#![allow(missing_docs)]

use serde::Serialize;
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::permissions::SlugIndex;
use crate::route::{get_route, ModuleSidebarLink, Route};

/// A sidebar entry that survived resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarEntry {
    pub label: SmolStr,
    pub route: Route,
}

/// Resolve `links` in order, keeping only entries that route somewhere the
/// user is allowed to go. Unroutable, malformed and forbidden links are
/// dropped, never reported as errors.
pub fn resolve_sidebar(
    links: &[ModuleSidebarLink],
    module: &str,
    index: &SlugIndex,
) -> Vec<SidebarEntry> {
    let mut entries = Vec::with_capacity(links.len());
    for link in links {
        let route = match get_route(link, module) {
            Ok(Some(route)) => route,
            Ok(None) => continue,
            Err(err) => {
                warn!("skipping sidebar link '{}' in {module}: {err}", link.display());
                continue;
            }
        };
        if !index.contains(&route) {
            debug!("hiding {route}: not permitted");
            continue;
        }
        entries.push(SidebarEntry {
            label: link.display().into(),
            route,
        });
    }
    entries
}
