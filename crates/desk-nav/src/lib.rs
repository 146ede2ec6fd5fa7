//! `desk-nav` - permission-scoped navigation for a metadata-driven desk client.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// HTTP client for the desk server.
pub mod client;
/// Configuration loading.
pub mod config;
/// Cookie jar and cookie access.
pub mod cookie;
/// Session, permissions and routes wired together.
pub mod desk;
/// Navigation errors.
pub mod error;
/// Redirect sink and in-memory history.
pub mod navigate;
/// Slug-keyed permission index.
pub mod permissions;
/// Link resolution and route templates.
pub mod route;
/// Session identity and login/logout.
pub mod session;
/// Sidebar resolution.
pub mod sidebar;
/// Slug encoding.
pub mod slug;
/// Permission snapshot wire types.
pub mod snapshot;

pub use desk::Desk;
pub use error::NavError;
pub use permissions::{PermissionStore, SlugIndex, SnapshotSource};
pub use route::{get_route, ModuleSidebarLink, Route, RouteName, RouteTable};
pub use session::{Credentials, Session};
pub use slug::{slug, try_slug, Slug};
pub use snapshot::PermissionSnapshot;
