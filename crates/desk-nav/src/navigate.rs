//! Navigation sink used for redirects.

#![allow(missing_docs)]

use std::fmt;

use parking_lot::Mutex;
use smol_str::SmolStr;

use crate::route::Route;

/// Where a redirect points: a named route, or a raw path handed out by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Route(Route),
    Path(SmolStr),
}

impl fmt::Display for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Navigation::Route(route) => write!(f, "{route}"),
            Navigation::Path(path) => f.write_str(path),
        }
    }
}

impl From<Route> for Navigation {
    fn from(route: Route) -> Self {
        Navigation::Route(route)
    }
}

pub trait Navigator: Send + Sync {
    /// Push a new location.
    fn navigate(&self, to: Navigation);
    /// Replace the current location, discarding whatever navigation was in progress.
    fn replace(&self, to: Navigation);
}

/// In-memory history stack.
#[derive(Debug, Default)]
pub struct History {
    entries: Mutex<Vec<Navigation>>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> Option<Navigation> {
        self.entries.lock().last().cloned()
    }

    #[must_use]
    pub fn entries(&self) -> Vec<Navigation> {
        self.entries.lock().clone()
    }
}

impl Navigator for History {
    fn navigate(&self, to: Navigation) {
        self.entries.lock().push(to);
    }

    fn replace(&self, to: Navigation) {
        let mut entries = self.entries.lock();
        entries.pop();
        entries.push(to);
    }
}
