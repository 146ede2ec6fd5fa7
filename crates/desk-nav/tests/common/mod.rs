#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use desk_nav::cookie::{CookieJar, CookieStore};
use desk_nav::navigate::History;
use desk_nav::permissions::{PermissionStore, SnapshotSource};
use desk_nav::session::{AuthApi, Credentials, LoginResponse, Session, UserProfile};
use desk_nav::snapshot::{DocType, PermissionSnapshot, Report, Workspace};
use desk_nav::{NavError, RouteTable};
use desk_nav::Desk;
use parking_lot::Mutex;

pub const PASSWORD: &str = "secret";

/// Snapshot source whose next answer the test controls.
pub struct ScriptedSource {
    next: Mutex<Result<PermissionSnapshot, NavError>>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(snapshot: PermissionSnapshot) -> Arc<Self> {
        Arc::new(Self {
            next: Mutex::new(Ok(snapshot)),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, result: Result<PermissionSnapshot, NavError>) {
        *self.next.lock() = result;
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl SnapshotSource for ScriptedSource {
    fn fetch_snapshot(&self) -> Result<PermissionSnapshot, NavError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.next.lock().clone()
    }
}

/// In-process stand-in for the desk server's auth endpoints. It sets the
/// `user_id` cookie the way the server would.
pub struct FakeAuth {
    pub cookies: Arc<CookieJar>,
    pub default_route: Mutex<Option<String>>,
    pub profile_route: Mutex<Option<String>>,
    pub fail_logout: Mutex<bool>,
    pub expired: Mutex<bool>,
    pub profile_error: Mutex<Option<NavError>>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl FakeAuth {
    pub fn new(cookies: Arc<CookieJar>) -> Arc<Self> {
        Arc::new(Self {
            cookies,
            default_route: Mutex::new(Some("/app/home".to_string())),
            profile_route: Mutex::new(None),
            fail_logout: Mutex::new(false),
            expired: Mutex::new(false),
            profile_error: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }
}

impl AuthApi for FakeAuth {
    fn login(&self, credentials: &Credentials) -> Result<LoginResponse, NavError> {
        self.calls.lock().push("login");
        if credentials.pwd != PASSWORD {
            return Err(NavError::Authentication("Incorrect password".into()));
        }
        self.cookies.set("user_id", &credentials.usr);
        Ok(LoginResponse {
            default_route: self.default_route.lock().clone().map(Into::into),
        })
    }

    fn logout(&self) -> Result<(), NavError> {
        self.calls.lock().push("logout");
        if *self.fail_logout.lock() {
            return Err(NavError::Transport("connection reset".into()));
        }
        self.cookies.set("user_id", "Guest");
        Ok(())
    }

    fn current_user(&self) -> Result<UserProfile, NavError> {
        self.calls.lock().push("current_user");
        if *self.expired.lock() {
            return Err(NavError::Authentication("Session expired".into()));
        }
        if let Some(err) = self.profile_error.lock().clone() {
            return Err(err);
        }
        match self.cookies.get("user_id") {
            Some(user) if user != "Guest" => {
                let mut profile = UserProfile::named(user);
                profile.default_route = self.profile_route.lock().clone().map(Into::into);
                Ok(profile)
            }
            _ => Err(NavError::Authentication("Not permitted".into())),
        }
    }
}

pub struct Fixture {
    pub cookies: Arc<CookieJar>,
    pub auth: Arc<FakeAuth>,
    pub source: Arc<ScriptedSource>,
    pub history: Arc<History>,
    pub desk: Desk,
}

pub fn fixture(cookie: &str, snapshot: PermissionSnapshot) -> Fixture {
    let cookies = Arc::new(CookieJar::from_header(cookie));
    let auth = FakeAuth::new(cookies.clone());
    let source = ScriptedSource::new(snapshot);
    let history = Arc::new(History::new());
    let session = Session::new(cookies.clone(), auth.clone(), history.clone());
    let store = PermissionStore::new(source.clone());
    let desk = Desk::new(Arc::new(session), Arc::new(store), RouteTable::default());
    Fixture {
        cookies,
        auth,
        source,
        history,
        desk,
    }
}

pub fn hr_snapshot() -> PermissionSnapshot {
    PermissionSnapshot {
        allow_modules: vec!["HR".into()],
        allow_workspaces: vec![Workspace::named("HR Ops")],
        ..PermissionSnapshot::default()
    }
}

pub fn accounts_snapshot() -> PermissionSnapshot {
    let mut snapshot = PermissionSnapshot {
        allow_modules: vec!["Accounts".into(), "HR".into()],
        allow_workspaces: vec![Workspace::named("Accounting"), Workspace::named("HR Ops")],
        ..PermissionSnapshot::default()
    };
    for name in ["Sales Invoice", "Journal Entry"] {
        snapshot.doctype_map.insert(name.into(), DocType::named(name));
    }
    for title in ["Profit and Loss", "General Ledger"] {
        snapshot.all_reports.insert(title.into(), Report::titled(title));
    }
    snapshot
}
