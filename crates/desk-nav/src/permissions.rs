//! Slug-keyed permission index rebuilt from server snapshots.
//!
//! The store owns four maps (modules, workspaces, doctypes, reports) keyed by
//! [`Slug`]. [`PermissionStore::refresh`] fetches a snapshot from its
//! [`SnapshotSource`] without holding any lock, then applies all four
//! collections under one write guard, so readers see either the previous or
//! the new snapshot and never a mix. Concurrent refreshes race: whichever
//! response arrives last is applied last.
//!
//! Applying a snapshot writes every entry but does not remove slugs that the
//! new snapshot no longer contains. Call [`PermissionStore::reset`] to drop
//! them (logout does this through [`Teardown`]). A refresh whose fetch was
//! already in flight when `reset` ran is discarded, so a logout is not undone
//! by the previous user's late response.

#![allow(missing_docs)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::Serialize;
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::error::NavError;
use crate::route::{Route, RouteName};
use crate::session::Teardown;
use crate::slug::{try_slug, Slug};
use crate::snapshot::{DocType, PermissionSnapshot, Report, Workspace};

/// Where snapshots come from.
pub trait SnapshotSource: Send + Sync {
    fn fetch_snapshot(&self) -> Result<PermissionSnapshot, NavError>;
}

impl<F> SnapshotSource for F
where
    F: Fn() -> Result<PermissionSnapshot, NavError> + Send + Sync,
{
    fn fetch_snapshot(&self) -> Result<PermissionSnapshot, NavError> {
        self()
    }
}

/// Reads a snapshot from a JSON file on every fetch.
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for FileSnapshotSource {
    fn fetch_snapshot(&self) -> Result<PermissionSnapshot, NavError> {
        PermissionSnapshot::load(&self.path)
    }
}

/// The four slug maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlugIndex {
    pub modules_by_slug: IndexMap<Slug, SmolStr>,
    pub workspaces_by_slug: IndexMap<Slug, Workspace>,
    pub doctypes_by_slug: IndexMap<Slug, DocType>,
    pub reports_by_slug: IndexMap<Slug, Report>,
}

impl SlugIndex {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules_by_slug.is_empty()
            && self.workspaces_by_slug.is_empty()
            && self.doctypes_by_slug.is_empty()
            && self.reports_by_slug.is_empty()
    }

    /// Whether the target of `route` is visible to the user.
    #[must_use]
    pub fn contains(&self, route: &Route) -> bool {
        let has = |key: &str| route.param(key).map(Slug::as_str);
        match route.name {
            RouteName::Workspace => has("workspace")
                .is_some_and(|slug| self.workspaces_by_slug.contains_key(slug)),
            RouteName::ListView => {
                has("doctype").is_some_and(|slug| self.doctypes_by_slug.contains_key(slug))
            }
            RouteName::Report => {
                has("id").is_some_and(|slug| self.reports_by_slug.contains_key(slug))
            }
            RouteName::Page | RouteName::Dashboard => {
                has("module").is_some_and(|slug| self.modules_by_slug.contains_key(slug))
            }
            RouteName::Login => true,
        }
    }

    fn apply(&mut self, slugs: PreparedSlugs, snapshot: &PermissionSnapshot) {
        for (slug, module) in slugs.modules.into_iter().zip(&snapshot.allow_modules) {
            self.modules_by_slug.insert(slug, module.clone());
        }
        for (slug, workspace) in slugs.workspaces.into_iter().zip(&snapshot.allow_workspaces) {
            self.workspaces_by_slug.insert(slug, workspace.clone());
        }
        for (slug, doctype) in slugs.doctypes.into_iter().zip(snapshot.doctype_map.values()) {
            self.doctypes_by_slug.insert(slug, doctype.clone());
        }
        for (slug, report) in slugs.reports.into_iter().zip(snapshot.all_reports.values()) {
            self.reports_by_slug.insert(slug, report.clone());
        }
    }
}

/// Slugs for every snapshot entry, computed before the index is locked.
struct PreparedSlugs {
    modules: Vec<Slug>,
    workspaces: Vec<Slug>,
    doctypes: Vec<Slug>,
    reports: Vec<Slug>,
}

impl PreparedSlugs {
    fn encode(snapshot: &PermissionSnapshot) -> Result<Self, NavError> {
        let modules = snapshot
            .allow_modules
            .iter()
            .map(|name| labelled("module", name))
            .collect::<Result<_, _>>()?;
        let workspaces = snapshot
            .allow_workspaces
            .iter()
            .map(|entry| labelled("workspace", &entry.name))
            .collect::<Result<_, _>>()?;
        let doctypes = snapshot
            .doctype_map
            .values()
            .map(|entry| labelled("doctype", &entry.name))
            .collect::<Result<_, _>>()?;
        let reports = snapshot
            .all_reports
            .values()
            .map(|entry| labelled("report", &entry.title))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            modules,
            workspaces,
            doctypes,
            reports,
        })
    }
}

fn labelled(kind: &str, name: &str) -> Result<Slug, NavError> {
    try_slug(Some(name))
        .map_err(|_| NavError::InvalidArgument(format!("{kind} with empty name").into()))
}

/// Change notification for store subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexEvent {
    Refreshed { generation: u64 },
    Reset,
}

/// Shared permission index with an injected snapshot source.
pub struct PermissionStore {
    source: Arc<dyn SnapshotSource>,
    index: RwLock<SlugIndex>,
    last: RwLock<Option<Arc<PermissionSnapshot>>>,
    generation: AtomicU64,
    epoch: AtomicU64,
    subscribers: Mutex<Vec<Sender<IndexEvent>>>,
}

impl std::fmt::Debug for PermissionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionStore")
            .field("generation", &self.generation())
            .finish()
    }
}

impl PermissionStore {
    #[must_use]
    pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
        Self {
            source,
            index: RwLock::new(SlugIndex::default()),
            last: RwLock::new(None),
            generation: AtomicU64::new(0),
            epoch: AtomicU64::new(0),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Fetch a snapshot and merge it into the index.
    ///
    /// On fetch or encoding failure the index is left as it was. When
    /// [`reset`](Self::reset) runs while the fetch is in flight, the fetched
    /// snapshot is returned but not applied.
    pub fn refresh(&self) -> Result<Arc<PermissionSnapshot>, NavError> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let snapshot = match self.source.fetch_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("permission refresh failed: {err}");
                return Err(err);
            }
        };
        let snapshot = Arc::new(snapshot);
        let slugs = PreparedSlugs::encode(&snapshot)?;
        let index = self.index.write();
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!("discarding permission snapshot fetched before a reset");
            return Ok(snapshot);
        }
        self.commit(index, slugs, &snapshot);
        Ok(snapshot)
    }

    /// Merge an already fetched snapshot.
    pub fn apply(&self, snapshot: Arc<PermissionSnapshot>) -> Result<u64, NavError> {
        let slugs = PreparedSlugs::encode(&snapshot)?;
        let index = self.index.write();
        Ok(self.commit(index, slugs, &snapshot))
    }

    fn commit(
        &self,
        mut index: RwLockWriteGuard<'_, SlugIndex>,
        slugs: PreparedSlugs,
        snapshot: &Arc<PermissionSnapshot>,
    ) -> u64 {
        index.apply(slugs, snapshot);
        *self.last.write() = Some(Arc::clone(snapshot));
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        drop(index);
        debug!(
            "permission index generation {generation}: {} modules, {} workspaces, {} doctypes, {} reports",
            snapshot.allow_modules.len(),
            snapshot.allow_workspaces.len(),
            snapshot.doctype_map.len(),
            snapshot.all_reports.len()
        );
        self.notify(IndexEvent::Refreshed { generation });
        generation
    }

    /// Drop every indexed entry and the last snapshot. Refreshes already
    /// fetching when this runs are discarded.
    pub fn reset(&self) {
        {
            let mut index = self.index.write();
            *index = SlugIndex::default();
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *self.last.write() = None;
        }
        debug!("permission index reset");
        self.notify(IndexEvent::Reset);
    }

    /// Receive an [`IndexEvent`] for every later refresh or reset.
    pub fn subscribe(&self) -> Receiver<IndexEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Number of snapshots applied since construction.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn last_snapshot(&self) -> Option<Arc<PermissionSnapshot>> {
        self.last.read().clone()
    }

    /// Read guard over the whole index. Hold it briefly: refreshes wait on it.
    pub fn index(&self) -> RwLockReadGuard<'_, SlugIndex> {
        self.index.read()
    }

    #[must_use]
    pub fn module(&self, slug: &str) -> Option<SmolStr> {
        self.index.read().modules_by_slug.get(slug).cloned()
    }

    #[must_use]
    pub fn workspace(&self, slug: &str) -> Option<Workspace> {
        self.index.read().workspaces_by_slug.get(slug).cloned()
    }

    #[must_use]
    pub fn doctype(&self, slug: &str) -> Option<DocType> {
        self.index.read().doctypes_by_slug.get(slug).cloned()
    }

    #[must_use]
    pub fn report(&self, slug: &str) -> Option<Report> {
        self.index.read().reports_by_slug.get(slug).cloned()
    }

    #[must_use]
    pub fn contains(&self, route: &Route) -> bool {
        self.index.read().contains(route)
    }

    fn notify(&self, event: IndexEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

impl Teardown for PermissionStore {
    fn teardown(&self) {
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slug::slug;

    fn store_with(snapshot: PermissionSnapshot) -> PermissionStore {
        PermissionStore::new(Arc::new(move || Ok::<_, NavError>(snapshot.clone())))
    }

    fn hr_snapshot() -> PermissionSnapshot {
        PermissionSnapshot {
            allow_modules: vec!["HR".into()],
            allow_workspaces: vec![Workspace::named("HR Ops")],
            ..PermissionSnapshot::default()
        }
    }

    #[test]
    fn refresh_populates_all_maps() {
        let mut snapshot = hr_snapshot();
        snapshot
            .doctype_map
            .insert("Leave Application".into(), DocType::named("Leave Application"));
        snapshot
            .all_reports
            .insert("Monthly Attendance".into(), Report::titled("Monthly Attendance Sheet"));
        let store = store_with(snapshot);
        store.refresh().unwrap();
        assert_eq!(store.module("hr").as_deref(), Some("HR"));
        assert_eq!(store.workspace("hr-ops").unwrap().name, "HR Ops");
        assert_eq!(store.doctype("leave-application").unwrap().name, "Leave Application");
        assert!(store.report("monthly-attendance").is_none());
        assert_eq!(
            store.report("monthly-attendance-sheet").unwrap().title,
            "Monthly Attendance Sheet"
        );
        assert_eq!(store.generation(), 1);
    }

    #[test]
    fn colliding_names_keep_last_entry() {
        let snapshot = PermissionSnapshot {
            allow_workspaces: vec![
                Workspace::named("Sales Order"),
                Workspace::named("sales order"),
            ],
            ..PermissionSnapshot::default()
        };
        let store = store_with(snapshot);
        store.refresh().unwrap();
        let index = store.index();
        assert_eq!(index.workspaces_by_slug.len(), 1);
        assert_eq!(index.workspaces_by_slug["sales-order"].name, "sales order");
    }

    #[test]
    fn empty_names_reject_the_snapshot() {
        let store = store_with(hr_snapshot());
        store.refresh().unwrap();
        let mut bad = hr_snapshot();
        bad.allow_modules.push("".into());
        bad.allow_workspaces.push(Workspace::named("Payroll"));
        let err = store.apply(Arc::new(bad)).unwrap_err();
        assert!(matches!(err, NavError::InvalidArgument(_)));
        assert!(store.workspace("payroll").is_none());
        assert_eq!(store.generation(), 1);
    }

    #[test]
    fn contains_checks_by_route_kind() {
        let store = store_with(hr_snapshot());
        store.refresh().unwrap();
        let index = store.index();
        let workspace = Route::new(RouteName::Workspace).with_param("workspace", slug("HR Ops"));
        let list = Route::new(RouteName::ListView).with_param("doctype", slug("Employee"));
        assert!(index.contains(&workspace));
        assert!(!index.contains(&list));
        assert!(index.contains(
            &Route::new(RouteName::Page)
                .with_param("module", slug("HR"))
                .with_param("id", slug("Org Chart"))
        ));
        assert!(!index.contains(&Route::new(RouteName::Dashboard)));
        assert!(index.contains(&Route::login()));
    }

    #[test]
    fn reset_clears_and_notifies() {
        let store = store_with(hr_snapshot());
        let events = store.subscribe();
        store.refresh().unwrap();
        store.reset();
        assert!(store.index().is_empty());
        assert!(store.last_snapshot().is_none());
        assert_eq!(events.try_recv(), Ok(IndexEvent::Refreshed { generation: 1 }));
        assert_eq!(events.try_recv(), Ok(IndexEvent::Reset));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn reset_during_fetch_discards_the_late_snapshot() {
        let (started_tx, started_rx) = crossbeam_channel::bounded::<()>(0);
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);
        let store = Arc::new(PermissionStore::new(Arc::new(move || {
            let _ = started_tx.send(());
            let _ = release_rx.recv();
            Ok::<_, NavError>(hr_snapshot())
        })));
        let events = store.subscribe();
        let worker = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || store.refresh())
        };
        started_rx.recv().unwrap();
        store.reset();
        release_tx.send(()).unwrap();
        let fetched = worker.join().unwrap().unwrap();

        assert_eq!(fetched.allow_modules, vec!["HR"]);
        assert!(store.index().is_empty());
        assert!(store.last_snapshot().is_none());
        assert_eq!(store.generation(), 0);
        assert_eq!(events.try_recv(), Ok(IndexEvent::Reset));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn apply_after_reset_still_lands() {
        let store = store_with(hr_snapshot());
        store.reset();
        assert_eq!(store.apply(Arc::new(hr_snapshot())), Ok(1));
        store.refresh().unwrap();
        assert_eq!(store.generation(), 2);
        assert_eq!(store.module("hr").as_deref(), Some("HR"));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let store = store_with(hr_snapshot());
        drop(store.subscribe());
        let live = store.subscribe();
        store.refresh().unwrap();
        assert_eq!(store.subscribers.lock().len(), 1);
        assert!(live.try_recv().is_ok());
    }
}
