use super::cache::WorkspaceAppCache;
use super::collab::{Favorites, RunningAppsQuery, TaskbarSettings};
use super::error::Rejection;
use super::item::{AppId, ItemId, ItemStore};
use indexmap::{IndexMap, IndexSet};
use log::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<ItemId>,
    pub destroyed: Vec<ItemId>,
    pub reordered: bool,
    pub separator_index: usize,
    pub separator_visible: bool,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.destroyed.is_empty() && !self.reordered
    }
}

/// Turns {favorites ∪ running apps} into the displayed item sequence with
/// the fewest item creations and destructions.
#[derive(Debug, Default)]
pub struct Reconciler {
    pending: bool,
}

impl Reconciler {
    /// Marks a rerender as pending. A second request while one is pending
    /// is coalesced into the first.
    pub fn request(&mut self) -> Result<(), Rejection> {
        if self.pending {
            return Err(Rejection::AlreadyPending);
        }
        self.pending = true;
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Runs the pending rerender, if any. An unmapped taskbar keeps the
    /// request pending so it runs once the taskbar is shown.
    pub fn run_pending(
        &mut self,
        store: &mut ItemStore,
        cache: &mut WorkspaceAppCache,
        apps: &dyn RunningAppsQuery,
        favorites: &dyn Favorites,
        settings: TaskbarSettings,
        mapped: bool,
    ) -> Option<Result<ReconcileReport, Rejection>> {
        if !self.pending || !mapped {
            return None;
        }
        self.pending = false;
        Some(self.rerender(store, cache, apps, favorites, settings, mapped))
    }

    pub fn rerender(
        &mut self,
        store: &mut ItemStore,
        cache: &mut WorkspaceAppCache,
        apps: &dyn RunningAppsQuery,
        favorites: &dyn Favorites,
        settings: TaskbarSettings,
        mapped: bool,
    ) -> Result<ReconcileReport, Rejection> {
        if !mapped {
            return Err(Rejection::NotVisible);
        }
        let fresh = apps
            .running_apps(settings.isolate_workspaces, settings.show_all_windows)
            .ok_or(Rejection::QueryUnavailable)?;
        let running = cache.refresh(apps.active_workspace(), &fresh);

        let favorite_apps: IndexSet<AppId> = favorites.apps().into_iter().collect();
        let running_apps: Vec<AppId> = running
            .into_iter()
            .filter(|app| !favorite_apps.contains(app))
            .collect();
        if favorite_apps.is_empty() && running_apps.is_empty() {
            // A transient empty answer must not clear the bar.
            return Err(Rejection::EmptyQuery);
        }

        let mut report = ReconcileReport::default();
        let mut existing: IndexMap<AppId, ItemId> = IndexMap::new();
        let mut duplicates = Vec::new();
        for item in store.app_items().filter(|item| !item.candidate) {
            if let Some(app) = item.app() {
                if existing.contains_key(app) {
                    duplicates.push(item.id);
                } else {
                    existing.insert(app.clone(), item.id);
                }
            }
        }
        for id in duplicates {
            if store.destroy(id) {
                report.destroyed.push(id);
            }
        }

        let desired = favorite_apps
            .iter()
            .map(|app| (app, true))
            .chain(running_apps.iter().map(|app| (app, false)));
        let mut sequence = Vec::with_capacity(favorite_apps.len() + running_apps.len() + 1);
        for (app, favorite) in desired {
            let reused = match existing.shift_remove(app) {
                Some(id) if store.get(id).map(|item| item.is_favorite()) == Some(favorite) => {
                    Some(id)
                }
                Some(stale) => {
                    store.destroy(stale);
                    report.destroyed.push(stale);
                    None
                }
                None => None,
            };
            let id = reused.unwrap_or_else(|| {
                let id = store.create_app(app.clone(), favorite);
                report.created.push(id);
                id
            });
            sequence.push(id);
        }
        for (_, id) in existing {
            if store.destroy(id) {
                report.destroyed.push(id);
            }
        }

        let favorites_count = favorite_apps.len();
        let total = sequence.len();
        let separator = store.separator();
        report.separator_index = favorites_count;
        report.separator_visible =
            settings.show_separator && favorites_count > 0 && total > favorites_count;
        store.set_visible(separator, report.separator_visible);
        sequence.insert(favorites_count, separator);
        report.reordered = store.set_order(sequence);

        debug!(
            "rerender: {} favorites, {} running, {} created, {} destroyed",
            favorites_count,
            total - favorites_count,
            report.created.len(),
            report.destroyed.len()
        );
        Ok(report)
    }
}
