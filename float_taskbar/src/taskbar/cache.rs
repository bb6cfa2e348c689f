use super::item::{AppId, WorkspaceId};
use indexmap::IndexSet;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub type SharedAppCache = Rc<RefCell<WorkspaceAppCache>>;

/// Remembers the running-app order per workspace so that re-renders keep
/// running items where the user last saw them.
#[derive(Debug, Default)]
pub struct WorkspaceAppCache {
    per_workspace: HashMap<WorkspaceId, IndexSet<AppId>>,
}

impl WorkspaceAppCache {
    pub fn shared() -> SharedAppCache {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Intersects the remembered order with `fresh` and appends apps seen for
    /// the first time. Closed apps never come back from the cache.
    pub fn refresh(&mut self, workspace: WorkspaceId, fresh: &[AppId]) -> Vec<AppId> {
        let fresh_set: IndexSet<&AppId> = fresh.iter().collect();
        let mut ordered: IndexSet<AppId> = self
            .per_workspace
            .get(&workspace)
            .map(|known| {
                known
                    .iter()
                    .filter(|app| fresh_set.contains(app))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        for app in fresh {
            ordered.insert(app.clone());
        }

        if ordered.is_empty() {
            self.per_workspace.remove(&workspace);
            return Vec::new();
        }
        let result = ordered.iter().cloned().collect();
        self.per_workspace.insert(workspace, ordered);
        result
    }

    /// Replaces the remembered order for `workspace`. Last writer wins.
    pub fn reorder(&mut self, workspace: WorkspaceId, ordered: &[AppId]) {
        let ordered: IndexSet<AppId> = ordered.iter().cloned().collect();
        if ordered.is_empty() {
            self.per_workspace.remove(&workspace);
        } else {
            self.per_workspace.insert(workspace, ordered);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn apps(names: &[&str]) -> Vec<AppId> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn known(cache: &WorkspaceAppCache, workspace: WorkspaceId) -> Vec<AppId> {
        cache
            .per_workspace
            .get(&workspace)
            .map(|apps| apps.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn keeps_known_order_and_appends_new_apps() {
        let mut cache = WorkspaceAppCache::default();
        cache.refresh(0, &apps(&["b", "a"]));
        assert_eq!(cache.refresh(0, &apps(&["a", "c", "b"])), apps(&["b", "a", "c"]));
    }

    #[test]
    fn closed_apps_are_not_resurrected() {
        let mut cache = WorkspaceAppCache::default();
        cache.refresh(1, &apps(&["a", "b"]));
        assert_eq!(cache.refresh(1, &apps(&["b"])), apps(&["b"]));
        assert_eq!(cache.refresh(1, &apps(&["b", "a"])), apps(&["b", "a"]));
    }

    #[test]
    fn empty_workspaces_are_pruned() {
        let mut cache = WorkspaceAppCache::default();
        cache.refresh(2, &apps(&["a"]));
        assert!(cache.refresh(2, &[]).is_empty());
        assert!(known(&cache, 2).is_empty());
    }

    #[test]
    fn reorder_is_last_writer_wins_per_workspace() {
        let mut cache = WorkspaceAppCache::default();
        cache.refresh(0, &apps(&["a", "b", "c"]));
        cache.refresh(1, &apps(&["x"]));
        cache.reorder(0, &apps(&["c", "a", "b"]));
        assert_eq!(cache.refresh(0, &apps(&["a", "b", "c"])), apps(&["c", "a", "b"]));
        assert_eq!(known(&cache, 1), apps(&["x"]));
    }
}
