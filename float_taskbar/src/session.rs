//! Running-window state published by the session as `session.json`.

use crate::taskbar::{AppId, RunningAppsQuery, WorkspaceId};
use indexmap::IndexSet;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SESSION_FILE: &str = "session.json";
/// Upper bound on workspace buttons; ids beyond it fold onto the last one.
pub const MAX_WORKSPACES: u32 = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub app: AppId,
    #[serde(default)]
    pub workspace: WorkspaceId,
    #[serde(default = "default_true")]
    pub monitor_visible: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub active_workspace: WorkspaceId,
    #[serde(default)]
    pub workspace_count: Option<u32>,
    #[serde(default)]
    pub windows: Vec<SessionWindow>,
}

fn default_true() -> bool {
    true
}

impl SessionSnapshot {
    pub fn load(path: &Path) -> Option<Self> {
        let file = std::fs::File::open(path).ok()?;
        match serde_json::from_reader::<_, Self>(file) {
            Ok(snapshot) => Some(snapshot.clamped()),
            Err(err) => {
                warn!("Failed to parse {}: {err}", path.display());
                None
            }
        }
    }

    pub fn save(&self, path: &Path) {
        match std::fs::File::create(path) {
            Ok(file) => {
                if let Err(err) = serde_json::to_writer_pretty(file, self) {
                    warn!("Failed to write {}: {err}", path.display());
                }
            }
            Err(err) => warn!("Failed to create {}: {err}", path.display()),
        }
    }

    /// Folds out-of-range workspace ids onto the last supported workspace.
    pub fn clamped(mut self) -> Self {
        let last = MAX_WORKSPACES - 1;
        if self.active_workspace > last {
            warn!("active workspace {} out of range", self.active_workspace);
            self.active_workspace = last;
        }
        for window in &mut self.windows {
            window.workspace = window.workspace.min(last);
        }
        self
    }

    /// Declared count, or enough workspaces to hold every window, capped at
    /// [`MAX_WORKSPACES`].
    pub fn workspaces(&self) -> u32 {
        let used = self
            .windows
            .iter()
            .map(|window| window.workspace.saturating_add(1))
            .max()
            .unwrap_or(1);
        self.workspace_count
            .unwrap_or(used)
            .max(used)
            .max(self.active_workspace.saturating_add(1))
            .min(MAX_WORKSPACES)
    }

    /// Apps with a matching window, in window order, each listed once.
    pub fn apps_for(&self, isolate_workspaces: bool, show_all_windows: bool) -> Vec<AppId> {
        let apps: IndexSet<&AppId> = self
            .windows
            .iter()
            .filter(|window| !isolate_workspaces || window.workspace == self.active_workspace)
            .filter(|window| show_all_windows || window.monitor_visible)
            .map(|window| &window.app)
            .collect();
        apps.into_iter().cloned().collect()
    }
}

/// Latest snapshot plus the file it came from.
#[derive(Debug, Default)]
pub struct SessionState {
    pub path: Option<PathBuf>,
    pub snapshot: Option<SessionSnapshot>,
}

impl SessionState {
    pub fn open(dir: Option<&Path>) -> Self {
        let path = dir.map(|dir| dir.join(SESSION_FILE));
        let snapshot = path.as_deref().and_then(SessionSnapshot::load);
        Self { path, snapshot }
    }

    pub fn workspaces(&self) -> u32 {
        self.snapshot
            .as_ref()
            .map(SessionSnapshot::workspaces)
            .unwrap_or(1)
    }

    /// Switches the active workspace locally and writes it back so other
    /// readers of the file agree.
    pub fn switch_to(&mut self, workspace: WorkspaceId) -> bool {
        let Some(snapshot) = &mut self.snapshot else {
            return false;
        };
        if snapshot.active_workspace == workspace {
            return false;
        }
        snapshot.active_workspace = workspace;
        if let Some(path) = &self.path {
            snapshot.save(path);
        }
        true
    }
}

impl RunningAppsQuery for SessionState {
    fn active_workspace(&self) -> WorkspaceId {
        self.snapshot
            .as_ref()
            .map(|snapshot| snapshot.active_workspace)
            .unwrap_or_default()
    }

    fn running_apps(&self, isolate_workspaces: bool, show_all_windows: bool) -> Option<Vec<AppId>> {
        self.snapshot
            .as_ref()
            .map(|snapshot| snapshot.apps_for(isolate_workspaces, show_all_windows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot() -> SessionSnapshot {
        serde_json::from_str(
            r#"{
                "active_workspace": 1,
                "windows": [
                    {"app": "term", "workspace": 1},
                    {"app": "files", "workspace": 0},
                    {"app": "web", "workspace": 1, "monitor_visible": false},
                    {"app": "term", "workspace": 1}
                ]
            }"#,
        )
        .expect("parse")
    }

    #[test]
    fn isolation_keeps_the_active_workspace() {
        let snapshot = snapshot();
        assert_eq!(snapshot.apps_for(true, true), vec!["term", "web"]);
        assert_eq!(snapshot.apps_for(false, true), vec!["term", "files", "web"]);
    }

    #[test]
    fn hidden_monitor_windows_are_dropped_on_request() {
        assert_eq!(snapshot().apps_for(true, false), vec!["term"]);
    }

    #[test]
    fn query_is_unavailable_before_the_first_snapshot() {
        let mut state = SessionState::default();
        assert_eq!(state.running_apps(true, true), None);
        assert_eq!(state.workspaces(), 1);

        state.snapshot = Some(snapshot());
        assert_eq!(state.active_workspace(), 1);
        assert_eq!(state.workspaces(), 2);
        assert!(state.switch_to(0));
        assert!(!state.switch_to(0));
        assert_eq!(state.running_apps(true, true), Some(vec!["files".to_string()]));
    }

    #[test]
    fn workspace_counts_stay_bounded() {
        let far: SessionSnapshot =
            serde_json::from_str(r#"{"windows":[{"app":"x","workspace":4294967295}]}"#)
                .expect("parse");
        assert_eq!(far.workspaces(), MAX_WORKSPACES);

        let declared: SessionSnapshot =
            serde_json::from_str(r#"{"workspace_count":4000000000}"#).expect("parse");
        assert_eq!(declared.workspaces(), MAX_WORKSPACES);

        let active: SessionSnapshot =
            serde_json::from_str(r#"{"active_workspace":4294967295}"#).expect("parse");
        assert_eq!(active.workspaces(), MAX_WORKSPACES);
        let active = active.clamped();
        assert_eq!(active.active_workspace, MAX_WORKSPACES - 1);
    }

    #[test]
    fn loading_folds_far_workspaces_together() {
        let dir = std::env::temp_dir()
            .join(format!("float_taskbar_session_{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("dir");
        let path = dir.join(SESSION_FILE);
        std::fs::write(
            &path,
            r#"{"active_workspace":4294967295,"windows":[{"app":"x","workspace":4000000000}]}"#,
        )
        .expect("write");

        let state = SessionState::open(Some(&dir));
        assert_eq!(state.active_workspace(), MAX_WORKSPACES - 1);
        assert_eq!(state.workspaces(), MAX_WORKSPACES);
        assert_eq!(state.running_apps(true, true), Some(vec!["x".to_string()]));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
