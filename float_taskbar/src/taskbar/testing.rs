//! In-memory collaborators for engine tests.

use super::collab::{AnimationTarget, Animator, Easing, Favorites, RunningAppsQuery, Viewport};
use super::item::{AppId, WorkspaceId};
use super::task::{completion, Completer, Completion};
use std::collections::HashSet;
use std::time::Duration;

pub fn apps(names: &[&str]) -> Vec<AppId> {
    names.iter().map(|name| name.to_string()).collect()
}

#[derive(Default)]
pub struct FakeApps {
    pub workspace: WorkspaceId,
    pub running: Option<Vec<AppId>>,
}

impl FakeApps {
    pub fn running(names: &[&str]) -> Self {
        Self {
            workspace: 0,
            running: Some(apps(names)),
        }
    }
}

impl RunningAppsQuery for FakeApps {
    fn active_workspace(&self) -> WorkspaceId {
        self.workspace
    }

    fn running_apps(&self, _isolate: bool, _show_all: bool) -> Option<Vec<AppId>> {
        self.running.clone()
    }
}

#[derive(Default)]
pub struct FakeFavorites {
    pub apps: Vec<AppId>,
    pub blocked: HashSet<AppId>,
}

impl FakeFavorites {
    pub fn of(names: &[&str]) -> Self {
        Self {
            apps: apps(names),
            blocked: HashSet::new(),
        }
    }
}

impl Favorites for FakeFavorites {
    fn apps(&self) -> Vec<AppId> {
        self.apps.clone()
    }

    fn can_add(&self, app: &str) -> bool {
        !self.blocked.contains(app)
    }

    fn add(&mut self, app: &str, position: usize) {
        if self.apps.iter().any(|known| known == app) {
            return;
        }
        let position = position.min(self.apps.len());
        self.apps.insert(position, app.to_string());
    }

    fn remove(&mut self, app: &str) {
        self.apps.retain(|known| known != app);
    }

    fn move_to(&mut self, app: &str, position: usize) {
        self.remove(app);
        let position = position.min(self.apps.len());
        self.apps.insert(position, app.to_string());
    }
}

/// Scroll requests stay outstanding until `finish_scroll` unless
/// `instant` is set.
pub struct FakeViewport {
    pub page: f32,
    pub scroll_size: f32,
    pub position: f32,
    pub instant: bool,
    pub requests: Vec<f32>,
    outstanding: Option<(f32, Completer)>,
}

impl FakeViewport {
    pub fn new(page: f32) -> Self {
        Self {
            page,
            scroll_size: page,
            position: 0.0,
            instant: true,
            requests: Vec::new(),
            outstanding: None,
        }
    }

    pub fn finish_scroll(&mut self) {
        if let Some((offset, completer)) = self.outstanding.take() {
            self.position = offset;
            completer.complete(true);
        }
    }
}

impl Viewport for FakeViewport {
    fn page_size(&self) -> f32 {
        self.page
    }

    fn scroll_size(&self) -> f32 {
        self.scroll_size
    }

    fn scroll_position(&self) -> f32 {
        self.position
    }

    fn scroll_to_position(&mut self, offset: f32, _animate: bool) -> Option<Completion> {
        if (offset - self.position).abs() < f32::EPSILON {
            return None;
        }
        self.requests.push(offset);
        if self.instant {
            self.position = offset;
            return Some(Completion::ready(true));
        }
        let (completer, pending) = completion();
        // A newer request supersedes the outstanding one.
        self.outstanding = Some((offset, completer));
        Some(pending)
    }
}

#[derive(Default)]
pub struct FakeAnimator {
    pub requests: Vec<(AnimationTarget, Duration)>,
}

impl FakeAnimator {
    pub fn last_width(&self) -> Option<f32> {
        self.requests.last().map(|(target, _)| match target {
            AnimationTarget::ContainerWidth(width) => *width,
        })
    }

    pub fn last_duration(&self) -> Option<Duration> {
        self.requests.last().map(|(_, duration)| *duration)
    }
}

impl Animator for FakeAnimator {
    fn animate(&mut self, target: AnimationTarget, duration: Duration, _easing: Easing) -> Completion {
        self.requests.push((target, duration));
        Completion::ready(true)
    }
}
