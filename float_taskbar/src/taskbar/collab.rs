use super::item::{AppId, WorkspaceId};
use super::task::Completion;
use std::time::Duration;

/// Source of live application state.
pub trait RunningAppsQuery {
    fn active_workspace(&self) -> WorkspaceId;

    /// `None` means the source is not available yet.
    fn running_apps(&self, isolate_workspaces: bool, show_all_windows: bool)
        -> Option<Vec<AppId>>;
}

pub trait Favorites {
    fn apps(&self) -> Vec<AppId>;
    fn can_add(&self, app: &str) -> bool;
    fn add(&mut self, app: &str, position: usize);
    fn remove(&mut self, app: &str);
    fn move_to(&mut self, app: &str, position: usize);
}

pub trait Viewport {
    fn page_size(&self) -> f32;
    fn scroll_size(&self) -> f32;
    fn scroll_position(&self) -> f32;

    /// `None` when the viewport is already at `offset`.
    fn scroll_to_position(&mut self, offset: f32, animate: bool) -> Option<Completion>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationTarget {
    ContainerWidth(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    EaseOutQuad,
    Linear,
}

pub trait Animator {
    fn animate(&mut self, target: AnimationTarget, duration: Duration, easing: Easing)
        -> Completion;
}

/// Read-only view of the configuration toggles the engine consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskbarSettings {
    pub show_separator: bool,
    pub isolate_workspaces: bool,
    pub show_all_windows: bool,
}

impl Default for TaskbarSettings {
    fn default() -> Self {
        Self {
            show_separator: true,
            isolate_workspaces: true,
            show_all_windows: true,
        }
    }
}

pub struct Collaborators<'a> {
    pub apps: &'a dyn RunningAppsQuery,
    pub favorites: &'a mut dyn Favorites,
    pub viewport: &'a mut dyn Viewport,
    pub animator: &'a mut dyn Animator,
}
