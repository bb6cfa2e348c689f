mod runtime;
mod state;
mod style;
mod ui;

use crate::config::AppConfig;
use crate::events::UserEvent;
use crate::session::SessionState;
use crate::taskbar::{Collaborators, DragPayload, Favorites, Taskbar, WorkspaceAppCache};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use log::info;
use state::{Glow, ScrollViewport, Toast, WidthAnimator};
use std::time::Instant;

pub const WINDOW_WIDTH: f32 = 760.0;
pub const WINDOW_HEIGHT: f32 = 56.0;
pub const MIN_WINDOW_WIDTH: f32 = 240.0;
pub const MIN_WINDOW_HEIGHT: f32 = 48.0;

/// Everything the engine borrows during one call.
pub(super) struct Host {
    pub config: AppConfig,
    pub session: SessionState,
    pub viewport: ScrollViewport,
    pub animator: WidthAnimator,
}

impl Host {
    pub fn collab(&mut self) -> Collaborators<'_> {
        Collaborators {
            apps: &self.session,
            favorites: &mut self.config,
            viewport: &mut self.viewport,
            animator: &mut self.animator,
        }
    }
}

/// Pointer or file drag the host is currently feeding to the engine.
#[derive(Debug, Clone)]
pub(super) struct HostDrag {
    pub payload: DragPayload,
    pub from_files: bool,
}

pub struct TaskbarApp {
    rx: Receiver<UserEvent>,
    tx: Sender<UserEvent>,
    taskbar: Taskbar,
    host: Host,
    drag: Option<HostDrag>,
    is_dragging_window: bool,
    drag_start_window_pos: Option<egui::Pos2>,
    drag_start_global_mouse: Option<egui::Pos2>,
    toast: Option<Toast>,
    glow: Option<Glow>,
}

impl TaskbarApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = AppConfig::load();

        if let Some((x, y)) = config.last_pos {
            cc.egui_ctx
                .send_viewport_cmd(egui::ViewportCommand::OuterPosition(egui::pos2(x, y)));
        }
        if let Some((w, h)) = config.last_size {
            let restored = sanitize_window_size(egui::vec2(w, h));
            cc.egui_ctx
                .send_viewport_cmd(egui::ViewportCommand::InnerSize(restored));
        }

        let session = SessionState::open(config.dir());
        let runtime = runtime::build_runtime(&cc.egui_ctx, session.path.clone());
        let now = Instant::now();
        let taskbar = Taskbar::new(config.settings(), WorkspaceAppCache::shared());
        info!(
            "taskbar starting with {} favorites, session {}",
            config.favorites.len(),
            if session.snapshot.is_some() { "loaded" } else { "pending" }
        );

        Self {
            rx: runtime.rx,
            tx: runtime.tx,
            taskbar,
            host: Host {
                config,
                session,
                viewport: ScrollViewport::new(now),
                animator: WidthAnimator::new(now),
            },
            drag: None,
            is_dragging_window: false,
            drag_start_window_pos: None,
            drag_start_global_mouse: None,
            toast: None,
            glow: Some(Glow::new(now)),
        }
    }

    fn show_warning<S: Into<String>>(&mut self, message: S) {
        self.toast = Some(Toast::new(message.into(), Instant::now()));
    }

    fn apply_settings(&mut self) {
        self.host.config.save();
        self.taskbar.set_settings(self.host.config.settings());
    }

    fn toggle_favorite(&mut self, app: &str) {
        if self.host.config.apps().iter().any(|known| known == app) {
            self.host.config.remove(app);
            self.taskbar.request_rerender();
        } else {
            self.pin(app);
        }
    }

    fn pin(&mut self, app: &str) {
        let config = &mut self.host.config;
        if config.apps().iter().any(|known| known == app) {
            return;
        }
        if !config.can_add(app) {
            self.show_warning(format!("Cannot pin {app}"));
            return;
        }
        let position = config.favorites.len();
        config.add(app, position);
        self.taskbar.request_rerender();
    }

    fn save_window_geometry(&mut self, pos: egui::Pos2, size: egui::Vec2) {
        let size = sanitize_window_size(size);
        self.host.config.last_pos = Some((pos.x, pos.y));
        self.host.config.last_size = Some((size.x, size.y));
        self.host.config.save();
    }
}

impl Drop for TaskbarApp {
    fn drop(&mut self) {
        self.taskbar.destroy();
    }
}

pub(super) fn sanitize_window_size(size: egui::Vec2) -> egui::Vec2 {
    let width = if size.x.is_finite() {
        size.x
    } else {
        WINDOW_WIDTH
    };
    let height = if size.y.is_finite() {
        size.y
    } else {
        WINDOW_HEIGHT
    };
    egui::vec2(width.max(MIN_WINDOW_WIDTH), height.max(MIN_WINDOW_HEIGHT))
}

/// Application id for a dropped file: the desktop-file name itself.
pub(super) fn app_id_for_path(path: &std::path::Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy().trim().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn window_size_is_clamped_and_sanitized() {
        let size = sanitize_window_size(egui::vec2(f32::NAN, 10.0));
        assert_eq!(size, egui::vec2(WINDOW_WIDTH, MIN_WINDOW_HEIGHT));
    }

    #[test]
    fn dropped_paths_map_to_desktop_ids() {
        assert_eq!(
            app_id_for_path(Path::new("/usr/share/applications/org.gnome.Nautilus.desktop")),
            Some("org.gnome.Nautilus.desktop".to_string())
        );
        assert_eq!(app_id_for_path(Path::new("/")), None);
    }
}
