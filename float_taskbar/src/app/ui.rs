use super::style::{
    rounding, TaskbarTheme, BAR_HEIGHT, BAR_PADDING, GRIP_WIDTH, ITEM_GAP, SEPARATOR_WIDTH,
    WORKSPACE_BUTTON,
};
use super::state::Glow;
use super::{app_id_for_path, sanitize_window_size, HostDrag, TaskbarApp};
use crate::events::UserEvent;
use crate::taskbar::{DragPayload, ItemId, Rect, Rejection, RunningAppsQuery, Viewport};
use eframe::egui;
use log::{debug, info, warn};
use std::time::Instant;

const MIN_VISIBLE_WIDTH: f32 = 72.0;
const SNAP_THRESHOLD: f32 = 48.0;

/// Screen placement of the item row for the current frame.
#[derive(Debug, Clone, Copy)]
struct RowGeometry {
    origin: egui::Pos2,
    visible: egui::Rect,
}

/// Layout of one item in container coordinates.
struct Tile {
    id: ItemId,
    x: f32,
    width: f32,
    visible: bool,
    app: Option<String>,
    favorite: bool,
    candidate: bool,
}

enum RowAction {
    StartDrag(ItemId),
    ToggleFavorite(String),
}

impl eframe::App for TaskbarApp {
    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0, 0.0, 0.0, 0.0]
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.handle_runtime_events(ctx);

        let minimized = ctx.input(|i| i.viewport().minimized).unwrap_or(false);
        if !minimized && !self.taskbar.is_mapped() {
            self.glow = Some(Glow::new(now));
        }
        self.taskbar.set_mapped(!minimized);

        let scrolling = self.host.viewport.advance(now);
        let resizing = self.host.animator.advance(now);
        self.taskbar.tick(now, &mut self.host.collab());

        self.draw_bar(ctx, now);

        if scrolling || resizing || self.taskbar.has_pending_work() || self.drag.is_some() {
            ctx.request_repaint();
        }
    }
}

impl TaskbarApp {
    fn handle_runtime_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                UserEvent::SessionChanged(snapshot) => {
                    debug!(
                        "session changed: workspace {}, {} windows",
                        snapshot.active_workspace,
                        snapshot.windows.len()
                    );
                    self.host.session.snapshot = Some(snapshot);
                    self.taskbar.request_rerender();
                }
                UserEvent::SessionLost => {
                    warn!("session file disappeared, keeping the current items");
                    self.host.session.snapshot = None;
                }
                UserEvent::Quit => {
                    info!("Exiting application...");
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            }
        }
    }

    fn draw_bar(&mut self, ctx: &egui::Context, now: Instant) {
        let theme = TaskbarTheme::default();
        let panel_rounding = rounding(self.host.config.shape);
        let panel_frame = egui::Frame::none()
            .fill(egui::Color32::TRANSPARENT)
            .stroke(egui::Stroke::NONE);

        egui::CentralPanel::default()
            .frame(panel_frame)
            .show(ctx, |ui| {
                let response = ui.allocate_response(ui.available_size(), egui::Sense::click());
                let window_rect = ctx
                    .input(|i| i.viewport().outer_rect)
                    .unwrap_or(egui::Rect::ZERO);

                ui.painter().rect_filled(
                    response.rect.expand(6.0),
                    panel_rounding + 6.0,
                    theme.panel_shadow,
                );
                ui.painter()
                    .rect_filled(response.rect, panel_rounding, theme.panel_bg);
                ui.painter().rect_stroke(
                    response.rect,
                    panel_rounding,
                    egui::Stroke::new(1.0, theme.panel_border),
                );

                let bar = response.rect.shrink(BAR_PADDING);
                let grip_rect =
                    egui::Rect::from_min_size(bar.min, egui::vec2(GRIP_WIDTH, bar.height()));
                self.draw_grip(ui, grip_rect, &theme);
                let grip_resp = ui.interact(
                    grip_rect,
                    ui.id().with("window_grip"),
                    egui::Sense::click_and_drag(),
                );
                self.handle_window_drag(ctx, &grip_resp, window_rect, response.rect.size());

                let workspaces_end =
                    self.draw_workspaces(ui, grip_rect.right() + ITEM_GAP, bar, &theme);
                let items_rect = egui::Rect::from_min_max(
                    egui::pos2(workspaces_end + ITEM_GAP, bar.min.y),
                    bar.max,
                );
                let (row, actions) = ui
                    .allocate_new_ui(egui::UiBuilder::new().max_rect(items_rect), |ui| {
                        self.draw_items(ui, &theme, now)
                    })
                    .inner;

                for action in actions {
                    match action {
                        RowAction::StartDrag(id) => {
                            if self.drag.is_none() {
                                self.drag = Some(HostDrag {
                                    payload: DragPayload::Item(id),
                                    from_files: false,
                                });
                            }
                        }
                        RowAction::ToggleFavorite(app) => self.toggle_favorite(&app),
                    }
                }
                self.handle_pointer_drag(ctx, row, now);
                self.handle_file_drag(ctx, row, now);

                response.context_menu(|ui| self.draw_context_menu(ui));

                self.draw_toast(ui, row.visible, &theme, now);
                self.draw_glow(ui, response.rect, panel_rounding, now);
            });
    }

    fn draw_grip(&self, ui: &egui::Ui, rect: egui::Rect, theme: &TaskbarTheme) {
        let center = rect.center();
        for row in -1..=1 {
            for col in [-2.5_f32, 2.5] {
                ui.painter().circle_filled(
                    egui::pos2(center.x + col, center.y + row as f32 * 6.0),
                    1.5,
                    theme.muted_text,
                );
            }
        }
    }

    /// Returns the right edge of the workspace buttons.
    fn draw_workspaces(
        &mut self,
        ui: &mut egui::Ui,
        left: f32,
        bar: egui::Rect,
        theme: &TaskbarTheme,
    ) -> f32 {
        if self.host.session.snapshot.is_none() {
            return left;
        }
        let count = self.host.session.workspaces();
        let active = self.host.session.active_workspace();
        let mut x = left;
        for workspace in 0..count {
            let rect = egui::Rect::from_min_size(
                egui::pos2(x, bar.center().y - WORKSPACE_BUTTON / 2.0),
                egui::vec2(WORKSPACE_BUTTON, WORKSPACE_BUTTON),
            );
            let resp = ui.interact(
                rect,
                egui::Id::new(("workspace_button", workspace)),
                egui::Sense::click(),
            );
            let fill = if workspace == active {
                theme.workspace_active
            } else if resp.hovered() {
                theme.item_hover
            } else {
                theme.item_bg
            };
            ui.painter().rect_filled(rect, 6.0, fill);
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                (workspace + 1).to_string(),
                egui::FontId::proportional(13.0),
                theme.text,
            );
            if resp.clicked() && self.host.session.switch_to(workspace) {
                info!("switched to workspace {}", workspace + 1);
                self.taskbar.request_rerender();
            }
            x += WORKSPACE_BUTTON + ITEM_GAP;
        }
        x - ITEM_GAP
    }

    fn layout_tiles(&self) -> Vec<Tile> {
        let item_width = self.host.config.item_width;
        let mut x = 0.0;
        let mut tiles = Vec::new();
        for item in self.taskbar.store().items() {
            let width = if !item.visible {
                0.0
            } else if item.is_separator() {
                SEPARATOR_WIDTH
            } else {
                item_width
            };
            tiles.push(Tile {
                id: item.id,
                x,
                width,
                visible: item.visible,
                app: item.app().cloned(),
                favorite: item.is_favorite(),
                candidate: item.candidate,
            });
            x += width;
        }
        tiles
    }

    fn draw_items(
        &mut self,
        ui: &mut egui::Ui,
        theme: &TaskbarTheme,
        now: Instant,
    ) -> (RowGeometry, Vec<RowAction>) {
        let height = ui.available_height().min(BAR_HEIGHT);
        let width = self.host.animator.width().max(0.0);
        let mut scroll = egui::ScrollArea::horizontal()
            .id_salt("taskbar_items")
            .auto_shrink([false, false])
            .scroll_bar_visibility(egui::scroll_area::ScrollBarVisibility::AlwaysHidden);
        if self.host.viewport.is_animating() {
            scroll = scroll.horizontal_scroll_offset(self.host.viewport.offset());
        }

        let tiles = self.layout_tiles();
        let source = self.taskbar.drag_source();
        let output = scroll.show(ui, |ui| {
            let (container, _) =
                ui.allocate_exact_size(egui::vec2(width, height), egui::Sense::hover());
            let painter = ui.painter_at(container);
            let mut actions = Vec::new();

            for tile in &tiles {
                let rect = Rect::new(tile.x, 0.0, tile.width, height);
                self.taskbar.item_allocated(tile.id, rect, now);
                if !tile.visible {
                    continue;
                }
                let screen = egui::Rect::from_min_size(
                    container.min + egui::vec2(tile.x, 0.0),
                    egui::vec2(tile.width, height),
                );
                let Some(app) = &tile.app else {
                    let x = screen.center().x;
                    painter.vline(
                        x,
                        egui::Rangef::new(screen.top() + 8.0, screen.bottom() - 8.0),
                        egui::Stroke::new(1.0, theme.separator),
                    );
                    continue;
                };

                let body = screen.shrink2(egui::vec2(ITEM_GAP / 2.0, 2.0));
                if tile.candidate {
                    painter.rect_stroke(body, 8.0, egui::Stroke::new(1.5, theme.drop_hint));
                    painter.text(
                        body.center(),
                        egui::Align2::CENTER_CENTER,
                        display_name(app),
                        egui::FontId::proportional(13.0),
                        theme.muted_text,
                    );
                    continue;
                }

                let resp = ui.interact(
                    body,
                    egui::Id::new(("taskbar_item", tile.id.raw())),
                    egui::Sense::click_and_drag(),
                );
                let mut fill = if resp.hovered() {
                    theme.item_hover
                } else if tile.favorite {
                    theme.favorite_bg
                } else {
                    theme.item_bg
                };
                let mut text = theme.text;
                if source == Some(tile.id) {
                    fill = fill.gamma_multiply(0.4);
                    text = text.gamma_multiply(0.4);
                }
                painter.rect_filled(body, 8.0, fill);
                painter.rect_stroke(body, 8.0, egui::Stroke::new(1.0, theme.item_border));
                painter.with_clip_rect(body.shrink(6.0)).text(
                    egui::pos2(body.left() + 10.0, body.center().y),
                    egui::Align2::LEFT_CENTER,
                    display_name(app),
                    egui::FontId::proportional(14.0),
                    text,
                );

                if resp.drag_started() {
                    actions.push(RowAction::StartDrag(tile.id));
                }
                let label = if tile.favorite { "Unpin" } else { "Pin to taskbar" };
                resp.on_hover_text(app.as_str()).context_menu(|ui| {
                    if ui.button(label).clicked() {
                        actions.push(RowAction::ToggleFavorite(app.clone()));
                        ui.close_menu();
                    }
                });
            }
            (container.min, actions)
        });

        self.host
            .viewport
            .set_geometry(output.inner_rect.width(), output.content_size.x);
        self.host.viewport.observe(output.state.offset.x);

        let (origin, actions) = output.inner;
        let row = RowGeometry {
            origin,
            visible: output.inner_rect,
        };
        (row, actions)
    }

    fn handle_pointer_drag(&mut self, ctx: &egui::Context, row: RowGeometry, now: Instant) {
        let Some(drag) = self.drag.clone() else {
            return;
        };
        if drag.from_files {
            return;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.drag = None;
            self.taskbar.cancel_drag(now);
            return;
        }
        if ctx.input(|i| i.pointer.any_released() || !i.pointer.any_down()) {
            self.finish_drop(now);
            return;
        }
        if let Some(pos) = ctx.input(|i| i.pointer.interact_pos()) {
            self.feed_drag(drag.payload, pos, row, now);
        }
    }

    fn handle_file_drag(&mut self, ctx: &egui::Context, row: RowGeometry, now: Instant) {
        let (hovered, dropped) = ctx.input(|i| {
            (
                i.raw.hovered_files.first().and_then(|file| file.path.clone()),
                i.raw.dropped_files.first().and_then(|file| file.path.clone()),
            )
        });
        let from_files = self.drag.as_ref().is_some_and(|drag| drag.from_files);

        if let Some(path) = dropped {
            if from_files {
                self.finish_drop(now);
            } else if let Some(app) = app_id_for_path(&path) {
                // No hover was reported for this drop; pin at the end.
                self.pin(&app);
            }
            return;
        }

        match hovered.as_deref().and_then(app_id_for_path) {
            Some(app) => {
                let payload = DragPayload::App(app);
                if self.drag.is_none() {
                    self.drag = Some(HostDrag {
                        payload: payload.clone(),
                        from_files: true,
                    });
                }
                let pos = ctx.input(|i| i.pointer.hover_pos()).unwrap_or_else(|| {
                    egui::pos2(row.visible.right() - 1.0, row.visible.center().y)
                });
                self.feed_drag(payload, pos, row, now);
            }
            // The files left the window without being dropped.
            None if from_files => {
                self.drag = None;
                self.taskbar.drag_actor_destroyed(now);
            }
            None => {}
        }
    }

    fn feed_drag(&mut self, payload: DragPayload, pos: egui::Pos2, row: RowGeometry, now: Instant) {
        let x = pos.x - row.origin.x;
        let height = row.visible.height();
        let container = Rect::new(
            self.host.viewport.scroll_position(),
            0.0,
            row.visible.width(),
            height,
        );
        let width = self.host.config.item_width;
        let actor = Rect::new(
            x - width / 2.0,
            pos.y - row.visible.top() - height / 2.0,
            width,
            height,
        );
        if row.visible.expand(4.0).contains(pos) {
            self.taskbar
                .drag_over(payload, x, now, &mut self.host.collab());
        }
        self.taskbar.drag_motion(actor, container, now);
    }

    fn finish_drop(&mut self, now: Instant) {
        self.drag = None;
        if !self.taskbar.is_dragging() {
            return;
        }
        match self.taskbar.handle_drop(now, &mut self.host.collab()) {
            Ok(effect) => debug!("drop finished: {effect:?}"),
            Err(Rejection::FavoriteRejected(app)) => {
                self.show_warning(format!("Cannot pin {}", display_name(&app)));
            }
            Err(rejection) => debug!("drop had no effect: {rejection}"),
        }
    }

    fn draw_context_menu(&mut self, ui: &mut egui::Ui) {
        let config = &mut self.host.config;
        let mut changed = false;
        changed |= ui
            .checkbox(&mut config.show_separator, "Show separator")
            .changed();
        changed |= ui
            .checkbox(&mut config.isolate_workspaces, "Current workspace only")
            .changed();
        changed |= ui
            .checkbox(&mut config.show_all_windows, "Windows on all monitors")
            .changed();
        if changed {
            self.apply_settings();
        }
        ui.separator();
        if ui.button("Quit").clicked() {
            let _ = self.tx.send(UserEvent::Quit);
            ui.close_menu();
        }
    }

    fn handle_window_drag(
        &mut self,
        ctx: &egui::Context,
        handle_resp: &egui::Response,
        window_rect: egui::Rect,
        panel_size: egui::Vec2,
    ) {
        if handle_resp.drag_started_by(egui::PointerButton::Primary) {
            self.is_dragging_window = true;
            self.drag_start_window_pos = Some(window_rect.min);
            if let Some(hover_pos) = ctx.input(|i| i.pointer.hover_pos()) {
                self.drag_start_global_mouse = Some(window_rect.min + hover_pos.to_vec2());
            }
        }

        if !self.is_dragging_window {
            return;
        }

        let window_size = sanitize_window_size(panel_size);
        let monitor_size = ctx.input(|i| i.viewport().monitor_size);

        if ctx.input(|i| i.pointer.button_released(egui::PointerButton::Primary)) {
            self.is_dragging_window = false;
            let mut new_pos = window_rect.min;
            if let Some(monitor_size) = monitor_size {
                new_pos = snap_to_edges(new_pos, window_size, monitor_size);
            }
            ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(new_pos));
            self.save_window_geometry(new_pos, window_size);
            self.drag_start_window_pos = None;
            self.drag_start_global_mouse = None;
            return;
        }

        if let (Some(start_win_pos), Some(start_global_mouse)) =
            (self.drag_start_window_pos, self.drag_start_global_mouse)
        {
            if let Some(hover_pos) = ctx.input(|i| i.pointer.hover_pos()) {
                let current_global_mouse = window_rect.min + hover_pos.to_vec2();
                let mut new_origin = start_win_pos + (current_global_mouse - start_global_mouse);
                if let Some(monitor_size) = monitor_size {
                    new_origin = clamp_window_origin(new_origin, window_size, monitor_size);
                }
                ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(new_origin));
            }
        }
    }

    /// Drawn over the right end of the item row so the bar keeps its
    /// height and the workspace buttons stay readable.
    fn draw_toast(
        &mut self,
        ui: &egui::Ui,
        row: egui::Rect,
        theme: &TaskbarTheme,
        now: Instant,
    ) {
        let showing = self
            .toast
            .as_ref()
            .and_then(|toast| Some((toast.message.clone(), toast.opacity(now)?)));
        let Some((message, opacity)) = showing else {
            self.toast = None;
            return;
        };
        let painter = ui.ctx().layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("taskbar_toast"),
        ));
        let galley = painter.layout(
            message,
            egui::FontId::proportional(13.0),
            theme.toast_text.gamma_multiply(opacity),
            (row.width() - 24.0).max(40.0),
        );
        let size = galley.rect.size();
        let text_min = egui::pos2(
            (row.right() - 12.0 - size.x).max(row.left() + 12.0),
            row.center().y - size.y / 2.0,
        );
        let plate = egui::Rect::from_min_size(text_min, size).expand2(egui::vec2(8.0, 4.0));
        painter.rect_filled(plate, 6.0, theme.toast_bg.gamma_multiply(opacity));
        painter.rect_stroke(
            plate,
            6.0,
            egui::Stroke::new(1.0, theme.drop_hint.gamma_multiply(opacity)),
        );
        painter.galley(text_min, galley, theme.toast_text);
        ui.ctx().request_repaint();
    }

    fn draw_glow(&mut self, ui: &egui::Ui, panel: egui::Rect, panel_rounding: f32, now: Instant) {
        let Some(alpha) = self.glow.and_then(|glow| glow.alpha(now)) else {
            self.glow = None;
            return;
        };
        ui.painter().rect_stroke(
            panel.shrink(1.0),
            panel_rounding,
            egui::Stroke::new(1.5, egui::Color32::from_rgba_unmultiplied(93, 214, 189, alpha)),
        );
        ui.ctx().request_repaint();
    }
}

/// Short label for a desktop-file id: `org.gnome.Nautilus.desktop` reads
/// as `Nautilus`.
fn display_name(app: &str) -> &str {
    let stem = app.strip_suffix(".desktop").unwrap_or(app);
    match stem.rsplit_once('.') {
        Some((_, last)) if !last.is_empty() => last,
        _ => stem,
    }
}

fn clamp_window_origin(pos: egui::Pos2, size: egui::Vec2, monitor_size: egui::Vec2) -> egui::Pos2 {
    let min_x = MIN_VISIBLE_WIDTH - size.x;
    let max_x = (monitor_size.x - MIN_VISIBLE_WIDTH).max(min_x);
    let max_y = (monitor_size.y - size.y).max(0.0);
    egui::pos2(pos.x.clamp(min_x, max_x), pos.y.clamp(0.0, max_y))
}

fn snap_to_edges(pos: egui::Pos2, size: egui::Vec2, monitor_size: egui::Vec2) -> egui::Pos2 {
    let mut snapped = pos;
    if snapped.x.abs() < SNAP_THRESHOLD {
        snapped.x = 0.0;
    } else if (snapped.x + size.x - monitor_size.x).abs() < SNAP_THRESHOLD {
        snapped.x = monitor_size.x - size.x;
    }
    if snapped.y.abs() < SNAP_THRESHOLD {
        snapped.y = 0.0;
    } else if (snapped.y + size.y - monitor_size.y).abs() < SNAP_THRESHOLD {
        snapped.y = monitor_size.y - size.y;
    }
    clamp_window_origin(snapped, size, monitor_size)
}
