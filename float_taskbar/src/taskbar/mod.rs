//! Headless taskbar engine: keeps one item per favorite or running app,
//! tracks drag-and-drop over the row, and sizes the container.
//!
//! Everything runs on the UI thread. The host reports geometry with
//! [`Taskbar::item_allocated`], forwards pointer events, and calls
//! [`Taskbar::tick`] once per frame so scheduled work can run.

pub mod allocation;
pub mod cache;
pub mod collab;
pub mod dnd;
pub mod error;
pub mod item;
pub mod reconcile;
pub mod task;
#[cfg(test)]
mod testing;

pub use cache::{SharedAppCache, WorkspaceAppCache};
pub use collab::{
    AnimationTarget, Animator, Collaborators, Easing, Favorites, RunningAppsQuery,
    TaskbarSettings, Viewport,
};
pub use dnd::{DragPayload, DragPhase};
pub use error::Rejection;
pub use item::{AppId, Item, ItemId, ItemStore, Rect, WorkspaceId};
pub use task::{completion, Completer, Completion};

use allocation::AllocationManager;
use dnd::{DragDropController, DropOutcome};
use log::{debug, info};
use reconcile::{ReconcileReport, Reconciler};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropEffect {
    Pinned { app: AppId, position: usize },
    MovedFavorite { app: AppId, position: usize },
    Unpinned { app: AppId },
    ReorderedRunning { workspace: WorkspaceId, apps: Vec<AppId> },
}

pub struct Taskbar {
    store: ItemStore,
    reconciler: Reconciler,
    dnd: DragDropController,
    allocation: AllocationManager,
    cache: SharedAppCache,
    settings: TaskbarSettings,
    mapped: bool,
    alive: bool,
    last_report: Option<ReconcileReport>,
}

impl Taskbar {
    pub fn new(settings: TaskbarSettings, cache: SharedAppCache) -> Self {
        Self {
            store: ItemStore::new(),
            reconciler: Reconciler::default(),
            dnd: DragDropController::new(),
            allocation: AllocationManager::new(),
            cache,
            settings,
            mapped: false,
            alive: true,
            last_report: None,
        }
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn settings(&self) -> TaskbarSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: TaskbarSettings) {
        if self.settings != settings {
            self.settings = settings;
            self.request_rerender();
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    pub fn set_mapped(&mut self, mapped: bool) {
        if mapped && !self.mapped {
            self.request_rerender();
        }
        self.mapped = mapped;
    }

    pub fn request_rerender(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        match self.reconciler.request() {
            Ok(()) => true,
            Err(rejection) => {
                debug!("rerender request coalesced: {rejection}");
                false
            }
        }
    }

    pub fn last_report(&self) -> Option<&ReconcileReport> {
        self.last_report.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.dnd.is_dragging()
    }

    pub fn drag_phase(&self) -> DragPhase {
        self.dnd.phase()
    }

    pub fn drag_source(&self) -> Option<ItemId> {
        self.dnd.source()
    }

    pub fn candidate(&self) -> Option<ItemId> {
        self.dnd.candidate()
    }

    /// True while a rerender, a debounced allocation update or a container
    /// transition still needs frames to run.
    pub fn has_pending_work(&self) -> bool {
        self.alive
            && (self.reconciler.is_pending()
                || self.allocation.is_scheduled()
                || self.allocation.is_updating())
    }

    pub fn total_width(&self) -> f32 {
        self.allocation.total_width()
    }

    pub fn applied_width(&self) -> f32 {
        self.allocation.applied_width()
    }

    /// Visible items in display order.
    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.store.items().filter(|item| item.visible)
    }

    pub fn tick(&mut self, now: Instant, collab: &mut Collaborators<'_>) {
        if !self.alive {
            return;
        }
        self.dnd.settle();
        // Rerenders wait for the drag to finish so they never pull the
        // candidate out from under the pointer.
        if !self.dnd.is_dragging() {
            let outcome = self.reconciler.run_pending(
                &mut self.store,
                &mut self.cache.borrow_mut(),
                collab.apps,
                &*collab.favorites,
                self.settings,
                self.mapped,
            );
            match outcome {
                Some(Ok(report)) => self.last_report = Some(report),
                Some(Err(rejection)) => debug!("rerender skipped: {rejection}"),
                None => {}
            }
        }
        self.sync_destroyed(now);
        let dragging = self.dnd.is_dragging();
        self.allocation
            .tick(now, &mut *collab.viewport, &mut *collab.animator, dragging);
    }

    /// Geometry report from the rendering layer.
    pub fn item_allocated(&mut self, id: ItemId, rect: Rect, now: Instant) {
        let previous = self.store.get(id).map(|item| (item.mapped, item.rect.width));
        let Some((was_mapped, old_width)) = previous else {
            debug!("allocation ignored: {}", Rejection::StaleItem(id));
            return;
        };
        self.store.set_rect(id, rect);
        if was_mapped && (old_width - rect.width).abs() < f32::EPSILON {
            return;
        }
        let app = self.store.app_of(id).cloned();
        let dragging = self.dnd.is_dragging();
        self.allocation.add(id, app, rect.width, now, dragging);
    }

    /// Drag-over notification with `x` in container coordinates. Starts a
    /// session on the first call and scrolls toward the item under the
    /// pointer.
    pub fn drag_over(
        &mut self,
        payload: DragPayload,
        x: f32,
        now: Instant,
        collab: &mut Collaborators<'_>,
    ) -> Option<ItemId> {
        if !self.alive {
            return None;
        }
        if !self.dnd.is_dragging() {
            self.dnd.begin(payload, &self.store);
        }
        let occupying = self.dnd.handle_drag(x, &mut self.store);
        self.sync_destroyed(now);
        if let Some(id) = occupying {
            self.scroll_toward(id, &mut *collab.viewport);
        }
        occupying
    }

    /// Motion of the dragged visual; discards the candidate once it leaves
    /// `container`.
    pub fn drag_motion(&mut self, actor: Rect, container: Rect, now: Instant) -> bool {
        let left = self.dnd.track_actor(actor, container, &mut self.store);
        self.sync_destroyed(now);
        left
    }

    pub fn handle_drop(
        &mut self,
        now: Instant,
        collab: &mut Collaborators<'_>,
    ) -> Result<DropEffect, Rejection> {
        let outcome = self.dnd.handle_drop(&mut self.store);
        let result = match &outcome {
            Ok(outcome) => self.finalize_drop(outcome, collab),
            Err(rejection) => Err(rejection.clone()),
        };
        if let Ok(outcome) = &outcome {
            self.store.destroy(outcome.candidate);
        }
        self.sync_destroyed(now);
        match &result {
            Ok(effect) => {
                info!("drop applied: {effect:?}");
                self.request_rerender();
            }
            Err(rejection) => debug!("drop ignored: {rejection}"),
        }
        result
    }

    pub fn cancel_drag(&mut self, now: Instant) {
        self.dnd.cancel(&mut self.store);
        self.sync_destroyed(now);
    }

    /// The dragged visual went away without a drop.
    pub fn drag_actor_destroyed(&mut self, now: Instant) {
        if self.dnd.is_dragging() {
            debug!("drag visual destroyed mid-drag");
        }
        self.dnd.actor_destroyed(&mut self.store);
        self.sync_destroyed(now);
    }

    /// Detaches the taskbar. Pending work and late completions are ignored
    /// afterwards.
    pub fn destroy(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.dnd.cancel(&mut self.store);
        self.allocation.destroy();
    }

    fn finalize_drop(
        &mut self,
        outcome: &DropOutcome,
        collab: &mut Collaborators<'_>,
    ) -> Result<DropEffect, Rejection> {
        let app = outcome.app.clone();
        let is_favorite = collab.favorites.apps().contains(&app);

        if outcome.favorite_zone {
            let position = outcome.favorite_position();
            if is_favorite {
                collab.favorites.move_to(&app, position);
                return Ok(DropEffect::MovedFavorite { app, position });
            }
            if !collab.favorites.can_add(&app) {
                return Err(Rejection::FavoriteRejected(app));
            }
            collab.favorites.add(&app, position);
            return Ok(DropEffect::Pinned { app, position });
        }

        if is_favorite {
            collab.favorites.remove(&app);
        }
        let workspace = collab.apps.active_workspace();
        let running = outcome.running_apps().to_vec();
        self.cache.borrow_mut().reorder(workspace, &running);
        if is_favorite {
            Ok(DropEffect::Unpinned { app })
        } else {
            Ok(DropEffect::ReorderedRunning {
                workspace,
                apps: running,
            })
        }
    }

    fn sync_destroyed(&mut self, now: Instant) {
        let dragging = self.dnd.is_dragging();
        for id in self.store.drain_destroyed() {
            self.allocation.remove(id, now, dragging);
        }
    }

    fn scroll_toward(&self, id: ItemId, viewport: &mut dyn Viewport) {
        let mapped = self
            .store
            .get(id)
            .filter(|item| item.mapped)
            .map(|item| item.rect);
        let Some(rect) = mapped.or_else(|| self.dnd.slot_rect(id)) else {
            return;
        };
        let page = viewport.page_size();
        let position = viewport.scroll_position();
        let target = if rect.x < position {
            rect.x
        } else if rect.right() > position + page {
            rect.right() - page
        } else {
            return;
        };
        // Drag scrolling is fire-and-forget.
        let _ = viewport.scroll_to_position(target.max(0.0), true);
    }
}

impl Drop for Taskbar {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{apps, FakeAnimator, FakeApps, FakeFavorites, FakeViewport};
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    const WIDTH: f32 = 50.0;

    struct World {
        apps: FakeApps,
        favorites: FakeFavorites,
        viewport: FakeViewport,
        animator: FakeAnimator,
        now: Instant,
    }

    impl World {
        fn new(favorites: &[&str], running: &[&str]) -> Self {
            Self {
                apps: FakeApps::running(running),
                favorites: FakeFavorites::of(favorites),
                viewport: FakeViewport::new(1000.0),
                animator: FakeAnimator::default(),
                now: Instant::now(),
            }
        }

        fn collab(&mut self) -> Collaborators<'_> {
            Collaborators {
                apps: &self.apps,
                favorites: &mut self.favorites,
                viewport: &mut self.viewport,
                animator: &mut self.animator,
            }
        }
    }

    fn shown(world: &mut World) -> Taskbar {
        let mut bar = Taskbar::new(TaskbarSettings::default(), WorkspaceAppCache::shared());
        bar.set_mapped(true);
        settle(&mut bar, world);
        bar
    }

    /// One frame: run pending work, then lay the row out like a box would.
    fn settle(bar: &mut Taskbar, world: &mut World) {
        let now = world.now;
        bar.tick(now, &mut world.collab());
        let mut x = 0.0;
        let layout: Vec<(ItemId, bool, bool)> = bar
            .store()
            .items()
            .map(|item| (item.id, item.visible, item.is_separator()))
            .collect();
        for (id, visible, separator) in layout {
            let width = match (visible, separator) {
                (false, _) => 0.0,
                (true, true) => 10.0,
                (true, false) => WIDTH,
            };
            bar.item_allocated(id, Rect::new(x, 0.0, width, 40.0), now);
            x += width;
        }
        bar.tick(now, &mut world.collab());
    }

    fn labels(bar: &Taskbar) -> Vec<String> {
        bar.items()
            .map(|item| match item.app() {
                Some(app) if item.is_favorite() => format!("*{app}"),
                Some(app) => app.clone(),
                None => "|".to_string(),
            })
            .collect()
    }

    fn item(bar: &Taskbar, app: &str) -> ItemId {
        bar.store().find_app_item(app).map(|item| item.id).expect("item")
    }

    fn assert_unique(bar: &Taskbar) {
        let mut seen = HashSet::new();
        for app in bar.store().app_items().filter_map(Item::app) {
            assert!(seen.insert(app.clone()), "two items for {app}");
        }
    }

    #[test]
    fn first_render_builds_favorites_separator_running() {
        let mut world = World::new(&["a", "b"], &["b", "c"]);
        let bar = shown(&mut world);
        assert_eq!(labels(&bar), vec!["*a", "*b", "|", "c"]);
        let report = bar.last_report().expect("report");
        assert_eq!(report.created.len(), 3);
        assert_eq!(bar.total_width(), 3.0 * WIDTH + 10.0);
        assert_eq!(world.animator.last_width(), Some(3.0 * WIDTH + 10.0));
        assert!(!bar.has_pending_work());
    }

    #[test]
    fn dropping_running_item_on_first_favorite_pins_it() {
        let mut world = World::new(&["a", "b"], &["b", "c"]);
        let mut bar = shown(&mut world);
        let c = item(&bar, "c");

        let now = world.now;
        bar.drag_over(DragPayload::Item(c), 20.0, now, &mut world.collab());
        assert!(bar.candidate().is_some());
        assert_unique_apps_outside_candidate(&bar);

        let effect = bar.handle_drop(now, &mut world.collab()).expect("drop");
        assert_eq!(
            effect,
            DropEffect::Pinned {
                app: "c".into(),
                position: 0
            }
        );
        assert_eq!(world.favorites.apps, apps(&["c", "a", "b"]));

        settle(&mut bar, &mut world);
        assert_eq!(labels(&bar), vec!["*c", "*a", "*b"]);
        let separator = bar.store().separator_id().expect("separator");
        assert_eq!(bar.store().index_of(separator), Some(3));
        assert_unique(&bar);
        assert_eq!(bar.drag_phase(), DragPhase::Idle);
    }

    fn assert_unique_apps_outside_candidate(bar: &Taskbar) {
        let mut seen = HashSet::new();
        for app in bar
            .store()
            .app_items()
            .filter(|item| !item.candidate)
            .filter_map(Item::app)
        {
            assert!(seen.insert(app.clone()));
        }
    }

    #[test]
    fn external_drag_leaving_the_bar_changes_nothing() {
        let mut world = World::new(&["a", "b"], &["c"]);
        let mut bar = shown(&mut world);
        let before = labels(&bar);
        let now = world.now;

        let candidate = bar
            .drag_over(DragPayload::App("d".into()), 150.0, now, &mut world.collab())
            .expect("candidate");
        assert!(bar.store().is_valid(candidate));
        let container = Rect::new(0.0, 0.0, 160.0, 40.0);
        assert!(bar.drag_motion(Rect::new(150.0, 80.0, 30.0, 30.0), container, now));

        assert_eq!(bar.handle_drop(now, &mut world.collab()), Err(Rejection::NoCandidate));
        settle(&mut bar, &mut world);
        assert_eq!(labels(&bar), before);
        assert_eq!(world.favorites.apps, apps(&["a", "b"]));
    }

    #[test]
    fn losing_the_drag_visual_discards_the_candidate() {
        let mut world = World::new(&["a"], &["c"]);
        let mut bar = shown(&mut world);
        let now = world.now;

        let candidate = bar
            .drag_over(DragPayload::App("d".into()), 20.0, now, &mut world.collab())
            .expect("candidate");
        bar.drag_actor_destroyed(now);
        assert!(!bar.store().is_valid(candidate));
        assert_eq!(bar.drag_phase(), DragPhase::Cancelled);
        assert_eq!(bar.handle_drop(now, &mut world.collab()), Err(Rejection::NoCandidate));

        settle(&mut bar, &mut world);
        assert_eq!(bar.drag_phase(), DragPhase::Idle);
        assert_eq!(labels(&bar), vec!["*a", "|", "c"]);
        assert_eq!(world.favorites.apps, apps(&["a"]));
    }

    #[test]
    fn rejected_favorite_keeps_running_list() {
        let mut world = World::new(&["a", "b"], &["c"]);
        world.favorites.blocked.insert("c".into());
        let mut bar = shown(&mut world);
        let c = item(&bar, "c");
        let now = world.now;

        bar.drag_over(DragPayload::Item(c), 60.0, now, &mut world.collab());
        let candidate = bar.candidate().expect("candidate");
        assert_eq!(
            bar.handle_drop(now, &mut world.collab()),
            Err(Rejection::FavoriteRejected("c".into()))
        );
        assert!(!bar.store().is_valid(candidate));
        settle(&mut bar, &mut world);
        assert_eq!(labels(&bar), vec!["*a", "*b", "|", "c"]);
        assert_eq!(world.favorites.apps, apps(&["a", "b"]));
    }

    #[test]
    fn dropping_a_favorite_past_the_separator_unpins_it() {
        let mut world = World::new(&["a", "b"], &["b", "c"]);
        let mut bar = shown(&mut world);
        let b = item(&bar, "b");
        let now = world.now;

        bar.drag_over(DragPayload::Item(b), 200.0, now, &mut world.collab());
        let effect = bar.handle_drop(now, &mut world.collab()).expect("drop");
        assert_eq!(effect, DropEffect::Unpinned { app: "b".into() });

        settle(&mut bar, &mut world);
        assert_eq!(labels(&bar), vec!["*a", "|", "c", "b"]);
        assert_unique(&bar);
    }

    #[test]
    fn favorites_only_row_keeps_drops_past_the_end_pinned() {
        let mut world = World::new(&["a", "b"], &[]);
        let mut bar = shown(&mut world);
        assert_eq!(labels(&bar), vec!["*a", "*b"]);
        let a = item(&bar, "a");
        let now = world.now;

        // a[0,50) b[50,100), hidden separator at 100 with no width.
        bar.drag_over(DragPayload::Item(a), 120.0, now, &mut world.collab());
        let effect = bar.handle_drop(now, &mut world.collab()).expect("drop");
        assert_eq!(
            effect,
            DropEffect::MovedFavorite {
                app: "a".into(),
                position: 1
            }
        );
        assert_eq!(world.favorites.apps, apps(&["b", "a"]));
        settle(&mut bar, &mut world);
        assert_eq!(labels(&bar), vec!["*b", "*a"]);

        bar.drag_over(DragPayload::App("d".into()), 150.0, now, &mut world.collab());
        let effect = bar.handle_drop(now, &mut world.collab()).expect("drop");
        assert_eq!(
            effect,
            DropEffect::Pinned {
                app: "d".into(),
                position: 2
            }
        );
        settle(&mut bar, &mut world);
        assert_eq!(labels(&bar), vec!["*b", "*a", "*d"]);
        assert_unique(&bar);
    }

    #[test]
    fn reordering_running_items_sticks_across_rerenders() {
        let mut world = World::new(&["a"], &["c", "d", "e"]);
        let mut bar = shown(&mut world);
        assert_eq!(labels(&bar), vec!["*a", "|", "c", "d", "e"]);
        let e = item(&bar, "e");
        let now = world.now;

        // a[0,50) |[50,60) c[60,110) d[110,160) e[160,210)
        bar.drag_over(DragPayload::Item(e), 70.0, now, &mut world.collab());
        let effect = bar.handle_drop(now, &mut world.collab()).expect("drop");
        assert_eq!(
            effect,
            DropEffect::ReorderedRunning {
                workspace: 0,
                apps: apps(&["e", "c", "d"])
            }
        );
        settle(&mut bar, &mut world);
        assert_eq!(labels(&bar), vec!["*a", "|", "e", "c", "d"]);

        world.apps.running = Some(apps(&["c", "d", "e", "f"]));
        bar.request_rerender();
        settle(&mut bar, &mut world);
        assert_eq!(labels(&bar), vec!["*a", "|", "e", "c", "d", "f"]);
    }

    #[test]
    fn rerender_waits_for_the_drag_to_finish() {
        let mut world = World::new(&["a"], &["c"]);
        let mut bar = shown(&mut world);
        let now = world.now;

        bar.drag_over(DragPayload::App("x".into()), 500.0, now, &mut world.collab());
        world.apps.running = Some(apps(&["c", "d"]));
        assert!(bar.request_rerender());
        bar.tick(now, &mut world.collab());
        assert!(bar.has_pending_work());
        assert!(bar.store().find_app_item("d").is_none());
        assert!(bar.candidate().is_some());

        bar.cancel_drag(now);
        settle(&mut bar, &mut world);
        assert_eq!(labels(&bar), vec!["*a", "|", "c", "d"]);
    }

    #[test]
    fn drag_scrolls_toward_the_hovered_item() {
        let mut world = World::new(&[], &["a", "b", "c", "d"]);
        world.viewport = FakeViewport::new(100.0);
        world.viewport.scroll_size = 200.0;
        let mut bar = shown(&mut world);
        let now = world.now;

        let hovered = bar.drag_over(DragPayload::App("z".into()), 180.0, now, &mut world.collab());
        assert!(hovered.is_some());
        assert_eq!(world.viewport.requests.last(), Some(&50.0));
    }

    #[test]
    fn destroyed_taskbar_ignores_further_work() {
        let mut world = World::new(&["a"], &["c"]);
        let mut bar = shown(&mut world);
        let requests = world.animator.requests.len();
        bar.destroy();

        assert!(!bar.request_rerender());
        let now = world.now;
        assert_eq!(
            bar.drag_over(DragPayload::App("x".into()), 0.0, now, &mut world.collab()),
            None
        );
        bar.tick(now, &mut world.collab());
        assert_eq!(world.animator.requests.len(), requests);
    }
}
