use super::collab::{AnimationTarget, Animator, Easing, Viewport};
use super::item::{AppId, ItemId};
use super::task::{Completion, Debounce, Generation};
use indexmap::IndexMap;
use log::debug;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Items of one app counted toward the total width.
pub const DUPLICATE_THRESHOLD: usize = 2;

const IDLE_DELAY: Duration = Duration::ZERO;
const DRAG_DELAY: Duration = Duration::from_millis(150);
const IDLE_DURATION: Duration = Duration::from_millis(250);
const DRAG_DURATION: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
struct Entry {
    app: Option<AppId>,
    width: f32,
}

enum Stage {
    Scrolling(Completion),
    Resizing(Completion),
}

struct Job {
    token: u64,
    width: f32,
    duration: Duration,
    stage: Stage,
}

/// Sums item widths into the container width and applies it after the
/// viewport has scrolled back into range.
pub struct AllocationManager {
    entries: IndexMap<ItemId, Entry>,
    debounce: Debounce,
    generation: Generation,
    job: Option<Job>,
    applied_width: f32,
    alive: bool,
}

impl Default for AllocationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationManager {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            debounce: Debounce::default(),
            generation: Generation::default(),
            job: None,
            applied_width: 0.0,
            alive: true,
        }
    }

    pub fn add(
        &mut self,
        id: ItemId,
        app: Option<AppId>,
        width: f32,
        now: Instant,
        dragging: bool,
    ) {
        if !self.alive {
            return;
        }
        let width = if width.is_finite() { width.max(0.0) } else { 0.0 };
        self.entries.insert(id, Entry { app, width });
        self.schedule(now, dragging);
    }

    pub fn remove(&mut self, id: ItemId, now: Instant, dragging: bool) {
        if !self.alive {
            return;
        }
        if self.entries.shift_remove(&id).is_some() {
            self.schedule(now, dragging);
        }
    }

    fn schedule(&mut self, now: Instant, dragging: bool) {
        let delay = if dragging { DRAG_DELAY } else { IDLE_DELAY };
        self.debounce.schedule(now, delay);
    }

    pub fn is_scheduled(&self) -> bool {
        self.debounce.is_scheduled()
    }

    pub fn is_updating(&self) -> bool {
        self.job.is_some()
    }

    pub fn total_width(&self) -> f32 {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut total = 0.0;
        for entry in self.entries.values() {
            if let Some(app) = &entry.app {
                let count = seen.entry(app.as_str()).or_insert(0);
                *count += 1;
                if *count > DUPLICATE_THRESHOLD {
                    continue;
                }
            }
            total += entry.width;
        }
        total
    }

    /// Width most recently handed to the animator.
    pub fn applied_width(&self) -> f32 {
        self.applied_width
    }

    pub fn tick(
        &mut self,
        now: Instant,
        viewport: &mut dyn Viewport,
        animator: &mut dyn Animator,
        dragging: bool,
    ) {
        if !self.alive {
            return;
        }
        if self.debounce.take_due(now) {
            self.update(viewport, animator, dragging);
        }
        self.advance(animator);
    }

    pub fn update(
        &mut self,
        viewport: &mut dyn Viewport,
        animator: &mut dyn Animator,
        dragging: bool,
    ) {
        if !self.alive {
            return;
        }
        let token = self.generation.bump();
        let width = self.total_width();
        let offset = (width - viewport.page_size()).max(0.0);
        let duration = duration_for(width, viewport, dragging);

        if viewport.scroll_position() > offset {
            if let Some(pending) = viewport.scroll_to_position(offset, true) {
                debug!("allocation {token}: scrolling to {offset} before resizing to {width}");
                self.job = Some(Job {
                    token,
                    width,
                    duration,
                    stage: Stage::Scrolling(pending),
                });
                return;
            }
        }
        self.apply(token, width, duration, animator);
    }

    fn apply(&mut self, token: u64, width: f32, duration: Duration, animator: &mut dyn Animator) {
        if !self.generation.is_current(token) {
            debug!("allocation {token} superseded before resizing");
            return;
        }
        let pending = animator.animate(
            AnimationTarget::ContainerWidth(width),
            duration,
            Easing::EaseOutQuad,
        );
        self.applied_width = width;
        self.job = Some(Job {
            token,
            width,
            duration,
            stage: Stage::Resizing(pending),
        });
    }

    fn advance(&mut self, animator: &mut dyn Animator) {
        let Some(job) = self.job.take() else {
            return;
        };
        let resolved = match &job.stage {
            Stage::Scrolling(pending) | Stage::Resizing(pending) => pending.poll(),
        };
        let Some(finished) = resolved else {
            self.job = Some(job);
            return;
        };
        match job.stage {
            // Superseded scrolls still release the resize; only a newer
            // generation cancels it.
            Stage::Scrolling(_) => {
                self.apply(job.token, job.width, job.duration, animator);
                self.advance(animator);
            }
            Stage::Resizing(_) => {
                if finished {
                    debug!("allocation {}: container settled at {}", job.token, job.width);
                }
            }
        }
    }

    /// Detaches the manager. Outstanding scroll and animation results are
    /// ignored from here on.
    pub fn destroy(&mut self) {
        self.alive = false;
        self.job = None;
        self.debounce.cancel();
        self.entries.clear();
    }
}

fn duration_for(width: f32, viewport: &dyn Viewport, dragging: bool) -> Duration {
    if width > viewport.scroll_size().max(viewport.page_size()) {
        return Duration::ZERO;
    }
    if dragging {
        DRAG_DURATION
    } else {
        IDLE_DURATION
    }
}

#[cfg(test)]
mod tests {
    use super::super::item::ItemStore;
    use super::super::testing::{FakeAnimator, FakeViewport};
    use super::*;

    fn ids(count: usize) -> Vec<ItemId> {
        let mut store = ItemStore::new();
        (0..count)
            .map(|n| store.create_app(format!("app{n}"), false))
            .collect()
    }

    #[test]
    fn duplicates_beyond_threshold_are_not_counted() {
        let now = Instant::now();
        let mut manager = AllocationManager::new();
        let items = ids(7);
        for id in &items[..5] {
            manager.add(*id, Some("term".into()), 40.0, now, false);
        }
        assert_eq!(manager.total_width(), 2.0 * 40.0);

        manager.add(items[5], Some("files".into()), 40.0, now, false);
        manager.add(items[6], None, 10.0, now, false);
        assert_eq!(manager.total_width(), 130.0);
    }

    #[test]
    fn bursts_coalesce_into_one_update() {
        let start = Instant::now();
        let mut manager = AllocationManager::new();
        let mut viewport = FakeViewport::new(1000.0);
        let mut animator = FakeAnimator::default();

        for (n, id) in ids(3).into_iter().enumerate() {
            let at = start + Duration::from_millis(20 * n as u64);
            manager.add(id, Some(format!("app{n}")), 50.0, at, true);
        }
        manager.tick(start + Duration::from_millis(100), &mut viewport, &mut animator, true);
        assert!(animator.requests.is_empty());

        manager.tick(start + Duration::from_millis(200), &mut viewport, &mut animator, true);
        assert_eq!(animator.requests.len(), 1);
        assert_eq!(animator.last_width(), Some(150.0));
        assert_eq!(animator.last_duration(), Some(DRAG_DURATION));
        assert!(!manager.is_updating());
    }

    #[test]
    fn idle_updates_run_on_the_next_tick() {
        let now = Instant::now();
        let mut manager = AllocationManager::new();
        let mut viewport = FakeViewport::new(1000.0);
        let mut animator = FakeAnimator::default();
        let id = ids(1)[0];

        manager.add(id, Some("a".into()), 60.0, now, false);
        manager.tick(now, &mut viewport, &mut animator, false);
        assert_eq!(animator.last_width(), Some(60.0));
        assert_eq!(animator.last_duration(), Some(IDLE_DURATION));

        manager.remove(id, now, false);
        manager.remove(id, now, false);
        manager.tick(now, &mut viewport, &mut animator, false);
        assert_eq!(animator.last_width(), Some(0.0));
        assert_eq!(animator.requests.len(), 2);
    }

    #[test]
    fn shrinking_scrolls_back_before_resizing() {
        let now = Instant::now();
        let mut manager = AllocationManager::new();
        let mut viewport = FakeViewport::new(100.0);
        viewport.instant = false;
        viewport.scroll_size = 300.0;
        viewport.position = 200.0;
        let mut animator = FakeAnimator::default();

        let items = ids(3);
        for (n, id) in items.iter().enumerate() {
            manager.add(*id, Some(format!("app{n}")), 100.0, now, false);
        }
        manager.update(&mut viewport, &mut animator, false);
        assert_eq!(animator.last_width(), Some(300.0));

        manager.remove(items[2], now, false);
        manager.tick(now, &mut viewport, &mut animator, false);
        assert_eq!(viewport.requests, vec![100.0]);
        assert_eq!(animator.requests.len(), 1);
        assert!(manager.is_updating());

        viewport.finish_scroll();
        manager.tick(now, &mut viewport, &mut animator, false);
        assert_eq!(animator.last_width(), Some(200.0));
    }

    #[test]
    fn newer_update_abandons_the_outstanding_one() {
        let now = Instant::now();
        let mut manager = AllocationManager::new();
        let mut viewport = FakeViewport::new(100.0);
        viewport.instant = false;
        viewport.scroll_size = 300.0;
        viewport.position = 200.0;
        let mut animator = FakeAnimator::default();

        let items = ids(3);
        for (n, id) in items.iter().enumerate() {
            manager.add(*id, Some(format!("app{n}")), 100.0, now, false);
        }
        manager.remove(items[2], now, false);
        manager.tick(now, &mut viewport, &mut animator, false);
        manager.remove(items[1], now, false);
        manager.tick(now, &mut viewport, &mut animator, false);
        assert_eq!(viewport.requests, vec![100.0, 0.0]);

        viewport.finish_scroll();
        manager.tick(now, &mut viewport, &mut animator, false);
        assert_eq!(animator.requests.len(), 1);
        assert_eq!(animator.last_width(), Some(100.0));
    }

    #[test]
    fn overflowing_width_is_applied_without_animation() {
        let now = Instant::now();
        let mut manager = AllocationManager::new();
        let mut viewport = FakeViewport::new(100.0);
        let mut animator = FakeAnimator::default();
        for (n, id) in ids(3).into_iter().enumerate() {
            manager.add(id, Some(format!("app{n}")), 50.0, now, false);
        }
        manager.tick(now, &mut viewport, &mut animator, false);
        assert_eq!(animator.last_duration(), Some(Duration::ZERO));
    }

    #[test]
    fn destroyed_manager_ignores_late_results() {
        let now = Instant::now();
        let mut manager = AllocationManager::new();
        let mut viewport = FakeViewport::new(100.0);
        viewport.instant = false;
        viewport.position = 100.0;
        let mut animator = FakeAnimator::default();
        let id = ids(1)[0];

        manager.add(id, Some("a".into()), 50.0, now, false);
        manager.tick(now, &mut viewport, &mut animator, false);
        assert!(manager.is_updating());

        manager.destroy();
        viewport.finish_scroll();
        manager.tick(now, &mut viewport, &mut animator, false);
        manager.add(id, Some("a".into()), 50.0, now, false);
        assert!(animator.requests.is_empty());
        assert!(!manager.is_scheduled());
    }
}
