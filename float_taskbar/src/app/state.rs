use crate::taskbar::{
    completion, AnimationTarget, Animator, Completer, Completion, Easing, Viewport,
};
use std::time::{Duration, Instant};

const SCROLL_DURATION: Duration = Duration::from_millis(160);
const TOAST_HOLD: Duration = Duration::from_millis(1600);
const TOAST_FADE: Duration = Duration::from_millis(400);
const GLOW_DURATION: Duration = Duration::from_millis(220);

pub fn ease(easing: Easing, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    match easing {
        Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
        Easing::Linear => t,
    }
}

/// One running transition. Dropping it before the end resolves its
/// completion as superseded.
pub struct Tween {
    from: f32,
    to: f32,
    start: Instant,
    duration: Duration,
    easing: Easing,
    done: Option<Completer>,
}

impl Tween {
    fn new(from: f32, to: f32, start: Instant, duration: Duration, easing: Easing) -> (Self, Completion) {
        let (completer, pending) = completion();
        let tween = Self {
            from,
            to,
            start,
            duration,
            easing,
            done: Some(completer),
        };
        (tween, pending)
    }

    fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        now.saturating_duration_since(self.start).as_secs_f32() / self.duration.as_secs_f32()
    }

    fn value_at(&self, now: Instant) -> f32 {
        self.from + (self.to - self.from) * ease(self.easing, self.progress(now))
    }

    fn finish(mut self) -> f32 {
        if let Some(done) = self.done.take() {
            done.complete(true);
        }
        self.to
    }
}

/// Scroll offset of the item row, driven one frame at a time.
pub struct ScrollViewport {
    offset: f32,
    page: f32,
    content: f32,
    tween: Option<Tween>,
    clock: Instant,
}

impl ScrollViewport {
    pub fn new(now: Instant) -> Self {
        Self {
            offset: 0.0,
            page: 0.0,
            content: 0.0,
            tween: None,
            clock: now,
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    pub fn set_geometry(&mut self, page: f32, content: f32) {
        self.page = page.max(0.0);
        self.content = content.max(0.0);
    }

    /// Adopts an offset the user scrolled to, unless a transition owns it.
    pub fn observe(&mut self, offset: f32) {
        if self.tween.is_none() {
            self.offset = offset.max(0.0);
        }
    }

    /// Returns true while a transition is still running.
    pub fn advance(&mut self, now: Instant) -> bool {
        self.clock = now;
        let Some(tween) = self.tween.take() else {
            return false;
        };
        if tween.progress(now) >= 1.0 {
            self.offset = tween.finish();
            return false;
        }
        self.offset = tween.value_at(now);
        self.tween = Some(tween);
        true
    }
}

impl Viewport for ScrollViewport {
    fn page_size(&self) -> f32 {
        self.page
    }

    fn scroll_size(&self) -> f32 {
        self.content
    }

    fn scroll_position(&self) -> f32 {
        self.offset
    }

    fn scroll_to_position(&mut self, offset: f32, animate: bool) -> Option<Completion> {
        let offset = offset.max(0.0);
        let heading = self.tween.as_ref().map_or(self.offset, |tween| tween.to);
        if (heading - offset).abs() < 0.5 {
            return None;
        }
        if !animate {
            self.tween = None;
            self.offset = offset;
            return Some(Completion::ready(true));
        }
        let (tween, pending) =
            Tween::new(self.offset, offset, self.clock, SCROLL_DURATION, Easing::EaseOutQuad);
        self.tween = Some(tween);
        Some(pending)
    }
}

/// Animated width of the item container.
pub struct WidthAnimator {
    width: f32,
    tween: Option<Tween>,
    clock: Instant,
}

impl WidthAnimator {
    pub fn new(now: Instant) -> Self {
        Self {
            width: 0.0,
            tween: None,
            clock: now,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn advance(&mut self, now: Instant) -> bool {
        self.clock = now;
        let Some(tween) = self.tween.take() else {
            return false;
        };
        if tween.progress(now) >= 1.0 {
            self.width = tween.finish();
            return false;
        }
        self.width = tween.value_at(now);
        self.tween = Some(tween);
        true
    }
}

impl Animator for WidthAnimator {
    fn animate(&mut self, target: AnimationTarget, duration: Duration, easing: Easing) -> Completion {
        let AnimationTarget::ContainerWidth(width) = target;
        if duration.is_zero() {
            self.tween = None;
            self.width = width;
            return Completion::ready(true);
        }
        let (tween, pending) = Tween::new(self.width, width, self.clock, duration, easing);
        self.tween = Some(tween);
        pending
    }
}

/// Short notice drawn over the item row: fully opaque for a moment, then
/// fading out.
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    shown_at: Instant,
}

impl Toast {
    pub fn new(message: String, now: Instant) -> Self {
        Self {
            message,
            shown_at: now,
        }
    }

    /// `None` once the toast has gone.
    pub fn opacity(&self, now: Instant) -> Option<f32> {
        let age = now.saturating_duration_since(self.shown_at);
        if age < TOAST_HOLD {
            return Some(1.0);
        }
        let fading = (age - TOAST_HOLD).as_secs_f32() / TOAST_FADE.as_secs_f32();
        (fading < 1.0).then(|| 1.0 - ease(Easing::EaseOutQuad, fading))
    }
}

/// Border glow shown when the bar appears or comes back from being
/// minimized.
#[derive(Debug, Clone, Copy)]
pub struct Glow {
    start: Instant,
}

impl Glow {
    pub fn new(now: Instant) -> Self {
        Self { start: now }
    }

    pub fn alpha(&self, now: Instant) -> Option<u8> {
        let t = now.saturating_duration_since(self.start).as_secs_f32()
            / GLOW_DURATION.as_secs_f32();
        (t < 1.0).then(|| ((1.0 - t) * 96.0) as u8)
    }
}
