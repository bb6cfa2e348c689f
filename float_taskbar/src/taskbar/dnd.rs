use super::error::Rejection;
use super::item::{AppId, ItemId, ItemStore, Rect};
use log::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPayload {
    /// An application dragged in from outside the taskbar.
    App(AppId),
    /// One of our own items.
    Item(ItemId),
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging,
    Dropped,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub item: ItemId,
    pub rect: Rect,
}

#[derive(Debug)]
struct DragSession {
    app: Option<AppId>,
    source: Option<ItemId>,
    slots: Vec<Slot>,
    candidate: Option<ItemId>,
    candidate_position: usize,
    separator: Option<ItemId>,
    /// Zone of every position when no separator bounds the favorites.
    open_zone_favorite: bool,
}

/// Result of a drop, computed from the slot order at release time.
#[derive(Debug, Clone, PartialEq)]
pub struct DropOutcome {
    pub app: AppId,
    pub candidate: ItemId,
    pub source: Option<ItemId>,
    /// Slot items left to right, separator excluded, candidate standing in for
    /// every other item bound to the same app.
    pub ordered: Vec<ItemId>,
    pub apps: Vec<AppId>,
    pub position: usize,
    /// Number of `ordered` entries that precede the separator.
    pub separator_index: Option<usize>,
    pub favorite_zone: bool,
}

impl DropOutcome {
    /// Index among favorites the dropped app should take.
    pub fn favorite_position(&self) -> usize {
        self.position.min(self.separator_index.unwrap_or(self.position))
    }

    /// Apps of the running section, in their dropped order.
    pub fn running_apps(&self) -> &[AppId] {
        let start = self.separator_index.unwrap_or(0).min(self.apps.len());
        &self.apps[start..]
    }
}

/// First slot whose right edge lies beyond `x`; the slot count when `x` is
/// past every slot.
pub fn resolve_position(slots: &[Slot], x: f32) -> usize {
    slots
        .iter()
        .position(|slot| x < slot.rect.right())
        .unwrap_or(slots.len())
}

pub struct DragDropController {
    phase: DragPhase,
    session: Option<DragSession>,
}

impl Default for DragDropController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragDropController {
    pub fn new() -> Self {
        Self {
            phase: DragPhase::Idle,
            session: None,
        }
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == DragPhase::Dragging
    }

    pub fn candidate(&self) -> Option<ItemId> {
        self.session.as_ref().and_then(|session| session.candidate)
    }

    pub fn candidate_position(&self) -> Option<usize> {
        self.session
            .as_ref()
            .filter(|session| session.candidate.is_some())
            .map(|session| session.candidate_position)
    }

    pub fn slots(&self) -> &[Slot] {
        self.session
            .as_ref()
            .map(|session| session.slots.as_slice())
            .unwrap_or(&[])
    }

    pub fn slot_rect(&self, id: ItemId) -> Option<Rect> {
        self.slots()
            .iter()
            .find(|slot| slot.item == id)
            .map(|slot| slot.rect)
    }

    pub fn source(&self) -> Option<ItemId> {
        self.session.as_ref().and_then(|session| session.source)
    }

    /// Starts a session from a drag-over notification. The slot index is a
    /// snapshot of the valid items; the separator joins it only when it sits
    /// between favorites and running apps. A favorites-only row treats every
    /// position as the favorites zone.
    pub fn begin(&mut self, payload: DragPayload, store: &ItemStore) {
        if self.is_dragging() {
            return;
        }
        let (app, source, external) = match payload {
            DragPayload::App(app) => (Some(app), None, true),
            DragPayload::Item(id) => match store.get(id) {
                Some(item) => (item.app().cloned(), Some(id), false),
                None => {
                    debug!("drag started from {}", Rejection::StaleItem(id));
                    (None, None, false)
                }
            },
            DragPayload::Other(kind) => {
                debug!("{}", Rejection::InvalidDropTarget(kind));
                (None, None, true)
            }
        };

        let has_favorites = store
            .app_items()
            .any(|item| item.is_favorite() && !item.candidate);
        let has_running = store
            .app_items()
            .any(|item| !item.is_favorite() && !item.candidate);
        let separator = store
            .separator_id()
            .filter(|_| has_favorites && has_running);
        let open_zone_favorite = external || (has_favorites && !has_running);
        let slots = store
            .items()
            .filter(|item| !item.is_separator() || Some(item.id) == separator)
            .map(|item| Slot {
                item: item.id,
                rect: item.rect,
            })
            .collect();

        let mut session = DragSession {
            app,
            source,
            slots,
            candidate: None,
            candidate_position: 0,
            separator,
            open_zone_favorite,
        };
        session.sort_slots();
        debug!("drag session started with {} slots", session.slots.len());
        self.session = Some(session);
        self.phase = DragPhase::Dragging;
    }

    /// Places the candidate for pointer position `x` and returns the item now
    /// occupying the resolved position.
    pub fn handle_drag(&mut self, x: f32, store: &mut ItemStore) -> Option<ItemId> {
        if !self.is_dragging() {
            return None;
        }
        let session = self.session.as_mut()?;
        let Some(app) = session.app.clone() else {
            return None;
        };
        session.prune(store);

        let mut position = resolve_position(&session.slots, x);
        let target_index = session
            .source
            .and_then(|source| session.index_of(source));

        // Over the last real slot right after the dragged item: the only
        // move left is past it.
        if let Some(target) = target_index {
            if position > 0
                && target + 1 == position
                && session.last_real_slot() == Some(position)
            {
                position += 1;
            }
        }

        if let Some(target) = target_index {
            if target == position || target + 1 == position {
                session.drop_candidate(store);
                return session.source;
            }
        }

        if let Some(candidate) = session.candidate {
            if let Some(current) = session.index_of(candidate) {
                // `current + 1` is the slot right after the candidate: inserting
                // there would land it where it already stands, so it stays.
                if current == position || current + 1 == position {
                    session.candidate_position = current;
                    return Some(candidate);
                }
                session.slots.remove(current);
                store.destroy(candidate);
                session.candidate = None;
                if current < position {
                    position -= 1;
                }
            }
        }

        let favorite = session.favorite_zone(position);
        let store_index = session.store_index(position, store);
        let candidate = store.create_candidate(app, favorite, store_index);
        let rect = session.synthetic_rect(position);
        session.slots.insert(
            position,
            Slot {
                item: candidate,
                rect,
            },
        );
        session.candidate = Some(candidate);
        session.candidate_position = position;
        debug!(
            "candidate {} placed at slot {} (favorite: {})",
            candidate.raw(),
            position,
            favorite
        );
        Some(candidate)
    }

    /// Follows the dragged visual. Returns true when it left the container
    /// and the candidate was discarded.
    pub fn track_actor(&mut self, actor: Rect, container: Rect, store: &mut ItemStore) -> bool {
        if !self.is_dragging() || actor.intersects(&container) {
            return false;
        }
        match self.session.as_mut() {
            Some(session) if session.candidate.is_some() => {
                session.drop_candidate(store);
                debug!("drag left the taskbar, candidate discarded");
                true
            }
            _ => false,
        }
    }

    pub fn handle_drop(&mut self, store: &mut ItemStore) -> Result<DropOutcome, Rejection> {
        if !self.is_dragging() {
            return Err(Rejection::NoCandidate);
        }
        self.phase = DragPhase::Dropped;
        let Some(mut session) = self.session.take() else {
            return Err(Rejection::NoCandidate);
        };
        session.prune(store);
        let (Some(candidate), Some(app)) = (session.candidate, session.app.clone()) else {
            return Err(Rejection::NoCandidate);
        };

        let mut ordered = Vec::with_capacity(session.slots.len());
        let mut apps = Vec::with_capacity(session.slots.len());
        let mut separator_index = None;
        for slot in &session.slots {
            if Some(slot.item) == session.separator {
                separator_index = Some(ordered.len());
                continue;
            }
            let Some(slot_app) = store.app_of(slot.item) else {
                continue;
            };
            if slot.item != candidate && *slot_app == app {
                continue;
            }
            ordered.push(slot.item);
            apps.push(slot_app.clone());
        }
        let position = ordered
            .iter()
            .position(|id| *id == candidate)
            .unwrap_or(ordered.len());
        let favorite_zone = match separator_index {
            Some(index) => position < index,
            None => session.open_zone_favorite,
        };

        Ok(DropOutcome {
            app,
            candidate,
            source: session.source,
            ordered,
            apps,
            position,
            separator_index,
            favorite_zone,
        })
    }

    /// Discards the candidate and the slot index. Safe in any phase.
    pub fn cancel(&mut self, store: &mut ItemStore) {
        if let Some(mut session) = self.session.take() {
            session.drop_candidate(store);
        }
        if self.phase == DragPhase::Dragging {
            self.phase = DragPhase::Cancelled;
        }
    }

    pub fn actor_destroyed(&mut self, store: &mut ItemStore) {
        self.cancel(store);
    }

    /// Returns a finished gesture to idle.
    pub fn settle(&mut self) -> bool {
        match self.phase {
            DragPhase::Dropped | DragPhase::Cancelled => {
                self.phase = DragPhase::Idle;
                true
            }
            _ => false,
        }
    }
}

impl DragSession {
    fn index_of(&self, id: ItemId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.item == id)
    }

    fn sort_slots(&mut self) {
        self.slots
            .sort_by(|a, b| a.rect.x.partial_cmp(&b.rect.x).unwrap_or(std::cmp::Ordering::Equal));
    }

    /// Drops slots of destroyed items and picks up fresh geometry for the
    /// rest. Unmapped slots keep their synthetic rectangles.
    fn prune(&mut self, store: &ItemStore) {
        self.slots.retain(|slot| store.is_valid(slot.item));
        if self.candidate.is_some_and(|candidate| !store.is_valid(candidate)) {
            self.candidate = None;
        }
        for slot in &mut self.slots {
            if let Some(item) = store.get(slot.item).filter(|item| item.mapped) {
                slot.rect = item.rect;
            }
        }
        self.sort_slots();
    }

    fn last_real_slot(&self) -> Option<usize> {
        self.slots
            .iter()
            .rposition(|slot| Some(slot.item) != self.candidate)
    }

    fn drop_candidate(&mut self, store: &mut ItemStore) {
        if let Some(candidate) = self.candidate.take() {
            self.slots.retain(|slot| slot.item != candidate);
            store.destroy(candidate);
        }
    }

    fn favorite_zone(&self, position: usize) -> bool {
        match self.separator.and_then(|separator| self.index_of(separator)) {
            Some(separator) => position <= separator,
            None => self.open_zone_favorite,
        }
    }

    fn store_index(&self, position: usize, store: &ItemStore) -> usize {
        if let Some(slot) = self.slots.get(position) {
            return store.index_of(slot.item).unwrap_or(store.order().len());
        }
        self.slots
            .last()
            .and_then(|slot| store.index_of(slot.item))
            .map(|index| index + 1)
            .unwrap_or(store.order().len())
    }

    fn synthetic_rect(&self, position: usize) -> Rect {
        match self.slots.get(position) {
            Some(slot) => Rect::new(slot.rect.x, slot.rect.y, 0.0, slot.rect.height),
            None => self
                .slots
                .last()
                .map(|slot| Rect::new(slot.rect.right(), slot.rect.y, 0.0, slot.rect.height))
                .unwrap_or_default(),
        }
    }
}
