use log::debug;
use std::collections::HashMap;

pub type AppId = String;
pub type WorkspaceId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.x && x < self.right()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    App { app: AppId, favorite: bool },
    Separator,
}

/// One child of the taskbar container.
///
/// `rect` is written by the rendering layer; the engine only reads it.
/// Once `valid` is false the item is a tombstone waiting to be drained.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub rect: Rect,
    pub valid: bool,
    pub mapped: bool,
    pub visible: bool,
    pub candidate: bool,
}

impl Item {
    pub fn app(&self) -> Option<&AppId> {
        match &self.kind {
            ItemKind::App { app, .. } => Some(app),
            ItemKind::Separator => None,
        }
    }

    pub fn is_favorite(&self) -> bool {
        matches!(self.kind, ItemKind::App { favorite: true, .. })
    }

    pub fn is_separator(&self) -> bool {
        matches!(self.kind, ItemKind::Separator)
    }
}

pub struct ItemStore {
    items: HashMap<ItemId, Item>,
    order: Vec<ItemId>,
    separator: Option<ItemId>,
    destroyed: Vec<ItemId>,
    next_id: u64,
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            order: Vec::new(),
            separator: None,
            destroyed: Vec::new(),
            next_id: 1,
        }
    }

    fn alloc(&mut self, kind: ItemKind, candidate: bool) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.items.insert(
            id,
            Item {
                id,
                kind,
                rect: Rect::default(),
                valid: true,
                mapped: false,
                visible: true,
                candidate,
            },
        );
        id
    }

    /// Creates a persistent app item. It is not placed in the order; the
    /// reconciler sets the final sequence in one go.
    pub fn create_app(&mut self, app: AppId, favorite: bool) -> ItemId {
        let id = self.alloc(ItemKind::App { app, favorite }, false);
        debug!("created item {} (favorite: {})", id.raw(), favorite);
        id
    }

    pub fn create_candidate(&mut self, app: AppId, favorite: bool, index: usize) -> ItemId {
        let id = self.alloc(ItemKind::App { app, favorite }, true);
        self.insert_at(index, id);
        id
    }

    /// The separator is created lazily and lives as long as the store.
    pub fn separator(&mut self) -> ItemId {
        if let Some(id) = self.separator {
            return id;
        }
        let id = self.alloc(ItemKind::Separator, false);
        self.separator = Some(id);
        id
    }

    pub fn separator_id(&self) -> Option<ItemId> {
        self.separator
    }

    pub fn destroy(&mut self, id: ItemId) -> bool {
        let Some(item) = self.items.get_mut(&id) else {
            return false;
        };
        if !item.valid {
            return false;
        }
        item.valid = false;
        self.order.retain(|other| *other != id);
        if self.separator == Some(id) {
            self.separator = None;
        }
        self.destroyed.push(id);
        debug!("destroyed item {}", id.raw());
        true
    }

    /// Hands out the ids destroyed since the last call and forgets their
    /// tombstones.
    pub fn drain_destroyed(&mut self) -> Vec<ItemId> {
        let drained = std::mem::take(&mut self.destroyed);
        for id in &drained {
            self.items.remove(id);
        }
        drained
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id).filter(|item| item.valid)
    }

    pub fn is_valid(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    pub fn app_of(&self, id: ItemId) -> Option<&AppId> {
        self.get(id).and_then(Item::app)
    }

    pub fn order(&self) -> &[ItemId] {
        &self.order
    }

    pub fn set_order(&mut self, order: Vec<ItemId>) -> bool {
        let order: Vec<ItemId> = order.into_iter().filter(|id| self.is_valid(*id)).collect();
        if order == self.order {
            return false;
        }
        self.order = order;
        true
    }

    pub fn insert_at(&mut self, index: usize, id: ItemId) {
        if !self.is_valid(id) {
            return;
        }
        self.order.retain(|other| *other != id);
        let index = index.min(self.order.len());
        self.order.insert(index, id);
    }

    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.order.iter().position(|other| *other == id)
    }

    pub fn set_visible(&mut self, id: ItemId, visible: bool) {
        if let Some(item) = self.items.get_mut(&id).filter(|item| item.valid) {
            item.visible = visible;
        }
    }

    /// Records the bounds reported by the rendering layer. Returns true on the
    /// first report, which is when the item counts as mapped.
    pub fn set_rect(&mut self, id: ItemId, rect: Rect) -> bool {
        let Some(item) = self.items.get_mut(&id).filter(|item| item.valid) else {
            return false;
        };
        item.rect = rect;
        let first = !item.mapped;
        item.mapped = true;
        first
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.order.iter().filter_map(|id| self.get(*id))
    }

    pub fn app_items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items().filter(|item| !item.is_separator())
    }

    pub fn find_app_item(&self, app: &str) -> Option<&Item> {
        self.app_items()
            .find(|item| !item.candidate && item.app().map(String::as_str) == Some(app))
    }
}
