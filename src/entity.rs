use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::Rect;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity token of an [`Entity`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Allocates a process-wide unique id.
    pub fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callback carried alongside an entity. The tree never calls it.
pub type Action = Arc<dyn Fn() + Send + Sync>;

/// A bounding box stored in the tree.
///
/// Two entities are equal when both their id and their exact bounds match.
/// Actions take no part in identity. To move an entity, remove it and insert
/// a new one with the updated bounds.
#[derive(Clone)]
pub struct Entity {
    id: EntityId,
    bounds: Rect,
    actions: Vec<Action>,
}

impl Entity {
    /// Creates an entity with a freshly allocated id.
    pub fn new(bounds: Rect, actions: Vec<Action>) -> Self {
        Self::with_id(EntityId::next(), bounds, actions)
    }

    pub fn with_id(id: EntityId, bounds: Rect, actions: Vec<Action>) -> Self {
        Self {
            id,
            bounds,
            actions,
        }
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Calls every attached action in order.
    pub fn run_actions(&self) {
        for action in &self.actions {
            action();
        }
    }

    #[inline]
    pub fn intersects(&self, rect: &Rect) -> bool {
        self.bounds.intersects(rect)
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.bounds.to_bits() == other.bounds.to_bits()
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.bounds.to_bits().hash(state);
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("bounds", &self.bounds)
            .field("actions", &self.actions.len())
            .finish()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID: {}, Bounds: {}", self.id, self.bounds)
    }
}
