//! Lock-guarded handle for sharing one tree between threads.
//!
//! The tree itself stays synchronous. Writers take the write lock, readers
//! the read lock, and the `spawn_*` queries run on a worker thread and hand
//! their answer back over a channel. A spawned query sees the tree as it is
//! when the worker acquires the lock.

use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;

use crate::{Action, Entity, Quadtree, Rect, Result, TreeError};

#[derive(Clone, Debug)]
pub struct SharedQuadtree {
    inner: Arc<RwLock<Quadtree>>,
}

impl SharedQuadtree {
    pub fn new(tree: Quadtree) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Quadtree>> {
        self.inner.read().map_err(|_| TreeError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Quadtree>> {
        self.inner.write().map_err(|_| TreeError::Poisoned)
    }

    pub fn insert(&self, bounds: Rect, actions: Vec<Action>) -> Result<Arc<Entity>> {
        self.write()?.insert(bounds, actions)
    }

    pub fn insert_entity(&self, entity: Entity) -> Result<Arc<Entity>> {
        self.write()?.insert_entity(entity)
    }

    pub fn insert_entities<I>(&self, entities: I) -> Result<()>
    where
        I: IntoIterator<Item = Entity>,
    {
        self.write()?.insert_entities(entities)
    }

    pub fn remove(&self, entity: &Entity) -> Result<()> {
        self.write()?.remove(entity)
    }

    pub fn retrieve(&self, rect: &Rect) -> Result<Vec<Arc<Entity>>> {
        self.read()?.retrieve(rect)
    }

    pub fn intersects_any(&self, rect: &Rect) -> Result<bool> {
        self.read()?.intersects_any(rect)
    }

    pub fn intersecting_entities(&self, rect: &Rect) -> Result<Vec<Arc<Entity>>> {
        self.read()?.intersecting_entities(rect)
    }

    pub fn contains_entity(&self, entity: &Entity) -> Result<bool> {
        self.read()?.contains_entity(entity)
    }

    pub fn spawn_retrieve(&self, rect: Rect) -> Receiver<Result<Vec<Arc<Entity>>>> {
        self.spawn(move |tree| tree.retrieve(&rect))
    }

    pub fn spawn_intersects_any(&self, rect: Rect) -> Receiver<Result<bool>> {
        self.spawn(move |tree| tree.intersects_any(&rect))
    }

    pub fn spawn_intersecting_entities(&self, rect: Rect) -> Receiver<Result<Vec<Arc<Entity>>>> {
        self.spawn(move |tree| tree.intersecting_entities(&rect))
    }

    pub fn spawn_contains_entity(&self, entity: Arc<Entity>) -> Receiver<Result<bool>> {
        self.spawn(move |tree| tree.contains_entity(&entity))
    }

    fn spawn<T, F>(&self, query: F) -> Receiver<Result<T>>
    where
        T: Send + 'static,
        F: FnOnce(&Quadtree) -> Result<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let inner = self.inner.clone();
        thread::spawn(move || {
            let result = match inner.read() {
                Ok(tree) => query(&*tree),
                Err(_) => Err(TreeError::Poisoned),
            };
            // The caller may have dropped the receiver.
            let _ = tx.send(result);
        });
        rx
    }
}
