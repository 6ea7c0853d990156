use std::collections::HashSet;
use std::sync::Arc;

use crate::{Entity, Rect, Result, TreeError};

/// Ordered list of entity references compared by identity.
///
/// Leaves store their entities in one of these, and query results from
/// several branches are merged through one so that a straddling entity is
/// only reported once.
#[derive(Clone, Debug, Default)]
pub struct EntityList {
    data: Vec<Arc<Entity>>,
}

impl EntityList {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Entity>> {
        self.data.iter()
    }

    pub fn push(&mut self, entity: Arc<Entity>) {
        self.data.push(entity);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Removes the first entity equal to `entity`, keeping the rest in order.
    pub fn remove(&mut self, entity: &Entity) -> Result<()> {
        match self.data.iter().position(|e| **e == *entity) {
            Some(index) => {
                self.data.remove(index);
                Ok(())
            }
            None => Err(TreeError::EntityNotFound),
        }
    }

    pub fn contains(&self, entity: &Entity) -> bool {
        self.data.iter().any(|e| **e == *entity)
    }

    /// Appends every entity of `other` not already present.
    pub fn merge<'a, I>(&mut self, other: I)
    where
        I: IntoIterator<Item = &'a Arc<Entity>>,
    {
        let mut seen: HashSet<Arc<Entity>> = self.data.iter().cloned().collect();
        for entity in other {
            if seen.insert(entity.clone()) {
                self.data.push(entity.clone());
            }
        }
    }

    /// Whether any entity's own bounds overlap `rect`.
    pub fn any_intersect(&self, rect: &Rect) -> bool {
        self.data.iter().any(|e| e.intersects(rect))
    }

    /// Entities whose own bounds overlap `rect`.
    pub fn intersecting(&self, rect: &Rect) -> EntityList {
        Self {
            data: self
                .data
                .iter()
                .filter(|e| e.intersects(rect))
                .cloned()
                .collect(),
        }
    }

    pub fn into_vec(self) -> Vec<Arc<Entity>> {
        self.data
    }
}

impl<'a> IntoIterator for &'a EntityList {
    type Item = &'a Arc<Entity>;
    type IntoIter = std::slice::Iter<'a, Arc<Entity>>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl FromIterator<Arc<Entity>> for EntityList {
    fn from_iter<T: IntoIterator<Item = Arc<Entity>>>(iter: T) -> Self {
        let mut list = EntityList::new();
        for entity in iter {
            list.push(entity);
        }
        list
    }
}

/// Collects entities from many leaves, keeping the first reference to each
/// identity in arrival order.
#[derive(Debug, Default)]
pub(crate) struct DistinctEntities {
    list: EntityList,
    seen: HashSet<Arc<Entity>>,
}

impl DistinctEntities {
    pub(crate) fn insert(&mut self, entity: &Arc<Entity>) {
        if self.seen.insert(entity.clone()) {
            self.list.push(entity.clone());
        }
    }

    pub(crate) fn extend(&mut self, entities: &EntityList) {
        for entity in entities {
            self.insert(entity);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.list.len()
    }

    pub(crate) fn into_list(self) -> EntityList {
        self.list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityId;

    fn entity(id: u64, x1: f64, y1: f64, x2: f64, y2: f64) -> Arc<Entity> {
        Arc::new(Entity::with_id(EntityId(id), Rect::new(x1, y1, x2, y2), Vec::new()))
    }

    #[test]
    fn remove_keeps_order() {
        let mut list: EntityList = vec![
            entity(1, 0.0, 0.0, 50.0, 50.0),
            entity(2, 20.0, 20.0, 50.0, 50.0),
            entity(3, 5.0, 5.0, 90.0, 80.0),
        ]
        .into_iter()
        .collect();

        list.remove(&entity(2, 20.0, 20.0, 50.0, 50.0)).unwrap();
        let ids: Vec<u64> = list.iter().map(|e| e.id().0).collect();
        assert_eq!(ids, vec![1, 3]);

        list.remove(&entity(3, 5.0, 5.0, 90.0, 80.0)).unwrap();
        list.remove(&entity(1, 0.0, 0.0, 50.0, 50.0)).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn remove_missing() {
        let mut list: EntityList = vec![entity(1, 0.0, 0.0, 50.0, 50.0)].into_iter().collect();
        // Same id, different bounds.
        let err = list.remove(&entity(1, 0.0, 0.0, 40.0, 50.0)).unwrap_err();
        assert!(matches!(err, TreeError::EntityNotFound));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn merge_skips_duplicates() {
        let a = entity(1, 0.0, 0.0, 10.0, 10.0);
        let b = entity(2, 5.0, 5.0, 20.0, 20.0);
        let c = entity(3, 30.0, 30.0, 40.0, 40.0);

        let mut list: EntityList = vec![a.clone(), b.clone()].into_iter().collect();
        let other: EntityList = vec![b.clone(), c.clone(), a.clone()].into_iter().collect();
        list.merge(&other);

        assert_eq!(list.len(), 3);
        assert!(list.contains(&c));
    }

    #[test]
    fn clear_empties_list() {
        let mut list: EntityList = vec![entity(1, 0.0, 0.0, 1.0, 1.0)].into_iter().collect();
        list.clear();
        assert!(list.is_empty());
        assert!(!list.contains(&entity(1, 0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn distinct_keeps_first_arrival() {
        let a = entity(1, 0.0, 0.0, 10.0, 10.0);
        let b = entity(2, 5.0, 5.0, 20.0, 20.0);
        let first: EntityList = vec![a.clone(), b.clone()].into_iter().collect();
        let second: EntityList = vec![b.clone(), entity(1, 0.0, 0.0, 10.0, 10.0)].into_iter().collect();

        let mut distinct = DistinctEntities::default();
        distinct.extend(&first);
        distinct.extend(&second);
        assert_eq!(distinct.len(), 2);

        let ids: Vec<u64> = distinct.into_list().iter().map(|e| e.id().0).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn intersecting_filters_by_bounds() {
        let list: EntityList = vec![
            entity(1, 0.0, 0.0, 10.0, 10.0),
            entity(2, 50.0, 50.0, 60.0, 60.0),
        ]
        .into_iter()
        .collect();
        let query = Rect::new(5.0, 5.0, 20.0, 20.0);

        assert!(list.any_intersect(&query));
        let hits = list.intersecting(&query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.iter().next().unwrap().id(), EntityId(1));
        assert!(!list.any_intersect(&Rect::new(20.0, 20.0, 30.0, 30.0)));
    }
}
