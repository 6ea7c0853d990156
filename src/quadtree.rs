use std::sync::Arc;

use tracing::{debug, error, trace};

use crate::list::{DistinctEntities, EntityList};
use crate::{Action, Entity, QuadtreeVisitor, Rect, Result, TreeConfig, TreeError};

/// Upper bound on the capacity reserved up front for a new leaf.
const MAX_CAPACITY_HINT: usize = 64;

#[derive(Copy, Clone, Debug)]
struct Limits {
    max_entities: usize,
    max_depth: u16,
}

#[derive(Debug)]
enum Kind {
    Leaf(EntityList),
    Internal(Box<[Node; 4]>),
}

#[derive(Debug)]
struct Node {
    region: Rect,
    depth: u16,
    kind: Kind,
}

/// Children of an internal node whose region intersects `rect`.
///
/// The four children tile their parent, so a well-formed rectangle that
/// reached this node always matches at least one of them.
fn route(children: &[Node; 4], rect: &Rect, depth: u16) -> Result<[bool; 4]> {
    let hits = [
        children[0].region.intersects(rect),
        children[1].region.intersects(rect),
        children[2].region.intersects(rect),
        children[3].region.intersects(rect),
    ];
    if hits.iter().any(|hit| *hit) {
        Ok(hits)
    } else {
        Err(TreeError::RoutingInvariantViolated { depth })
    }
}

impl Node {
    fn leaf(region: Rect, depth: u16, limits: Limits) -> Self {
        Self {
            region,
            depth,
            kind: Kind::Leaf(EntityList::with_capacity(
                limits.max_entities.min(MAX_CAPACITY_HINT),
            )),
        }
    }

    fn insert(&mut self, entity: Arc<Entity>, limits: Limits) -> Result<()> {
        match &mut self.kind {
            Kind::Internal(children) => {
                let hits = route(children, entity.bounds(), self.depth)?;
                for (child, hit) in children.iter_mut().zip(hits) {
                    if hit {
                        child.insert(entity.clone(), limits)?;
                    }
                }
                Ok(())
            }
            Kind::Leaf(entities) => {
                if entities.len() + 1 > limits.max_entities && self.depth < limits.max_depth {
                    let mut moved = std::mem::take(entities);
                    moved.push(entity);
                    return self.split(moved, limits);
                }
                if entities.len() == limits.max_entities {
                    debug!(
                        "leaf at max depth {} over {} exceeds capacity {}",
                        self.depth, self.region, limits.max_entities
                    );
                }
                entities.push(entity);
                Ok(())
            }
        }
    }

    /// Turns this leaf into an internal node and hands `entities` to the
    /// new children. Children may end up over capacity; they split on
    /// their next insert.
    fn split(&mut self, entities: EntityList, limits: Limits) -> Result<()> {
        let depth = self.depth + 1;
        let mut children = Box::new(
            self.region
                .quadrants()
                .map(|region| Node::leaf(region, depth, limits)),
        );

        if let Err(err) = Self::distribute(&mut children, &entities, self.depth) {
            self.kind = Kind::Leaf(entities);
            return Err(err);
        }

        debug!(
            "split node at depth {} over {} ({} entities)",
            self.depth,
            self.region,
            entities.len()
        );
        self.kind = Kind::Internal(children);
        Ok(())
    }

    fn distribute(children: &mut [Node; 4], entities: &EntityList, depth: u16) -> Result<()> {
        for entity in entities {
            let hits = route(children, entity.bounds(), depth)?;
            for (child, hit) in children.iter_mut().zip(hits) {
                if let (true, Kind::Leaf(list)) = (hit, &mut child.kind) {
                    list.push(entity.clone());
                }
            }
        }
        Ok(())
    }

    /// Removes `entity` from every leaf it routes to. Returns whether any
    /// leaf held it.
    fn remove(&mut self, entity: &Entity, limits: Limits) -> Result<bool> {
        match &mut self.kind {
            Kind::Leaf(entities) => Ok(entities.remove(entity).is_ok()),
            Kind::Internal(children) => {
                let hits = route(children, entity.bounds(), self.depth)?;
                let mut found = false;
                for (child, hit) in children.iter_mut().zip(hits) {
                    if hit {
                        found |= child.remove(entity, limits)?;
                    }
                }
                if found {
                    self.collapse(limits);
                }
                Ok(found)
            }
        }
    }

    /// Folds four leaf children back into this node when their distinct
    /// entities fit in one leaf. Does nothing if any child is internal.
    fn collapse(&mut self, limits: Limits) -> bool {
        let Kind::Internal(children) = &self.kind else {
            return false;
        };

        let mut merged = EntityList::new();
        for child in children.iter() {
            match &child.kind {
                Kind::Leaf(entities) => {
                    merged.merge(entities);
                    if merged.len() > limits.max_entities {
                        return false;
                    }
                }
                Kind::Internal(_) => return false,
            }
        }

        debug!(
            "collapsed node at depth {} over {} ({} entities)",
            self.depth,
            self.region,
            merged.len()
        );
        self.kind = Kind::Leaf(merged);
        true
    }

    fn retrieve(&self, rect: &Rect, out: &mut DistinctEntities) -> Result<()> {
        match &self.kind {
            Kind::Leaf(entities) => {
                out.extend(entities);
                Ok(())
            }
            Kind::Internal(children) => {
                let hits = route(children, rect, self.depth)?;
                for (child, hit) in children.iter().zip(hits) {
                    if hit {
                        child.retrieve(rect, out)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn intersects(&self, rect: &Rect) -> Result<bool> {
        match &self.kind {
            Kind::Leaf(entities) => Ok(entities.any_intersect(rect)),
            Kind::Internal(children) => {
                let hits = route(children, rect, self.depth)?;
                for (child, hit) in children.iter().zip(hits) {
                    if hit && child.intersects(rect)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn contains(&self, entity: &Entity) -> Result<bool> {
        match &self.kind {
            Kind::Leaf(entities) => Ok(entities.contains(entity)),
            Kind::Internal(children) => {
                let hits = route(children, entity.bounds(), self.depth)?;
                for (child, hit) in children.iter().zip(hits) {
                    if hit && child.contains(entity)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

/// A region quadtree over axis-aligned bounding boxes.
///
/// Leaves hold up to `max_entities` entities before splitting into four
/// quadrants, down to `max_depth`. Leaves at `max_depth` grow without bound.
/// An entity that straddles a quadrant boundary is referenced by every leaf
/// it touches, and queries report it once.
///
/// The tree does no locking of its own; see [`SharedQuadtree`](crate::SharedQuadtree)
/// for a lock-guarded handle.
#[derive(Debug)]
pub struct Quadtree {
    root: Node,
    limits: Limits,
    poisoned: bool,
}

impl Quadtree {
    /// Creates a tree covering `(0, 0)-(width, height)`.
    ///
    /// `width` and `height` should be positive; [`Quadtree::from_config`]
    /// checks this.
    pub fn new(width: f64, height: f64, max_entities: usize, max_depth: u16) -> Self {
        Self::build(
            Rect::new(0.0, 0.0, width, height),
            max_entities,
            max_depth,
        )
    }

    /// Creates a tree covering an arbitrary region.
    pub fn with_region(region: Rect, max_entities: usize, max_depth: u16) -> Result<Self> {
        if !region.is_well_formed() {
            return Err(TreeError::InvalidRect(region));
        }
        Ok(Self::build(region, max_entities, max_depth))
    }

    pub fn from_config(config: &TreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            config.width,
            config.height,
            config.max_entities,
            config.max_depth,
        ))
    }

    fn build(region: Rect, max_entities: usize, max_depth: u16) -> Self {
        let limits = Limits {
            max_entities,
            max_depth,
        };
        Self {
            root: Node::leaf(region, 0, limits),
            limits,
            poisoned: false,
        }
    }

    pub fn region(&self) -> Rect {
        self.root.region
    }

    pub fn max_entities(&self) -> usize {
        self.limits.max_entities
    }

    pub fn max_depth(&self) -> u16 {
        self.limits.max_depth
    }

    /// Whether an earlier operation hit a routing failure.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Wraps `bounds` in a new entity with a fresh id and inserts it.
    ///
    /// The returned entity is what [`Quadtree::remove`] expects later on.
    pub fn insert(&mut self, bounds: Rect, actions: Vec<Action>) -> Result<Arc<Entity>> {
        self.insert_entity(Entity::new(bounds, actions))
    }

    pub fn insert_entity(&mut self, entity: Entity) -> Result<Arc<Entity>> {
        self.check_insert(&entity)?;
        let entity = Arc::new(entity);
        self.insert_checked(entity.clone())?;
        Ok(entity)
    }

    /// Inserts every entity, or none of them if any has unusable bounds.
    pub fn insert_entities<I>(&mut self, entities: I) -> Result<()>
    where
        I: IntoIterator<Item = Entity>,
    {
        let entities: Vec<Entity> = entities.into_iter().collect();
        if entities.is_empty() {
            return Err(TreeError::NoEntitiesGiven);
        }
        for entity in &entities {
            self.check_insert(entity)?;
        }
        for entity in entities {
            self.insert_checked(Arc::new(entity))?;
        }
        Ok(())
    }

    fn insert_checked(&mut self, entity: Arc<Entity>) -> Result<()> {
        trace!(id = %entity.id(), bounds = %entity.bounds(), "insert");
        let result = self.root.insert(entity, self.limits);
        self.poison_on_fatal(result)
    }

    /// Removes `entity` from every leaf holding it.
    ///
    /// Succeeds if at least one leaf held the entity.
    pub fn remove(&mut self, entity: &Entity) -> Result<()> {
        self.check_query(entity.bounds())?;
        if !self.root.region.intersects(entity.bounds()) {
            return Err(TreeError::EntityNotFound);
        }
        trace!(id = %entity.id(), bounds = %entity.bounds(), "remove");

        let result = self.root.remove(entity, self.limits);
        match self.poison_on_fatal(result)? {
            true => Ok(()),
            false => Err(TreeError::EntityNotFound),
        }
    }

    /// Every distinct entity held by a leaf whose region intersects `rect`.
    ///
    /// This is a superset of the entities overlapping `rect`; use
    /// [`Quadtree::intersecting_entities`] for an exact answer.
    pub fn retrieve(&self, rect: &Rect) -> Result<Vec<Arc<Entity>>> {
        Ok(self.retrieve_list(rect)?.into_vec())
    }

    fn retrieve_list(&self, rect: &Rect) -> Result<EntityList> {
        self.check_query(rect)?;
        let mut out = DistinctEntities::default();
        if self.root.region.intersects(rect) {
            trace!(rect = %rect, "retrieve");
            self.root.retrieve(rect, &mut out)?;
        }
        Ok(out.into_list())
    }

    /// Whether any stored entity's bounds overlap `rect`.
    pub fn intersects_any(&self, rect: &Rect) -> Result<bool> {
        self.check_query(rect)?;
        if !self.root.region.intersects(rect) {
            return Ok(false);
        }
        trace!(rect = %rect, "intersects_any");
        self.root.intersects(rect)
    }

    /// Every distinct entity whose own bounds overlap `rect`.
    pub fn intersecting_entities(&self, rect: &Rect) -> Result<Vec<Arc<Entity>>> {
        Ok(self.retrieve_list(rect)?.intersecting(rect).into_vec())
    }

    /// Whether an entity with the same id and bounds is stored.
    pub fn contains_entity(&self, entity: &Entity) -> Result<bool> {
        self.check_query(entity.bounds())?;
        if !self.root.region.intersects(entity.bounds()) {
            return Ok(false);
        }
        self.root.contains(entity)
    }

    /// Every distinct entity in the tree.
    pub fn entities(&self) -> Result<Vec<Arc<Entity>>> {
        self.retrieve(&self.root.region)
    }

    /// Number of distinct entities in the tree.
    pub fn len(&self) -> usize {
        let mut stats = Stats::default();
        self.traverse(&mut stats);
        stats.distinct.len()
    }

    pub fn is_empty(&self) -> bool {
        matches!(&self.root.kind, Kind::Leaf(entities) if entities.is_empty())
    }

    /// Drops every entity and child node. Also lifts poisoning.
    pub fn clear(&mut self) {
        self.root = Node::leaf(self.root.region, 0, self.limits);
        self.poisoned = false;
    }

    /// Depth of the deepest node; zero while the root is a leaf.
    pub fn depth(&self) -> u16 {
        let mut stats = Stats::default();
        self.traverse(&mut stats);
        stats.depth
    }

    pub fn node_count(&self) -> usize {
        let mut stats = Stats::default();
        self.traverse(&mut stats);
        stats.nodes
    }

    /// Walks the tree depth first, children in quadrant order.
    pub fn traverse<V>(&self, visitor: &mut V)
    where
        V: QuadtreeVisitor,
    {
        let mut to_process: Vec<&Node> = vec![&self.root];

        while let Some(node) = to_process.pop() {
            match &node.kind {
                Kind::Internal(children) => {
                    visitor.branch(node.depth, &node.region);
                    to_process.extend(children.iter().rev());
                }
                Kind::Leaf(entities) => {
                    visitor.leaf(node.depth, &node.region, entities.len());
                    for entity in entities {
                        visitor.entity(node.depth, entity);
                    }
                }
            }
        }
    }

    fn check_query(&self, rect: &Rect) -> Result<()> {
        if self.poisoned {
            return Err(TreeError::Poisoned);
        }
        if !rect.is_well_formed() {
            return Err(TreeError::InvalidRect(*rect));
        }
        Ok(())
    }

    fn check_insert(&self, entity: &Entity) -> Result<()> {
        self.check_query(entity.bounds())?;
        if !self.root.region.intersects(entity.bounds()) {
            return Err(TreeError::OutOfBounds(*entity.bounds()));
        }
        Ok(())
    }

    fn poison_on_fatal<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(TreeError::RoutingInvariantViolated { depth }) = &result {
            error!("no quadrant found at depth {}, tree poisoned", depth);
            self.poisoned = true;
        }
        result
    }
}

#[derive(Default)]
struct Stats {
    nodes: usize,
    depth: u16,
    distinct: DistinctEntities,
}

impl QuadtreeVisitor for Stats {
    fn entity(&mut self, _depth: u16, entity: &Arc<Entity>) {
        self.distinct.insert(entity);
    }

    fn leaf(&mut self, depth: u16, _region: &Rect, _entity_count: usize) {
        self.nodes += 1;
        self.depth = self.depth.max(depth);
    }

    fn branch(&mut self, depth: u16, _region: &Rect) {
        self.nodes += 1;
        self.depth = self.depth.max(depth);
    }
}
