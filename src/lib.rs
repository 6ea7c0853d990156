//! A region quadtree for axis-aligned bounding boxes.
//!
//! ```
//! use region_quadtree::{Quadtree, Rect};
//!
//! let mut tree = Quadtree::new(800.0, 600.0, 2, 4);
//! let player = tree.insert(Rect::new(0.0, 0.0, 50.0, 50.0), Vec::new()).unwrap();
//! tree.insert(Rect::new(20.0, 20.0, 40.0, 40.0), Vec::new()).unwrap();
//!
//! assert!(tree.intersects_any(&Rect::new(5.0, 5.0, 10.0, 10.0)).unwrap());
//! assert_eq!(tree.intersecting_entities(&Rect::new(45.0, 45.0, 60.0, 60.0)).unwrap().len(), 1);
//!
//! tree.remove(&player).unwrap();
//! assert!(!tree.contains_entity(&player).unwrap());
//! ```

use std::sync::Arc;

mod config;
mod entity;
mod error;
mod list;
mod quadtree;
mod rect;
mod shared;

/// Receives every node and leaf-held entity reference during
/// [`Quadtree::traverse`].
pub trait QuadtreeVisitor {
    /// Called once per leaf reference, so a straddling entity shows up
    /// once for every leaf that holds it.
    fn entity(&mut self, depth: u16, entity: &Arc<Entity>);
    fn leaf(&mut self, depth: u16, region: &Rect, entity_count: usize);
    fn branch(&mut self, depth: u16, region: &Rect);
}

pub use config::*;
pub use entity::*;
pub use error::*;
pub use list::*;
pub use quadtree::*;
pub use rect::*;
pub use shared::*;
