use thiserror::Error;

use crate::Rect;

pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors returned by quadtree operations.
///
/// Everything but [`TreeError::RoutingInvariantViolated`] is recoverable.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("no entity found")]
    EntityNotFound,

    #[error("no entities given to insert_entities()")]
    NoEntitiesGiven,

    /// A rectangle routed into an internal node matched none of its
    /// children. The tree is poisoned afterwards.
    #[error("no child quadrant found at depth {depth}")]
    RoutingInvariantViolated { depth: u16 },

    #[error("malformed rectangle {0}")]
    InvalidRect(Rect),

    #[error("rectangle {0} lies outside the tree region")]
    OutOfBounds(Rect),

    #[error("invalid tree config: {0}")]
    InvalidConfig(String),

    #[error("failed to parse tree config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("tree is poisoned by an earlier failure")]
    Poisoned,
}
