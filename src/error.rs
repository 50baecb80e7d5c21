use crate::intersection::ConnectionSide;
use crate::{IntersectionId, LaneId, RoadId};
use thiserror::Error;

/// Errors returned by fallible construction and registry operations.
///
/// Lookups by id report a missing entity as `None` rather than an error;
/// these variants cover operations that cannot proceed at all. None of them
/// abort the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("intersection {0:?} not found")]
    IntersectionNotFound(IntersectionId),
    #[error("road {0:?} not found")]
    RoadNotFound(RoadId),
    #[error("lane {0:?} not found")]
    LaneNotFound(LaneId),
    #[error("connection side {side:?} of intersection {intersection:?} is already occupied")]
    SideOccupied {
        intersection: IntersectionId,
        side: ConnectionSide,
    },
    #[error("a connecting road must join two distinct intersections")]
    SameIntersection,
    #[error("lane {0:?} is occupied by vehicles")]
    LaneOccupied(LaneId),
    #[error("a vehicle route must contain at least one lane")]
    EmptyRoute,
}
