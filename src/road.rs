use crate::intersection::ConnectionSide;
use crate::{IntersectionId, LaneId, RoadId};
use smallvec::SmallVec;

/// One end of a road: the intersection and connection side it attaches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Anchor {
    pub intersection: IntersectionId,
    pub side: ConnectionSide,
}

/// An ordered collection of lanes attached to one or two intersections.
///
/// A road with a single anchor is a stub extending away from its
/// intersection; a road with two anchors connects them and is shared, both
/// intersections holding its id.
#[derive(Clone, Debug)]
pub struct Road {
    id: RoadId,
    near: Anchor,
    far: Option<Anchor>,
    length: f64,
    /// Lanes in insertion order, which fixes their lateral placement.
    lanes: SmallVec<[LaneId; 8]>,
}

impl Road {
    pub(crate) fn new_stub(id: RoadId, near: Anchor, length: f64) -> Self {
        Self {
            id,
            near,
            far: None,
            length,
            lanes: SmallVec::new(),
        }
    }

    pub(crate) fn new_connecting(id: RoadId, near: Anchor, far: Anchor) -> Self {
        Self {
            id,
            near,
            far: Some(far),
            length: 0.0,
            lanes: SmallVec::new(),
        }
    }

    /// Gets the road's ID.
    pub fn id(&self) -> RoadId {
        self.id
    }

    /// The anchored end of the road.
    pub fn near(&self) -> Anchor {
        self.near
    }

    /// The far anchor, present only for connecting roads.
    pub fn far(&self) -> Option<Anchor> {
        self.far
    }

    /// Whether the road joins two intersections.
    pub fn is_connecting(&self) -> bool {
        self.far.is_some()
    }

    /// The length of the road in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The lanes of the road, in insertion order.
    pub fn lanes(&self) -> &[LaneId] {
        &self.lanes
    }

    /// Whether the road attaches to the given intersection.
    pub fn touches(&self, intersection: IntersectionId) -> bool {
        self.near.intersection == intersection
            || self.far.map_or(false, |a| a.intersection == intersection)
    }

    /// The intersection a lane travelling with the road's orientation leads
    /// to. Lanes of a stub road always belong to the owning intersection.
    pub(crate) fn destination_of(&self, forward: bool) -> IntersectionId {
        match (self.far, forward) {
            (Some(far), true) => far.intersection,
            _ => self.near.intersection,
        }
    }

    pub(crate) fn set_length(&mut self, length: f64) {
        self.length = length;
    }

    pub(crate) fn add_lane(&mut self, lane: LaneId) {
        self.lanes.push(lane);
    }

    pub(crate) fn remove_lane(&mut self, lane: LaneId) {
        self.lanes.retain(|id| *id != lane);
    }
}
