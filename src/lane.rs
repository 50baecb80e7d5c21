use crate::math::Point2d;
use crate::util::Bounds;
use crate::{IntersectionId, LaneId, RoadId, VehicleId};

/// A single directional lane of a road.
///
/// Geometry (start, end, heading) is assigned by the network whenever the
/// owning road is laid out, so it always reflects the current intersection
/// configuration.
#[derive(Clone, Debug)]
pub struct Lane {
    id: LaneId,
    road: RoadId,
    /// The intersection this lane leads to.
    destination: IntersectionId,
    /// Whether the lane runs with the road's orientation.
    forward: bool,
    start: Point2d,
    end: Point2d,
    /// Heading of travel in degrees, 0 pointing straight up.
    heading: f64,
    half_width: f64,
    /// Number of vehicles currently on the lane. Never negative.
    occupancy: u32,
    /// Whether vehicles must stop at the end of the lane.
    blocked: bool,
    /// The most recent vehicle to enter the lane, used to chain the
    /// car-following references. Cleared when that vehicle leaves.
    last_vehicle: Option<VehicleId>,
}

impl Lane {
    pub(crate) fn new(id: LaneId, road: RoadId, destination: IntersectionId, forward: bool) -> Self {
        Self {
            id,
            road,
            destination,
            forward,
            start: Point2d::new(0.0, 0.0),
            end: Point2d::new(0.0, 0.0),
            heading: 0.0,
            half_width: 0.0,
            occupancy: 0,
            blocked: false,
            last_vehicle: None,
        }
    }

    /// Gets the lane's ID.
    pub fn id(&self) -> LaneId {
        self.id
    }

    /// Gets the ID of the owning road.
    pub fn road(&self) -> RoadId {
        self.road
    }

    /// The intersection this lane leads to.
    pub fn destination(&self) -> IntersectionId {
        self.destination
    }

    /// Whether the lane runs with the road's orientation.
    pub fn is_forward(&self) -> bool {
        self.forward
    }

    /// The position where vehicles enter the lane.
    pub fn start(&self) -> Point2d {
        self.start
    }

    /// The position of the lane's stop line.
    pub fn end(&self) -> Point2d {
        self.end
    }

    /// Heading of travel in degrees.
    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// The number of vehicles currently on the lane.
    pub fn occupancy(&self) -> u32 {
        self.occupancy
    }

    /// Whether vehicles must stop at the end of the lane.
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// The most recent vehicle to enter the lane, if it is still on it.
    pub fn last_vehicle(&self) -> Option<VehicleId> {
        self.last_vehicle
    }

    /// The lane's footprint.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_segment(self.start, self.end, self.half_width)
    }

    /// Named numeric readouts for display overlays.
    pub fn status(&self) -> [(&'static str, f64); 2] {
        [
            ("occupancy", self.occupancy as f64),
            ("blocked", if self.blocked { 1.0 } else { 0.0 }),
        ]
    }

    pub(crate) fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }

    pub(crate) fn set_geometry(&mut self, start: Point2d, end: Point2d, heading: f64, half_width: f64) {
        self.start = start;
        self.end = end;
        self.heading = heading;
        self.half_width = half_width;
    }

    pub(crate) fn add_occupant(&mut self) {
        self.occupancy += 1;
    }

    pub(crate) fn remove_occupant(&mut self) {
        debug_assert!(self.occupancy > 0, "lane occupancy underflow");
        self.occupancy = self.occupancy.saturating_sub(1);
    }

    /// Registers a vehicle as the most recent to enter the lane.
    pub(crate) fn set_last_vehicle(&mut self, vehicle: VehicleId) {
        self.last_vehicle = Some(vehicle);
    }

    /// Clears the back-reference when the given vehicle leaves the lane.
    pub(crate) fn clear_last_vehicle(&mut self, vehicle: VehicleId) {
        if self.last_vehicle == Some(vehicle) {
            self.last_vehicle = None;
        }
    }
}
