use crate::config::SimConfig;
use crate::cycle::PriorityModel;
use crate::error::NetworkError;
use crate::intersection::{ConnectionSide, Intersection, Weather};
use crate::lane::Lane;
use crate::math::{self, Point2d};
use crate::road::{Anchor, Road};
use crate::{IntersectionId, IntersectionSet, LaneId, LaneSet, RoadId, RoadSet};
use smallvec::SmallVec;

/// The road network: intersections, roads and lanes.
///
/// All entities live in central arenas and reference each other by key, so a
/// connecting road shared by two intersections has a single owner and a
/// stale key can never dangle.
#[derive(Default)]
pub struct Network {
    intersections: IntersectionSet,
    roads: RoadSet,
    lanes: LaneSet,
}

impl Network {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    /// Adds an intersection centred on `position`.
    pub(crate) fn add_intersection(
        &mut self,
        position: Point2d,
        config: &SimConfig,
    ) -> IntersectionId {
        let id = self.intersections.insert_with_key(|id| {
            Intersection::new(
                id,
                position,
                config.intersection_width,
                config.intersection_height,
            )
        });
        log::debug!("intersection {:?} added at {:?}", id, position);
        id
    }

    /// Adds a stub road extending `length` m away from the given side.
    pub(crate) fn add_road(
        &mut self,
        intersection: IntersectionId,
        side: ConnectionSide,
        length: f64,
        config: &SimConfig,
    ) -> Result<RoadId, NetworkError> {
        if self.intersections.get(intersection).is_none() {
            return Err(NetworkError::IntersectionNotFound(intersection));
        }
        let anchor = Anchor { intersection, side };
        if self.side_occupied(anchor) {
            return Err(NetworkError::SideOccupied { intersection, side });
        }
        let id = self.roads.insert_with_key(|id| Road::new_stub(id, anchor, length));
        self.intersections[intersection].add_road(id);
        self.layout_road(id, config);
        log::debug!("road {:?} added at {:?} of {:?}", id, side, intersection);
        Ok(id)
    }

    /// Adds a road connecting the sides of two distinct intersections. The
    /// road is shared: both intersections list it, but it exists once.
    pub(crate) fn add_connecting_road(
        &mut self,
        a: IntersectionId,
        side_a: ConnectionSide,
        b: IntersectionId,
        side_b: ConnectionSide,
        config: &SimConfig,
    ) -> Result<RoadId, NetworkError> {
        if a == b {
            return Err(NetworkError::SameIntersection);
        }
        for id in [a, b] {
            if self.intersections.get(id).is_none() {
                return Err(NetworkError::IntersectionNotFound(id));
            }
        }
        let near = Anchor {
            intersection: a,
            side: side_a,
        };
        let far = Anchor {
            intersection: b,
            side: side_b,
        };
        for anchor in [near, far] {
            if self.side_occupied(anchor) {
                return Err(NetworkError::SideOccupied {
                    intersection: anchor.intersection,
                    side: anchor.side,
                });
            }
        }
        let id = self
            .roads
            .insert_with_key(|id| Road::new_connecting(id, near, far));
        self.intersections[a].add_road(id);
        self.intersections[b].add_road(id);
        self.layout_road(id, config);
        log::debug!("connecting road {:?} added between {:?} and {:?}", id, a, b);
        Ok(id)
    }

    /// Adds a lane to a road. `forward` lanes run with the road's
    /// orientation (outward for a stub road, towards the far intersection
    /// for a connecting road).
    pub(crate) fn add_lane(
        &mut self,
        road: RoadId,
        forward: bool,
        config: &SimConfig,
    ) -> Result<LaneId, NetworkError> {
        let destination = match self.roads.get(road) {
            Some(r) => r.destination_of(forward),
            None => return Err(NetworkError::RoadNotFound(road)),
        };
        let id = self
            .lanes
            .insert_with_key(|id| Lane::new(id, road, destination, forward));
        self.roads[road].add_lane(id);
        self.layout_road(road, config);
        log::debug!("lane {:?} added to road {:?}", id, road);
        Ok(id)
    }

    /// Deletes a lane. Fails while any vehicle occupies it. As the lane of a
    /// connecting road is shared, the removal is visible to both ends.
    pub(crate) fn delete_lane(
        &mut self,
        lane: LaneId,
        config: &SimConfig,
    ) -> Result<(), NetworkError> {
        let (road, occupancy) = match self.lanes.get(lane) {
            Some(l) => (l.road(), l.occupancy()),
            None => return Err(NetworkError::LaneNotFound(lane)),
        };
        if occupancy > 0 {
            return Err(NetworkError::LaneOccupied(lane));
        }
        if let Some(road) = self.roads.get_mut(road) {
            road.remove_lane(lane);
        }
        self.lanes.remove(lane);
        self.layout_road(road, config);
        log::debug!("lane {:?} deleted", lane);
        Ok(())
    }

    /// Recomputes the geometry of every road (and its lanes) attached to the
    /// intersection. Must be called after its position or footprint change.
    pub(crate) fn reassign_road_positions(
        &mut self,
        intersection: IntersectionId,
        config: &SimConfig,
    ) -> Result<(), NetworkError> {
        let roads: SmallVec<[RoadId; 4]> = match self.intersections.get(intersection) {
            Some(i) => i.roads().iter().copied().collect(),
            None => return Err(NetworkError::IntersectionNotFound(intersection)),
        };
        for road in roads {
            self.layout_road(road, config);
        }
        Ok(())
    }

    /// Resizes an intersection and re-lays-out its roads and lanes.
    pub(crate) fn reload_intersection(
        &mut self,
        intersection: IntersectionId,
        width: f64,
        height: f64,
        config: &SimConfig,
    ) -> Result<(), NetworkError> {
        match self.intersections.get_mut(intersection) {
            Some(i) => i.set_size(width, height),
            None => return Err(NetworkError::IntersectionNotFound(intersection)),
        }
        self.reassign_road_positions(intersection, config)
    }

    /// Sets the weather condition over an intersection.
    pub(crate) fn set_weather(
        &mut self,
        intersection: IntersectionId,
        weather: Weather,
    ) -> Result<(), NetworkError> {
        match self.intersections.get_mut(intersection) {
            Some(i) => {
                i.set_weather(weather);
                Ok(())
            }
            None => Err(NetworkError::IntersectionNotFound(intersection)),
        }
    }

    /// Adds a signal phase controlling the given lanes to an intersection's
    /// cycle, returning the phase's display number.
    pub(crate) fn add_phase(
        &mut self,
        intersection: IntersectionId,
        cycle_time: f64,
        controlled: &[LaneId],
    ) -> Result<usize, NetworkError> {
        for lane in controlled {
            if self.lanes.get(*lane).is_none() {
                return Err(NetworkError::LaneNotFound(*lane));
            }
        }
        let Self {
            intersections,
            lanes,
            ..
        } = self;
        match intersections.get_mut(intersection) {
            Some(i) => {
                let controlled: SmallVec<[LaneId; 4]> = controlled.iter().copied().collect();
                Ok(i.cycle_mut().add_phase(controlled, cycle_time, lanes))
            }
            None => Err(NetworkError::IntersectionNotFound(intersection)),
        }
    }

    /// Resets the phase timers of an intersection's cycle.
    pub(crate) fn reload_cycle(
        &mut self,
        intersection: IntersectionId,
    ) -> Result<(), NetworkError> {
        match self.intersections.get_mut(intersection) {
            Some(i) => {
                i.cycle_mut().reload();
                Ok(())
            }
            None => Err(NetworkError::IntersectionNotFound(intersection)),
        }
    }

    /// Advances every intersection's phase scheduler.
    pub(crate) fn update(&mut self, dt: f64, model: &dyn PriorityModel, config: &SimConfig) {
        let Self {
            intersections,
            lanes,
            ..
        } = self;
        for (_, intersection) in intersections.iter_mut() {
            intersection.update(dt, lanes, model, config);
        }
    }

    /// Gets an intersection by ID.
    pub fn intersection(&self, id: IntersectionId) -> Option<&Intersection> {
        self.intersections.get(id)
    }

    /// Gets a road by ID.
    pub fn road(&self, id: RoadId) -> Option<&Road> {
        self.roads.get(id)
    }

    /// Gets a lane by ID.
    pub fn lane(&self, id: LaneId) -> Option<&Lane> {
        self.lanes.get(id)
    }

    /// Returns an iterator over all intersections.
    pub fn iter_intersections(&self) -> impl Iterator<Item = &Intersection> {
        self.intersections.values()
    }

    /// Returns an iterator over all roads.
    pub fn iter_roads(&self) -> impl Iterator<Item = &Road> {
        self.roads.values()
    }

    /// Returns an iterator over all lanes.
    pub fn iter_lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values()
    }

    /// The road attached to the given side of an intersection, if any.
    pub fn road_by_side(&self, intersection: IntersectionId, side: ConnectionSide) -> Option<RoadId> {
        let anchor = Anchor { intersection, side };
        self.intersections.get(intersection)?.roads().iter().copied().find(|id| {
            self.roads
                .get(*id)
                .map_or(false, |r| r.near() == anchor || r.far() == Some(anchor))
        })
    }

    /// Where a road attaching at the given side meets the junction.
    pub fn side_position(
        &self,
        intersection: IntersectionId,
        side: ConnectionSide,
    ) -> Option<Point2d> {
        self.intersections
            .get(intersection)
            .map(|i| i.side_position(side))
    }

    /// The number of lanes attached to an intersection, over all its roads.
    pub fn lane_count(&self, intersection: IntersectionId) -> usize {
        self.intersections
            .get(intersection)
            .map_or(0, |intersection| {
                intersection
                    .roads()
                    .iter()
                    .filter_map(|id| self.roads.get(*id))
                    .map(|road| road.lanes().len())
                    .sum()
            })
    }

    pub(crate) fn intersection_mut(&mut self, id: IntersectionId) -> Option<&mut Intersection> {
        self.intersections.get_mut(id)
    }

    pub(crate) fn lane_mut(&mut self, id: LaneId) -> Option<&mut Lane> {
        self.lanes.get_mut(id)
    }

    fn side_occupied(&self, anchor: Anchor) -> bool {
        self.intersections
            .get(anchor.intersection)
            .map_or(false, |intersection| {
                intersection.roads().iter().any(|id| {
                    self.roads
                        .get(*id)
                        .map_or(false, |r| r.near() == anchor || r.far() == Some(anchor))
                })
            })
    }

    /// Places a road's endpoints from its anchors and distributes its lanes
    /// across the road's width, in insertion order.
    fn layout_road(&mut self, road: RoadId, config: &SimConfig) {
        let (near_pos, far_pos, fallback_axis, lane_ids, connecting) = {
            let road = match self.roads.get(road) {
                Some(r) => r,
                None => return,
            };
            let near = road.near();
            let near_pos = match self.intersections.get(near.intersection) {
                Some(i) => i.side_position(near.side),
                None => return,
            };
            let lane_ids: SmallVec<[LaneId; 8]> = road.lanes().iter().copied().collect();
            match road.far() {
                Some(far) => {
                    let far_pos = match self.intersections.get(far.intersection) {
                        Some(i) => i.side_position(far.side),
                        None => return,
                    };
                    (near_pos, far_pos, near.side.outward(), lane_ids, true)
                }
                None => {
                    let far_pos = near_pos + near.side.outward() * road.length();
                    (near_pos, far_pos, near.side.outward(), lane_ids, false)
                }
            }
        };

        let length = math::distance(near_pos, far_pos);
        if connecting {
            self.roads[road].set_length(length);
        }
        let axis = if length > f64::EPSILON {
            (far_pos - near_pos) / length
        } else {
            fallback_axis
        };
        let perp = math::rot90(axis);
        let heading_out = math::heading_of(axis);
        let heading_in = math::heading_of(-axis);
        let total_width = lane_ids.len() as f64 * config.lane_width;

        for (i, lane_id) in lane_ids.iter().enumerate() {
            let offset = (i as f64 + 0.5) * config.lane_width - 0.5 * total_width;
            let shift = perp * offset;
            if let Some(lane) = self.lanes.get_mut(*lane_id) {
                if lane.is_forward() {
                    lane.set_geometry(
                        near_pos + shift,
                        far_pos + shift,
                        heading_out,
                        0.5 * config.lane_width,
                    );
                } else {
                    lane.set_geometry(
                        far_pos + shift,
                        near_pos + shift,
                        heading_in,
                        0.5 * config.lane_width,
                    );
                }
            }
        }
    }
}
