use crate::config::SimConfig;
use crate::cycle::{DemandModel, PriorityModel};
use crate::error::NetworkError;
use crate::intersection::{ConnectionSide, Intersection, Weather};
use crate::lane::Lane;
use crate::math::Point2d;
use crate::network::Network;
use crate::registry::VehicleRegistry;
use crate::road::Road;
use crate::vehicle::{Vehicle, VehicleKind};
use crate::{IntersectionId, LaneId, RoadId, VehicleId};
use rand::seq::SliceRandom;

/// A traffic simulation session.
///
/// Owns the road network, the vehicle registry and the session tuning, and
/// advances them tick by tick: the network (and with it every intersection's
/// phase scheduler) is updated before the vehicles, so a signal change is
/// visible to vehicles within the same tick.
pub struct Simulation {
    network: Network,
    vehicles: VehicleRegistry,
    model: Box<dyn PriorityModel>,
    config: SimConfig,
    /// The current frame of simulation.
    frame: usize,
    /// Simulated seconds since the session started.
    elapsed: f64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::with_config(SimConfig::default())
    }
}

impl Simulation {
    /// Creates a new simulation with default tuning.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a new simulation with the given tuning.
    pub fn with_config(config: SimConfig) -> Self {
        Self {
            network: Network::new(),
            vehicles: VehicleRegistry::new(),
            model: Box::new(DemandModel),
            config,
            frame: 0,
            elapsed: 0.0,
        }
    }

    /// Replaces the phase priority model.
    pub fn set_priority_model(&mut self, model: Box<dyn PriorityModel>) {
        self.model = model;
    }

    /// The session tuning.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Advances the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.update_network(dt);
        self.update_vehicles(dt);
        self.frame += 1;
        self.elapsed += dt;
    }

    /// Advances only the network: every intersection's phase scheduler.
    pub fn update_network(&mut self, dt: f64) {
        self.network.update(dt, &*self.model, &self.config);
    }

    /// Advances only the vehicles, then purges the finished ones.
    pub fn update_vehicles(&mut self, dt: f64) {
        self.vehicles.update(dt, &mut self.network, &self.config);
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Simulated seconds since the session started.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Adds an intersection centred on `position`.
    pub fn add_intersection(&mut self, position: Point2d) -> IntersectionId {
        self.network.add_intersection(position, &self.config)
    }

    /// Adds a stub road extending from the given side of an intersection.
    pub fn add_road(
        &mut self,
        intersection: IntersectionId,
        side: ConnectionSide,
        length: f64,
    ) -> Result<RoadId, NetworkError> {
        self.network.add_road(intersection, side, length, &self.config)
    }

    /// Adds a single shared road connecting two intersections.
    pub fn add_connecting_road(
        &mut self,
        a: IntersectionId,
        side_a: ConnectionSide,
        b: IntersectionId,
        side_b: ConnectionSide,
    ) -> Result<RoadId, NetworkError> {
        self.network
            .add_connecting_road(a, side_a, b, side_b, &self.config)
    }

    /// Adds a lane to a road.
    pub fn add_lane(&mut self, road: RoadId, forward: bool) -> Result<LaneId, NetworkError> {
        self.network.add_lane(road, forward, &self.config)
    }

    /// Deletes a lane; fails while vehicles occupy it.
    pub fn delete_lane(&mut self, lane: LaneId) -> Result<(), NetworkError> {
        self.network.delete_lane(lane, &self.config)
    }

    /// Adds a signal phase controlling the given lanes to an intersection's
    /// cycle, returning the phase's display number.
    pub fn add_phase(
        &mut self,
        intersection: IntersectionId,
        cycle_time: f64,
        controlled: &[LaneId],
    ) -> Result<usize, NetworkError> {
        self.network.add_phase(intersection, cycle_time, controlled)
    }

    /// Resets the phase timers of an intersection's cycle.
    pub fn reload_cycle(&mut self, intersection: IntersectionId) -> Result<(), NetworkError> {
        self.network.reload_cycle(intersection)
    }

    /// Sets the weather condition over an intersection.
    pub fn set_weather(
        &mut self,
        intersection: IntersectionId,
        weather: Weather,
    ) -> Result<(), NetworkError> {
        self.network.set_weather(intersection, weather)
    }

    /// Resizes an intersection and re-lays-out its roads and lanes.
    pub fn reload_intersection(
        &mut self,
        intersection: IntersectionId,
        width: f64,
        height: f64,
    ) -> Result<(), NetworkError> {
        self.network
            .reload_intersection(intersection, width, height, &self.config)
    }

    /// Recomputes the geometry of everything attached to an intersection.
    pub fn reassign_road_positions(
        &mut self,
        intersection: IntersectionId,
    ) -> Result<(), NetworkError> {
        self.network.reassign_road_positions(intersection, &self.config)
    }

    /// Gets an intersection by ID.
    pub fn get_intersection(&self, id: IntersectionId) -> Option<&Intersection> {
        self.network.intersection(id)
    }

    /// Gets a road by ID.
    pub fn get_road(&self, id: RoadId) -> Option<&Road> {
        self.network.road(id)
    }

    /// Gets a lane by ID.
    pub fn get_lane(&self, id: LaneId) -> Option<&Lane> {
        self.network.lane(id)
    }

    /// Gets a vehicle by ID.
    pub fn get_vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    /// Returns an iterator over all the intersections in the simulation.
    pub fn iter_intersections(&self) -> impl Iterator<Item = &Intersection> {
        self.network.iter_intersections()
    }

    /// Returns an iterator over all the roads in the simulation.
    pub fn iter_roads(&self) -> impl Iterator<Item = &Road> {
        self.network.iter_roads()
    }

    /// Returns an iterator over all the lanes in the simulation.
    pub fn iter_lanes(&self) -> impl Iterator<Item = &Lane> {
        self.network.iter_lanes()
    }

    /// Returns an iterator over the active vehicles, in insertion order.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.iter()
    }

    /// The road attached to the given side of an intersection, if any.
    pub fn road_by_side(
        &self,
        intersection: IntersectionId,
        side: ConnectionSide,
    ) -> Option<RoadId> {
        self.network.road_by_side(intersection, side)
    }

    /// Where a road attaching at the given side meets the junction.
    pub fn side_position(
        &self,
        intersection: IntersectionId,
        side: ConnectionSide,
    ) -> Option<Point2d> {
        self.network.side_position(intersection, side)
    }

    /// The number of lanes attached to an intersection, over all its roads.
    pub fn lane_count(&self, intersection: IntersectionId) -> usize {
        self.network.lane_count(intersection)
    }

    /// Creates a vehicle following the given route of lanes.
    pub fn spawn_vehicle(
        &mut self,
        kind: VehicleKind,
        route: &[LaneId],
    ) -> Result<VehicleId, NetworkError> {
        self.vehicles.spawn(&mut self.network, kind, route)
    }

    /// Creates a vehicle on a random approach lane, exiting through a random
    /// departing lane of the junction it leads to. Returns `None` when the
    /// network has no approach lane to spawn onto.
    pub fn spawn_vehicle_random(&mut self, kind: VehicleKind) -> Option<VehicleId> {
        let mut rng = rand::thread_rng();
        let approaches: Vec<LaneId> = self
            .network
            .iter_lanes()
            .filter(|lane| {
                self.network
                    .intersection(lane.destination())
                    .map_or(false, |junction| junction.bounds().contains(lane.end()))
            })
            .map(|lane| lane.id())
            .collect();
        let &entry = approaches.choose(&mut rng)?;
        let bounds = self
            .network
            .intersection(self.network.lane(entry)?.destination())?
            .bounds();
        let exits: Vec<LaneId> = self
            .network
            .iter_lanes()
            .filter(|lane| lane.id() != entry && bounds.contains(lane.start()))
            .map(|lane| lane.id())
            .collect();
        let route = match exits.choose(&mut rng) {
            Some(&exit) => vec![entry, exit],
            None => vec![entry],
        };
        self.vehicles.spawn(&mut self.network, kind, &route).ok()
    }

    /// Marks a vehicle for removal at the end of the next update pass.
    pub fn retire_vehicle(&mut self, id: VehicleId) -> bool {
        self.vehicles.retire(id, &mut self.network)
    }

    /// Marks every vehicle for removal.
    pub fn retire_all_vehicles(&mut self) {
        self.vehicles.retire_all(&mut self.network)
    }

    /// The number of active vehicles.
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Total vehicles ever spawned in this session.
    pub fn vehicles_spawned(&self) -> usize {
        self.vehicles.spawned()
    }
}
