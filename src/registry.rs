use crate::config::SimConfig;
use crate::error::NetworkError;
use crate::network::Network;
use crate::vehicle::{Vehicle, VehicleKind, VehicleState};
use crate::{LaneId, VehicleId, VehicleSet};
use std::collections::VecDeque;

/// The collection of active vehicles.
///
/// Vehicles are updated in insertion order, which is tracked explicitly so
/// slot reuse cannot reorder them. Removal is deferred: a finished vehicle is
/// tombstoned with [VehicleState::Delete] and reclaimed by a sweep after the
/// update pass, so following-references held by other vehicles never observe
/// a mid-tick disappearance.
#[derive(Default)]
pub struct VehicleRegistry {
    vehicles: VehicleSet,
    /// Active vehicles in insertion order.
    order: Vec<VehicleId>,
    /// Number of vehicles awaiting the sweep; bounds its cost.
    pending: usize,
    /// Total vehicles ever spawned; also the display number sequence.
    spawned: usize,
}

impl VehicleRegistry {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    /// Creates a vehicle at the start of the first lane of `route` and
    /// registers it on that lane, chaining it behind the lane's most recent
    /// entrant for car following.
    pub(crate) fn spawn(
        &mut self,
        network: &mut Network,
        kind: VehicleKind,
        route: &[LaneId],
    ) -> Result<VehicleId, NetworkError> {
        let (&source, rest) = route.split_first().ok_or(NetworkError::EmptyRoute)?;
        for id in route {
            if network.lane(*id).is_none() {
                return Err(NetworkError::LaneNotFound(*id));
            }
        }
        let lane = match network.lane(source) {
            Some(lane) => lane,
            None => return Err(NetworkError::LaneNotFound(source)),
        };
        let position = lane.start();
        let heading = lane.heading();
        let junction = lane.destination();
        let in_front = lane.last_vehicle();

        self.spawned += 1;
        let number = self.spawned;
        let remaining: VecDeque<LaneId> = rest.iter().copied().collect();
        let id = self.vehicles.insert_with_key(|id| {
            Vehicle::new(
                id, number, kind, remaining, source, position, heading, junction, in_front,
            )
        });

        if let Some(lane) = network.lane_mut(source) {
            lane.set_last_vehicle(id);
            lane.add_occupant();
        }
        self.order.push(id);
        log::debug!("vehicle {} spawned on lane {:?}", number, source);
        Ok(id)
    }

    /// Advances all vehicles by `dt` seconds, then reclaims the finished ones.
    pub(crate) fn update(&mut self, dt: f64, network: &mut Network, config: &SimConfig) {
        for idx in 0..self.order.len() {
            let id = self.order[idx];
            match self.vehicles.get_mut(id) {
                Some(vehicle) if vehicle.state() != VehicleState::Delete => {
                    vehicle.prune_route(network);
                }
                _ => continue,
            }
            let decision = self.vehicles[id].decide(network, &self.vehicles, config);
            let vehicle = &mut self.vehicles[id];
            vehicle.apply_decision(decision, network, &mut self.pending, config);
            vehicle.apply_changes(dt, config);
        }
        self.sweep();
    }

    /// Marks a vehicle for removal, releasing its lane. Returns false if it
    /// is unknown or already on its way out.
    pub(crate) fn retire(&mut self, id: VehicleId, network: &mut Network) -> bool {
        match self.vehicles.get_mut(id) {
            Some(vehicle) if vehicle.state() != VehicleState::Delete => {
                vehicle.release(network);
                self.pending += 1;
                true
            }
            _ => false,
        }
    }

    /// Marks every vehicle for removal.
    pub(crate) fn retire_all(&mut self, network: &mut Network) {
        let ids: Vec<VehicleId> = self.order.clone();
        for id in ids {
            self.retire(id, network);
        }
    }

    /// Removes tombstoned vehicles. The pending counter bounds the work to
    /// exactly the number awaiting removal.
    fn sweep(&mut self) {
        if self.pending == 0 {
            return;
        }
        let Self {
            vehicles,
            order,
            pending,
            ..
        } = self;
        order.retain(|id| {
            let done = *pending > 0
                && vehicles
                    .get(*id)
                    .map_or(false, |v| v.state() == VehicleState::Delete);
            if done {
                vehicles.remove(*id);
                *pending -= 1;
            }
            !done
        });
        debug_assert_eq!(*pending, 0, "sweep missed a tombstoned vehicle");
    }

    /// Gets a vehicle by ID.
    pub fn get(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    /// Iterates over the active vehicles in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> {
        self.order.iter().filter_map(move |id| self.vehicles.get(*id))
    }

    /// The number of active vehicles, including those awaiting the sweep.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no vehicles are active.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total vehicles ever spawned in this session.
    pub fn spawned(&self) -> usize {
        self.spawned
    }
}
