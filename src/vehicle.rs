use crate::config::SimConfig;
use crate::math::{self, Point2d};
use crate::network::Network;
use crate::{IntersectionId, LaneId, VehicleId, VehicleSet};
use std::collections::VecDeque;

/// The kind of a simulated vehicle, fixing its performance envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VehicleKind {
    Car,
    Truck,
    Motorcycle,
}

impl VehicleKind {
    /// Maximum speed in m/s.
    pub fn max_speed(self) -> f64 {
        match self {
            VehicleKind::Car => 27.8,
            VehicleKind::Truck => 22.2,
            VehicleKind::Motorcycle => 30.5,
        }
    }

    /// Maximum forward acceleration in m/s^2.
    pub fn max_acceleration(self) -> f64 {
        match self {
            VehicleKind::Car => 2.5,
            VehicleKind::Truck => 1.5,
            VehicleKind::Motorcycle => 3.0,
        }
    }

    /// Maximum braking acceleration, a negative number in m/s^2.
    pub fn min_acceleration(self) -> f64 {
        match self {
            VehicleKind::Car => -4.5,
            VehicleKind::Truck => -3.5,
            VehicleKind::Motorcycle => -5.0,
        }
    }

    /// Half the vehicle's length in m.
    pub fn half_length(self) -> f64 {
        match self {
            VehicleKind::Car => 2.25,
            VehicleKind::Truck => 4.5,
            VehicleKind::Motorcycle => 1.1,
        }
    }
}

/// The drive state of a vehicle, re-evaluated once per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VehicleState {
    Drive,
    Stop,
    Turn,
    Delete,
}

/// The outcome of one evaluation of the drive policy, applied before the
/// kinematic integration of the same tick.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Decision {
    /// Too close to the vehicle ahead.
    Follow,
    /// First tick inside the destination junction's footprint.
    EnterJunction { turn_rate: f64 },
    /// Still crossing the junction.
    Transit,
    /// Approaching the stop line of a blocked lane.
    Hold,
    /// The target lane's footprint has been reached.
    Arrive,
    /// Route exhausted and clear of the final lane.
    Exit,
    /// Nothing in the way.
    Cruise,
}

/// A moving agent consuming a planned route of lanes.
pub struct Vehicle {
    id: VehicleId,
    /// Display sequence number, unique within the session.
    number: usize,
    kind: VehicleKind,
    position: Point2d,
    /// Heading in degrees, 0 pointing straight up.
    heading: f64,
    /// Speed in m/s; never negative, never above the kind's maximum.
    speed: f64,
    acceleration: f64,
    /// Angular velocity in degrees per metre while crossing a junction.
    turn_rate: f64,
    state: VehicleState,
    /// Lanes not yet entered; the front element is the target lane.
    route: VecDeque<LaneId>,
    /// The lane the vehicle is on, released while crossing a junction.
    source: Option<LaneId>,
    target: Option<LaneId>,
    /// The intersection the current lane leads to.
    junction: IntersectionId,
    /// The junction being crossed, if any.
    prev_junction: Option<IntersectionId>,
    /// The vehicle immediately ahead on the same lane, resolved lazily so a
    /// deleted vehicle is detected rather than dangling.
    in_front: Option<VehicleId>,
}

impl Vehicle {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: VehicleId,
        number: usize,
        kind: VehicleKind,
        route: VecDeque<LaneId>,
        source: LaneId,
        position: Point2d,
        heading: f64,
        junction: IntersectionId,
        in_front: Option<VehicleId>,
    ) -> Self {
        let target = route.front().copied();
        Self {
            id,
            number,
            kind,
            position,
            heading,
            speed: 0.0,
            acceleration: kind.max_acceleration(),
            turn_rate: 0.0,
            state: VehicleState::Drive,
            route,
            source: Some(source),
            target,
            junction,
            prev_junction: None,
            in_front,
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// The vehicle's display sequence number.
    pub fn number(&self) -> usize {
        self.number
    }

    /// The vehicle's kind.
    pub fn kind(&self) -> VehicleKind {
        self.kind
    }

    /// The position of the vehicle's centre.
    pub fn position(&self) -> Point2d {
        self.position
    }

    /// The vehicle's heading in degrees.
    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// The vehicle's speed in m/s.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// The vehicle's drive state.
    pub fn state(&self) -> VehicleState {
        self.state
    }

    /// The lane the vehicle is on, if it is not crossing a junction.
    pub fn source_lane(&self) -> Option<LaneId> {
        self.source
    }

    /// The next lane on the vehicle's route.
    pub fn target_lane(&self) -> Option<LaneId> {
        self.target
    }

    /// The intersection the vehicle's current lane leads to.
    pub fn junction(&self) -> IntersectionId {
        self.junction
    }

    /// The junction currently being crossed, if any.
    pub fn previous_junction(&self) -> Option<IntersectionId> {
        self.prev_junction
    }

    /// The vehicle immediately ahead, which may have left the simulation;
    /// resolve against the registry before use.
    pub fn vehicle_in_front(&self) -> Option<VehicleId> {
        self.in_front
    }

    /// Named numeric readouts for display overlays.
    pub fn status(&self) -> [(&'static str, f64); 2] {
        [
            ("id", self.number as f64),
            ("speed_kmh", math::mps_to_kmh(self.speed)),
        ]
    }

    /// Drops leading route entries whose lanes have been deleted since the
    /// vehicle spawned, so the route always targets an existing lane.
    pub(crate) fn prune_route(&mut self, network: &Network) {
        while let Some(id) = self.target {
            if network.lane(id).is_some() {
                break;
            }
            self.route.pop_front();
            self.target = self.route.front().copied();
            log::debug!("vehicle {} dropped deleted lane {:?} from its route", self.number, id);
        }
    }

    /// Evaluates the drive policy for this tick. Checks are ordered by
    /// priority: car following, junction transit, stop lines, lane arrival,
    /// route completion.
    pub(crate) fn decide(
        &self,
        network: &Network,
        vehicles: &VehicleSet,
        config: &SimConfig,
    ) -> Decision {
        let braking_factor = network
            .intersection(self.junction)
            .map(|i| i.weather().braking_factor())
            .unwrap_or(1.0);
        let braking =
            math::braking_distance(self.speed, self.kind.min_acceleration()) * braking_factor;

        // Keep distance from the vehicle ahead, unless it is on its way out.
        if let Some(front) = self.in_front.and_then(|id| vehicles.get(id)) {
            if front.state != VehicleState::Delete {
                let gap = math::distance(self.position, front.position);
                if gap < braking + config.min_following_gap || gap < config.min_following_gap {
                    return Decision::Follow;
                }
            }
        }

        // Inside the junction footprint: begin or continue the turn. With no
        // target lane left there is nothing to turn onto, and the vehicle
        // simply drives on until it clears its final lane.
        if let Some(junction) = network.intersection(self.junction) {
            if self.target.is_some() && junction.bounds().contains(self.position) {
                if let (Some(src), Some(dst)) = (
                    self.source.and_then(|id| network.lane(id)),
                    self.target.and_then(|id| network.lane(id)),
                ) {
                    let chord = math::distance(src.end(), dst.start());
                    let angle = math::normalize_angle(src.heading() - dst.heading());
                    return Decision::EnterJunction {
                        turn_rate: math::turn_rate(chord, angle),
                    };
                }
                return Decision::Transit;
            }
        }

        // Red light: stop before the lane's stop line.
        if let Some(lane) = self.source.and_then(|id| network.lane(id)) {
            if lane.is_blocked() {
                let dist = math::distance(self.position, lane.end());
                if dist > self.kind.half_length() && dist < braking + config.min_stop_gap {
                    return Decision::Hold;
                }
            }
        }

        // Landed on the target lane: finalize the transfer.
        if let Some(lane) = self.target.and_then(|id| network.lane(id)) {
            if lane.bounds().contains(self.position) {
                return Decision::Arrive;
            }
        }

        // No route left: once clear of the final lane, the vehicle is done.
        if self.target.is_none() {
            match self.source.and_then(|id| network.lane(id)) {
                Some(lane) => {
                    if !lane.bounds().contains(self.position) {
                        return Decision::Exit;
                    }
                }
                // Both lanes gone: the target was deleted mid-crossing, so
                // the route ends here.
                None => return Decision::Exit,
            }
        }

        Decision::Cruise
    }

    /// Applies a drive decision, mutating lane occupancy, junction counters
    /// and the following chain on the vehicle's behalf.
    pub(crate) fn apply_decision(
        &mut self,
        decision: Decision,
        network: &mut Network,
        pending: &mut usize,
        config: &SimConfig,
    ) {
        match decision {
            Decision::Follow | Decision::Hold => {
                self.state = VehicleState::Stop;
                self.acceleration = self.kind.min_acceleration();
            }
            Decision::EnterJunction { turn_rate } => {
                if let Some(source) = self.source.take() {
                    if let Some(lane) = network.lane_mut(source) {
                        lane.remove_occupant();
                        lane.clear_last_vehicle(self.id);
                    }
                    if let Some(junction) = network.intersection_mut(self.junction) {
                        junction.enter_vehicle();
                    }
                    self.prev_junction = Some(self.junction);
                    self.turn_rate = turn_rate;
                }
                self.state = VehicleState::Turn;
                self.acceleration = self.turning_acceleration(config);
            }
            Decision::Transit => {
                self.state = VehicleState::Turn;
                self.acceleration = self.turning_acceleration(config);
            }
            Decision::Arrive => {
                if let Some(prev) = self.prev_junction.take() {
                    if let Some(junction) = network.intersection_mut(prev) {
                        junction.exit_vehicle();
                    }
                }
                if let Some(target) = self.target.take() {
                    self.route.pop_front();
                    self.target = self.route.front().copied();
                    if let Some(lane) = network.lane_mut(target) {
                        self.in_front = lane.last_vehicle();
                        lane.set_last_vehicle(self.id);
                        lane.add_occupant();
                        self.heading = lane.heading();
                        self.junction = lane.destination();
                    }
                    self.source = Some(target);
                    self.turn_rate = 0.0;
                    log::trace!("vehicle {} transferred to lane {:?}", self.number, target);
                }
                self.state = VehicleState::Drive;
                self.acceleration = self.kind.max_acceleration();
            }
            Decision::Exit => {
                self.release(network);
                *pending += 1;
            }
            Decision::Cruise => {
                self.state = VehicleState::Drive;
                self.acceleration = self.kind.max_acceleration();
            }
        }
    }

    /// Releases the current lane, settles the junction transit count if the
    /// vehicle was mid-crossing, and marks it for the next sweep.
    pub(crate) fn release(&mut self, network: &mut Network) {
        if let Some(source) = self.source.take() {
            if let Some(lane) = network.lane_mut(source) {
                lane.remove_occupant();
                lane.clear_last_vehicle(self.id);
            }
        }
        if let Some(prev) = self.prev_junction.take() {
            if let Some(junction) = network.intersection_mut(prev) {
                junction.exit_vehicle();
            }
        }
        self.state = VehicleState::Delete;
        log::debug!("vehicle {} marked for removal", self.number);
    }

    /// Integrates speed, heading and position over the tick. Scaling by the
    /// tick length keeps the perceived speed constant at any tick rate.
    pub(crate) fn apply_changes(&mut self, dt: f64, config: &SimConfig) {
        let scale = config.speed_scale;

        self.speed += self.acceleration * dt * scale;
        if self.speed > self.kind.max_speed() {
            self.speed = self.kind.max_speed();
            self.acceleration = self.kind.min_acceleration();
        }
        if self.speed < 0.0 {
            self.speed = 0.0;
        }

        // Rotating in proportion to distance travelled gives a constant
        // turning radius.
        self.heading += self.turn_rate * dt * self.speed * scale;

        let movement = math::rotate_deg(math::forward(), self.heading);
        self.position += movement * (self.speed * dt * scale);
    }

    fn turning_acceleration(&self, config: &SimConfig) -> f64 {
        if config.accelerate_in_turns {
            self.kind.max_acceleration() / 2.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Places a follower behind a leader at a fixed gap and evaluates the
    /// drive policy at the given follower speed.
    fn follows_at(speed: f64, gap: f64) -> bool {
        let network = Network::new();
        let config = SimConfig::default();
        let mut vehicles = VehicleSet::default();
        let leader = vehicles.insert_with_key(|id| {
            Vehicle::new(
                id,
                1,
                VehicleKind::Car,
                VecDeque::from([LaneId::default()]),
                LaneId::default(),
                Point2d::new(0.0, -gap),
                0.0,
                IntersectionId::default(),
                None,
            )
        });
        let follower = vehicles.insert_with_key(|id| {
            Vehicle::new(
                id,
                2,
                VehicleKind::Car,
                VecDeque::from([LaneId::default()]),
                LaneId::default(),
                Point2d::new(0.0, 0.0),
                0.0,
                IntersectionId::default(),
                Some(leader),
            )
        });
        vehicles[follower].speed = speed;
        matches!(
            vehicles[follower].decide(&network, &vehicles, &config),
            Decision::Follow
        )
    }

    #[test]
    fn faster_followers_only_move_towards_braking() {
        let gap = 40.0;
        assert!(!follows_at(0.0, gap));
        assert!(follows_at(VehicleKind::Car.max_speed(), gap));

        // Raising the speed at a fixed gap may start braking, never end it.
        let mut braking = false;
        for speed in 0..=28 {
            let follows = follows_at(f64::from(speed), gap);
            if braking {
                assert!(follows, "braking stopped again at {speed} m/s");
            }
            braking = follows;
        }
        assert!(braking);
    }
}
