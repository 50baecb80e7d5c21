use crate::config::SimConfig;
use crate::cycle::{Cycle, PriorityModel};
use crate::math::{Point2d, Vector2d};
use crate::util::Bounds;
use crate::{IntersectionId, LaneSet, RoadId};
use smallvec::SmallVec;

/// One of the four cardinal faces of an intersection a road may attach to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionSide {
    Up,
    Right,
    Down,
    Left,
}

impl ConnectionSide {
    pub const ALL: [ConnectionSide; 4] = [
        ConnectionSide::Up,
        ConnectionSide::Right,
        ConnectionSide::Down,
        ConnectionSide::Left,
    ];

    /// Unit vector pointing away from the intersection (screen coordinates).
    pub fn outward(self) -> Vector2d {
        match self {
            ConnectionSide::Up => Vector2d::new(0.0, -1.0),
            ConnectionSide::Right => Vector2d::new(1.0, 0.0),
            ConnectionSide::Down => Vector2d::new(0.0, 1.0),
            ConnectionSide::Left => Vector2d::new(-1.0, 0.0),
        }
    }
}

/// Weather over an intersection. The friction coefficient stretches the
/// braking distance of vehicles approaching it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Weather {
    Dry,
    Moist,
    Rain,
    HeavyRain,
    Snow,
    Ice,
}

impl Weather {
    fn friction(self) -> f64 {
        match self {
            Weather::Dry => 8.0,
            Weather::Moist => 7.0,
            Weather::Rain => 5.0,
            Weather::HeavyRain => 4.0,
            Weather::Snow => 3.0,
            Weather::Ice => 1.0,
        }
    }

    /// Multiplier applied to braking distances; 1.0 when dry.
    pub fn braking_factor(self) -> f64 {
        Weather::Dry.friction() / self.friction()
    }
}

/// A node of the road network. Owns its roads (connecting roads are shared
/// with the far intersection) and hosts the signal phase scheduler.
pub struct Intersection {
    id: IntersectionId,
    position: Point2d,
    width: f64,
    height: f64,
    weather: Weather,
    roads: SmallVec<[RoadId; 4]>,
    /// Vehicles currently crossing the junction.
    transit_count: u32,
    /// All vehicles that ever entered the junction.
    total_count: u32,
    cycle: Cycle,
}

impl Intersection {
    pub(crate) fn new(id: IntersectionId, position: Point2d, width: f64, height: f64) -> Self {
        Self {
            id,
            position,
            width,
            height,
            weather: Weather::Dry,
            roads: SmallVec::new(),
            transit_count: 0,
            total_count: 0,
            cycle: Cycle::new(),
        }
    }

    /// Gets the intersection's ID.
    pub fn id(&self) -> IntersectionId {
        self.id
    }

    /// The centre of the intersection.
    pub fn position(&self) -> Point2d {
        self.position
    }

    /// The footprint of the junction.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_centre(self.position, self.width, self.height)
    }

    /// The weather condition over the junction.
    pub fn weather(&self) -> Weather {
        self.weather
    }

    /// The roads attached to the intersection, in insertion order.
    pub fn roads(&self) -> &[RoadId] {
        &self.roads
    }

    /// The number of vehicles currently crossing the junction.
    pub fn transit_count(&self) -> u32 {
        self.transit_count
    }

    /// The number of vehicles that ever entered the junction.
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    /// The signal phase scheduler of this intersection.
    pub fn cycle(&self) -> &Cycle {
        &self.cycle
    }

    /// Where a road attaching at the given side meets the junction.
    pub fn side_position(&self, side: ConnectionSide) -> Point2d {
        let reach = match side {
            ConnectionSide::Up | ConnectionSide::Down => 0.5 * self.height,
            ConnectionSide::Left | ConnectionSide::Right => 0.5 * self.width,
        };
        self.position + side.outward() * reach
    }

    /// Named numeric readouts for display overlays.
    pub fn status(&self) -> [(&'static str, f64); 2] {
        [
            ("transit", self.transit_count as f64),
            ("total", self.total_count as f64),
        ]
    }

    /// Advances the phase scheduler.
    pub(crate) fn update(
        &mut self,
        dt: f64,
        lanes: &mut LaneSet,
        model: &dyn PriorityModel,
        config: &SimConfig,
    ) {
        self.cycle.update(dt, lanes, model, config);
    }

    pub(crate) fn cycle_mut(&mut self) -> &mut Cycle {
        &mut self.cycle
    }

    pub(crate) fn set_weather(&mut self, weather: Weather) {
        self.weather = weather;
    }

    pub(crate) fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub(crate) fn add_road(&mut self, road: RoadId) {
        self.roads.push(road);
    }

    pub(crate) fn enter_vehicle(&mut self) {
        self.transit_count += 1;
        self.total_count += 1;
    }

    pub(crate) fn exit_vehicle(&mut self) {
        debug_assert!(self.transit_count > 0, "intersection transit underflow");
        self.transit_count = self.transit_count.saturating_sub(1);
    }
}
