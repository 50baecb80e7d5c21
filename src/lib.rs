pub use cgmath;
pub use config::SimConfig;
pub use cycle::{Cycle, DemandModel, PhaseScore, PriorityModel};
pub use error::NetworkError;
pub use intersection::{ConnectionSide, Intersection, Weather};
pub use lane::Lane;
pub use network::Network;
pub use phase::Phase;
pub use registry::VehicleRegistry;
pub use road::Road;
pub use simulation::Simulation;
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use util::{Bounds, Interval};
pub use vehicle::{Vehicle, VehicleKind, VehicleState};

mod config;
mod cycle;
mod error;
mod intersection;
mod lane;
pub mod math;
mod network;
mod phase;
mod registry;
mod road;
mod simulation;
mod util;
mod vehicle;

new_key_type! {
    /// Unique ID of an [Intersection].
    pub struct IntersectionId;
    /// Unique ID of a [Road].
    pub struct RoadId;
    /// Unique ID of a [Lane].
    pub struct LaneId;
    /// Unique ID of a [Vehicle].
    pub struct VehicleId;
}

type IntersectionSet = SlotMap<IntersectionId, Intersection>;
type RoadSet = SlotMap<RoadId, Road>;
type LaneSet = SlotMap<LaneId, Lane>;
type VehicleSet = SlotMap<VehicleId, Vehicle>;
