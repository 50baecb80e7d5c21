/// Tuning parameters for one simulation session. Each [`Simulation`] owns its
/// own copy, so sessions can run with different tunings side by side.
///
/// [`Simulation`]: crate::Simulation
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Multiplier applied to all speeds and accelerations, so the perceived
    /// simulation speed stays constant across variable tick lengths.
    pub speed_scale: f64,
    /// Minimum gap to keep behind the vehicle ahead, in m.
    pub min_following_gap: f64,
    /// Minimum gap to keep before the stop line of a blocked lane, in m.
    pub min_stop_gap: f64,
    /// Width of a single lane, in m.
    pub lane_width: f64,
    /// Footprint of a newly created intersection, in m.
    pub intersection_width: f64,
    pub intersection_height: f64,
    /// Whether vehicles keep accelerating, at half their maximum rate,
    /// while crossing an intersection.
    pub accelerate_in_turns: bool,
    /// Bounds on the green duration assigned to a signal phase, in s.
    pub min_cycle_time: f64,
    pub max_cycle_time: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            speed_scale: 1.0,
            min_following_gap: 8.0,
            min_stop_gap: 4.0,
            lane_width: 4.0,
            intersection_width: 100.0,
            intersection_height: 100.0,
            accelerate_in_turns: true,
            min_cycle_time: 4.0,
            max_cycle_time: 30.0,
        }
    }
}
