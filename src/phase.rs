use crate::{LaneId, LaneSet};
use smallvec::SmallVec;

/// A single traffic-light phase of one intersection's cycle.
///
/// While a phase is open, the lanes it controls are unblocked; while it is
/// closed they are blocked and the phase accumulates waiting time, which
/// feeds the priority ranking.
#[derive(Clone, Debug)]
pub struct Phase {
    /// Display number, unique within the owning cycle.
    number: usize,
    lanes: SmallVec<[LaneId; 4]>,
    open: bool,
    /// Green duration in s, reassigned by the priority model while closed.
    cycle_time: f64,
    /// Time spent in the current open period, in s.
    elapsed: f64,
    /// Time since the phase last closed, in s.
    wait: f64,
    /// The latest score assigned by the priority model.
    priority: f64,
}

impl Phase {
    pub(crate) fn new(number: usize, lanes: SmallVec<[LaneId; 4]>, cycle_time: f64) -> Self {
        Self {
            number,
            lanes,
            open: false,
            cycle_time,
            elapsed: 0.0,
            wait: 0.0,
            priority: 0.0,
        }
    }

    /// The phase's display number within its cycle.
    pub fn number(&self) -> usize {
        self.number
    }

    /// The lanes this phase controls.
    pub fn lanes(&self) -> &[LaneId] {
        &self.lanes
    }

    /// Whether the phase is currently open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The green duration currently assigned to the phase, in s.
    pub fn cycle_time(&self) -> f64 {
        self.cycle_time
    }

    /// The latest priority score assigned to the phase.
    pub fn priority(&self) -> f64 {
        self.priority
    }

    /// Time since the phase last closed, in s.
    pub fn wait(&self) -> f64 {
        self.wait
    }

    /// Named numeric readouts for display overlays.
    pub fn status(&self) -> [(&'static str, f64); 3] {
        [
            ("open", if self.open { 1.0 } else { 0.0 }),
            ("priority", self.priority),
            ("wait_s", self.wait),
        ]
    }

    /// The raw metrics fed to the priority model: total queue length over the
    /// controlled lanes, then waiting time.
    pub(crate) fn inputs(&self, lanes: &LaneSet) -> [f64; 2] {
        let queue: u32 = self
            .lanes
            .iter()
            .filter_map(|id| lanes.get(*id))
            .map(|lane| lane.occupancy())
            .sum();
        [queue as f64, self.wait]
    }

    /// Advances the phase timer, closing the phase when its time is up.
    pub(crate) fn update(&mut self, dt: f64, lanes: &mut LaneSet) {
        if self.open {
            self.elapsed += dt;
            if self.elapsed >= self.cycle_time {
                self.close(lanes);
            }
        } else {
            self.wait += dt;
        }
    }

    /// Opens the phase, unblocking its lanes.
    pub(crate) fn open(&mut self, lanes: &mut LaneSet) {
        self.open = true;
        self.elapsed = 0.0;
        self.wait = 0.0;
        self.set_blocked(lanes, false);
        log::debug!("phase {} opened for {:.1}s", self.number, self.cycle_time);
    }

    /// Closes the phase, blocking its lanes.
    pub(crate) fn close(&mut self, lanes: &mut LaneSet) {
        self.open = false;
        self.set_blocked(lanes, true);
        log::debug!("phase {} closed", self.number);
    }

    /// Resets the phase timers without changing its open state.
    pub(crate) fn reload(&mut self) {
        self.elapsed = 0.0;
        self.wait = 0.0;
    }

    pub(crate) fn set_score(&mut self, priority: f64, cycle_time: f64) {
        self.priority = priority;
        self.cycle_time = cycle_time;
    }

    pub(crate) fn set_blocked(&mut self, lanes: &mut LaneSet, blocked: bool) {
        for id in &self.lanes {
            if let Some(lane) = lanes.get_mut(*id) {
                lane.set_blocked(blocked);
            }
        }
    }
}
