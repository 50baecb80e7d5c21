use crate::config::SimConfig;
use crate::phase::Phase;
use crate::{LaneId, LaneSet};
use itertools::Itertools;
use smallvec::SmallVec;
use std::cmp::Ordering;

/// The score an external priority model assigns to one closed phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseScore {
    /// Relative priority; higher means sooner to open.
    pub priority: f64,
    /// Suggested green duration as a fraction of the maximum cycle time.
    pub duration_frac: f64,
}

/// An opaque scoring function ranking closed phases.
///
/// `inputs` are the phase's raw metrics: queue length first, then waiting
/// time in seconds. The scheduler calls this once per closed phase per
/// re-ranking pass; implementations must be pure.
pub trait PriorityModel {
    fn evaluate(&self, inputs: &[f64]) -> PhaseScore;
}

/// A simple demand-proportional stand-in for an externally trained model:
/// ranks phases by queue length with a small weight on waiting time.
#[derive(Clone, Copy, Debug, Default)]
pub struct DemandModel;

impl PriorityModel for DemandModel {
    fn evaluate(&self, inputs: &[f64]) -> PhaseScore {
        let queue = inputs.first().copied().unwrap_or(0.0);
        let wait = inputs.get(1).copied().unwrap_or(0.0);
        PhaseScore {
            priority: queue + 0.05 * wait,
            duration_frac: (queue / 10.0).min(1.0),
        }
    }
}

/// The per-intersection phase scheduler.
///
/// The last phase in the list is the open one; all others are closed and are
/// continuously re-ranked so that the best candidate sits next to the open
/// slot. When the open phase's timer expires, the last two positions swap
/// and the new last phase opens.
#[derive(Default)]
pub struct Cycle {
    phases: Vec<Phase>,
    next_number: usize,
}

impl Cycle {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    /// The phases of the cycle. The open phase, if any, is last.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// The currently open phase.
    pub fn open_phase(&self) -> Option<&Phase> {
        self.phases.last().filter(|phase| phase.is_open())
    }

    /// Gets a phase by its display number.
    pub fn get_phase(&self, number: usize) -> Option<&Phase> {
        self.phases.iter().find(|phase| phase.number() == number)
    }

    /// Adds a phase controlling the given lanes. Phases start closed, so the
    /// controlled lanes are blocked until the first rotation opens them.
    pub(crate) fn add_phase(
        &mut self,
        controlled: SmallVec<[LaneId; 4]>,
        cycle_time: f64,
        lanes: &mut LaneSet,
    ) -> usize {
        self.next_number += 1;
        let number = self.next_number;
        let mut phase = Phase::new(number, controlled, cycle_time);
        phase.set_blocked(lanes, true);
        self.phases.push(phase);
        log::debug!("phase {} added", number);
        number
    }

    /// Resets all phase timers.
    pub(crate) fn reload(&mut self) {
        for phase in &mut self.phases {
            phase.reload();
        }
    }

    /// Advances phase timers, then rotates or re-ranks.
    pub(crate) fn update(
        &mut self,
        dt: f64,
        lanes: &mut LaneSet,
        model: &dyn PriorityModel,
        config: &SimConfig,
    ) {
        for phase in &mut self.phases {
            phase.update(dt, lanes);
        }
        self.rotate(lanes, model, config);
    }

    fn rotate(&mut self, lanes: &mut LaneSet, model: &dyn PriorityModel, config: &SimConfig) {
        let n = self.phases.len();
        if n >= 2 {
            if !self.phases[n - 1].is_open() {
                // The open slot expired: the best-ranked closed phase sits
                // next to it, so a single swap advances the round.
                self.phases.swap(n - 1, n - 2);
                self.phases[n - 1].open(lanes);
                log::trace!(
                    "phase order: {}",
                    self.phases.iter().map(|p| p.number().to_string()).join(" -> ")
                );
            } else {
                self.score_phases(lanes, model, config);
                // Stable ascending sort of the closed phases; waiting time
                // breaks score ties so no starved phase is passed over
                // forever and equal scores cannot oscillate.
                self.phases[..n - 1].sort_by(|a, b| {
                    (a.priority(), a.wait())
                        .partial_cmp(&(b.priority(), b.wait()))
                        .unwrap_or(Ordering::Equal)
                });
            }
        } else if let Some(phase) = self.phases.last_mut() {
            if !phase.is_open() {
                phase.open(lanes);
            }
        }
    }

    /// Scores every closed phase. A phase with no queued demand is forced to
    /// zero priority and the minimum green time, so it still gets a turn.
    fn score_phases(&mut self, lanes: &LaneSet, model: &dyn PriorityModel, config: &SimConfig) {
        let n = self.phases.len();
        for phase in &mut self.phases[..n - 1] {
            let inputs = phase.inputs(lanes);
            if inputs[0] > 0.0 {
                let score = model.evaluate(&inputs);
                let duration = (score.duration_frac * config.max_cycle_time)
                    .clamp(config.min_cycle_time, config.max_cycle_time);
                phase.set_score(score.priority, duration);
            } else {
                phase.set_score(0.0, config.min_cycle_time);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{IntersectionId, RoadId};
    use smallvec::smallvec;

    fn lane_set(occupancies: &[u32]) -> (LaneSet, Vec<LaneId>) {
        let mut lanes = LaneSet::default();
        let mut ids = vec![];
        for occ in occupancies {
            let id = lanes.insert_with_key(|id| {
                crate::lane::Lane::new(id, RoadId::default(), IntersectionId::default(), true)
            });
            for _ in 0..*occ {
                lanes[id].add_occupant();
            }
            ids.push(id);
        }
        (lanes, ids)
    }

    fn open_numbers(cycle: &Cycle) -> Vec<usize> {
        cycle
            .phases()
            .iter()
            .filter(|p| p.is_open())
            .map(|p| p.number())
            .collect()
    }

    #[test]
    fn two_phases_alternate() {
        let (mut lanes, ids) = lane_set(&[2, 2]);
        let mut cycle = Cycle::new();
        let a = cycle.add_phase(smallvec![ids[0]], 5.0, &mut lanes);
        let b = cycle.add_phase(smallvec![ids[1]], 5.0, &mut lanes);
        let config = SimConfig::default();

        let mut openings = vec![];
        for _ in 0..240 {
            cycle.update(0.5, &mut lanes, &DemandModel, &config);
            let open = open_numbers(&cycle);
            assert_eq!(open.len(), 1, "exactly one phase open");
            if openings.last() != Some(&open[0]) {
                openings.push(open[0]);
            }
        }

        // Strict alternation, both phases served repeatedly.
        for pair in openings.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
        assert!(openings.iter().filter(|n| **n == a).count() >= 3);
        assert!(openings.iter().filter(|n| **n == b).count() >= 3);
    }

    #[test]
    fn zero_demand_phase_still_opens() {
        let (mut lanes, ids) = lane_set(&[5, 0, 0]);
        let mut cycle = Cycle::new();
        let busy = cycle.add_phase(smallvec![ids[0]], 5.0, &mut lanes);
        let idle_a = cycle.add_phase(smallvec![ids[1]], 5.0, &mut lanes);
        let idle_b = cycle.add_phase(smallvec![ids[2]], 5.0, &mut lanes);
        let config = SimConfig::default();

        let mut opened = std::collections::HashSet::new();
        let mut t = 0.0;
        while t < 3.0 * config.max_cycle_time {
            cycle.update(0.5, &mut lanes, &DemandModel, &config);
            t += 0.5;
            for n in open_numbers(&cycle) {
                opened.insert(n);
            }
        }

        assert!(opened.contains(&busy));
        assert!(opened.contains(&idle_a), "starved phase never opened");
        assert!(opened.contains(&idle_b), "starved phase never opened");
    }

    /// With no demand anywhere every phase runs its minimum green, so a full
    /// round completes within `phases * min_cycle_time`.
    #[test]
    fn idle_round_completes_within_minimum_greens() {
        let config = SimConfig::default();
        let (mut lanes, ids) = lane_set(&[0, 0, 0]);
        let mut cycle = Cycle::new();
        for id in &ids {
            cycle.add_phase(smallvec![*id], config.min_cycle_time, &mut lanes);
        }

        let mut opened = std::collections::HashSet::new();
        let mut t = 0.0;
        while t < 3.0 * config.min_cycle_time + 1.0 {
            cycle.update(0.25, &mut lanes, &DemandModel, &config);
            t += 0.25;
            for n in open_numbers(&cycle) {
                opened.insert(n);
            }
        }
        assert_eq!(opened.len(), 3);
    }

    #[test]
    fn idle_phase_runs_minimum_green() {
        let (mut lanes, ids) = lane_set(&[3, 0]);
        let mut cycle = Cycle::new();
        cycle.add_phase(smallvec![ids[0]], 5.0, &mut lanes);
        let idle = cycle.add_phase(smallvec![ids[1]], 5.0, &mut lanes);
        let config = SimConfig::default();

        for _ in 0..400 {
            cycle.update(0.25, &mut lanes, &DemandModel, &config);
            if cycle.open_phase().map(Phase::number) == Some(idle) {
                assert_eq!(cycle.open_phase().unwrap().cycle_time(), config.min_cycle_time);
                return;
            }
        }
        panic!("idle phase never opened");
    }

    #[test]
    fn single_phase_remains_open() {
        let (mut lanes, ids) = lane_set(&[1]);
        let mut cycle = Cycle::new();
        cycle.add_phase(smallvec![ids[0]], 2.0, &mut lanes);
        let config = SimConfig::default();

        for _ in 0..50 {
            cycle.update(0.5, &mut lanes, &DemandModel, &config);
            assert_eq!(open_numbers(&cycle).len(), 1);
            assert!(!lanes[ids[0]].is_blocked());
        }
    }

    #[test]
    fn open_phase_unblocks_only_its_lanes() {
        let (mut lanes, ids) = lane_set(&[1, 1]);
        let mut cycle = Cycle::new();
        cycle.add_phase(smallvec![ids[0]], 5.0, &mut lanes);
        cycle.add_phase(smallvec![ids[1]], 5.0, &mut lanes);
        let config = SimConfig::default();

        assert!(lanes[ids[0]].is_blocked());
        assert!(lanes[ids[1]].is_blocked());

        cycle.update(0.1, &mut lanes, &DemandModel, &config);
        let open = cycle.open_phase().expect("a phase must open").lanes()[0];
        assert!(!lanes[open].is_blocked());
        let closed = if open == ids[0] { ids[1] } else { ids[0] };
        assert!(lanes[closed].is_blocked());
    }
}
