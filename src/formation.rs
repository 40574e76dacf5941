//! Timed switching between free flocking and gathering into concentric eye rings.

use std::f32::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::{Agent, FormationSlot};
use crate::config::{CenterPolicy, FormationConfig, RingLayout};
use crate::containment::Bounds;
use crate::math::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormationState {
    Flocking,
    Forming,
}

/// A state change reported by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FormationEvent {
    Began { center: Vec2 },
    Forced { center: Vec2 },
    Ended,
}

#[derive(Clone, Debug)]
pub struct FormationController {
    state: FormationState,
    timer: u32,
    target_center: Vec2,
    config: FormationConfig,
    /// A forced episode starts between ticks; the tick that follows it is its first.
    hold_timer: bool,
}

impl FormationController {
    pub fn new(config: FormationConfig, bounds: Bounds) -> Self {
        Self {
            state: FormationState::Flocking,
            timer: 0,
            target_center: bounds.center(),
            config,
            hold_timer: false,
        }
    }

    pub fn state(&self) -> FormationState {
        self.state
    }

    pub fn is_forming(&self) -> bool {
        self.state == FormationState::Forming
    }

    pub fn timer(&self) -> u32 {
        self.timer
    }

    pub fn target_center(&self) -> Vec2 {
        self.target_center
    }

    pub fn config(&self) -> &FormationConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Flips automatic formations on or off. A formation already underway still runs to its end.
    pub fn toggle_enabled(&mut self) -> bool {
        self.config.enabled = !self.config.enabled;
        debug!(enabled = self.config.enabled, "eye formation toggled");
        self.config.enabled
    }

    /// Runs one tick of the state machine, assigning slots when a formation begins.
    pub fn advance<R: Rng>(
        &mut self,
        agents: &mut [Agent],
        bounds: Bounds,
        rng: &mut R,
    ) -> Option<FormationEvent> {
        match self.state {
            FormationState::Flocking => {
                if !self.config.enabled {
                    return None;
                }
                self.timer = self.timer.saturating_add(1);
                if self.timer < self.config.interval_ticks {
                    return None;
                }

                let center = pick_center(&self.config.center, bounds, rng);
                self.begin(center, agents);
                debug!(?center, population = agents.len(), "eye formation began");
                Some(FormationEvent::Began { center })
            }
            FormationState::Forming => {
                if std::mem::take(&mut self.hold_timer) {
                    return None;
                }
                self.timer = self.timer.saturating_add(1);
                if self.timer < self.config.duration_ticks {
                    return None;
                }

                self.state = FormationState::Flocking;
                self.timer = 0;
                for agent in agents.iter_mut() {
                    agent.slot = None;
                }
                debug!("eye formation ended");
                Some(FormationEvent::Ended)
            }
        }
    }

    /// Starts a formation at the canvas center right away, restarting one already in progress.
    pub fn force(&mut self, agents: &mut [Agent], bounds: Bounds) -> FormationEvent {
        let center = bounds.center();
        self.begin(center, agents);
        self.hold_timer = true;
        debug!(?center, population = agents.len(), "eye formation forced");
        FormationEvent::Forced { center }
    }

    /// Where `agent` should be heading this tick, if it holds a slot in an active formation.
    pub fn target_for(&self, agent: &Agent) -> Option<Vec2> {
        if !self.is_forming() {
            return None;
        }
        let slot = agent.slot?;
        let radius = self.config.radii.radius(slot.ring);
        Some(self.target_center + Vec2::from_angle(slot.angle) * radius)
    }

    fn begin(&mut self, center: Vec2, agents: &mut [Agent]) {
        self.state = FormationState::Forming;
        self.timer = 0;
        self.hold_timer = false;
        self.target_center = center;
        assign_slots(agents, &self.config.layout);
    }
}

fn pick_center<R: Rng>(policy: &CenterPolicy, bounds: Bounds, rng: &mut R) -> Vec2 {
    match *policy {
        CenterPolicy::Fixed => bounds.center(),
        CenterPolicy::CentralRegion { fraction } => {
            let half = fraction.clamp(0.0, 1.0) * 0.5;
            let low = 0.5 - half;
            let high = 0.5 + half;
            Vec2::new(
                bounds.width * rng.gen_range(low..=high),
                bounds.height * rng.gen_range(low..=high),
            )
        }
    }
}

/// Splits the flock, in index order, across rings by population share and spaces each
/// ring's members evenly around the full circle.
pub fn assign_slots(agents: &mut [Agent], layout: &RingLayout) {
    let population = agents.len();
    if population == 0 {
        return;
    }

    let shares = layout.shares();
    let mut start = 0usize;
    let mut cumulative = 0.0f32;

    for (ring_index, (ring, share)) in shares.iter().enumerate() {
        cumulative += share.max(0.0);
        let end = if ring_index + 1 == shares.len() {
            population
        } else {
            ((cumulative * population as f32).round() as usize).clamp(start, population)
        };

        let members = end - start;
        for (slot_index, agent) in agents[start..end].iter_mut().enumerate() {
            agent.slot = Some(FormationSlot {
                ring: *ring,
                angle: TAU * slot_index as f32 / members as f32,
            });
        }
        start = end;
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;
    use crate::agent::Ring;

    const BOUNDS: Bounds = Bounds::new(400.0, 400.0);

    fn flock(count: usize) -> Vec<Agent> {
        (0..count)
            .map(|i| {
                Agent::new(
                    Vec2::new(i as f32, i as f32),
                    Vec2::ZERO,
                    3.0,
                    [255; 3],
                    3.0,
                    0.05,
                )
            })
            .collect()
    }

    fn controller(interval: u32, duration: u32) -> FormationController {
        let config = FormationConfig {
            interval_ticks: interval,
            duration_ticks: duration,
            center: CenterPolicy::Fixed,
            ..FormationConfig::default()
        };
        FormationController::new(config, BOUNDS)
    }

    fn ring_count(agents: &[Agent], ring: Ring) -> usize {
        agents.iter().filter(|agent| agent.ring() == Some(ring)).count()
    }

    #[test]
    fn cycles_on_schedule() {
        let mut agents = flock(10);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut controller = controller(5, 3);

        for _ in 0..4 {
            assert_eq!(controller.advance(&mut agents, BOUNDS, &mut rng), None);
        }
        assert_eq!(controller.timer(), 4);

        let event = controller.advance(&mut agents, BOUNDS, &mut rng);
        assert_eq!(
            event,
            Some(FormationEvent::Began {
                center: Vec2::new(200.0, 200.0)
            })
        );
        assert_eq!(controller.timer(), 0);
        assert!(agents.iter().all(|agent| agent.slot.is_some()));

        controller.advance(&mut agents, BOUNDS, &mut rng);
        controller.advance(&mut agents, BOUNDS, &mut rng);
        assert!(controller.is_forming());
        assert_eq!(
            controller.advance(&mut agents, BOUNDS, &mut rng),
            Some(FormationEvent::Ended)
        );
        assert_eq!(controller.state(), FormationState::Flocking);
        assert_eq!(controller.timer(), 0);
        assert!(agents.iter().all(|agent| agent.slot.is_none()));
    }

    #[test]
    fn disabling_freezes_flocking_but_not_forming() {
        let mut agents = flock(4);
        let mut rng = SmallRng::seed_from_u64(2);
        let mut controller = controller(2, 2);

        controller.toggle_enabled();
        for _ in 0..10 {
            controller.advance(&mut agents, BOUNDS, &mut rng);
        }
        assert_eq!(controller.state(), FormationState::Flocking);
        assert_eq!(controller.timer(), 0);

        controller.toggle_enabled();
        controller.advance(&mut agents, BOUNDS, &mut rng);
        controller.advance(&mut agents, BOUNDS, &mut rng);
        assert!(controller.is_forming());

        controller.toggle_enabled();
        controller.advance(&mut agents, BOUNDS, &mut rng);
        controller.advance(&mut agents, BOUNDS, &mut rng);
        assert_eq!(controller.state(), FormationState::Flocking);
    }

    #[test]
    fn force_starts_at_canvas_center() {
        let mut agents = flock(6);
        let mut rng = SmallRng::seed_from_u64(3);
        let config = FormationConfig {
            center: CenterPolicy::CentralRegion { fraction: 0.4 },
            ..FormationConfig::default()
        };
        let mut controller = FormationController::new(config, BOUNDS);
        controller.advance(&mut agents, BOUNDS, &mut rng);

        let event = controller.force(&mut agents, BOUNDS);

        assert_eq!(
            event,
            FormationEvent::Forced {
                center: Vec2::new(200.0, 200.0)
            }
        );
        assert!(controller.is_forming());
        assert_eq!(controller.timer(), 0);
    }

    #[test]
    fn forced_episode_lasts_the_full_duration() {
        for duration in [1, 2, 7] {
            let mut agents = flock(5);
            let mut rng = SmallRng::seed_from_u64(5);
            let mut controller = controller(1_000, duration);

            controller.force(&mut agents, BOUNDS);
            let mut forming_ticks = 0;
            loop {
                let event = controller.advance(&mut agents, BOUNDS, &mut rng);
                if event == Some(FormationEvent::Ended) {
                    break;
                }
                forming_ticks += 1;
                assert!(forming_ticks <= duration, "episode overran {duration} ticks");
            }

            assert_eq!(forming_ticks, duration);
        }
    }

    #[test]
    fn forced_and_timed_episodes_hold_for_the_same_ticks() {
        let mut agents = flock(5);
        let mut rng = SmallRng::seed_from_u64(6);
        let mut timed = controller(1, 4);

        // The tick that begins a timed episode counts as its first.
        assert!(matches!(
            timed.advance(&mut agents, BOUNDS, &mut rng),
            Some(FormationEvent::Began { .. })
        ));
        let mut timed_ticks = 1;
        while timed.advance(&mut agents, BOUNDS, &mut rng) != Some(FormationEvent::Ended) {
            timed_ticks += 1;
        }

        assert_eq!(timed_ticks, 4);
    }

    #[test]
    fn random_centers_stay_in_the_central_region() {
        let mut rng = SmallRng::seed_from_u64(4);
        let policy = CenterPolicy::CentralRegion { fraction: 0.4 };

        for _ in 0..200 {
            let center = pick_center(&policy, BOUNDS, &mut rng);
            assert!((120.0..=280.0).contains(&center.x));
            assert!((120.0..=280.0).contains(&center.y));
        }
    }

    #[test]
    fn three_ring_split_follows_shares() {
        let mut agents = flock(100);

        assign_slots(&mut agents, &RingLayout::default());

        assert_eq!(ring_count(&agents, Ring::Outer), 50);
        assert_eq!(ring_count(&agents, Ring::Middle), 30);
        assert_eq!(ring_count(&agents, Ring::Inner), 20);
    }

    #[test]
    fn two_ring_split_skips_the_middle() {
        let mut agents = flock(10);

        assign_slots(&mut agents, &RingLayout::IrisPupil { iris_share: 0.7 });

        assert_eq!(ring_count(&agents, Ring::Outer), 7);
        assert_eq!(ring_count(&agents, Ring::Middle), 0);
        assert_eq!(ring_count(&agents, Ring::Inner), 3);
    }

    #[test]
    fn angles_are_spread_evenly_per_ring() {
        let mut agents = flock(4);

        assign_slots(&mut agents, &RingLayout::Single);

        let angles: Vec<f32> = agents
            .iter()
            .map(|agent| agent.slot.map(|slot| slot.angle).unwrap_or(-1.0))
            .collect();
        let expected = [0.0, TAU / 4.0, TAU / 2.0, 3.0 * TAU / 4.0];
        for (angle, expected) in angles.iter().zip(expected) {
            assert!((angle - expected).abs() < 1.0e-6);
        }
    }

    #[test]
    fn empty_flock_gets_no_slots() {
        let mut agents = flock(0);
        assign_slots(&mut agents, &RingLayout::default());
        assert!(agents.is_empty());
    }

    #[test]
    fn targets_sit_on_the_assigned_ring() {
        let mut agents = flock(8);
        let mut controller = controller(1, 10);
        controller.force(&mut agents, BOUNDS);

        for agent in &agents {
            let target = controller.target_for(agent).expect("forming agent has a target");
            let ring = agent.ring().expect("slot assigned");
            let radius = controller.config().radii.radius(ring);
            assert!((target.distance(controller.target_center()) - radius).abs() < 1.0e-3);
        }
    }
}
