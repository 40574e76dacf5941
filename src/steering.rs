//! Neighbor-influence steering: separation, alignment and cohesion over the whole flock.
//!
//! Every query is a brute-force scan of all other agents, so one tick costs O(n²).
//! Neighbors are agents at a distance `d` with `0 < d < radius`; coincident agents are
//! skipped because they offer no direction.

use crate::agent::Agent;
use crate::config::{FlockingRules, PointerConfig};
use crate::math::{steer_towards, Vec2};

/// Unweighted per-behavior forces for one agent, each already capped at `max_force`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlockingForces {
    pub separation: Vec2,
    pub alignment: Vec2,
    pub cohesion: Vec2,
}

impl FlockingForces {
    pub fn weighted_sum(&self, rules: &FlockingRules) -> Vec2 {
        self.separation * rules.separation.weight
            + self.alignment * rules.alignment.weight
            + self.cohesion * rules.cohesion.weight
    }
}

#[derive(Default)]
struct NeighborSums {
    away: Vec2,
    separation_count: usize,
    velocity: Vec2,
    alignment_count: usize,
    position: Vec2,
    cohesion_count: usize,
}

impl NeighborSums {
    fn scan(
        agents: &[Agent],
        index: usize,
        separation_radius: f32,
        alignment_radius: f32,
        cohesion_radius: f32,
    ) -> Self {
        let mut sums = Self::default();
        let Some(agent) = agents.get(index) else {
            return sums;
        };

        for (j, other) in agents.iter().enumerate() {
            if j == index {
                continue;
            }

            let offset = agent.position - other.position;
            let distance = offset.length();
            if distance <= 0.0 {
                continue;
            }

            if distance < separation_radius {
                sums.away += offset.normalize_or_zero() / distance;
                sums.separation_count += 1;
            }
            if distance < alignment_radius {
                sums.velocity += other.velocity;
                sums.alignment_count += 1;
            }
            if distance < cohesion_radius {
                sums.position += other.position;
                sums.cohesion_count += 1;
            }
        }

        sums
    }

    fn separation(&self, agent: &Agent) -> Vec2 {
        if self.separation_count == 0 {
            return Vec2::ZERO;
        }
        let away = self.away / self.separation_count as f32;
        steer_towards(away, agent.velocity, agent.max_speed, agent.max_force)
    }

    fn alignment(&self, agent: &Agent) -> Vec2 {
        if self.alignment_count == 0 {
            return Vec2::ZERO;
        }
        let heading = self.velocity / self.alignment_count as f32;
        steer_towards(heading, agent.velocity, agent.max_speed, agent.max_force)
    }

    fn cohesion(&self, agent: &Agent) -> Vec2 {
        if self.cohesion_count == 0 {
            return Vec2::ZERO;
        }
        seek(agent, self.position / self.cohesion_count as f32)
    }
}

/// Steer toward `target` at full speed; zero when already there.
pub fn seek(agent: &Agent, target: Vec2) -> Vec2 {
    steer_towards(
        target - agent.position,
        agent.velocity,
        agent.max_speed,
        agent.max_force,
    )
}

/// Push away from neighbors closer than `radius`, nearer ones weighted more.
pub fn separation(agents: &[Agent], index: usize, radius: f32) -> Vec2 {
    match agents.get(index) {
        Some(agent) => NeighborSums::scan(agents, index, radius, 0.0, 0.0).separation(agent),
        None => Vec2::ZERO,
    }
}

/// Match the average velocity of neighbors closer than `radius`.
pub fn alignment(agents: &[Agent], index: usize, radius: f32) -> Vec2 {
    match agents.get(index) {
        Some(agent) => NeighborSums::scan(agents, index, 0.0, radius, 0.0).alignment(agent),
        None => Vec2::ZERO,
    }
}

/// Seek the average position of neighbors closer than `radius`.
pub fn cohesion(agents: &[Agent], index: usize, radius: f32) -> Vec2 {
    match agents.get(index) {
        Some(agent) => NeighborSums::scan(agents, index, 0.0, 0.0, radius).cohesion(agent),
        None => Vec2::ZERO,
    }
}

/// All three behaviors from a single pass over the flock.
pub fn flocking_forces(agents: &[Agent], index: usize, rules: &FlockingRules) -> FlockingForces {
    let Some(agent) = agents.get(index) else {
        return FlockingForces::default();
    };

    let sums = NeighborSums::scan(
        agents,
        index,
        rules.separation.distance,
        rules.alignment.distance,
        rules.cohesion.distance,
    );
    FlockingForces {
        separation: sums.separation(agent),
        alignment: sums.alignment(agent),
        cohesion: sums.cohesion(agent),
    }
}

pub fn flocking_force(agents: &[Agent], index: usize, rules: &FlockingRules) -> Vec2 {
    flocking_forces(agents, index, rules).weighted_sum(rules)
}

/// Weighted seek toward a formation slot target; replaces flocking for the tick.
pub fn formation_force(agent: &Agent, target: Vec2, weight: f32) -> Vec2 {
    seek(agent, target) * weight
}

/// Repulsion from a held pointer, fading linearly to zero at `config.radius`.
pub fn pointer_push(agent: &Agent, pointer: Vec2, config: &PointerConfig) -> Vec2 {
    let offset = agent.position - pointer;
    let distance = offset.length();
    if distance >= config.radius || config.radius <= 0.0 {
        return Vec2::ZERO;
    }

    let strength = config.strength * (1.0 - distance / config.radius);
    offset.with_magnitude(strength)
}
