use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, warn};

use crate::agent::{Agent, RenderSample};
use crate::command::{Command, CommandQueue};
use crate::config::{ConfigError, SimConfig};
use crate::containment::{boundary_force, Bounds};
use crate::formation::{FormationController, FormationEvent, FormationState};
use crate::math::Vec2;
use crate::palette::ColorScheme;
use crate::steering::{flocking_force, formation_force, pointer_push};

/// Snapshot of engine bookkeeping for a debug overlay.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FlockStats {
    pub population: usize,
    pub state: FormationState,
    pub timer: u32,
    pub formation_enabled: bool,
    pub tick: u64,
    pub scheme: usize,
    pub show_debug: bool,
    /// Controller transition during the last tick, if any.
    pub event: Option<FormationEvent>,
}

/// Owns the flock and the formation controller and advances both one tick at a time.
pub struct FlockEngine {
    config: SimConfig,
    bounds: Bounds,
    agents: Vec<Agent>,
    formation: FormationController,
    commands: CommandQueue,
    scheme_index: usize,
    pointer: Option<Vec2>,
    show_debug: bool,
    tick_count: u64,
    last_event: Option<FormationEvent>,
    rng: SmallRng,
    forces: Vec<Vec2>,
    samples: Vec<RenderSample>,
}

impl FlockEngine {
    pub fn new(mut config: SimConfig) -> Result<Self, ConfigError> {
        config.sanitize();
        config.validate()?;

        let seed = match config.seed {
            Some(seed) => seed,
            None => getrandom::u64().map_err(ConfigError::Entropy)?,
        };
        let mut rng = SmallRng::seed_from_u64(seed);
        let scheme_count = config.schemes.len();
        let scheme_index = match config.scheme {
            Some(index) => index % scheme_count,
            None => rng.gen_range(0..scheme_count),
        };
        let bounds = Bounds::new(config.width, config.height);
        let formation = FormationController::new(config.formation, bounds);

        let mut engine = Self {
            bounds,
            agents: Vec::with_capacity(config.dot_count),
            formation,
            commands: CommandQueue::new(),
            scheme_index,
            pointer: None,
            show_debug: false,
            tick_count: 0,
            last_event: None,
            rng,
            forces: Vec::new(),
            samples: Vec::new(),
            config,
        };

        for _ in 0..engine.config.dot_count {
            let position = Vec2::new(
                engine.rng.gen_range(0.0..=bounds.width),
                engine.rng.gen_range(0.0..=bounds.height),
            );
            let agent = engine.make_agent(position);
            engine.agents.push(agent);
        }
        engine.samples = engine.agents.iter().map(Agent::render_sample).collect();

        debug!(
            population = engine.agents.len(),
            scheme = scheme_index,
            seed,
            "flock engine created"
        );
        Ok(engine)
    }

    /// Queues a command for the start of the next tick.
    pub fn submit(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// One full frame: drain commands, advance the controller, steer, integrate.
    pub fn tick(&mut self) -> &[RenderSample] {
        self.last_event = None;
        for command in self.commands.take_pending() {
            self.apply_command(command);
        }

        if let Some(event) = self
            .formation
            .advance(&mut self.agents, self.bounds, &mut self.rng)
        {
            self.last_event = Some(event);
        }

        self.compute_forces();
        self.integrate();

        self.tick_count = self.tick_count.wrapping_add(1);
        &self.samples
    }

    /// Applies a command right away. Only call this between ticks.
    pub fn apply_command(&mut self, command: Command) {
        debug!(?command, "applying command");
        match command {
            Command::ToggleFormation => {
                self.formation.toggle_enabled();
            }
            Command::ForceFormation => {
                self.force_formation();
            }
            Command::Spawn { point, count } => self.spawn(point, count),
            Command::SetPalette(index) => self.set_palette(index),
            Command::SetPointer(pointer) => self.pointer = pointer,
            Command::ToggleDebug => self.show_debug = !self.show_debug,
            Command::Resize { width, height } => self.resize(width, height),
        }
    }

    pub fn force_formation(&mut self) -> FormationEvent {
        let event = self.formation.force(&mut self.agents, self.bounds);
        self.last_event = Some(event);
        event
    }

    /// The controller transition made during the last tick. A direct `force_formation`
    /// call shows up here until the next tick starts.
    pub fn last_formation_event(&self) -> Option<FormationEvent> {
        self.last_event
    }

    /// Adds `count` agents at `point`, dropping the oldest ones so the flock stays within
    /// the population cap. Only the newest `cap` of the requested agents are ever built.
    pub fn spawn(&mut self, point: Vec2, count: usize) {
        let cap = self.config.population_cap().max(1);
        let count = count.min(cap);

        let excess = (self.agents.len() + count).saturating_sub(cap);
        if excess > 0 {
            self.agents.drain(..excess);
            debug!(dropped = excess, cap, "population capped");
        }

        self.agents.reserve(count);
        for _ in 0..count {
            let agent = self.make_agent(point);
            self.agents.push(agent);
        }
        debug!(?point, count, population = self.agents.len(), "spawned agents");
    }

    pub fn set_palette(&mut self, index: usize) {
        self.scheme_index = index % self.config.schemes.len();
        let scheme = &self.config.schemes[self.scheme_index];
        for agent in &mut self.agents {
            agent.color = scheme.pick(&mut self.rng);
        }
        debug!(scheme = self.scheme_index, "palette changed");
    }

    fn resize(&mut self, width: f32, height: f32) {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            warn!(width, height, "ignoring resize to invalid bounds");
            return;
        }
        self.bounds = Bounds::new(width, height);
        self.config.width = width;
        self.config.height = height;
    }

    fn make_agent(&mut self, position: Vec2) -> Agent {
        let velocity = Vec2::new(
            self.rng.gen_range(-1.0..=1.0),
            self.rng.gen_range(-1.0..=1.0),
        );
        let size = self
            .rng
            .gen_range(self.config.size_min..=self.config.size_max);
        let color = self.config.schemes[self.scheme_index].pick(&mut self.rng);
        Agent::new(
            position,
            velocity,
            size,
            color,
            self.config.max_speed,
            self.config.max_force,
        )
    }

    fn compute_forces(&mut self) {
        let rules = &self.config.flocking;
        let seek_weight = self.config.formation.seek_weight;

        self.forces.clear();
        for (index, agent) in self.agents.iter().enumerate() {
            let mut force = match self.formation.target_for(agent) {
                Some(target) => formation_force(agent, target, seek_weight),
                None => flocking_force(&self.agents, index, rules),
            };
            force += boundary_force(&self.config.containment, self.bounds, agent.position);
            if let Some(pointer) = self.pointer {
                force += pointer_push(agent, pointer, &self.config.pointer);
            }
            self.forces.push(force);
        }
    }

    fn integrate(&mut self) {
        let scheme = &self.config.schemes[self.scheme_index];

        self.samples.clear();
        for (agent, force) in self.agents.iter_mut().zip(&self.forces) {
            let mut sample = agent.integrate(*force, self.bounds, &self.config.containment);
            if let Some(tint) = agent.ring().and_then(|ring| scheme.ring_tint(ring)) {
                sample.color = tint;
            }
            self.samples.push(sample);
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Mutable access for hosts that place agents themselves; call between ticks.
    pub fn agents_mut(&mut self) -> &mut Vec<Agent> {
        &mut self.agents
    }

    pub fn formation(&self) -> &FormationController {
        &self.formation
    }

    pub fn render_samples(&self) -> &[RenderSample] {
        &self.samples
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn scheme(&self) -> &ColorScheme {
        &self.config.schemes[self.scheme_index]
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    pub fn stats(&self) -> FlockStats {
        FlockStats {
            population: self.agents.len(),
            state: self.formation.state(),
            timer: self.formation.timer(),
            formation_enabled: self.formation.is_enabled(),
            tick: self.tick_count,
            scheme: self.scheme_index,
            show_debug: self.show_debug,
            event: self.last_event,
        }
    }
}
