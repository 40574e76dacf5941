use wasm_bindgen::prelude::*;

pub mod agent;
pub mod command;
pub mod config;
pub mod containment;
pub mod engine;
pub mod formation;
pub mod math;
pub mod palette;
pub mod steering;

pub use agent::{Agent, FormationSlot, RenderSample, Ring};
pub use command::{Command, CommandQueue};
pub use config::{ConfigError, Containment, RingLayout, SimConfig};
pub use containment::Bounds;
pub use engine::{FlockEngine, FlockStats};
pub use formation::{FormationController, FormationEvent, FormationState};
pub use math::Vec2;

/// Browser-facing handle. Input callbacks queue commands; `step` runs one frame and
/// refreshes the flat buffers the renderer reads.
#[wasm_bindgen]
pub struct Sim {
    engine: FlockEngine,
}

#[wasm_bindgen]
impl Sim {
    #[wasm_bindgen(constructor)]
    pub fn new(count: usize, seed: u32, width: f32, height: f32) -> Result<Sim, JsValue> {
        let config = SimConfig {
            dot_count: count,
            width,
            height,
            seed: Some(u64::from(seed)),
            ..SimConfig::default()
        };
        Self::with_config(config).map_err(to_js_error)
    }

    /// Builds a simulation from a JSON object; missing fields take their defaults.
    pub fn from_json(config_json: &str) -> Result<Sim, JsValue> {
        SimConfig::from_json(config_json)
            .and_then(Self::with_config)
            .map_err(to_js_error)
    }

    pub fn step(&mut self) {
        self.engine.tick();
    }

    pub fn set_bounds(&mut self, width: f32, height: f32) {
        self.engine.submit(Command::Resize { width, height });
    }

    pub fn count(&self) -> usize {
        self.engine.agents().len()
    }

    pub fn toggle_formation(&mut self) {
        self.engine.submit(Command::ToggleFormation);
    }

    pub fn force_formation(&mut self) {
        self.engine.submit(Command::ForceFormation);
    }

    /// Spawns the configured click batch at `(x, y)`.
    pub fn spawn(&mut self, x: f32, y: f32) {
        let count = self.engine.config().spawn_count;
        self.spawn_many(x, y, count);
    }

    pub fn spawn_many(&mut self, x: f32, y: f32, count: usize) {
        self.engine.submit(Command::Spawn {
            point: Vec2::new(x, y),
            count,
        });
    }

    pub fn set_palette(&mut self, index: usize) {
        self.engine.submit(Command::SetPalette(index));
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.engine.submit(Command::SetPointer(Some(Vec2::new(x, y))));
    }

    pub fn pointer_up(&mut self) {
        self.engine.submit(Command::SetPointer(None));
    }

    pub fn toggle_debug(&mut self) {
        self.engine.submit(Command::ToggleDebug);
    }

    pub fn is_forming(&self) -> bool {
        self.engine.formation().is_forming()
    }

    /// Interleaved `x, y` per agent.
    pub fn positions(&self) -> Vec<f32> {
        self.engine
            .render_samples()
            .iter()
            .flat_map(|sample| [sample.position.x, sample.position.y])
            .collect()
    }

    pub fn headings(&self) -> Vec<f32> {
        self.engine
            .render_samples()
            .iter()
            .map(|sample| sample.heading)
            .collect()
    }

    pub fn sizes(&self) -> Vec<f32> {
        self.engine
            .render_samples()
            .iter()
            .map(|sample| sample.size)
            .collect()
    }

    /// Interleaved `r, g, b` per agent.
    pub fn colors(&self) -> Vec<u8> {
        self.engine
            .render_samples()
            .iter()
            .flat_map(|sample| sample.color)
            .collect()
    }

    pub fn background(&self) -> Vec<u8> {
        self.engine.scheme().background.to_vec()
    }

    /// Debug overlay data as JSON.
    pub fn stats_json(&self) -> String {
        serde_json::to_string(&self.engine.stats()).unwrap_or_default()
    }
}

impl Sim {
    pub fn with_config(config: SimConfig) -> Result<Sim, ConfigError> {
        Ok(Sim {
            engine: FlockEngine::new(config)?,
        })
    }

    pub fn engine(&self) -> &FlockEngine {
        &self.engine
    }
}

fn to_js_error(error: ConfigError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim(count: usize) -> Sim {
        let config = SimConfig {
            dot_count: count,
            seed: Some(5),
            ..SimConfig::default()
        };
        Sim::with_config(config).expect("valid config")
    }

    #[test]
    fn buffers_match_population() {
        let mut sim = sim(12);
        sim.step();

        assert_eq!(sim.count(), 12);
        assert_eq!(sim.positions().len(), 24);
        assert_eq!(sim.headings().len(), 12);
        assert_eq!(sim.sizes().len(), 12);
        assert_eq!(sim.colors().len(), 36);
        assert_eq!(sim.background().len(), 3);
    }

    #[test]
    fn click_spawns_the_configured_batch() {
        let mut sim = sim(12);

        sim.spawn(100.0, 100.0);
        assert_eq!(sim.count(), 12);
        sim.step();

        assert_eq!(sim.count(), 17);
    }

    #[test]
    fn forced_formation_is_visible_after_step() {
        let mut sim = sim(12);

        sim.force_formation();
        assert!(!sim.is_forming());
        sim.step();

        assert!(sim.is_forming());
        let stats = sim.stats_json();
        assert!(stats.contains("\"state\":\"forming\""));
        assert!(stats.contains("\"event\":{\"kind\":\"forced\""));
    }
}
