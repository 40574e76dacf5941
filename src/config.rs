use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::agent::Ring;
use crate::math::clamp_finite;
use crate::palette::{default_schemes, ColorScheme};

pub const MAX_SPEED_LIMIT: f32 = 100.0;
pub const MAX_FORCE_LIMIT: f32 = 10.0;
pub const MAX_BEHAVIOR_WEIGHT: f32 = 10.0;
pub const MAX_NEIGHBOR_DISTANCE: f32 = 1_000.0;
pub const MAX_DOT_SIZE: f32 = 64.0;
pub const MAX_POPULATION_CAP_FACTOR: f32 = 16.0;

/// Errors raised when a configuration cannot be repaired into a usable one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("world bounds must be positive, got {width}x{height}")]
    InvalidBounds { width: f32, height: f32 },
    #[error("formation interval must be at least one tick")]
    ZeroInterval,
    #[error("formation duration must be at least one tick")]
    ZeroDuration,
    #[error("ring shares must be non-negative and sum to at most 1.0, got {total}")]
    InvalidRingShares { total: f32 },
    #[error("at least one color scheme is required")]
    EmptyPalette,
    #[error("color scheme {index} has no dot colors")]
    EmptySchemeColors { index: usize },
    #[error("dot size range is inverted: min {min} > max {max}")]
    InvalidSizeRange { min: f32, max: f32 },
    #[error("population cap factor {factor} is below 1.0 and would truncate the initial flock")]
    CapBelowPopulation { factor: f32 },
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to seed random generator: {0}")]
    Entropy(getrandom::Error),
}

/// Radius and weight of one neighbor-influence behavior.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BehaviorRule {
    pub weight: f32,
    pub distance: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockingRules {
    pub separation: BehaviorRule,
    pub alignment: BehaviorRule,
    pub cohesion: BehaviorRule,
}

impl Default for FlockingRules {
    fn default() -> Self {
        Self {
            separation: BehaviorRule {
                weight: 1.5,
                distance: 25.0,
            },
            alignment: BehaviorRule {
                weight: 1.0,
                distance: 50.0,
            },
            cohesion: BehaviorRule {
                weight: 1.0,
                distance: 50.0,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingRadii {
    pub outer: f32,
    pub middle: f32,
    pub inner: f32,
}

impl Default for RingRadii {
    fn default() -> Self {
        Self {
            outer: 100.0,
            middle: 65.0,
            inner: 30.0,
        }
    }
}

impl RingRadii {
    pub fn radius(&self, ring: Ring) -> f32 {
        match ring {
            Ring::Outer => self.outer,
            Ring::Middle => self.middle,
            Ring::Inner => self.inner,
        }
    }
}

/// How many concentric rings the eye has and how the population is split across them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RingLayout {
    /// Every agent on the outer ring.
    Single,
    /// Iris on the outer ring, the remainder on the inner (pupil) ring.
    IrisPupil { iris_share: f32 },
    /// Sclera on the outer ring, iris on the middle ring, the remainder on the inner ring.
    ScleraIrisPupil { sclera_share: f32, iris_share: f32 },
}

impl Default for RingLayout {
    fn default() -> Self {
        Self::ScleraIrisPupil {
            sclera_share: 0.5,
            iris_share: 0.3,
        }
    }
}

impl RingLayout {
    /// Population share per ring, outermost first. Unused rings get a zero share.
    pub fn shares(&self) -> [(Ring, f32); 3] {
        match *self {
            Self::Single => [(Ring::Outer, 1.0), (Ring::Middle, 0.0), (Ring::Inner, 0.0)],
            Self::IrisPupil { iris_share } => [
                (Ring::Outer, iris_share),
                (Ring::Middle, 0.0),
                (Ring::Inner, 1.0 - iris_share),
            ],
            Self::ScleraIrisPupil {
                sclera_share,
                iris_share,
            } => [
                (Ring::Outer, sclera_share),
                (Ring::Middle, iris_share),
                (Ring::Inner, 1.0 - sclera_share - iris_share),
            ],
        }
    }
}

/// Where a new formation is centered.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CenterPolicy {
    Fixed,
    /// Uniformly random inside a centered box spanning `fraction` of each axis.
    CentralRegion { fraction: f32 },
}

impl Default for CenterPolicy {
    fn default() -> Self {
        Self::CentralRegion { fraction: 0.4 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationConfig {
    pub enabled: bool,
    pub interval_ticks: u32,
    pub duration_ticks: u32,
    pub radii: RingRadii,
    pub layout: RingLayout,
    pub center: CenterPolicy,
    pub seek_weight: f32,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ticks: 300,
            duration_ticks: 180,
            radii: RingRadii::default(),
            layout: RingLayout::default(),
            center: CenterPolicy::default(),
            seek_weight: 2.0,
        }
    }
}

/// Boundary policy. Exactly one is active for a simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Containment {
    #[default]
    Wrap,
    /// Clamp inside `margin` (never less than the agent's radius) and reflect.
    Bounce { margin: f32 },
    /// Repel inside a `margin` band, with a hard bounce at the world edge as a backstop.
    Soft { margin: f32, strength: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    pub radius: f32,
    pub strength: f32,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            radius: 150.0,
            strength: 3.0,
        }
    }
}

/// Full simulation configuration. Every field has a default, so hosts may pass partial JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub width: f32,
    pub height: f32,
    pub dot_count: usize,
    pub size_min: f32,
    pub size_max: f32,
    pub max_speed: f32,
    pub max_force: f32,
    pub flocking: FlockingRules,
    pub formation: FormationConfig,
    pub containment: Containment,
    pub pointer: PointerConfig,
    /// Agents added per spawn command issued without an explicit count.
    pub spawn_count: usize,
    /// Population cap as a multiple of `dot_count`.
    pub population_cap_factor: f32,
    pub schemes: Vec<ColorScheme>,
    /// Initial scheme index; `None` picks one at random.
    pub scheme: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 400.0,
            dot_count: 300,
            size_min: 3.0,
            size_max: 3.0,
            max_speed: 3.0,
            max_force: 0.05,
            flocking: FlockingRules::default(),
            formation: FormationConfig::default(),
            containment: Containment::default(),
            pointer: PointerConfig::default(),
            spawn_count: 5,
            population_cap_factor: 1.5,
            schemes: default_schemes(),
            scheme: None,
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: SimConfig = serde_json::from_str(json)?;
        config.sanitize();
        config.validate()?;
        Ok(config)
    }

    /// Replaces non-finite or out-of-range numbers with clamped or default values.
    pub fn sanitize(&mut self) {
        let defaults = SimConfig::default();

        self.width = repair("width", self.width, 0.0, f32::MAX, defaults.width);
        self.height = repair("height", self.height, 0.0, f32::MAX, defaults.height);
        self.size_min = repair("size_min", self.size_min, 0.0, MAX_DOT_SIZE, defaults.size_min);
        self.size_max = repair("size_max", self.size_max, 0.0, MAX_DOT_SIZE, defaults.size_max);
        self.max_speed = repair(
            "max_speed",
            self.max_speed,
            0.0,
            MAX_SPEED_LIMIT,
            defaults.max_speed,
        );
        self.max_force = repair(
            "max_force",
            self.max_force,
            0.0,
            MAX_FORCE_LIMIT,
            defaults.max_force,
        );

        let rule_defaults = defaults.flocking;
        sanitize_rule("separation", &mut self.flocking.separation, rule_defaults.separation);
        sanitize_rule("alignment", &mut self.flocking.alignment, rule_defaults.alignment);
        sanitize_rule("cohesion", &mut self.flocking.cohesion, rule_defaults.cohesion);

        let formation = &mut self.formation;
        let radii_defaults = RingRadii::default();
        formation.radii.outer = repair(
            "radii.outer",
            formation.radii.outer,
            0.0,
            f32::MAX,
            radii_defaults.outer,
        );
        formation.radii.middle = repair(
            "radii.middle",
            formation.radii.middle,
            0.0,
            f32::MAX,
            radii_defaults.middle,
        );
        formation.radii.inner = repair(
            "radii.inner",
            formation.radii.inner,
            0.0,
            f32::MAX,
            radii_defaults.inner,
        );
        formation.seek_weight = repair(
            "seek_weight",
            formation.seek_weight,
            0.0,
            MAX_BEHAVIOR_WEIGHT,
            2.0,
        );
        if let CenterPolicy::CentralRegion { fraction } = &mut formation.center {
            *fraction = repair("center.fraction", *fraction, 0.0, 1.0, 0.4);
        }

        match &mut self.containment {
            Containment::Wrap => {}
            Containment::Bounce { margin } => {
                *margin = repair("containment.margin", *margin, 0.0, f32::MAX, 0.0);
            }
            Containment::Soft { margin, strength } => {
                *margin = repair("containment.margin", *margin, 0.0, f32::MAX, 0.0);
                *strength = repair(
                    "containment.strength",
                    *strength,
                    0.0,
                    MAX_FORCE_LIMIT,
                    0.0,
                );
            }
        }

        self.pointer.radius = repair(
            "pointer.radius",
            self.pointer.radius,
            0.0,
            f32::MAX,
            defaults.pointer.radius,
        );
        self.pointer.strength = repair(
            "pointer.strength",
            self.pointer.strength,
            0.0,
            MAX_SPEED_LIMIT,
            defaults.pointer.strength,
        );
        self.population_cap_factor = repair(
            "population_cap_factor",
            self.population_cap_factor,
            0.0,
            MAX_POPULATION_CAP_FACTOR,
            defaults.population_cap_factor,
        );
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(ConfigError::InvalidBounds {
                width: self.width,
                height: self.height,
            });
        }
        if self.formation.interval_ticks == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.formation.duration_ticks == 0 {
            return Err(ConfigError::ZeroDuration);
        }

        let shares = self.formation.layout.shares();
        let total: f32 = shares.iter().map(|(_, share)| share).sum();
        let negative = shares
            .iter()
            .any(|(_, share)| !share.is_finite() || *share < -1.0e-6);
        if negative || total > 1.0 + 1.0e-4 {
            return Err(ConfigError::InvalidRingShares { total });
        }

        if self.schemes.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        if let Some(index) = self.schemes.iter().position(|scheme| scheme.dots.is_empty()) {
            return Err(ConfigError::EmptySchemeColors { index });
        }
        if self.size_min > self.size_max {
            return Err(ConfigError::InvalidSizeRange {
                min: self.size_min,
                max: self.size_max,
            });
        }
        if self.population_cap_factor < 1.0 {
            return Err(ConfigError::CapBelowPopulation {
                factor: self.population_cap_factor,
            });
        }
        Ok(())
    }

    /// Largest population a spawn may leave behind; never zero.
    pub fn population_cap(&self) -> usize {
        ((self.dot_count as f32 * self.population_cap_factor).floor() as usize).max(1)
    }
}

fn sanitize_rule(name: &str, rule: &mut BehaviorRule, fallback: BehaviorRule) {
    rule.weight = repair(name, rule.weight, 0.0, MAX_BEHAVIOR_WEIGHT, fallback.weight);
    rule.distance = repair(
        name,
        rule.distance,
        0.0,
        MAX_NEIGHBOR_DISTANCE,
        fallback.distance,
    );
}

fn repair(name: &str, value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    let repaired = clamp_finite(value, min, max, fallback);
    if repaired != value {
        warn!(field = name, value, repaired, "repaired configuration value");
    }
    repaired
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_sketch() {
        let config = SimConfig::default();

        assert_eq!(config.dot_count, 300);
        assert_eq!(config.max_speed, 3.0);
        assert_eq!(config.max_force, 0.05);
        assert_eq!(config.flocking.separation.distance, 25.0);
        assert_eq!(config.flocking.separation.weight, 1.5);
        assert_eq!(config.formation.interval_ticks, 300);
        assert_eq!(config.formation.duration_ticks, 180);
        assert_eq!(config.population_cap(), 450);
        assert_eq!(config.containment, Containment::Wrap);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sanitize_repairs_non_finite_values() {
        let mut config = SimConfig {
            max_speed: f32::NAN,
            max_force: f32::INFINITY,
            ..SimConfig::default()
        };
        config.flocking.cohesion.distance = -5.0;

        config.sanitize();

        assert_eq!(config.max_speed, 3.0);
        assert_eq!(config.max_force, 0.05);
        assert_eq!(config.flocking.cohesion.distance, 0.0);
    }

    #[test]
    fn validate_rejects_oversubscribed_rings() {
        let mut config = SimConfig::default();
        config.formation.layout = RingLayout::ScleraIrisPupil {
            sclera_share: 0.8,
            iris_share: 0.5,
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRingShares { .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_timing() {
        let mut config = SimConfig::default();
        config.formation.interval_ticks = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroInterval)));

        config.formation.interval_ticks = 10;
        config.formation.duration_ticks = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroDuration)));
    }

    #[test]
    fn validate_rejects_shrinking_cap() {
        let config = SimConfig {
            population_cap_factor: 0.5,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CapBelowPopulation { .. })
        ));
    }

    #[test]
    fn huge_cap_factor_is_clamped() {
        let config = SimConfig::from_json(r#"{ "population_cap_factor": 1e20, "seed": 1 }"#)
            .expect("config should parse");

        assert_eq!(config.population_cap_factor, MAX_POPULATION_CAP_FACTOR);
        assert_eq!(config.population_cap(), 300 * 16);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = SimConfig::from_json(
            r#"{
                "dot_count": 40,
                "containment": { "kind": "bounce", "margin": 4.0 },
                "formation": { "layout": { "kind": "iris_pupil", "iris_share": 0.7 } }
            }"#,
        )
        .expect("config should parse");

        assert_eq!(config.dot_count, 40);
        assert_eq!(config.containment, Containment::Bounce { margin: 4.0 });
        assert_eq!(config.formation.interval_ticks, 300);
        assert_eq!(config.formation.layout.shares()[0], (Ring::Outer, 0.7));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            SimConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
