use serde::{Deserialize, Serialize};

use crate::config::Containment;
use crate::containment::{contain, Bounds};
use crate::math::Vec2;
use crate::palette::Rgb;

/// Which concentric eye ring an agent targets while forming.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ring {
    Outer,
    Middle,
    Inner,
}

/// Ring plus fixed angle, held for one formation episode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormationSlot {
    pub ring: Ring,
    pub angle: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub size: f32,
    pub color: Rgb,
    pub max_speed: f32,
    pub max_force: f32,
    pub slot: Option<FormationSlot>,
}

/// What the renderer needs to draw one oriented marker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSample {
    pub position: Vec2,
    pub heading: f32,
    pub size: f32,
    pub color: Rgb,
}

impl Agent {
    pub fn new(
        position: Vec2,
        velocity: Vec2,
        size: f32,
        color: Rgb,
        max_speed: f32,
        max_force: f32,
    ) -> Self {
        Self {
            position,
            velocity: velocity.limit(max_speed),
            acceleration: Vec2::ZERO,
            size,
            color,
            max_speed,
            max_force,
            slot: None,
        }
    }

    pub fn ring(&self) -> Option<Ring> {
        self.slot.map(|slot| slot.ring)
    }

    /// Half the drawn size.
    pub fn radius(&self) -> f32 {
        self.size * 0.5
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration += force;
    }

    /// Advances one tick: accumulate `steering`, cap speed, move, contain, clear acceleration.
    pub fn integrate(
        &mut self,
        steering: Vec2,
        bounds: Bounds,
        containment: &Containment,
    ) -> RenderSample {
        self.apply_force(steering);
        self.velocity = (self.velocity + self.acceleration).limit(self.max_speed);
        self.position += self.velocity;
        let radius = self.radius();
        contain(containment, bounds, radius, &mut self.position, &mut self.velocity);
        self.acceleration = Vec2::ZERO;
        self.render_sample()
    }

    pub fn render_sample(&self) -> RenderSample {
        RenderSample {
            position: self.position,
            heading: self.velocity.heading(),
            size: self.size,
            color: self.color,
        }
    }
}
