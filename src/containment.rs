use serde::{Deserialize, Serialize};

use crate::config::Containment;
use crate::math::Vec2;

/// World extent; positions live in `[0, width] x [0, height]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn contains(self, point: Vec2) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }
}

/// Pulls `position` back inside `bounds`, flipping `velocity` for the bounce policies.
///
/// The bounce edges sit at least `radius` in from the walls so a drawn dot never crosses them.
pub fn contain(
    policy: &Containment,
    bounds: Bounds,
    radius: f32,
    position: &mut Vec2,
    velocity: &mut Vec2,
) {
    match *policy {
        Containment::Wrap => {
            position.x = wrap_axis(position.x, bounds.width);
            position.y = wrap_axis(position.y, bounds.height);
        }
        Containment::Bounce { margin } => {
            let margin = margin.max(radius);
            bounce_axis(&mut position.x, &mut velocity.x, margin, bounds.width);
            bounce_axis(&mut position.y, &mut velocity.y, margin, bounds.height);
        }
        Containment::Soft { .. } => {
            bounce_axis(&mut position.x, &mut velocity.x, radius, bounds.width);
            bounce_axis(&mut position.y, &mut velocity.y, radius, bounds.height);
        }
    }
}

/// Continuous push away from the edges inside the soft margin band; zero for other policies.
///
/// The push on each axis grows linearly from zero at the inner edge of the band to
/// `strength` at the wall, and the combined vector is capped at `strength`.
pub fn boundary_force(policy: &Containment, bounds: Bounds, position: Vec2) -> Vec2 {
    let Containment::Soft { margin, strength } = *policy else {
        return Vec2::ZERO;
    };
    if margin <= 0.0 || strength <= 0.0 {
        return Vec2::ZERO;
    }

    let push = Vec2::new(
        edge_push(position.x, bounds.width, margin),
        edge_push(position.y, bounds.height, margin),
    );
    (push * strength).limit(strength)
}

fn edge_push(value: f32, extent: f32, margin: f32) -> f32 {
    let margin = margin.min(extent * 0.5);
    if margin <= 0.0 {
        return 0.0;
    }

    let mut push = 0.0;
    if value < margin {
        push += (margin - value.max(0.0)) / margin;
    }
    if value > extent - margin {
        push -= (value.min(extent) - (extent - margin)) / margin;
    }
    push
}

fn wrap_axis(value: f32, extent: f32) -> f32 {
    if (0.0..=extent).contains(&value) {
        return value;
    }
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs, which is still in range.
    wrapped.clamp(0.0, extent)
}

fn bounce_axis(value: &mut f32, velocity: &mut f32, margin: f32, extent: f32) {
    let low = if margin.is_finite() {
        margin.clamp(0.0, extent * 0.5)
    } else {
        0.0
    };
    let high = extent - low;

    if *value < low {
        *value = low;
        if *velocity < 0.0 {
            *velocity = -*velocity;
        }
    } else if *value > high {
        *value = high;
        if *velocity > 0.0 {
            *velocity = -*velocity;
        }
    }
}
