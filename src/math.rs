use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

pub(crate) const EPSILON: f32 = 1.0e-9;

/// A point or displacement in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn length_sq(self) -> f32 {
        distance_sq(self.x, self.y)
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    pub fn is_zero(self) -> bool {
        self.length_sq() <= EPSILON
    }

    /// Rescales to `magnitude`, or returns zero when there is no direction to keep.
    pub fn with_magnitude(self, magnitude: f32) -> Self {
        let (x, y) = normalize_to_magnitude(self.x, self.y, magnitude);
        Self::new(x, y)
    }

    pub fn normalize_or_zero(self) -> Self {
        self.with_magnitude(1.0)
    }

    pub fn limit(self, max_magnitude: f32) -> Self {
        let (x, y) = limit_magnitude(self.x, self.y, max_magnitude);
        Self::new(x, y)
    }

    /// Direction of travel in radians; zero for a stationary vector.
    pub fn heading(self) -> f32 {
        if self.is_zero() {
            0.0
        } else {
            self.y.atan2(self.x)
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;

    fn div(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

pub fn distance_sq(dx: f32, dy: f32) -> f32 {
    dx * dx + dy * dy
}

pub fn normalize_to_magnitude(x: f32, y: f32, magnitude: f32) -> (f32, f32) {
    let mag_sq = distance_sq(x, y);
    if mag_sq <= EPSILON || !mag_sq.is_finite() {
        return (0.0, 0.0);
    }

    let scale = magnitude / mag_sq.sqrt();
    (x * scale, y * scale)
}

pub fn limit_magnitude(x: f32, y: f32, max_magnitude: f32) -> (f32, f32) {
    if max_magnitude <= 0.0 {
        return (0.0, 0.0);
    }

    let mag_sq = distance_sq(x, y);
    let max_sq = max_magnitude * max_magnitude;
    if mag_sq <= max_sq {
        return (x, y);
    }

    let scale = max_magnitude / mag_sq.sqrt();
    (x * scale, y * scale)
}

/// The classic "desired minus current velocity" steering formula.
pub fn steer_towards(
    desired_direction: Vec2,
    velocity: Vec2,
    max_speed: f32,
    max_force: f32,
) -> Vec2 {
    if desired_direction.is_zero() {
        return Vec2::ZERO;
    }

    (desired_direction.with_magnitude(max_speed) - velocity).limit(max_force)
}

pub(crate) fn clamp_finite(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(min, max)
}
