use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::Ring;

pub type Rgb = [u8; 3];

/// A background color plus the colors dots are drawn from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub background: Rgb,
    pub dots: Vec<Rgb>,
    /// Optional tint per ring (outer, middle, inner) while an eye is forming.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rings: Option<[Rgb; 3]>,
}

impl ColorScheme {
    /// Picks a dot color. Schemes are validated non-empty; white covers an unvalidated one.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Rgb {
        if self.dots.is_empty() {
            return [255, 255, 255];
        }
        self.dots[rng.gen_range(0..self.dots.len())]
    }

    pub fn ring_tint(&self, ring: Ring) -> Option<Rgb> {
        let rings = self.rings?;
        Some(match ring {
            Ring::Outer => rings[0],
            Ring::Middle => rings[1],
            Ring::Inner => rings[2],
        })
    }
}

pub fn default_schemes() -> Vec<ColorScheme> {
    vec![
        ColorScheme {
            background: [0, 0, 0],
            dots: vec![[255, 255, 255]],
            rings: None,
        },
        ColorScheme {
            background: [10, 8, 30],
            dots: vec![
                [120, 130, 255],
                [160, 110, 240],
                [200, 160, 255],
                [90, 170, 250],
                [230, 220, 255],
            ],
            rings: Some([[235, 235, 250], [110, 140, 255], [20, 20, 40]]),
        },
        ColorScheme {
            background: [20, 12, 6],
            dots: vec![[255, 170, 60], [250, 120, 40], [255, 210, 120], [230, 90, 50]],
            rings: Some([[255, 240, 220], [200, 120, 40], [30, 15, 5]]),
        },
    ]
}
