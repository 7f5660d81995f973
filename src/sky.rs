//! Time-of-day sky ramp
//!
//! Background colour, star density and ambient light as pure functions of the
//! sun's height.

use serde::Serialize;

use crate::sun::SUN_DISTANCE;

pub const NIGHT_COLOR: [f64; 3] = [0.05, 0.05, 0.12];
pub const SUNRISE_COLOR: [f64; 3] = [0.8, 0.6, 0.5];
pub const DAY_COLOR: [f64; 3] = [0.5, 0.7, 1.0];

/// Normalised height where the sunrise colour is reached
const SUNRISE_HEIGHT: f64 = 0.2;
const MIN_HEIGHT: f64 = -0.2;
const MAX_HEIGHT: f64 = 0.6;

const STARS_TWILIGHT: u32 = 2000;
const STARS_DAY: u32 = 500;
const STARS_NIGHT: u32 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sky {
    pub normalized_height: f64,
    pub background: [f64; 3],
    pub star_count: u32,
    pub ambient_intensity: f64,
}

impl Sky {
    pub fn from_sun_height(sun_y: f64) -> Self {
        let n = normalized_height(sun_y);
        Self {
            normalized_height: n,
            background: sky_color(n),
            star_count: star_count(n),
            ambient_intensity: ambient_intensity(sun_y),
        }
    }
}

pub fn normalized_height(sun_y: f64) -> f64 {
    (sun_y / SUN_DISTANCE).clamp(MIN_HEIGHT, MAX_HEIGHT)
}

fn lerp(a: [f64; 3], b: [f64; 3], t: f64) -> [f64; 3] {
    [0, 1, 2].map(|i| a[i] * (1.0 - t) + b[i] * t)
}

pub fn sky_color(n: f64) -> [f64; 3] {
    if n < 0.0 {
        NIGHT_COLOR
    } else if n < SUNRISE_HEIGHT {
        lerp(NIGHT_COLOR, SUNRISE_COLOR, n / SUNRISE_HEIGHT)
    } else {
        lerp(SUNRISE_COLOR, DAY_COLOR, (n - SUNRISE_HEIGHT) / (MAX_HEIGHT - SUNRISE_HEIGHT))
    }
}

pub fn star_count(n: f64) -> u32 {
    if n <= 0.0 {
        STARS_NIGHT
    } else if n < SUNRISE_HEIGHT {
        STARS_TWILIGHT
    } else {
        STARS_DAY
    }
}

pub fn ambient_intensity(sun_y: f64) -> f64 {
    0.2 + (sun_y / SUN_DISTANCE).max(0.0) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx3(a: [f64; 3], b: [f64; 3]) -> bool {
        a.iter().zip(&b).all(|(x, y)| (x - y).abs() < 1e-12)
    }

    #[test]
    fn test_normalized_height_clamped() {
        assert_eq!(normalized_height(-300.0), -0.2);
        assert_eq!(normalized_height(300.0), 0.6);
        assert!((normalized_height(30.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_color_anchors() {
        assert!(approx3(sky_color(-0.1), NIGHT_COLOR));
        assert!(approx3(sky_color(0.0), NIGHT_COLOR));
        assert!(approx3(sky_color(0.2), SUNRISE_COLOR));
        assert!(approx3(sky_color(0.6), DAY_COLOR));
        assert!(approx3(sky_color(0.1), [0.425, 0.325, 0.31]));
        assert!(approx3(sky_color(0.4), [0.65, 0.65, 0.75]));
    }

    #[test]
    fn test_star_thresholds() {
        assert_eq!(star_count(-0.2), 5000);
        assert_eq!(star_count(0.0), 5000);
        assert_eq!(star_count(0.01), 2000);
        assert_eq!(star_count(0.1999), 2000);
        assert_eq!(star_count(0.2), 500);
        assert_eq!(star_count(0.6), 500);
    }

    #[test]
    fn test_sky_from_sun() {
        let night = Sky::from_sun_height(-150.0);
        assert_eq!(night.star_count, 5000);
        assert!((night.ambient_intensity - 0.2).abs() < 1e-12);

        let noon = Sky::from_sun_height(300.0);
        assert_eq!(noon.background, DAY_COLOR);
        assert!((noon.ambient_intensity - 0.7).abs() < 1e-12);
    }
}
