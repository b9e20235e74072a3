// force fields: plane wave, pointer force, gust and proximity
// plus the seeded noise every animated population samples
use std::f32::consts::TAU;

use bevy::prelude::*;
use noise::{NoiseFn, Perlin};

use crate::config::{Config, PointerMode};
use crate::systems::interaction::PointerState;

// gust only reaches particles this close to the pointer
pub const GUST_RADIUS: f32 = 140.0;
// gaussian width of the pointer proximity used by edge runners
pub const PROXIMITY_SIGMA: f32 = 220.0;
// spatial frequency of the flow field
const FLOW_SCALE: f32 = 0.0015;
// flow field time step per frame
const FLOW_TIME: f32 = 0.003;

/// Travelling plane wave in [-1, 1]; 0 when waves are disabled.
pub fn plane_wave(config: &Config, point: Vec2, frame: u64) -> f32 {
    if !config.wave {
        return 0.0;
    }
    let lambda = config.wlambda.max(1.0);
    let k = TAU / lambda;
    let omega = TAU * config.wspeed / lambda;
    let s = point.dot(config.wave_direction());
    (k * s - omega * frame as f32).cos()
}

/// Pointer-centered force on a particle at `point`.
/// # Returns `None` outside the pointer radius or when interaction is off
pub fn pointer_force(config: &Config, pointer: &PointerState, point: Vec2, scale: f32) -> Option<Vec2> {
    if !config.mint {
        return None;
    }
    let offset = point - pointer.ground;
    let d2 = offset.length_squared();
    if d2 > config.mr * config.mr {
        return None;
    }

    let d = d2.sqrt() + 1e-6;
    let sigma = config.mr * 0.6;
    let g = (-(d * d) / (2.0 * sigma * sigma)).exp();
    let strength = config.ms;
    let radial = offset / d;
    let tangent = Vec2::new(-offset.y / d, offset.x / d);

    let scoop = || pointer.velocity * 0.12 * strength * g * (pointer.speed / 20.0);
    let attract = || -radial * 0.8 * strength * g;
    let swirl = || tangent * config.msw * strength * g * (0.2 + pointer.speed / 20.0);

    let force = match config.mmode {
        PointerMode::Scoop => scoop(),
        PointerMode::Attract => attract(),
        PointerMode::Repel => radial * 0.8 * strength * g,
        PointerMode::Swirl => swirl(),
        PointerMode::Hybrid => scoop() + attract() + swirl(),
    };

    let force = force * scale;
    force.is_finite().then_some(force)
}

/// Tangent-drive multiplier near the pointer, 1 elsewhere.
pub fn gust(config: &Config, pointer: &PointerState, point: Vec2) -> f32 {
    let d = point.distance(pointer.ground);
    if d >= GUST_RADIUS {
        return 1.0;
    }
    let amp = 1.0 - d / GUST_RADIUS;
    1.0 + config.gust * amp * (0.5 + 0.5 * (pointer.speed / 10.0).min(1.0))
}

/// Gaussian falloff of distance to the pointer, 1 at the pointer.
pub fn proximity(pointer: &PointerState, point: Vec2) -> f32 {
    let d2 = point.distance_squared(pointer.ground);
    (-d2 / (2.0 * PROXIMITY_SIGMA * PROXIMITY_SIGMA)).exp()
}

/// Seeded Perlin noise remapped to [0, 1].
#[derive(Clone, Debug)]
pub struct NoiseField {
    perlin: Perlin,
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
        }
    }

    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let n = self.perlin.get([x as f64, y as f64]) as f32;
        ((n + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    pub fn sample3(&self, x: f32, y: f32, z: f32) -> f32 {
        let n = self.perlin.get([x as f64, y as f64, z as f64]) as f32;
        ((n + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Unit flow vector at a world point, slowly drifting over time.
    pub fn flow(&self, point: Vec2, frame: u64) -> Vec2 {
        let angle = self.sample3(point.x * FLOW_SCALE, point.y * FLOW_SCALE, frame as f32 * FLOW_TIME) * TAU * 2.0;
        Vec2::from_angle(angle)
    }

    /// Zero-centered per-particle jitter in [-0.5, 0.5].
    pub fn jitter(&self, seed: f32, t: f32) -> f32 {
        self.sample(seed, t) - 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: PointerMode) -> Config {
        Config {
            mmode: mode,
            ..Config::default()
        }
    }

    #[test]
    fn no_force_outside_radius_or_when_disabled() {
        let pointer = PointerState::at(Vec2::ZERO);
        let cfg = config(PointerMode::Hybrid);
        assert!(pointer_force(&cfg, &pointer, Vec2::new(cfg.mr + 1.0, 0.0), 1.0).is_none());

        let off = Config { mint: false, ..cfg };
        assert!(pointer_force(&off, &pointer, Vec2::new(10.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn attract_points_inward_for_positive_strength() {
        let pointer = PointerState::at(Vec2::ZERO);
        let cfg = Config { ms: 1.0, ..config(PointerMode::Attract) };
        let f = pointer_force(&cfg, &pointer, Vec2::new(50.0, 0.0), 1.0).unwrap();
        assert!(f.x < 0.0 && f.y.abs() < 1e-6);
    }

    #[test]
    fn swirl_is_tangential() {
        let pointer = PointerState::at(Vec2::ZERO);
        let cfg = Config { ms: 1.0, ..config(PointerMode::Swirl) };
        let p = Vec2::new(30.0, 40.0);
        let f = pointer_force(&cfg, &pointer, p, 1.0).unwrap();
        assert!(f.dot(p).abs() < 1e-4);
        assert!(f.length() > 0.0);
    }

    #[test]
    fn resting_pointer_scoop_is_zero() {
        let pointer = PointerState::at(Vec2::ZERO);
        let f = pointer_force(&config(PointerMode::Scoop), &pointer, Vec2::new(20.0, 0.0), 1.0).unwrap();
        assert_eq!(f, Vec2::ZERO);
    }

    #[test]
    fn plane_wave_is_bounded_and_can_be_disabled() {
        let cfg = Config::default();
        for frame in [0, 17, 400] {
            let w = plane_wave(&cfg, Vec2::new(123.0, -45.0), frame);
            assert!((-1.0..=1.0).contains(&w));
        }
        assert_eq!(plane_wave(&cfg, Vec2::ZERO, 0), 1.0);
        let off = Config { wave: false, ..cfg };
        assert_eq!(plane_wave(&off, Vec2::new(5.0, 5.0), 3), 0.0);
    }

    #[test]
    fn gust_and_proximity_fall_off() {
        let pointer = PointerState::at(Vec2::ZERO);
        let cfg = Config::default();
        assert_eq!(gust(&cfg, &pointer, Vec2::new(GUST_RADIUS, 0.0)), 1.0);
        assert!(gust(&cfg, &pointer, Vec2::new(10.0, 0.0)) > 1.0);
        assert_eq!(proximity(&pointer, Vec2::ZERO), 1.0);
        assert!(proximity(&pointer, Vec2::new(300.0, 0.0)) < proximity(&pointer, Vec2::new(100.0, 0.0)));
    }

    #[test]
    fn noise_is_unit_range_and_seeded() {
        let a = NoiseField::new(4);
        let b = NoiseField::new(4);
        for i in 0..50 {
            let x = i as f32 * 0.37;
            let v = a.sample(x, 1.3);
            assert!((0.0..=1.0).contains(&v));
            assert_eq!(v, b.sample(x, 1.3));
        }
        let f = a.flow(Vec2::new(100.0, 50.0), 10);
        assert!((f.length() - 1.0).abs() < 1e-4);
    }
}
