// ripples: expanding rings spawned at hubs and on pointer pulses
use std::collections::VecDeque;
use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::config::Config;
use crate::systems::particles::FrameCtx;
use crate::systems::render::DrawSink;

pub const INITIAL_RADIUS: f32 = 10.0;
// below this alpha a ripple is no longer drawn and gets dropped
pub const VISIBILITY_FLOOR: f32 = 0.03;
const DECAY: f32 = 0.016;
const BAND_STEPS: usize = 8;

#[derive(Clone, Debug, PartialEq)]
pub struct Ripple {
    pub center: Vec2,
    pub radius: f32,
    pub age: u32,
    pub alpha0: f32,
    pub seed: f32,
    pub speed: f32,
}

impl Ripple {
    pub fn new(center: Vec2, alpha0: f32, speed: f32, seed: f32) -> Self {
        Self {
            center,
            radius: INITIAL_RADIUS,
            age: 0,
            alpha0,
            seed,
            speed,
        }
    }

    /// Exponential decay in age.
    pub fn alpha(&self) -> f32 {
        self.alpha0 * (-(self.age as f32) * DECAY).exp()
    }

    pub fn grow(&mut self, frame: u64) {
        self.age += 1;
        self.radius += self.speed * (1.0 + 0.06 * (frame as f32 * 0.07 + self.seed).sin());
    }

    pub fn expired(&self, max_radius: f32) -> bool {
        self.alpha() < VISIBILITY_FLOOR || self.radius > max_radius
    }
}

/// Active ripples, oldest first. Pushing past capacity evicts the oldest.
#[derive(Clone, Debug)]
pub struct RipplePool {
    ripples: VecDeque<Ripple>,
    capacity: usize,
}

impl RipplePool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ripples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, ripple: Ripple) {
        self.ripples.push_back(ripple);
        while self.ripples.len() > self.capacity {
            self.ripples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.ripples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ripples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ripple> {
        self.ripples.iter()
    }

    /// Grows every ripple and drops the expired ones in the same pass.
    pub fn update(&mut self, frame: u64, max_radius: f32) {
        for ripple in self.ripples.iter_mut() {
            ripple.grow(frame);
        }
        self.ripples.retain(|r| !r.expired(max_radius));
    }

    pub fn draw(&self, ctx: &FrameCtx, sink: &mut dyn DrawSink) {
        let config = ctx.config;
        let segments = config.rsegs.max(1);
        let t = ctx.frame as f32;

        for ripple in &self.ripples {
            let alpha = ripple.alpha();

            if config.rmode.dots() {
                for j in 0..segments {
                    let angle = j as f32 / segments as f32 * TAU;
                    let jitter = config.rjit * ctx.noise.jitter(ripple.seed + j as f32 * 0.013, t * 0.01);
                    let r = (ripple.radius + jitter).max(1.0);
                    let point = ripple.center + Vec2::from_angle(angle) * r;
                    let Some(projected) = ctx.camera.project(point.extend(0.0)) else { continue };

                    let size = 1.2 + 0.6 * (angle * 2.0 + ripple.age as f32 * 0.05).sin();
                    sink.set_fill(ctx.palette.ripple_dot, alpha * 0.8 * projected.depth_fade);
                    sink.disc(projected.x, projected.y, size * projected.size_scale);
                }
            }

            if config.rmode.band() {
                // concentric strokes across the band, brightest in the middle
                for k in 0..BAND_STEPS {
                    let s = k as f32 / (BAND_STEPS - 1) as f32;
                    let r = ripple.radius - config.rthick * 0.5 + s * config.rthick;
                    if r <= 0.0 {
                        continue;
                    }
                    let fade = 1.0 - (s * 2.0 - 1.0).abs();
                    let band_alpha = alpha * 0.65 * fade.powf(0.9);

                    for j in 0..segments {
                        let angle = j as f32 / segments as f32 * TAU;
                        let point = ripple.center + Vec2::from_angle(angle) * r;
                        let Some(projected) = ctx.camera.project(point.extend(0.0)) else { continue };

                        sink.set_stroke(ctx.palette.ripple_ring, band_alpha * 0.6 * projected.depth_fade, 1.0);
                        sink.circle_outline(projected.x, projected.y, (0.9 + 0.35 * fade) * projected.size_scale);
                    }
                }
            }
        }
    }
}

/// Slow, faint ripple at a random hub, with probability `remit` per frame.
pub fn emit_auto(pool: &mut RipplePool, hubs: &[Vec2], config: &Config, rng: &mut impl Rng) -> bool {
    if !config.ripple || hubs.is_empty() || rng.random::<f32>() >= config.remit {
        return false;
    }
    let Some(&hub) = hubs.choose(rng) else { return false };
    pool.push(Ripple::new(hub, config.ralpha_auto, config.rspeed_auto, rng.random_range(0.0..1000.0)));
    true
}

/// Fast, strong ripple where the user pressed.
pub fn emit_user(pool: &mut RipplePool, at: Vec2, config: &Config, rng: &mut impl Rng) {
    if !config.ripple {
        return;
    }
    pool.push(Ripple::new(at, config.ralpha, config.rspeed, rng.random_range(0.0..1000.0)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn alpha_strictly_decreases_with_age() {
        let mut ripple = Ripple::new(Vec2::ZERO, 1.2, 3.0, 0.0);
        let mut last = ripple.alpha();
        for frame in 0..200 {
            ripple.grow(frame);
            let a = ripple.alpha();
            assert!(a < last);
            last = a;
        }
    }

    #[test]
    fn faded_ripples_are_dropped() {
        let mut pool = RipplePool::new(4);
        pool.push(Ripple::new(Vec2::ZERO, 0.031, 1.0, 0.0));
        pool.update(0, 1.0e9);
        assert!(pool.is_empty());
    }

    #[test]
    fn oversized_ripples_are_dropped() {
        let mut pool = RipplePool::new(4);
        pool.push(Ripple::new(Vec2::ZERO, 1.0, 50.0, 0.0));
        pool.update(0, 40.0);
        assert!(pool.is_empty());
    }

    #[test]
    fn auto_emission_respects_switches() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut pool = RipplePool::new(8);
        let hubs = [Vec2::new(10.0, 10.0)];

        let always = Config { remit: 1.0, ..Config::default() };
        assert!(emit_auto(&mut pool, &hubs, &always, &mut rng));
        assert_eq!(pool.iter().next().map(|r| r.center), Some(hubs[0]));
        assert!(!emit_auto(&mut pool, &[], &always, &mut rng));

        let never = Config { remit: 0.0, ..Config::default() };
        assert!(!emit_auto(&mut pool, &hubs, &never, &mut rng));

        let off = Config { ripple: false, ..Config::default() };
        emit_user(&mut pool, Vec2::ZERO, &off, &mut rng);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn user_ripples_outpace_auto_ripples() {
        let config = Config::default();
        assert!(config.rspeed > config.rspeed_auto);
        assert!(config.ralpha > config.ralpha_auto);
    }
}
