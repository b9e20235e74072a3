// edge runners: particles that travel the baked loops, tracing each building's outline
use bevy::prelude::*;
use rand::Rng;

use crate::systems::city::contour::Loop;
use crate::systems::fields::{plane_wave, proximity};
use crate::systems::particles::FrameCtx;
use crate::systems::render::DrawSink;

// flat speed for vertical loops, horizontal ones use the configured step
const VERTICAL_SPEED: f32 = 0.85;
const VERTICAL_RING: f32 = 3.0;
const VERTICAL_JITTER: f32 = 0.8;

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeRunner {
    pub loop_index: usize,
    pub segment: usize,
    pub distance: f32, // along the current segment, in [0, length)
    pub direction: f32,
    pub speed: f32,
    pub seed: f32,
}

impl EdgeRunner {
    /// Arclength from the start of the loop.
    #[cfg(test)]
    pub fn arclength(&self, lp: &Loop) -> f32 {
        lp.segments[..self.segment].iter().map(|s| s.length).sum::<f32>() + self.distance
    }

    /// Moves `advance` along the loop, carrying into neighbouring segments with wrap-around.
    pub fn advance(&mut self, lp: &Loop, advance: f32) {
        let n = lp.segments.len();
        if n == 0 || !advance.is_finite() || lp.length <= 0.0 {
            return;
        }
        self.segment %= n;
        self.distance += advance % lp.length;

        while self.distance >= lp.segments[self.segment].length {
            self.distance -= lp.segments[self.segment].length;
            self.segment = (self.segment + 1) % n;
        }
        while self.distance < 0.0 {
            self.segment = (self.segment + n - 1) % n;
            self.distance += lp.segments[self.segment].length;
        }
        // rounding can land exactly on the end, which is the next segment's start
        if self.distance >= lp.segments[self.segment].length {
            self.distance = 0.0;
            self.segment = (self.segment + 1) % n;
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct EdgeRunners {
    pub runners: Vec<EdgeRunner>,
}

impl EdgeRunners {
    /// Spreads about `count` runners over the loops in proportion to loop length,
    /// at least one per loop. A zero count seeds nothing.
    pub fn seed(loops: &[Loop], count: usize, flat_speed: f32, rng: &mut impl Rng) -> Self {
        let total: f32 = loops.iter().map(|l| l.length).sum();
        if count == 0 || total <= 0.0 {
            return Self::default();
        }

        let mut runners = Vec::new();
        for (loop_index, lp) in loops.iter().enumerate() {
            let quota = ((count as f32 * lp.length / total).floor() as usize).max(1);
            let base_speed = if lp.is_vertical() { VERTICAL_SPEED } else { flat_speed };

            for _ in 0..quota {
                let mut runner = EdgeRunner {
                    loop_index,
                    segment: 0,
                    distance: 0.0,
                    direction: if rng.random_bool(0.5) { 1.0 } else { -1.0 },
                    speed: base_speed * rng.random_range(0.85_f32..1.25),
                    seed: rng.random_range(0.0..10000.0),
                };
                runner.advance(lp, rng.random_range(0.0..lp.length));
                runners.push(runner);
            }
        }

        Self { runners }
    }

    pub fn len(&self) -> usize {
        self.runners.len()
    }

    pub fn step(&mut self, ctx: &FrameCtx, loops: &[Loop]) {
        let t = ctx.frame as f32;
        for r in &mut self.runners {
            let Some(lp) = loops.get(r.loop_index) else { continue };
            let seg = lp.segment(r.segment);
            let here = seg.point_at(r.distance).truncate();

            let twinkle = 0.6 + 0.4 * (t * 0.02 + r.seed).sin();
            let along = ctx.noise.flow(here, ctx.frame).dot(seg.tangent.truncate()) * 0.3;
            let boost = 1.0 + ctx.config.mboost * proximity(ctx.pointer, here);
            let advance = r.direction * (r.speed * twinkle + along).max(0.0) * boost;

            r.advance(lp, advance);
        }
    }

    pub fn draw(&self, ctx: &FrameCtx, loops: &[Loop], sink: &mut dyn DrawSink) {
        let config = ctx.config;
        let t = ctx.frame as f32;

        for r in &self.runners {
            let Some(lp) = loops.get(r.loop_index) else { continue };
            let seg = lp.segment(r.segment);
            let (ring, jitter) = if seg.vertical {
                (VERTICAL_RING, VERTICAL_JITTER)
            } else {
                (config.ering, config.erjit)
            };

            let mut point = seg.point_at(r.distance);
            point.x += seg.normal.x * (ring + jitter * (t * 0.027 + r.seed).sin());
            point.y += seg.normal.y * (ring + jitter * (t * 0.025 + r.seed).cos());
            if !seg.vertical {
                point += seg.tangent * 0.6 * (t * 0.015 + r.seed).sin();
            }

            let Some(projected) = ctx.camera.project(point) else { continue };

            let ground = point.truncate();
            let twinkle = 1.0
                + config.ertwinkle * plane_wave(config, ground, ctx.frame)
                + 0.5 * config.mboost * proximity(ctx.pointer, ground);
            let base = if seg.vertical { config.ersizev } else { config.ersizeh };
            let size = base * twinkle * projected.size_scale;
            let alpha = config.eralpha * twinkle * projected.depth_fade;

            // halo then core
            sink.set_fill(ctx.palette.runner_halo(point.z, point.y), alpha * 0.16);
            sink.disc(projected.x, projected.y, size * 1.9);
            sink.set_fill(ctx.palette.runner_core(point.z, point.y), alpha);
            sink.disc(projected.x, projected.y, size);
        }
    }
}
