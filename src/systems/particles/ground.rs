// ground scatter: static dots on z = 0, animated in size and alpha only
use bevy::prelude::*;
use rand::Rng;

use crate::config::Config;
use crate::systems::city::design::CityLayout;
use crate::systems::particles::FrameCtx;
use crate::systems::render::{DrawSink, Hsl};

#[derive(Clone, Debug, PartialEq)]
pub struct GroundParticle {
    pub position: Vec2,
    pub seed: f32,
    pub variant: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Ground {
    pub particles: Vec<GroundParticle>,
}

/// Grid spacing for the ground scatter, denser as `denGround` rises.
pub fn ground_step(config: &Config) -> f32 {
    (config.gstep / config.den_ground.max(0.1).sqrt()).floor().max(config.gmin).max(1.0)
}

impl Ground {
    /// Jittered grid over the world, skipping building footprints. Courtyards count as ground.
    pub fn seed(layout: &CityLayout, config: &Config, variants: usize, rng: &mut impl Rng) -> Self {
        let step = ground_step(config);
        let half = layout.extent * 0.5;
        let columns = (layout.extent.x / step).floor() as usize;
        let rows = (layout.extent.y / step).floor() as usize;

        let mut particles = Vec::new();
        for i in 0..=columns {
            for j in 0..=rows {
                let position = Vec2::new(
                    -half.x + i as f32 * step + rng.random_range(-step * 0.45..step * 0.45),
                    -half.y + j as f32 * step + rng.random_range(-step * 0.45..step * 0.45),
                );
                if layout.on_footprint(position) {
                    continue;
                }
                particles.push(GroundParticle {
                    position,
                    seed: rng.random_range(0.0..10000.0),
                    variant: rng.random_range(0..variants.max(1)),
                });
            }
        }

        Self { particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn draw(&self, ctx: &FrameCtx, sink: &mut dyn DrawSink) {
        let config = ctx.config;
        let colors = &ctx.palette.ground;
        let gamma = config.ggamma.max(0.01);
        let t = ctx.frame as f32;

        for g in &self.particles {
            let Some(projected) = ctx.camera.project(g.position.extend(0.0)) else {
                continue;
            };
            let depth = projected.depth_fade;
            let base = colors[g.variant % colors.len()];

            // far dots a little paler and lighter
            let color = Hsl::new(
                base.h,
                (base.s + (1.0 - depth) * 6.0).min(100.0),
                (base.l + (1.0 - depth) * 8.0).min(100.0),
            );
            let alpha = config.galpha * (0.9 * depth + 0.1);
            let wobble = 1.0 + 0.12 * (t * 0.02 + g.seed).sin();

            let shrink = config.gshrink + (1.0 - config.gshrink) * depth;
            let size = ((config.gsize + config.gjit * wobble) * projected.size_scale * depth.powf(gamma) * shrink).max(0.25);

            sink.set_fill(color, alpha);
            sink.disc(projected.x, projected.y, size);
        }
    }
}
