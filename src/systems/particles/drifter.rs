// target-seeking particles: road flow, pedestrians and building interiors
// all share one update, tuned per population by a DriftProfile
use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::Rng;
use rand_distr::{Distribution, UnitDisc};

use crate::systems::city::targets::Target;
use crate::systems::fields::{gust, plane_wave, pointer_force};
use crate::systems::particles::FrameCtx;
use crate::systems::render::{DrawSink, Hsl};

/// What keeps a particle moving while it is held near its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Drive {
    Tangent, // follow the target's tangent (roads)
    Orbit,   // slow noise-driven circling (building interiors)
}

/// What happens when a particle strays past its tolerance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stray {
    Reassign, // jump to a fresh random target
    Return,   // snap back onto the current target, at rest
}

#[derive(Clone, Copy, Debug)]
pub struct DriftProfile {
    pub breath_base: f32,
    pub breath_amp: f32,
    pub breath_rate: f32,
    pub spring: f32,
    pub drive: Drive,
    pub drive_gain: f32,
    pub hop: f32,
    pub flow_gain: f32,
    pub wave_gain: f32,
    pub pointer_scale: f32,
    pub gust: bool,
    pub damping: f32,
    pub jitter: f32,
    pub jitter_rate: f32,
    pub vmax: f32,
    pub boost_gain: f32,
    pub retarget_gain: f32,
    pub spawn: f32, // initial scatter around the target
    pub snap: f32,  // scatter when reassigned
    pub stray: Stray,
    pub speed_min: f32,
    pub speed_max: f32,
    pub tolerance_min: f32,
    pub tolerance_max: f32,
    pub alpha_base: f32,
    pub alpha_breath: f32,
    pub size_base: f32,
    pub size_breath: f32,
    pub wave_alpha: f32,
    pub wave_size: f32,
}

pub const ROAD: DriftProfile = DriftProfile {
    breath_base: 0.85,
    breath_amp: 0.15,
    breath_rate: 0.02,
    spring: 0.03,
    drive: Drive::Tangent,
    drive_gain: 0.22,
    hop: 0.0,
    flow_gain: 0.6,
    wave_gain: 1.0,
    pointer_scale: 1.0,
    gust: true,
    damping: 0.92,
    jitter: 0.25,
    jitter_rate: 0.01,
    vmax: 3.2,
    boost_gain: 1.0,
    retarget_gain: 1.0,
    spawn: 6.0,
    snap: 3.0,
    stray: Stray::Reassign,
    speed_min: 0.8,
    speed_max: 1.25,
    tolerance_min: 18.0,
    tolerance_max: 28.0,
    alpha_base: 0.45,
    alpha_breath: 0.15,
    size_base: 1.7,
    size_breath: 0.7,
    wave_alpha: 0.6,
    wave_size: 0.35,
};

pub const PEDESTRIAN: DriftProfile = DriftProfile {
    breath_base: 0.9,
    breath_amp: 0.1,
    breath_rate: 0.03,
    spring: 0.03,
    drive: Drive::Tangent,
    drive_gain: 0.65,
    hop: 0.1,
    flow_gain: 0.4,
    wave_gain: 0.6,
    pointer_scale: 0.55,
    gust: true,
    damping: 0.9,
    jitter: 0.2,
    jitter_rate: 0.01,
    vmax: 2.0,
    boost_gain: 1.0,
    retarget_gain: 1.5,
    spawn: 8.0,
    snap: 3.0,
    stray: Stray::Reassign,
    speed_min: 0.25,
    speed_max: 0.55,
    tolerance_min: 14.0,
    tolerance_max: 22.0,
    alpha_base: 0.6,
    alpha_breath: 0.08,
    size_base: 1.0,
    size_breath: 0.25,
    wave_alpha: 0.5,
    wave_size: 0.3,
};

pub const BLOCK: DriftProfile = DriftProfile {
    breath_base: 0.9,
    breath_amp: 0.1,
    breath_rate: 0.018,
    spring: 0.035,
    drive: Drive::Orbit,
    drive_gain: 0.22,
    hop: 0.0,
    flow_gain: 0.35,
    wave_gain: 0.5,
    pointer_scale: 0.6,
    gust: false,
    damping: 0.9,
    jitter: 0.18,
    jitter_rate: 0.013,
    vmax: 2.6,
    boost_gain: 0.8,
    retarget_gain: 0.6,
    spawn: 2.0,
    snap: 2.0,
    stray: Stray::Return,
    speed_min: 1.0,
    speed_max: 1.0,
    tolerance_min: 14.0,
    tolerance_max: 22.0,
    alpha_base: 0.68,
    alpha_breath: 0.07,
    size_base: 1.3,
    size_breath: 0.4,
    wave_alpha: 0.35,
    wave_size: 0.25,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Drifter {
    pub position: Vec2,
    pub velocity: Vec2,
    pub target: usize,
    pub tolerance: f32,
    pub seed: f32,
    pub speed: f32,
    pub variant: usize, // palette slot
}

/// One population of drifters seeking targets from a single set.
#[derive(Clone, Debug)]
pub struct Drifters {
    pub profile: DriftProfile,
    pub particles: Vec<Drifter>,
}

impl Drifters {
    /// Places `count` particles around random targets. An empty target set yields no particles.
    pub fn seed(profile: DriftProfile, count: usize, targets: &[Target], variants: usize, rng: &mut impl Rng) -> Self {
        if targets.is_empty() {
            return Self {
                profile,
                particles: Vec::new(),
            };
        }

        let particles = (0..count)
            .map(|i| {
                let target = rng.random_range(0..targets.len());
                Drifter {
                    position: targets[target].position + scatter(rng, profile.spawn),
                    velocity: Vec2::ZERO,
                    target,
                    tolerance: rng.random_range(profile.tolerance_min..=profile.tolerance_max),
                    seed: rng.random_range(0.0..10000.0),
                    speed: rng.random_range(profile.speed_min..=profile.speed_max),
                    variant: i % variants.max(1),
                }
            })
            .collect();

        Self { profile, particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    fn breath(&self, p: &Drifter, frame: u64) -> f32 {
        let pr = &self.profile;
        pr.breath_base + pr.breath_amp * (frame as f32 * pr.breath_rate + p.seed).sin()
    }

    /// Forces, integration and reassignment for one frame.
    pub fn step(&mut self, ctx: &FrameCtx, targets: &[Target], rng: &mut impl Rng) {
        if targets.is_empty() {
            return;
        }
        let pr = self.profile;
        let config = ctx.config;
        let frame = ctx.frame;
        let t = frame as f32;
        let wave_dir = config.wave_direction();

        for i in 0..self.particles.len() {
            let breath = self.breath(&self.particles[i], frame);
            let p = &mut self.particles[i];
            let target = targets[p.target % targets.len()];

            let mut force = (target.position - p.position) * pr.spring * breath;

            force += match pr.drive {
                Drive::Tangent => {
                    let hop = 1.0 + pr.hop * (t * 0.12 + p.seed).sin();
                    let mut drive = target.tangent * pr.drive_gain * config.flow * breath * p.speed * hop;
                    if pr.gust {
                        drive *= gust(config, ctx.pointer, p.position);
                    }
                    drive
                }
                Drive::Orbit => {
                    let angle = ctx.noise.sample(p.seed, t * 0.012) * TAU * 2.0;
                    Vec2::from_angle(angle) * pr.drive_gain * breath
                }
            };

            force += ctx.noise.flow(p.position, frame) * pr.flow_gain * config.fnoise * config.turb;

            if config.wave && config.wpush != 0.0 {
                force += wave_dir * config.wpush * pr.wave_gain * plane_wave(config, p.position, frame);
            }

            if let Some(push) = pointer_force(config, ctx.pointer, p.position, pr.pointer_scale) {
                force += push;
            }

            p.velocity = (p.velocity + force) * pr.damping;
            p.velocity += Vec2::new(
                ctx.noise.jitter(p.seed, t * pr.jitter_rate),
                ctx.noise.jitter(p.seed + 1000.0, t * pr.jitter_rate),
            ) * pr.jitter;

            let vmax = pr.vmax * breath * (1.0 + pr.boost_gain * config.mboost * ctx.pointer.speed / 18.0);
            p.velocity = p.velocity.clamp_length_max(vmax.max(0.0));
            p.position += p.velocity;

            if !p.position.is_finite() || !p.velocity.is_finite() {
                p.position = target.position;
                p.velocity = Vec2::ZERO;
                continue;
            }

            if rng.random::<f32>() < config.jump * pr.retarget_gain {
                p.target = rng.random_range(0..targets.len());
                p.position = targets[p.target].position + scatter(rng, pr.snap);
                p.velocity *= 0.5;
            } else if p.position.distance(target.position) > p.tolerance {
                match pr.stray {
                    Stray::Reassign => {
                        p.target = rng.random_range(0..targets.len());
                        p.position = targets[p.target].position + scatter(rng, pr.snap);
                        p.velocity *= 0.5;
                    }
                    Stray::Return => {
                        p.position = target.position + scatter(rng, pr.snap);
                        p.velocity = Vec2::ZERO;
                    }
                }
            }
        }
    }

    pub fn draw(&self, ctx: &FrameCtx, colors: &[Hsl], sink: &mut dyn DrawSink) {
        let pr = &self.profile;
        let depth = ctx.config.wdepth;

        for p in &self.particles {
            let Some(projected) = ctx.camera.project(p.position.extend(0.0)) else {
                continue;
            };
            let breath = self.breath(p, ctx.frame);
            let w01 = (plane_wave(ctx.config, p.position, ctx.frame) + 1.0) * 0.5;

            let alpha = (pr.alpha_base + pr.alpha_breath * breath)
                * (1.0 + depth * pr.wave_alpha * (w01 - 0.5))
                * projected.depth_fade;
            let size = (pr.size_base + pr.size_breath * breath)
                * (1.0 + depth * pr.wave_size * (w01 - 0.5))
                * projected.size_scale;

            if let Some(color) = colors.get(p.variant % colors.len().max(1)) {
                sink.set_fill(*color, alpha);
                sink.disc(projected.x, projected.y, size);
            }
        }
    }

    /// Radial velocity kick on every `stride`-th particle within `radius` of `center`.
    pub fn kick(&mut self, center: Vec2, radius: f32, strength: f32, stride: usize) {
        let r2 = radius * radius;
        for p in self.particles.iter_mut().step_by(stride.max(1)) {
            let offset = p.position - center;
            if offset.length_squared() < r2 {
                p.velocity += offset.normalize_or_zero() * strength;
            }
        }
    }
}

// uniform point in a disc of radius `amount`
fn scatter(rng: &mut impl Rng, amount: f32) -> Vec2 {
    if amount <= 0.0 {
        return Vec2::ZERO;
    }
    let [x, y]: [f32; 2] = UnitDisc.sample(rng);
    Vec2::new(x, y) * amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::config::Config;
    use crate::systems::camera::CityCamera;
    use crate::systems::fields::NoiseField;
    use crate::systems::interaction::PointerState;
    use crate::systems::render::{Palette, RecordingSink};

    fn line_targets() -> Vec<Target> {
        (0..50)
            .map(|i| Target {
                position: Vec2::new(i as f32 * 8.0, 0.0),
                tangent: Vec2::X,
                building: None,
            })
            .collect()
    }

    #[test]
    fn empty_target_set_yields_no_particles() {
        let mut rng = StdRng::seed_from_u64(1);
        let pop = Drifters::seed(ROAD, 100, &[], 2, &mut rng);
        assert!(pop.is_empty());
    }

    #[test]
    fn seeding_alternates_palette_slots() {
        let mut rng = StdRng::seed_from_u64(1);
        let pop = Drifters::seed(ROAD, 10, &line_targets(), 2, &mut rng);
        assert_eq!(pop.len(), 10);
        assert_eq!(pop.particles[3].variant, 1);
        assert!(pop.particles.iter().all(|p| (ROAD.speed_min..=ROAD.speed_max).contains(&p.speed)));
    }

    #[test]
    fn stray_particle_returns_to_its_target() {
        let config = Config { jump: 0.0, ..Config::default() };
        let camera = CityCamera::default();
        let pointer = PointerState::at(Vec2::splat(1.0e6));
        let noise = NoiseField::new(0);
        let palette = Palette::from_config(&config).unwrap();
        let ctx = FrameCtx { config: &config, camera: &camera, pointer: &pointer, noise: &noise, palette: &palette, frame: 5 };

        let targets = line_targets();
        let mut rng = StdRng::seed_from_u64(2);
        let mut pop = Drifters::seed(BLOCK, 1, &targets, 1, &mut rng);
        let home = pop.particles[0].target;
        pop.particles[0].position = targets[home].position + Vec2::new(500.0, 0.0);

        pop.step(&ctx, &targets, &mut rng);
        let p = &pop.particles[0];
        assert_eq!(p.target, home);
        assert_eq!(p.velocity, Vec2::ZERO);
        assert!(p.position.distance(targets[home].position) <= BLOCK.snap + 1e-4);
    }

    #[test]
    fn kick_skips_by_stride_and_radius() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut pop = Drifters::seed(PEDESTRIAN, 6, &line_targets(), 1, &mut rng);
        for (i, p) in pop.particles.iter_mut().enumerate() {
            p.position = Vec2::new(10.0 + i as f32, 0.0);
            p.velocity = Vec2::ZERO;
        }
        pop.kick(Vec2::ZERO, 100.0, 1.0, 3);
        let kicked: Vec<bool> = pop.particles.iter().map(|p| p.velocity != Vec2::ZERO).collect();
        assert_eq!(kicked, [true, false, false, true, false, false]);
        assert!((pop.particles[0].velocity.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn draw_emits_one_disc_per_visible_particle() {
        let config = Config::default();
        let camera = CityCamera::default();
        let pointer = PointerState::default();
        let noise = NoiseField::new(0);
        let palette = Palette::from_config(&config).unwrap();
        let ctx = FrameCtx { config: &config, camera: &camera, pointer: &pointer, noise: &noise, palette: &palette, frame: 0 };

        // right under the look-at point, well inside the view
        let targets = vec![Target { position: Vec2::new(400.0, 0.0), tangent: Vec2::X, building: None }];
        let mut rng = StdRng::seed_from_u64(4);
        let pop = Drifters::seed(ROAD, 5, &targets, 2, &mut rng);
        let mut sink = RecordingSink::default();
        pop.draw(&ctx, &palette.road, &mut sink);
        assert_eq!(sink.discs(), 5);
        assert!(sink.all_finite());
    }
}
