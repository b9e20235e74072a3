// end to end scenarios across the city pipeline
use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::{Config, PointerMode};
use crate::systems::camera::CityCamera;
use crate::systems::city::ParticleCity;
use crate::systems::city::contour::bake;
use crate::systems::city::design::{self, Building, BuildingId, ContourKind};
use crate::systems::city::poly::shapes;
use crate::systems::city::poly::utils::polygon_centroid;
use crate::systems::city::targets::TargetSet;
use crate::systems::fields::{NoiseField, pointer_force};
use crate::systems::interaction::PointerState;
use crate::systems::particles::FrameCtx;
use crate::systems::particles::drifter::{self, Drifters};
use crate::systems::particles::ripple::{Ripple, RipplePool};
use crate::systems::particles::runner::EdgeRunners;
use crate::systems::render::{Palette, RecordingSink};

fn small_world() -> Config {
    Config {
        world_w: 800.0,
        world_h: 800.0,
        ..Config::default()
    }
}

#[test]
fn rectangle_bakes_into_one_inward_loop() {
    let loops = bake(&[Building::new(BuildingId(0), shapes::rect(0.0, 0.0, 100.0, 60.0))]);
    assert_eq!(loops.len(), 1);

    let lp = &loops[0];
    assert_eq!(lp.kind, ContourKind::Outer);
    assert_eq!(lp.segments.len(), 4);
    assert!((lp.length - 320.0).abs() < 1e-3);

    let center = polygon_centroid(&shapes::rect(0.0, 0.0, 100.0, 60.0));
    assert!(center.distance(Vec2::new(50.0, 30.0)) < 1e-4);
    for seg in &lp.segments {
        let mid = (seg.start.truncate() + seg.end.truncate()) * 0.5;
        assert!((center - mid).dot(seg.normal) > 0.0);
        assert!((seg.normal.length() - 1.0).abs() < 1e-5);
    }

    // consecutive segments share endpoints, last closes onto first
    for (i, seg) in lp.segments.iter().enumerate() {
        let next = lp.segment(i + 1);
        assert!(seg.end.distance(next.start) < 1e-4);
    }
}

#[test]
fn repel_pushes_outward_at_half_radius() {
    let config = Config {
        mmode: PointerMode::Repel,
        ms: 1.0,
        ..Config::default()
    };
    let pointer = PointerState::at(Vec2::ZERO);
    let point = Vec2::new(config.mr * 0.5, 0.0);

    let force = pointer_force(&config, &pointer, point, 1.0).unwrap();
    let sigma = config.mr * 0.6;
    let expected = 0.8 * (-(point.x * point.x) / (2.0 * sigma * sigma)).exp();
    assert!((force.x - expected).abs() < 1e-3);
    assert!(force.y.abs() < 1e-6);
}

#[test]
fn camera_looking_at_origin_centers_it() {
    let camera = CityCamera::new(Vec3::ZERO, 0.0, 30f32.to_radians(), 600.0, 90f32.to_radians());
    let p = camera.project(Vec3::ZERO).unwrap();
    assert!((p.x - 640.0).abs() < 1.0);
    assert!((p.y - 360.0).abs() < 1.0);
}

#[test]
fn full_pool_evicts_the_oldest() {
    let mut pool = RipplePool::new(3);
    for i in 0..5 {
        pool.push(Ripple::new(Vec2::new(i as f32, 0.0), 1.0, 1.0, 0.0));
    }
    assert_eq!(pool.len(), 3);
    let centers: Vec<f32> = pool.iter().map(|r| r.center.x).collect();
    assert_eq!(centers, [2.0, 3.0, 4.0]);
}

#[test]
fn project_then_unproject_returns_the_ground_point() {
    for pitch in [10.0f32, 30.0, 55.0, 80.0] {
        let camera = CityCamera::new(Vec3::ZERO, 0.4, pitch.to_radians(), 600.0, 90f32.to_radians());
        for point in [Vec2::ZERO, Vec2::new(60.0, -40.0), Vec2::new(-90.0, 25.0)] {
            let p = camera.project(point.extend(0.0)).unwrap();
            let back = camera.unproject(Vec2::new(p.x, p.y)).unwrap();
            assert!(back.distance(point) < 0.05, "pitch {pitch}: {point} -> {back}");
        }
    }
}

#[test]
fn baking_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(11);
    let layout = design::generate(Vec2::new(900.0, 900.0), Vec2::new(220.0, 200.0), 0.5, 0.9, &mut rng);
    assert_eq!(bake(&layout.buildings), bake(&layout.buildings));
}

#[test]
fn runners_stay_on_their_segment_and_never_back_up() {
    let config = small_world();
    let camera = CityCamera::default();
    let pointer = PointerState::at(Vec2::new(100.0, 50.0));
    let noise = NoiseField::new(4);
    let palette = Palette::from_config(&config).unwrap();

    let mut rng = StdRng::seed_from_u64(12);
    let layout = design::generate(config.world_extent(), config.grid_spacing(), 0.5, 0.9, &mut rng);
    let loops = bake(&layout.buildings);
    let mut runners = EdgeRunners::seed(&loops, 400, config.erstep, &mut rng);
    assert!(runners.len() >= loops.len());

    for frame in 0..300 {
        let ctx = FrameCtx { config: &config, camera: &camera, pointer: &pointer, noise: &noise, palette: &palette, frame };
        let before: Vec<f32> = runners.runners.iter().map(|r| r.arclength(&loops[r.loop_index])).collect();
        runners.step(&ctx, &loops);

        for (r, old) in runners.runners.iter().zip(before) {
            let lp = &loops[r.loop_index];
            assert!(r.segment < lp.segments.len());
            assert!(r.distance >= 0.0 && r.distance < lp.segments[r.segment].length);

            // signed progress, wrapped into half a loop either way
            let d = (r.arclength(lp) - old) * r.direction;
            let d = d - lp.length * (d / lp.length).round();
            assert!(d >= -1e-3, "runner moved backwards by {d}");
        }
    }
}

#[test]
fn drifters_stay_within_tolerance_of_their_target() {
    let config = Config { jump: 0.05, ..small_world() };
    let camera = CityCamera::default();
    let noise = NoiseField::new(5);
    let palette = Palette::from_config(&config).unwrap();

    let mut rng = StdRng::seed_from_u64(13);
    let layout = design::generate(config.world_extent(), config.grid_spacing(), 0.5, 0.9, &mut rng);
    let targets = TargetSet::bake(&layout.roads, &layout.buildings, 1.0, 0.5, &mut rng);
    let mut roads = Drifters::seed(drifter::ROAD, 300, &targets.road, 2, &mut rng);
    let mut blocks = Drifters::seed(drifter::BLOCK, 300, &targets.building, 1, &mut rng);

    let mut pointer = PointerState::at(Vec2::ZERO);
    for frame in 0..200 {
        // sweep the pointer across the world to stir things up
        let x = -400.0 + frame as f32 * 4.0;
        pointer.track(Vec2::ZERO, Some(Vec2::new(x, x * 0.3)));
        let ctx = FrameCtx { config: &config, camera: &camera, pointer: &pointer, noise: &noise, palette: &palette, frame };

        roads.step(&ctx, &targets.road, &mut rng);
        blocks.step(&ctx, &targets.building, &mut rng);

        for (pop, set) in [(&roads, &targets.road), (&blocks, &targets.building)] {
            for p in &pop.particles {
                let target = set[p.target].position;
                assert!(p.position.distance(target) <= p.tolerance + 1e-3);
            }
        }
    }
}

#[test]
fn auto_ripple_fades_out_in_bounded_time() {
    let config = Config::default();
    let mut pool = RipplePool::new(config.rmax);
    pool.push(Ripple::new(Vec2::ZERO, config.ralpha_auto, config.rspeed_auto, 0.0));

    let diagonal = config.world_diagonal();
    for frame in 0..200 {
        pool.update(frame, diagonal);
    }
    assert_eq!(pool.len(), 1);

    for frame in 200..206 {
        pool.update(frame, diagonal);
    }
    assert!(pool.is_empty());
}

#[test]
fn city_runs_headless_with_finite_output() {
    let config = small_world();
    let camera = CityCamera::default();
    let mut city = ParticleCity::generate(&config, 99, camera.viewport()).unwrap();
    assert!(city.particle_total() > 0);

    let mut pointer = PointerState::default();
    let mut sink = RecordingSink::default();
    for frame in 0..60 {
        let screen = Vec2::new(300.0 + frame as f32 * 10.0, 400.0);
        pointer.track(screen, camera.unproject(screen));
        if frame % 20 == 0 {
            city.pulse(&config, pointer.ground);
        }
        city.tick(&config, &camera, &pointer, &mut sink);
    }

    assert_eq!(city.frame, 60);
    assert!(city.ripples.len() <= config.rmax);
    assert!(sink.discs() > 0);
    assert!(sink.outlines() > 0);
    assert!(sink.all_finite());
}
