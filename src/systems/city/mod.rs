// entry point for the particle city plugin
// owns the generated world and every particle population, and drives them once per frame
use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowOccluded, WindowResized};
use bevy_egui::{EguiContexts, EguiPrimaryContextPass, egui};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::*;
use crate::systems::camera::CityCamera;
use crate::systems::fields::NoiseField;
use crate::systems::interaction::{self, PointerState, PulseEvent};
use crate::systems::particles::drifter::{self, Drifters};
use crate::systems::particles::ground::Ground;
use crate::systems::particles::ripple::{self, RipplePool};
use crate::systems::particles::runner::EdgeRunners;
use crate::systems::particles::{FrameCtx, particle_count};
use crate::systems::render::{DrawSink, EguiSink, Palette};
use crate::systems::ui::indicator::{Status, StatusEvent};

pub mod contour;
pub mod design;
pub mod poly;
pub mod targets;

use contour::Loop;
use design::CityLayout;
use targets::TargetSet;

// 2d polygon, counter-clockwise unless noted
pub type Polygon = Vec<Vec2>;

// pulse kicks reach this fraction of the pointer radius
const PULSE_REACH: f32 = 0.9;

#[derive(Event)]
pub struct RegenerateEvent {
    pub seed: u64,
}

/// Pause state, split by who asked for it so a restored window only undoes its own pause.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq)]
pub struct Paused {
    pub by_user: bool,
    pub by_occlusion: bool,
}

impl Paused {
    pub fn active(&self) -> bool {
        self.by_user || self.by_occlusion
    }

    /// Space key: resumes whatever the cause, otherwise pauses on behalf of the user.
    pub fn toggle_user(&mut self) {
        self.set_user(!self.active());
    }

    pub fn set_user(&mut self, on: bool) {
        self.by_user = on;
        if !on {
            self.by_occlusion = false;
        }
    }

    pub fn set_occluded(&mut self, occluded: bool) {
        self.by_occlusion = occluded;
    }
}

/// Everything generated from one seed, plus the per-frame animation state.
#[derive(Resource)]
pub struct ParticleCity {
    pub seed: u64,
    pub layout: CityLayout,
    pub loops: Vec<Loop>,
    pub targets: TargetSet,
    pub ground: Ground,
    pub runners: EdgeRunners,
    pub blocks: Drifters,
    pub roads: Drifters,
    pub pedestrians: Drifters,
    pub ripples: RipplePool,
    pub noise: NoiseField,
    pub palette: Palette,
    pub frame: u64,
    rng: StdRng,
}

impl ParticleCity {
    /// Builds the whole world for `seed`. Population sizes follow the viewport at generation time.
    pub fn generate(config: &Config, seed: u64, viewport: Vec2) -> Result<Self, ConfigError> {
        let palette = Palette::from_config(config)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = NoiseField::new(rng.random());

        let layout = design::generate(
            config.world_extent(),
            config.grid_spacing(),
            config.hubrate,
            config.fill,
            &mut rng,
        );
        let loops = contour::bake(&layout.buildings);
        let targets = TargetSet::bake(&layout.roads, &layout.buildings, config.rden, config.bden, &mut rng);

        let ground = Ground::seed(&layout, config, palette.ground.len(), &mut rng);
        let runners = EdgeRunners::seed(
            &loops,
            particle_count(RUNNER_BASE, viewport, config.den_edge),
            config.erstep,
            &mut rng,
        );
        let block_count = particle_count(BLOCK_PARTICLE_BASE, viewport, config.den_block).min(targets.building.len());
        let blocks = Drifters::seed(drifter::BLOCK, block_count, &targets.building, 1, &mut rng);
        let roads = Drifters::seed(
            drifter::ROAD,
            particle_count(ROAD_PARTICLE_BASE, viewport, config.den_road),
            &targets.road,
            palette.road.len(),
            &mut rng,
        );
        let pedestrians = Drifters::seed(
            drifter::PEDESTRIAN,
            particle_count(PEDESTRIAN_BASE, viewport, config.den_people),
            &targets.road,
            1,
            &mut rng,
        );

        info!(
            "city {seed}: {} roads, {} hubs, {} buildings, {} loops",
            layout.roads.len(),
            layout.hubs.len(),
            layout.buildings.len(),
            loops.len()
        );
        info!(
            "targets: {} road, {} building; particles: {} ground, {} runners, {} block, {} road, {} pedestrians",
            targets.road.len(),
            targets.building.len(),
            ground.len(),
            runners.len(),
            blocks.len(),
            roads.len(),
            pedestrians.len()
        );

        Ok(Self {
            seed,
            layout,
            loops,
            targets,
            ground,
            runners,
            blocks,
            roads,
            pedestrians,
            ripples: RipplePool::new(config.rmax),
            noise,
            palette,
            frame: 0,
            rng,
        })
    }

    /// Steps and draws every population in layer order, then lets the hubs emit.
    pub fn tick(&mut self, config: &Config, camera: &CityCamera, pointer: &PointerState, sink: &mut dyn DrawSink) {
        let ctx = FrameCtx {
            config,
            camera,
            pointer,
            noise: &self.noise,
            palette: &self.palette,
            frame: self.frame,
        };

        self.ground.draw(&ctx, sink);

        self.runners.step(&ctx, &self.loops);
        self.runners.draw(&ctx, &self.loops, sink);

        self.blocks.step(&ctx, &self.targets.building, &mut self.rng);
        self.blocks.draw(&ctx, &[self.palette.block], sink);

        self.roads.step(&ctx, &self.targets.road, &mut self.rng);
        self.roads.draw(&ctx, &self.palette.road, sink);

        self.pedestrians.step(&ctx, &self.targets.road, &mut self.rng);
        self.pedestrians.draw(&ctx, &[self.palette.people], sink);

        self.ripples.update(ctx.frame, config.world_diagonal());
        self.ripples.draw(&ctx, sink);

        ripple::emit_auto(&mut self.ripples, &self.layout.hubs, config, &mut self.rng);
        self.frame += 1;
    }

    /// Redraws the current state without advancing it.
    pub fn draw(&self, config: &Config, camera: &CityCamera, pointer: &PointerState, sink: &mut dyn DrawSink) {
        let ctx = FrameCtx {
            config,
            camera,
            pointer,
            noise: &self.noise,
            palette: &self.palette,
            frame: self.frame,
        };

        self.ground.draw(&ctx, sink);
        self.runners.draw(&ctx, &self.loops, sink);
        self.blocks.draw(&ctx, &[self.palette.block], sink);
        self.roads.draw(&ctx, &self.palette.road, sink);
        self.pedestrians.draw(&ctx, &[self.palette.people], sink);
        self.ripples.draw(&ctx, sink);
    }

    /// User ripple at `at` plus a radial kick to nearby road particles and pedestrians.
    pub fn pulse(&mut self, config: &Config, at: Vec2) {
        ripple::emit_user(&mut self.ripples, at, config, &mut self.rng);

        let reach = config.mr * PULSE_REACH;
        self.roads.kick(at, reach, config.mpulse, 2);
        self.pedestrians.kick(at, reach, config.mpulse * 0.7, 3);
    }

    pub fn particle_total(&self) -> usize {
        self.ground.len() + self.runners.len() + self.blocks.len() + self.roads.len() + self.pedestrians.len()
    }
}

// main plugin for the city
pub struct CityPlugin;

impl Plugin for CityPlugin {
    fn build(&self, app: &mut App) {
        app
            .init_resource::<CityCamera>()
            .init_resource::<PointerState>()
            .init_resource::<Paused>()
            .add_event::<RegenerateEvent>()
            .add_event::<PulseEvent>()
            .add_systems(Startup, setup_city)
            .add_systems(Update, (
                update_camera,
                resize_viewport,
                interaction::track_pointer,
                interaction::handle_primary_action,
                handle_pulses,
                handle_regeneration,
                toggle_pause,
            ).chain())
            .add_systems(EguiPrimaryContextPass, draw_city);
    }
}

fn window_size(window: &Window) -> Vec2 {
    Vec2::new(window.width(), window.height())
}

fn setup_city(
    mut commands: Commands,
    config: Res<Config>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut camera: ResMut<CityCamera>,
) {
    if let Ok(window) = windows.single() {
        let size = window_size(window);
        camera.set_viewport(size.x, size.y);
    }

    match ParticleCity::generate(&config, config.seed, camera.viewport()) {
        Ok(city) => commands.insert_resource(city),
        Err(e) => error!("could not build the city: {e}"),
    }
}

// orbit parameters may be edited at runtime, keep the basis in step before anything projects
fn update_camera(mut camera: ResMut<CityCamera>) {
    if camera.is_changed() {
        camera.bypass_change_detection().update_basis();
    }
}

// layout is viewport independent, only the focal length follows the window
fn resize_viewport(
    mut events: EventReader<WindowResized>,
    windows: Query<Entity, With<PrimaryWindow>>,
    mut camera: ResMut<CityCamera>,
) {
    let Ok(primary) = windows.single() else { return };
    for event in events.read() {
        if event.window == primary {
            camera.set_viewport(event.width, event.height);
        }
    }
}

fn handle_pulses(
    mut events: EventReader<PulseEvent>,
    config: Res<Config>,
    paused: Res<Paused>,
    city: Option<ResMut<ParticleCity>>,
) {
    let Some(mut city) = city else { return };
    for event in events.read() {
        if paused.active() {
            continue;
        }
        city.pulse(&config, event.ground);
    }
}

pub fn handle_regeneration(
    mut commands: Commands,
    mut events: EventReader<RegenerateEvent>,
    config: Res<Config>,
    camera: Res<CityCamera>,
    mut status: EventWriter<StatusEvent>,
) {
    // only the latest request matters
    let Some(event) = events.read().last() else { return };

    match ParticleCity::generate(&config, event.seed, camera.viewport()) {
        Ok(city) => {
            commands.insert_resource(city);
            status.write(StatusEvent(Status::Regenerated));
        }
        Err(e) => error!("regeneration with seed {} failed: {e}", event.seed),
    }
}

fn toggle_pause(
    keys: Res<ButtonInput<KeyCode>>,
    mut occluded: EventReader<WindowOccluded>,
    mut paused: ResMut<Paused>,
    mut status: EventWriter<StatusEvent>,
) {
    let was = paused.active();
    if keys.just_pressed(KeyCode::Space) {
        paused.toggle_user();
    }
    for event in occluded.read() {
        paused.set_occluded(event.occluded);
    }

    let now = paused.active();
    if now != was {
        debug!("paused: {now} ({:?})", *paused);
        status.write(StatusEvent(if now { Status::Paused } else { Status::Resumed }));
    }
}

// paints the particles on egui's background layer, under the ui panels
pub fn draw_city(
    mut contexts: EguiContexts,
    config: Res<Config>,
    camera: Res<CityCamera>,
    pointer: Res<PointerState>,
    paused: Res<Paused>,
    city: Option<ResMut<ParticleCity>>,
) {
    let Some(mut city) = city else { return };
    let Ok(ctx) = contexts.ctx_mut() else { return };

    let mut sink = EguiSink::new(ctx.layer_painter(egui::LayerId::background()));
    if paused.active() {
        city.draw(&config, &camera, &pointer, &mut sink);
    } else {
        city.tick(&config, &camera, &pointer, &mut sink);
    }
}
