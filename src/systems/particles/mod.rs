// particle populations, all stepped and drawn once per frame
use bevy::prelude::*;

use crate::config::{Config, REFERENCE_AREA};
use crate::systems::camera::CityCamera;
use crate::systems::fields::NoiseField;
use crate::systems::interaction::PointerState;
use crate::systems::render::Palette;

pub mod drifter;
pub mod ground;
pub mod ripple;
pub mod runner;

/// Read-only frame inputs shared by every population.
pub struct FrameCtx<'a> {
    pub config: &'a Config,
    pub camera: &'a CityCamera,
    pub pointer: &'a PointerState,
    pub noise: &'a NoiseField,
    pub palette: &'a Palette,
    pub frame: u64,
}

/// Population size for a viewport, scaling with the square root of its area.
pub fn particle_count(base: f32, viewport: Vec2, density: f32) -> usize {
    let area = (viewport.x * viewport.y).max(0.0);
    let n = base * (area / REFERENCE_AREA).sqrt() * density.max(0.0);
    if n.is_finite() { n.floor() as usize } else { 0 }
}
