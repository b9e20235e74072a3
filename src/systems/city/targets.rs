// target sampler: roads and building interiors -> attractor points
use bevy::prelude::*;
use rand::Rng;

use crate::config::{BLOCK_FILL_STEP, LANE_SPACING, ROAD_SAMPLE_STEP};
use crate::systems::city::Polygon;
use crate::systems::city::design::{Building, BuildingId, ContourKind, Road};
use crate::systems::city::poly::utils::{EDGE_EPSILON, bounding_box, point_in_polygon, polygon_centroid};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Target {
    pub position: Vec2,
    pub tangent: Vec2,
    pub building: Option<BuildingId>,
}

#[derive(Clone, Debug, Default)]
pub struct TargetSet {
    pub road: Vec<Target>,
    pub building: Vec<Target>,
}

impl TargetSet {
    pub fn bake(
        roads: &[Road],
        buildings: &[Building],
        road_density: f32,
        building_density: f32,
        rng: &mut impl Rng,
    ) -> Self {
        let road = thin(sample_roads(roads, ROAD_SAMPLE_STEP), road_density, rng);
        let building = thin(sample_interiors(buildings, BLOCK_FILL_STEP), building_density, rng);
        Self { road, building }
    }
}

/// Samples each road segment every `step` units with lane copies across its width.
/// Segments shorter than the step still produce samples at both ends.
pub fn sample_roads(roads: &[Road], step: f32) -> Vec<Target> {
    let mut targets = Vec::new();

    for road in roads {
        let lanes = ((road.width * 0.5 / LANE_SPACING).floor() as i32).max(1);

        for pair in road.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let delta = b - a;
            let length = delta.length();
            if length < EDGE_EPSILON {
                continue;
            }
            let tangent = delta / length;
            let normal = tangent.perp();
            let samples = ((length / step).floor() as usize).max(1);

            for s in 0..=samples {
                let center = a + delta * (s as f32 / samples as f32);
                for k in -lanes..=lanes {
                    let offset = (k as f32 / lanes as f32) * road.width * 0.45;
                    targets.push(Target {
                        position: center + normal * offset,
                        tangent,
                        building: None,
                    });
                }
            }
        }
    }

    targets
}

/// Grid-fills every outer and additive contour, skipping points inside holes.
/// A contour the grid misses entirely contributes its centroid instead.
pub fn sample_interiors(buildings: &[Building], step: f32) -> Vec<Target> {
    let mut targets = Vec::new();

    for building in buildings {
        let inside = |p: Vec2, polygon: &Polygon| point_in_polygon(p, polygon) && !building.holes().any(|h| point_in_polygon(p, h));

        for (kind, polygon) in building.contours() {
            if kind == ContourKind::Subtractive || polygon.len() < 3 {
                continue;
            }
            let before = targets.len();
            let (min, max) = bounding_box(polygon);
            let columns = ((max.x - min.x) / step).floor() as usize;
            let rows = ((max.y - min.y) / step).floor() as usize;

            for i in 0..=columns {
                for j in 0..=rows {
                    let p = min + Vec2::new(i as f32, j as f32) * step;
                    if inside(p, polygon) {
                        targets.push(Target {
                            position: p,
                            tangent: Vec2::ZERO,
                            building: Some(building.id),
                        });
                    }
                }
            }

            let centroid = polygon_centroid(polygon);
            if targets.len() == before && inside(centroid, polygon) {
                targets.push(Target {
                    position: centroid,
                    tangent: Vec2::ZERO,
                    building: Some(building.id),
                });
            }
        }
    }

    targets
}

// keeps each target with probability `density`, never leaves a non-empty set empty
fn thin(targets: Vec<Target>, density: f32, rng: &mut impl Rng) -> Vec<Target> {
    let keep = density.clamp(0.0, 1.0) as f64;
    let first = targets.first().copied();
    let mut kept: Vec<Target> = targets.into_iter().filter(|_| rng.random_bool(keep)).collect();
    if kept.is_empty() {
        kept.extend(first);
    }
    kept
}
