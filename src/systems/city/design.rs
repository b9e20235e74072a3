// city designer: road network, hubs and building footprints
use bevy::prelude::*;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::config::{ROAD_GRID_WIDTH, ROAD_MAIN_WIDTH, ROAD_OVERHANG};
use crate::systems::city::Polygon;
use crate::systems::city::poly::shapes::{self, Corner};
use crate::systems::city::poly::utils::point_in_polygon;

/// Polyline with a width. Immutable once generated.
#[derive(Clone, Debug)]
pub struct Road {
    pub points: Vec<Vec2>,
    pub width: f32,
}

/// Stable index of a building in `CityLayout::buildings`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BuildingId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContourKind {
    Outer,
    Additive,    // stacked upper block, inner ring
    Subtractive, // courtyard hole
}

#[derive(Clone, Debug)]
pub struct Contour {
    pub kind: ContourKind,
    pub polygon: Polygon,
}

#[derive(Clone, Debug)]
pub struct Building {
    pub id: BuildingId,
    pub outer: Polygon,
    pub secondary: Vec<Contour>,
    pub height: Option<f32>,
}

impl Building {
    pub fn new(id: BuildingId, outer: Polygon) -> Self {
        Self {
            id,
            outer,
            secondary: Vec::new(),
            height: None,
        }
    }

    pub fn with_contour(mut self, kind: ContourKind, polygon: Polygon) -> Self {
        self.secondary.push(Contour { kind, polygon });
        self
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.height = Some(height);
        self
    }

    /// Outer contour first, then secondary contours in order
    pub fn contours(&self) -> impl Iterator<Item = (ContourKind, &Polygon)> {
        std::iter::once((ContourKind::Outer, &self.outer))
            .chain(self.secondary.iter().map(|c| (c.kind, &c.polygon)))
    }

    pub fn holes(&self) -> impl Iterator<Item = &Polygon> {
        self.secondary
            .iter()
            .filter(|c| c.kind == ContourKind::Subtractive)
            .map(|c| &c.polygon)
    }

    /// Inside the outer footprint and outside every hole
    pub fn contains(&self, point: Vec2) -> bool {
        point_in_polygon(point, &self.outer) && !self.holes().any(|h| point_in_polygon(point, h))
    }
}

/// The static world: generated once per seed, read by everything else.
#[derive(Clone, Debug, Default)]
pub struct CityLayout {
    pub extent: Vec2,
    pub roads: Vec<Road>,
    pub hubs: Vec<Vec2>,
    pub buildings: Vec<Building>,
}

impl CityLayout {
    /// True if the point falls on any building footprint (courtyards excluded)
    pub fn on_footprint(&self, point: Vec2) -> bool {
        self.buildings.iter().any(|b| b.contains(point))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
    Chamfered,
    LCut,
    Octagon,
    House,
}

const SHAPES: [Shape; 4] = [Shape::Chamfered, Shape::LCut, Shape::Octagon, Shape::House];
const CORNERS: [Corner; 4] = [Corner::BottomLeft, Corner::BottomRight, Corner::TopRight, Corner::TopLeft];
const HOUSE_ROTATIONS: [f32; 3] = [0.0, std::f32::consts::FRAC_PI_2, std::f32::consts::PI];

/// Lays out roads, hubs and buildings over a world of `extent` centered on the origin.
/// Extent and spacing are expected to be positive (clamped by `Config::sanitized`).
pub fn generate(
    extent: Vec2,
    grid: Vec2,
    hub_probability: f32,
    fill_probability: f32,
    rng: &mut impl Rng,
) -> CityLayout {
    let half = extent * 0.5;
    let hub_probability = hub_probability.clamp(0.0, 1.0) as f64;
    let fill_probability = fill_probability.clamp(0.0, 1.0) as f64;

    let mut roads = Vec::new();

    // two arterials cutting across the grid
    roads.push(Road {
        points: vec![
            Vec2::new(-extent.x * 0.6, -extent.y * 0.1),
            Vec2::new(extent.x * 0.6, extent.y * 0.9),
        ],
        width: ROAD_MAIN_WIDTH,
    });
    roads.push(Road {
        points: vec![
            Vec2::new(extent.x * 0.15, -extent.y * 0.9),
            Vec2::new(extent.x * 0.10, extent.y * 0.9),
        ],
        width: ROAD_MAIN_WIDTH,
    });

    // grid lines, inclusive of the far edge
    let columns = (extent.x / grid.x).floor() as usize;
    let rows = (extent.y / grid.y).floor() as usize;
    let xs: Vec<f32> = (0..=columns).map(|i| -half.x + i as f32 * grid.x).collect();
    let ys: Vec<f32> = (0..=rows).map(|j| -half.y + j as f32 * grid.y).collect();

    for &x in &xs {
        roads.push(Road {
            points: vec![Vec2::new(x, -half.y - ROAD_OVERHANG), Vec2::new(x, half.y + ROAD_OVERHANG)],
            width: ROAD_GRID_WIDTH,
        });
    }
    for &y in &ys {
        roads.push(Road {
            points: vec![Vec2::new(-half.x - ROAD_OVERHANG, y), Vec2::new(half.x + ROAD_OVERHANG, y)],
            width: ROAD_GRID_WIDTH,
        });
    }

    // hub candidates at the intersections
    let mut hubs = Vec::new();
    for &x in &xs {
        for &y in &ys {
            if rng.random_bool(hub_probability) {
                hubs.push(Vec2::new(
                    x + rng.random_range(-20.0_f32..20.0),
                    y + rng.random_range(-20.0_f32..20.0),
                ));
            }
        }
    }

    // one building candidate per cell
    let mut buildings = Vec::new();
    for i in 0..columns {
        for j in 0..rows {
            if !rng.random_bool(fill_probability) {
                continue;
            }
            let cell = Vec2::new(-half.x + i as f32 * grid.x, -half.y + j as f32 * grid.y);
            let id = BuildingId(buildings.len());
            buildings.push(design_building(id, cell, grid, rng));
        }
    }

    debug!(
        "designed {} roads, {} hubs, {} buildings",
        roads.len(),
        hubs.len(),
        buildings.len()
    );

    CityLayout {
        extent,
        roads,
        hubs,
        buildings,
    }
}

fn design_building(id: BuildingId, cell: Vec2, grid: Vec2, rng: &mut impl Rng) -> Building {
    let center = cell
        + grid * 0.5
        + Vec2::new(
            rng.random_range(-0.15_f32..0.15) * grid.x,
            rng.random_range(-0.15_f32..0.15) * grid.y,
        );
    let w = grid.x * rng.random_range(0.45_f32..0.95);
    let h = grid.y * rng.random_range(0.45_f32..0.95);
    let (x, y) = (center.x - w / 2.0, center.y - h / 2.0);
    let chamfer = w.min(h) * 0.1 * rng.random_range(0.6_f32..1.4);

    let height = rng.random_range(120.0_f32..520.0)
        * if rng.random::<f32>() < 0.18 { rng.random_range(1.0_f32..2.0) } else { 1.0 };

    let shape = SHAPES.choose(rng).copied().unwrap_or(Shape::Chamfered);
    match shape {
        Shape::Chamfered => {
            let building = Building::new(id, shapes::chamfer_rect(x, y, w, h, chamfer)).with_height(height);
            let roll = rng.random::<f32>();
            if roll < 0.4 {
                // stacked upper block
                let upper = shapes::chamfer_rect(x + w * 0.18, y + h * 0.18, w * 0.64, h * 0.64, chamfer * 0.7);
                building.with_contour(ContourKind::Additive, upper)
            } else if roll < 0.65 {
                // courtyard
                let m = w.min(h) * 0.25;
                building.with_contour(ContourKind::Subtractive, shapes::rect(x + m, y + m, w - 2.0 * m, h - 2.0 * m))
            } else {
                building
            }
        }
        Shape::LCut => {
            let corner = CORNERS.choose(rng).copied().unwrap_or(Corner::TopRight);
            let cut_w = w * rng.random_range(0.3_f32..0.5);
            let cut_h = h * rng.random_range(0.3_f32..0.5);
            Building::new(id, shapes::l_cut_rect(x, y, w, h, cut_w, cut_h, corner)).with_height(height)
        }
        Shape::Octagon => {
            let radius = w.min(h) * 0.5;
            let rotation = std::f32::consts::PI / 8.0;
            let building = Building::new(id, shapes::regular_ngon(center, radius, 8, rotation)).with_height(height);
            if rng.random::<f32>() < 0.3 {
                building.with_contour(ContourKind::Additive, shapes::regular_ngon(center, radius * 0.6, 8, rotation))
            } else {
                building
            }
        }
        Shape::House => {
            let hw = grid.x * rng.random_range(0.3_f32..0.55);
            let hh = grid.y * rng.random_range(0.25_f32..0.4);
            let rotation = HOUSE_ROTATIONS.choose(rng).copied().unwrap_or(0.0);
            Building::new(id, shapes::house_gable(center.x - hw / 2.0, center.y - hh / 2.0, hw, hh, rotation))
                .with_height(rng.random_range(60.0_f32..140.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::systems::city::poly::utils::{is_simple_polygon, polygon_area};

    fn layout(seed: u64) -> CityLayout {
        let mut rng = StdRng::seed_from_u64(seed);
        generate(Vec2::new(1600.0, 2200.0), Vec2::new(220.0, 200.0), 0.55, 0.92, &mut rng)
    }

    #[test]
    fn road_network_shape() {
        let city = layout(1);
        // 2 arterials + 8 columns inclusive + 12 rows inclusive
        assert_eq!(city.roads.len(), 2 + 8 + 12);
        assert!(city.roads.iter().all(|r| r.points.len() >= 2 && r.width > 0.0));
    }

    #[test]
    fn generation_is_reproducible() {
        let a = layout(7);
        let b = layout(7);
        assert_eq!(a.hubs, b.hubs);
        assert_eq!(a.buildings.len(), b.buildings.len());
        for (x, y) in a.buildings.iter().zip(&b.buildings) {
            assert_eq!(x.outer, y.outer);
        }
    }

    #[test]
    fn buildings_have_stable_ids_and_valid_outlines() {
        let city = layout(3);
        assert!(!city.buildings.is_empty());
        for (i, b) in city.buildings.iter().enumerate() {
            assert_eq!(b.id, BuildingId(i));
            assert!(polygon_area(&b.outer) > 0.0);
            assert!(is_simple_polygon(&b.outer));
            assert!(b.height.is_some_and(|h| h > 0.0));
        }
    }

    #[test]
    fn probabilities_zero_and_one() {
        let mut rng = StdRng::seed_from_u64(5);
        let empty = generate(Vec2::new(880.0, 800.0), Vec2::new(220.0, 200.0), 0.0, 0.0, &mut rng);
        assert!(empty.hubs.is_empty() && empty.buildings.is_empty());

        let full = generate(Vec2::new(880.0, 800.0), Vec2::new(220.0, 200.0), 1.0, 1.0, &mut rng);
        assert_eq!(full.hubs.len(), 5 * 5);
        assert_eq!(full.buildings.len(), 4 * 4);
    }

    #[test]
    fn courtyard_is_not_inside() {
        let outer = shapes::rect(0.0, 0.0, 100.0, 100.0);
        let b = Building::new(BuildingId(0), outer)
            .with_contour(ContourKind::Subtractive, shapes::rect(25.0, 25.0, 50.0, 50.0));
        assert!(b.contains(Vec2::new(10.0, 10.0)));
        assert!(!b.contains(Vec2::new(50.0, 50.0)));
    }
}
