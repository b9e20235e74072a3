// contour baker: building outlines -> closed loops that edge runners travel
use bevy::prelude::*;

use crate::systems::city::Polygon;
use crate::systems::city::design::{Building, BuildingId, ContourKind};
use crate::systems::city::poly::utils::{EDGE_EPSILON, is_simple_polygon, polygon_area};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: Vec3,
    pub end: Vec3,
    pub length: f32,
    pub tangent: Vec3,
    pub normal: Vec2, // inward, in the ground plane
    pub vertical: bool,
}

impl Segment {
    /// # Returns `None` for segments shorter than `EDGE_EPSILON`
    pub fn new(start: Vec3, end: Vec3, normal: Vec2, vertical: bool) -> Option<Self> {
        let delta = end - start;
        let length = delta.length();
        if !length.is_finite() || length < EDGE_EPSILON {
            return None;
        }
        Some(Self {
            start,
            end,
            length,
            tangent: delta / length,
            normal,
            vertical,
        })
    }

    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.start + self.tangent * distance
    }
}

/// Closed, directed sequence of segments tracing one contour of a building.
#[derive(Clone, Debug, PartialEq)]
pub struct Loop {
    pub building: BuildingId,
    pub kind: ContourKind,
    pub segments: Vec<Segment>,
    pub length: f32,
}

impl Loop {
    fn from_segments(building: BuildingId, kind: ContourKind, segments: Vec<Segment>) -> Option<Self> {
        if segments.is_empty() {
            return None;
        }
        let length = segments.iter().map(|s| s.length).sum();
        Some(Self {
            building,
            kind,
            segments,
            length,
        })
    }

    pub fn is_vertical(&self) -> bool {
        self.segments.iter().all(|s| s.vertical)
    }

    pub fn segment(&self, index: usize) -> &Segment {
        &self.segments[index % self.segments.len()]
    }
}

/// Bakes every building into loops, grouped by building in id order.
/// For each contour: a ground loop at z = 0, and when the building has a height,
/// a roof loop (outer and additive contours) plus one vertical loop per outer corner.
pub fn bake(buildings: &[Building]) -> Vec<Loop> {
    let mut loops = Vec::new();

    for building in buildings {
        if building.outer.len() < 3 {
            debug!("building {:?} has a degenerate outline, no loops", building.id);
            continue;
        }

        for (kind, polygon) in building.contours() {
            let Some(outline) = clean_contour(building.id, polygon) else {
                continue;
            };
            let normals = edge_normals(&outline, kind);

            loops.extend(flat_loop(building.id, kind, &outline, &normals, 0.0));

            let Some(height) = building.height.filter(|h| *h > EDGE_EPSILON) else {
                continue;
            };
            if kind != ContourKind::Subtractive {
                loops.extend(flat_loop(building.id, kind, &outline, &normals, height));
            }
            if kind == ContourKind::Outer {
                loops.extend(corner_loops(building.id, &outline, &normals, height));
            }
        }
    }

    loops
}

// drops near-duplicate vertices (including the closing pair) and rejects
// contours that self-intersect or have no area
fn clean_contour(id: BuildingId, polygon: &Polygon) -> Option<Polygon> {
    let mut outline: Polygon = Vec::with_capacity(polygon.len());
    for &p in polygon {
        if !p.is_finite() {
            debug!("building {id:?}: non-finite vertex skipped");
            continue;
        }
        if outline.last().is_none_or(|last| last.distance(p) >= EDGE_EPSILON) {
            outline.push(p);
        }
    }
    while outline.len() > 1 && outline[0].distance(outline[outline.len() - 1]) < EDGE_EPSILON {
        outline.pop();
    }

    if outline.len() < 3 || polygon_area(&outline).abs() < EDGE_EPSILON {
        debug!("building {id:?}: degenerate contour skipped");
        return None;
    }
    if !is_simple_polygon(&outline) {
        warn!("building {id:?}: self-intersecting contour rejected");
        return None;
    }
    Some(outline)
}

// inward normal per edge i (vertex i -> i + 1)
// ccw interiors lie left of travel, holes point away from their own interior
fn edge_normals(outline: &[Vec2], kind: ContourKind) -> Vec<Vec2> {
    let mut sign = if polygon_area(outline) > 0.0 { 1.0 } else { -1.0 };
    if kind == ContourKind::Subtractive {
        sign = -sign;
    }

    let n = outline.len();
    (0..n)
        .map(|i| {
            let tangent = (outline[(i + 1) % n] - outline[i]).normalize_or_zero();
            tangent.perp() * sign
        })
        .collect()
}

fn flat_loop(id: BuildingId, kind: ContourKind, outline: &[Vec2], normals: &[Vec2], z: f32) -> Option<Loop> {
    let n = outline.len();
    let segments = (0..n)
        .filter_map(|i| {
            Segment::new(
                outline[i].extend(z),
                outline[(i + 1) % n].extend(z),
                normals[i],
                false,
            )
        })
        .collect();
    Loop::from_segments(id, kind, segments)
}

// one up/down loop per corner, normal along the corner's inward bisector
fn corner_loops(id: BuildingId, outline: &[Vec2], normals: &[Vec2], height: f32) -> Vec<Loop> {
    let n = outline.len();
    (0..n)
        .filter_map(|i| {
            let before = normals[(i + n - 1) % n];
            let after = normals[i];
            let bisector = (before + after).try_normalize().unwrap_or(after);

            let base = outline[i].extend(0.0);
            let top = outline[i].extend(height);
            let up = Segment::new(base, top, bisector, true)?;
            let down = Segment::new(top, base, bisector, true)?;
            Loop::from_segments(id, ContourKind::Outer, vec![up, down])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::city::poly::shapes;
    use crate::systems::city::poly::utils::point_in_polygon;

    fn assert_closed(lp: &Loop) {
        let n = lp.segments.len();
        for i in 0..n {
            let a = lp.segments[i].end;
            let b = lp.segments[(i + 1) % n].start;
            assert!(a.distance(b) < 1e-4, "gap between {i} and {}", (i + 1) % n);
        }
        let sum: f32 = lp.segments.iter().map(|s| s.length).sum();
        assert!((sum - lp.length).abs() < 1e-3);
        assert!(lp.length > 0.0);
    }

    #[test]
    fn clockwise_outline_keeps_normals_inside() {
        let mut outline = shapes::rect(0.0, 0.0, 100.0, 60.0);
        outline.reverse();
        let loops = bake(&[Building::new(BuildingId(0), outline.clone())]);
        assert_eq!(loops.len(), 1);
        for seg in &loops[0].segments {
            let mid = (seg.start + seg.end).truncate() * 0.5;
            assert!(point_in_polygon(mid + seg.normal, &outline));
        }
    }

    #[test]
    fn hole_normals_point_into_the_solid() {
        let hole = shapes::rect(30.0, 30.0, 40.0, 40.0);
        let b = Building::new(BuildingId(0), shapes::rect(0.0, 0.0, 100.0, 100.0))
            .with_contour(ContourKind::Subtractive, hole.clone());
        let loops = bake(&[b]);
        assert_eq!(loops.len(), 2);
        let hole_loop = &loops[1];
        assert_eq!(hole_loop.kind, ContourKind::Subtractive);
        for seg in &hole_loop.segments {
            let mid = (seg.start + seg.end).truncate() * 0.5;
            assert!(!point_in_polygon(mid + seg.normal, &hole));
        }
    }

    #[test]
    fn duplicate_vertices_are_skipped() {
        let outline = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(0.0, 0.0),
        ];
        let loops = bake(&[Building::new(BuildingId(0), outline)]);
        assert_eq!(loops[0].segments.len(), 4);
        assert_closed(&loops[0]);
    }

    #[test]
    fn degenerate_and_self_intersecting_outlines_yield_nothing() {
        let line = Building::new(BuildingId(0), vec![Vec2::ZERO, Vec2::X]);
        let bowtie = Building::new(
            BuildingId(1),
            vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0)],
        );
        assert!(bake(&[line, bowtie]).is_empty());
    }

    #[test]
    fn height_adds_roof_and_corner_loops() {
        let b = Building::new(BuildingId(4), shapes::rect(0.0, 0.0, 100.0, 60.0)).with_height(200.0);
        let loops = bake(&[b]);
        // ground + roof + 4 corners
        assert_eq!(loops.len(), 6);
        assert!(loops.iter().all(|l| l.building == BuildingId(4)));
        assert!(loops[1].segments.iter().all(|s| s.start.z == 200.0));

        let corners: Vec<&Loop> = loops.iter().filter(|l| l.is_vertical()).collect();
        assert_eq!(corners.len(), 4);
        for lp in corners {
            assert_closed(lp);
            assert!((lp.length - 400.0).abs() < 1e-3);
            // bisector at a rectangle corner points diagonally inward
            let mid = lp.segments[0].start.truncate() + lp.segments[0].normal;
            assert!(point_in_polygon(mid, &shapes::rect(0.0, 0.0, 100.0, 60.0)));
        }
    }

    #[test]
    fn generated_shapes_all_close() {
        let buildings = [
            Building::new(BuildingId(0), shapes::chamfer_rect(0.0, 0.0, 80.0, 50.0, 6.0)).with_height(150.0),
            Building::new(BuildingId(1), shapes::regular_ngon(Vec2::splat(200.0), 40.0, 8, 0.39)),
            Building::new(BuildingId(2), shapes::house_gable(400.0, 0.0, 60.0, 40.0, 3.14)),
        ];
        for lp in bake(&buildings) {
            assert_closed(&lp);
        }
    }
}
