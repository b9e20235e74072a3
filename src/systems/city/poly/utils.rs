// UTILS

use bevy::prelude::*;
use crate::systems::city::Polygon;

// edges shorter than this are treated as degenerate
pub const EDGE_EPSILON: f32 = 1e-6;

/// find the intersection between two line segments, lookup Cramer's rule
/// https://cp-algorithms.com/geometry/lines-intersection.html
/// # Returns `Some(Vec2)` if the segments intersect, 'None' otherwise
pub fn line_segment_intersection(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> Option<Vec2> {
    let s1 = p2 - p1;   // direction vector of segment 1
    let s2 = p4 - p3;   // direction vector of segment 2

    let denom = s1.x * s2.y - s2.x * s1.y; // determinant of 2x2 matrix

    // parallel lines
    if denom.abs() < 1e-6 {
        return None;
    }

    let s = (s1.x * (p1.y - p3.y) - s1.y * (p1.x - p3.x)) / denom;
    let t = (s2.x * (p1.y - p3.y) - s2.y * (p1.x - p3.x)) / denom;

    // check if intersection is within both segments
    if (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t) {
        Some(p1 + t * s1)
    } else {
        None
    }
}

/// Computes the signed area of a polygon, positive for counter-clockwise winding
/// # Returns the polygon's area as an `f32`. Returns 0.0 for polygons with fewer than 3 vertices.
pub fn polygon_area(polygon: &[Vec2]) -> f32 {
    if polygon.len() < 3 {
        return 0.0;
    }

    let n = polygon.len();
    let mut area = 0.0;

    for i in 0..n {
        let j = (i + 1) % n;
        area += polygon[i].x * polygon[j].y - polygon[j].x * polygon[i].y;
    }

    area / 2.0
}

/// Area-weighted centroid, the vertex mean for degenerate polygons
pub fn polygon_centroid(polygon: &[Vec2]) -> Vec2 {
    if polygon.is_empty() {
        return Vec2::ZERO;
    }

    let area = polygon_area(polygon);
    if area.abs() < EDGE_EPSILON {
        return polygon.iter().copied().sum::<Vec2>() / polygon.len() as f32;
    }

    let n = polygon.len();
    let mut c = Vec2::ZERO;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[(i + 1) % n]);
        c += (a + b) * a.perp_dot(b);
    }

    c / (6.0 * area)
}

/// Axis-aligned bounds of a polygon as (min, max)
pub fn bounding_box(polygon: &[Vec2]) -> (Vec2, Vec2) {
    polygon.iter().fold(
        (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
        |(min, max), p| (min.min(*p), max.max(*p)),
    )
}

/// Determines whether a point is inside a polygon using the ray-casting (even-odd) algorithm.
/// # Returns `true` if the point is inside the polygon, otherwise `false`.
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;

    for i in 0..polygon.len() {
        let yi = polygon[i].y;
        let yj = polygon[j].y;
        let xi = polygon[i].x;
        let xj = polygon[j].x;

        // horizontal edges never satisfy the straddle test, the guard only keeps the divide finite
        let dy = if yj - yi == 0.0 { 1e-9 } else { yj - yi };
        if ((yi > point.y) != (yj > point.y)) &&
           (point.x < (xj - xi) * (point.y - yi) / dy + xi) {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Checks that no two non-adjacent edges of a closed polygon cross.
/// Degenerate (zero-length) edges are ignored.
pub fn is_simple_polygon(polygon: &[Vec2]) -> bool {
    let edges: Vec<(Vec2, Vec2)> = (0..polygon.len())
        .map(|i| (polygon[i], polygon[(i + 1) % polygon.len()]))
        .filter(|(a, b)| a.distance(*b) >= EDGE_EPSILON)
        .collect();

    let n = edges.len();
    if n < 3 {
        return false;
    }

    for i in 0..n {
        for j in (i + 1)..n {
            // neighbours share a vertex, including the wrap-around pair
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let (a, b) = edges[i];
            let (c, d) = edges[j];
            if line_segment_intersection(a, b, c, d).is_some() {
                return false;
            }
        }
    }

    true
}
