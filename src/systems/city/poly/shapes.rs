// footprint outlines used by the city designer
// every shape is emitted counter-clockwise in a y-up world

use bevy::prelude::*;

use crate::systems::city::Polygon;

/// Which corner of a rectangle an L-cut removes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    BottomLeft,
    BottomRight,
    TopRight,
    TopLeft,
}

pub fn rect(x: f32, y: f32, w: f32, h: f32) -> Polygon {
    vec![
        Vec2::new(x, y),
        Vec2::new(x + w, y),
        Vec2::new(x + w, y + h),
        Vec2::new(x, y + h),
    ]
}

/// Rectangle with its four corners cut at 45 degrees, `ch` along each side.
pub fn chamfer_rect(x: f32, y: f32, w: f32, h: f32, ch: f32) -> Polygon {
    let ch = ch.clamp(0.0, w.min(h) * 0.5);
    vec![
        Vec2::new(x + ch, y),
        Vec2::new(x + w - ch, y),
        Vec2::new(x + w, y + ch),
        Vec2::new(x + w, y + h - ch),
        Vec2::new(x + w - ch, y + h),
        Vec2::new(x + ch, y + h),
        Vec2::new(x, y + h - ch),
        Vec2::new(x, y + ch),
    ]
}

/// Rectangle with a `cut_w` x `cut_h` notch removed from one corner.
/// The cut is clamped below the full size so the outline stays simple.
pub fn l_cut_rect(x: f32, y: f32, w: f32, h: f32, cut_w: f32, cut_h: f32, corner: Corner) -> Polygon {
    let cw = cut_w.clamp(0.0, w * 0.9);
    let chh = cut_h.clamp(0.0, h * 0.9);
    let (x0, y0, x1, y1) = (x, y, x + w, y + h);

    match corner {
        Corner::BottomLeft => vec![
            Vec2::new(x0 + cw, y0),
            Vec2::new(x1, y0),
            Vec2::new(x1, y1),
            Vec2::new(x0, y1),
            Vec2::new(x0, y0 + chh),
            Vec2::new(x0 + cw, y0 + chh),
        ],
        Corner::BottomRight => vec![
            Vec2::new(x0, y0),
            Vec2::new(x1 - cw, y0),
            Vec2::new(x1 - cw, y0 + chh),
            Vec2::new(x1, y0 + chh),
            Vec2::new(x1, y1),
            Vec2::new(x0, y1),
        ],
        Corner::TopRight => vec![
            Vec2::new(x0, y0),
            Vec2::new(x1, y0),
            Vec2::new(x1, y1 - chh),
            Vec2::new(x1 - cw, y1 - chh),
            Vec2::new(x1 - cw, y1),
            Vec2::new(x0, y1),
        ],
        Corner::TopLeft => vec![
            Vec2::new(x0, y0),
            Vec2::new(x1, y0),
            Vec2::new(x1, y1),
            Vec2::new(x0 + cw, y1),
            Vec2::new(x0 + cw, y1 - chh),
            Vec2::new(x0, y1 - chh),
        ],
    }
}

pub fn regular_ngon(center: Vec2, radius: f32, n: usize, rotation: f32) -> Polygon {
    (0..n)
        .map(|i| {
            let a = rotation + i as f32 * std::f32::consts::TAU / n as f32;
            center + Vec2::from_angle(a) * radius
        })
        .collect()
}

/// House outline with a pointed gable, rotated by `rotation` around its center.
/// The ridge sits on the +y side, 40% of the height above the eaves.
pub fn house_gable(x: f32, y: f32, w: f32, h: f32, rotation: f32) -> Polygon {
    let eaves = y + h * 0.6;
    let outline = [
        Vec2::new(x, y),
        Vec2::new(x + w, y),
        Vec2::new(x + w, eaves),
        Vec2::new(x + w * 0.5, y + h),
        Vec2::new(x, eaves),
    ];

    if rotation == 0.0 {
        return outline.to_vec();
    }

    let center = Vec2::new(x + w * 0.5, y + h * 0.5);
    let rot = Vec2::from_angle(rotation);
    outline.iter().map(|p| center + rot.rotate(*p - center)).collect()
}
