use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::systems::city::Paused;

// dashed frame around the screen while the animation is frozen
pub fn screen_border(
    mut contexts: EguiContexts,
    paused: Res<Paused>,
) {
    if !paused.active() {
        return;
    }

    if let Ok(ctx) = contexts.ctx_mut() {
        let screen = ctx.screen_rect();
        let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::Foreground, egui::Id::new("pause_border")));
        let color = egui::Color32::from_rgb(40, 44, 52);

        for rect in dashes(screen.width(), screen.height(), 3.0, 10.0, 5.0) {
            painter.rect_filled(rect, 0.0, color);
        }
    }
}

// dash rectangles along all four edges
fn dashes(width: f32, height: f32, thickness: f32, dash: f32, gap: f32) -> Vec<egui::Rect> {
    let step = (dash + gap).max(1.0);
    let mut rects = Vec::new();

    let mut x = 0.0;
    while x < width {
        let w = dash.min(width - x);
        rects.push(egui::Rect::from_min_size(egui::pos2(x, 0.0), egui::vec2(w, thickness)));
        rects.push(egui::Rect::from_min_size(egui::pos2(x, height - thickness), egui::vec2(w, thickness)));
        x += step;
    }

    let mut y = 0.0;
    while y < height {
        let h = dash.min(height - y);
        rects.push(egui::Rect::from_min_size(egui::pos2(0.0, y), egui::vec2(thickness, h)));
        rects.push(egui::Rect::from_min_size(egui::pos2(width - thickness, y), egui::vec2(thickness, h)));
        y += step;
    }

    rects
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashes_cover_every_edge() {
        let rects = dashes(100.0, 40.0, 2.0, 10.0, 5.0);
        // 7 dashes per horizontal edge, 3 per vertical edge
        assert_eq!(rects.len(), 2 * 7 + 2 * 3);
        assert!(rects.iter().all(|r| r.max.x <= 100.0 && r.max.y <= 40.0));
    }
}
