use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Paused,
    Resumed,
    Regenerated,
}

impl Status {
    fn label(self) -> (&'static str, egui::Color32) {
        match self {
            Status::Paused => ("PAUSED", egui::Color32::from_rgb(180, 60, 60)),
            Status::Resumed => ("RUNNING", egui::Color32::from_rgb(60, 140, 80)),
            Status::Regenerated => ("NEW CITY", egui::Color32::from_rgb(45, 72, 116)),
        }
    }
}

#[derive(Event)]
pub struct StatusEvent(pub Status);

// transient badge, fades out over `duration` seconds
#[derive(Resource)]
pub struct StatusIndicator {
    pub status: Status,
    pub timer: f32,
    pub duration: f32,
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self {
            status: Status::Resumed,
            timer: 0.0,
            duration: 2.0,
        }
    }
}

impl StatusIndicator {
    pub fn show(&mut self, status: Status) {
        self.status = status;
        self.timer = self.duration;
    }

    pub fn tick(&mut self, dt: f32) {
        self.timer = (self.timer - dt).max(0.0);
    }

    pub fn alpha(&self) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.timer / self.duration).clamp(0.0, 1.0)
    }
}

pub fn update_status_indicator(
    mut indicator: ResMut<StatusIndicator>,
    mut events: EventReader<StatusEvent>,
    time: Res<Time>,
) {
    for event in events.read() {
        indicator.show(event.0);
    }

    if indicator.timer > 0.0 {
        indicator.tick(time.delta_secs());
    }
}

pub fn render_status_indicator(
    indicator: Res<StatusIndicator>,
    mut contexts: EguiContexts,
) {
    if indicator.timer <= 0.0 {
        return;
    }

    if let Ok(ctx) = contexts.ctx_mut() {
        let alpha = indicator.alpha();
        let (text, bg_color) = indicator.status.label();

        egui::Area::new(egui::Id::new("status_indicator"))
            .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 60.0))
            .show(ctx, |ui| {
                let frame = egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(
                        bg_color.r(), bg_color.g(), bg_color.b(),
                        (200.0 * alpha) as u8
                    ))
                    .stroke(egui::Stroke::new(
                        1.5,
                        egui::Color32::from_rgba_unmultiplied(255, 255, 255, (180.0 * alpha) as u8)
                    ))
                    .inner_margin(egui::Margin::symmetric(20, 10))
                    .corner_radius(egui::CornerRadius::same(8));

                frame.show(ui, |ui| {
                    ui.label(egui::RichText::new(text)
                        .size(18.0)
                        .color(egui::Color32::from_rgba_unmultiplied(255, 255, 255, (255.0 * alpha) as u8))
                        .strong());
                });
            });
    }
}
