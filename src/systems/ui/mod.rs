use bevy::prelude::*;
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin}; // fps
use bevy_egui::{egui, EguiContexts, EguiPlugin, EguiPrimaryContextPass};

use crate::systems::city::{draw_city, Paused, ParticleCity, RegenerateEvent};

pub mod indicator;
pub mod border;

pub use indicator::{Status, StatusEvent, StatusIndicator, update_status_indicator, render_status_indicator};
pub use border::screen_border;

pub struct UIPlugin;

impl Plugin for UIPlugin {
    fn build(&self, app: &mut App) {
        assert!(app.is_plugin_added::<EguiPlugin>());
        app
            .insert_resource(StatusIndicator::default())
            .add_event::<StatusEvent>()
            .add_systems(Update, update_status_indicator)
            // ui after the particles so panels paint over them
            .add_systems(EguiPrimaryContextPass, (ui_main, fps, screen_border, render_status_indicator).after(draw_city));
    }
}

fn ui_main(
    mut contexts: EguiContexts,
    city: Option<Res<ParticleCity>>,
    mut paused: ResMut<Paused>,
    mut regen_events: EventWriter<RegenerateEvent>,
    mut status_events: EventWriter<StatusEvent>,
) {
    if let Ok(ctx) = contexts.ctx_mut() {
        egui::SidePanel::left("city_panel")
            .default_width(220.0)
            .min_width(200.0)
            .max_width(360.0)
            .resizable(true)
            .show(ctx, |ui| {
                ui.label("Pointer: move to stir");
                ui.label("Click / Tap - Pulse");
                ui.label("Space - Pause");

                ui.separator();

                egui::CollapsingHeader::new("Seed")
                    .default_open(true)
                    .show(ui, |ui| {
                    if let Some(city) = city.as_ref() {
                        ui.label(format!("Current: {}", city.seed));
                    }
                    if ui.button("Regenerate").clicked() {
                        regen_events.write(RegenerateEvent { seed: rand::random() });
                    }
                });

                let mut on = paused.active();
                if ui.checkbox(&mut on, "Paused").changed() {
                    paused.set_user(on);
                    status_events.write(StatusEvent(if on { Status::Paused } else { Status::Resumed }));
                }

                if let Some(city) = city.as_ref() {
                    egui::CollapsingHeader::new("City")
                        .default_open(true)
                        .show(ui, |ui| {
                        egui::Grid::new("city_counts").num_columns(2).show(ui, |ui| {
                            for (name, count) in [
                                ("Roads", city.layout.roads.len()),
                                ("Hubs", city.layout.hubs.len()),
                                ("Buildings", city.layout.buildings.len()),
                                ("Loops", city.loops.len()),
                                ("Road targets", city.targets.road.len()),
                                ("Block targets", city.targets.building.len()),
                            ] {
                                ui.label(name);
                                ui.label(count.to_string());
                                ui.end_row();
                            }
                        });
                    });

                    egui::CollapsingHeader::new("Particles")
                        .default_open(true)
                        .show(ui, |ui| {
                        egui::Grid::new("particle_counts").num_columns(2).show(ui, |ui| {
                            for (name, count) in [
                                ("Ground", city.ground.len()),
                                ("Edge runners", city.runners.len()),
                                ("Block", city.blocks.len()),
                                ("Road", city.roads.len()),
                                ("Pedestrians", city.pedestrians.len()),
                                ("Ripples", city.ripples.len()),
                                ("Total", city.particle_total()),
                            ] {
                                ui.label(name);
                                ui.label(count.to_string());
                                ui.end_row();
                            }
                        });
                        ui.label(format!("Frame: {}", city.frame));
                    });
                } else {
                    ui.label(egui::RichText::new("No city, check the log").color(egui::Color32::from_rgb(178, 34, 34)));
                }

                ui.separator();
                ui.label("ESC - Exit");
            });
    }
}

fn fps(
    mut contexts: EguiContexts,
    diagnostics: Res<DiagnosticsStore>,
) {
    if let Ok(ctx) = contexts.ctx_mut() {
        egui::Area::new(egui::Id::new("fps_counter"))
            .anchor(egui::Align2::RIGHT_TOP, egui::Vec2::new(-10.0, 10.0))
            .show(ctx, |ui| {
                ui.with_layout(egui::Layout::top_down(egui::Align::RIGHT), |ui| {
                    if let Some(fps) = diagnostics
                        .get(&FrameTimeDiagnosticsPlugin::FPS)
                        .and_then(|d| d.smoothed())
                    {
                        ui.label(egui::RichText::new(format!("{:.0}", fps))
                            .size(26.0)
                            .color(egui::Color32::from_rgb(40, 44, 52)));
                    }
                });
            });
    }
}
