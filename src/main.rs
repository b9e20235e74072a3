use bevy::prelude::*;
use bevy::window::{WindowPlugin, PrimaryWindow};
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy_egui::EguiPlugin;

pub mod config;
pub mod systems;

#[cfg(test)]
pub mod test;

use config::Config;
use systems::city::CityPlugin;
use systems::ui::UIPlugin;

fn main() -> bevy::app::AppExit {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "particle city".to_string(),
                mode: bevy::window::WindowMode::Windowed,
                resolution: bevy::window::WindowResolution::new(1280.0, 720.0),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin::default())
        .add_plugins(FrameTimeDiagnosticsPlugin::default())

        // my custom plugins
        .add_plugins(CityPlugin)
        .add_plugins(UIPlugin)

        .insert_resource(ClearColor(Color::WHITE)) // world color
        .add_systems(PreStartup, load_config)
        .add_systems(Startup, (start, maximize_window))
        .add_systems(Update, handle_exit)
        .run()
}

// optional RON file plus `key=value` overrides, defaults otherwise
fn load_config(mut commands: Commands) {
    let config = Config::from_args(std::env::args().skip(1)).unwrap_or_else(|e| {
        error!("could not load config: {e}");
        warn!("falling back to default config");
        Config::default()
    });
    info!("seed {}, world {}x{}", config.seed, config.world_w, config.world_h);
    commands.insert_resource(config);
}

fn maximize_window(mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    for mut window in windows.iter_mut() {
        window.set_maximized(true);
    }
}

// egui needs a camera to render into, the particles are painted by egui
fn start(mut commands: Commands) {
    commands.spawn(Camera2d);
}

// application exit
fn handle_exit(
    keys: Res<ButtonInput<KeyCode>>,
    mut exit: EventWriter<AppExit>,
) {
    if keys.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }
}
