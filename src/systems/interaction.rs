use bevy::prelude::*;
use bevy::window::{PrimaryWindow, Window};
use bevy_egui::EguiContexts;

use crate::systems::camera::CityCamera;

// smoothing applied to the per-frame ground delta
const VELOCITY_LERP: f32 = 0.4;

/// Primary pointer, written once per frame before any population update.
#[derive(Resource, Debug, Clone, Default)]
pub struct PointerState {
    pub screen: Vec2,
    pub ground: Vec2,
    pub velocity: Vec2, // smoothed, world units per frame
    pub speed: f32,
    previous: Option<Vec2>,
}

impl PointerState {
    /// A pointer resting at `ground`.
    pub fn at(ground: Vec2) -> Self {
        Self {
            ground,
            previous: Some(ground),
            ..default()
        }
    }

    /// Records this frame's pointer. When the screen point misses the ground
    /// the last ground point and velocity are kept.
    pub fn track(&mut self, screen: Vec2, ground: Option<Vec2>) {
        self.screen = screen;
        let Some(ground) = ground else { return };

        let delta = ground - self.previous.unwrap_or(ground);
        self.velocity = self.velocity.lerp(delta, VELOCITY_LERP);
        self.speed = self.velocity.length();
        self.ground = ground;
        self.previous = Some(ground);
    }
}

/// Primary action (left click or touch start) at a ground point.
#[derive(Event, Debug, Clone, Copy)]
pub struct PulseEvent {
    pub ground: Vec2,
}

// first touch wins over the cursor
fn primary_screen_position(window: &Window, touches: &Touches) -> Option<Vec2> {
    touches
        .iter()
        .next()
        .map(|t| t.position())
        .or_else(|| window.cursor_position())
}

pub fn track_pointer(
    windows: Query<&Window, With<PrimaryWindow>>,
    touches: Res<Touches>,
    camera: Res<CityCamera>,
    mut pointer: ResMut<PointerState>,
) {
    let Ok(window) = windows.single() else { return };
    let Some(screen) = primary_screen_position(window, &touches) else { return };

    let ground = camera.unproject(screen);
    pointer.track(screen, ground);
}

pub fn handle_primary_action(
    mut contexts: EguiContexts,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    camera: Res<CityCamera>,
    pointer: Res<PointerState>,
    mut pulses: EventWriter<PulseEvent>,
) {
    // clicks on the side panel belong to egui
    if let Ok(ctx) = contexts.ctx_mut() {
        if ctx.wants_pointer_input() || ctx.is_pointer_over_area() {
            return;
        }
    }

    if mouse_button.just_pressed(MouseButton::Left) {
        pulses.write(PulseEvent { ground: pointer.ground });
    }

    for touch in touches.iter_just_pressed() {
        if let Some(ground) = camera.unproject(touch.position()) {
            pulses.write(PulseEvent { ground });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_has_no_velocity() {
        let mut pointer = PointerState::default();
        pointer.track(Vec2::ZERO, Some(Vec2::new(500.0, 200.0)));
        assert_eq!(pointer.velocity, Vec2::ZERO);
        assert_eq!(pointer.ground, Vec2::new(500.0, 200.0));
    }

    #[test]
    fn velocity_is_smoothed() {
        let mut pointer = PointerState::at(Vec2::ZERO);
        pointer.track(Vec2::ZERO, Some(Vec2::new(10.0, 0.0)));
        assert!((pointer.velocity.x - 4.0).abs() < 1e-5);
        pointer.track(Vec2::ZERO, Some(Vec2::new(20.0, 0.0)));
        assert!((pointer.velocity.x - 6.4).abs() < 1e-5);
        assert!((pointer.speed - 6.4).abs() < 1e-5);
    }

    #[test]
    fn missing_ground_keeps_last_point() {
        let mut pointer = PointerState::at(Vec2::new(3.0, 4.0));
        pointer.track(Vec2::new(1.0, 1.0), None);
        assert_eq!(pointer.ground, Vec2::new(3.0, 4.0));
        assert_eq!(pointer.screen, Vec2::new(1.0, 1.0));
    }
}
