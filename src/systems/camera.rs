// fixed oblique camera: orbit basis, projection and ground unprojection
// world is z-up, the ground plane is z = 0
use bevy::prelude::*;

// camera-space depth at or below this is behind the near plane
const NEAR_DEPTH: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub x: f32,
    pub y: f32,
    pub depth_fade: f32, // 1 near, ~0.35 far
    pub size_scale: f32,
}

#[derive(Resource, Clone, Debug)]
pub struct CityCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub fov: f32,

    position: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    viewport: Vec2,
    focal: f32,
}

impl Default for CityCamera {
    fn default() -> Self {
        Self::new(Vec3::new(600.0, 0.0, 280.0), 0.0, 30f32.to_radians(), 600.0, 90f32.to_radians())
    }
}

impl CityCamera {
    pub fn new(target: Vec3, yaw: f32, pitch: f32, distance: f32, fov: f32) -> Self {
        let mut camera = Self {
            target,
            yaw,
            pitch,
            distance,
            fov,
            position: Vec3::ZERO,
            forward: Vec3::Y,
            right: Vec3::X,
            up: Vec3::Z,
            viewport: Vec2::new(1280.0, 720.0),
            focal: 1.0,
        };
        camera.set_viewport(1280.0, 720.0);
        camera.update_basis();
        camera
    }

    /// Places the camera on its orbit and rebuilds the right-handed basis.
    pub fn update_basis(&mut self) {
        let (sp, cp) = self.pitch.sin_cos();
        let (sy, cy) = self.yaw.sin_cos();
        self.position = self.target + self.distance * Vec3::new(cp * cy, cp * sy, sp);
        self.forward = (self.target - self.position).normalize_or_zero();
        self.right = self.forward.cross(Vec3::Z).normalize_or_zero();
        self.up = self.right.cross(self.forward).normalize_or_zero();
    }

    /// Recomputes the focal length for a new viewport size.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width.max(1.0), height.max(1.0));
        self.focal = (self.viewport.y * 0.5) / (self.fov * 0.5).tan();
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn focal(&self) -> f32 {
        self.focal
    }

    /// # Returns `None` when the point is behind the near plane or the result is not finite
    pub fn project(&self, point: Vec3) -> Option<Projection> {
        let v = point - self.position;
        let cx = v.dot(self.right);
        let cy = v.dot(self.up);
        let cz = v.dot(self.forward);
        if !(cz > NEAR_DEPTH) {
            return None;
        }

        let projection = Projection {
            x: self.viewport.x * 0.5 + cx * self.focal / cz,
            y: self.viewport.y * 0.5 - cy * self.focal / cz,
            depth_fade: remap(cz, 200.0, self.distance * 2.2, 1.0, 0.35).clamp(0.0, 1.0),
            size_scale: remap(cz, 200.0, self.distance * 1.6, 1.3, 0.7).clamp(0.5, 2.0),
        };

        [projection.x, projection.y, projection.depth_fade, projection.size_scale]
            .iter()
            .all(|v| v.is_finite())
            .then_some(projection)
    }

    /// Casts a ray through a screen point and intersects it with the ground.
    /// # Returns `None` if the ray is parallel to the ground or points away from it
    pub fn unproject(&self, screen: Vec2) -> Option<Vec2> {
        let px = screen.x - self.viewport.x * 0.5;
        let py = -(screen.y - self.viewport.y * 0.5);
        let dir = (self.forward + self.right * (px / self.focal) + self.up * (py / self.focal)).try_normalize()?;
        if dir.z.abs() < 1e-6 {
            return None;
        }
        let t = -self.position.z / dir.z;
        if !(t > 0.0) {
            return None;
        }
        let ground = self.position + dir * t;
        ground.truncate().is_finite().then(|| ground.truncate())
    }
}

// linear map of `value` from [a0, a1] to [b0, b1], unclamped
fn remap(value: f32, a0: f32, a1: f32, b0: f32, b1: f32) -> f32 {
    let span = a1 - a0;
    if span.abs() < f32::EPSILON {
        return b0;
    }
    b0 + (value - a0) / span * (b1 - b0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basis_is_orthonormal() {
        let camera = CityCamera::default();
        assert!((camera.forward.length() - 1.0).abs() < 1e-5);
        assert!(camera.forward.dot(camera.right).abs() < 1e-5);
        assert!(camera.forward.dot(camera.up).abs() < 1e-5);
        assert!(camera.right.dot(camera.up).abs() < 1e-5);
        // looking down onto the ground
        assert!(camera.forward.z < 0.0 && camera.up.z > 0.0);
    }

    #[test]
    fn look_at_target_projects_to_center() {
        let camera = CityCamera::default();
        let p = camera.project(camera.target).unwrap();
        assert!((p.x - 640.0).abs() < 1e-3);
        assert!((p.y - 360.0).abs() < 1e-3);
    }

    #[test]
    fn behind_camera_is_invisible() {
        let camera = CityCamera::default();
        let behind = camera.position() - camera.forward * 10.0;
        assert!(camera.project(behind).is_none());
    }

    #[test]
    fn depth_curves_are_monotonic_and_clamped() {
        let camera = CityCamera::new(Vec3::ZERO, 0.0, 30f32.to_radians(), 600.0, 90f32.to_radians());
        let near = camera.project(camera.position() + camera.forward * 150.0).unwrap();
        let mid = camera.project(camera.position() + camera.forward * 700.0).unwrap();
        let far = camera.project(camera.position() + camera.forward * 5000.0).unwrap();
        assert_eq!(near.depth_fade, 1.0);
        assert!(near.depth_fade > mid.depth_fade && mid.depth_fade > far.depth_fade);
        assert!(near.size_scale >= mid.size_scale && mid.size_scale >= far.size_scale);
        assert!(far.size_scale >= 0.5);
    }

    #[test]
    fn resize_only_changes_focal() {
        let mut camera = CityCamera::default();
        let before = camera.position();
        camera.set_viewport(1920.0, 1080.0);
        assert_eq!(camera.position(), before);
        assert!((camera.focal() - 540.0).abs() < 1e-2);
    }

    #[test]
    fn sky_pixels_do_not_hit_the_ground() {
        let camera = CityCamera::default();
        assert!(camera.unproject(Vec2::new(640.0, -5000.0)).is_none());
    }
}
