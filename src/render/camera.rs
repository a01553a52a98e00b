//! Orbit camera shared by the preview and the recorder

use glam::{Mat4, Vec3};

use crate::util::Bounds;

const DEFAULT_YAW: f32 = -60.0;
const DEFAULT_PITCH: f32 = 30.0;
const MIN_DISTANCE: f32 = 1e-3;
const MAX_DISTANCE: f32 = 1e6;

/// Orbit camera around a target point, z up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    /// Degrees around z
    pub yaw: f32,
    /// Degrees above the xy plane
    pub pitch: f32,
    pub distance: f32,
    pub target: Vec3,
    /// Vertical FOV in degrees
    pub fov: f32,
    home: (Vec3, f32),
}

impl OrbitCamera {
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
            distance,
            target,
            fov: 45.0,
            home: (target, distance),
        }
    }

    /// Frame `bounds` and make it the view [`reset`][Self::reset] returns to.
    pub fn fit(&mut self, bounds: &Bounds) {
        if !bounds.is_valid() {
            return;
        }
        let radius = bounds.radius().max(1e-3);
        let half_fov = (self.fov * 0.5).to_radians();
        self.target = bounds.center();
        self.distance = (radius / half_fov.sin() * 1.1).clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.home = (self.target, self.distance);
    }

    /// Orbit around target (drag)
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) {
        let sensitivity = 0.5;
        self.yaw -= delta_x * sensitivity;
        self.pitch = (self.pitch + delta_y * sensitivity).clamp(-89.0, 89.0);
    }

    /// Screen-space pan (shift+drag)
    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let forward = (self.target - self.position()).normalize_or_zero();
        let right = forward.cross(Vec3::Z).normalize_or_zero();
        let up = right.cross(forward);
        let sensitivity = 0.002 * self.distance;
        self.target += right * (-delta_x * sensitivity) + up * (delta_y * sensitivity);
    }

    /// Zoom (scroll), positive moves closer
    pub fn zoom(&mut self, delta: f32) {
        let factor = (1.0 - delta * 0.001).clamp(0.1, 10.0);
        self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Back to the default angles and the last fitted view
    pub fn reset(&mut self) {
        self.yaw = DEFAULT_YAW;
        self.pitch = DEFAULT_PITCH;
        (self.target, self.distance) = self.home;
    }

    pub fn position(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let dir = Vec3::new(pitch.cos() * yaw.cos(), pitch.cos() * yaw.sin(), pitch.sin());
        self.target + dir * self.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Z)
    }

    /// Depth maps to `0..1`, clip planes follow the distance.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let near = self.distance * 0.01;
        let far = self.distance * 100.0;
        Mat4::perspective_rh(self.fov.to_radians(), aspect.max(1e-3), near, far)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 5.0)
    }
}
