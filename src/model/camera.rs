use glam::{Mat4, Quat, Vec3};

use super::transform::{facing_direction, Transform};

/// What the render loop needs from whichever camera is active.
pub trait CameraView {
    fn position(&self) -> Vec3;
    fn view_matrix(&self) -> Mat4;
    fn projection_matrix(&self) -> Mat4;

    fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Perspective projection parameters shared by both player cameras.
#[derive(Debug, Clone, Copy)]
pub struct Lens {
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Lens {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            fov_y: 60f32.to_radians(),
            aspect: width as f32 / height.max(1) as f32,
            z_near: 0.1,
            z_far: 2000.0,
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far)
    }
}

/// Third-person camera revolving around its target at a fixed radius.
///
/// `yaw_offset` is measured relative to the target's facing, so a zero offset
/// keeps the camera behind the target while it turns.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub yaw_offset: f32,
    pub pitch: f32,
    pub radius: f32,
    pub rest_pitch: f32,
    pub pitch_limit: f32,
    /// Degrees per pixel of cursor travel
    pub sensitivity: f32,
    pub lens: Lens,
    eye: Vec3,
    target: Vec3,
}

impl OrbitCamera {
    pub fn new(radius: f32, sensitivity: f32, pitch_limit: f32, lens: Lens) -> Self {
        Self {
            yaw_offset: 0.0,
            pitch: 0.0,
            radius,
            rest_pitch: 0.0,
            pitch_limit,
            sensitivity,
            lens,
            eye: Vec3::new(0.0, 0.0, -radius),
            target: Vec3::ZERO,
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn resync(&mut self, target: &Transform) {
        let yaw = (target.facing() + self.yaw_offset).to_radians();
        let pitch = self.pitch.to_radians();
        let offset = Vec3::new(
            -yaw.sin() * pitch.cos(),
            pitch.sin(),
            -yaw.cos() * pitch.cos(),
        );
        self.target = target.position;
        self.eye = target.position + offset * self.radius;
    }

    /// Screen-up cursor travel must be passed as positive `dy_pixels`.
    pub fn revolve(&mut self, dx_pixels: f32, dy_pixels: f32, target: &Transform) {
        self.yaw_offset += self.sensitivity * dx_pixels;
        self.pitch = (self.pitch + self.sensitivity * dy_pixels)
            .clamp(-self.pitch_limit, self.pitch_limit);
        self.resync(target);
    }

    /// Drop any orbit offset so the camera sits behind the target again.
    pub fn settle_behind(&mut self, target: &Transform) {
        self.yaw_offset = 0.0;
        self.pitch = self.rest_pitch;
        self.resync(target);
    }
}

impl CameraView for OrbitCamera {
    fn position(&self) -> Vec3 {
        self.eye
    }

    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    fn projection_matrix(&self) -> Mat4 {
        self.lens.projection()
    }
}

/// First-person camera bolted to the target at a constant local offset.
#[derive(Debug, Clone)]
pub struct FixedOffsetCamera {
    pub offset: Vec3,
    pub lens: Lens,
    eye: Vec3,
    forward: Vec3,
}

impl FixedOffsetCamera {
    pub fn new(offset: Vec3, lens: Lens) -> Self {
        Self {
            offset,
            lens,
            eye: offset,
            forward: Vec3::Z,
        }
    }

    pub fn resync(&mut self, target: &Transform) {
        let rotation = Quat::from_rotation_y(target.facing().to_radians());
        self.eye = target.position + rotation * self.offset;
        self.forward = facing_direction(target.facing());
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }
}

impl CameraView for FixedOffsetCamera {
    fn position(&self) -> Vec3 {
        self.eye
    }

    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.eye + self.forward, Vec3::Y)
    }

    fn projection_matrix(&self) -> Mat4 {
        self.lens.projection()
    }
}

/// The two cameras that follow the player.
#[derive(Debug, Clone)]
pub enum PlayerCamera {
    Orbiting(OrbitCamera),
    FixedOffset(FixedOffsetCamera),
}

impl PlayerCamera {
    pub fn resync(&mut self, target: &Transform) {
        match self {
            PlayerCamera::Orbiting(cam) => cam.resync(target),
            PlayerCamera::FixedOffset(cam) => cam.resync(target),
        }
    }

    /// Apply freelook cursor travel. Cameras without freelook ignore it.
    pub fn look(&mut self, dx_pixels: f32, dy_pixels: f32, target: &Transform) {
        if let PlayerCamera::Orbiting(cam) = self {
            cam.revolve(dx_pixels, dy_pixels, target);
        }
    }

    /// Return to the resting pose after freelook ends.
    pub fn settle(&mut self, target: &Transform) {
        match self {
            PlayerCamera::Orbiting(cam) => cam.settle_behind(target),
            PlayerCamera::FixedOffset(cam) => cam.resync(target),
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        match self {
            PlayerCamera::Orbiting(cam) => cam.lens.set_aspect(width, height),
            PlayerCamera::FixedOffset(cam) => cam.lens.set_aspect(width, height),
        }
    }

    fn view(&self) -> &dyn CameraView {
        match self {
            PlayerCamera::Orbiting(cam) => cam,
            PlayerCamera::FixedOffset(cam) => cam,
        }
    }
}

impl CameraView for PlayerCamera {
    fn position(&self) -> Vec3 {
        self.view().position()
    }

    fn view_matrix(&self) -> Mat4 {
        self.view().view_matrix()
    }

    fn projection_matrix(&self) -> Mat4 {
        self.view().projection_matrix()
    }
}

/// Screen-aligned nudge directions for the top-down camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanDirection {
    Forward,
    Back,
    Left,
    Right,
}

impl PanDirection {
    pub fn vector(self) -> Vec3 {
        match self {
            PanDirection::Forward => Vec3::new(0.0, 0.0, -1.0),
            PanDirection::Back => Vec3::new(0.0, 0.0, 1.0),
            PanDirection::Left => Vec3::new(-1.0, 0.0, 0.0),
            PanDirection::Right => Vec3::new(1.0, 0.0, 0.0),
        }
    }
}

/// Top-down orthographic camera, independent of the player.
/// Screen up is world -Z.
#[derive(Debug, Clone)]
pub struct OrthoCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub half_height: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub pan_step: f32,
    /// World units per pixel of drag
    pub drag_sensitivity: f32,
}

impl OrthoCamera {
    pub fn new(width: u32, height: u32, pan_step: f32, drag_sensitivity: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 0.0),
            target: Vec3::ZERO,
            up: Vec3::new(0.0, 0.0, -1.0),
            half_height: 60.0,
            aspect: width as f32 / height.max(1) as f32,
            z_near: 0.01,
            z_far: 2000.0,
            pan_step,
            drag_sensitivity,
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn pan(&mut self, direction: PanDirection) {
        let delta = direction.vector() * self.pan_step;
        self.position += delta;
        self.target += delta;
    }

    /// Grab-and-pull: the scene follows the cursor, so the camera moves against it.
    pub fn drag(&mut self, dx_pixels: f32, dy_pixels: f32) {
        let delta = Vec3::new(dx_pixels, 0.0, dy_pixels) * -self.drag_sensitivity;
        self.position += delta;
        self.target += delta;
    }

    pub fn set_above_target(&mut self, pos: Vec3) {
        self.position = Vec3::new(pos.x, 1.0, pos.z);
        self.target = Vec3::new(pos.x, 0.0, pos.z);
    }
}

impl CameraView for OrthoCamera {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    fn projection_matrix(&self) -> Mat4 {
        let hh = self.half_height;
        let hw = hh * self.aspect;
        Mat4::orthographic_rh(-hw, hw, -hh, hh, self.z_near, self.z_far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lens() -> Lens {
        Lens::new(720, 720)
    }

    #[test]
    fn test_orbit_rests_behind_target() {
        let mut cam = OrbitCamera::new(1.5, 0.25, 89.0, lens());
        let mut t = Transform::default();
        t.adjust_facing(90.0);
        cam.resync(&t);
        // Facing +X, so behind is -X
        assert!(cam.position().abs_diff_eq(Vec3::new(-1.5, 0.0, 0.0), 1e-5));
        assert_eq!(cam.target(), t.position);
    }

    #[test]
    fn test_orbit_yaw_accumulates_exactly() {
        let mut cam = OrbitCamera::new(1.5, 0.25, 89.0, lens());
        let t = Transform::default();
        cam.yaw_offset = 12.5;
        cam.revolve(40.0, 0.0, &t);
        assert_eq!(cam.yaw_offset, 22.5);
        cam.revolve(-40.0, 0.0, &t);
        assert_eq!(cam.yaw_offset, 12.5);
    }

    #[test]
    fn test_orbit_pitch_is_clamped() {
        let mut cam = OrbitCamera::new(1.5, 0.25, 89.0, lens());
        let t = Transform::default();
        cam.revolve(0.0, 10_000.0, &t);
        assert_eq!(cam.pitch, 89.0);
        cam.revolve(0.0, -100_000.0, &t);
        assert_eq!(cam.pitch, -89.0);
        // Camera stays on the sphere
        assert!((cam.position().distance(t.position) - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_fixed_offset_rotates_with_facing() {
        let mut cam = FixedOffsetCamera::new(Vec3::new(0.0, 0.0, 1.0), lens());
        let mut t = Transform::default();
        t.position = Vec3::new(2.0, -1.0, 0.0);
        t.adjust_facing(90.0);
        cam.resync(&t);
        assert!(cam.position().abs_diff_eq(Vec3::new(3.0, -1.0, 0.0), 1e-5));
        assert!(cam.forward().abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn test_fixed_offset_ignores_look() {
        let mut cam = PlayerCamera::FixedOffset(FixedOffsetCamera::new(Vec3::Z, lens()));
        let t = Transform::default();
        cam.resync(&t);
        let before = cam.position();
        cam.look(100.0, 100.0, &t);
        assert_eq!(cam.position(), before);
    }

    #[test]
    fn test_ortho_pan_and_drag_move_target_together() {
        let mut cam = OrthoCamera::new(720, 720, 1.0, 0.05);
        cam.pan(PanDirection::Forward);
        assert_eq!(cam.position, Vec3::new(0.0, 1.0, -1.0));
        assert_eq!(cam.target, Vec3::new(0.0, 0.0, -1.0));

        cam.drag(20.0, -40.0);
        assert!(cam.position.abs_diff_eq(Vec3::new(-1.0, 1.0, 1.0), 1e-5));
        assert!(cam.target.abs_diff_eq(Vec3::new(-1.0, 0.0, 1.0), 1e-5));
    }

    #[test]
    fn test_ortho_snaps_above_point() {
        let mut cam = OrthoCamera::new(720, 720, 1.0, 0.05);
        cam.set_above_target(Vec3::new(3.0, -12.0, -5.0));
        assert_eq!(cam.position, Vec3::new(3.0, 1.0, -5.0));
        assert_eq!(cam.target, Vec3::new(3.0, 0.0, -5.0));
    }
}
