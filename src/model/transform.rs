use glam::{EulerRot, Mat4, Quat, Vec3};

/// Unit vector on the horizontal plane for a facing angle given in degrees.
pub fn facing_direction(facing_deg: f32) -> Vec3 {
    let r = facing_deg.to_radians();
    Vec3::new(r.sin(), 0.0, r.cos())
}

/// Position, rotation and scale of a renderable entity.
///
/// Rotation is kept in degrees. `rotation.x` is the facing angle around the
/// vertical axis, `rotation.y` tilts around X and `rotation.z` rolls around Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new(position: Vec3, scale: f32, rotation: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::splat(scale),
        }
    }

    pub fn facing(&self) -> f32 {
        self.rotation.x
    }

    pub fn forward(&self) -> Vec3 {
        facing_direction(self.facing())
    }

    /// Move along the horizontal plane in the facing direction.
    /// Negative distances move backwards.
    pub fn move_relative_to_facing(&mut self, distance: f32) {
        self.position += self.forward() * distance;
    }

    /// Turn around the vertical axis. The angle is kept in `[0, 360)`.
    pub fn adjust_facing(&mut self, delta_deg: f32) {
        self.rotation.x = (self.rotation.x + delta_deg).rem_euclid(360.0);
    }

    /// Rise or sink by `delta`. Rising stops at `ceiling`; sinking is unbounded.
    /// Returns `false` if the move was blocked.
    pub fn move_vertical(&mut self, delta: f32, ceiling: f32) -> bool {
        if delta > 0.0 {
            if self.position.y >= ceiling {
                return false;
            }
            self.position.y = (self.position.y + delta).min(ceiling);
        } else {
            self.position.y += delta;
        }
        true
    }

    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.z.to_radians(),
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_follows_facing() {
        let mut t = Transform::default();
        t.move_relative_to_facing(2.0);
        assert!(t.position.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-5));

        t.adjust_facing(90.0);
        t.move_relative_to_facing(1.0);
        assert!(t.position.abs_diff_eq(Vec3::new(1.0, 0.0, 2.0), 1e-5));

        t.move_relative_to_facing(-1.0);
        assert!(t.position.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-5));
    }

    #[test]
    fn test_facing_wraps() {
        let mut t = Transform::default();
        t.adjust_facing(-1.0);
        assert_eq!(t.facing(), 359.0);
        t.adjust_facing(2.0);
        assert_eq!(t.facing(), 1.0);
    }

    #[test]
    fn test_vertical_ceiling_only_bounds_rising() {
        let mut t = Transform::default();
        assert!(!t.move_vertical(0.1, 0.0));
        assert_eq!(t.position.y, 0.0);

        assert!(t.move_vertical(-0.25, 0.0));
        assert_eq!(t.position.y, -0.25);

        // Overshoot is clamped to the ceiling
        assert!(t.move_vertical(1.0, 0.0));
        assert_eq!(t.position.y, 0.0);

        for _ in 0..100 {
            t.move_vertical(-10.0, 0.0);
        }
        assert_eq!(t.position.y, -1000.0);
    }

    #[test]
    fn test_matrix_places_origin_at_position() {
        let t = Transform::new(Vec3::new(3.0, -2.0, 7.0), 0.5, Vec3::new(45.0, 0.0, 0.0));
        let origin = t.matrix().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(t.position, 1e-5));

        let tip = t.matrix().transform_point3(Vec3::Z * 2.0);
        assert!(tip.abs_diff_eq(t.position + t.forward(), 1e-5));
    }
}
