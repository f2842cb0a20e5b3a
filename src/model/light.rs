use glam::Vec3;

use super::transform::Transform;

/// Fixed, ordered set of intensity levels that wraps around.
#[derive(Debug, Clone)]
pub struct LightLevels {
    levels: Vec<f32>,
    index: usize,
}

impl LightLevels {
    /// An empty list falls back to a single full-intensity level.
    pub fn new(levels: Vec<f32>) -> Self {
        let levels = if levels.is_empty() { vec![1.0] } else { levels };
        Self { levels, index: 0 }
    }

    pub fn current(&self) -> f32 {
        self.levels[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn advance(&mut self) -> f32 {
        self.index = (self.index + 1) % self.levels.len();
        self.current()
    }
}

/// Spotlight carried in front of its owner.
#[derive(Debug, Clone)]
pub struct Flashlight {
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub ambient_strength: f32,
    pub ambient_color: Vec3,
    pub specular_strength: f32,
    pub specular_phong: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub inner_cutoff_deg: f32,
    pub outer_cutoff_deg: f32,
    /// Distance ahead of the owner along its facing
    pub offset: f32,
}

impl Flashlight {
    pub fn new(intensity: f32, offset: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::Z,
            color: Vec3::ONE,
            intensity,
            ambient_strength: 0.1,
            ambient_color: Vec3::ONE,
            specular_strength: 1.0,
            specular_phong: 32.0,
            linear: 0.0014,
            quadratic: 0.000007,
            inner_cutoff_deg: 7.5,
            outer_cutoff_deg: 17.5,
            offset,
        }
    }

    pub fn follow(&mut self, owner: &Transform) {
        let forward = owner.forward();
        self.position = owner.position + forward * self.offset;
        self.direction = forward;
    }
}

/// Scene-wide sun-style light.
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub ambient_strength: f32,
    pub ambient_color: Vec3,
    pub specular_strength: f32,
    pub specular_phong: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.0, -5.0, 0.0).normalize(),
            color: Vec3::ONE,
            intensity: 1.0,
            ambient_strength: 0.2,
            ambient_color: Vec3::ONE,
            specular_strength: 3.0,
            specular_phong: 25.0,
        }
    }
}
