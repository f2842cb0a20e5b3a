use std::time::Instant;

use glam::{Mat4, Vec3, Vec4};

use super::input_controller::InputController;
use crate::model::{CameraView, DirectionalLight, Flashlight, Transform};

/// Tint applied to scenery while looking through the cockpit camera.
pub const NIGHT_VISION_FILTER: [f32; 4] = [0.05, 0.25, 0.05, 0.4];

/// Per-frame camera and lighting data, group 0 binding 0 in `entity.wgsl`.
///
/// Everything is packed into vec4s so the layout matches WGSL uniform rules
/// without manual padding fields.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    /// xyz camera position
    pub camera_pos: [f32; 4],
    /// xyz direction, w intensity
    pub sun_direction: [f32; 4],
    /// rgb colour, w ambient strength
    pub sun_color: [f32; 4],
    /// x specular strength, y phong exponent
    pub sun_specular: [f32; 4],
    /// xyz position, w intensity
    pub flash_position: [f32; 4],
    /// xyz direction, w cos(inner cutoff)
    pub flash_direction: [f32; 4],
    /// rgb colour, w cos(outer cutoff)
    pub flash_color: [f32; 4],
    /// ambient strength, specular strength, phong exponent, linear falloff
    pub flash_params: [f32; 4],
    /// x quadratic falloff
    pub flash_falloff: [f32; 4],
    /// rgba tint, alpha 0 when no filter is active
    pub tint: [f32; 4],
}

impl SceneUniform {
    pub fn new(camera: &dyn CameraView, sun: &DirectionalLight, flashlight: &Flashlight, filter: Option<[f32; 4]>) -> Self {
        let pos = camera.position();
        Self {
            view_proj: camera.view_proj().to_cols_array_2d(),
            camera_pos: [pos.x, pos.y, pos.z, 1.0],
            sun_direction: sun.direction.extend(sun.intensity).to_array(),
            sun_color: sun.color.extend(sun.ambient_strength).to_array(),
            sun_specular: [sun.specular_strength, sun.specular_phong, 0.0, 0.0],
            flash_position: flashlight.position.extend(flashlight.intensity).to_array(),
            flash_direction: flashlight
                .direction
                .extend(flashlight.inner_cutoff_deg.to_radians().cos())
                .to_array(),
            flash_color: flashlight
                .color
                .extend(flashlight.outer_cutoff_deg.to_radians().cos())
                .to_array(),
            flash_params: [
                flashlight.ambient_strength,
                flashlight.specular_strength,
                flashlight.specular_phong,
                flashlight.linear,
            ],
            flash_falloff: [flashlight.quadratic, 0.0, 0.0, 0.0],
            tint: filter.unwrap_or([0.0; 4]),
        }
    }

    /// Assemble this frame's uniform from the controller's active camera.
    pub fn from_controller(controller: &InputController, sun: &DirectionalLight) -> Self {
        let filter = controller.night_vision().then_some(NIGHT_VISION_FILTER);
        Self::new(controller.active_camera(), sun, controller.player().flashlight(), filter)
    }
}

/// Which lighting terms the entity shader applies to a model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityShading {
    pub flashlight: bool,
    pub normal_map: bool,
    pub night_vision_tint: bool,
}

impl EntityShading {
    /// Scenery is lit by the flashlight and seen through the night-vision filter.
    pub const SCENERY: Self = Self { flashlight: true, normal_map: false, night_vision_tint: true };
    /// The player model carries a normal map and is never tinted.
    pub const PLAYER: Self = Self { flashlight: false, normal_map: true, night_vision_tint: false };

    fn params(self) -> [f32; 4] {
        let flag = |on: bool| if on { 1.0 } else { 0.0 };
        [flag(self.flashlight), flag(self.normal_map), flag(self.night_vision_tint), 0.0]
    }
}

/// Per-entity data, group 1 binding 0 in `entity.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    /// x flashlight, y normal map, z night-vision tint; 1 when on
    pub params: [f32; 4],
}

impl ModelUniform {
    pub fn new(transform: &Transform, shading: EntityShading) -> Self {
        let model = transform.matrix();
        // Inverse-transpose keeps normals perpendicular under non-uniform scale
        let normal = if model.determinant().abs() > f32::EPSILON {
            model.inverse().transpose()
        } else {
            Mat4::IDENTITY
        };
        Self {
            model: model.to_cols_array_2d(),
            normal: normal.to_cols_array_2d(),
            params: shading.params(),
        }
    }
}

/// Background colour for the current mode.
pub fn clear_color(night_vision: bool) -> wgpu::Color {
    let water = Vec3::new(0.02, 0.08, 0.15);
    let tint = if night_vision {
        let [r, g, b, a] = NIGHT_VISION_FILTER;
        water.lerp(Vec3::new(r, g, b), a)
    } else {
        water
    };
    let c = Vec4::from((tint, 1.0));
    wgpu::Color {
        r: c.x as f64,
        g: c.y as f64,
        b: c.z as f64,
        a: c.w as f64,
    }
}

/// Frame delta and a once-per-second FPS estimate.
#[derive(Debug)]
pub struct FrameTimer {
    last_frame: Instant,
    frame_count: u32,
    fps_timer: f32,
    fps: f32,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            frame_count: 0,
            fps_timer: 0.0,
            fps: 0.0,
        }
    }

    /// Mark the start of a frame and return the seconds since the last one.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.record(dt);
        dt
    }

    fn record(&mut self, dt: f32) {
        self.frame_count += 1;
        self.fps_timer += dt;
        if self.fps_timer >= 1.0 {
            self.fps = self.frame_count as f32 / self.fps_timer;
            self.frame_count = 0;
            self.fps_timer = 0.0;
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
