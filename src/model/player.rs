use glam::Vec3;
use tracing::info;

use super::camera::{FixedOffsetCamera, Lens, OrbitCamera, PlayerCamera};
use super::light::{Flashlight, LightLevels};
use super::transform::Transform;
use crate::config::{ControlsConfig, FlashlightConfig};

/// Which of the two player cameras is looking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraPerson {
    FirstPerson,
    ThirdPerson,
}

impl CameraPerson {
    pub fn toggled(self) -> Self {
        match self {
            CameraPerson::FirstPerson => CameraPerson::ThirdPerson,
            CameraPerson::ThirdPerson => CameraPerson::FirstPerson,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CameraPerson::FirstPerson => "first person",
            CameraPerson::ThirdPerson => "third person",
        }
    }
}

/// Step sizes for keyboard movement
#[derive(Debug, Clone, Copy)]
pub struct MovementTuning {
    pub speed: f32,
    pub vertical_step: f32,
    pub turn_step_deg: f32,
    pub depth_ceiling: f32,
}

impl From<&ControlsConfig> for MovementTuning {
    fn from(c: &ControlsConfig) -> Self {
        Self {
            speed: c.move_speed,
            vertical_step: c.vertical_step,
            turn_step_deg: c.turn_step_deg,
            depth_ceiling: c.depth_ceiling,
        }
    }
}

/// The submersible: its transform plus everything derived from it.
///
/// The transform is only reachable mutably through methods that resync both
/// cameras and the flashlight afterwards, so derived state is never stale.
pub struct Player {
    transform: Transform,
    third_person: PlayerCamera,
    first_person: PlayerCamera,
    flashlight: Flashlight,
    light_levels: LightLevels,
    tuning: MovementTuning,
}

impl Player {
    pub fn new(
        transform: Transform,
        controls: &ControlsConfig,
        flashlight: &FlashlightConfig,
        width: u32,
        height: u32,
    ) -> Self {
        let lens = Lens::new(width, height);
        let orbit = OrbitCamera::new(
            controls.orbit_radius,
            controls.orbit_sensitivity,
            controls.pitch_limit_deg,
            lens,
        );
        let fixed = FixedOffsetCamera::new(Vec3::new(0.0, 0.0, 1.0), lens);
        let light_levels = LightLevels::new(flashlight.levels.clone());

        let mut player = Self {
            transform,
            third_person: PlayerCamera::Orbiting(orbit),
            first_person: PlayerCamera::FixedOffset(fixed),
            flashlight: Flashlight::new(light_levels.current(), flashlight.offset),
            light_levels,
            tuning: MovementTuning::from(controls),
        };
        player.resync();
        player
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn flashlight(&self) -> &Flashlight {
        &self.flashlight
    }

    pub fn light_level(&self) -> usize {
        self.light_levels.index()
    }

    pub fn light_level_count(&self) -> usize {
        self.light_levels.len()
    }

    pub fn camera(&self, person: CameraPerson) -> &PlayerCamera {
        match person {
            CameraPerson::FirstPerson => &self.first_person,
            CameraPerson::ThirdPerson => &self.third_person,
        }
    }

    fn camera_mut(&mut self, person: CameraPerson) -> &mut PlayerCamera {
        match person {
            CameraPerson::FirstPerson => &mut self.first_person,
            CameraPerson::ThirdPerson => &mut self.third_person,
        }
    }

    /// Recompute both cameras and the flashlight from the transform.
    pub fn resync(&mut self) {
        self.third_person.resync(&self.transform);
        self.first_person.resync(&self.transform);
        self.flashlight.follow(&self.transform);
    }

    fn mutate<R>(&mut self, f: impl FnOnce(&mut Transform) -> R) -> R {
        let result = f(&mut self.transform);
        self.resync();
        result
    }

    /// Positive steps go forward, negative steps go backward.
    pub fn advance(&mut self, steps: f32) {
        let distance = self.tuning.speed * steps;
        self.mutate(|t| t.move_relative_to_facing(distance));
    }

    /// Positive steps turn left (counter-clockwise seen from above).
    pub fn turn(&mut self, steps: f32) {
        let delta = self.tuning.turn_step_deg * steps;
        self.mutate(|t| t.adjust_facing(delta));
    }

    /// Positive steps rise towards the depth ceiling, negative steps sink.
    pub fn climb(&mut self, steps: f32) -> bool {
        let delta = self.tuning.vertical_step * steps;
        let ceiling = self.tuning.depth_ceiling;
        let moved = self.mutate(|t| t.move_vertical(delta, ceiling));
        if moved {
            info!(depth = self.transform.position.y, "Current depth");
        }
        moved
    }

    pub fn cycle_light_level(&mut self) -> f32 {
        let intensity = self.light_levels.advance();
        self.flashlight.intensity = intensity;
        self.flashlight.follow(&self.transform);
        intensity
    }

    /// Freelook cursor travel for the given camera.
    pub fn look(&mut self, person: CameraPerson, dx_pixels: f32, dy_pixels: f32) {
        let transform = self.transform;
        self.camera_mut(person).look(dx_pixels, dy_pixels, &transform);
    }

    pub fn settle_camera(&mut self, person: CameraPerson) {
        let transform = self.transform;
        self.camera_mut(person).settle(&transform);
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.third_person.set_aspect(width, height);
        self.first_person.set_aspect(width, height);
    }
}
