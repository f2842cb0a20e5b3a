use tracing::{debug, info};
use winit::keyboard::KeyCode;

use super::input::{KeyAction, KeyBindings, KeyRole};
use crate::config::ViewerConfig;
use crate::model::{CameraPerson, CameraView, OrthoCamera, Player, Transform};

/// Which camera a freelook drag is steering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookTarget {
    Orbit,
    Ortho,
}

/// An engaged mouse drag and the last cursor position seen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookDrag {
    pub target: LookTarget,
    pub last: (f64, f64),
}

/// Camera and input modes. This is the only place mode flags live.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    pub person: CameraPerson,
    pub top_down: bool,
    pub look: Option<LookDrag>,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            person: CameraPerson::ThirdPerson,
            top_down: false,
            look: None,
        }
    }
}

impl ControlState {
    pub fn freelook_engaged(&self) -> bool {
        self.look.is_some()
    }
}

/// Turns key and cursor events into player, camera and light changes.
///
/// Owns the player (and through it both player cameras and the flashlight),
/// the top-down camera and the mode flags. Every entry point finishes with a
/// resync so the render loop always reads current derived state.
pub struct InputController {
    player: Player,
    ortho: OrthoCamera,
    state: ControlState,
    bindings: KeyBindings,
}

impl InputController {
    pub fn new(config: &ViewerConfig, spawn: Transform, width: u32, height: u32) -> Self {
        let player = Player::new(spawn, &config.controls, &config.flashlight, width, height);
        let ortho = OrthoCamera::new(
            width,
            height,
            config.controls.pan_step,
            config.controls.drag_sensitivity,
        );
        Self {
            player,
            ortho,
            state: ControlState::default(),
            bindings: config.keys.clone(),
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ortho(&self) -> &OrthoCamera {
        &self.ortho
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// The camera the render loop should draw with this frame.
    pub fn active_camera(&self) -> &dyn CameraView {
        if self.state.top_down {
            &self.ortho
        } else {
            self.player.camera(self.state.person)
        }
    }

    /// Night-vision tint applies only when looking out of the cockpit.
    pub fn night_vision(&self) -> bool {
        self.state.person == CameraPerson::FirstPerson && !self.state.top_down
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.player.set_aspect(width, height);
        self.ortho.set_aspect(width, height);
    }

    pub fn on_key_event(&mut self, key: KeyCode, action: KeyAction) {
        if action == KeyAction::Release {
            return;
        }
        // Routing is decided once, from the mode in effect when the key arrived
        let Some(role) = self.bindings.resolve(key, self.state.top_down) else {
            return;
        };
        if !role.accepts(action) {
            return;
        }

        match role {
            KeyRole::ToggleCameraPerson => self.toggle_camera_person(),
            KeyRole::ToggleTopDown => self.toggle_top_down(),
            KeyRole::CycleLightLevel => {
                let intensity = self.player.cycle_light_level();
                info!(level = self.player.light_level(), intensity, "Flashlight level");
            }
            KeyRole::MoveForward => self.player.advance(1.0),
            KeyRole::MoveBackward => self.player.advance(-1.0),
            KeyRole::MoveUp => {
                self.player.climb(1.0);
            }
            KeyRole::MoveDown => {
                self.player.climb(-1.0);
            }
            KeyRole::RotateLeft => self.player.turn(1.0),
            KeyRole::RotateRight => self.player.turn(-1.0),
            KeyRole::Pan(direction) => self.ortho.pan(direction),
        }

        self.resync();
    }

    /// Cursor moved (or the left button changed) at `(x, y)` in window pixels.
    pub fn on_cursor_event(&mut self, x: f64, y: f64, left_down: bool) {
        match (self.state.look, left_down) {
            (None, true) => self.engage_look(x, y),
            (Some(_), false) => self.release_look(),
            (Some(drag), true) => self.drag_look(drag, x, y),
            (None, false) => {}
        }
        self.resync();
    }

    fn toggle_camera_person(&mut self) {
        self.release_look();
        self.state.person = self.state.person.toggled();
        info!(camera = self.state.person.label(), "Switched player camera");
    }

    fn toggle_top_down(&mut self) {
        self.release_look();
        self.state.top_down = !self.state.top_down;
        if self.state.top_down {
            self.ortho.set_above_target(self.player.position());
        }
        info!(top_down = self.state.top_down, "Toggled top-down view");
    }

    fn engage_look(&mut self, x: f64, y: f64) {
        let target = if self.state.top_down {
            LookTarget::Ortho
        } else if self.state.person == CameraPerson::ThirdPerson {
            LookTarget::Orbit
        } else {
            // First-person camera has no freelook
            return;
        };
        debug!(?target, x, y, "Freelook engaged");
        self.state.look = Some(LookDrag { target, last: (x, y) });
    }

    fn drag_look(&mut self, drag: LookDrag, x: f64, y: f64) {
        let dx = (x - drag.last.0) as f32;
        let dy = (y - drag.last.1) as f32;
        self.state.look = Some(LookDrag { last: (x, y), ..drag });

        match drag.target {
            // Screen y grows downwards; moving up should raise the pitch
            LookTarget::Orbit => self.player.look(CameraPerson::ThirdPerson, dx, -dy),
            LookTarget::Ortho => self.ortho.drag(dx, dy),
        }
    }

    fn release_look(&mut self) {
        if let Some(drag) = self.state.look.take() {
            debug!(target = ?drag.target, "Freelook released");
            if drag.target == LookTarget::Orbit {
                self.player.settle_camera(CameraPerson::ThirdPerson);
            }
        }
    }

    fn resync(&mut self) {
        self.player.resync();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrbitCamera, PlayerCamera};
    use glam::Vec3;

    fn controller() -> InputController {
        InputController::new(&ViewerConfig::default(), Transform::default(), 720, 720)
    }

    fn press(c: &mut InputController, key: KeyCode) {
        c.on_key_event(key, KeyAction::Press);
    }

    fn orbit(c: &InputController) -> &OrbitCamera {
        match c.player().camera(CameraPerson::ThirdPerson) {
            PlayerCamera::Orbiting(cam) => cam,
            PlayerCamera::FixedOffset(_) => panic!("third person camera should orbit"),
        }
    }

    /// Both player cameras must equal a fresh resync from the current transform.
    fn assert_cameras_current(c: &InputController) {
        let t = *c.player().transform();
        for person in [CameraPerson::FirstPerson, CameraPerson::ThirdPerson] {
            let mut fresh = c.player().camera(person).clone();
            fresh.resync(&t);
            assert!(fresh.position().abs_diff_eq(c.player().camera(person).position(), 1e-5));
        }
        let light = c.player().flashlight();
        assert!(light.position.abs_diff_eq(t.position + t.forward() * light.offset, 1e-5));
    }

    #[test]
    fn test_cameras_track_every_movement() {
        let mut c = controller();
        let keys = [
            KeyCode::KeyW,
            KeyCode::KeyA,
            KeyCode::KeyE,
            KeyCode::KeyW,
            KeyCode::KeyD,
            KeyCode::KeyS,
            KeyCode::KeyQ,
            KeyCode::KeyE,
        ];
        for (i, key) in keys.iter().cycle().take(64).enumerate() {
            let action = if i % 3 == 0 { KeyAction::Press } else { KeyAction::Hold };
            c.on_key_event(*key, action);
            assert_cameras_current(&c);
        }
    }

    #[test]
    fn test_camera_person_toggle_is_an_involution() {
        let mut c = controller();
        press(&mut c, KeyCode::KeyA);
        press(&mut c, KeyCode::KeyW);
        let transform = *c.player().transform();
        let (yaw, pitch) = (orbit(&c).yaw_offset, orbit(&c).pitch);
        let eye = c.active_camera().position();

        press(&mut c, KeyCode::Digit1);
        assert_eq!(c.state().person, CameraPerson::FirstPerson);
        press(&mut c, KeyCode::Digit1);

        assert_eq!(c.state().person, CameraPerson::ThirdPerson);
        assert_eq!(*c.player().transform(), transform);
        assert_eq!(orbit(&c).yaw_offset, yaw);
        assert_eq!(orbit(&c).pitch, pitch);
        assert_eq!(c.active_camera().position(), eye);
    }

    #[test]
    fn test_light_level_cycle_wraps() {
        let mut c = controller();
        let start = c.player().flashlight().intensity;
        let n = c.player().light_level_count();
        for _ in 0..n {
            press(&mut c, KeyCode::KeyF);
        }
        assert_eq!(c.player().flashlight().intensity, start);
        assert_eq!(c.player().light_level(), 0);
    }

    #[test]
    fn test_light_key_does_not_repeat() {
        let mut c = controller();
        press(&mut c, KeyCode::KeyF);
        c.on_key_event(KeyCode::KeyF, KeyAction::Hold);
        c.on_key_event(KeyCode::KeyF, KeyAction::Hold);
        assert_eq!(c.player().light_level(), 1);
    }

    #[test]
    fn test_orbit_revolve_is_reversible() {
        let mut c = controller();
        c.on_cursor_event(100.0, 100.0, true);
        assert!(c.state().freelook_engaged());
        let yaw = orbit(&c).yaw_offset;

        c.on_cursor_event(140.0, 100.0, true);
        assert_eq!(orbit(&c).yaw_offset, yaw + 10.0);
        c.on_cursor_event(100.0, 100.0, true);
        assert_eq!(orbit(&c).yaw_offset, yaw);
    }

    #[test]
    fn test_screen_up_raises_pitch() {
        let mut c = controller();
        c.on_cursor_event(0.0, 200.0, true);
        c.on_cursor_event(0.0, 160.0, true);
        assert_eq!(orbit(&c).pitch, 10.0);
        assert!(c.active_camera().position().y > 0.0);
    }

    #[test]
    fn test_entering_top_down_snaps_above_player() {
        let mut c = InputController::new(
            &ViewerConfig::default(),
            Transform::new(Vec3::new(3.0, 0.0, -5.0), 0.1, Vec3::ZERO),
            720,
            720,
        );
        press(&mut c, KeyCode::Digit2);
        assert!(c.state().top_down);
        assert_eq!(c.ortho().position, Vec3::new(3.0, 1.0, -5.0));
        assert_eq!(c.ortho().target, Vec3::new(3.0, 0.0, -5.0));
        assert_eq!(c.active_camera().position(), Vec3::new(3.0, 1.0, -5.0));
    }

    #[test]
    fn test_releasing_freelook_settles_behind_player() {
        let mut c = controller();
        for _ in 0..90 {
            c.on_key_event(KeyCode::KeyA, KeyAction::Hold);
        }
        assert_eq!(c.player().transform().facing(), 90.0);

        c.on_cursor_event(10.0, 10.0, true);
        c.on_cursor_event(90.0, -30.0, true);
        assert_ne!(orbit(&c).yaw_offset, 0.0);

        c.on_cursor_event(90.0, -30.0, false);
        assert!(!c.state().freelook_engaged());
        assert_eq!(orbit(&c).yaw_offset, 0.0);
        assert_eq!(orbit(&c).pitch, 0.0);
        // Facing +X, camera 1.5 units behind on -X
        assert!(c.active_camera().position().abs_diff_eq(Vec3::new(-1.5, 0.0, 0.0), 1e-4));
    }

    #[test]
    fn test_move_up_at_ceiling_is_noop() {
        let mut c = controller();
        press(&mut c, KeyCode::KeyQ);
        c.on_key_event(KeyCode::KeyQ, KeyAction::Hold);
        assert_eq!(c.player().position(), Vec3::ZERO);
    }

    #[test]
    fn test_release_events_never_mutate() {
        let mut c = controller();
        press(&mut c, KeyCode::KeyW);
        let transform = *c.player().transform();
        let eye = c.active_camera().position();
        let light = c.player().flashlight().position;
        let state = *c.state();

        for key in [
            KeyCode::KeyW,
            KeyCode::KeyS,
            KeyCode::KeyA,
            KeyCode::KeyD,
            KeyCode::KeyQ,
            KeyCode::KeyE,
            KeyCode::KeyF,
            KeyCode::Digit1,
            KeyCode::Digit2,
        ] {
            c.on_key_event(key, KeyAction::Release);
        }

        assert_eq!(*c.player().transform(), transform);
        assert_eq!(c.active_camera().position(), eye);
        assert_eq!(c.player().flashlight().position, light);
        assert_eq!(c.player().light_level(), 0);
        assert_eq!(*c.state(), state);
    }

    #[test]
    fn test_top_down_routes_keys_to_ortho_only() {
        let mut c = controller();
        press(&mut c, KeyCode::Digit2);
        let transform = *c.player().transform();

        press(&mut c, KeyCode::KeyW);
        press(&mut c, KeyCode::KeyD);
        // Held keys do not keep panning
        c.on_key_event(KeyCode::KeyD, KeyAction::Hold);
        press(&mut c, KeyCode::KeyE);

        assert_eq!(*c.player().transform(), transform);
        assert_eq!(c.ortho().position, Vec3::new(1.0, 1.0, -1.0));
        assert_eq!(c.ortho().target, Vec3::new(1.0, 0.0, -1.0));

        // Camera person and light keys still reach the player
        press(&mut c, KeyCode::Digit1);
        press(&mut c, KeyCode::KeyF);
        assert_eq!(c.state().person, CameraPerson::FirstPerson);
        assert_eq!(c.player().light_level(), 1);
        assert!(!c.night_vision());
    }

    #[test]
    fn test_top_down_drag_moves_against_cursor() {
        let mut c = controller();
        press(&mut c, KeyCode::Digit2);
        c.on_cursor_event(50.0, 50.0, true);
        assert_eq!(c.state().look.map(|l| l.target), Some(LookTarget::Ortho));

        c.on_cursor_event(70.0, 90.0, true);
        assert!(c.ortho().position.abs_diff_eq(Vec3::new(-1.0, 1.0, -2.0), 1e-5));

        let yaw = orbit(&c).yaw_offset;
        c.on_cursor_event(70.0, 90.0, false);
        assert!(!c.state().freelook_engaged());
        assert_eq!(orbit(&c).yaw_offset, yaw);
    }

    #[test]
    fn test_first_person_ignores_cursor() {
        let mut c = controller();
        press(&mut c, KeyCode::Digit1);
        let eye = c.active_camera().position();
        c.on_cursor_event(0.0, 0.0, true);
        c.on_cursor_event(300.0, 300.0, true);
        assert!(!c.state().freelook_engaged());
        assert_eq!(c.active_camera().position(), eye);
        assert!(c.night_vision());
    }

    #[test]
    fn test_switching_modes_mid_drag_releases_freelook() {
        let mut c = controller();
        c.on_cursor_event(0.0, 0.0, true);
        c.on_cursor_event(40.0, 0.0, true);
        press(&mut c, KeyCode::Digit2);
        assert!(!c.state().freelook_engaged());
        assert_eq!(orbit(&c).yaw_offset, 0.0);

        // Still holding the button: the next motion starts an ortho drag
        c.on_cursor_event(40.0, 0.0, true);
        assert_eq!(c.state().look.map(|l| l.target), Some(LookTarget::Ortho));
    }

    #[test]
    fn test_non_finite_pitch_limit_survives_orbit_drag() {
        let config = ViewerConfig::from_toml_str("[controls]\npitch_limit_deg = nan\ndepth_ceiling = nan").unwrap();
        let mut c = InputController::new(&config, Transform::default(), 720, 720);
        c.on_cursor_event(0.0, 0.0, true);
        c.on_cursor_event(10.0, -400.0, true);
        assert!(orbit(&c).pitch.is_finite());
        assert!(orbit(&c).pitch <= 89.0);

        // The ceiling still holds with the default restored
        c.on_cursor_event(10.0, -400.0, false);
        c.on_key_event(KeyCode::KeyQ, KeyAction::Press);
        assert_eq!(c.player().position().y, 0.0);
    }
}
