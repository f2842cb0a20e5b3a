//! Input vocabulary for the controller: key actions, logical roles, bindings
//! and the left-button state the 3D view sees
use serde::Deserialize;
use winit::event::ElementState;
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::model::PanDirection;

/// Phase of a key event. `Hold` is an auto-repeat of a held key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Hold,
    Release,
}

impl KeyAction {
    pub fn from_winit(state: ElementState, repeat: bool) -> Self {
        match state {
            ElementState::Released => KeyAction::Release,
            ElementState::Pressed if repeat => KeyAction::Hold,
            ElementState::Pressed => KeyAction::Press,
        }
    }
}

/// Logical meaning of a key, independent of which physical key is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    ToggleCameraPerson,
    ToggleTopDown,
    CycleLightLevel,
    MoveForward,
    MoveBackward,
    MoveUp,
    MoveDown,
    RotateLeft,
    RotateRight,
    Pan(PanDirection),
}

impl KeyRole {
    /// Whether auto-repeat keeps firing this role. Edge-triggered roles only
    /// react to the initial press.
    pub fn repeats(self) -> bool {
        matches!(
            self,
            KeyRole::MoveForward
                | KeyRole::MoveBackward
                | KeyRole::MoveUp
                | KeyRole::MoveDown
                | KeyRole::RotateLeft
                | KeyRole::RotateRight
        )
    }

    pub fn accepts(self, action: KeyAction) -> bool {
        match action {
            KeyAction::Press => true,
            KeyAction::Hold => self.repeats(),
            KeyAction::Release => false,
        }
    }
}

/// Key mapping configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub toggle_camera_person: KeyCode,
    pub toggle_top_down: KeyCode,
    pub cycle_light_level: KeyCode,
    pub move_forward: KeyCode,
    pub move_backward: KeyCode,
    pub move_up: KeyCode,
    pub move_down: KeyCode,
    pub rotate_left: KeyCode,
    pub rotate_right: KeyCode,
    pub pan_forward: KeyCode,
    pub pan_back: KeyCode,
    pub pan_left: KeyCode,
    pub pan_right: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            toggle_camera_person: KeyCode::Digit1,
            toggle_top_down: KeyCode::Digit2,
            cycle_light_level: KeyCode::KeyF,
            move_forward: KeyCode::KeyW,
            move_backward: KeyCode::KeyS,
            move_up: KeyCode::KeyQ,
            move_down: KeyCode::KeyE,
            rotate_left: KeyCode::KeyA,
            rotate_right: KeyCode::KeyD,
            pan_forward: KeyCode::KeyW,
            pan_back: KeyCode::KeyS,
            pan_left: KeyCode::KeyA,
            pan_right: KeyCode::KeyD,
        }
    }
}

impl KeyBindings {
    /// Map a physical key to its role. Mode toggles and the light key are
    /// always live; the rest depend on whether top-down mode is routing input
    /// to the orthographic camera.
    pub fn resolve(&self, key: KeyCode, top_down: bool) -> Option<KeyRole> {
        if key == self.toggle_top_down {
            return Some(KeyRole::ToggleTopDown);
        }
        if key == self.toggle_camera_person {
            return Some(KeyRole::ToggleCameraPerson);
        }
        if key == self.cycle_light_level {
            return Some(KeyRole::CycleLightLevel);
        }

        if top_down {
            let pans = [
                (self.pan_forward, PanDirection::Forward),
                (self.pan_back, PanDirection::Back),
                (self.pan_left, PanDirection::Left),
                (self.pan_right, PanDirection::Right),
            ];
            return pans
                .into_iter()
                .find(|(bound, _)| *bound == key)
                .map(|(_, dir)| KeyRole::Pan(dir));
        }

        let moves = [
            (self.move_forward, KeyRole::MoveForward),
            (self.move_backward, KeyRole::MoveBackward),
            (self.move_up, KeyRole::MoveUp),
            (self.move_down, KeyRole::MoveDown),
            (self.rotate_left, KeyRole::RotateLeft),
            (self.rotate_right, KeyRole::RotateRight),
        ];
        moves
            .into_iter()
            .find(|(bound, _)| *bound == key)
            .map(|(_, role)| role)
    }
}

/// Extract the key code from a winit physical key, ignoring unidentified keys
pub fn key_code(key: &PhysicalKey) -> Option<KeyCode> {
    match key {
        PhysicalKey::Code(code) => Some(*code),
        PhysicalKey::Unidentified(_) => None,
    }
}

/// Cursor position and left-button state as forwarded to the controller.
///
/// The HUD may swallow a press, but never a release: a drag that ends over a
/// HUD window must still end in the 3D view.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PointerState {
    pub position: (f64, f64),
    pub left_down: bool,
}

impl PointerState {
    pub fn moved(&mut self, x: f64, y: f64) {
        self.position = (x, y);
    }

    /// Record a left-button change. Returns whether the controller should be
    /// told about it.
    pub fn button(&mut self, pressed: bool, consumed_by_ui: bool) -> bool {
        if pressed && consumed_by_ui {
            return false;
        }
        let changed = self.left_down != pressed;
        self.left_down = pressed;
        changed
    }
}
