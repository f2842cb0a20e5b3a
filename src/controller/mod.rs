// CONTROLLER: input translation, mode state machine and per-frame assembly
pub mod input;
pub mod input_controller;
pub mod frame_loop;

pub use input::{key_code, KeyAction, KeyBindings, KeyRole, PointerState};
pub use input_controller::{ControlState, InputController, LookDrag, LookTarget};
pub use frame_loop::{clear_color, EntityShading, FrameTimer, ModelUniform, SceneUniform, NIGHT_VISION_FILTER};
