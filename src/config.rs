//! Viewer settings loaded from `config/submersible.toml`.
//!
//! Every field is optional in the file. Anything missing or unreadable falls
//! back to the built-in defaults.
use std::{fs, path::Path, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::controller::input::KeyBindings;

pub const CONFIG_PATH: &str = "config/submersible.toml";

#[derive(Debug, Clone, Deserialize, Default)]
struct RawViewerConfig {
    #[serde(default)]
    window: RawWindow,
    #[serde(default)]
    controls: RawControls,
    #[serde(default)]
    flashlight: RawFlashlight,
    #[serde(default)]
    assets: RawAssets,
    #[serde(default)]
    keys: KeyBindings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawWindow {
    width: u32,
    height: u32,
    title: String,
}

impl Default for RawWindow {
    fn default() -> Self {
        Self {
            width: 720,
            height: 720,
            title: "Submersible".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawControls {
    move_speed: f32,
    vertical_step: f32,
    turn_step_deg: f32,
    depth_ceiling: f32,
    orbit_radius: f32,
    orbit_sensitivity: f32,
    pitch_limit_deg: f32,
    drag_sensitivity: f32,
    pan_step: f32,
}

impl Default for RawControls {
    fn default() -> Self {
        Self {
            move_speed: 0.05,
            vertical_step: 0.1,
            turn_step_deg: 1.0,
            depth_ceiling: 0.0,
            orbit_radius: 1.5,
            orbit_sensitivity: 0.25,
            pitch_limit_deg: 89.0,
            drag_sensitivity: 0.05,
            pan_step: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawFlashlight {
    levels: Vec<f32>,
    offset: f32,
}

impl Default for RawFlashlight {
    fn default() -> Self {
        Self {
            levels: vec![0.5, 1.25, 2.0],
            offset: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawAssets {
    root: PathBuf,
}

impl Default for RawAssets {
    fn default() -> Self {
        Self {
            root: PathBuf::from("3D"),
        }
    }
}

/// Runtime configuration derived from `config/submersible.toml`.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub controls: ControlsConfig,
    pub flashlight: FlashlightConfig,
    pub asset_root: PathBuf,
    pub keys: KeyBindings,
}

#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct ControlsConfig {
    pub move_speed: f32,
    pub vertical_step: f32,
    pub turn_step_deg: f32,
    pub depth_ceiling: f32,
    pub orbit_radius: f32,
    pub orbit_sensitivity: f32,
    pub pitch_limit_deg: f32,
    pub drag_sensitivity: f32,
    pub pan_step: f32,
}

#[derive(Debug, Clone)]
pub struct FlashlightConfig {
    pub levels: Vec<f32>,
    pub offset: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        RawViewerConfig::default().into()
    }
}

impl ViewerConfig {
    pub fn load_or_default() -> Self {
        let path = Path::new(CONFIG_PATH);
        match fs::read_to_string(path) {
            Ok(raw) => match Self::from_toml_str(&raw) {
                Ok(config) => {
                    info!("Loaded {}", CONFIG_PATH);
                    config
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {} ({}). Falling back to defaults.",
                        CONFIG_PATH, err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                warn!(
                    "Failed to read {} ({}). Falling back to defaults.",
                    CONFIG_PATH, err
                );
                Self::default()
            }
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<RawViewerConfig>(raw).map(Into::into)
    }
}

/// TOML accepts `nan` and `inf`; neither survives into the runtime config.
fn finite_or(value: f32, default: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        warn!(value, default, "Non-finite config value replaced by default");
        default
    }
}

impl From<RawViewerConfig> for ViewerConfig {
    fn from(value: RawViewerConfig) -> Self {
        let window = WindowConfig {
            width: value.window.width.max(1),
            height: value.window.height.max(1),
            title: value.window.title,
        };

        let c = value.controls;
        let d = RawControls::default();
        let controls = ControlsConfig {
            move_speed: finite_or(c.move_speed, d.move_speed).max(0.0),
            vertical_step: finite_or(c.vertical_step, d.vertical_step).max(0.0),
            turn_step_deg: finite_or(c.turn_step_deg, d.turn_step_deg).max(0.0),
            depth_ceiling: finite_or(c.depth_ceiling, d.depth_ceiling),
            orbit_radius: finite_or(c.orbit_radius, d.orbit_radius).max(0.01),
            orbit_sensitivity: finite_or(c.orbit_sensitivity, d.orbit_sensitivity).max(0.0),
            pitch_limit_deg: finite_or(c.pitch_limit_deg, d.pitch_limit_deg).clamp(0.0, 89.9),
            drag_sensitivity: finite_or(c.drag_sensitivity, d.drag_sensitivity).max(0.0),
            pan_step: finite_or(c.pan_step, d.pan_step).max(0.0),
        };

        let levels: Vec<f32> = value
            .flashlight
            .levels
            .into_iter()
            .filter(|level| level.is_finite() && *level >= 0.0)
            .collect();
        let flashlight = FlashlightConfig {
            levels: if levels.is_empty() { vec![1.0] } else { levels },
            offset: finite_or(value.flashlight.offset, RawFlashlight::default().offset),
        };

        Self {
            window,
            controls,
            flashlight,
            asset_root: value.assets.root,
            keys: value.keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::KeyCode;

    #[test]
    fn test_config_falls_back_to_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.window.width, 720);
        assert_eq!(config.flashlight.levels, vec![0.5, 1.25, 2.0]);
        assert_eq!(config.controls.depth_ceiling, 0.0);
        assert_eq!(config.keys.toggle_top_down, KeyCode::Digit2);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [controls]
            pitch_limit_deg = 120.0
            move_speed = 0.2

            [keys]
            cycle_light_level = "KeyL"
            "#,
        )
        .unwrap();
        assert_eq!(config.controls.move_speed, 0.2);
        assert_eq!(config.controls.pitch_limit_deg, 89.9);
        assert_eq!(config.controls.turn_step_deg, 1.0);
        assert_eq!(config.keys.cycle_light_level, KeyCode::KeyL);
        assert_eq!(config.keys.move_forward, KeyCode::KeyW);
    }

    #[test]
    fn test_invalid_light_levels_are_dropped() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [flashlight]
            levels = [-1.0]
            "#,
        )
        .unwrap();
        assert_eq!(config.flashlight.levels, vec![1.0]);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let shipped = ViewerConfig::from_toml_str(include_str!("../config/submersible.toml")).unwrap();
        let defaults = ViewerConfig::default();
        assert_eq!(shipped.window.width, defaults.window.width);
        assert_eq!(shipped.controls.orbit_radius, defaults.controls.orbit_radius);
        assert_eq!(shipped.flashlight.levels, defaults.flashlight.levels);
        assert_eq!(shipped.asset_root, defaults.asset_root);
        assert_eq!(shipped.keys.move_down, defaults.keys.move_down);
    }

    #[test]
    fn test_non_finite_values_use_defaults() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [controls]
            pitch_limit_deg = nan
            depth_ceiling = -nan
            orbit_radius = inf
            move_speed = -inf

            [flashlight]
            offset = nan
            "#,
        )
        .unwrap();
        let defaults = ViewerConfig::default();
        assert_eq!(config.controls.pitch_limit_deg, defaults.controls.pitch_limit_deg);
        assert_eq!(config.controls.depth_ceiling, defaults.controls.depth_ceiling);
        assert_eq!(config.controls.orbit_radius, defaults.controls.orbit_radius);
        assert_eq!(config.controls.move_speed, defaults.controls.move_speed);
        assert_eq!(config.flashlight.offset, defaults.flashlight.offset);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(ViewerConfig::from_toml_str("[controls\nmove_speed = ").is_err());
    }
}
