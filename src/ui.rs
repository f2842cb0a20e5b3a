use egui::Context;
use glam::Vec3;

use crate::controller::{InputController, KeyBindings};

/// Snapshot of what the HUD displays this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HudStats {
    pub fps: f32,
    pub position: Vec3,
    pub facing_deg: f32,
    pub camera: &'static str,
    pub top_down: bool,
    pub night_vision: bool,
    pub light_level: usize,
    pub light_levels: usize,
    pub light_intensity: f32,
}

impl HudStats {
    pub fn from_controller(controller: &InputController, fps: f32) -> Self {
        let player = controller.player();
        let state = controller.state();
        Self {
            fps,
            position: player.position(),
            facing_deg: player.transform().facing(),
            camera: if state.top_down { "top-down" } else { state.person.label() },
            top_down: state.top_down,
            night_vision: controller.night_vision(),
            light_level: player.light_level(),
            light_levels: player.light_level_count(),
            light_intensity: player.flashlight().intensity,
        }
    }

    /// Depth below the surface, positive going down.
    pub fn depth(&self) -> f32 {
        (-self.position.y).max(0.0)
    }
}

/// Build the HUD for one frame.
pub fn build_ui(ctx: &Context, raw_input: egui::RawInput, stats: &HudStats, keys: &KeyBindings) -> egui::FullOutput {
    ctx.run(raw_input, |ctx| {
        draw_status_window(ctx, stats);
        draw_controls_window(ctx, keys, stats.top_down);
        if stats.night_vision {
            draw_night_vision_badge(ctx);
        }
    })
}

fn draw_status_window(ctx: &Context, stats: &HudStats) {
    egui::Window::new("Submersible")
        .default_pos([8.0, 8.0])
        .default_size([160.0, 100.0])
        .show(ctx, |ui| {
            ui.label(egui::RichText::new(format!("FPS: {:.0}", stats.fps)).small());
            let p = stats.position;
            ui.label(egui::RichText::new(format!("Pos: {:.1}, {:.1}, {:.1}", p.x, p.y, p.z)).small());
            ui.label(egui::RichText::new(format!("Depth: {:.1}", stats.depth())).small());
            ui.label(egui::RichText::new(format!("Heading: {:.0}°", stats.facing_deg)).small());
            ui.label(egui::RichText::new(format!("Camera: {}", stats.camera)).small());
            ui.label(
                egui::RichText::new(format!(
                    "Light: {}/{} ({:.2})",
                    stats.light_level + 1,
                    stats.light_levels,
                    stats.light_intensity
                ))
                .small(),
            );
        });
}

fn draw_controls_window(ctx: &Context, keys: &KeyBindings, top_down: bool) {
    egui::Window::new("Controls")
        .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
        .default_open(false)
        .show(ctx, |ui| {
            let line = |ui: &mut egui::Ui, text: String| {
                ui.label(egui::RichText::new(text).small());
            };
            line(ui, format!("{:?} - Toggle first/third person", keys.toggle_camera_person));
            line(ui, format!("{:?} - Toggle top-down", keys.toggle_top_down));
            line(ui, format!("{:?} - Flashlight level", keys.cycle_light_level));
            ui.separator();
            if top_down {
                line(
                    ui,
                    format!(
                        "{:?}/{:?}/{:?}/{:?} - Pan",
                        keys.pan_forward, keys.pan_left, keys.pan_back, keys.pan_right
                    ),
                );
                line(ui, "Left drag - Pan".to_string());
            } else {
                line(ui, format!("{:?}/{:?} - Forward/back", keys.move_forward, keys.move_backward));
                line(ui, format!("{:?}/{:?} - Rotate", keys.rotate_left, keys.rotate_right));
                line(ui, format!("{:?}/{:?} - Up/down", keys.move_up, keys.move_down));
                line(ui, "Left drag - Orbit camera".to_string());
            }
        });
}

fn draw_night_vision_badge(ctx: &Context) {
    egui::Area::new(egui::Id::new("night_vision"))
        .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -8.0])
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new("NIGHT VISION")
                    .size(12.0)
                    .color(egui::Color32::from_rgb(60, 220, 60)),
            );
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use crate::controller::KeyAction;
    use crate::model::Transform;
    use winit::keyboard::KeyCode;

    fn controller() -> InputController {
        InputController::new(&ViewerConfig::default(), Transform::default(), 720, 720)
    }

    #[test]
    fn test_stats_reflect_controller_mode() {
        let mut c = controller();
        c.on_key_event(KeyCode::KeyE, KeyAction::Press);
        c.on_key_event(KeyCode::KeyF, KeyAction::Press);

        let stats = HudStats::from_controller(&c, 60.0);
        assert_eq!(stats.camera, "third person");
        assert!((stats.depth() - 0.1).abs() < 1e-6);
        assert_eq!((stats.light_level, stats.light_levels), (1, 3));

        c.on_key_event(KeyCode::Digit2, KeyAction::Press);
        assert_eq!(HudStats::from_controller(&c, 60.0).camera, "top-down");
    }

    #[test]
    fn test_hud_renders_headless() {
        let c = controller();
        let ctx = Context::default();
        let stats = HudStats::from_controller(&c, 0.0);
        let keys = KeyBindings::default();
        // Windows are measured invisibly on their first frame
        let _ = build_ui(&ctx, egui::RawInput::default(), &stats, &keys);
        let output = build_ui(&ctx, egui::RawInput::default(), &stats, &keys);
        assert!(!output.shapes.is_empty());
    }
}
