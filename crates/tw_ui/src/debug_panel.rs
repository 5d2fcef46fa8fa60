use tw_core::time::TimeState;

#[derive(Debug, Clone, Default)]
pub struct DebugStats {
    pub player_position: [f32; 2],
    pub player_screen: [f32; 2],
    pub direction: String,
    pub animation: String,
    pub flip_x: bool,
    pub in_dialogue: bool,
    /// Zone of the dialogue box currently on screen.
    pub dialogue_zone: Option<String>,
    pub camera_scale: f32,
    pub draw_calls: u32,
    pub texture_binds: u32,
    pub show_colliders: bool,
}

impl DebugStats {
    pub fn dialogue_label(&self) -> String {
        match (&self.dialogue_zone, self.in_dialogue) {
            (Some(zone), _) => format!("'{zone}'"),
            (None, true) => "locked, no box".to_string(),
            (None, false) => "none".to_string(),
        }
    }
}

/// F3 panel.
pub struct DebugPanel {
    pub visible: bool,
}

impl Default for DebugPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugPanel {
    pub fn new() -> Self {
        Self { visible: false }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug panel: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn show(&self, ctx: &egui::Context, time: &TimeState, stats: &DebugStats) {
        if !self.visible {
            return;
        }
        egui::Window::new("Debug")
            .default_pos([10.0, 10.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("FPS: {:.1}", time.smoothed_fps));
                ui.label(format!("Steps this frame: {}", time.steps_this_frame));
                ui.label(format!("Total steps: {}", time.fixed_step_count));
                ui.label(format!("Frame: {}", time.frame_count));
                ui.separator();
                ui.label(format!(
                    "Player: ({:.1}, {:.1})",
                    stats.player_position[0], stats.player_position[1]
                ));
                ui.label(format!(
                    "On screen: ({:.0}, {:.0})",
                    stats.player_screen[0], stats.player_screen[1]
                ));
                ui.label(format!("Direction: {}", stats.direction));
                ui.label(format!(
                    "Animation: {}{}",
                    stats.animation,
                    if stats.flip_x { " (flipped)" } else { "" }
                ));
                ui.label(format!("Dialogue: {}", stats.dialogue_label()));
                ui.label(format!("Camera scale: {:.2}", stats.camera_scale));
                ui.separator();
                ui.label(format!("Draw calls: {}", stats.draw_calls));
                ui.label(format!("Texture binds: {}", stats.texture_binds));
                ui.label(format!(
                    "Colliders (F4): {}",
                    if stats.show_colliders { "shown" } else { "hidden" }
                ));
            });
    }
}
