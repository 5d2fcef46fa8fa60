/// Characters revealed per second by the typewriter effect.
const DEFAULT_REVEAL_RATE: f32 = 60.0;

struct OpenDialogue {
    zone: String,
    text: String,
    char_count: usize,
    revealed: f32,
}

/// Bottom-of-screen text box. Text is revealed progressively; the Close
/// button or Enter dismisses it and `show` reports the close once.
pub struct DialogueBox {
    current: Option<OpenDialogue>,
    pub reveal_rate: f32,
}

impl Default for DialogueBox {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogueBox {
    pub fn new() -> Self {
        Self {
            current: None,
            reveal_rate: DEFAULT_REVEAL_RATE,
        }
    }

    pub fn open(&mut self, zone: &str, text: &str) {
        if let Some(previous) = &self.current {
            log::warn!(
                "Dialogue '{}' replaced by '{}' before it was closed",
                previous.zone,
                zone
            );
        }
        self.current = Some(OpenDialogue {
            zone: zone.to_string(),
            text: text.to_string(),
            char_count: text.chars().count(),
            revealed: 0.0,
        });
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn zone(&self) -> Option<&str> {
        self.current.as_ref().map(|d| d.zone.as_str())
    }

    pub fn tick(&mut self, dt: f32) {
        if let Some(dialogue) = &mut self.current {
            dialogue.revealed =
                (dialogue.revealed + dt * self.reveal_rate).min(dialogue.char_count as f32);
        }
    }

    pub fn fully_revealed(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|d| d.revealed as usize >= d.char_count)
    }

    /// The revealed prefix of the current text, cut on a char boundary.
    pub fn visible_text(&self) -> &str {
        let Some(dialogue) = &self.current else {
            return "";
        };
        let shown = dialogue.revealed as usize;
        match dialogue.text.char_indices().nth(shown) {
            Some((byte_index, _)) => &dialogue.text[..byte_index],
            None => &dialogue.text,
        }
    }

    /// Close the box. Returns true if a dialogue was open.
    pub fn close(&mut self) -> bool {
        match self.current.take() {
            Some(dialogue) => {
                log::info!("Dialogue '{}' closed", dialogue.zone);
                true
            }
            None => false,
        }
    }

    /// Draw the box. Returns true on the frame the player dismisses it.
    pub fn show(&mut self, ctx: &egui::Context) -> bool {
        if !self.is_open() {
            return false;
        }

        let mut close_clicked = false;
        let screen = ctx.screen_rect();
        let width = (screen.width() - 40.0).clamp(200.0, 900.0);

        egui::Area::new(egui::Id::new("dialogue_box"))
            .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -20.0])
            .show(ctx, |ui| {
                egui::Frame::window(ui.style())
                    .inner_margin(egui::Margin::same(16))
                    .show(ui, |ui| {
                        ui.set_width(width);
                        ui.label(egui::RichText::new(self.visible_text()).size(20.0));
                        ui.add_space(8.0);
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                            if ui.button("Close").clicked() {
                                close_clicked = true;
                            }
                        });
                    });
            });

        let enter_pressed = ctx.input(|i| i.key_pressed(egui::Key::Enter));
        if close_clicked || enter_pressed {
            return self.close();
        }

        // Keep repainting while text is still appearing.
        if !self.fully_revealed() {
            ctx.request_repaint();
        }
        false
    }
}
