pub mod debug_panel;
pub mod dialogue_box;
pub mod overlay;

pub use debug_panel::{DebugPanel, DebugStats};
pub use dialogue_box::DialogueBox;
pub use overlay::UiLayer;
