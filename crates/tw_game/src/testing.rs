//! Headless fixtures shared by scene and replay tests.

use tw_core::animation::{parse_sprite_sheet, SpriteSheet};

use crate::map::{MapFile, MapLayer, MapObject, BOUNDARY_LAYER, SPAWN_LAYER};
use crate::scene::SceneServices;

pub const PLAYER_SHEET: &str = r#"
{
  "version": "0.1",
  "sheet_id": "player",
  "image": "assets/spritesheet.png",
  "slice_x": 39,
  "slice_y": 31,
  "anims": {
    "idle-down": 952,
    "walk-down": { "from": 952, "to": 955, "loop": true, "speed": 8 },
    "idle-side": 991,
    "walk-side": { "from": 991, "to": 994, "loop": true, "speed": 8 },
    "idle-up": 1030,
    "walk-up": { "from": 1030, "to": 1033, "loop": true, "speed": 8 }
  }
}
"#;

pub fn player_sheet() -> SpriteSheet {
    parse_sprite_sheet(PLAYER_SHEET).expect("fixture sheet parses")
}

pub fn object(name: &str, x: f32, y: f32, width: f32, height: f32) -> MapObject {
    MapObject {
        name: name.to_string(),
        x,
        y,
        width,
        height,
    }
}

/// A map with the given boundary objects and a player spawn at `spawn`.
pub fn map_with(boundaries: Vec<MapObject>, spawn: (f32, f32)) -> MapFile {
    MapFile {
        layers: vec![
            MapLayer {
                name: "ground".to_string(),
                objects: Vec::new(),
            },
            MapLayer {
                name: BOUNDARY_LAYER.to_string(),
                objects: boundaries,
            },
            MapLayer {
                name: SPAWN_LAYER.to_string(),
                objects: vec![object("player", spawn.0, spawn.1, 0.0, 0.0)],
            },
        ],
    }
}

/// Records every service call instead of producing sound or UI.
#[derive(Debug, Default)]
pub struct RecordingServices {
    pub sounds: Vec<(String, f32)>,
    pub music: Vec<(String, f32)>,
    pub dialogues: Vec<(String, String)>,
}

impl SceneServices for RecordingServices {
    fn play_sound(&mut self, name: &str, volume: f32) {
        self.sounds.push((name.to_string(), volume));
    }

    fn play_music(&mut self, name: &str, volume: f32) {
        self.music.push((name.to_string(), volume));
    }

    fn open_dialogue(&mut self, zone: &str, text: &str) {
        self.dialogues.push((zone.to_string(), text.to_string()));
    }
}
