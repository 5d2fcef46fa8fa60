//! Tile-map description exported from a map editor. Only object layers matter
//! here: tile layers are baked into the map image and carry no objects.

use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const BOUNDARY_LAYER: &str = "boundaries";
pub const SPAWN_LAYER: &str = "spawnpoint";
pub const PLAYER_SPAWN: &str = "player";

#[derive(Debug, Deserialize, Clone)]
pub struct MapFile {
    pub layers: Vec<MapLayer>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapLayer {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<MapObject>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MapObject {
    #[serde(default)]
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
}

impl MapFile {
    pub fn layer(&self, name: &str) -> Option<&MapLayer> {
        self.layers.iter().find(|layer| layer.name == name)
    }
}

pub fn load_map_from_path(path: &Path) -> Result<MapFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read map file {}: {e}", path.display()))?;
    let map: MapFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse map JSON {}: {e}", path.display()))?;
    validate_map(&map)?;
    Ok(map)
}

fn validate_map(map: &MapFile) -> Result<(), String> {
    if map.layers.is_empty() {
        return Err("Map validation failed: layers array is empty".to_string());
    }
    for layer in &map.layers {
        for object in &layer.objects {
            let finite = [object.x, object.y, object.width, object.height]
                .iter()
                .all(|v| v.is_finite());
            if !finite {
                return Err(format!(
                    "Map validation failed: object '{}' in layer '{}' has a non-finite coordinate",
                    object.name, layer.name
                ));
            }
            if object.width < 0.0 || object.height < 0.0 {
                return Err(format!(
                    "Map validation failed: object '{}' in layer '{}' has negative size {}x{}",
                    object.name, layer.name, object.width, object.height
                ));
            }
        }
    }
    Ok(())
}
