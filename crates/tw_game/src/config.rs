use serde::Deserialize;
use std::fs;
use std::path::Path;
use tw_platform::window::PlatformConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    #[serde(default = "default_map_path")]
    pub map: String,
    #[serde(default = "default_map_image_path")]
    pub map_image: String,
    #[serde(default = "default_sprite_sheet_path")]
    pub sprite_sheet: String,
    #[serde(default = "default_dialogue_path")]
    pub dialogue: String,
    #[serde(default = "default_music_path")]
    pub music: String,
    #[serde(default = "default_ui_sound_path")]
    pub ui_sound: String,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f32,
    /// World position of the map's top-left corner before scaling.
    #[serde(default)]
    pub map_origin: [f32; 2],
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_music_volume")]
    pub music_volume: f32,
    /// How far above the player the camera centres, in world units.
    #[serde(default = "default_camera_bias_y")]
    pub camera_bias_y: f32,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub player: PlayerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WindowConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlayerConfig {
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Collider centre relative to the sprite centre, in sprite pixels.
    #[serde(default = "default_collider_offset")]
    pub collider_offset: [f32; 2],
    #[serde(default = "default_collider_size")]
    pub collider_size: [f32; 2],
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            map: default_map_path(),
            map_image: default_map_image_path(),
            sprite_sheet: default_sprite_sheet_path(),
            dialogue: default_dialogue_path(),
            music: default_music_path(),
            ui_sound: default_ui_sound_path(),
            scale_factor: default_scale_factor(),
            map_origin: [0.0, 0.0],
            background: default_background(),
            music_volume: default_music_volume(),
            camera_bias_y: default_camera_bias_y(),
            window: WindowConfig::default(),
            player: PlayerConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            collider_offset: default_collider_offset(),
            collider_size: default_collider_size(),
        }
    }
}

impl GameConfig {
    pub fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            title: self.window.title.clone(),
            width: self.window.width,
            height: self.window.height,
        }
    }

    /// Background colour as sRGB components in `0.0..=1.0`.
    pub fn background_rgb(&self) -> Result<[f32; 3], String> {
        parse_hex_color(&self.background)
    }
}

/// Load the game config, falling back to defaults when the file is absent.
pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return Ok(GameConfig::default());
    }
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config)?;
    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

pub fn validate_config(config: &GameConfig) -> Result<(), String> {
    if !(config.scale_factor > 0.0) {
        return Err(format!(
            "Config validation failed: scale_factor must be > 0 (got {})",
            config.scale_factor
        ));
    }
    if !(config.player.speed > 0.0) {
        return Err(format!(
            "Config validation failed: player.speed must be > 0 (got {})",
            config.player.speed
        ));
    }
    let [w, h] = config.player.collider_size;
    if !(w > 0.0 && h > 0.0) {
        return Err(format!(
            "Config validation failed: player.collider_size must be positive (got {w}x{h})"
        ));
    }
    if !(0.0..=1.0).contains(&config.music_volume) {
        return Err(format!(
            "Config validation failed: music_volume must be within 0..=1 (got {})",
            config.music_volume
        ));
    }
    if config.window.width == 0 || config.window.height == 0 {
        return Err("Config validation failed: window size must be non-zero".to_string());
    }
    parse_hex_color(&config.background)
        .map_err(|e| format!("Config validation failed: background {e}"))?;
    Ok(())
}

/// Parse `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(raw: &str) -> Result<[f32; 3], String> {
    let hex = raw.strip_prefix('#').unwrap_or(raw);
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(format!("'{raw}' is not a #rrggbb colour"));
    }
    let mut rgb = [0.0f32; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        let byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|_| format!("'{raw}' is not a #rrggbb colour"))?;
        *channel = byte as f32 / 255.0;
    }
    Ok(rgb)
}

fn default_map_path() -> String {
    "assets/map.json".to_string()
}

fn default_map_image_path() -> String {
    "assets/map.png".to_string()
}

fn default_sprite_sheet_path() -> String {
    "assets/spritesheet.json".to_string()
}

fn default_dialogue_path() -> String {
    "assets/dialogue.json".to_string()
}

fn default_music_path() -> String {
    "assets/music.mp3".to_string()
}

fn default_ui_sound_path() -> String {
    "assets/pickupCoin.wav".to_string()
}

const fn default_scale_factor() -> f32 {
    4.0
}

fn default_background() -> String {
    "#311047".to_string()
}

const fn default_music_volume() -> f32 {
    0.5
}

const fn default_camera_bias_y() -> f32 {
    100.0
}

fn default_title() -> String {
    "Tilewalk".to_string()
}

const fn default_width() -> u32 {
    1280
}

const fn default_height() -> u32 {
    720
}

const fn default_speed() -> f32 {
    250.0
}

const fn default_collider_offset() -> [f32; 2] {
    [0.0, 3.0]
}

const fn default_collider_size() -> [f32; 2] {
    [10.0, 10.0]
}
