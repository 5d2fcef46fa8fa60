//! Sprite-sheet animation: a sheet is an image sliced into a uniform frame grid,
//! and a clip is a run of frame indices played at a fixed rate.
//!
//! Timing is integer microseconds so clip playback advances identically on every
//! fixed step regardless of platform float behaviour.
//!
//! JSON form:
//!
//! ```json
//! {
//!   "version": "0.1",
//!   "sheet_id": "hero",
//!   "image": "assets/spritesheet.png",
//!   "slice_x": 39,
//!   "slice_y": 31,
//!   "anims": {
//!     "idle-down": 952,
//!     "walk-down": { "from": 952, "to": 955, "loop": true, "speed": 8 }
//!   }
//! }
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const DEFAULT_CLIP_SPEED: u32 = 10;
/// One frame per microsecond; faster clips would have a zero frame duration.
const MAX_CLIP_SPEED: u32 = 1_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub frames: Vec<u32>,
    pub looping: bool,
    pub frame_duration_us: u64,
}

#[derive(Debug, Clone)]
pub struct SpriteSheet {
    pub sheet_id: String,
    pub image: String,
    pub slice_x: u32,
    pub slice_y: u32,
    frame_count: u32,
    clips: HashMap<String, AnimationClip>,
}

impl SpriteSheet {
    pub fn clip(&self, name: &str) -> Option<&AnimationClip> {
        self.clips.get(name)
    }

    pub fn has_clip(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Normalised `[u0, v0, u1, v1]` of a frame, row-major from the top-left.
    pub fn frame_uv(&self, frame: u32) -> [f32; 4] {
        let col = frame % self.slice_x;
        let row = frame / self.slice_x;
        let fw = 1.0 / self.slice_x as f32;
        let fh = 1.0 / self.slice_y as f32;
        [
            col as f32 * fw,
            row as f32 * fh,
            (col + 1) as f32 * fw,
            (row + 1) as f32 * fh,
        ]
    }

    /// Pixel size of one frame for an image of `image_size`.
    pub fn frame_size_px(&self, image_size: (u32, u32)) -> (f32, f32) {
        (
            image_size.0 as f32 / self.slice_x as f32,
            image_size.1 as f32 / self.slice_y as f32,
        )
    }

    /// Fail unless every clip in `names` is defined.
    pub fn require_clips(&self, names: &[&str]) -> Result<(), String> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| !self.has_clip(name))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "Sprite sheet '{}' is missing clips: {}",
                self.sheet_id,
                missing.join(", ")
            ))
        }
    }
}

/// Playback cursor for one entity's current clip.
#[derive(Debug, Clone)]
pub struct AnimationState {
    pub clip_name: String,
    pub frame_index: usize,
    pub elapsed_us: u64,
    pub finished: bool,
}

impl AnimationState {
    pub fn new(clip_name: &str) -> Self {
        Self {
            clip_name: clip_name.to_string(),
            frame_index: 0,
            elapsed_us: 0,
            finished: false,
        }
    }

    /// Advance by `dt_us` and return the sheet frame to draw.
    pub fn tick(&mut self, dt_us: u64, clip: &AnimationClip) -> u32 {
        if clip.frames.is_empty() {
            return 0;
        }
        if self.finished || clip.frames.len() == 1 {
            return self.current_frame(clip);
        }

        let frame_duration_us = clip.frame_duration_us.max(1);
        self.elapsed_us += dt_us;
        while self.elapsed_us >= frame_duration_us {
            self.elapsed_us -= frame_duration_us;
            self.frame_index += 1;

            if self.frame_index >= clip.frames.len() {
                if clip.looping {
                    self.frame_index = 0;
                } else {
                    self.frame_index = clip.frames.len() - 1;
                    self.elapsed_us = 0;
                    self.finished = true;
                    break;
                }
            }
        }

        clip.frames[self.frame_index]
    }

    pub fn current_frame(&self, clip: &AnimationClip) -> u32 {
        clip.frames
            .get(self.frame_index)
            .or(clip.frames.last())
            .copied()
            .unwrap_or(0)
    }
}

// --- JSON deserialization types (private) ---

#[derive(Debug, Deserialize)]
struct SpriteSheetJson {
    version: String,
    sheet_id: String,
    image: String,
    slice_x: u32,
    slice_y: u32,
    anims: HashMap<String, ClipJson>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClipJson {
    Frame(u32),
    Range {
        from: u32,
        to: u32,
        #[serde(rename = "loop", default)]
        looping: bool,
        #[serde(default = "default_speed")]
        speed: u32,
    },
}

impl ClipJson {
    fn into_clip(self) -> AnimationClip {
        match self {
            ClipJson::Frame(frame) => AnimationClip {
                frames: vec![frame],
                looping: false,
                frame_duration_us: 1_000_000 / DEFAULT_CLIP_SPEED as u64,
            },
            ClipJson::Range {
                from,
                to,
                looping,
                speed,
            } => {
                let frames = if from <= to {
                    (from..=to).collect()
                } else {
                    (to..=from).rev().collect()
                };
                AnimationClip {
                    frames,
                    looping,
                    frame_duration_us: 1_000_000 / speed as u64,
                }
            }
        }
    }
}

pub fn load_sprite_sheet(path: &Path) -> Result<SpriteSheet, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read sprite sheet {}: {e}", path.display()))?;
    let sheet = parse_sprite_sheet(&raw)
        .map_err(|e| format!("Sprite sheet {}: {e}", path.display()))?;
    log::info!(
        "Loaded sprite sheet '{}' ({} frames) from {}",
        sheet.sheet_id,
        sheet.frame_count(),
        path.display()
    );
    Ok(sheet)
}

pub fn parse_sprite_sheet(raw: &str) -> Result<SpriteSheet, String> {
    let json: SpriteSheetJson =
        serde_json::from_str(raw).map_err(|e| format!("failed to parse JSON: {e}"))?;
    let frame_count = validate_sprite_sheet_json(&json)?;

    let clips = json
        .anims
        .into_iter()
        .map(|(name, clip)| (name, clip.into_clip()))
        .collect();

    Ok(SpriteSheet {
        sheet_id: json.sheet_id,
        image: json.image,
        slice_x: json.slice_x,
        slice_y: json.slice_y,
        frame_count,
        clips,
    })
}

/// Returns the number of frames in the slice grid.
fn validate_sprite_sheet_json(json: &SpriteSheetJson) -> Result<u32, String> {
    if json.version != "0.1" {
        return Err(format!(
            "Sprite sheet validation failed: unsupported version '{}'",
            json.version
        ));
    }
    if json.slice_x == 0 || json.slice_y == 0 {
        return Err("Sprite sheet validation failed: slice_x and slice_y must be > 0".to_string());
    }

    let frame_count = json
        .slice_x
        .checked_mul(json.slice_y)
        .ok_or_else(|| "Sprite sheet validation failed: slice grid too large".to_string())?;
    for (name, clip) in &json.anims {
        let (first, last, speed) = match clip {
            ClipJson::Frame(frame) => (*frame, *frame, DEFAULT_CLIP_SPEED),
            ClipJson::Range {
                from, to, speed, ..
            } => (*from, *to, *speed),
        };
        if speed == 0 {
            return Err(format!(
                "Sprite sheet validation failed: clip '{}' has zero speed",
                name
            ));
        }
        if speed > MAX_CLIP_SPEED {
            return Err(format!(
                "Sprite sheet validation failed: clip '{}' speed {} exceeds {} fps",
                name, speed, MAX_CLIP_SPEED
            ));
        }
        if first.max(last) >= frame_count {
            return Err(format!(
                "Sprite sheet validation failed: clip '{}' references frame {} but the sheet has {} frames",
                name,
                first.max(last),
                frame_count
            ));
        }
    }
    Ok(frame_count)
}

const fn default_speed() -> u32 {
    DEFAULT_CLIP_SPEED
}
