//! Scripted input runs for headless scene tests.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tw_core::input::{InputState, Key, MouseBtn};
use tw_core::time::FIXED_DT_US;

use crate::scene::{MainScene, SceneServices};

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt_us")]
    pub fixed_dt_us: u64,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReplayFrame {
    /// Arrow keys held this frame: "left", "right", "up", "down".
    #[serde(default)]
    pub held: Vec<String>,
    /// Left mouse button held at this screen position.
    #[serde(default)]
    pub mouse: Option<[f64; 2]>,
    /// Dismiss the dialogue box after this frame's step.
    #[serde(default)]
    pub close_dialogue: bool,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn expanded_frames(&self) -> Vec<ReplayFrame> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for _ in 0..frame.repeat.max(1) {
                out.push(ReplayFrame {
                    repeat: 1,
                    ..frame.clone()
                });
            }
        }
        out
    }

    /// Drive `scene` through every frame, translating held sets into
    /// press/release edges the way the window loop does.
    pub fn run(
        &self,
        scene: &mut MainScene,
        services: &mut dyn SceneServices,
    ) -> Result<(), String> {
        let mut input = InputState::new();
        for frame in self.expanded_frames() {
            let wanted: HashSet<Key> = frame
                .held
                .iter()
                .map(|name| parse_key(name))
                .collect::<Result<_, _>>()?;
            for key in [Key::Left, Key::Right, Key::Up, Key::Down] {
                if wanted.contains(&key) {
                    input.key_down(key);
                } else {
                    input.key_up(key);
                }
            }
            match frame.mouse {
                Some([x, y]) => {
                    input.mouse_position = (x, y);
                    input.mouse_down(MouseBtn::Left);
                }
                None => input.mouse_up(MouseBtn::Left),
            }

            scene.update(&input, self.fixed_dt_us, services);
            if frame.close_dialogue {
                scene.finish_dialogue();
            }
            input.end_frame();
        }
        Ok(())
    }
}

fn parse_key(name: &str) -> Result<Key, String> {
    match name {
        "left" => Ok(Key::Left),
        "right" => Ok(Key::Right),
        "up" => Ok(Key::Up),
        "down" => Ok(Key::Down),
        other => Err(format!("Replay: unknown key '{other}'")),
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt_us == 0 {
        return Err("Replay validation failed: fixed_dt_us must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    for frame in &replay.frames {
        for name in &frame.held {
            parse_key(name).map_err(|e| format!("Replay validation failed: {e}"))?;
        }
    }
    Ok(())
}

const fn default_dt_us() -> u64 {
    FIXED_DT_US
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::dialogue::DialogueTable;
    use crate::testing::{map_with, object, player_sheet, RecordingServices};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "tw_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn scene_with_tv() -> MainScene {
        // Player collider spans x 180..220; the tv zone starts at x 224.
        let map = map_with(
            vec![
                object("wall", 0.0, 0.0, 16.0, 16.0),
                object("tv", 56.0, 48.0, 10.0, 10.0),
            ],
            (50.0, 50.0),
        );
        MainScene::build(
            &map,
            DialogueTable::from_entries([("tv", "The news is on.")]),
            player_sheet(),
            &GameConfig::default(),
            (800, 600),
        )
        .expect("scene builds")
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "frames": [
                { "held": ["right"], "repeat": 3 },
                { "mouse": [10.0, 20.0] },
                { "close_dialogue": true }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        assert_eq!(replay.fixed_dt_us, FIXED_DT_US);
        let expanded = replay.expanded_frames();
        assert_eq!(expanded.len(), 5);
        assert_eq!(expanded[2].held, vec!["right".to_string()]);
        assert_eq!(expanded[3].mouse, Some([10.0, 20.0]));
        assert!(expanded[4].close_dialogue);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_rejects_unknown_keys() {
        let path = temp_file_path("bad_key");
        fs::write(&path, r#"{ "frames": [ { "held": ["space"] } ] }"#)
            .expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("unknown key should fail");
        assert!(err.contains("unknown key 'space'"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_run_is_deterministic() {
        let replay = ReplaySequence {
            fixed_dt_us: FIXED_DT_US,
            frames: vec![
                ReplayFrame {
                    held: vec!["down".to_string()],
                    repeat: 40,
                    ..Default::default()
                },
                ReplayFrame {
                    mouse: Some([100.0, 80.0]),
                    repeat: 90,
                    ..Default::default()
                },
                ReplayFrame {
                    held: vec!["left".to_string(), "up".to_string()],
                    repeat: 10,
                    ..Default::default()
                },
                ReplayFrame {
                    held: vec!["left".to_string()],
                    repeat: 30,
                    ..Default::default()
                },
            ],
        };

        let mut run_a = scene_with_tv();
        let mut run_b = scene_with_tv();
        let mut services_a = RecordingServices::default();
        let mut services_b = RecordingServices::default();
        replay.run(&mut run_a, &mut services_a).expect("run a");
        replay.run(&mut run_b, &mut services_b).expect("run b");

        let (a, b) = (run_a.player(), run_b.player());
        assert!((a.position - b.position).length() < 0.0001);
        assert_eq!(a.direction, b.direction);
        assert_eq!(a.animation(), b.animation());
        assert_eq!(a.flip_x, b.flip_x);
        assert_eq!(services_a.dialogues, services_b.dialogues);
    }

    #[test]
    fn dialogue_retriggers_only_after_contact_is_broken() {
        let replay = ReplaySequence {
            fixed_dt_us: 100_000,
            frames: vec![
                ReplayFrame {
                    held: vec!["right".to_string()],
                    repeat: 2,
                    ..Default::default()
                },
                ReplayFrame {
                    close_dialogue: true,
                    ..Default::default()
                },
                ReplayFrame {
                    held: vec!["right".to_string()],
                    repeat: 2,
                    ..Default::default()
                },
                ReplayFrame {
                    held: vec!["left".to_string()],
                    repeat: 2,
                    ..Default::default()
                },
                ReplayFrame {
                    held: vec!["right".to_string()],
                    repeat: 3,
                    ..Default::default()
                },
            ],
        };

        let mut scene = scene_with_tv();
        let mut services = RecordingServices::default();
        replay.run(&mut scene, &mut services).expect("run");

        assert_eq!(services.dialogues.len(), 2);
        assert_eq!(services.sounds.len(), 2);
        assert!(scene.player().in_dialogue);
        assert_eq!(scene.player().animation(), "walk-side");
    }
}
