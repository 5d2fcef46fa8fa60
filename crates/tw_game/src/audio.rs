use kira::{
    manager::{backend::DefaultBackend, AudioManager, AudioManagerSettings},
    sound::static_sound::{StaticSoundData, StaticSoundHandle, StaticSoundSettings},
    tween::Tween,
    Volume,
};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

const MUSIC_FADE_OUT: Duration = Duration::from_millis(500);

/// Named sound clips played through kira. Without an audio device every call
/// is a no-op, so the game still runs.
pub struct AudioContext {
    manager: Option<AudioManager>,
    sounds: HashMap<String, StaticSoundData>,
    active_music: Option<StaticSoundHandle>,
}

impl AudioContext {
    pub fn new() -> Self {
        let manager = match AudioManager::<DefaultBackend>::new(AudioManagerSettings::default()) {
            Ok(manager) => Some(manager),
            Err(e) => {
                log::warn!("Failed to initialize audio manager: {e}. Audio disabled.");
                None
            }
        };
        Self {
            manager,
            sounds: HashMap::new(),
            active_music: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.manager.is_some()
    }

    /// Decode a sound file into memory under `name`. Failures are logged.
    pub fn load_sound(&mut self, name: &str, path: &Path) {
        match StaticSoundData::from_file(path) {
            Ok(sound) => {
                log::info!("Loaded sound '{name}' from {}", path.display());
                self.sounds.insert(name.to_string(), sound);
            }
            Err(e) => log::warn!(
                "Failed to load sound '{name}' from {}: {e}",
                path.display()
            ),
        }
    }

    pub fn play(&mut self, name: &str, volume: f32) {
        let Some(manager) = self.manager.as_mut() else {
            return;
        };
        let Some(data) = self.sounds.get(name) else {
            log::warn!("Sound '{name}' is not loaded");
            return;
        };
        let mut settings = StaticSoundSettings::new();
        settings.volume = Volume::Amplitude(volume.clamp(0.0, 2.0) as f64).into();
        if let Err(e) = manager.play(data.clone().with_settings(settings)) {
            log::warn!("Failed to play sound '{name}': {e}");
        }
    }

    /// Start `name` looping, replacing any music already playing.
    pub fn play_music(&mut self, name: &str, volume: f32) {
        let Some(manager) = self.manager.as_mut() else {
            return;
        };
        let Some(data) = self.sounds.get(name) else {
            log::warn!("Music '{name}' is not loaded");
            return;
        };
        if let Some(mut handle) = self.active_music.take() {
            let _ = handle.stop(Tween {
                duration: MUSIC_FADE_OUT,
                ..Default::default()
            });
        }

        let mut settings = StaticSoundSettings::new().loop_region(0.0..);
        settings.volume = Volume::Amplitude(volume.clamp(0.0, 1.0) as f64).into();
        match manager.play(data.clone().with_settings(settings)) {
            Ok(handle) => {
                log::info!("Music '{name}' playing at volume {volume:.2}");
                self.active_music = Some(handle);
            }
            Err(e) => log::warn!("Failed to play music '{name}': {e}"),
        }
    }
}

impl Default for AudioContext {
    fn default() -> Self {
        Self::new()
    }
}
