//! The `main` scene: map boundaries, the player, dialogue zones and the
//! follow camera. All side effects that leave the scene (sound, music, the
//! dialogue box) go through [`SceneServices`].

use glam::Vec2;
use tw_core::animation::SpriteSheet;
use tw_core::input::{InputState, MouseBtn};
use tw_render::camera::Camera2D;

use crate::collision::{Aabb, ColliderSet, ContactTracker};
use crate::config::GameConfig;
use crate::controls::{click_angle_deg, click_direction, fit_scale, held_direction};
use crate::dialogue::DialogueTable;
use crate::map::{MapFile, BOUNDARY_LAYER, PLAYER_SPAWN, SPAWN_LAYER};
use crate::player::{PendingPlayer, Player, PLAYER_CLIPS};

pub const SCENE_NAME: &str = "main";
pub const MUSIC: &str = "music";
pub const UI_SOUND: &str = "ui";

/// Colliders closer than this count as touching the player.
const CONTACT_MARGIN: f32 = 0.5;

/// What the scene needs from the engine around it.
pub trait SceneServices {
    fn play_sound(&mut self, name: &str, volume: f32);
    fn play_music(&mut self, name: &str, volume: f32);
    /// Show `text` for `zone`. The caller reports the close back through
    /// [`MainScene::finish_dialogue`].
    fn open_dialogue(&mut self, zone: &str, text: &str);
}

/// Named boundaries trigger dialogue; unnamed ones and the `boundary` and
/// `wall` sentinels only block movement.
pub fn is_dialogue_zone(name: &str) -> bool {
    !name.is_empty() && name != "boundary" && name != "wall"
}

#[derive(Debug, Default)]
pub struct LayerWalk {
    pub colliders: ColliderSet,
    /// Distinct dialogue zone names in map order.
    pub dialogue_zones: Vec<String>,
    pub spawn: Option<Vec2>,
}

/// Build colliders and find the spawn point. Map coordinates are offset by
/// `origin` and multiplied by `scale` to get world coordinates.
pub fn walk_layers(map: &MapFile, origin: Vec2, scale: f32) -> Result<LayerWalk, String> {
    let mut walk = LayerWalk::default();
    for layer in &map.layers {
        match layer.name.as_str() {
            BOUNDARY_LAYER => {
                for object in &layer.objects {
                    let min = (origin + Vec2::new(object.x, object.y)) * scale;
                    let aabb = Aabb::from_min_size(
                        min.x,
                        min.y,
                        object.width * scale,
                        object.height * scale,
                    );
                    walk.colliders.push(&object.name, aabb);
                    if is_dialogue_zone(&object.name)
                        && !walk.dialogue_zones.contains(&object.name)
                    {
                        walk.dialogue_zones.push(object.name.clone());
                    }
                }
            }
            SPAWN_LAYER => {
                for object in layer.objects.iter().filter(|o| o.name == PLAYER_SPAWN) {
                    if walk.spawn.is_some() {
                        return Err(format!(
                            "Scene '{SCENE_NAME}': more than one '{PLAYER_SPAWN}' object in layer '{SPAWN_LAYER}'"
                        ));
                    }
                    walk.spawn = Some((origin + Vec2::new(object.x, object.y)) * scale);
                }
            }
            _ => {}
        }
    }
    Ok(walk)
}

pub struct MainScene {
    player: Player,
    colliders: ColliderSet,
    dialogue: DialogueTable,
    sheet: SpriteSheet,
    contacts: ContactTracker,
    camera: Camera2D,
    camera_bias_y: f32,
    music_volume: f32,
}

impl MainScene {
    pub fn build(
        map: &MapFile,
        dialogue: DialogueTable,
        sheet: SpriteSheet,
        config: &GameConfig,
        viewport: (u32, u32),
    ) -> Result<Self, String> {
        sheet.require_clips(&PLAYER_CLIPS)?;

        let origin = Vec2::from(config.map_origin);
        let walk = walk_layers(map, origin, config.scale_factor)?;
        if map.layer(BOUNDARY_LAYER).is_none() {
            log::warn!("Scene '{SCENE_NAME}': map has no '{BOUNDARY_LAYER}' layer");
        } else if walk.colliders.is_empty() {
            log::warn!("Scene '{SCENE_NAME}': layer '{BOUNDARY_LAYER}' has no objects");
        }

        let missing: Vec<&str> = walk
            .dialogue_zones
            .iter()
            .map(String::as_str)
            .filter(|zone| !dialogue.contains(zone))
            .collect();
        if !missing.is_empty() {
            return Err(format!(
                "Scene '{SCENE_NAME}': dialogue zones without dialogue entries: {}",
                missing.join(", ")
            ));
        }

        let Some(spawn) = walk.spawn else {
            return Err(format!(
                "Scene '{SCENE_NAME}': no '{PLAYER_SPAWN}' object in layer '{SPAWN_LAYER}'"
            ));
        };

        let player = PendingPlayer::create(&config.player, config.scale_factor).spawn(spawn);
        log::info!(
            "Scene '{SCENE_NAME}' built: {} colliders, {} dialogue zones, player at ({:.1}, {:.1})",
            walk.colliders.len(),
            walk.dialogue_zones.len(),
            spawn.x,
            spawn.y
        );

        let mut scene = Self {
            player,
            colliders: walk.colliders,
            dialogue,
            sheet,
            contacts: ContactTracker::new(),
            camera: Camera2D::new(viewport.0, viewport.1),
            camera_bias_y: config.camera_bias_y,
            music_volume: config.music_volume,
        };
        scene.follow_camera();
        Ok(scene)
    }

    pub fn enter(&mut self, services: &mut dyn SceneServices) {
        log::info!("Entering scene '{SCENE_NAME}'");
        services.play_music(MUSIC, self.music_volume);
    }

    /// Advance one fixed step of `dt_us` microseconds.
    pub fn update(&mut self, input: &InputState, dt_us: u64, services: &mut dyn SceneServices) {
        let dt = dt_us as f32 / 1_000_000.0;
        let max_step = self.player.speed * dt;
        let mut delta = Vec2::ZERO;

        if input.is_mouse_held(MouseBtn::Left) && !self.player.in_dialogue {
            let (mx, my) = input.mouse_position;
            let target = self.camera.screen_to_world(Vec2::new(mx as f32, my as f32));
            delta = self.player.step_toward(target, max_step);
            let angle = click_angle_deg(self.player.position + delta, target);
            if let Some(direction) = click_direction(angle, self.player.animation()) {
                self.player.face(direction);
            }
        }

        if input.any_key_just_released() || input.any_mouse_just_released() {
            self.player.stop();
        }

        if !self.player.in_dialogue {
            if let Some(direction) = held_direction(input) {
                self.player.face(direction);
                delta += direction.unit() * max_step;
            }
        }

        if delta != Vec2::ZERO {
            let moved = self
                .colliders
                .move_and_collide(self.player.collider(), delta.x, delta.y);
            self.player.set_collider(moved);
        }

        let touching = self
            .colliders
            .contacts(&self.player.collider(), CONTACT_MARGIN);
        let began: Vec<String> = self
            .contacts
            .update(&touching)
            .into_iter()
            .filter_map(|index| self.colliders.get(index))
            .map(|collider| collider.tag.clone())
            .filter(|tag| is_dialogue_zone(tag))
            .collect();
        for zone in &began {
            self.on_boundary_contact(zone, services);
        }

        self.player.tick_animation(dt_us, &self.sheet);
        self.follow_camera();
    }

    /// Collision handler for a dialogue zone. Ignored while a dialogue is open.
    pub fn on_boundary_contact(&mut self, zone: &str, services: &mut dyn SceneServices) {
        if self.player.in_dialogue {
            return;
        }
        let Some(text) = self.dialogue.get(zone) else {
            log::warn!("No dialogue entry for zone '{zone}'");
            return;
        };
        services.play_sound(UI_SOUND, 1.0);
        self.player.in_dialogue = true;
        log::info!("Dialogue '{zone}' opened");
        services.open_dialogue(zone, text);
    }

    /// Called when the dialogue box is dismissed.
    pub fn finish_dialogue(&mut self) {
        self.player.in_dialogue = false;
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.camera.viewport = (width, height);
        self.follow_camera();
    }

    fn follow_camera(&mut self) {
        let (width, height) = self.camera.viewport;
        self.camera.scale = fit_scale(width, height);
        self.camera.position = self.player.position - Vec2::new(0.0, self.camera_bias_y);
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    pub fn sprite_sheet(&self) -> &SpriteSheet {
        &self.sheet
    }
}
