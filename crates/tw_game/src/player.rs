use glam::Vec2;
use tw_core::animation::{AnimationState, SpriteSheet};

use crate::collision::Aabb;
use crate::config::PlayerConfig;

/// Every clip the player sprite sheet must define.
pub const PLAYER_CLIPS: [&str; 6] = [
    "idle-down",
    "walk-down",
    "idle-side",
    "walk-side",
    "idle-up",
    "walk-up",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn walk_clip(self) -> &'static str {
        match self {
            Direction::Up => "walk-up",
            Direction::Down => "walk-down",
            Direction::Left | Direction::Right => "walk-side",
        }
    }

    pub fn idle_clip(self) -> &'static str {
        match self {
            Direction::Up => "idle-up",
            Direction::Down => "idle-down",
            Direction::Left | Direction::Right => "idle-side",
        }
    }

    /// Unit step in y-down world space.
    pub fn unit(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }

    /// The side sheet faces right; left is drawn mirrored. Vertical facings
    /// leave the flip untouched.
    pub fn flip_x(self) -> Option<bool> {
        match self {
            Direction::Left => Some(true),
            Direction::Right => Some(false),
            Direction::Up | Direction::Down => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// A player built from config but not yet placed in the scene.
#[derive(Debug, Clone)]
pub struct PendingPlayer {
    speed: f32,
    collider_offset: Vec2,
    collider_size: Vec2,
}

impl PendingPlayer {
    /// Collider geometry is given in sprite pixels and scaled to world units.
    pub fn create(config: &PlayerConfig, scale_factor: f32) -> Self {
        Self {
            speed: config.speed,
            collider_offset: Vec2::from(config.collider_offset) * scale_factor,
            collider_size: Vec2::from(config.collider_size) * scale_factor,
        }
    }

    /// Place the player. Consumes the pending value so it can only spawn once.
    pub fn spawn(self, position: Vec2) -> Player {
        let direction = Direction::Down;
        Player {
            position,
            direction,
            speed: self.speed,
            in_dialogue: false,
            flip_x: false,
            animation: AnimationState::new(direction.idle_clip()),
            current_frame: None,
            collider_offset: self.collider_offset,
            collider_size: self.collider_size,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    /// Sprite centre in world space.
    pub position: Vec2,
    pub direction: Direction,
    pub speed: f32,
    /// Set while a dialogue is on screen; gates input and dialogue triggers.
    pub in_dialogue: bool,
    pub flip_x: bool,
    animation: AnimationState,
    current_frame: Option<u32>,
    collider_offset: Vec2,
    collider_size: Vec2,
}

impl Player {
    pub fn animation(&self) -> &str {
        &self.animation.clip_name
    }

    /// Switch clips, keeping playback position when the clip is already active.
    pub fn play(&mut self, clip: &str) {
        if self.animation.clip_name != clip {
            self.animation = AnimationState::new(clip);
            self.current_frame = None;
        }
    }

    /// Face `direction` and run its walk clip.
    pub fn face(&mut self, direction: Direction) {
        if let Some(flip) = direction.flip_x() {
            self.flip_x = flip;
        }
        self.play(direction.walk_clip());
        self.direction = direction;
    }

    /// Switch to the idle clip for the last facing.
    pub fn stop(&mut self) {
        self.animation = AnimationState::new(self.direction.idle_clip());
        self.current_frame = None;
    }

    pub fn collider(&self) -> Aabb {
        let center = self.position + self.collider_offset;
        Aabb {
            center_x: center.x,
            center_y: center.y,
            half_w: self.collider_size.x * 0.5,
            half_h: self.collider_size.y * 0.5,
        }
    }

    pub fn set_collider(&mut self, aabb: Aabb) {
        self.position = Vec2::new(aabb.center_x, aabb.center_y) - self.collider_offset;
    }

    /// Displacement that walks toward `target` by at most `max_step`, landing
    /// exactly on it when closer than that.
    pub fn step_toward(&self, target: Vec2, max_step: f32) -> Vec2 {
        let diff = target - self.position;
        if diff.length() <= max_step {
            diff
        } else {
            diff.normalize_or_zero() * max_step
        }
    }

    pub fn tick_animation(&mut self, dt_us: u64, sheet: &SpriteSheet) {
        match sheet.clip(&self.animation.clip_name) {
            Some(clip) => self.current_frame = Some(self.animation.tick(dt_us, clip)),
            None => self.current_frame = None,
        }
    }

    /// Sheet frame to draw, once the current clip has been ticked.
    pub fn frame(&self, sheet: &SpriteSheet) -> Option<u32> {
        self.current_frame.or_else(|| {
            sheet
                .clip(&self.animation.clip_name)
                .map(|clip| self.animation.current_frame(clip))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawned(at: Vec2) -> Player {
        PendingPlayer::create(&PlayerConfig::default(), 4.0).spawn(at)
    }

    #[test]
    fn spawned_player_starts_idle_facing_down() {
        let player = spawned(Vec2::new(10.0, 20.0));
        assert_eq!(player.position, Vec2::new(10.0, 20.0));
        assert_eq!(player.direction, Direction::Down);
        assert_eq!(player.animation(), "idle-down");
        assert_eq!(player.speed, 250.0);
        assert!(!player.in_dialogue);
        assert!(!player.flip_x);
    }

    #[test]
    fn collider_is_scaled_and_offset() {
        let player = spawned(Vec2::new(100.0, 100.0));
        let aabb = player.collider();
        assert_eq!((aabb.center_x, aabb.center_y), (100.0, 112.0));
        assert_eq!((aabb.half_w, aabb.half_h), (20.0, 20.0));

        let mut moved = player.clone();
        moved.set_collider(Aabb { center_x: 50.0, ..aabb });
        assert_eq!(moved.position, Vec2::new(50.0, 100.0));
    }

    #[test]
    fn face_sets_flip_only_for_horizontal_directions() {
        let mut player = spawned(Vec2::ZERO);
        player.face(Direction::Left);
        assert!(player.flip_x);
        assert_eq!(player.animation(), "walk-side");

        player.face(Direction::Up);
        assert!(player.flip_x, "vertical facing keeps the previous flip");
        assert_eq!(player.animation(), "walk-up");

        player.face(Direction::Right);
        assert!(!player.flip_x);
        assert_eq!(player.direction, Direction::Right);
    }

    #[test]
    fn stop_picks_idle_for_last_facing() {
        let mut player = spawned(Vec2::ZERO);
        for (direction, idle) in [
            (Direction::Down, "idle-down"),
            (Direction::Up, "idle-up"),
            (Direction::Left, "idle-side"),
            (Direction::Right, "idle-side"),
        ] {
            player.face(direction);
            player.stop();
            assert_eq!(player.animation(), idle);
            player.stop();
            assert_eq!(player.animation(), idle);
        }
    }

    #[test]
    fn step_toward_snaps_when_close() {
        let player = spawned(Vec2::new(0.0, 0.0));
        let far = player.step_toward(Vec2::new(30.0, 40.0), 10.0);
        assert!((far - Vec2::new(6.0, 8.0)).length() < 1e-5);
        let near = player.step_toward(Vec2::new(3.0, 4.0), 10.0);
        assert_eq!(near, Vec2::new(3.0, 4.0));
    }
}
