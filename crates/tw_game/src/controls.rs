//! Input-to-direction mapping for keyboard walking and click pathing.

use glam::Vec2;
use tw_core::input::{InputState, Key};

use crate::player::Direction;

/// Inner edge of the vertical bands, in degrees.
pub const ANGLE_LOWER_BOUND: f32 = 50.0;
/// Outer edge of the vertical bands, in degrees.
pub const ANGLE_UPPER_BOUND: f32 = 125.0;

/// Angle of the vector from `target` to `player`, in degrees within
/// `-180..=180`. In y-down space a target above the player gives +90 and a
/// target to the left gives 0.
pub fn click_angle_deg(player: Vec2, target: Vec2) -> f32 {
    (player.y - target.y).atan2(player.x - target.x).to_degrees()
}

/// Pick a facing for a click at `angle`, or `None` when nothing should change.
///
/// The four checks run in order and the first match wins. Up and down only
/// match when their walk clip is not already playing; otherwise the remaining
/// checks cannot match either, so angles inside an active vertical band (and
/// the exact band edges) leave the player untouched.
pub fn click_direction(angle: f32, current_clip: &str) -> Option<Direction> {
    if angle > ANGLE_LOWER_BOUND && angle < ANGLE_UPPER_BOUND && current_clip != "walk-up" {
        return Some(Direction::Up);
    }
    if angle < -ANGLE_LOWER_BOUND && angle > -ANGLE_UPPER_BOUND && current_clip != "walk-down" {
        return Some(Direction::Down);
    }
    if angle.abs() > ANGLE_UPPER_BOUND {
        return Some(Direction::Right);
    }
    if angle.abs() < ANGLE_LOWER_BOUND {
        return Some(Direction::Left);
    }
    None
}

/// The single held arrow key, by priority right, left, up, down. `None` when
/// zero or several are held.
pub fn held_direction(input: &InputState) -> Option<Direction> {
    let held = [
        (Key::Right, Direction::Right),
        (Key::Left, Direction::Left),
        (Key::Up, Direction::Up),
        (Key::Down, Direction::Down),
    ];
    let mut pressed = held.iter().filter(|(key, _)| input.is_held(*key));
    let first = pressed.next();
    if pressed.next().is_some() {
        return None;
    }
    first.map(|&(_, direction)| direction)
}

/// Camera zoom for a viewport: 1.5 for landscape or square, 1.0 for portrait.
pub fn fit_scale(width: u32, height: u32) -> f32 {
    if height == 0 {
        return 1.0;
    }
    if width as f32 / height as f32 >= 1.0 {
        1.5
    } else {
        1.0
    }
}
