//! Static boundary colliders and the player's movement against them.
//!
//! Movement is axis-separable move-and-slide: X is resolved first, then Y from
//! the corrected X, so pushing diagonally into a wall slides along it instead
//! of sticking. Colliders are plain rectangles in y-down world space.

use std::collections::HashSet;

/// Tolerance used to shrink the cross-axis extent when testing a sweep, so a
/// box resting flush against a wall can still slide along it.
const SWEEP_EPS: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center_x: f32,
    pub center_y: f32,
    pub half_w: f32,
    pub half_h: f32,
}

impl Aabb {
    /// Build from a top-left corner and a size.
    pub fn from_min_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            center_x: x + width * 0.5,
            center_y: y + height * 0.5,
            half_w: width * 0.5,
            half_h: height * 0.5,
        }
    }

    pub fn min_x(&self) -> f32 {
        self.center_x - self.half_w
    }

    pub fn max_x(&self) -> f32 {
        self.center_x + self.half_w
    }

    pub fn min_y(&self) -> f32 {
        self.center_y - self.half_h
    }

    pub fn max_y(&self) -> f32 {
        self.center_y + self.half_h
    }

    /// True when the two boxes overlap or lie within `margin` of each other.
    pub fn touches(&self, other: &Aabb, margin: f32) -> bool {
        self.min_x() < other.max_x() + margin
            && self.max_x() > other.min_x() - margin
            && self.min_y() < other.max_y() + margin
            && self.max_y() > other.min_y() - margin
    }

    fn spans_y(&self, other: &Aabb) -> bool {
        self.min_y() + SWEEP_EPS < other.max_y() && self.max_y() - SWEEP_EPS > other.min_y()
    }

    fn spans_x(&self, other: &Aabb) -> bool {
        self.min_x() + SWEEP_EPS < other.max_x() && self.max_x() - SWEEP_EPS > other.min_x()
    }
}

#[derive(Debug, Clone)]
pub struct BoundaryCollider {
    /// The source object's name; empty for unnamed boundaries.
    pub tag: String,
    pub aabb: Aabb,
}

#[derive(Debug, Clone, Default)]
pub struct ColliderSet {
    colliders: Vec<BoundaryCollider>,
}

impl ColliderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collider and return its index.
    pub fn push(&mut self, tag: &str, aabb: Aabb) -> usize {
        self.colliders.push(BoundaryCollider {
            tag: tag.to_string(),
            aabb,
        });
        self.colliders.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&BoundaryCollider> {
        self.colliders.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundaryCollider> {
        self.colliders.iter()
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Move `aabb` by `(dx, dy)`, x first then y, stopping flush against any
    /// collider in the way so motion slides along walls.
    pub fn move_and_collide(&self, aabb: Aabb, dx: f32, dy: f32) -> Aabb {
        let mut moved = aabb;
        moved.center_x = self.resolve_axis_x(aabb, dx);
        moved.center_y = self.resolve_axis_y(moved, dy);
        moved
    }

    fn resolve_axis_x(&self, aabb: Aabb, dx: f32) -> f32 {
        if dx == 0.0 {
            return aabb.center_x;
        }
        let mut candidate_x = aabb.center_x + dx;
        for collider in &self.colliders {
            let wall = &collider.aabb;
            if !aabb.spans_y(wall) {
                continue;
            }
            if dx > 0.0 {
                // Only walls ahead of the leading edge can block.
                if wall.min_x() >= aabb.max_x() - SWEEP_EPS
                    && candidate_x + aabb.half_w > wall.min_x()
                {
                    candidate_x = candidate_x.min(wall.min_x() - aabb.half_w);
                }
            } else if wall.max_x() <= aabb.min_x() + SWEEP_EPS
                && candidate_x - aabb.half_w < wall.max_x()
            {
                candidate_x = candidate_x.max(wall.max_x() + aabb.half_w);
            }
        }
        // Never push against the direction of travel.
        if dx > 0.0 {
            candidate_x.max(aabb.center_x)
        } else {
            candidate_x.min(aabb.center_x)
        }
    }

    fn resolve_axis_y(&self, aabb: Aabb, dy: f32) -> f32 {
        if dy == 0.0 {
            return aabb.center_y;
        }
        let mut candidate_y = aabb.center_y + dy;
        for collider in &self.colliders {
            let wall = &collider.aabb;
            if !aabb.spans_x(wall) {
                continue;
            }
            if dy > 0.0 {
                if wall.min_y() >= aabb.max_y() - SWEEP_EPS
                    && candidate_y + aabb.half_h > wall.min_y()
                {
                    candidate_y = candidate_y.min(wall.min_y() - aabb.half_h);
                }
            } else if wall.max_y() <= aabb.min_y() + SWEEP_EPS
                && candidate_y - aabb.half_h < wall.max_y()
            {
                candidate_y = candidate_y.max(wall.max_y() + aabb.half_h);
            }
        }
        if dy > 0.0 {
            candidate_y.max(aabb.center_y)
        } else {
            candidate_y.min(aabb.center_y)
        }
    }

    /// Indices of every collider touching `aabb` within `margin`.
    pub fn contacts(&self, aabb: &Aabb, margin: f32) -> Vec<usize> {
        self.colliders
            .iter()
            .enumerate()
            .filter(|(_, collider)| aabb.touches(&collider.aabb, margin))
            .map(|(index, _)| index)
            .collect()
    }
}

/// Turns per-tick contact sets into "contact began" events: a collider is
/// reported once when touching starts and again only after it has stopped.
#[derive(Debug, Default)]
pub struct ContactTracker {
    touching: HashSet<usize>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, current: &[usize]) -> Vec<usize> {
        let began: Vec<usize> = current
            .iter()
            .copied()
            .filter(|index| !self.touching.contains(index))
            .collect();
        self.touching = current.iter().copied().collect();
        began
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_wall() -> ColliderSet {
        let mut set = ColliderSet::new();
        set.push("wall", Aabb::from_min_size(64.0, 0.0, 32.0, 64.0));
        set
    }

    #[test]
    fn move_and_collide_blocks_motion_into_wall() {
        let set = single_wall();
        let start = Aabb::from_min_size(32.0, 16.0, 16.0, 16.0);
        let moved = set.move_and_collide(start, 40.0, 0.0);
        assert!((moved.max_x() - 64.0).abs() < 0.001);
    }

    #[test]
    fn diagonal_motion_slides_along_wall() {
        let set = single_wall();
        let start = Aabb::from_min_size(48.0, 16.0, 16.0, 16.0);
        let moved = set.move_and_collide(start, 10.0, 5.0);
        assert!((moved.center_x - start.center_x).abs() < 0.001);
        assert!((moved.center_y - (start.center_y + 5.0)).abs() < 0.001);
    }

    #[test]
    fn moving_away_from_wall_is_unobstructed() {
        let set = single_wall();
        let start = Aabb::from_min_size(48.0, 16.0, 16.0, 16.0);
        let moved = set.move_and_collide(start, -10.0, 0.0);
        assert!((moved.center_x - (start.center_x - 10.0)).abs() < 0.001);
    }

    #[test]
    fn vertical_motion_stops_at_wall_top() {
        let set = single_wall();
        let start = Aabb::from_min_size(70.0, -40.0, 10.0, 10.0);
        let moved = set.move_and_collide(start, 0.0, 100.0);
        assert!((moved.max_y() - 0.0).abs() < 0.001);
    }

    #[test]
    fn contacts_include_flush_neighbours() {
        let set = single_wall();
        let flush = Aabb::from_min_size(48.0, 16.0, 16.0, 16.0);
        assert_eq!(set.contacts(&flush, 0.5), vec![0]);
        let apart = Aabb::from_min_size(40.0, 16.0, 16.0, 16.0);
        assert!(set.contacts(&apart, 0.5).is_empty());
    }

    #[test]
    fn contact_tracker_reports_once_until_contact_is_lost() {
        let mut tracker = ContactTracker::new();
        assert_eq!(tracker.update(&[2]), vec![2]);
        assert!(tracker.update(&[2]).is_empty());
        assert_eq!(tracker.update(&[2, 5]), vec![5]);
        assert!(tracker.update(&[]).is_empty());
        assert_eq!(tracker.update(&[2]), vec![2]);
    }
}
