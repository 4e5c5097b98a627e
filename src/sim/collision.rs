//! Swept circle-vs-circle hit test
//!
//! Danmaku and player both move during a frame. Working in the danmaku's
//! frame of reference, the player's previous position is tested against the
//! segment swept by their relative displacement, which catches fast shots
//! that would jump over the player between two sampled positions.

use glam::Vec2;

use crate::consts::COLLISION_PREFILTER;

/// Squared distance from point P to segment AB
///
/// `ab` is B - A and `ap` is P - A. Uses the cross product for the
/// perpendicular case so no square root is taken.
#[inline]
pub fn point_segment_dist2(ab: Vec2, ap: Vec2) -> f32 {
    let dot = ab.dot(ap);
    if dot <= 0.0 {
        return ap.length_squared();
    }
    let len2 = ab.length_squared();
    if dot >= len2 {
        return (ap - ab).length_squared();
    }
    let cross = ab.perp_dot(ap);
    cross * cross / len2
}

/// One body's motion over the last frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub last: Vec2,
    pub current: Vec2,
    pub radius: f32,
}

/// Whether `shot` touched `target` at any point during the frame
pub fn swept_hit(shot: Motion, target: Motion) -> bool {
    let offset = target.current - shot.current;
    if offset.x.abs() > COLLISION_PREFILTER || offset.y.abs() > COLLISION_PREFILTER {
        return false;
    }
    let ab = (shot.current - shot.last) - (target.current - target.last);
    let ap = target.last - shot.last;
    let reach = shot.radius + target.radius;
    point_segment_dist2(ab, ap) < reach * reach
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still(pos: Vec2, radius: f32) -> Motion {
        Motion {
            last: pos,
            current: pos,
            radius,
        }
    }

    #[test]
    fn test_point_segment_regions() {
        let ab = Vec2::new(10.0, 0.0);
        // Behind A
        assert_eq!(point_segment_dist2(ab, Vec2::new(-3.0, 4.0)), 25.0);
        // Past B
        assert_eq!(point_segment_dist2(ab, Vec2::new(13.0, 4.0)), 25.0);
        // Beside the segment
        assert!((point_segment_dist2(ab, Vec2::new(5.0, 3.0)) - 9.0).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_segment() {
        assert_eq!(point_segment_dist2(Vec2::ZERO, Vec2::new(3.0, 4.0)), 25.0);
    }

    #[test]
    fn test_overlap_at_rest() {
        let shot = still(Vec2::new(2.0, 0.0), 4.0);
        let player = still(Vec2::ZERO, 3.0);
        assert!(swept_hit(shot, player));
    }

    #[test]
    fn test_miss_at_rest() {
        let shot = still(Vec2::new(10.0, 0.0), 4.0);
        let player = still(Vec2::ZERO, 3.0);
        assert!(!swept_hit(shot, player));
    }

    #[test]
    fn test_tunneling_caught() {
        // Player crosses a stationary shot head-on within one frame
        let shot = still(Vec2::ZERO, 4.0);
        let player = Motion {
            last: Vec2::new(0.0, -20.0),
            current: Vec2::new(0.0, 20.0),
            radius: 3.0,
        };
        assert!(swept_hit(shot, player));
        // Sampling only the end positions would miss it
        assert!(player.current.distance(shot.current) > shot.radius + player.radius);
    }

    #[test]
    fn test_fast_shot_passes_beside() {
        let shot = Motion {
            last: Vec2::new(-20.0, 10.0),
            current: Vec2::new(20.0, 10.0),
            radius: 4.0,
        };
        let player = still(Vec2::ZERO, 3.0);
        assert!(!swept_hit(shot, player));
    }

    #[test]
    fn test_prefilter_rejects_far_targets() {
        let shot = still(Vec2::new(31.0, 0.0), 40.0);
        let player = still(Vec2::ZERO, 3.0);
        assert!(!swept_hit(shot, player));
    }
}
