//! Collision detection for circular bodies
//!
//! Every collidable in the engine is a circle: entities, projectiles, the
//! player body and pointer taps (a tap is a circle of `tap_radius`).

use glam::Vec2;

/// Whether two circles overlap (touching is not a hit)
pub fn circle_circle(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> bool {
    a_pos.distance_squared(b_pos) < (a_radius + b_radius) * (a_radius + b_radius)
}

/// Whether a circle has reached (or crossed) the danger line
pub fn reached_danger_zone(pos: Vec2, radius: f32, danger_y: f32) -> bool {
    pos.y + radius >= danger_y
}

/// Whether a circle has fully left the arena rectangle
pub fn outside_arena(pos: Vec2, radius: f32, width: f32, height: f32) -> bool {
    pos.x + radius < 0.0 || pos.x - radius > width || pos.y + radius < 0.0 || pos.y - radius > height
}

/// Earliest contact of a circle moving `from` -> `to` with a stationary circle,
/// as a fraction of the path. Fast shots on long frames cannot tunnel through.
pub fn swept_circle_hit(
    from: Vec2,
    to: Vec2,
    radius: f32,
    center: Vec2,
    other_radius: f32,
) -> Option<f32> {
    let reach = radius + other_radius;
    let offset = from - center;
    let c = offset.length_squared() - reach * reach;
    if c < 0.0 {
        return Some(0.0);
    }

    let path = to - from;
    let a = path.length_squared();
    if a <= f32::EPSILON {
        return None;
    }
    let b = 2.0 * offset.dot(path);
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Pick the closest candidate overlapping a probe circle
///
/// Ties resolve to the lowest index, which keeps results stable across runs
/// as long as candidates are iterated in id order.
pub fn nearest_overlap<I>(probe: Vec2, probe_radius: f32, candidates: I) -> Option<usize>
where
    I: IntoIterator<Item = (usize, Vec2, f32)>,
{
    let mut best: Option<(usize, f32)> = None;
    for (idx, pos, radius) in candidates {
        if !circle_circle(probe, probe_radius, pos, radius) {
            continue;
        }
        let dist = probe.distance(pos);
        match best {
            Some((_, best_dist)) if best_dist <= dist => {}
            _ => best = Some((idx, dist)),
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_circle_hit() {
        assert!(circle_circle(Vec2::new(0.0, 0.0), 10.0, Vec2::new(15.0, 0.0), 10.0));
        assert!(circle_circle(Vec2::new(3.0, 4.0), 1.0, Vec2::new(3.0, 4.0), 1.0));
    }

    #[test]
    fn test_circle_circle_touching_is_miss() {
        assert!(!circle_circle(Vec2::ZERO, 10.0, Vec2::new(20.0, 0.0), 10.0));
    }

    #[test]
    fn test_danger_zone() {
        assert!(!reached_danger_zone(Vec2::new(0.0, 80.0), 10.0, 100.0));
        assert!(reached_danger_zone(Vec2::new(0.0, 90.0), 10.0, 100.0));
        assert!(reached_danger_zone(Vec2::new(0.0, 150.0), 10.0, 100.0));
    }

    #[test]
    fn test_outside_arena() {
        assert!(!outside_arena(Vec2::new(50.0, 50.0), 5.0, 100.0, 100.0));
        assert!(outside_arena(Vec2::new(50.0, -6.0), 5.0, 100.0, 100.0));
        assert!(!outside_arena(Vec2::new(50.0, -4.0), 5.0, 100.0, 100.0));
    }

    #[test]
    fn test_swept_hit_catches_fast_shot() {
        // Shot jumps 200 units past a 5-unit target in one frame
        let t = swept_circle_hit(
            Vec2::new(0.0, 100.0),
            Vec2::new(0.0, -100.0),
            5.0,
            Vec2::ZERO,
            5.0,
        )
        .unwrap();
        assert!((t - 0.45).abs() < 0.001);

        let miss = swept_circle_hit(
            Vec2::new(20.0, 100.0),
            Vec2::new(20.0, -100.0),
            5.0,
            Vec2::ZERO,
            5.0,
        );
        assert_eq!(miss, None);

        // Already overlapping
        assert_eq!(
            swept_circle_hit(Vec2::ZERO, Vec2::new(0.0, -10.0), 5.0, Vec2::new(3.0, 0.0), 5.0),
            Some(0.0)
        );
    }

    #[test]
    fn test_nearest_overlap_prefers_closest() {
        let candidates = vec![
            (0, Vec2::new(8.0, 0.0), 5.0),
            (1, Vec2::new(3.0, 0.0), 5.0),
            (2, Vec2::new(100.0, 0.0), 5.0),
        ];
        assert_eq!(nearest_overlap(Vec2::ZERO, 5.0, candidates), Some(1));
        assert_eq!(nearest_overlap(Vec2::new(200.0, 0.0), 5.0, Vec::new()), None);
    }
}
